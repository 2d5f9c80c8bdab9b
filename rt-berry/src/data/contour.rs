//! 轮廓与轮廓集合.

use itertools::Itertools;

use crate::polygon;
use crate::{Point2, Vec3};

/// 单个水平层上的闭合多边形轮廓.
///
/// 多边形隐式闭合, 不需要重复存储起点. 所有点共享同一个 z 坐标,
/// 即 `slice_position_mm`. 至少包含 3 个点时才被视为合法.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "crate::de::RawContour"))]
pub struct Contour {
    slice_position_mm: f64,
    points: Vec<Vec3>,
}

impl Contour {
    /// 以层位置和点集构建轮廓. 每个点的 z 分量会被强制设置为 `slice_position_mm`.
    pub fn new(slice_position_mm: f64, points: Vec<Vec3>) -> Self {
        let points = points
            .into_iter()
            .map(|(x, y, _)| (x, y, slice_position_mm))
            .collect();
        Self {
            slice_position_mm,
            points,
        }
    }

    /// 以平面坐标构建轮廓.
    pub fn from_xy<I: IntoIterator<Item = Point2>>(slice_position_mm: f64, it: I) -> Self {
        Self {
            slice_position_mm,
            points: it
                .into_iter()
                .map(|(x, y)| (x, y, slice_position_mm))
                .collect(),
        }
    }

    /// 以 `[x0, y0, z0, x1, y1, z1, ...]` 扁平坐标数组构建轮廓.
    ///
    /// 数组长度不是 3 的倍数时返回 `None`. 层位置取第一个点的 z 坐标.
    pub fn from_flat(coords: &[f64]) -> Option<Self> {
        if coords.len() % 3 != 0 {
            return None;
        }
        let z = coords.get(2).copied().unwrap_or(0.0);
        Some(Self::new(
            z,
            coords.chunks_exact(3).map(|c| (c[0], c[1], c[2])).collect(),
        ))
    }

    /// 层位置 (单位: 毫米).
    #[inline]
    pub fn slice_position_mm(&self) -> f64 {
        self.slice_position_mm
    }

    /// 轮廓点.
    #[inline]
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    /// 轮廓点个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// 轮廓是否没有点.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// 轮廓是否合法 (至少 3 个点).
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.points.len() >= 3
    }

    /// 轮廓的平面坐标.
    pub fn xy(&self) -> Vec<Point2> {
        self.points.iter().map(|&(x, y, _)| (x, y)).collect()
    }

    /// 多边形面积 (单位: 平方毫米). 非法轮廓的面积为 0.
    #[inline]
    pub fn area_mm2(&self) -> f64 {
        if self.is_valid() {
            polygon::area(&self.xy())
        } else {
            0.0
        }
    }

    /// 面积加权质心. 轮廓非法或退化时返回 `None`.
    #[inline]
    pub fn centroid(&self) -> Option<Point2> {
        polygon::centroid(&self.xy()).ok()
    }

    /// 平面包围盒 `((min_x, min_y), (max_x, max_y))`. 空轮廓返回 `None`.
    pub fn bounds_xy(&self) -> Option<(Point2, Point2)> {
        let (x0, x1) = self.points.iter().map(|p| p.0).minmax().into_option()?;
        let (y0, y1) = self.points.iter().map(|p| p.1).minmax().into_option()?;
        Some(((x0, y0), (x1, y1)))
    }
}

/// 按 z 排序的轮廓集合. 同一层上可以有多个互不相交的轮廓.
///
/// 集合由每一步流水线操作重新构建, 构建后不再修改.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "crate::de::RawContourSet"))]
pub struct ContourSet {
    contours: Vec<Contour>,
}

impl FromIterator<Contour> for ContourSet {
    fn from_iter<I: IntoIterator<Item = Contour>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl ContourSet {
    /// 由任意顺序的轮廓构建集合. 结果按层位置稳定排序.
    pub fn new(mut contours: Vec<Contour>) -> Self {
        contours.sort_by(|a, b| a.slice_position_mm.total_cmp(&b.slice_position_mm));
        Self { contours }
    }

    /// 所有轮廓 (按 z 升序).
    #[inline]
    pub fn contours(&self) -> &[Contour] {
        &self.contours
    }

    /// 消费自我, 获得底层轮廓.
    #[inline]
    pub fn into_contours(self) -> Vec<Contour> {
        self.contours
    }

    /// 轮廓个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.contours.len()
    }

    /// 集合是否为空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    /// 按升序去重后的层位置.
    pub fn slice_positions(&self) -> Vec<f64> {
        self.contours
            .iter()
            .map(Contour::slice_position_mm)
            .dedup()
            .collect()
    }

    /// 按层位置分组. 每组内的轮廓保持原有顺序.
    ///
    /// 分组按照 `total_cmp` 判等, 因此 NaN 层位置也会单独成组, 每组至少包含一个轮廓.
    pub fn slices(&self) -> Vec<(f64, &[Contour])> {
        let mut ans = Vec::with_capacity(self.contours.len());
        let mut start = 0;
        while start < self.contours.len() {
            let z = self.contours[start].slice_position_mm;
            let len = self.contours[start..]
                .iter()
                .take_while(|c| c.slice_position_mm.total_cmp(&z).is_eq())
                .count();
            ans.push((z, &self.contours[start..start + len]));
            start += len;
        }
        ans
    }

    /// 获取位于 `z` (容差 `tolerance_mm`) 的全部轮廓.
    pub fn at(&self, z: f64, tolerance_mm: f64) -> Vec<&Contour> {
        self.contours
            .iter()
            .filter(|c| (c.slice_position_mm - z).abs() <= tolerance_mm)
            .collect()
    }

    /// 获取位于 `z` (容差 `tolerance_mm`) 的面积最大的合法轮廓.
    pub fn largest_at(&self, z: f64, tolerance_mm: f64) -> Option<&Contour> {
        polygon::largest_loop(self.at(z, tolerance_mm))
    }

    /// 合法轮廓的三维包围盒 `(min, max)`. 不存在合法轮廓时返回 `None`.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut it = self
            .contours
            .iter()
            .filter(|c| c.is_valid())
            .flat_map(|c| c.points.iter().copied());
        let first = it.next()?;
        Some(it.fold((first, first), |(lo, hi), p| {
            (
                (lo.0.min(p.0), lo.1.min(p.1), lo.2.min(p.2)),
                (hi.0.max(p.0), hi.1.max(p.1), hi.2.max(p.2)),
            )
        }))
    }

    /// 所有合法轮廓的面积之和 (单位: 平方毫米).
    pub fn total_area_mm2(&self) -> f64 {
        self.contours.iter().map(Contour::area_mm2).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::{Contour, ContourSet};

    fn square(z: f64, x0: f64, side: f64) -> Contour {
        Contour::from_xy(
            z,
            [(x0, 0.0), (x0 + side, 0.0), (x0 + side, side), (x0, side)],
        )
    }

    #[test]
    fn test_points_share_slice_z() {
        let c = Contour::new(4.5, vec![(0.0, 0.0, 1.0), (1.0, 0.0, 2.0), (1.0, 1.0, 3.0)]);
        assert!(c.points().iter().all(|p| p.2 == 4.5));
        assert!(c.is_valid());

        assert!(Contour::from_flat(&[0.0, 1.0]).is_none());
        let f = Contour::from_flat(&[0.0, 0.0, 2.0, 1.0, 0.0, 2.0, 0.0, 1.0, 2.0]).unwrap();
        assert_eq!(f.slice_position_mm(), 2.0);
        assert_eq!(f.len(), 3);
    }

    #[test]
    fn test_set_is_sorted_and_grouped() {
        let set: ContourSet = [
            square(6.0, 0.0, 1.0),
            square(0.0, 0.0, 1.0),
            square(3.0, 0.0, 2.0),
            square(0.0, 5.0, 3.0),
        ]
        .into_iter()
        .collect();

        assert_eq!(set.slice_positions(), vec![0.0, 3.0, 6.0]);
        let slices = set.slices();
        assert_eq!(slices.len(), 3);
        assert_eq!(slices[0].1.len(), 2);

        let largest = set.largest_at(0.0, 0.01).unwrap();
        assert_eq!(largest.area_mm2(), 9.0);
        assert!(set.largest_at(1.0, 0.01).is_none());
        assert_eq!(set.total_area_mm2(), 1.0 + 9.0 + 4.0 + 1.0);
    }

    #[test]
    fn test_nan_slices_are_grouped() {
        let set = ContourSet::new(vec![
            square(f64::NAN, 0.0, 1.0),
            square(0.0, 0.0, 1.0),
            square(f64::NAN, 2.0, 1.0),
        ]);
        let slices = set.slices();
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].0, 0.0);
        assert!(slices[1].0.is_nan());
        assert_eq!(slices[1].1.len(), 2);
    }

    #[test]
    fn test_bounds_skip_invalid() {
        let set = ContourSet::new(vec![
            square(0.0, 0.0, 2.0),
            Contour::from_xy(9.0, [(100.0, 100.0), (101.0, 101.0)]),
        ]);
        let (lo, hi) = set.bounds().unwrap();
        assert_eq!(lo, (0.0, 0.0, 0.0));
        assert_eq!(hi, (2.0, 2.0, 0.0));
        assert!(ContourSet::default().bounds().is_none());
    }
}
