use std::ops::{Index, IndexMut};

use ndarray::{s, Array3, ArrayView, ArrayViewMut, Axis, Ix3};

use crate::consts::occupancy::{self, INSIDE, OUTSIDE};
use crate::{Idx3d, Vec3};

pub mod contour;
pub mod layer;
pub mod morph_3d;

pub use contour::{Contour, ContourSet};
pub use layer::{LayerView, LayerViewMut};

/// 规则三维体素网格 (晶格) 描述.
///
/// `sizes`, `spacing_mm` 与 `origin_mm` 均按照 `(x, y, z)` 顺序存储;
/// 而体素索引 [`Idx3d`] 则与底层 `ndarray` 一致, 按照 `(z, h, w)`
/// 即 `(z, y, x)` 顺序访问. 因此展平后的线性下标为 `x + y * nx + z * nx * ny`.
///
/// `origin_mm` 是体素 `(0, 0, 0)` **角点** 的物理坐标, 而非中心.
///
/// 网格是只读的值对象. 扩展或内缩时总是创建新的实例.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "crate::de::RawGrid"))]
pub struct Grid {
    sizes: (usize, usize, usize),
    spacing_mm: Vec3,
    origin_mm: Vec3,
}

impl Grid {
    /// 构建网格.
    ///
    /// 每个方向的体素个数必须至少为 1, 分辨率必须为正有限值,
    /// 原点必须为有限值. 否则返回 `None`.
    pub fn new(sizes: (usize, usize, usize), spacing_mm: Vec3, origin_mm: Vec3) -> Option<Self> {
        let (nx, ny, nz) = sizes;
        let (sx, sy, sz) = spacing_mm;
        let (ox, oy, oz) = origin_mm;
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if nx >= 1
            && ny >= 1
            && nz >= 1
            && positive(sx)
            && positive(sy)
            && positive(sz)
            && ox.is_finite()
            && oy.is_finite()
            && oz.is_finite()
        {
            Some(Self {
                sizes,
                spacing_mm,
                origin_mm,
            })
        } else {
            None
        }
    }

    /// 每个方向的体素个数, `(x, y, z)`.
    #[inline]
    pub fn sizes(&self) -> (usize, usize, usize) {
        self.sizes
    }

    /// 每个方向的体素分辨率 (单位: 毫米), `(x, y, z)`.
    #[inline]
    pub fn spacing_mm(&self) -> Vec3 {
        self.spacing_mm
    }

    /// 体素 `(0, 0, 0)` 角点的物理坐标 (单位: 毫米), `(x, y, z)`.
    #[inline]
    pub fn origin_mm(&self) -> Vec3 {
        self.origin_mm
    }

    /// 底层数组形状, `(z, h, w)`.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        let (nx, ny, nz) = self.sizes;
        (nz, ny, nx)
    }

    /// 体素总个数.
    #[inline]
    pub fn len(&self) -> usize {
        let (nx, ny, nz) = self.sizes;
        nx * ny * nz
    }

    /// 网格是否为空. 合法网格永远不为空, 提供该方法仅为了与 `len` 配套.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 水平层个数.
    #[inline]
    pub fn len_z(&self) -> usize {
        self.sizes.2
    }

    /// 展平后的线性下标 `x + y * nx + z * nx * ny`.
    #[inline]
    pub fn flat_index(&self, (z, h, w): Idx3d) -> usize {
        let (nx, ny, _) = self.sizes;
        w + h * nx + z * nx * ny
    }

    /// 检查索引是否合法.
    #[inline]
    pub fn check(&self, (z0, h0, w0): &Idx3d) -> bool {
        let (z, h, w) = self.shape();
        *z0 < z && *h0 < h && *w0 < w
    }

    /// 体素中心的物理坐标 `(x, y, z)`.
    #[inline]
    pub fn voxel_center(&self, (z, h, w): Idx3d) -> Vec3 {
        let (ox, oy, oz) = self.origin_mm;
        let (sx, sy, sz) = self.spacing_mm;
        (
            ox + (w as f64 + 0.5) * sx,
            oy + (h as f64 + 0.5) * sy,
            oz + (z as f64 + 0.5) * sz,
        )
    }

    /// 第 `z_index` 层中心的物理 z 坐标.
    #[inline]
    pub fn layer_z(&self, z_index: usize) -> f64 {
        self.origin_mm.2 + (z_index as f64 + 0.5) * self.spacing_mm.2
    }

    /// 物理 z 坐标所在 (最近) 的层索引. 越界时返回 `None`.
    pub fn layer_of_z(&self, z: f64) -> Option<usize> {
        let k = ((z - self.origin_mm.2) / self.spacing_mm.2 - 0.5).round();
        (k >= 0.0 && (k as usize) < self.len_z()).then_some(k as usize)
    }

    /// 物理 x 坐标对应的连续列坐标. 体素中心恰好落在整数上.
    #[inline]
    pub fn continuous_w(&self, x: f64) -> f64 {
        (x - self.origin_mm.0) / self.spacing_mm.0 - 0.5
    }

    /// 物理 y 坐标对应的连续行坐标. 体素中心恰好落在整数上.
    #[inline]
    pub fn continuous_h(&self, y: f64) -> f64 {
        (y - self.origin_mm.1) / self.spacing_mm.1 - 0.5
    }

    /// 单个体素的实际体积, 以立方毫米为单位.
    #[inline]
    pub fn voxel_volume_mm3(&self) -> f64 {
        let (sx, sy, sz) = self.spacing_mm;
        sx * sy * sz
    }

    /// 水平层方向的像素实际面积, 以平方毫米为单位.
    #[inline]
    pub fn pixel_area_mm2(&self) -> f64 {
        self.spacing_mm.0 * self.spacing_mm.1
    }

    /// 在每个方向的两侧分别扩展 `(px, py, pz)` 个体素, 返回新的网格.
    ///
    /// 新网格与原网格共享同一个晶格 (体素中心一一对齐).
    pub fn padded(&self, (px, py, pz): (usize, usize, usize)) -> Self {
        let (nx, ny, nz) = self.sizes;
        let (sx, sy, sz) = self.spacing_mm;
        let (ox, oy, oz) = self.origin_mm;
        Self {
            sizes: (nx + 2 * px, ny + 2 * py, nz + 2 * pz),
            spacing_mm: self.spacing_mm,
            origin_mm: (
                ox - px as f64 * sx,
                oy - py as f64 * sy,
                oz - pz as f64 * sz,
            ),
        }
    }

    /// 获取 `pos` 前后上下左右六个点的坐标.
    ///
    /// 在网格范围外的坐标会被过滤掉, 不会包含在返回值中.
    pub fn diamond_neighbours(&self, (z, h, w): Idx3d) -> Vec<Idx3d> {
        self.check_collect([
            (z.wrapping_sub(1), h, w),
            (z.saturating_add(1), h, w),
            (z, h.wrapping_sub(1), w),
            (z, h.saturating_add(1), w),
            (z, h, w.wrapping_sub(1)),
            (z, h, w.saturating_add(1)),
        ])
    }

    /// 收集 `data` 中不越界的索引.
    #[inline]
    fn check_collect<B: FromIterator<Idx3d>, const N: usize>(&self, data: [Idx3d; N]) -> B {
        data.into_iter().filter(|p| self.check(p)).collect()
    }
}

/// 定义在 [`Grid`] 上的稠密标量场.
///
/// 既可以是占据标记 (`0` / `1`), 也可以是 (带符号的) 距离平方.
/// 标量场由产生它的操作独占, 每一步操作都分配新的输出.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "crate::de::RawScalarField"))]
pub struct ScalarField {
    grid: Grid,
    data: Array3<f64>,
}

impl Index<Idx3d> for ScalarField {
    type Output = f64;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<Idx3d> for ScalarField {
    #[inline]
    fn index_mut(&mut self, index: Idx3d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl ScalarField {
    /// 创建所有体素值都为 `value` 的标量场.
    pub fn filled(grid: Grid, value: f64) -> Self {
        Self {
            data: Array3::from_elem(grid.shape(), value),
            grid,
        }
    }

    /// 创建全部位于结构外部的占据标记.
    #[inline]
    pub fn empty_mask(grid: Grid) -> Self {
        Self::filled(grid, OUTSIDE)
    }

    /// 由展平数据直接创建标量场. `raw` 按照 `x + y * nx + z * nx * ny` 排列.
    ///
    /// 如果 `raw` 长度与网格体素个数不符, 则返回 `None`.
    pub fn from_raw(grid: Grid, raw: Vec<f64>) -> Option<Self> {
        let data = Array3::from_shape_vec(grid.shape(), raw).ok()?;
        Some(Self { grid, data })
    }

    /// 获取网格描述.
    #[inline]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView<'_, f64, Ix3> {
        self.data.view()
    }

    /// 获得数据的一份可变 shallow copy.
    #[inline]
    pub fn data_mut(&mut self) -> ArrayViewMut<'_, f64, Ix3> {
        self.data.view_mut()
    }

    /// 以展平顺序获得底层数据.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        // 所有构造路径都保证标准布局.
        self.data
            .as_slice()
            .expect("scalar field is always in standard layout")
    }

    /// 以展平顺序获得可变底层数据.
    #[inline]
    pub fn as_slice_mut(&mut self) -> &mut [f64] {
        self.data
            .as_slice_mut()
            .expect("scalar field is always in standard layout")
    }

    /// 获取给定索引的值. 越界时返回 `None`.
    #[inline]
    pub fn get(&self, pos: Idx3d) -> Option<f64> {
        self.data.get(pos).copied()
    }

    /// 给定索引的体素是否位于结构内部. 越界视为外部.
    #[inline]
    pub fn is_inside(&self, pos: Idx3d) -> bool {
        self.get(pos).is_some_and(occupancy::is_inside)
    }

    /// 获取第 `z_index` 层不可变视图.
    ///
    /// 当 `z_index` 越界时 panic.
    #[inline]
    pub fn layer_at(&self, z_index: usize) -> LayerView<'_> {
        LayerView::new(self.data.index_axis(Axis(0), z_index))
    }

    /// 获取第 `z_index` 层可变视图.
    ///
    /// 当 `z_index` 越界时 panic.
    #[inline]
    pub fn layer_at_mut(&mut self, z_index: usize) -> LayerViewMut<'_> {
        LayerViewMut::new(self.data.index_axis_mut(Axis(0), z_index))
    }

    /// 获取能按升序迭代水平不可变层的迭代器.
    #[inline]
    pub fn layer_iter(&self) -> impl ExactSizeIterator<Item = LayerView> {
        self.data.axis_iter(Axis(0)).map(LayerView::new)
    }

    /// 获取能按升序迭代水平可变层的迭代器.
    #[inline]
    pub fn layer_iter_mut(&mut self) -> impl ExactSizeIterator<Item = LayerViewMut> {
        self.data.axis_iter_mut(Axis(0)).map(LayerViewMut::new)
    }

    /// 位于结构内部的体素个数.
    #[inline]
    pub fn count_occupied(&self) -> usize {
        self.data.iter().filter(|v| occupancy::is_inside(**v)).count()
    }

    /// 结构体积, 以立方毫米为单位.
    #[inline]
    pub fn occupied_volume_mm3(&self) -> f64 {
        self.count_occupied() as f64 * self.grid.voxel_volume_mm3()
    }

    /// 占据标记是否不含任何内部体素?
    #[inline]
    pub fn is_empty_mask(&self) -> bool {
        self.data.iter().copied().all(occupancy::is_outside)
    }

    /// 收集所有位于内部的体素下标. 结果按行优先存储.
    pub fn occupied_pos(&self) -> Vec<Idx3d> {
        self.data
            .indexed_iter()
            .filter_map(|(pos, v)| occupancy::is_inside(*v).then_some(pos))
            .collect()
    }

    /// 在每个方向两侧扩展 `pads` 个体素, 新增体素以 `fill` 填充.
    ///
    /// 返回的标量场位于 `self.grid().padded(pads)` 上, 原数据完整保留.
    pub fn padded(&self, pads: (usize, usize, usize), fill: f64) -> Self {
        let grid = self.grid.padded(pads);
        let mut ans = Self::filled(grid, fill);
        let (px, py, pz) = pads;
        let (nz, ny, nx) = self.grid.shape();
        ans.data
            .slice_mut(s![pz..pz + nz, py..py + ny, px..px + nx])
            .assign(&self.data);
        ans
    }

    /// 对每个体素值施加 `op`, 生成同一网格上的新标量场.
    pub fn map<F: Fn(f64) -> f64>(&self, op: F) -> Self {
        Self {
            grid: self.grid,
            data: self.data.mapv(op),
        }
    }

    /// 将任意标量场二值化为占据标记.
    pub fn to_mask(&self) -> Self {
        self.map(|v| if occupancy::is_inside(v) { INSIDE } else { OUTSIDE })
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
    }
}

/// 并发操作部分
#[cfg(feature = "rayon")]
impl ScalarField {
    /// 借助 `rayon`, 并行地对每个水平可变层实施 `op` 操作.
    /// 该操作会同时携带 z 方向索引信息.
    pub fn par_for_each_indexed_layer_mut<F>(&mut self, op: F)
    where
        F: Fn(usize, LayerViewMut) + Sync + Send,
    {
        self.data
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(|(i, v)| {
                op(i, LayerViewMut::new(v));
            });
    }
}

#[cfg(test)]
mod tests {
    use super::{Grid, ScalarField};
    use crate::consts::occupancy::INSIDE;

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_grid_invalid_input() {
        assert!(Grid::new((0, 1, 1), (1.0, 1.0, 1.0), (0.0, 0.0, 0.0)).is_none());
        assert!(Grid::new((1, 1, 1), (1.0, 0.0, 1.0), (0.0, 0.0, 0.0)).is_none());
        assert!(Grid::new((1, 1, 1), (1.0, 1.0, -2.0), (0.0, 0.0, 0.0)).is_none());
        assert!(Grid::new((1, 1, 1), (1.0, 1.0, 1.0), (f64::NAN, 0.0, 0.0)).is_none());
        assert!(Grid::new((1, 1, 1), (1.0, 1.0, 1.0), (0.0, 0.0, 0.0)).is_some());
    }

    #[test]
    fn test_flat_index_is_x_fastest() {
        let g = Grid::new((4, 3, 2), (1.0, 1.0, 1.0), (0.0, 0.0, 0.0)).unwrap();
        assert_eq!(g.shape(), (2, 3, 4));
        assert_eq!(g.flat_index((0, 0, 1)), 1);
        assert_eq!(g.flat_index((0, 1, 0)), 4);
        assert_eq!(g.flat_index((1, 0, 0)), 12);

        // 展平顺序必须与底层数组一致.
        let raw: Vec<f64> = (0..g.len()).map(|v| v as f64).collect();
        let f = ScalarField::from_raw(g, raw).unwrap();
        for (pos, v) in f.data().indexed_iter() {
            assert_eq!(g.flat_index(pos), *v as usize);
        }
    }

    #[test]
    fn test_voxel_center_and_layer() {
        let g = Grid::new((10, 10, 5), (2.0, 2.0, 3.0), (-10.0, 0.0, 1.5)).unwrap();
        let (x, y, z) = g.voxel_center((1, 2, 3));
        assert!(f64_eq(x, -10.0 + 3.5 * 2.0));
        assert!(f64_eq(y, 2.5 * 2.0));
        assert!(f64_eq(z, 1.5 + 1.5 * 3.0));

        assert_eq!(g.layer_of_z(g.layer_z(4)), Some(4));
        assert_eq!(g.layer_of_z(3.0), Some(0));
        assert_eq!(g.layer_of_z(-5.0), None);
        assert_eq!(g.layer_of_z(100.0), None);
    }

    #[test]
    fn test_padded_keeps_lattice() {
        let g = Grid::new((3, 3, 1), (1.0, 1.0, 2.0), (0.0, 0.0, 0.0)).unwrap();
        let mut f = ScalarField::empty_mask(g);
        f[(0, 1, 1)] = INSIDE;

        let p = f.padded((2, 1, 1), 0.0);
        assert_eq!(p.grid().sizes(), (7, 5, 3));
        assert_eq!(p.count_occupied(), 1);
        assert!(p.is_inside((1, 2, 3)));

        let c0 = f.grid().voxel_center((0, 1, 1));
        let c1 = p.grid().voxel_center((1, 2, 3));
        assert!(f64_eq(c0.0, c1.0) && f64_eq(c0.1, c1.1) && f64_eq(c0.2, c1.2));
    }
}
