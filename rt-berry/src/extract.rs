//! 占据标记 -> 逐层轮廓.
//!
//! 每个含有内部体素的层都会被分配一个层位置: 优先复用容差范围内最近的
//! 尚未使用的原始层位置, 否则 (在允许时) 使用体素层中心.
//! 每个 8-连通岛的外轮廓以体素中心坐标输出.

use log::debug;
use ordered_float::OrderedFloat;

use crate::config::ExtractSpec;
use crate::error::{GeoResult, GeometryError};
use crate::{Contour, ContourSet, ScalarField};

/// 从占据标记中提取轮廓.
///
/// `known_zs` 为原始层位置; `tolerance_mm` 为 `None` 时取层间距的 40% (至少 0.1 毫米).
///
/// # 错误
///
/// 给定的容差为负数或不是有限值时返回 [`GeometryError::InvalidInput`].
pub fn extract_contours(
    field: &ScalarField,
    known_zs: &[f64],
    tolerance_mm: Option<f64>,
    allow_new_slices: bool,
) -> GeoResult<ContourSet> {
    let spec = ExtractSpec::new(tolerance_mm, allow_new_slices).ok_or_else(|| {
        GeometryError::InvalidInput(format!("tolerance {tolerance_mm:?} is not valid"))
    })?;
    Ok(extract_with(field, known_zs, &spec))
}

/// 以已经验证过的参数提取轮廓.
pub fn extract_with(field: &ScalarField, known_zs: &[f64], spec: &ExtractSpec) -> ContourSet {
    assign_slices(field, known_zs, spec)
        .into_iter()
        .flat_map(|(k, z)| layer_contours(field, k, z))
        .collect()
}

/// 借助 `rayon`, 并行追踪每一层的轮廓. 结果与 [`extract_with`] 完全相同.
#[cfg(feature = "rayon")]
pub fn par_extract_with(field: &ScalarField, known_zs: &[f64], spec: &ExtractSpec) -> ContourSet {
    use rayon::prelude::*;

    assign_slices(field, known_zs, spec)
        .into_par_iter()
        .flat_map_iter(|(k, z)| layer_contours(field, k, z))
        .collect::<Vec<_>>()
        .into_iter()
        .collect()
}

/// 为每个非空层分配层位置, 返回 `(层索引, 层位置)`, 按层索引升序排列.
///
/// 每个原始层位置至多被复用一次.
fn assign_slices(field: &ScalarField, known_zs: &[f64], spec: &ExtractSpec) -> Vec<(usize, f64)> {
    let grid = field.grid();
    let tol = spec.tolerance_for(grid.spacing_mm().2);
    let mut used = vec![false; known_zs.len()];
    let mut ans = Vec::with_capacity(grid.len_z());

    for (k, layer) in field.layer_iter().enumerate() {
        if layer.is_empty_mask() {
            continue;
        }
        let lz = grid.layer_z(k);
        let closest = known_zs
            .iter()
            .enumerate()
            .filter(|(i, z)| !used[*i] && (**z - lz).abs() <= tol)
            .min_by_key(|(_, z)| OrderedFloat((**z - lz).abs()));
        match closest {
            Some((i, &z)) => {
                used[i] = true;
                ans.push((k, z));
            }
            None if spec.allow_new_slices() => ans.push((k, lz)),
            None => debug!("extract: layer {k} at z = {lz:.3} has no matching slice, skipped"),
        }
    }
    ans
}

/// 第 `k` 层的全部轮廓, 层位置为 `z`. 少于 3 个点的轮廓被丢弃.
fn layer_contours(field: &ScalarField, k: usize, z: f64) -> Vec<Contour> {
    let grid = field.grid();
    field
        .layer_at(k)
        .boundary_loops()
        .into_iter()
        .filter(|lp| lp.len() >= 3)
        .map(|lp| {
            Contour::from_xy(
                z,
                lp.into_iter().map(|(h, w)| {
                    let (x, y, _) = grid.voxel_center((k, h, w));
                    (x, y)
                }),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::occupancy::INSIDE;
    use crate::Grid;

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    /// 3 层, 第 0 层与第 2 层各有一个 3 * 3 的方块, 第 2 层另有一个孤立像素.
    fn sample() -> ScalarField {
        let g = Grid::new((8, 8, 3), (1.0, 1.0, 2.0), (0.0, 0.0, -1.0)).unwrap();
        let mut f = ScalarField::empty_mask(g);
        for h in 1..4 {
            for w in 1..4 {
                f[(0, h, w)] = INSIDE;
                f[(2, h, w)] = INSIDE;
            }
        }
        f[(2, 6, 6)] = INSIDE;
        f
    }

    #[test]
    fn test_reuse_known_slices() {
        let f = sample();
        // 层中心分别为 0, 2, 4.
        let set = extract_contours(&f, &[0.3, 3.9, 4.2], None, true).unwrap();
        assert_eq!(set.slice_positions(), vec![0.3, 3.9]);
        // 孤立像素少于 3 个点, 被丢弃.
        assert_eq!(set.len(), 2);

        let c = &set.contours()[0];
        assert_eq!(c.len(), 8);
        assert!(f64_eq(c.area_mm2(), 4.0));
        let (cx, cy) = c.centroid().unwrap();
        assert!(f64_eq(cx, 2.5) && f64_eq(cy, 2.5));
    }

    #[test]
    fn test_annulus_yields_outer_loop_only() {
        // 7 * 7 的方环, 中央有 3 * 3 的孔洞, 环宽 2.
        let g = Grid::new((9, 9, 1), (1.0, 1.0, 1.0), (0.0, 0.0, 0.0)).unwrap();
        let mut f = ScalarField::empty_mask(g);
        for h in 1..8 {
            for w in 1..8 {
                if !((3..6).contains(&h) && (3..6).contains(&w)) {
                    f[(0, h, w)] = INSIDE;
                }
            }
        }
        let set = extract_contours(&f, &[0.5], None, false).unwrap();
        assert_eq!(set.len(), 1);

        let c = &set.contours()[0];
        assert_eq!(c.len(), 24);
        assert!(f64_eq(c.area_mm2(), 36.0));
        // 只与孔洞相邻的体素 (例如 (2, 4)) 不出现在轮廓中.
        let on_outer = |v: f64| f64_eq(v, 1.5) || f64_eq(v, 7.5);
        assert!(c.points().iter().all(|&(x, y, _)| on_outer(x) || on_outer(y)));
        assert!(!c
            .points()
            .iter()
            .any(|&(x, y, _)| f64_eq(x, 4.5) && f64_eq(y, 2.5)));
    }

    #[test]
    fn test_new_slices_policy() {
        let f = sample();
        let set = extract_contours(&f, &[0.0], Some(0.1), true).unwrap();
        assert_eq!(set.slice_positions(), vec![0.0, 4.0]);

        let set = extract_contours(&f, &[0.0], Some(0.1), false).unwrap();
        assert_eq!(set.slice_positions(), vec![0.0]);

        assert!(extract_contours(&f, &[0.0], Some(-1.0), false).is_err());
    }

    #[test]
    fn test_each_known_slice_used_once() {
        let f = sample();
        // 两个非空层都只能匹配 2.0, 但它只能被使用一次.
        let set = extract_contours(&f, &[2.0], Some(2.0), false).unwrap();
        assert_eq!(set.slice_positions(), vec![2.0]);
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn test_par_extract_matches() {
        let f = sample();
        let spec = ExtractSpec::default();
        assert_eq!(
            extract_with(&f, &[0.0, 4.0], &spec),
            par_extract_with(&f, &[0.0, 4.0], &spec)
        );
    }
}
