use log::debug;

use crate::config::ExtractSpec;
use crate::consts::distance::{FAR, SEED};
use crate::consts::occupancy::{self, INSIDE, OUTSIDE};
use crate::data::morph_3d::distance_transform;
use crate::error::{GeoResult, GeometryError};
use crate::{extract, raster, Contour, ContourSet, Grid, ScalarField};

/// 平面网格在包围盒两侧额外留出的体素个数.
const SDF_PAD_VOXELS: f64 = 2.0;

/// 将两侧的全部合法轮廓投影到 `target_z`, 并构建能够同时容纳它们的单层网格.
fn shared_lattice(
    a: &[Contour],
    b: &[Contour],
    target_z: f64,
    spacing_mm: f64,
) -> GeoResult<(Grid, ContourSet, ContourSet)> {
    let flatten = |v: &[Contour]| -> ContourSet {
        v.iter()
            .filter(|c| c.is_valid())
            .map(|c| Contour::from_xy(target_z, c.xy()))
            .collect()
    };
    let (sa, sb) = (flatten(a), flatten(b));
    if sa.is_empty() || sb.is_empty() {
        return Err(GeometryError::InvalidInput(
            "distance field needs a valid contour on both sides".to_string(),
        ));
    }
    let (Some((lo_a, hi_a)), Some((lo_b, hi_b))) = (sa.bounds(), sb.bounds()) else {
        unreachable!()
    };
    let (x0, y0) = (lo_a.0.min(lo_b.0), lo_a.1.min(lo_b.1));
    let (x1, y1) = (hi_a.0.max(hi_b.0), hi_a.1.max(hi_b.1));
    let pad = SDF_PAD_VOXELS * spacing_mm;
    let nx = ((x1 - x0) / spacing_mm).ceil() as usize + 2 * SDF_PAD_VOXELS as usize;
    let ny = ((y1 - y0) / spacing_mm).ceil() as usize + 2 * SDF_PAD_VOXELS as usize;
    let grid = Grid::new(
        (nx, ny, 1),
        (spacing_mm, spacing_mm, 1.0),
        (x0 - pad, y0 - pad, target_z - 0.5),
    )
    .ok_or_else(|| GeometryError::InvalidInput(format!("bad sdf lattice {nx} x {ny}")))?;
    Ok((grid, sa, sb))
}

/// 占据标记的带符号距离场, 单位: 毫米. 内部为负, 外部为正, 边界约为 0.
///
/// 到最近的异侧体素中心的距离减去半个体素, 因此紧邻边界的两侧分别为 `∓s/2`.
fn signed_distance(mask: &ScalarField) -> GeoResult<ScalarField> {
    if mask.is_empty_mask() {
        return Err(GeometryError::AlgorithmFailure(
            "contour is smaller than one sdf pixel".to_string(),
        ));
    }
    let half = 0.5 * mask.grid().spacing_mm().0;
    let mut to_outside = mask.map(|v| if occupancy::is_inside(v) { FAR } else { SEED });
    let mut to_inside = mask.map(|v| if occupancy::is_inside(v) { SEED } else { FAR });
    distance_transform(&mut to_outside);
    distance_transform(&mut to_inside);

    let mut ans = mask.clone();
    for (pos, v) in ans.data_mut().indexed_iter_mut() {
        *v = if mask.is_inside(pos) {
            -(to_outside[pos].sqrt() - half)
        } else {
            to_inside[pos].sqrt() - half
        };
    }
    Ok(ans)
}

/// 距离场插值. 两侧的全部合法轮廓都参与计算, 因此可以处理岛的分裂与合并.
///
/// 1. 两侧轮廓被栅格化到同一个分辨率为 `spacing_mm` 的平面网格上.
/// 2. 分别计算带符号距离场 `sa`, `sb`, 线性混合为 `(1 - t) * sa + t * sb`.
/// 3. 混合值不大于 0 的像素位于结果内部, 追踪其外轮廓, 层位置为 `target_z`.
///
/// # 错误
///
/// 1. 任一侧没有合法轮廓时返回 [`GeometryError::InvalidInput`].
/// 2. 轮廓小于一个像素, 或混合结果为空时返回 [`GeometryError::AlgorithmFailure`].
pub fn distance_field(
    a: &[Contour],
    b: &[Contour],
    t: f64,
    target_z: f64,
    spacing_mm: f64,
) -> GeoResult<Vec<Contour>> {
    let (grid, sa, sb) = shared_lattice(a, b, target_z, spacing_mm)?;
    let (nx, ny, _) = grid.sizes();
    debug!("distance field interpolation on {nx} x {ny} lattice, t = {t:.3}");

    let da = signed_distance(&raster::rasterize_onto(grid, &sa))?;
    let db = signed_distance(&raster::rasterize_onto(grid, &sb))?;

    let mut blend = ScalarField::empty_mask(grid);
    for (pos, v) in blend.data_mut().indexed_iter_mut() {
        let s = (1.0 - t) * da[pos] + t * db[pos];
        *v = if s <= 0.0 { INSIDE } else { OUTSIDE };
    }

    let spec = ExtractSpec::new(Some(0.5), true).ok_or_else(|| {
        GeometryError::AlgorithmFailure("cannot build extraction parameters".to_string())
    })?;
    let ans = extract::extract_with(&blend, &[target_z], &spec).into_contours();
    if ans.is_empty() {
        return Err(GeometryError::AlgorithmFailure(format!(
            "blended distance field at t = {t:.3} is empty"
        )));
    }
    Ok(ans)
}
