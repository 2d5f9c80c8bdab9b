//! 轮廓集合的栅格化: 多边形 -> 三维占据标记.
//!
//! 每个水平层上的多边形按照奇偶规则逐行扫描填充, 判断的是体素中心.
//! 同一层上的多个多边形独立填充后取并集, 不支持孔洞.

use log::debug;

use crate::config::RasterSpec;
use crate::error::{GeoResult, GeometryError};
use crate::{Contour, ContourSet, Grid, LayerViewMut, Point2, ScalarField, Vec3};

/// 将 `contours` 栅格化到一个恰好容纳其包围盒 (加边距) 的新网格上.
///
/// `spacing_mm` 为体素分辨率 `(x, y, z)`, `padding_mm` 为包围盒每侧额外的边距.
///
/// # 错误
///
/// 参数非法时返回 [`GeometryError::InvalidInput`].
pub fn rasterize(
    contours: &ContourSet,
    spacing_mm: Vec3,
    padding_mm: f64,
) -> GeoResult<ScalarField> {
    let spec = RasterSpec::new(spacing_mm, padding_mm).ok_or_else(|| {
        GeometryError::InvalidInput(format!(
            "spacing {spacing_mm:?} / padding {padding_mm} is not valid"
        ))
    })?;
    Ok(rasterize_with(contours, &spec))
}

/// 以已经验证过的参数栅格化.
///
/// 不含合法轮廓 (至少 3 个点) 时, 返回 `1 * 1 * 1` 的空占据标记.
pub fn rasterize_with(contours: &ContourSet, spec: &RasterSpec) -> ScalarField {
    let grid = fit_grid(contours, spec);
    rasterize_onto(grid, contours)
}

/// 计算恰好容纳 `contours` 的网格.
///
/// x/y 方向上, 包围盒两侧各留出 `spec.pad_voxels()` 个体素;
/// z 方向上, 网格层中心与最低的轮廓层对齐.
pub fn fit_grid(contours: &ContourSet, spec: &RasterSpec) -> Grid {
    let spacing = spec.spacing_mm();
    let fallback = Grid::new((1, 1, 1), spacing, (0.0, 0.0, 0.0));
    let Some(((x0, y0, z0), (x1, y1, z1))) = contours.bounds() else {
        // 参数已经验证过, 因此这里不可能失败.
        return fallback.unwrap();
    };
    let (sx, sy, sz) = spacing;
    let (px, py, pz) = spec.pad_voxels();

    let nx = ((x1 - x0) / sx).ceil() as usize + 2 * px;
    let ny = ((y1 - y0) / sy).ceil() as usize + 2 * py;
    let nz = ((z1 - z0) / sz).round() as usize + 1 + 2 * pz;
    let origin = (
        x0 - px as f64 * sx,
        y0 - py as f64 * sy,
        z0 - (pz as f64 + 0.5) * sz,
    );
    match Grid::new((nx, ny, nz), spacing, origin) {
        Some(grid) => grid,
        None => fallback.unwrap(),
    }
}

/// 将每个合法轮廓分配到 `grid` 的某一层. 不在网格 z 范围内的轮廓被丢弃.
fn group_by_layer(grid: &Grid, contours: &ContourSet) -> Vec<Vec<Vec<Point2>>> {
    let mut layers = vec![Vec::new(); grid.len_z()];
    let mut dropped = 0usize;
    for c in contours.contours().iter().filter(|c| c.is_valid()) {
        match grid.layer_of_z(c.slice_position_mm()) {
            Some(k) => layers[k].push(c.xy()),
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        debug!("rasterize: {dropped} contours fall outside the grid z range");
    }
    layers
}

/// 将 `contours` 栅格化到调用方给定的 `grid` 上.
///
/// 两个不同的层可以借此共享同一套晶格. 超出网格的部分被裁剪.
pub fn rasterize_onto(grid: Grid, contours: &ContourSet) -> ScalarField {
    let (nx, ny, nz) = grid.sizes();
    debug!("rasterize onto {nx} x {ny} x {nz} grid");
    let layers = group_by_layer(&grid, contours);
    let mut field = ScalarField::empty_mask(grid);
    for (mut layer, loops) in field.layer_iter_mut().zip(layers.iter()) {
        fill_layer(&mut layer, &grid, loops);
    }
    field
}

/// 借助 `rayon`, 并行地栅格化每一层. 结果与 [`rasterize_with`] 完全相同.
#[cfg(feature = "rayon")]
pub fn par_rasterize(contours: &ContourSet, spec: &RasterSpec) -> ScalarField {
    let grid = fit_grid(contours, spec);
    let layers = group_by_layer(&grid, contours);
    let mut field = ScalarField::empty_mask(grid);
    field.par_for_each_indexed_layer_mut(|k, mut layer| {
        fill_layer(&mut layer, &grid, &layers[k]);
    });
    field
}

/// 按照奇偶规则扫描填充一层中的全部多边形.
fn fill_layer(layer: &mut LayerViewMut, grid: &Grid, loops: &[Vec<Point2>]) {
    if loops.is_empty() {
        return;
    }
    let (oy, sy) = (grid.origin_mm().1, grid.spacing_mm().1);
    let mut xs = Vec::with_capacity(8);
    for h in 0..layer.height() {
        let y = oy + (h as f64 + 0.5) * sy;
        for poly in loops {
            xs.clear();
            xs.extend(scanline_crossings(poly, y));
            xs.sort_by(f64::total_cmp);
            for pair in xs.chunks_exact(2) {
                let wa = grid.continuous_w(pair[0]).ceil().max(0.0);
                let wb = grid.continuous_w(pair[1]).floor();
                if wb >= wa {
                    layer.fill_run(h, wa as usize, wb as usize);
                }
            }
        }
    }
}

/// 水平线 `y` 与多边形各边交点的 x 坐标 (半开规则, 顶点不会重复计数).
fn scanline_crossings(poly: &[Point2], y: f64) -> impl Iterator<Item = f64> + '_ {
    crate::polygon::edges(poly).filter_map(move |((x1, y1), (x2, y2))| {
        ((y1 <= y) != (y2 <= y)).then(|| x1 + (y - y1) * (x2 - x1) / (y2 - y1))
    })
}

/// 单个轮廓的栅格化, 位于 `grid` 上.
#[inline]
pub fn rasterize_contour(grid: Grid, contour: &Contour) -> ScalarField {
    rasterize_onto(grid, &ContourSet::new(vec![contour.clone()]))
}
