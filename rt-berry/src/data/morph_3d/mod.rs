//! 3D 形态学操作: 基于距离变换的外扩与内缩.
//!
//! 网格是 2.5D 的层堆叠, 但形态学操作在三个方向上都按实际分辨率进行.

use log::debug;

use crate::config::MarginSpec;
use crate::consts::occupancy::{INSIDE, OUTSIDE};
use crate::error::{GeoResult, GeometryError};
use crate::ScalarField;

mod edt;

pub use edt::{distance_transform, seeded};

/// 外扩修正值, 单位: 毫米. 即水平方向平均分辨率的一半.
///
/// 参考计划系统以体素边界而非体素中心度量外扩距离, 追加该修正后两者结果接近.
#[inline]
pub fn correction_mm(field: &ScalarField) -> f64 {
    let (sx, sy, _) = field.grid().spacing_mm();
    0.5 * (sx + sy) / 2.0
}

/// 带符号边距操作: 正数外扩, 负数内缩, 零返回深拷贝.
///
/// 外扩结果位于更大的网格上; 内缩结果位于仅扩展了 1 个体素的网格上.
/// 两种情况下新网格都与输入网格共享同一晶格.
///
/// # 错误
///
/// `margin_mm` 不是有限值时返回 [`GeometryError::InvalidInput`].
pub fn apply_margin(
    field: &ScalarField,
    margin_mm: f64,
    use_correction: bool,
) -> GeoResult<ScalarField> {
    let spec = MarginSpec::new(margin_mm, use_correction)
        .ok_or_else(|| GeometryError::InvalidInput(format!("margin {margin_mm} is not finite")))?;
    Ok(apply_margin_with(field, &spec))
}

/// 以已经验证过的参数执行边距操作.
pub fn apply_margin_with(field: &ScalarField, spec: &MarginSpec) -> ScalarField {
    let m = spec.margin_mm();
    if m == 0.0 {
        return field.clone();
    }
    if field.is_empty_mask() {
        debug!("margin {m} on an empty mask, skipping distance transform");
        return field.to_mask();
    }
    if m > 0.0 {
        expand(field, m, spec.use_correction())
    } else {
        shrink(field, -m)
    }
}

/// 外扩 `margin_mm` (正数).
///
/// 网格每侧扩展 `ceil(有效边距 / 分辨率) + 1` 个体素. 以原有内部体素为种子做距离变换,
/// 距离平方不超过有效边距平方的体素位于结果内部.
pub fn expand(field: &ScalarField, margin_mm: f64, use_correction: bool) -> ScalarField {
    debug_assert!(margin_mm > 0.0);
    let effective = if use_correction {
        margin_mm + correction_mm(field)
    } else {
        margin_mm
    };
    let (sx, sy, sz) = field.grid().spacing_mm();
    let pad = |s: f64| (effective / s).ceil() as usize + 1;
    let pads = (pad(sx), pad(sy), pad(sz));

    let mask = field.to_mask().padded(pads, OUTSIDE);
    let (nx, ny, nz) = mask.grid().sizes();
    debug!("expand {effective:.3} mm onto {nx} x {ny} x {nz} grid");

    let mut dist = seeded(*mask.grid(), |p| mask.is_inside(p));
    distance_transform(&mut dist);

    let limit = effective * effective * (1.0 + 1e-12);
    dist.map(|d| if d <= limit { INSIDE } else { OUTSIDE })
}

/// 内缩 `margin_mm` (正数).
///
/// 网格每侧扩展 1 个体素, 以 6-相邻于内部体素的外部体素为种子做距离变换.
/// 内部体素的带符号距离取负, 只有比边距更深的体素才被保留.
pub fn shrink(field: &ScalarField, margin_mm: f64) -> ScalarField {
    debug_assert!(margin_mm > 0.0);
    let mask = field.to_mask().padded((1, 1, 1), OUTSIDE);
    let grid = *mask.grid();
    let (nx, ny, nz) = grid.sizes();
    debug!("shrink {margin_mm:.3} mm on {nx} x {ny} x {nz} grid");

    let mut dist = seeded(grid, |p| {
        !mask.is_inside(p)
            && grid
                .diamond_neighbours(p)
                .into_iter()
                .any(|nb| mask.is_inside(nb))
    });
    distance_transform(&mut dist);

    let limit = margin_mm * margin_mm;
    let mut ans = ScalarField::empty_mask(grid);
    for (pos, v) in ans.data_mut().indexed_iter_mut() {
        if mask.is_inside(pos) {
            let signed = -dist[pos];
            if signed < -limit {
                *v = INSIDE;
            }
        }
    }
    ans
}
