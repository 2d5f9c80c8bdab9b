//! 在一个结构的关键层之间寻找需要插值的空隙.

use log::warn;

use crate::consts::GAP_FACTOR;
use crate::worker::InterpolationGap;
use crate::ContourSet;

/// 扫描 `set` 的关键层, 为间距超过 `1.5 * slice_thickness_mm` 的相邻关键层构建空隙.
///
/// 目标层从下方关键层开始每隔一个层厚放置一个, 严格位于两个关键层之间.
/// 层厚不是正有限值, 或存在非有限的层位置时返回空结果.
pub fn find_gaps(set: &ContourSet, slice_thickness_mm: f64) -> Vec<InterpolationGap> {
    if !(slice_thickness_mm.is_finite() && slice_thickness_mm > 0.0) {
        warn!("find_gaps: slice thickness {slice_thickness_mm} is not valid");
        return vec![];
    }
    if let Some(c) = set
        .contours()
        .iter()
        .find(|c| !c.slice_position_mm().is_finite())
    {
        warn!("find_gaps: slice position {} is not finite", c.slice_position_mm());
        return vec![];
    }
    let eps = 1e-6 * slice_thickness_mm;
    set.slices()
        .windows(2)
        .filter_map(|pair| {
            let ((z_a, a), (z_b, b)) = (pair[0], pair[1]);
            if z_b - z_a <= GAP_FACTOR * slice_thickness_mm {
                return None;
            }
            let target_zs: Vec<f64> = (1..)
                .map(|k| z_a + k as f64 * slice_thickness_mm)
                .take_while(|z| *z < z_b - eps)
                .collect();
            Some(InterpolationGap {
                z_a,
                contours_a: a.to_vec(),
                z_b,
                contours_b: b.to_vec(),
                target_zs,
            })
        })
        .collect()
}
