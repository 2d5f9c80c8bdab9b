//! 层间形状插值: 由两个已知层的轮廓合成中间层的轮廓.
//!
//! 极坐标与弧长两种算法都只使用每一侧面积最大的轮廓, 其余的岛被忽略;
//! 距离场算法则会使用两侧的全部轮廓.

use std::fmt;
use std::str::FromStr;

use crate::config::InterpSpec;
use crate::error::{GeoResult, GeometryError};
use crate::{polygon, Contour, Point2};

mod arc_length;
mod polar;
mod sdf;

pub use arc_length::arc_length;
pub use polar::polar;
pub use sdf::distance_field;

/// 插值算法.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InterpAlgorithm {
    /// 从质心发出等角度射线, 对射线长度做线性插值.
    Polar,

    /// 等弧长重采样, 循环对齐后对对应点做线性插值.
    ArcLength,

    /// 对两侧的带符号距离场做线性混合后取零等值面.
    DistanceField,
}

impl fmt::Display for InterpAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Polar => "polar",
            Self::ArcLength => "arc-length",
            Self::DistanceField => "distance-field",
        };
        f.write_str(name)
    }
}

impl FromStr for InterpAlgorithm {
    type Err = GeometryError;

    /// 接受 `polar`, `arc` / `arc-length`, `sdf` / `distance-field` (不区分大小写).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "polar" => Ok(Self::Polar),
            "arc" | "arc-length" | "arc_length" => Ok(Self::ArcLength),
            "sdf" | "distance-field" | "distance_field" => Ok(Self::DistanceField),
            other => Err(GeometryError::InvalidInput(format!(
                "unknown interpolation algorithm `{other}`"
            ))),
        }
    }
}

/// 标量线性插值.
#[inline]
pub(crate) fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// 平面点线性插值.
#[inline]
pub(crate) fn lerp2((ax, ay): Point2, (bx, by): Point2, t: f64) -> Point2 {
    (lerp(ax, bx, t), lerp(ay, by, t))
}

/// 目标层在 `(z1, z2)` 中的比例 `t = (target - z1) / (z2 - z1)`.
///
/// # 错误
///
/// `t` 不严格位于 `(0, 1)` 之间 (包括 `z1 == z2`) 时返回 [`GeometryError::OutOfInterval`].
pub fn interpolation_ratio(z1: f64, z2: f64, target_z: f64) -> GeoResult<f64> {
    let t = (target_z - z1) / (z2 - z1);
    if t > 0.0 && t < 1.0 {
        Ok(t)
    } else {
        Err(GeometryError::OutOfInterval(t))
    }
}

/// 在两个轮廓之间插值出位于 `target_z` 的轮廓. 两个轮廓的层位置即插值区间.
///
/// 距离场算法在这里只使用这两个轮廓. 需要使用全部岛时请调用 [`interpolate_slices`].
///
/// # 错误
///
/// 1. 轮廓少于 3 个点或面积为零, 或 `target_z` 不在区间内时, 返回输入非法类的错误.
/// 2. 算法失败时返回 [`GeometryError::AlgorithmFailure`].
pub fn interpolate(
    a: &Contour,
    b: &Contour,
    target_z: f64,
    spec: &InterpSpec,
) -> GeoResult<Contour> {
    let t = interpolation_ratio(a.slice_position_mm(), b.slice_position_mm(), target_z)?;
    match spec.algorithm() {
        InterpAlgorithm::DistanceField => {
            let mut v = distance_field(
                std::slice::from_ref(a),
                std::slice::from_ref(b),
                t,
                target_z,
                spec.sdf_spacing_mm(),
            )?;
            let best = v
                .iter()
                .enumerate()
                .max_by(|x, y| x.1.area_mm2().total_cmp(&y.1.area_mm2()))
                .map(|(i, _)| i)
                .ok_or_else(|| GeometryError::AlgorithmFailure("empty blend".to_string()))?;
            Ok(v.swap_remove(best))
        }
        algo => {
            let pts = interpolate_loops(&a.xy(), &b.xy(), t, algo, spec)?;
            Ok(Contour::from_xy(target_z, pts))
        }
    }
}

/// 单一轮廓算法 (极坐标或弧长) 的分派.
fn interpolate_loops(
    a: &[Point2],
    b: &[Point2],
    t: f64,
    algo: InterpAlgorithm,
    spec: &InterpSpec,
) -> GeoResult<Vec<Point2>> {
    match algo {
        InterpAlgorithm::ArcLength => arc_length(a, b, t, spec.samples()),
        _ => polar(a, b, t, spec.samples(), spec.smoothing_window()),
    }
}

/// 在两个层之间插值出位于 `target_z` 的全部轮廓.
///
/// 极坐标与弧长算法只使用每侧面积最大的合法轮廓, 结果至多一个轮廓;
/// 距离场算法使用全部轮廓, 结果可能含有多个岛.
///
/// # 错误
///
/// 同 [`interpolate`]. 任意一侧没有合法轮廓时返回 [`GeometryError::InvalidInput`].
pub fn interpolate_slices(
    (z_a, contours_a): (f64, &[Contour]),
    (z_b, contours_b): (f64, &[Contour]),
    target_z: f64,
    spec: &InterpSpec,
) -> GeoResult<Vec<Contour>> {
    let t = interpolation_ratio(z_a, z_b, target_z)?;
    let (Some(a), Some(b)) = (
        polygon::largest_loop(contours_a),
        polygon::largest_loop(contours_b),
    ) else {
        return Err(GeometryError::InvalidInput(format!(
            "no valid contour at z = {z_a} or z = {z_b}"
        )));
    };
    match spec.algorithm() {
        InterpAlgorithm::DistanceField => distance_field(
            contours_a,
            contours_b,
            t,
            target_z,
            spec.sdf_spacing_mm(),
        ),
        algo => {
            let pts = interpolate_loops(&a.xy(), &b.xy(), t, algo, spec)?;
            Ok(vec![Contour::from_xy(target_z, pts)])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circle(z: f64, c: Point2, r: f64, n: usize) -> Contour {
        Contour::from_xy(
            z,
            (0..n).map(|i| {
                let a = std::f64::consts::TAU * i as f64 / n as f64;
                (c.0 + r * a.cos(), c.1 + r * a.sin())
            }),
        )
    }

    #[test]
    fn test_ratio_open_interval() {
        assert_eq!(interpolation_ratio(0.0, 10.0, 5.0), Ok(0.5));
        assert_eq!(interpolation_ratio(10.0, 0.0, 7.5), Ok(0.25));
        assert!(interpolation_ratio(0.0, 10.0, 0.0).is_err());
        assert!(interpolation_ratio(0.0, 10.0, 10.0).is_err());
        assert!(interpolation_ratio(3.0, 3.0, 3.0).is_err());
    }

    #[test]
    fn test_algorithm_names() {
        for algo in [
            InterpAlgorithm::Polar,
            InterpAlgorithm::ArcLength,
            InterpAlgorithm::DistanceField,
        ] {
            assert_eq!(algo.to_string().parse::<InterpAlgorithm>(), Ok(algo));
        }
        assert_eq!("SDF".parse::<InterpAlgorithm>(), Ok(InterpAlgorithm::DistanceField));
        assert!("spline".parse::<InterpAlgorithm>().is_err());
    }

    #[test]
    fn test_target_on_boundary_is_empty() {
        let a = circle(0.0, (0.0, 0.0), 20.0, 64);
        let b = circle(10.0, (0.0, 0.0), 20.0, 64);
        let spec = InterpSpec::default();
        assert!(matches!(
            interpolate(&a, &b, 0.0, &spec),
            Err(GeometryError::OutOfInterval(_))
        ));
    }

    #[test]
    fn test_largest_loop_only() {
        // 面积 50 与 200 的两个岛, 只有 200 的参与插值.
        let small = Contour::from_xy(0.0, [(100.0, 0.0), (110.0, 0.0), (110.0, 5.0), (100.0, 5.0)]);
        let big = Contour::from_xy(0.0, [(0.0, 0.0), (20.0, 0.0), (20.0, 10.0), (0.0, 10.0)]);
        let other = Contour::from_xy(10.0, [(0.0, 0.0), (20.0, 0.0), (20.0, 10.0), (0.0, 10.0)]);
        let spec = InterpSpec::default().with(InterpAlgorithm::ArcLength);
        let out = interpolate_slices(
            (0.0, &[small, big][..]),
            (10.0, std::slice::from_ref(&other)),
            5.0,
            &spec,
        )
        .unwrap();
        assert_eq!(out.len(), 1);
        assert!((out[0].area_mm2() - 200.0).abs() < 1e-6);
        let (cx, cy) = out[0].centroid().unwrap();
        assert!((cx - 10.0).abs() < 1e-6 && (cy - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_no_valid_side() {
        let a = circle(0.0, (0.0, 0.0), 5.0, 16);
        let spec = InterpSpec::default();
        assert!(matches!(
            interpolate_slices((0.0, &[a][..]), (4.0, &[][..]), 2.0, &spec),
            Err(GeometryError::InvalidInput(_))
        ));
    }
}
