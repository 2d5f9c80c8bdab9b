use std::f64::consts::TAU;

use itertools::izip;

use crate::consts::DEGENERATE_AREA_MM2;
use crate::error::{GeoResult, GeometryError};
use crate::polygon;
use crate::Point2;

use super::{lerp, lerp2};

/// 以 `center` 为原点, 从 `base` 角开始均匀发出 `bins` 条射线,
/// 返回每条射线与多边形的最远交点距离.
///
/// 射线与多边形不相交时, 退回到顶点在该方向上的最大投影.
fn ray_lengths(poly: &[Point2], center: Point2, base: f64, bins: usize) -> Vec<f64> {
    (0..bins)
        .map(|i| {
            let theta = base + TAU * i as f64 / bins as f64;
            let dir = (theta.cos(), theta.sin());
            polygon::ray_max_hit(poly, center, dir)
                .unwrap_or_else(|| polygon::max_projection(poly, center, dir))
        })
        .collect()
}

/// 极坐标插值.
///
/// 1. 两个多边形各自以面积质心为原点.
/// 2. 以 `a` 的协方差主轴方向作为两侧共同的起始角, 各发出 `bins` 条射线.
/// 3. 射线长度做宽度为 `window` 的环形滑动平均后线性插值, 原点同样线性插值.
/// 4. 将结果等比缩放, 使面积恰好为两侧面积的线性插值.
///
/// 返回恰好 `bins` 个点.
///
/// # 错误
///
/// 1. 任一多边形少于 3 个点或面积为零时返回输入非法类错误.
/// 2. `bins < 3` 时返回 [`GeometryError::InvalidInput`].
/// 3. 插值结果面积为零时返回 [`GeometryError::AlgorithmFailure`].
pub fn polar(
    a: &[Point2],
    b: &[Point2],
    t: f64,
    bins: usize,
    window: usize,
) -> GeoResult<Vec<Point2>> {
    if bins < 3 {
        return Err(GeometryError::InvalidInput(format!("{bins} rays")));
    }
    let (ca, cb) = (polygon::centroid(a)?, polygon::centroid(b)?);
    let base = polygon::principal_angle(a, ca);

    let ra = polygon::circular_smooth(&ray_lengths(a, ca, base, bins), window);
    let rb = polygon::circular_smooth(&ray_lengths(b, cb, base, bins), window);
    let center = lerp2(ca, cb, t);

    let mut ans: Vec<Point2> = izip!(0..bins, ra, rb)
        .map(|(i, r1, r2)| {
            let theta = base + TAU * i as f64 / bins as f64;
            let r = lerp(r1, r2, t);
            (center.0 + r * theta.cos(), center.1 + r * theta.sin())
        })
        .collect();

    let current = polygon::area(&ans);
    if current < DEGENERATE_AREA_MM2 {
        return Err(GeometryError::AlgorithmFailure(format!(
            "polar result has area {current}"
        )));
    }
    let target = lerp(polygon::area(a), polygon::area(b), t);
    polygon::scale_about(&mut ans, center, (target / current).sqrt());
    Ok(ans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn circle(c: Point2, r: f64, n: usize) -> Vec<Point2> {
        (0..n)
            .map(|i| {
                let a = TAU * i as f64 / n as f64;
                (c.0 + r * a.cos(), c.1 + r * a.sin())
            })
            .collect()
    }

    #[test]
    fn test_circles_keep_area() {
        let a = circle((0.0, 0.0), 20.0, 90);
        let b = circle((0.0, 0.0), 20.0, 90);
        let out = polar(&a, &b, 0.5, 128, 5).unwrap();
        assert_eq!(out.len(), 128);
        let area = polygon::area(&out);
        assert!((area - PI * 400.0).abs() / (PI * 400.0) < 0.02);
        assert!((area - polygon::area(&a)).abs() < 1e-6);
    }

    #[test]
    fn test_area_is_lerp() {
        let a = circle((0.0, 0.0), 10.0, 64);
        let b: Vec<Point2> = vec![(20.0, 0.0), (40.0, 0.0), (40.0, 10.0), (20.0, 10.0)];
        for t in [0.1, 0.5, 0.9] {
            let out = polar(&a, &b, t, 64, 5).unwrap();
            let target = lerp(polygon::area(&a), polygon::area(&b), t);
            assert!((polygon::area(&out) - target).abs() < 1e-6 * target);
            // 质心近似为线性插值.
            let (cx, _) = polygon::centroid(&out).unwrap();
            assert!((cx - lerp(0.0, 30.0, t)).abs() < 1.5);
        }
    }

    #[test]
    fn test_invalid_inputs() {
        let a = circle((0.0, 0.0), 10.0, 16);
        assert!(polar(&a, &a[..2], 0.5, 16, 3).is_err());
        assert!(polar(&a, &a, 0.5, 2, 3).is_err());
    }
}
