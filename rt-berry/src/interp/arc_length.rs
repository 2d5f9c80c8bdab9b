use ordered_float::OrderedFloat;

use crate::consts::DEGENERATE_AREA_MM2;
use crate::error::{GeoResult, GeometryError};
use crate::polygon;
use crate::Point2;

use super::{lerp, lerp2};

/// 将多边形统一为逆时针方向, 平移到以质心为原点, 再按等弧长重采样 `n` 个点.
///
/// 返回 `(重采样点, 质心, 面积)`.
fn normalize(poly: &[Point2], n: usize) -> GeoResult<(Vec<Point2>, Point2, f64)> {
    let c = polygon::centroid(poly)?;
    let mut ccw = polygon::to_ccw(poly.to_vec());
    polygon::translate(&mut ccw, (-c.0, -c.1));
    let pts = polygon::resample_by_arc_length(&ccw, n)?;
    Ok((pts, c, polygon::area(poly)))
}

/// `a[i]` 与 `b[(i + k) % n]` 一一对应时的距离平方和.
fn match_cost(a: &[Point2], b: &[Point2], k: usize) -> f64 {
    let n = a.len();
    a.iter()
        .enumerate()
        .map(|(i, &p)| {
            let q = b[(i + k) % n];
            (p.0 - q.0).powi(2) + (p.1 - q.1).powi(2)
        })
        .sum()
}

/// 寻找使 [`match_cost`] 最小的循环偏移量.
///
/// 先以 `max(1, n / 32)` 为步长粗搜索, 再在最优位置前后一个步长内逐个精搜索.
fn best_offset(a: &[Point2], b: &[Point2]) -> usize {
    let n = a.len();
    let step = (n / 32).max(1);

    let coarse = (0..n)
        .step_by(step)
        .min_by_key(|&k| OrderedFloat(match_cost(a, b, k)))
        .unwrap_or(0);
    (0..=2 * step)
        .map(|d| (coarse + n + d - step) % n)
        .min_by_key(|&k| OrderedFloat(match_cost(a, b, k)))
        .unwrap_or(coarse)
}

/// 弧长插值.
///
/// 1. 两个多边形统一为逆时针方向, 并各自平移到以质心为原点.
/// 2. 各自按等弧长重采样 `samples` 个点, 寻找最佳循环对齐.
/// 3. 对应点线性插值, 将结果平移到自身质心, 等比缩放到两侧面积的线性插值,
///   最后平移到两侧质心的线性插值处.
///
/// 因此结果的面积与质心都恰好是线性插值. 返回恰好 `samples` 个点.
///
/// # 错误
///
/// 1. 任一多边形少于 3 个点或面积为零时返回输入非法类错误.
/// 2. `samples < 3` 时返回 [`GeometryError::InvalidInput`].
/// 3. 插值结果退化时返回 [`GeometryError::AlgorithmFailure`].
pub fn arc_length(a: &[Point2], b: &[Point2], t: f64, samples: usize) -> GeoResult<Vec<Point2>> {
    if samples < 3 {
        return Err(GeometryError::InvalidInput(format!("{samples} samples")));
    }
    let (pa, ca, area_a) = normalize(a, samples)?;
    let (pb, cb, area_b) = normalize(b, samples)?;
    let k = best_offset(&pa, &pb);

    let mut ans: Vec<Point2> = pa
        .iter()
        .enumerate()
        .map(|(i, &p)| lerp2(p, pb[(i + k) % samples], t))
        .collect();

    let current = polygon::area(&ans);
    if current < DEGENERATE_AREA_MM2 {
        return Err(GeometryError::AlgorithmFailure(format!(
            "arc-length result has area {current}"
        )));
    }
    let own = polygon::centroid(&ans)
        .map_err(|e| GeometryError::AlgorithmFailure(format!("arc-length centroid: {e}")))?;
    polygon::translate(&mut ans, (-own.0, -own.1));
    let target = lerp(area_a, area_b, t);
    polygon::scale_about(&mut ans, (0.0, 0.0), (target / current).sqrt());
    polygon::translate(&mut ans, lerp2(ca, cb, t));
    Ok(ans)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    fn rect(x0: f64, y0: f64, w: f64, h: f64) -> Vec<Point2> {
        vec![(x0, y0), (x0 + w, y0), (x0 + w, y0 + h), (x0, y0 + h)]
    }

    #[test]
    fn test_area_and_centroid_are_lerp() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        let mut b = rect(30.0, 10.0, 20.0, 4.0);
        // 方向不同也没关系.
        b.reverse();
        let t = 0.3;
        let out = arc_length(&a, &b, t, 64).unwrap();
        assert_eq!(out.len(), 64);

        assert!(f64_eq(polygon::area(&out), lerp(100.0, 80.0, t)));
        let (cx, cy) = polygon::centroid(&out).unwrap();
        assert!(f64_eq(cx, lerp(5.0, 40.0, t)));
        assert!(f64_eq(cy, lerp(5.0, 12.0, t)));
    }

    #[test]
    fn test_offset_search_aligns_rotated_start() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        // 同一个正方形, 但起点不同.
        let b = vec![(10.0, 10.0), (0.0, 10.0), (0.0, 0.0), (10.0, 0.0)];
        let out = arc_length(&a, &b, 0.5, 40).unwrap();
        let expected = polygon::resample_by_arc_length(&a, 40).unwrap();
        for (p, q) in out.iter().zip(expected.iter()) {
            assert!(f64_eq(p.0, q.0) && f64_eq(p.1, q.1));
        }
    }

    #[test]
    fn test_degenerate_input() {
        let line = vec![(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)];
        let a = rect(0.0, 0.0, 1.0, 1.0);
        assert!(matches!(
            arc_length(&a, &line, 0.5, 16),
            Err(GeometryError::DegeneratePolygon(_))
        ));
        assert!(arc_length(&a, &a, 0.5, 2).is_err());
    }
}
