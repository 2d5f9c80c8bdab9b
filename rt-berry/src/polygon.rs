//! 平面多边形的基础几何计算.
//!
//! 所有多边形都隐式闭合, 即最后一个点与第一个点之间存在一条边.
//! 坐标单位均为毫米.

use crate::consts::DEGENERATE_AREA_MM2;
use crate::error::{GeoResult, GeometryError};
use crate::{Contour, Point2};

#[inline]
fn cross((ax, ay): Point2, (bx, by): Point2) -> f64 {
    ax * by - ay * bx
}

#[inline]
fn sub((ax, ay): Point2, (bx, by): Point2) -> Point2 {
    (ax - bx, ay - by)
}

/// 闭合多边形的边, 以 `(起点, 终点)` 的形式迭代.
#[inline]
pub fn edges(poly: &[Point2]) -> impl Iterator<Item = (Point2, Point2)> + '_ {
    let n = poly.len();
    (0..n).map(move |i| (poly[i], poly[(i + 1) % n]))
}

/// 鞋带公式求有向面积. 逆时针 (y 轴向上) 为正.
pub fn signed_area(poly: &[Point2]) -> f64 {
    if poly.len() < 3 {
        return 0.0;
    }
    0.5 * edges(poly).map(|(p, q)| cross(p, q)).sum::<f64>()
}

/// 多边形面积 (非负).
#[inline]
pub fn area(poly: &[Point2]) -> f64 {
    signed_area(poly).abs()
}

/// 多边形周长.
pub fn perimeter(poly: &[Point2]) -> f64 {
    edges(poly).map(|(p, q)| dist(p, q)).sum()
}

/// 两点间欧氏距离.
#[inline]
pub fn dist(p: Point2, q: Point2) -> f64 {
    let (dx, dy) = sub(p, q);
    dx.hypot(dy)
}

/// 面积加权质心.
///
/// # 错误
///
/// 1. 少于 3 个点时返回 [`GeometryError::InvalidInput`].
/// 2. 面积接近零时返回 [`GeometryError::DegeneratePolygon`].
pub fn centroid(poly: &[Point2]) -> GeoResult<Point2> {
    if poly.len() < 3 {
        return Err(GeometryError::InvalidInput(format!(
            "polygon has {} points",
            poly.len()
        )));
    }
    let a = signed_area(poly);
    if a.abs() < DEGENERATE_AREA_MM2 {
        return Err(GeometryError::DegeneratePolygon(a.abs()));
    }
    let (mut cx, mut cy) = (0.0, 0.0);
    for (p, q) in edges(poly) {
        let c = cross(p, q);
        cx += (p.0 + q.0) * c;
        cy += (p.1 + q.1) * c;
    }
    Ok((cx / (6.0 * a), cy / (6.0 * a)))
}

/// 以 `center` 为中心的顶点协方差主轴方向角 (弧度, 位于 `(-π/2, π/2]`).
///
/// 即 2×2 协方差矩阵 `[[cxx, cxy], [cxy, cyy]]` 的最大特征值对应特征向量的方向,
/// 由 `0.5 * atan2(2cxy, cxx - cyy)` 直接得到.
pub fn principal_angle(poly: &[Point2], center: Point2) -> f64 {
    let (mut cxx, mut cyy, mut cxy) = (0.0, 0.0, 0.0);
    for &p in poly {
        let (dx, dy) = sub(p, center);
        cxx += dx * dx;
        cyy += dy * dy;
        cxy += dx * dy;
    }
    0.5 * (2.0 * cxy).atan2(cxx - cyy)
}

/// 多边形是否为逆时针方向?
#[inline]
pub fn is_ccw(poly: &[Point2]) -> bool {
    signed_area(poly) >= 0.0
}

/// 将多边形统一为逆时针方向.
pub fn to_ccw(mut poly: Vec<Point2>) -> Vec<Point2> {
    if !is_ccw(&poly) {
        poly.reverse();
    }
    poly
}

/// 将多边形所有点平移 `(dx, dy)`.
pub fn translate(poly: &mut [Point2], (dx, dy): Point2) {
    for p in poly.iter_mut() {
        p.0 += dx;
        p.1 += dy;
    }
}

/// 以 `center` 为中心, 将多边形缩放 `k` 倍.
pub fn scale_about(poly: &mut [Point2], center: Point2, k: f64) {
    for p in poly.iter_mut() {
        p.0 = center.0 + (p.0 - center.0) * k;
        p.1 = center.1 + (p.1 - center.1) * k;
    }
}

/// 从 `origin` 沿单位方向 `dir` 出发的射线与多边形各边的最远交点距离.
///
/// 射线与任何边都不相交时返回 `None`.
pub fn ray_max_hit(poly: &[Point2], origin: Point2, dir: Point2) -> Option<f64> {
    let mut ans: Option<f64> = None;
    for (p, q) in edges(poly) {
        let e = sub(q, p);
        let denom = cross(dir, e);
        if denom.abs() < 1e-12 {
            continue;
        }
        let w = sub(p, origin);
        let t = cross(w, e) / denom;
        let u = cross(w, dir) / denom;
        if t > 0.0 && (0.0..=1.0).contains(&u) {
            ans = Some(ans.map_or(t, |v| v.max(t)));
        }
    }
    ans
}

/// 顶点在单位方向 `dir` 上的最大正投影. 不存在正投影时返回 0.
pub fn max_projection(poly: &[Point2], origin: Point2, dir: Point2) -> f64 {
    poly.iter()
        .map(|&p| {
            let (dx, dy) = sub(p, origin);
            dx * dir.0 + dy * dir.1
        })
        .fold(0.0, f64::max)
}

/// 沿闭合多边形按等弧长重采样 `n` 个点. 第一个采样点即多边形的第一个点.
///
/// # 错误
///
/// 多边形少于 3 个点或周长为零时返回 [`GeometryError::InvalidInput`].
pub fn resample_by_arc_length(poly: &[Point2], n: usize) -> GeoResult<Vec<Point2>> {
    let total = perimeter(poly);
    if poly.len() < 3 || n == 0 || total <= f64::EPSILON {
        return Err(GeometryError::InvalidInput(format!(
            "cannot resample polygon of {} points, perimeter {total}",
            poly.len()
        )));
    }
    let step = total / n as f64;
    let mut ans = Vec::with_capacity(n);
    let mut it = edges(poly);
    // 当前边及其起点处的累计弧长.
    let Some(mut edge) = it.next() else {
        unreachable!()
    };
    let mut edge_len = dist(edge.0, edge.1);
    let mut walked = 0.0;

    for i in 0..n {
        let s = i as f64 * step;
        while s > walked + edge_len {
            match it.next() {
                Some(e) => {
                    walked += edge_len;
                    edge = e;
                    edge_len = dist(e.0, e.1);
                }
                // 浮点误差导致越过最后一条边.
                None => break,
            }
        }
        let k = if edge_len > 0.0 {
            ((s - walked) / edge_len).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let (p, q) = edge;
        ans.push((p.0 + (q.0 - p.0) * k, p.1 + (q.1 - p.1) * k));
    }
    Ok(ans)
}

/// 环形滑动平均. `window` 为窗口宽度, 偶数宽度按 `window + 1` 处理.
///
/// `window <= 1` 或数据为空时原样返回.
pub fn circular_smooth(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    if window <= 1 || n == 0 {
        return values.to_vec();
    }
    let half = (window / 2) as isize;
    let len = (2 * half + 1) as f64;
    (0..n as isize)
        .map(|i| {
            (-half..=half)
                .map(|k| values[(i + k).rem_euclid(n as isize) as usize])
                .sum::<f64>()
                / len
        })
        .collect()
}

/// 从若干轮廓中挑选面积最大的合法轮廓. 面积相同时保留先出现者.
pub fn largest_loop<'a, I>(it: I) -> Option<&'a Contour>
where
    I: IntoIterator<Item = &'a Contour>,
{
    it.into_iter()
        .filter(|c| c.is_valid())
        .map(|c| (c.area_mm2(), c))
        .reduce(|best, cur| if cur.0 > best.0 { cur } else { best })
        .map(|(_, c)| c)
}
