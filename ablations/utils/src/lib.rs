//! 消融实验依赖的通用组件.

use rt_berry::{Contour, ContourSet, Point2};
use std::f64::consts::TAU;

pub mod loader;

const SEP: &str = "-------------------------------------------------------------------------------------------------------";

/// 每个体模轮廓的顶点数.
const PHANTOM_VERTICES: usize = 96;

/// 向 `w` 写入一条分隔线.
#[inline]
pub fn sep_to<W: std::io::Write>(mut w: W) {
    writeln!(&mut w, "{SEP}").unwrap();
}

/// 以 `c` 为中心, 半轴为 `(rx, ry)` 的椭圆轮廓.
pub fn ellipse(z: f64, c: Point2, (rx, ry): Point2) -> Contour {
    Contour::from_xy(
        z,
        (0..PHANTOM_VERTICES).map(|i| {
            let a = TAU * i as f64 / PHANTOM_VERTICES as f64;
            (c.0 + rx * a.cos(), c.1 + ry * a.sin())
        }),
    )
}

/// 合成体模: 名称, 以及每 `slice_mm` 一层的全部真值轮廓.
pub struct Phantom {
    pub name: &'static str,
    pub truth: ContourSet,
}

impl Phantom {
    /// 每隔 `stride` 层保留一层, 作为插值的关键层. 首末层总是保留.
    pub fn keyframes(&self, stride: usize) -> ContourSet {
        let slices = self.truth.slices();
        let last = slices.len().saturating_sub(1);
        slices
            .into_iter()
            .enumerate()
            .filter(|(k, _)| k % stride.max(1) == 0 || *k == last)
            .flat_map(|(_, (_, cs))| cs.iter().cloned())
            .collect()
    }
}

/// 在 `[-half, half]` 上每 `slice_mm` 取一层, 对每层调用 `shape`.
fn stack<F>(name: &'static str, half: f64, slice_mm: f64, shape: F) -> Phantom
where
    F: Fn(f64) -> Vec<Contour>,
{
    let n = (2.0 * half / slice_mm).floor() as usize;
    let truth = (0..=n)
        .map(|k| -half + k as f64 * slice_mm)
        .flat_map(shape)
        .collect();
    Phantom { name, truth }
}

/// 一组用于比较插值算法的合成体模.
///
/// 1. 球体: 半径 30 毫米.
/// 2. 椭球: 半轴 40, 20, 25 毫米.
/// 3. 斜圆柱: 半径 15 毫米, 中心随 z 线性漂移.
/// 4. 扭转椭圆柱: 长短轴在层间交换.
pub fn phantoms(slice_mm: f64) -> Vec<Phantom> {
    let sphere = stack("sphere", 29.0, slice_mm, |z| {
        vec![ellipse(z, (0.0, 0.0), {
            let r = (30.0f64.powi(2) - z * z).sqrt();
            (r, r)
        })]
    });
    let ellipsoid = stack("ellipsoid", 24.0, slice_mm, |z| {
        let k = (1.0 - (z / 25.0).powi(2)).sqrt();
        vec![ellipse(z, (10.0, -5.0), (40.0 * k, 20.0 * k))]
    });
    let oblique = stack("oblique", 30.0, slice_mm, |z| {
        vec![ellipse(z, (0.5 * z, 0.25 * z), (15.0, 15.0))]
    });
    let twisted = stack("twisted", 30.0, slice_mm, |z| {
        let t = (z + 30.0) / 60.0;
        vec![ellipse(z, (0.0, 0.0), (10.0 + 20.0 * t, 30.0 - 20.0 * t))]
    });
    vec![sphere, ellipsoid, oblique, twisted]
}
