//! 各向异性的可分离距离变换.
//!
//! 沿 x, y, z 三个方向依次做一维平方距离变换. 每一维都求抛物线族的下包络,
//! 因此结果是精确的欧氏距离平方, 与种子分布无关.

use crate::consts::distance::{FAR, SEED};
use crate::{Grid, ScalarField};

/// 坐标轴, 按照扫描顺序 x, y, z 排列.
#[derive(Copy, Clone, Debug)]
enum Axis3 {
    X,
    Y,
    Z,
}

/// 一维下包络的复用缓冲区.
#[derive(Default)]
struct Envelope {
    /// 下包络中的抛物线顶点位置.
    sites: Vec<usize>,

    /// 每条抛物线在下包络中生效的左边界.
    bounds: Vec<f64>,

    /// 当前处理的一条线.
    line: Vec<f64>,
}

impl Envelope {
    /// 对 `self.line` 就地计算 `min_p line[p] + w2 * (q - p)^2`.
    ///
    /// 非有限值不参与下包络. 整条线都没有有限值时保持不变.
    fn transform(&mut self, w2: f64) {
        let f = &mut self.line;
        self.sites.clear();
        self.bounds.clear();
        for q in 0..f.len() {
            if !f[q].is_finite() {
                continue;
            }
            let fq = f[q] + w2 * (q * q) as f64;
            loop {
                let Some(&p) = self.sites.last() else {
                    self.sites.push(q);
                    self.bounds.push(f64::NEG_INFINITY);
                    break;
                };
                let fp = f[p] + w2 * (p * p) as f64;
                let s = (fq - fp) / (2.0 * w2 * (q - p) as f64);
                if self.bounds.last().is_some_and(|b| s <= *b) {
                    self.sites.pop();
                    self.bounds.pop();
                } else {
                    self.sites.push(q);
                    self.bounds.push(s);
                    break;
                }
            }
        }
        if self.sites.is_empty() {
            return;
        }

        // 顶点处的原始值在回写之前读出.
        let heights: Vec<f64> = self.sites.iter().map(|&p| f[p]).collect();
        let mut k = 0;
        for q in 0..f.len() {
            while k + 1 < self.sites.len() && self.bounds[k + 1] < q as f64 {
                k += 1;
            }
            let d = q as f64 - self.sites[k] as f64;
            f[q] = heights[k] + w2 * d * d;
        }
    }
}

/// 一次距离变换所需的网格几何信息.
struct Sweep {
    sizes: (usize, usize, usize),
    spacing: (f64, f64, f64),
}

impl Sweep {
    fn new(grid: &Grid) -> Self {
        let (sx, sy, sz) = grid.spacing_mm();
        Self {
            sizes: grid.sizes(),
            spacing: (sx * sx, sy * sy, sz * sz),
        }
    }

    /// `axis` 方向每条线的 (起点下标列表, 步长, 长度, 分辨率平方).
    fn lines(&self, axis: Axis3) -> (Vec<usize>, usize, usize, f64) {
        let (nx, ny, nz) = self.sizes;
        let plane = nx * ny;
        match axis {
            Axis3::X => ((0..ny * nz).map(|r| r * nx).collect(), 1, nx, self.spacing.0),
            Axis3::Y => (
                (0..nz)
                    .flat_map(|z| (0..nx).map(move |x| x + z * plane))
                    .collect(),
                nx,
                ny,
                self.spacing.1,
            ),
            Axis3::Z => ((0..plane).collect(), plane, nz, self.spacing.2),
        }
    }

    /// 沿 `axis` 的全部线做一维变换.
    fn sweep(&self, axis: Axis3, dist: &mut [f64], env: &mut Envelope) {
        let (starts, stride, len, w2) = self.lines(axis);
        if len <= 1 {
            return;
        }
        for base in starts {
            env.line.clear();
            env.line.extend((0..len).map(|i| dist[base + i * stride]));
            env.transform(w2);
            for (i, v) in env.line.iter().enumerate() {
                dist[base + i * stride] = *v;
            }
        }
    }
}

/// 就地计算距离平方场.
///
/// 输入中值为 [`SEED`] (`0`) 的体素为种子, 其余体素开始时一律视为 [`FAR`].
/// 依次沿 x, y, z 三个方向各做一次一维下包络变换, 每一维都按照该方向的分辨率
/// 计算距离平方.
///
/// 结束后每个体素保存到最近种子中心的精确距离平方 (平方毫米).
/// 没有任何种子时全部体素保持 [`FAR`].
pub fn distance_transform(field: &mut ScalarField) {
    let sweep = Sweep::new(field.grid());
    let dist = field.as_slice_mut();
    let mut any_seed = false;
    for v in dist.iter_mut() {
        if *v == SEED {
            any_seed = true;
        } else {
            *v = FAR;
        }
    }
    if !any_seed {
        return;
    }
    let mut env = Envelope::default();
    for axis in [Axis3::X, Axis3::Y, Axis3::Z] {
        sweep.sweep(axis, dist, &mut env);
    }
}

/// 由占据标记构造种子场: 满足 `is_seed` 的体素为 [`SEED`], 其余为 [`FAR`].
pub fn seeded<F: Fn(crate::Idx3d) -> bool>(grid: Grid, is_seed: F) -> ScalarField {
    let mut ans = ScalarField::filled(grid, FAR);
    for (pos, v) in ans.data_mut().indexed_iter_mut() {
        if is_seed(pos) {
            *v = SEED;
        }
    }
    ans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_single_seed_is_exact() {
        let g = Grid::new((7, 5, 4), (0.5, 1.0, 2.5), (0.0, 0.0, 0.0)).unwrap();
        let seed = (1, 3, 2);
        let mut f = seeded(g, |p| p == seed);
        distance_transform(&mut f);
        for (pos, v) in f.data().indexed_iter() {
            let dz = (pos.0 as f64 - 1.0) * 2.5;
            let dy = (pos.1 as f64 - 3.0) * 1.0;
            let dx = (pos.2 as f64 - 2.0) * 0.5;
            assert!(f64_eq(*v, dx * dx + dy * dy + dz * dz), "{pos:?}");
        }
    }

    #[test]
    fn test_two_seeds_take_nearest() {
        let g = Grid::new((11, 1, 1), (1.0, 1.0, 1.0), (0.0, 0.0, 0.0)).unwrap();
        let mut f = seeded(g, |p| p.2 == 0 || p.2 == 10);
        distance_transform(&mut f);
        assert!(f64_eq(f[(0, 0, 4)], 16.0));
        assert!(f64_eq(f[(0, 0, 5)], 25.0));
        assert!(f64_eq(f[(0, 0, 7)], 9.0));
    }

    #[test]
    fn test_sparse_anisotropic_seeds_match_brute_force() {
        let g = Grid::new((13, 11, 9), (0.8, 0.8, 2.5), (0.0, 0.0, 0.0)).unwrap();
        let seeds = [(0, 0, 0), (8, 10, 12), (4, 2, 9), (2, 9, 3), (6, 5, 0), (1, 1, 11)];
        let mut f = seeded(g, |p| seeds.contains(&p));
        distance_transform(&mut f);
        for (pos, v) in f.data().indexed_iter() {
            let exact = seeds
                .iter()
                .map(|s| {
                    let dz = (pos.0 as f64 - s.0 as f64) * 2.5;
                    let dy = (pos.1 as f64 - s.1 as f64) * 0.8;
                    let dx = (pos.2 as f64 - s.2 as f64) * 0.8;
                    dx * dx + dy * dy + dz * dz
                })
                .fold(f64::INFINITY, f64::min);
            assert!((v - exact).abs() < 1e-6, "{pos:?}: {v} vs {exact}");
        }
    }

    #[test]
    fn test_no_seed_keeps_far() {
        let g = Grid::new((3, 3, 3), (1.0, 1.0, 1.0), (0.0, 0.0, 0.0)).unwrap();
        let mut f = ScalarField::filled(g, 7.0);
        distance_transform(&mut f);
        assert!(f.as_slice().iter().all(|v| *v == FAR));
    }
}
