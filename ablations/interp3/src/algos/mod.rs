mod profile;

use rt_berry::prelude::*;
use rt_berry::worker::interpolate_target;
use utils::Phantom;

pub use profile::Profile;

/// 实验参数.
#[derive(Copy, Clone, Debug)]
pub struct Setup {
    /// 真值体模的层厚.
    pub slice_mm: f64,

    /// 关键层间隔.
    pub stride: usize,

    /// 射线数 / 重采样点数.
    pub samples: usize,
}

/// 以 `algo` 插值每个体模的关键层, 与真值层比较面积.
fn run_algo(algo: InterpAlgorithm, phantoms: &[Phantom], setup: Setup) -> Profile {
    let mut profile = Profile::new();
    let spec = InterpSpec::with_algorithm(algo, setup.samples).expect("Invalid setup");
    let tol = 0.25 * setup.slice_mm;

    for phantom in phantoms {
        println!("{algo}: phantom {}...", phantom.name);
        let keys = phantom.keyframes(setup.stride);
        for gap in find_gaps(&keys, setup.slice_mm) {
            for &z in gap.target_zs.iter() {
                let Some(truth) = phantom.truth.largest_at(z, tol) else {
                    continue;
                };
                profile.count_target(true);
                let out = interpolate_target(&gap, z, &spec);
                profile.target_elapsed();

                if out.is_empty() {
                    profile.count_failed();
                    continue;
                }
                let area: f64 = out.iter().map(Contour::area_mm2).sum();
                let expected = truth.area_mm2();
                profile.add_area_error((area - expected).abs() / expected);

                let got = rt_berry::polygon::largest_loop(&out).and_then(Contour::centroid);
                if let (Some(p), Some(q)) = (got, truth.centroid()) {
                    profile.add_centroid_error(rt_berry::polygon::dist(p, q));
                }
            }
        }
    }
    profile.finish()
}

pub fn polar(phantoms: &[Phantom], setup: Setup) -> Profile {
    run_algo(InterpAlgorithm::Polar, phantoms, setup)
}

pub fn arc_length(phantoms: &[Phantom], setup: Setup) -> Profile {
    run_algo(InterpAlgorithm::ArcLength, phantoms, setup)
}

pub fn distance_field(phantoms: &[Phantom], setup: Setup) -> Profile {
    run_algo(InterpAlgorithm::DistanceField, phantoms, setup)
}
