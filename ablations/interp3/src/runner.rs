//! 程序运行函数.

use crate::algos::Setup;
use crate::result::AblationResult;
use std::thread;
use utils::loader;

/// 实际运行.
pub fn run() -> AblationResult {
    let setup = Setup {
        slice_mm: loader::slice_mm_from_env_or_default(),
        stride: loader::stride_from_env_or_default(),
        samples: loader::samples_from_env_or_default(),
    };
    let phantoms = utils::phantoms(setup.slice_mm);
    assert!(!phantoms.is_empty(), "No phantom generated");

    println!("Running ablation studies with {setup:?}...");
    thread::scope(|s| {
        use super::algos::*;

        let p = phantoms.as_slice();
        let handles = [polar, arc_length, distance_field].map(|t| s.spawn(move || t(p, setup)));

        AblationResult::from_iter(
            ["polar", "arc-length", "distance-field"].into_iter().zip(
                handles
                    .into_iter()
                    .map(|th| th.join().expect("Thread joining error")),
            ),
        )
    })
}
