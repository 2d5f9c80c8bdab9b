//! 从轮廓到体素, 再回到轮廓的完整流程.

use std::f64::consts::{PI, TAU};
use std::sync::Once;

use rt_berry::prelude::*;

static INIT: Once = Once::new();

fn init_logger() {
    INIT.call_once(|| {
        let _ = simple_logger::SimpleLogger::new()
            .with_level(log::LevelFilter::Warn)
            .init();
    });
}

fn square(z: f64, x0: f64, y0: f64, side: f64) -> Contour {
    Contour::from_xy(
        z,
        [
            (x0, y0),
            (x0 + side, y0),
            (x0 + side, y0 + side),
            (x0, y0 + side),
        ],
    )
}

fn circle(z: f64, c: Point2, r: f64, n: usize) -> Contour {
    Contour::from_xy(
        z,
        (0..n).map(|i| {
            let a = TAU * i as f64 / n as f64;
            (c.0 + r * a.cos(), c.1 + r * a.sin())
        }),
    )
}

/// 11 层 100mm 方块, 层间距 1mm.
fn box_structure() -> ContourSet {
    (0..=10).map(|k| square(k as f64, 0.0, 0.0, 100.0)).collect()
}

#[test]
fn test_zero_margin_is_identity() {
    init_logger();
    let mask = rasterize(&box_structure(), (1.0, 1.0, 1.0), 2.0).unwrap();
    let same = apply_margin(&mask, 0.0, true).unwrap();
    assert_eq!(same.grid(), mask.grid());
    assert_eq!(same.as_slice(), mask.as_slice());

    assert!(apply_margin(&mask, f64::NAN, false).is_err());
}

#[test]
fn test_expand_square_by_10mm() {
    init_logger();
    let set = box_structure();
    let mask = rasterize(&set, (1.0, 1.0, 1.0), 2.0).unwrap();
    let grown = apply_margin(&mask, 10.0, false).unwrap();

    let out = extract_contours(&grown, &set.slice_positions(), None, true).unwrap();
    let mid = out.largest_at(5.0, 0.1).unwrap();
    let ((x0, y0), (x1, y1)) = mid.bounds_xy().unwrap();
    // 轮廓点位于体素中心, 因此比物理宽度少一个体素.
    assert!((x1 - x0 - 120.0).abs() <= 1.0, "{x0} .. {x1}");
    assert!((y1 - y0 - 120.0).abs() <= 1.0, "{y0} .. {y1}");

    // 外扩同样作用于 z 方向, 顶层之上出现了新的层.
    let (lo, hi) = out.bounds().unwrap();
    assert!(lo.2 < -5.0 && hi.2 > 15.0);
}

#[test]
fn test_expand_and_shrink_are_monotone() {
    init_logger();
    let mask = rasterize(&box_structure(), (2.0, 2.0, 1.0), 2.0).unwrap();
    let v = mask.occupied_volume_mm3();

    let grown = apply_margin(&mask, 3.0, true).unwrap();
    let shrunk = apply_margin(&mask, -3.0, false).unwrap();
    assert!(grown.occupied_volume_mm3() > v);
    assert!(shrunk.occupied_volume_mm3() < v);
    assert!(shrunk.occupied_volume_mm3() > 0.0);

    // 先外扩再内缩同样的距离, 近似回到原结构, 且不超过外扩结果.
    let plain = apply_margin(&mask, 3.0, false).unwrap();
    let closed = apply_margin(&plain, -3.0, false).unwrap();
    assert!(closed.occupied_volume_mm3() <= plain.occupied_volume_mm3());
    assert!((closed.occupied_volume_mm3() - v).abs() / v < 0.05);

    // 内缩到比结构还厚时, 结构消失.
    let gone = apply_margin(&mask, -60.0, false).unwrap();
    assert!(gone.is_empty_mask());
}

#[test]
fn test_round_trip_area_within_one_voxel() {
    init_logger();
    let c = circle(0.0, (50.0, 50.0), 20.0, 180);
    let set = ContourSet::new(vec![c.clone()]);
    let mask = rasterize(&set, (1.0, 1.0, 2.0), 2.0).unwrap();
    let out = extract_contours(&mask, &[0.0], None, false).unwrap();
    assert_eq!(out.len(), 1);

    let back = &out.contours()[0];
    assert_eq!(back.slice_position_mm(), 0.0);
    let perimeter = TAU * 20.0;
    assert!((back.area_mm2() - c.area_mm2()).abs() < perimeter);
}

#[test]
fn test_polar_circles() {
    init_logger();
    let a = circle(0.0, (0.0, 0.0), 20.0, 100);
    let b = circle(10.0, (0.0, 0.0), 20.0, 100);
    let out = interpolate(&a, &b, 5.0, &InterpSpec::default()).unwrap();
    assert_eq!(out.len(), 128);
    assert_eq!(out.slice_position_mm(), 5.0);
    assert!((out.area_mm2() - PI * 400.0).abs() / (PI * 400.0) < 0.02);

    // 目标层与关键层重合时没有结果.
    assert!(interpolate(&a, &b, 0.0, &InterpSpec::default()).is_err());
}

#[test]
fn test_largest_loop_only() {
    init_logger();
    let small = Contour::from_xy(0.0, [(0.0, 0.0), (10.0, 0.0), (10.0, 5.0), (0.0, 5.0)]);
    let big = Contour::from_xy(0.0, [(20.0, 0.0), (40.0, 0.0), (40.0, 10.0), (20.0, 10.0)]);
    let far = Contour::from_xy(10.0, [(20.0, 0.0), (40.0, 0.0), (40.0, 10.0), (20.0, 10.0)]);

    for algo in [InterpAlgorithm::Polar, InterpAlgorithm::ArcLength] {
        let spec = InterpSpec::with_algorithm(algo, 64).unwrap();
        let out = interpolate_slices(
            (0.0, &[small.clone(), big.clone()][..]),
            (10.0, &[far.clone()][..]),
            5.0,
            &spec,
        )
        .unwrap();
        assert_eq!(out.len(), 1);
        assert!((out[0].area_mm2() - 200.0).abs() < 1e-6, "{algo}");
    }
}

#[test]
fn test_orchestrator_end_to_end() {
    init_logger();
    let set: ContourSet = [0.0, 10.0]
        .into_iter()
        .map(|z| circle(z, (0.0, 0.0), 15.0, 64))
        .collect();
    let gaps = find_gaps(&set, 2.5);
    assert_eq!(gaps.len(), 1);
    assert_eq!(gaps[0].target_zs, vec![2.5, 5.0, 7.5]);

    let orchestrator = OrchestratorHandle::new().unwrap();
    for algo in [
        InterpAlgorithm::Polar,
        InterpAlgorithm::ArcLength,
        InterpAlgorithm::DistanceField,
    ] {
        let ticket = orchestrator.interpolate_job(gaps.clone(), algo, 64).unwrap();
        let contours = ticket.wait().unwrap();
        assert_eq!(contours.len(), 3, "{algo}");
        for (c, z) in contours.iter().zip([2.5, 5.0, 7.5]) {
            assert_eq!(c.slice_position_mm(), z);
            let rel = (c.area_mm2() - set.contours()[0].area_mm2()).abs() / c.area_mm2();
            assert!(rel < 0.15, "{algo}: {rel}");
        }
    }
}
