//! Tests for TransferOperatorService

use std::sync::Arc;

use nalgebra::DMatrix;
use rstest::rstest;

use hofbauer::application::services::{MapKind, MapSpec, TransferOperatorService};
use hofbauer::application::ApplicationError;
use hofbauer::config::Settings;
use hofbauer::domain::{tent_map, Branch, Interval, PiecewiseMap, SuperAdjacencyAssembler};
use hofbauer::util::testing;

fn service_with(f: impl FnOnce(&mut Settings)) -> TransferOperatorService {
    let mut settings = Settings::default();
    f(&mut settings);
    TransferOperatorService::new(Arc::new(settings))
}

fn doubling() -> Vec<Branch> {
    vec![
        Branch::new(
            "L",
            Interval::new(0.0, 0.5).unwrap(),
            |x| 2.0 * x,
            |y| y / 2.0,
            |_| 2.0,
        ),
        Branch::new(
            "R",
            Interval::new(0.5, 1.0).unwrap(),
            |x| 2.0 * x - 1.0,
            |y| (y + 1.0) / 2.0,
            |_| 2.0,
        ),
    ]
}

fn block(m: &DMatrix<f64>, k: usize, i: usize, j: usize) -> DMatrix<f64> {
    m.view((i * k, j * k), (k, k)).into_owned()
}

// ============================================================
// approx_super_adjacency()
// ============================================================

#[test]
fn given_tent_depth_two_order_four_when_approximating_then_eight_by_eight() {
    testing::init_test_setup();
    let svc = service_with(|_| {});
    let branches = tent_map(1.8).unwrap();

    let result = svc.approx_super_adjacency(&branches, 4, 4, 2).unwrap();

    assert_eq!(
        result.tower.domains(),
        &[Interval::unit(), Interval::new(0.0, 0.9).unwrap()]
    );
    assert_eq!(result.shape(), (8, 8));
    assert_eq!(result.order, 4);
    assert_eq!(result.passes, 1);
    // no edge ends in the unit interval
    assert!(result.matrix.rows(0, 4).iter().all(|&v| v == 0.0));
    assert!(result.frobenius_norm() > 0.0);
}

#[test]
fn given_tent_blocks_when_split_by_branch_then_sum_matches_incidence() {
    let svc = service_with(|s| s.approximation.parallel = false);
    let branches = tent_map(1.8).unwrap();
    let tower = svc.build_tower(&branches, 2).unwrap();
    let ops = svc.construct_transfer_operators(&branches);
    let assembler = SuperAdjacencyAssembler::default();

    let both = svc.create_super_adjacency(&tower, &ops, 4, 4, 1).unwrap();
    let left = assembler
        .assemble(&tower.adjacencies()[0], tower.domains(), &ops[0], 4, 4, 1)
        .unwrap();
    let right = assembler
        .assemble(&tower.adjacencies()[1], tower.domains(), &ops[1], 4, 4, 1)
        .unwrap();

    assert!((&both - (&left + &right)).amax() < 1e-12);
    // block (1,1) only gets L, block (1,0) gets L and R
    assert!(block(&right, 4, 1, 1).iter().all(|&v| v == 0.0));
    assert_eq!(block(&both, 4, 1, 1), block(&left, 4, 1, 1));
    assert!(block(&right, 4, 1, 0).amax() > 0.0);
}

#[test]
fn given_doubling_map_when_approximating_then_constants_are_invariant() {
    let svc = service_with(|_| {});
    let k = 6;

    let result = svc.approx_super_adjacency(&doubling(), k, k, 3).unwrap();

    assert_eq!(result.shape(), (k, k));
    // L 1 = 1/2 + 1/2
    assert!((result.matrix[(0, 0)] - 1.0).abs() < 1e-12);
    for i in 1..k {
        assert!(result.matrix[(i, 0)].abs() < 1e-12);
    }
}

#[test]
fn given_tower_depth_when_approximating_then_refinement_passes_stay_configured() {
    let svc = service_with(|s| s.approximation.refinement_passes = 1);
    let branches = tent_map(1.8).unwrap();

    let shallow = svc.approx_super_adjacency(&branches, 3, 3, 2).unwrap();
    let deep = svc.approx_super_adjacency(&branches, 3, 3, 4).unwrap();

    assert_eq!(shallow.passes, 1);
    assert_eq!(deep.passes, 1);
    assert!(deep.tower.len() > shallow.tower.len());
    // the shared top-left corner is the same blocks
    assert_eq!(
        deep.matrix.view((0, 0), (6, 6)).into_owned(),
        shallow.matrix
    );
}

#[test]
fn given_two_refinement_passes_when_approximating_then_matrix_differs() {
    let branches = tent_map(1.8).unwrap();
    let one = service_with(|s| s.approximation.refinement_passes = 1)
        .approx_super_adjacency(&branches, 4, 4, 2)
        .unwrap();
    let two = service_with(|s| s.approximation.refinement_passes = 2)
        .approx_super_adjacency(&branches, 4, 4, 2)
        .unwrap();

    assert_eq!(two.passes, 2);
    assert_ne!(one.matrix, two.matrix);
}

#[test]
fn given_depth_one_when_approximating_then_zero_matrix() {
    let svc = service_with(|_| {});
    let result = svc
        .approx_super_adjacency(&tent_map(1.8).unwrap(), 4, 4, 1)
        .unwrap();

    assert_eq!(result.shape(), (4, 4));
    assert!(result.matrix.iter().all(|&v| v == 0.0));
}

#[rstest]
#[case(4, 3)]
#[case(2, 5)]
fn given_unequal_orders_when_approximating_then_operation_failed(
    #[case] n: usize,
    #[case] k: usize,
) {
    let svc = service_with(|_| {});
    let err = svc
        .approx_super_adjacency(&tent_map(1.8).unwrap(), n, k, 2)
        .unwrap_err();
    assert!(matches!(err, ApplicationError::OperationFailed { .. }));
}

#[test]
fn given_cache_and_no_cache_when_approximating_then_identical() {
    let branches = tent_map(1.6).unwrap();
    let cached = service_with(|s| s.approximation.cache_blocks = true);
    let direct = service_with(|s| s.approximation.cache_blocks = false);

    let a = cached.approx_super_adjacency(&branches, 5, 5, 4).unwrap();
    let b = direct.approx_super_adjacency(&branches, 5, 5, 4).unwrap();

    assert_eq!(a.matrix, b.matrix);
    assert!(cached.cache_stats().entries > 0);
    assert_eq!(direct.cache_stats().entries, 0);
}

// ============================================================
// approx_ulams() / compare()
// ============================================================

#[test]
fn given_tent_map_when_ulam_then_row_stochastic() {
    let svc = service_with(|s| {
        s.ulam.bins = 16;
        s.ulam.samples = 20;
    });
    let map = PiecewiseMap::new(tent_map(1.8).unwrap());

    let m = svc.approx_ulams(&map).unwrap();

    assert_eq!(m.shape(), (16, 16));
    for row in m.row_iter() {
        assert!((row.sum() - 1.0).abs() < 1e-12);
    }
}

#[test]
fn given_map_with_gap_when_ulam_then_outside_domain_surfaces() {
    let svc = service_with(|_| {});
    let partial = PiecewiseMap::new(vec![Branch::new(
        "half",
        Interval::new(0.0, 0.5).unwrap(),
        |x| 2.0 * x,
        |y| y / 2.0,
        |_| 2.0,
    )]);

    let err = svc.approx_ulams(&partial).unwrap_err();

    assert!(err.to_string().contains("ulam matrix"));
}

#[test]
fn given_skew_tent_when_comparing_then_both_discretisations_reported() {
    let svc = service_with(|s| {
        s.approximation.order = 4;
        s.tower.depth = 3;
        s.ulam.bins = 8;
        s.ulam.samples = 10;
    });
    let spec = MapSpec {
        kind: MapKind::SkewTent,
        slope: 2.0,
        peak: 0.4,
        height: 0.9,
    };

    let cmp = svc.compare(spec.branches().unwrap()).unwrap();

    assert_eq!(cmp.super_shape, (4 * cmp.domains, 4 * cmp.domains));
    assert_eq!(cmp.ulam_shape, (8, 8));
    assert!((cmp.ulam_row_sum_min - 1.0).abs() < 1e-12);
    assert!((cmp.ulam_row_sum_max - 1.0).abs() < 1e-12);
}
