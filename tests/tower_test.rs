//! Tests for Hofbauer tower construction

use std::collections::HashSet;

use rstest::rstest;

use hofbauer::domain::{
    tent_map, Branch, DomainError, DomainResult, DomainTower, Interval, Precision, Tower,
    TraversalOrder,
};
use hofbauer::util::testing;

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

/// Edges of branch `b` as (source domain, target domain) pairs.
fn edge_set(tower: &Tower, b: usize) -> HashSet<(Interval, Interval)> {
    tower
        .edges(b)
        .into_iter()
        .map(|(t, s)| (tower.domains()[s], tower.domains()[t]))
        .collect()
}

// ============================================================
// tent map a = 1.8
// ============================================================

#[test]
fn given_tent_depth_two_when_building_then_two_domains_and_three_edges() {
    testing::init_test_setup();
    let branches = tent_map(1.8).unwrap();

    let tower = DomainTower::default().build(&branches, 2).unwrap();

    assert_eq!(
        tower.domains(),
        &[Interval::unit(), Interval::new(0.0, 0.9).unwrap()]
    );
    assert_eq!(tower.passes(), &[0, 1]);
    // L: (0,1) -> (0,0.9) and (0,0.9) -> (0,0.9)
    assert_eq!(tower.edges(0), vec![(1, 0), (1, 1)]);
    // R: (0,1) -> (0,0.9); the image (0.18,0.9) of (0,0.9) is not yet a domain
    assert_eq!(tower.edges(1), vec![(1, 0)]);
}

#[test]
fn given_tent_depth_three_when_building_then_pending_image_becomes_domain() {
    let branches = tent_map(1.8).unwrap();

    let tower = DomainTower::default().build(&branches, 3).unwrap();

    assert_eq!(tower.len(), 3);
    assert_eq!(tower.domains()[2], Interval::new(0.18, 0.9).unwrap());
    assert!(tower.has_edge(1, 2, 1));
    assert!(tower.has_edge(1, 2, 2));
}

#[test]
fn given_depth_one_when_building_then_only_unit_interval_without_edges() {
    let branches = tent_map(1.8).unwrap();

    let tower = DomainTower::default().build(&branches, 1).unwrap();

    assert_eq!(tower.domains(), &[Interval::unit()]);
    assert!(tower.edges(0).is_empty());
    assert!(tower.edges(1).is_empty());
}

#[test]
fn given_full_branch_map_when_building_deep_then_tower_stays_trivial() {
    let tower = DomainTower::default().build(&doubling(), 6).unwrap();

    assert_eq!(tower.domains(), &[Interval::unit()]);
    assert!(tower.has_edge(0, 0, 0));
    assert!(tower.has_edge(1, 0, 0));
}

// ============================================================
// properties
// ============================================================

#[rstest]
#[case(1.3)]
#[case(1.8)]
#[case(2.0)]
fn given_same_input_when_building_twice_then_identical(#[case] slope: f64) {
    let branches = tent_map(slope).unwrap();
    let builder = DomainTower::default();

    let a = builder.build(&branches, 5).unwrap();
    let b = builder.build(&branches, 5).unwrap();

    assert_eq!(a.domains(), b.domains());
    assert_eq!(a.adjacencies(), b.adjacencies());
}

#[rstest]
#[case(1.5, 4)]
#[case(1.8, 5)]
#[case(1.95, 6)]
fn given_lifo_and_fifo_when_building_then_same_domains_and_incidence(
    #[case] slope: f64,
    #[case] depth: usize,
) {
    let branches = tent_map(slope).unwrap();
    let lifo = DomainTower::new(Precision::default(), TraversalOrder::Lifo)
        .build(&branches, depth)
        .unwrap();
    let fifo = DomainTower::new(Precision::default(), TraversalOrder::Fifo)
        .build(&branches, depth)
        .unwrap();

    let lifo_domains: HashSet<Interval> = lifo.domains().iter().copied().collect();
    let fifo_domains: HashSet<Interval> = fifo.domains().iter().copied().collect();
    assert_eq!(lifo_domains, fifo_domains);
    assert_eq!(lifo_domains.len(), lifo.len(), "domains are unique");
    for b in 0..branches.len() {
        assert_eq!(edge_set(&lifo, b), edge_set(&fifo, b));
    }
}

#[rstest]
#[case(1.4)]
#[case(1.8)]
fn given_any_edge_when_checked_then_image_of_source_cut_is_target(#[case] slope: f64) {
    let branches = tent_map(slope).unwrap();
    let tower = DomainTower::default().build(&branches, 6).unwrap();

    for (b, branch) in branches.iter().enumerate() {
        for (t, s) in tower.edges(b) {
            let cut = tower.domains()[s].intersect(&branch.domain).expect("edge implies overlap");
            let lo = branch.eval(cut.start()).unwrap();
            let hi = branch.eval(cut.end()).unwrap();
            let target = tower.domains()[t];
            assert!((lo.min(hi) - target.start()).abs() < 1e-9, "branch {b} edge {s}->{t}");
            assert!((lo.max(hi) - target.end()).abs() < 1e-9, "branch {b} edge {s}->{t}");
        }
    }
}

#[test]
fn given_zero_depth_when_building_then_error() {
    let branches = tent_map(1.8).unwrap();
    assert!(DomainTower::default().build(&branches, 0).is_err());
}

#[test]
fn given_branch_nan_at_endpoint_when_building_then_non_finite_error() {
    let mut branches = doubling();
    branches[1] = Branch::new(
        "R",
        Interval::new(0.5, 1.0).unwrap(),
        |x| if x < 1.0 { 2.0 * x - 1.0 } else { f64::NAN },
        |y| (y + 1.0) / 2.0,
        |_| 2.0,
    );

    let err = DomainTower::default().build(&branches, 2).unwrap_err();

    assert_eq!(
        err,
        DomainError::NonFiniteEvaluation {
            what: "branch function",
            at: 1.0
        }
    );
}

// ============================================================
// (domains, functions, depth) -> (complete_domains, adj_matrices)
// ============================================================

#[test]
fn given_plain_functions_when_building_then_parts_match_tent_tower() {
    let function_domains = [
        Interval::new(0.0, 0.5).unwrap(),
        Interval::new(0.5, 1.0).unwrap(),
    ];
    let left = |x: f64| -> DomainResult<f64> { Ok(1.8 * x) };
    let right = |x: f64| -> DomainResult<f64> { Ok(1.8 * (1.0 - x)) };
    let functions: [&dyn Fn(f64) -> DomainResult<f64>; 2] = [&left, &right];

    let (complete_domains, adj_matrices) = DomainTower::default()
        .build_with(&function_domains, &functions, 2)
        .unwrap()
        .into_parts();

    assert_eq!(
        complete_domains,
        vec![Interval::unit(), Interval::new(0.0, 0.9).unwrap()]
    );
    assert_eq!(adj_matrices.len(), 2);
    for adj in &adj_matrices {
        assert_eq!(adj.shape(), (2, 2));
    }
    assert_eq!(adj_matrices[0].as_slice(), &[0, 1, 0, 1]);
    assert_eq!(adj_matrices[1].as_slice(), &[0, 1, 0, 0]);
}

#[test]
fn given_mismatched_functions_when_building_then_shape_error() {
    let id = |x: f64| -> DomainResult<f64> { Ok(x) };
    let functions: [&dyn Fn(f64) -> DomainResult<f64>; 1] = [&id];

    let err = DomainTower::default()
        .build_with(&[Interval::unit(), Interval::unit()], &functions, 1)
        .unwrap_err();

    assert!(matches!(err, DomainError::ShapeMismatch(_)));
}
