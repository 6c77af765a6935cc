//! Pareto Extractor Unit Tests.
//!
//! Verifies non-domination of every emitted point, domination of every
//! omitted point, tie handling on the first axis, and both directions of
//! the second objective.

use memscape_core::pareto::{pareto_frontier, Direction};

type Point = (f64, f64);

fn frontier(points: &[Point], direction: Direction) -> Vec<Point> {
    pareto_frontier(points, |p| p.0, |p| p.1, direction)
}

/// `a` dominates `b` under `(x ↓, y per direction)`.
fn dominates(a: Point, b: Point, direction: Direction) -> bool {
    let y_better_eq = match direction {
        Direction::Minimize => a.1 <= b.1,
        Direction::Maximize => a.1 >= b.1,
    };
    let strictly = a.0 < b.0
        || match direction {
            Direction::Minimize => a.1 < b.1,
            Direction::Maximize => a.1 > b.1,
        };
    a.0 <= b.0 && y_better_eq && strictly
}

// ══════════════════════════════════════════════════════════
// 1. Minimize / minimize (cache frontier)
// ══════════════════════════════════════════════════════════

/// Known frontier of a small min/min cloud.
#[test]
fn min_min_known_frontier() {
    let points = vec![
        (1024.0, 0.5),
        (2048.0, 0.3),
        (2048.0, 0.6), // dominated by (2048, 0.3)
        (4096.0, 0.4), // dominated by (2048, 0.3)
        (8192.0, 0.1),
    ];
    let frontier = frontier(&points, Direction::Minimize);
    assert_eq!(frontier, vec![(1024.0, 0.5), (2048.0, 0.3), (8192.0, 0.1)]);
}

/// Every emitted point is non-dominated; every omitted point is dominated
/// by at least one emitted point.
#[test]
fn min_min_domination_contract() {
    let points = vec![
        (3.0, 7.0),
        (1.0, 9.0),
        (5.0, 2.0),
        (4.0, 2.0),
        (2.0, 9.0),
        (6.0, 1.0),
        (2.0, 8.0),
    ];
    let frontier = frontier(&points, Direction::Minimize);

    for f in &frontier {
        assert!(
            !points.iter().any(|p| dominates(*p, *f, Direction::Minimize)),
            "emitted point {f:?} is dominated"
        );
    }
    for p in &points {
        if !frontier.contains(p) {
            assert!(
                frontier
                    .iter()
                    .any(|f| dominates(*f, *p, Direction::Minimize)),
                "omitted point {p:?} is not dominated by the frontier"
            );
        }
    }
}

// ══════════════════════════════════════════════════════════
// 2. Minimize / maximize (tiling frontier)
// ══════════════════════════════════════════════════════════

/// With the second axis maximized, a point is emitted when its y strictly
/// exceeds everything cheaper.
#[test]
fn min_max_known_frontier() {
    let points = vec![
        (100.0, 0.2),
        (200.0, 0.8),
        (150.0, 0.5),
        (300.0, 0.7), // dominated: more DRAM, less utilization than (200, 0.8)
        (400.0, 0.9),
    ];
    let frontier = frontier(&points, Direction::Maximize);
    assert_eq!(
        frontier,
        vec![(100.0, 0.2), (150.0, 0.5), (200.0, 0.8), (400.0, 0.9)]
    );
}

// ══════════════════════════════════════════════════════════
// 3. Edge cases
// ══════════════════════════════════════════════════════════

/// Ties on x keep only the better y.
#[test]
fn tie_on_x_keeps_better_y() {
    let points = vec![(10.0, 0.4), (10.0, 0.2), (10.0, 0.9)];
    assert_eq!(frontier(&points, Direction::Minimize), vec![(10.0, 0.2)]);
    assert_eq!(frontier(&points, Direction::Maximize), vec![(10.0, 0.9)]);
}

/// Degenerate inputs.
#[test]
fn empty_and_singleton() {
    assert!(frontier(&[], Direction::Minimize).is_empty());
    assert_eq!(
        frontier(&[(1.0, 1.0)], Direction::Minimize),
        vec![(1.0, 1.0)]
    );
}

/// A monotone improving cloud is entirely on the frontier.
#[test]
fn fully_nondominated_cloud() {
    let points: Vec<Point> = (0..10).map(|i| (i as f64, 10.0 - i as f64)).collect();
    assert_eq!(frontier(&points, Direction::Minimize).len(), points.len());
}
