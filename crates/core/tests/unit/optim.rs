//! Bayesian Optimizer Unit Tests.
//!
//! Verifies the search-space encoding, acquisition scoring, surrogate
//! sanity, history bookkeeping (budget, caching, tie-breaking, determinism),
//! and convergence on the prescribed synthetic objective.

use memscape_core::config::{Acquisition, CacheGeometry, OptimizerConfig};
use memscape_core::optim::gp::GaussianProcess;
use memscape_core::optim::{BayesianOptimizer, SearchSpace};
use memscape_core::ModelError;

/// Synthetic objective rewarding large caches, high associativity, and
/// small blocks.
fn synthetic_objective(geometry: &CacheGeometry) -> f64 {
    let size_kib = geometry.cache_size as f64 / 1024.0;
    let block_ratio = geometry.block_size as f64 / 64.0;
    0.5 / size_kib + 0.3 / geometry.associativity as f64 + 0.2 * block_ratio * block_ratio
}

// ══════════════════════════════════════════════════════════
// 1. Search space
// ══════════════════════════════════════════════════════════

/// Encoding a power-of-two in-range geometry and decoding it round-trips.
#[test]
fn exponent_roundtrip() {
    let space = SearchSpace::new(1024, 65536);
    for geometry in [
        CacheGeometry::new(1024, 16, 1),
        CacheGeometry::new(4096, 64, 4),
        CacheGeometry::new(65536, 512, 16),
    ] {
        let point = space.encode(&geometry).expect("in-range power-of-two knobs");
        assert_eq!(space.decode(point), geometry);
    }
}

/// Geometries outside the exponent ranges do not encode.
#[test]
fn out_of_range_geometry_does_not_encode() {
    let space = SearchSpace::new(1024, 65536);
    assert!(space.encode(&CacheGeometry::new(512, 64, 1)).is_none()); // below min
    assert!(space.encode(&CacheGeometry::new(4096, 8, 1)).is_none()); // block too small
    assert!(space.encode(&CacheGeometry::new(4096, 64, 32)).is_none()); // assoc too large
    assert!(space.encode(&CacheGeometry::new(3000, 64, 1)).is_none()); // not a power of two
}

/// Decoding clamps the capacity to the cap and the associativity to the
/// block count, so every decoded geometry is structurally valid.
#[test]
fn decode_clamps_to_valid_geometry() {
    let space = SearchSpace::new(1024, 2048);
    for point in space.enumerate() {
        let geometry = space.decode(point);
        assert!(geometry.cache_size <= 2048);
        assert!(
            geometry.validate().is_ok(),
            "decoded geometry {geometry:?} from {point:?} must be valid"
        );
    }
}

/// The default bounds span 7 x 6 x 5 exponent points.
#[test]
fn default_space_cardinality() {
    let space = SearchSpace::new(1024, 65536);
    assert_eq!(space.cardinality(), 7 * 6 * 5);
    assert_eq!(space.enumerate().len(), space.cardinality());
}

// ══════════════════════════════════════════════════════════
// 2. Acquisition scoring
// ══════════════════════════════════════════════════════════

/// Degenerate predictive deviation defines EI and PI as zero.
#[test]
fn degenerate_sigma_scores_zero() {
    assert_eq!(Acquisition::Ei.score(0.3, 0.0, 0.5), 0.0);
    assert_eq!(Acquisition::Pi.score(0.3, 0.0, 0.5), 0.0);
}

/// At `mean == best`, EI reduces to `sigma * phi(0)`.
#[test]
fn ei_at_incumbent_mean() {
    let sigma = 0.2;
    let expected = sigma * (2.0 * std::f64::consts::PI).sqrt().recip();
    let score = Acquisition::Ei.score(0.5, sigma, 0.5);
    assert!((score - expected).abs() < 1e-9);
}

/// EI grows with the predicted improvement and never goes negative.
#[test]
fn ei_ordering() {
    let better = Acquisition::Ei.score(0.2, 0.1, 0.5);
    let worse = Acquisition::Ei.score(0.4, 0.1, 0.5);
    assert!(better > worse);
    assert!(Acquisition::Ei.score(2.0, 0.1, 0.5) >= 0.0);
}

/// LCB prefers low means and, at equal mean, higher uncertainty.
#[test]
fn lcb_ordering() {
    let lcb = Acquisition::lcb();
    assert!(lcb.score(0.2, 0.1, 0.5) > lcb.score(0.4, 0.1, 0.5));
    assert!(lcb.score(0.3, 0.2, 0.5) > lcb.score(0.3, 0.1, 0.5));
}

/// PI is a probability.
#[test]
fn pi_is_a_probability() {
    for (mean, sigma) in [(0.1, 0.05), (0.5, 0.2), (0.9, 0.4)] {
        let p = Acquisition::Pi.score(mean, sigma, 0.5);
        assert!((0.0..=1.0).contains(&p));
    }
}

// ══════════════════════════════════════════════════════════
// 3. Surrogate sanity
// ══════════════════════════════════════════════════════════

/// The fitted surrogate reproduces its training observations closely and is
/// more uncertain away from them.
#[test]
fn gp_interpolates_and_widens() {
    let xs: Vec<[f64; 3]> = vec![
        [0.0, 0.0, 0.0],
        [0.5, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
        [1.0, 1.0, 1.0],
    ];
    let ys: Vec<f64> = xs.iter().map(|x| 0.1 + 0.4 * x[0] + 0.2 * x[1]).collect();
    let gp = GaussianProcess::fit(&xs, &ys).expect("fit succeeds on clean data");

    let (mean, std_at_node) = gp.predict(xs[1]);
    assert!((mean - ys[1]).abs() < 0.05, "mean {mean} should track {}", ys[1]);

    let (_, std_far) = gp.predict([0.5, 0.5, 0.5]);
    assert!(std_far > std_at_node);
}

/// Fitting an empty history fails instead of fabricating a model.
#[test]
fn gp_rejects_empty_history() {
    assert!(GaussianProcess::fit(&[], &[]).is_none());
}

// ══════════════════════════════════════════════════════════
// 4. History bookkeeping
// ══════════════════════════════════════════════════════════

/// With `n_calls == n_initial` the run is pure seeding: exactly `n_initial`
/// history entries and the best equals the history minimum.
#[test]
fn seed_only_run_budget() {
    let optimizer = BayesianOptimizer::new(OptimizerConfig {
        n_calls: 10,
        n_initial: 10,
        ..OptimizerConfig::default()
    });
    let outcome = optimizer.optimize(|g| Ok(synthetic_objective(g)));

    assert_eq!(outcome.history.len(), 10);
    let minimum = outcome
        .history
        .iter()
        .map(|e| e.miss_rate)
        .fold(f64::INFINITY, f64::min);
    assert_eq!(outcome.best.miss_rate, minimum);
}

/// Identical configurations produce identical histories (serial determinism).
#[test]
fn same_seed_same_history() {
    let config = OptimizerConfig {
        n_calls: 20,
        ..OptimizerConfig::default()
    };
    let first = BayesianOptimizer::new(config.clone()).optimize(|g| Ok(synthetic_objective(g)));
    let second = BayesianOptimizer::new(config).optimize(|g| Ok(synthetic_objective(g)));

    assert_eq!(first.history, second.history);
    assert_eq!(first.best, second.best);
}

/// Once the space is exhausted, repeats reuse cached values: the history
/// still grows to `n_calls` but the objective runs at most once per
/// distinct decoded geometry.
#[test]
fn repeats_reuse_cached_values() {
    let optimizer = BayesianOptimizer::new(OptimizerConfig {
        min_cache_size_bytes: 1024,
        max_cache_size_bytes: 1024,
        n_calls: 40,
        ..OptimizerConfig::default()
    });

    // 1 size exponent x 6 block exponents x 5 associativity exponents = 30
    // points, collapsing to 24 distinct geometries after clamping.
    assert_eq!(optimizer.space().cardinality(), 30);

    let mut evaluations = 0usize;
    let outcome = optimizer.optimize(|g| {
        evaluations += 1;
        Ok(synthetic_objective(g))
    });

    assert_eq!(outcome.history.len(), 40);
    assert!(
        evaluations <= 24,
        "cached geometries must not be re-simulated (ran {evaluations})"
    );
}

/// The earliest entry tying the minimum is reported as best.
#[test]
fn best_tie_prefers_earliest() {
    let optimizer = BayesianOptimizer::new(OptimizerConfig {
        n_calls: 15,
        ..OptimizerConfig::default()
    });
    let outcome = optimizer.optimize(|_| Ok(0.5));

    assert_eq!(outcome.best, outcome.history[0]);
}

/// Evaluation failures are absorbed as the worst-case objective.
#[test]
fn failed_evaluations_score_worst_case() {
    let optimizer = BayesianOptimizer::new(OptimizerConfig {
        n_calls: 12,
        ..OptimizerConfig::default()
    });
    let outcome = optimizer.optimize(|g| {
        if g.block_size >= 256 {
            Err(ModelError::invalid_config("synthetic failure"))
        } else {
            Ok(synthetic_objective(g))
        }
    });

    assert_eq!(outcome.history.len(), 12);
    for entry in &outcome.history {
        if entry.config.block_size >= 256 {
            assert_eq!(entry.miss_rate, 1.0);
        }
    }
}

/// The Pareto frontier over the history minimizes both axes.
#[test]
fn history_pareto_is_nondominated() {
    let optimizer = BayesianOptimizer::new(OptimizerConfig {
        n_calls: 30,
        ..OptimizerConfig::default()
    });
    let outcome = optimizer.optimize(|g| Ok(synthetic_objective(g)));

    for point in &outcome.pareto {
        let dominated = outcome.history.iter().any(|other| {
            other.config.cache_size <= point.config.cache_size
                && other.miss_rate <= point.miss_rate
                && (other.config.cache_size < point.config.cache_size
                    || other.miss_rate < point.miss_rate)
        });
        assert!(!dominated, "frontier point {point:?} is dominated");
    }
}

/// The one-call entry point runs the full budget on a trace and rejects
/// empty traces.
#[test]
fn optimize_cache_entry_point() {
    use memscape_core::optim::optimize_cache;
    use memscape_core::trace::Trace;

    let trace = Trace::from((0..500u64).map(|i| i * 4).collect::<Vec<_>>());
    let outcome =
        optimize_cache(8192, &trace, 12, Acquisition::Ei, 42).expect("non-empty trace");
    assert_eq!(outcome.history.len(), 12);
    assert!(outcome.best.config.cache_size <= 8192);

    let empty = Trace::from(Vec::new());
    assert!(matches!(
        optimize_cache(8192, &empty, 12, Acquisition::Ei, 42),
        Err(ModelError::EmptyTrace)
    ));
}

// ══════════════════════════════════════════════════════════
// 5. Synthetic convergence
// ══════════════════════════════════════════════════════════

/// On the synthetic objective with a 32 KiB cap and 40 evaluations, the
/// search reaches the large-cache, high-associativity corner.
#[test]
fn converges_on_synthetic_objective() {
    let optimizer = BayesianOptimizer::new(OptimizerConfig {
        max_cache_size_bytes: 32768,
        n_calls: 40,
        ..OptimizerConfig::default()
    });
    let outcome = optimizer.optimize(|g| Ok(synthetic_objective(g)));

    assert!(
        outcome.best.miss_rate <= 0.25,
        "best objective {} should be at most 0.25",
        outcome.best.miss_rate
    );
    assert_eq!(outcome.best.config.cache_size, 32768);
    assert!(outcome.best.config.associativity >= 4);
}
