//! Bayesian cache-geometry search.
//!
//! Sequential model-based optimization over the discrete log-encoded
//! geometry space:
//! 1. **Seed phase:** `n_initial` uniform draws from the exponent space.
//! 2. **Surrogate fit:** Gaussian process with an isotropic Matérn-2.5
//!    kernel over the normalized exponent vectors.
//! 3. **Acquisition:** EI (default), LCB, or PI over the full enumerated
//!    space; the argmax among not-yet-evaluated points is selected.
//! 4. **Evaluate, append, refit** until `n_calls` evaluations.
//!
//! The objective is a scalar in `[0, 1]`; evaluation failures are logged and
//! substituted with the worst-case value so the search never aborts.
//! History is append-only and deterministic for a fixed seed; the incumbent
//! is updated on strict improvement only, so the earliest entry tying the
//! minimum is reported.

/// Acquisition scoring (EI, LCB, PI) and the closed-form normal helpers.
pub mod acquisition;
/// Gaussian-process surrogate (Matérn-2.5 kernel, Cholesky, grid ML fit).
pub mod gp;
/// Discrete log-encoded search space (encode/decode/enumerate/sample).
pub mod space;

pub use space::{Point, SearchSpace};

use std::collections::{HashMap, HashSet};

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::evaluate_cache;
use crate::common::error::ModelError;
use crate::config::{Acquisition, CacheGeometry, OptimizerConfig};
use crate::pareto::{pareto_frontier, Direction};
use crate::trace::Trace;

use self::gp::GaussianProcess;

/// Convenience entry point: optimizes a trace's miss rate under a capacity
/// cap with the given budget, acquisition strategy, and seed.
///
/// Remaining knobs stay at their defaults; construct a
/// [`BayesianOptimizer`] from an [`OptimizerConfig`] for full control.
///
/// # Errors
///
/// Returns [`ModelError::EmptyTrace`] for a trace with no accesses.
pub fn optimize_cache(
    max_cache_bytes: usize,
    trace: &Trace,
    n_calls: usize,
    acquisition: Acquisition,
    seed: u64,
) -> Result<OptimizeOutcome, ModelError> {
    let optimizer = BayesianOptimizer::new(OptimizerConfig {
        max_cache_size_bytes: max_cache_bytes,
        n_calls,
        acquisition,
        seed,
        ..OptimizerConfig::default()
    });
    optimizer.optimize_trace(trace)
}

/// One evaluated configuration, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistoryEntry {
    /// The decoded geometry that was evaluated.
    #[serde(flatten)]
    pub config: CacheGeometry,
    /// The scalar objective (miss rate) observed for it.
    pub miss_rate: f64,
}

/// Result of one optimization run.
#[derive(Debug, Clone, Serialize)]
pub struct OptimizeOutcome {
    /// Earliest history entry achieving the minimum miss rate.
    pub best: HistoryEntry,
    /// Every evaluation in call order (append-only).
    pub history: Vec<HistoryEntry>,
    /// Pareto frontier over `(cache_size ↓, miss_rate ↓)`.
    pub pareto: Vec<HistoryEntry>,
}

/// Gaussian-process-guided search over cache geometries.
pub struct BayesianOptimizer {
    config: OptimizerConfig,
    space: SearchSpace,
}

impl BayesianOptimizer {
    /// Creates an optimizer for the configured capacity bounds and budget.
    pub fn new(config: OptimizerConfig) -> Self {
        let space = SearchSpace::new(config.min_cache_size_bytes, config.max_cache_size_bytes);
        Self { config, space }
    }

    /// The exponent space this optimizer searches.
    pub fn space(&self) -> &SearchSpace {
        &self.space
    }

    /// Optimizes the miss rate of a trace over the geometry space.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::EmptyTrace`] for a trace with no accesses;
    /// every geometry scores 0.0 on it and the search would be vacuous.
    pub fn optimize_trace(&self, trace: &Trace) -> Result<OptimizeOutcome, ModelError> {
        if trace.is_empty() {
            return Err(ModelError::EmptyTrace);
        }
        Ok(self.optimize(|geometry| evaluate_cache(*geometry, trace)))
    }

    /// Runs the search loop against an arbitrary objective.
    ///
    /// The objective may fail; failures are logged and scored as the
    /// worst-case miss rate (`1.0`). Repeated suggestions are permitted once
    /// the space is exhausted, and their cached values are reused without
    /// re-evaluating.
    pub fn optimize<F>(&self, mut objective: F) -> OptimizeOutcome
    where
        F: FnMut(&CacheGeometry) -> Result<f64, ModelError>,
    {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let candidates = self.space.enumerate();

        let mut history: Vec<HistoryEntry> = Vec::with_capacity(self.config.n_calls);
        let mut observed_points: Vec<[f64; 3]> = Vec::with_capacity(self.config.n_calls);
        let mut observed_values: Vec<f64> = Vec::with_capacity(self.config.n_calls);
        let mut tried: HashSet<Point> = HashSet::new();
        let mut value_cache: HashMap<(usize, usize, usize), f64> = HashMap::new();
        let mut best: Option<HistoryEntry> = None;

        for call in 0..self.config.n_calls {
            let point = if call < self.config.n_initial
                || history.len() < SearchSpace::DIMENSIONS
            {
                self.space.sample(&mut rng)
            } else {
                self.suggest(&candidates, &observed_points, &observed_values, &tried)
                    .unwrap_or_else(|| self.space.sample(&mut rng))
            };

            let geometry = self.space.decode(point);
            let key = (
                geometry.cache_size,
                geometry.block_size,
                geometry.associativity,
            );
            let miss_rate = match value_cache.get(&key) {
                Some(&cached) => cached,
                None => {
                    let value = self.evaluate(&geometry, &mut objective);
                    value_cache.insert(key, value);
                    value
                }
            };

            tried.insert(point);
            observed_points.push(self.space.normalize(point));
            observed_values.push(miss_rate);
            let entry = HistoryEntry {
                config: geometry,
                miss_rate,
            };
            history.push(entry);

            let improved = best.map_or(true, |b| miss_rate < b.miss_rate);
            if improved {
                debug!(
                    cache_size = geometry.cache_size,
                    block_size = geometry.block_size,
                    associativity = geometry.associativity,
                    miss_rate,
                    "new incumbent"
                );
                best = Some(entry);
            }
        }

        let best = best.unwrap_or(HistoryEntry {
            config: self.space.decode([self.space_floor(), 4, 0]),
            miss_rate: 1.0,
        });
        let pareto = pareto_frontier(
            &history,
            |e| e.config.cache_size as f64,
            |e| e.miss_rate,
            Direction::Minimize,
        );
        OptimizeOutcome {
            best,
            history,
            pareto,
        }
    }

    /// Scores one decoded geometry through validation and the objective.
    fn evaluate<F>(&self, geometry: &CacheGeometry, objective: &mut F) -> f64
    where
        F: FnMut(&CacheGeometry) -> Result<f64, ModelError>,
    {
        if !self.is_within_bounds(geometry) || geometry.validate().is_err() {
            return 1.0;
        }
        match objective(geometry) {
            Ok(value) => value,
            Err(err) => {
                warn!(%err, "objective evaluation failed; scoring worst case");
                1.0
            }
        }
    }

    /// Checks the capacity bounds the geometry validation does not know about.
    fn is_within_bounds(&self, geometry: &CacheGeometry) -> bool {
        geometry.cache_size >= self.config.min_cache_size_bytes
            && geometry.cache_size <= self.config.max_cache_size_bytes
    }

    /// Picks the maximum-acquisition candidate, preferring unevaluated
    /// points. Returns `None` when the surrogate cannot be fit.
    fn suggest(
        &self,
        candidates: &[Point],
        observed_points: &[[f64; 3]],
        observed_values: &[f64],
        tried: &HashSet<Point>,
    ) -> Option<Point> {
        let surrogate = GaussianProcess::fit(observed_points, observed_values)?;
        let best_observed = observed_values
            .iter()
            .copied()
            .fold(f64::INFINITY, f64::min);

        let select = |allow_repeats: bool| -> Option<Point> {
            let mut best_point = None;
            let mut best_score = f64::NEG_INFINITY;
            for &point in candidates {
                if !allow_repeats && tried.contains(&point) {
                    continue;
                }
                let (mean, std) = surrogate.predict(self.space.normalize(point));
                let score = self.config.acquisition.score(mean, std, best_observed);
                if score > best_score {
                    best_score = score;
                    best_point = Some(point);
                }
            }
            best_point
        };

        select(false).or_else(|| select(true))
    }

    /// Smallest size exponent of the space (fallback geometry only).
    fn space_floor(&self) -> u32 {
        self.config.min_cache_size_bytes.max(2).ilog2()
    }
}
