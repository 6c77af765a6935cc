//! Experiment orchestration.
//!
//! Runs the two exploration engines end to end:
//! 1. **Cache experiment:** the named workload suite is evaluated against a
//!    fixed set of one-size-fits-all baseline geometries and then optimized
//!    per workload; the outcome is a persistable results record plus
//!    per-workload comparison entries.
//! 2. **Tiling experiment:** layer sweeps for decode and prefill with
//!    full-model latency scaling.
//!
//! The orchestrator aggregates per-entry outcomes; only the kernels below it
//! return hard errors.

use std::collections::BTreeMap;
use std::io;
use std::path::Path;
use std::time::Instant;

use serde::Serialize;
use tracing::info;

use crate::cache::miss_rate_or_worst;
use crate::config::{CacheGeometry, HwConfig, InferenceMode, ModelConfig, OptimizerConfig};
use crate::optim::{BayesianOptimizer, HistoryEntry};
use crate::tiling::{model_latency, sweep_layer, LayerSweep, ModelLatency};
use crate::trace::{Trace, TraceGenerator};

/// Shape statistics of one workload trace.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct WorkloadStats {
    /// Number of accesses in the trace.
    pub num_accesses: usize,
    /// Number of distinct addresses touched.
    pub unique_addresses: usize,
}

/// Optimizer outcome persisted per workload.
#[derive(Debug, Clone, Serialize)]
pub struct OptimizedRecord {
    /// Geometry of the earliest minimum-miss-rate evaluation.
    pub best_config: CacheGeometry,
    /// Its miss rate.
    pub best_miss_rate: f64,
    /// Pareto frontier over `(cache_size ↓, miss_rate ↓)`.
    pub pareto_frontier: Vec<HistoryEntry>,
    /// Wall-clock seconds the optimization took.
    pub optimization_time: f64,
}

/// The persisted cache-experiment results record.
///
/// Serializes to the stable JSON layout consumed by downstream tooling:
/// `baselines` (baseline → workload → miss rate), `optimized` (workload →
/// best config/miss rate/frontier/time), and `workload_stats`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheExperimentResults {
    /// Miss rate of every baseline on every workload.
    pub baselines: BTreeMap<String, BTreeMap<String, f64>>,
    /// Per-workload optimization outcome.
    pub optimized: BTreeMap<String, OptimizedRecord>,
    /// Per-workload trace statistics.
    pub workload_stats: BTreeMap<String, WorkloadStats>,
}

impl CacheExperimentResults {
    /// Serializes the record as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns the underlying `serde_json` error on serialization failure.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Writes the record to a UTF-8 JSON file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when serialization or the write fails.
    pub fn save_json(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let json = self.to_json().map_err(io::Error::from)?;
        std::fs::write(path, json)
    }
}

/// Outcome status of one workload's comparison entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonStatus {
    /// The optimizer beat every baseline on this workload.
    Optimized,
    /// The best baseline matched or beat the optimizer.
    BaselineCompetitive,
}

/// Per-workload comparison between the optimizer and the baselines.
#[derive(Debug, Clone, Serialize)]
pub struct WorkloadComparison {
    /// Workload name.
    pub workload: String,
    /// Entry outcome.
    pub status: ComparisonStatus,
    /// Miss rate of the optimized geometry.
    pub optimized_miss_rate: f64,
    /// Name of the best-performing baseline.
    pub best_baseline: String,
    /// Miss rate of that baseline.
    pub best_baseline_miss_rate: f64,
    /// `best_baseline_miss_rate - optimized_miss_rate`.
    pub absolute_improvement: f64,
    /// Absolute improvement relative to the best baseline, in percent.
    pub relative_improvement_pct: f64,
}

/// Full cache-experiment output: the persistable record plus comparisons.
#[derive(Debug, Clone, Serialize)]
pub struct CacheExperimentReport {
    /// The persistable results record.
    pub results: CacheExperimentResults,
    /// Per-workload optimizer-vs-baseline comparison entries.
    pub comparisons: Vec<WorkloadComparison>,
}

/// Orchestrates the workload suite, baselines, and per-workload optimization.
pub struct CacheExperiment {
    optimizer: OptimizerConfig,
}

impl CacheExperiment {
    /// Creates an experiment with the given optimizer knobs.
    ///
    /// The seed is shared between trace generation and the optimizer.
    pub fn new(optimizer: OptimizerConfig) -> Self {
        Self { optimizer }
    }

    /// The fixed one-size-fits-all reference geometries.
    ///
    /// Small direct-mapped, balanced (typical L1), large highly associative,
    /// and a maximum-capacity design at the configured cap.
    pub fn baselines(&self) -> Vec<(String, CacheGeometry)> {
        vec![
            ("small_direct".to_owned(), CacheGeometry::new(4096, 32, 1)),
            ("balanced".to_owned(), CacheGeometry::new(16384, 64, 4)),
            ("large_assoc".to_owned(), CacheGeometry::new(32768, 64, 8)),
            (
                "max_capacity".to_owned(),
                CacheGeometry::new(self.optimizer.max_cache_size_bytes, 128, 16),
            ),
        ]
    }

    /// Runs the full experiment: generate, evaluate baselines, optimize,
    /// compare.
    pub fn run(&self) -> CacheExperimentReport {
        let mut generator = TraceGenerator::new(self.optimizer.seed);
        let workloads = generator.workload_suite();
        self.run_on(&workloads)
    }

    /// Runs the experiment on an explicit workload list.
    pub fn run_on(&self, workloads: &[(String, Trace)]) -> CacheExperimentReport {
        let baselines = self.baselines();
        let mut results = CacheExperimentResults::default();

        info!(
            workloads = workloads.len(),
            baselines = baselines.len(),
            n_calls = self.optimizer.n_calls,
            "starting cache experiment"
        );

        for (name, geometry) in &baselines {
            let per_workload: BTreeMap<String, f64> = workloads
                .iter()
                .map(|(workload, trace)| (workload.clone(), miss_rate_or_worst(*geometry, trace)))
                .collect();
            results.baselines.insert(name.clone(), per_workload);
        }

        let search = BayesianOptimizer::new(self.optimizer.clone());
        for (workload, trace) in workloads {
            results.workload_stats.insert(
                workload.clone(),
                WorkloadStats {
                    num_accesses: trace.len(),
                    unique_addresses: trace.unique_addresses(),
                },
            );

            let started = Instant::now();
            let Ok(outcome) = search.optimize_trace(trace) else {
                // Empty workload: nothing to optimize, nothing to record.
                continue;
            };
            let elapsed = started.elapsed().as_secs_f64();
            info!(
                workload = workload.as_str(),
                best_miss_rate = outcome.best.miss_rate,
                seconds = elapsed,
                "workload optimized"
            );

            results.optimized.insert(
                workload.clone(),
                OptimizedRecord {
                    best_config: outcome.best.config,
                    best_miss_rate: outcome.best.miss_rate,
                    pareto_frontier: outcome.pareto,
                    optimization_time: elapsed,
                },
            );
        }

        let comparisons = self.compare(workloads, &results);
        CacheExperimentReport {
            results,
            comparisons,
        }
    }

    /// Builds the per-workload comparison entries.
    fn compare(
        &self,
        workloads: &[(String, Trace)],
        results: &CacheExperimentResults,
    ) -> Vec<WorkloadComparison> {
        let mut comparisons = Vec::new();
        for (workload, _) in workloads {
            let Some(record) = results.optimized.get(workload) else {
                continue;
            };

            let mut best_baseline: Option<(&str, f64)> = None;
            for (baseline, per_workload) in &results.baselines {
                if let Some(&miss_rate) = per_workload.get(workload) {
                    let better = best_baseline.map_or(true, |(_, best)| miss_rate < best);
                    if better {
                        best_baseline = Some((baseline, miss_rate));
                    }
                }
            }
            let Some((best_baseline, best_baseline_miss_rate)) = best_baseline else {
                continue;
            };

            let absolute = best_baseline_miss_rate - record.best_miss_rate;
            let relative = if best_baseline_miss_rate > 0.0 {
                absolute / best_baseline_miss_rate * 100.0
            } else {
                0.0
            };
            comparisons.push(WorkloadComparison {
                workload: workload.clone(),
                status: if absolute > 0.0 {
                    ComparisonStatus::Optimized
                } else {
                    ComparisonStatus::BaselineCompetitive
                },
                optimized_miss_rate: record.best_miss_rate,
                best_baseline: best_baseline.to_owned(),
                best_baseline_miss_rate,
                absolute_improvement: absolute,
                relative_improvement_pct: relative,
            });
        }
        comparisons
    }
}

/// One inference mode's layer sweep with its model-level totals.
#[derive(Debug, Clone, Serialize)]
pub struct ModeRecord {
    /// Swept mode.
    pub mode: InferenceMode,
    /// Layer sweep (per-GEMM results and the tiling comparison).
    pub sweep: LayerSweep,
    /// Full-model totals from the per-GEMM best points.
    pub latency: ModelLatency,
}

/// Tiling-experiment output for both inference modes.
#[derive(Debug, Clone, Serialize)]
pub struct TilingExperimentReport {
    /// Decode followed by prefill.
    pub modes: Vec<ModeRecord>,
}

/// Default prefill sequence length for the tiling experiment.
const DEFAULT_PREFILL_SEQ_LEN: u64 = 256;

/// Orchestrates the tiling sweeps across a model's decode and prefill phases.
pub struct TilingExperiment {
    model: ModelConfig,
    hw: HwConfig,
    prefill_seq_len: u64,
}

impl TilingExperiment {
    /// Creates an experiment with the default prefill length.
    pub fn new(model: ModelConfig, hw: HwConfig) -> Self {
        Self {
            model,
            hw,
            prefill_seq_len: DEFAULT_PREFILL_SEQ_LEN,
        }
    }

    /// Overrides the prefill sequence length.
    pub fn with_prefill_seq_len(mut self, seq_len: u64) -> Self {
        self.prefill_seq_len = seq_len;
        self
    }

    /// Runs layer sweeps for decode and prefill and scales them to the model.
    pub fn run(&self) -> TilingExperimentReport {
        let modes = [
            (InferenceMode::Decode, 1),
            (InferenceMode::Prefill, self.prefill_seq_len),
        ]
        .into_iter()
        .map(|(mode, seq_len)| {
            let sweep = sweep_layer(&self.model, &self.hw, mode, seq_len);
            let latency = model_latency(&sweep, &self.model, &self.hw);
            info!(
                mode = ?mode,
                latency_ms = latency.latency_ms,
                utilization = latency.utilization,
                "mode sweep complete"
            );
            ModeRecord {
                mode,
                sweep,
                latency,
            }
        })
        .collect();

        TilingExperimentReport { modes }
    }
}
