//! Design-space exploration engines for memory hierarchies.
//!
//! This crate implements two tightly related engines with the following:
//! 1. **Cache explorer:** deterministic trace generation, a trace-driven
//!    set-associative LRU cache simulator, and a Gaussian-process Bayesian
//!    optimizer that searches cache geometries (size, block size,
//!    associativity) minimizing miss rate under a capacity cap.
//! 2. **Tiling cost model:** an analytical model of a tiled GEMM accelerator
//!    with an on-chip scratchpad and off-chip DRAM, a sweep engine that
//!    enumerates tilings and extracts `(DRAM ↓, utilization ↑)` Pareto
//!    frontiers, and a uniform-vs-per-GEMM comparison across a transformer
//!    layer.
//! 3. **Orchestration:** experiment drivers producing deterministic,
//!    persistable metric records for both engines.
//!
//! Every evaluation is pure and deterministic given its inputs and the
//! configured seed; histories and sweep outputs appear in deterministic
//! serial order.

/// Trace-driven set-associative LRU cache simulator and objective evaluators.
pub mod cache;
/// Shared infrastructure (error definitions).
pub mod common;
/// Configuration structures, enums, and defaults for both engines.
pub mod config;
/// Experiment orchestration and the persisted results records.
pub mod experiment;
/// Bayesian cache-geometry search (space, surrogate, acquisition, loop).
pub mod optim;
/// Comparator-parameterized 2-D Pareto frontier extraction.
pub mod pareto;
/// Analytical GEMM tiling cost model, sweep engine, and layer aggregation.
pub mod tiling;
/// Deterministic synthetic memory-access trace generation.
pub mod trace;

/// Kernel error type shared by both engines.
pub use crate::common::error::ModelError;
/// The three cache knobs; validate with [`config::CacheGeometry::validate`].
pub use crate::config::CacheGeometry;
/// Accelerator hardware description with the DRAM transaction model.
pub use crate::config::HwConfig;
/// Transformer architecture parameters; `ModelConfig::qwen3_8b` is the reference.
pub use crate::config::ModelConfig;
/// Pure miss-rate evaluation of a geometry on a trace.
pub use crate::cache::evaluate_cache;
/// Gaussian-process-guided geometry search.
pub use crate::optim::BayesianOptimizer;
/// One-call geometry search over a trace under a capacity cap.
pub use crate::optim::optimize_cache;
/// Analytical cost of one GEMM under one tiling; `None` when SRAM overflows.
pub use crate::tiling::cost_gemm;
/// Per-GEMM sweeps plus the uniform-vs-per-GEMM comparison for one layer.
pub use crate::tiling::sweep_layer;
