//! Analytical tiling cost model and sweep engine for the GEMM accelerator.
//!
//! This module covers the second exploration engine:
//! 1. **Cost:** SRAM footprint, DRAM traffic, compute/memory cycles, and
//!    overlap-aware wall cycles for one GEMM under one tiling.
//! 2. **Sweep:** candidate enumeration, per-GEMM Pareto frontiers, and the
//!    best-utilization/best-DRAM picks.
//! 3. **Layer:** transformer-layer GEMM shapes, uniform-vs-per-GEMM
//!    comparison, and full-model latency scaling.

/// Cost model for one GEMM + tiling + hardware combination.
pub mod cost;
/// Transformer-layer shapes and model-level aggregation.
pub mod layer;
/// Candidate enumeration, per-GEMM sweep, and tiling comparisons.
pub mod sweep;

pub use cost::{baseline_tiling, cost_gemm, GemmCost, GemmShape, TilingConfig};
pub use layer::{layer_gemms, model_latency, sweep_layer, LayerSweep, ModelLatency};
pub use sweep::{sweep_gemm, SweepResult, UniformVsPerGemm};
