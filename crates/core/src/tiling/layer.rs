//! Transformer-layer GEMM shapes and layer/model aggregation.
//!
//! Each layer contributes seven projection GEMMs: Q/K/V and output
//! projections in attention, gate/up/down in the (SwiGLU) FFN. Attention
//! score computation (`QK^T`, `Score*V`) involves the KV cache and has
//! different access patterns; it is modeled separately and is not part of
//! the projection sweep.

use serde::Serialize;
use tracing::info;

use crate::config::{HwConfig, InferenceMode, ModelConfig};

use super::cost::GemmShape;
use super::sweep::{compare_uniform_vs_per_gemm, sweep_gemm, SweepResult, UniformVsPerGemm};

/// The projection GEMMs of one transformer layer.
///
/// `M` is the sequence length; decode callers pass 1, turning every
/// projection into a matrix-vector product.
pub fn layer_gemms(model: &ModelConfig, seq_len: u64) -> Vec<GemmShape> {
    let m = seq_len;
    let h = model.hidden_size;
    let kv = model.kv_dim();
    let i = model.intermediate_size;

    vec![
        GemmShape::new("attn_q", m, h, h),
        GemmShape::new("attn_k", m, kv, h),
        GemmShape::new("attn_v", m, kv, h),
        GemmShape::new("attn_o", m, h, h),
        GemmShape::new("ffn_gate", m, i, h),
        GemmShape::new("ffn_up", m, i, h),
        GemmShape::new("ffn_down", m, h, i),
    ]
}

/// Sweep results for every GEMM of one layer, plus the tiling comparison.
#[derive(Debug, Clone, Serialize)]
pub struct LayerSweep {
    /// Inference phase the shapes were derived for.
    pub mode: InferenceMode,
    /// Sequence length used for `M` (1 in decode).
    pub seq_len: u64,
    /// Per-GEMM sweep results, in layer order.
    pub per_gemm: Vec<SweepResult>,
    /// Uniform-vs-per-GEMM tiling totals for the layer.
    pub uniform_vs_per_gemm: UniformVsPerGemm,
}

/// Sweeps every projection GEMM of one layer.
///
/// In [`InferenceMode::Decode`] the sequence length collapses to 1
/// regardless of `seq_len`.
pub fn sweep_layer(
    model: &ModelConfig,
    hw: &HwConfig,
    mode: InferenceMode,
    seq_len: u64,
) -> LayerSweep {
    let effective_seq_len = match mode {
        InferenceMode::Decode => 1,
        InferenceMode::Prefill => seq_len,
    };

    let gemms = layer_gemms(model, effective_seq_len);
    let per_gemm: Vec<SweepResult> = gemms.iter().map(|shape| sweep_gemm(shape, hw)).collect();
    let explored: usize = per_gemm.iter().map(|r| r.all_costs.len()).sum();
    info!(
        mode = ?mode,
        seq_len = effective_seq_len,
        configs = explored,
        "layer sweep complete"
    );

    let uniform_vs_per_gemm = compare_uniform_vs_per_gemm(&per_gemm, hw);
    LayerSweep {
        mode,
        seq_len: effective_seq_len,
        per_gemm,
        uniform_vs_per_gemm,
    }
}

/// Full-model totals derived from one layer sweep.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ModelLatency {
    /// Summed wall cycles of one layer (per-GEMM best-utilization points).
    pub layer_cycles: f64,
    /// Wall cycles across all layers.
    pub total_cycles: f64,
    /// DRAM bytes across all layers.
    pub total_dram_bytes: u64,
    /// Aggregate utilization (summed ideal over summed wall).
    pub utilization: f64,
    /// Wall-clock latency in milliseconds at the MAC frequency.
    pub latency_ms: f64,
}

/// Scales one layer's per-GEMM best points to the whole model.
pub fn model_latency(sweep: &LayerSweep, model: &ModelConfig, hw: &HwConfig) -> ModelLatency {
    let mut layer_cycles = 0.0f64;
    let mut layer_ideal = 0.0f64;
    let mut layer_dram = 0u64;
    for result in &sweep.per_gemm {
        if let Some(best) = result.best_utilization() {
            layer_cycles += best.total_cycles;
            layer_ideal += best.ideal_compute_cycles;
            layer_dram += best.dram_total;
        }
    }

    let total_cycles = layer_cycles * model.num_layers as f64;
    ModelLatency {
        layer_cycles,
        total_cycles,
        total_dram_bytes: layer_dram * model.num_layers,
        utilization: if layer_cycles > 0.0 {
            layer_ideal / layer_cycles
        } else {
            0.0
        },
        latency_ms: total_cycles * hw.cycle_ns() / 1e6,
    }
}
