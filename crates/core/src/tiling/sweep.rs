//! Tiling candidate enumeration, per-GEMM sweep, and the uniform-vs-per-GEMM
//! comparison.

use std::collections::HashSet;

use serde::Serialize;

use crate::config::{BufferScheme, HwConfig};
use crate::pareto::{pareto_frontier, Direction};

use super::cost::{
    baseline_tiling, buffer_multiplier_a, buffer_multiplier_b, cost_gemm, GemmCost, GemmShape,
    TilingConfig,
};

/// Output-row tile candidates.
pub const TILE_M_CANDIDATES: [u64; 9] = [1, 2, 4, 8, 16, 32, 64, 128, 256];
/// Output-column tile candidates.
pub const TILE_N_CANDIDATES: [u64; 8] = [32, 64, 128, 256, 512, 1024, 2048, 4096];
/// Reduction tile candidates (same ladder as the output columns).
pub const TILE_K_CANDIDATES: [u64; 8] = TILE_N_CANDIDATES;

/// All four buffering strategies, in sweep order.
pub const BUFFER_SCHEMES: [BufferScheme; 4] = [
    BufferScheme::Single,
    BufferScheme::DoubleB,
    BufferScheme::DoubleA,
    BufferScheme::DoubleAb,
];

/// Enumerates the valid tiling candidates for one GEMM shape.
///
/// Tile extents are clamped to the GEMM dimensions, duplicates created by
/// the clamping are removed, and candidates whose minimum footprint
/// (buffer-multiplied A and B tiles plus one C tile) already exceeds the
/// scratchpad are rejected up front. Full validation remains with
/// [`cost_gemm`], which returns `None` on overflow.
pub fn tiling_candidates(shape: &GemmShape, hw: &HwConfig) -> Vec<TilingConfig> {
    let mut seen: HashSet<(u64, u64, u64, BufferScheme)> = HashSet::new();
    let mut candidates = Vec::new();

    for &tm in &TILE_M_CANDIDATES {
        for &tn in &TILE_N_CANDIDATES {
            for &tk in &TILE_K_CANDIDATES {
                for &scheme in &BUFFER_SCHEMES {
                    let tm_eff = tm.min(shape.m);
                    let tn_eff = tn.min(shape.n);
                    let tk_eff = tk.min(shape.k);

                    let rough_sram = ((tm_eff * tk_eff) as f64 * hw.act_bytes).ceil() as u64
                        * buffer_multiplier_a(scheme)
                        + ((tk_eff * tn_eff) as f64 * hw.weight_bytes).ceil() as u64
                            * buffer_multiplier_b(scheme)
                        + tm_eff * tn_eff * hw.acc_bytes;
                    if rough_sram > hw.sram_total_bytes {
                        continue;
                    }

                    if seen.insert((tm_eff, tn_eff, tk_eff, scheme)) {
                        candidates.push(TilingConfig::new(tm_eff, tn_eff, tk_eff, scheme));
                    }
                }
            }
        }
    }
    candidates
}

/// Results of sweeping one GEMM shape across all tiling candidates.
#[derive(Debug, Clone, Serialize)]
pub struct SweepResult {
    /// The swept shape.
    pub shape: GemmShape,
    /// Every candidate that fit in SRAM, in enumeration order.
    pub all_costs: Vec<GemmCost>,
    /// Pareto frontier over `(dram_total ↓, utilization ↑)`.
    pub pareto: Vec<GemmCost>,
    /// Cost of the fixed reference tiling, when it fits.
    pub baseline: Option<GemmCost>,
}

impl SweepResult {
    /// Frontier point with the highest utilization.
    pub fn best_utilization(&self) -> Option<&GemmCost> {
        self.pareto
            .iter()
            .max_by(|a, b| a.utilization.total_cmp(&b.utilization))
    }

    /// Frontier point with the least DRAM traffic.
    pub fn best_dram(&self) -> Option<&GemmCost> {
        self.pareto
            .iter()
            .min_by(|a, b| a.dram_total.cmp(&b.dram_total))
    }
}

/// Sweeps all valid tilings for one GEMM shape.
pub fn sweep_gemm(shape: &GemmShape, hw: &HwConfig) -> SweepResult {
    let all_costs: Vec<GemmCost> = tiling_candidates(shape, hw)
        .iter()
        .filter_map(|tiling| cost_gemm(shape, tiling, hw))
        .collect();

    let pareto = pareto_frontier(
        &all_costs,
        |c| c.dram_total as f64,
        |c| c.utilization,
        Direction::Maximize,
    );
    let baseline = cost_gemm(shape, &baseline_tiling(shape, hw), hw);

    SweepResult {
        shape: shape.clone(),
        all_costs,
        pareto,
        baseline,
    }
}

/// Totals of the uniform-vs-per-GEMM tiling comparison for one layer.
///
/// Per-GEMM uses each GEMM's best-utilization Pareto point; uniform is the
/// single tiling (searched over the union of every GEMM's tested configs,
/// kept only when valid for all of them) minimizing summed wall cycles.
#[derive(Debug, Clone, Serialize)]
pub struct UniformVsPerGemm {
    /// Summed DRAM bytes under the best uniform tiling.
    pub uniform_dram: u64,
    /// Summed wall cycles under the best uniform tiling.
    pub uniform_cycles: f64,
    /// Aggregate utilization (summed ideal / summed wall) under uniform tiling.
    pub uniform_utilization: f64,
    /// The winning uniform tiling, when any candidate was valid everywhere.
    pub uniform_tiling: Option<TilingConfig>,
    /// Summed DRAM bytes with per-GEMM best-utilization tilings.
    pub per_gemm_dram: u64,
    /// Summed wall cycles with per-GEMM best-utilization tilings.
    pub per_gemm_cycles: f64,
    /// Aggregate utilization with per-GEMM best-utilization tilings.
    pub per_gemm_utilization: f64,
}

impl UniformVsPerGemm {
    /// DRAM saved by per-GEMM tiling, as a percentage of the uniform total.
    pub fn dram_reduction_pct(&self) -> f64 {
        if self.uniform_dram == 0 {
            0.0
        } else {
            (1.0 - self.per_gemm_dram as f64 / self.uniform_dram as f64) * 100.0
        }
    }

    /// Utilization gained by per-GEMM tiling, in percentage points.
    pub fn util_improvement_pp(&self) -> f64 {
        (self.per_gemm_utilization - self.uniform_utilization) * 100.0
    }
}

/// Compares the best uniform tiling against per-GEMM-optimal tiling.
pub fn compare_uniform_vs_per_gemm(results: &[SweepResult], hw: &HwConfig) -> UniformVsPerGemm {
    let mut per_gemm_dram = 0u64;
    let mut per_gemm_cycles = 0.0f64;
    let mut per_gemm_ideal = 0.0f64;
    for result in results {
        if let Some(best) = result.best_utilization() {
            per_gemm_dram += best.dram_total;
            per_gemm_cycles += best.total_cycles;
            per_gemm_ideal += best.ideal_compute_cycles;
        }
    }
    let per_gemm_utilization = if per_gemm_cycles > 0.0 {
        per_gemm_ideal / per_gemm_cycles
    } else {
        0.0
    };

    // Union of every tested tiling, deduplicated in deterministic order.
    let mut seen: HashSet<TilingConfig> = HashSet::new();
    let mut tilings: Vec<TilingConfig> = Vec::new();
    for result in results {
        for cost in &result.all_costs {
            if seen.insert(cost.tiling) {
                tilings.push(cost.tiling);
            }
        }
    }

    let mut best_uniform: Option<(TilingConfig, Vec<GemmCost>)> = None;
    let mut best_uniform_cycles = f64::INFINITY;
    for tiling in tilings {
        let mut layer_costs = Vec::with_capacity(results.len());
        let mut valid = true;
        for result in results {
            match cost_gemm(&result.shape, &tiling, hw) {
                Some(cost) => layer_costs.push(cost),
                None => {
                    valid = false;
                    break;
                }
            }
        }
        if !valid {
            continue;
        }
        let total: f64 = layer_costs.iter().map(|c| c.total_cycles).sum();
        if total < best_uniform_cycles {
            best_uniform_cycles = total;
            best_uniform = Some((tiling, layer_costs));
        }
    }

    let (uniform_tiling, uniform_dram, uniform_cycles, uniform_utilization) = match best_uniform {
        Some((tiling, costs)) => {
            let dram = costs.iter().map(|c| c.dram_total).sum();
            let cycles: f64 = costs.iter().map(|c| c.total_cycles).sum();
            let ideal: f64 = costs.iter().map(|c| c.ideal_compute_cycles).sum();
            let util = if cycles > 0.0 { ideal / cycles } else { 0.0 };
            (Some(tiling), dram, cycles, util)
        }
        None => (None, 0, 0.0, 0.0),
    };

    UniformVsPerGemm {
        uniform_dram,
        uniform_cycles,
        uniform_utilization,
        uniform_tiling,
        per_gemm_dram,
        per_gemm_cycles,
        per_gemm_utilization,
    }
}
