//! Analytical cost model for one tiled GEMM.
//!
//! For a GEMM `C[M,N] = A[M,K] x B[K,N]` the accelerator streams A
//! (activations) and B (weights) tiles through the scratchpad and
//! accumulates C tiles in INT32. The loop nest is fixed (A reuse with
//! output-column grouping):
//!
//! ```text
//! for i in [n_m]:                    # output row tiles
//!   for jg in [n_jg]:                # output column groups
//!     init j_c C tiles in SRAM
//!     for k in [n_k]:                # reduction tiles
//!       load A[i,k]                  # reused across the j_c columns
//!       for j in [j_c]:
//!         load B[k, jg*j_c + j]
//!         C[i, jg*j_c + j] += A * B
//!     store j_c output tiles
//! ```
//!
//! which pins the DRAM traffic contracts:
//! A loads = `n_m * n_jg * n_k`, B loads = `n_m * n_n * n_k` (no B reuse
//! across output rows), C writes = `n_m * n_n`.
//!
//! The wall-cycle model overlaps loads with compute according to the
//! [`BufferScheme`], per k-iteration within one `(i, jg)` group.

use serde::Serialize;

use crate::config::{BufferScheme, HwConfig};

/// One GEMM: `C[M,N] = A[M,K] x B[K,N]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GemmShape {
    /// Name used in sweep reports (e.g. `attn_q`).
    pub name: String,
    /// Output rows; the sequence length in prefill, 1 in decode.
    pub m: u64,
    /// Output columns (projection output width).
    pub n: u64,
    /// Reduction depth (projection input width).
    pub k: u64,
}

impl GemmShape {
    /// Creates a named GEMM shape.
    pub fn new(name: impl Into<String>, m: u64, n: u64, k: u64) -> Self {
        Self {
            name: name.into(),
            m,
            n,
            k,
        }
    }

    /// Total multiply-accumulate operations, `M * N * K`.
    pub fn total_macs(&self) -> u64 {
        self.m * self.n * self.k
    }

    /// Number of weight elements, `K * N`.
    pub fn weight_elements(&self) -> u64 {
        self.k * self.n
    }
}

/// Tile dimensions and buffering strategy for one GEMM evaluation.
///
/// Tile dimensions larger than the GEMM extent are clamped at evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TilingConfig {
    /// Output-row tile extent.
    pub tile_m: u64,
    /// Output-column tile extent.
    pub tile_n: u64,
    /// Reduction tile extent.
    pub tile_k: u64,
    /// SRAM buffering strategy.
    pub buffer_scheme: BufferScheme,
}

impl TilingConfig {
    /// Creates a tiling configuration.
    pub fn new(tile_m: u64, tile_n: u64, tile_k: u64, buffer_scheme: BufferScheme) -> Self {
        Self {
            tile_m,
            tile_n,
            tile_k,
            buffer_scheme,
        }
    }
}

/// Cost breakdown of one GEMM under one tiling.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GemmCost {
    /// The evaluated shape.
    pub shape: GemmShape,
    /// The evaluated tiling, with tile extents clamped to the shape.
    pub tiling: TilingConfig,

    /// Output-row tile count, `ceil(M / tile_m)`.
    pub n_m: u64,
    /// Output-column tile count, `ceil(N / tile_n)`.
    pub n_n: u64,
    /// Reduction tile count, `ceil(K / tile_k)`.
    pub n_k: u64,
    /// Output-column group count, `ceil(n_n / j_c)`.
    pub n_jg: u64,
    /// Output-column tiles resident in SRAM simultaneously.
    pub j_c: u64,

    /// A-buffer footprint in bytes (doubled when double-buffered).
    pub sram_a: u64,
    /// B-buffer footprint in bytes (doubled when double-buffered).
    pub sram_b: u64,
    /// Resident C-tile footprint in bytes.
    pub sram_c: u64,
    /// Total scratchpad footprint in bytes.
    pub sram_total: u64,

    /// DRAM bytes read for A tiles.
    pub dram_read_a: u64,
    /// DRAM bytes read for B tiles.
    pub dram_read_b: u64,
    /// DRAM bytes written for requantized output tiles.
    pub dram_write_c: u64,
    /// Total DRAM traffic in bytes.
    pub dram_total: u64,

    /// Cycles the MAC array is occupied (including edge-tile padding).
    pub compute_cycles: f64,
    /// Cycles a perfectly utilized array would need, `total_macs / macs_per_cycle`.
    pub ideal_compute_cycles: f64,
    /// Total DRAM transfer time in cycles (no overlap).
    pub memory_cycles: f64,
    /// Wall-clock cycles with the buffer scheme's overlap applied.
    pub total_cycles: f64,

    /// Useful MACs over array-slot MACs per tile (edge-tile efficiency).
    pub mac_array_efficiency: f64,
    /// `ideal_compute_cycles / total_cycles`.
    pub utilization: f64,
    /// MACs per DRAM byte.
    pub arithmetic_intensity: f64,
}

impl GemmCost {
    /// Total DRAM read bytes (A + B).
    pub fn dram_read_total(&self) -> u64 {
        self.dram_read_a + self.dram_read_b
    }

    /// Whether compute occupancy exceeds DRAM transfer time.
    pub fn is_compute_bound(&self) -> bool {
        self.compute_cycles >= self.memory_cycles
    }
}

/// Evaluates `shape` under `tiling` on `hw`.
///
/// Returns `None` when the minimum scratchpad footprint (A buffer,
/// B buffer and a single C tile) exceeds the SRAM capacity. Tile extents
/// are clamped to the GEMM dimensions before any arithmetic.
pub fn cost_gemm(shape: &GemmShape, tiling: &TilingConfig, hw: &HwConfig) -> Option<GemmCost> {
    let tm = tiling.tile_m.min(shape.m).max(1);
    let tn = tiling.tile_n.min(shape.n).max(1);
    let tk = tiling.tile_k.min(shape.k).max(1);
    let scheme = tiling.buffer_scheme;

    // Per-tile footprints. Weight tiles may be sub-byte per element.
    let a_tile_bytes = ((tm * tk) as f64 * hw.act_bytes).ceil() as u64;
    let b_tile_bytes = ((tk * tn) as f64 * hw.weight_bytes).ceil() as u64;
    let c_tile_bytes = tm * tn * hw.acc_bytes;

    let a_mult = buffer_multiplier_a(scheme);
    let b_mult = buffer_multiplier_b(scheme);
    let sram_a = a_tile_bytes * a_mult;
    let sram_b = b_tile_bytes * b_mult;

    let min_sram = sram_a + sram_b + c_tile_bytes;
    if min_sram > hw.sram_total_bytes {
        return None;
    }

    let n_m = shape.m.div_ceil(tm);
    let n_n = shape.n.div_ceil(tn);
    let n_k = shape.k.div_ceil(tk);

    // Residual SRAM decides how many output-column tiles stay resident,
    // which is exactly the A reuse factor of the loop nest.
    let sram_for_c = hw.sram_total_bytes - sram_a - sram_b;
    let j_c = (sram_for_c / c_tile_bytes).max(1).min(n_n);
    let n_jg = n_n.div_ceil(j_c);

    let sram_c = j_c * c_tile_bytes;
    let sram_total = sram_a + sram_b + sram_c;

    // DRAM traffic, fixed by the loop nest.
    let n_a_loads = n_m * n_jg * n_k;
    let n_b_loads = n_m * n_n * n_k;
    let out_tile_bytes = ((tm * tn) as f64 * hw.output_bytes).ceil() as u64;
    let dram_read_a = n_a_loads * a_tile_bytes;
    let dram_read_b = n_b_loads * b_tile_bytes;
    let dram_write_c = n_m * n_n * out_tile_bytes;
    let dram_total = dram_read_a + dram_read_b + dram_write_c;

    // Compute occupancy: each tile runs ceil(tm/mac_m) * ceil(tn/mac_n)
    // array passes of tk cycles.
    let sub_tiles_m = tm.div_ceil(hw.mac_array_m);
    let sub_tiles_n = tn.div_ceil(hw.mac_array_n);
    let compute_per_tile = sub_tiles_m * sub_tiles_n * tk;
    let compute_cycles = (n_m * n_n * n_k * compute_per_tile) as f64;
    let ideal_compute_cycles = shape.total_macs() as f64 / hw.macs_per_cycle() as f64;

    let useful_macs_per_tile = (tm * tn * tk) as f64;
    let array_macs_per_tile = (sub_tiles_m * sub_tiles_n * hw.macs_per_cycle() * tk) as f64;
    let mac_array_efficiency = if array_macs_per_tile > 0.0 {
        useful_macs_per_tile / array_macs_per_tile
    } else {
        0.0
    };

    let memory_cycles = hw.dram_transfer_cycles(dram_read_a, n_a_loads)
        + hw.dram_transfer_cycles(dram_read_b, n_b_loads)
        + hw.dram_transfer_cycles(dram_write_c, n_m * n_n);

    // Wall cycles from the per-scheme overlap of one k-iteration, plus the
    // output store of each (i, jg) group.
    let t_load_a = hw.dram_transfer_cycles(a_tile_bytes, 1);
    let t_load_b = hw.dram_transfer_cycles(b_tile_bytes, 1);
    let t_compute = compute_per_tile as f64;
    let t_store_group = hw.dram_transfer_cycles(out_tile_bytes * j_c, j_c);

    let t_k_iter = k_iteration_cycles(scheme, j_c, t_load_a, t_load_b, t_compute);
    let mut total_cycles = (n_m * n_jg) as f64 * (n_k as f64 * t_k_iter + t_store_group);
    if matches!(scheme, BufferScheme::DoubleA | BufferScheme::DoubleAb) {
        // The very first A tile has nothing to hide behind.
        total_cycles += t_load_a;
    }

    let utilization = if total_cycles > 0.0 {
        ideal_compute_cycles / total_cycles
    } else {
        0.0
    };
    let arithmetic_intensity = if dram_total > 0 {
        shape.total_macs() as f64 / dram_total as f64
    } else {
        f64::INFINITY
    };

    Some(GemmCost {
        shape: shape.clone(),
        tiling: TilingConfig::new(tm, tn, tk, scheme),
        n_m,
        n_n,
        n_k,
        n_jg,
        j_c,
        sram_a,
        sram_b,
        sram_c,
        sram_total,
        dram_read_a,
        dram_read_b,
        dram_write_c,
        dram_total,
        compute_cycles,
        ideal_compute_cycles,
        memory_cycles,
        total_cycles,
        mac_array_efficiency,
        utilization,
        arithmetic_intensity,
    })
}

/// A-side SRAM multiplier: 2 when A is double-buffered.
pub(crate) fn buffer_multiplier_a(scheme: BufferScheme) -> u64 {
    match scheme {
        BufferScheme::DoubleA | BufferScheme::DoubleAb => 2,
        BufferScheme::Single | BufferScheme::DoubleB => 1,
    }
}

/// B-side SRAM multiplier: 2 when B is double-buffered.
pub(crate) fn buffer_multiplier_b(scheme: BufferScheme) -> u64 {
    match scheme {
        BufferScheme::DoubleB | BufferScheme::DoubleAb => 2,
        BufferScheme::Single | BufferScheme::DoubleA => 1,
    }
}

/// Wall cycles of one k-iteration (one A tile against `j_c` B tiles).
///
/// `a`/`b` are the single-tile load times, `c` the per-tile compute time.
fn k_iteration_cycles(scheme: BufferScheme, j_c: u64, a: f64, b: f64, c: f64) -> f64 {
    let j_c_f = j_c as f64;
    match scheme {
        // Everything sequential.
        BufferScheme::Single => a + j_c_f * (b + c),

        // B tiles pipeline against compute; A stays blocking.
        BufferScheme::DoubleB => {
            if j_c <= 1 {
                a + b + c
            } else {
                a + b + (j_c_f - 1.0) * b.max(c) + c
            }
        }

        // The next A prefetch hides behind the whole inner loop.
        BufferScheme::DoubleA => a.max(j_c_f * (b + c)),

        // Both overlaps combined.
        BufferScheme::DoubleAb => {
            let inner = if j_c <= 1 {
                b.max(c)
            } else {
                b + (j_c_f - 1.0) * b.max(c) + c
            };
            a.max(inner)
        }
    }
}

/// Conservative reference tiling: one MAC-array strip, single-buffered.
///
/// `tile_m = min(M, mac_m)`, `tile_n = tile_k = mac_n`, no overlap.
pub fn baseline_tiling(shape: &GemmShape, hw: &HwConfig) -> TilingConfig {
    TilingConfig::new(
        shape.m.min(hw.mac_array_m),
        hw.mac_array_n,
        hw.mac_array_n,
        BufferScheme::Single,
    )
}
