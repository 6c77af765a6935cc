//! Configuration system for the exploration engines.
//!
//! This module defines all configuration structures and enums used to parameterize
//! the two engines. It provides:
//! 1. **Defaults:** Baseline constants (search budget, cache caps, SRAM/DRAM/MAC hardware).
//! 2. **Structures:** Cache geometry, optimizer knobs, accelerator hardware, and model architecture.
//! 3. **Enums:** Acquisition strategy, SRAM buffer scheme, and inference mode.
//!
//! Configuration is supplied via JSON (all structures deserialize with per-field
//! defaults) or constructed with `Default`/the provided constructors.

use serde::{Deserialize, Serialize};

use crate::common::error::ModelError;

/// Default configuration constants for the exploration engines.
///
/// These values define the baseline search budget and hardware configuration
/// when not explicitly overridden.
mod defaults {
    /// Maximum cache capacity considered by the optimizer (64 KiB).
    ///
    /// Models the area/power budget of the cache under design; decoded
    /// candidates are clamped to this cap.
    pub const MAX_CACHE_SIZE_BYTES: usize = 65536;

    /// Minimum cache capacity considered by the optimizer (1 KiB).
    pub const MIN_CACHE_SIZE_BYTES: usize = 1024;

    /// Total optimization budget (objective evaluations per workload).
    pub const N_CALLS: usize = 50;

    /// Random evaluations performed before the surrogate is consulted.
    pub const N_INITIAL: usize = 10;

    /// Seed propagated through trace generation and the optimizer.
    pub const SEED: u64 = 42;

    /// Exploration weight for the lower-confidence-bound acquisition.
    pub const LCB_KAPPA: f64 = 1.96;

    /// Total on-chip scratchpad capacity (2 MiB).
    pub const SRAM_TOTAL_BYTES: u64 = 2 * 1024 * 1024;

    /// Number of independently addressable SRAM banks.
    pub const SRAM_NUM_BANKS: u64 = 4;

    /// Peak DRAM bandwidth in GB/s (numerically equal to bytes/ns).
    ///
    /// Models dual x32 LPDDR5-6400 channels.
    pub const DRAM_PEAK_BW_GBPS: f64 = 50.0;

    /// DRAM access latency when the target row is already open (ns).
    pub const DRAM_PAGE_HIT_LATENCY_NS: f64 = 17.0;

    /// DRAM access latency on a row-buffer miss: precharge + activate + CAS (ns).
    pub const DRAM_PAGE_MISS_LATENCY_NS: f64 = 52.0;

    /// Fraction of DRAM transactions that hit an open row.
    pub const DRAM_PAGE_HIT_RATE: f64 = 0.70;

    /// Sustained fraction of peak bandwidth achieved within a burst.
    pub const DRAM_BURST_EFFICIENCY: f64 = 0.90;

    /// MAC array rows.
    pub const MAC_ARRAY_M: u64 = 32;

    /// MAC array columns.
    pub const MAC_ARRAY_N: u64 = 32;

    /// MAC array clock frequency (MHz).
    pub const MAC_FREQ_MHZ: u64 = 500;

    /// Activation element width in bytes (INT8).
    pub const ACT_BYTES: f64 = 1.0;

    /// Weight element width in bytes (INT4: half a byte per element).
    pub const WEIGHT_BYTES: f64 = 0.5;

    /// Accumulator element width in bytes (INT32).
    pub const ACC_BYTES: u64 = 4;

    /// Output element width in bytes (INT8, post-requantization).
    pub const OUTPUT_BYTES: f64 = 1.0;
}

/// Acquisition strategy used by the Bayesian optimizer to rank candidates.
///
/// All strategies are scored so that the best candidate is the argmax.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub enum Acquisition {
    /// Expected Improvement over the best observed objective value.
    ///
    /// Balances exploitation (low predicted mean) against exploration
    /// (high predictive uncertainty); defined as 0 when the predictive
    /// standard deviation is degenerate.
    Ei,
    /// Lower Confidence Bound, `mu - kappa * sigma` (minimized).
    Lcb {
        /// Exploration weight; larger values favor uncertain candidates.
        kappa: f64,
    },
    /// Probability of Improvement over the best observed objective value.
    Pi,
}

impl Acquisition {
    /// Returns the LCB strategy with the default exploration weight.
    pub fn lcb() -> Self {
        Self::Lcb {
            kappa: defaults::LCB_KAPPA,
        }
    }
}

impl Default for Acquisition {
    /// Expected Improvement is the default strategy.
    fn default() -> Self {
        Self::Ei
    }
}

/// SRAM double-buffering strategy for the tiled GEMM loop nest.
///
/// Double-buffering an operand doubles its SRAM footprint in exchange for
/// overlapping that operand's DRAM load with compute on the current tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferScheme {
    /// No overlap: every load and compute step is sequential.
    #[default]
    Single,
    /// Double-buffer weights: overlap the next B-tile load with compute.
    DoubleB,
    /// Double-buffer activations: overlap the next A-tile load with the
    /// inner weight-load/compute loop.
    DoubleA,
    /// Double-buffer both operands (most SRAM, best overlap).
    DoubleAb,
}

/// Inference phase of the transformer workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InferenceMode {
    /// Token-by-token generation; every projection is a matrix-vector product.
    Decode,
    /// Prompt processing over the full sequence length.
    Prefill,
}

/// Set-associative cache geometry: the three knobs the optimizer tunes.
///
/// Derived quantities (`num_sets`, `offset_bits`, `index_bits`) are computed
/// on demand; [`CacheGeometry::validate`] enforces the structural constraints
/// required for the shift/mask address decomposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct CacheGeometry {
    /// Total cache capacity in bytes.
    pub cache_size: usize,
    /// Cache block (line) size in bytes; must be a power of two.
    pub block_size: usize,
    /// Set associativity (1 = direct-mapped).
    pub associativity: usize,
}

impl CacheGeometry {
    /// Creates a geometry from the three knobs without validating it.
    pub fn new(cache_size: usize, block_size: usize, associativity: usize) -> Self {
        Self {
            cache_size,
            block_size,
            associativity,
        }
    }

    /// Total number of blocks the cache can hold.
    pub fn num_blocks(&self) -> usize {
        self.cache_size / self.block_size.max(1)
    }

    /// Number of sets; each set holds `associativity` blocks.
    pub fn num_sets(&self) -> usize {
        self.num_blocks() / self.associativity.max(1)
    }

    /// Number of low address bits selecting a byte within a block.
    pub fn offset_bits(&self) -> u32 {
        self.block_size.trailing_zeros()
    }

    /// Number of address bits selecting the set.
    pub fn index_bits(&self) -> u32 {
        self.num_sets().trailing_zeros()
    }

    /// Checks the structural constraints of the geometry.
    ///
    /// A geometry is valid when all dimensions are positive, the block size
    /// and set count are powers of two (required by the shift/mask address
    /// split), and the capacity is a whole number of sets.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidConfig`] describing the violated
    /// constraint.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.cache_size == 0 || self.block_size == 0 || self.associativity == 0 {
            return Err(ModelError::invalid_config(
                "cache size, block size and associativity must be positive",
            ));
        }
        if !self.block_size.is_power_of_two() {
            return Err(ModelError::invalid_config("block size must be a power of two"));
        }
        let set_bytes = self.block_size * self.associativity;
        if self.cache_size < set_bytes || self.cache_size % set_bytes != 0 {
            return Err(ModelError::invalid_config(
                "cache size must be a positive multiple of block_size * associativity",
            ));
        }
        let num_sets = self.num_sets();
        if num_sets == 0 {
            return Err(ModelError::invalid_config("cache must contain at least one set"));
        }
        if !num_sets.is_power_of_two() {
            return Err(ModelError::invalid_config(
                "set count must be a power of two for index extraction",
            ));
        }
        Ok(())
    }
}

/// Knobs of the Bayesian cache-geometry search.
///
/// # Examples
///
/// Deserializing from JSON with partial overrides:
///
/// ```
/// use memscape_core::config::OptimizerConfig;
///
/// let json = r#"{ "max_cache_size_bytes": 32768, "n_calls": 40 }"#;
/// let cfg: OptimizerConfig = serde_json::from_str(json).unwrap();
/// assert_eq!(cfg.max_cache_size_bytes, 32768);
/// assert_eq!(cfg.n_calls, 40);
/// assert_eq!(cfg.n_initial, 10);
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct OptimizerConfig {
    /// Maximum cache capacity in bytes (hard cap on decoded candidates).
    #[serde(default = "OptimizerConfig::default_max_cache")]
    pub max_cache_size_bytes: usize,

    /// Minimum cache capacity in bytes.
    #[serde(default = "OptimizerConfig::default_min_cache")]
    pub min_cache_size_bytes: usize,

    /// Total objective evaluations, including the seed phase.
    #[serde(default = "OptimizerConfig::default_n_calls")]
    pub n_calls: usize,

    /// Random evaluations before the surrogate drives selection.
    #[serde(default = "OptimizerConfig::default_n_initial")]
    pub n_initial: usize,

    /// Seed for the seed-phase sampler.
    #[serde(default = "OptimizerConfig::default_seed")]
    pub seed: u64,

    /// Candidate-ranking strategy.
    #[serde(default)]
    pub acquisition: Acquisition,
}

impl OptimizerConfig {
    /// Returns the default maximum cache capacity in bytes.
    fn default_max_cache() -> usize {
        defaults::MAX_CACHE_SIZE_BYTES
    }

    /// Returns the default minimum cache capacity in bytes.
    fn default_min_cache() -> usize {
        defaults::MIN_CACHE_SIZE_BYTES
    }

    /// Returns the default evaluation budget.
    fn default_n_calls() -> usize {
        defaults::N_CALLS
    }

    /// Returns the default seed-phase length.
    fn default_n_initial() -> usize {
        defaults::N_INITIAL
    }

    /// Returns the default sampler seed.
    fn default_seed() -> u64 {
        defaults::SEED
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            max_cache_size_bytes: defaults::MAX_CACHE_SIZE_BYTES,
            min_cache_size_bytes: defaults::MIN_CACHE_SIZE_BYTES,
            n_calls: defaults::N_CALLS,
            n_initial: defaults::N_INITIAL,
            seed: defaults::SEED,
            acquisition: Acquisition::default(),
        }
    }
}

/// Hardware configuration of the tiled GEMM accelerator.
///
/// Defaults model a representative edge SoC: 2 MiB scratchpad in 4 banks,
/// 50 GB/s LPDDR5, and a 32x32 INT8 MAC array at 500 MHz.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HwConfig {
    /// Total scratchpad capacity in bytes.
    #[serde(default = "HwConfig::default_sram_total")]
    pub sram_total_bytes: u64,

    /// Number of scratchpad banks.
    #[serde(default = "HwConfig::default_sram_banks")]
    pub sram_num_banks: u64,

    /// Peak DRAM bandwidth in GB/s.
    #[serde(default = "HwConfig::default_peak_bw")]
    pub dram_peak_bw_gbps: f64,

    /// Row-buffer hit latency in nanoseconds.
    #[serde(default = "HwConfig::default_page_hit_ns")]
    pub dram_page_hit_latency_ns: f64,

    /// Row-buffer miss latency in nanoseconds.
    #[serde(default = "HwConfig::default_page_miss_ns")]
    pub dram_page_miss_latency_ns: f64,

    /// Fraction of transactions hitting an open row, in `[0, 1]`.
    #[serde(default = "HwConfig::default_page_hit_rate")]
    pub dram_page_hit_rate: f64,

    /// Sustained burst utilization, in `(0, 1]`.
    #[serde(default = "HwConfig::default_burst_efficiency")]
    pub dram_burst_efficiency: f64,

    /// MAC array rows.
    #[serde(default = "HwConfig::default_mac_m")]
    pub mac_array_m: u64,

    /// MAC array columns.
    #[serde(default = "HwConfig::default_mac_n")]
    pub mac_array_n: u64,

    /// MAC clock frequency in MHz.
    #[serde(default = "HwConfig::default_mac_freq")]
    pub mac_freq_mhz: u64,

    /// Activation element width in bytes.
    #[serde(default = "HwConfig::default_act_bytes")]
    pub act_bytes: f64,

    /// Weight element width in bytes (fractional for sub-byte formats).
    #[serde(default = "HwConfig::default_weight_bytes")]
    pub weight_bytes: f64,

    /// Accumulator element width in bytes.
    #[serde(default = "HwConfig::default_acc_bytes")]
    pub acc_bytes: u64,

    /// Output element width in bytes after requantization.
    #[serde(default = "HwConfig::default_output_bytes")]
    pub output_bytes: f64,
}

impl HwConfig {
    /// Returns the default scratchpad capacity.
    fn default_sram_total() -> u64 {
        defaults::SRAM_TOTAL_BYTES
    }

    /// Returns the default scratchpad bank count.
    fn default_sram_banks() -> u64 {
        defaults::SRAM_NUM_BANKS
    }

    /// Returns the default peak DRAM bandwidth.
    fn default_peak_bw() -> f64 {
        defaults::DRAM_PEAK_BW_GBPS
    }

    /// Returns the default row-buffer hit latency.
    fn default_page_hit_ns() -> f64 {
        defaults::DRAM_PAGE_HIT_LATENCY_NS
    }

    /// Returns the default row-buffer miss latency.
    fn default_page_miss_ns() -> f64 {
        defaults::DRAM_PAGE_MISS_LATENCY_NS
    }

    /// Returns the default row-buffer hit rate.
    fn default_page_hit_rate() -> f64 {
        defaults::DRAM_PAGE_HIT_RATE
    }

    /// Returns the default sustained burst efficiency.
    fn default_burst_efficiency() -> f64 {
        defaults::DRAM_BURST_EFFICIENCY
    }

    /// Returns the default MAC array row count.
    fn default_mac_m() -> u64 {
        defaults::MAC_ARRAY_M
    }

    /// Returns the default MAC array column count.
    fn default_mac_n() -> u64 {
        defaults::MAC_ARRAY_N
    }

    /// Returns the default MAC clock frequency.
    fn default_mac_freq() -> u64 {
        defaults::MAC_FREQ_MHZ
    }

    /// Returns the default activation width.
    fn default_act_bytes() -> f64 {
        defaults::ACT_BYTES
    }

    /// Returns the default weight width.
    fn default_weight_bytes() -> f64 {
        defaults::WEIGHT_BYTES
    }

    /// Returns the default accumulator width.
    fn default_acc_bytes() -> u64 {
        defaults::ACC_BYTES
    }

    /// Returns the default output width.
    fn default_output_bytes() -> f64 {
        defaults::OUTPUT_BYTES
    }

    /// Peak MAC operations per clock cycle.
    pub fn macs_per_cycle(&self) -> u64 {
        self.mac_array_m * self.mac_array_n
    }

    /// Peak throughput in GOPS.
    pub fn peak_gops(&self) -> f64 {
        self.macs_per_cycle() as f64 * self.mac_freq_mhz as f64 / 1000.0
    }

    /// Clock period in nanoseconds.
    pub fn cycle_ns(&self) -> f64 {
        1000.0 / self.mac_freq_mhz as f64
    }

    /// Peak DRAM bandwidth in bytes per nanosecond (numerically GB/s).
    pub fn bw_bytes_per_ns(&self) -> f64 {
        self.dram_peak_bw_gbps
    }

    /// Peak DRAM bandwidth in bytes per compute clock cycle.
    pub fn bw_bytes_per_cycle(&self) -> f64 {
        self.bw_bytes_per_ns() * self.cycle_ns()
    }

    /// Estimates DRAM transfer time in compute-clock cycles.
    ///
    /// Each transaction pays the page-hit/page-miss weighted initial latency
    /// plus its payload at the sustained (burst-derated) bandwidth. Many
    /// small transfers are therefore latency-dominated while large
    /// sequential bursts approach peak bandwidth.
    pub fn dram_transfer_cycles(&self, num_bytes: u64, num_transactions: u64) -> f64 {
        if num_bytes == 0 || num_transactions == 0 {
            return 0.0;
        }
        let bytes_per_txn = num_bytes as f64 / num_transactions as f64;
        let avg_latency_ns = self.dram_page_hit_rate * self.dram_page_hit_latency_ns
            + (1.0 - self.dram_page_hit_rate) * self.dram_page_miss_latency_ns;
        let sustained_bw = self.bw_bytes_per_ns() * self.dram_burst_efficiency;
        let time_per_txn_ns = avg_latency_ns + bytes_per_txn / sustained_bw;
        num_transactions as f64 * time_per_txn_ns / self.cycle_ns()
    }
}

impl Default for HwConfig {
    /// Creates the default edge-SoC hardware configuration.
    fn default() -> Self {
        Self {
            sram_total_bytes: defaults::SRAM_TOTAL_BYTES,
            sram_num_banks: defaults::SRAM_NUM_BANKS,
            dram_peak_bw_gbps: defaults::DRAM_PEAK_BW_GBPS,
            dram_page_hit_latency_ns: defaults::DRAM_PAGE_HIT_LATENCY_NS,
            dram_page_miss_latency_ns: defaults::DRAM_PAGE_MISS_LATENCY_NS,
            dram_page_hit_rate: defaults::DRAM_PAGE_HIT_RATE,
            dram_burst_efficiency: defaults::DRAM_BURST_EFFICIENCY,
            mac_array_m: defaults::MAC_ARRAY_M,
            mac_array_n: defaults::MAC_ARRAY_N,
            mac_freq_mhz: defaults::MAC_FREQ_MHZ,
            act_bytes: defaults::ACT_BYTES,
            weight_bytes: defaults::WEIGHT_BYTES,
            acc_bytes: defaults::ACC_BYTES,
            output_bytes: defaults::OUTPUT_BYTES,
        }
    }
}

/// Transformer model architecture parameters.
///
/// Only the widths that determine projection GEMM shapes are consumed by the
/// sweep engine; the remaining fields describe the model for reporting.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelConfig {
    /// Model name for reporting.
    pub name: String,
    /// Number of transformer layers.
    pub num_layers: u64,
    /// Hidden (embedding) width.
    pub hidden_size: u64,
    /// Number of query heads.
    pub num_q_heads: u64,
    /// Number of key/value heads (grouped-query attention).
    pub num_kv_heads: u64,
    /// Width of one attention head.
    pub head_dim: u64,
    /// FFN intermediate width.
    pub intermediate_size: u64,
    /// Vocabulary size.
    pub vocab_size: u64,
    /// Maximum supported sequence length.
    pub max_seq_len: u64,
}

impl ModelConfig {
    /// Total KV projection width, `num_kv_heads * head_dim`.
    pub fn kv_dim(&self) -> u64 {
        self.num_kv_heads * self.head_dim
    }

    /// GQA group size: query heads sharing one KV head.
    pub fn gqa_ratio(&self) -> u64 {
        self.num_q_heads / self.num_kv_heads.max(1)
    }

    /// Reference model: Qwen3-8B.
    pub fn qwen3_8b() -> Self {
        Self {
            name: "Qwen3-8B".to_owned(),
            num_layers: 36,
            hidden_size: 4096,
            num_q_heads: 32,
            num_kv_heads: 8,
            head_dim: 128,
            intermediate_size: 12288,
            vocab_size: 151_936,
            max_seq_len: 40_960,
        }
    }
}
