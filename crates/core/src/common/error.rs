//! Error definitions.
//!
//! The kernels (cache simulator, tiling cost model) never log; they return
//! these errors to the caller. The optimizer recovers from evaluation errors
//! by substituting the worst-case objective value, and the orchestrator
//! aggregates per-entry outcomes instead of failing the whole run.

use thiserror::Error;

/// Failure modes of the exploration kernels.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// A cache geometry violates its structural constraints (non-positive
    /// dimension, non-power-of-two block, capacity not a whole number of
    /// sets, or zero sets).
    #[error("invalid cache geometry: {reason}")]
    InvalidConfig {
        /// Human-readable description of the violated constraint.
        reason: String,
    },

    /// A tiling's minimum SRAM footprint (A buffer + B buffer + one output
    /// tile) exceeds the scratchpad capacity.
    #[error("tiling needs {required} B of SRAM but only {capacity} B are available")]
    CapacityExceeded {
        /// Minimum footprint of the rejected tiling in bytes.
        required: u64,
        /// Scratchpad capacity in bytes.
        capacity: u64,
    },

    /// An operation that requires memory accesses was given an empty trace.
    #[error("trace contains no accesses")]
    EmptyTrace,
}

impl ModelError {
    /// Creates an [`ModelError::InvalidConfig`] from a constraint description.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}
