//! Trace-driven set-associative cache simulator.
//!
//! Models a single-level cache with true-LRU replacement. Addresses are
//! split into tag/index/offset by shift and mask; each set is a short
//! ordered deque holding at most `associativity` tags from least recently
//! used (front) to most recently used (back).
//!
//! `access` is O(associativity) and the simulator holds
//! O(`cache_size / block_size`) tags in total. This kernel never logs and
//! never fails after construction.

use std::collections::VecDeque;

use serde::Serialize;

use crate::common::error::ModelError;
use crate::config::CacheGeometry;
use crate::trace::Trace;

/// Aggregate hit/miss counters for one simulation run.
///
/// Invariant: `hits + misses == accesses`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Accesses that found their block resident.
    pub hits: u64,
    /// Accesses that had to install a block.
    pub misses: u64,
    /// Total accesses simulated.
    pub accesses: u64,
}

impl CacheStats {
    /// Fraction of accesses that missed; `0.0` for an empty run.
    pub fn miss_rate(&self) -> f64 {
        if self.accesses == 0 {
            0.0
        } else {
            self.misses as f64 / self.accesses as f64
        }
    }

    /// Fraction of accesses that hit; `0.0` for an empty run.
    pub fn hit_rate(&self) -> f64 {
        if self.accesses == 0 {
            0.0
        } else {
            self.hits as f64 / self.accesses as f64
        }
    }
}

/// Set-associative LRU cache simulator.
pub struct CacheSim {
    geometry: CacheGeometry,
    /// One deque per set; front is LRU, back is MRU.
    sets: Vec<VecDeque<u64>>,
    stats: CacheStats,
    offset_bits: u32,
    index_bits: u32,
}

impl CacheSim {
    /// Creates a simulator for the given geometry.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidConfig`] when the geometry violates the
    /// structural constraints (see [`CacheGeometry::validate`]).
    pub fn new(geometry: CacheGeometry) -> Result<Self, ModelError> {
        geometry.validate()?;
        let num_sets = geometry.num_sets();
        Ok(Self {
            sets: vec![VecDeque::with_capacity(geometry.associativity); num_sets],
            offset_bits: geometry.offset_bits(),
            index_bits: geometry.index_bits(),
            stats: CacheStats::default(),
            geometry,
        })
    }

    /// The geometry this simulator was built for.
    pub fn geometry(&self) -> &CacheGeometry {
        &self.geometry
    }

    /// Counters accumulated since construction or the last [`CacheSim::reset`].
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Splits an address into `(tag, set index)`.
    fn decompose(&self, addr: u64) -> (u64, usize) {
        let index_mask = (1u64 << self.index_bits) - 1;
        let index = (addr >> self.offset_bits) & index_mask;
        let tag = addr >> (self.offset_bits + self.index_bits);
        (tag, index as usize)
    }

    /// Simulates one access (unified read/write) and returns whether it hit.
    ///
    /// On a hit the tag moves to the MRU position. On a miss the tag is
    /// installed at the MRU position, evicting the LRU tag first when the
    /// set is full.
    pub fn access(&mut self, addr: u64) -> bool {
        self.stats.accesses += 1;
        let (tag, index) = self.decompose(addr);
        let set = &mut self.sets[index];

        if let Some(pos) = set.iter().position(|&t| t == tag) {
            self.stats.hits += 1;
            let _ = set.remove(pos);
            set.push_back(tag);
            return true;
        }

        self.stats.misses += 1;
        if set.len() >= self.geometry.associativity {
            let _ = set.pop_front();
        }
        set.push_back(tag);
        false
    }

    /// Runs every address of a trace through the cache and returns the
    /// accumulated counters.
    pub fn run_trace(&mut self, trace: &Trace) -> CacheStats {
        for addr in trace.iter() {
            let _ = self.access(addr);
        }
        self.stats
    }

    /// Empties every set and zeroes the counters.
    pub fn reset(&mut self) {
        for set in &mut self.sets {
            set.clear();
        }
        self.stats = CacheStats::default();
    }
}

/// Evaluates a cache geometry on a trace and returns its miss rate.
///
/// An empty trace has no accesses and therefore no misses; its miss rate is
/// `0.0`.
///
/// # Errors
///
/// Returns [`ModelError::InvalidConfig`] for structurally impossible
/// geometries. Callers feeding an optimizer should use
/// [`miss_rate_or_worst`] instead, which maps failure to the worst-case
/// objective.
pub fn evaluate_cache(geometry: CacheGeometry, trace: &Trace) -> Result<f64, ModelError> {
    let mut sim = CacheSim::new(geometry)?;
    if trace.is_empty() {
        return Ok(0.0);
    }
    Ok(sim.run_trace(trace).miss_rate())
}

/// Optimizer-facing wrapper around [`evaluate_cache`].
///
/// The search loop requires a scalar for every suggestion; an invalid
/// geometry scores the worst possible miss rate (`1.0`) so the search keeps
/// making progress instead of aborting.
pub fn miss_rate_or_worst(geometry: CacheGeometry, trace: &Trace) -> f64 {
    evaluate_cache(geometry, trace).unwrap_or(1.0)
}
