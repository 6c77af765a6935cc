//! Synthetic memory-access trace generation.
//!
//! Produces deterministic address sequences for six fixed algorithmic
//! patterns: matrix multiply, quicksort, sequential scan, strided access,
//! uniform random access, and a shuffled mixed workload. All addresses are
//! byte addresses aligned to the 4-byte element size; generation is
//! deterministic given the generator seed.
//!
//! The matrix-multiply pattern is prescribed bit-exact (per `(i, j, k)`
//! triple: `C[i][j]`, `A[i][k]`, `B[k][j]`, `C[i][j]`) so that test vectors
//! are reproducible across runs and machines.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use std::collections::HashSet;

/// Bytes per trace element (32-bit words).
const ELEMENT_SIZE: u64 = 4;

/// Base address of the matrix-multiply working set.
pub const MATMUL_BASE: u64 = 0x10000;
/// Base address of the quicksort array.
pub const QUICKSORT_BASE: u64 = 0x20000;
/// Base address of the sequential-scan array.
pub const SEQUENTIAL_BASE: u64 = 0x30000;
/// Base address of the random-access array.
pub const RANDOM_BASE: u64 = 0x40000;
/// Base address of the strided-access array.
pub const STRIDED_BASE: u64 = 0x50000;

/// Probability that a quicksort scan element is written back (second access).
const WRITE_BACK_PROBABILITY: f64 = 0.3;

/// An ordered, finite, replayable sequence of memory addresses.
///
/// Traces are fixed once generated; callers replay them through the cache
/// simulator any number of times via [`Trace::iter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    addrs: Vec<u64>,
}

impl Trace {
    /// Number of accesses in the trace.
    pub fn len(&self) -> usize {
        self.addrs.len()
    }

    /// Whether the trace contains no accesses.
    pub fn is_empty(&self) -> bool {
        self.addrs.is_empty()
    }

    /// Replays the trace from the beginning.
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.addrs.iter().copied()
    }

    /// The raw address sequence.
    pub fn as_slice(&self) -> &[u64] {
        &self.addrs
    }

    /// Number of distinct addresses touched by the trace.
    pub fn unique_addresses(&self) -> usize {
        self.addrs.iter().collect::<HashSet<_>>().len()
    }
}

impl From<Vec<u64>> for Trace {
    fn from(addrs: Vec<u64>) -> Self {
        Self { addrs }
    }
}

/// Deterministic generator for the six trace kinds.
///
/// One seeded pseudo-random stream drives every stochastic decision (pivot
/// draws, write-back coin flips, random indices, the mixed-workload
/// permutation), so a generator constructed with the same seed reproduces
/// the same suite access for access.
#[derive(Debug)]
pub struct TraceGenerator {
    rng: StdRng,
    seed: u64,
}

impl TraceGenerator {
    /// Creates a generator with the given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    /// The seed this generator was constructed with.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Row-major matrix-multiply trace for `C[N,N] += A[N,N] * B[N,N]`.
    ///
    /// The three matrices are laid out consecutively from `base_addr` with
    /// 4-byte elements. The B column walk gives this pattern its
    /// characteristically poor spatial locality.
    pub fn matrix_multiply(&mut self, n: usize, base_addr: u64) -> Trace {
        let n = n as u64;
        let a_base = base_addr;
        let b_base = a_base + n * n * ELEMENT_SIZE;
        let c_base = b_base + n * n * ELEMENT_SIZE;

        let mut addrs = Vec::with_capacity((n * n * (1 + 3 * n)) as usize);
        for i in 0..n {
            for j in 0..n {
                let c_addr = c_base + (i * n + j) * ELEMENT_SIZE;
                addrs.push(c_addr);
                for k in 0..n {
                    addrs.push(a_base + (i * n + k) * ELEMENT_SIZE);
                    addrs.push(b_base + (k * n + j) * ELEMENT_SIZE);
                    addrs.push(c_addr);
                }
            }
        }
        Trace { addrs }
    }

    /// Quicksort-style trace over an array of `len` elements.
    ///
    /// Each partition of `[lo, hi]` emits one randomly drawn pivot address,
    /// then every element address in the range with a 30% chance of an
    /// immediate write-back repeat, and recurses into the two halves split
    /// at the midpoint.
    pub fn quicksort(&mut self, len: usize, base_addr: u64) -> Trace {
        // The value array is shuffled through the seeded stream; the address
        // pattern itself only consumes the pivot draws and coin flips.
        let mut values: Vec<u32> = (0..len as u32).collect();
        values.shuffle(&mut self.rng);

        let mut addrs = Vec::new();
        if len > 0 {
            self.partition(0, len as i64 - 1, base_addr, &mut addrs);
        }
        Trace { addrs }
    }

    /// Emits one partition of `[lo, hi]` and recurses into both halves.
    fn partition(&mut self, lo: i64, hi: i64, base_addr: u64, addrs: &mut Vec<u64>) {
        if lo >= hi {
            return;
        }
        let pivot_idx = self.rng.gen_range(lo..=hi);
        addrs.push(base_addr + pivot_idx as u64 * ELEMENT_SIZE);

        for i in lo..=hi {
            let addr = base_addr + i as u64 * ELEMENT_SIZE;
            addrs.push(addr);
            if self.rng.gen_bool(WRITE_BACK_PROBABILITY) {
                addrs.push(addr);
            }
        }

        let mid = lo + (hi - lo) / 2;
        self.partition(lo, mid - 1, base_addr, addrs);
        self.partition(mid + 1, hi, base_addr, addrs);
    }

    /// Linear walk over `len` elements with the given element stride.
    pub fn sequential_scan(&mut self, len: usize, stride: usize, base_addr: u64) -> Trace {
        let addrs = (0..len)
            .step_by(stride.max(1))
            .map(|i| base_addr + i as u64 * ELEMENT_SIZE)
            .collect();
        Trace { addrs }
    }

    /// Strided walk over `len` elements, repeated for `passes` full passes.
    pub fn strided(&mut self, len: usize, stride: usize, passes: usize, base_addr: u64) -> Trace {
        let mut addrs = Vec::new();
        for _ in 0..passes {
            addrs.extend(
                (0..len)
                    .step_by(stride.max(1))
                    .map(|i| base_addr + i as u64 * ELEMENT_SIZE),
            );
        }
        Trace { addrs }
    }

    /// `num_accesses` uniform draws over an array of `len` elements.
    pub fn random_access(&mut self, len: usize, num_accesses: usize, base_addr: u64) -> Trace {
        let addrs = (0..num_accesses)
            .map(|_| base_addr + self.rng.gen_range(0..len as u64) * ELEMENT_SIZE)
            .collect();
        Trace { addrs }
    }

    /// Mixed workload: sequential (40%), strided (30%), random (20%) and a
    /// small random hotspot (10%), randomly permuted into one trace.
    pub fn mixed(&mut self, size: usize) -> Trace {
        let seq_size = (size as f64 * 0.4) as usize;
        let stride_size = (size as f64 * 0.3) as usize;
        let random_size = (size as f64 * 0.2) as usize;
        let hotspot_size = (size as f64 * 0.1) as usize;

        let mut addrs = Vec::new();
        addrs.extend(self.sequential_scan(seq_size, 1, MATMUL_BASE).addrs);
        addrs.extend(self.strided(stride_size, 8, 1, QUICKSORT_BASE).addrs);
        addrs.extend(self.random_access(1000, random_size, SEQUENTIAL_BASE).addrs);
        addrs.extend(self.random_access(100, hotspot_size, RANDOM_BASE).addrs);
        addrs.shuffle(&mut self.rng);
        Trace { addrs }
    }

    /// The named workload suite used by the cache experiment.
    ///
    /// Covers the cache-behavior spectrum: compute kernels with reuse
    /// (matmul), irregular pointer-ish patterns (quicksort), streaming,
    /// pure random, strided column walks, and a shuffled mix.
    pub fn workload_suite(&mut self) -> Vec<(String, Trace)> {
        vec![
            ("matmul_32".to_owned(), self.matrix_multiply(32, MATMUL_BASE)),
            ("matmul_64".to_owned(), self.matrix_multiply(64, MATMUL_BASE)),
            ("sort_1k".to_owned(), self.quicksort(1000, QUICKSORT_BASE)),
            ("sort_5k".to_owned(), self.quicksort(5000, QUICKSORT_BASE)),
            (
                "sequential".to_owned(),
                self.sequential_scan(5000, 1, SEQUENTIAL_BASE),
            ),
            (
                "random".to_owned(),
                self.random_access(5000, 5000, RANDOM_BASE),
            ),
            ("stride_8".to_owned(), self.strided(5000, 8, 1, STRIDED_BASE)),
            ("mixed".to_owned(), self.mixed(5000)),
        ]
    }
}
