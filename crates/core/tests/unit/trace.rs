//! Trace Generator Unit Tests.
//!
//! Verifies the bit-exact matrix-multiply pattern, the structural
//! guarantees of each pattern kind (length, alignment, address bounds), and
//! cross-generator determinism for a shared seed.

use pretty_assertions::assert_eq;

use memscape_core::trace::{TraceGenerator, MATMUL_BASE, QUICKSORT_BASE, SEQUENTIAL_BASE};

// ══════════════════════════════════════════════════════════
// 1. Matrix multiply (bit-exact)
// ══════════════════════════════════════════════════════════

/// The 2x2 matmul trace is fully prescribed: per (i, j) one C touch, then
/// per k the A/B/C triple. A, B, C are laid out consecutively.
#[test]
fn matmul_2x2_is_bit_exact() {
    let mut generator = TraceGenerator::new(42);
    let trace = generator.matrix_multiply(2, 0x1000);

    let a = 0x1000u64; // 2*2 elements * 4 B
    let b = a + 16;
    let c = b + 16;
    let expected: Vec<u64> = vec![
        // i=0, j=0
        c, a, b, c, a + 4, b + 8, c,
        // i=0, j=1
        c + 4, a, b + 4, c + 4, a + 4, b + 12, c + 4,
        // i=1, j=0
        c + 8, a + 8, b, c + 8, a + 12, b + 8, c + 8,
        // i=1, j=1
        c + 12, a + 8, b + 4, c + 12, a + 12, b + 12, c + 12,
    ];

    assert_eq!(trace.as_slice(), expected.as_slice());
}

/// A matmul over NxN matrices emits N^2 * (1 + 3N) accesses and touches
/// exactly the 3 N^2 distinct element addresses.
#[test]
fn matmul_length_and_footprint() {
    let mut generator = TraceGenerator::new(42);
    let n = 8;
    let trace = generator.matrix_multiply(n, MATMUL_BASE);

    assert_eq!(trace.len(), n * n * (1 + 3 * n));
    assert_eq!(trace.unique_addresses(), 3 * n * n);
}

// ══════════════════════════════════════════════════════════
// 2. Scan / stride / random structure
// ══════════════════════════════════════════════════════════

/// A stride-1 scan emits consecutive word addresses.
#[test]
fn sequential_scan_is_contiguous() {
    let mut generator = TraceGenerator::new(42);
    let trace = generator.sequential_scan(16, 1, SEQUENTIAL_BASE);

    let expected: Vec<u64> = (0..16).map(|i| SEQUENTIAL_BASE + i * 4).collect();
    assert_eq!(trace.as_slice(), expected.as_slice());
}

/// A strided walk visits every `stride`-th element once per pass.
#[test]
fn strided_walk_length() {
    let mut generator = TraceGenerator::new(42);
    let trace = generator.strided(100, 8, 3, SEQUENTIAL_BASE);

    // ceil(100 / 8) = 13 addresses per pass.
    assert_eq!(trace.len(), 3 * 13);
    assert_eq!(trace.unique_addresses(), 13);
}

/// Random accesses stay inside the array and on word boundaries.
#[test]
fn random_access_bounds_and_alignment() {
    let mut generator = TraceGenerator::new(42);
    let len = 1000u64;
    let trace = generator.random_access(len as usize, 5000, SEQUENTIAL_BASE);

    assert_eq!(trace.len(), 5000);
    for addr in trace.iter() {
        assert!(addr >= SEQUENTIAL_BASE);
        assert!(addr < SEQUENTIAL_BASE + len * 4);
        assert_eq!(addr % 4, 0, "addresses are word-aligned");
    }
}

// ══════════════════════════════════════════════════════════
// 3. Quicksort structure
// ══════════════════════════════════════════════════════════

/// Every quicksort address lands inside the array; each partition scan can
/// at most double its accesses through write-backs.
#[test]
fn quicksort_bounds_and_alignment() {
    let mut generator = TraceGenerator::new(42);
    let len = 500u64;
    let trace = generator.quicksort(len as usize, QUICKSORT_BASE);

    assert!(!trace.is_empty());
    for addr in trace.iter() {
        assert!(addr >= QUICKSORT_BASE);
        assert!(addr < QUICKSORT_BASE + len * 4);
        assert_eq!(addr % 4, 0);
    }
}

/// Trivial arrays produce no partitions and therefore no accesses.
#[test]
fn quicksort_trivial_inputs() {
    let mut generator = TraceGenerator::new(42);
    assert!(generator.quicksort(0, QUICKSORT_BASE).is_empty());
    assert!(generator.quicksort(1, QUICKSORT_BASE).is_empty());
}

// ══════════════════════════════════════════════════════════
// 4. Mixed workload
// ══════════════════════════════════════════════════════════

/// The mixed workload concatenates its four segments before shuffling, so
/// its length is the sum of the segment lengths.
#[test]
fn mixed_workload_length() {
    let mut generator = TraceGenerator::new(42);
    let trace = generator.mixed(5000);

    // sequential 2000 + strided ceil(1500/8) + random 1000 + hotspot 500.
    assert_eq!(trace.len(), 2000 + 188 + 1000 + 500);
}

// ══════════════════════════════════════════════════════════
// 5. Determinism
// ══════════════════════════════════════════════════════════

/// Two generators with the same seed produce identical workload suites.
#[test]
fn same_seed_same_suite() {
    let suite_a = TraceGenerator::new(7).workload_suite();
    let suite_b = TraceGenerator::new(7).workload_suite();

    assert_eq!(suite_a.len(), suite_b.len());
    for ((name_a, trace_a), (name_b, trace_b)) in suite_a.iter().zip(&suite_b) {
        assert_eq!(name_a, name_b);
        assert_eq!(trace_a, trace_b, "workload {name_a} differs between runs");
    }
}

/// Different seeds change the stochastic workloads.
#[test]
fn different_seed_changes_random_traces() {
    let mut gen_a = TraceGenerator::new(1);
    let mut gen_b = TraceGenerator::new(2);

    assert_ne!(
        gen_a.random_access(1000, 200, SEQUENTIAL_BASE),
        gen_b.random_access(1000, 200, SEQUENTIAL_BASE)
    );
}

/// The workload suite carries the eight named workloads in a fixed order.
#[test]
fn suite_names_and_order() {
    let suite = TraceGenerator::new(42).workload_suite();
    let names: Vec<&str> = suite.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(
        names,
        [
            "matmul_32",
            "matmul_64",
            "sort_1k",
            "sort_5k",
            "sequential",
            "random",
            "stride_8",
            "mixed"
        ]
    );
}
