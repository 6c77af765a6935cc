//! Cache Simulator Property Tests.
//!
//! Randomized verification of the simulator's quantified invariants across
//! geometries: the counter identity, replay determinism, and the closed-form
//! miss count of an aligned stride-1 word walk.

use proptest::prelude::*;

use memscape_core::cache::CacheSim;
use memscape_core::config::CacheGeometry;
use memscape_core::trace::Trace;

/// Strategy over valid power-of-two geometries within the search bounds.
fn geometries() -> impl Strategy<Value = CacheGeometry> {
    (10u32..=16, 4u32..=9, 0u32..=4).prop_filter_map(
        "associativity must not exceed the block count",
        |(size_exp, block_exp, assoc_exp)| {
            let geometry =
                CacheGeometry::new(1 << size_exp, 1 << block_exp, 1 << assoc_exp);
            geometry.validate().is_ok().then_some(geometry)
        },
    )
}

proptest! {
    /// `hits + misses == accesses` for arbitrary traces and geometries.
    #[test]
    fn counter_identity_holds(
        geometry in geometries(),
        addrs in prop::collection::vec(0u64..1_048_576, 0..400),
    ) {
        let aligned: Vec<u64> = addrs.iter().map(|a| a & !3).collect();
        let trace = Trace::from(aligned);
        let mut sim = CacheSim::new(geometry).expect("strategy yields valid geometries");
        let stats = sim.run_trace(&trace);

        prop_assert_eq!(stats.hits + stats.misses, stats.accesses);
        prop_assert_eq!(stats.accesses, trace.len() as u64);
    }

    /// Reset followed by replay of the same trace reproduces the same stats.
    #[test]
    fn replay_after_reset_is_deterministic(
        geometry in geometries(),
        addrs in prop::collection::vec(0u64..1_048_576, 1..400),
    ) {
        let trace = Trace::from(addrs);
        let mut sim = CacheSim::new(geometry).expect("strategy yields valid geometries");

        let first = sim.run_trace(&trace);
        sim.reset();
        let second = sim.run_trace(&trace);

        prop_assert_eq!(first, second);
    }

    /// An aligned stride-1 walk of `n` words misses exactly
    /// `ceil(4n / block_size)` times on any geometry: each line is touched
    /// by consecutive accesses, so no line is evicted while still needed.
    #[test]
    fn stride_one_walk_miss_count(
        geometry in geometries(),
        n in 1usize..2000,
    ) {
        let addrs: Vec<u64> = (0..n as u64).map(|i| i * 4).collect();
        let trace = Trace::from(addrs);
        let mut sim = CacheSim::new(geometry).expect("strategy yields valid geometries");
        let stats = sim.run_trace(&trace);

        let expected_misses = (4 * n).div_ceil(geometry.block_size) as u64;
        prop_assert_eq!(stats.misses, expected_misses);
        prop_assert_eq!(stats.hits, n as u64 - expected_misses);
    }
}
