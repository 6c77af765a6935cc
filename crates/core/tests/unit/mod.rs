//! # Unit Components
//!
//! Central hub for the unit tests of both exploration engines, organized by
//! the module under test.


/// Randomized property tests for the cache simulator (counter identity,
/// replay determinism, stride-walk miss counts).
pub mod cache_properties;



/// Tests for the Bayesian optimizer: seed phase, history bookkeeping,
/// acquisition scoring, surrogate sanity, and synthetic convergence.
pub mod optim;

/// Tests for the comparator-parameterized Pareto extractor.
pub mod pareto;


/// Tests for the deterministic trace generator.
pub mod trace;
