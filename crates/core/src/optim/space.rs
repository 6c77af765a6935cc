//! Discrete log-encoded search space for cache geometries.
//!
//! The three knobs are represented as integer exponents; cache parameters
//! are powers of two in hardware, and exponent encoding samples the space
//! uniformly in log scale, which matches how designers reason about cache
//! sizes.

use rand::rngs::StdRng;
use rand::Rng;

use crate::config::CacheGeometry;

/// Exponent range of the block size: 16 B (`2^4`) to 512 B (`2^9`).
const BLOCK_EXP_RANGE: (u32, u32) = (4, 9);

/// Exponent range of the associativity: direct-mapped (`2^0`) to 16-way (`2^4`).
const ASSOC_EXP_RANGE: (u32, u32) = (0, 4);

/// A point in the space: `(cache_size_exp, block_size_exp, assoc_exp)`.
pub type Point = [u32; 3];

/// The discrete 3-D exponent space searched by the optimizer.
#[derive(Debug, Clone)]
pub struct SearchSpace {
    size_exp: (u32, u32),
    block_exp: (u32, u32),
    assoc_exp: (u32, u32),
    max_cache_bytes: usize,
}

impl SearchSpace {
    /// Number of dimensions of the space.
    pub const DIMENSIONS: usize = 3;

    /// Builds the space spanned by the configured capacity bounds.
    ///
    /// The size exponent ranges over `[log2(min), log2(max)]`; block and
    /// associativity exponents are fixed hardware-typical ranges.
    pub fn new(min_cache_bytes: usize, max_cache_bytes: usize) -> Self {
        let lo = min_cache_bytes.max(2).ilog2();
        let hi = max_cache_bytes.max(2).ilog2().max(lo);
        Self {
            size_exp: (lo, hi),
            block_exp: BLOCK_EXP_RANGE,
            assoc_exp: ASSOC_EXP_RANGE,
            max_cache_bytes,
        }
    }

    /// Total number of points in the space.
    pub fn cardinality(&self) -> usize {
        let span = |(lo, hi): (u32, u32)| (hi - lo + 1) as usize;
        span(self.size_exp) * span(self.block_exp) * span(self.assoc_exp)
    }

    /// Decodes an exponent point into a concrete geometry.
    ///
    /// The cache size is clamped to the configured cap and the
    /// associativity is clamped to the total block count, so every decoded
    /// point is realizable.
    pub fn decode(&self, point: Point) -> CacheGeometry {
        let cache_size = (1usize << point[0]).min(self.max_cache_bytes);
        let block_size = 1usize << point[1];
        let mut associativity = 1usize << point[2];

        let num_blocks = (cache_size / block_size).max(1);
        if associativity > num_blocks {
            associativity = num_blocks;
        }
        CacheGeometry::new(cache_size, block_size, associativity)
    }

    /// Encodes a geometry back into its exponent point.
    ///
    /// Returns `None` unless each knob is a power of two inside its range;
    /// for such geometries `decode(encode(g)) == g`.
    pub fn encode(&self, geometry: &CacheGeometry) -> Option<Point> {
        let exp_of = |value: usize, (lo, hi): (u32, u32)| {
            if !value.is_power_of_two() {
                return None;
            }
            let exp = value.ilog2();
            (lo..=hi).contains(&exp).then_some(exp)
        };
        Some([
            exp_of(geometry.cache_size, self.size_exp)?,
            exp_of(geometry.block_size, self.block_exp)?,
            exp_of(geometry.associativity, self.assoc_exp)?,
        ])
    }

    /// Enumerates every point of the space in a fixed deterministic order.
    pub fn enumerate(&self) -> Vec<Point> {
        let mut points = Vec::with_capacity(self.cardinality());
        for size in self.size_exp.0..=self.size_exp.1 {
            for block in self.block_exp.0..=self.block_exp.1 {
                for assoc in self.assoc_exp.0..=self.assoc_exp.1 {
                    points.push([size, block, assoc]);
                }
            }
        }
        points
    }

    /// Draws one point uniformly from the three integer ranges.
    pub fn sample(&self, rng: &mut StdRng) -> Point {
        [
            rng.gen_range(self.size_exp.0..=self.size_exp.1),
            rng.gen_range(self.block_exp.0..=self.block_exp.1),
            rng.gen_range(self.assoc_exp.0..=self.assoc_exp.1),
        ]
    }

    /// Maps a point into the unit cube for the isotropic surrogate kernel.
    pub fn normalize(&self, point: Point) -> [f64; 3] {
        let scale = |value: u32, (lo, hi): (u32, u32)| {
            if hi == lo {
                0.0
            } else {
                f64::from(value - lo) / f64::from(hi - lo)
            }
        };
        [
            scale(point[0], self.size_exp),
            scale(point[1], self.block_exp),
            scale(point[2], self.assoc_exp),
        ]
    }
}
