//! 2-D Pareto frontier extraction.
//!
//! One extractor serves both engines: the cache search minimizes both axes
//! (capacity, miss rate) while the tiling sweep minimizes DRAM traffic and
//! maximizes utilization. The direction of the second objective is a
//! parameter rather than a second implementation.

/// Optimization direction of the second objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Smaller `y` dominates.
    Minimize,
    /// Larger `y` dominates.
    Maximize,
}

impl Direction {
    /// Whether `candidate` strictly improves on `incumbent`.
    fn improves(self, candidate: f64, incumbent: f64) -> bool {
        match self {
            Self::Minimize => candidate < incumbent,
            Self::Maximize => candidate > incumbent,
        }
    }
}

/// Extracts the non-dominated subset of `items` under `(x ↓, y per direction)`.
///
/// Sorts ascending by `x` (ties keep the better `y` first), then walks the
/// order keeping the best `y` seen so far and emits a point whenever its `y`
/// strictly improves the running best. Every emitted point is non-dominated
/// and every omitted point is dominated by an emitted one.
pub fn pareto_frontier<T, FX, FY>(items: &[T], fx: FX, fy: FY, y_direction: Direction) -> Vec<T>
where
    T: Clone,
    FX: Fn(&T) -> f64,
    FY: Fn(&T) -> f64,
{
    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by(|&a, &b| {
        let by_x = fx(&items[a]).total_cmp(&fx(&items[b]));
        if by_x != std::cmp::Ordering::Equal {
            return by_x;
        }
        // Ties on x: the better y comes first so the walk keeps it.
        match y_direction {
            Direction::Minimize => fy(&items[a]).total_cmp(&fy(&items[b])),
            Direction::Maximize => fy(&items[b]).total_cmp(&fy(&items[a])),
        }
    });

    let mut frontier = Vec::new();
    let mut best_y: Option<f64> = None;
    for idx in order {
        let y = fy(&items[idx]);
        let improved = best_y.map_or(true, |b| y_direction.improves(y, b));
        if improved {
            best_y = Some(y);
            frontier.push(items[idx].clone());
        }
    }
    frontier
}
