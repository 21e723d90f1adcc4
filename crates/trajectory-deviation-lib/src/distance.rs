//! Running arc-length integration along a point sequence

use crate::utils;
use geo::Point;

/// Integrates consecutive Euclidean deltas into cumulative traveled distance
///
/// The first point is at distance 0 and every following point adds the straight-line
/// length of the step from its predecessor, so the result is non-decreasing by construction.
#[derive(Debug, Clone, Copy, Default)]
pub struct DistanceAccumulator {
    previous: Option<Point<f64>>,
    total: f64,
}

impl DistanceAccumulator {
    /// Create an accumulator positioned before the first point
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance to `point` and return the cumulative distance at it
    #[inline]
    pub fn push(&mut self, point: Point<f64>) -> f64 {
        if let Some(prev) = self.previous {
            self.total += utils::distance(prev, point);
        }
        self.previous = Some(point);
        self.total
    }

    /// Total distance accumulated so far in meters
    #[inline]
    pub fn total(&self) -> f64 {
        self.total
    }

    /// Cumulative distance at every point of `positions`
    pub fn annotate(positions: &[Point<f64>]) -> Vec<f64> {
        let mut accumulator = Self::new();
        positions.iter().map(|&p| accumulator.push(p)).collect()
    }
}
