//! Path storage and construction module
//!
//! This module provides the `Path` struct: an immutable, index-addressable sequence of
//! trajectory points with precomputed cumulative distance and continuity-corrected headings.

use crate::{DistanceAccumulator, EngineError, Result, heading, utils};
use geo::Point;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Planar position `(x, y)` in meters of a projected coordinate system (for example UTM)
pub type Position = Point<f64>;

/// A single sample of a path
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrajectoryPoint {
    /// Planar position in meters
    pub position: Position,
    /// Heading in radians, unwrapped so that consecutive samples never jump by more than
    /// the unwrap threshold
    pub heading: f64,
    /// Traveled distance from the first point of the path in meters
    pub cumulative_distance: f64,
}

/// An ordered sequence of trajectory points (at least [`Path::MIN_POINTS`])
///
/// Cumulative distance and heading unwrapping are computed once during construction;
/// the path is read-only afterwards.
#[derive(Clone, Debug)]
pub struct Path {
    /// Points with derived metadata attached
    points: Vec<TrajectoryPoint>,
    /// Headings exactly as captured, before unwrapping
    raw_headings: Vec<f64>,
    /// Optional per-point speed in m/s
    speeds: Option<Vec<f64>>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Path {
    /// Minimum number of points of any path (neighbors are needed by every metric)
    pub const MIN_POINTS: usize = 2;

    /// Build a path from `(x, y, heading)` samples using the default unwrap threshold (π)
    pub fn from_samples<I>(samples: I) -> Result<Self>
    where
        I: IntoIterator<Item = (f64, f64, f64)>,
    {
        Self::from_samples_with_threshold(samples, heading::DEFAULT_UNWRAP_THRESHOLD)
    }

    /// Build a path from `(x, y, heading)` samples
    ///
    /// # Arguments
    /// * `samples` - Positions in meters and headings in radians, in travel order
    /// * `unwrap_threshold` - Heading jumps larger than this (radians) are treated as
    ///   wraparounds of the ±π branch cut
    ///
    /// # Returns
    /// The path, or an error if there are fewer than two samples, a value is not finite,
    /// or the threshold is not a positive finite number
    pub fn from_samples_with_threshold<I>(samples: I, unwrap_threshold: f64) -> Result<Self>
    where
        I: IntoIterator<Item = (f64, f64, f64)>,
    {
        #[cfg(feature = "profiling")]
        profiling::scope!("path::from_samples");

        if !(unwrap_threshold.is_finite() && unwrap_threshold > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "unwrap threshold must be positive and finite, got {unwrap_threshold}"
            )));
        }

        let mut positions = Vec::new();
        let mut raw_headings = Vec::new();
        for (index, (x, y, heading)) in samples.into_iter().enumerate() {
            let position = Point::new(x, y);
            if !utils::is_finite_point(&position) {
                return Err(EngineError::NonFinite {
                    index,
                    field: "position",
                });
            }
            if !heading.is_finite() {
                return Err(EngineError::NonFinite {
                    index,
                    field: "heading",
                });
            }
            positions.push(position);
            raw_headings.push(heading);
        }

        if positions.len() < Self::MIN_POINTS {
            return Err(EngineError::InsufficientPoints {
                operation: "path construction",
                required: Self::MIN_POINTS,
                actual: positions.len(),
            });
        }

        let distances = DistanceAccumulator::annotate(&positions);
        let headings = heading::unwrap_headings(&raw_headings, unwrap_threshold);

        let points = positions
            .into_iter()
            .zip(headings)
            .zip(distances)
            .map(|((position, heading), cumulative_distance)| TrajectoryPoint {
                position,
                heading,
                cumulative_distance,
            })
            .collect();

        Ok(Path {
            points,
            raw_headings,
            speeds: None,
        })
    }

    /// Attach a per-point speed series (m/s)
    pub fn with_speeds(mut self, speeds: Vec<f64>) -> Result<Self> {
        if speeds.len() != self.points.len() {
            return Err(EngineError::LengthMismatch {
                field: "speed",
                expected: self.points.len(),
                actual: speeds.len(),
            });
        }
        if let Some(index) = speeds.iter().position(|s| !s.is_finite()) {
            return Err(EngineError::NonFinite {
                index,
                field: "speed",
            });
        }
        self.speeds = Some(speeds);
        Ok(self)
    }

    /// Number of points
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false for a constructed path; present for API symmetry with `len`
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// All points in travel order
    #[inline]
    pub fn points(&self) -> &[TrajectoryPoint] {
        &self.points
    }

    /// Get a point by index
    #[inline]
    pub fn get(&self, index: usize) -> Option<&TrajectoryPoint> {
        self.points.get(index)
    }

    /// Positions only, in travel order
    pub fn positions(&self) -> Vec<Position> {
        self.points.iter().map(|p| p.position).collect()
    }

    /// Continuity-corrected headings in travel order
    pub fn headings(&self) -> impl ExactSizeIterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.heading)
    }

    /// Headings exactly as supplied at construction
    #[inline]
    pub fn raw_headings(&self) -> &[f64] {
        &self.raw_headings
    }

    /// Speed at a point, if a speed series was attached
    #[inline]
    pub fn speed(&self, index: usize) -> Option<f64> {
        self.speeds.as_ref()?.get(index).copied()
    }

    /// Whether a speed series was attached
    #[inline]
    pub fn has_speeds(&self) -> bool {
        self.speeds.is_some()
    }

    /// Total traveled distance in meters
    ///
    /// This is O(1) as the value is the cumulative distance of the last point.
    #[inline]
    pub fn total_distance(&self) -> f64 {
        self.points
            .last()
            .map(|p| p.cumulative_distance)
            .unwrap_or(0.0)
    }
}

impl std::ops::Index<usize> for Path {
    type Output = TrajectoryPoint;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.points[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn create_test_samples() -> Vec<(f64, f64, f64)> {
        vec![(0.0, 0.0, 0.0), (3.0, 4.0, 0.1), (6.0, 8.0, 0.2)]
    }

    #[test]
    fn test_path_creation() {
        let path = Path::from_samples(create_test_samples()).unwrap();

        assert_eq!(path.len(), 3);
        assert!(!path.is_empty());
        assert_eq!(path[1].position, Point::new(3.0, 4.0));
        assert!((path[2].heading - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn test_cumulative_distance() {
        let path = Path::from_samples(create_test_samples()).unwrap();

        assert_eq!(path[0].cumulative_distance, 0.0);
        assert!((path[1].cumulative_distance - 5.0).abs() < 1e-12);
        assert!((path[2].cumulative_distance - 10.0).abs() < 1e-12);
        assert!((path.total_distance() - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_too_short_path_fails() {
        let result = Path::from_samples(vec![(0.0, 0.0, 0.0)]);
        assert!(matches!(
            result,
            Err(EngineError::InsufficientPoints {
                required: 2,
                actual: 1,
                ..
            })
        ));

        let result = Path::from_samples(Vec::new());
        assert!(result.is_err());
    }

    #[test]
    fn test_non_finite_values_fail() {
        let result = Path::from_samples(vec![(0.0, 0.0, 0.0), (f64::NAN, 1.0, 0.0)]);
        assert!(matches!(
            result,
            Err(EngineError::NonFinite {
                index: 1,
                field: "position"
            })
        ));

        let result = Path::from_samples(vec![(0.0, 0.0, f64::INFINITY), (1.0, 1.0, 0.0)]);
        assert!(matches!(
            result,
            Err(EngineError::NonFinite {
                index: 0,
                field: "heading"
            })
        ));
    }

    #[test]
    fn test_invalid_threshold_fails() {
        let result = Path::from_samples_with_threshold(create_test_samples(), 0.0);
        assert!(matches!(result, Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn test_headings_are_unwrapped_at_construction() {
        let samples = vec![
            (0.0, 0.0, 3.0),
            (1.0, 0.0, 3.1),
            (2.0, 0.0, -3.1),
            (3.0, 0.0, -3.0),
        ];
        let path = Path::from_samples(samples).unwrap();

        let headings: Vec<f64> = path.headings().collect();
        assert!(headings.windows(2).all(|w| (w[1] - w[0]).abs() < 0.2));
        assert!(headings[3] > PI);
        // Raw headings are retained untouched
        assert_eq!(path.raw_headings(), &[3.0, 3.1, -3.1, -3.0]);
    }

    #[test]
    fn test_speeds() {
        let path = Path::from_samples(create_test_samples()).unwrap();
        assert!(!path.has_speeds());
        assert_eq!(path.speed(0), None);

        let path = path.with_speeds(vec![1.0, 2.0, 3.0]).unwrap();
        assert!(path.has_speeds());
        assert_eq!(path.speed(1), Some(2.0));
        assert_eq!(path.speed(10), None);
    }

    #[test]
    fn test_speed_length_mismatch_fails() {
        let path = Path::from_samples(create_test_samples()).unwrap();
        let result = path.with_speeds(vec![1.0]);
        assert!(matches!(
            result,
            Err(EngineError::LengthMismatch {
                expected: 3,
                actual: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_get_point() {
        let path = Path::from_samples(create_test_samples()).unwrap();
        assert!(path.get(0).is_some());
        assert!(path.get(100).is_none());
        assert_eq!(path.positions().len(), 3);
    }
}
