//! Trajectory Deviation Library - Path-Tracking Accuracy Metrics
//!
//! This library evaluates how closely a driven trajectory follows a reference path.
//! Both paths are ordered sequences of planar points (meters) with headings (radians).
//! For every point of the driven (query) path it computes the signed lateral deviation
//! from the reference path, the heading deviation and the cumulative traveled distance,
//! and it estimates the signed curvature of the reference path.
//!
//! # Architecture
//!
//! - **[`Path`]**: Immutable point sequence with cumulative distance and unwrapped headings
//! - **[`NearestPointIndex`]**: Spatial index answering "two nearest reference points" queries
//! - **[`DeviationCalculator`]**: Signed perpendicular distance via triangle geometry
//! - **[`HeadingComparator`]**: Heading deviation on continuity-corrected headings
//! - **[`CurvatureEstimator`]**: Circumscribed-circle curvature with moving-average smoothing
//! - **[`TrajectoryEngine`]**: High-level orchestration producing a [`TrajectoryDeviationReport`]
//!
//! # Performance Characteristics
//!
//! - **Build Time**: O(N log N) for the reference index
//! - **Query Time**: O(log N) per query point, embarrassingly parallel
//! - **Memory**: O(N + M) for N reference and M query points

mod curvature;
mod deviation;
mod distance;
mod engine;
mod heading;
mod index;
mod path;
mod quadtree;
mod report;
pub mod utils;

// Public API exports
pub use curvature::{CurvatureConfig, CurvatureEstimator, CurvatureSample, EdgeFill, SmoothingMode};
pub use deviation::{DeviationCalculator, DeviationRecord, PositiveSide};
pub use distance::DistanceAccumulator;
pub use engine::{EngineConfig, TrajectoryEngine};
pub use heading::{HeadingComparator, HeadingConfig, HeadingDeviation, unwrap_headings};
pub use index::{IndexAlgorithm, Neighbor, NearestPair, NearestPointIndex};
pub use path::{Path, Position, TrajectoryPoint};
pub use report::{DeviationRow, DeviationSummary, HeadingSummary, TrajectoryDeviationReport};

/// Error types for the engine
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("{operation} needs at least {required} points, got {actual}")]
    InsufficientPoints {
        operation: &'static str,
        required: usize,
        actual: usize,
    },

    #[error("Non-finite {field} at point {index}")]
    NonFinite { index: usize, field: &'static str },

    #[error("Expected {expected} {field} values, got {actual}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
