//! TrajectoryEngine - Top-level evaluation of query paths against a reference path
//!
//! This module provides the high-level API: it builds the reference index and curvature
//! once, then evaluates any number of query paths against them.

use crate::heading::DEFAULT_UNWRAP_THRESHOLD;
use crate::{
    CurvatureConfig, CurvatureEstimator, CurvatureSample, DeviationCalculator, DeviationRow,
    EngineError, HeadingComparator, HeadingConfig, IndexAlgorithm, NearestPointIndex, Path,
    PositiveSide, Result, TrajectoryDeviationReport,
};

use rayon::prelude::*;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Configuration for the engine
///
/// Every parameter is explicit; nothing is read from global state.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Spatial index used for nearest-point association.
    /// Default: R-tree
    pub index_algorithm: IndexAlgorithm,
    /// Side of the reference heading that yields positive lateral deviation.
    /// Default: left
    pub positive_side: PositiveSide,
    /// Heading jumps larger than this (radians) are unwrapped when paths are built.
    /// Default: π
    pub unwrap_threshold: f64,
    /// Reference curvature smoothing
    pub curvature: CurvatureConfig,
    /// Heading deviation settings
    pub heading: HeadingConfig,
    /// Evaluate query points in parallel.
    /// Default: true
    pub parallel: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            index_algorithm: IndexAlgorithm::default(),
            positive_side: PositiveSide::default(),
            unwrap_threshold: DEFAULT_UNWRAP_THRESHOLD,
            curvature: CurvatureConfig::default(),
            heading: HeadingConfig::default(),
            parallel: true,
        }
    }
}

impl EngineConfig {
    /// Check every parameter is usable
    pub fn validate(&self) -> Result<()> {
        if !(self.unwrap_threshold.is_finite() && self.unwrap_threshold > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "unwrap threshold must be positive and finite, got {}",
                self.unwrap_threshold
            )));
        }
        self.curvature.validate()
    }

    /// Build a path from `(x, y, heading)` samples with this configuration's unwrap threshold
    pub fn build_path<I>(&self, samples: I) -> Result<Path>
    where
        I: IntoIterator<Item = (f64, f64, f64)>,
    {
        Path::from_samples_with_threshold(samples, self.unwrap_threshold)
    }
}

/// Evaluates query paths against one reference path
///
/// The reference index and curvature are computed once at construction. The engine is
/// immutable afterwards and can be shared across threads.
#[derive(Clone, Debug)]
pub struct TrajectoryEngine {
    /// Configuration settings
    config: EngineConfig,
    /// Path every query is compared with
    reference: Arc<Path>,
    /// Spatial index over the reference positions
    index: NearestPointIndex,
    /// Smoothed reference curvature, aligned with reference indices
    reference_curvature: Vec<CurvatureSample>,
    deviation: DeviationCalculator,
    heading: HeadingComparator,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl TrajectoryEngine {
    /// Create an engine for `reference`
    ///
    /// Fails on an invalid configuration, or if the reference has fewer than the three
    /// points curvature estimation needs.
    pub fn new(config: EngineConfig, reference: Arc<Path>) -> Result<Self> {
        #[cfg(feature = "profiling")]
        profiling::scope!("engine::new");

        config.validate()?;

        let index = NearestPointIndex::build(&reference, config.index_algorithm)?;
        let reference_curvature = CurvatureEstimator::new(config.curvature)?.estimate(&reference)?;

        tracing::debug!(
            "Engine ready: {} reference points, {:.1} m, {} index, positive side {}",
            reference.len(),
            reference.total_distance(),
            config.index_algorithm,
            config.positive_side
        );

        Ok(Self {
            deviation: DeviationCalculator::new(config.positive_side),
            heading: HeadingComparator::new(config.heading),
            config,
            reference,
            index,
            reference_curvature,
        })
    }

    /// Evaluate one query path
    ///
    /// Produces one row per query point, in query order.
    pub fn evaluate(&self, query: &Path) -> TrajectoryDeviationReport {
        #[cfg(feature = "profiling")]
        profiling::scope!("engine::evaluate");

        let rows: Vec<DeviationRow> = if self.config.parallel {
            (0..query.len())
                .into_par_iter()
                .map(|i| self.evaluate_point(query, i))
                .collect()
        } else {
            (0..query.len())
                .map(|i| self.evaluate_point(query, i))
                .collect()
        };

        let report = TrajectoryDeviationReport::new(rows, self.reference_curvature.clone());
        tracing::debug!(
            "Evaluated {} query points ({} degenerate associations)",
            report.len(),
            report.degenerate_count()
        );
        report
    }

    /// Evaluate several query paths against the same reference
    ///
    /// Reports are returned in input order.
    pub fn evaluate_many(&self, queries: &[Path]) -> Vec<TrajectoryDeviationReport> {
        #[cfg(feature = "profiling")]
        profiling::scope!("engine::evaluate_many");

        if self.config.parallel {
            queries.par_iter().map(|q| self.evaluate(q)).collect()
        } else {
            queries.iter().map(|q| self.evaluate(q)).collect()
        }
    }

    /// All metrics of a single query point
    fn evaluate_point(&self, query: &Path, query_index: usize) -> DeviationRow {
        let point = &query[query_index];
        let record = self
            .deviation
            .compute(&self.reference, &self.index, point.position);
        // Heading uses the nearest point of the deviation lookup; both share tie-breaking
        let heading = self.heading.compare_with(
            &self.reference,
            record.nearest_index,
            query,
            query_index,
        );

        DeviationRow {
            query_index,
            cumulative_distance: point.cumulative_distance,
            signed_lateral_offset: record.signed_lateral_offset,
            heading_deviation: heading.deviation,
            nearest_index: record.nearest_index,
            second_nearest_index: record.second_nearest_index,
            degenerate: record.degenerate,
            reference_curvature: self.reference_curvature[record.nearest_index].signed_curvature,
            speed: query.speed(query_index),
        }
    }

    /// Get a reference to the configuration
    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The reference path
    #[inline]
    pub fn reference(&self) -> &Arc<Path> {
        &self.reference
    }

    /// The spatial index over the reference path
    #[inline]
    pub fn index(&self) -> &NearestPointIndex {
        &self.index
    }

    /// Smoothed signed curvature at every reference point
    #[inline]
    pub fn reference_curvature(&self) -> &[CurvatureSample] {
        &self.reference_curvature
    }
}
