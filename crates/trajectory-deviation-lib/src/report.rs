//! Per-point evaluation results and summary statistics

use crate::CurvatureSample;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// All metrics of one query point
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviationRow {
    /// Index of the point in the query path
    pub query_index: usize,
    /// Traveled distance along the query path in meters
    pub cumulative_distance: f64,
    /// Signed perpendicular distance to the reference path in meters
    pub signed_lateral_offset: f64,
    /// Reference heading minus query heading in radians
    pub heading_deviation: f64,
    /// Nearest reference point
    pub nearest_index: usize,
    /// Second-nearest reference point
    pub second_nearest_index: usize,
    /// Nearest and second-nearest reference points coincide; offset is unsigned
    pub degenerate: bool,
    /// Smoothed reference curvature at the nearest reference point in 1/m
    pub reference_curvature: f64,
    /// Query speed in m/s, when the query path carries one
    pub speed: Option<f64>,
}

/// Statistics of |lateral deviation|
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviationSummary {
    /// Number of rows included
    pub count: usize,
    pub max_abs: f64,
    pub min_abs: f64,
    pub mean_abs: f64,
    /// Population standard deviation of |deviation|
    pub std_abs: f64,
}

/// Extremes of the heading deviation
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HeadingSummary {
    /// Number of rows included
    pub count: usize,
    pub max: f64,
    pub min: f64,
}

/// Result of evaluating one query path against a reference path
///
/// Rows follow query order; `reference_curvature` follows reference order.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrajectoryDeviationReport {
    rows: Vec<DeviationRow>,
    reference_curvature: Vec<CurvatureSample>,
}

impl TrajectoryDeviationReport {
    pub fn new(rows: Vec<DeviationRow>, reference_curvature: Vec<CurvatureSample>) -> Self {
        Self {
            rows,
            reference_curvature,
        }
    }

    /// One row per query point
    #[inline]
    pub fn rows(&self) -> &[DeviationRow] {
        &self.rows
    }

    /// Smoothed signed curvature at every reference point
    #[inline]
    pub fn reference_curvature(&self) -> &[CurvatureSample] {
        &self.reference_curvature
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of rows whose nearest reference points coincided
    pub fn degenerate_count(&self) -> usize {
        self.rows.iter().filter(|r| r.degenerate).count()
    }

    /// Rows past the warm-up distance (strictly greater than `warmup_distance` meters)
    fn rows_after(&self, warmup_distance: f64) -> impl Iterator<Item = &DeviationRow> {
        self.rows
            .iter()
            .filter(move |r| r.cumulative_distance > warmup_distance)
    }

    /// Statistics of |lateral deviation| over rows past `warmup_distance`
    ///
    /// Returns `None` if no row qualifies.
    pub fn deviation_summary(&self, warmup_distance: f64) -> Option<DeviationSummary> {
        let values: Vec<f64> = self
            .rows_after(warmup_distance)
            .map(|r| r.signed_lateral_offset.abs())
            .collect();
        if values.is_empty() {
            return None;
        }

        let count = values.len();
        let mean_abs = values.iter().sum::<f64>() / count as f64;
        let variance = values
            .iter()
            .map(|v| (v - mean_abs).powi(2))
            .sum::<f64>()
            / count as f64;

        Some(DeviationSummary {
            count,
            max_abs: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            min_abs: values.iter().copied().fold(f64::INFINITY, f64::min),
            mean_abs,
            std_abs: variance.sqrt(),
        })
    }

    /// Extremes of heading deviation over rows past `warmup_distance`
    ///
    /// Returns `None` if no row qualifies.
    pub fn heading_summary(&self, warmup_distance: f64) -> Option<HeadingSummary> {
        self.rows_after(warmup_distance).fold(None, |acc, r| {
            let h = r.heading_deviation;
            Some(match acc {
                None => HeadingSummary {
                    count: 1,
                    max: h,
                    min: h,
                },
                Some(s) => HeadingSummary {
                    count: s.count + 1,
                    max: s.max.max(h),
                    min: s.min.min(h),
                },
            })
        })
    }
}
