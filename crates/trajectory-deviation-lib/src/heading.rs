//! Heading continuity correction and heading deviation
//!
//! Recorded headings live in (-π, π]. A vehicle completing a loop crosses the branch cut
//! and its heading jumps by almost 2π between two samples. Unwrapping removes those jumps
//! once per path, so deviations computed afterwards are free of spurious ±2π spikes.

use crate::{NearestPointIndex, Path, utils};
use std::f64::consts::PI;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default jump magnitude treated as a wraparound
pub const DEFAULT_UNWRAP_THRESHOLD: f64 = PI;

/// Remove branch-cut discontinuities from a heading sequence
///
/// Whenever two consecutive samples differ by more than `threshold` in magnitude, the
/// difference is folded back into (-π, π] and the correction is carried over to every
/// later sample. Unwrapping an already continuous sequence leaves it unchanged.
pub fn unwrap_headings(raw: &[f64], threshold: f64) -> Vec<f64> {
    let mut unwrapped = Vec::with_capacity(raw.len());
    let mut offset = 0.0;
    for (i, &heading) in raw.iter().enumerate() {
        if i > 0 {
            let delta = heading - raw[i - 1];
            if delta.abs() > threshold {
                offset += utils::wrap_to_pi(delta) - delta;
            }
        }
        unwrapped.push(heading + offset);
    }
    unwrapped
}

/// Heading comparison settings
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HeadingConfig {
    /// Fold each deviation into (-π, π] instead of keeping the continuous difference
    pub wrap_deviation: bool,
}

/// Heading deviation of one query point
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HeadingDeviation {
    /// Index of the query point
    pub query_index: usize,
    /// Index of the associated (nearest) reference point
    pub reference_index: usize,
    /// `reference.heading - query.heading` in radians
    pub deviation: f64,
}

/// Compares unwrapped headings of associated reference and query points
#[derive(Clone, Copy, Debug, Default)]
pub struct HeadingComparator {
    config: HeadingConfig,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl HeadingComparator {
    pub fn new(config: HeadingConfig) -> Self {
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &HeadingConfig {
        &self.config
    }

    /// Deviation between two unwrapped headings
    #[inline]
    pub fn deviation(&self, reference_heading: f64, query_heading: f64) -> f64 {
        let deviation = reference_heading - query_heading;
        if self.config.wrap_deviation {
            utils::wrap_to_pi(deviation)
        } else {
            deviation
        }
    }

    /// Heading deviation of a single query point against its nearest reference point
    ///
    /// `index` must have been built from `reference`.
    pub fn compare_point(
        &self,
        reference: &Path,
        index: &NearestPointIndex,
        query: &Path,
        query_index: usize,
    ) -> HeadingDeviation {
        debug_assert_eq!(index.len(), reference.len());
        let nearest = index.query_nearest(query[query_index].position);
        self.compare_with(reference, nearest.index, query, query_index)
    }

    /// Heading deviation of a query point against an already associated reference point
    #[inline]
    pub fn compare_with(
        &self,
        reference: &Path,
        reference_index: usize,
        query: &Path,
        query_index: usize,
    ) -> HeadingDeviation {
        HeadingDeviation {
            query_index,
            reference_index,
            deviation: self.deviation(reference[reference_index].heading, query[query_index].heading),
        }
    }

    /// Heading deviation of every query point, in query order
    pub fn compare(
        &self,
        reference: &Path,
        index: &NearestPointIndex,
        query: &Path,
    ) -> Vec<HeadingDeviation> {
        (0..query.len())
            .map(|i| self.compare_point(reference, index, query, i))
            .collect()
    }
}
