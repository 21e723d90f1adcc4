//! Signed lateral deviation of a query point from a reference path
//!
//! The query point `P` and its two nearest reference points `B` (nearest) and `C`
//! (second-nearest) form a triangle. Its height over the base `BC` is the perpendicular
//! distance from `P` to the local reference line; the heading at `B` decides the sign.

use crate::{EngineError, NearestPair, NearestPointIndex, Path, Position, Result, utils};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Side of the travel direction that yields positive deviations
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PositiveSide {
    /// Points left of the reference heading are positive
    #[default]
    Left,
    /// Points right of the reference heading are positive
    Right,
}

impl std::fmt::Display for PositiveSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PositiveSide::Left => f.write_str("left"),
            PositiveSide::Right => f.write_str("right"),
        }
    }
}

impl std::str::FromStr for PositiveSide {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "left" => Ok(PositiveSide::Left),
            "right" => Ok(PositiveSide::Right),
            other => Err(EngineError::InvalidConfig(format!(
                "unknown side '{other}' (expected left or right)"
            ))),
        }
    }
}

/// Lateral deviation of one query point
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviationRecord {
    /// Perpendicular distance to the reference line in meters, signed by side.
    /// Unsigned (non-negative) when `degenerate` is set.
    pub signed_lateral_offset: f64,
    /// Index of the nearest reference point `B`
    pub nearest_index: usize,
    /// Index of the second-nearest reference point `C`
    pub second_nearest_index: usize,
    /// `B` and `C` coincide, so no reference line exists; the offset is the distance to `B`
    pub degenerate: bool,
}

/// Computes signed perpendicular distances with a configurable sign convention
#[derive(Clone, Copy, Debug, Default)]
pub struct DeviationCalculator {
    positive_side: PositiveSide,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl DeviationCalculator {
    pub fn new(positive_side: PositiveSide) -> Self {
        Self { positive_side }
    }

    #[inline]
    pub fn positive_side(&self) -> PositiveSide {
        self.positive_side
    }

    /// Deviation of `point` from `reference`
    ///
    /// `index` must have been built from `reference`.
    pub fn compute(
        &self,
        reference: &Path,
        index: &NearestPointIndex,
        point: Position,
    ) -> DeviationRecord {
        debug_assert_eq!(index.len(), reference.len());
        let pair = index.query_nearest2(point);
        self.compute_from_neighbors(reference, pair, point)
    }

    /// Deviation of `point` given its already-known two nearest reference points
    pub fn compute_from_neighbors(
        &self,
        reference: &Path,
        pair: NearestPair,
        point: Position,
    ) -> DeviationRecord {
        let b_point = &reference[pair.nearest.index];
        let c_point = &reference[pair.second.index];

        let a = utils::distance(b_point.position, c_point.position);
        let b = pair.nearest.distance;

        let mut record = DeviationRecord {
            signed_lateral_offset: 0.0,
            nearest_index: pair.nearest.index,
            second_nearest_index: pair.second.index,
            degenerate: false,
        };

        if a == 0.0 {
            tracing::trace!(
                "Coincident reference points {} and {}; reporting unsigned distance {b}",
                pair.nearest.index,
                pair.second.index
            );
            record.signed_lateral_offset = b;
            record.degenerate = true;
            return record;
        }

        if b == 0.0 {
            // The query point lies on the reference path at B
            return record;
        }

        let offset = point - b_point.position;
        let h = triangle_height(c_point.position - b_point.position, offset, a);
        let projection = offset.dot(utils::left_normal(b_point.heading));
        record.signed_lateral_offset = if self.is_negative(projection) { -h } else { h };
        record
    }

    /// Whether a projection onto the left normal falls on the negative side
    #[inline]
    fn is_negative(&self, projection: f64) -> bool {
        match self.positive_side {
            PositiveSide::Left => projection < 0.0,
            PositiveSide::Right => projection > 0.0,
        }
    }
}

/// Height of the triangle `P B C` over its base `BC`
///
/// `base` is `C - B`, `offset` is `P - B` and `base_length` is `|BC|` (> 0). Twice the
/// triangle area is `|base × offset|`; dividing by the base gives the height. The result
/// is accurate to rounding of the inputs even when `P` lies on the line `BC`.
#[inline]
fn triangle_height(base: Position, offset: Position, base_length: f64) -> f64 {
    let twice_area = base.x() * offset.y() - base.y() * offset.x();
    twice_area.abs() / base_length
}
