//! Three-point curvature estimation with moving-average smoothing
//!
//! Each interior point `P2` of a path and its neighbors `P1`, `P3` define a circumscribed
//! circle. The circle's center is the intersection of the perpendicular bisectors of the
//! chords `P1P2` and `P2P3`; the inverse of its radius is the curvature magnitude and the
//! turn direction gives the sign. The raw series is then smoothed and its undefined
//! samples (the two endpoints, plus anything the window leaves empty) are filled.

use crate::{EngineError, Path, Position, Result, utils};
use rayon::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Minimum number of points needed to form a single triple
const MIN_POINTS_FOR_CURVATURE: usize = 3;

/// Relative threshold on `sin(turn angle)` below which a triple counts as collinear
const COLLINEAR_EPSILON: f64 = 1e-12;

/// Where the smoothing window sits relative to the sample it produces
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SmoothingMode {
    /// Causal: the window ends at the sample
    #[default]
    Trailing,
    /// Acausal: the window is centered on the sample
    Centered,
}

/// How undefined samples left after smoothing are filled
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum EdgeFill {
    /// Copy the next valid value backward, then the previous valid value forward
    #[default]
    BackwardThenForward,
    /// Copy the previous valid value forward, then the next valid value backward
    ForwardThenBackward,
    /// Replace undefined samples with zero curvature
    Zero,
}

/// Curvature smoothing settings
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CurvatureConfig {
    /// Moving-average window length in samples (1 disables smoothing)
    pub window: usize,
    /// Minimum number of defined samples inside the window to produce a value
    pub min_periods: usize,
    /// Window placement
    pub mode: SmoothingMode,
    /// Fill policy for samples still undefined after smoothing
    pub edge_fill: EdgeFill,
}

impl Default for CurvatureConfig {
    fn default() -> Self {
        Self {
            window: 30,
            min_periods: 1,
            mode: SmoothingMode::Trailing,
            edge_fill: EdgeFill::BackwardThenForward,
        }
    }
}

impl CurvatureConfig {
    /// Check the window parameters are usable
    pub fn validate(&self) -> Result<()> {
        if self.window == 0 {
            return Err(EngineError::InvalidConfig(
                "curvature window must be at least 1".to_string(),
            ));
        }
        if self.min_periods == 0 || self.min_periods > self.window {
            return Err(EngineError::InvalidConfig(format!(
                "curvature min_periods must be within 1..={}, got {}",
                self.window, self.min_periods
            )));
        }
        Ok(())
    }
}

/// Curvature at one path point
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CurvatureSample {
    /// Signed curvature in 1/m: positive for left (counter-clockwise) turns
    pub signed_curvature: f64,
}

/// Estimates smoothed, signed curvature along a path
#[derive(Clone, Copy, Debug)]
pub struct CurvatureEstimator {
    config: CurvatureConfig,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl CurvatureEstimator {
    /// Create an estimator, validating the configuration
    pub fn new(config: CurvatureConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    #[inline]
    pub fn config(&self) -> &CurvatureConfig {
        &self.config
    }

    /// Signed curvature of the circle through three points
    ///
    /// Returns 0 for degenerate triples: a repeated point (no chord to bisect) or
    /// collinear points (parallel bisectors, infinite radius).
    /// Vertical or horizontal chords are not degenerate: the bisectors are solved in
    /// general line form, so such triples get their true curvature.
    pub fn triple_curvature(p1: Position, p2: Position, p3: Position) -> f64 {
        // Work relative to P1 so large projected coordinates do not cost precision
        let d1 = p2 - p1;
        let d2 = p3 - p2;
        let len1 = d1.x().hypot(d1.y());
        let len2 = d2.x().hypot(d2.y());
        if len1 == 0.0 || len2 == 0.0 {
            return 0.0;
        }

        // Cross product of the chords; zero when the bisectors are parallel
        let cross = d1.x() * d2.y() - d1.y() * d2.x();
        if cross.abs() <= COLLINEAR_EPSILON * len1 * len2 {
            return 0.0;
        }

        // Bisector i: points X with (X - Mi) · di = 0, i.e. di · X = di · Mi
        let m1 = utils::midpoint(Position::new(0.0, 0.0), d1);
        let m2 = utils::midpoint(d1, p3 - p1);
        let c1 = d1.dot(m1);
        let c2 = d2.dot(m2);
        let center_x = (c1 * d2.y() - c2 * d1.y()) / cross;
        let center_y = (d1.x() * c2 - d2.x() * c1) / cross;

        let radius = center_x.hypot(center_y);
        let curvature = 1.0 / radius;
        if cross < 0.0 { -curvature } else { curvature }
    }

    /// Unsmoothed curvature at every point; `None` at the two endpoints
    pub fn raw(&self, positions: &[Position]) -> Result<Vec<Option<f64>>> {
        if positions.len() < MIN_POINTS_FOR_CURVATURE {
            return Err(EngineError::InsufficientPoints {
                operation: "curvature estimation",
                required: MIN_POINTS_FOR_CURVATURE,
                actual: positions.len(),
            });
        }

        let mut raw = Vec::with_capacity(positions.len());
        raw.push(None);
        raw.par_extend(
            positions
                .par_windows(3)
                .map(|w| Some(Self::triple_curvature(w[0], w[1], w[2]))),
        );
        raw.push(None);
        Ok(raw)
    }

    /// Moving average over defined samples
    ///
    /// A sample stays undefined when its window holds fewer than `min_periods` defined values.
    pub fn smooth(&self, raw: &[Option<f64>]) -> Vec<Option<f64>> {
        let window = self.config.window;
        let len = raw.len();
        (0..len)
            .map(|i| {
                let (start, end) = match self.config.mode {
                    SmoothingMode::Trailing => ((i + 1).saturating_sub(window), i + 1),
                    SmoothingMode::Centered => {
                        let start = i.saturating_sub(window / 2);
                        (start, (i + window - window / 2).min(len))
                    }
                };
                let (sum, count) = raw[start..end]
                    .iter()
                    .flatten()
                    .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
                (count >= self.config.min_periods).then(|| sum / count as f64)
            })
            .collect()
    }

    /// Replace every undefined sample according to the edge-fill policy
    pub fn fill_edges(&self, smoothed: &[Option<f64>]) -> Vec<f64> {
        let filled = match self.config.edge_fill {
            EdgeFill::BackwardThenForward => forward_fill(&backward_fill(smoothed)),
            EdgeFill::ForwardThenBackward => backward_fill(&forward_fill(smoothed)),
            EdgeFill::Zero => smoothed.to_vec(),
        };
        // Only an all-undefined series survives both passes
        filled.into_iter().map(|v| v.unwrap_or(0.0)).collect()
    }

    /// Smoothed, fully defined curvature at every point of `positions`
    pub fn estimate_positions(&self, positions: &[Position]) -> Result<Vec<CurvatureSample>> {
        #[cfg(feature = "profiling")]
        profiling::scope!("curvature::estimate");

        let raw = self.raw(positions)?;
        let smoothed = self.smooth(&raw);
        Ok(self
            .fill_edges(&smoothed)
            .into_iter()
            .map(|signed_curvature| CurvatureSample { signed_curvature })
            .collect())
    }

    /// Smoothed, fully defined curvature at every point of `path`
    pub fn estimate(&self, path: &Path) -> Result<Vec<CurvatureSample>> {
        self.estimate_positions(&path.positions())
    }
}

/// Each undefined sample takes the next defined value after it
fn backward_fill(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut filled = values.to_vec();
    let mut next = None;
    for v in filled.iter_mut().rev() {
        match v {
            Some(value) => next = Some(*value),
            None => *v = next,
        }
    }
    filled
}

/// Each undefined sample takes the previous defined value before it
fn forward_fill(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut filled = values.to_vec();
    let mut previous = None;
    for v in filled.iter_mut() {
        match v {
            Some(value) => previous = Some(*value),
            None => *v = previous,
        }
    }
    filled
}
