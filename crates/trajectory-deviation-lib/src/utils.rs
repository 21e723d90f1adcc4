//! Utility functions for planar geometry and angle handling

use geo::Point;
use std::f64::consts::{PI, TAU};

/// Euclidean distance between two planar points in meters
#[inline(always)]
pub fn distance(a: Point<f64>, b: Point<f64>) -> f64 {
    (b.x() - a.x()).hypot(b.y() - a.y())
}

/// Midpoint of the segment between two points
#[inline(always)]
pub fn midpoint(a: Point<f64>, b: Point<f64>) -> Point<f64> {
    Point::new((a.x() + b.x()) / 2.0, (a.y() + b.y()) / 2.0)
}

/// Unit vector pointing to the left of the travel direction given by `heading`
///
/// This is the heading direction `(cos, sin)` rotated by +90°.
#[inline(always)]
pub fn left_normal(heading: f64) -> Point<f64> {
    Point::new(-heading.sin(), heading.cos())
}

/// Check that both coordinates are finite (neither NaN nor infinite)
#[inline(always)]
pub fn is_finite_point(point: &Point<f64>) -> bool {
    point.x().is_finite() && point.y().is_finite()
}

/// Map an angle in radians into (-π, π]
#[inline]
pub fn wrap_to_pi(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    // rem_euclid lands on -π for odd multiples of π; the range is half-open on that side
    if wrapped <= -PI { wrapped + TAU } else { wrapped }
}
