//! Polyline curves.
//!
//! Lattice struts, unit-cell edges and trimmed segments are all polylines.
//!
//! # Parameterization
//!
//! A polyline with `n` points has the parameter domain `[0, n - 1]`: the
//! integer parameter `i` sits on point `i`, and the parameter varies
//! linearly along each segment. Splitting, trimming and midpoints are all
//! expressed in this domain, so a sub-curve's midpoint is the point at the
//! average of its end parameters rather than at half its arc length.

use crate::{Aabb, MapPoints, MeshBounds};
use nalgebra::Point3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Distance below which the first and last points count as the same point.
pub const CLOSURE_TOLERANCE: f64 = 1e-9;

/// A piecewise linear curve.
///
/// # Example
///
/// ```
/// use mesh_types::{Point3, Polyline};
///
/// let line = Polyline::new(vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(2.0, 0.0, 0.0),
///     Point3::new(2.0, 2.0, 0.0),
/// ]);
///
/// assert_eq!(line.segment_count(), 2);
/// assert!((line.length() - 4.0).abs() < 1e-12);
/// assert_eq!(line.point_at(0.5), Some(Point3::new(1.0, 0.0, 0.0)));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Polyline {
    points: Vec<Point3<f64>>,
}

impl Polyline {
    /// Create a polyline through `points`.
    ///
    /// Fewer than two points is allowed; such a polyline has no segments.
    #[must_use]
    pub const fn new(points: Vec<Point3<f64>>) -> Self {
        Self { points }
    }

    /// A single straight segment.
    #[must_use]
    pub fn from_segment(start: Point3<f64>, end: Point3<f64>) -> Self {
        Self::new(vec![start, end])
    }

    /// The points, in order.
    #[inline]
    #[must_use]
    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    /// Consume into the point list.
    #[must_use]
    pub fn into_points(self) -> Vec<Point3<f64>> {
        self.points
    }

    /// Number of points.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check for no points at all.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of segments.
    #[inline]
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    /// Consecutive point pairs.
    pub fn segments(&self) -> impl Iterator<Item = (Point3<f64>, Point3<f64>)> + '_ {
        self.points.windows(2).map(|w| (w[0], w[1]))
    }

    /// First point.
    #[must_use]
    pub fn start(&self) -> Option<Point3<f64>> {
        self.points.first().copied()
    }

    /// Last point.
    #[must_use]
    pub fn end(&self) -> Option<Point3<f64>> {
        self.points.last().copied()
    }

    /// Arc length.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.segments().map(|(a, b)| (b - a).norm()).sum()
    }

    /// Check whether the curve returns to its start within `tolerance`.
    ///
    /// Needs at least three segments' worth of points to enclose anything.
    #[must_use]
    pub fn is_closed(&self, tolerance: f64) -> bool {
        match (self.start(), self.end()) {
            (Some(a), Some(b)) if self.points.len() >= 4 => (b - a).norm() <= tolerance,
            _ => false,
        }
    }

    /// Upper end of the parameter domain (`len - 1`); the lower end is `0`.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn domain_end(&self) -> f64 {
        self.segment_count() as f64
    }

    /// Parameter of the domain midpoint.
    #[must_use]
    pub fn mid_parameter(&self) -> f64 {
        self.domain_end() * 0.5
    }

    /// Point at the domain midpoint.
    #[must_use]
    pub fn midpoint(&self) -> Option<Point3<f64>> {
        self.point_at(self.mid_parameter())
    }

    /// Point at parameter `t`, clamped to the domain.
    ///
    /// Returns `None` for an empty polyline.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    #[must_use]
    pub fn point_at(&self, t: f64) -> Option<Point3<f64>> {
        match self.points.len() {
            0 => None,
            1 => Some(self.points[0]),
            n => {
                let t = t.clamp(0.0, self.domain_end());
                let i = (t.floor() as usize).min(n - 2);
                let f = t - i as f64;
                let (a, b) = (self.points[i], self.points[i + 1]);
                Some(a + (b - a) * f)
            }
        }
    }

    /// Point at `t` on a closed curve, wrapping parameters outside the domain.
    ///
    /// On an open curve this is [`point_at`](Self::point_at).
    #[must_use]
    pub fn point_at_wrapped(&self, t: f64) -> Option<Point3<f64>> {
        let end = self.domain_end();
        if self.is_closed(CLOSURE_TOLERANCE) && end > 0.0 {
            self.point_at(t.rem_euclid(end))
        } else {
            self.point_at(t)
        }
    }

    /// Parameter of the point on the curve closest to `point`.
    ///
    /// Ties resolve to the earliest segment. Returns `None` for an empty
    /// polyline.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn closest_parameter(&self, point: &Point3<f64>) -> Option<f64> {
        if self.points.len() == 1 {
            return Some(0.0);
        }
        let mut best: Option<(f64, f64)> = None;
        for (i, (a, b)) in self.segments().enumerate() {
            let ab = b - a;
            let len_sq = ab.norm_squared();
            let s = if len_sq > 0.0 {
                ((point - a).dot(&ab) / len_sq).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let dist_sq = (a + ab * s - point).norm_squared();
            if best.is_none_or(|(d, _)| dist_sq < d) {
                best = Some((dist_sq, i as f64 + s));
            }
        }
        best.map(|(_, t)| t)
    }

    /// The part of the curve between parameters `t0 < t1`.
    ///
    /// On a closed curve `t1` may exceed the domain end, in which case the
    /// sub-curve runs across the seam.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    #[must_use]
    pub fn sub_curve(&self, t0: f64, t1: f64) -> Self {
        let end = self.domain_end();
        if t1 > end && self.is_closed(CLOSURE_TOLERANCE) {
            let mut head = self.sub_curve(t0, end).points;
            let tail = self.sub_curve(0.0, t1 - end).points;
            head.extend(tail.into_iter().skip(1));
            return Self::new(head);
        }

        let (Some(first), Some(last)) = (self.point_at(t0), self.point_at(t1)) else {
            return Self::default();
        };
        let lo = t0.clamp(0.0, end);
        let hi = t1.clamp(0.0, end);
        let mut points = vec![first];
        let first_interior = lo.floor() as usize + 1;
        let mut i = first_interior;
        while (i as f64) < hi && i < self.points.len() {
            points.push(self.points[i]);
            i += 1;
        }
        points.push(last);
        Self::new(points)
    }

    /// Parameter spans obtained by cutting the curve at `params`.
    ///
    /// Parameters are clamped to the domain, sorted ascending, and any that
    /// lie within `tolerance` of each other (or of an open curve's ends)
    /// collapse into one cut. An open curve with `k` distinct interior cuts
    /// yields `k + 1` spans. A closed curve yields one span per cut, with
    /// the last span wrapping across the seam (its end exceeds
    /// [`domain_end`](Self::domain_end)).
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_types::{Point3, Polyline};
    ///
    /// let line = Polyline::from_segment(Point3::origin(), Point3::new(4.0, 0.0, 0.0));
    /// let spans = line.split_spans(&[0.75, 0.25, 0.25 + 1e-12], 1e-9);
    /// assert_eq!(spans, vec![(0.0, 0.25), (0.25, 0.75), (0.75, 1.0)]);
    /// ```
    #[must_use]
    pub fn split_spans(&self, params: &[f64], tolerance: f64) -> Vec<(f64, f64)> {
        let end = self.domain_end();
        if end <= 0.0 {
            return Vec::new();
        }
        let closed = self.is_closed(CLOSURE_TOLERANCE);

        let mut cuts: Vec<f64> = params
            .iter()
            .filter(|t| t.is_finite())
            .map(|t| if closed { t.rem_euclid(end) } else { t.clamp(0.0, end) })
            .collect();
        cuts.sort_by(f64::total_cmp);
        cuts.dedup_by(|b, a| (*b - *a).abs() <= tolerance);
        if closed {
            // the seam itself is not a cut on a closed curve
            if cuts.len() > 1 && (end - cuts[cuts.len() - 1]) + cuts[0] <= tolerance {
                cuts.pop();
            }
        } else {
            cuts.retain(|&t| t > tolerance && t < end - tolerance);
        }

        if cuts.is_empty() {
            return vec![(0.0, end)];
        }

        let mut spans = Vec::with_capacity(cuts.len() + 1);
        if closed {
            spans.extend(cuts.windows(2).map(|w| (w[0], w[1])));
            spans.push((cuts[cuts.len() - 1], cuts[0] + end));
        } else {
            let mut prev = 0.0;
            for &t in &cuts {
                spans.push((prev, t));
                prev = t;
            }
            spans.push((prev, end));
        }
        spans
    }

    /// Split into sub-curves at `params`; see [`split_spans`](Self::split_spans).
    #[must_use]
    pub fn split_at(&self, params: &[f64], tolerance: f64) -> Vec<Self> {
        self.split_spans(params, tolerance)
            .into_iter()
            .map(|(a, b)| self.sub_curve(a, b))
            .collect()
    }

    /// Points spaced `step` apart in arc length, excluding both ends.
    ///
    /// Returns nothing when `step` is not positive or exceeds the length.
    #[must_use]
    pub fn divide_by_length(&self, step: f64) -> Vec<Point3<f64>> {
        if !(step > 0.0 && step.is_finite()) {
            return Vec::new();
        }
        let total = self.length();
        let mut stations = Vec::new();
        let mut target = step;
        let mut walked = 0.0;
        for (a, b) in self.segments() {
            let seg_len = (b - a).norm();
            // stop short of the end point so it is not emitted twice
            while target < total - step * 1e-9 && target <= walked + seg_len {
                let f = if seg_len > 0.0 { (target - walked) / seg_len } else { 0.0 };
                stations.push(a + (b - a) * f);
                target += step;
            }
            walked += seg_len;
        }
        stations
    }

    /// Same curve, opposite direction.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self::new(self.points.iter().rev().copied().collect())
    }

    /// Append a point.
    pub fn push(&mut self, point: Point3<f64>) {
        self.points.push(point);
    }
}

impl MeshBounds for Polyline {
    fn bounds(&self) -> Aabb {
        Aabb::from_points(self.points.iter())
    }
}

impl MapPoints for Polyline {
    fn map_points<F>(&mut self, f: F)
    where
        F: Fn(&Point3<f64>) -> Point3<f64>,
    {
        for p in &mut self.points {
            *p = f(p);
        }
    }
}

impl From<Vec<Point3<f64>>> for Polyline {
    fn from(points: Vec<Point3<f64>>) -> Self {
        Self::new(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square() -> Polyline {
        Polyline::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
        ])
    }

    #[test]
    fn point_at_interpolates_and_clamps() {
        let line = Polyline::from_segment(Point3::origin(), Point3::new(10.0, 0.0, 0.0));
        assert_relative_eq!(line.point_at(0.3).unwrap().x, 3.0);
        assert_relative_eq!(line.point_at(-1.0).unwrap().x, 0.0);
        assert_relative_eq!(line.point_at(7.0).unwrap().x, 10.0);
        assert!(Polyline::default().point_at(0.0).is_none());
    }

    #[test]
    fn midpoint_is_parametric() {
        // uneven segments: parametric midpoint sits on the middle vertex
        let line = Polyline::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 0.0),
        ]);
        assert_relative_eq!(line.midpoint().unwrap().x, 1.0);
    }

    #[test]
    fn closed_square() {
        let sq = square();
        assert!(sq.is_closed(1e-12));
        assert_relative_eq!(sq.length(), 4.0);
        let mut open = sq.clone();
        open.push(Point3::new(0.5, 0.0, 0.0));
        assert!(!open.is_closed(1e-12));
    }

    #[test]
    fn closest_parameter_on_corner_path() {
        let sq = square();
        let t = sq.closest_parameter(&Point3::new(1.2, 0.5, 0.0)).unwrap();
        assert_relative_eq!(t, 1.5, epsilon = 1e-12);
    }

    #[test]
    fn split_open_curve_dedups() {
        let line = Polyline::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ]);
        let parts = line.split_at(&[1.5, 0.5, 0.5, 0.0, 2.0], 1e-9);
        assert_eq!(parts.len(), 3);
        assert_relative_eq!(parts[0].end().unwrap().x, 0.5);
        // the middle piece keeps the interior vertex
        assert_eq!(parts[1].len(), 3);
        assert_relative_eq!(parts[1].points()[1].x, 1.0);
        assert_relative_eq!(parts[2].start().unwrap().x, 1.5);
    }

    #[test]
    fn split_closed_curve_wraps_seam() {
        let sq = square();
        let spans = sq.split_spans(&[1.5, 3.5], 1e-9);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0], (1.5, 3.5));
        assert_relative_eq!(spans[1].0, 3.5);
        assert_relative_eq!(spans[1].1, 5.5);

        let wrap = sq.sub_curve(spans[1].0, spans[1].1);
        assert_relative_eq!(wrap.start().unwrap().y, 0.5);
        assert_relative_eq!(wrap.end().unwrap().x, 1.0);
        assert_relative_eq!(wrap.length(), 2.0, epsilon = 1e-12);
        let mid = sq.point_at_wrapped((spans[1].0 + spans[1].1) * 0.5).unwrap();
        assert_relative_eq!(mid.x, 0.5);
        assert_relative_eq!(mid.y, 0.0);
    }

    #[test]
    fn split_without_cuts_returns_whole() {
        let sq = square();
        assert_eq!(sq.split_spans(&[], 1e-9), vec![(0.0, 4.0)]);
    }

    #[test]
    fn divide_by_length_excludes_ends() {
        let line = Polyline::from_segment(Point3::origin(), Point3::new(1.0, 0.0, 0.0));
        let pts = line.divide_by_length(0.25);
        assert_eq!(pts.len(), 3);
        assert_relative_eq!(pts[0].x, 0.25);
        assert_relative_eq!(pts[2].x, 0.75);
        assert!(line.divide_by_length(0.0).is_empty());
        assert!(line.divide_by_length(2.0).is_empty());
    }
}
