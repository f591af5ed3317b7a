// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Planar curve primitives: line segments, circular arcs and full circles.
//!
//! Angles are in radians. An arc's `sweep` is signed: positive sweeps run
//! counter-clockwise from `start_angle`.

use crate::bounds::Bounds2;
use crate::tessellation::{Tessellation, Tolerance};
use nalgebra::{Matrix3, Point2, Vector2};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::f64::consts::{PI, TAU};

/// Sample buffer for one curve; short arcs stay on the stack.
pub type CurveSamples = SmallVec<[Point2<f64>; 16]>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line2d {
    pub start: Point2<f64>,
    pub end: Point2<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arc2d {
    pub center: Point2<f64>,
    pub radius: f64,
    pub start_angle: f64,
    pub sweep: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle2d {
    pub center: Point2<f64>,
    pub radius: f64,
}

/// A curve usable as a wire segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Curve2d {
    Line(Line2d),
    Arc(Arc2d),
    Circle(Circle2d),
}

impl Line2d {
    pub fn new(start: Point2<f64>, end: Point2<f64>) -> Self {
        Self { start, end }
    }

    pub fn direction(&self) -> Vector2<f64> {
        self.end - self.start
    }

    pub fn length(&self) -> f64 {
        self.direction().norm()
    }

    /// Parameter of the orthogonal projection of `p`, 0 at start and 1 at end.
    pub fn project_param(&self, p: &Point2<f64>) -> f64 {
        let d = self.direction();
        let len2 = d.norm_squared();
        if len2 < Tolerance::AREA {
            return 0.0;
        }
        (p - self.start).dot(&d) / len2
    }

    pub fn distance_to(&self, p: &Point2<f64>) -> f64 {
        let t = self.project_param(p).clamp(0.0, 1.0);
        let closest = self.start + self.direction() * t;
        (p - closest).norm()
    }
}

impl Arc2d {
    pub fn new(center: Point2<f64>, radius: f64, start_angle: f64, sweep: f64) -> Self {
        Self {
            center,
            radius,
            start_angle,
            sweep,
        }
    }

    /// Arc through `start` and `end` around `center`, running counter-clockwise when `ccw`.
    pub fn from_points(start: Point2<f64>, end: Point2<f64>, center: Point2<f64>, ccw: bool) -> Self {
        let radius = (start - center).norm();
        let a0 = (start.y - center.y).atan2(start.x - center.x);
        let a1 = (end.y - center.y).atan2(end.x - center.x);
        let mut sweep = a1 - a0;
        if ccw {
            while sweep <= 0.0 {
                sweep += TAU;
            }
        } else {
            while sweep >= 0.0 {
                sweep -= TAU;
            }
        }
        Self::new(center, radius, a0, sweep)
    }

    #[inline]
    pub fn point_at_angle(&self, angle: f64) -> Point2<f64> {
        self.center + Vector2::new(angle.cos(), angle.sin()) * self.radius
    }

    pub fn start(&self) -> Point2<f64> {
        self.point_at_angle(self.start_angle)
    }

    pub fn end(&self) -> Point2<f64> {
        self.point_at_angle(self.start_angle + self.sweep)
    }

    pub fn end_angle(&self) -> f64 {
        self.start_angle + self.sweep
    }

    pub fn is_ccw(&self) -> bool {
        self.sweep > 0.0
    }

    /// True when `angle` lies on the swept range.
    pub fn contains_angle(&self, angle: f64) -> bool {
        let d = if self.sweep >= 0.0 {
            (angle - self.start_angle).rem_euclid(TAU)
        } else {
            (self.start_angle - angle).rem_euclid(TAU)
        };
        d <= self.sweep.abs() + Tolerance::ANGLE
    }

    pub fn length(&self) -> f64 {
        self.radius * self.sweep.abs()
    }
}

impl Circle2d {
    pub fn new(center: Point2<f64>, radius: f64) -> Self {
        Self { center, radius }
    }

    /// Circles start and end on their +X extreme.
    pub fn seam(&self) -> Point2<f64> {
        Point2::new(self.center.x + self.radius, self.center.y)
    }
}

impl From<Line2d> for Curve2d {
    fn from(l: Line2d) -> Self {
        Curve2d::Line(l)
    }
}

impl From<Arc2d> for Curve2d {
    fn from(a: Arc2d) -> Self {
        Curve2d::Arc(a)
    }
}

impl From<Circle2d> for Curve2d {
    fn from(c: Circle2d) -> Self {
        Curve2d::Circle(c)
    }
}

impl Curve2d {
    pub fn line(start: Point2<f64>, end: Point2<f64>) -> Self {
        Curve2d::Line(Line2d::new(start, end))
    }

    pub fn start(&self) -> Point2<f64> {
        match self {
            Curve2d::Line(l) => l.start,
            Curve2d::Arc(a) => a.start(),
            Curve2d::Circle(c) => c.seam(),
        }
    }

    pub fn end(&self) -> Point2<f64> {
        match self {
            Curve2d::Line(l) => l.end,
            Curve2d::Arc(a) => a.end(),
            Curve2d::Circle(c) => c.seam(),
        }
    }

    /// Start point when traversed with the given orientation.
    #[inline]
    pub fn oriented_start(&self, reversed: bool) -> Point2<f64> {
        if reversed {
            self.end()
        } else {
            self.start()
        }
    }

    #[inline]
    pub fn oriented_end(&self, reversed: bool) -> Point2<f64> {
        if reversed {
            self.start()
        } else {
            self.end()
        }
    }

    pub fn is_linear(&self) -> bool {
        matches!(self, Curve2d::Line(_))
    }

    pub fn is_closed(&self) -> bool {
        match self {
            Curve2d::Circle(_) => true,
            Curve2d::Arc(a) => a.sweep.abs() >= TAU - Tolerance::ANGLE,
            Curve2d::Line(_) => false,
        }
    }

    pub fn length(&self) -> f64 {
        match self {
            Curve2d::Line(l) => l.length(),
            Curve2d::Arc(a) => a.length(),
            Curve2d::Circle(c) => TAU * c.radius,
        }
    }

    /// Same geometry traversed the other way. Circles have no direction of their own.
    pub fn reversed(&self) -> Curve2d {
        match *self {
            Curve2d::Line(l) => Curve2d::Line(Line2d::new(l.end, l.start)),
            Curve2d::Arc(a) => Curve2d::Arc(Arc2d::new(
                a.center,
                a.radius,
                a.start_angle + a.sweep,
                -a.sweep,
            )),
            Curve2d::Circle(c) => Curve2d::Circle(c),
        }
    }

    /// Exact bounds, including the axis extremes an arc passes through.
    pub fn bounds(&self) -> Bounds2 {
        match self {
            Curve2d::Line(l) => Bounds2::from_points([&l.start, &l.end]),
            Curve2d::Circle(c) => Bounds2 {
                min: [c.center.x - c.radius, c.center.y - c.radius],
                max: [c.center.x + c.radius, c.center.y + c.radius],
            },
            Curve2d::Arc(a) => {
                let mut b = Bounds2::from_points([&a.start(), &a.end()]);
                for k in 0..4 {
                    let angle = k as f64 * PI * 0.5;
                    if a.contains_angle(angle) {
                        b.include(&a.point_at_angle(angle));
                    }
                }
                b
            }
        }
    }

    /// Polyline approximation from the oriented start to the oriented end,
    /// both included. Circles return a closed ring.
    pub fn sample(&self, tessellation: &Tessellation, reversed: bool) -> CurveSamples {
        let mut out = CurveSamples::new();
        match self {
            Curve2d::Line(l) => {
                out.push(l.start);
                out.push(l.end);
            }
            Curve2d::Arc(a) => {
                let n = tessellation.segments_for(a.radius, a.sweep);
                for i in 0..=n {
                    let angle = a.start_angle + a.sweep * (i as f64 / n as f64);
                    out.push(a.point_at_angle(angle));
                }
            }
            Curve2d::Circle(c) => {
                let n = tessellation.segments_for(c.radius, TAU).max(3);
                for i in 0..n {
                    let angle = TAU * (i as f64 / n as f64);
                    out.push(c.center + Vector2::new(angle.cos(), angle.sin()) * c.radius);
                }
                out.push(c.seam());
            }
        }
        if reversed {
            out.reverse();
        }
        out
    }

    /// Applies a 2D homogeneous matrix. Arcs and circles assume the matrix is
    /// a similarity; mirrors flip the arc's sweep.
    pub fn transformed(&self, m: &Matrix3<f64>) -> Curve2d {
        match self {
            Curve2d::Line(l) => Curve2d::line(m.transform_point(&l.start), m.transform_point(&l.end)),
            Curve2d::Arc(a) => {
                let det = linear_determinant(m);
                let center = m.transform_point(&a.center);
                let start = m.transform_point(&a.start());
                let start_angle = (start.y - center.y).atan2(start.x - center.x);
                let sweep = if det < 0.0 { -a.sweep } else { a.sweep };
                Curve2d::Arc(Arc2d::new(center, a.radius * det.abs().sqrt(), start_angle, sweep))
            }
            Curve2d::Circle(c) => {
                let det = linear_determinant(m);
                Curve2d::Circle(Circle2d::new(
                    m.transform_point(&c.center),
                    c.radius * det.abs().sqrt(),
                ))
            }
        }
    }

    /// True if `p` coincides with either endpoint.
    pub fn touches(&self, p: &Point2<f64>) -> bool {
        (self.start() - p).norm() <= Tolerance::LENGTH || (self.end() - p).norm() <= Tolerance::LENGTH
    }
}

/// Determinant of the linear 2x2 block of a homogeneous 2D matrix.
#[inline]
pub(crate) fn linear_determinant(m: &Matrix3<f64>) -> f64 {
    m[(0, 0)] * m[(1, 1)] - m[(0, 1)] * m[(1, 0)]
}

/// Serialized form of a curve inside wire dumps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "l")]
pub enum CurveData {
    #[serde(rename = "Line2d")]
    Line { start: [f64; 2], end: [f64; 2] },
    #[serde(rename = "Arc2d")]
    Arc {
        center: [f64; 2],
        radius: f64,
        #[serde(rename = "startAngle")]
        start_angle: f64,
        sweep: f64,
    },
    #[serde(rename = "Circle2d")]
    Circle { center: [f64; 2], radius: f64 },
}

#[inline]
pub(crate) fn to_pair(p: &Point2<f64>) -> [f64; 2] {
    [p.x, p.y]
}

#[inline]
pub(crate) fn from_pair(p: [f64; 2]) -> Point2<f64> {
    Point2::new(p[0], p[1])
}

impl From<&Curve2d> for CurveData {
    fn from(curve: &Curve2d) -> Self {
        match curve {
            Curve2d::Line(l) => CurveData::Line {
                start: to_pair(&l.start),
                end: to_pair(&l.end),
            },
            Curve2d::Arc(a) => CurveData::Arc {
                center: to_pair(&a.center),
                radius: a.radius,
                start_angle: a.start_angle,
                sweep: a.sweep,
            },
            Curve2d::Circle(c) => CurveData::Circle {
                center: to_pair(&c.center),
                radius: c.radius,
            },
        }
    }
}

impl From<&CurveData> for Curve2d {
    fn from(data: &CurveData) -> Self {
        match *data {
            CurveData::Line { start, end } => Curve2d::line(from_pair(start), from_pair(end)),
            CurveData::Arc {
                center,
                radius,
                start_angle,
                sweep,
            } => Curve2d::Arc(Arc2d::new(from_pair(center), radius, start_angle, sweep)),
            CurveData::Circle { center, radius } => {
                Curve2d::Circle(Circle2d::new(from_pair(center), radius))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_arc_bounds_include_extremes() {
        // Upper half circle from +X to -X
        let arc = Curve2d::Arc(Arc2d::new(Point2::origin(), 2.0, 0.0, PI));
        let b = arc.bounds();
        assert_relative_eq!(b.max[1], 2.0, epsilon = 1e-12);
        assert_relative_eq!(b.min[1], 0.0, epsilon = 1e-12);
        assert_relative_eq!(b.min[0], -2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_clockwise_arc_bounds() {
        // Lower half circle, clockwise from +X to -X
        let arc = Curve2d::Arc(Arc2d::new(Point2::origin(), 1.0, 0.0, -PI));
        let b = arc.bounds();
        assert_relative_eq!(b.min[1], -1.0, epsilon = 1e-12);
        assert!(b.max[1] < 1e-9);
    }

    #[test]
    fn test_arc_from_points() {
        let arc = Arc2d::from_points(
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
            Point2::origin(),
            true,
        );
        assert_relative_eq!(arc.sweep, PI / 2.0, epsilon = 1e-12);
        let cw = Arc2d::from_points(
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
            Point2::origin(),
            false,
        );
        assert_relative_eq!(cw.sweep, -1.5 * PI, epsilon = 1e-12);
    }

    #[test]
    fn test_sample_reversed_arc() {
        let arc = Curve2d::Arc(Arc2d::new(Point2::origin(), 1.0, 0.0, PI / 2.0));
        let t = Tessellation::default();
        let fwd = arc.sample(&t, false);
        let rev = arc.sample(&t, true);
        assert_eq!(fwd.len(), rev.len());
        assert_relative_eq!(rev[0].y, 1.0, epsilon = 1e-12);
        assert_relative_eq!(rev.last().unwrap().x, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_reversed_arc_swaps_endpoints() {
        let arc = Curve2d::Arc(Arc2d::new(Point2::origin(), 1.0, 0.0, PI / 2.0));
        let r = arc.reversed();
        assert_relative_eq!((r.start() - arc.end()).norm(), 0.0, epsilon = 1e-12);
        assert_relative_eq!((r.end() - arc.start()).norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_mirror_flips_sweep() {
        let arc = Curve2d::Arc(Arc2d::new(Point2::origin(), 1.0, 0.0, PI / 2.0));
        let mirror = Matrix3::new(-1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0);
        match arc.transformed(&mirror) {
            Curve2d::Arc(a) => {
                assert!(a.sweep < 0.0);
                assert_relative_eq!(a.start().x, -1.0, epsilon = 1e-12);
                assert_relative_eq!(a.end().y, 1.0, epsilon = 1e-12);
            }
            other => panic!("expected arc, got {:?}", other),
        }
    }

    #[test]
    fn test_line_distance() {
        let l = Line2d::new(Point2::new(0.0, 0.0), Point2::new(4.0, 0.0));
        assert_relative_eq!(l.distance_to(&Point2::new(2.0, 3.0)), 3.0);
        assert_relative_eq!(l.distance_to(&Point2::new(-3.0, 4.0)), 5.0);
        assert_relative_eq!(l.project_param(&Point2::new(1.0, 1.0)), 0.25);
    }
}
