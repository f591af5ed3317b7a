// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Planes, cylinders and the (u, v) parametrizations surfaces live in.
//!
//! A plane maps `(u, v)` along its two orthonormal axes. A cylinder maps
//! `u` to arc length around the axis (starting at `ref_dir`, counter-clockwise
//! seen from the axis tip) and `v` to height along the axis, so areas in
//! parameter space equal areas on the cylinder.

use crate::curve::{Arc2d, Circle2d, Curve2d};
use crate::error::{Error, Result};
use crate::tessellation::Tolerance;
use nalgebra::{Matrix3, Matrix4, Point2, Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Relative tolerance for comparing frames and scale factors.
const FRAME_TOLERANCE: f64 = 1e-7;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub origin: Point3<f64>,
    pub x_axis: Vector3<f64>,
    pub y_axis: Vector3<f64>,
}

impl Default for Plane {
    fn default() -> Self {
        Self::xy()
    }
}

impl Plane {
    /// Orthonormalizes the axes: `x_axis` keeps its direction and `y_axis`
    /// loses its component along it.
    pub fn new(origin: Point3<f64>, x_axis: Vector3<f64>, y_axis: Vector3<f64>) -> Result<Self> {
        let x = x_axis
            .try_normalize(Tolerance::LENGTH)
            .ok_or_else(|| Error::InvalidProfile("plane x axis has zero length".to_string()))?;
        let y = (y_axis - x * y_axis.dot(&x))
            .try_normalize(Tolerance::LENGTH)
            .ok_or_else(|| Error::InvalidProfile("plane axes are parallel".to_string()))?;
        Ok(Self {
            origin,
            x_axis: x,
            y_axis: y,
        })
    }

    pub fn xy() -> Self {
        Self {
            origin: Point3::origin(),
            x_axis: Vector3::x(),
            y_axis: Vector3::y(),
        }
    }

    /// Plane through `origin` with an arbitrary in-plane basis.
    pub fn from_normal(origin: Point3<f64>, normal: Vector3<f64>) -> Result<Self> {
        let n = normal
            .try_normalize(Tolerance::LENGTH)
            .ok_or_else(|| Error::InvalidProfile("plane normal has zero length".to_string()))?;
        // Axis least parallel to the normal gives a stable cross product
        let reference = if n.x.abs() <= n.y.abs() && n.x.abs() <= n.z.abs() {
            Vector3::x()
        } else if n.y.abs() <= n.z.abs() {
            Vector3::y()
        } else {
            Vector3::z()
        };
        let x = n.cross(&reference).normalize();
        let y = n.cross(&x);
        Ok(Self {
            origin,
            x_axis: x,
            y_axis: y,
        })
    }

    pub fn normal(&self) -> Vector3<f64> {
        self.x_axis.cross(&self.y_axis)
    }

    #[inline]
    pub fn to_local(&self, p: &Point3<f64>) -> Point2<f64> {
        let d = p - self.origin;
        Point2::new(d.dot(&self.x_axis), d.dot(&self.y_axis))
    }

    #[inline]
    pub fn to_world(&self, p: &Point2<f64>) -> Point3<f64> {
        self.origin + self.x_axis * p.x + self.y_axis * p.y
    }

    pub fn distance_to(&self, p: &Point3<f64>) -> f64 {
        (p - self.origin).dot(&self.normal())
    }

    /// Applies `m` to the frame and re-orthonormalizes it.
    ///
    /// The returned 2D matrix maps local coordinates in `self` to local
    /// coordinates in the new plane, such that
    /// `new.to_local(m * self.to_world(q)) == map * q`.
    pub fn transformed(&self, m: &Matrix4<f64>) -> Result<(Plane, Matrix3<f64>)> {
        let origin = m.transform_point(&self.origin);
        let mx = m.transform_vector(&self.x_axis);
        let my = m.transform_vector(&self.y_axis);
        let plane = Plane::new(origin, mx, my).map_err(|_| Error::SingularMatrix)?;
        let map = Matrix3::new(
            mx.dot(&plane.x_axis),
            my.dot(&plane.x_axis),
            0.0,
            mx.dot(&plane.y_axis),
            my.dot(&plane.y_axis),
            0.0,
            0.0,
            0.0,
            1.0,
        );
        Ok((plane, map))
    }

    /// Same origin and axes within tolerance.
    pub fn same_frame(&self, other: &Plane) -> bool {
        (self.origin - other.origin).norm() <= Tolerance::LENGTH
            && (self.x_axis - other.x_axis).norm() <= FRAME_TOLERANCE
            && (self.y_axis - other.y_axis).norm() <= FRAME_TOLERANCE
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cylinder {
    pub origin: Point3<f64>,
    pub axis: Vector3<f64>,
    pub ref_dir: Vector3<f64>,
    pub radius: f64,
}

impl Cylinder {
    pub fn new(
        origin: Point3<f64>,
        axis: Vector3<f64>,
        ref_dir: Vector3<f64>,
        radius: f64,
    ) -> Result<Self> {
        if radius <= Tolerance::LENGTH {
            return Err(Error::InvalidProfile("cylinder radius must be positive".to_string()));
        }
        let axis = axis
            .try_normalize(Tolerance::LENGTH)
            .ok_or_else(|| Error::InvalidProfile("cylinder axis has zero length".to_string()))?;
        let ref_dir = (ref_dir - axis * ref_dir.dot(&axis))
            .try_normalize(Tolerance::LENGTH)
            .ok_or_else(|| Error::InvalidProfile("reference direction is parallel to axis".to_string()))?;
        Ok(Self {
            origin,
            axis,
            ref_dir,
            radius,
        })
    }

    /// Direction of increasing `u` at `u = 0`.
    pub fn binormal(&self) -> Vector3<f64> {
        self.axis.cross(&self.ref_dir)
    }

    #[inline]
    fn radial(&self, angle: f64) -> Vector3<f64> {
        self.ref_dir * angle.cos() + self.binormal() * angle.sin()
    }

    pub fn point_at(&self, uv: &Point2<f64>) -> Point3<f64> {
        self.origin + self.axis * uv.y + self.radial(uv.x / self.radius) * self.radius
    }

    /// Outward normal at parameter `u`.
    pub fn normal_at(&self, u: f64) -> Vector3<f64> {
        self.radial(u / self.radius)
    }

    /// Angle of `p` around the axis, moved by whole turns to lie nearest
    /// `hint` when one is given.
    pub fn angle_of(&self, p: &Point3<f64>, hint: Option<f64>) -> f64 {
        let d = p - self.origin;
        let angle = d.dot(&self.binormal()).atan2(d.dot(&self.ref_dir));
        match hint {
            Some(h) => angle + TAU * ((h - angle) / TAU).round(),
            None => angle,
        }
    }

    /// Inverse of [`Cylinder::point_at`] on the nearest branch to `hint_u`.
    pub fn param_of(&self, p: &Point3<f64>, hint_u: Option<f64>) -> Point2<f64> {
        let v = (p - self.origin).dot(&self.axis);
        let angle = self.angle_of(p, hint_u.map(|u| u / self.radius));
        Point2::new(angle * self.radius, v)
    }

    /// Plane obtained by unrolling the cylinder at `u = 0`: faces on this
    /// carrier express their half-planes in this plane's coordinates.
    pub fn development_plane(&self) -> Plane {
        Plane {
            origin: self.origin + self.ref_dir * self.radius,
            x_axis: self.binormal(),
            y_axis: self.axis,
        }
    }

    /// Applies a rigid or uniformly scaled `m`. The returned 2D matrix maps
    /// old `(u, v)` to new `(u, v)`.
    pub fn transformed(&self, m: &Matrix4<f64>) -> Result<(Cylinder, Matrix3<f64>)> {
        let axis = m.transform_vector(&self.axis);
        let ref_dir = m.transform_vector(&self.ref_dir);
        let binormal = m.transform_vector(&self.binormal());
        let scale = axis.norm();
        if scale <= Tolerance::LENGTH {
            return Err(Error::SingularMatrix);
        }
        let uniform = ((ref_dir.norm() - scale).abs() <= FRAME_TOLERANCE * scale)
            && ((binormal.norm() - scale).abs() <= FRAME_TOLERANCE * scale)
            && axis.dot(&ref_dir).abs() <= FRAME_TOLERANCE * scale * scale
            && axis.dot(&binormal).abs() <= FRAME_TOLERANCE * scale * scale
            && ref_dir.dot(&binormal).abs() <= FRAME_TOLERANCE * scale * scale;
        if !uniform {
            return Err(Error::NonUniformScale);
        }

        let cylinder = Cylinder::new(m.transform_point(&self.origin), axis, ref_dir, self.radius * scale)?;
        // A mirror reverses the direction of increasing angle
        let mirrored = cylinder.binormal().dot(&binormal) < 0.0;
        let su = if mirrored { -scale } else { scale };
        let map = Matrix3::new(su, 0.0, 0.0, 0.0, scale, 0.0, 0.0, 0.0, 1.0);
        Ok((cylinder, map))
    }
}

/// Coordinate system shared by the faces of a continuous surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Carrier {
    Plane(Plane),
    Cylinder(Cylinder),
}

impl Carrier {
    /// Plane in which faces on this carrier store their half-planes.
    pub fn parametrization_plane(&self) -> Plane {
        match self {
            Carrier::Plane(p) => *p,
            Carrier::Cylinder(c) => c.development_plane(),
        }
    }

    pub fn to_world(&self, uv: &Point2<f64>) -> Point3<f64> {
        match self {
            Carrier::Plane(p) => p.to_world(uv),
            Carrier::Cylinder(c) => c.point_at(uv),
        }
    }

    pub fn to_uv(&self, p: &Point3<f64>, hint_u: Option<f64>) -> Point2<f64> {
        match self {
            Carrier::Plane(plane) => plane.to_local(p),
            Carrier::Cylinder(c) => c.param_of(p, hint_u),
        }
    }

    pub fn normal_at(&self, uv: &Point2<f64>) -> Vector3<f64> {
        match self {
            Carrier::Plane(p) => p.normal(),
            Carrier::Cylinder(c) => c.normal_at(uv.x),
        }
    }

    pub fn transformed(&self, m: &Matrix4<f64>) -> Result<(Carrier, Matrix3<f64>)> {
        match self {
            Carrier::Plane(p) => p.transformed(m).map(|(p, map)| (Carrier::Plane(p), map)),
            Carrier::Cylinder(c) => c.transformed(m).map(|(c, map)| (Carrier::Cylinder(c), map)),
        }
    }

    /// Maps a parameter-space curve to world space.
    ///
    /// On a cylinder only straight parameter lines have a closed form: a
    /// vertical line is a ruling, a horizontal one a coaxial arc and any
    /// other a helix.
    pub fn curve_to_world(&self, curve: &Curve2d) -> Result<Curve3d> {
        match self {
            Carrier::Plane(plane) => Ok(match curve {
                Curve2d::Line(l) => Curve3d::Line {
                    start: plane.to_world(&l.start),
                    end: plane.to_world(&l.end),
                },
                Curve2d::Arc(a) => Curve3d::Arc {
                    center: plane.to_world(&a.center),
                    x_axis: plane.x_axis,
                    y_axis: plane.y_axis,
                    radius: a.radius,
                    start_angle: a.start_angle,
                    sweep: a.sweep,
                },
                Curve2d::Circle(c) => Curve3d::Arc {
                    center: plane.to_world(&c.center),
                    x_axis: plane.x_axis,
                    y_axis: plane.y_axis,
                    radius: c.radius,
                    start_angle: 0.0,
                    sweep: TAU,
                },
            }),
            Carrier::Cylinder(cyl) => {
                let Curve2d::Line(l) = curve else {
                    return Err(Error::UnsupportedMapping(
                        "curved parameter lines on a cylinder".to_string(),
                    ));
                };
                let du = l.end.x - l.start.x;
                let dv = l.end.y - l.start.y;
                if du.abs() <= Tolerance::LENGTH {
                    Ok(Curve3d::Line {
                        start: cyl.point_at(&l.start),
                        end: cyl.point_at(&l.end),
                    })
                } else if dv.abs() <= Tolerance::LENGTH {
                    Ok(Curve3d::Arc {
                        center: cyl.origin + cyl.axis * l.start.y,
                        x_axis: cyl.ref_dir,
                        y_axis: cyl.binormal(),
                        radius: cyl.radius,
                        start_angle: l.start.x / cyl.radius,
                        sweep: du / cyl.radius,
                    })
                } else {
                    Ok(Curve3d::Helix {
                        origin: cyl.origin,
                        axis: cyl.axis,
                        ref_dir: cyl.ref_dir,
                        radius: cyl.radius,
                        start_angle: l.start.x / cyl.radius,
                        sweep: du / cyl.radius,
                        start_height: l.start.y,
                        end_height: l.end.y,
                    })
                }
            }
        }
    }

    /// Maps a world curve lying on the carrier back to parameter space.
    /// Angles resolve to the branch nearest `hint_u`.
    pub fn curve_to_uv(&self, curve: &Curve3d, hint_u: Option<f64>) -> Result<Curve2d> {
        match self {
            Carrier::Plane(plane) => plane_curve_to_uv(plane, curve),
            Carrier::Cylinder(cyl) => cylinder_curve_to_uv(cyl, curve, hint_u),
        }
    }
}

fn plane_curve_to_uv(plane: &Plane, curve: &Curve3d) -> Result<Curve2d> {
    let off_plane = |p: &Point3<f64>| plane.distance_to(p).abs() > Tolerance::LENGTH;
    match curve {
        Curve3d::Line { start, end } => {
            if off_plane(start) || off_plane(end) {
                return Err(Error::UnsupportedMapping("line leaves the plane".to_string()));
            }
            Ok(Curve2d::line(plane.to_local(start), plane.to_local(end)))
        }
        Curve3d::Arc {
            center,
            x_axis,
            y_axis,
            radius,
            sweep,
            ..
        } => {
            let arc_normal = x_axis.cross(y_axis);
            let alignment = arc_normal.dot(&plane.normal());
            if off_plane(center) || (alignment.abs() - 1.0).abs() > FRAME_TOLERANCE {
                return Err(Error::UnsupportedMapping("arc is not in the plane".to_string()));
            }
            let c = plane.to_local(center);
            if sweep.abs() >= TAU - Tolerance::ANGLE {
                return Ok(Curve2d::Circle(Circle2d::new(c, *radius)));
            }
            let start = plane.to_local(&curve.start());
            let local_start = (start.y - c.y).atan2(start.x - c.x);
            let local_sweep = if alignment < 0.0 { -sweep } else { *sweep };
            Ok(Curve2d::Arc(Arc2d::new(c, *radius, local_start, local_sweep)))
        }
        Curve3d::Helix { .. } => Err(Error::UnsupportedMapping("helix on a plane".to_string())),
    }
}

fn cylinder_curve_to_uv(cyl: &Cylinder, curve: &Curve3d, hint_u: Option<f64>) -> Result<Curve2d> {
    let on_surface = |p: &Point3<f64>| {
        let d = p - cyl.origin;
        let radial = d - cyl.axis * d.dot(&cyl.axis);
        (radial.norm() - cyl.radius).abs() <= Tolerance::LENGTH * cyl.radius.max(1.0)
    };
    match curve {
        Curve3d::Line { start, end } => {
            let dir = end - start;
            let along = dir.dot(&cyl.axis);
            if !on_surface(start) || (dir - cyl.axis * along).norm() > Tolerance::LENGTH {
                return Err(Error::UnsupportedMapping(
                    "line is not a ruling of the cylinder".to_string(),
                ));
            }
            let s = cyl.param_of(start, hint_u);
            Ok(Curve2d::line(s, Point2::new(s.x, s.y + along)))
        }
        Curve3d::Arc {
            center,
            x_axis,
            y_axis,
            radius,
            sweep,
            ..
        } => {
            let arc_normal = x_axis.cross(y_axis);
            let alignment = arc_normal.dot(&cyl.axis);
            let d = center - cyl.origin;
            let off_axis = (d - cyl.axis * d.dot(&cyl.axis)).norm();
            if (alignment.abs() - 1.0).abs() > FRAME_TOLERANCE
                || off_axis > Tolerance::LENGTH
                || (radius - cyl.radius).abs() > Tolerance::LENGTH
            {
                return Err(Error::UnsupportedMapping(
                    "arc is not a section of the cylinder".to_string(),
                ));
            }
            let s = cyl.param_of(&curve.start(), hint_u);
            let du = if alignment < 0.0 { -sweep } else { *sweep } * cyl.radius;
            Ok(Curve2d::line(s, Point2::new(s.x + du, s.y)))
        }
        Curve3d::Helix {
            origin,
            axis,
            ref_dir,
            radius,
            start_angle,
            sweep,
            start_height,
            end_height,
        } => {
            let same_axis = (axis - cyl.axis).norm() <= FRAME_TOLERANCE
                && (ref_dir - cyl.ref_dir).norm() <= FRAME_TOLERANCE
                && (origin - cyl.origin).norm() <= Tolerance::LENGTH
                && (radius - cyl.radius).abs() <= Tolerance::LENGTH;
            if !same_axis {
                return Err(Error::UnsupportedMapping(
                    "helix does not share the cylinder frame".to_string(),
                ));
            }
            let mut u0 = start_angle * cyl.radius;
            if let Some(h) = hint_u {
                u0 += TAU * cyl.radius * ((h - u0) / (TAU * cyl.radius)).round();
            }
            let u1 = u0 + sweep * cyl.radius;
            Ok(Curve2d::line(
                Point2::new(u0, *start_height),
                Point2::new(u1, *end_height),
            ))
        }
    }
}

/// World-space curves produced by carrier mappings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Curve3d {
    Line {
        start: Point3<f64>,
        end: Point3<f64>,
    },
    /// Angles are measured in the `(x_axis, y_axis)` frame around `center`.
    Arc {
        center: Point3<f64>,
        x_axis: Vector3<f64>,
        y_axis: Vector3<f64>,
        radius: f64,
        start_angle: f64,
        sweep: f64,
    },
    /// Constant-pitch helix on a cylinder frame.
    Helix {
        origin: Point3<f64>,
        axis: Vector3<f64>,
        ref_dir: Vector3<f64>,
        radius: f64,
        start_angle: f64,
        sweep: f64,
        start_height: f64,
        end_height: f64,
    },
}

impl Curve3d {
    /// Point at normalized parameter `t` in `[0, 1]`.
    pub fn point_at(&self, t: f64) -> Point3<f64> {
        match self {
            Curve3d::Line { start, end } => start + (end - start) * t,
            Curve3d::Arc {
                center,
                x_axis,
                y_axis,
                radius,
                start_angle,
                sweep,
            } => {
                let a = start_angle + sweep * t;
                center + (x_axis * a.cos() + y_axis * a.sin()) * *radius
            }
            Curve3d::Helix {
                origin,
                axis,
                ref_dir,
                radius,
                start_angle,
                sweep,
                start_height,
                end_height,
            } => {
                let a = start_angle + sweep * t;
                let binormal = axis.cross(ref_dir);
                let h = start_height + (end_height - start_height) * t;
                origin + axis * h + (ref_dir * a.cos() + binormal * a.sin()) * *radius
            }
        }
    }

    pub fn start(&self) -> Point3<f64> {
        self.point_at(0.0)
    }

    pub fn end(&self) -> Point3<f64> {
        self.point_at(1.0)
    }
}

/// Serialized plane frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaneData {
    pub origin: [f64; 3],
    pub x_axis: [f64; 3],
    pub y_axis: [f64; 3],
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CylinderData {
    pub origin: [f64; 3],
    pub axis: [f64; 3],
    pub ref_dir: [f64; 3],
    pub radius: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CarrierData {
    Plane(PlaneData),
    Cylinder(CylinderData),
}

#[inline]
fn p3(p: &Point3<f64>) -> [f64; 3] {
    [p.x, p.y, p.z]
}

#[inline]
fn v3(v: &Vector3<f64>) -> [f64; 3] {
    [v.x, v.y, v.z]
}

impl From<&Plane> for PlaneData {
    fn from(p: &Plane) -> Self {
        PlaneData {
            origin: p3(&p.origin),
            x_axis: v3(&p.x_axis),
            y_axis: v3(&p.y_axis),
        }
    }
}

impl PlaneData {
    /// Orthonormal axes reload bit for bit; other axes go through
    /// [`Plane::new`]. Degenerate axes are an error.
    pub fn to_plane(&self) -> Result<Plane> {
        let stored = Plane {
            origin: Point3::from(self.origin),
            x_axis: Vector3::from(self.x_axis),
            y_axis: Vector3::from(self.y_axis),
        };
        let checked = Plane::new(stored.origin, stored.x_axis, stored.y_axis)?;
        Ok(if checked.same_frame(&stored) { stored } else { checked })
    }
}

impl From<&Carrier> for CarrierData {
    fn from(c: &Carrier) -> Self {
        match c {
            Carrier::Plane(p) => CarrierData::Plane(PlaneData::from(p)),
            Carrier::Cylinder(c) => CarrierData::Cylinder(CylinderData {
                origin: p3(&c.origin),
                axis: v3(&c.axis),
                ref_dir: v3(&c.ref_dir),
                radius: c.radius,
            }),
        }
    }
}

impl CarrierData {
    /// Rebuilds the carrier with the same checks as [`Plane::new`] and
    /// [`Cylinder::new`].
    pub fn to_carrier(&self) -> Result<Carrier> {
        match self {
            CarrierData::Plane(p) => Ok(Carrier::Plane(p.to_plane()?)),
            CarrierData::Cylinder(c) => {
                let stored = Cylinder {
                    origin: Point3::from(c.origin),
                    axis: Vector3::from(c.axis),
                    ref_dir: Vector3::from(c.ref_dir),
                    radius: c.radius,
                };
                let checked = Cylinder::new(stored.origin, stored.axis, stored.ref_dir, stored.radius)?;
                let unchanged = (checked.axis - stored.axis).norm() <= FRAME_TOLERANCE
                    && (checked.ref_dir - stored.ref_dir).norm() <= FRAME_TOLERANCE;
                Ok(Carrier::Cylinder(if unchanged { stored } else { checked }))
            }
        }
    }
}
