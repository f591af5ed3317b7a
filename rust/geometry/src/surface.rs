// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Plane regions bounded by half-planes.

use crate::bool2d::compute_signed_area;
use crate::carrier::{Curve3d, Plane};
use crate::curve::Curve2d;
use crate::error::{Error, Result};
use crate::half_plane::{intersect_half_planes, HalfPlane, REGION_EXTENT};
use crate::mesh::MeshData;
use crate::tessellation::{Tessellation, Tolerance};
use crate::triangulation::triangulate_polygon_with_holes;
use crate::wire::Wire;
use nalgebra::{Matrix3, Matrix4, Point2, Point3, Vector3};

/// Boundary accepted by the `get_area` methods, in the surface's local
/// coordinates.
#[derive(Debug, Clone, Copy)]
pub enum AreaInput<'a> {
    Wire(&'a Wire),
    /// Connected curves; orientation is resolved like a wire's.
    Curves(&'a [Curve2d]),
    /// Several loops whose signed areas are summed, so clockwise holes
    /// subtract from a counter-clockwise outer loop.
    Loops(&'a [Wire]),
}

impl<'a> From<&'a Wire> for AreaInput<'a> {
    fn from(w: &'a Wire) -> Self {
        AreaInput::Wire(w)
    }
}

impl<'a> From<&'a [Curve2d]> for AreaInput<'a> {
    fn from(c: &'a [Curve2d]) -> Self {
        AreaInput::Curves(c)
    }
}

impl<'a> From<&'a [Wire]> for AreaInput<'a> {
    fn from(w: &'a [Wire]) -> Self {
        AreaInput::Loops(w)
    }
}

/// Shoelace area over the discretized boundary. Signed unless `is_positive`.
pub(crate) fn boundary_area(input: AreaInput<'_>, is_positive: bool, tessellation: &Tessellation) -> f64 {
    let signed = match input {
        AreaInput::Wire(w) => compute_signed_area(&w.discrete_points(tessellation)),
        AreaInput::Curves(curves) => {
            let wire = Wire::from_curves("", curves.to_vec());
            compute_signed_area(&wire.discrete_points(tessellation))
        }
        AreaInput::Loops(wires) => wires
            .iter()
            .map(|w| compute_signed_area(&w.discrete_points(tessellation)))
            .sum(),
    };
    if is_positive {
        signed.abs()
    } else {
        signed
    }
}

/// A bounded plane: a base plane and the half-planes, in the plane's local
/// coordinates, whose intersection is the region.
#[derive(Debug, Clone, PartialEq)]
pub struct Single {
    plane: Plane,
    st: Vec<HalfPlane>,
}

impl Single {
    /// Unbounded region covering the whole plane.
    pub fn new(plane: Plane) -> Self {
        Self {
            plane,
            st: Vec::new(),
        }
    }

    pub fn with_half_planes(plane: Plane, half_planes: Vec<HalfPlane>) -> Self {
        Self {
            plane,
            st: half_planes,
        }
    }

    /// Region of a convex polygon given in local coordinates. Clockwise
    /// input is reversed first.
    pub fn from_convex_polygon(plane: Plane, polygon: &[Point2<f64>]) -> Self {
        let ring = crate::bool2d::ensure_ccw(polygon);
        let n = ring.len();
        let st = (0..n)
            .map(|i| HalfPlane::through(ring[i], ring[(i + 1) % n]))
            .collect();
        Self { plane, st }
    }

    pub fn plane(&self) -> &Plane {
        &self.plane
    }

    /// Half-planes in insertion order.
    pub fn get_st(&self) -> &[HalfPlane] {
        &self.st
    }

    pub fn push_half_plane(&mut self, half_plane: HalfPlane) {
        self.st.push(half_plane);
    }

    /// Point-in-region test in local coordinates.
    pub fn check(&self, point: &Point2<f64>) -> bool {
        self.st.iter().all(|hp| hp.check(point))
    }

    /// Point-in-region test for a world point, projected onto the plane.
    pub fn check_world(&self, point: &Point3<f64>) -> bool {
        self.check(&self.plane.to_local(point))
    }

    pub fn get_area(&self, input: AreaInput<'_>, is_positive: bool) -> f64 {
        boundary_area(input, is_positive, &Tessellation::default())
    }

    pub fn get_area_with(&self, input: AreaInput<'_>, is_positive: bool, tessellation: &Tessellation) -> f64 {
        boundary_area(input, is_positive, tessellation)
    }

    /// Counter-clockwise boundary of the region in local coordinates.
    pub fn region_polygon(&self) -> Result<Vec<Point2<f64>>> {
        if self.st.is_empty() {
            return Err(Error::UnboundedRegion);
        }
        let (polygon, unbounded) = intersect_half_planes(&self.st, REGION_EXTENT);
        if polygon.len() < 3 || compute_signed_area(&polygon) <= Tolerance::AREA {
            return Err(Error::EmptyRegion);
        }
        if unbounded {
            return Err(Error::UnboundedRegion);
        }
        Ok(polygon)
    }

    pub fn region_area(&self) -> Result<f64> {
        Ok(compute_signed_area(&self.region_polygon()?))
    }

    /// Triangulates the region, minus `holes`, into `mesh`. Returns the
    /// number of triangles appended.
    pub fn discrete_mesh(&self, mesh: &mut MeshData, holes: &[Vec<Point2<f64>>]) -> Result<usize> {
        let outer = self.region_polygon()?;
        let triangles = triangulate_polygon_with_holes(&outer, holes)?;

        let uvs: Vec<Point2<f64>> = outer.iter().chain(holes.iter().flatten()).copied().collect();
        let positions: Vec<Point3<f64>> = uvs.iter().map(|p| self.plane.to_world(p)).collect();
        let normals: Vec<Vector3<f64>> = vec![self.plane.normal(); positions.len()];
        Ok(mesh.append(&positions, &normals, &uvs, &triangles))
    }

    /// World line carrying the boundary of `half_plane`, one direction
    /// length long.
    pub fn get_line3d_by_half_plane2d(&self, half_plane: &HalfPlane) -> Curve3d {
        Curve3d::Line {
            start: self.plane.to_world(&half_plane.origin),
            end: self.plane.to_world(&(half_plane.origin + half_plane.direction)),
        }
    }

    /// Replaces the frame and maps every half-plane through `map` in one step.
    pub(crate) fn reframed(&self, plane: Plane, map: &Matrix3<f64>) -> Single {
        Single {
            plane,
            st: self.st.iter().map(|hp| hp.transformed(map)).collect(),
        }
    }

    /// Moves the plane and every half-plane together. On error nothing changes.
    pub fn transform(&mut self, m: &Matrix4<f64>) -> Result<()> {
        *self = self.transformed(m)?;
        Ok(())
    }

    pub fn transformed(&self, m: &Matrix4<f64>) -> Result<Single> {
        let (plane, map) = self.plane.transformed(m)?;
        Ok(self.reframed(plane, &map))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Rotation3, Translation3};
    use std::f64::consts::PI;

    fn square(size: f64) -> Vec<Point2<f64>> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(size, 0.0),
            Point2::new(size, size),
            Point2::new(0.0, size),
        ]
    }

    fn sample_points() -> Vec<Point2<f64>> {
        let mut pts = Vec::new();
        for i in -4..=8 {
            for j in -4..=8 {
                pts.push(Point2::new(i as f64 * 0.5, j as f64 * 0.5));
            }
        }
        pts
    }

    #[test]
    fn test_empty_half_planes_accept_everything() {
        let s = Single::new(Plane::xy());
        assert!(s.check(&Point2::new(1e9, -1e9)));
        assert!(matches!(s.region_polygon(), Err(Error::UnboundedRegion)));
    }

    #[test]
    fn test_adding_half_plane_never_grows_region() {
        let mut s = Single::from_convex_polygon(Plane::xy(), &square(3.0));
        let before: Vec<bool> = sample_points().iter().map(|p| s.check(p)).collect();
        s.push_half_plane(HalfPlane::through(Point2::new(0.0, 3.0), Point2::new(3.0, 0.0)));
        for (p, was_inside) in sample_points().iter().zip(before) {
            if s.check(p) {
                assert!(was_inside, "{:?} entered the region", p);
            }
        }
        assert_relative_eq!(s.region_area().unwrap(), 4.5, epsilon = 1e-6);
    }

    #[test]
    fn test_transform_keeps_containment() {
        let plane = Plane::new(Point3::new(1.0, 0.0, 0.0), Vector3::y(), Vector3::z()).unwrap();
        let s = Single::from_convex_polygon(plane, &square(2.0));
        let m = Translation3::new(0.5, -2.0, 4.0).to_homogeneous()
            * Rotation3::from_axis_angle(&Vector3::z_axis(), PI / 3.0).to_homogeneous()
            * Matrix4::new_nonuniform_scaling(&Vector3::new(2.0, -1.0, 0.5));
        let moved = s.transformed(&m).unwrap();
        for uv in sample_points() {
            let p = plane.to_world(&uv);
            assert_eq!(moved.check_world(&m.transform_point(&p)), s.check_world(&p), "{:?}", uv);
        }
    }

    #[test]
    fn test_failed_transform_leaves_surface_untouched() {
        let mut s = Single::from_convex_polygon(Plane::xy(), &square(1.0));
        let before = s.clone();
        let flatten = Matrix4::new_nonuniform_scaling(&Vector3::new(1.0, 0.0, 1.0));
        assert!(s.transform(&flatten).is_err());
        assert_eq!(s, before);
    }

    #[test]
    fn test_get_area_signed_and_positive() {
        let s = Single::new(Plane::xy());
        let cw: Vec<Curve2d> = vec![
            Curve2d::line(Point2::new(0.0, 0.0), Point2::new(0.0, 2.0)),
            Curve2d::line(Point2::new(0.0, 2.0), Point2::new(2.0, 2.0)),
            Curve2d::line(Point2::new(2.0, 2.0), Point2::new(2.0, 0.0)),
            Curve2d::line(Point2::new(2.0, 0.0), Point2::new(0.0, 0.0)),
        ];
        assert_relative_eq!(s.get_area(AreaInput::Curves(&cw), false), -4.0);
        assert_relative_eq!(s.get_area(AreaInput::Curves(&cw), true), 4.0);
    }

    #[test]
    fn test_net_area_of_loops() {
        let s = Single::new(Plane::xy());
        let outer = Wire::from_curves(
            "outer",
            vec![
                Curve2d::line(Point2::new(0.0, 0.0), Point2::new(4.0, 0.0)),
                Curve2d::line(Point2::new(4.0, 0.0), Point2::new(4.0, 4.0)),
                Curve2d::line(Point2::new(4.0, 4.0), Point2::new(0.0, 4.0)),
                Curve2d::line(Point2::new(0.0, 4.0), Point2::new(0.0, 0.0)),
            ],
        );
        let hole = Wire::from_curves(
            "hole",
            vec![
                Curve2d::line(Point2::new(1.0, 1.0), Point2::new(1.0, 2.0)),
                Curve2d::line(Point2::new(1.0, 2.0), Point2::new(2.0, 2.0)),
                Curve2d::line(Point2::new(2.0, 2.0), Point2::new(2.0, 1.0)),
                Curve2d::line(Point2::new(2.0, 1.0), Point2::new(1.0, 1.0)),
            ],
        );
        let loops = [outer, hole];
        assert_relative_eq!(s.get_area(AreaInput::Loops(&loops), false), 15.0);
    }

    #[test]
    fn test_discrete_mesh_appends() {
        let s = Single::from_convex_polygon(Plane::xy(), &square(2.0));
        let mut mesh = MeshData::new();
        let first = s.discrete_mesh(&mut mesh, &[]).unwrap();
        let hole = vec![
            Point2::new(0.5, 0.5),
            Point2::new(0.5, 1.5),
            Point2::new(1.5, 1.5),
            Point2::new(1.5, 0.5),
        ];
        let second = s.discrete_mesh(&mut mesh, &[hole]).unwrap();
        assert_eq!(first, 2);
        assert_eq!(second, 8);
        assert_eq!(mesh.triangle_count(), 10);
        assert_eq!(mesh.vertex_count(), 12);
        let max_index = mesh.indices.as_ref().and_then(|i| i.iter().max().copied());
        assert_eq!(max_index, Some(11));
    }

    #[test]
    fn test_line3d_of_half_plane() {
        let plane = Plane::new(Point3::new(0.0, 0.0, 3.0), Vector3::x(), Vector3::y()).unwrap();
        let s = Single::new(plane);
        let hp = HalfPlane::through(Point2::new(1.0, 0.0), Point2::new(1.0, 1.0));
        let line = s.get_line3d_by_half_plane2d(&hp);
        assert_relative_eq!(line.start().z, 3.0);
        assert_relative_eq!(line.end().y, 1.0);
    }
}
