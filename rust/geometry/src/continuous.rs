// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Composite surfaces whose faces share one carrier.

use crate::carrier::{Carrier, Curve3d};
use crate::curve::Curve2d;
use crate::error::Result;
use crate::half_plane::HalfPlane;
use crate::mesh::MeshData;
use crate::surface::{boundary_area, AreaInput, Single};
use crate::tessellation::Tessellation;
use crate::triangulation::triangulate_polygon;
use nalgebra::{Matrix4, Point2, Point3, Vector2, Vector3};

/// One entry of [`ContinuousSurface::get_all_face`].
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceFace {
    Single(Single),
    Continuous(ContinuousSurface),
    /// Face of a kind this kernel does not model, kept verbatim so that a
    /// load followed by a dump does not lose it.
    Opaque(serde_json::Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContinuousSurface {
    id: String,
    carrier: Carrier,
    all_face: Vec<SurfaceFace>,
}

impl ContinuousSurface {
    pub fn new(id: impl Into<String>, carrier: Carrier) -> Self {
        Self {
            id: id.into(),
            carrier,
            all_face: Vec::new(),
        }
    }

    pub(crate) fn from_parts(id: String, carrier: Carrier, all_face: Vec<SurfaceFace>) -> Self {
        Self {
            id,
            carrier,
            all_face,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn carrier(&self) -> &Carrier {
        &self.carrier
    }

    pub fn get_all_face(&self) -> &[SurfaceFace] {
        &self.all_face
    }

    /// Single faces, including those of nested surfaces, depth first.
    pub fn singles(&self) -> Vec<&Single> {
        let mut out = Vec::new();
        for face in &self.all_face {
            match face {
                SurfaceFace::Single(s) => out.push(s),
                SurfaceFace::Continuous(c) => out.extend(c.singles()),
                SurfaceFace::Opaque(_) => {}
            }
        }
        out
    }

    /// Appends `face` if its plane is the carrier's parametrization plane.
    /// Returns false and leaves the surface unchanged otherwise.
    pub fn push_single_plane(&mut self, face: Single) -> bool {
        if !face.plane().same_frame(&self.carrier.parametrization_plane()) {
            tracing::debug!(surface = %self.id, "face frame does not match carrier");
            return false;
        }
        self.all_face.push(SurfaceFace::Single(face));
        true
    }

    /// Appends a nested surface on the same carrier. A surface can never be
    /// nested into itself, so an id already present in this tree is refused.
    pub fn push_continuous(&mut self, surface: ContinuousSurface) -> bool {
        if surface.carrier != self.carrier || surface.contains_id(&self.id) || self.contains_id(&surface.id) {
            return false;
        }
        self.all_face.push(SurfaceFace::Continuous(surface));
        true
    }

    fn contains_id(&self, id: &str) -> bool {
        self.id == id
            || self.all_face.iter().any(|f| match f {
                SurfaceFace::Continuous(c) => c.contains_id(id),
                _ => false,
            })
    }

    /// Parameter-space face builder: the convex polygon `uv` becomes a face
    /// on this carrier.
    pub fn face_from_uv_polygon(&self, uv: &[Point2<f64>]) -> Single {
        Single::from_convex_polygon(self.carrier.parametrization_plane(), uv)
    }

    pub fn get_curve3d(&self, curve: &Curve2d) -> Result<Curve3d> {
        self.carrier.curve_to_world(curve)
    }

    pub fn get_curve2d(&self, curve: &Curve3d, hint_u: Option<f64>) -> Result<Curve2d> {
        self.carrier.curve_to_uv(curve, hint_u)
    }

    /// Area of a parameter-space boundary. On a cylinder `u` is arc length,
    /// so this is the area on the surface itself.
    pub fn get_area(&self, input: AreaInput<'_>, is_positive: bool) -> f64 {
        boundary_area(input, is_positive, &Tessellation::default())
    }

    /// Sum of the regions of all Single faces.
    pub fn region_area(&self) -> Result<f64> {
        self.singles().iter().map(|s| s.region_area()).sum()
    }

    /// Meshes every face into `mesh`. Faces on a cylinder are cut into
    /// strips no wider than the tessellation allows before mapping.
    pub fn discrete_mesh(&self, mesh: &mut MeshData, tessellation: &Tessellation) -> Result<usize> {
        let mut count = 0;
        for face in &self.all_face {
            count += match face {
                SurfaceFace::Single(s) => match self.carrier {
                    Carrier::Plane(_) => s.discrete_mesh(mesh, &[])?,
                    Carrier::Cylinder(_) => self.mesh_curved_face(s, mesh, tessellation)?,
                },
                SurfaceFace::Continuous(c) => c.discrete_mesh(mesh, tessellation)?,
                SurfaceFace::Opaque(_) => 0,
            };
        }
        Ok(count)
    }

    fn mesh_curved_face(&self, face: &Single, mesh: &mut MeshData, tessellation: &Tessellation) -> Result<usize> {
        let Carrier::Cylinder(cyl) = &self.carrier else {
            return face.discrete_mesh(mesh, &[]);
        };
        let region = face.region_polygon()?;
        let (u_min, u_max) = region
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p.x), hi.max(p.x)));
        let sweep = (u_max - u_min) / cyl.radius;
        let strips = tessellation.segments_for(cyl.radius, sweep).max(1);
        let width = (u_max - u_min) / strips as f64;

        let mut count = 0;
        for k in 0..strips {
            let lo = u_min + width * k as f64;
            let hi = if k + 1 == strips { u_max } else { lo + width };
            let left = HalfPlane::new(Point2::new(lo, 0.0), Vector2::new(0.0, -1.0));
            let right = HalfPlane::new(Point2::new(hi, 0.0), Vector2::new(0.0, 1.0));
            let strip = right.clip_polygon(&left.clip_polygon(&region));
            if strip.len() < 3 {
                continue;
            }
            let triangles = triangulate_polygon(&strip)?;
            let positions: Vec<Point3<f64>> = strip.iter().map(|uv| cyl.point_at(uv)).collect();
            let normals: Vec<Vector3<f64>> = strip.iter().map(|uv| cyl.normal_at(uv.x)).collect();
            count += mesh.append(&positions, &normals, &strip, &triangles);
        }
        Ok(count)
    }

    /// Moves the carrier and every face together. On error nothing changes.
    pub fn transform(&mut self, m: &Matrix4<f64>) -> Result<()> {
        *self = self.transformed(m)?;
        Ok(())
    }

    pub fn transformed(&self, m: &Matrix4<f64>) -> Result<ContinuousSurface> {
        let (carrier, map) = self.carrier.transformed(m)?;
        let plane = carrier.parametrization_plane();
        let all_face = self
            .all_face
            .iter()
            .map(|face| {
                Ok(match face {
                    SurfaceFace::Single(s) => SurfaceFace::Single(s.reframed(plane, &map)),
                    SurfaceFace::Continuous(c) => SurfaceFace::Continuous(c.transformed(m)?),
                    SurfaceFace::Opaque(v) => SurfaceFace::Opaque(v.clone()),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(ContinuousSurface {
            id: self.id.clone(),
            carrier,
            all_face,
        })
    }
}

impl From<Single> for SurfaceFace {
    fn from(s: Single) -> Self {
        SurfaceFace::Single(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carrier::{Cylinder, Plane};
    use approx::assert_relative_eq;
    use nalgebra::{Rotation3, Translation3};
    use std::f64::consts::PI;

    fn cylinder_surface() -> ContinuousSurface {
        let cyl = Cylinder::new(Point3::origin(), Vector3::z(), Vector3::x(), 1.5).unwrap();
        ContinuousSurface::new("cs", Carrier::Cylinder(cyl))
    }

    fn rect(u0: f64, v0: f64, u1: f64, v1: f64) -> Vec<Point2<f64>> {
        vec![
            Point2::new(u0, v0),
            Point2::new(u1, v0),
            Point2::new(u1, v1),
            Point2::new(u0, v1),
        ]
    }

    #[test]
    fn test_push_rejects_foreign_frame() {
        let mut cs = cylinder_surface();
        let foreign = Single::from_convex_polygon(Plane::xy(), &rect(0.0, 0.0, 1.0, 1.0));
        assert!(!cs.push_single_plane(foreign));
        assert!(cs.get_all_face().is_empty());
        let face = cs.face_from_uv_polygon(&rect(0.0, 0.0, 1.0, 1.0));
        assert!(cs.push_single_plane(face));
    }

    #[test]
    fn test_region_area_sums_faces() {
        let mut cs = cylinder_surface();
        let a = cs.face_from_uv_polygon(&rect(0.0, 0.0, 1.0, 2.0));
        let b = cs.face_from_uv_polygon(&rect(1.0, 0.0, 3.0, 2.0));
        assert!(cs.push_single_plane(a));
        assert!(cs.push_single_plane(b));
        assert_relative_eq!(cs.region_area().unwrap(), 6.0, epsilon = 1e-6);
    }

    #[test]
    fn test_curved_mesh_lies_on_cylinder() {
        let mut cs = cylinder_surface();
        let face = cs.face_from_uv_polygon(&rect(0.0, 0.0, PI * 1.5, 1.0));
        assert!(cs.push_single_plane(face));
        let mut mesh = MeshData::new();
        let count = cs.discrete_mesh(&mut mesh, &Tessellation::default()).unwrap();
        assert!(count >= 2 * 9);
        for chunk in mesh.vertices.chunks_exact(3) {
            let r = ((chunk[0] as f64).powi(2) + (chunk[1] as f64).powi(2)).sqrt();
            assert_relative_eq!(r, 1.5, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_nested_self_reference_refused() {
        let mut outer = cylinder_surface();
        let inner = cylinder_surface();
        assert!(!outer.push_continuous(inner));
        let mut other = cylinder_surface();
        other.id = "inner".to_string();
        assert!(outer.push_continuous(other));
    }

    #[test]
    fn test_transform_moves_carrier_and_faces() {
        let mut cs = cylinder_surface();
        let face = cs.face_from_uv_polygon(&rect(0.0, 0.0, 1.0, 1.0));
        assert!(cs.push_single_plane(face));
        let m = Translation3::new(3.0, 0.0, 1.0).to_homogeneous()
            * Rotation3::from_axis_angle(&Vector3::x_axis(), PI / 4.0).to_homogeneous()
            * Matrix4::new_scaling(2.0);
        let moved = cs.transformed(&m).unwrap();
        let expected = moved.carrier().parametrization_plane();
        for s in moved.singles() {
            assert!(s.plane().same_frame(&expected));
        }
        assert_relative_eq!(moved.region_area().unwrap(), 4.0, epsilon = 1e-6);
    }

    #[test]
    fn test_non_uniform_transform_rejected_atomically() {
        let mut cs = cylinder_surface();
        let face = cs.face_from_uv_polygon(&rect(0.0, 0.0, 1.0, 1.0));
        assert!(cs.push_single_plane(face));
        let before = cs.clone();
        let m = Matrix4::new_nonuniform_scaling(&Vector3::new(1.0, 3.0, 1.0));
        assert!(cs.transform(&m).is_err());
        assert_eq!(cs, before);
    }
}
