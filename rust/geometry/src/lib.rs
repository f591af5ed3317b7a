// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Plankit Geometry
//!
//! Planar curves and wires, half-plane bounded surfaces and continuous
//! surfaces on plane or cylinder carriers. Triangulation goes through
//! earcutr, 2D booleans through i_overlay and transforms through nalgebra.

pub mod bool2d;
pub mod bounds;
pub mod carrier;
pub mod continuous;
pub mod curve;
pub mod error;
pub mod half_plane;
pub mod mesh;
pub mod polygon;
pub mod surface;
pub mod surface_io;
pub mod tessellation;
pub mod triangulation;
pub mod wire;
pub mod wire_io;

// Re-export nalgebra types for convenience
pub use nalgebra::{Matrix3, Matrix4, Point2, Point3, Vector2, Vector3};

pub use bounds::Bounds2;
pub use carrier::{Carrier, CarrierData, Curve3d, Cylinder, Plane, PlaneData};
pub use continuous::{ContinuousSurface, SurfaceFace};
pub use curve::{Arc2d, Circle2d, Curve2d, CurveData, Line2d};
pub use error::{Error, Result};
pub use half_plane::HalfPlane;
pub use mesh::MeshData;
pub use polygon::Polygon2;
pub use surface::{AreaInput, Single};
pub use surface_io::{FaceDump, SurfaceDump, SurfaceLibrary};
pub use tessellation::{Tessellation, Tolerance};
pub use triangulation::{triangulate_polygon, triangulate_polygon_with_holes};
pub use wire::{CurveKey, LoopRole, Wire, WireCurve, WireEvent, WireField};
pub use wire_io::{IdRemap, SuffixIdRemap, WireDumpRecord};
