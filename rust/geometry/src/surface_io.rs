// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Surface dump records.
//!
//! Faces are tagged by `type`. A continuous surface may refer to a shared
//! surface with `{type: "EN_REF", id}`; such references are resolved through a
//! [`SurfaceLibrary`] at load time. Faces with a tag this crate does not know
//! are carried through as raw JSON; a known tag with a malformed body is an
//! error. Loaded faces must fit the carrier of the surface holding them.

use crate::carrier::{CarrierData, PlaneData};
use crate::continuous::{ContinuousSurface, SurfaceFace};
use crate::error::{Error, Result};
use crate::half_plane::HalfPlane;
use crate::surface::Single;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SurfaceDump {
    #[serde(rename = "EN_SINGLE")]
    Single { face: PlaneData, hps: Vec<HalfPlane> },
    #[serde(rename = "EN_CONTINUOUS")]
    Continuous {
        id: String,
        face: CarrierData,
        #[serde(rename = "allFace")]
        all_face: Vec<FaceDump>,
    },
    #[serde(rename = "EN_REF")]
    Reference { id: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FaceDump {
    Known(SurfaceDump),
    Opaque(serde_json::Value),
}

const KNOWN_TAGS: [&str; 3] = ["EN_SINGLE", "EN_CONTINUOUS", "EN_REF"];

impl<'de> Deserialize<'de> for FaceDump {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        let tag = value.get("type").and_then(serde_json::Value::as_str);
        if tag.is_some_and(|t| KNOWN_TAGS.contains(&t)) {
            SurfaceDump::deserialize(value)
                .map(FaceDump::Known)
                .map_err(serde::de::Error::custom)
        } else {
            Ok(FaceDump::Opaque(value))
        }
    }
}

/// Shared continuous surfaces addressable by id from `EN_REF` faces.
#[derive(Debug, Clone, Default)]
pub struct SurfaceLibrary {
    entries: FxHashMap<String, SurfaceDump>,
}

impl SurfaceLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, surface: &ContinuousSurface) {
        self.entries.insert(surface.id().to_string(), surface.dump1());
    }

    pub fn insert_dump(&mut self, id: impl Into<String>, dump: SurfaceDump) {
        self.entries.insert(id.into(), dump);
    }

    pub fn get(&self, id: &str) -> Option<&SurfaceDump> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Single {
    pub fn dump1(&self) -> SurfaceDump {
        SurfaceDump::Single {
            face: PlaneData::from(self.plane()),
            hps: self.get_st().to_vec(),
        }
    }

    pub fn load1(dump: &SurfaceDump) -> Result<Single> {
        match dump {
            SurfaceDump::Single { face, hps } => Ok(Single::with_half_planes(face.to_plane()?, hps.clone())),
            other => Err(Error::Serialization(format!(
                "expected EN_SINGLE, found {}",
                tag_of(other)
            ))),
        }
    }
}

impl ContinuousSurface {
    pub fn dump1(&self) -> SurfaceDump {
        SurfaceDump::Continuous {
            id: self.id().to_string(),
            face: CarrierData::from(self.carrier()),
            all_face: self.get_all_face().iter().map(dump_face).collect(),
        }
    }

    pub fn load1(dump: &SurfaceDump) -> Result<ContinuousSurface> {
        Self::load1_with(dump, None)
    }

    /// Loads a continuous surface, resolving `EN_REF` faces through `library`.
    /// References that cannot be resolved are kept as opaque faces.
    pub fn load1_with(dump: &SurfaceDump, library: Option<&SurfaceLibrary>) -> Result<ContinuousSurface> {
        let mut stack = Vec::new();
        load_continuous(dump, library, &mut stack)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.dump1())?)
    }

    pub fn from_json(json: &str, library: Option<&SurfaceLibrary>) -> Result<ContinuousSurface> {
        let dump: SurfaceDump = serde_json::from_str(json)?;
        Self::load1_with(&dump, library)
    }
}

fn tag_of(dump: &SurfaceDump) -> &'static str {
    match dump {
        SurfaceDump::Single { .. } => "EN_SINGLE",
        SurfaceDump::Continuous { .. } => "EN_CONTINUOUS",
        SurfaceDump::Reference { .. } => "EN_REF",
    }
}

fn dump_face(face: &SurfaceFace) -> FaceDump {
    match face {
        SurfaceFace::Single(s) => FaceDump::Known(s.dump1()),
        SurfaceFace::Continuous(c) => FaceDump::Known(c.dump1()),
        SurfaceFace::Opaque(v) => FaceDump::Opaque(v.clone()),
    }
}

/// `stack` holds the ids of the surfaces currently being loaded.
fn load_continuous(
    dump: &SurfaceDump,
    library: Option<&SurfaceLibrary>,
    stack: &mut Vec<String>,
) -> Result<ContinuousSurface> {
    let SurfaceDump::Continuous { id, face, all_face } = dump else {
        return Err(Error::Serialization(format!(
            "expected EN_CONTINUOUS, found {}",
            tag_of(dump)
        )));
    };
    if stack.iter().any(|s| s == id) {
        tracing::warn!(surface = %id, "cyclic continuous surface rejected");
        return Err(Error::CyclicSurface(id.clone()));
    }
    let carrier = face.to_carrier()?;
    let frame = carrier.parametrization_plane();
    stack.push(id.clone());

    let mut faces = Vec::with_capacity(all_face.len());
    for entry in all_face {
        let loaded = load_face(entry, library, stack)?;
        let fits = match &loaded {
            SurfaceFace::Single(s) => s.plane().same_frame(&frame),
            SurfaceFace::Continuous(c) => *c.carrier() == carrier,
            SurfaceFace::Opaque(_) => true,
        };
        if !fits {
            tracing::warn!(surface = %id, "face does not fit the carrier");
            return Err(Error::IncompatibleFace(id.clone()));
        }
        faces.push(loaded);
    }

    stack.pop();
    Ok(ContinuousSurface::from_parts(id.clone(), carrier, faces))
}

fn load_face(entry: &FaceDump, library: Option<&SurfaceLibrary>, stack: &mut Vec<String>) -> Result<SurfaceFace> {
    let dump = match entry {
        FaceDump::Known(dump) => dump,
        FaceDump::Opaque(value) => {
            tracing::debug!("keeping face with unknown tag as opaque");
            return Ok(SurfaceFace::Opaque(value.clone()));
        }
    };
    match dump {
        SurfaceDump::Single { .. } => Ok(SurfaceFace::Single(Single::load1(dump)?)),
        SurfaceDump::Continuous { .. } => Ok(SurfaceFace::Continuous(load_continuous(dump, library, stack)?)),
        SurfaceDump::Reference { id } => {
            if stack.iter().any(|s| s == id) {
                tracing::warn!(surface = %id, "cyclic continuous surface rejected");
                return Err(Error::CyclicSurface(id.clone()));
            }
            match library.and_then(|lib| lib.get(id)) {
                Some(target) => Ok(SurfaceFace::Continuous(load_continuous(target, library, stack)?)),
                None => {
                    tracing::warn!(surface = %id, "{}", Error::UnresolvedSurface(id.clone()));
                    Ok(SurfaceFace::Opaque(serde_json::to_value(dump)?))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carrier::{Carrier, Cylinder, Plane};
    use nalgebra::{Point2, Point3, Vector3};
    use serde_json::json;

    fn square_single() -> Single {
        Single::from_convex_polygon(
            Plane::xy(),
            &[
                Point2::new(0.0, 0.0),
                Point2::new(1.0, 0.0),
                Point2::new(1.0, 1.0),
                Point2::new(0.0, 1.0),
            ],
        )
    }

    #[test]
    fn test_single_json_shape() {
        let value = serde_json::to_value(square_single().dump1()).unwrap();
        assert_eq!(value["type"], "EN_SINGLE");
        assert_eq!(value["hps"].as_array().map(Vec::len), Some(4));
        assert_eq!(value["face"]["xAxis"], json!([1.0, 0.0, 0.0]));
    }

    #[test]
    fn test_single_round_trip_keeps_order() {
        let single = square_single();
        let loaded = Single::load1(&single.dump1()).unwrap();
        assert_eq!(loaded, single);
    }

    #[test]
    fn test_single_load_rejects_other_tag() {
        let dump = SurfaceDump::Reference { id: "x".to_string() };
        assert!(matches!(Single::load1(&dump), Err(Error::Serialization(_))));
    }

    #[test]
    fn test_unknown_face_preserved() {
        let json = json!({
            "type": "EN_CONTINUOUS",
            "id": "cs",
            "face": {"type": "Plane", "origin": [0.0, 0.0, 0.0], "xAxis": [1.0, 0.0, 0.0], "yAxis": [0.0, 1.0, 0.0]},
            "allFace": [{"type": "EN_NURBS", "degree": 3}]
        });
        let surface = ContinuousSurface::from_json(&json.to_string(), None).unwrap();
        assert!(matches!(surface.get_all_face()[0], SurfaceFace::Opaque(_)));
        let back = serde_json::to_value(surface.dump1()).unwrap();
        assert_eq!(back["allFace"][0]["degree"], 3);
    }

    #[test]
    fn test_malformed_known_face_rejected() {
        let json = json!({
            "type": "EN_CONTINUOUS",
            "id": "cs",
            "face": {"type": "Plane", "origin": [0.0, 0.0, 0.0], "xAxis": [1.0, 0.0, 0.0], "yAxis": [0.0, 1.0, 0.0]},
            "allFace": [{"type": "EN_SINGLE", "face": "broken"}]
        });
        assert!(matches!(
            ContinuousSurface::from_json(&json.to_string(), None),
            Err(Error::Serialization(_))
        ));
    }

    #[test]
    fn test_foreign_frame_face_rejected() {
        let cyl = Cylinder::new(Point3::origin(), Vector3::z(), Vector3::x(), 1.0).unwrap();
        let mut surface = ContinuousSurface::new("cyl", Carrier::Cylinder(cyl));
        assert!(!surface.push_single_plane(square_single()));

        let SurfaceDump::Continuous { id, face, .. } = surface.dump1() else {
            panic!("expected continuous dump");
        };
        let dump = SurfaceDump::Continuous {
            id,
            face,
            all_face: vec![FaceDump::Known(square_single().dump1())],
        };
        assert!(matches!(
            ContinuousSurface::load1(&dump),
            Err(Error::IncompatibleFace(id)) if id == "cyl"
        ));
    }

    #[test]
    fn test_nested_carrier_mismatch_rejected() {
        let cyl = Cylinder::new(Point3::origin(), Vector3::z(), Vector3::x(), 1.0).unwrap();
        let inner = ContinuousSurface::new("inner", Carrier::Plane(Plane::xy()));
        let dump = SurfaceDump::Continuous {
            id: "outer".to_string(),
            face: CarrierData::from(&Carrier::Cylinder(cyl)),
            all_face: vec![FaceDump::Known(inner.dump1())],
        };
        assert!(matches!(ContinuousSurface::load1(&dump), Err(Error::IncompatibleFace(_))));
    }

    #[test]
    fn test_zero_radius_carrier_rejected() {
        let cyl = Cylinder::new(Point3::origin(), Vector3::z(), Vector3::x(), 1.0).unwrap();
        let mut value = serde_json::to_value(ContinuousSurface::new("cyl", Carrier::Cylinder(cyl)).dump1()).unwrap();
        value["face"]["radius"] = json!(0.0);
        assert!(ContinuousSurface::from_json(&value.to_string(), None).is_err());
    }

    #[test]
    fn test_reference_resolves_through_library() {
        let cyl = Cylinder::new(Point3::origin(), Vector3::z(), Vector3::x(), 1.0).unwrap();
        let shared = ContinuousSurface::new("shared", Carrier::Cylinder(cyl));
        let mut library = SurfaceLibrary::new();
        library.insert(&shared);

        let dump = SurfaceDump::Continuous {
            id: "outer".to_string(),
            face: CarrierData::from(&Carrier::Cylinder(cyl)),
            all_face: vec![FaceDump::Known(SurfaceDump::Reference { id: "shared".to_string() })],
        };
        let loaded = ContinuousSurface::load1_with(&dump, Some(&library)).unwrap();
        match &loaded.get_all_face()[0] {
            SurfaceFace::Continuous(c) => assert_eq!(c.id(), "shared"),
            other => panic!("unexpected face {:?}", other),
        }

        let unresolved = ContinuousSurface::load1(&dump).unwrap();
        assert!(matches!(unresolved.get_all_face()[0], SurfaceFace::Opaque(_)));
    }

    #[test]
    fn test_self_reference_is_cyclic() {
        let carrier = CarrierData::from(&Carrier::Plane(Plane::xy()));
        let dump = SurfaceDump::Continuous {
            id: "loop".to_string(),
            face: carrier,
            all_face: vec![FaceDump::Known(SurfaceDump::Reference { id: "loop".to_string() })],
        };
        let mut library = SurfaceLibrary::new();
        library.insert_dump("loop", dump.clone());
        assert!(matches!(
            ContinuousSurface::load1_with(&dump, Some(&library)),
            Err(Error::CyclicSurface(id)) if id == "loop"
        ));
    }

    #[test]
    fn test_indirect_cycle_detected() {
        let carrier = CarrierData::from(&Carrier::Plane(Plane::xy()));
        let a = SurfaceDump::Continuous {
            id: "a".to_string(),
            face: carrier,
            all_face: vec![FaceDump::Known(SurfaceDump::Reference { id: "b".to_string() })],
        };
        let b = SurfaceDump::Continuous {
            id: "b".to_string(),
            face: carrier,
            all_face: vec![FaceDump::Known(SurfaceDump::Reference { id: "a".to_string() })],
        };
        let mut library = SurfaceLibrary::new();
        library.insert_dump("a", a.clone());
        library.insert_dump("b", b);
        assert!(ContinuousSurface::load1_with(&a, Some(&library)).is_err());
    }
}
