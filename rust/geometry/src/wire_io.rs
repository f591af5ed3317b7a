// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wire dump records and restore with id remapping.

use crate::curve::{Curve2d, CurveData};
use crate::error::{Error, Result};
use crate::wire::{Wire, WireCurve};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Id service used while restoring pasted or duplicated content.
pub trait IdRemap {
    /// Returns the id that replaces `old_id`, allocating one on first use.
    fn generate(&mut self, old_id: &str) -> String;
    /// Returns the replacement for `old_id` if one was already generated.
    fn get_new_id(&self, old_id: &str) -> Option<String>;
}

/// Remapper that appends a counter suffix to every id it sees.
#[derive(Debug, Default)]
pub struct SuffixIdRemap {
    suffix: String,
    counter: u64,
    map: FxHashMap<String, String>,
}

impl SuffixIdRemap {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
            ..Self::default()
        }
    }
}

impl IdRemap for SuffixIdRemap {
    fn generate(&mut self, old_id: &str) -> String {
        if let Some(id) = self.map.get(old_id) {
            return id.clone();
        }
        self.counter += 1;
        let id = format!("{}{}{}", old_id, self.suffix, self.counter);
        self.map.insert(old_id.to_string(), id.clone());
        id
    }

    fn get_new_id(&self, old_id: &str) -> Option<String> {
        self.map.get(old_id).cloned()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRecord {
    pub l: String,
    pub id: String,
    pub curves: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub reverse_flags: BTreeMap<String, bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveRecord {
    pub id: String,
    #[serde(flatten)]
    pub data: CurveData,
}

/// One element of a wire dump. The wire record comes first, followed by
/// the records of its curves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireDumpRecord {
    Wire(WireRecord),
    Curve(CurveRecord),
}

pub const WIRE_TAG: &str = "Wire";

impl Wire {
    pub fn dump(&self) -> Vec<WireDumpRecord> {
        let mut reverse_flags = BTreeMap::new();
        let mut curve_records = Vec::with_capacity(self.len());
        for ((curve, reversed), id) in self.oriented_curves().zip(self.curve_ids()) {
            if reversed {
                reverse_flags.insert(id.to_string(), true);
            }
            curve_records.push(WireDumpRecord::Curve(CurveRecord {
                id: id.to_string(),
                data: CurveData::from(curve),
            }));
        }

        let mut out = Vec::with_capacity(curve_records.len() + 1);
        out.push(WireDumpRecord::Wire(WireRecord {
            l: WIRE_TAG.to_string(),
            id: self.id().to_string(),
            curves: self.curve_ids().map(str::to_string).collect(),
            reverse_flags,
        }));
        out.extend(curve_records);
        out
    }

    /// Rebuilds a wire from [`Wire::dump`] output.
    ///
    /// With a remapper, the wire and curve ids are replaced through
    /// `generate` and reverse flags are carried over to the new ids. The
    /// loaded flags are then checked against geometry with `fix_reverse`; a
    /// chain that cannot be oriented keeps its stored flags.
    pub fn load(records: &[WireDumpRecord], mut remap: Option<&mut dyn IdRemap>) -> Result<Wire> {
        let record = records
            .iter()
            .find_map(|r| match r {
                WireDumpRecord::Wire(w) => Some(w),
                WireDumpRecord::Curve(_) => None,
            })
            .ok_or_else(|| Error::Serialization("wire dump has no wire record".to_string()))?;

        let by_id: FxHashMap<&str, &CurveData> = records
            .iter()
            .filter_map(|r| match r {
                WireDumpRecord::Curve(c) => Some((c.id.as_str(), &c.data)),
                WireDumpRecord::Wire(_) => None,
            })
            .collect();

        let wire_id = match remap.as_deref_mut() {
            Some(r) => r.generate(&record.id),
            None => record.id.clone(),
        };

        let mut curves = Vec::with_capacity(record.curves.len());
        for old_id in &record.curves {
            let data = by_id
                .get(old_id.as_str())
                .ok_or_else(|| Error::CurveNotFound(old_id.clone()))?;
            let id = match remap.as_deref_mut() {
                Some(r) => r.generate(old_id),
                None => old_id.clone(),
            };
            curves.push(WireCurve::new(id, Curve2d::from(*data)));
        }

        let mut wire = Wire::create(wire_id, curves);
        for (old_id, reversed) in &record.reverse_flags {
            let id = match remap.as_deref() {
                Some(r) => r.get_new_id(old_id).unwrap_or_else(|| old_id.clone()),
                None => old_id.clone(),
            };
            if !wire.set_reverse(&id, *reversed) {
                tracing::warn!(wire = %wire.id(), curve = %id, "reverse flag for unknown curve dropped");
            }
        }

        if wire.len() > 1 {
            if let Err(e) = wire.fix_reverse() {
                tracing::warn!(wire = %wire.id(), error = %e, "loaded wire is not continuous");
            }
        }
        wire.drain_events();
        Ok(wire)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.dump())?)
    }

    pub fn from_json(json: &str, remap: Option<&mut dyn IdRemap>) -> Result<Wire> {
        let records: Vec<WireDumpRecord> = serde_json::from_str(json)?;
        Wire::load(&records, remap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::Arc2d;
    use nalgebra::Point2;
    use std::f64::consts::PI;

    fn half_disc() -> Wire {
        let mut wire = Wire::create(
            "w1",
            vec![
                WireCurve::new("arc", Arc2d::new(Point2::origin(), 1.0, PI, -PI)),
                WireCurve::new("dia", Curve2d::line(Point2::new(-1.0, 0.0), Point2::new(1.0, 0.0))),
            ],
        );
        wire.fix_reverse().unwrap();
        wire
    }

    #[test]
    fn test_dump_layout() {
        let wire = half_disc();
        let dump = wire.dump();
        assert_eq!(dump.len(), 3);
        match &dump[0] {
            WireDumpRecord::Wire(w) => {
                assert_eq!(w.l, "Wire");
                assert_eq!(w.curves, vec!["arc".to_string(), "dia".to_string()]);
                assert!(w.reverse_flags.get("dia").copied().unwrap_or(false));
            }
            other => panic!("expected wire record first, got {:?}", other),
        }
    }

    #[test]
    fn test_no_reverse_flags_key_when_unreversed() {
        let wire = Wire::from_curves(
            "w",
            vec![
                Curve2d::line(Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)),
                Curve2d::line(Point2::new(1.0, 0.0), Point2::new(1.0, 1.0)),
            ],
        );
        let json = wire.to_json().unwrap();
        assert!(!json.contains("reverseFlags"));
    }

    #[test]
    fn test_dump_load_idempotent() {
        let wire = half_disc();
        let json = wire.to_json().unwrap();
        let loaded = Wire::from_json(&json, None).unwrap();
        assert_eq!(loaded.dump(), wire.dump());
        assert!(loaded.verify());
    }

    #[test]
    fn test_load_with_remap_moves_flags() {
        let wire = half_disc();
        let mut remap = SuffixIdRemap::new("#");
        let loaded = Wire::load(&wire.dump(), Some(&mut remap)).unwrap();
        assert_ne!(loaded.id(), "w1");
        let new_dia = remap.get_new_id("dia").unwrap();
        assert!(loaded.is_reversed_curve(&new_dia));
        assert!(loaded.verify());
    }

    #[test]
    fn test_load_missing_curve_record() {
        let wire = half_disc();
        let mut dump = wire.dump();
        dump.pop();
        assert!(matches!(Wire::load(&dump, None), Err(Error::CurveNotFound(_))));
    }
}
