// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Dump records and restore with id remapping.
//!
//! A constraint dumps as `{l, id, localId, type, inputs, outputs, data?}` where
//! inputs and outputs are state ids. Restoring pasted or duplicated content
//! runs ids through a [`ConstraintIdGenerator`]; loading the same dump twice
//! through the same generator finds the instance created the first time.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::constraint::{Constraint, ConstraintCore};
use crate::document::ConstraintDocument;
use crate::error::{Error, Result};
use crate::keys::{ConstraintKey, StateKey};
use crate::registry::ConstraintRegistry;
use crate::state::{StateRecord, StateRef};

pub const CONSTRAINT_TAG: &str = "Constraint";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintDumpData {
    pub l: String,
    pub id: String,
    pub local_id: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Id service used while restoring.
pub trait ConstraintIdGenerator {
    /// Returns the id that replaces `old_id`, allocating one on first use.
    fn generate(&mut self, old_id: &str) -> String;
    /// Returns the replacement for `old_id` if one was already generated.
    fn get_new_id(&self, old_id: &str) -> Option<String>;
}

/// Generator that appends `#n` to each id it sees.
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    next: u64,
    map: FxHashMap<String, String>,
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConstraintIdGenerator for SequentialIdGenerator {
    fn generate(&mut self, old_id: &str) -> String {
        if let Some(id) = self.map.get(old_id) {
            return id.clone();
        }
        self.next += 1;
        let id = format!("{}#{}", old_id, self.next);
        self.map.insert(old_id.to_string(), id.clone());
        id
    }

    fn get_new_id(&self, old_id: &str) -> Option<String> {
        self.map.get(old_id).cloned()
    }
}

#[derive(Debug, Default)]
pub struct DumpOptions {
    /// When set, every dumped constraint is also recorded here by id.
    pub constraints_data: Option<FxHashMap<String, ConstraintDumpData>>,
}

impl DumpOptions {
    pub fn memoizing() -> Self {
        Self {
            constraints_data: Some(FxHashMap::default()),
        }
    }
}

#[derive(Default)]
pub struct LoadOptions<'a> {
    /// Remap constraint and state ids through `id_generator`.
    pub during_restore: bool,
    pub id_generator: Option<&'a mut dyn ConstraintIdGenerator>,
    /// Dumps available to [`ConstraintDocument::load_from_dump_by_id`].
    pub constraints_data: FxHashMap<String, ConstraintDumpData>,
}

impl<'a> LoadOptions<'a> {
    pub fn restoring(generator: &'a mut dyn ConstraintIdGenerator) -> Self {
        Self {
            during_restore: true,
            id_generator: Some(generator),
            constraints_data: FxHashMap::default(),
        }
    }

    pub fn with_constraints_data(mut self, data: impl IntoIterator<Item = ConstraintDumpData>) -> Self {
        self.constraints_data
            .extend(data.into_iter().map(|d| (d.id.clone(), d)));
        self
    }

    /// Id an entity dumped as `old_id` gets in this load.
    fn own_id(&mut self, old_id: &str) -> String {
        match (self.during_restore, self.id_generator.as_deref_mut()) {
            (true, Some(generator)) => generator.generate(old_id),
            _ => old_id.to_string(),
        }
    }

    /// Id a reference to `old_id` points at after remapping, if any was generated.
    fn referenced_id(&self, old_id: &str) -> String {
        self.id_generator
            .as_deref()
            .and_then(|g| g.get_new_id(old_id))
            .unwrap_or_else(|| old_id.to_string())
    }

    /// Id of the instance an earlier load of `old_id` produced. While
    /// restoring, nothing exists until the generator has mapped the id.
    fn existing_id(&self, old_id: &str) -> Option<String> {
        match (self.during_restore, self.id_generator.as_deref()) {
            (true, Some(generator)) => generator.get_new_id(old_id),
            _ => Some(old_id.to_string()),
        }
    }
}

/// Serializable representation of a whole document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    pub states: Vec<StateRecord>,
    pub constraints: Vec<ConstraintDumpData>,
}

impl ConstraintDocument {
    /// Instantiates the class named by `data.type` and loads it, unless an
    /// instance with the remapped id already exists, in which case that one
    /// is returned. Unknown classes give `None`.
    pub fn create_from_dump(
        &mut self,
        registry: &ConstraintRegistry,
        data: &ConstraintDumpData,
        options: &mut LoadOptions<'_>,
    ) -> Option<ConstraintKey> {
        if let Some(key) = self.get_existing_constraint(&data.id, options) {
            return Some(key);
        }
        let Some(constraint) = registry.create(&data.type_name) else {
            tracing::warn!(constraint = %data.id, class = %data.type_name, "unknown constraint class");
            return None;
        };
        let key = self.constraints.insert(constraint);
        match self.load(key, data, options) {
            Ok(()) => Some(key),
            Err(e) => {
                tracing::warn!(constraint = %data.id, error = %e, "constraint dump rejected");
                self.constraints.remove(key);
                None
            }
        }
    }

    /// Writes the constraint's dump record. Constraints that fail
    /// `verify_before_dump` are not written. With a memo in `options`, a
    /// constraint already dumped returns its memoized record.
    pub fn dump_constraint(&self, key: ConstraintKey, options: &mut DumpOptions) -> Result<Vec<ConstraintDumpData>> {
        let constraint = self
            .constraints
            .get(key)
            .ok_or(Error::ConstraintNotFound(key))?;
        if let Some(data) = options
            .constraints_data
            .as_ref()
            .and_then(|memo| memo.get(constraint.id()))
        {
            return Ok(vec![data.clone()]);
        }
        if !self.verify_before_dump(key) {
            tracing::error!(constraint = %constraint.id(), "constraint failed verification before dump");
            return Err(Error::VerifyFailed(constraint.id().to_string()));
        }
        let core = constraint.core();
        let data = ConstraintDumpData {
            l: CONSTRAINT_TAG.to_string(),
            id: core.id.clone(),
            local_id: core.local_id.clone(),
            type_name: constraint.class_name().to_string(),
            inputs: core.inputs.iter().map(|r| r.id.clone()).collect(),
            outputs: core.outputs.iter().map(|r| r.id.clone()).collect(),
            data: constraint.dump_extra(),
        };
        if let Some(memo) = options.constraints_data.as_mut() {
            memo.insert(data.id.clone(), data.clone());
        }
        Ok(vec![data])
    }

    /// Loads `data` into the constraint at `key`, replacing its identity,
    /// references and kind-specific payload, and queues it for recompute.
    /// A record without `id` or `localId` is refused and leaves the
    /// constraint as it was.
    pub fn load(&mut self, key: ConstraintKey, data: &ConstraintDumpData, options: &mut LoadOptions<'_>) -> Result<()> {
        if !self.constraints.contains_key(key) {
            return Err(Error::ConstraintNotFound(key));
        }
        let id = options.own_id(&data.id);
        if self.constraint_ids.get(&id).is_some_and(|k| *k != key) {
            return Err(Error::DuplicateId(id));
        }
        let incoming = ConstraintCore {
            id: id.clone(),
            local_id: data.local_id.clone(),
            inputs: self.resolve_ids(&id, &data.inputs, options),
            outputs: self.resolve_ids(&id, &data.outputs, options),
        };
        if !incoming.verify() {
            tracing::warn!(constraint = %id, local_id = %data.local_id, "constraint record has an empty id");
            return Err(Error::VerifyFailed(id));
        }

        let constraint = self
            .constraints
            .get_mut(key)
            .ok_or(Error::ConstraintNotFound(key))?;
        constraint.load_extra(data.data.as_ref())?;
        let old_id = std::mem::replace(constraint.core_mut(), incoming).id;

        if self.constraint_ids.get(&old_id) == Some(&key) {
            self.constraint_ids.remove(&old_id);
        }
        self.constraint_ids.insert(id, key);
        self.unlink(key);
        self.link(key);
        self.mark_dirty(key);
        Ok(())
    }

    fn resolve_ids(&self, owner: &str, ids: &[String], options: &LoadOptions<'_>) -> Vec<StateRef> {
        ids.iter()
            .map(|old| {
                let id = options.referenced_id(old);
                let key = self.state_by_id(&id);
                if key.is_none() {
                    tracing::warn!(constraint = %owner, state = %id, "state reference does not resolve");
                }
                StateRef { id, key }
            })
            .collect()
    }

    /// Reuses the instance already loaded for `data.id`, reloading it only
    /// when `reload` is set; otherwise creates it.
    pub fn load_from_dump(
        &mut self,
        registry: &ConstraintRegistry,
        data: &ConstraintDumpData,
        options: &mut LoadOptions<'_>,
        reload: bool,
    ) -> Option<ConstraintKey> {
        match self.get_existing_constraint(&data.id, options) {
            Some(key) => {
                if reload {
                    if let Err(e) = self.load(key, data, options) {
                        tracing::warn!(constraint = %data.id, error = %e, "constraint reload failed");
                    }
                }
                Some(key)
            }
            None => self.create_from_dump(registry, data, options),
        }
    }

    /// Loads the constraint dumped as `id`, looking its record up in
    /// `options.constraints_data` when no instance exists yet.
    pub fn load_from_dump_by_id(
        &mut self,
        registry: &ConstraintRegistry,
        id: &str,
        options: &mut LoadOptions<'_>,
    ) -> Option<ConstraintKey> {
        if let Some(key) = self.get_existing_constraint(id, options) {
            return Some(key);
        }
        let Some(data) = options.constraints_data.get(id).cloned() else {
            tracing::warn!(constraint = %id, "no dump data for constraint");
            return None;
        };
        self.create_from_dump(registry, &data, options)
    }

    /// The in-memory instance a dump of `id` maps to under `options`.
    pub fn get_existing_constraint(&self, id: &str, options: &LoadOptions<'_>) -> Option<ConstraintKey> {
        options
            .existing_id(id)
            .and_then(|id| self.constraint_by_id(&id))
    }

    pub fn dump_state(&self, key: StateKey) -> Result<StateRecord> {
        self.states
            .get(key)
            .map(StateRecord::from)
            .ok_or(Error::StateNotFound(key))
    }

    /// Loads a state under its remapped id. An existing state with that id
    /// is updated in place.
    pub fn load_state(&mut self, record: &StateRecord, options: &mut LoadOptions<'_>) -> Result<StateKey> {
        let id = options.own_id(&record.id);
        let loaded = record.to_state(id.clone());
        match self.state_by_id(&id) {
            Some(key) => {
                if let Some(state) = self.states.get_mut(key) {
                    state.local_id = loaded.local_id;
                    state.name = loaded.name;
                    state.is_editable = loaded.is_editable;
                }
                self.set_state_value(key, loaded.value)?;
                Ok(key)
            }
            None => self.add_state(loaded),
        }
    }

    /// Dumps every state and every constraint that passes verification.
    pub fn to_snapshot(&self) -> DocumentSnapshot {
        let states = self.states.values().map(StateRecord::from).collect();
        let mut options = DumpOptions::default();
        let constraints = self
            .constraints
            .keys()
            .filter_map(|key| self.dump_constraint(key, &mut options).ok())
            .flatten()
            .collect();
        DocumentSnapshot { states, constraints }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.to_snapshot()).map_err(|e| Error::Serialization(e.to_string()))
    }

    pub fn from_snapshot(snapshot: &DocumentSnapshot, registry: &ConstraintRegistry) -> Result<Self> {
        let mut doc = ConstraintDocument::new();
        let mut options = LoadOptions::default();
        for record in &snapshot.states {
            doc.load_state(record, &mut options)?;
        }
        for data in &snapshot.constraints {
            doc.create_from_dump(registry, data, &mut options);
        }
        Ok(doc)
    }

    pub fn from_json(json: &str, registry: &ConstraintRegistry) -> Result<Self> {
        let snapshot: DocumentSnapshot =
            serde_json::from_str(json).map_err(|e| Error::Serialization(e.to_string()))?;
        Self::from_snapshot(&snapshot, registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::{Equal, Linear};
    use crate::state::State;

    fn sample() -> (ConstraintDocument, ConstraintKey) {
        let mut doc = ConstraintDocument::new();
        doc.add_state(State::new("w", 3.0)).unwrap();
        doc.add_state(State::new("h", 0.0)).unwrap();
        let core = ConstraintCore::new("lin", "height").with_inputs(&["w"]).with_outputs(&["h"]);
        let key = doc.add_constraint(Box::new(Linear::new(core, 0.5, 1.0))).unwrap();
        (doc, key)
    }

    #[test]
    fn dump_shape() {
        let (doc, key) = sample();
        let dumped = doc.dump_constraint(key, &mut DumpOptions::default()).unwrap();
        assert_eq!(dumped.len(), 1);
        let json = serde_json::to_value(&dumped[0]).unwrap();
        assert_eq!(json["l"], "Constraint");
        assert_eq!(json["localId"], "height");
        assert_eq!(json["type"], Linear::CLASS_NAME);
        assert_eq!(json["inputs"], serde_json::json!(["w"]));
        assert_eq!(json["data"]["scale"], 0.5);
    }

    #[test]
    fn dump_memoizes_by_id() {
        let (doc, key) = sample();
        let mut options = DumpOptions::memoizing();
        let first = doc.dump_constraint(key, &mut options).unwrap();
        let memo = options.constraints_data.as_mut().unwrap();
        assert_eq!(memo.get("lin"), Some(&first[0]));

        // A second dump hands back the memoized record without rebuilding it
        memo.get_mut("lin").unwrap().local_id = "memoized".to_string();
        let second = doc.dump_constraint(key, &mut options).unwrap();
        assert_eq!(second[0].local_id, "memoized");
        assert_eq!(doc.dump_constraint(key, &mut DumpOptions::default()).unwrap()[0].local_id, "height");
    }

    #[test]
    fn record_without_local_id_is_refused() {
        let (mut doc, key) = sample();
        let registry = ConstraintRegistry::with_builtins();
        let mut data = doc.dump_constraint(key, &mut DumpOptions::default()).unwrap().remove(0);
        data.id = "blank".to_string();
        data.local_id = String::new();
        assert!(doc
            .create_from_dump(&registry, &data, &mut LoadOptions::default())
            .is_none());
        assert_eq!(doc.constraint_count(), 1);

        // Reloading the live constraint with the bad record keeps its identity
        data.id = "lin".to_string();
        assert!(matches!(
            doc.load(key, &data, &mut LoadOptions::default()),
            Err(Error::VerifyFailed(id)) if id == "lin"
        ));
        assert_eq!(doc.constraint(key).unwrap().core().local_id, "height");
        assert!(doc.verify_before_dump(key));
    }

    #[test]
    fn dangling_reference_blocks_dump() {
        let (mut doc, key) = sample();
        let h = doc.state_by_id("h").unwrap();
        doc.remove_state(h);
        assert!(matches!(
            doc.dump_constraint(key, &mut DumpOptions::default()),
            Err(Error::VerifyFailed(id)) if id == "lin"
        ));
    }

    #[test]
    fn unknown_class_gives_none() {
        let (mut doc, key) = sample();
        let mut data = doc.dump_constraint(key, &mut DumpOptions::default()).unwrap().remove(0);
        data.type_name = "X.Unknown".to_string();
        data.id = "other".to_string();
        let registry = ConstraintRegistry::with_builtins();
        assert!(doc
            .create_from_dump(&registry, &data, &mut LoadOptions::default())
            .is_none());
        assert_eq!(doc.constraint_count(), 1);
    }

    #[test]
    fn restore_remaps_ids_and_is_idempotent() {
        let (mut doc, key) = sample();
        let registry = ConstraintRegistry::with_builtins();
        let data = doc.dump_constraint(key, &mut DumpOptions::default()).unwrap().remove(0);
        let w = doc.dump_state(doc.state_by_id("w").unwrap()).unwrap();
        let h = doc.dump_state(doc.state_by_id("h").unwrap()).unwrap();

        let mut generator = SequentialIdGenerator::new();
        let mut options = LoadOptions::restoring(&mut generator);
        doc.load_state(&w, &mut options).unwrap();
        doc.load_state(&h, &mut options).unwrap();
        let copy = doc.create_from_dump(&registry, &data, &mut options).unwrap();
        assert_ne!(copy, key);

        let c = doc.constraint(copy).unwrap();
        assert_eq!(c.id(), "lin#3");
        assert_eq!(c.core().inputs[0].id, "w#1");
        assert_eq!(c.core().outputs[0].id, "h#2");
        assert!(doc.verify_before_dump(copy));

        let again = doc.create_from_dump(&registry, &data, &mut options).unwrap();
        assert_eq!(again, copy);
        assert_eq!(
            doc.load_from_dump_by_id(&registry, "lin", &mut options),
            Some(copy)
        );
        assert_eq!(doc.constraint_count(), 2);
    }

    #[test]
    fn reload_applies_new_payload() {
        let (mut doc, key) = sample();
        let registry = ConstraintRegistry::with_builtins();
        let mut data = doc.dump_constraint(key, &mut DumpOptions::default()).unwrap().remove(0);
        data.data = Some(serde_json::json!({"scale": 4.0, "offset": 0.0}));
        let mut options = LoadOptions::default();

        assert_eq!(doc.load_from_dump(&registry, &data, &mut options, false), Some(key));
        assert_ne!(
            doc.dump_constraint(key, &mut DumpOptions::default()).unwrap()[0].data,
            data.data
        );
        assert_eq!(doc.load_from_dump(&registry, &data, &mut options, true), Some(key));
        assert_eq!(
            doc.dump_constraint(key, &mut DumpOptions::default()).unwrap()[0].data,
            data.data
        );
    }

    #[test]
    fn load_by_id_uses_constraints_data() {
        let (doc, key) = sample();
        let data = doc.dump_constraint(key, &mut DumpOptions::default()).unwrap().remove(0);
        let registry = ConstraintRegistry::with_builtins();

        let mut fresh = ConstraintDocument::new();
        fresh.add_state(State::new("w", 1.0)).unwrap();
        fresh.add_state(State::new("h", 0.0)).unwrap();
        let mut options = LoadOptions::default().with_constraints_data([data]);
        let loaded = fresh.load_from_dump_by_id(&registry, "lin", &mut options).unwrap();
        assert!(fresh.verify_before_dump(loaded));
        assert!(fresh.load_from_dump_by_id(&registry, "missing", &mut options).is_none());
    }

    #[test]
    fn snapshot_roundtrip() {
        let (mut doc, _) = sample();
        let core = ConstraintCore::new("eq", "mirror").with_inputs(&["h"]).with_outputs(&["w"]);
        doc.add_constraint(Box::new(Equal::new(core))).unwrap();
        let registry = ConstraintRegistry::with_builtins();

        let json = doc.to_json().unwrap();
        let restored = ConstraintDocument::from_json(&json, &registry).unwrap();
        assert_eq!(restored.state_count(), 2);
        assert_eq!(restored.constraint_count(), 2);
        assert_eq!(restored.to_json().unwrap(), json);
    }
}
