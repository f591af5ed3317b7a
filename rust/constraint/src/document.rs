// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Arena-based storage for states and constraints.
//!
//! The [`ConstraintDocument`] owns every state and constraint in slot maps
//! with stable, generational keys. Reverse indices record which constraints
//! read and write each state, so changing a state can mark exactly its
//! readers dirty. Recompute drains the dirty queue in FIFO order.

use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::SlotMap;

use crate::constraint::{ComputeScope, Constraint, RefreshContext};
use crate::error::{Error, Result};
use crate::keys::{ConstraintKey, StateKey};
use crate::state::{State, StateValue};

/// Evaluations allowed per constraint in one `recompute_dirty` call.
const RECOMPUTE_BUDGET_PER_CONSTRAINT: usize = 32;

/// The central arena that owns states, constraints and their indices.
///
/// # Example
///
/// ```
/// use plankit_constraint::{ConstraintCore, ConstraintDocument, Equal, State};
///
/// let mut doc = ConstraintDocument::new();
/// let a = doc.add_state(State::new("a", 2.0)).unwrap();
/// let b = doc.add_state(State::new("b", 0.0)).unwrap();
/// let core = ConstraintCore::new("c", "copy").with_inputs(&["a"]).with_outputs(&["b"]);
/// doc.add_constraint(Box::new(Equal::new(core))).unwrap();
/// doc.recompute_dirty().unwrap();
/// assert_eq!(doc.state(b).unwrap().value, doc.state(a).unwrap().value);
/// ```
#[derive(Debug, Default)]
pub struct ConstraintDocument {
    pub(crate) states: SlotMap<StateKey, State>,
    pub(crate) constraints: SlotMap<ConstraintKey, Box<dyn Constraint>>,

    // Id lookup
    pub(crate) state_ids: FxHashMap<String, StateKey>,
    pub(crate) constraint_ids: FxHashMap<String, ConstraintKey>,

    // Reverse adjacency: state → constraints
    pub(crate) readers: FxHashMap<StateKey, FxHashSet<ConstraintKey>>,
    pub(crate) writers: FxHashMap<StateKey, FxHashSet<ConstraintKey>>,

    dirty: VecDeque<ConstraintKey>,
    dirty_set: FxHashSet<ConstraintKey>,
}

impl ConstraintDocument {
    pub fn new() -> Self {
        Self::default()
    }

    // --- State operations ---

    /// Adds a state and resolves constraint references waiting for its id.
    pub fn add_state(&mut self, state: State) -> Result<StateKey> {
        if self.state_ids.contains_key(&state.id) {
            return Err(Error::DuplicateId(state.id));
        }
        let id = state.id.clone();
        let key = self.states.insert(state);
        self.state_ids.insert(id.clone(), key);
        self.resolve_pending(&id, key);
        Ok(key)
    }

    pub fn state(&self, key: StateKey) -> Option<&State> {
        self.states.get(key)
    }

    pub fn state_by_id(&self, id: &str) -> Option<StateKey> {
        self.state_ids.get(id).copied()
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Replaces a state's value and marks its readers dirty.
    pub fn set_state_value(&mut self, key: StateKey, value: impl Into<StateValue>) -> Result<()> {
        let state = self.states.get_mut(key).ok_or(Error::StateNotFound(key))?;
        let value = value.into();
        if state.value == value {
            return Ok(());
        }
        state.value = value;
        self.mark_readers_dirty(key);
        Ok(())
    }

    /// Removes a state. References to it stay in place but no longer resolve,
    /// so the constraints using it fail `verify_before_dump`.
    pub fn remove_state(&mut self, key: StateKey) -> Option<State> {
        let state = self.states.remove(key)?;
        self.state_ids.remove(&state.id);
        self.readers.remove(&key);
        self.writers.remove(&key);
        Some(state)
    }

    // --- Constraint operations ---

    /// Adds a constraint, resolving its references by id, and queues it for
    /// recompute.
    pub fn add_constraint(&mut self, mut constraint: Box<dyn Constraint>) -> Result<ConstraintKey> {
        if !constraint.verify() {
            return Err(Error::VerifyFailed(constraint.id().to_string()));
        }
        if self.constraint_ids.contains_key(constraint.id()) {
            return Err(Error::DuplicateId(constraint.id().to_string()));
        }
        self.resolve_refs(constraint.as_mut());
        let id = constraint.id().to_string();
        let key = self.constraints.insert(constraint);
        self.constraint_ids.insert(id, key);
        self.link(key);
        self.mark_dirty(key);
        Ok(key)
    }

    pub fn constraint(&self, key: ConstraintKey) -> Option<&dyn Constraint> {
        self.constraints.get(key).map(|c| c.as_ref())
    }

    pub fn constraint_by_id(&self, id: &str) -> Option<ConstraintKey> {
        self.constraint_ids.get(id).copied()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Removes a constraint and detaches it from every state index.
    pub fn destroy_constraint(&mut self, key: ConstraintKey) -> bool {
        self.unlink(key);
        let Some(mut constraint) = self.constraints.remove(key) else {
            return false;
        };
        constraint.on_destroy();
        self.constraint_ids.remove(constraint.id());
        self.dirty_set.remove(&key);
        tracing::debug!(constraint = %constraint.id(), "constraint destroyed");
        true
    }

    /// `verify()` holds and every reference resolves to a live state.
    pub fn verify_before_dump(&self, key: ConstraintKey) -> bool {
        let Some(constraint) = self.constraints.get(key) else {
            return false;
        };
        let core = constraint.core();
        constraint.verify()
            && core
                .inputs
                .iter()
                .chain(&core.outputs)
                .all(|r| r.key.is_some_and(|k| self.states.contains_key(k)))
    }

    pub fn readers_of(&self, state: StateKey) -> impl Iterator<Item = ConstraintKey> + '_ {
        self.readers.get(&state).into_iter().flatten().copied()
    }

    pub fn writers_of(&self, state: StateKey) -> impl Iterator<Item = ConstraintKey> + '_ {
        self.writers.get(&state).into_iter().flatten().copied()
    }

    // --- Propagation ---

    pub fn is_dirty(&self, key: ConstraintKey) -> bool {
        self.dirty_set.contains(&key)
    }

    pub fn mark_dirty(&mut self, key: ConstraintKey) {
        if self.dirty_set.insert(key) {
            self.dirty.push_back(key);
        }
    }

    /// Computes dirty constraints until none remain. Outputs that change mark
    /// their readers dirty in turn. Returns the number of evaluations.
    ///
    /// A constraint whose compute fails keeps its outputs unchanged; the
    /// failure is logged and propagation continues.
    pub fn recompute_dirty(&mut self) -> Result<usize> {
        let limit = RECOMPUTE_BUDGET_PER_CONSTRAINT * self.constraints.len().max(1);
        let mut evaluations = 0;

        while let Some(key) = self.dirty.pop_front() {
            if !self.dirty_set.remove(&key) {
                continue;
            }
            if evaluations >= limit {
                self.mark_dirty(key);
                tracing::warn!(limit, "constraint recompute did not settle");
                return Err(Error::RecomputeLimit(limit));
            }
            evaluations += 1;

            let Some(writes) = self.evaluate(key) else {
                continue;
            };
            for (state_key, value) in writes {
                let Some(state) = self.states.get_mut(state_key) else {
                    continue;
                };
                if state.value != value {
                    state.value = value;
                    self.mark_readers_dirty(state_key);
                }
            }
        }

        tracing::debug!(evaluations, "constraint recompute settled");
        Ok(evaluations)
    }

    /// Runs one compute and returns the buffered writes paired with their
    /// target states. Unresolved outputs are dropped.
    fn evaluate(&self, key: ConstraintKey) -> Option<Vec<(StateKey, StateValue)>> {
        let constraint = self.constraints.get(key)?;
        let core = constraint.core();
        let inputs = core
            .inputs
            .iter()
            .map(|r| r.key.and_then(|k| self.states.get(k)).map(|s| &s.value))
            .collect();
        let mut scope = ComputeScope::new(&core.id, inputs, core.outputs.len());
        if let Err(e) = constraint.compute(&mut scope) {
            tracing::warn!(constraint = %core.id, error = %e, "constraint compute failed");
            return None;
        }
        Some(
            core.outputs
                .iter()
                .zip(scope.into_writes())
                .filter_map(|(r, w)| Some((r.key?, w?)))
                .collect(),
        )
    }

    /// Lets every constraint pick up document settings. Constraints that
    /// report a change are marked dirty; returns how many did.
    pub fn refresh_all(&mut self, ctx: &RefreshContext) -> usize {
        let changed: Vec<ConstraintKey> = self
            .constraints
            .iter_mut()
            .filter_map(|(key, c)| c.refresh(ctx).then_some(key))
            .collect();
        for &key in &changed {
            self.mark_dirty(key);
        }
        changed.len()
    }

    // --- Index helpers ---

    fn mark_readers_dirty(&mut self, state: StateKey) {
        let readers: Vec<ConstraintKey> = self.readers_of(state).collect();
        for key in readers {
            self.mark_dirty(key);
        }
    }

    /// Resolves every reference of `constraint` against the current states.
    pub(crate) fn resolve_refs(&self, constraint: &mut dyn Constraint) {
        let core = constraint.core_mut();
        for r in core.inputs.iter_mut().chain(core.outputs.iter_mut()) {
            r.key = self.state_ids.get(&r.id).copied();
            if r.key.is_none() {
                tracing::warn!(constraint = %core.id, state = %r.id, "state reference does not resolve");
            }
        }
    }

    /// Fills in references that were waiting for state `id`.
    fn resolve_pending(&mut self, id: &str, state: StateKey) {
        let mut touched = Vec::new();
        for (key, constraint) in self.constraints.iter_mut() {
            let core = constraint.core_mut();
            let mut hit = false;
            for r in core.inputs.iter_mut().chain(core.outputs.iter_mut()) {
                if r.key.is_none() && r.id == id {
                    r.key = Some(state);
                    hit = true;
                }
            }
            if hit {
                touched.push(key);
            }
        }
        for key in touched {
            self.link(key);
            self.mark_dirty(key);
        }
    }

    /// Registers the constraint in the reader/writer index of each state it references.
    pub(crate) fn link(&mut self, key: ConstraintKey) {
        let Some(constraint) = self.constraints.get(key) else {
            return;
        };
        let core = constraint.core();
        for k in core.inputs.iter().filter_map(|r| r.key) {
            self.readers.entry(k).or_default().insert(key);
        }
        for k in core.outputs.iter().filter_map(|r| r.key) {
            self.writers.entry(k).or_default().insert(key);
        }
    }

    /// Removes the constraint from every state index.
    pub(crate) fn unlink(&mut self, key: ConstraintKey) {
        for set in self.readers.values_mut().chain(self.writers.values_mut()) {
            set.remove(&key);
        }
        self.readers.retain(|_, set| !set.is_empty());
        self.writers.retain(|_, set| !set.is_empty());
    }
}
