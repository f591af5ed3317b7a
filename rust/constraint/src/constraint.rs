// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Constraint nodes and the scope they compute in.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::state::{StateRef, StateValue};

/// Identity and wiring shared by every constraint kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstraintCore {
    pub id: String,
    pub local_id: String,
    pub inputs: Vec<StateRef>,
    pub outputs: Vec<StateRef>,
}

impl ConstraintCore {
    pub fn new(id: impl Into<String>, local_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            local_id: local_id.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Declares inputs by state id; they resolve when the constraint is added.
    pub fn with_inputs<S: AsRef<str>>(mut self, ids: &[S]) -> Self {
        self.inputs = ids.iter().map(|id| StateRef::unresolved(id.as_ref())).collect();
        self
    }

    pub fn with_outputs<S: AsRef<str>>(mut self, ids: &[S]) -> Self {
        self.outputs = ids.iter().map(|id| StateRef::unresolved(id.as_ref())).collect();
        self
    }

    /// Both ids are present.
    pub fn verify(&self) -> bool {
        !self.id.is_empty() && !self.local_id.is_empty()
    }
}

/// Read access to the inputs and a write buffer for the declared outputs.
///
/// Nothing reaches the document until `compute` returns `Ok`.
#[derive(Debug)]
pub struct ComputeScope<'a> {
    constraint: &'a str,
    inputs: Vec<Option<&'a StateValue>>,
    writes: Vec<Option<StateValue>>,
}

impl<'a> ComputeScope<'a> {
    pub fn new(constraint: &'a str, inputs: Vec<Option<&'a StateValue>>, output_count: usize) -> Self {
        Self {
            constraint,
            inputs,
            writes: vec![None; output_count],
        }
    }

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    pub fn output_count(&self) -> usize {
        self.writes.len()
    }

    /// Value of input `index`, or `None` if it is unresolved.
    pub fn input(&self, index: usize) -> Option<&'a StateValue> {
        self.inputs.get(index).copied().flatten()
    }

    pub fn require(&self, index: usize) -> Result<&'a StateValue> {
        self.input(index).ok_or_else(|| Error::MissingInput {
            constraint: self.constraint.to_string(),
            index,
        })
    }

    pub fn require_number(&self, index: usize) -> Result<f64> {
        self.require(index)?
            .as_number()
            .ok_or_else(|| Error::TypeMismatch {
                constraint: self.constraint.to_string(),
                expected: "number",
            })
    }

    pub fn set_output(&mut self, index: usize, value: StateValue) -> Result<()> {
        let slot = self
            .writes
            .get_mut(index)
            .ok_or(Error::OutputOutOfRange(index))?;
        *slot = Some(value);
        Ok(())
    }

    /// Writes `value` to every declared output.
    pub fn set_all_outputs(&mut self, value: StateValue) {
        for slot in &mut self.writes {
            *slot = Some(value.clone());
        }
    }

    pub(crate) fn into_writes(self) -> Vec<Option<StateValue>> {
        self.writes
    }
}

/// Document settings visible to [`Constraint::refresh`].
#[derive(Debug, Clone, Default)]
pub struct RefreshContext {
    settings: FxHashMap<String, f64>,
}

impl RefreshContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_setting(mut self, name: impl Into<String>, value: f64) -> Self {
        self.settings.insert(name.into(), value);
        self
    }

    pub fn setting(&self, name: &str) -> Option<f64> {
        self.settings.get(name).copied()
    }
}

/// A node that derives its outputs from its inputs.
pub trait Constraint: fmt::Debug {
    fn core(&self) -> &ConstraintCore;

    fn core_mut(&mut self) -> &mut ConstraintCore;

    /// Registered class name, written as `type` in dumps.
    fn class_name(&self) -> &'static str;

    fn compute(&self, scope: &mut ComputeScope<'_>) -> Result<()>;

    /// Picks up document settings. Returns true when the constraint must be
    /// recomputed. May run before any `compute`.
    fn refresh(&mut self, _ctx: &RefreshContext) -> bool {
        false
    }

    /// Kind-specific payload written as `data`.
    fn dump_extra(&self) -> Option<serde_json::Value> {
        None
    }

    fn load_extra(&mut self, _data: Option<&serde_json::Value>) -> Result<()> {
        Ok(())
    }

    /// Called once when the document removes the constraint.
    fn on_destroy(&mut self) {}

    fn verify(&self) -> bool {
        self.core().verify()
    }

    fn id(&self) -> &str {
        &self.core().id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_buffers_only_declared_outputs() {
        let one = StateValue::Number(1.0);
        let mut scope = ComputeScope::new("c", vec![Some(&one), None], 1);
        assert_eq!(scope.require_number(0).unwrap(), 1.0);
        assert!(matches!(scope.require(1), Err(Error::MissingInput { index: 1, .. })));
        assert!(scope.set_output(0, StateValue::Bool(true)).is_ok());
        assert!(matches!(
            scope.set_output(1, StateValue::Null),
            Err(Error::OutputOutOfRange(1))
        ));
        assert_eq!(scope.into_writes(), vec![Some(StateValue::Bool(true))]);
    }

    #[test]
    fn core_verify_needs_both_ids() {
        assert!(ConstraintCore::new("a", "b").verify());
        assert!(!ConstraintCore::new("a", "").verify());
        assert!(!ConstraintCore::default().verify());
    }

    #[test]
    fn refresh_context_settings() {
        let ctx = RefreshContext::new().with_setting("grid", 0.05);
        assert_eq!(ctx.setting("grid"), Some(0.05));
        assert_eq!(ctx.setting("snap"), None);
    }
}
