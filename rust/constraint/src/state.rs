// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed value slots that constraints read and write.

use serde::{Deserialize, Serialize};

use crate::keys::StateKey;

/// A typed value held by a state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StateValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Vector(Vec<f64>),
}

impl StateValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            StateValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            StateValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            StateValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, StateValue::Null)
    }
}

impl From<f64> for StateValue {
    fn from(n: f64) -> Self {
        StateValue::Number(n)
    }
}

impl From<bool> for StateValue {
    fn from(b: bool) -> Self {
        StateValue::Bool(b)
    }
}

impl From<&str> for StateValue {
    fn from(s: &str) -> Self {
        StateValue::Text(s.to_string())
    }
}

impl From<Vec<f64>> for StateValue {
    fn from(v: Vec<f64>) -> Self {
        StateValue::Vector(v)
    }
}

pub const DEFAULT_STATE_NAME: &str = "Default";

/// A named value slot.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub id: String,
    pub local_id: String,
    pub name: String,
    pub value: StateValue,
    pub is_editable: bool,
}

impl State {
    pub fn new(id: impl Into<String>, value: impl Into<StateValue>) -> Self {
        Self {
            id: id.into(),
            local_id: String::new(),
            name: DEFAULT_STATE_NAME.to_string(),
            value: value.into(),
            is_editable: true,
        }
    }

    pub fn with_local_id(mut self, local_id: impl Into<String>) -> Self {
        self.local_id = local_id.into();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn read_only(mut self) -> Self {
        self.is_editable = false;
        self
    }
}

/// Reference from a constraint to a state.
///
/// The id is what gets dumped. `key` is `None` while the id does not resolve
/// in the owning document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateRef {
    pub id: String,
    pub key: Option<StateKey>,
}

impl StateRef {
    pub fn unresolved(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            key: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.key.is_some()
    }
}

pub const STATE_TAG: &str = "State";

/// Dump record of a state. Fields holding their defaults are omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateRecord {
    pub l: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<StateValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_editable: Option<bool>,
}

impl From<&State> for StateRecord {
    fn from(s: &State) -> Self {
        StateRecord {
            l: STATE_TAG.to_string(),
            id: s.id.clone(),
            local_id: (!s.local_id.is_empty()).then(|| s.local_id.clone()),
            name: (s.name != DEFAULT_STATE_NAME).then(|| s.name.clone()),
            value: (!s.value.is_null()).then(|| s.value.clone()),
            is_editable: (!s.is_editable).then_some(false),
        }
    }
}

impl StateRecord {
    /// Builds the state under `id`, which may differ from the recorded one.
    pub fn to_state(&self, id: String) -> State {
        State {
            id,
            local_id: self.local_id.clone().unwrap_or_default(),
            name: self
                .name
                .clone()
                .unwrap_or_else(|| DEFAULT_STATE_NAME.to_string()),
            value: self.value.clone().unwrap_or_default(),
            is_editable: self.is_editable.unwrap_or(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_fields_are_omitted() {
        let record = StateRecord::from(&State::new("s1", 2.5));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json, serde_json::json!({"l": "State", "id": "s1", "value": 2.5}));
    }

    #[test]
    fn record_restores_state() {
        let state = State::new("s1", vec![1.0, 2.0])
            .with_local_id("width")
            .with_name("Width")
            .read_only();
        let record = StateRecord::from(&state);
        let json = serde_json::to_string(&record).unwrap();
        let back: StateRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.to_state("s1".to_string()), state);
    }

    #[test]
    fn untagged_values() {
        let values: Vec<StateValue> = serde_json::from_str(r#"[true, 3.0, "x", [1.0, 2.0]]"#).unwrap();
        assert_eq!(values[0], StateValue::Bool(true));
        assert_eq!(values[1].as_number(), Some(3.0));
        assert_eq!(values[2].as_text(), Some("x"));
        assert_eq!(values[3], StateValue::Vector(vec![1.0, 2.0]));
    }
}
