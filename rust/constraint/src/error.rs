// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for constraint graph operations.

use crate::keys::{ConstraintKey, StateKey};

/// Result type alias for constraint graph operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while editing, computing or serializing the graph.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A constraint key was not found in the document.
    #[error("constraint not found: {0:?}")]
    ConstraintNotFound(ConstraintKey),

    /// A state key was not found in the document.
    #[error("state not found: {0:?}")]
    StateNotFound(StateKey),

    /// Another constraint or state already uses this id.
    #[error("duplicate id: {0}")]
    DuplicateId(String),

    /// The constraint failed `verify_before_dump` and was not serialized.
    #[error("constraint {0} failed verification")]
    VerifyFailed(String),

    /// Dirty propagation did not settle within the iteration cap.
    #[error("recompute did not settle after {0} evaluations")]
    RecomputeLimit(usize),

    #[error("constraint {constraint} has no value at input {index}")]
    MissingInput { constraint: String, index: usize },

    #[error("constraint {constraint} expected a {expected} input")]
    TypeMismatch {
        constraint: String,
        expected: &'static str,
    },

    #[error("output index {0} is not declared")]
    OutputOutOfRange(usize),

    /// Constraint-specific `data` could not be interpreted.
    #[error("invalid constraint data: {0}")]
    InvalidData(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
