// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Plankit Constraint
//!
//! Constraint graph for parametric models.
//!
//! A [`ConstraintDocument`] stores states (typed value slots) and constraints
//! (nodes deriving output states from input states) in slot maps with
//! reverse indices from each state to its readers and writers. Editing a
//! state marks its readers dirty and [`ConstraintDocument::recompute_dirty`]
//! propagates the change. Constraint kinds are looked up by class name in an
//! explicit [`ConstraintRegistry`] when dumps are loaded.

pub mod builtins;
pub mod constraint;
pub mod document;
pub mod error;
pub mod keys;
pub mod registry;
pub mod serialization;
pub mod state;

pub use builtins::{Equal, GridSnap, Linear, Sum};
pub use constraint::{ComputeScope, Constraint, ConstraintCore, RefreshContext};
pub use document::ConstraintDocument;
pub use error::{Error, Result};
pub use keys::{ConstraintKey, StateKey};
pub use registry::{ConstraintCtor, ConstraintRegistry};
pub use serialization::{
    ConstraintDumpData, ConstraintIdGenerator, DocumentSnapshot, DumpOptions, LoadOptions,
    SequentialIdGenerator,
};
pub use state::{State, StateRecord, StateRef, StateValue};
