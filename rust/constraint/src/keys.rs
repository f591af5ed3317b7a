// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Key types for arena-based storage.
//!
//! States and constraints are addressed by generational slot map keys inside
//! one document. String ids are what dumps and other documents refer to.

use slotmap::new_key_type;

new_key_type! {
    /// Key for a state (a value slot read or written by constraints).
    pub struct StateKey;

    /// Key for a constraint node.
    pub struct ConstraintKey;
}
