// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Class-name lookup for constraint constructors.

use rustc_hash::FxHashMap;

use crate::builtins::{Equal, GridSnap, Linear, Sum};
use crate::constraint::Constraint;

/// Creates an empty instance that `load` then fills in.
pub type ConstraintCtor = fn() -> Box<dyn Constraint>;

/// Maps class names to constructors.
///
/// A dotted name such as `plankit.constraint.Equal` is also reachable by its
/// last segment (`Equal`). Registering a name again replaces the constructor.
#[derive(Debug, Clone, Default)]
pub struct ConstraintRegistry {
    classes: FxHashMap<String, ConstraintCtor>,
}

impl ConstraintRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every shipped constraint kind.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_class(Equal::CLASS_NAME, Equal::boxed);
        registry.register_class(Linear::CLASS_NAME, Linear::boxed);
        registry.register_class(Sum::CLASS_NAME, Sum::boxed);
        registry.register_class(GridSnap::CLASS_NAME, GridSnap::boxed);
        registry
    }

    pub fn register_class(&mut self, name: &str, ctor: ConstraintCtor) {
        if let Some((_, short)) = name.rsplit_once('.') {
            if !short.is_empty() {
                self.classes.insert(short.to_string(), ctor);
            }
        }
        self.classes.insert(name.to_string(), ctor);
    }

    pub fn get_class(&self, name: &str) -> Option<ConstraintCtor> {
        self.classes.get(name).copied()
    }

    pub fn create(&self, name: &str) -> Option<Box<dyn Constraint>> {
        self.get_class(name).map(|ctor| ctor())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Number of registered names, counting short forms separately.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
