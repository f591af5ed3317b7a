// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Constraint kinds shipped with the crate.

use serde::{Deserialize, Serialize};

use crate::constraint::{ComputeScope, Constraint, ConstraintCore, RefreshContext};
use crate::error::{Error, Result};
use crate::state::StateValue;

macro_rules! constraint_boilerplate {
    ($name:ident, $class:literal) => {
        impl $name {
            pub const CLASS_NAME: &'static str = $class;

            pub fn boxed() -> Box<dyn Constraint> {
                Box::new(Self::default())
            }
        }
    };
}

/// Copies input 0 to every output.
#[derive(Debug, Default)]
pub struct Equal {
    core: ConstraintCore,
}

constraint_boilerplate!(Equal, "plankit.constraint.Equal");

impl Equal {
    pub fn new(core: ConstraintCore) -> Self {
        Self { core }
    }
}

impl Constraint for Equal {
    fn core(&self) -> &ConstraintCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ConstraintCore {
        &mut self.core
    }

    fn class_name(&self) -> &'static str {
        Self::CLASS_NAME
    }

    fn compute(&self, scope: &mut ComputeScope<'_>) -> Result<()> {
        let value = scope.require(0)?.clone();
        scope.set_all_outputs(value);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct LinearParams {
    #[serde(default = "one")]
    scale: f64,
    #[serde(default)]
    offset: f64,
}

fn one() -> f64 {
    1.0
}

/// `out = scale * in + offset` for every output, from input 0.
#[derive(Debug)]
pub struct Linear {
    core: ConstraintCore,
    params: LinearParams,
}

impl Default for Linear {
    fn default() -> Self {
        Self::new(ConstraintCore::default(), 1.0, 0.0)
    }
}

constraint_boilerplate!(Linear, "plankit.constraint.Linear");

impl Linear {
    pub fn new(core: ConstraintCore, scale: f64, offset: f64) -> Self {
        Self {
            core,
            params: LinearParams { scale, offset },
        }
    }

    pub fn scale(&self) -> f64 {
        self.params.scale
    }

    pub fn offset(&self) -> f64 {
        self.params.offset
    }
}

impl Constraint for Linear {
    fn core(&self) -> &ConstraintCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ConstraintCore {
        &mut self.core
    }

    fn class_name(&self) -> &'static str {
        Self::CLASS_NAME
    }

    fn compute(&self, scope: &mut ComputeScope<'_>) -> Result<()> {
        let x = scope.require_number(0)?;
        scope.set_all_outputs(StateValue::Number(self.params.scale * x + self.params.offset));
        Ok(())
    }

    fn dump_extra(&self) -> Option<serde_json::Value> {
        serde_json::to_value(self.params).ok()
    }

    fn load_extra(&mut self, data: Option<&serde_json::Value>) -> Result<()> {
        if let Some(data) = data {
            self.params = serde_json::from_value(data.clone())
                .map_err(|e| Error::InvalidData(e.to_string()))?;
        }
        Ok(())
    }
}

/// Sum of every numeric input, written to every output.
#[derive(Debug, Default)]
pub struct Sum {
    core: ConstraintCore,
}

constraint_boilerplate!(Sum, "plankit.constraint.Sum");

impl Sum {
    pub fn new(core: ConstraintCore) -> Self {
        Self { core }
    }
}

impl Constraint for Sum {
    fn core(&self) -> &ConstraintCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ConstraintCore {
        &mut self.core
    }

    fn class_name(&self) -> &'static str {
        Self::CLASS_NAME
    }

    fn compute(&self, scope: &mut ComputeScope<'_>) -> Result<()> {
        let mut total = 0.0;
        for i in 0..scope.input_count() {
            total += scope.require_number(i)?;
        }
        scope.set_all_outputs(StateValue::Number(total));
        Ok(())
    }
}

/// Rounds input 0 to the document grid.
///
/// The grid comes from the `"grid"` setting at refresh time. Until a positive
/// grid is known the input passes through unchanged.
#[derive(Debug, Default)]
pub struct GridSnap {
    core: ConstraintCore,
    grid: Option<f64>,
}

constraint_boilerplate!(GridSnap, "plankit.constraint.GridSnap");

impl GridSnap {
    pub const GRID_SETTING: &'static str = "grid";

    pub fn new(core: ConstraintCore) -> Self {
        Self { core, grid: None }
    }

    pub fn grid(&self) -> Option<f64> {
        self.grid
    }
}

impl Constraint for GridSnap {
    fn core(&self) -> &ConstraintCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ConstraintCore {
        &mut self.core
    }

    fn class_name(&self) -> &'static str {
        Self::CLASS_NAME
    }

    fn compute(&self, scope: &mut ComputeScope<'_>) -> Result<()> {
        let x = scope.require_number(0)?;
        let snapped = match self.grid {
            Some(g) => (x / g).round() * g,
            None => x,
        };
        scope.set_all_outputs(StateValue::Number(snapped));
        Ok(())
    }

    fn refresh(&mut self, ctx: &RefreshContext) -> bool {
        let grid = ctx.setting(Self::GRID_SETTING).filter(|g| *g > 0.0);
        if grid == self.grid {
            return false;
        }
        self.grid = grid;
        true
    }
}
