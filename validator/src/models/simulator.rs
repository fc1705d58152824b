use planx::{Bindings, Declaration, PlanStep, normalize};
use tracing::debug;

use super::state::{FactStore, resolve_object};
use crate::errors::{SimulationError, ValidationError};

/* ========================================================================== */
/*                                  Simulator                                 */
/* ========================================================================== */

/// Applies actions, one at a time, from the initial state of a problem.
#[derive(Clone, Debug)]
pub struct Simulator<'a> {
    decl: &'a Declaration,
    state: FactStore<'a>,
    /// Number of actions applied since the initial state.
    cost: u64,
}

impl<'a> Simulator<'a> {
    pub fn new(decl: &'a Declaration) -> Self {
        Simulator {
            decl,
            state: FactStore::new(decl),
            cost: 0,
        }
    }

    /// Applies the action `name` with the given arguments to the current state.
    ///
    /// The applicability of the action is fully checked before any change is made:
    /// on failure the state is left untouched.
    pub fn step(&mut self, name: &str, args: &[impl AsRef<str>]) -> Result<(), SimulationError> {
        let action = self
            .decl
            .action(&normalize(name))
            .ok_or_else(|| ValidationError::UnknownAction(name.to_string()))?;
        if args.len() != action.parameters.len() {
            return Err(ValidationError::ArityMismatch {
                action: action.name.to_string(),
                expected: action.parameters.len(),
                given: args.len(),
            }
            .into());
        }

        let mut bindings = Bindings::new();
        for (arg, param) in args.iter().zip(&action.parameters) {
            let obj = resolve_object(self.decl, arg.as_ref())?;
            if !self.decl.types().is_type_of(obj.tpe(), &param.tpe) {
                return Err(ValidationError::TypeMismatch {
                    argument: obj.name().to_string(),
                    actual: obj.tpe().to_string(),
                    param: param.name.to_string(),
                    expected: param.tpe.to_string(),
                }
                .into());
            }
            bindings = bindings.bind(param.name.detached(), obj.name().detached());
        }

        let precondition = action.precondition.ground(&bindings);
        if !self.state.evaluate(&precondition)? {
            let instance = PlanStep::new(&action.name, args.iter().map(|a| a.as_ref()));
            return Err(ValidationError::UnsatisfiedPrecondition(instance.to_string()).into());
        }
        let effect = action.effect.ground(&bindings);
        self.state.apply_effect(&effect)?;
        self.cost += 1;
        debug!(action = %action.name, %bindings, cost = self.cost, "applied");
        Ok(())
    }

    /// Returns to the initial state of the problem.
    pub fn reset(&mut self) {
        self.state = FactStore::new(self.decl);
        self.cost = 0;
    }

    pub fn cost(&self) -> u64 {
        self.cost
    }

    pub fn state(&self) -> &FactStore<'a> {
        &self.state
    }
}

/* ========================================================================== */
/*                                    Tests                                   */
/* ========================================================================== */
