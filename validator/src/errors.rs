use planx::{Message, Sym};
use thiserror::Error;

/* ========================================================================== */
/*                              Validation Errors                             */
/* ========================================================================== */

/// Reasons for a plan to be rejected.
///
/// These are ordinary outcomes of a validation: they are reported to the user as an invalid plan.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Unknown action `{0}`")]
    UnknownAction(String),
    #[error("Unknown object or constant `{0}`")]
    UnknownObject(String),
    #[error("Action `{action}` expects {expected} argument(s) but {given} were given")]
    ArityMismatch {
        action: String,
        expected: usize,
        given: usize,
    },
    #[error("Argument `{argument}` of type `{actual}` does not match parameter `{param}` of type `{expected}`")]
    TypeMismatch {
        argument: String,
        actual: String,
        param: String,
        expected: String,
    },
    #[error("Precondition of `{0}` is not satisfied")]
    UnsatisfiedPrecondition(String),
    #[error("The problem does not declare any goal")]
    GoalNotDeclared,
}

/* ========================================================================== */
/*                               Formula Errors                               */
/* ========================================================================== */

/// A formula that the evaluator cannot interpret.
///
/// Contextualized declarations never produce them: they denote a broken model rather than a bad plan.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FormulaError {
    #[error("Variable `{0}` is not bound to any object")]
    UnboundVariable(Sym),
    #[error("A {0} cannot appear in an effect")]
    NotAnEffect(&'static str),
}

/* ========================================================================== */
/*                              Simulation Errors                             */
/* ========================================================================== */

/// Failure of a simulation step.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SimulationError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Formula(#[from] FormulaError),
}

/// Failure to validate a plan from its PDDL sources.
#[derive(Debug, Error)]
pub enum Error {
    /// The domain, problem or plan could not be parsed or resolved.
    #[error(transparent)]
    Declaration(#[from] Message),
    #[error(transparent)]
    Formula(#[from] FormulaError),
}
