//! Validation of sequential plans for PDDL planning problems.
//!
//! A plan is replayed step by step from the initial state of the problem: each action must be
//! applicable in the state reached so far, and the final state must satisfy the goal.

pub mod errors;
pub mod models;
mod validator;

pub use errors::{Error, FormulaError, SimulationError, ValidationError};
pub use models::simulator::Simulator;
pub use models::state::FactStore;
pub use validator::*;

#[cfg(test)]
mod fixtures;
