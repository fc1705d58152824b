//! Planning model consumed by the plan validator: symbols, types, objects, formulas and the
//! PDDL front end that builds a fully resolved [`Declaration`] from domain and problem files.

mod declaration;
pub mod errors;
mod formula;
mod grounder;
mod objects;
pub mod pddl;
mod plan;
mod sym;
mod types;
pub(crate) mod utils;

pub use declaration::*;
pub use formula::*;
pub use grounder::*;
pub use objects::*;
pub use plan::*;
pub use sym::*;
pub use types::*;

pub use errors::{Message, Res};

/// Canonical form of a name coming from outside of the system (files, command line, API calls).
///
/// PDDL is case insensitive: every name is lower cased exactly once, when it enters the model.
/// All comparisons made afterwards are plain string equality on the canonical form.
pub fn normalize(name: &str) -> String {
    name.to_lowercase()
}
