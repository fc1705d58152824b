//! PDDL front end: reading of domain, problem and plan files and their resolution into a [`crate::Declaration`].

pub mod contextualize;
pub mod find_file;
pub mod input;
pub mod parser;
pub mod sexpr;

pub use contextualize::contextualize;
pub use find_file::*;
pub use input::Input;
pub use parser::*;
pub use sexpr::{ListIter, SAtom, SExpr, SList};
