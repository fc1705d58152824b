use std::fmt::{Display, Formatter};
use std::sync::Arc;

use crate::utils::disp_iter;
use crate::*;

/// A lifted action: parameters, precondition and effect.
///
/// Schemas are never modified once built. Grounding produces new formulas, see [`Formula::ground`].
#[derive(Clone, Debug)]
pub struct ActionSchema {
    pub name: Sym,
    pub parameters: Vec<Param>,
    pub precondition: Formula,
    pub effect: Formula,
}

impl Display for ActionSchema {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}(", self.name)?;
        disp_iter(f, self.parameters.iter(), ", ")?;
        write!(f, ")\n    pre: {}\n    eff: {}", self.precondition, self.effect)
    }
}

/// Signature of a predicate.
#[derive(Clone, Debug)]
pub struct Predicate {
    pub name: Sym,
    pub parameters: Vec<Param>,
}

impl Display for Predicate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}(", self.name)?;
        disp_iter(f, self.parameters.iter(), ", ")?;
        write!(f, ")")
    }
}

/// One definition of a derived predicate. A derived predicate may have several definitions,
/// it holds if any of them holds.
#[derive(Clone, Debug)]
pub struct DerivedPredicate {
    pub name: Sym,
    pub parameters: Vec<Param>,
    pub body: Formula,
}

impl Display for DerivedPredicate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}(", self.name)?;
        disp_iter(f, self.parameters.iter(), ", ")?;
        write!(f, ") := {}", self.body)
    }
}

/// A fully resolved planning task: domain and problem, where every symbol is bound to its declaration.
///
/// The only way to obtain a declaration from PDDL files is through [`crate::pddl::contextualize`].
/// Once built, a declaration is immutable and may be shared between concurrent validations.
#[derive(Clone, Debug)]
pub struct Declaration {
    pub domain_name: Sym,
    pub problem_name: Sym,
    pub(crate) types: Arc<TypeHierarchy>,
    pub(crate) objects: Arc<Objects>,
    pub(crate) predicates: hashbrown::HashMap<Sym, Predicate>,
    pub(crate) actions: hashbrown::HashMap<Sym, ActionSchema>,
    pub(crate) derived: hashbrown::HashMap<Sym, Vec<DerivedPredicate>>,
    pub(crate) init: Vec<Fact>,
    pub(crate) goal: Option<Formula>,
    pub(crate) grounder: ObjectGrounder,
}

impl Declaration {
    pub fn types(&self) -> &TypeHierarchy {
        &self.types
    }

    /// All constants of the domain and objects of the problem.
    pub fn objects(&self) -> &Objects {
        &self.objects
    }

    /// Looks up an object or a constant by its canonical name.
    pub fn object(&self, name: &str) -> Option<&Object> {
        self.objects.get(name).ok()
    }

    pub fn action(&self, name: &str) -> Option<&ActionSchema> {
        self.actions.get(name)
    }

    pub fn actions(&self) -> impl Iterator<Item = &ActionSchema> + '_ {
        self.actions.values()
    }

    /// All definitions of the derived predicate `name` that accept `arity` arguments.
    pub fn derived(&self, name: &str, arity: usize) -> impl Iterator<Item = &DerivedPredicate> + '_ {
        self.derived
            .get(name)
            .into_iter()
            .flatten()
            .filter(move |d| d.parameters.len() == arity)
    }

    /// Facts holding in the initial state.
    pub fn init(&self) -> &[Fact] {
        &self.init
    }

    pub fn goal(&self) -> Option<&Formula> {
        self.goal.as_ref()
    }

    /// Replaces the goal of the problem.
    pub fn set_goal(&mut self, goal: Option<Formula>) {
        self.goal = goal;
    }

    pub fn grounder(&self) -> &dyn Grounder {
        &self.grounder
    }
}

impl Display for Declaration {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "# Domain: {}   Problem: {}", self.domain_name, self.problem_name)?;
        write!(f, "{}", self.objects)?;
        writeln!(f, "Predicates:")?;
        for p in self.predicates.values() {
            writeln!(f, "  {p}")?;
        }
        writeln!(f, "Derived predicates:")?;
        for d in self.derived.values().flatten() {
            writeln!(f, "  {d}")?;
        }
        writeln!(f, "Actions:")?;
        for a in self.actions.values() {
            writeln!(f, "  {a}")?;
        }
        write!(f, "Init:\n  ")?;
        disp_iter(f, self.init.iter(), "\n  ")?;
        writeln!(f)?;
        match &self.goal {
            Some(goal) => writeln!(f, "Goal: {goal}"),
            None => writeln!(f, "Goal: none"),
        }
    }
}
