use std::fmt::{Debug, Display, Formatter};

use im::HashSet;
use itertools::Itertools;
use planx::{Atom, Bindings, Declaration, Fact, Formula, Object, Param, Term, normalize};
use tracing::trace;

use crate::errors::{FormulaError, SimulationError, ValidationError};

/* ========================================================================== */
/*                                 Fact Store                                 */
/* ========================================================================== */

/// Set of ground facts holding in the current state of a simulation.
///
/// The store only refers to its declaration, which is shared by all stores of a validation.
/// Cloning a store is cheap and produces an independent set of facts.
#[derive(Clone)]
pub struct FactStore<'a> {
    decl: &'a Declaration,
    facts: HashSet<Fact>,
}

impl<'a> FactStore<'a> {
    /// Creates a store holding the initial facts of the problem.
    pub fn new(decl: &'a Declaration) -> Self {
        FactStore {
            decl,
            facts: decl.init().iter().cloned().collect(),
        }
    }

    pub fn declaration(&self) -> &'a Declaration {
        self.decl
    }

    /// Inserts a fact, returns true if it was not already present.
    pub fn add(&mut self, fact: Fact) -> bool {
        self.facts.insert(fact).is_none()
    }

    /// Removes a fact, returns true if it was present.
    pub fn remove(&mut self, fact: &Fact) -> bool {
        self.facts.remove(fact).is_some()
    }

    pub fn contains(&self, fact: &Fact) -> bool {
        self.facts.contains(fact)
    }

    /// Builds the fact `(predicate args...)` from external names, that are required to denote declared objects.
    pub fn fact(&self, predicate: &str, args: &[impl AsRef<str>]) -> Result<Fact, ValidationError> {
        let args: Vec<&Object> = args
            .iter()
            .map(|a| resolve_object(self.decl, a.as_ref()))
            .collect::<Result<_, _>>()?;
        Ok(Fact::new(normalize(predicate), args.into_iter().map(|o| o.name())))
    }

    pub fn add_named(&mut self, predicate: &str, args: &[impl AsRef<str>]) -> Result<bool, ValidationError> {
        let fact = self.fact(predicate, args)?;
        Ok(self.add(fact))
    }

    pub fn remove_named(&mut self, predicate: &str, args: &[impl AsRef<str>]) -> Result<bool, ValidationError> {
        let fact = self.fact(predicate, args)?;
        Ok(self.remove(&fact))
    }

    pub fn contains_named(&self, predicate: &str, args: &[impl AsRef<str>]) -> Result<bool, ValidationError> {
        Ok(self.contains(&self.fact(predicate, args)?))
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Fact> + '_ {
        self.facts.iter()
    }

    /// Whether the goal of the problem holds in the current state.
    pub fn is_goal_satisfied(&self) -> Result<bool, SimulationError> {
        let goal = self.decl.goal().ok_or(ValidationError::GoalNotDeclared)?;
        Ok(self.evaluate(goal)?)
    }
}

/// Looks up the object or constant designated by an external name.
pub(crate) fn resolve_object<'a>(decl: &'a Declaration, name: &str) -> Result<&'a Object, ValidationError> {
    decl.object(&normalize(name))
        .ok_or_else(|| ValidationError::UnknownObject(name.to_string()))
}

fn fact_of(atom: &Atom) -> Result<Fact, FormulaError> {
    atom.to_fact().map_err(FormulaError::UnboundVariable)
}

fn object_name(term: &Term) -> Result<&str, FormulaError> {
    match term {
        Term::Object(o) => Ok(o.canonical_str()),
        Term::Var(v) => Err(FormulaError::UnboundVariable(v.clone())),
    }
}

/* ========================================================================== */
/*                                 Evaluation                                 */
/* ========================================================================== */

impl FactStore<'_> {
    /// Truth value of a ground formula in the current state.
    pub fn evaluate(&self, formula: &Formula) -> Result<bool, FormulaError> {
        self.eval(formula, &HashSet::new())
    }

    /// Evaluates `formula`, where `deriving` holds the derived facts whose evaluation is in progress.
    /// A derived fact that depends on itself is considered false on the recursive branch.
    fn eval(&self, formula: &Formula, deriving: &HashSet<Fact>) -> Result<bool, FormulaError> {
        match formula {
            Formula::Atom(atom) if atom.is_equality() => {
                Ok(object_name(&atom.args[0])? == object_name(&atom.args[1])?)
            }
            Formula::Atom(atom) => Ok(self.facts.contains(&fact_of(atom)?)),
            Formula::Not(f) => Ok(!self.eval(f, deriving)?),
            Formula::And(fs) => {
                for f in fs {
                    if !self.eval(f, deriving)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Formula::Or(fs) => {
                for f in fs {
                    if self.eval(f, deriving)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Formula::Imply(a, b) | Formula::When(a, b) => Ok(!self.eval(a, deriving)? || self.eval(b, deriving)?),
            Formula::Forall(params, body) => {
                for instance in self.instances(params, body) {
                    if !self.eval(&instance, deriving)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Formula::Exists(params, body) => {
                for instance in self.instances(params, body) {
                    if self.eval(&instance, deriving)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Formula::Derived(atom) => {
                let fact = fact_of(atom)?;
                if deriving.contains(&fact) {
                    trace!("cyclic derivation of {fact}");
                    return Ok(false);
                }
                let deriving = deriving.update(fact.clone());
                for def in self.decl.derived(atom.predicate.canonical_str(), atom.args.len()) {
                    let body = def.body.ground(&Bindings::from_params(&def.parameters, fact.args()));
                    if self.eval(&body, &deriving)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Formula::Numeric(_) => Ok(true),
        }
    }

    /// Lazily instantiates `body` for every type-consistent assignment of objects to `params`.
    fn instances<'f>(&'f self, params: &'f [Param], body: &'f Formula) -> impl Iterator<Item = Formula> + 'f {
        let grounder = self.decl.grounder();
        grounder
            .permutations(params)
            .map(move |perm| body.ground(&Bindings::from_params(params, perm.iter().map(|&i| grounder.object(i)))))
    }
}

/* ========================================================================== */
/*                                   Effects                                  */
/* ========================================================================== */

/// Facts staged by an effect, before any of them is applied.
#[derive(Default, Debug)]
struct Changes {
    deletions: Vec<Fact>,
    additions: Vec<Fact>,
}

impl FactStore<'_> {
    /// Applies a ground effect to the store.
    ///
    /// All changes are computed on the state preceding the effect, then deletions are applied before additions:
    /// an effect that both deletes and adds a fact leaves it present.
    pub fn apply_effect(&mut self, effect: &Formula) -> Result<(), FormulaError> {
        let mut changes = Changes::default();
        self.stage(effect, true, &mut changes)?;
        trace!(?changes, "applying effect");
        for fact in &changes.deletions {
            self.facts.remove(fact);
        }
        for fact in changes.additions {
            self.facts.insert(fact);
        }
        Ok(())
    }

    fn stage(&self, effect: &Formula, positive: bool, changes: &mut Changes) -> Result<(), FormulaError> {
        match effect {
            Formula::Atom(atom) if !atom.is_equality() => {
                let fact = fact_of(atom)?;
                if positive {
                    changes.additions.push(fact);
                } else {
                    changes.deletions.push(fact);
                }
                Ok(())
            }
            Formula::Not(f) => self.stage(f, !positive, changes),
            Formula::And(fs) => fs.iter().try_for_each(|f| self.stage(f, positive, changes)),
            Formula::Forall(params, body) => self
                .instances(params, body)
                .try_for_each(|instance| self.stage(&instance, positive, changes)),
            Formula::When(condition, eff) => {
                if self.evaluate(condition)? {
                    self.stage(eff, true, changes)
                } else {
                    Ok(())
                }
            }
            Formula::Numeric(_) => Ok(()),
            Formula::Atom(_) | Formula::Or(_) | Formula::Exists(_, _) | Formula::Imply(_, _) | Formula::Derived(_) => {
                Err(FormulaError::NotAnEffect(effect.kind()))
            }
        }
    }
}

/* ========================================================================== */
/*                                   Display                                  */
/* ========================================================================== */

impl PartialEq for FactStore<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.facts == other.facts
    }
}

impl Display for FactStore<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for fact in self.facts.iter().sorted() {
            writeln!(f, "{fact}")?;
        }
        Ok(())
    }
}

impl Debug for FactStore<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.facts.iter().sorted()).finish()
    }
}

/* ========================================================================== */
/*                                    Tests                                   */
/* ========================================================================== */

#[cfg(test)]
mod tests {
    use planx::Type;

    use super::*;
    use crate::fixtures::{alternatives, gripper, lights, reachability};

    fn obj(s: &str) -> Term {
        Term::Object(s.into())
    }
    fn var(s: &str) -> Term {
        Term::Var(s.into())
    }
    fn atom(pred: &str, args: Vec<Term>) -> Formula {
        Formula::Atom(Atom::new(pred, args))
    }

    #[test]
    fn initial_state() {
        let decl = gripper();
        let store = FactStore::new(&decl);
        assert_eq!(store.len(), decl.init().len());
        assert!(store.contains(&Fact::new("at-robby", ["rooma"])));
        assert!(!store.contains(&Fact::new("at-robby", ["roomb"])));
        assert_eq!(store.contains_named("AT", &["Ball1", "roomA"]), Ok(true));
    }

    #[test]
    fn add_is_idempotent() {
        let decl = gripper();
        let mut store = FactStore::new(&decl);
        let size = store.len();
        assert_eq!(store.add_named("at-robby", &["roomb"]), Ok(true));
        assert_eq!(store.add_named("at-robby", &["roomb"]), Ok(false));
        assert_eq!(store.len(), size + 1);
        assert!(store.contains(&Fact::new("at-robby", ["roomb"])));

        assert_eq!(store.remove_named("at-robby", &["roomb"]), Ok(true));
        assert_eq!(store.remove_named("at-robby", &["roomb"]), Ok(false));
        assert_eq!(store.len(), size);

        assert_eq!(
            store.add_named("at-robby", &["kitchen"]),
            Err(ValidationError::UnknownObject("kitchen".to_string()))
        );
    }

    #[test]
    fn copies_are_independent() {
        let decl = gripper();
        let mut store = FactStore::new(&decl);
        let copy = store.clone();
        assert_eq!(store, copy);
        store.add(Fact::new("at-robby", ["roomb"]));
        assert_ne!(store, copy);
        assert!(!copy.contains(&Fact::new("at-robby", ["roomb"])));
    }

    #[test]
    fn connectives() {
        let decl = gripper();
        let store = FactStore::new(&decl);
        let t = || atom("at-robby", vec![obj("rooma")]);
        let f = || atom("at-robby", vec![obj("roomb")]);
        let eval = |formula: Formula| store.evaluate(&formula).unwrap();

        assert!(eval(t()));
        assert!(!eval(f()));
        assert!(eval(Formula::not(f())));
        assert!(eval(Formula::empty()));
        assert!(!eval(Formula::Or(vec![])));
        assert!(!eval(Formula::And(vec![t(), f()])));
        assert!(eval(Formula::Or(vec![f(), t()])));
        assert!(eval(Formula::Imply(Box::new(f()), Box::new(f()))));
        assert!(!eval(Formula::Imply(Box::new(t()), Box::new(f()))));
        assert!(eval(Formula::When(Box::new(t()), Box::new(t()))));
        // a conditional read as a condition holds vacuously when its condition is false
        assert!(eval(Formula::When(Box::new(f()), Box::new(f()))));
        assert!(eval(Formula::When(Box::new(f()), Box::new(t()))));
        assert!(!eval(Formula::When(Box::new(t()), Box::new(f()))));
        assert!(eval(atom("=", vec![obj("rooma"), obj("rooma")])));
        assert!(!eval(atom("=", vec![obj("rooma"), obj("roomb")])));
    }

    #[test]
    fn short_circuit() {
        let decl = gripper();
        let store = FactStore::new(&decl);
        let free = || atom("at-robby", vec![var("?r")]);
        let f = || atom("at-robby", vec![obj("roomb")]);
        let t = || atom("at-robby", vec![obj("rooma")]);

        // the unbound variable is never reached
        assert_eq!(store.evaluate(&Formula::And(vec![f(), free()])), Ok(false));
        assert_eq!(store.evaluate(&Formula::Or(vec![t(), free()])), Ok(true));
        assert_eq!(store.evaluate(&Formula::Imply(Box::new(f()), Box::new(free()))), Ok(true));
        assert_eq!(
            store.evaluate(&Formula::And(vec![t(), free()])),
            Err(FormulaError::UnboundVariable("?r".into()))
        );
    }

    #[test]
    fn quantifiers_match_enumeration() {
        let decl = gripper();
        let store = FactStore::new(&decl);
        let params = vec![Param::new("?b", Type::object())];
        let bodies = [
            atom("at", vec![var("?b"), obj("rooma")]),
            Formula::Imply(
                Box::new(atom("ball", vec![var("?b")])),
                Box::new(atom("at", vec![var("?b"), obj("rooma")])),
            ),
            Formula::not(atom("carry", vec![var("?b"), obj("left")])),
        ];
        for body in bodies {
            let expanded: Vec<bool> = decl
                .objects()
                .iter()
                .map(|o| {
                    let b = Bindings::new().bind("?b".into(), o.name().clone());
                    store.evaluate(&body.ground(&b)).unwrap()
                })
                .collect();
            let forall = Formula::Forall(params.clone(), Box::new(body.clone()));
            let exists = Formula::Exists(params.clone(), Box::new(body.clone()));
            assert_eq!(store.evaluate(&forall), Ok(expanded.iter().all(|&x| x)), "{forall}");
            assert_eq!(store.evaluate(&exists), Ok(expanded.iter().any(|&x| x)), "{exists}");
        }
    }

    #[test]
    fn empty_domains() {
        let decl = lights();
        let store = FactStore::new(&decl);
        // no object is of type `bulb`
        let params = vec![Param::new("?x", Type::new("bulb"))];
        let body = Box::new(atom("on", vec![var("?x")]));
        assert_eq!(store.evaluate(&Formula::Forall(params.clone(), body.clone())), Ok(true));
        assert_eq!(store.evaluate(&Formula::Exists(params, body)), Ok(false));
    }

    #[test]
    fn delete_then_add() {
        let decl = gripper();
        let mut store = FactStore::new(&decl);
        let fact = || atom("at-robby", vec![obj("rooma")]);
        let effect = Formula::And(vec![fact(), Formula::not(fact())]);
        store.apply_effect(&effect).unwrap();
        assert_eq!(store.contains_named("at-robby", &["rooma"]), Ok(true));

        let effect = Formula::And(vec![Formula::not(fact()), fact()]);
        store.apply_effect(&effect).unwrap();
        assert_eq!(store.contains_named("at-robby", &["rooma"]), Ok(true));
    }

    #[test]
    fn conditions_are_read_before_changes() {
        let decl = gripper();
        let mut store = FactStore::new(&decl);
        let here = || atom("at-robby", vec![obj("rooma")]);
        let there = || atom("at-robby", vec![obj("roomb")]);
        // the second conditional effect must not see the deletion made by the first one
        let effect = Formula::And(vec![
            Formula::When(Box::new(here()), Box::new(Formula::not(here()))),
            Formula::When(Box::new(here()), Box::new(there())),
            Formula::When(Box::new(there()), Box::new(atom("free", vec![obj("ball1")]))),
        ]);
        store.apply_effect(&effect).unwrap();
        assert_eq!(store.contains_named("at-robby", &["rooma"]), Ok(false));
        assert_eq!(store.contains_named("at-robby", &["roomb"]), Ok(true));
        assert_eq!(store.contains_named("free", &["ball1"]), Ok(false));
    }

    #[test]
    fn universal_effects() {
        let decl = gripper();
        let mut store = FactStore::new(&decl);
        let params = vec![Param::new("?b", Type::object())];
        let effect = Formula::Forall(
            params,
            Box::new(Formula::When(
                Box::new(atom("ball", vec![var("?b")])),
                Box::new(Formula::And(vec![
                    Formula::not(atom("at", vec![var("?b"), obj("rooma")])),
                    atom("at", vec![var("?b"), obj("roomb")]),
                ])),
            )),
        );
        store.apply_effect(&effect).unwrap();
        for ball in ["ball1", "ball2", "ball3", "ball4"] {
            assert_eq!(store.contains_named("at", &[ball, "roomb"]), Ok(true));
            assert_eq!(store.contains_named("at", &[ball, "rooma"]), Ok(false));
        }
        assert_eq!(store.contains_named("at", &["left", "roomb"]), Ok(false));
    }

    #[test]
    fn invalid_effects() {
        let decl = gripper();
        let mut store = FactStore::new(&decl);
        let before = store.clone();
        let t = || atom("at-robby", vec![obj("roomb")]);
        let invalid = [
            Formula::Or(vec![t()]),
            Formula::Imply(Box::new(t()), Box::new(t())),
            atom("=", vec![obj("rooma"), obj("rooma")]),
            Formula::And(vec![t(), Formula::Exists(vec![], Box::new(t()))]),
        ];
        for effect in invalid {
            assert!(matches!(store.apply_effect(&effect), Err(FormulaError::NotAnEffect(_))));
        }
        // nothing is applied when an effect is rejected
        assert_eq!(store, before);
        assert_eq!(
            store.apply_effect(&atom("at-robby", vec![var("?r")])),
            Err(FormulaError::UnboundVariable("?r".into()))
        );
    }

    #[test]
    fn derived_predicates() {
        let decl = lights();
        let mut store = FactStore::new(&decl);
        let lit = Formula::Derived(Atom::new("lit", vec![obj("kitchen")]));
        assert_eq!(store.evaluate(&lit), Ok(false));
        store.add_named("on", &["l1"]).unwrap();
        assert_eq!(store.evaluate(&lit), Ok(true));
        assert_eq!(store.is_goal_satisfied(), Ok(true));
    }

    #[test]
    fn any_definition_derives() {
        let decl = alternatives();
        let mut store = FactStore::new(&decl);
        let good = |x: &str| Formula::Derived(Atom::new("good", vec![obj(x)]));
        assert_eq!(store.evaluate(&good("a1")), Ok(true));
        assert_eq!(store.evaluate(&good("b1")), Ok(true));
        assert_eq!(store.evaluate(&good("c1")), Ok(false));

        store.remove_named("p", &["a1"]).unwrap();
        assert_eq!(store.evaluate(&good("a1")), Ok(false));
        store.add_named("q", &["c1"]).unwrap();
        assert_eq!(store.evaluate(&good("c1")), Ok(true));
    }

    #[test]
    fn recursive_derived_predicates() {
        let decl = reachability();
        let store = FactStore::new(&decl);
        let reachable = |a: &str, b: &str| Formula::Derived(Atom::new("reachable", vec![obj(a), obj(b)]));
        assert_eq!(store.evaluate(&reachable("a", "b")), Ok(true));
        assert_eq!(store.evaluate(&reachable("a", "c")), Ok(true));
        assert_eq!(store.evaluate(&reachable("c", "a")), Ok(true));
        assert_eq!(store.evaluate(&reachable("a", "d")), Ok(false));
    }

    #[test]
    fn missing_goal() {
        let mut decl = gripper();
        decl.set_goal(None);
        let store = FactStore::new(&decl);
        assert_eq!(
            store.is_goal_satisfied(),
            Err(SimulationError::Invalid(ValidationError::GoalNotDeclared))
        );
    }
}
