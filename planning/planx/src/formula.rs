use std::fmt::{Debug, Display, Formatter};

use itertools::Itertools;
use smallvec::SmallVec;

use crate::pddl::sexpr::SExpr;
use crate::utils::{disp_application, disp_iter};
use crate::*;

/// Argument of an atom: either a concrete object or a variable bound by an enclosing scope.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Term {
    Object(Sym),
    Var(Sym),
}

impl Term {
    pub fn name(&self) -> &Sym {
        match self {
            Term::Object(s) | Term::Var(s) => s,
        }
    }
}

impl Display for Term {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Name of the built-in equality predicate.
pub const EQUALITY: &str = "=";

/// A predicate applied to a sequence of terms.
#[derive(Clone, Debug, PartialEq)]
pub struct Atom {
    pub predicate: Sym,
    pub args: Vec<Term>,
}

impl Atom {
    pub fn new(predicate: impl Into<Sym>, args: Vec<Term>) -> Self {
        Atom {
            predicate: predicate.into(),
            args,
        }
    }

    /// True if this is an application of the built-in equality `(= a b)`.
    pub fn is_equality(&self) -> bool {
        self.predicate == EQUALITY && self.args.len() == 2
    }

    /// Replaces every bound variable by its value.
    pub fn ground(&self, bindings: &Bindings) -> Atom {
        let args = self
            .args
            .iter()
            .map(|arg| match arg {
                Term::Var(v) => match bindings.get(v) {
                    Some(value) => Term::Object(value.clone()),
                    None => arg.clone(),
                },
                Term::Object(_) => arg.clone(),
            })
            .collect();
        Atom {
            predicate: self.predicate.clone(),
            args,
        }
    }

    /// Converts a ground atom into a fact.
    /// Fails with the first variable of the atom if it is not ground.
    pub fn to_fact(&self) -> Result<Fact, Sym> {
        let mut args = SmallVec::with_capacity(self.args.len());
        for arg in &self.args {
            match arg {
                Term::Object(o) => args.push(o.detached()),
                Term::Var(v) => return Err(v.clone()),
            }
        }
        Ok(Fact {
            predicate: self.predicate.detached(),
            args,
        })
    }
}

impl Display for Atom {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        disp_application(f, &self.predicate, self.args.iter())
    }
}

/// A ground fact: a predicate applied to objects, with no source or type annotation.
///
/// Two facts are equal iff they have the same predicate and the same arguments.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fact {
    predicate: Sym,
    args: SmallVec<[Sym; 4]>,
}

impl Fact {
    pub fn new<S: Into<Sym>>(predicate: impl Into<Sym>, args: impl IntoIterator<Item = S>) -> Self {
        Fact {
            predicate: predicate.into().detached(),
            args: args.into_iter().map(|a| a.into().detached()).collect(),
        }
    }

    pub fn predicate(&self) -> &Sym {
        &self.predicate
    }

    pub fn args(&self) -> &[Sym] {
        &self.args
    }
}

impl Display for Fact {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        disp_application(f, &self.predicate, self.args.iter())
    }
}
impl Debug for Fact {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self}")
    }
}

/// A typed variable declaration, as found in action parameters or quantifiers.
#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub name: Sym,
    pub tpe: Type,
}

impl Param {
    pub fn new(name: impl Into<Sym>, tpe: Type) -> Self {
        Param { name: name.into(), tpe }
    }
}

impl Display for Param {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.name, self.tpe)
    }
}

/// A first order formula, used for preconditions, goals, effects and bodies of derived predicates.
#[derive(Clone, Debug, PartialEq)]
pub enum Formula {
    Atom(Atom),
    Not(Box<Formula>),
    And(Vec<Formula>),
    Or(Vec<Formula>),
    Imply(Box<Formula>, Box<Formula>),
    Forall(Vec<Param>, Box<Formula>),
    Exists(Vec<Param>, Box<Formula>),
    /// Conditional effect `(when condition effect)`
    When(Box<Formula>, Box<Formula>),
    /// Reference to a derived predicate, whose truth is given by the bodies of its definitions.
    Derived(Atom),
    /// Numeric condition or effect, kept opaque.
    Numeric(SExpr),
}

impl Formula {
    /// The empty conjunction, always true.
    pub fn empty() -> Formula {
        Formula::And(Vec::new())
    }

    pub fn not(f: Formula) -> Formula {
        Formula::Not(Box::new(f))
    }

    /// Short human readable name of the kind of formula.
    pub fn kind(&self) -> &'static str {
        match self {
            Formula::Atom(a) if a.is_equality() => "equality",
            Formula::Atom(_) => "atom",
            Formula::Not(_) => "negation",
            Formula::And(_) => "conjunction",
            Formula::Or(_) => "disjunction",
            Formula::Imply(_, _) => "implication",
            Formula::Forall(_, _) => "universal quantification",
            Formula::Exists(_, _) => "existential quantification",
            Formula::When(_, _) => "conditional effect",
            Formula::Derived(_) => "derived predicate",
            Formula::Numeric(_) => "numeric expression",
        }
    }

    /// Builds a new formula where all variables bound in `bindings` are replaced with their values.
    ///
    /// Variables declared by a quantifier shadow any binding of the same name in `bindings`.
    pub fn ground(&self, bindings: &Bindings) -> Formula {
        if bindings.is_empty() {
            return self.clone();
        }
        let rec = |f: &Formula| Box::new(f.ground(bindings));
        match self {
            Formula::Atom(a) => Formula::Atom(a.ground(bindings)),
            Formula::Derived(a) => Formula::Derived(a.ground(bindings)),
            Formula::Not(f) => Formula::Not(rec(f)),
            Formula::And(fs) => Formula::And(fs.iter().map(|f| f.ground(bindings)).collect()),
            Formula::Or(fs) => Formula::Or(fs.iter().map(|f| f.ground(bindings)).collect()),
            Formula::Imply(a, b) => Formula::Imply(rec(a), rec(b)),
            Formula::When(c, e) => Formula::When(rec(c), rec(e)),
            Formula::Forall(params, body) => {
                Formula::Forall(params.clone(), Box::new(body.ground(&bindings.without(params))))
            }
            Formula::Exists(params, body) => {
                Formula::Exists(params.clone(), Box::new(body.ground(&bindings.without(params))))
            }
            Formula::Numeric(e) => Formula::Numeric(e.clone()),
        }
    }
}

impl Display for Formula {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Formula::Atom(a) | Formula::Derived(a) => write!(f, "{a}"),
            Formula::Not(x) => write!(f, "(not {x})"),
            Formula::And(xs) => disp_application(f, "and", xs.iter()),
            Formula::Or(xs) => disp_application(f, "or", xs.iter()),
            Formula::Imply(a, b) => write!(f, "(imply {a} {b})"),
            Formula::When(c, e) => write!(f, "(when {c} {e})"),
            Formula::Forall(params, body) | Formula::Exists(params, body) => {
                let q = if matches!(self, Formula::Forall(_, _)) {
                    "forall"
                } else {
                    "exists"
                };
                write!(f, "({q} (")?;
                disp_iter(f, params.iter(), " ")?;
                write!(f, ") {body})")
            }
            Formula::Numeric(e) => write!(f, "{e}"),
        }
    }
}

/// Substitution environment, associating variables to the objects they are bound to.
///
/// Backed by a persistent map: extending an environment leaves the original untouched.
#[derive(Clone, Debug, Default)]
pub struct Bindings(im::HashMap<Sym, Sym>);

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pairs each parameter with the object at the same position.
    pub fn from_params<'a>(params: &[Param], values: impl IntoIterator<Item = &'a Sym>) -> Self {
        params
            .iter()
            .map(|p| p.name.detached())
            .zip(values.into_iter().map(|v| v.detached()))
            .collect()
    }

    pub fn bind(&self, var: Sym, value: Sym) -> Bindings {
        Bindings(self.0.update(var, value))
    }

    pub fn get(&self, var: &Sym) -> Option<&Sym> {
        self.0.get(var)
    }

    /// Returns an environment without any of the given parameters.
    pub fn without(&self, params: &[Param]) -> Bindings {
        let mut res = self.0.clone();
        for p in params {
            res.remove(&p.name);
        }
        Bindings(res)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<(Sym, Sym)> for Bindings {
    fn from_iter<T: IntoIterator<Item = (Sym, Sym)>>(iter: T) -> Self {
        Bindings(iter.into_iter().collect())
    }
}

impl Display for Bindings {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let entries = self.0.iter().sorted().map(|(k, v)| format!("{k}={v}"));
        write!(f, "{{")?;
        disp_iter(f, entries, ", ")?;
        write!(f, "}}")
    }
}
