use crate::errors::*;
use crate::{Plan, PlanStep, Res, Sym};

use regex::Regex;
use smallvec::{SmallVec, smallvec};
use std::fmt::{Display, Error, Formatter};
use std::str::FromStr;
use std::sync::{Arc, LazyLock};

use crate::pddl::input::*;
use crate::pddl::sexpr::*;
use crate::utils::disp_iter;

pub fn parse_pddl_domain(pb: Input) -> Res<Domain> {
    let expr = parse(Arc::new(pb))?;
    read_domain(expr).title("Invalid domain: Syntax error")
}
pub fn parse_pddl_problem(pb: Input) -> Res<Problem> {
    let expr = parse(Arc::new(pb))?;
    read_problem(expr).title("Invalid problem: Syntax error")
}

static COST_ANNOTATION: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^\s*;\s*cost\s*=\s*([0-9]+)"));

/// Parses a sequential plan, as a sequence of `(action arg1 arg2 ...)`.
/// A cost annotation of the form `; cost = 12 (unit cost)` is recorded but not interpreted.
pub fn parse_plan(plan: Input) -> Res<Plan> {
    let cost_regex = COST_ANNOTATION.as_ref().map_err(|e| Message::error(e.to_string()))?;
    let cost = plan
        .text
        .lines()
        .find_map(|l| cost_regex.captures(l))
        .and_then(|m| u64::from_str(&m[1]).ok());

    let pb = Arc::new(plan);
    let expr = parse_many(pb)?;
    let mut steps = Vec::with_capacity(expr.len());
    for e in expr {
        let mut elems = e
            .as_list_iter()
            .ok_or_else(|| e.invalid("expected a list with action name and parameters"))?;
        let name = elems.pop_atom()?.clone();
        let mut arguments = Vec::new();
        while !elems.is_empty() {
            let param = elems.pop_atom()?;
            arguments.push(param.clone());
        }
        steps.push(PlanStep {
            name,
            arguments,
            span: Some(e.loc()),
        });
    }
    Ok(Plan { steps, cost })
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PddlFeature {
    Strips,
    Typing,
    Equality,
    NegativePreconditions,
    DisjunctivePreconditions,
    UniversalPreconditions,
    ExistentialPreconditions,
    QuantifiedPreconditions,
    ConditionalEffects,
    DerivedPredicates,
    Fluents,
    NumericFluent,
    ObjectFluent,
    Adl,
    ActionCosts,
    DurativeAction,
    Hierarchy,
    Preferences,
    Constraints,
}
impl std::str::FromStr for PddlFeature {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ":strips" => Ok(PddlFeature::Strips),
            ":typing" => Ok(PddlFeature::Typing),
            ":equality" => Ok(PddlFeature::Equality),
            ":negative-preconditions" => Ok(PddlFeature::NegativePreconditions),
            ":disjunctive-preconditions" => Ok(PddlFeature::DisjunctivePreconditions),
            ":universal-preconditions" => Ok(PddlFeature::UniversalPreconditions),
            ":existential-preconditions" => Ok(PddlFeature::ExistentialPreconditions),
            ":quantified-preconditions" => Ok(PddlFeature::QuantifiedPreconditions),
            ":conditional-effects" => Ok(PddlFeature::ConditionalEffects),
            ":derived-predicates" => Ok(PddlFeature::DerivedPredicates),
            ":fluents" => Ok(PddlFeature::Fluents),
            ":numeric-fluents" => Ok(PddlFeature::NumericFluent),
            ":object-fluents" => Ok(PddlFeature::ObjectFluent),
            ":adl" => Ok(PddlFeature::Adl),
            ":action-costs" => Ok(PddlFeature::ActionCosts),
            ":durative-actions" => Ok(PddlFeature::DurativeAction),
            ":hierarchy" => Ok(PddlFeature::Hierarchy),
            ":preferences" => Ok(PddlFeature::Preferences),
            ":constraints" => Ok(PddlFeature::Constraints),
            _ => Err(format!("Unknown feature `{s}`")),
        }
    }
}
impl Display for PddlFeature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let formatted = match self {
            PddlFeature::Strips => ":strips",
            PddlFeature::Typing => ":typing",
            PddlFeature::Equality => ":equality",
            PddlFeature::NegativePreconditions => ":negative-preconditions",
            PddlFeature::DisjunctivePreconditions => ":disjunctive-preconditions",
            PddlFeature::UniversalPreconditions => ":universal-preconditions",
            PddlFeature::ExistentialPreconditions => ":existential-preconditions",
            PddlFeature::QuantifiedPreconditions => ":quantified-preconditions",
            PddlFeature::ConditionalEffects => ":conditional-effects",
            PddlFeature::DerivedPredicates => ":derived-predicates",
            PddlFeature::Fluents => ":fluents",
            PddlFeature::NumericFluent => ":numeric-fluents",
            PddlFeature::ObjectFluent => ":object-fluents",
            PddlFeature::Adl => ":adl",
            PddlFeature::ActionCosts => ":action-costs",
            PddlFeature::DurativeAction => ":durative-actions",
            PddlFeature::Hierarchy => ":hierarchy",
            PddlFeature::Preferences => ":preferences",
            PddlFeature::Constraints => ":constraints",
        };
        write!(f, "{formatted}")
    }
}

#[derive(Debug, Clone)]
pub struct Domain {
    pub name: Sym,
    pub features: Vec<PddlFeature>,
    pub types: Vec<TypedSymbol>,
    pub constants: Vec<TypedSymbol>,
    pub predicates: Vec<Predicate>,
    pub functions: Vec<Function>,
    pub derived: Vec<Derived>,
    pub actions: Vec<Action>,
}
impl Display for Domain {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "# Domain : {}", self.name)?;
        write!(f, "\n# Types \n  ")?;
        disp_iter(f, self.types.iter(), "\n  ")?;
        write!(f, "\n# Constants \n  ")?;
        disp_iter(f, self.constants.iter(), "\n  ")?;
        write!(f, "\n# Predicates \n  ")?;
        disp_iter(f, self.predicates.iter(), "\n  ")?;
        write!(f, "\n# Functions \n  ")?;
        disp_iter(f, self.functions.iter(), "\n  ")?;
        write!(f, "\n# Derived \n  ")?;
        disp_iter(f, self.derived.iter(), "\n  ")?;
        write!(f, "\n# Actions \n  ")?;
        disp_iter(f, self.actions.iter(), "\n  ")?;
        Ok(())
    }
}

pub type Types = SmallVec<[Sym; 1]>;

/// A symbol with its (possibly empty) list of alternative types, e.g. `?x - (either room ball)`.
#[derive(Debug, Clone)]
pub struct TypedSymbol {
    pub symbol: Sym,
    /// Possible types of the symbol (`object` if empty)
    pub tpe: Types,
}
impl TypedSymbol {
    pub fn new(symbol: impl Into<Sym>, tpe: impl Into<Sym>) -> Self {
        Self {
            symbol: symbol.into(),
            tpe: smallvec![tpe.into()],
        }
    }

    pub fn new_union(symbol: impl Into<Sym>, tpe: Types) -> Self {
        Self {
            symbol: symbol.into(),
            tpe,
        }
    }
}

impl Display for TypedSymbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        match self.tpe.as_slice() {
            [tpe] => write!(f, "{}: {}", self.symbol, tpe),
            [] => write!(f, "{}", self.symbol),
            several => {
                write!(f, "{}: {{", self.symbol)?;
                disp_iter(f, several.iter(), ", ")?;
                write!(f, "}}")
            }
        }
    }
}

/// A PDDL predicate, i.e., state function whose codomain is the set of booleans.
#[derive(Debug, Clone)]
pub struct Predicate {
    pub name: Sym,
    pub args: Vec<TypedSymbol>,
    pub source: Option<Span>,
}
impl Display for Predicate {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "{}(", self.name)?;
        disp_iter(f, self.args.iter(), ", ")?;
        write!(f, ")")
    }
}

/// A PDDL function, i.e., state function whose codomain is the set of reals.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: Sym,
    pub args: Vec<TypedSymbol>,
    pub tpe: Option<Sym>,
    pub source: Option<Span>,
}

impl Display for Function {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}(", self.name)?;
        disp_iter(f, self.args.iter(), ", ")?;
        write!(f, ")")
    }
}

/// A derived predicate definition `(:derived (name ?x - t) body)`
#[derive(Debug, Clone)]
pub struct Derived {
    pub name: Sym,
    pub args: Vec<TypedSymbol>,
    pub body: SExpr,
    /// Span covering the entire definition
    pub span: Span,
}

impl Display for Derived {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "{}(", self.name)?;
        disp_iter(f, self.args.iter(), ", ")?;
        write!(f, ") := {}", self.body)
    }
}

#[derive(Clone, Debug)]
pub struct Action {
    pub name: Sym,
    pub args: Vec<TypedSymbol>,
    pub pre: Option<SExpr>,
    pub eff: Option<SExpr>,
    /// Span covering the entire action definition
    pub span: Span,
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "{}(", self.name)?;
        disp_iter(f, self.args.iter(), ", ")?;
        write!(f, ")")
    }
}

/// Consume a typed list of symbols
///  - (a - loc b - loc c - loc) : symbols a, b and c of type loc
///  - (a b c - loc)  : symbols a, b and c of type loc
///  - (a b c) : symbols a b and c of type object
///  - (a - (either loc obj)) : symbol a of type loc or obj
pub fn consume_typed_symbols(input: &mut ListIter) -> Res<Vec<TypedSymbol>> {
    let mut args = Vec::with_capacity(input.len() / 3);
    let mut untyped: Vec<Sym> = Vec::with_capacity(args.len());
    while !input.is_empty() {
        let next = input.pop_atom()?;
        if next.canonical_str() == "-" {
            let mut types = Types::with_capacity(1);
            let tpe = input.pop()?;
            if let Some(variants) = tpe.as_application("either") {
                for variant in variants {
                    types.push(
                        variant
                            .as_atom()
                            .cloned()
                            .ok_or_else(|| variant.invalid("expected type name"))?,
                    );
                }
            } else {
                types.push(tpe.as_atom().cloned().ok_or_else(|| tpe.invalid("expected type name"))?);
            }
            if untyped.is_empty() {
                return Err(next.invalid("type annotation without any symbol to annotate"));
            }
            args.extend(
                untyped
                    .drain(..)
                    .map(|name| TypedSymbol::new_union(name, types.clone())),
            );
        } else {
            untyped.push(next.clone());
        }
    }
    // no type given, everything is an object
    args.extend(untyped.drain(..).map(|name| TypedSymbol::new_union(name, smallvec![])));
    Ok(args)
}

fn read_domain(dom: SExpr) -> Res<Domain> {
    let dom = &mut dom.as_list_iter().ok_or_else(|| dom.invalid("Expected a list"))?;

    dom.pop_known_atom("define")?;

    // extract the name of the domain, of the form `(domain XXX)`
    let mut domain_name_decl = dom.pop_list()?.iter();
    domain_name_decl.pop_known_atom("domain")?;
    let name = domain_name_decl.pop_atom().title("missing name of domain")?.clone();

    let mut res = Domain {
        name,
        features: vec![],
        types: vec![],
        constants: vec![],
        predicates: vec![],
        functions: vec![],
        derived: vec![],
        actions: vec![],
    };

    for current in dom {
        // a property associates a key (e.g. `:predicates`) to a value or a sequence of values
        let mut property = current
            .as_list_iter()
            .ok_or_else(|| current.invalid("expected a property list"))?;

        match property.pop_atom()?.canonical_str() {
            ":requirements" => {
                for feature in property {
                    let feature = feature
                        .as_atom()
                        .ok_or_else(|| feature.invalid("Expected feature name but got list"))?;
                    let f = PddlFeature::from_str(feature.canonical_str()).map_err(|e| feature.invalid(e))?;
                    res.features.push(f);
                }
            }
            ":predicates" => {
                for pred in property {
                    let mut pred = pred.as_list_iter().ok_or_else(|| pred.invalid("Expected a list"))?;
                    let name = pred.pop_atom()?.clone();
                    let args = consume_typed_symbols(&mut pred)?;
                    res.predicates.push(Predicate {
                        name,
                        args,
                        source: Some(pred.loc()),
                    });
                }
            }
            ":types" => {
                if !res.types.is_empty() {
                    return Err(current.invalid("More than one ':types' section definition"));
                }
                res.types = consume_typed_symbols(&mut property)?;
            }
            ":constants" => {
                if !res.constants.is_empty() {
                    return Err(current.invalid("More than one ':constants' section definition"));
                }
                res.constants = consume_typed_symbols(&mut property)?;
            }
            ":functions" => {
                while let Ok(func) = property.pop() {
                    // element is necessarily a function name and parameters, e.g., (battery ?r)
                    let mut func = func.as_list_iter().ok_or_else(|| func.invalid("Expected a list"))?;
                    let name = func.pop_atom()?.clone();
                    let args = consume_typed_symbols(&mut func)?;

                    // from PDDL 3.1, it can have a type annotation, e.g., (battery ?r) - number
                    let tpe = if property.peek().is_some_and(|a| a.is_atom("-")) {
                        property.pop_known_atom("-")?;
                        Some(property.pop_atom().title("expected a type").cloned()?)
                    } else {
                        None
                    };
                    res.functions.push(Function {
                        name,
                        args,
                        tpe,
                        source: Some(func.loc()),
                    });
                }
            }
            ":derived" => {
                let mut head = property.pop_list().title("Expected the derived predicate and its parameters")?.iter();
                let name = head.pop_atom()?.clone();
                let args = consume_typed_symbols(&mut head)?;
                let body = property.pop().title("Missing body of derived predicate")?.clone();
                if let Some(unexpected) = property.next() {
                    return Err(unexpected.invalid("Expected end of derived predicate"));
                }
                res.derived.push(Derived {
                    name,
                    args,
                    body,
                    span: current.loc(),
                });
            }
            ":action" => {
                let name = property.pop_atom()?.clone();
                let mut args = Vec::new();
                let mut pre = None;
                let mut eff = None;
                while !property.is_empty() {
                    let key_expr = property.pop_atom()?;
                    let value = property.pop().tag(key_expr, "No value associated to arg")?;
                    match key_expr.canonical_str() {
                        ":parameters" => {
                            if !args.is_empty() {
                                return Err(key_expr.invalid("Duplicated ':parameters' tag is not allowed"));
                            }
                            let mut value = value
                                .as_list_iter()
                                .ok_or_else(|| value.invalid("Expected a parameter list"))?;
                            args = consume_typed_symbols(&mut value)?;
                        }
                        ":precondition" => {
                            if pre.is_some() {
                                return Err(key_expr.invalid("Duplicated ':precondition' tag is not allowed"));
                            }
                            pre = Some(value.clone());
                        }
                        ":effect" => {
                            if eff.is_some() {
                                return Err(key_expr.invalid("Duplicated ':effect' tag is not allowed"));
                            }
                            eff = Some(value.clone());
                        }
                        _ => return Err(key_expr.invalid("unsupported key in action")),
                    }
                }
                res.actions.push(Action {
                    name,
                    args,
                    pre,
                    eff,
                    span: current.loc(),
                })
            }
            _ => return Err(current.invalid("unsupported block")),
        }
    }
    Ok(res)
}

#[derive(Clone, Debug)]
pub struct Problem {
    pub problem_name: Sym,
    pub domain_name: Sym,
    pub objects: Vec<TypedSymbol>,
    pub init: Vec<SExpr>,
    pub goal: Option<SExpr>,
    pub metric: Option<Metric>,
}

#[derive(Clone, Debug)]
pub enum Metric {
    Minimize(SExpr),
    Maximize(SExpr),
}

impl Display for Problem {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "# Problem {} (domain: {})", &self.problem_name, &self.domain_name)?;
        write!(f, "\n# Objects \n  ")?;
        disp_iter(f, self.objects.iter(), "\n  ")?;
        write!(f, "\n# Init \n  ")?;
        disp_iter(f, self.init.iter(), "\n  ")?;
        write!(f, "\n# Goal \n  ")?;
        disp_iter(f, self.goal.iter(), "\n  ")?;
        Ok(())
    }
}

fn read_problem(problem: SExpr) -> Res<Problem> {
    let mut problem = problem
        .as_list_iter()
        .ok_or_else(|| problem.invalid("Expected a list"))?;
    problem.pop_known_atom("define")?;

    let mut problem_name = problem
        .pop_list()
        .title("Expected problem name definition of the form '(problem XXXXXX)'")?
        .iter();
    problem_name.pop_known_atom("problem")?;
    let problem_name = problem_name.pop_atom()?.clone();

    let mut domain_name_def = problem.pop_list()?.iter();
    domain_name_def.pop_known_atom(":domain")?;
    let domain_name = domain_name_def.pop_atom()?.clone();

    let mut res = Problem {
        problem_name,
        domain_name,
        objects: vec![],
        init: vec![],
        goal: None,
        metric: None,
    };

    for current in problem {
        // a property associates a key (e.g. `:objects`) to a value or a sequence of values
        let mut property = current
            .as_list_iter()
            .ok_or_else(|| current.invalid("Expected a list"))?;
        match property.pop_atom()?.canonical_str() {
            ":requirements" => {} // requirements are sometimes repeated in problems (IPC 2002)
            ":objects" => {
                let objects = consume_typed_symbols(&mut property)?;
                res.objects.extend(objects);
            }
            ":init" => {
                res.init.extend(property.cloned());
            }
            ":goal" => {
                if res.goal.is_some() {
                    return Err(current.invalid("More than one goal specified"));
                }
                let goal = property.pop().title("Empty goal")?;
                if let Some(unexpected) = property.next() {
                    return Err(unexpected.invalid("Expected a single goal formula"));
                }
                res.goal = Some(goal.clone());
            }
            ":metric" => {
                let qualifier = property.pop_atom()?;
                match qualifier.canonical_str() {
                    "minimize" => res.metric = Some(Metric::Minimize(property.pop().cloned()?)),
                    "maximize" => res.metric = Some(Metric::Maximize(property.pop().cloned()?)),
                    _ => return Err(qualifier.invalid("expected `maximize` or `minimize`")),
                }
            }
            _ => return Err(current.invalid("unsupported block")),
        }
    }

    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOMAIN: &str = "(define (domain Gripper)
        (:requirements :strips :typing)
        (:types room ball - object gripper)
        (:predicates (at-robby ?r - room) (at ?b - ball ?r - room) (free ?g - gripper) (carry ?o - ball ?g - gripper))
        (:functions (total-cost) - number)
        (:derived (busy ?g - gripper) (not (free ?g)))
        (:action move
            :parameters (?from ?to - room)
            :precondition (at-robby ?from)
            :effect (and (at-robby ?to) (not (at-robby ?from)))))";

    #[test]
    fn gripper_domain() -> Res<()> {
        let dom = parse_pddl_domain(Input::from_string(DOMAIN))?;
        assert_eq!(dom.name, Sym::from("gripper"));
        assert_eq!(dom.features, vec![PddlFeature::Strips, PddlFeature::Typing]);
        assert_eq!(dom.types.len(), 3);
        assert_eq!(dom.types[2].tpe.len(), 0);
        assert_eq!(dom.predicates.len(), 4);
        assert_eq!(dom.functions.len(), 1);
        assert_eq!(dom.functions[0].tpe.as_ref().map(|t| t.canonical_str()), Some("number"));
        assert_eq!(dom.derived.len(), 1);
        assert_eq!(dom.actions.len(), 1);
        let mv = &dom.actions[0];
        assert_eq!(mv.args.len(), 2);
        assert_eq!(mv.args[0].tpe.as_slice(), &[Sym::from("room")]);
        assert!(mv.pre.is_some() && mv.eff.is_some());
        Ok(())
    }

    #[test]
    fn problem() -> Res<()> {
        let pb = parse_pddl_problem(Input::from_string(
            "(define (problem p1) (:domain gripper)
              (:objects rooma roomb - room left - gripper)
              (:init (at-robby rooma) (free left))
              (:goal (and (at-robby roomb)))
              (:metric minimize (total-cost)))",
        ))?;
        assert_eq!(pb.problem_name, Sym::from("p1"));
        assert_eq!(pb.objects.len(), 3);
        assert_eq!(pb.init.len(), 2);
        assert!(pb.goal.is_some());
        assert!(matches!(pb.metric, Some(Metric::Minimize(_))));
        Ok(())
    }

    #[test]
    fn unsupported_constructs() {
        let durative = "(define (domain d) (:durative-action a :parameters () :duration (= ?duration 1)))";
        assert!(parse_pddl_domain(Input::from_string(durative)).is_err());
        let unknown_feature = "(define (domain d) (:requirements :teleportation))";
        assert!(parse_pddl_domain(Input::from_string(unknown_feature)).is_err());
        let dangling_type = "(define (domain d) (:types - room))";
        assert!(parse_pddl_domain(Input::from_string(dangling_type)).is_err());
    }

    #[test]
    fn plans() -> Res<()> {
        let plan = parse_plan(Input::from_string(
            "(pick Ball1 RoomA left)\n(move rooma roomb)\n(noop)\n; cost = 3 (unit cost)\n",
        ))?;
        assert_eq!(plan.len(), 3);
        assert_eq!(plan.cost, Some(3));
        assert_eq!(plan.steps[0].name, Sym::from("pick"));
        assert_eq!(plan.steps[0].arguments, vec![Sym::from("ball1"), Sym::from("rooma"), Sym::from("left")]);
        assert!(plan.steps[2].arguments.is_empty());
        assert_eq!(plan.steps[0].to_string(), "(pick Ball1 RoomA left)");

        let no_cost = parse_plan(Input::from_string("(move rooma roomb)"))?;
        assert_eq!(no_cost.cost, None);
        assert!(parse_plan(Input::from_string("move rooma roomb")).is_err());
        Ok(())
    }
}
