//! Resolution of a parsed domain and problem into a [`Declaration`], where every symbol is bound to its
//! declaration: types to the type hierarchy, variables to their enclosing parameter list, and
//! constants/objects to the object namespace.

use std::sync::Arc;

use crate::errors::*;
use crate::pddl::parser::{self, TypedSymbol};
use crate::pddl::sexpr::SExpr;
use crate::*;

/// Builtin numeric comparisons and assignments, whose semantics is not interpreted.
const NUMERIC_OPERATORS: [&str; 9] = [
    "<",
    ">",
    "<=",
    ">=",
    "increase",
    "decrease",
    "assign",
    "scale-up",
    "scale-down",
];

/// Variables in scope of a formula.
type Scope = im::HashSet<Sym>;

pub fn contextualize(domain: &parser::Domain, problem: &parser::Problem) -> Res<Declaration> {
    let mut types = TypeHierarchy::new();
    for tpe in &domain.types {
        if tpe.tpe.is_empty() {
            types.add_type(tpe.symbol.clone(), None)?;
        }
        for parent in &tpe.tpe {
            types.add_type(tpe.symbol.clone(), Some(parent.clone()))?;
        }
    }
    let types = Arc::new(types);

    let mut objects = Objects::new();
    for o in domain.constants.iter().chain(problem.objects.iter()) {
        let tpe = types.get_union_type(&o.tpe)?;
        objects.add_object(o.symbol.clone(), tpe)?;
    }
    let objects = Arc::new(objects);

    let mut predicates = hashbrown::HashMap::new();
    for p in &domain.predicates {
        let parameters = parameters(&p.args, &types)?;
        let pred = Predicate {
            name: p.name.clone(),
            parameters,
        };
        if let Some(previous) = predicates.insert(p.name.clone(), pred) {
            return Err(p.name.invalid("Duplicated predicate").info(&previous.name, "previously declared here"));
        }
    }

    let mut ctx = Context {
        types: &types,
        objects: &objects,
        predicates: &predicates,
        derived: hashbrown::HashMap::new(),
        functions: domain.functions.iter().map(|f| f.name.clone()).collect(),
    };
    for d in &domain.derived {
        ctx.derived.entry(d.name.clone()).or_default().push(d.args.len());
    }

    let mut derived: hashbrown::HashMap<Sym, Vec<DerivedPredicate>> = hashbrown::HashMap::new();
    for d in &domain.derived {
        let params = parameters(&d.args, &types)?;
        let body = ctx
            .formula(&d.body, &scope_of(&params))
            .title(format!("Invalid derived predicate `{}`", d.name))?;
        derived.entry(d.name.clone()).or_default().push(DerivedPredicate {
            name: d.name.clone(),
            parameters: params,
            body,
        });
    }

    let mut actions = hashbrown::HashMap::new();
    for a in &domain.actions {
        let params = parameters(&a.args, &types)?;
        let scope = scope_of(&params);
        let precondition = match &a.pre {
            Some(pre) => ctx.formula(pre, &scope),
            None => Ok(Formula::empty()),
        }
        .title(format!("Invalid precondition of action `{}`", a.name))?;
        let effect = match &a.eff {
            Some(eff) => ctx.formula(eff, &scope),
            None => Ok(Formula::empty()),
        }
        .title(format!("Invalid effect of action `{}`", a.name))?;
        let schema = ActionSchema {
            name: a.name.clone(),
            parameters: params,
            precondition,
            effect,
        };
        if let Some(previous) = actions.insert(a.name.clone(), schema) {
            return Err(a.name.invalid("Duplicated action").info(&previous.name, "previously declared here"));
        }
    }

    let mut init = Vec::with_capacity(problem.init.len());
    for fact in &problem.init {
        if let Some(fact) = ctx.init_fact(fact).title("Invalid initial state")? {
            init.push(fact);
        }
    }

    let goal = match &problem.goal {
        Some(goal) => Some(ctx.formula(goal, &Scope::new()).title("Invalid goal")?),
        None => None,
    };

    Ok(Declaration {
        domain_name: domain.name.clone(),
        problem_name: problem.problem_name.clone(),
        grounder: ObjectGrounder::new(types.clone(), objects.clone()),
        types,
        objects,
        predicates,
        actions,
        derived,
        init,
        goal,
    })
}

fn parameters(args: &[TypedSymbol], types: &TypeHierarchy) -> Res<Vec<Param>> {
    let mut params = Vec::with_capacity(args.len());
    for arg in args {
        if !arg.symbol.is_variable() {
            return Err(arg.symbol.invalid("Expected a variable (starting with `?`)"));
        }
        params.push(Param::new(arg.symbol.clone(), types.get_union_type(&arg.tpe)?));
    }
    Ok(params)
}

fn scope_of(params: &[Param]) -> Scope {
    params.iter().map(|p| p.name.clone()).collect()
}

struct Context<'a> {
    types: &'a TypeHierarchy,
    objects: &'a Objects,
    predicates: &'a hashbrown::HashMap<Sym, Predicate>,
    /// Arity of each definition of each derived predicate
    derived: hashbrown::HashMap<Sym, Vec<usize>>,
    functions: hashbrown::HashSet<Sym>,
}

impl Context<'_> {
    fn formula(&self, e: &SExpr, scope: &Scope) -> Res<Formula> {
        let mut list = e.as_list_iter().ok_or_else(|| e.invalid("Expected a formula"))?;
        if list.is_empty() {
            return Ok(Formula::empty());
        }
        let head = list.pop_atom()?;
        let args: Vec<&SExpr> = list.collect();
        let unary = |args: &[&SExpr]| match args {
            [x] => self.formula(x, scope),
            _ => Err(e.invalid(format!("`{head}` expects a single argument"))),
        };
        let binary = |args: &[&SExpr]| -> Res<(Box<Formula>, Box<Formula>)> {
            match args {
                [a, b] => Ok((Box::new(self.formula(a, scope)?), Box::new(self.formula(b, scope)?))),
                _ => Err(e.invalid(format!("`{head}` expects two arguments"))),
            }
        };

        match head.canonical_str() {
            "and" => Ok(Formula::And(self.formulas(&args, scope)?)),
            "or" => Ok(Formula::Or(self.formulas(&args, scope)?)),
            "not" => Ok(Formula::not(unary(args.as_slice())?)),
            "imply" => {
                let (a, b) = binary(args.as_slice())?;
                Ok(Formula::Imply(a, b))
            }
            "when" => {
                let (c, eff) = binary(args.as_slice())?;
                Ok(Formula::When(c, eff))
            }
            "forall" | "exists" => {
                let [params, body] = args.as_slice() else {
                    return Err(e.invalid(format!("`{head}` expects a parameter list and a body")));
                };
                let mut params_list = params
                    .as_list_iter()
                    .ok_or_else(|| params.invalid("Expected a parameter list"))?;
                let params = parameters(&parser::consume_typed_symbols(&mut params_list)?, self.types)?;
                let mut inner = scope.clone();
                for p in &params {
                    inner.insert(p.name.clone());
                }
                let body = Box::new(self.formula(body, &inner)?);
                if head.canonical_str() == "forall" {
                    Ok(Formula::Forall(params, body))
                } else {
                    Ok(Formula::Exists(params, body))
                }
            }
            EQUALITY => {
                if args.len() == 2 && args.iter().all(|a| a.as_atom().is_some_and(|a| !is_number(a))) {
                    let terms = self.terms(&args, scope)?;
                    Ok(Formula::Atom(Atom::new(head.clone(), terms)))
                } else {
                    // equality between numeric expressions
                    Ok(Formula::Numeric(e.clone()))
                }
            }
            op if NUMERIC_OPERATORS.contains(&op) => Ok(Formula::Numeric(e.clone())),
            name => {
                if let Some(arities) = self.derived.get(name) {
                    if !arities.contains(&args.len()) {
                        return Err(e.invalid(format!(
                            "derived predicate `{head}` has no definition with {} parameters",
                            args.len()
                        )));
                    }
                    let terms = self.terms(&args, scope)?;
                    Ok(Formula::Derived(Atom::new(head.clone(), terms)))
                } else if let Some(pred) = self.predicates.get(name) {
                    if pred.parameters.len() != args.len() {
                        return Err(e
                            .invalid(format!(
                                "predicate `{head}` expects {} arguments but got {}",
                                pred.parameters.len(),
                                args.len()
                            ))
                            .info(&pred.name, "declared here"));
                    }
                    let terms = self.terms(&args, scope)?;
                    Ok(Formula::Atom(Atom::new(head.clone(), terms)))
                } else if self.functions.contains(name) {
                    Err(head.invalid("Function used in place of a predicate"))
                } else {
                    Err(head.invalid("Unknown predicate"))
                }
            }
        }
    }

    fn formulas(&self, args: &[&SExpr], scope: &Scope) -> Res<Vec<Formula>> {
        args.iter().map(|a| self.formula(a, scope)).collect()
    }

    fn terms(&self, args: &[&SExpr], scope: &Scope) -> Res<Vec<Term>> {
        args.iter().map(|a| self.term(a, scope)).collect()
    }

    fn term(&self, e: &SExpr, scope: &Scope) -> Res<Term> {
        let sym = e.as_atom().ok_or_else(|| e.invalid("Expected a variable or an object"))?;
        if sym.is_variable() {
            if scope.contains(sym) {
                Ok(Term::Var(sym.clone()))
            } else {
                Err(sym.invalid("Unbound variable"))
            }
        } else if self.objects.contains(sym.canonical_str()) {
            Ok(Term::Object(sym.clone()))
        } else {
            Err(sym.invalid("Unknown object or constant"))
        }
    }

    /// Builds a fact of the initial state. Numeric assignments and negative literals carry no
    /// information for a set of facts under the closed world assumption and are ignored.
    fn init_fact(&self, e: &SExpr) -> Res<Option<Fact>> {
        if e.as_application(EQUALITY).is_some() || e.as_application("not").is_some() {
            return Ok(None);
        }
        match self.formula(e, &Scope::new())? {
            Formula::Atom(atom) => {
                let fact = atom
                    .to_fact()
                    .map_err(|var| var.invalid("Unexpected variable in initial state"))?;
                Ok(Some(fact))
            }
            _ => Err(e.invalid("Expected a ground atom")),
        }
    }
}

fn is_number(sym: &Sym) -> bool {
    sym.canonical_str().parse::<f64>().is_ok()
}
