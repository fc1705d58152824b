use std::fmt::{Display, Formatter};

use itertools::Itertools;

use crate::errors::{Span, Spanned};
use crate::*;

/// A step of a sequential plan: the name of an action and its arguments, as written in the plan.
#[derive(Clone, Debug)]
pub struct PlanStep {
    pub name: Sym,
    pub arguments: Vec<Sym>,
    pub span: Option<Span>,
}

impl PlanStep {
    pub fn new<S: Into<Sym>>(name: impl Into<Sym>, arguments: impl IntoIterator<Item = S>) -> Self {
        PlanStep {
            name: name.into(),
            arguments: arguments.into_iter().map(|a| a.into()).collect(),
            span: None,
        }
    }
}

impl Spanned for PlanStep {
    fn span(&self) -> Option<&Span> {
        self.span.as_ref()
    }
}

impl Display for PlanStep {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.arguments.is_empty() {
            write!(f, "({})", self.name)
        } else {
            write!(f, "({} {})", self.name, self.arguments.iter().format(" "))
        }
    }
}

/// A sequential plan.
#[derive(Clone, Debug, Default)]
pub struct Plan {
    pub steps: Vec<PlanStep>,
    /// Cost announced by the planner (e.g. `; cost = 12 (unit cost)`), never checked against the actual plan.
    pub cost: Option<u64>,
}

impl Plan {
    pub fn new(steps: Vec<PlanStep>) -> Self {
        Plan { steps, cost: None }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlanStep> + '_ {
        self.steps.iter()
    }
}

impl Display for Plan {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for step in &self.steps {
            writeln!(f, "{step}")?;
        }
        if let Some(cost) = self.cost {
            writeln!(f, "; cost = {cost}")?;
        }
        Ok(())
    }
}
