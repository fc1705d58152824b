use planx::pddl::{Input, contextualize, parse_pddl_domain, parse_pddl_problem, parse_plan};
use planx::{Declaration, Plan, PlanStep};
use tracing::{Level, debug, info, span};

use crate::errors::{Error, FormulaError, SimulationError};
use crate::models::simulator::Simulator;

/* ========================================================================== */
/*                                  Validation                                */
/* ========================================================================== */

/// Outcome of the validation of a plan.
#[derive(Clone, Debug)]
pub struct ValidationReport {
    pub valid: bool,
    /// Reason for the plan to be invalid.
    pub error: Option<String>,
    /// Index of the last step that was successfully applied, if any.
    pub last_step: Option<usize>,
    pub executed_steps: usize,
    /// Step that could not be applied.
    pub failed_step: Option<PlanStep>,
}

/// Replays a plan from the initial state of a problem, stopping at the first step that cannot be applied.
pub fn validate(plan: &Plan, decl: &Declaration) -> Result<ValidationReport, FormulaError> {
    let mut validator = PlanValidator::new();
    let valid = validator.validate(plan, decl)?;
    Ok(ValidationReport {
        valid,
        error: validator.error().map(|e| e.to_string()),
        last_step: validator.last_step(),
        executed_steps: validator.executed_steps(),
        failed_step: validator.failed_step().cloned(),
    })
}

/// Parses the domain, problem and plan, resolves the planning task and validates the plan.
pub fn validate_pddl(domain: Input, problem: Input, plan: Input) -> Result<ValidationReport, Error> {
    let domain = parse_pddl_domain(domain)?;
    let problem = parse_pddl_problem(problem)?;
    let decl = contextualize(&domain, &problem)?;
    let plan = parse_plan(plan)?;
    Ok(validate(&plan, &decl)?)
}

/// Validator keeping track of the progress of the last validation.
#[derive(Clone, Debug, Default)]
pub struct PlanValidator {
    executed: usize,
    failed: Option<PlanStep>,
    error: Option<String>,
}

impl PlanValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if all steps of the plan can be applied in sequence and the resulting state satisfies the goal.
    ///
    /// An invalid plan is not an error: the reason is available through [`PlanValidator::error`].
    /// Only a malformed declaration results in an error.
    pub fn validate(&mut self, plan: &Plan, decl: &Declaration) -> Result<bool, FormulaError> {
        self.executed = 0;
        self.failed = None;
        self.error = None;
        let _span = span!(Level::DEBUG, "validate", problem = %decl.problem_name).entered();

        let mut simulator = Simulator::new(decl);
        for step in plan.iter() {
            match simulator.step(step.name.canonical_str(), step.arguments.as_slice()) {
                Ok(()) => self.executed += 1,
                Err(SimulationError::Invalid(e)) => {
                    debug!(step = self.executed, "{step} cannot be applied: {e}");
                    self.error = Some(format!("Step {} {step}: {e}", self.executed));
                    self.failed = Some(step.clone());
                    return Ok(false);
                }
                Err(SimulationError::Formula(e)) => return Err(e),
            }
        }

        match simulator.state().is_goal_satisfied() {
            Ok(true) => {
                info!(steps = self.executed, "plan is valid");
                Ok(true)
            }
            Ok(false) => {
                debug!("final state:\n{}", simulator.state());
                self.error = Some("The goal is not satisfied by the final state".to_string());
                Ok(false)
            }
            Err(SimulationError::Invalid(e)) => {
                self.error = Some(e.to_string());
                Ok(false)
            }
            Err(SimulationError::Formula(e)) => Err(e),
        }
    }

    /// Number of steps successfully applied during the last validation.
    pub fn executed_steps(&self) -> usize {
        self.executed
    }

    /// Index of the last step successfully applied during the last validation.
    pub fn last_step(&self) -> Option<usize> {
        self.executed.checked_sub(1)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn failed_step(&self) -> Option<&PlanStep> {
        self.failed.as_ref()
    }
}

/* ========================================================================== */
/*                                    Tests                                   */
/* ========================================================================== */
