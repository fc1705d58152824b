use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use planx::errors::Spanned;
use planx::pddl::{Input, contextualize, find_domain_of, find_problem_of, parse_pddl_domain, parse_pddl_problem, parse_plan};
use planval::validate;

/// Checks that a sequential plan solves a PDDL problem.
#[derive(Parser, Debug)]
#[clap(name = "plan-val", about = "Validator of sequential PDDL plans")]
struct Args {
    /// Path to the plan file.
    plan: PathBuf,
    /// Path to the problem file. If absent, it is inferred from the name of the plan file.
    #[clap(short, long)]
    problem: Option<PathBuf>,
    /// Path to the domain file. If absent, it is inferred from the name of the problem file.
    #[clap(short, long)]
    domain: Option<PathBuf>,
    /// Logging level to use: one of "error", "warn", "info", "debug", "trace"
    #[clap(short, long, default_value = "warn")]
    log_level: tracing::Level,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // set up logger
    let subscriber = tracing_subscriber::fmt()
        .with_timer(tracing_subscriber::fmt::time::Uptime::from(Instant::now()))
        .with_writer(std::io::stderr)
        .with_max_level(args.log_level)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Could not set up the logger: {e}");
    }

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("{e:?}");
            ExitCode::from(2)
        }
    }
}

/// Validates the plan given on the command line, returns whether it is valid.
fn run(args: &Args) -> Result<bool> {
    let plan_file = &args.plan;
    anyhow::ensure!(plan_file.exists(), "Plan file {} does not exist", plan_file.display());

    let problem_file = match &args.problem {
        Some(file) => file.clone(),
        None => find_problem_of(plan_file).context("Consider specifying the problem with the option -p/--problem")?,
    };
    let domain_file = match &args.domain {
        Some(file) => file.clone(),
        None => find_domain_of(&problem_file).context("Consider specifying the domain with the option -d/--domain")?,
    };
    tracing::info!(domain = %domain_file.display(), problem = %problem_file.display(), "input files");

    let dom = parse_pddl_domain(Input::from_file(&domain_file)?)?;
    let prob = parse_pddl_problem(Input::from_file(&problem_file)?)?;
    let decl = contextualize(&dom, &prob)?;
    let plan = parse_plan(Input::from_file(plan_file)?)?;

    let report = validate(&plan, &decl)?;
    if report.valid {
        println!("== PLAN IS VALID ==");
    } else {
        println!("== PLAN IS INVALID ==");
        if let Some(step) = &report.failed_step {
            let reason = report.error.as_deref().unwrap_or("cannot be applied");
            println!("{}", step.invalid(reason));
        } else if let Some(reason) = &report.error {
            println!("{reason}");
        }
    }
    println!("Executed steps: {}/{}", report.executed_steps, plan.len());
    if let Some(cost) = plan.cost {
        tracing::debug!(cost, "announced plan cost");
    }
    if let Some(metric) = &prob.metric {
        tracing::debug!(?metric, "metric of the problem, not checked");
    }
    Ok(report.valid)
}
