use std::path::PathBuf;

use anyhow::Result;
use planval::{ValidationReport, validate_pddl};
use planx::pddl::Input;

pub fn resource(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/resources");
    path.push(name);
    path
}

fn input(name: &str) -> Result<Input> {
    Ok(Input::from_file(&resource(name))?)
}

/// Validates the plan `<name>.plan` for the gripper problem.
pub fn validate_gripper_plan(name: &str) -> Result<ValidationReport> {
    let report = validate_pddl(
        input("gripper-domain.pddl")?,
        input("gripper.pddl")?,
        input(&format!("{name}.plan"))?,
    )?;
    Ok(report)
}
