use anyhow::Result;
use planval::ValidationReport;

mod common;

fn validate(name: &str) -> Result<ValidationReport> {
    common::validate_gripper_plan(name)
}

#[cfg(test)]
mod test {
    use super::validate;

    macro_rules! make_test {
        ($name:ident, $file:expr, $valid:expr, $executed:expr) => {
            paste::item! {
                #[test]
                fn [< test_ $name >] () {
                    let result = validate($file);
                    assert!(result.is_ok(), "\x1b[91m{:?}\x1b[0m", result.as_ref().err());
                    let report = result.unwrap();
                    assert_eq!(report.valid, $valid, "{:?}", report.error);
                    assert_eq!(report.executed_steps, $executed);
                    assert_eq!(report.last_step, ($executed as usize).checked_sub(1));
                }
            }
        };
    }

    make_test!(complete, "gripper", true, 11);
    make_test!(upper_case, "gripper-upper-case", true, 11);
    make_test!(incomplete, "gripper-incomplete", false, 5);
    make_test!(full_gripper, "gripper-full-gripper", false, 1);
    make_test!(unknown_object, "gripper-unknown-object", false, 1);
    make_test!(unknown_action, "gripper-unknown-action", false, 0);
    make_test!(arity, "gripper-arity", false, 2);
}

#[test]
fn failures_are_explained() -> Result<()> {
    let report = validate("gripper-unknown-object")?;
    assert!(report.error.is_some_and(|e| e.contains("roomc")));
    assert_eq!(report.failed_step.map(|s| s.to_string()), Some("(move rooma roomc)".to_string()));

    let report = validate("gripper-incomplete")?;
    assert_eq!(report.error.as_deref(), Some("The goal is not satisfied by the final state"));
    assert!(report.failed_step.is_none());
    Ok(())
}

#[test]
fn plans_are_located_from_their_name() -> Result<()> {
    use planx::pddl::{find_domain_of, find_problem_of};

    let plan = common::resource("gripper.plan");
    let problem = find_problem_of(&plan)?;
    assert_eq!(problem, common::resource("gripper.pddl"));
    assert_eq!(find_domain_of(&problem)?, common::resource("gripper-domain.pddl"));
    Ok(())
}
