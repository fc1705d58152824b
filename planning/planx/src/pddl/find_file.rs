//! Lookup of the domain and problem files associated to a problem or a plan, based on naming conventions.

use std::path::{Path, PathBuf};

use regex::Regex;

use crate::{Message, Res, errors::Ctx};

fn regex(pattern: &str) -> Res<Regex> {
    Regex::new(pattern).map_err(|e| Message::error(format!("Invalid file name pattern `{pattern}`: {e}")))
}

fn file_name(file: &Path) -> Res<&str> {
    file.file_name()
        .title(format!("Invalid file: {}", file.display()))?
        .to_str()
        .title("Could not convert file name to utf8")
}

/// Returns the first `dir/name` that exists, trying all directories for a name before moving to the next one.
fn first_existing(names: &[PathBuf], dirs: &[PathBuf]) -> Option<PathBuf> {
    names
        .iter()
        .flat_map(|f| dirs.iter().map(move |dir| dir.join(f)))
        .find(|candidate| candidate.exists())
}

/// Attempts to find the domain file of the given PDDL problem.
///
/// Candidates are `domain.pddl`, `XXX.dom.pddl` for a problem `XXX.pb.pddl`, `XXX-domain.pddl` and
/// `domain-XXX.pddl` for a problem `XXX.pddl` and `domain-NN.pddl` for a problem `instance-NN.pddl`.
/// They are searched in the directory of the problem, its parent and a `domains` sibling directory.
pub fn find_domain_of(problem_file: &Path) -> Res<PathBuf> {
    let mut candidates: Vec<PathBuf> = Vec::with_capacity(4);
    candidates.push(match problem_file.extension() {
        Some(ext) => Path::new("domain").with_extension(ext),
        None => PathBuf::from("domain.pddl"),
    });

    let problem_filename = file_name(problem_file)?;

    // XXX.YY.pb.pddl => XXX.dom.pddl
    for m in regex(r"^(.+)(\.[^\.]+)\.pb\.pddl$")?.captures_iter(problem_filename) {
        candidates.push(format!("{}.dom.pddl", &m[1]).into());
    }
    // XXX.pb.pddl => XXX.dom.pddl
    for m in regex(r"^(.+)\.pb\.pddl$")?.captures_iter(problem_filename) {
        candidates.push(format!("{}.dom.pddl", &m[1]).into());
    }
    // XXX.pddl => XXX-domain.pddl, domain-XXX.pddl
    for m in regex(r"^(.+)\.pddl$")?.captures_iter(problem_filename) {
        candidates.push(format!("{}-domain.pddl", &m[1]).into());
        candidates.push(format!("domain-{}.pddl", &m[1]).into());
    }
    // instance-NN.pddl => domain-NN.pddl
    for m in regex(r"^instance-([0-9]+)\.pddl$")?.captures_iter(problem_filename) {
        candidates.push(format!("domain-{}.pddl", &m[1]).into());
    }

    let mut dirs = Vec::with_capacity(3);
    if let Some(curr) = problem_file.parent() {
        dirs.push(curr.to_owned());
        if let Some(parent) = curr.parent() {
            dirs.push(parent.to_owned());
            dirs.push(parent.join("domains"));
        }
    }

    first_existing(&candidates, &dirs).ok_or_else(|| {
        Message::error(format!(
            "Could not find a domain file in same or parent directory as the problem file. Candidates: {candidates:?}"
        ))
    })
}

/// Attempts to find the problem file of the given plan.
///
/// For a plan `XXX.planYY`, candidates are `XXX.pb.pddl` and `XXX.pddl`, followed by `problem.pddl`.
/// They are searched in the directory of the plan and its parent.
pub fn find_problem_of(plan_file: &Path) -> Res<PathBuf> {
    let mut candidates: Vec<PathBuf> = Vec::with_capacity(3);
    let plan_filename = file_name(plan_file)?;

    for m in regex(r"^(.+)\.plan[^\.]*$")?.captures_iter(plan_filename) {
        let base_name = &m[1];
        candidates.push(format!("{base_name}.pb.pddl").into());
        candidates.push(format!("{base_name}.pddl").into());
    }
    candidates.push(PathBuf::from("problem.pddl"));

    let mut dirs = Vec::with_capacity(2);
    if let Some(curr) = plan_file.parent() {
        dirs.push(curr.to_owned());
        if let Some(parent) = curr.parent() {
            dirs.push(parent.to_owned());
        }
    }

    first_existing(&candidates, &dirs).ok_or_else(|| {
        Message::error(format!(
            "Could not find a problem file in same or parent directory as the plan file. Candidates: {candidates:?}"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_files_are_reported() {
        let dir = std::env::temp_dir().join("planx-find-file-missing");
        let err = find_domain_of(&dir.join("p01.pddl")).unwrap_err();
        assert!(err.get_title().contains("p01-domain.pddl"));
        let err = find_problem_of(&dir.join("p01.plan")).unwrap_err();
        assert!(err.get_title().contains("p01.pddl"));
    }

    #[test]
    fn sibling_files_are_found() {
        let dir = std::env::temp_dir().join(format!("planx-find-file-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("gripper-domain.pddl"), "").unwrap();
        std::fs::write(dir.join("gripper.pddl"), "").unwrap();

        assert_eq!(find_domain_of(&dir.join("gripper.pddl")).unwrap(), dir.join("gripper-domain.pddl"));
        assert_eq!(find_problem_of(&dir.join("gripper.plan")).unwrap(), dir.join("gripper.pddl"));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
