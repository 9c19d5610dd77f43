//! Precondition commands (parse, check)

use std::path::Path;

use anyhow::{bail, Result};

use super::output::Output;
use crate::check::{check_preconditions, Problem};
use crate::domain::{parse_precondition, Precondition, ProcessId};
use crate::storage::load_preconditions;

/// Parses one precondition and prints its normalized form
pub fn parse(output: &Output, text: &str, context: &ProcessId) -> Result<()> {
    let precondition = parse_precondition(text, context)?;
    log::debug!("parsed '{}' in context {}", text, context);

    if output.is_json() {
        output.data(&precondition);
    } else {
        output.line(&precondition.to_string());
        print_tree(output, &precondition, 0);
    }

    Ok(())
}

fn print_tree(output: &Output, node: &Precondition, depth: usize) {
    let indent = "  ".repeat(depth);
    let label = match node {
        Precondition::True => "true".to_string(),
        Precondition::Executable { target } => format!("exec {}", target),
        Precondition::FeedbackSourceCompleted { source } => format!("complete {}", source),
        Precondition::AllReachableFeedbackSourcesCompleted { context } => {
            format!("complete * (context {})", context)
        }
        Precondition::And { .. } => "and".to_string(),
        Precondition::Or { .. } => "or".to_string(),
        Precondition::Not { .. } => "not".to_string(),
    };
    output.line(&format!("{}{}", indent, label));

    match node {
        Precondition::And { children } | Precondition::Or { children } => {
            for child in children {
                print_tree(output, child, depth + 1);
            }
        }
        Precondition::Not { child } => print_tree(output, child, depth + 1),
        _ => {}
    }
}

/// Checks a process precondition table; fails if any problem is found
pub fn check(output: &Output, table: &Path) -> Result<()> {
    let rows = load_preconditions(table)?;
    log::debug!("checking {} precondition rows", rows.len());

    let report = check_preconditions(&rows);

    if output.is_json() {
        output.data(&serde_json::json!({
            "processes": report.preconditions.len(),
            "problems": report.problems,
        }));
    } else if report.is_clean() {
        output.success(&format!(
            "{} preconditions checked, no problems found",
            report.preconditions.len()
        ));
    } else {
        for problem in &report.problems {
            output.line(&problem.to_string());
        }
    }

    if !report.is_clean() {
        let cycles = report
            .problems
            .iter()
            .filter(|p| matches!(p, Problem::CyclicReference { .. }))
            .count();
        bail!(
            "{} problem(s) found ({} cyclic reference(s))",
            report.problems.len(),
            cycles
        );
    }

    Ok(())
}
