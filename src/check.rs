//! Precondition table checks
//!
//! Parses every precondition cell of a process table and reports:
//! - cells that do not parse
//! - `\exec(..)` references to processes missing from the table
//! - circular references, where a chain of `\exec(..)` preconditions leads
//!   back to the process that started it

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::domain::{parse_precondition, DirectedGraph, Precondition, ProcessId};

/// One row of the process table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreconditionRow {
    pub process: ProcessId,

    /// Raw cell text; blank means `\true`
    #[serde(default)]
    pub precondition: String,
}

/// A defect found in the process table
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Problem {
    Syntax {
        process: ProcessId,
        text: String,
        position: usize,
        expected: String,
    },
    DuplicateProcess {
        process: ProcessId,
    },
    UnknownProcess {
        process: ProcessId,
        target: ProcessId,
    },
    CyclicReference {
        cycle: Vec<ProcessId>,
    },
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Problem::Syntax {
                process,
                text,
                position,
                expected,
            } => write!(
                f,
                "{}: syntax error at offset {} in '{}': expected {}",
                process, position, text, expected
            ),
            Problem::DuplicateProcess { process } => {
                write!(f, "{}: process appears more than once", process)
            }
            Problem::UnknownProcess { process, target } => {
                write!(f, "{}: precondition refers to unknown process {}", process, target)
            }
            Problem::CyclicReference { cycle } => {
                let names: Vec<&str> = cycle.iter().map(ProcessId::as_str).collect();
                write!(
                    f,
                    "cyclic precondition reference: {} -> {}",
                    names.join(" -> "),
                    names.first().copied().unwrap_or_default()
                )
            }
        }
    }
}

/// Parsed preconditions and every problem found
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CheckReport {
    pub preconditions: BTreeMap<ProcessId, Precondition>,
    pub problems: Vec<Problem>,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Parses and cross-checks a process table
pub fn check_preconditions(rows: &[PreconditionRow]) -> CheckReport {
    let mut report = CheckReport::default();
    let mut known = BTreeSet::new();

    for row in rows {
        if !known.insert(&row.process) {
            report.problems.push(Problem::DuplicateProcess {
                process: row.process.clone(),
            });
            continue;
        }

        match parse_precondition(&row.precondition, &row.process) {
            Ok(precondition) => {
                report.preconditions.insert(row.process.clone(), precondition);
            }
            Err(err) => {
                log::debug!("{}: {}", row.process, err);
                report.problems.push(Problem::Syntax {
                    process: row.process.clone(),
                    text: err.input,
                    position: err.position,
                    expected: err.expected.to_string(),
                });
            }
        }
    }

    // Rows that failed to parse still name a known process
    for (process, precondition) in &report.preconditions {
        for target in precondition.executable_targets() {
            if !known.contains(target) {
                report.problems.push(Problem::UnknownProcess {
                    process: process.clone(),
                    target: target.clone(),
                });
            }
        }
    }

    for cycle in reference_graph(&report.preconditions).cycles() {
        report.problems.push(Problem::CyclicReference { cycle });
    }

    report
}

/// Graph with an edge from each process to every process its precondition
/// waits on via `\exec(..)`
pub fn reference_graph(preconditions: &BTreeMap<ProcessId, Precondition>) -> DirectedGraph<ProcessId> {
    let mut graph = DirectedGraph::new();
    for (process, precondition) in preconditions {
        graph.add_node(process.clone());
        for target in precondition.executable_targets() {
            graph.add_edge(process.clone(), target.clone());
        }
    }
    graph
}
