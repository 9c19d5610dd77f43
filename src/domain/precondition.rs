//! Precondition AST
//!
//! A precondition gates when a process may execute. It is written in a small
//! boolean language inside the process table (see [`super::parser`]) and
//! parsed once into this immutable tree.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::id::{DeliverableId, ProcessId};

/// A boolean gate on process execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Precondition {
    /// Always satisfied (`\true`)
    True,

    /// Satisfied while `target` has not executed yet (`\exec(P)`)
    Executable { target: ProcessId },

    /// Satisfied once feedback from `source` is complete (`\complete(D)`)
    FeedbackSourceCompleted { source: DeliverableId },

    /// Satisfied once every feedback source reachable from `context` is
    /// complete (`\complete(*)` in the row of process `context`)
    AllReachableFeedbackSourcesCompleted { context: ProcessId },

    And { children: Vec<Precondition> },

    Or { children: Vec<Precondition> },

    Not { child: Box<Precondition> },
}

/// Answers the runtime questions a precondition asks
///
/// Implemented by simulators embedding this crate; `pfd` itself only
/// parses and checks preconditions, it never executes them.
pub trait ExecutionContext {
    fn has_executed(&self, process: &ProcessId) -> bool;

    fn is_feedback_completed(&self, source: &DeliverableId) -> bool;

    fn are_reachable_feedback_sources_completed(&self, context: &ProcessId) -> bool;
}

impl Precondition {
    /// Iterates the tree depth-first in pre-order, children left to right
    pub fn iter(&self) -> Iter<'_> {
        Iter { stack: vec![self] }
    }

    /// Processes referenced by `\exec(..)`, in traversal order
    pub fn executable_targets(&self) -> Vec<&ProcessId> {
        self.iter()
            .filter_map(|node| match node {
                Precondition::Executable { target } => Some(target),
                _ => None,
            })
            .collect()
    }

    /// Evaluates the gate against the current execution state
    ///
    /// Library API, see [`ExecutionContext`].
    pub fn evaluate(&self, ctx: &impl ExecutionContext) -> bool {
        match self {
            Precondition::True => true,
            Precondition::Executable { target } => !ctx.has_executed(target),
            Precondition::FeedbackSourceCompleted { source } => ctx.is_feedback_completed(source),
            Precondition::AllReachableFeedbackSourcesCompleted { context } => {
                ctx.are_reachable_feedback_sources_completed(context)
            }
            Precondition::And { children } => children.iter().all(|c| c.evaluate(ctx)),
            Precondition::Or { children } => children.iter().any(|c| c.evaluate(ctx)),
            Precondition::Not { child } => !child.evaluate(ctx),
        }
    }
}

/// Pre-order iterator over a precondition tree
pub struct Iter<'a> {
    stack: Vec<&'a Precondition>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Precondition;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        match node {
            Precondition::And { children } | Precondition::Or { children } => {
                self.stack.extend(children.iter().rev());
            }
            Precondition::Not { child } => self.stack.push(child),
            _ => {}
        }
        Some(node)
    }
}

impl fmt::Display for Precondition {
    /// Renders the precondition back into the table language
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precondition::True => f.write_str("\\true"),
            Precondition::Executable { target } => write!(f, "\\exec({})", target),
            Precondition::FeedbackSourceCompleted { source } => write!(f, "\\complete({})", source),
            Precondition::AllReachableFeedbackSourcesCompleted { .. } => f.write_str("\\complete(*)"),
            Precondition::And { children } => write_joined(f, children, " && "),
            Precondition::Or { children } => write_joined(f, children, " || "),
            Precondition::Not { child } => write!(f, "!({})", child),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, children: &[Precondition], op: &str) -> fmt::Result {
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            f.write_str(op)?;
        }
        match child {
            Precondition::And { .. } | Precondition::Or { .. } | Precondition::Not { .. } => {
                write!(f, "({})", child)?
            }
            _ => write!(f, "{}", child)?,
        }
    }
    Ok(())
}
