//! Execution trace of a simulated project
//!
//! A plan is the initial state plus the ordered transitions a simulator
//! produced. Each transition records which processes held resources during
//! the step and the state reached after it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use super::id::ProcessId;

#[derive(Debug, Error, PartialEq)]
pub enum PlanError {
    #[error("Time decreases at transition {index}: {previous} -> {next}")]
    TimeDecreases { index: usize, previous: f64, next: f64 },

    #[error("Invalid time at transition {index}: {time}")]
    InvalidTime { index: usize, time: f64 },
}

/// Resources assigned to one process during one step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocationElement {
    /// Resource name to amount assigned
    pub resources: BTreeMap<String, f64>,
}

/// Simulation state at a point in business time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Business time of this state
    pub time: f64,

    /// How many times each process has completed so far
    #[serde(default)]
    pub completion_count: BTreeMap<ProcessId, u32>,
}

impl State {
    pub fn completions(&self, process: &ProcessId) -> u32 {
        self.completion_count.get(process).copied().unwrap_or(0)
    }
}

/// One simulated step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    /// Processes consuming resources during this step
    #[serde(default)]
    pub allocation: BTreeMap<ProcessId, AllocationElement>,

    pub next_state: State,
}

/// Initial state plus ordered transitions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub initial_state: State,

    #[serde(default)]
    pub transitions: Vec<Transition>,
}

impl Plan {
    /// Checks that every time is finite and never decreases
    pub fn validate(&self) -> Result<(), PlanError> {
        let mut previous = self.initial_state.time;
        if !previous.is_finite() {
            return Err(PlanError::InvalidTime {
                index: 0,
                time: previous,
            });
        }

        for (i, transition) in self.transitions.iter().enumerate() {
            let next = transition.next_state.time;
            if !next.is_finite() {
                return Err(PlanError::InvalidTime {
                    index: i + 1,
                    time: next,
                });
            }
            if next < previous {
                return Err(PlanError::TimeDecreases {
                    index: i + 1,
                    previous,
                    next,
                });
            }
            previous = next;
        }

        Ok(())
    }

    /// The state after the last transition
    pub fn final_state(&self) -> &State {
        self.transitions
            .last()
            .map(|t| &t.next_state)
            .unwrap_or(&self.initial_state)
    }

    /// Iterates `(previous state, transition)` pairs in order
    pub fn steps(&self) -> impl Iterator<Item = (&State, &Transition)> {
        let previous = std::iter::once(&self.initial_state)
            .chain(self.transitions.iter().map(|t| &t.next_state));
        previous.zip(self.transitions.iter())
    }
}
