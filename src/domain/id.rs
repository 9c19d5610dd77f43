//! Identifier types for process models
//!
//! ID Format:
//! - Process IDs: `P12`, `review.design`, `P-3_b`
//! - Deliverable IDs: `D4`, `design.v2`
//! - Milestone IDs: `M1`, `alpha-release`
//! - Group IDs: `backend`, `team_a`
//!
//! Every ID is one or more of `[A-Za-z0-9_.-]`.
//!
//! IDs order by length first, then lexicographically (`P9 < P10 < PA1`).
//! Graph algorithms rely on this order for deterministic output, so it must
//! not be replaced by plain string ordering.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum IdError {
    #[error("Invalid {kind} ID: expected one or more of [A-Za-z0-9_.-], got '{value}'")]
    Invalid { kind: &'static str, value: String },
}

/// Returns true for characters allowed inside an identifier
pub fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')
}

/// Orders two identifier strings by length, then lexicographically
pub fn compare_ids(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn validate(kind: &'static str, s: &str) -> Result<(), IdError> {
    if s.is_empty() || !s.chars().all(is_id_char) {
        return Err(IdError::Invalid {
            kind,
            value: s.to_string(),
        });
    }
    Ok(())
}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Wraps a raw identifier without validating its characters
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> Ordering {
                compare_ids(&self.0, &other.0)
            }
        }

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                validate($kind, s)?;
                Ok(Self(s.to_string()))
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(
    /// A process (a box in the diagram) that consumes and produces deliverables
    ProcessId,
    "process"
);

define_id!(
    /// A deliverable (a document or artifact flowing between processes)
    DeliverableId,
    "deliverable"
);

define_id!(
    /// A named project checkpoint
    MilestoneId,
    "milestone"
);

define_id!(
    /// A team or track with its own milestone timeline
    GroupId,
    "group"
);

/// Splits a comma-separated ID column, skipping blank entries
pub fn parse_id_list<T: FromStr<Err = IdError>>(column: &str) -> Result<Vec<T>, IdError> {
    column
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect()
}
