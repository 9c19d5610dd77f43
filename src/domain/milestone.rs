//! Milestone table
//!
//! A milestone is reached when its designated processes complete. Each row of
//! the milestone table names the milestone, its processes, its successors
//! (comma-separated) and the groups that track it (comma-separated).

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use super::graph::DirectedGraph;
use super::id::{parse_id_list, GroupId, IdError, MilestoneId, ProcessId};

#[derive(Debug, Error, PartialEq)]
pub enum MilestoneError {
    #[error("Duplicate milestone: {0}")]
    Duplicate(MilestoneId),

    #[error("Invalid {column} column for milestone {milestone}: {source}")]
    InvalidColumn {
        milestone: MilestoneId,
        column: &'static str,
        #[source]
        source: IdError,
    },
}

/// A raw milestone table row as written by the table author
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilestoneRow {
    pub id: MilestoneId,

    #[serde(default)]
    pub processes: Vec<ProcessId>,

    /// Comma-separated milestone IDs that must start after this one
    #[serde(default)]
    pub successors: String,

    /// Comma-separated group IDs tracking this milestone
    #[serde(default)]
    pub groups: String,
}

/// A parsed milestone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: MilestoneId,
    pub processes: BTreeSet<ProcessId>,
    pub successors: BTreeSet<MilestoneId>,
    pub groups: BTreeSet<GroupId>,
}

impl Milestone {
    pub fn from_row(row: MilestoneRow) -> Result<Self, MilestoneError> {
        let successors: Vec<MilestoneId> = parse_id_list(&row.successors).map_err(|source| {
            MilestoneError::InvalidColumn {
                milestone: row.id.clone(),
                column: "successors",
                source,
            }
        })?;
        let groups: Vec<GroupId> = parse_id_list(&row.groups).map_err(|source| MilestoneError::InvalidColumn {
            milestone: row.id.clone(),
            column: "groups",
            source,
        })?;

        Ok(Self {
            id: row.id,
            processes: row.processes.into_iter().collect(),
            successors: successors.into_iter().collect(),
            groups: groups.into_iter().collect(),
        })
    }

    pub fn is_tracked_by(&self, group: &GroupId) -> bool {
        self.groups.contains(group)
    }
}

/// All milestones of a project, keyed by ID
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MilestoneTable {
    milestones: BTreeMap<MilestoneId, Milestone>,
}

impl MilestoneTable {
    pub fn from_rows(rows: impl IntoIterator<Item = MilestoneRow>) -> Result<Self, MilestoneError> {
        let mut milestones = BTreeMap::new();
        for row in rows {
            let milestone = Milestone::from_row(row)?;
            if milestones.contains_key(&milestone.id) {
                return Err(MilestoneError::Duplicate(milestone.id));
            }
            milestones.insert(milestone.id.clone(), milestone);
        }
        Ok(Self { milestones })
    }

    pub fn get(&self, id: &MilestoneId) -> Option<&Milestone> {
        self.milestones.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Milestone> {
        self.milestones.values()
    }

    pub fn len(&self) -> usize {
        self.milestones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.milestones.is_empty()
    }

    /// Every group named by any milestone
    pub fn groups(&self) -> BTreeSet<GroupId> {
        self.iter().flat_map(|m| m.groups.iter().cloned()).collect()
    }

    /// Milestones tracked by `group`
    pub fn in_group<'a>(&'a self, group: &'a GroupId) -> impl Iterator<Item = &'a Milestone> + 'a {
        self.iter().filter(move |m| m.is_tracked_by(group))
    }

    /// Dependency graph of the milestones tracked by `group`
    ///
    /// Nodes are the group's milestones; edges run from each milestone to its
    /// declared successors. Successors outside the group stay as dangling
    /// edges and are ignored by the graph algorithms.
    pub fn dependency_graph(&self, group: &GroupId) -> DirectedGraph<MilestoneId> {
        let mut graph = DirectedGraph::new();
        for milestone in self.in_group(group) {
            graph.add_node(milestone.id.clone());
            for successor in &milestone.successors {
                graph.add_edge(milestone.id.clone(), successor.clone());
            }
        }
        graph
    }
}
