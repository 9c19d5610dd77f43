//! Milestone timeline reconstruction
//!
//! Builds per-group milestone start/end times from a plan in two phases:
//!
//! 1. **Trace replay**: walk the transitions; a milestone starts at the time
//!    of the state before the first step that begins it, and ends at the
//!    time of the state after the first later step that ends it.
//! 2. **Overlap removal**: a milestone may not extend past the start of any
//!    transitive successor. Its end is clamped to the earliest such start,
//!    and a successor that starts before it is an error.
//!
//! Unset times are `None`. A milestone missing from a group's timeline is
//! not tracked by that group.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use super::graph::DirectedGraph;
use super::id::{GroupId, MilestoneId, ProcessId};
use super::milestone::{Milestone, MilestoneTable};
use super::plan::{AllocationElement, Plan, PlanError, State};

#[derive(Debug, Error, PartialEq)]
pub enum TimelineError {
    #[error(
        "Overlapping milestone in group {group}: {earlier} starts at {earlier_start} \
         after its successor {later} starts at {later_start}"
    )]
    Overlap {
        group: GroupId,
        earlier: MilestoneId,
        later: MilestoneId,
        earlier_start: f64,
        later_start: f64,
    },

    #[error("Milestone dependencies of group {group} are cyclic: {}", format_cycles(.cycles))]
    CyclicMilestones {
        group: GroupId,
        cycles: Vec<Vec<MilestoneId>>,
    },

    #[error("Invalid plan: {0}")]
    Plan(#[from] PlanError),
}

fn format_cycles(cycles: &[Vec<MilestoneId>]) -> String {
    cycles
        .iter()
        .map(|cycle| {
            let names: Vec<&str> = cycle.iter().map(MilestoneId::as_str).collect();
            names.join(" -> ")
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Start and end of one milestone in business time
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TimelineItem {
    /// `None` until the milestone is reached
    pub start: Option<f64>,
    /// `None` until the milestone is concluded
    pub end: Option<f64>,
}

pub type GroupTimeline = BTreeMap<MilestoneId, TimelineItem>;

pub type Timeline = BTreeMap<GroupId, GroupTimeline>;

/// What a begin/end predicate sees for one milestone at one step
pub struct Step<'a> {
    pub group: &'a GroupId,
    pub milestone: &'a MilestoneId,
    pub previous: &'a State,
    pub allocation: &'a BTreeMap<ProcessId, AllocationElement>,
    pub next: &'a State,
}

/// Replays a plan and records when each milestone begins and ends
///
/// Only the given milestones appear in the result. Fields stay `None` when
/// the predicate never fires.
pub fn replay_trace<'a>(
    plan: &Plan,
    group: &GroupId,
    milestones: impl IntoIterator<Item = &'a MilestoneId>,
    begin: impl Fn(&Step<'_>) -> bool,
    end: impl Fn(&Step<'_>) -> bool,
) -> GroupTimeline {
    let mut timeline: GroupTimeline = milestones
        .into_iter()
        .map(|m| (m.clone(), TimelineItem::default()))
        .collect();

    for (previous, transition) in plan.steps() {
        for (milestone, item) in timeline.iter_mut() {
            let step = Step {
                group,
                milestone,
                previous,
                allocation: &transition.allocation,
                next: &transition.next_state,
            };

            if item.start.is_none() && begin(&step) {
                item.start = Some(previous.time);
            }
            if item.start.is_some() && item.end.is_none() && end(&step) {
                item.end = Some(transition.next_state.time);
            }
        }
    }

    timeline
}

/// Clamps each milestone's end to the earliest start of its successors
///
/// The dependency graph must be acyclic; cycles are reported as
/// [`TimelineError::CyclicMilestones`].
pub fn remove_overlaps(
    group: &GroupId,
    graph: &DirectedGraph<MilestoneId>,
    raw: &GroupTimeline,
) -> Result<GroupTimeline, TimelineError> {
    let cycles = graph.cycles();
    if !cycles.is_empty() {
        return Err(TimelineError::CyclicMilestones {
            group: group.clone(),
            cycles,
        });
    }

    let maximals = graph.maximals();
    let mut timeline = raw.clone();

    for (earlier, item) in raw {
        if maximals.contains(earlier) || !graph.contains(earlier) {
            continue;
        }
        let (Some(earlier_start), Some(mut end)) = (item.start, item.end) else {
            continue;
        };

        for later in graph.descendants(earlier) {
            let Some(later_start) = raw.get(&later).and_then(|i| i.start) else {
                continue;
            };
            if earlier_start > later_start {
                return Err(TimelineError::Overlap {
                    group: group.clone(),
                    earlier: earlier.clone(),
                    later,
                    earlier_start,
                    later_start,
                });
            }
            end = end.min(later_start);
        }

        if let Some(clamped) = timeline.get_mut(earlier) {
            clamped.end = Some(end);
        }
    }

    Ok(timeline)
}

/// True when the step allocates resources to any of the milestone's processes
pub fn allocation_touches(milestone: &Milestone, step: &Step<'_>) -> bool {
    milestone
        .processes
        .iter()
        .any(|p| step.allocation.contains_key(p))
}

/// True when every process of the milestone has reached its final
/// completion count by the end of the step, i.e. all rework is done
pub fn rework_finished(milestone: &Milestone, final_state: &State, step: &Step<'_>) -> bool {
    milestone
        .processes
        .iter()
        .all(|p| step.next.completions(p) >= final_state.completions(p))
}

/// Builds timelines for the groups of a milestone table from one plan
pub struct TimelineBuilder<'a> {
    plan: &'a Plan,
    milestones: &'a MilestoneTable,
}

impl<'a> TimelineBuilder<'a> {
    /// Validates the plan and prepares a builder
    pub fn new(plan: &'a Plan, milestones: &'a MilestoneTable) -> Result<Self, TimelineError> {
        plan.validate()?;
        Ok(Self { plan, milestones })
    }

    /// Timeline of one group using the default begin/end predicates
    pub fn build_group(&self, group: &GroupId) -> Result<GroupTimeline, TimelineError> {
        let final_state = self.plan.final_state();
        let ids: Vec<&MilestoneId> = self.milestones.in_group(group).map(|m| &m.id).collect();

        let raw = replay_trace(
            self.plan,
            group,
            ids,
            |step| {
                self.milestones
                    .get(step.milestone)
                    .is_some_and(|m| allocation_touches(m, step))
            },
            |step| {
                self.milestones
                    .get(step.milestone)
                    .is_some_and(|m| rework_finished(m, final_state, step))
            },
        );

        let graph = self.milestones.dependency_graph(group);
        let timeline = remove_overlaps(group, &graph, &raw)?;

        log::debug!(
            "group {}: {} milestone(s), {} reached",
            group,
            timeline.len(),
            timeline.values().filter(|i| i.start.is_some()).count()
        );
        Ok(timeline)
    }

    /// Timelines of every group named in the milestone table
    pub fn build(&self) -> Result<Timeline, TimelineError> {
        self.milestones
            .groups()
            .into_iter()
            .map(|group| self.build_group(&group).map(|timeline| (group, timeline)))
            .collect()
    }
}
