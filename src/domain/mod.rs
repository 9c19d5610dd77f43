//! Domain models for the PFD analyzer
//!
//! Contains the core analysis logic without any I/O concerns.

mod calendar;
mod graph;
mod id;
mod milestone;
mod parser;
mod plan;
mod precondition;
mod scan;
mod schedule;
mod timeline;

pub use calendar::{
    add_business_days, BusinessHours, BusinessTime, CachedAddBusinessDays, CalendarError, Day,
    FnCalendar, TimeOfDay, WorkCalendar, WorkingCalendar,
};
pub use graph::DirectedGraph;
pub use id::{compare_ids, parse_id_list, DeliverableId, GroupId, IdError, MilestoneId, ProcessId};
pub use milestone::{Milestone, MilestoneError, MilestoneRow, MilestoneTable};
pub use parser::{parse_precondition, SyntaxError};
pub use plan::{AllocationElement, Plan, PlanError, State, Transition};
pub use precondition::{ExecutionContext, Precondition};
pub use schedule::{schedule_rows, ScheduleRow};
pub use timeline::{
    allocation_touches, remove_overlaps, replay_trace, rework_finished, GroupTimeline, Step,
    Timeline, TimelineBuilder, TimelineError, TimelineItem,
};
