//! PFD analyzer - structural analysis for process-flow-diagram models
//!
//! A process-flow diagram links processes and deliverables. This crate
//! provides the analysis pieces around such a model:
//!
//! - a generic [`DirectedGraph`] with cycle enumeration, topological order,
//!   reachability and component queries
//! - the precondition language attached to processes ([`parse_precondition`])
//!   and a table checker for cyclic `\exec(..)` references ([`check`])
//! - milestone timelines reconstructed from a simulated plan
//!   ([`TimelineBuilder`])
//! - business-calendar conversion from business-time scalars to wall-clock
//!   timestamps ([`BusinessTime`])

pub mod check;
pub mod cli;
pub mod domain;
pub mod storage;

pub use domain::{
    parse_precondition, BusinessTime, DirectedGraph, Precondition, ProcessId, Timeline,
    TimelineBuilder, WorkCalendar,
};
