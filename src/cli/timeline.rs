//! Timeline commands (timeline, schedule)

use std::path::Path;

use anyhow::{bail, Result};
use chrono::{NaiveDate, NaiveDateTime};

use super::output::Output;
use crate::domain::{
    schedule_rows, BusinessTime, GroupId, GroupTimeline, MilestoneId, MilestoneTable, Timeline,
    TimelineBuilder,
};
use crate::storage::{load_milestones, load_plan, Config};

/// Input files shared by `timeline` and `schedule`
pub struct TimelineInputs<'a> {
    pub plan: &'a Path,
    pub milestones: &'a Path,
    pub group: Option<&'a GroupId>,
}

fn build(inputs: &TimelineInputs<'_>) -> Result<(MilestoneTable, Timeline)> {
    let plan = load_plan(inputs.plan)?;
    let table = load_milestones(inputs.milestones)?;
    let builder = TimelineBuilder::new(&plan, &table)?;

    let timeline = match inputs.group {
        Some(group) => {
            if !table.groups().contains(group) {
                bail!("Unknown group: {}", group);
            }
            let mut timeline = Timeline::new();
            timeline.insert(group.clone(), builder.build_group(group)?);
            timeline
        }
        None => builder.build()?,
    };

    Ok((table, timeline))
}

/// Group milestones in dependency order, unordered ones last
fn ordered<'a>(
    table: &MilestoneTable,
    group: &GroupId,
    timeline: &'a GroupTimeline,
) -> Vec<&'a MilestoneId> {
    let order = table
        .dependency_graph(group)
        .topological_sort()
        .unwrap_or_default();

    let mut ids: Vec<&MilestoneId> = order
        .iter()
        .filter_map(|id| timeline.get_key_value(id).map(|(k, _)| k))
        .collect();
    for id in timeline.keys() {
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}

fn time_label(t: Option<f64>) -> String {
    t.map_or_else(|| "-".to_string(), |t| format!("{}", t))
}

fn date_label(t: Option<NaiveDateTime>) -> String {
    t.map_or_else(
        || "-".to_string(),
        |t| t.format("%Y-%m-%d %H:%M").to_string(),
    )
}

/// Prints per-group milestone start and end in business time
pub fn timeline(output: &Output, inputs: &TimelineInputs<'_>) -> Result<()> {
    let (table, timeline) = build(inputs)?;

    if output.is_json() {
        output.data(&timeline);
        return Ok(());
    }

    if timeline.is_empty() {
        output.line("No groups tracked.");
    }

    for (group, items) in &timeline {
        output.line(&format!("Group {} ({} milestones):", group, items.len()));
        output.row(&["MILESTONE", "START", "END"]);
        for id in ordered(&table, group, items) {
            let item = &items[id];
            output.row(&[id.as_str(), &time_label(item.start), &time_label(item.end)]);
        }
        output.line("");
    }

    Ok(())
}

/// Prints milestone start and end on the wall clock of the configured
/// calendar
pub fn schedule(
    output: &Output,
    config: &Config,
    inputs: &TimelineInputs<'_>,
    start: Option<NaiveDate>,
) -> Result<()> {
    let project_start = match start {
        Some(day) => day,
        None => config.require_project_start()?,
    };
    let (_, timeline) = build(inputs)?;

    let business_time = BusinessTime::new(config.project.calendar.clone());
    let rows = schedule_rows(&timeline, &business_time, project_start)?;
    log::debug!(
        "scheduled {} row(s) from {} with hours {}",
        rows.len(),
        project_start,
        config.project.hours_label()
    );

    if output.is_json() {
        output.data(&rows);
        return Ok(());
    }

    output.row(&["GROUP", "MILESTONE", "START", "END"]);
    for row in &rows {
        output.row(&[
            row.group.as_str(),
            row.milestone.as_str(),
            &date_label(row.start),
            &date_label(row.end),
        ]);
    }

    Ok(())
}
