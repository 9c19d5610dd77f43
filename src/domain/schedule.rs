//! Wall-clock schedule rows
//!
//! Maps business-time timelines onto the calendar, one row per tracked
//! milestone per group.

use chrono::NaiveDateTime;
use serde::Serialize;

use super::calendar::{BusinessTime, CalendarError, Day, WorkingCalendar};
use super::id::{GroupId, MilestoneId};
use super::timeline::Timeline;

/// One milestone of one group on the wall clock
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleRow {
    pub group: GroupId,
    pub milestone: MilestoneId,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

/// Converts every timeline item into a schedule row
///
/// Business time `0.0` is the opening of the first business day on or after
/// `project_start`. Rows are ordered by group, then milestone.
pub fn schedule_rows<C>(
    timeline: &Timeline,
    business_time: &BusinessTime<C>,
    project_start: Day,
) -> Result<Vec<ScheduleRow>, CalendarError>
where
    C: WorkingCalendar + Send + Sync + 'static,
{
    let to_wall_clock = |t: Option<f64>| -> Result<Option<NaiveDateTime>, CalendarError> {
        t.map(|t| business_time.at(project_start, t)).transpose()
    };

    let mut rows = Vec::new();
    for (group, milestones) in timeline {
        for (milestone, item) in milestones {
            rows.push(ScheduleRow {
                group: group.clone(),
                milestone: milestone.clone(),
                start: to_wall_clock(item.start)?,
                end: to_wall_clock(item.end)?,
            });
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::calendar::WorkCalendar;
    use crate::domain::timeline::{GroupTimeline, TimelineItem};
    use chrono::NaiveDate;

    fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 1, d)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn rows_map_business_time_to_wall_clock() {
        let group: GroupTimeline = [
            (
                MilestoneId::new("M1"),
                TimelineItem {
                    start: Some(0.0),
                    end: Some(1.5),
                },
            ),
            (
                MilestoneId::new("M2"),
                TimelineItem {
                    start: Some(1.5),
                    end: None,
                },
            ),
        ]
        .into_iter()
        .collect();
        let timeline: Timeline = [(GroupId::new("team"), group)].into_iter().collect();

        let bt = BusinessTime::new(WorkCalendar::default());
        // 2021-01-01 is a Friday
        let start = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        let rows = schedule_rows(&timeline, &bt, start).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].start, Some(at(1, 9, 0)));
        assert_eq!(rows[0].end, Some(at(4, 13, 0)));
        assert_eq!(rows[1].milestone, MilestoneId::new("M2"));
        assert_eq!(rows[1].end, None);
    }

    #[test]
    fn negative_time_is_reported() {
        let group: GroupTimeline = [(
            MilestoneId::new("M1"),
            TimelineItem {
                start: Some(-1.0),
                end: None,
            },
        )]
        .into_iter()
        .collect();
        let timeline: Timeline = [(GroupId::new("team"), group)].into_iter().collect();

        let bt = BusinessTime::new(WorkCalendar::default());
        let start = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();

        assert_eq!(
            schedule_rows(&timeline, &bt, start),
            Err(CalendarError::InvalidBusinessTime(-1.0))
        );
    }
}
