//! Business calendar and business-time arithmetic
//!
//! # Time Model
//! Business time is a non-negative scalar where `1.0` is one full business
//! day's worth of business hours. `BusinessTime::at(start, t)` converts it to
//! a wall-clock timestamp: the integer part counts business days after the
//! first business day on or after `start`, the fractional part is an offset
//! into that day's opening hours.
//!
//! # Invariants
//! - `close > open` on every business day
//! - `close - open` is the same on every business day
//!
//! Violations are reported as [`CalendarError`] and indicate a broken
//! calendar definition, not bad data.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike, Weekday};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// A calendar date without time of day
pub type Day = NaiveDate;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CalendarError {
    #[error("Adding {delta} to {time} crosses a day boundary")]
    CrossesMidnight { time: TimeOfDay, delta: TimeDelta },

    #[error("Business hours on {day} are empty or inverted: {open}-{close}")]
    NonPositiveBusinessDay {
        day: Day,
        open: TimeOfDay,
        close: TimeOfDay,
    },

    #[error("Business time must be a finite non-negative number, got {0}")]
    InvalidBusinessTime(f64),

    #[error("Invalid time of day '{0}': expected HH:MM or HH:MM:SS")]
    InvalidTimeOfDay(String),
}

/// A time of day without a date, 00:00:00 to 23:59:59.999999999
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay(NaiveTime);

impl TimeOfDay {
    pub fn from_hms(hour: u32, min: u32, sec: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, min, sec).map(Self)
    }

    pub fn as_naive(&self) -> NaiveTime {
        self.0
    }

    /// Adds a duration, failing if the result would fall on another day
    pub fn checked_add(self, delta: TimeDelta) -> Result<Self, CalendarError> {
        let (time, wrapped) = self.0.overflowing_add_signed(delta);
        if wrapped != 0 {
            return Err(CalendarError::CrossesMidnight { time: self, delta });
        }
        Ok(Self(time))
    }

    /// Signed duration from `earlier` to `self`
    pub fn since(self, earlier: Self) -> TimeDelta {
        self.0.signed_duration_since(earlier.0)
    }

    /// Places this time on a calendar day
    pub fn on(self, day: Day) -> NaiveDateTime {
        day.and_time(self.0)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.nanosecond() == 0 {
            write!(f, "{}", self.0.format("%H:%M:%S"))
        } else {
            write!(f, "{}", self.0.format("%H:%M:%S%.f"))
        }
    }
}

impl FromStr for TimeOfDay {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        ["%H:%M:%S%.f", "%H:%M:%S", "%H:%M"]
            .iter()
            .find_map(|format| NaiveTime::parse_from_str(s, format).ok())
            .map(Self)
            .ok_or_else(|| CalendarError::InvalidTimeOfDay(s.to_string()))
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = CalendarError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(time: TimeOfDay) -> Self {
        time.to_string()
    }
}

/// Opening hours of one business day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessHours {
    pub open: TimeOfDay,
    pub close: TimeOfDay,
}

impl BusinessHours {
    pub fn new(open: TimeOfDay, close: TimeOfDay) -> Self {
        Self { open, close }
    }

    pub fn duration(&self) -> TimeDelta {
        self.close.since(self.open)
    }
}

/// Source of business days and business hours
pub trait WorkingCalendar {
    fn is_business_day(&self, day: Day) -> bool;

    fn business_hours(&self, day: Day) -> BusinessHours;
}

/// A calendar assembled from two functions
pub struct FnCalendar<H, B> {
    hours: H,
    is_business_day: B,
}

impl<H, B> FnCalendar<H, B>
where
    H: Fn(Day) -> BusinessHours,
    B: Fn(Day) -> bool,
{
    pub fn new(hours: H, is_business_day: B) -> Self {
        Self {
            hours,
            is_business_day,
        }
    }
}

impl<H, B> WorkingCalendar for FnCalendar<H, B>
where
    H: Fn(Day) -> BusinessHours,
    B: Fn(Day) -> bool,
{
    fn is_business_day(&self, day: Day) -> bool {
        (self.is_business_day)(day)
    }

    fn business_hours(&self, day: Day) -> BusinessHours {
        (self.hours)(day)
    }
}

/// Weekly working pattern with fixed hours and a holiday list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkCalendar {
    /// Opening time on every business day
    pub open: TimeOfDay,

    /// Closing time on every business day
    pub close: TimeOfDay,

    /// Weekdays on which work happens
    pub workdays: Vec<Weekday>,

    /// Dates excluded even if they fall on a workday
    pub holidays: BTreeSet<Day>,
}

impl Default for WorkCalendar {
    fn default() -> Self {
        Self {
            open: TimeOfDay(NaiveTime::MIN + TimeDelta::hours(9)),
            close: TimeOfDay(NaiveTime::MIN + TimeDelta::hours(17)),
            workdays: vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ],
            holidays: BTreeSet::new(),
        }
    }
}

impl WorkingCalendar for WorkCalendar {
    fn is_business_day(&self, day: Day) -> bool {
        self.workdays.contains(&day.weekday()) && !self.holidays.contains(&day)
    }

    fn business_hours(&self, _day: Day) -> BusinessHours {
        BusinessHours::new(self.open, self.close)
    }
}

fn next_day(day: Day) -> Day {
    day.succ_opt()
        .expect("business day search ran past the last representable date")
}

/// Moves forward `n` business days
///
/// A start date that is not a business day is first rolled forward to the
/// next business day, so `n = 0` returns that normalized day.
///
/// # Panics
/// If no business day exists before the end of the representable date range.
pub fn add_business_days(day: Day, n: u32, is_business_day: impl Fn(Day) -> bool) -> Day {
    let mut day = day;
    while !is_business_day(day) {
        day = next_day(day);
    }

    let mut counted = 0;
    while counted < n {
        day = next_day(day);
        if is_business_day(day) {
            counted += 1;
        }
    }
    day
}

/// Memoizes a business-day stepping function by `(day, n)`
///
/// Safe to share between threads; the table is behind a mutex and the
/// lock is never held while the wrapped function runs.
pub struct CachedAddBusinessDays<F> {
    step: F,
    cache: Mutex<HashMap<(Day, u32), Day>>,
}

impl<F> CachedAddBusinessDays<F>
where
    F: Fn(Day, u32) -> Day,
{
    pub fn new(step: F) -> Self {
        Self {
            step,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, day: Day, n: u32) -> Day {
        if let Some(hit) = self.cache.lock().get(&(day, n)) {
            return *hit;
        }

        let result = (self.step)(day, n);
        self.cache.lock().insert((day, n), result);
        result
    }

    /// Number of memoized entries
    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.lock().is_empty()
    }
}

type StepFn = Box<dyn Fn(Day, u32) -> Day + Send + Sync>;

/// Converts business-time scalars into wall-clock timestamps
pub struct BusinessTime<C> {
    calendar: Arc<C>,
    stepper: CachedAddBusinessDays<StepFn>,
}

impl<C> BusinessTime<C>
where
    C: WorkingCalendar + Send + Sync + 'static,
{
    pub fn new(calendar: C) -> Self {
        let calendar = Arc::new(calendar);
        let stepping = Arc::clone(&calendar);
        let step: StepFn =
            Box::new(move |day, n| add_business_days(day, n, |d| stepping.is_business_day(d)));

        Self {
            calendar,
            stepper: CachedAddBusinessDays::new(step),
        }
    }

    pub fn calendar(&self) -> &C {
        &self.calendar
    }

    /// Wall-clock time reached after `t` business days from `start`
    ///
    /// The fractional offset is truncated to whole nanoseconds and always
    /// lands strictly before closing time.
    pub fn at(&self, start: Day, t: f64) -> Result<NaiveDateTime, CalendarError> {
        if !t.is_finite() || t < 0.0 || t >= f64::from(u32::MAX) {
            return Err(CalendarError::InvalidBusinessTime(t));
        }

        let anchor = self.stepper.get(start, 0);
        let hours = self.calendar.business_hours(anchor);
        let length = hours.duration();
        if length <= TimeDelta::zero() {
            return Err(CalendarError::NonPositiveBusinessDay {
                day: anchor,
                open: hours.open,
                close: hours.close,
            });
        }

        let days = t.floor();
        let frac = t - days;
        let day = if days > 0.0 {
            self.stepper.get(anchor, days as u32)
        } else {
            anchor
        };

        let length_ns = length.num_nanoseconds().unwrap_or(i64::MAX);
        let offset_ns = ((length_ns as f64 * frac) as i64).min(length_ns - 1);

        let open = self.calendar.business_hours(day).open;
        let time = open.checked_add(TimeDelta::nanoseconds(offset_ns))?;
        Ok(time.on(day))
    }
}

impl<H, B> BusinessTime<FnCalendar<H, B>>
where
    H: Fn(Day) -> BusinessHours + Send + Sync + 'static,
    B: Fn(Day) -> bool + Send + Sync + 'static,
{
    /// Builds a converter from a business-hours function and a business-day
    /// predicate
    ///
    /// Library API for calendars that do not fit [`WorkCalendar`]; the
    /// `pfd` commands always use the configured [`WorkCalendar`].
    pub fn from_fns(hours: H, is_business_day: B) -> Self {
        Self::new(FnCalendar::new(hours, is_business_day))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> Day {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> TimeOfDay {
        TimeOfDay::from_hms(h, m, 0).unwrap()
    }

    fn only(days: Vec<Day>) -> impl Fn(Day) -> bool + Send + Sync + Clone + 'static {
        let days: BTreeSet<Day> = days.into_iter().collect();
        move |d| days.contains(&d)
    }

    #[test]
    fn add_business_days_counts_from_business_start() {
        let is_biz = only(vec![day(2021, 1, 1), day(2021, 1, 2)]);
        assert_eq!(add_business_days(day(2021, 1, 1), 1, &is_biz), day(2021, 1, 2));
    }

    #[test]
    fn add_business_days_normalizes_start() {
        let is_biz = only(vec![day(2021, 1, 2), day(2021, 1, 3)]);
        assert_eq!(add_business_days(day(2021, 1, 1), 1, &is_biz), day(2021, 1, 3));
        assert_eq!(add_business_days(day(2021, 1, 1), 0, &is_biz), day(2021, 1, 2));
    }

    #[test]
    fn add_business_days_skips_weekends() {
        let calendar = WorkCalendar::default();
        // 2021-01-01 is a Friday
        let result = add_business_days(day(2021, 1, 1), 1, |d| calendar.is_business_day(d));
        assert_eq!(result, day(2021, 1, 4));
    }

    #[test]
    fn business_time_example() {
        let bt = BusinessTime::from_fns(
            |_| BusinessHours::new(time(8, 0), time(16, 0)),
            only(vec![day(2021, 1, 1), day(2021, 1, 3)]),
        );

        let at = bt.at(day(2021, 1, 1), 1.5).unwrap();
        assert_eq!(at, day(2021, 1, 3).and_hms_opt(12, 0, 0).unwrap());
    }

    #[test]
    fn business_time_zero_is_opening_of_normalized_day() {
        let bt = BusinessTime::new(WorkCalendar::default());
        // 2021-01-02 is a Saturday
        let at = bt.at(day(2021, 1, 2), 0.0).unwrap();
        assert_eq!(at, day(2021, 1, 4).and_hms_opt(9, 0, 0).unwrap());
    }

    #[test]
    fn business_time_never_reaches_close() {
        let bt = BusinessTime::new(WorkCalendar::default());
        let at = bt.at(day(2021, 1, 4), 0.999_999_999_999_999_9).unwrap();
        assert!(at < day(2021, 1, 4).and_hms_opt(17, 0, 0).unwrap());
        assert!(at >= day(2021, 1, 4).and_hms_opt(16, 59, 59).unwrap());
    }

    #[test]
    fn business_time_truncates_offset() {
        let bt = BusinessTime::new(WorkCalendar::default());
        let at = bt.at(day(2021, 1, 4), 1.0 / 3.0).unwrap();
        assert!(at <= day(2021, 1, 4).and_hms_opt(11, 40, 0).unwrap());
        assert!(at > day(2021, 1, 4).and_hms_opt(11, 39, 59).unwrap());
    }

    #[test]
    fn business_time_rejects_negative_input() {
        let bt = BusinessTime::new(WorkCalendar::default());
        assert_eq!(
            bt.at(day(2021, 1, 4), -0.5),
            Err(CalendarError::InvalidBusinessTime(-0.5))
        );
        assert!(bt.at(day(2021, 1, 4), f64::NAN).is_err());
    }

    #[test]
    fn business_time_rejects_empty_business_day() {
        let bt = BusinessTime::from_fns(
            |_| BusinessHours::new(time(9, 0), time(9, 0)),
            |_| true,
        );
        assert!(matches!(
            bt.at(day(2021, 1, 4), 0.5),
            Err(CalendarError::NonPositiveBusinessDay { .. })
        ));
    }

    #[test]
    fn time_of_day_add_within_day() {
        let t = time(22, 0).checked_add(TimeDelta::minutes(90)).unwrap();
        assert_eq!(t, time(23, 30));
    }

    #[test]
    fn time_of_day_add_crossing_midnight_fails() {
        let result = time(23, 0).checked_add(TimeDelta::hours(2));
        assert!(matches!(result, Err(CalendarError::CrossesMidnight { .. })));

        let result = time(1, 0).checked_add(TimeDelta::hours(-2));
        assert!(result.is_err());
    }

    #[test]
    fn time_of_day_parses_and_displays() {
        let t: TimeOfDay = "08:30".parse().unwrap();
        assert_eq!(t, time(8, 30));
        assert_eq!(t.to_string(), "08:30:00");

        let t: TimeOfDay = "08:30:15".parse().unwrap();
        assert_eq!(t, TimeOfDay::from_hms(8, 30, 15).unwrap());

        assert!("25:00".parse::<TimeOfDay>().is_err());
    }

    #[test]
    fn work_calendar_respects_holidays() {
        let mut calendar = WorkCalendar::default();
        calendar.holidays.insert(day(2021, 1, 4));

        assert!(!calendar.is_business_day(day(2021, 1, 4)));
        assert!(calendar.is_business_day(day(2021, 1, 5)));
        assert!(!calendar.is_business_day(day(2021, 1, 9)));
    }

    #[test]
    fn work_calendar_parses_from_toml() {
        let toml = r#"
open = "08:00"
close = "16:30"
workdays = ["Mon", "Wed"]
holidays = ["2021-01-06"]
"#;
        let calendar: WorkCalendar = toml::from_str(toml).unwrap();

        assert_eq!(calendar.open, time(8, 0));
        assert_eq!(calendar.close, time(16, 30));
        assert_eq!(calendar.workdays, vec![Weekday::Mon, Weekday::Wed]);
        assert!(!calendar.is_business_day(day(2021, 1, 6)));
    }

    #[test]
    fn cached_matches_uncached() {
        let is_biz = only(vec![
            day(2021, 1, 1),
            day(2021, 1, 3),
            day(2021, 1, 4),
            day(2021, 1, 7),
            day(2021, 1, 8),
        ]);
        let uncached = is_biz.clone();
        let cached =
            CachedAddBusinessDays::new(move |d, n| add_business_days(d, n, &is_biz));

        for start in 1..=3 {
            for n in 0..4 {
                let d = day(2021, 1, start);
                assert_eq!(cached.get(d, n), add_business_days(d, n, &uncached));
                assert_eq!(cached.get(d, n), add_business_days(d, n, &uncached));
            }
        }
        assert_eq!(cached.len(), 12);
    }

    #[test]
    fn cache_is_consistent_under_concurrent_callers() {
        let calendar = WorkCalendar::default();
        let cached = CachedAddBusinessDays::new(move |d, n| {
            add_business_days(d, n, |x| calendar.is_business_day(x))
        });
        let reference = WorkCalendar::default();

        std::thread::scope(|scope| {
            for worker in 0..8u32 {
                let cached = &cached;
                let reference = &reference;
                scope.spawn(move || {
                    for i in 0..200u32 {
                        let start = day(2021, 1, 1) + TimeDelta::days(i64::from(i % 31));
                        let n = (i + worker) % 20;
                        let expected =
                            add_business_days(start, n, |x| reference.is_business_day(x));
                        assert_eq!(cached.get(start, n), expected);
                    }
                });
            }
        });

        assert!(!cached.is_empty());
    }

    #[test]
    fn business_time_is_shareable_across_threads() {
        let bt = BusinessTime::new(WorkCalendar::default());
        let expected = bt.at(day(2021, 1, 4), 3.25).unwrap();

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    assert_eq!(bt.at(day(2021, 1, 4), 3.25).unwrap(), expected);
                });
            }
        });
    }
}
