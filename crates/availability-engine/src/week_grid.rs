//! Weekly 24-hour clock view of availability, for display.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::condition::{Condition, Weekday};
use crate::dst::{local_midnight, next_day};
use crate::error::Result;
use crate::evaluator::AvailabilityEngine;
use crate::holidays::HolidaySource;

/// A wall-clock time. `24:00` marks the end of the day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Clock24 {
    /// `0..=24`; `24` only as `24:00:00`.
    pub hour: u32,
    /// `0..=59`.
    pub minute: u32,
    /// `0..=59`; shown only when non-zero.
    pub second: u32,
    /// `HH:MM`, or `HH:MM:SS` when seconds are non-zero.
    pub digital_clock_string: String,
}

impl Clock24 {
    pub fn new(hour: u32, minute: u32, second: u32) -> Self {
        let digital_clock_string = if second == 0 {
            format!("{hour:02}:{minute:02}")
        } else {
            format!("{hour:02}:{minute:02}:{second:02}")
        };
        Self {
            hour,
            minute,
            second,
            digital_clock_string,
        }
    }

    /// Wall-clock reading of `instant` in `tz` relative to `day`; any instant
    /// on a later day reads as `24:00`.
    fn on_day(instant: &DateTime<Tz>, day: NaiveDate, tz: &Tz) -> Self {
        let local = instant.with_timezone(tz);
        if local.date_naive() > day {
            return Self::new(24, 0, 0);
        }
        Self::new(local.hour(), local.minute(), local.second())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClockSpan {
    /// Where the span starts on its day.
    pub start_time: Clock24,
    /// Where the span ends on its day, `24:00` if it runs to midnight.
    pub end_time: Clock24,
    /// `start-end`, e.g. `09:00-17:30`.
    pub digital_clock_string: String,
}

impl ClockSpan {
    pub fn new(start_time: Clock24, end_time: Clock24) -> Self {
        let digital_clock_string = format!(
            "{}-{}",
            start_time.digital_clock_string, end_time.digital_clock_string
        );
        Self {
            start_time,
            end_time,
            digital_clock_string,
        }
    }
}

/// Available spans per weekday, Monday first.
pub type WeekGrid = BTreeMap<Weekday, Vec<ClockSpan>>;

/// Evaluate `condition` for each day of the calendar week (Monday to Sunday,
/// in `tz`) containing `now`, and render the spans as clock times in `tz`.
///
/// # Errors
/// Any error from [`AvailabilityEngine::evaluate`].
pub fn week_grid<H: HolidaySource, Z: TimeZone>(
    engine: &AvailabilityEngine<H>,
    condition: &Condition,
    now: &DateTime<Z>,
    tz: &Tz,
) -> Result<WeekGrid> {
    let today = now.with_timezone(tz).date_naive();
    let monday = today - Duration::days(i64::from(Weekday::from(today.weekday()).index()));

    let mut grid = WeekGrid::new();
    for weekday in Weekday::ALL {
        let day = monday + Duration::days(i64::from(weekday.index()));
        let day_start = local_midnight(tz, day);
        let day_end = local_midnight(tz, next_day(day));

        let spans = engine
            .evaluate(condition, &day_start, &day_end)?
            .iter()
            .map(|interval| {
                ClockSpan::new(
                    Clock24::on_day(&interval.start, day, tz),
                    Clock24::on_day(&interval.end, day, tz),
                )
            })
            .collect();
        grid.insert(weekday, spans);
    }

    Ok(grid)
}

/// [`week_grid`] for the current week according to the system clock.
///
/// # Errors
/// Any error from [`AvailabilityEngine::evaluate`].
pub fn current_week_grid<H: HolidaySource>(
    engine: &AvailabilityEngine<H>,
    condition: &Condition,
    tz: &Tz,
) -> Result<WeekGrid> {
    week_grid(engine, condition, &Utc::now(), tz)
}
