//! Expansion of leaf conditions into concrete intervals.
//!
//! Each function returns the raw intervals of its leaf for every local day
//! that intersects `[lower, upper)`. Results may reach outside the window;
//! the evaluator clips them. Days are stepped as calendar dates and anchored
//! through [`crate::dst`], so DST transitions neither skip nor repeat a day.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate};
use chrono_tz::Tz;

use crate::condition::{RegionId, TimeOfDay, Weekday};
use crate::dst::{at_time_of_day, local_midnight, next_day};
use crate::error::HolidayError;
use crate::holidays::HolidaySource;
use crate::interval::Interval;

/// `[start_time, end_time)` on each local day of the window.
pub(crate) fn daily_window(
    lower: &DateTime<Tz>,
    upper: &DateTime<Tz>,
    start_time: TimeOfDay,
    end_time: TimeOfDay,
    tz: &Tz,
) -> Vec<Interval> {
    local_days(lower, upper, tz)
        .map(|day| {
            Interval::new(
                at_time_of_day(tz, day, start_time),
                at_time_of_day(tz, day, end_time),
            )
        })
        .collect()
}

/// One interval per run of consecutive days whose weekday lies in
/// `start_day..=end_day`, from the run's first midnight to the midnight after
/// its last day. Ranges with `start_day > end_day` wrap across the week.
pub(crate) fn weekday_range(
    lower: &DateTime<Tz>,
    upper: &DateTime<Tz>,
    start_day: Weekday,
    end_day: Weekday,
    tz: &Tz,
) -> Vec<Interval> {
    let matches = |day: &NaiveDate| Weekday::from(day.weekday()).in_range(start_day, end_day);

    let mut intervals = Vec::new();
    let mut days = local_days(lower, upper, tz).peekable();

    while let Some(day) = days.next() {
        if !matches(&day) {
            continue;
        }
        let mut block_end = next_day(day);
        while let Some(next) = days.next_if(matches) {
            block_end = next_day(next);
        }
        intervals.push(Interval::new(local_midnight(tz, day), local_midnight(tz, block_end)));
    }

    intervals
}

/// The fixed range itself, expressed in `tz`.
pub(crate) fn absolute_range(start: &DateTime<FixedOffset>, end: &DateTime<FixedOffset>, tz: &Tz) -> Vec<Interval> {
    vec![Interval::new(start.with_timezone(tz), end.with_timezone(tz))]
}

/// Each holiday of `region` as a whole local day.
///
/// # Errors
/// Whatever the holiday source reports, unchanged.
pub(crate) fn holidays<H: HolidaySource + ?Sized>(
    source: &H,
    region: &RegionId,
    lower: &DateTime<Tz>,
    upper: &DateTime<Tz>,
) -> Result<Vec<Interval>, HolidayError> {
    Ok(source
        .holidays(region, lower, upper)?
        .into_iter()
        .map(|day_start| {
            let tz = day_start.timezone();
            let day_end = local_midnight(&tz, next_day(day_start.date_naive()));
            Interval::new(day_start, day_end)
        })
        .collect())
}

/// Local calendar dates in `tz` from the day of `lower` through the day of `upper`.
fn local_days(lower: &DateTime<Tz>, upper: &DateTime<Tz>, tz: &Tz) -> impl Iterator<Item = NaiveDate> {
    let first = lower.with_timezone(tz).date_naive();
    let last = upper.with_timezone(tz).date_naive();
    first.iter_days().take_while(move |day| *day <= last)
}
