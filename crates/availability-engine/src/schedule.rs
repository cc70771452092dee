//! Compile human-authored schedules into condition trees.
//!
//! Providers usually describe availability as a weekly opening-hours table
//! and a list of emergency-service exceptions. Both compile into plain
//! [`Condition`] trees that the evaluator consumes like any other.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::condition::{parse_timezone, Condition, TimeOfDay, Weekday};
use crate::dst::{local_midnight, next_day};
use crate::error::{AvailabilityError, Result};
use crate::evaluator::REFERENCE_TIMEZONE;

/// Opening time on one weekday, `"HH:MM"` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningHoursEntry {
    /// Opening time.
    #[serde(with = "hhmm")]
    pub from: TimeOfDay,
    /// Closing time; `24:00` keeps the day open until midnight.
    #[serde(with = "hhmm")]
    pub to: TimeOfDay,
}

/// Weekly opening hours. Days without an entry are closed.
pub type OpeningHours = BTreeMap<Weekday, OpeningHoursEntry>;

/// A period during which emergency service is offered at set times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyException {
    /// First day the exception applies.
    pub start_date: NaiveDate,
    /// Inclusive.
    pub end_date: NaiveDate,
    /// Daily start of emergency service.
    #[serde(with = "hhmm")]
    pub from_time: TimeOfDay,
    /// Daily end of emergency service.
    #[serde(with = "hhmm")]
    pub to_time: TimeOfDay,
    /// Weekdays the exception applies to; empty means every day.
    #[serde(default)]
    pub days: Vec<Weekday>,
}

/// Everything a provider records about when it is available.
///
/// An explicit condition tree takes precedence over the tables it would
/// otherwise be compiled from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSchedule {
    /// Regular weekly hours.
    pub opening_hours: OpeningHours,
    /// Emergency-service periods, if the provider offers any.
    #[serde(default)]
    pub emergency_times: Option<Vec<EmergencyException>>,
    /// Stored tree overriding `opening_hours`.
    #[serde(default)]
    pub availability_condition: Option<Condition>,
    /// Stored tree overriding `emergency_times`.
    #[serde(default)]
    pub emergency_availability_condition: Option<Condition>,
    /// IANA zone both tables are written in.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_timezone() -> String {
    REFERENCE_TIMEZONE.name().to_string()
}

impl ProviderSchedule {
    /// Regular availability.
    ///
    /// # Errors
    /// See [`from_opening_hours`].
    pub fn availability(&self) -> Result<Condition> {
        match &self.availability_condition {
            Some(condition) => Ok(condition.clone()),
            None => from_opening_hours(&self.opening_hours, &self.timezone),
        }
    }

    /// Emergency-service availability, if any is recorded.
    ///
    /// # Errors
    /// See [`from_emergency_exceptions`].
    pub fn emergency_availability(&self) -> Result<Option<Condition>> {
        if let Some(condition) = &self.emergency_availability_condition {
            return Ok(Some(condition.clone()));
        }
        self.emergency_times
            .as_deref()
            .map(|times| from_emergency_exceptions(times, &self.timezone))
            .transpose()
    }
}

/// `Or` over each listed weekday of `And(WeekdayRange(day, day), DailyWindow(from, to))`.
///
/// # Errors
/// Returns `AvailabilityError::InvalidTimezone` for an unknown `timezone` and
/// `AvailabilityError::InvalidCondition` for entries whose `to` is not after
/// `from`.
pub fn from_opening_hours(table: &OpeningHours, timezone: &str) -> Result<Condition> {
    let tz = parse_timezone(timezone)?;

    let condition = Condition::or(table.iter().map(|(day, hours)| {
        Condition::and([
            Condition::weekday_range(*day, *day, tz),
            Condition::daily_window(hours.from, hours.to, tz),
        ])
    }));

    condition.validate()?;
    Ok(condition)
}

/// `Or` over each exception of
/// `And(AbsoluteRange(start_date, end_date), DailyWindow(from, to), Or(WeekdayRange(d, d)...))`.
///
/// # Errors
/// Returns `AvailabilityError::InvalidTimezone` for an unknown `timezone` and
/// `AvailabilityError::InvalidCondition` for exceptions ending before they
/// start or with an invalid time window.
pub fn from_emergency_exceptions(exceptions: &[EmergencyException], timezone: &str) -> Result<Condition> {
    let tz = parse_timezone(timezone)?;

    let mut branches = Vec::with_capacity(exceptions.len());
    for (i, exception) in exceptions.iter().enumerate() {
        if exception.end_date < exception.start_date {
            return Err(AvailabilityError::InvalidCondition {
                path: format!("exceptions[{i}]"),
                reason: format!(
                    "exception ends ({}) before it starts ({})",
                    exception.end_date, exception.start_date
                ),
            });
        }

        let start = local_midnight(&tz, exception.start_date);
        let end = local_midnight(&tz, next_day(exception.end_date));
        let days = if exception.days.is_empty() {
            Condition::weekday_range(Weekday::Mon, Weekday::Sun, tz)
        } else {
            Condition::or(
                exception
                    .days
                    .iter()
                    .map(|day| Condition::weekday_range(*day, *day, tz)),
            )
        };

        branches.push(Condition::and([
            Condition::absolute_range(&start, &end, tz),
            Condition::daily_window(exception.from_time, exception.to_time, tz),
            days,
        ]));
    }

    let condition = Condition::or(branches);
    condition.validate()?;
    Ok(condition)
}

/// `TimeOfDay` as an `"HH:MM"` string.
mod hhmm {
    use serde::{de, Deserialize, Deserializer, Serializer};

    use crate::condition::TimeOfDay;

    pub fn serialize<S: Serializer>(time: &TimeOfDay, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(time)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TimeOfDay, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}
