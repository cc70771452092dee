//! Availability condition trees.
//!
//! A [`Condition`] is a recursive boolean expression over time: combinators
//! (`Not`, `And`, `Or`, `All`) and leaves that expand into concrete intervals
//! (absolute ranges, daily windows, weekday ranges, public holidays).
//!
//! The serde representation matches the persisted documents: an internally
//! tagged object keyed by `"type"`. Fields the evaluator does not use, such as
//! audit metadata, are ignored on decode.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, TimeZone};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{AvailabilityError, Result};

/// Day of the week, ordered in calendar order starting on Monday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Weekday {
    pub const ALL: [Self; 7] = [
        Self::Mon,
        Self::Tue,
        Self::Wed,
        Self::Thu,
        Self::Fri,
        Self::Sat,
        Self::Sun,
    ];

    /// Zero-based index, Monday = 0.
    pub const fn index(self) -> u32 {
        self as u32
    }

    /// Inverse of [`Weekday::index`], wrapping modulo 7.
    pub const fn from_index(index: u32) -> Self {
        Self::ALL[(index % 7) as usize]
    }

    /// Whether `self` falls in the inclusive range `start..=end`. A range whose
    /// start comes after its end wraps across Sunday/Monday.
    pub fn in_range(self, start: Self, end: Self) -> bool {
        if start <= end {
            start <= self && self <= end
        } else {
            self >= start || self <= end
        }
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(day: chrono::Weekday) -> Self {
        Self::from_index(day.num_days_from_monday())
    }
}

impl From<Weekday> for chrono::Weekday {
    fn from(day: Weekday) -> Self {
        match day {
            Weekday::Mon => Self::Mon,
            Weekday::Tue => Self::Tue,
            Weekday::Wed => Self::Wed,
            Weekday::Thu => Self::Thu,
            Weekday::Fri => Self::Fri,
            Weekday::Sat => Self::Sat,
            Weekday::Sun => Self::Sun,
        }
    }
}

/// Wall-clock time of day with minute precision.
///
/// `24:00` is representable and means the midnight that ends the day; it is
/// only valid as the end of a daily window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeOfDay {
    /// `0..=23`, or `24` for the end of the day.
    pub hour: u32,
    /// `0..=59`.
    pub minute: u32,
}

impl TimeOfDay {
    pub const MIDNIGHT: Self = Self { hour: 0, minute: 0 };
    pub const END_OF_DAY: Self = Self { hour: 24, minute: 0 };

    pub const fn new(hour: u32, minute: u32) -> Self {
        Self { hour, minute }
    }

    pub const fn minutes_since_midnight(self) -> u32 {
        self.hour * 60 + self.minute
    }

    pub const fn is_end_of_day(self) -> bool {
        self.hour == 24 && self.minute == 0
    }

    fn is_valid(self, allow_end_of_day: bool) -> bool {
        (self.hour < 24 && self.minute < 60) || (allow_end_of_day && self.is_end_of_day())
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeOfDay {
    type Err = AvailabilityError;

    /// Parses `H:MM` / `HH:MM`, accepting `24:00`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || AvailabilityError::InvalidTime(s.to_string());
        let (hour, minute) = s.trim().split_once(':').ok_or_else(invalid)?;
        if hour.is_empty() || hour.len() > 2 || minute.len() != 2 {
            return Err(invalid());
        }
        let time = Self {
            hour: hour.parse().map_err(|_| invalid())?,
            minute: minute.parse().map_err(|_| invalid())?,
        };
        if time.is_valid(true) {
            Ok(time)
        } else {
            Err(invalid())
        }
    }
}

/// Identifier of a holiday region, e.g. `Bundesland:Berlin`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(String);

impl RegionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RegionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for RegionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A node of an availability condition tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    Not {
        child: Box<Condition>,
    },
    /// Empty `And` is always available.
    And {
        children: Vec<Condition>,
    },
    /// Empty `Or` is never available.
    Or {
        children: Vec<Condition>,
    },
    All,
    /// One fixed interval `[start, end)`.
    #[serde(rename = "time_span")]
    AbsoluteRange {
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
        timezone: Tz,
    },
    /// `[start_time, end_time)` on every calendar day in `timezone`.
    #[serde(rename = "time_span_during_day")]
    DailyWindow {
        start_time: TimeOfDay,
        end_time: TimeOfDay,
        timezone: Tz,
    },
    /// Whole days from `start_day` through `end_day`, inclusive.
    #[serde(rename = "weekdays")]
    WeekdayRange {
        start_day: Weekday,
        end_day: Weekday,
        timezone: Tz,
    },
    /// Public holidays of `region`, as whole days.
    Holidays {
        region: RegionId,
    },
}

impl Condition {
    #[allow(clippy::should_implement_trait)]
    pub fn not(child: Condition) -> Self {
        Self::Not {
            child: Box::new(child),
        }
    }

    pub fn and(children: impl IntoIterator<Item = Condition>) -> Self {
        Self::And {
            children: children.into_iter().collect(),
        }
    }

    pub fn or(children: impl IntoIterator<Item = Condition>) -> Self {
        Self::Or {
            children: children.into_iter().collect(),
        }
    }

    pub fn all() -> Self {
        Self::All
    }

    pub fn absolute_range<Z: TimeZone>(start: &DateTime<Z>, end: &DateTime<Z>, timezone: Tz) -> Self {
        Self::AbsoluteRange {
            start: start.fixed_offset(),
            end: end.fixed_offset(),
            timezone,
        }
    }

    pub fn daily_window(start_time: TimeOfDay, end_time: TimeOfDay, timezone: Tz) -> Self {
        Self::DailyWindow {
            start_time,
            end_time,
            timezone,
        }
    }

    pub fn weekday_range(start_day: Weekday, end_day: Weekday, timezone: Tz) -> Self {
        Self::WeekdayRange {
            start_day,
            end_day,
            timezone,
        }
    }

    pub fn holidays(region: impl Into<RegionId>) -> Self {
        Self::Holidays {
            region: region.into(),
        }
    }

    /// Decode a persisted condition tree and validate it.
    ///
    /// # Errors
    /// Returns `AvailabilityError::Json` for unknown variants, missing fields or
    /// unknown timezones, and `AvailabilityError::InvalidCondition` for trees
    /// that decode but fail [`Condition::validate`].
    pub fn from_json(json: &str) -> Result<Self> {
        let condition: Self = serde_json::from_str(json)?;
        condition.validate()?;
        Ok(condition)
    }

    /// The persisted `"type"` tag of this node.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Not { .. } => "not",
            Self::And { .. } => "and",
            Self::Or { .. } => "or",
            Self::All => "all",
            Self::AbsoluteRange { .. } => "time_span",
            Self::DailyWindow { .. } => "time_span_during_day",
            Self::WeekdayRange { .. } => "weekdays",
            Self::Holidays { .. } => "holidays",
        }
    }

    /// Check the whole tree before evaluation.
    ///
    /// Rejected: absolute ranges ending before they start, daily windows with
    /// out-of-range times, daily windows whose end is not after their start
    /// (overnight windows are not supported; use `24:00` to run until
    /// midnight), and empty holiday regions.
    ///
    /// # Errors
    /// Returns `AvailabilityError::InvalidCondition` naming the first offending node.
    pub fn validate(&self) -> Result<()> {
        self.validate_at("root")
    }

    fn validate_at(&self, path: &str) -> Result<()> {
        match self {
            Self::Not { child } => child.validate_at(&format!("{path}.child")),
            Self::And { children } | Self::Or { children } => {
                for (i, child) in children.iter().enumerate() {
                    child.validate_at(&format!("{path}.children[{i}]"))?;
                }
                Ok(())
            }
            Self::All | Self::WeekdayRange { .. } => Ok(()),
            Self::AbsoluteRange { start, end, .. } => {
                if start > end {
                    return Err(invalid(path, format!("range ends ({end}) before it starts ({start})")));
                }
                Ok(())
            }
            Self::DailyWindow {
                start_time,
                end_time,
                ..
            } => {
                if !start_time.is_valid(false) {
                    return Err(invalid(path, format!("start time {start_time} is out of range")));
                }
                if !end_time.is_valid(true) {
                    return Err(invalid(path, format!("end time {end_time} is out of range")));
                }
                if end_time <= start_time {
                    return Err(invalid(
                        path,
                        format!("end time {end_time} is not after start time {start_time}"),
                    ));
                }
                Ok(())
            }
            Self::Holidays { region } => {
                if region.as_str().trim().is_empty() {
                    return Err(invalid(path, "holiday region is empty".to_string()));
                }
                Ok(())
            }
        }
    }
}

fn invalid(path: &str, reason: String) -> AvailabilityError {
    AvailabilityError::InvalidCondition {
        path: path.to_string(),
        reason,
    }
}

/// Parse an IANA timezone name.
///
/// # Errors
/// Returns `AvailabilityError::InvalidTimezone` if `name` is not a known zone.
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse()
        .map_err(|_| AvailabilityError::InvalidTimezone(name.to_string()))
}
