//! Half-open datetime intervals.

use std::fmt;

use chrono::{DateTime, Duration, TimeZone};
use chrono_tz::Tz;
use serde::Serialize;

/// The half-open interval `[start, end)`.
///
/// `start <= end` is not enforced on construction. Producers in this crate
/// only ever emit non-empty intervals; [`Interval::is_empty`] covers the rest.
/// Equality, ordering and hashing compare instants, so intervals in
/// different zones compare correctly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Interval {
    /// First instant inside the interval.
    pub start: DateTime<Tz>,
    /// First instant after the interval.
    pub end: DateTime<Tz>,
}

impl Interval {
    pub const fn new(start: DateTime<Tz>, end: DateTime<Tz>) -> Self {
        Self { start, end }
    }

    /// True for zero-length and inverted intervals.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Whether `instant` lies in `[start, end)`.
    pub fn contains<Z: TimeZone>(&self, instant: &DateTime<Z>) -> bool {
        self.start <= *instant && *instant < self.end
    }

    /// Strict overlap. Intervals that only touch at an endpoint do not overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Overlap or shared endpoint, i.e. the two can be merged into one interval
    /// without covering any extra instant.
    pub fn touches_or_overlaps(&self, other: &Self) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Smallest interval covering both.
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Trim to `[lower, upper)`. The result is empty when `self` lies outside
    /// the window.
    pub fn clip(&self, lower: &DateTime<Tz>, upper: &DateTime<Tz>) -> Self {
        Self {
            start: self.start.max(*lower),
            end: self.end.min(*upper),
        }
    }

    pub fn with_timezone(&self, tz: &Tz) -> Self {
        Self {
            start: self.start.with_timezone(tz),
            end: self.end.with_timezone(tz),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}
