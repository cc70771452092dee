//! # availability-engine
//!
//! Decides when a service provider is available within an arbitrary time
//! window, given an availability condition tree.
//!
//! A tree combines `Not`/`And`/`Or`/`All` with timezone-aware leaves (daily
//! time windows, weekday ranges, absolute ranges, public holidays). Evaluation
//! is a pure function of the tree and the window, apart from holiday lookups
//! through an injected [`HolidaySource`]. All intervals are half-open.
//!
//! ```rust
//! use availability_engine::{AvailabilityEngine, Condition, StaticHolidays, TimeOfDay};
//! use chrono::TimeZone;
//! use chrono_tz::Europe::Berlin;
//!
//! let engine = AvailabilityEngine::new(StaticHolidays::new());
//! let office = Condition::daily_window(TimeOfDay::new(9, 0), TimeOfDay::new(17, 0), Berlin);
//!
//! let lower = Berlin.with_ymd_and_hms(2026, 3, 16, 0, 0, 0).unwrap();
//! let upper = Berlin.with_ymd_and_hms(2026, 3, 19, 0, 0, 0).unwrap();
//! let spans = engine.evaluate(&office, &lower, &upper).unwrap();
//! assert_eq!(spans.len(), 3);
//! ```
//!
//! ## Modules
//!
//! - [`interval`] — half-open `[start, end)` datetime intervals
//! - [`condition`] — condition tree data model and validation
//! - [`algebra`] — complement and union over interval lists
//! - [`evaluator`] — recursive evaluation entry point, expanding leaves
//!   day by day in each leaf's zone (DST gaps shift forward, overlaps take
//!   the earlier instant)
//! - [`holidays`] — holiday source trait, static and cached sources
//! - [`schedule`] — opening-hours and emergency-exception compilers
//! - [`week_grid`] — weekly 24-hour clock display projection
//! - [`error`] — Error types

pub mod algebra;
pub mod condition;
mod dst;
pub mod error;
pub mod evaluator;
pub mod holidays;
pub mod interval;
mod leaf;
pub mod schedule;
pub mod week_grid;

pub use condition::{parse_timezone, Condition, RegionId, TimeOfDay, Weekday};
pub use error::{AvailabilityError, HolidayError};
pub use evaluator::{evaluate, AvailabilityEngine, REFERENCE_TIMEZONE};
pub use holidays::{
    CachedHolidaySource, HolidayCacheConfig, HolidayProvider, HolidaySource, RegionHolidays, StaticHolidays,
};
pub use interval::Interval;
pub use schedule::{
    from_emergency_exceptions, from_opening_hours, EmergencyException, OpeningHours, OpeningHoursEntry,
    ProviderSchedule,
};
pub use week_grid::{current_week_grid, week_grid, ClockSpan, Clock24, WeekGrid};
