//! Recursive evaluation of condition trees.
//!
//! [`AvailabilityEngine::evaluate`] is the entry point: it validates the tree
//! and window, moves both bounds into the engine's reference timezone and
//! walks the tree. Combinators are built from complement and union only; `And`
//! is evaluated as `Not(Or(Not(c1), ..., Not(cn)))`.

use chrono::{DateTime, TimeZone};
use chrono_tz::Tz;

use crate::algebra::{complement, normalize, sorted_unique, union};
use crate::condition::Condition;
use crate::error::{AvailabilityError, Result};
use crate::holidays::HolidaySource;
use crate::interval::Interval;
use crate::leaf;

/// Zone in which evaluation anchors its window. Emitted intervals are
/// absolute instants, so the choice does not change results; it keeps
/// intermediate values readable in the business's own locale.
pub const REFERENCE_TIMEZONE: Tz = chrono_tz::Europe::Berlin;

/// Evaluates condition trees against an injected holiday source.
///
/// Evaluation is pure apart from holiday lookups: the engine holds no mutable
/// state, so it can be shared across threads whenever `H` can.
#[derive(Debug, Clone)]
pub struct AvailabilityEngine<H> {
    holidays: H,
    reference_tz: Tz,
}

impl<H: HolidaySource> AvailabilityEngine<H> {
    pub fn new(holidays: H) -> Self {
        Self {
            holidays,
            reference_tz: REFERENCE_TIMEZONE,
        }
    }

    pub fn with_reference_timezone(mut self, tz: Tz) -> Self {
        self.reference_tz = tz;
        self
    }

    pub fn reference_timezone(&self) -> Tz {
        self.reference_tz
    }

    pub fn holiday_source(&self) -> &H {
        &self.holidays
    }

    /// Intervals of `[lower, upper)` during which `condition` holds.
    ///
    /// The result is disjoint, sorted ascending by start and contained in the
    /// window. Intervals are expressed in the reference timezone unless they
    /// come straight from a leaf, which keeps its own zone.
    ///
    /// # Errors
    /// - `AvailabilityError::InvalidWindow` if `lower > upper`.
    /// - `AvailabilityError::InvalidCondition` if the tree fails validation;
    ///   nothing is evaluated in that case.
    /// - `AvailabilityError::Holiday` if the holiday source fails.
    pub fn evaluate<Z: TimeZone>(
        &self,
        condition: &Condition,
        lower: &DateTime<Z>,
        upper: &DateTime<Z>,
    ) -> Result<Vec<Interval>> {
        let lower = lower.with_timezone(&self.reference_tz);
        let upper = upper.with_timezone(&self.reference_tz);
        if lower > upper {
            return Err(AvailabilityError::InvalidWindow {
                lower: lower.to_rfc3339(),
                upper: upper.to_rfc3339(),
            });
        }
        condition.validate()?;

        tracing::debug!(
            kind = condition.kind(),
            lower = %lower.to_rfc3339(),
            upper = %upper.to_rfc3339(),
            "evaluating availability"
        );
        self.evaluate_node(condition, &lower, &upper)
    }

    fn evaluate_node(&self, condition: &Condition, lower: &DateTime<Tz>, upper: &DateTime<Tz>) -> Result<Vec<Interval>> {
        let intervals = match condition {
            Condition::All => clip_all(lower, upper, vec![Interval::new(*lower, *upper)]),
            Condition::Not { child } => self.negate(child, lower, upper)?,
            Condition::Or { children } => {
                let mut spans = Vec::new();
                for child in children {
                    spans.extend(self.evaluate_node(child, lower, upper)?);
                }
                union(lower, upper, sorted_unique(spans))
            }
            Condition::And { children } => {
                // De Morgan: available where no child is unavailable.
                let mut unavailable = Vec::new();
                for child in children {
                    unavailable.extend(self.negate(child, lower, upper)?);
                }
                complement(lower, upper, &union(lower, upper, sorted_unique(unavailable)))
            }
            leaf => clip_all(lower, upper, self.expand_leaf(leaf, lower, upper)?),
        };

        tracing::trace!(kind = condition.kind(), intervals = intervals.len(), "evaluated condition");
        Ok(intervals)
    }

    fn negate(&self, condition: &Condition, lower: &DateTime<Tz>, upper: &DateTime<Tz>) -> Result<Vec<Interval>> {
        let spans = self.evaluate_node(condition, lower, upper)?;
        Ok(complement(lower, upper, &normalize(lower, upper, spans)))
    }

    fn expand_leaf(&self, condition: &Condition, lower: &DateTime<Tz>, upper: &DateTime<Tz>) -> Result<Vec<Interval>> {
        let spans = match condition {
            Condition::AbsoluteRange { start, end, timezone } => leaf::absolute_range(start, end, timezone),
            Condition::DailyWindow {
                start_time,
                end_time,
                timezone,
            } => leaf::daily_window(lower, upper, *start_time, *end_time, timezone),
            Condition::WeekdayRange {
                start_day,
                end_day,
                timezone,
            } => leaf::weekday_range(lower, upper, *start_day, *end_day, timezone),
            Condition::Holidays { region } => leaf::holidays(&self.holidays, region, lower, upper)?,
            Condition::All | Condition::Not { .. } | Condition::And { .. } | Condition::Or { .. } => {
                return Err(AvailabilityError::InvalidCondition {
                    path: condition.kind().to_string(),
                    reason: "combinator passed to leaf expansion".to_string(),
                })
            }
        };
        Ok(spans)
    }
}

/// Evaluate `condition` once with the given holiday source.
///
/// Convenience over building an [`AvailabilityEngine`] with the default
/// reference timezone.
///
/// # Errors
/// See [`AvailabilityEngine::evaluate`].
pub fn evaluate<Z: TimeZone, H: HolidaySource>(
    condition: &Condition,
    lower: &DateTime<Z>,
    upper: &DateTime<Z>,
    holidays: &H,
) -> Result<Vec<Interval>> {
    AvailabilityEngine::new(holidays).evaluate(condition, lower, upper)
}

/// Clip to the window, drop what falls outside, and order by start.
fn clip_all(lower: &DateTime<Tz>, upper: &DateTime<Tz>, intervals: Vec<Interval>) -> Vec<Interval> {
    sorted_unique(
        intervals
            .into_iter()
            .map(|interval| interval.clip(lower, upper))
            .filter(|interval| !interval.is_empty())
            .collect(),
    )
}
