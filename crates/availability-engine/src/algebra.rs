//! Set operations over interval lists within a window `[lower, upper)`.
//!
//! Only complement and union are implemented; intersection is derived from
//! them by De Morgan's law in the evaluator.

use chrono::DateTime;
use chrono_tz::Tz;

use crate::interval::Interval;

/// Gaps between `intervals` inside `[lower, upper)`.
///
/// `intervals` must be sorted ascending by start and pairwise disjoint; see
/// [`normalize`]. Zero-length gaps are not emitted.
pub fn complement(lower: &DateTime<Tz>, upper: &DateTime<Tz>, intervals: &[Interval]) -> Vec<Interval> {
    let mut gaps = Vec::new();
    let mut cursor = *lower;

    for interval in intervals {
        if interval.start > cursor {
            push_clipped(&mut gaps, Interval::new(cursor, interval.start), lower, upper);
        }
        cursor = cursor.max(interval.end);
    }

    // Trailing gap after the last interval.
    if cursor < *upper {
        push_clipped(&mut gaps, Interval::new(cursor, *upper), lower, upper);
    }

    gaps
}

/// Merge `intervals` (any order, possibly overlapping) into a minimal list of
/// disjoint intervals, each clipped to `[lower, upper)`.
///
/// Intervals that overlap or share an endpoint are joined. Quadratic in the
/// number of inputs, which stays small for condition trees. The result is
/// sorted ascending by start.
pub fn union(
    lower: &DateTime<Tz>,
    upper: &DateTime<Tz>,
    intervals: impl IntoIterator<Item = Interval>,
) -> Vec<Interval> {
    let mut merged: Vec<Interval> = Vec::new();

    for interval in intervals {
        let mut incoming = interval.clip(lower, upper);
        if incoming.is_empty() {
            continue;
        }
        merged.retain(|existing| {
            if existing.touches_or_overlaps(&incoming) {
                incoming = incoming.merge(existing);
                false
            } else {
                true
            }
        });
        merged.push(incoming);
    }

    merged.sort();
    merged
}

/// Sort ascending by `(start, end)` and drop exact duplicates.
pub fn sorted_unique(mut intervals: Vec<Interval>) -> Vec<Interval> {
    intervals.sort_unstable();
    intervals.dedup();
    intervals
}

/// Establish the precondition of [`complement`]: sorted, deduplicated and
/// merged, so overlapping inputs cannot produce spurious gaps.
pub fn normalize(lower: &DateTime<Tz>, upper: &DateTime<Tz>, intervals: Vec<Interval>) -> Vec<Interval> {
    union(lower, upper, sorted_unique(intervals))
}

fn push_clipped(out: &mut Vec<Interval>, interval: Interval, lower: &DateTime<Tz>, upper: &DateTime<Tz>) {
    let clipped = interval.clip(lower, upper);
    if !clipped.is_empty() {
        out.push(clipped);
    }
}
