//! Wall-clock to instant resolution across DST transitions.
//!
//! Leaf evaluators step through local calendar days and anchor times to them.
//! A local time may not exist (spring-forward gap) or may exist twice
//! (fall-back overlap); these helpers map every local time to exactly one
//! instant so that no day is skipped or doubled.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;

use crate::condition::TimeOfDay;

/// Resolve a local wall-clock time in `tz`.
///
/// - Unambiguous times map directly.
/// - Times in a fall-back overlap take the earlier instant.
/// - Times in a spring-forward gap are shifted forward by the gap length,
///   i.e. interpreted with the offset in effect before the transition
///   (02:30 on a Berlin spring-forward day becomes 03:30 CEST).
pub(crate) fn resolve_local(tz: &Tz, local: NaiveDateTime) -> DateTime<Tz> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => {
            let offset_before = tz
                .offset_from_utc_datetime(&(local - Duration::days(1)))
                .fix();
            let utc = local - Duration::seconds(i64::from(offset_before.local_minus_utc()));
            Utc.from_utc_datetime(&utc).with_timezone(tz)
        }
    }
}

/// First instant of `date` in `tz`.
pub(crate) fn local_midnight(tz: &Tz, date: NaiveDate) -> DateTime<Tz> {
    resolve_local(tz, date.and_time(NaiveTime::MIN))
}

/// `time` on `date` in `tz`. `24:00` resolves to the following midnight.
pub(crate) fn at_time_of_day(tz: &Tz, date: NaiveDate, time: TimeOfDay) -> DateTime<Tz> {
    if time.is_end_of_day() {
        return local_midnight(tz, next_day(date));
    }
    let naive = NaiveTime::from_hms_opt(time.hour, time.minute, 0).unwrap_or(NaiveTime::MIN);
    resolve_local(tz, date.and_time(naive))
}

pub(crate) fn next_day(date: NaiveDate) -> NaiveDate {
    date.succ_opt().unwrap_or(date)
}
