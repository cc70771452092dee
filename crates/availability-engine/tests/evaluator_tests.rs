//! Tests for recursive condition evaluation.

use availability_engine::{
    evaluate, AvailabilityEngine, AvailabilityError, Condition, HolidayError, Interval, RegionHolidays,
    StaticHolidays, TimeOfDay, Weekday,
};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Europe::Berlin;
use chrono_tz::Tz;

// ── Helpers ─────────────────────────────────────────────────────────────────

const REGION: &str = "Bundesland:Berlin";

fn berlin(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Tz> {
    Berlin.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

fn span(start: DateTime<Tz>, end: DateTime<Tz>) -> Interval {
    Interval::new(start, end)
}

fn nine_to_five() -> Condition {
    Condition::daily_window(TimeOfDay::new(9, 0), TimeOfDay::new(17, 0), Berlin)
}

fn engine() -> AvailabilityEngine<StaticHolidays> {
    // Good Friday and Easter Monday 2026.
    let days = [
        NaiveDate::from_ymd_opt(2026, 4, 3).unwrap(),
        NaiveDate::from_ymd_opt(2026, 4, 6).unwrap(),
    ];
    AvailabilityEngine::new(
        StaticHolidays::new().with_region(REGION, RegionHolidays::for_years(Berlin, 2026, 2026, days)),
    )
}

// ── Combinators ─────────────────────────────────────────────────────────────

#[test]
fn all_yields_the_whole_window() {
    let lower = berlin(2026, 3, 16, 8, 0);
    let upper = berlin(2026, 3, 16, 17, 0);
    let result = engine().evaluate(&Condition::all(), &lower, &upper).unwrap();
    assert_eq!(result, vec![span(lower, upper)]);
}

#[test]
fn all_over_empty_window_yields_nothing() {
    let at = berlin(2026, 3, 16, 8, 0);
    assert!(engine().evaluate(&Condition::all(), &at, &at).unwrap().is_empty());
}

#[test]
fn empty_or_is_never_available() {
    let result = engine()
        .evaluate(&Condition::or([]), &berlin(2026, 3, 16, 0, 0), &berlin(2026, 3, 17, 0, 0))
        .unwrap();
    assert!(result.is_empty());
}

#[test]
fn empty_and_is_always_available() {
    let lower = berlin(2026, 3, 16, 0, 0);
    let upper = berlin(2026, 3, 17, 0, 0);
    let result = engine().evaluate(&Condition::and([]), &lower, &upper).unwrap();
    assert_eq!(result, vec![span(lower, upper)]);
}

#[test]
fn not_yields_the_gaps() {
    let lower = berlin(2026, 3, 16, 0, 0);
    let upper = berlin(2026, 3, 17, 0, 0);
    let result = engine()
        .evaluate(&Condition::not(nine_to_five()), &lower, &upper)
        .unwrap();
    assert_eq!(
        result,
        vec![
            span(lower, berlin(2026, 3, 16, 9, 0)),
            span(berlin(2026, 3, 16, 17, 0), upper),
        ]
    );
}

#[test]
fn double_negation_is_identity() {
    let lower = berlin(2026, 3, 16, 0, 0);
    let upper = berlin(2026, 3, 19, 0, 0);
    let e = engine();
    let plain = e.evaluate(&nine_to_five(), &lower, &upper).unwrap();
    let doubled = e
        .evaluate(&Condition::not(Condition::not(nine_to_five())), &lower, &upper)
        .unwrap();
    assert_eq!(plain, doubled);
}

#[test]
fn or_merges_overlapping_and_touching_children() {
    let morning = Condition::daily_window(TimeOfDay::new(8, 0), TimeOfDay::new(12, 0), Berlin);
    let midday = Condition::daily_window(TimeOfDay::new(11, 0), TimeOfDay::new(14, 0), Berlin);
    let afternoon = Condition::daily_window(TimeOfDay::new(14, 0), TimeOfDay::new(16, 0), Berlin);
    let evening = Condition::daily_window(TimeOfDay::new(18, 0), TimeOfDay::new(20, 0), Berlin);

    let result = engine()
        .evaluate(
            &Condition::or([evening, morning, afternoon, midday]),
            &berlin(2026, 3, 16, 0, 0),
            &berlin(2026, 3, 17, 0, 0),
        )
        .unwrap();

    assert_eq!(
        result,
        vec![
            span(berlin(2026, 3, 16, 8, 0), berlin(2026, 3, 16, 16, 0)),
            span(berlin(2026, 3, 16, 18, 0), berlin(2026, 3, 16, 20, 0)),
        ]
    );
}

#[test]
fn or_of_identical_children_is_deduplicated() {
    let result = engine()
        .evaluate(
            &Condition::or([nine_to_five(), nine_to_five()]),
            &berlin(2026, 3, 16, 0, 0),
            &berlin(2026, 3, 17, 0, 0),
        )
        .unwrap();
    assert_eq!(result, vec![span(berlin(2026, 3, 16, 9, 0), berlin(2026, 3, 16, 17, 0))]);
}

#[test]
fn and_intersects_known_overlapping_spans() {
    let a = Condition::absolute_range(&berlin(2026, 3, 16, 9, 0), &berlin(2026, 3, 16, 13, 0), Berlin);
    let b = Condition::absolute_range(&berlin(2026, 3, 16, 11, 0), &berlin(2026, 3, 16, 15, 0), Berlin);
    let result = engine()
        .evaluate(&Condition::and([a, b]), &berlin(2026, 3, 16, 0, 0), &berlin(2026, 3, 17, 0, 0))
        .unwrap();
    assert_eq!(result, vec![span(berlin(2026, 3, 16, 11, 0), berlin(2026, 3, 16, 13, 0))]);
}

#[test]
fn and_of_disjoint_spans_is_empty() {
    let a = Condition::absolute_range(&berlin(2026, 3, 16, 9, 0), &berlin(2026, 3, 16, 11, 0), Berlin);
    let b = Condition::absolute_range(&berlin(2026, 3, 16, 11, 0), &berlin(2026, 3, 16, 15, 0), Berlin);
    let result = engine()
        .evaluate(&Condition::and([a, b]), &berlin(2026, 3, 16, 0, 0), &berlin(2026, 3, 17, 0, 0))
        .unwrap();
    assert!(result.is_empty());
}

// ── Scenarios ───────────────────────────────────────────────────────────────

#[test]
fn daily_window_over_three_days_yields_three_spans() {
    let result = engine()
        .evaluate(&nine_to_five(), &berlin(2026, 3, 16, 0, 0), &berlin(2026, 3, 19, 0, 0))
        .unwrap();

    assert_eq!(result.len(), 3);
    for (i, interval) in result.iter().enumerate() {
        let day = 16 + i as u32;
        assert_eq!(*interval, span(berlin(2026, 3, day, 9, 0), berlin(2026, 3, day, 17, 0)));
    }
}

#[test]
fn daily_window_is_clipped_to_a_mid_day_window() {
    let result = engine()
        .evaluate(&nine_to_five(), &berlin(2026, 3, 16, 12, 0), &berlin(2026, 3, 17, 10, 0))
        .unwrap();
    assert_eq!(
        result,
        vec![
            span(berlin(2026, 3, 16, 12, 0), berlin(2026, 3, 16, 17, 0)),
            span(berlin(2026, 3, 17, 9, 0), berlin(2026, 3, 17, 10, 0)),
        ]
    );
}

#[test]
fn weekday_range_friday_to_monday_forms_whole_blocks() {
    // 2026-03-16 is a Monday; the window runs ten days to Thursday the 26th.
    let condition = Condition::weekday_range(Weekday::Fri, Weekday::Mon, Berlin);
    let result = engine()
        .evaluate(&condition, &berlin(2026, 3, 16, 0, 0), &berlin(2026, 3, 26, 0, 0))
        .unwrap();

    assert_eq!(
        result,
        vec![
            span(berlin(2026, 3, 16, 0, 0), berlin(2026, 3, 17, 0, 0)),
            span(berlin(2026, 3, 20, 0, 0), berlin(2026, 3, 24, 0, 0)),
        ]
    );
    assert_eq!(result[1].duration(), Duration::days(4));
}

#[test]
fn holidays_are_excluded_from_opening_times() {
    let lower = berlin(2026, 4, 1, 0, 0);
    let upper = berlin(2026, 4, 4, 0, 0);
    let e = engine();

    let plain = e.evaluate(&nine_to_five(), &lower, &upper).unwrap();
    let without_holidays = e
        .evaluate(
            &Condition::and([nine_to_five(), Condition::not(Condition::holidays(REGION))]),
            &lower,
            &upper,
        )
        .unwrap();

    assert_eq!(plain.len(), 3);
    assert_eq!(without_holidays.len(), 2);
    assert!(without_holidays
        .iter()
        .all(|iv| !iv.contains(&berlin(2026, 4, 3, 12, 0))));
}

#[test]
fn holiday_leaf_covers_whole_local_days() {
    let result = engine()
        .evaluate(&Condition::holidays(REGION), &berlin(2026, 4, 1, 0, 0), &berlin(2026, 4, 10, 0, 0))
        .unwrap();
    assert_eq!(
        result,
        vec![
            span(berlin(2026, 4, 3, 0, 0), berlin(2026, 4, 4, 0, 0)),
            span(berlin(2026, 4, 6, 0, 0), berlin(2026, 4, 7, 0, 0)),
        ]
    );
}

#[test]
fn bounds_in_other_zones_give_the_same_instants() {
    let lower = Utc.with_ymd_and_hms(2026, 3, 15, 23, 0, 0).unwrap();
    let upper = Utc.with_ymd_and_hms(2026, 3, 16, 23, 0, 0).unwrap();
    let result = engine().evaluate(&nine_to_five(), &lower, &upper).unwrap();
    assert_eq!(result, vec![span(berlin(2026, 3, 16, 9, 0), berlin(2026, 3, 16, 17, 0))]);
}

#[test]
fn evaluation_is_idempotent() {
    let condition = Condition::or([
        Condition::and([nine_to_five(), Condition::weekday_range(Weekday::Mon, Weekday::Fri, Berlin)]),
        Condition::holidays(REGION),
    ]);
    let lower = berlin(2026, 3, 30, 0, 0);
    let upper = berlin(2026, 4, 12, 0, 0);
    let e = engine();
    assert_eq!(
        e.evaluate(&condition, &lower, &upper).unwrap(),
        e.evaluate(&condition, &lower, &upper).unwrap()
    );
}

#[test]
fn free_function_matches_engine() {
    let holidays = StaticHolidays::new();
    let lower = berlin(2026, 3, 16, 0, 0);
    let upper = berlin(2026, 3, 18, 0, 0);
    assert_eq!(
        evaluate(&nine_to_five(), &lower, &upper, &holidays).unwrap(),
        AvailabilityEngine::new(holidays.clone())
            .evaluate(&nine_to_five(), &lower, &upper)
            .unwrap()
    );
}

// ── Errors ──────────────────────────────────────────────────────────────────

#[test]
fn inverted_window_is_rejected() {
    let err = engine()
        .evaluate(&Condition::all(), &berlin(2026, 3, 17, 0, 0), &berlin(2026, 3, 16, 0, 0))
        .unwrap_err();
    assert!(matches!(err, AvailabilityError::InvalidWindow { .. }));
}

#[test]
fn overnight_daily_window_is_rejected_with_its_path() {
    let overnight = Condition::daily_window(TimeOfDay::new(22, 0), TimeOfDay::new(6, 0), Berlin);
    let condition = Condition::or([nine_to_five(), Condition::not(overnight)]);
    let err = engine()
        .evaluate(&condition, &berlin(2026, 3, 16, 0, 0), &berlin(2026, 3, 17, 0, 0))
        .unwrap_err();
    match err {
        AvailabilityError::InvalidCondition { path, .. } => assert_eq!(path, "root.children[1].child"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn out_of_range_times_are_rejected_instead_of_read_as_midnight() {
    let e = engine();
    let (lower, upper) = (berlin(2026, 3, 16, 0, 0), berlin(2026, 3, 17, 0, 0));

    let bad_minute = Condition::daily_window(TimeOfDay::new(9, 75), TimeOfDay::new(17, 0), Berlin);
    let err = e.evaluate(&bad_minute, &lower, &upper).unwrap_err();
    assert!(matches!(err, AvailabilityError::InvalidCondition { .. }));

    let bad_end = Condition::and([
        Condition::all(),
        Condition::daily_window(TimeOfDay::new(9, 0), TimeOfDay::new(24, 30), Berlin),
    ]);
    match e.evaluate(&bad_end, &lower, &upper).unwrap_err() {
        AvailabilityError::InvalidCondition { path, .. } => assert_eq!(path, "root.children[1]"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn window_until_midnight_is_accepted() {
    let evening = Condition::daily_window(TimeOfDay::new(18, 0), TimeOfDay::END_OF_DAY, Berlin);
    let result = engine()
        .evaluate(&evening, &berlin(2026, 3, 16, 0, 0), &berlin(2026, 3, 18, 0, 0))
        .unwrap();
    assert_eq!(
        result,
        vec![
            span(berlin(2026, 3, 16, 18, 0), berlin(2026, 3, 17, 0, 0)),
            span(berlin(2026, 3, 17, 18, 0), berlin(2026, 3, 18, 0, 0)),
        ]
    );
}

#[test]
fn inverted_absolute_range_is_rejected() {
    let condition = Condition::absolute_range(&berlin(2026, 3, 16, 12, 0), &berlin(2026, 3, 16, 9, 0), Berlin);
    let err = engine()
        .evaluate(&condition, &berlin(2026, 3, 16, 0, 0), &berlin(2026, 3, 17, 0, 0))
        .unwrap_err();
    assert!(matches!(err, AvailabilityError::InvalidCondition { .. }));
}

#[test]
fn unknown_holiday_region_propagates() {
    let err = engine()
        .evaluate(
            &Condition::holidays("Bundesland:Atlantis"),
            &berlin(2026, 3, 16, 0, 0),
            &berlin(2026, 3, 17, 0, 0),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        AvailabilityError::Holiday(HolidayError::UnsupportedRegion(_))
    ));
}

#[test]
fn holiday_window_outside_coverage_propagates() {
    let err = engine()
        .evaluate(
            &Condition::holidays(REGION),
            &berlin(2027, 3, 16, 0, 0),
            &berlin(2027, 3, 17, 0, 0),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        AvailabilityError::Holiday(HolidayError::OutOfCoverage { .. })
    ));
}

// ── Persisted trees ─────────────────────────────────────────────────────────

#[test]
fn persisted_tree_decodes_and_evaluates() {
    let json = r#"{
        "type": "and",
        "children": [
            {
                "type": "time_span_during_day",
                "start_time": {"hour": 9, "minute": 0},
                "end_time": {"hour": 17, "minute": 0},
                "timezone": "Europe/Berlin",
                "created_by": "admin"
            },
            {"type": "not", "child": {"type": "holidays", "region": "Bundesland:Berlin"}}
        ]
    }"#;
    let condition = Condition::from_json(json).unwrap();
    let result = engine()
        .evaluate(&condition, &berlin(2026, 4, 1, 0, 0), &berlin(2026, 4, 4, 0, 0))
        .unwrap();
    assert_eq!(result.len(), 2);
}

#[test]
fn unknown_condition_type_is_rejected() {
    let err = Condition::from_json(r#"{"type": "moon_phase"}"#).unwrap_err();
    assert!(matches!(err, AvailabilityError::Json(_)));
}

#[test]
fn missing_leaf_field_is_rejected() {
    let err = Condition::from_json(r#"{"type": "weekdays", "start_day": "Mon", "timezone": "Europe/Berlin"}"#)
        .unwrap_err();
    assert!(matches!(err, AvailabilityError::Json(_)));
}

#[test]
fn condition_roundtrips_through_json() {
    let condition = Condition::or([
        Condition::weekday_range(Weekday::Sat, Weekday::Sun, Berlin),
        Condition::absolute_range(&berlin(2026, 3, 16, 9, 0), &berlin(2026, 3, 16, 12, 0), Berlin),
    ]);
    let json = serde_json::to_string(&condition).unwrap();
    assert_eq!(Condition::from_json(&json).unwrap(), condition);
}
