use chrono::{Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

use super::*;
use crate::models::{Airport, Duty, FlightSegment};
use crate::params::ModelParameters;

fn doha_tz() -> Tz {
    "Asia/Qatar".parse().unwrap()
}

fn london_tz() -> Tz {
    "Europe/London".parse().unwrap()
}

fn airport(code: &str, tz: &str) -> Airport {
    Airport::new(code, tz, 0.0, 0.0)
}

fn duty_between(
    id: &str,
    report: chrono::DateTime<Utc>,
    release: chrono::DateTime<Utc>,
    dep: Airport,
    arr: Airport,
) -> Duty {
    let segment = FlightSegment::new(
        "QR900",
        dep,
        arr,
        report + Duration::hours(1),
        release - Duration::minutes(30),
    )
    .unwrap();
    Duty::new(
        id,
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
        report,
        release,
        vec![segment],
        "Asia/Qatar",
    )
    .unwrap()
}

#[test]
fn test_away_rest_below_previous_duty_length_is_illegal() {
    let params = ModelParameters::default_preset();
    // 12-hour duty ending at LHR, next duty from LHR 11 hours later.
    let d1 = duty_between(
        "D1",
        Utc.with_ymd_and_hms(2026, 3, 10, 6, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2026, 3, 10, 18, 0, 0).unwrap(),
        airport("DOH", "Asia/Qatar"),
        airport("LHR", "Europe/London"),
    );
    let d2 = duty_between(
        "D2",
        Utc.with_ymd_and_hms(2026, 3, 11, 5, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2026, 3, 11, 12, 0, 0).unwrap(),
        airport("LHR", "Europe/London"),
        airport("DOH", "Asia/Qatar"),
    );

    let rest = evaluate_rest_period(&params, &d1, &d2, "DOH", doha_tz(), london_tz());
    assert!(!rest.is_home_base);
    assert_eq!(rest.required_rest_hours, 12.0);
    assert!(!rest.is_compliant);
    assert_eq!(
        rest.violations[0],
        "Rest 11.0h < minimum 12.0h (previous duty 12.0h, away from base)"
    );
}

#[test]
fn test_away_rest_meeting_floor_is_compliant() {
    let params = ModelParameters::default_preset();
    // 8-hour duty away, 11 hours of rest: floor is 10 h away from base and
    // the sleep opportunity (11 - 3 = 8 h) is exactly sufficient.
    let d1 = duty_between(
        "D1",
        Utc.with_ymd_and_hms(2026, 3, 10, 6, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2026, 3, 10, 14, 0, 0).unwrap(),
        airport("DOH", "Asia/Qatar"),
        airport("LHR", "Europe/London"),
    );
    let d2 = duty_between(
        "D2",
        Utc.with_ymd_and_hms(2026, 3, 11, 1, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2026, 3, 11, 9, 0, 0).unwrap(),
        airport("LHR", "Europe/London"),
        airport("DOH", "Asia/Qatar"),
    );
    let rest = evaluate_rest_period(&params, &d1, &d2, "DOH", doha_tz(), london_tz());
    assert_eq!(rest.required_rest_hours, 10.0);
    assert!(rest.is_compliant, "violations: {:?}", rest.violations);
}

#[test]
fn test_away_rest_sleep_opportunity_violation() {
    let params = ModelParameters::default_preset();
    // 9-hour duty away, 10.5 h rest: floor met, but 10.5 - 3 < 8.
    let d1 = duty_between(
        "D1",
        Utc.with_ymd_and_hms(2026, 3, 10, 6, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2026, 3, 10, 15, 0, 0).unwrap(),
        airport("DOH", "Asia/Qatar"),
        airport("LHR", "Europe/London"),
    );
    let d2 = duty_between(
        "D2",
        Utc.with_ymd_and_hms(2026, 3, 11, 1, 30, 0).unwrap(),
        Utc.with_ymd_and_hms(2026, 3, 11, 10, 0, 0).unwrap(),
        airport("LHR", "Europe/London"),
        airport("DOH", "Asia/Qatar"),
    );
    let rest = evaluate_rest_period(&params, &d1, &d2, "DOH", doha_tz(), london_tz());
    assert!(!rest.is_compliant);
    assert!(rest.violations[0].contains("Sleep opportunity"));
}

#[test]
fn test_home_disruptive_rest_is_minimum_but_compliant() {
    let params = ModelParameters::default_preset();
    // Land at home 06:00 local, report again 23:00 local: 17 h of rest,
    // legal, but the circadian day is inverted.
    let d1 = duty_between(
        "D1",
        Utc.with_ymd_and_hms(2026, 3, 9, 19, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2026, 3, 10, 3, 0, 0).unwrap(),
        airport("DXB", "Asia/Dubai"),
        airport("DOH", "Asia/Qatar"),
    );
    let d2 = duty_between(
        "D2",
        Utc.with_ymd_and_hms(2026, 3, 10, 20, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2026, 3, 11, 4, 0, 0).unwrap(),
        airport("DOH", "Asia/Qatar"),
        airport("DXB", "Asia/Dubai"),
    );
    let rest = evaluate_rest_period(&params, &d1, &d2, "DOH", doha_tz(), doha_tz());
    assert!(rest.is_home_base);
    assert_eq!(rest.duration_hours, 17.0);
    assert!(rest.is_compliant, "violations: {:?}", rest.violations);
    assert_eq!(rest.rest_type, RestType::Minimum);
    assert_eq!(rest.local_nights_covered, 0);
    assert_eq!(
        rest.disruption,
        RestDisruption::LateReportAfterEarlyArrival
    );
}

#[test]
fn test_long_home_rest_without_local_night_violates() {
    let params = ModelParameters::default_preset();
    // 26.5-hour home rest starting 23:30 local: neither surrounding
    // 22:00-08:00 night fits inside it.
    let d1 = duty_between(
        "D1",
        Utc.with_ymd_and_hms(2026, 3, 9, 12, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2026, 3, 9, 20, 30, 0).unwrap(),
        airport("DXB", "Asia/Dubai"),
        airport("DOH", "Asia/Qatar"),
    );
    let d2 = duty_between(
        "D2",
        Utc.with_ymd_and_hms(2026, 3, 10, 23, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2026, 3, 11, 7, 0, 0).unwrap(),
        airport("DOH", "Asia/Qatar"),
        airport("DXB", "Asia/Dubai"),
    );
    let rest = evaluate_rest_period(&params, &d1, &d2, "DOH", doha_tz(), doha_tz());
    assert!(rest.duration_hours > 24.0);
    assert_eq!(rest.local_nights_covered, 0);
    assert!(!rest.is_compliant);
    assert!(rest.violations[0].contains("local night"));
}

#[test]
fn test_recurrent_rest_classification() {
    let params = ModelParameters::default_preset();
    // 40 hours off at home spanning two 00:00-05:00 periods.
    let d1 = duty_between(
        "D1",
        Utc.with_ymd_and_hms(2026, 3, 9, 4, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2026, 3, 9, 12, 0, 0).unwrap(),
        airport("DXB", "Asia/Dubai"),
        airport("DOH", "Asia/Qatar"),
    );
    let d2 = duty_between(
        "D2",
        Utc.with_ymd_and_hms(2026, 3, 11, 4, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2026, 3, 11, 12, 0, 0).unwrap(),
        airport("DOH", "Asia/Qatar"),
        airport("DXB", "Asia/Dubai"),
    );
    let rest = evaluate_rest_period(&params, &d1, &d2, "DOH", doha_tz(), doha_tz());
    assert_eq!(rest.rest_type, RestType::Recurrent);
    assert!(qualifies_as_recurrent(&params, &rest, doha_tz()));
}

#[test]
fn test_recurrent_rest_rule_flags_long_stretches() {
    let params = ModelParameters::default_preset();
    let analysis_start = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();

    // Build eight consecutive short rests covering well over 168 h.
    let mut rests = Vec::new();
    let mut t = analysis_start;
    for i in 0..8 {
        let d1 = duty_between(
            &format!("A{i}"),
            t,
            t + Duration::hours(10),
            airport("DOH", "Asia/Qatar"),
            airport("DOH", "Asia/Qatar"),
        );
        let d2 = duty_between(
            &format!("B{i}"),
            t + Duration::hours(24),
            t + Duration::hours(34),
            airport("DOH", "Asia/Qatar"),
            airport("DOH", "Asia/Qatar"),
        );
        rests.push(evaluate_rest_period(&params, &d1, &d2, "DOH", doha_tz(), doha_tz()));
        t += Duration::hours(24);
    }

    apply_recurrent_rest_rule(&params, &mut rests, analysis_start, doha_tz());
    let flagged: Vec<_> = rests
        .iter()
        .filter(|r| r.violations.iter().any(|v| v.contains("recurrent")))
        .collect();
    assert!(
        !flagged.is_empty(),
        "a week without recurrent rest must be flagged"
    );
}

#[test]
fn test_fdp_table_lookup() {
    // Morning report, one sector: the standard 13 h limit.
    let d = duty_between(
        "D1",
        Utc.with_ymd_and_hms(2026, 3, 10, 5, 0, 0).unwrap(), // 08:00 local
        Utc.with_ymd_and_hms(2026, 3, 10, 13, 0, 0).unwrap(),
        airport("DOH", "Asia/Qatar"),
        airport("DXB", "Asia/Dubai"),
    );
    let fdp = assess_fdp(&d, doha_tz());
    assert_eq!(fdp.max_fdp_hours, 13.0);
    assert_eq!(fdp.extended_fdp_hours, 15.0);
    assert!(!fdp.used_discretion);
    // Actual FDP: report 05:00 to 12:30 arrival + 30 min = 8.0 h.
    assert_eq!(fdp.actual_fdp_hours, 8.0);
}

#[test]
fn test_fdp_night_report_has_reduced_limit() {
    // 02:00 local report.
    let d = duty_between(
        "D1",
        Utc.with_ymd_and_hms(2026, 3, 9, 23, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2026, 3, 10, 10, 0, 0).unwrap(),
        airport("DOH", "Asia/Qatar"),
        airport("DXB", "Asia/Dubai"),
    );
    let fdp = assess_fdp(&d, doha_tz());
    assert_eq!(fdp.max_fdp_hours, 10.0);
    // Actual FDP 11.0 h exceeds the planned limit but not discretion.
    assert!(fdp.used_discretion);
    assert!(!fdp.exceeds_discretion);
}

#[test]
fn test_disruptive_flags() {
    let params = ModelParameters::default_preset();
    // Report 05:00 local, release 07:00 local next morning: early start,
    // WOCL encroachment and late finish all present.
    let d = duty_between(
        "D1",
        Utc.with_ymd_and_hms(2026, 3, 10, 2, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2026, 3, 11, 4, 0, 0).unwrap(),
        airport("DOH", "Asia/Qatar"),
        airport("DXB", "Asia/Dubai"),
    );
    let flags = disruptive_flags(&params, &d, doha_tz());
    assert!(flags.early_start);
    assert!(flags.wocl_encroachment);
    assert!(flags.late_finish);
    assert!(flags.is_disruptive());
}
