use chrono::{Duration, NaiveDate, TimeZone, Utc};

use super::roster::{Airport, Duty, FlightSegment, Roster};

fn doha() -> Airport {
    Airport::new("DOH", "Asia/Qatar", 25.273, 51.608)
}

fn dubai() -> Airport {
    Airport::new("DXB", "Asia/Dubai", 25.253, 55.365)
}

fn segment(dep_h: u32, arr_h: u32) -> FlightSegment {
    FlightSegment::new(
        "QR1000",
        doha(),
        dubai(),
        Utc.with_ymd_and_hms(2026, 3, 10, dep_h, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2026, 3, 10, arr_h, 0, 0).unwrap(),
    )
    .unwrap()
}

fn duty_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
}

#[test]
fn test_segment_rejects_inverted_interval() {
    let result = FlightSegment::new(
        "QR1000",
        doha(),
        dubai(),
        Utc.with_ymd_and_hms(2026, 3, 10, 8, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2026, 3, 10, 8, 0, 0).unwrap(),
    );
    assert!(result.is_err(), "zero-length segment should be rejected");
}

#[test]
fn test_segment_block_hours() {
    let seg = segment(6, 8);
    assert_eq!(seg.block_hours, 2.0);
}

#[test]
fn test_duty_construction_happy_path() {
    let duty = Duty::new(
        "D1",
        duty_date(),
        Utc.with_ymd_and_hms(2026, 3, 10, 5, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2026, 3, 10, 10, 0, 0).unwrap(),
        vec![segment(6, 8)],
        "Asia/Qatar",
    )
    .unwrap();

    assert_eq!(duty.duty_hours(), 5.0);
    // FDP: last arrival 08:00 + 30 min - report 05:00 = 3.5 h
    assert_eq!(duty.fdp_hours(), 3.5);
    assert_eq!(duty.arrival_airport().code, "DXB");
}

#[test]
fn test_duty_shifts_report_back_when_after_first_departure() {
    // Report mistakenly dated after departure: constructor moves it back a day.
    let duty = Duty::new(
        "D1",
        duty_date(),
        Utc.with_ymd_and_hms(2026, 3, 10, 7, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2026, 3, 10, 10, 0, 0).unwrap(),
        vec![segment(6, 8)],
        "Asia/Qatar",
    )
    .unwrap();

    assert_eq!(
        duty.report_utc,
        Utc.with_ymd_and_hms(2026, 3, 9, 7, 0, 0).unwrap()
    );
    assert!(duty.report_utc < duty.segments[0].scheduled_departure_utc);
}

#[test]
fn test_duty_rejects_empty_segments() {
    let result = Duty::new(
        "D1",
        duty_date(),
        Utc.with_ymd_and_hms(2026, 3, 10, 5, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2026, 3, 10, 10, 0, 0).unwrap(),
        vec![],
        "Asia/Qatar",
    );
    assert!(result.is_err(), "0-segment duty must fail validation");
}

#[test]
fn test_duty_rejects_release_before_last_arrival() {
    let result = Duty::new(
        "D1",
        duty_date(),
        Utc.with_ymd_and_hms(2026, 3, 10, 5, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2026, 3, 10, 7, 0, 0).unwrap(),
        vec![segment(6, 8)],
        "Asia/Qatar",
    );
    assert!(result.is_err());
}

#[test]
fn test_roster_rejects_overlapping_duties() {
    let d1 = Duty::new(
        "D1",
        duty_date(),
        Utc.with_ymd_and_hms(2026, 3, 10, 5, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2026, 3, 10, 10, 0, 0).unwrap(),
        vec![segment(6, 8)],
        "Asia/Qatar",
    )
    .unwrap();
    let mut d2 = d1.clone();
    d2.duty_id = "D2".into();
    d2.report_utc = d1.release_utc - Duration::hours(1);
    d2.release_utc = d1.release_utc + Duration::hours(4);
    d2.segments[0].scheduled_departure_utc = d2.report_utc + Duration::hours(1);
    d2.segments[0].scheduled_arrival_utc = d2.report_utc + Duration::hours(3);

    let roster = Roster {
        roster_id: "R1".into(),
        pilot_id: "P1".into(),
        year: 2026,
        month: 3,
        duties: vec![d1, d2],
        home_base: "DOH".into(),
        home_base_tz: "Asia/Qatar".into(),
    };
    let result = roster.validate();
    assert!(result.is_err(), "overlapping duties must fail validation");
}

#[test]
fn test_roster_rejects_empty() {
    let roster = Roster {
        roster_id: "R1".into(),
        pilot_id: "P1".into(),
        year: 2026,
        month: 3,
        duties: vec![],
        home_base: "DOH".into(),
        home_base_tz: "Asia/Qatar".into(),
    };
    assert!(roster.validate().is_err());
}
