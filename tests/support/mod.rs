//! Shared fixtures for the integration tests: a small airport table and
//! builders for duties and rosters around the DOH home base.

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};

use aerofatigue::models::{Airport, Duty, FlightSegment, Roster};

pub fn doha() -> Airport {
    Airport::new("DOH", "Asia/Qatar", 25.273, 51.608)
}

pub fn dubai() -> Airport {
    Airport::new("DXB", "Asia/Dubai", 25.253, 55.365)
}

pub fn london() -> Airport {
    Airport::new("LHR", "Europe/London", 51.470, -0.454)
}

pub fn airport_table() -> HashMap<String, Airport> {
    [doha(), dubai(), london()]
        .into_iter()
        .map(|a| (a.code.clone(), a))
        .collect()
}

/// Single-segment duty with departure one hour after report and arrival 30
/// minutes before release.
pub fn duty(
    id: &str,
    dep: Airport,
    arr: Airport,
    report_utc: DateTime<Utc>,
    release_utc: DateTime<Utc>,
) -> Duty {
    let segment = FlightSegment::new(
        format!("QR{id}"),
        dep,
        arr,
        report_utc + Duration::hours(1),
        release_utc - Duration::minutes(30),
    )
    .expect("fixture segment must be valid");
    Duty::new(
        id,
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
        report_utc,
        release_utc,
        vec![segment],
        "Asia/Qatar",
    )
    .expect("fixture duty must be valid")
}

pub fn roster(duties: Vec<Duty>) -> Roster {
    Roster {
        roster_id: "RST-2026-03".into(),
        pilot_id: "P12345".into(),
        year: 2026,
        month: 3,
        duties,
        home_base: "DOH".into(),
        home_base_tz: "Asia/Qatar".into(),
    }
}
