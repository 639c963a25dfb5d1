//! EASA FTL compliance checks.
//!
//! Rest-period verification per ORO.FTL.235 (minimum rest, local night at
//! home base, sleep opportunity away, recurrent rest over rolling 168 h
//! windows), FDP limits per ORO.FTL.205 Table 1, and the disruptive-duty
//! flags of GM1 ORO.FTL.235. All findings are returned as data; nothing
//! here aborts an analysis.

use chrono_tz::Tz;

use crate::models::{
    DisruptiveFlags, Duty, FdpAssessment, RestDisruption, RestPeriod, RestType,
};
use crate::params::ModelParameters;
use crate::services::wocl;

/// Maximum planned FDP for standard 2-pilot operations, by report-time
/// local hour and number of sectors (ORO.FTL.205 Table 1).
fn max_fdp_hours(report_hour: u32, sectors: usize) -> f64 {
    let sectors = sectors.clamp(1, 9);
    // Columns: 1-2, 3, 4, 5, 6, 7, 8, 9 sectors. Sector 1 and 2 share a
    // column in the regulation.
    let row: [f64; 8] = match report_hour {
        6..=8 => [13.0, 12.5, 12.0, 11.5, 11.0, 10.5, 10.0, 9.5],
        9 => [13.0, 12.5, 12.0, 11.5, 11.0, 10.5, 10.0, 10.0],
        10 => [13.0, 13.0, 12.5, 12.0, 11.5, 11.0, 10.5, 10.0],
        11..=12 => [13.0, 13.0, 13.0, 12.5, 12.0, 11.5, 11.0, 10.5],
        13 => [12.5, 13.0, 13.0, 12.5, 12.0, 11.5, 11.0, 10.5],
        14 => [12.0, 12.5, 12.5, 12.5, 12.0, 11.5, 11.0, 10.5],
        15 => [11.5, 12.0, 12.0, 12.0, 11.5, 11.0, 10.5, 10.0],
        16 => [11.0, 11.5, 11.5, 11.5, 11.0, 10.5, 10.0, 10.0],
        17 => [10.5, 11.0, 11.0, 11.0, 10.5, 10.0, 10.0, 9.5],
        18..=23 => [10.0, 10.5, 10.5, 10.5, 10.0, 10.0, 9.5, 9.5],
        0..=3 => [10.0, 10.0, 10.0, 10.0, 10.0, 9.5, 9.5, 9.5],
        4 => [11.0, 10.5, 10.0, 10.0, 10.0, 9.5, 9.5, 9.5],
        5 => [12.0, 11.5, 11.0, 10.5, 10.0, 10.0, 9.5, 9.5],
        _ => [13.0, 12.5, 12.0, 11.5, 11.0, 10.5, 10.0, 9.5],
    };
    let column = match sectors {
        1 | 2 => 0,
        n => n - 2,
    };
    row[column]
}

/// FDP legality of one duty for a standard 2-pilot crew.
pub fn assess_fdp(duty: &Duty, home_tz: Tz) -> FdpAssessment {
    use chrono::Timelike;
    let report_hour = wocl::to_local(duty.report_utc, home_tz).hour();
    let max_fdp = max_fdp_hours(report_hour, duty.sector_count());
    let extended = max_fdp + 2.0;
    let actual = duty.fdp_hours();
    FdpAssessment {
        actual_fdp_hours: actual,
        max_fdp_hours: max_fdp,
        extended_fdp_hours: extended,
        used_discretion: actual > max_fdp,
        exceeds_discretion: actual > extended,
    }
}

/// Disruptive-duty flags per GM1 ORO.FTL.235.
pub fn disruptive_flags(params: &ModelParameters, duty: &Duty, home_tz: Tz) -> DisruptiveFlags {
    let report_hour = wocl::local_hour_of_day(duty.report_utc, home_tz);
    let release_hour = wocl::local_hour_of_day(duty.release_utc, home_tz);
    DisruptiveFlags {
        wocl_encroachment: wocl::duty_crosses_wocl(duty, home_tz, &params.circadian),
        early_start: report_hour < 6.0,
        late_finish: (2.0..8.0).contains(&release_hour),
    }
}

/// Verify the rest period between two consecutive duties. `location_tz`
/// is the already-resolved timezone of the previous duty's arrival
/// airport, where the pilot spends the rest.
pub fn evaluate_rest_period(
    params: &ModelParameters,
    previous: &Duty,
    next: &Duty,
    home_base: &str,
    home_tz: Tz,
    location_tz: Tz,
) -> RestPeriod {
    let rules = &params.rest;
    let location = previous.arrival_airport().clone();
    let is_home_base = location.code == home_base;

    let start = previous.release_utc;
    let end = next.report_utc;
    let duration_hours = (end - start).num_seconds() as f64 / 3600.0;

    let mut violations = Vec::new();

    // Minimum rest: at least as long as the preceding duty, floored by the
    // home/away minima.
    let floor = if is_home_base {
        rules.minimum_rest_home_hours
    } else {
        rules.minimum_rest_away_hours
    };
    let required = previous.duty_hours().max(floor);
    if duration_hours < required {
        violations.push(format!(
            "Rest {:.1}h < minimum {:.1}h (previous duty {:.1}h, {})",
            duration_hours,
            required,
            previous.duty_hours(),
            if is_home_base {
                "at home base"
            } else {
                "away from base"
            }
        ));
    }

    // At home a rest long enough to contain a calendar night must protect
    // a full 22:00-08:00 local night. Shorter legal-but-disruptive rests
    // are reported through the disruption classification instead.
    let local_nights = wocl::count_complete_local_windows(
        start,
        end,
        home_tz,
        rules.local_night_start_hour,
        rules.local_night_end_hour,
    );
    if is_home_base && duration_hours >= 24.0 && local_nights == 0 {
        violations.push(format!(
            "Rest at home base contains no full {:02}:00-{:02}:00 local night",
            rules.local_night_start_hour, rules.local_night_end_hour
        ));
    }

    // Away the rest must leave an eight-hour sleep opportunity after
    // transit and meal overhead.
    if !is_home_base {
        let opportunity = duration_hours - rules.sleep_opportunity_overhead_hours;
        if opportunity < rules.sleep_opportunity_min_hours {
            violations.push(format!(
                "Sleep opportunity {:.1}h < {:.1}h after {:.1}h overhead",
                opportunity.max(0.0),
                rules.sleep_opportunity_min_hours,
                rules.sleep_opportunity_overhead_hours
            ));
        }
    }

    let rest_type = classify_rest(params, duration_hours, start, end, home_tz, &violations);
    let disruption = classify_disruption(
        previous,
        next,
        duration_hours,
        location_tz,
        is_home_base,
        home_tz,
    );

    RestPeriod {
        previous_duty_id: previous.duty_id.clone(),
        next_duty_id: next.duty_id.clone(),
        start_utc: start,
        end_utc: end,
        duration_hours,
        location_code: location.code,
        location_tz: location_tz.name().to_string(),
        is_home_base,
        rest_type,
        is_compliant: violations.is_empty(),
        required_rest_hours: required,
        violations,
        local_nights_covered: local_nights,
        disruption,
    }
}

/// True when a rest satisfies the recurrent-rest shape: long enough and
/// spanning the required number of 00:00-05:00 home-local periods.
pub fn qualifies_as_recurrent(
    params: &ModelParameters,
    rest: &RestPeriod,
    home_tz: Tz,
) -> bool {
    let rules = &params.rest;
    if rest.duration_hours < rules.recurrent_rest_min_hours {
        return false;
    }
    let night_periods =
        wocl::count_complete_local_windows(rest.start_utc, rest.end_utc, home_tz, 0, 5);
    night_periods >= rules.recurrent_night_periods
}

/// Scan the chronological rest periods for stretches longer than the
/// rolling window without a recurrent rest, appending a violation to the
/// rest period at which each breach is detected.
pub fn apply_recurrent_rest_rule(
    params: &ModelParameters,
    rest_periods: &mut [RestPeriod],
    analysis_start: chrono::DateTime<chrono::Utc>,
    home_tz: Tz,
) {
    let window = params.rest.recurrent_window_hours;
    let mut last_recurrent_end = analysis_start;
    for rest in rest_periods.iter_mut() {
        if qualifies_as_recurrent(params, rest, home_tz) {
            rest.rest_type = RestType::Recurrent;
            last_recurrent_end = rest.end_utc;
            continue;
        }
        let since = (rest.end_utc - last_recurrent_end).num_seconds() as f64 / 3600.0;
        if since > window {
            rest.violations.push(format!(
                "No recurrent rest (>= {:.0}h spanning {} local night periods) within the last {:.0}h",
                params.rest.recurrent_rest_min_hours,
                params.rest.recurrent_night_periods,
                window
            ));
            rest.is_compliant = false;
            // One finding per breached stretch.
            last_recurrent_end = rest.end_utc;
        }
    }
}

fn classify_rest(
    params: &ModelParameters,
    duration_hours: f64,
    start: chrono::DateTime<chrono::Utc>,
    end: chrono::DateTime<chrono::Utc>,
    home_tz: Tz,
    violations: &[String],
) -> RestType {
    let rules = &params.rest;
    if !violations.is_empty() && duration_hours < rules.minimum_rest_home_hours {
        return RestType::Illegal;
    }
    let night_periods = wocl::count_complete_local_windows(start, end, home_tz, 0, 5);
    if duration_hours >= 72.0 {
        RestType::Extended
    } else if duration_hours >= rules.recurrent_rest_min_hours
        && night_periods >= rules.recurrent_night_periods
    {
        RestType::Recurrent
    } else if duration_hours >= 24.0 {
        RestType::Adequate
    } else {
        RestType::Minimum
    }
}

fn classify_disruption(
    previous: &Duty,
    next: &Duty,
    duration_hours: f64,
    location_tz: Tz,
    is_home_base: bool,
    home_tz: Tz,
) -> RestDisruption {
    let arrival_hour = wocl::local_hour_of_day(previous.release_utc, location_tz);
    let departure_hour = wocl::local_hour_of_day(next.report_utc, location_tz);

    // Land late, report early: the classic compressed night.
    if arrival_hour >= 23.0 && departure_hour <= 6.0 {
        return RestDisruption::EarlyReportAfterLateArrival;
    }
    // Land at dawn, report at night: legal rest, inverted body clock.
    if arrival_hour <= 6.0 && departure_hour >= 23.0 {
        return RestDisruption::LateReportAfterEarlyArrival;
    }
    if !is_home_base {
        let shift = (wocl::utc_offset_hours(previous.release_utc, location_tz)
            - wocl::utc_offset_hours(previous.release_utc, home_tz))
        .abs();
        if shift >= 4.0 {
            return RestDisruption::TimezoneShift;
        }
    }
    if duration_hours < 18.0 {
        return RestDisruption::QuickTurn;
    }
    RestDisruption::None
}

#[cfg(test)]
#[path = "compliance_tests.rs"]
mod compliance_tests;
