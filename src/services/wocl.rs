//! Time and WOCL (Window of Circadian Low) utilities.
//!
//! All conversions go through `chrono-tz` IANA rules. Local windows such as
//! the 02:00-06:00 WOCL are constructed per calendar day in wall-clock time
//! and then intersected in UTC, which keeps DST transition days free of
//! phantom or duplicated hours.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

use crate::error::{Error, Result};
use crate::models::Duty;
use crate::params::CircadianParams;

/// Resolve an IANA timezone name, attributing failures to an airport code.
pub fn resolve_tz(name: &str, airport_code: &str) -> Result<Tz> {
    name.parse::<Tz>().map_err(|e| Error::UnresolvedTimezone {
        code: airport_code.to_string(),
        detail: e.to_string(),
    })
}

/// Convert a UTC instant to local wall-clock time.
pub fn to_local(t: DateTime<Utc>, tz: Tz) -> DateTime<Tz> {
    t.with_timezone(&tz)
}

/// Local hour of day as a fraction, e.g. 13.5 for 13:30.
pub fn local_hour_of_day(t: DateTime<Utc>, tz: Tz) -> f64 {
    let local = t.with_timezone(&tz);
    f64::from(local.hour()) + f64::from(local.minute()) / 60.0 + f64::from(local.second()) / 3600.0
}

/// UTC offset in effect at `t`, hours.
pub fn utc_offset_hours(t: DateTime<Utc>, tz: Tz) -> f64 {
    use chrono::Offset;
    let local = t.with_timezone(&tz);
    f64::from(local.offset().fix().local_minus_utc()) / 3600.0
}

/// Resolve a local wall-clock datetime to UTC.
///
/// Ambiguous times (DST fall-back) take the earlier instant; nonexistent
/// times (spring-forward gap) roll forward to the first valid wall-clock
/// minute after the gap.
pub fn local_to_utc(tz: Tz, date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    let mut naive = date.and_time(time);
    for _ in 0..4 {
        match tz.from_local_datetime(&naive) {
            LocalResult::Single(dt) => return dt.with_timezone(&Utc),
            LocalResult::Ambiguous(earliest, _) => return earliest.with_timezone(&Utc),
            LocalResult::None => naive += Duration::minutes(30),
        }
    }
    // Unreachable for real timezones (gaps are at most 2 h), but keep a
    // deterministic fallback.
    tz.from_utc_datetime(&naive).with_timezone(&Utc)
}

/// Overlap of two UTC intervals in hours (0 when disjoint).
pub fn interval_overlap_hours(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> f64 {
    let start = a_start.max(b_start);
    let end = a_end.min(b_end);
    if end <= start {
        0.0
    } else {
        (end - start).num_seconds() as f64 / 3600.0
    }
}

/// The WOCL window of a given local calendar day, as a UTC interval.
pub fn wocl_window_utc(
    tz: Tz,
    date: NaiveDate,
    circadian: &CircadianParams,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = NaiveTime::from_hms_opt(circadian.wocl_start_hour, 0, 0)
        .unwrap_or(NaiveTime::MIN);
    let end = NaiveTime::from_hms_opt(circadian.wocl_end_hour, 0, 0).unwrap_or(NaiveTime::MIN);
    (local_to_utc(tz, date, start), local_to_utc(tz, date, end))
}

/// Hours of `[start, end]` falling inside the 02:00-05:59 reference-time
/// window on any calendar day.
pub fn wocl_overlap_hours(
    start_utc: DateTime<Utc>,
    end_utc: DateTime<Utc>,
    tz: Tz,
    circadian: &CircadianParams,
) -> f64 {
    if end_utc <= start_utc {
        return 0.0;
    }

    // Walk one local day before the interval start to catch a window that
    // began on the previous calendar date.
    let mut day = to_local(start_utc, tz).date_naive() - Duration::days(1);
    let last_day = to_local(end_utc, tz).date_naive();
    let mut total = 0.0;
    while day <= last_day {
        let (w_start, w_end) = wocl_window_utc(tz, day, circadian);
        total += interval_overlap_hours(start_utc, end_utc, w_start, w_end);
        day += Duration::days(1);
    }
    total
}

/// True when the duty interval touches the home-base WOCL.
pub fn duty_crosses_wocl(duty: &Duty, home_tz: Tz, circadian: &CircadianParams) -> bool {
    wocl_overlap_hours(duty.report_utc, duty.release_utc, home_tz, circadian) > 0.0
}

/// True when the instant is inside the WOCL in the given timezone.
pub fn is_in_wocl(t: DateTime<Utc>, tz: Tz, circadian: &CircadianParams) -> bool {
    let hour = local_hour_of_day(t, tz);
    hour >= f64::from(circadian.wocl_start_hour) && hour < f64::from(circadian.wocl_end_hour)
}

/// Count complete local windows `[start_hour, end_hour)` fully contained in
/// `[start, end]`. Windows that cross midnight (e.g. 22:00-08:00 local
/// nights) are anchored on the evening date.
pub fn count_complete_local_windows(
    start_utc: DateTime<Utc>,
    end_utc: DateTime<Utc>,
    tz: Tz,
    window_start_hour: u32,
    window_end_hour: u32,
) -> u32 {
    if end_utc <= start_utc {
        return 0;
    }
    let crosses_midnight = window_end_hour <= window_start_hour;
    let start_time = NaiveTime::from_hms_opt(window_start_hour, 0, 0).unwrap_or(NaiveTime::MIN);
    let end_time = NaiveTime::from_hms_opt(window_end_hour, 0, 0).unwrap_or(NaiveTime::MIN);

    let mut day = to_local(start_utc, tz).date_naive() - Duration::days(1);
    let last_day = to_local(end_utc, tz).date_naive();
    let mut count = 0;
    while day <= last_day {
        let w_start = local_to_utc(tz, day, start_time);
        let end_day = if crosses_midnight { day + Duration::days(1) } else { day };
        let w_end = local_to_utc(tz, end_day, end_time);
        if w_start >= start_utc && w_end <= end_utc {
            count += 1;
        }
        day += Duration::days(1);
    }
    count
}
