//! Per-duty performance integration.
//!
//! Steps from report to release at a fixed stride, evaluating the three
//! processes at every instant, tagging flight phases from the segment
//! schedule and collecting pinch events and summary metrics into a
//! [`DutyTimeline`].

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;

use crate::api::CancelToken;
use crate::error::{Error, Result};
use crate::models::{
    Duty, DutyTimeline, FlightPhase, FlightSegment, PerformancePoint, PinchEvent, PinchSeverity,
    SleepBlock,
};
use crate::params::ModelParameters;
use crate::services::{compliance, three_process, wocl};

/// Pinch thresholds: elevated sleep pressure coinciding with the circadian
/// trough during a safety-critical phase.
const PINCH_S_THRESHOLD: f64 = 0.7;
const PINCH_C_THRESHOLD: f64 = 0.4;

/// State carried into one duty simulation.
#[derive(Debug, Clone)]
pub struct DutySimState {
    /// Cumulative circadian phase shift at report, hours.
    pub phase_shift_hours: f64,
    /// Homeostatic pressure to assume when no prior sleep block exists.
    pub fallback_s_at_wake: f64,
    /// Sleep-debt ledger value at report, hours.
    pub cumulative_sleep_debt: f64,
    /// Sleep blocks generated for the gap preceding this duty, embedded
    /// into the resulting timeline for reporting.
    pub blocks_before: Vec<SleepBlock>,
}

/// Simulate a single duty.
///
/// `sleep_history` must be ordered by start time; the most recent block
/// ending at or before report anchors wakefulness. The pilot's hours awake
/// before report feed homeostatic pressure from the first step.
pub fn simulate_duty(
    params: &ModelParameters,
    duty: &Duty,
    sleep_history: &[SleepBlock],
    state: &DutySimState,
    home_tz: Tz,
    stride: Duration,
    cancel: &CancelToken,
) -> Result<DutyTimeline> {
    let last_sleep = sleep_history
        .iter()
        .rev()
        .find(|block| block.end_utc <= duty.report_utc);

    let (wake_time, s_at_wake) = match last_sleep {
        Some(block) => (
            block.end_utc,
            three_process::s_at_wake_from_sleep(params, block.effective_hours),
        ),
        None => (
            duty.report_utc - Duration::hours(8),
            state.fallback_s_at_wake,
        ),
    };
    let pre_duty_awake_hours =
        ((duty.report_utc - wake_time).num_seconds() as f64 / 3600.0).max(0.0);
    let c_at_wake = three_process::process_c(params, wake_time, home_tz, state.phase_shift_hours);

    let mut timeline = Vec::new();
    let mut t = duty.report_utc;
    while t <= duty.release_utc {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled {
                completed_duties: 0,
                partial: None,
            });
        }

        let hours_awake = (t - wake_time).num_seconds() as f64 / 3600.0;
        let minutes_since_wake = (t - wake_time).num_seconds() as f64 / 60.0;
        let hours_on_duty = (t - duty.report_utc).num_seconds() as f64 / 3600.0;

        let s = three_process::process_s_awake(params, s_at_wake, hours_awake);
        let c = three_process::process_c(params, t, home_tz, state.phase_shift_hours);
        let w = three_process::sleep_inertia(params, minutes_since_wake, c_at_wake);
        let performance = three_process::integrate_performance(params, s, c, w, hours_on_duty);

        if !performance.is_finite() || !s.is_finite() || !c.is_finite() {
            return Err(Error::NumericInstability {
                context: format!("duty {}", duty.duty_id),
                detail: format!("non-finite state at {t}: s={s}, c={c}, performance={performance}"),
            });
        }

        let phase = flight_phase(&duty.segments, t);
        timeline.push(PerformancePoint {
            t_utc: t,
            t_local: wocl::to_local(t, home_tz).fixed_offset(),
            s,
            c,
            w,
            performance,
            cumulative_sleep_debt_hours: state.cumulative_sleep_debt,
            flight_phase: phase,
            is_wocl: wocl::is_in_wocl(t, home_tz, &params.circadian),
            is_critical: performance < params.risk.high_min,
        });

        t += stride;
    }

    let pinch_events = detect_pinch_events(&timeline);
    let min_performance = timeline
        .iter()
        .map(|p| p.performance)
        .fold(f64::INFINITY, f64::min);
    let avg_performance =
        timeline.iter().map(|p| p.performance).sum::<f64>() / timeline.len() as f64;
    let landing_performance = timeline
        .iter()
        .rev()
        .find(|p| p.flight_phase == FlightPhase::Landing)
        .map(|p| p.performance);
    let landing_risk = landing_performance.map(|perf| params.risk.classify(perf));
    let s_at_release = timeline.last().map(|p| p.s).unwrap_or(s_at_wake);

    let window_start = duty.report_utc - Duration::hours(48);
    let prior_effective_sleep_hours = sleep_history
        .iter()
        .filter(|b| b.end_utc <= duty.report_utc && b.end_utc >= window_start)
        .map(|b| b.effective_hours)
        .sum();

    Ok(DutyTimeline {
        wocl_encroachment_hours: wocl::wocl_overlap_hours(
            duty.report_utc,
            duty.release_utc,
            home_tz,
            &params.circadian,
        ),
        disruptive: compliance::disruptive_flags(params, duty, home_tz),
        fdp: compliance::assess_fdp(duty, home_tz),
        duty: duty.clone(),
        timeline,
        min_performance,
        avg_performance,
        landing_performance,
        landing_risk,
        pinch_events,
        cumulative_sleep_debt_at_release: state.cumulative_sleep_debt,
        sleep_blocks_before: state.blocks_before.clone(),
        prior_effective_sleep_hours,
        pre_duty_awake_hours,
        s_at_release,
    })
}

/// Map an instant onto the flight phase implied by the segment schedule.
///
/// Within a segment, arrival-anchored windows (landing, approach, descent)
/// take precedence near touch-down; departure-anchored windows (taxi-out,
/// takeoff, climb) near push-back; cruise covers the remainder. Instants
/// outside any segment envelope count as preflight preparation or
/// turnaround time.
pub fn flight_phase(segments: &[FlightSegment], t: DateTime<Utc>) -> FlightPhase {
    for segment in segments {
        let dep = segment.scheduled_departure_utc;
        let arr = segment.scheduled_arrival_utc;
        if t < dep - Duration::minutes(10) {
            return FlightPhase::Preflight;
        }
        if t < dep {
            return FlightPhase::TaxiOut;
        }
        if t <= arr {
            if t >= arr - Duration::minutes(3) {
                return FlightPhase::Landing;
            }
            if t < dep + Duration::minutes(5) {
                return FlightPhase::Takeoff;
            }
            if t < dep + Duration::minutes(20) {
                return FlightPhase::Climb;
            }
            if t >= arr - Duration::minutes(10) {
                return FlightPhase::Approach;
            }
            if t >= arr - Duration::minutes(20) {
                return FlightPhase::Descent;
            }
            return FlightPhase::Cruise;
        }
        if t <= arr + Duration::minutes(10) {
            return FlightPhase::TaxiIn;
        }
    }
    FlightPhase::Preflight
}

/// Keep the worst pinch point per safety-critical phase.
fn detect_pinch_events(timeline: &[PerformancePoint]) -> Vec<PinchEvent> {
    let mut worst: Vec<(FlightPhase, &PerformancePoint)> = Vec::new();
    for point in timeline {
        if !point.flight_phase.is_safety_critical() {
            continue;
        }
        if point.s <= PINCH_S_THRESHOLD || point.c >= PINCH_C_THRESHOLD {
            continue;
        }
        match worst.iter_mut().find(|(phase, _)| *phase == point.flight_phase) {
            Some(entry) => {
                if point.performance < entry.1.performance {
                    entry.1 = point;
                }
            }
            None => worst.push((point.flight_phase, point)),
        }
    }

    let mut events: Vec<PinchEvent> = worst
        .into_iter()
        .map(|(phase, point)| PinchEvent {
            time_utc: point.t_utc,
            time_local: point.t_local,
            flight_phase: phase,
            performance: point.performance,
            s: point.s,
            c: point.c,
            severity: pinch_severity(point.performance),
        })
        .collect();
    events.sort_by_key(|e| e.time_utc);
    events
}

fn pinch_severity(performance: f64) -> PinchSeverity {
    if performance < 45.0 {
        PinchSeverity::Critical
    } else if performance < 55.0 {
        PinchSeverity::High
    } else {
        PinchSeverity::Moderate
    }
}
