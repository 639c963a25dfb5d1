//! Closed-form evaluation of the three biomathematical processes.
//!
//! Process S (homeostatic sleep pressure), Process C (circadian alertness)
//! and Process W (sleep inertia) are evaluated as functions of the current
//! instant, a last-wake anchor and a cumulative circadian phase shift, then
//! combined into a 20-100 performance score.
//!
//! References: Borbély & Achermann (1999), Jewett & Kronauer (1999),
//! Åkerstedt & Folkard (1997), Tassi & Muzet (2000).

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::params::ModelParameters;
use crate::services::wocl;

/// Homeostatic pressure after `hours_awake` of wakefulness starting from
/// `s_at_wake`. Saturating exponential build-up towards `s_max`.
pub fn process_s_awake(params: &ModelParameters, s_at_wake: f64, hours_awake: f64) -> f64 {
    let h = &params.homeostatic;
    if hours_awake <= 0.0 {
        return s_at_wake.clamp(h.s_min, h.s_max);
    }
    let s = h.s_max - (h.s_max - s_at_wake) * (-hours_awake / h.tau_wake_hours).exp();
    s.clamp(h.s_min, h.s_max)
}

/// Homeostatic pressure after `hours_asleep` of sleep starting from
/// `s_prev`. Exponential decay towards `s_min`.
pub fn process_s_asleep(params: &ModelParameters, s_prev: f64, hours_asleep: f64) -> f64 {
    let h = &params.homeostatic;
    if hours_asleep <= 0.0 {
        return s_prev.clamp(h.s_min, h.s_max);
    }
    let s = h.s_min + (s_prev - h.s_min) * (-hours_asleep / h.tau_sleep_hours).exp();
    s.clamp(h.s_min, h.s_max)
}

/// Pressure remaining at wake-up, derived from the restorative value of the
/// most recent sleep block. A fully effective 8 h sleep leaves ~0.1; a 4 h
/// sleep leaves ~0.4.
pub fn s_at_wake_from_sleep(params: &ModelParameters, effective_hours: f64) -> f64 {
    let need = params.homeostatic.baseline_sleep_need_hours;
    (0.7 - 0.6 * (effective_hours / need)).clamp(0.1, 0.9)
}

/// Circadian alertness at `t`, -1..+1, evaluated against the reference
/// timezone with the cumulative phase shift applied.
pub fn process_c(params: &ModelParameters, t: DateTime<Utc>, reference_tz: Tz, phase_shift_hours: f64) -> f64 {
    let c = &params.circadian;
    let local_hour = wocl::local_hour_of_day(t, reference_tz);
    let angle = 2.0
        * std::f64::consts::PI
        * (local_hour - c.effective_acrophase() + phase_shift_hours)
        / c.period_hours;
    c.effective_amplitude() * angle.cos()
}

/// Sleep inertia penalty within the post-wake window. Linear decay over the
/// inertia duration, scaled up when the wake-up fell into the circadian
/// trough.
pub fn sleep_inertia(params: &ModelParameters, minutes_since_wake: f64, c_at_wake: f64) -> f64 {
    let i = &params.inertia;
    if minutes_since_wake < 0.0 || minutes_since_wake > i.duration_minutes {
        return 0.0;
    }
    let decay = 1.0 - minutes_since_wake / i.duration_minutes;
    // c_at_wake = +amplitude at peak, -amplitude at trough; map to a
    // multiplier of 1.0 at peak up to 1.0 + trough_scaling at trough.
    let amplitude = params.circadian.effective_amplitude().max(f64::EPSILON);
    let trough_position = ((amplitude - c_at_wake) / (2.0 * amplitude)).clamp(0.0, 1.0);
    let circadian_factor = 1.0 + i.trough_scaling * trough_position;
    i.max_magnitude * decay * circadian_factor
}

/// Combine the three processes and the time-on-task decrement into a
/// performance score on the 20-100 scale.
pub fn integrate_performance(
    params: &ModelParameters,
    s: f64,
    c: f64,
    w: f64,
    hours_on_duty: f64,
) -> f64 {
    let i = &params.integration;
    let s_alertness = 1.0 - s;
    let c_alertness = (c + 1.0) / 2.0;
    let mut base = i.weight_homeostatic * s_alertness + i.weight_circadian * c_alertness;
    base -= i.time_on_task_rate * hours_on_duty.max(0.0);
    base -= w;
    i.performance_floor + (100.0 - i.performance_floor) * base.clamp(0.0, 1.0)
}
