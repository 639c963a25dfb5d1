//! Sleep-quality calculator.
//!
//! Converts a raw sleep interval plus its environment and scheduling
//! context into *effective sleep hours* through a record of independent
//! multiplicative factors. Each factor is individually testable and the
//! final combination lives in one place ([`QualityFactors::combine`]).
//!
//! Base efficiencies follow PSG data in Signal et al. (2013); the circadian
//! alignment penalty reflects reduced sleep consolidation outside the
//! biological night (Dijk & Czeisler 1995).

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::models::{DiagnosticSeverity, SleepDiagnostic, SleepEnvironment};
use crate::params::ModelParameters;
use crate::services::wocl;

/// Scheduling context around a candidate sleep interval.
#[derive(Debug, Clone, Copy, Default)]
pub struct SleepContext {
    /// Release of the previous duty, when the sleep follows one.
    pub previous_release: Option<DateTime<Utc>>,
    /// Report of the next duty or other hard obligation.
    pub next_report: Option<DateTime<Utc>>,
    /// Recovery-type sleep (post-duty or rest-day). Gates the post-duty
    /// rebound boost.
    pub is_recovery: bool,
}

/// The independent multiplicative factors of one sleep evaluation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QualityFactors {
    /// Environment base efficiency.
    pub base_efficiency: f64,
    /// Circadian alignment, penalizing sleep outside the WOCL.
    pub wocl_alignment: f64,
    /// Penalty for sleep onset drifting past 01:00 local.
    pub late_onset: f64,
    /// Boost for sleep shortly after duty release (high sleep pressure).
    pub recovery: f64,
    /// Penalty for an imminent next obligation.
    pub time_pressure: f64,
    /// Penalty for episodes shorter than six hours.
    pub insufficient: f64,
}

impl QualityFactors {
    /// Combined efficiency: the base efficiency times the clamped product
    /// of all other factors.
    pub fn combine(&self, params: &ModelParameters) -> f64 {
        let q = &params.sleep_quality;
        let product = self.wocl_alignment
            * self.late_onset
            * self.recovery
            * self.time_pressure
            * self.insufficient;
        self.base_efficiency * product.clamp(q.combined_factor_floor, q.combined_factor_ceiling)
    }
}

/// Result of evaluating one sleep interval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleepQuality {
    pub raw_hours: f64,
    pub effective_hours: f64,
    /// Effective / raw ratio actually applied.
    pub efficiency: f64,
    pub wocl_overlap_hours: f64,
    pub factors: QualityFactors,
}

/// Evaluate a sleep interval.
///
/// `location_tz` is the timezone the pilot physically sleeps in; the WOCL
/// alignment and onset-hour factors are evaluated against it.
pub fn evaluate(
    params: &ModelParameters,
    start_utc: DateTime<Utc>,
    end_utc: DateTime<Utc>,
    location_tz: Tz,
    environment: SleepEnvironment,
    context: &SleepContext,
) -> SleepQuality {
    let q = &params.sleep_quality;
    let raw_hours = ((end_utc - start_utc).num_seconds() as f64 / 3600.0).max(0.0);
    // A single episode cannot restore beyond the biological maximum.
    let credited_hours = raw_hours.min(q.max_realistic_sleep_hours);

    let wocl_overlap =
        wocl::wocl_overlap_hours(start_utc, end_utc, location_tz, &params.circadian);

    let factors = QualityFactors {
        base_efficiency: q.base_efficiency(environment),
        wocl_alignment: wocl_alignment_factor(params, credited_hours, wocl_overlap),
        late_onset: late_onset_factor(start_utc, location_tz),
        recovery: recovery_factor(start_utc, context),
        time_pressure: time_pressure_factor(params, credited_hours, end_utc, context),
        insufficient: insufficient_factor(credited_hours),
    };

    let efficiency = factors.combine(params);
    let effective_hours = (credited_hours * efficiency).min(raw_hours);

    SleepQuality {
        raw_hours,
        effective_hours,
        efficiency,
        wocl_overlap_hours: wocl_overlap,
        factors,
    }
}

/// Alignment of the sleep window with the biological night. Fully aligned
/// sleep keeps factor 1.0; fully daytime sleep loses the configured
/// misalignment penalty.
fn wocl_alignment_factor(params: &ModelParameters, duration_hours: f64, wocl_overlap: f64) -> f64 {
    if duration_hours <= 0.5 {
        return 1.0;
    }
    let window = params.circadian.wocl_window_hours();
    let reference = duration_hours.min(window).max(1.0);
    let alignment = (wocl_overlap / reference).clamp(0.0, 1.0);
    1.0 - params.sleep_quality.max_misalignment_penalty * (1.0 - alignment)
}

/// Sleep onset drifting past 01:00 local shortens and fragments the night.
fn late_onset_factor(start_utc: DateTime<Utc>, tz: Tz) -> f64 {
    let onset_hour = wocl::local_hour_of_day(start_utc, tz);
    if (1.0..4.0).contains(&onset_hour) {
        0.93
    } else if (0.0..1.0).contains(&onset_hour) {
        0.97
    } else {
        1.0
    }
}

/// Enhanced slow-wave rebound when recovery sleep starts soon after duty
/// release (Borbély 1982). Graded, capped at 5%; only recovery-type sleep
/// earns the credit.
fn recovery_factor(start_utc: DateTime<Utc>, context: &SleepContext) -> f64 {
    if !context.is_recovery {
        return 1.0;
    }
    let Some(release) = context.previous_release else {
        return 1.0;
    };
    let hours_since_duty = (start_utc - release).num_seconds() as f64 / 3600.0;
    if hours_since_duty < 0.0 {
        1.0
    } else if hours_since_duty < 2.0 {
        1.05
    } else if hours_since_duty < 4.0 {
        1.03
    } else {
        1.0
    }
}

/// Anticipatory stress before an imminent obligation degrades sleep that
/// the obligation curtailed. A full-length night ending at a habitual wake
/// is not curtailed and carries no penalty, however close the report.
fn time_pressure_factor(
    params: &ModelParameters,
    duration_hours: f64,
    end_utc: DateTime<Utc>,
    context: &SleepContext,
) -> f64 {
    let Some(next_report) = context.next_report else {
        return 1.0;
    };
    if duration_hours >= params.homeostatic.baseline_sleep_need_hours {
        return 1.0;
    }
    let hours_until = (next_report - end_utc).num_seconds() as f64 / 3600.0;
    if hours_until < 1.5 {
        0.88
    } else if hours_until < 3.0 {
        0.93
    } else if hours_until < 6.0 {
        0.97
    } else {
        1.0
    }
}

/// Short episodes below six hours lose proportionally more value.
fn insufficient_factor(duration_hours: f64) -> f64 {
    if duration_hours >= 6.0 {
        1.0
    } else {
        (0.75 + 0.25 * duration_hours / 6.0).clamp(0.75, 1.0)
    }
}

/// Graded diagnostics for a settled sleep evaluation.
pub fn sleep_warnings(
    quality: &SleepQuality,
    duty_id: Option<&str>,
) -> Vec<SleepDiagnostic> {
    let mut warnings = Vec::new();
    let duty = duty_id.map(str::to_string);
    let eff = quality.effective_hours;

    if eff < 5.0 {
        warnings.push(SleepDiagnostic::new(
            duty.clone(),
            DiagnosticSeverity::Critical,
            format!("critically insufficient sleep: {eff:.1}h effective"),
        ));
    } else if eff < 6.0 {
        warnings.push(SleepDiagnostic::new(
            duty.clone(),
            DiagnosticSeverity::High,
            format!("insufficient sleep: {eff:.1}h effective"),
        ));
    } else if eff < 7.0 {
        warnings.push(SleepDiagnostic::new(
            duty.clone(),
            DiagnosticSeverity::Moderate,
            format!("below optimal sleep: {eff:.1}h effective"),
        ));
    }

    if quality.wocl_overlap_hours < 0.5 && quality.raw_hours >= 4.0 && eff < 6.5 {
        warnings.push(SleepDiagnostic::new(
            duty,
            DiagnosticSeverity::Info,
            "disrupted circadian timing: sleep lies outside the biological night",
        ));
    }

    warnings
}

#[cfg(test)]
#[path = "sleep_quality_tests.rs"]
mod sleep_quality_tests;
