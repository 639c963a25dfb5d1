//! Sleep-strategy dispatcher.
//!
//! For every duty exactly one strategy is selected from the report time in
//! home-base local hours, and the strategy synthesizes candidate sleep
//! blocks. All candidates pass through the same no-overlap enforcement
//! against the surrounding duties and the existing sleep history before
//! they are admitted; truncation lowers confidence and raises a
//! diagnostic, never an error.
//!
//! Strategy timings follow field studies of pilot sleep behaviour:
//! Signal et al. (2014) for pre-night-flight naps, Roach et al. (2012) for
//! early reports, Minors & Waterhouse (1981) for anchor sleep.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::models::{
    DiagnosticSeverity, Duty, SleepBlock, SleepDiagnostic, SleepEnvironment, SleepType,
};
use crate::params::ModelParameters;
use crate::services::wocl;

/// Gap kept between a truncated sleep block and the report it collided with.
fn overlap_epsilon() -> Duration {
    Duration::minutes(1)
}

/// Shortest admissible sleep block; anything smaller is dropped.
const MIN_BLOCK_HOURS: f64 = 1.5;

/// Confidence ceiling applied whenever enforcement had to truncate.
const TRUNCATED_CONFIDENCE: f64 = 0.70;

/// The five sleep strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Normal,
    NightDeparture,
    EarlyMorning,
    WoclAnchor,
    Recovery,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Normal => "normal",
            StrategyKind::NightDeparture => "night_departure",
            StrategyKind::EarlyMorning => "early_morning",
            StrategyKind::WoclAnchor => "wocl_anchor",
            StrategyKind::Recovery => "recovery",
        }
    }
}

/// Output of one strategy invocation: zero or more candidate blocks plus
/// any diagnostics raised while fitting them around the duties.
#[derive(Debug, Clone)]
pub struct SleepPlan {
    pub strategy: StrategyKind,
    pub blocks: Vec<SleepBlock>,
    pub diagnostics: Vec<SleepDiagnostic>,
}

impl SleepPlan {
    fn new(strategy: StrategyKind) -> Self {
        Self {
            strategy,
            blocks: Vec::new(),
            diagnostics: Vec::new(),
        }
    }
}

/// Pick the strategy for a duty from its report time in home-base local
/// hours and its WOCL exposure.
pub fn select_strategy(params: &ModelParameters, duty: &Duty, home_tz: Tz) -> StrategyKind {
    let report_hour = wocl::local_hour_of_day(duty.report_utc, home_tz);
    if report_hour >= 20.0 || report_hour < 4.0 {
        StrategyKind::NightDeparture
    } else if report_hour < 7.0 {
        StrategyKind::EarlyMorning
    } else if wocl::duty_crosses_wocl(duty, home_tz, &params.circadian) && duty.duty_hours() > 6.0
    {
        StrategyKind::WoclAnchor
    } else {
        StrategyKind::Normal
    }
}

/// Generate the pre-duty sleep blocks for `duty`.
///
/// `location_tz`/`environment` describe where the pilot actually is before
/// this duty (home, or the previous duty's arrival on a layover).
pub fn pre_duty_blocks(
    params: &ModelParameters,
    duty: &Duty,
    previous_duty: Option<&Duty>,
    home_tz: Tz,
    location_tz: Tz,
    environment: SleepEnvironment,
) -> SleepPlan {
    let strategy = select_strategy(params, duty, home_tz);
    log::debug!(
        "duty {}: {} strategy selected",
        duty.duty_id,
        strategy.as_str()
    );
    let mut plan = SleepPlan::new(strategy);

    match strategy {
        StrategyKind::Normal => normal_blocks(duty, previous_duty, location_tz, environment, &mut plan),
        StrategyKind::NightDeparture => {
            night_departure_blocks(duty, previous_duty, location_tz, environment, &mut plan)
        }
        StrategyKind::EarlyMorning => {
            early_morning_blocks(duty, previous_duty, home_tz, location_tz, environment, &mut plan)
        }
        StrategyKind::WoclAnchor => {
            wocl_anchor_blocks(duty, previous_duty, location_tz, environment, &mut plan)
        }
        // Recovery is driven by rest gaps, not by a pending duty.
        StrategyKind::Recovery => {}
    }
    plan
}

/// Standard overnight rest: 23:00-07:00 local at the sleep location.
fn normal_blocks(
    duty: &Duty,
    previous_duty: Option<&Duty>,
    location_tz: Tz,
    environment: SleepEnvironment,
    plan: &mut SleepPlan,
) {
    let report_local = wocl::to_local(duty.report_utc, location_tz);
    let bedtime = wocl::local_to_utc(
        location_tz,
        report_local.date_naive() - Duration::days(1),
        NaiveTime::from_hms_opt(23, 0, 0).unwrap(),
    );
    let wake = wocl::local_to_utc(
        location_tz,
        report_local.date_naive(),
        NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
    );

    let awake_hours = ((duty.report_utc - wake).num_seconds() as f64 / 3600.0).max(0.0);
    let confidence = if awake_hours < 2.0 {
        0.95
    } else if awake_hours < 6.0 {
        0.90
    } else if awake_hours < 10.0 {
        0.80
    } else {
        0.70
    };

    push_candidate(
        plan,
        bedtime,
        wake,
        duty,
        previous_duty,
        location_tz,
        environment,
        SleepType::Main,
        confidence,
    );
}

/// Night departure: morning sleep on the report day plus a two-hour
/// pre-duty nap ending two hours before report.
fn night_departure_blocks(
    duty: &Duty,
    previous_duty: Option<&Duty>,
    location_tz: Tz,
    environment: SleepEnvironment,
    plan: &mut SleepPlan,
) {
    let report_local = wocl::to_local(duty.report_utc, location_tz);
    // Early-hours reports (00:00-04:00) belong to the previous day's
    // preparation pattern.
    let morning_date = if report_local.time() < NaiveTime::from_hms_opt(4, 0, 0).unwrap() {
        report_local.date_naive() - Duration::days(1)
    } else {
        report_local.date_naive()
    };
    let morning_start =
        wocl::local_to_utc(location_tz, morning_date, NaiveTime::from_hms_opt(7, 0, 0).unwrap());
    let morning_end =
        wocl::local_to_utc(location_tz, morning_date, NaiveTime::from_hms_opt(14, 0, 0).unwrap());

    push_candidate(
        plan,
        morning_start,
        morning_end,
        duty,
        previous_duty,
        location_tz,
        environment,
        SleepType::Main,
        0.60,
    );

    let nap_end = duty.report_utc - Duration::hours(2);
    let nap_start = nap_end - Duration::hours(2);
    push_candidate(
        plan,
        nap_start,
        nap_end,
        duty,
        previous_duty,
        location_tz,
        environment,
        SleepType::Nap,
        0.60,
    );
}

/// Early report: constrained early bedtime per the Roach et al. (2012)
/// regression — pilots lose roughly 15 minutes of sleep per hour of duty
/// advance before 09:00 and cannot fall asleep before ~21:30.
fn early_morning_blocks(
    duty: &Duty,
    previous_duty: Option<&Duty>,
    home_tz: Tz,
    location_tz: Tz,
    environment: SleepEnvironment,
    plan: &mut SleepPlan,
) {
    let report_hour = wocl::local_hour_of_day(duty.report_utc, home_tz);
    let sleep_hours = (6.6 - 0.25 * (9.0 - report_hour).max(0.0)).max(4.0);

    let end = duty.report_utc - Duration::hours(1);
    let report_local = wocl::to_local(duty.report_utc, location_tz);
    let earliest_bedtime = wocl::local_to_utc(
        location_tz,
        report_local.date_naive() - Duration::days(1),
        NaiveTime::from_hms_opt(21, 30, 0).unwrap(),
    );
    let start = earliest_bedtime.max(end - hours_duration(sleep_hours));

    push_candidate(
        plan,
        start,
        end,
        duty,
        previous_duty,
        location_tz,
        environment,
        SleepType::Main,
        0.55,
    );
}

/// Long WOCL-crossing duty: a 4.5 h anchor block ending 90 minutes before
/// report preserves circadian entrainment when a full night is impossible.
fn wocl_anchor_blocks(
    duty: &Duty,
    previous_duty: Option<&Duty>,
    location_tz: Tz,
    environment: SleepEnvironment,
    plan: &mut SleepPlan,
) {
    let end = duty.report_utc - Duration::minutes(90);
    let start = end - hours_duration(4.5);
    push_candidate(
        plan,
        start,
        end,
        duty,
        previous_duty,
        location_tz,
        environment,
        SleepType::Anchor,
        0.50,
    );
}

/// Post-duty recovery sleep at the layover (or at home after the last leg).
///
/// The window depends on the local release hour: night arrivals sleep
/// almost immediately, morning arrivals take an afternoon recovery sleep,
/// afternoon arrivals wait for a normal bedtime. The block always starts at
/// least two hours after release and ends at least one hour before the next
/// obligation.
pub fn post_duty_recovery(
    duty: &Duty,
    next_report: Option<DateTime<Utc>>,
    location_tz: Tz,
    environment: SleepEnvironment,
) -> SleepPlan {
    let mut plan = SleepPlan::new(StrategyKind::Recovery);
    let release_local = wocl::to_local(duty.release_utc, location_tz);
    let release_hour = wocl::local_hour_of_day(duty.release_utc, location_tz);

    let (start, desired_hours) = if (6.0..12.0).contains(&release_hour) {
        // Morning arrival: recovery sleep after settling in.
        (duty.release_utc + hours_duration(2.5), 6.0)
    } else if (12.0..20.0).contains(&release_hour) {
        // Afternoon arrival: wait for a normal bedtime where possible.
        let bedtime = wocl::local_to_utc(
            location_tz,
            release_local.date_naive(),
            NaiveTime::from_hms_opt(23, 0, 0).unwrap(),
        );
        (bedtime.max(duty.release_utc + Duration::hours(2)), 8.0)
    } else {
        // Night arrival: straight to bed after transit.
        (duty.release_utc + Duration::hours(2), 8.0)
    };

    let mut end = start + hours_duration(desired_hours);
    if let Some(report) = next_report {
        end = end.min(report - Duration::hours(1));
    }

    if (end - start).num_seconds() as f64 / 3600.0 < MIN_BLOCK_HOURS {
        plan.diagnostics.push(SleepDiagnostic::new(
            Some(duty.duty_id.clone()),
            DiagnosticSeverity::High,
            format!(
                "no viable post-duty recovery window after duty {}",
                duty.duty_id
            ),
        ));
        return plan;
    }

    let confidence = if environment == SleepEnvironment::Home {
        0.90
    } else {
        0.85
    };
    plan.blocks.push(SleepBlock::new(
        start,
        end,
        location_tz.name(),
        environment,
        SleepType::Recovery,
        confidence,
    ));
    plan
}

/// Full recovery nights (23:00-07:00 local) for every rest day inside a
/// long gap.
pub fn rest_night_blocks(
    gap_start: DateTime<Utc>,
    gap_end: DateTime<Utc>,
    location_tz: Tz,
    environment: SleepEnvironment,
) -> Vec<SleepBlock> {
    let mut blocks = Vec::new();
    let mut night = wocl::to_local(gap_start, location_tz).date_naive();
    let last = wocl::to_local(gap_end, location_tz).date_naive();
    while night <= last {
        let start =
            wocl::local_to_utc(location_tz, night, NaiveTime::from_hms_opt(23, 0, 0).unwrap());
        let end = wocl::local_to_utc(
            location_tz,
            night + Duration::days(1),
            NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
        );
        // Only nights fully inside the gap, with margin for the
        // surrounding duties.
        if start >= gap_start + Duration::hours(2) && end <= gap_end - Duration::hours(1) {
            blocks.push(SleepBlock::new(
                start,
                end,
                location_tz.name(),
                environment,
                SleepType::Recovery,
                0.95,
            ));
        }
        night += Duration::days(1);
    }
    blocks
}

/// Admit a block into the sleep history, keeping the history ordered by
/// start time and free of overlaps. A new block yields to blocks already in
/// the history: its edges are trimmed to the free gaps, and it is dropped
/// with a diagnostic when less than [`MIN_BLOCK_HOURS`] survives.
pub fn insert_block(
    history: &mut Vec<SleepBlock>,
    mut block: SleepBlock,
    diagnostics: &mut Vec<SleepDiagnostic>,
) -> bool {
    let mut truncated = false;
    for existing in history.iter() {
        if !existing.overlaps(block.start_utc, block.end_utc) {
            continue;
        }
        if block.start_utc >= existing.start_utc {
            block.start_utc = block.start_utc.max(existing.end_utc);
        } else {
            block.end_utc = block.end_utc.min(existing.start_utc);
        }
        truncated = true;
        if block.end_utc <= block.start_utc {
            break;
        }
    }

    let duration = (block.end_utc - block.start_utc).num_seconds() as f64 / 3600.0;
    if duration < MIN_BLOCK_HOURS {
        diagnostics.push(SleepDiagnostic::new(
            None,
            DiagnosticSeverity::Moderate,
            format!(
                "{} sleep block dropped: only {:.1}h free around existing sleep",
                block.sleep_type.as_str(),
                duration.max(0.0)
            ),
        ));
        return false;
    }
    if truncated {
        block.confidence = block.confidence.min(TRUNCATED_CONFIDENCE);
        block.duration_hours = duration;
        block.effective_hours = block.effective_hours.min(duration);
    }

    let idx = history
        .iter()
        .position(|b| b.start_utc > block.start_utc)
        .unwrap_or(history.len());
    history.insert(idx, block);
    true
}

/// Clip a candidate interval against the current and previous duty, then
/// push it into the plan if enough of it survives.
#[allow(clippy::too_many_arguments)]
fn push_candidate(
    plan: &mut SleepPlan,
    mut start: DateTime<Utc>,
    mut end: DateTime<Utc>,
    duty: &Duty,
    previous_duty: Option<&Duty>,
    location_tz: Tz,
    environment: SleepEnvironment,
    sleep_type: SleepType,
    mut confidence: f64,
) {
    let mut truncated = false;

    // Never sleep into the duty being prepared for.
    if end > duty.report_utc {
        end = duty.report_utc - overlap_epsilon();
        truncated = true;
    }

    // Never sleep before the previous duty has released; off-home
    // locations add an hour of hotel transit.
    if let Some(previous) = previous_duty {
        if start < previous.release_utc && end > previous.report_utc {
            let slack = if environment == SleepEnvironment::Home {
                overlap_epsilon()
            } else {
                Duration::hours(1)
            };
            start = previous.release_utc + slack;
            truncated = true;
        }
    }

    let remaining = (end - start).num_seconds() as f64 / 3600.0;
    if remaining < MIN_BLOCK_HOURS {
        log::debug!(
            "duty {}: {} block dropped after overlap enforcement",
            duty.duty_id,
            sleep_type.as_str()
        );
        plan.diagnostics.push(SleepDiagnostic::new(
            Some(duty.duty_id.clone()),
            DiagnosticSeverity::High,
            format!(
                "{} sleep block dropped: {:.1}h window left between duties",
                sleep_type.as_str(),
                remaining.max(0.0)
            ),
        ));
        return;
    }

    if truncated {
        confidence = confidence.min(TRUNCATED_CONFIDENCE);
        plan.diagnostics.push(SleepDiagnostic::new(
            Some(duty.duty_id.clone()),
            DiagnosticSeverity::Moderate,
            format!(
                "{} sleep block truncated to {:.1}h by duty schedule",
                sleep_type.as_str(),
                remaining
            ),
        ));
    }

    plan.blocks.push(SleepBlock::new(
        start,
        end,
        location_tz.name(),
        environment,
        sleep_type,
        confidence,
    ));
}

fn hours_duration(hours: f64) -> Duration {
    Duration::seconds((hours * 3600.0).round() as i64)
}

#[cfg(test)]
#[path = "sleep_strategies_tests.rs"]
mod sleep_strategies_tests;
