//! Month-long roster simulation.
//!
//! Drives sleep inference and duty simulation chronologically: for each
//! duty the dispatcher back-fills sleep into the preceding gap, the quality
//! calculator settles effective hours, the sleep-debt ledger and circadian
//! phase shift are advanced, and the duty simulator integrates the
//! performance timeline. Homeostatic state carries forward between duties.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;

use crate::api::CancelToken;
use crate::error::{Error, Result};
use crate::models::{
    Duty, DutyTimeline, MonthlyAnalysis, RestPeriod, RiskLevel, Roster, SleepBlock,
    SleepDiagnostic, SleepEnvironment, SleepType,
};
use crate::params::ModelParameters;
use crate::services::duty_simulator::{self, DutySimState};
use crate::services::sleep_quality::{self, SleepContext};
use crate::services::{compliance, sleep_strategies, wocl};

/// Homeostatic pressure assumed when no sleep data exists at all.
const INITIAL_S_AT_WAKE: f64 = 0.3;

/// Shared inputs for one roster run.
pub struct RosterContext<'a> {
    pub params: &'a ModelParameters,
    pub home_tz: Tz,
    /// Parsed timezone per airport code, resolved up front.
    pub airport_tz: HashMap<String, Tz>,
}

impl RosterContext<'_> {
    fn tz_of(&self, code: &str) -> Tz {
        self.airport_tz.get(code).copied().unwrap_or(self.home_tz)
    }
}

/// Where the pilot spends the gap before a duty.
struct GapLocation {
    tz: Tz,
    environment: SleepEnvironment,
}

/// Run the full simulation. Returns [`Error::Cancelled`] carrying the
/// analysis of all completed duties when the token trips mid-run.
pub fn simulate_roster(
    ctx: &RosterContext,
    roster: &Roster,
    stride: Duration,
    cancel: &CancelToken,
) -> Result<MonthlyAnalysis> {
    let params = ctx.params;
    let first_report = roster.duties[0].report_utc;

    let mut sleep_history: Vec<SleepBlock> = Vec::new();
    let mut diagnostics: Vec<SleepDiagnostic> = Vec::new();
    let mut timelines: Vec<DutyTimeline> = Vec::new();

    let mut phase_shift_hours = 0.0_f64;
    let mut cumulative_debt = 0.0_f64;
    let mut fallback_s = INITIAL_S_AT_WAKE;
    let mut previous_duty: Option<&Duty> = None;

    for duty in &roster.duties {
        if cancel.is_cancelled() {
            return Err(cancelled(ctx, roster, timelines, sleep_history, diagnostics));
        }

        let location = gap_location(ctx, roster, previous_duty);
        let history_len_before = sleep_history.len();

        // Back-fill sleep into the gap: recovery first, then the
        // duty-specific strategy blocks.
        if let Some(previous) = previous_duty {
            let recovery = sleep_strategies::post_duty_recovery(
                previous,
                Some(duty.report_utc),
                location.tz,
                location.environment,
            );
            diagnostics.extend(recovery.diagnostics);
            for block in recovery.blocks {
                settle_and_insert(
                    ctx,
                    roster,
                    block,
                    &SleepContext {
                        previous_release: Some(previous.release_utc),
                        next_report: Some(duty.report_utc),
                        is_recovery: true,
                    },
                    Some(&duty.duty_id),
                    &mut sleep_history,
                    &mut diagnostics,
                );
            }
            for block in sleep_strategies::rest_night_blocks(
                previous.release_utc,
                duty.report_utc,
                location.tz,
                location.environment,
            ) {
                // Nights already covered by the post-duty recovery block
                // are planned duplication, not a scheduling conflict.
                if sleep_history
                    .iter()
                    .any(|b| b.overlaps(block.start_utc, block.end_utc))
                {
                    continue;
                }
                settle_and_insert(
                    ctx,
                    roster,
                    block,
                    &SleepContext {
                        previous_release: None,
                        next_report: Some(duty.report_utc),
                        is_recovery: true,
                    },
                    None,
                    &mut sleep_history,
                    &mut diagnostics,
                );
            }
        }

        let plan = sleep_strategies::pre_duty_blocks(
            params,
            duty,
            previous_duty,
            ctx.home_tz,
            location.tz,
            location.environment,
        );
        diagnostics.extend(plan.diagnostics);
        for block in plan.blocks {
            // A strategy night fully covered by recovery sleep already in
            // the history is duplication, not a conflict.
            if sleep_history
                .iter()
                .any(|b| b.start_utc <= block.start_utc && block.end_utc <= b.end_utc)
            {
                continue;
            }
            settle_and_insert(
                ctx,
                roster,
                block,
                &SleepContext {
                    previous_release: previous_duty.map(|d| d.release_utc),
                    next_report: Some(duty.report_utc),
                    is_recovery: false,
                },
                Some(&duty.duty_id),
                &mut sleep_history,
                &mut diagnostics,
            );
        }

        // Seed the homeostat if the first duty ended up with no prior
        // sleep at all: an assumed home night ending an hour before
        // report gives the simulation a valid wake anchor.
        if previous_duty.is_none()
            && !sleep_history.iter().any(|b| b.end_utc <= duty.report_utc)
        {
            settle_and_insert(
                ctx,
                roster,
                SleepBlock::new(
                    first_report - Duration::hours(8),
                    first_report - Duration::hours(1),
                    ctx.home_tz.name(),
                    SleepEnvironment::Home,
                    SleepType::Recovery,
                    0.90,
                ),
                &SleepContext {
                    previous_release: None,
                    next_report: Some(first_report),
                    is_recovery: true,
                },
                None,
                &mut sleep_history,
                &mut diagnostics,
            );
        }

        let blocks_before: Vec<SleepBlock> =
            sleep_history[history_len_before..].to_vec();

        // Advance the sleep-debt ledger and the circadian phase shift
        // across the gap.
        if let Some(previous) = previous_duty {
            let delta_days =
                (duty.report_utc - previous.release_utc).num_seconds() as f64 / 86_400.0;
            cumulative_debt = update_sleep_debt(
                params,
                cumulative_debt,
                delta_days,
                &sleep_history,
                previous.release_utc,
                duty.report_utc,
            );
            phase_shift_hours = update_phase_shift(
                ctx,
                phase_shift_hours,
                delta_days,
                location.tz,
                duty.report_utc,
            );
        }

        let state = DutySimState {
            phase_shift_hours,
            fallback_s_at_wake: fallback_s,
            cumulative_sleep_debt: cumulative_debt,
            blocks_before,
        };
        let timeline = match duty_simulator::simulate_duty(
            params,
            duty,
            &sleep_history,
            &state,
            ctx.home_tz,
            stride,
            cancel,
        ) {
            Ok(timeline) => timeline,
            Err(Error::Cancelled { .. }) => {
                return Err(cancelled(ctx, roster, timelines, sleep_history, diagnostics));
            }
            Err(other) => return Err(other),
        };

        fallback_s = timeline.s_at_release;
        timelines.push(timeline);
        previous_duty = Some(duty);
    }

    let mut rest_periods = Vec::new();
    for pair in roster.duties.windows(2) {
        let location_tz = ctx.tz_of(&pair[0].arrival_airport().code);
        rest_periods.push(compliance::evaluate_rest_period(
            params,
            &pair[0],
            &pair[1],
            &roster.home_base,
            ctx.home_tz,
            location_tz,
        ));
    }
    compliance::apply_recurrent_rest_rule(params, &mut rest_periods, first_report, ctx.home_tz);

    Ok(build_analysis(
        ctx,
        roster,
        timelines,
        rest_periods,
        sleep_history,
        diagnostics,
    ))
}

/// Settle a candidate block's effective hours through the quality
/// calculator, then admit it into the history. As a final guard the block
/// is clipped against every duty in the roster, so no admitted block can
/// ever overlap a duty period.
fn settle_and_insert(
    ctx: &RosterContext,
    roster: &Roster,
    mut block: SleepBlock,
    context: &SleepContext,
    duty_id: Option<&str>,
    history: &mut Vec<SleepBlock>,
    diagnostics: &mut Vec<SleepDiagnostic>,
) {
    for duty in &roster.duties {
        if !block.overlaps(duty.report_utc, duty.release_utc) {
            continue;
        }
        if block.start_utc < duty.report_utc {
            block.end_utc = block.end_utc.min(duty.report_utc);
        } else {
            block.start_utc = block.start_utc.max(duty.release_utc);
        }
        if block.end_utc <= block.start_utc {
            return;
        }
    }
    block.duration_hours = (block.end_utc - block.start_utc).num_seconds() as f64 / 3600.0;

    let tz = block
        .location_tz
        .parse::<Tz>()
        .unwrap_or(ctx.home_tz);
    let quality = sleep_quality::evaluate(
        ctx.params,
        block.start_utc,
        block.end_utc,
        tz,
        block.environment,
        context,
    );
    block.effective_hours = quality.effective_hours;
    if block.sleep_type != SleepType::Nap {
        diagnostics.extend(sleep_quality::sleep_warnings(&quality, duty_id));
    }
    sleep_strategies::insert_block(history, block, diagnostics);
}

/// Work out where the pilot is during the gap before the next duty.
fn gap_location(
    ctx: &RosterContext,
    roster: &Roster,
    previous_duty: Option<&Duty>,
) -> GapLocation {
    match previous_duty {
        Some(previous) => {
            let arrival = previous.arrival_airport();
            if arrival.code == roster.home_base {
                GapLocation {
                    tz: ctx.home_tz,
                    environment: SleepEnvironment::Home,
                }
            } else {
                GapLocation {
                    tz: ctx.tz_of(&arrival.code),
                    environment: SleepEnvironment::Hotel,
                }
            }
        }
        None => GapLocation {
            tz: ctx.home_tz,
            environment: SleepEnvironment::Home,
        },
    }
}

/// Advance the sleep-debt ledger across one inter-duty gap.
///
/// The balance compares *raw* slept duration in the gap against the daily
/// need scaled by the gap length; a surplus repays existing debt 1:1, and
/// natural decay runs on top.
fn update_sleep_debt(
    params: &ModelParameters,
    mut debt: f64,
    delta_days: f64,
    history: &[SleepBlock],
    gap_start: DateTime<Utc>,
    gap_end: DateTime<Utc>,
) -> f64 {
    let period_sleep: f64 = history
        .iter()
        .filter(|b| b.start_utc >= gap_start && b.end_utc <= gap_end)
        .map(|b| b.duration_hours)
        .sum();
    let period_need = params.homeostatic.baseline_sleep_need_hours * delta_days;
    let balance = period_sleep - period_need;

    if balance < 0.0 {
        debt += -balance;
    } else if debt > 0.0 {
        debt = (debt - balance).max(0.0);
    }
    debt *= (-params.sleep_debt.decay_rate_per_day * delta_days).exp();
    debt.max(0.0)
}

/// Move the circadian phase shift toward the local offset of the layover
/// timezone at the adaptation rate, snapping once within the threshold.
fn update_phase_shift(
    ctx: &RosterContext,
    mut shift: f64,
    delta_days: f64,
    layover_tz: Tz,
    at: DateTime<Utc>,
) -> f64 {
    let target =
        wocl::utc_offset_hours(at, layover_tz) - wocl::utc_offset_hours(at, ctx.home_tz);
    let diff = target - shift;
    let rate = ctx.params.adaptation.rate_for(diff);
    let step = diff.abs().min(rate * delta_days).copysign(diff);
    shift = (shift + step).clamp(-12.0, 12.0);
    if (shift - target).abs() < ctx.params.adaptation.adaptation_threshold_hours {
        shift = target;
    }
    shift
}

/// Assemble the aggregate monthly result.
fn build_analysis(
    ctx: &RosterContext,
    roster: &Roster,
    timelines: Vec<DutyTimeline>,
    rest_periods: Vec<RestPeriod>,
    sleep_history: Vec<SleepBlock>,
    diagnostics: Vec<SleepDiagnostic>,
) -> MonthlyAnalysis {
    let risk = &ctx.params.risk;
    let mut high = 0;
    let mut critical = 0;
    let mut extreme = 0;
    for timeline in &timelines {
        match timeline.landing_performance.map(|p| risk.classify(p)) {
            Some(RiskLevel::High) => high += 1,
            Some(RiskLevel::Critical) => critical += 1,
            Some(RiskLevel::Extreme) => extreme += 1,
            _ => {}
        }
    }

    let total_pinch_events = timelines.iter().map(|t| t.pinch_events.len()).sum();
    let max_sleep_debt_hours = timelines
        .iter()
        .map(|t| t.cumulative_sleep_debt_at_release)
        .fold(0.0, f64::max);
    let worst = timelines.iter().min_by(|a, b| {
        a.min_performance
            .partial_cmp(&b.min_performance)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let worst_duty_id = worst.map(|t| t.duty.duty_id.clone());
    let lowest_performance = worst.map(|t| t.min_performance);

    let span_nights = timelines
        .last()
        .map(|t| {
            ((t.duty.release_utc - roster.duties[0].report_utc).num_seconds() as f64 / 86_400.0)
                .max(1.0)
        })
        .unwrap_or(1.0);
    let total_effective: f64 = sleep_history.iter().map(|b| b.effective_hours).sum();
    let avg_sleep_per_night_hours = total_effective / span_nights;

    MonthlyAnalysis {
        roster: roster.clone(),
        duty_timelines: timelines,
        rest_periods,
        diagnostics,
        sleep_history,
        avg_sleep_per_night_hours,
        max_sleep_debt_hours,
        high_risk_duties: high,
        critical_risk_duties: critical,
        extreme_risk_duties: extreme,
        worst_duty_id,
        lowest_performance,
        total_pinch_events,
    }
}

/// Wrap the work completed so far into a cancellation error.
fn cancelled(
    ctx: &RosterContext,
    roster: &Roster,
    timelines: Vec<DutyTimeline>,
    sleep_history: Vec<SleepBlock>,
    diagnostics: Vec<SleepDiagnostic>,
) -> Error {
    let completed = timelines.len();
    let partial = build_analysis(ctx, roster, timelines, Vec::new(), sleep_history, diagnostics);
    Error::Cancelled {
        completed_duties: completed,
        partial: Some(Box::new(partial)),
    }
}
