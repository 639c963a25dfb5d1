//! Public API surface for the fatigue simulation core.
//!
//! This file consolidates the crate's entry point and the supporting
//! injection types. The core is an embeddable library: one call to
//! [`analyze`] turns a normalized roster into a [`MonthlyAnalysis`],
//! synchronously and deterministically.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Duration;
use chrono_tz::Tz;

use crate::error::{Error, Result};
use crate::models::{Airport, MonthlyAnalysis, Roster};
use crate::params::ModelParameters;
use crate::services::{roster_simulator, wocl};

pub use crate::models::{
    DisruptiveFlags, Duty, DutyTimeline, FdpAssessment, FlightPhase, FlightSegment,
    PerformancePoint, PinchEvent, PinchSeverity, RestDisruption, RestPeriod, RestType, RiskLevel,
    SleepBlock, SleepDiagnostic, SleepEnvironment, SleepType,
};
pub use crate::params::Preset;
pub use crate::services::sleep_strategies::StrategyKind;

/// Airport reference data source, injected rather than global so the core
/// stays testable with stub data.
pub trait AirportLookup {
    fn lookup(&self, code: &str) -> Option<Airport>;
}

impl AirportLookup for HashMap<String, Airport> {
    fn lookup(&self, code: &str) -> Option<Airport> {
        self.get(code).cloned()
    }
}

impl AirportLookup for fn(&str) -> Option<Airport> {
    fn lookup(&self, code: &str) -> Option<Airport> {
        self(code)
    }
}

/// Cooperative cancellation flag, checked between integration steps and
/// between duties. Cloning shares the underlying flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Longest admissible integration stride.
const MAX_STRIDE_MINUTES: i64 = 15;

/// Run the fatigue simulation over one roster.
///
/// The roster must already be normalized (UTC instants, resolved airport
/// references). `airports` fills in timezone data for airports whose
/// embedded timezone is missing or unparseable; an airport that cannot be
/// resolved either way fails the analysis with its code in the error.
///
/// Returns [`Error::Cancelled`] with partial results when `cancel` trips
/// mid-run. Identical inputs produce identical output.
pub fn analyze(
    roster: &Roster,
    params: &ModelParameters,
    airports: &dyn AirportLookup,
    stride: Duration,
    cancel: &CancelToken,
) -> Result<MonthlyAnalysis> {
    if stride <= Duration::zero() {
        return Err(Error::InvalidStride("stride must be positive".into()));
    }
    if stride > Duration::minutes(MAX_STRIDE_MINUTES) {
        return Err(Error::InvalidStride(format!(
            "stride of {} minutes exceeds the {MAX_STRIDE_MINUTES}-minute maximum",
            stride.num_minutes()
        )));
    }

    roster.validate()?;

    let home_tz = wocl::resolve_tz(&roster.home_base_tz, &roster.home_base)?;
    let airport_tz = resolve_airport_timezones(roster, airports)?;

    let ctx = roster_simulator::RosterContext {
        params,
        home_tz,
        airport_tz,
    };
    roster_simulator::simulate_roster(&ctx, roster, stride, cancel)
}

/// Resolve every airport referenced by the roster to a parsed timezone,
/// consulting the lookup for airports with unusable embedded data.
fn resolve_airport_timezones(
    roster: &Roster,
    airports: &dyn AirportLookup,
) -> Result<HashMap<String, Tz>> {
    let mut resolved = HashMap::new();
    for duty in &roster.duties {
        for segment in &duty.segments {
            for airport in [&segment.departure, &segment.arrival] {
                if resolved.contains_key(&airport.code) {
                    continue;
                }
                let tz = match airport.timezone.parse::<Tz>() {
                    Ok(tz) => tz,
                    Err(_) => {
                        let fallback = airports
                            .lookup(&airport.code)
                            .map(|a| a.timezone)
                            .unwrap_or_default();
                        wocl::resolve_tz(&fallback, &airport.code)?
                    }
                };
                resolved.insert(airport.code.clone(), tz);
            }
        }
    }
    Ok(resolved)
}
