//! Simulation output model: performance timelines, pinch events, rest
//! periods and the monthly aggregate.
//!
//! Everything here serializes losslessly to JSON: timestamps as ISO-8601
//! UTC, enumerations as lowercase snake_case strings.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use super::roster::{Duty, Roster};
use super::sleep::{SleepBlock, SleepDiagnostic};

/// Phase of flight a performance point falls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlightPhase {
    Preflight,
    TaxiOut,
    Takeoff,
    Climb,
    Cruise,
    Descent,
    Approach,
    Landing,
    TaxiIn,
}

impl FlightPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlightPhase::Preflight => "preflight",
            FlightPhase::TaxiOut => "taxi_out",
            FlightPhase::Takeoff => "takeoff",
            FlightPhase::Climb => "climb",
            FlightPhase::Cruise => "cruise",
            FlightPhase::Descent => "descent",
            FlightPhase::Approach => "approach",
            FlightPhase::Landing => "landing",
            FlightPhase::TaxiIn => "taxi_in",
        }
    }

    /// Phases where a fatigue pinch is safety-relevant.
    pub fn is_safety_critical(&self) -> bool {
        matches!(
            self,
            FlightPhase::Takeoff | FlightPhase::Approach | FlightPhase::Landing
        )
    }
}

/// One step of the integrated performance timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformancePoint {
    pub t_utc: DateTime<Utc>,
    /// Same instant in home-base local time.
    pub t_local: DateTime<FixedOffset>,
    /// Homeostatic sleep pressure, 0-1 (higher = more pressure).
    pub s: f64,
    /// Circadian alertness, -1..+1 (higher = more alert).
    pub c: f64,
    /// Sleep inertia penalty, 0-1.
    pub w: f64,
    /// Integrated performance on the 20-100 scale.
    pub performance: f64,
    pub cumulative_sleep_debt_hours: f64,
    pub flight_phase: FlightPhase,
    /// True when the instant falls inside the home-base WOCL.
    pub is_wocl: bool,
    /// True when performance is below the high-risk threshold.
    pub is_critical: bool,
}

/// Severity grade of a pinch event, derived from performance at the pinch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinchSeverity {
    Moderate,
    High,
    Critical,
}

/// Coincidence of high sleep pressure and circadian trough during a
/// safety-critical flight phase. At most one event is kept per phase and
/// duty (the worst-performing point).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinchEvent {
    pub time_utc: DateTime<Utc>,
    pub time_local: DateTime<FixedOffset>,
    pub flight_phase: FlightPhase,
    pub performance: f64,
    pub s: f64,
    pub c: f64,
    pub severity: PinchSeverity,
}

/// Fatigue risk band on the 0-100 performance scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Critical,
    Extreme,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Moderate => "moderate",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
            RiskLevel::Extreme => "extreme",
        }
    }

    /// Recommended operational response for the band.
    pub fn recommended_action(&self) -> &'static str {
        match self {
            RiskLevel::Low => "none required",
            RiskLevel::Moderate => "enhanced monitoring",
            RiskLevel::High => "mitigation required",
            RiskLevel::Critical => "mandatory roster modification",
            RiskLevel::Extreme => "unsafe - do not fly",
        }
    }
}

/// Disruptive-duty flags per GM1 ORO.FTL.235.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisruptiveFlags {
    /// Duty encroaches on the WOCL.
    pub wocl_encroachment: bool,
    /// Report before 06:00 home-base local.
    pub early_start: bool,
    /// Release between 02:00 and 08:00 home-base local.
    pub late_finish: bool,
}

impl DisruptiveFlags {
    pub fn is_disruptive(&self) -> bool {
        self.wocl_encroachment || self.early_start || self.late_finish
    }
}

/// FDP legality summary for a duty (ORO.FTL.205 Table 1, 2-pilot crews).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FdpAssessment {
    /// Actual flight duty period, hours.
    pub actual_fdp_hours: f64,
    /// Maximum planned FDP for this report time and sector count.
    pub max_fdp_hours: f64,
    /// Maximum FDP including commander's discretion.
    pub extended_fdp_hours: f64,
    /// Actual FDP exceeded the planned maximum.
    pub used_discretion: bool,
    /// Actual FDP exceeded even the discretionary extension.
    pub exceeds_discretion: bool,
}

/// Full simulation result for one duty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DutyTimeline {
    pub duty: Duty,
    /// Performance points in ascending time order.
    pub timeline: Vec<PerformancePoint>,
    pub min_performance: f64,
    pub avg_performance: f64,
    /// Performance at the last landing-phase point, when one exists.
    pub landing_performance: Option<f64>,
    pub landing_risk: Option<RiskLevel>,
    pub pinch_events: Vec<PinchEvent>,
    /// Hours of the duty interval inside the home-base WOCL.
    pub wocl_encroachment_hours: f64,
    pub cumulative_sleep_debt_at_release: f64,
    /// Sleep blocks generated for the gap before this duty.
    pub sleep_blocks_before: Vec<SleepBlock>,
    /// Effective sleep credited in the 48 h before report.
    pub prior_effective_sleep_hours: f64,
    /// Hours awake before report.
    pub pre_duty_awake_hours: f64,
    /// Homeostatic state at release, carried to the next duty.
    pub s_at_release: f64,
    pub disruptive: DisruptiveFlags,
    pub fdp: FdpAssessment,
}

/// EASA classification of a rest period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestType {
    Illegal,
    Minimum,
    Adequate,
    Recurrent,
    Extended,
}

impl RestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RestType::Illegal => "illegal",
            RestType::Minimum => "minimum",
            RestType::Adequate => "adequate",
            RestType::Recurrent => "recurrent",
            RestType::Extended => "extended",
        }
    }
}

/// Why a legal rest may still yield poor sleep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestDisruption {
    None,
    QuickTurn,
    EarlyReportAfterLateArrival,
    LateReportAfterEarlyArrival,
    TimezoneShift,
}

/// Compliance verdict and sleep-disruption analysis for the gap between
/// two consecutive duties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestPeriod {
    pub previous_duty_id: String,
    pub next_duty_id: String,
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
    pub duration_hours: f64,
    /// IATA code of where the pilot spends the rest.
    pub location_code: String,
    pub location_tz: String,
    pub is_home_base: bool,
    pub rest_type: RestType,
    pub is_compliant: bool,
    pub required_rest_hours: f64,
    pub violations: Vec<String>,
    /// Complete 22:00-08:00 local nights contained in the rest.
    pub local_nights_covered: u32,
    pub disruption: RestDisruption,
}

/// Aggregate result of one roster analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyAnalysis {
    pub roster: Roster,
    pub duty_timelines: Vec<DutyTimeline>,
    pub rest_periods: Vec<RestPeriod>,
    /// Non-fatal findings raised during sleep inference.
    pub diagnostics: Vec<SleepDiagnostic>,
    /// Full inferred sleep history, ordered by start time.
    pub sleep_history: Vec<SleepBlock>,
    pub avg_sleep_per_night_hours: f64,
    pub max_sleep_debt_hours: f64,
    pub high_risk_duties: usize,
    pub critical_risk_duties: usize,
    pub extreme_risk_duties: usize,
    pub worst_duty_id: Option<String>,
    pub lowest_performance: Option<f64>,
    pub total_pinch_events: usize,
}

impl MonthlyAnalysis {
    /// Serialize the analysis to its JSON presentation form: ISO-8601 UTC
    /// timestamps, enumerations as lowercase snake_case strings.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
