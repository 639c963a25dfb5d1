//! Inferred sleep model: sleep blocks and generation diagnostics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a sleep episode takes place. Drives the base efficiency of the
/// quality calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepEnvironment {
    Home,
    Hotel,
    AirportHotel,
    CrewRest,
    CrewHouse,
}

impl SleepEnvironment {
    pub fn as_str(&self) -> &'static str {
        match self {
            SleepEnvironment::Home => "home",
            SleepEnvironment::Hotel => "hotel",
            SleepEnvironment::AirportHotel => "airport_hotel",
            SleepEnvironment::CrewRest => "crew_rest",
            SleepEnvironment::CrewHouse => "crew_house",
        }
    }
}

/// Role of a sleep block within the inferred pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepType {
    Main,
    Nap,
    Anchor,
    Inflight,
    Recovery,
}

impl SleepType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SleepType::Main => "main",
            SleepType::Nap => "nap",
            SleepType::Anchor => "anchor",
            SleepType::Inflight => "inflight",
            SleepType::Recovery => "recovery",
        }
    }
}

/// One inferred sleep episode.
///
/// Blocks are created only by the sleep-strategy dispatcher and the roster
/// simulator's recovery generation; once appended to the sleep history they
/// are never mutated. `location_tz` is the timezone the pilot is physically
/// in when the sleep begins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleepBlock {
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
    /// IANA timezone at the sleep location.
    pub location_tz: String,
    pub environment: SleepEnvironment,
    pub sleep_type: SleepType,
    /// Confidence that the pilot actually slept like this, 0-1.
    pub confidence: f64,
    /// Raw interval length in hours.
    pub duration_hours: f64,
    /// Quality-adjusted hours credited by the sleep-quality calculator.
    pub effective_hours: f64,
}

impl SleepBlock {
    /// Build a block with derived duration. Effective hours start equal to
    /// the raw duration and are settled by the quality calculator.
    pub fn new(
        start_utc: DateTime<Utc>,
        end_utc: DateTime<Utc>,
        location_tz: impl Into<String>,
        environment: SleepEnvironment,
        sleep_type: SleepType,
        confidence: f64,
    ) -> Self {
        let duration_hours = (end_utc - start_utc).num_seconds() as f64 / 3600.0;
        Self {
            start_utc,
            end_utc,
            location_tz: location_tz.into(),
            environment,
            sleep_type,
            confidence,
            duration_hours,
            effective_hours: duration_hours,
        }
    }

    /// True when this block overlaps `[start, end)`.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start_utc < end && start < self.end_utc
    }
}

/// Severity attached to sleep-generation diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticSeverity {
    Info,
    Moderate,
    High,
    Critical,
}

/// Non-fatal finding raised while inferring sleep (truncated or dropped
/// blocks, tight turnarounds, disrupted circadian timing). Collected into
/// the analysis result rather than logged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleepDiagnostic {
    /// Duty the diagnostic is associated with, when applicable.
    pub duty_id: Option<String>,
    pub severity: DiagnosticSeverity,
    pub message: String,
}

impl SleepDiagnostic {
    pub fn new(
        duty_id: Option<String>,
        severity: DiagnosticSeverity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            duty_id,
            severity,
            message: message.into(),
        }
    }
}
