//! Roster input model: airports, flight segments, duties.
//!
//! These types are produced by an external roster parser and are immutable
//! once constructed. Every instant is UTC; local times are derived on
//! demand from the IANA timezone names carried alongside.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Immutable airport reference data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Airport {
    /// IATA code, e.g. "DOH".
    pub code: String,
    /// IANA timezone name, e.g. "Asia/Qatar".
    pub timezone: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Airport {
    pub fn new(
        code: impl Into<String>,
        timezone: impl Into<String>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            code: code.into(),
            timezone: timezone.into(),
            latitude,
            longitude,
        }
    }
}

/// One scheduled flight leg inside a duty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightSegment {
    pub flight_number: String,
    pub departure: Airport,
    pub arrival: Airport,
    pub scheduled_departure_utc: DateTime<Utc>,
    pub scheduled_arrival_utc: DateTime<Utc>,
    pub block_hours: f64,
}

impl FlightSegment {
    pub fn new(
        flight_number: impl Into<String>,
        departure: Airport,
        arrival: Airport,
        scheduled_departure_utc: DateTime<Utc>,
        scheduled_arrival_utc: DateTime<Utc>,
    ) -> Result<Self> {
        let flight_number = flight_number.into();
        if scheduled_arrival_utc <= scheduled_departure_utc {
            return Err(Error::validation(format!(
                "segment {flight_number} arrives at or before its departure"
            )));
        }
        let block_hours =
            (scheduled_arrival_utc - scheduled_departure_utc).num_seconds() as f64 / 3600.0;
        Ok(Self {
            flight_number,
            departure,
            arrival,
            scheduled_departure_utc,
            scheduled_arrival_utc,
            block_hours,
        })
    }
}

/// A duty period: report to release, containing one or more segments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Duty {
    pub duty_id: String,
    pub date: NaiveDate,
    pub report_utc: DateTime<Utc>,
    pub release_utc: DateTime<Utc>,
    pub segments: Vec<FlightSegment>,
    /// IANA timezone of the pilot's home base.
    pub home_base_tz: String,
}

impl Duty {
    /// Build a duty and enforce its structural invariants.
    ///
    /// If the source data places the report after the first departure (a
    /// common artifact of date-less roster rows around midnight), the
    /// report is shifted back one day rather than rejected.
    pub fn new(
        duty_id: impl Into<String>,
        date: NaiveDate,
        mut report_utc: DateTime<Utc>,
        release_utc: DateTime<Utc>,
        segments: Vec<FlightSegment>,
        home_base_tz: impl Into<String>,
    ) -> Result<Self> {
        let duty_id = duty_id.into();
        if segments.is_empty() {
            return Err(Error::validation(format!(
                "duty {duty_id} has no flight segments"
            )));
        }
        if let Some(first) = segments.first() {
            if report_utc > first.scheduled_departure_utc {
                report_utc -= Duration::days(1);
            }
        }
        let duty = Self {
            duty_id,
            date,
            report_utc,
            release_utc,
            segments,
            home_base_tz: home_base_tz.into(),
        };
        duty.validate()?;
        Ok(duty)
    }

    /// Check the invariants on an already-populated duty.
    pub fn validate(&self) -> Result<()> {
        if self.segments.is_empty() {
            return Err(Error::validation(format!(
                "duty {} has no flight segments",
                self.duty_id
            )));
        }
        if self.report_utc >= self.release_utc {
            return Err(Error::validation(format!(
                "duty {} reports at or after its release",
                self.duty_id
            )));
        }
        for segment in &self.segments {
            if segment.scheduled_arrival_utc <= segment.scheduled_departure_utc {
                return Err(Error::validation(format!(
                    "duty {} segment {} arrives at or before its departure",
                    self.duty_id, segment.flight_number
                )));
            }
        }
        for pair in self.segments.windows(2) {
            if pair[1].scheduled_departure_utc < pair[0].scheduled_arrival_utc {
                return Err(Error::validation(format!(
                    "duty {} segments {} and {} overlap",
                    self.duty_id, pair[0].flight_number, pair[1].flight_number
                )));
            }
        }
        if self.report_utc > self.segments[0].scheduled_departure_utc {
            return Err(Error::validation(format!(
                "duty {} reports after first departure",
                self.duty_id
            )));
        }
        if self.release_utc < self.segments[self.segments.len() - 1].scheduled_arrival_utc {
            return Err(Error::validation(format!(
                "duty {} releases before last arrival",
                self.duty_id
            )));
        }
        Ok(())
    }

    /// Total duty length in hours.
    pub fn duty_hours(&self) -> f64 {
        (self.release_utc - self.report_utc).num_seconds() as f64 / 3600.0
    }

    /// Flight duty period: report to last landing plus 30 minutes.
    /// Distinct from total duty hours.
    pub fn fdp_hours(&self) -> f64 {
        let last_arrival = self.segments[self.segments.len() - 1].scheduled_arrival_utc;
        ((last_arrival + Duration::minutes(30)) - self.report_utc).num_seconds() as f64 / 3600.0
    }

    pub fn departure_airport(&self) -> &Airport {
        &self.segments[0].departure
    }

    pub fn arrival_airport(&self) -> &Airport {
        &self.segments[self.segments.len() - 1].arrival
    }

    /// Number of sectors flown.
    pub fn sector_count(&self) -> usize {
        self.segments.len()
    }
}

/// A month of duties for one pilot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Roster {
    pub roster_id: String,
    pub pilot_id: String,
    pub year: i32,
    pub month: u32,
    /// Duties ordered by report time.
    pub duties: Vec<Duty>,
    /// IATA code of the home base.
    pub home_base: String,
    /// IANA timezone of the home base.
    pub home_base_tz: String,
}

impl Roster {
    /// Validate the whole roster: per-duty invariants, chronological order
    /// and absence of overlap between consecutive duties.
    pub fn validate(&self) -> Result<()> {
        if self.duties.is_empty() {
            return Err(Error::validation(format!(
                "roster {} contains no duties",
                self.roster_id
            )));
        }
        for duty in &self.duties {
            duty.validate()?;
        }
        for pair in self.duties.windows(2) {
            if pair[1].report_utc < pair[0].report_utc {
                return Err(Error::validation(format!(
                    "duties {} and {} are not in report-time order",
                    pair[0].duty_id, pair[1].duty_id
                )));
            }
            if pair[1].report_utc < pair[0].release_utc {
                return Err(Error::validation(format!(
                    "duties {} and {} overlap",
                    pair[0].duty_id, pair[1].duty_id
                )));
            }
        }
        Ok(())
    }
}
