//! Model parameter bundle.
//!
//! All tunables of the fatigue model live here, grouped by concern and
//! threaded through the simulation as an immutable reference. Four factory
//! presets are provided: [`ModelParameters::default_preset`],
//! [`ModelParameters::conservative`], [`ModelParameters::liberal`] and
//! [`ModelParameters::research`].
//!
//! Scientific anchors: Borbély & Achermann (1999), Jewett & Kronauer (1999),
//! Van Dongen et al. (2003), Signal et al. (2013), Roach et al. (2012).

use serde::{Deserialize, Serialize};

use crate::models::{RiskLevel, SleepEnvironment};

/// Process S (homeostatic sleep pressure) constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomeostaticParams {
    /// Upper asymptote of sleep pressure.
    pub s_max: f64,
    /// Lower asymptote of sleep pressure.
    pub s_min: f64,
    /// Build-up time constant while awake, hours (Jewett & Kronauer 1999).
    pub tau_wake_hours: f64,
    /// Decay time constant while asleep, hours.
    pub tau_sleep_hours: f64,
    /// Daily sleep need used by the debt ledger, hours.
    pub baseline_sleep_need_hours: f64,
}

impl Default for HomeostaticParams {
    fn default() -> Self {
        Self {
            s_max: 1.0,
            s_min: 0.0,
            tau_wake_hours: 18.2,
            tau_sleep_hours: 4.2,
            baseline_sleep_need_hours: 8.0,
        }
    }
}

/// Process C (circadian rhythm) constants.
///
/// The configured acrophase and amplitude are adjusted before use:
/// pilot duty performance peaks slightly earlier than the core body
/// temperature acrophase, and trough sensitivity is damped a little for
/// operational realism. Both adjustments are explicit named fields rather
/// than buried constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircadianParams {
    /// Configured acrophase (time of peak alertness), hours of local day.
    pub acrophase_hours: f64,
    /// Operational shift applied to the acrophase, hours (negative = earlier).
    pub acrophase_adjustment_hours: f64,
    /// Configured amplitude of the cosine component.
    pub amplitude: f64,
    /// Operational lift applied to the amplitude.
    pub amplitude_adjustment: f64,
    /// Period of the rhythm, hours.
    pub period_hours: f64,
    /// WOCL window start, local hour (inclusive).
    pub wocl_start_hour: u32,
    /// WOCL window end, local hour (exclusive). 02:00..06:00 covers the
    /// regulatory 02:00-05:59 definition.
    pub wocl_end_hour: u32,
}

impl CircadianParams {
    /// Acrophase actually used by the evaluator.
    pub fn effective_acrophase(&self) -> f64 {
        self.acrophase_hours + self.acrophase_adjustment_hours
    }

    /// Amplitude actually used by the evaluator.
    pub fn effective_amplitude(&self) -> f64 {
        self.amplitude + self.amplitude_adjustment
    }

    /// Width of the WOCL window in hours.
    pub fn wocl_window_hours(&self) -> f64 {
        f64::from(self.wocl_end_hour - self.wocl_start_hour)
    }
}

impl Default for CircadianParams {
    fn default() -> Self {
        Self {
            acrophase_hours: 17.0,
            acrophase_adjustment_hours: -1.0,
            amplitude: 0.5,
            amplitude_adjustment: 0.05,
            period_hours: 24.0,
            wocl_start_hour: 2,
            wocl_end_hour: 6,
        }
    }
}

/// Process W (sleep inertia) constants (Tassi & Muzet 2000).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InertiaParams {
    /// How long inertia lasts after waking, minutes.
    pub duration_minutes: f64,
    /// Peak inertia magnitude on the 0-1 alertness scale.
    pub max_magnitude: f64,
    /// Extra magnitude applied when waking in the circadian trough.
    /// The per-wake multiplier ranges from 1.0 (waking at peak) to
    /// `1.0 + trough_scaling` (waking at trough).
    pub trough_scaling: f64,
}

impl Default for InertiaParams {
    fn default() -> Self {
        Self {
            duration_minutes: 30.0,
            max_magnitude: 0.30,
            trough_scaling: 0.5,
        }
    }
}

/// Weights and rates for the performance integration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationParams {
    /// Weight of the homeostatic alertness component.
    pub weight_homeostatic: f64,
    /// Weight of the circadian alertness component.
    pub weight_circadian: f64,
    /// Linear alertness decrement per hour on duty (Folkard & Åkerstedt 1999).
    pub time_on_task_rate: f64,
    /// Floor of the 0-100 performance scale.
    pub performance_floor: f64,
}

impl Default for IntegrationParams {
    fn default() -> Self {
        Self {
            weight_homeostatic: 0.6,
            weight_circadian: 0.4,
            time_on_task_rate: 0.008,
            performance_floor: 20.0,
        }
    }
}

/// Sleep debt ledger constants.
///
/// Accumulation is driven by *raw* slept duration against a need scaled by
/// days elapsed; decay is exponential (half-life ~1.4 days at 0.5/day).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleepDebtParams {
    /// Exponential decay rate, per day.
    pub decay_rate_per_day: f64,
}

impl Default for SleepDebtParams {
    fn default() -> Self {
        Self {
            decay_rate_per_day: 0.5,
        }
    }
}

/// Circadian adaptation rates for timezone shifts (Waterhouse et al. 2007).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaptationRates {
    /// Phase delay rate (travelling west), hours of acrophase movement/day.
    pub westward_hours_per_day: f64,
    /// Phase advance rate (travelling east), hours/day.
    pub eastward_hours_per_day: f64,
    /// Residual offset below which the clock counts as fully adapted, hours.
    pub adaptation_threshold_hours: f64,
}

impl AdaptationRates {
    /// Rate applicable for a signed phase difference (target - current).
    pub fn rate_for(&self, phase_diff_hours: f64) -> f64 {
        if phase_diff_hours < 0.0 {
            self.westward_hours_per_day
        } else {
            self.eastward_hours_per_day
        }
    }
}

impl Default for AdaptationRates {
    fn default() -> Self {
        Self {
            westward_hours_per_day: 1.5,
            eastward_hours_per_day: 1.0,
            adaptation_threshold_hours: 0.5,
        }
    }
}

/// Sleep quality multipliers.
///
/// Base efficiencies follow PSG measurements in Signal et al. (2013):
/// hotel 88%, inflight crew rest 70%. The remaining factors are
/// multiplicative modifiers combined by the quality calculator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleepQualityParams {
    pub efficiency_home: f64,
    pub efficiency_hotel: f64,
    pub efficiency_airport_hotel: f64,
    pub efficiency_crew_rest: f64,
    pub efficiency_crew_house: f64,
    /// Maximum efficiency reduction when sleep lies fully outside the WOCL.
    pub max_misalignment_penalty: f64,
    /// Floor of the combined non-base factor product.
    pub combined_factor_floor: f64,
    /// Ceiling of the combined non-base factor product.
    pub combined_factor_ceiling: f64,
    /// Longest biologically plausible single sleep episode, hours.
    pub max_realistic_sleep_hours: f64,
}

impl SleepQualityParams {
    /// Base efficiency for a sleep environment.
    pub fn base_efficiency(&self, environment: SleepEnvironment) -> f64 {
        match environment {
            SleepEnvironment::Home => self.efficiency_home,
            SleepEnvironment::Hotel => self.efficiency_hotel,
            SleepEnvironment::AirportHotel => self.efficiency_airport_hotel,
            SleepEnvironment::CrewRest => self.efficiency_crew_rest,
            SleepEnvironment::CrewHouse => self.efficiency_crew_house,
        }
    }
}

impl Default for SleepQualityParams {
    fn default() -> Self {
        Self {
            efficiency_home: 0.95,
            efficiency_hotel: 0.88,
            efficiency_airport_hotel: 0.85,
            efficiency_crew_rest: 0.70,
            efficiency_crew_house: 0.90,
            max_misalignment_penalty: 0.15,
            combined_factor_floor: 0.65,
            combined_factor_ceiling: 1.10,
            max_realistic_sleep_hours: 10.0,
        }
    }
}

/// Performance thresholds on the 0-100 scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskThresholds {
    pub low_min: f64,
    pub moderate_min: f64,
    pub high_min: f64,
    pub critical_min: f64,
}

impl RiskThresholds {
    /// Classify a performance score.
    pub fn classify(&self, performance: f64) -> RiskLevel {
        if performance >= self.low_min {
            RiskLevel::Low
        } else if performance >= self.moderate_min {
            RiskLevel::Moderate
        } else if performance >= self.high_min {
            RiskLevel::High
        } else if performance >= self.critical_min {
            RiskLevel::Critical
        } else {
            RiskLevel::Extreme
        }
    }
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            low_min: 75.0,
            moderate_min: 65.0,
            high_min: 55.0,
            critical_min: 45.0,
        }
    }
}

/// EASA ORO.FTL.235 rest rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestRules {
    /// Minimum rest at home base, hours.
    pub minimum_rest_home_hours: f64,
    /// Minimum rest away from base, hours.
    pub minimum_rest_away_hours: f64,
    /// Local night window start, local hour.
    pub local_night_start_hour: u32,
    /// Local night window end, local hour.
    pub local_night_end_hour: u32,
    /// Non-sleep overhead deducted from away rest (transit, meals), hours.
    pub sleep_opportunity_overhead_hours: f64,
    /// Minimum sleep opportunity after overhead, hours.
    pub sleep_opportunity_min_hours: f64,
    /// Rolling window for the recurrent rest requirement, hours.
    pub recurrent_window_hours: f64,
    /// Minimum duration of a recurrent rest, hours.
    pub recurrent_rest_min_hours: f64,
    /// Number of 00:00-05:00 home-local periods a recurrent rest must span.
    pub recurrent_night_periods: u32,
}

impl Default for RestRules {
    fn default() -> Self {
        Self {
            minimum_rest_home_hours: 12.0,
            minimum_rest_away_hours: 10.0,
            local_night_start_hour: 22,
            local_night_end_hour: 8,
            sleep_opportunity_overhead_hours: 3.0,
            sleep_opportunity_min_hours: 8.0,
            recurrent_window_hours: 168.0,
            recurrent_rest_min_hours: 36.0,
            recurrent_night_periods: 2,
        }
    }
}

/// Master parameter container threaded through every computation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelParameters {
    pub homeostatic: HomeostaticParams,
    pub circadian: CircadianParams,
    pub inertia: InertiaParams,
    pub integration: IntegrationParams,
    pub sleep_debt: SleepDebtParams,
    pub adaptation: AdaptationRates,
    pub sleep_quality: SleepQualityParams,
    pub risk: RiskThresholds,
    pub rest: RestRules,
}

/// Named preset identifiers accepted by [`ModelParameters::preset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    Default,
    Conservative,
    Liberal,
    Research,
}

impl ModelParameters {
    /// Operational defaults.
    pub fn default_preset() -> Self {
        Self::default()
    }

    /// Resolve a named preset.
    pub fn preset(preset: Preset) -> Self {
        match preset {
            Preset::Default => Self::default_preset(),
            Preset::Conservative => Self::conservative(),
            Preset::Liberal => Self::liberal(),
            Preset::Research => Self::research(),
        }
    }

    /// Safety-first analysis: faster pressure build-up, slower recovery,
    /// higher sleep need, stronger inertia, tighter risk thresholds.
    pub fn conservative() -> Self {
        Self {
            homeostatic: HomeostaticParams {
                tau_wake_hours: 16.0,
                tau_sleep_hours: 4.8,
                baseline_sleep_need_hours: 8.5,
                ..HomeostaticParams::default()
            },
            inertia: InertiaParams {
                duration_minutes: 40.0,
                max_magnitude: 0.35,
                ..InertiaParams::default()
            },
            adaptation: AdaptationRates {
                westward_hours_per_day: 1.0,
                eastward_hours_per_day: 0.7,
                ..AdaptationRates::default()
            },
            sleep_quality: SleepQualityParams {
                efficiency_hotel: 0.80,
                efficiency_airport_hotel: 0.75,
                efficiency_crew_rest: 0.60,
                max_misalignment_penalty: 0.20,
                ..SleepQualityParams::default()
            },
            risk: RiskThresholds {
                low_min: 80.0,
                moderate_min: 70.0,
                high_min: 60.0,
                critical_min: 50.0,
            },
            ..Self::default()
        }
    }

    /// Relaxed thresholds for experienced-crew, low-risk route analysis.
    pub fn liberal() -> Self {
        Self {
            homeostatic: HomeostaticParams {
                tau_wake_hours: 20.0,
                tau_sleep_hours: 3.8,
                baseline_sleep_need_hours: 7.5,
                ..HomeostaticParams::default()
            },
            inertia: InertiaParams {
                duration_minutes: 20.0,
                max_magnitude: 0.25,
                ..InertiaParams::default()
            },
            adaptation: AdaptationRates {
                westward_hours_per_day: 1.8,
                eastward_hours_per_day: 1.2,
                ..AdaptationRates::default()
            },
            risk: RiskThresholds {
                low_min: 70.0,
                moderate_min: 60.0,
                high_min: 50.0,
                critical_min: 40.0,
            },
            ..Self::default()
        }
    }

    /// Textbook two-process parameters for academic comparison: no
    /// operational acrophase shift or amplitude lift, balanced weights.
    pub fn research() -> Self {
        Self {
            circadian: CircadianParams {
                acrophase_adjustment_hours: 0.0,
                amplitude_adjustment: 0.0,
                ..CircadianParams::default()
            },
            integration: IntegrationParams {
                weight_homeostatic: 0.5,
                weight_circadian: 0.5,
                ..IntegrationParams::default()
            },
            ..Self::default()
        }
    }
}
