//! Computation layer of the fatigue core.
//!
//! Services are pure functions over the data model: time and WOCL
//! utilities, the sleep-quality calculator, the sleep-strategy dispatcher,
//! the three-process evaluator, the per-duty and per-roster simulators and
//! the EASA compliance checks.

pub mod compliance;

pub mod duty_simulator;

pub mod roster_simulator;

pub mod sleep_quality;

pub mod sleep_strategies;

pub mod three_process;

pub mod wocl;

pub use duty_simulator::flight_phase;
pub use roster_simulator::simulate_roster;
pub use sleep_strategies::{select_strategy, StrategyKind};
pub use wocl::{duty_crosses_wocl, interval_overlap_hours, wocl_overlap_hours};
