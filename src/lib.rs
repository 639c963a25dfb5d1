//! # aerofatigue
//!
//! Biomathematical pilot fatigue simulation core.
//!
//! Given a normalized monthly roster (duties with report/release times and
//! flight segments), the crate infers when and how much the pilot slept,
//! propagates a three-process alertness model (homeostatic pressure,
//! circadian rhythm, sleep inertia) across the month at a fixed stride,
//! and emits a minute-resolution performance timeline with landing
//! performance, sleep debt, WOCL exposure, pinch events and EASA
//! ORO.FTL.235 rest-compliance findings.
//!
//! ## Architecture
//!
//! - [`models`]: the immutable input model (airports, segments, duties,
//!   rosters) and the simulation output model (performance points,
//!   duty timelines, rest periods, the monthly aggregate)
//! - [`params`]: the parameter bundle with the four factory presets
//! - [`services`]: the computation layer, from WOCL window arithmetic up
//!   to the roster simulator
//! - [`api`]: the single synchronous entry point, [`api::analyze`]
//!
//! ## Determinism
//!
//! One invocation analyzes one roster. The core holds no global state,
//! performs no I/O and uses a single accumulation order everywhere, so
//! identical inputs and parameters reproduce identical output. Independent
//! rosters can be analyzed on separate threads.

pub mod api;
pub mod error;
pub mod models;
pub mod params;
pub mod services;

pub use api::{analyze, AirportLookup, CancelToken};
pub use error::{Error, Result};
pub use models::{MonthlyAnalysis, Roster};
pub use params::{ModelParameters, Preset};
