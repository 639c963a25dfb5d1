pub mod roster;
pub mod sleep;
pub mod timeline;

#[cfg(test)]
#[path = "roster_tests.rs"]
mod roster_tests;

pub use roster::*;
pub use sleep::*;
pub use timeline::*;
