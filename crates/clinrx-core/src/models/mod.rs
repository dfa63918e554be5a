//! Domain models for the ClinRx system.

mod analysis;
mod regimen;

pub use analysis::*;
pub use regimen::*;
