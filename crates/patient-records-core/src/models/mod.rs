//! Domain models for the patient-records system.

mod candidate;
mod patient;

pub use candidate::*;
pub use patient::*;
