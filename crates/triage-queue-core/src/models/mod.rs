//! Domain models for the triage queue.

mod patient;
mod tier;

pub use patient::*;
pub use tier::*;
