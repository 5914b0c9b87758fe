//! Priority dispatch queue.
//!
//! Patients are served by tier rank, then by arrival order within a tier.

mod capacity;
mod dispatch;

pub use capacity::*;
pub use dispatch::*;

use thiserror::Error;

use crate::models::ValidationError;

/// Queue operation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueueError {
    #[error("Invalid patient: {0}")]
    Validation(#[from] ValidationError),

    #[error("{scope} is full (limit {limit})")]
    CapacityExceeded { scope: CapacityScope, limit: usize },

    #[error("Patient not found: {0}")]
    NotFound(String),

    #[error("{name} is {age}, too young for the senior tier")]
    SeniorAgeRequirement { name: String, age: u32 },

    #[error("Invalid age range: {min} > {max}")]
    InvalidRange { min: u32, max: u32 },

    #[error("A patient named '{0}' is already waiting")]
    DuplicateName(String),

    #[error("Note text cannot be empty")]
    EmptyNote,
}

pub type QueueResult<T> = Result<T, QueueError>;
