//! Triage-Queue Core Library
//!
//! Walk-in patient intake with tiered priority dispatch.
//!
//! # Architecture
//!
//! ```text
//! Intake desk → IntakeRequest → TierPolicy::classify
//!                                     │
//!                       ┌─────────────▼─────────────┐
//!                       │        IntakeQueue        │
//!                       │  capacity check (tier +   │
//!                       │  total) → sorted insert   │
//!                       │  key = (rank, arrival #)  │
//!                       └──────┬──────────────┬─────┘
//!                              │              │
//!                      dequeue / peek    AdminOperations
//!                              │         (plan → confirm → execute)
//!                              ▼              │
//!                        StatsCollector ◄─────┘
//!                              │
//!                              ▼
//!                        QueueSnapshot (JSON for display)
//! ```
//!
//! # Dispatch Rule
//!
//! **Emergency before Senior before Regular; first come, first served within
//! a tier.** A reassigned patient keeps their original arrival order.
//!
//! # Modules
//!
//! - [`config`]: Capacity limits and thresholds (TOML)
//! - [`models`]: Domain types (PatientRecord, Tier, TierPolicy, IntakeRequest)
//! - [`queue`]: The dispatch engine and capacity reporting
//! - [`stats`]: Day counters, average age, tier composition
//! - [`admin`]: Confirmed bulk clears and record edits
//! - [`export`]: Display snapshot

pub mod admin;
pub mod config;
pub mod export;
pub mod models;
pub mod queue;
pub mod stats;

// Re-export commonly used types
pub use admin::{AdminOperations, AdminOutcome, Confirmation, PlannedAction};
pub use config::QueueConfig;
pub use export::QueueSnapshot;
pub use models::{IntakeRequest, NoteEntry, PatientRecord, Tier, TierPolicy, ValidationError};
pub use queue::{CapacityLevel, CapacityReport, CapacityScope, IntakeQueue, QueueError, TierChange};
pub use stats::{QueueStats, StatsCollector, TierComposition};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum TriageQueueError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Capacity exceeded: {0}")]
    CapacityExceeded(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Lock error: {0}")]
    LockError(String),
}

impl From<QueueError> for TriageQueueError {
    fn from(e: QueueError) -> Self {
        match e {
            QueueError::Validation(_) => TriageQueueError::ValidationError(e.to_string()),
            QueueError::CapacityExceeded { .. } => TriageQueueError::CapacityExceeded(e.to_string()),
            QueueError::NotFound(name) => TriageQueueError::NotFound(name),
            QueueError::SeniorAgeRequirement { .. }
            | QueueError::InvalidRange { .. }
            | QueueError::DuplicateName(_)
            | QueueError::EmptyNote => TriageQueueError::InvalidInput(e.to_string()),
        }
    }
}

impl From<ValidationError> for TriageQueueError {
    fn from(e: ValidationError) -> Self {
        TriageQueueError::ValidationError(e.to_string())
    }
}

impl From<config::ConfigError> for TriageQueueError {
    fn from(e: config::ConfigError) -> Self {
        TriageQueueError::ConfigError(e.to_string())
    }
}

impl From<serde_json::Error> for TriageQueueError {
    fn from(e: serde_json::Error) -> Self {
        TriageQueueError::SerializationError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for TriageQueueError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        TriageQueueError::LockError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Create a queue with the standard limits.
#[uniffi::export]
pub fn open_queue() -> Arc<TriageQueueService> {
    Arc::new(TriageQueueService::new(IntakeQueue::with_defaults()))
}

/// Create a queue from a TOML configuration document.
#[uniffi::export]
pub fn open_queue_with_config(config_toml: String) -> Result<Arc<TriageQueueService>, TriageQueueError> {
    let config = QueueConfig::from_toml_str(&config_toml)?;
    Ok(Arc::new(TriageQueueService::new(IntakeQueue::new(config))))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe queue wrapper for FFI.
///
/// Each call holds the lock for its whole duration, so multi-step changes
/// are never seen half-applied. Edit methods commit immediately; the caller
/// is expected to have confirmed with the operator first.
#[derive(uniffi::Object)]
pub struct TriageQueueService {
    queue: Arc<Mutex<IntakeQueue>>,
}

impl TriageQueueService {
    /// Wrap an existing queue.
    pub fn new(queue: IntakeQueue) -> Self {
        Self {
            queue: Arc::new(Mutex::new(queue)),
        }
    }
}

#[uniffi::export]
impl TriageQueueService {
    // =========================================================================
    // Intake & Dispatch
    // =========================================================================

    /// Classify and admit a patient. `birthdate` is `YYYY-MM-DD`.
    pub fn admit(
        &self,
        name: String,
        age: u32,
        birthdate: String,
        is_emergency: bool,
        note: Option<String>,
    ) -> Result<FfiPatient, TriageQueueError> {
        let request = intake_request(name, age, &birthdate, is_emergency, note)?;
        let mut queue = self.queue.lock()?;
        let record = queue.admit(request)?;
        Ok(record.into())
    }

    /// Admit as emergency regardless of capacity.
    pub fn admit_emergency_override(
        &self,
        name: String,
        age: u32,
        birthdate: String,
        note: Option<String>,
    ) -> Result<FfiPatient, TriageQueueError> {
        let request = intake_request(name, age, &birthdate, true, note)?;
        let mut queue = self.queue.lock()?;
        let record = queue.admit_emergency_override(request)?;
        Ok(record.into())
    }

    /// Call the next patient.
    pub fn dequeue(&self) -> Result<Option<FfiPatient>, TriageQueueError> {
        let mut queue = self.queue.lock()?;
        Ok(queue.dequeue().as_ref().map(FfiPatient::from))
    }

    /// The next patient, without calling them.
    pub fn peek_next(&self) -> Result<Option<FfiPatient>, TriageQueueError> {
        let queue = self.queue.lock()?;
        Ok(queue.peek_next().map(FfiPatient::from))
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Find a patient by exact name (first in dispatch order).
    pub fn find_patient(&self, name: String) -> Result<Option<FfiPatient>, TriageQueueError> {
        let queue = self.queue.lock()?;
        Ok(queue.find_by_exact_name(&name).map(FfiPatient::from))
    }

    /// Search patients by name substring.
    pub fn search_patients(&self, query: String) -> Result<Vec<FfiPatient>, TriageQueueError> {
        let queue = self.queue.lock()?;
        Ok(queue.search(&query).into_iter().map(FfiPatient::from).collect())
    }

    /// Names resembling `query`, best first.
    pub fn suggest_names(&self, query: String, limit: u32) -> Result<Vec<String>, TriageQueueError> {
        let queue = self.queue.lock()?;
        Ok(queue.suggest_names(&query, limit as usize))
    }

    /// Patients of one tier in dispatch order.
    pub fn patients_in_tier(&self, tier: FfiTier) -> Result<Vec<FfiPatient>, TriageQueueError> {
        let queue = self.queue.lock()?;
        Ok(queue
            .patients_in_tier(tier.into())
            .into_iter()
            .map(FfiPatient::from)
            .collect())
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Remove a patient by name. Returns false if nobody matched.
    pub fn remove_patient(&self, name: String) -> Result<bool, TriageQueueError> {
        let mut queue = self.queue.lock()?;
        Ok(queue.remove(&name))
    }

    /// Move a patient to another tier. Returns false if already there.
    pub fn reassign_tier(&self, name: String, tier: FfiTier) -> Result<bool, TriageQueueError> {
        let mut queue = self.queue.lock()?;
        let change = queue.reassign_tier(&name, tier.into())?;
        Ok(matches!(change, TierChange::Changed { .. }))
    }

    pub fn add_note(&self, name: String, text: String) -> Result<(), TriageQueueError> {
        let mut queue = self.queue.lock()?;
        queue.add_note(&name, &text)?;
        Ok(())
    }

    pub fn rename_patient(&self, name: String, new_name: String) -> Result<(), TriageQueueError> {
        let mut queue = self.queue.lock()?;
        let mut admin = AdminOperations::new(&mut queue);
        let plan = admin.plan_rename(&name, &new_name)?;
        admin.execute(plan, Confirmation::Confirmed)?;
        Ok(())
    }

    /// Correct a patient's age. Returns a suggested tier when the new age
    /// crosses the senior threshold; the tier itself is left alone.
    pub fn update_age(&self, name: String, age: u32) -> Result<Option<FfiTier>, TriageQueueError> {
        let mut queue = self.queue.lock()?;
        let mut admin = AdminOperations::new(&mut queue);
        let plan = admin.plan_change_age(&name, age)?;
        match admin.execute(plan, Confirmation::Confirmed)? {
            AdminOutcome::AgeChanged { suggested_tier, .. } => Ok(suggested_tier.map(FfiTier::from)),
            _ => Ok(None),
        }
    }

    pub fn update_birthdate(&self, name: String, birthdate: String) -> Result<(), TriageQueueError> {
        let date = parse_date(&birthdate)?;
        let mut queue = self.queue.lock()?;
        let mut admin = AdminOperations::new(&mut queue);
        let plan = admin.plan_change_birthdate(&name, date)?;
        admin.execute(plan, Confirmation::Confirmed)?;
        Ok(())
    }

    // =========================================================================
    // Bulk Operations
    // =========================================================================

    pub fn clear_tier(&self, tier: FfiTier) -> Result<Vec<String>, TriageQueueError> {
        let mut queue = self.queue.lock()?;
        Ok(queue.clear_tier(tier.into()))
    }

    pub fn clear_all(&self) -> Result<Vec<String>, TriageQueueError> {
        let mut queue = self.queue.lock()?;
        Ok(queue.clear_all())
    }

    pub fn clear_by_age_range(&self, min: u32, max: u32) -> Result<Vec<String>, TriageQueueError> {
        let mut queue = self.queue.lock()?;
        Ok(queue.clear_by_age_range(min, max)?)
    }

    /// Names of patients aged `min..=max`, for confirmation prompts.
    pub fn preview_age_range(&self, min: u32, max: u32) -> Result<Vec<String>, TriageQueueError> {
        let queue = self.queue.lock()?;
        Ok(queue
            .patients_in_age_range(min, max)?
            .into_iter()
            .map(|p| p.name().to_string())
            .collect())
    }

    // =========================================================================
    // Counts & Statistics
    // =========================================================================

    pub fn count_by_tier(&self, tier: FfiTier) -> Result<u32, TriageQueueError> {
        let queue = self.queue.lock()?;
        Ok(queue.count_by_tier(tier.into()) as u32)
    }

    pub fn total_count(&self) -> Result<u32, TriageQueueError> {
        let queue = self.queue.lock()?;
        Ok(queue.total_count() as u32)
    }

    pub fn get_stats(&self) -> Result<FfiQueueStats, TriageQueueError> {
        let queue = self.queue.lock()?;
        Ok(queue.stats().into())
    }

    pub fn capacity_report(&self) -> Result<Vec<FfiTierCapacity>, TriageQueueError> {
        let queue = self.queue.lock()?;
        let report = queue.capacity_report();
        Ok(report
            .tiers
            .iter()
            .map(|u| FfiTierCapacity {
                tier: match u.scope {
                    CapacityScope::Tier(tier) => Some(tier.into()),
                    CapacityScope::Total => None,
                },
                current: u.current as u32,
                max: u.max as u32,
                level: format!("{:?}", u.level),
            })
            .chain(std::iter::once(FfiTierCapacity {
                tier: None,
                current: report.total.current as u32,
                max: report.total.max as u32,
                level: format!("{:?}", report.total.level),
            }))
            .collect())
    }

    pub fn reset_daily_stats(&self) -> Result<(), TriageQueueError> {
        let mut queue = self.queue.lock()?;
        queue.reset_daily_stats();
        Ok(())
    }

    /// Export the full queue as JSON.
    pub fn export_snapshot_json(&self) -> Result<String, TriageQueueError> {
        let queue = self.queue.lock()?;
        Ok(queue.snapshot().to_json()?)
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, TriageQueueError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| TriageQueueError::InvalidInput(format!("Invalid date '{}': {}", s, e)))
}

fn intake_request(
    name: String,
    age: u32,
    birthdate: &str,
    is_emergency: bool,
    note: Option<String>,
) -> Result<IntakeRequest, TriageQueueError> {
    let mut request = IntakeRequest::new(name, age, parse_date(birthdate)?, is_emergency);
    request.note = note;
    Ok(request)
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiTier {
    Emergency,
    Senior,
    Regular,
}

impl From<Tier> for FfiTier {
    fn from(tier: Tier) -> Self {
        match tier {
            Tier::Emergency => FfiTier::Emergency,
            Tier::Senior => FfiTier::Senior,
            Tier::Regular => FfiTier::Regular,
        }
    }
}

impl From<FfiTier> for Tier {
    fn from(tier: FfiTier) -> Self {
        match tier {
            FfiTier::Emergency => Tier::Emergency,
            FfiTier::Senior => Tier::Senior,
            FfiTier::Regular => Tier::Regular,
        }
    }
}

/// FFI-safe patient.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub id: String,
    pub name: String,
    pub age: u32,
    pub birthdate: String,
    pub tier: FfiTier,
    pub arrival_seq: u64,
    pub arrived_at: String,
    pub latest_note: String,
    pub note_history: String,
}

impl From<&PatientRecord> for FfiPatient {
    fn from(record: &PatientRecord) -> Self {
        Self {
            id: record.id().to_string(),
            name: record.name().to_string(),
            age: record.age(),
            birthdate: record.birthdate().to_string(),
            tier: record.tier().into(),
            arrival_seq: record.arrival_seq(),
            arrived_at: record.arrived_at().to_rfc3339(),
            latest_note: record.latest_note().to_string(),
            note_history: record.formatted_history(),
        }
    }
}

/// FFI-safe statistics report.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiQueueStats {
    pub waiting: u32,
    pub emergency_waiting: u32,
    pub senior_waiting: u32,
    pub regular_waiting: u32,
    pub total_today: u64,
    pub emergencies_today: u64,
    pub dispatched_today: u64,
    pub average_age: Option<f64>,
    pub emergency_percent: Option<f64>,
    pub senior_percent: Option<f64>,
    pub regular_percent: Option<f64>,
}

impl From<QueueStats> for FfiQueueStats {
    fn from(stats: QueueStats) -> Self {
        Self {
            waiting: stats.waiting as u32,
            emergency_waiting: stats.emergency_waiting as u32,
            senior_waiting: stats.senior_waiting as u32,
            regular_waiting: stats.regular_waiting as u32,
            total_today: stats.total_today,
            emergencies_today: stats.emergencies_today,
            dispatched_today: stats.dispatched_today,
            average_age: stats.average_age,
            emergency_percent: stats.composition.map(|c| c.emergency),
            senior_percent: stats.composition.map(|c| c.senior),
            regular_percent: stats.composition.map(|c| c.regular),
        }
    }
}

/// FFI-safe capacity entry. `tier` is `None` for the overall limit.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTierCapacity {
    pub tier: Option<FfiTier>,
    pub current: u32,
    pub max: u32,
    pub level: String,
}
