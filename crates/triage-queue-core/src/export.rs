//! Queue snapshot for display.
//!
//! A read-only dump of everything a front desk screen needs to render the
//! queue. Not a persistence format: nothing reads it back.

use serde::{Deserialize, Serialize};

use crate::models::{PatientRecord, Tier};
use crate::queue::{CapacityReport, IntakeQueue};
use crate::stats::QueueStats;

/// Display view of one waiting patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientSummary {
    pub id: String,
    pub name: String,
    pub age: u32,
    pub birthdate: String,
    pub tier: Tier,
    /// 1-based place in the overall line
    pub position: usize,
    pub arrived_at: String,
    pub latest_note: Option<String>,
    pub note_count: usize,
}

impl PatientSummary {
    fn from_record(record: &PatientRecord, position: usize) -> Self {
        Self {
            id: record.id().to_string(),
            name: record.name().to_string(),
            age: record.age(),
            birthdate: record.birthdate().to_string(),
            tier: record.tier(),
            position,
            arrived_at: record.arrived_at().to_rfc3339(),
            latest_note: Some(record.latest_note())
                .filter(|n| !n.is_empty())
                .map(str::to_string),
            note_count: record.notes().len(),
        }
    }
}

/// Patients of one tier, in dispatch order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TierSnapshot {
    pub tier: Tier,
    pub label: String,
    pub icon: String,
    pub patients: Vec<PatientSummary>,
}

/// Full queue dump.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueueSnapshot {
    pub generated_at: String,
    pub next_patient: Option<String>,
    pub tiers: Vec<TierSnapshot>,
    pub stats: QueueStats,
    pub capacity: CapacityReport,
}

impl QueueSnapshot {
    /// Capture the current state of a queue.
    pub fn capture(queue: &IntakeQueue) -> Self {
        let summaries: Vec<PatientSummary> = queue
            .patients()
            .iter()
            .enumerate()
            .map(|(idx, p)| PatientSummary::from_record(p, idx + 1))
            .collect();

        let tiers = Tier::ALL
            .iter()
            .map(|&tier| TierSnapshot {
                tier,
                label: tier.label().to_string(),
                icon: tier.icon().to_string(),
                patients: summaries.iter().filter(|s| s.tier == tier).cloned().collect(),
            })
            .collect();

        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            next_patient: queue.peek_next().map(|p| p.name().to_string()),
            tiers,
            stats: queue.stats(),
            capacity: queue.capacity_report(),
        }
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn tier(&self, tier: Tier) -> Option<&TierSnapshot> {
        self.tiers.iter().find(|t| t.tier == tier)
    }
}

impl IntakeQueue {
    /// Capture a display snapshot of the queue.
    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot::capture(self)
    }
}
