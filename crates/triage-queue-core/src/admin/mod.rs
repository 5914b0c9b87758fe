//! Administrative bulk actions and record edits.
//!
//! Destructive changes go through two steps: a `plan_*` call describes the
//! change and who it affects, then [`AdminOperations::execute`] commits it
//! only with [`Confirmation::Confirmed`]. Plans pin patients by id, so a
//! commit never touches anyone the operator was not shown.

mod bulk;
mod editor;

use chrono::NaiveDate;

use crate::models::{PatientRecord, Tier};
use crate::queue::{IntakeQueue, QueueError, QueueResult, TierChange};

/// Operator answer to a confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Cancelled,
}

impl Confirmation {
    /// Parse a typed answer: `confirm`/`cancel`, `y`/`n`, `yes`/`no`.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "confirm" | "y" | "yes" => Some(Confirmation::Confirmed),
            "cancel" | "n" | "no" => Some(Confirmation::Cancelled),
            _ => None,
        }
    }
}

impl From<bool> for Confirmation {
    fn from(confirmed: bool) -> Self {
        if confirmed {
            Confirmation::Confirmed
        } else {
            Confirmation::Cancelled
        }
    }
}

/// A change awaiting confirmation.
///
/// Bulk variants list the affected names for the prompt and the matching
/// ids for the commit, in the same order.
#[derive(Debug, Clone, PartialEq)]
pub enum PlannedAction {
    ClearTier { tier: Tier, affected: Vec<String>, patient_ids: Vec<String> },
    ClearAll { affected: Vec<String>, patient_ids: Vec<String> },
    ClearByAgeRange { min: u32, max: u32, affected: Vec<String>, patient_ids: Vec<String> },
    Rename { patient_id: String, from: String, to: String },
    ChangeAge { patient_id: String, name: String, from: u32, to: u32 },
    ChangeBirthdate { patient_id: String, name: String, from: NaiveDate, to: NaiveDate },
    ChangeTier { patient_id: String, name: String, from: Tier, to: Tier },
    AddNote { patient_id: String, name: String, text: String },
}

impl PlannedAction {
    /// One-line summary for the confirmation prompt.
    pub fn describe(&self) -> String {
        match self {
            PlannedAction::ClearTier { tier, affected, .. } => {
                format!("Remove {} patient(s) from the {}", affected.len(), tier.label())
            }
            PlannedAction::ClearAll { affected, .. } => {
                format!("Remove all {} patient(s) from every queue", affected.len())
            }
            PlannedAction::ClearByAgeRange { min, max, affected, .. } => {
                format!("Remove {} patient(s) aged {}-{}", affected.len(), min, max)
            }
            PlannedAction::Rename { from, to, .. } => {
                format!("Change name from '{}' to '{}'", from, to)
            }
            PlannedAction::ChangeAge { name, from, to, .. } => {
                format!("Change age of {} from {} to {}", name, from, to)
            }
            PlannedAction::ChangeBirthdate { name, from, to, .. } => {
                format!("Change birthday of {} from {} to {}", name, from, to)
            }
            PlannedAction::ChangeTier { name, from, to, .. } => {
                format!("Change patient type of {} from {} to {}", name, from, to)
            }
            PlannedAction::AddNote { name, text, .. } => {
                format!("Add note to {}: {}", name, text)
            }
        }
    }

    /// Names of the patients the action would remove.
    pub fn affected(&self) -> &[String] {
        match self {
            PlannedAction::ClearTier { affected, .. }
            | PlannedAction::ClearAll { affected, .. }
            | PlannedAction::ClearByAgeRange { affected, .. } => affected,
            _ => &[],
        }
    }

    /// True when committing would change nothing.
    pub fn is_noop(&self) -> bool {
        match self {
            PlannedAction::ClearTier { affected, .. }
            | PlannedAction::ClearAll { affected, .. }
            | PlannedAction::ClearByAgeRange { affected, .. } => affected.is_empty(),
            PlannedAction::Rename { from, to, .. } => from == to,
            PlannedAction::ChangeAge { from, to, .. } => from == to,
            PlannedAction::ChangeBirthdate { from, to, .. } => from == to,
            PlannedAction::ChangeTier { from, to, .. } => from == to,
            PlannedAction::AddNote { .. } => false,
        }
    }
}

/// Result of executing a planned action.
#[derive(Debug, Clone, PartialEq)]
pub enum AdminOutcome {
    /// The operator declined; nothing changed
    Cancelled,
    /// Names removed, in dispatch order
    Cleared(Vec<String>),
    Renamed { from: String, to: String },
    /// `suggested_tier` is set when the new age crosses the senior threshold
    AgeChanged { from: u32, to: u32, suggested_tier: Option<Tier> },
    BirthdateChanged { from: NaiveDate, to: NaiveDate },
    TierChanged(TierChange),
    NoteAdded,
}

/// Administrative operations over a queue.
pub struct AdminOperations<'q> {
    queue: &'q mut IntakeQueue,
}

impl<'q> AdminOperations<'q> {
    pub fn new(queue: &'q mut IntakeQueue) -> Self {
        Self { queue }
    }

    /// Read access to the underlying queue.
    pub fn queue(&self) -> &IntakeQueue {
        &*self.queue
    }

    /// Commit a planned action if confirmed.
    ///
    /// Patients are looked up again by id. A bulk clear removes only the
    /// patients it listed; anyone who arrived after planning stays, and
    /// anyone who already left is skipped. An edit planned for a patient
    /// who has since left fails with `NotFound`.
    pub fn execute(
        &mut self,
        action: PlannedAction,
        confirmation: Confirmation,
    ) -> QueueResult<AdminOutcome> {
        if confirmation == Confirmation::Cancelled {
            log::debug!("Cancelled: {}", action.describe());
            return Ok(AdminOutcome::Cancelled);
        }
        log::info!("Executing: {}", action.describe());

        match action {
            PlannedAction::ClearTier { patient_ids, .. }
            | PlannedAction::ClearAll { patient_ids, .. }
            | PlannedAction::ClearByAgeRange { patient_ids, .. } => {
                Ok(AdminOutcome::Cleared(self.queue.remove_ids(&patient_ids)))
            }
            PlannedAction::Rename { patient_id, to, .. } => self.apply_rename(&patient_id, &to),
            PlannedAction::ChangeAge { patient_id, to, .. } => self.apply_age(&patient_id, to),
            PlannedAction::ChangeBirthdate { patient_id, to, .. } => {
                self.apply_birthdate(&patient_id, to)
            }
            PlannedAction::ChangeTier { patient_id, to, .. } => Ok(AdminOutcome::TierChanged(
                self.queue.reassign_tier_by_id(&patient_id, to)?,
            )),
            PlannedAction::AddNote { patient_id, text, .. } => self.apply_note(&patient_id, &text),
        }
    }

    fn locate(&self, name: &str) -> QueueResult<&PatientRecord> {
        self.queue
            .find_by_exact_name(name)
            .ok_or_else(|| QueueError::NotFound(name.to_string()))
    }
}
