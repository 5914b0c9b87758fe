//! Field edits on a waiting patient.
//!
//! Every committed edit leaves an audit note on the record.

use chrono::NaiveDate;

use crate::models::{PatientRecord, Tier, ValidationError, MAX_AGE};
use crate::queue::{QueueError, QueueResult};

use super::{AdminOperations, AdminOutcome, PlannedAction};

impl<'q> AdminOperations<'q> {
    /// Plan a rename. Fails if another waiting patient already has the name.
    pub fn plan_rename(&self, name: &str, new_name: &str) -> QueueResult<PlannedAction> {
        let patient = self.locate(name)?;
        let to = new_name.trim();
        if to.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        self.queue.check_duplicate(to, Some(patient.id()))?;
        Ok(PlannedAction::Rename {
            patient_id: patient.id().to_string(),
            from: patient.name().to_string(),
            to: to.to_string(),
        })
    }

    /// Plan an age correction. The tier is not changed automatically.
    pub fn plan_change_age(&self, name: &str, new_age: u32) -> QueueResult<PlannedAction> {
        let patient = self.locate(name)?;
        if new_age > MAX_AGE {
            return Err(ValidationError::AgeOutOfRange(new_age).into());
        }
        Ok(PlannedAction::ChangeAge {
            patient_id: patient.id().to_string(),
            name: patient.name().to_string(),
            from: patient.age(),
            to: new_age,
        })
    }

    pub fn plan_change_birthdate(&self, name: &str, new_birthdate: NaiveDate) -> QueueResult<PlannedAction> {
        let patient = self.locate(name)?;
        Ok(PlannedAction::ChangeBirthdate {
            patient_id: patient.id().to_string(),
            name: patient.name().to_string(),
            from: patient.birthdate(),
            to: new_birthdate,
        })
    }

    /// Plan a tier change, rejecting a senior move for an under-age patient
    /// up front. Capacity is checked when the change is executed.
    pub fn plan_change_tier(&self, name: &str, tier: Tier) -> QueueResult<PlannedAction> {
        let patient = self.locate(name)?;
        if tier == Tier::Senior
            && patient.tier() != Tier::Senior
            && !self.queue.policy().qualifies_as_senior(patient.age())
        {
            return Err(QueueError::SeniorAgeRequirement {
                name: patient.name().to_string(),
                age: patient.age(),
            });
        }
        Ok(PlannedAction::ChangeTier {
            patient_id: patient.id().to_string(),
            name: patient.name().to_string(),
            from: patient.tier(),
            to: tier,
        })
    }

    pub fn plan_add_note(&self, name: &str, text: &str) -> QueueResult<PlannedAction> {
        let patient = self.locate(name)?;
        let text = text.trim();
        if text.is_empty() {
            return Err(QueueError::EmptyNote);
        }
        Ok(PlannedAction::AddNote {
            patient_id: patient.id().to_string(),
            name: patient.name().to_string(),
            text: text.to_string(),
        })
    }

    // =========================================================================
    // Execution
    // =========================================================================

    pub(super) fn apply_rename(&mut self, patient_id: &str, to: &str) -> QueueResult<AdminOutcome> {
        self.queue.check_duplicate(to, Some(patient_id))?;
        let patient = self.patient_mut(patient_id)?;
        let from = patient.name().to_string();
        if from == to {
            return Ok(AdminOutcome::Renamed { from, to: to.to_string() });
        }
        patient.rename(to)?;
        patient.add_note(&format!("Name changed from '{}' to '{}'", from, to));
        Ok(AdminOutcome::Renamed {
            from,
            to: patient.name().to_string(),
        })
    }

    pub(super) fn apply_age(&mut self, patient_id: &str, to: u32) -> QueueResult<AdminOutcome> {
        let senior_age = self.queue.policy().senior_age();
        let patient = self.patient_mut(patient_id)?;
        let from = patient.age();
        if from != to {
            patient.set_age(to)?;
            patient.add_note(&format!("Age changed from {} to {}", from, to));
        }

        let suggested_tier = match patient.tier() {
            Tier::Regular if to >= senior_age => Some(Tier::Senior),
            Tier::Senior if to < senior_age => Some(Tier::Regular),
            _ => None,
        };
        Ok(AdminOutcome::AgeChanged { from, to, suggested_tier })
    }

    pub(super) fn apply_birthdate(&mut self, patient_id: &str, to: NaiveDate) -> QueueResult<AdminOutcome> {
        let patient = self.patient_mut(patient_id)?;
        let from = patient.birthdate();
        if from != to {
            patient.set_birthdate(to)?;
            patient.add_note(&format!("Birthday changed from {} to {}", from, to));
        }
        Ok(AdminOutcome::BirthdateChanged { from, to })
    }

    pub(super) fn apply_note(&mut self, patient_id: &str, text: &str) -> QueueResult<AdminOutcome> {
        let patient = self.patient_mut(patient_id)?;
        if patient.add_note(text) {
            Ok(AdminOutcome::NoteAdded)
        } else {
            Err(QueueError::EmptyNote)
        }
    }

    fn patient_mut(&mut self, patient_id: &str) -> QueueResult<&mut PatientRecord> {
        self.queue
            .get_mut_by_id(patient_id)
            .ok_or_else(|| QueueError::NotFound(patient_id.to_string()))
    }
}
