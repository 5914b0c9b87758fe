//! Bulk clearing.

use crate::models::{PatientRecord, Tier};
use crate::queue::QueueResult;

use super::{AdminOperations, PlannedAction};

impl<'q> AdminOperations<'q> {
    /// Plan removal of every patient in a tier.
    pub fn plan_clear_tier(&self, tier: Tier) -> PlannedAction {
        let (affected, patient_ids) = pin(self.queue.patients_in_tier(tier));
        PlannedAction::ClearTier { tier, affected, patient_ids }
    }

    /// Plan removal of every waiting patient.
    pub fn plan_clear_all(&self) -> PlannedAction {
        let (affected, patient_ids) = pin(self.queue.patients().iter());
        PlannedAction::ClearAll { affected, patient_ids }
    }

    /// Plan removal of every patient aged `min..=max`.
    pub fn plan_clear_by_age_range(&self, min: u32, max: u32) -> QueueResult<PlannedAction> {
        let (affected, patient_ids) = pin(self.queue.patients_in_age_range(min, max)?);
        Ok(PlannedAction::ClearByAgeRange {
            min,
            max,
            affected,
            patient_ids,
        })
    }
}

/// Names and ids of the listed patients, in dispatch order.
fn pin<'a, I>(patients: I) -> (Vec<String>, Vec<String>)
where
    I: IntoIterator<Item = &'a PatientRecord>,
{
    patients
        .into_iter()
        .map(|p| (p.name().to_string(), p.id().to_string()))
        .unzip()
}
