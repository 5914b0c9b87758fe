//! The dispatch engine.

use strsim::jaro_winkler;

use crate::config::{ConfigResult, QueueConfig};
use crate::models::{IntakeRequest, PatientRecord, Tier, TierPolicy};
use crate::stats::{QueueStats, StatsCollector};

use super::capacity::{CapacityReport, CapacityScope, CapacityUsage};
use super::{QueueError, QueueResult};

/// Minimum similarity for a name to be offered as a suggestion.
const MIN_SUGGESTION_SCORE: f64 = 0.80;

/// Outcome of a tier reassignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierChange {
    /// The patient moved between tiers
    Changed { from: Tier, to: Tier },
    /// The patient was already in the requested tier
    Unchanged(Tier),
}

/// Waiting patients ordered by `(tier rank, arrival order)`.
///
/// Name-based lookups return the first match in dispatch order; use the
/// `*_by_id` variants when names may repeat.
#[derive(Debug, Clone)]
pub struct IntakeQueue {
    config: QueueConfig,
    policy: TierPolicy,
    /// Always sorted by dispatch key
    patients: Vec<PatientRecord>,
    next_seq: u64,
    stats: StatsCollector,
}

impl Default for IntakeQueue {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl IntakeQueue {
    /// Create an empty queue with the given limits.
    ///
    /// The config is trusted as given; use [`IntakeQueue::try_new`] for
    /// limits that have not been through [`QueueConfig::validate`].
    pub fn new(config: QueueConfig) -> Self {
        debug_assert!(config.validate().is_ok(), "invalid queue config: {:?}", config);
        Self {
            policy: TierPolicy::from_config(&config),
            config,
            patients: Vec::new(),
            next_seq: 1,
            stats: StatsCollector::new(),
        }
    }

    /// Validate the limits, then create an empty queue.
    pub fn try_new(config: QueueConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Create an empty queue with the standard limits.
    pub fn with_defaults() -> Self {
        Self::new(QueueConfig::default())
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    pub fn policy(&self) -> &TierPolicy {
        &self.policy
    }

    // =========================================================================
    // Intake
    // =========================================================================

    /// Add a prebuilt record under the tier it carries.
    ///
    /// Fails without touching the queue when the tier or the whole queue is
    /// full.
    pub fn enqueue(&mut self, record: PatientRecord) -> QueueResult<&PatientRecord> {
        if let Err(e) = self.check_capacity(record.tier()) {
            log::warn!("Refused {} ({}): {}", record.name(), record.tier(), e);
            return Err(e);
        }
        self.check_duplicate(record.name(), None)?;
        Ok(self.insert_new(record))
    }

    /// Classify an intake request and enqueue it.
    pub fn admit(&mut self, request: IntakeRequest) -> QueueResult<&PatientRecord> {
        let record = request.into_record(&self.policy)?;
        self.enqueue(record)
    }

    /// Administrative emergency add: always Emergency, ignores capacity.
    pub fn admit_emergency_override(&mut self, request: IntakeRequest) -> QueueResult<&PatientRecord> {
        let record = PatientRecord::new(
            &request.name,
            request.age,
            request.birthdate,
            Tier::Emergency,
            request.note.as_deref(),
        )?;
        self.check_duplicate(record.name(), None)?;
        log::warn!(
            "Capacity override: admitting {} as emergency ({} waiting)",
            record.name(),
            self.patients.len()
        );
        Ok(self.insert_new(record))
    }

    fn check_capacity(&self, tier: Tier) -> QueueResult<()> {
        let tier_limit = self.policy.capacity(tier);
        if self.count_by_tier(tier) >= tier_limit {
            return Err(QueueError::CapacityExceeded {
                scope: CapacityScope::Tier(tier),
                limit: tier_limit,
            });
        }
        let total_limit = self.policy.total_capacity();
        if self.total_count() >= total_limit {
            return Err(QueueError::CapacityExceeded {
                scope: CapacityScope::Total,
                limit: total_limit,
            });
        }
        Ok(())
    }

    /// Enforce unique names when configured. `except_id` skips the patient
    /// being renamed.
    pub(crate) fn check_duplicate(&self, name: &str, except_id: Option<&str>) -> QueueResult<()> {
        if !self.config.reject_duplicate_names && except_id.is_none() {
            return Ok(());
        }
        let clash = self
            .patients
            .iter()
            .any(|p| p.matches_name(name) && Some(p.id()) != except_id);
        if clash {
            return Err(QueueError::DuplicateName(name.trim().to_string()));
        }
        Ok(())
    }

    fn insert_new(&mut self, mut record: PatientRecord) -> &PatientRecord {
        record.stamp_arrival(self.next_seq);
        self.next_seq += 1;
        self.stats.record_intake(record.tier());

        log::info!(
            "Admitted {} {} (arrival #{})",
            record.tier().icon(),
            record.name(),
            record.arrival_seq()
        );
        let idx = self.insert_sorted(record);
        &self.patients[idx]
    }

    fn insert_sorted(&mut self, record: PatientRecord) -> usize {
        let key = record.dispatch_key();
        let idx = self.patients.partition_point(|p| p.dispatch_key() < key);
        self.patients.insert(idx, record);
        idx
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Remove and return the next patient to be seen.
    pub fn dequeue(&mut self) -> Option<PatientRecord> {
        if self.patients.is_empty() {
            log::debug!("Dequeue on empty queue");
            return None;
        }
        let record = self.patients.remove(0);
        self.stats.record_dispatch(record.tier());
        log::info!("Called {} {}", record.tier().icon(), record.name());
        Some(record)
    }

    /// The next patient to be seen, without removing them.
    pub fn peek_next(&self) -> Option<&PatientRecord> {
        self.patients.first()
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// First patient whose name matches exactly (ignoring case), in dispatch
    /// order.
    pub fn find_by_exact_name(&self, name: &str) -> Option<&PatientRecord> {
        self.patients.iter().find(|p| p.matches_name(name))
    }

    pub fn find_by_id(&self, id: &str) -> Option<&PatientRecord> {
        self.patients.iter().find(|p| p.id() == id)
    }

    /// Patients whose name contains `query` (ignoring case), in dispatch
    /// order. A blank query matches nothing.
    pub fn search(&self, query: &str) -> Vec<&PatientRecord> {
        if query.trim().is_empty() {
            return Vec::new();
        }
        let results: Vec<&PatientRecord> = self
            .patients
            .iter()
            .filter(|p| p.name_contains(query))
            .collect();
        log::debug!("Search '{}' matched {} patient(s)", query, results.len());
        results
    }

    /// Names that look like `query`, best match first, for "did you mean"
    /// prompts after a failed lookup.
    pub fn suggest_names(&self, query: &str, limit: usize) -> Vec<String> {
        let query = query.trim().to_lowercase();
        if query.is_empty() || limit == 0 {
            return Vec::new();
        }

        let mut scored: Vec<(f64, &str)> = self
            .patients
            .iter()
            .map(|p| (jaro_winkler(&query, &p.name().to_lowercase()), p.name()))
            .filter(|(score, _)| *score >= MIN_SUGGESTION_SCORE)
            .collect();

        // Highest score first; stable sort keeps dispatch order on ties
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        let mut names: Vec<String> = Vec::new();
        for (_, name) in scored {
            if !names.iter().any(|n| n.eq_ignore_ascii_case(name)) {
                names.push(name.to_string());
            }
            if names.len() == limit {
                break;
            }
        }
        names
    }

    /// 1-based place in line of the first patient with this name.
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.index_of_name(name).map(|idx| idx + 1)
    }

    fn index_of_name(&self, name: &str) -> Option<usize> {
        self.patients.iter().position(|p| p.matches_name(name))
    }

    fn index_of_id(&self, id: &str) -> Option<usize> {
        self.patients.iter().position(|p| p.id() == id)
    }

    pub(crate) fn get_mut_by_id(&mut self, id: &str) -> Option<&mut PatientRecord> {
        self.patients.iter_mut().find(|p| p.id() == id)
    }

    // =========================================================================
    // Removal
    // =========================================================================

    /// Remove the first patient with this name. Returns false if absent.
    pub fn remove(&mut self, name: &str) -> bool {
        match self.index_of_name(name) {
            Some(idx) => {
                let record = self.patients.remove(idx);
                log::info!("Removed {} from the {}", record.name(), record.tier().label());
                true
            }
            None => {
                log::debug!("Remove: no patient named '{}'", name);
                false
            }
        }
    }

    pub fn remove_by_id(&mut self, id: &str) -> Option<PatientRecord> {
        let idx = self.index_of_id(id)?;
        let record = self.patients.remove(idx);
        log::info!("Removed {} from the {}", record.name(), record.tier().label());
        Some(record)
    }

    /// Remove everyone in a tier. Returns their names in dispatch order.
    pub fn clear_tier(&mut self, tier: Tier) -> Vec<String> {
        let removed = self.remove_where(|p| p.tier() == tier);
        log::info!("Cleared {} patient(s) from the {}", removed.len(), tier.label());
        removed
    }

    /// Remove everyone. Returns their names in dispatch order.
    pub fn clear_all(&mut self) -> Vec<String> {
        let removed = self.remove_where(|_| true);
        log::info!("Cleared all queues ({} patient(s))", removed.len());
        removed
    }

    /// Remove everyone aged `min..=max`, regardless of tier.
    pub fn clear_by_age_range(&mut self, min: u32, max: u32) -> QueueResult<Vec<String>> {
        check_range(min, max)?;
        let removed = self.remove_where(|p| (min..=max).contains(&p.age()));
        log::info!("Cleared {} patient(s) aged {}-{}", removed.len(), min, max);
        Ok(removed)
    }

    /// Patients aged `min..=max`, in dispatch order.
    pub fn patients_in_age_range(&self, min: u32, max: u32) -> QueueResult<Vec<&PatientRecord>> {
        check_range(min, max)?;
        Ok(self
            .patients
            .iter()
            .filter(|p| (min..=max).contains(&p.age()))
            .collect())
    }

    /// Remove the patients with these ids, skipping any who already left.
    /// Returns the removed names in dispatch order.
    pub fn remove_ids(&mut self, ids: &[String]) -> Vec<String> {
        let removed = self.remove_where(|p| ids.iter().any(|id| id == p.id()));
        log::info!("Removed {} of {} listed patient(s)", removed.len(), ids.len());
        removed
    }

    fn remove_where<F>(&mut self, pred: F) -> Vec<String>
    where
        F: Fn(&PatientRecord) -> bool,
    {
        let (removed, kept): (Vec<PatientRecord>, Vec<PatientRecord>) =
            std::mem::take(&mut self.patients).into_iter().partition(|p| pred(p));
        self.patients = kept;
        removed.into_iter().map(|p| p.name().to_string()).collect()
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Move the first patient with this name to another tier.
    ///
    /// The patient keeps their original arrival order, so they slot in among
    /// the new tier by when they first arrived.
    pub fn reassign_tier(&mut self, name: &str, tier: Tier) -> QueueResult<TierChange> {
        let idx = self
            .index_of_name(name)
            .ok_or_else(|| QueueError::NotFound(name.to_string()))?;
        self.reassign_at(idx, tier)
    }

    pub fn reassign_tier_by_id(&mut self, id: &str, tier: Tier) -> QueueResult<TierChange> {
        let idx = self
            .index_of_id(id)
            .ok_or_else(|| QueueError::NotFound(id.to_string()))?;
        self.reassign_at(idx, tier)
    }

    fn reassign_at(&mut self, idx: usize, tier: Tier) -> QueueResult<TierChange> {
        let current = &self.patients[idx];
        let from = current.tier();
        if from == tier {
            return Ok(TierChange::Unchanged(tier));
        }

        if tier == Tier::Senior && !self.policy.qualifies_as_senior(current.age()) {
            return Err(QueueError::SeniorAgeRequirement {
                name: current.name().to_string(),
                age: current.age(),
            });
        }

        let limit = self.policy.capacity(tier);
        if self.count_by_tier(tier) >= limit {
            log::warn!("Refused move of {} to {}: tier full", current.name(), tier);
            return Err(QueueError::CapacityExceeded {
                scope: CapacityScope::Tier(tier),
                limit,
            });
        }

        let mut record = self.patients.remove(idx);
        record.reassign_tier(tier);
        record.add_note(&format!("Type changed from {} to {}", from, tier));
        log::info!("Moved {} from {} to {}", record.name(), from, tier);
        self.insert_sorted(record);

        Ok(TierChange::Changed { from, to: tier })
    }

    /// Append a note to the first patient with this name.
    pub fn add_note(&mut self, name: &str, text: &str) -> QueueResult<()> {
        let idx = self
            .index_of_name(name)
            .ok_or_else(|| QueueError::NotFound(name.to_string()))?;
        if self.patients[idx].add_note(text) {
            Ok(())
        } else {
            Err(QueueError::EmptyNote)
        }
    }

    // =========================================================================
    // Counts & Reports
    // =========================================================================

    pub fn count_by_tier(&self, tier: Tier) -> usize {
        self.patients.iter().filter(|p| p.tier() == tier).count()
    }

    pub fn total_count(&self) -> usize {
        self.patients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patients.is_empty()
    }

    /// All waiting patients in dispatch order.
    pub fn patients(&self) -> &[PatientRecord] {
        &self.patients
    }

    /// Waiting patients of one tier in dispatch order.
    pub fn patients_in_tier(&self, tier: Tier) -> Vec<&PatientRecord> {
        self.patients.iter().filter(|p| p.tier() == tier).collect()
    }

    /// Occupancy of each tier and of the whole queue.
    pub fn capacity_report(&self) -> CapacityReport {
        let tiers = Tier::ALL
            .iter()
            .map(|&tier| {
                CapacityUsage::new(
                    CapacityScope::Tier(tier),
                    self.count_by_tier(tier),
                    self.policy.capacity(tier),
                    &self.config,
                )
            })
            .collect();
        let total = CapacityUsage::new(
            CapacityScope::Total,
            self.total_count(),
            self.policy.total_capacity(),
            &self.config,
        );
        CapacityReport { tiers, total }
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats::collect(&self.stats, &self.patients)
    }

    pub fn stats_collector(&self) -> &StatsCollector {
        &self.stats
    }

    /// Zero the day counters. Waiting patients are unaffected.
    pub fn reset_daily_stats(&mut self) {
        log::info!(
            "Resetting day counters ({} admitted, {} called)",
            self.stats.total_today(),
            self.stats.dispatched_today()
        );
        self.stats.reset_daily();
    }
}

fn check_range(min: u32, max: u32) -> QueueResult<()> {
    if min > max {
        return Err(QueueError::InvalidRange { min, max });
    }
    Ok(())
}
