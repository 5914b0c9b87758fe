//! Running intake counters and derived queue statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{PatientRecord, Tier};

/// Intake and dispatch counters for the current day.
///
/// Counters only ever grow; removals and reclassification leave them alone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatsCollector {
    total_today: u64,
    emergencies_today: u64,
    dispatched_today: u64,
    /// Calls per tier, indexed by rank
    dispatched_by_tier: [u64; 3],
    counting_since: DateTime<Utc>,
}

impl Default for StatsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsCollector {
    pub fn new() -> Self {
        Self {
            total_today: 0,
            emergencies_today: 0,
            dispatched_today: 0,
            dispatched_by_tier: [0; 3],
            counting_since: Utc::now(),
        }
    }

    /// Record a patient joining the queue.
    pub fn record_intake(&mut self, tier: Tier) {
        self.total_today += 1;
        if tier == Tier::Emergency {
            self.emergencies_today += 1;
        }
    }

    /// Record a patient being called.
    pub fn record_dispatch(&mut self, tier: Tier) {
        self.dispatched_today += 1;
        self.dispatched_by_tier[tier_index(tier)] += 1;
    }

    /// Start a new counting day.
    pub fn reset_daily(&mut self) {
        *self = Self::new();
    }

    pub fn total_today(&self) -> u64 {
        self.total_today
    }

    pub fn emergencies_today(&self) -> u64 {
        self.emergencies_today
    }

    pub fn dispatched_today(&self) -> u64 {
        self.dispatched_today
    }

    /// Patients of one tier called since the last reset.
    pub fn dispatched_in(&self, tier: Tier) -> u64 {
        self.dispatched_by_tier[tier_index(tier)]
    }

    pub fn counting_since(&self) -> DateTime<Utc> {
        self.counting_since
    }
}

fn tier_index(tier: Tier) -> usize {
    usize::from(tier.rank() - 1)
}

/// Mean age over the given patients, or `None` when there are none.
pub fn average_age<'a, I>(records: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a PatientRecord>,
{
    let (count, sum) = records
        .into_iter()
        .fold((0u64, 0u64), |(count, sum), r| (count + 1, sum + u64::from(r.age())));

    if count == 0 {
        None
    } else {
        Some(sum as f64 / count as f64)
    }
}

/// Share of waiting patients per tier, in percent with one decimal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TierComposition {
    pub emergency: f64,
    pub senior: f64,
    pub regular: f64,
}

impl TierComposition {
    pub fn get(&self, tier: Tier) -> f64 {
        match tier {
            Tier::Emergency => self.emergency,
            Tier::Senior => self.senior,
            Tier::Regular => self.regular,
        }
    }
}

/// Per-tier percentages of the given patients, or `None` when there are none.
///
/// Regular takes the remainder so the parts always add up to 100.
pub fn composition<'a, I>(records: I) -> Option<TierComposition>
where
    I: IntoIterator<Item = &'a PatientRecord>,
{
    let mut counts = [0u64; 3];
    for record in records {
        counts[tier_index(record.tier())] += 1;
    }
    let total: u64 = counts.iter().sum();
    if total == 0 {
        return None;
    }

    // Work in tenths of a percent to avoid float drift.
    let tenths = |n: u64| (n * 2000 + total) / (2 * total);
    let emergency = tenths(counts[0]);
    let senior = tenths(counts[1]).min(1000 - emergency);
    let regular = 1000 - emergency - senior;

    Some(TierComposition {
        emergency: emergency as f64 / 10.0,
        senior: senior as f64 / 10.0,
        regular: regular as f64 / 10.0,
    })
}

/// Point-in-time statistics report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueueStats {
    /// Patients currently waiting
    pub waiting: usize,
    pub emergency_waiting: usize,
    pub senior_waiting: usize,
    pub regular_waiting: usize,
    /// Patients admitted since the counters were last reset
    pub total_today: u64,
    /// Emergency patients admitted since the counters were last reset
    pub emergencies_today: u64,
    /// Patients called since the counters were last reset
    pub dispatched_today: u64,
    /// Mean age of waiting patients
    pub average_age: Option<f64>,
    /// Tier mix of waiting patients
    pub composition: Option<TierComposition>,
}

impl QueueStats {
    /// Build a report from the collector and the waiting patients.
    pub fn collect(collector: &StatsCollector, records: &[PatientRecord]) -> Self {
        let count = |tier: Tier| records.iter().filter(|r| r.tier() == tier).count();
        Self {
            waiting: records.len(),
            emergency_waiting: count(Tier::Emergency),
            senior_waiting: count(Tier::Senior),
            regular_waiting: count(Tier::Regular),
            total_today: collector.total_today(),
            emergencies_today: collector.emergencies_today(),
            dispatched_today: collector.dispatched_today(),
            average_age: average_age(records),
            composition: composition(records),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn patient(age: u32, tier: Tier) -> PatientRecord {
        let bd = NaiveDate::from_ymd_opt(1950, 1, 1).unwrap();
        PatientRecord::new("P", age, bd, tier, None).unwrap()
    }

    #[test]
    fn test_average_age_empty() {
        assert_eq!(average_age(&Vec::<PatientRecord>::new()), None);
    }

    #[test]
    fn test_average_age() {
        let records = vec![
            patient(10, Tier::Regular),
            patient(20, Tier::Regular),
            patient(30, Tier::Regular),
        ];
        assert_eq!(average_age(&records), Some(20.0));
    }

    #[test]
    fn test_counters_monotonic() {
        let mut stats = StatsCollector::new();
        stats.record_intake(Tier::Emergency);
        stats.record_intake(Tier::Regular);
        stats.record_dispatch(Tier::Emergency);

        assert_eq!(stats.total_today(), 2);
        assert_eq!(stats.emergencies_today(), 1);
        assert_eq!(stats.dispatched_today(), 1);

        stats.reset_daily();
        assert_eq!(stats.total_today(), 0);
        assert_eq!(stats.emergencies_today(), 0);
        assert_eq!(stats.dispatched_in(Tier::Emergency), 0);
    }

    #[test]
    fn test_dispatch_counted_per_tier() {
        let mut stats = StatsCollector::new();
        stats.record_dispatch(Tier::Emergency);
        stats.record_dispatch(Tier::Regular);
        stats.record_dispatch(Tier::Regular);

        assert_eq!(stats.dispatched_today(), 3);
        assert_eq!(stats.dispatched_in(Tier::Emergency), 1);
        assert_eq!(stats.dispatched_in(Tier::Senior), 0);
        assert_eq!(stats.dispatched_in(Tier::Regular), 2);
    }

    #[test]
    fn test_composition_empty() {
        assert_eq!(composition(&Vec::<PatientRecord>::new()), None);
    }

    #[test]
    fn test_composition_thirds_sum_to_100() {
        let records = vec![
            patient(40, Tier::Emergency),
            patient(80, Tier::Senior),
            patient(30, Tier::Regular),
        ];
        let mix = composition(&records).unwrap();
        assert_eq!(mix.emergency, 33.3);
        assert_eq!(mix.senior, 33.3);
        assert_eq!(mix.regular, 33.4);
    }

    #[test]
    fn test_composition_single_tier() {
        let records = vec![patient(80, Tier::Senior), patient(90, Tier::Senior)];
        let mix = composition(&records).unwrap();
        assert_eq!(mix.get(Tier::Senior), 100.0);
        assert_eq!(mix.get(Tier::Emergency), 0.0);
        assert_eq!(mix.get(Tier::Regular), 0.0);
    }

    #[test]
    fn test_collect_report() {
        let mut collector = StatsCollector::new();
        let records = vec![patient(40, Tier::Emergency), patient(30, Tier::Regular)];
        for r in &records {
            collector.record_intake(r.tier());
        }

        let report = QueueStats::collect(&collector, &records);
        assert_eq!(report.waiting, 2);
        assert_eq!(report.emergency_waiting, 1);
        assert_eq!(report.senior_waiting, 0);
        assert_eq!(report.total_today, 2);
        assert_eq!(report.emergencies_today, 1);
        assert_eq!(report.average_age, Some(35.0));
    }
}
