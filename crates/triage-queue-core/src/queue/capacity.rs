//! Capacity limits and fill levels.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::QueueConfig;
use crate::models::Tier;

/// Which limit a capacity check applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CapacityScope {
    Tier(Tier),
    Total,
}

impl fmt::Display for CapacityScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapacityScope::Tier(tier) => f.write_str(tier.label()),
            CapacityScope::Total => f.write_str("The waiting room"),
        }
    }
}

/// How close a queue is to its limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CapacityLevel {
    Normal,
    Warning,
    Critical,
}

impl CapacityLevel {
    /// Classify a fill ratio against the configured thresholds.
    pub fn for_usage(current: usize, max: usize, config: &QueueConfig) -> Self {
        if max == 0 {
            return CapacityLevel::Critical;
        }
        let ratio = current as f64 / max as f64;
        if ratio >= config.critical_threshold {
            CapacityLevel::Critical
        } else if ratio >= config.warning_threshold {
            CapacityLevel::Warning
        } else {
            CapacityLevel::Normal
        }
    }
}

/// Occupancy of one queue against its limit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapacityUsage {
    pub scope: CapacityScope,
    pub current: usize,
    pub max: usize,
    pub level: CapacityLevel,
}

impl CapacityUsage {
    pub fn new(scope: CapacityScope, current: usize, max: usize, config: &QueueConfig) -> Self {
        Self {
            scope,
            current,
            max,
            level: CapacityLevel::for_usage(current, max, config),
        }
    }

    pub fn is_full(&self) -> bool {
        self.current >= self.max
    }

    /// Free places left.
    pub fn remaining(&self) -> usize {
        self.max.saturating_sub(self.current)
    }
}

/// Occupancy of every tier and of the whole queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityReport {
    /// One entry per tier, in dispatch order
    pub tiers: Vec<CapacityUsage>,
    pub total: CapacityUsage,
}

impl CapacityReport {
    pub fn for_tier(&self, tier: Tier) -> Option<&CapacityUsage> {
        self.tiers
            .iter()
            .find(|u| u.scope == CapacityScope::Tier(tier))
    }
}
