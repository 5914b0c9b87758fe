//! Priority tiers and the classification policy.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::QueueConfig;

/// Priority tier of a waiting patient.
///
/// Declaration order is dispatch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    /// Seen before everyone else
    Emergency,
    /// Patients at or above the senior age
    Senior,
    /// Everyone else
    Regular,
}

impl Tier {
    /// All tiers in dispatch order.
    pub const ALL: [Tier; 3] = [Tier::Emergency, Tier::Senior, Tier::Regular];

    /// Priority rank (1 is served first).
    pub fn rank(&self) -> u8 {
        match self {
            Tier::Emergency => 1,
            Tier::Senior => 2,
            Tier::Regular => 3,
        }
    }

    /// Name of the tier's queue for display.
    pub fn label(&self) -> &'static str {
        match self {
            Tier::Emergency => "Emergency Queue",
            Tier::Senior => "Senior Queue",
            Tier::Regular => "Regular Queue",
        }
    }

    /// Short bracketed tag for display.
    pub fn icon(&self) -> &'static str {
        match self {
            Tier::Emergency => "[EMERGENCY]",
            Tier::Senior => "[SENIOR]",
            Tier::Regular => "[REGULAR]",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Emergency => "Emergency",
            Tier::Senior => "Senior",
            Tier::Regular => "Regular",
        }
    }

    /// Parse a tier name, ignoring case.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "emergency" => Some(Tier::Emergency),
            "senior" => Some(Tier::Senior),
            "regular" => Some(Tier::Regular),
            _ => None,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification and capacity rules keyed by tier.
#[derive(Debug, Clone, PartialEq)]
pub struct TierPolicy {
    emergency_capacity: usize,
    senior_capacity: usize,
    regular_capacity: usize,
    total_capacity: usize,
    senior_age: u32,
}

impl TierPolicy {
    /// Build the policy from queue configuration.
    pub fn from_config(config: &QueueConfig) -> Self {
        Self {
            emergency_capacity: config.emergency_capacity,
            senior_capacity: config.senior_capacity,
            regular_capacity: config.regular_capacity,
            total_capacity: config.total_capacity,
            senior_age: config.senior_age,
        }
    }

    pub fn rank(&self, tier: Tier) -> u8 {
        tier.rank()
    }

    /// Maximum number of waiting patients in a tier.
    pub fn capacity(&self, tier: Tier) -> usize {
        match tier {
            Tier::Emergency => self.emergency_capacity,
            Tier::Senior => self.senior_capacity,
            Tier::Regular => self.regular_capacity,
        }
    }

    /// Maximum number of waiting patients overall.
    pub fn total_capacity(&self) -> usize {
        self.total_capacity
    }

    pub fn senior_age(&self) -> u32 {
        self.senior_age
    }

    pub fn label(&self, tier: Tier) -> &'static str {
        tier.label()
    }

    pub fn icon(&self, tier: Tier) -> &'static str {
        tier.icon()
    }

    /// Whether a patient of this age may sit in the senior tier.
    pub fn qualifies_as_senior(&self, age: u32) -> bool {
        age >= self.senior_age
    }

    /// Auto-classify a patient at intake.
    pub fn classify(&self, age: u32, is_emergency: bool) -> Tier {
        if is_emergency {
            Tier::Emergency
        } else if self.qualifies_as_senior(age) {
            Tier::Senior
        } else {
            Tier::Regular
        }
    }
}

impl Default for TierPolicy {
    fn default() -> Self {
        Self::from_config(&QueueConfig::default())
    }
}
