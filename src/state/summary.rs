use serde::Serialize;

use crate::model::{SensorState, SeverityTier};

/// System-wide view derived from the current sensor table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemSummary {
    pub total_sensors: usize,
    pub safe: usize,
    pub watch: usize,
    pub critical: usize,
    pub highest: SeverityTier,
}

impl SystemSummary {
    pub fn count(&self, tier: SeverityTier) -> usize {
        match tier {
            SeverityTier::Safe => self.safe,
            SeverityTier::Watch => self.watch,
            SeverityTier::Critical => self.critical,
        }
    }
}

/// Tallies tiers over a snapshot. `highest` is `Safe` for an empty table.
pub fn summarize<'a>(states: impl IntoIterator<Item = &'a SensorState>) -> SystemSummary {
    let mut summary = SystemSummary {
        total_sensors: 0,
        safe: 0,
        watch: 0,
        critical: 0,
        highest: SeverityTier::Safe,
    };

    for state in states {
        summary.total_sensors += 1;
        match state.tier {
            SeverityTier::Safe => summary.safe += 1,
            SeverityTier::Watch => summary.watch += 1,
            SeverityTier::Critical => summary.critical += 1,
        }
        summary.highest = summary.highest.max(state.tier);
    }

    summary
}
