use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::StatCounter;

/// Running per-session counters. Only ever incremented.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    #[serde(flatten)]
    counts: BTreeMap<StatCounter, u64>,
    total_alerts: u64,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one accepted alert. Returns the new value of the kind's slot,
    /// if it has one.
    pub fn record(&mut self, counter: Option<StatCounter>) -> Option<u64> {
        self.total_alerts += 1;
        counter
            .filter(|slot| *slot != StatCounter::TotalAlerts)
            .map(|slot| {
                let entry = self.counts.entry(slot).or_insert(0);
                *entry += 1;
                *entry
            })
    }

    pub fn get(&self, counter: StatCounter) -> u64 {
        match counter {
            StatCounter::TotalAlerts => self.total_alerts,
            slot => self.counts.get(&slot).copied().unwrap_or(0),
        }
    }

    pub fn total_alerts(&self) -> u64 {
        self.total_alerts
    }

    /// Sum of the named slots; the remainder of `total_alerts` came from
    /// kinds without a slot.
    pub fn counted_alerts(&self) -> u64 {
        self.counts.values().sum()
    }
}
