use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::models::AlertKind;

/// Per-kind last-emission timestamps.
#[derive(Debug, Default, Clone)]
pub struct ThrottleState {
    last_emission: HashMap<AlertKind, DateTime<Utc>>,
}

impl ThrottleState {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when `kind` may emit at `now` given its cooldown.
    pub fn permits(&self, kind: AlertKind, cooldown_ms: Option<u64>, now: DateTime<Utc>) -> bool {
        let Some(cooldown_ms) = cooldown_ms else {
            return true;
        };
        let Some(last) = self.last_emission.get(&kind) else {
            return true;
        };

        let elapsed_ms = (now - *last).num_milliseconds();
        // A clock that steps backwards counts as still inside the window.
        elapsed_ms >= 0 && elapsed_ms as u64 >= cooldown_ms
    }

    pub fn record(&mut self, kind: AlertKind, now: DateTime<Utc>) {
        self.last_emission.insert(kind, now);
    }
}
