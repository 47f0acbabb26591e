use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::PolicyError;
use crate::models::{AlertKind, StatCounter};

/// Throttling and bookkeeping rule for one alert kind.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct KindPolicy {
    /// Minimum spacing between two accepted alerts of this kind. `None` means
    /// every occurrence is accepted.
    pub cooldown_ms: Option<u64>,
    /// Counter slot incremented on acceptance, besides the total.
    pub counter: Option<StatCounter>,
}

fn default_policy_for(kind: AlertKind) -> KindPolicy {
    let (cooldown_ms, counter) = match kind {
        AlertKind::NoFace => (Some(3_000), Some(StatCounter::NoFace)),
        AlertKind::MultipleFaces => (Some(5_000), Some(StatCounter::MultipleFaces)),
        AlertKind::HeadTurned => (Some(6_000), Some(StatCounter::HeadTurned)),
        AlertKind::LookingAway => (Some(4_000), Some(StatCounter::LookingAway)),
        AlertKind::MultipleVoices => (Some(8_000), Some(StatCounter::MultipleVoices)),
        AlertKind::PhoneDetected => (Some(5_000), Some(StatCounter::PhoneDetected)),
        AlertKind::MultipleMonitors => (Some(30_000), Some(StatCounter::MultipleMonitors)),
        AlertKind::TabSwitch => (None, Some(StatCounter::TabSwitch)),
        AlertKind::CopyAttempt
        | AlertKind::PasteAttempt
        | AlertKind::TaskSwitch
        | AlertKind::ScreenshotAttempt
        | AlertKind::DevToolsBlocked
        | AlertKind::DetectorDegraded => (None, None),
    };
    KindPolicy {
        cooldown_ms,
        counter,
    }
}

/// Complete `AlertKind -> KindPolicy` table. A table loaded from settings
/// must name every kind; deserialization fails otherwise.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "BTreeMap<AlertKind, KindPolicy>", into = "BTreeMap<AlertKind, KindPolicy>")]
pub struct AlertPolicy {
    table: BTreeMap<AlertKind, KindPolicy>,
}

impl AlertPolicy {
    pub fn get(&self, kind: AlertKind) -> KindPolicy {
        // The table is complete by construction.
        self.table
            .get(&kind)
            .copied()
            .unwrap_or_else(|| default_policy_for(kind))
    }

    pub fn set(&mut self, kind: AlertKind, policy: KindPolicy) {
        self.table.insert(kind, policy);
    }

    pub fn with_cooldown(mut self, kind: AlertKind, cooldown_ms: Option<u64>) -> Self {
        let mut entry = self.get(kind);
        entry.cooldown_ms = cooldown_ms;
        self.set(kind, entry);
        self
    }
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            table: AlertKind::ALL
                .iter()
                .map(|&kind| (kind, default_policy_for(kind)))
                .collect(),
        }
    }
}

impl TryFrom<BTreeMap<AlertKind, KindPolicy>> for AlertPolicy {
    type Error = PolicyError;

    fn try_from(table: BTreeMap<AlertKind, KindPolicy>) -> Result<Self, Self::Error> {
        if let Some(missing) = AlertKind::ALL.iter().find(|kind| !table.contains_key(kind)) {
            return Err(PolicyError::MissingKind(*missing));
        }
        Ok(Self { table })
    }
}

impl From<AlertPolicy> for BTreeMap<AlertKind, KindPolicy> {
    fn from(policy: AlertPolicy) -> Self {
        policy.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_matches_reference_cooldowns() {
        let policy = AlertPolicy::default();
        assert_eq!(policy.get(AlertKind::NoFace).cooldown_ms, Some(3_000));
        assert_eq!(policy.get(AlertKind::MultipleFaces).cooldown_ms, Some(5_000));
        assert_eq!(policy.get(AlertKind::HeadTurned).cooldown_ms, Some(6_000));
        assert_eq!(policy.get(AlertKind::LookingAway).cooldown_ms, Some(4_000));
        assert_eq!(policy.get(AlertKind::MultipleVoices).cooldown_ms, Some(8_000));
        assert_eq!(policy.get(AlertKind::PhoneDetected).cooldown_ms, Some(5_000));
        assert_eq!(policy.get(AlertKind::MultipleMonitors).cooldown_ms, Some(30_000));
        assert_eq!(policy.get(AlertKind::TabSwitch).cooldown_ms, None);
        assert_eq!(policy.get(AlertKind::CopyAttempt).cooldown_ms, None);
    }

    #[test]
    fn input_guard_kinds_have_no_counter() {
        let policy = AlertPolicy::default();
        for kind in [
            AlertKind::CopyAttempt,
            AlertKind::PasteAttempt,
            AlertKind::TaskSwitch,
            AlertKind::ScreenshotAttempt,
            AlertKind::DevToolsBlocked,
        ] {
            assert_eq!(policy.get(kind).counter, None, "{}", kind.as_str());
        }
        assert_eq!(
            policy.get(AlertKind::TabSwitch).counter,
            Some(StatCounter::TabSwitch)
        );
    }

    #[test]
    fn incomplete_table_is_rejected() {
        let mut table: BTreeMap<AlertKind, KindPolicy> = AlertPolicy::default().into();
        table.remove(&AlertKind::PhoneDetected);

        let err = AlertPolicy::try_from(table).unwrap_err();
        assert_eq!(err, PolicyError::MissingKind(AlertKind::PhoneDetected));
    }

    #[test]
    fn policy_round_trips_through_json_keys() {
        let json = serde_json::to_value(AlertPolicy::default()).unwrap();
        assert_eq!(json["noFace"]["cooldown_ms"], 3_000);
        assert_eq!(json["noFace"]["counter"], "noFaceCount");

        let mut partial = json.clone();
        partial.as_object_mut().unwrap().remove("headTurned");
        assert!(serde_json::from_value::<AlertPolicy>(partial).is_err());
    }
}
