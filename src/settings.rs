use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{PoisonError, RwLock},
    time::Duration,
};

use crate::alerting::{AlertPolicy, DEFAULT_LOG_CAPACITY};
use crate::detectors::DetectorConfig;

/// Sampling periods of the detector loops, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Schedule {
    pub face_ms: u64,
    pub gaze_ms: u64,
    pub object_ms: u64,
    pub audio_ms: u64,
    pub display_ms: u64,
    /// Upper bound for one `detect` call before the tick is abandoned.
    pub inference_timeout_ms: u64,
    /// How long `stop` waits for the reporter to flush before abandoning it.
    pub reporter_drain_timeout_ms: u64,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            face_ms: 300,
            gaze_ms: 300,
            object_ms: 3_000,
            audio_ms: 100,
            display_ms: 10_000,
            inference_timeout_ms: 2_000,
            reporter_drain_timeout_ms: 5_000,
        }
    }
}

impl Schedule {
    pub fn inference_timeout(&self) -> Duration {
        Duration::from_millis(self.inference_timeout_ms)
    }

    pub fn reporter_drain_timeout(&self) -> Duration {
        Duration::from_millis(self.reporter_drain_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MonitorSettings {
    pub schedule: Schedule,
    pub detectors: DetectorConfig,
    pub policy: AlertPolicy,
    pub log_capacity: usize,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            schedule: Schedule::default(),
            detectors: DetectorConfig::default(),
            policy: AlertPolicy::default(),
            log_capacity: DEFAULT_LOG_CAPACITY,
        }
    }
}

impl MonitorSettings {
    pub fn from_json(contents: &str) -> Result<Self> {
        serde_json::from_str(contents).context("invalid monitor settings")
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<MonitorSettings>,
}

impl SettingsStore {
    /// Loads settings from `path`, falling back to defaults when the file
    /// does not exist yet. A file that exists but does not parse is an error.
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            MonitorSettings::from_json(&contents)
                .with_context(|| format!("Failed to parse settings at {}", path.display()))?
        } else {
            MonitorSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn get(&self) -> MonitorSettings {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn update(&self, settings: MonitorSettings) -> Result<()> {
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        self.persist(&settings)?;
        *guard = settings;
        Ok(())
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings from {}", self.path.display()))?;
        let data = MonitorSettings::from_json(&contents)?;
        *self.data.write().unwrap_or_else(PoisonError::into_inner) = data;
        Ok(())
    }

    fn persist(&self, data: &MonitorSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AlertKind;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        assert_eq!(store.get(), MonitorSettings::default());
        assert_eq!(store.get().schedule.face_ms, 300);
        assert_eq!(store.get().log_capacity, 20);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let settings =
            MonitorSettings::from_json(r#"{ "schedule": { "object_ms": 1500 } }"#).unwrap();
        assert_eq!(settings.schedule.object_ms, 1_500);
        assert_eq!(settings.schedule.audio_ms, 100);
        assert_eq!(settings.detectors, DetectorConfig::default());
    }

    #[test]
    fn incomplete_policy_table_is_rejected() {
        let result = MonitorSettings::from_json(
            r#"{ "policy": { "noFace": { "cooldown_ms": 1000, "counter": "noFaceCount" } } }"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn update_persists_and_reload_reads_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::new(path.clone()).unwrap();

        let mut settings = store.get();
        settings.log_capacity = 5;
        settings.policy = settings
            .policy
            .with_cooldown(AlertKind::PasteAttempt, Some(1_000));
        store.update(settings.clone()).unwrap();

        let reopened = SettingsStore::new(path).unwrap();
        assert_eq!(reopened.get(), settings);

        reopened.reload().unwrap();
        assert_eq!(reopened.get().log_capacity, 5);
    }
}
