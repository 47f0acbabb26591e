use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::info;
use uuid::Uuid;

use crate::models::{Alert, StatCounter};

use super::SessionReporter;

/// Reporter that only writes to the log. Used when no database is configured.
#[derive(Debug, Default)]
pub struct LogReporter;

#[async_trait]
impl SessionReporter for LogReporter {
    async fn on_session_start(&self, started_at: DateTime<Utc>) -> Result<String> {
        let session_id = Uuid::new_v4().to_string();
        info!("session {session_id} started at {}", started_at.to_rfc3339());
        Ok(session_id)
    }

    async fn on_alert_count_changed(
        &self,
        session_id: &str,
        counter: StatCounter,
        new_count: u64,
    ) -> Result<()> {
        info!("session {session_id}: {} = {new_count}", counter.as_str());
        Ok(())
    }

    async fn on_alert_recorded(&self, session_id: &str, alert: &Alert) -> Result<()> {
        info!(
            "session {session_id}: [{:?}] {} - {}",
            alert.severity,
            alert.kind.as_str(),
            alert.message
        );
        Ok(())
    }

    async fn on_session_end(&self, session_id: &str, ended_at: DateTime<Utc>) -> Result<()> {
        info!("session {session_id} ended at {}", ended_at.to_rfc3339());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn each_session_gets_a_fresh_id() {
        let reporter = LogReporter;
        let first = reporter.on_session_start(Utc::now()).await.unwrap();
        let second = reporter.on_session_start(Utc::now()).await.unwrap();
        assert_ne!(first, second);
        assert!(Uuid::parse_str(&first).is_ok());
    }
}
