use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{info, warn};
use uuid::Uuid;

use crate::db::Database;
use crate::models::{Alert, Session, SessionStatus, StatCounter};

use super::SessionReporter;

/// Persists sessions, their counters and every recorded alert.
#[derive(Clone)]
pub struct SqliteReporter {
    db: Database,
}

impl SqliteReporter {
    /// Opens the database and closes out sessions a previous process left
    /// running.
    pub async fn open(path: PathBuf) -> Result<Self> {
        let db = Database::new(path).context("failed to open monitoring database")?;
        let reporter = Self { db };
        reporter.recover_incomplete_sessions().await?;
        Ok(reporter)
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    async fn recover_incomplete_sessions(&self) -> Result<()> {
        let stale = self.db.list_incomplete_sessions().await?;
        for session in stale {
            warn!("marking session {} as interrupted", session.id);
            let now = Utc::now();
            self.db
                .mark_session_status(&session.id, SessionStatus::Interrupted, Some(now), now)
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl SessionReporter for SqliteReporter {
    async fn on_session_start(&self, started_at: DateTime<Utc>) -> Result<String> {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4().to_string(),
            started_at,
            ended_at: None,
            status: SessionStatus::Running,
            created_at: now,
            updated_at: now,
        };
        self.db
            .insert_session(&session)
            .await
            .context("failed to insert session")?;
        info!("recording session {}", session.id);
        Ok(session.id)
    }

    async fn on_alert_count_changed(
        &self,
        session_id: &str,
        counter: StatCounter,
        new_count: u64,
    ) -> Result<()> {
        self.db
            .upsert_session_stat(session_id, counter, new_count, Utc::now())
            .await
    }

    async fn on_alert_recorded(&self, session_id: &str, alert: &Alert) -> Result<()> {
        self.db.insert_alert(session_id, alert).await
    }

    async fn on_session_end(&self, session_id: &str, ended_at: DateTime<Utc>) -> Result<()> {
        self.db
            .mark_session_status(session_id, SessionStatus::Completed, Some(ended_at), ended_at)
            .await
            .context("failed to close session")
    }
}
