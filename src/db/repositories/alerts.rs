use anyhow::Result;
use rusqlite::{params, Row};

use crate::db::{
    helpers::{parse_datetime, parse_kind, parse_severity, to_i64, to_u64},
    Database,
};
use crate::models::Alert;

/// An alert as stored, tagged with its session.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertRecord {
    pub session_id: String,
    pub alert: Alert,
}

fn row_to_record(row: &Row) -> Result<AlertRecord> {
    let alert_id: i64 = row.get("alert_id")?;
    let kind: String = row.get("kind")?;
    let severity: String = row.get("severity")?;
    let raised_at: String = row.get("raised_at")?;

    Ok(AlertRecord {
        session_id: row.get("session_id")?,
        alert: Alert {
            id: to_u64(alert_id, "alert_id")?,
            message: row.get("message")?,
            severity: parse_severity(&severity)?,
            kind: parse_kind(&kind)?,
            timestamp: parse_datetime(&raised_at, "raised_at")?,
        },
    })
}

impl Database {
    pub async fn insert_alert(&self, session_id: &str, alert: &Alert) -> Result<()> {
        let session_id = session_id.to_string();
        let alert = alert.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT OR IGNORE INTO alerts (session_id, alert_id, kind, severity, message, raised_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    session_id,
                    to_i64(alert.id)?,
                    alert.kind.as_str(),
                    alert.severity.as_str(),
                    alert.message,
                    alert.timestamp.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
        .await
    }

    /// Alerts of one session, oldest first.
    pub async fn list_alerts(&self, session_id: &str) -> Result<Vec<AlertRecord>> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT session_id, alert_id, kind, severity, message, raised_at
                 FROM alerts
                 WHERE session_id = ?1
                 ORDER BY alert_id ASC",
            )?;

            let mut rows = stmt.query(params![session_id])?;
            let mut records = Vec::new();
            while let Some(row) = rows.next()? {
                records.push(row_to_record(row)?);
            }
            Ok(records)
        })
        .await
    }
}
