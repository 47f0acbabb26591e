use std::collections::BTreeMap;

use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::params;

use crate::db::{
    helpers::{parse_counter, to_i64, to_u64},
    Database,
};
use crate::models::StatCounter;

impl Database {
    /// Writes the latest value of one counter. Counts only grow, so the
    /// stored value is the larger of the two.
    pub async fn upsert_session_stat(
        &self,
        session_id: &str,
        counter: StatCounter,
        count: u64,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO session_stats (session_id, counter, count, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(session_id, counter) DO UPDATE SET
                     count = MAX(count, excluded.count),
                     updated_at = excluded.updated_at",
                params![
                    session_id,
                    counter.as_str(),
                    to_i64(count)?,
                    updated_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
        .await
    }

    pub async fn get_session_stats(&self, session_id: &str) -> Result<BTreeMap<StatCounter, u64>> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT counter, count FROM session_stats WHERE session_id = ?1",
            )?;

            let mut rows = stmt.query(params![session_id])?;
            let mut stats = BTreeMap::new();
            while let Some(row) = rows.next()? {
                let counter: String = row.get("counter")?;
                let count: i64 = row.get("count")?;
                stats.insert(parse_counter(&counter)?, to_u64(count, "count")?);
            }
            Ok(stats)
        })
        .await
    }
}
