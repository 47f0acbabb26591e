//! Session reporting: the engine emits events, a dispatch task forwards them
//! to a [`SessionReporter`] in order. Reporter failures are logged and
//! dropped, so a slow or broken backend never stalls detection.

pub mod log_reporter;
pub mod sqlite;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinHandle};

use crate::models::{Alert, StatCounter};

pub use log_reporter::LogReporter;
pub use sqlite::SqliteReporter;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

#[derive(Debug, Clone, PartialEq)]
pub enum ReporterEvent {
    SessionStarted { started_at: DateTime<Utc> },
    AlertRecorded(Alert),
    CounterChanged { counter: StatCounter, count: u64 },
    SessionEnded { ended_at: DateTime<Utc> },
}

#[async_trait]
pub trait SessionReporter: Send + Sync {
    /// Opens a session record and returns its id.
    async fn on_session_start(&self, started_at: DateTime<Utc>) -> Result<String>;

    async fn on_alert_count_changed(
        &self,
        session_id: &str,
        counter: StatCounter,
        new_count: u64,
    ) -> Result<()>;

    async fn on_alert_recorded(&self, _session_id: &str, _alert: &Alert) -> Result<()> {
        Ok(())
    }

    async fn on_session_end(&self, session_id: &str, ended_at: DateTime<Utc>) -> Result<()>;
}

/// Drains `events` into `reporter` until the channel closes. The reporter's
/// session id is published on `session_tx` once known.
pub fn spawn_dispatch(
    reporter: Arc<dyn SessionReporter>,
    mut events: mpsc::UnboundedReceiver<ReporterEvent>,
    session_tx: watch::Sender<Option<String>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut session_id: Option<String> = None;

        while let Some(event) = events.recv().await {
            match event {
                ReporterEvent::SessionStarted { started_at } => {
                    match reporter.on_session_start(started_at).await {
                        Ok(id) => {
                            log_info!("reporter opened session {id}");
                            let _ = session_tx.send(Some(id.clone()));
                            session_id = Some(id);
                        }
                        Err(err) => log_error!("reporter failed to open session: {err:?}"),
                    }
                }
                other => {
                    let Some(id) = session_id.as_deref() else {
                        log_warn!("reporter has no session; dropping {other:?}");
                        continue;
                    };
                    if let Err(err) = deliver(reporter.as_ref(), id, other).await {
                        log_error!("reporter call failed for session {id}: {err:?}");
                    }
                }
            }
        }

        log_info!("reporter dispatch finished");
    })
}

/// Waits up to `limit` for the dispatch task to finish. A reporter still
/// busy after that is aborted and its pending events are lost.
pub async fn drain_dispatch(mut handle: JoinHandle<()>, limit: Duration) -> Result<(), JoinError> {
    match tokio::time::timeout(limit, &mut handle).await {
        Ok(result) => result,
        Err(_) => {
            log_error!(
                "reporter did not drain within {}ms; abandoning it",
                limit.as_millis()
            );
            handle.abort();
            Ok(())
        }
    }
}

async fn deliver(reporter: &dyn SessionReporter, session_id: &str, event: ReporterEvent) -> Result<()> {
    match event {
        ReporterEvent::AlertRecorded(alert) => reporter.on_alert_recorded(session_id, &alert).await,
        ReporterEvent::CounterChanged { counter, count } => {
            reporter.on_alert_count_changed(session_id, counter, count).await
        }
        ReporterEvent::SessionEnded { ended_at } => reporter.on_session_end(session_id, ended_at).await,
        ReporterEvent::SessionStarted { .. } => Ok(()),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Records every call; optionally fails count updates or never
    /// finishes closing the session.
    #[derive(Default)]
    pub struct RecordingReporter {
        pub calls: Mutex<Vec<String>>,
        pub fail_counts: bool,
        pub hang_on_end: bool,
    }

    impl RecordingReporter {
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SessionReporter for RecordingReporter {
        async fn on_session_start(&self, _started_at: DateTime<Utc>) -> Result<String> {
            self.calls.lock().unwrap().push("start".into());
            Ok("session-1".into())
        }

        async fn on_alert_count_changed(
            &self,
            session_id: &str,
            counter: StatCounter,
            new_count: u64,
        ) -> Result<()> {
            if self.fail_counts {
                anyhow::bail!("backend unavailable");
            }
            self.calls
                .lock()
                .unwrap()
                .push(format!("{session_id}:{}={new_count}", counter.as_str()));
            Ok(())
        }

        async fn on_alert_recorded(&self, session_id: &str, alert: &Alert) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("{session_id}:alert:{}", alert.kind.as_str()));
            Ok(())
        }

        async fn on_session_end(&self, session_id: &str, _ended_at: DateTime<Utc>) -> Result<()> {
            if self.hang_on_end {
                std::future::pending::<()>().await;
            }
            self.calls.lock().unwrap().push(format!("{session_id}:end"));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingReporter;
    use super::*;
    use crate::models::{AlertKind, Severity};

    fn alert() -> Alert {
        Alert {
            id: 1,
            message: "Phone".into(),
            severity: Severity::Danger,
            kind: AlertKind::PhoneDetected,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn events_are_delivered_in_order_with_session_id() {
        let reporter = Arc::new(RecordingReporter::default());
        let (tx, rx) = mpsc::unbounded_channel();
        let (session_tx, session_rx) = watch::channel(None);
        let handle = spawn_dispatch(reporter.clone(), rx, session_tx);

        tx.send(ReporterEvent::SessionStarted { started_at: Utc::now() }).unwrap();
        tx.send(ReporterEvent::AlertRecorded(alert())).unwrap();
        tx.send(ReporterEvent::CounterChanged {
            counter: StatCounter::PhoneDetected,
            count: 1,
        })
        .unwrap();
        tx.send(ReporterEvent::SessionEnded { ended_at: Utc::now() }).unwrap();
        drop(tx);
        handle.await.unwrap();

        assert_eq!(
            reporter.calls(),
            vec![
                "start",
                "session-1:alert:phoneDetected",
                "session-1:phoneDetectedCount=1",
                "session-1:end",
            ]
        );
        assert_eq!(session_rx.borrow().as_deref(), Some("session-1"));
    }

    #[tokio::test]
    async fn reporter_failures_do_not_stop_dispatch() {
        let reporter = Arc::new(RecordingReporter {
            fail_counts: true,
            ..Default::default()
        });
        let (tx, rx) = mpsc::unbounded_channel();
        let (session_tx, _session_rx) = watch::channel(None);
        let handle = spawn_dispatch(reporter.clone(), rx, session_tx);

        tx.send(ReporterEvent::SessionStarted { started_at: Utc::now() }).unwrap();
        tx.send(ReporterEvent::CounterChanged {
            counter: StatCounter::TotalAlerts,
            count: 1,
        })
        .unwrap();
        tx.send(ReporterEvent::SessionEnded { ended_at: Utc::now() }).unwrap();
        drop(tx);
        handle.await.unwrap();

        assert_eq!(reporter.calls(), vec!["start", "session-1:end"]);
    }

    #[tokio::test(start_paused = true)]
    async fn stuck_reporter_is_abandoned_after_the_drain_limit() {
        let reporter = Arc::new(RecordingReporter {
            hang_on_end: true,
            ..Default::default()
        });
        let (tx, rx) = mpsc::unbounded_channel();
        let (session_tx, _session_rx) = watch::channel(None);
        let handle = spawn_dispatch(reporter.clone(), rx, session_tx);

        tx.send(ReporterEvent::SessionStarted { started_at: Utc::now() }).unwrap();
        tx.send(ReporterEvent::SessionEnded { ended_at: Utc::now() }).unwrap();
        drop(tx);

        let started = tokio::time::Instant::now();
        drain_dispatch(handle, Duration::from_millis(5_000)).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(5_000));
        assert_eq!(reporter.calls(), vec!["start"]);
    }
}
