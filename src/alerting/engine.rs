use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{info, trace};
use serde::Serialize;
use tokio::sync::{mpsc::UnboundedSender, Mutex};

use crate::models::{Alert, Candidate, StatCounter};
use crate::reporter::ReporterEvent;

use super::{AlertLog, AlertPolicy, Stats, ThrottleState};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSnapshot {
    pub alerts: Vec<Alert>,
    pub stats: Stats,
}

/// Sole owner of throttle state, stats and the alert log. Every accepted
/// alert passes through [`AlertingEngine::submit`].
pub struct AlertingEngine {
    policy: AlertPolicy,
    throttle: ThrottleState,
    log: AlertLog,
    stats: Stats,
    next_id: u64,
    events: Option<UnboundedSender<ReporterEvent>>,
}

impl AlertingEngine {
    pub fn new(policy: AlertPolicy, log_capacity: usize) -> Self {
        Self {
            policy,
            throttle: ThrottleState::new(),
            log: AlertLog::new(log_capacity),
            stats: Stats::new(),
            next_id: 1,
            events: None,
        }
    }

    pub fn with_reporter(mut self, events: UnboundedSender<ReporterEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Stops emitting reporter events and hands back the sender.
    pub fn detach_reporter(&mut self) -> Option<UnboundedSender<ReporterEvent>> {
        self.events.take()
    }

    /// Gates a candidate through its kind's cooldown. Accepted candidates
    /// become alerts and are logged, counted and reported; throttled ones
    /// leave no trace.
    pub fn submit(&mut self, candidate: Candidate, now: DateTime<Utc>) -> Option<Alert> {
        let policy = self.policy.get(candidate.kind);
        if !self.throttle.permits(candidate.kind, policy.cooldown_ms, now) {
            trace!("dropping {} inside cooldown", candidate.kind.as_str());
            return None;
        }

        let alert = Alert {
            id: self.next_id,
            message: candidate.message,
            severity: candidate.severity,
            kind: candidate.kind,
            timestamp: now,
        };
        self.next_id += 1;

        self.log.push(alert.clone());
        let slot_count = self.stats.record(policy.counter);
        self.throttle.record(alert.kind, now);

        info!(
            "alert #{} {} ({:?}): {}",
            alert.id,
            alert.kind.as_str(),
            alert.severity,
            alert.message
        );

        self.notify(ReporterEvent::AlertRecorded(alert.clone()));
        if let (Some(counter), Some(count)) = (policy.counter, slot_count) {
            self.notify(ReporterEvent::CounterChanged { counter, count });
        }
        self.notify(ReporterEvent::CounterChanged {
            counter: StatCounter::TotalAlerts,
            count: self.stats.total_alerts(),
        });

        Some(alert)
    }

    fn notify(&self, event: ReporterEvent) {
        if let Some(tx) = &self.events {
            if tx.send(event).is_err() {
                trace!("reporter channel closed; event dropped");
            }
        }
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.log.to_vec()
    }

    pub fn stats(&self) -> Stats {
        self.stats.clone()
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            alerts: self.alerts(),
            stats: self.stats(),
        }
    }
}

/// Shared handle to one engine; the mutex serialises every submission.
pub struct EngineHandle {
    inner: Arc<Mutex<AlertingEngine>>,
}

impl EngineHandle {
    pub fn new(engine: AlertingEngine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    pub async fn submit(&self, candidate: Candidate, now: DateTime<Utc>) -> Option<Alert> {
        self.inner.lock().await.submit(candidate, now)
    }

    pub async fn submit_all(&self, candidates: Vec<Candidate>, now: DateTime<Utc>) -> Vec<Alert> {
        let mut engine = self.inner.lock().await;
        candidates
            .into_iter()
            .filter_map(|candidate| engine.submit(candidate, now))
            .collect()
    }

    pub async fn detach_reporter(&self) -> Option<UnboundedSender<ReporterEvent>> {
        self.inner.lock().await.detach_reporter()
    }

    pub async fn alerts(&self) -> Vec<Alert> {
        self.inner.lock().await.alerts()
    }

    pub async fn stats(&self) -> Stats {
        self.inner.lock().await.stats()
    }

    pub async fn snapshot(&self) -> EngineSnapshot {
        self.inner.lock().await.snapshot()
    }
}

impl Clone for EngineHandle {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AlertKind, Severity};
    use chrono::{Duration, TimeZone};
    use tokio::sync::mpsc;

    fn t(ms: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap() + Duration::milliseconds(ms)
    }

    fn engine() -> AlertingEngine {
        AlertingEngine::new(AlertPolicy::default(), 20)
    }

    #[test]
    fn accepted_alert_is_logged_and_counted() {
        let mut engine = engine();
        let alert = engine
            .submit(Candidate::new(AlertKind::PhoneDetected, "Phone detected"), t(0))
            .unwrap();

        assert_eq!(alert.id, 1);
        assert_eq!(alert.severity, Severity::Danger);
        assert_eq!(engine.alerts(), vec![alert]);
        assert_eq!(engine.stats().get(StatCounter::PhoneDetected), 1);
        assert_eq!(engine.stats().total_alerts(), 1);
    }

    #[test]
    fn repeat_inside_cooldown_is_silently_dropped() {
        let mut engine = engine();
        engine.submit(Candidate::new(AlertKind::PhoneDetected, "Phone detected"), t(0));
        let second =
            engine.submit(Candidate::new(AlertKind::PhoneDetected, "Phone detected"), t(2_000));

        assert!(second.is_none());
        assert_eq!(engine.alerts().len(), 1);
        assert_eq!(engine.stats().get(StatCounter::PhoneDetected), 1);
    }

    #[test]
    fn accepted_alerts_respect_cooldown_for_every_kind() {
        let mut engine = engine();
        let policy = AlertPolicy::default();

        for step in 0..200 {
            let now = t(step * 250);
            for kind in AlertKind::ALL {
                engine.submit(Candidate::new(kind, kind.as_str()), now);
            }
        }

        // Log only holds the last 20, so check spacing through the stats
        // expectation instead: ceil(50_000 / cooldown) acceptances.
        let stats = engine.stats();
        for kind in AlertKind::ALL {
            let kind_policy = policy.get(kind);
            if let (Some(cooldown), Some(counter)) = (kind_policy.cooldown_ms, kind_policy.counter) {
                let expected = 50_000u64.div_ceil(cooldown);
                assert_eq!(stats.get(counter), expected, "{}", kind.as_str());
            }
        }
        assert_eq!(stats.total_alerts(), stats.counted_alerts() + 200 * 6);
    }

    #[test]
    fn input_guard_alerts_can_be_throttled_by_policy() {
        let policy = AlertPolicy::default().with_cooldown(AlertKind::CopyAttempt, Some(1_000));
        let mut engine = AlertingEngine::new(policy, 20);

        assert!(engine.submit(Candidate::new(AlertKind::CopyAttempt, "copy"), t(0)).is_some());
        assert!(engine.submit(Candidate::new(AlertKind::CopyAttempt, "copy"), t(500)).is_none());
        assert!(engine.submit(Candidate::new(AlertKind::CopyAttempt, "copy"), t(1_000)).is_some());
    }

    #[test]
    fn reporter_receives_alert_then_counter_updates() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut engine = engine().with_reporter(tx);

        engine.submit(Candidate::new(AlertKind::NoFace, "No face"), t(0));
        engine.submit(Candidate::new(AlertKind::CopyAttempt, "Copy blocked"), t(10));

        let events: Vec<ReporterEvent> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
        assert!(matches!(events[0], ReporterEvent::AlertRecorded(ref a) if a.kind == AlertKind::NoFace));
        assert!(matches!(
            events[1],
            ReporterEvent::CounterChanged { counter: StatCounter::NoFace, count: 1 }
        ));
        assert!(matches!(
            events[2],
            ReporterEvent::CounterChanged { counter: StatCounter::TotalAlerts, count: 1 }
        ));
        assert!(matches!(events[3], ReporterEvent::AlertRecorded(_)));
        assert!(matches!(
            events[4],
            ReporterEvent::CounterChanged { counter: StatCounter::TotalAlerts, count: 2 }
        ));
        assert_eq!(events.len(), 5);
    }

    #[test]
    fn two_faces_for_six_seconds_yield_two_alerts() {
        let mut engine = engine();
        let mut accepted = Vec::new();
        for tick in 0..=20 {
            let now = t(tick * 300);
            if let Some(alert) =
                engine.submit(Candidate::new(AlertKind::MultipleFaces, "2 faces"), now)
            {
                accepted.push(alert.timestamp);
            }
        }

        assert_eq!(accepted, vec![t(0), t(5_100)]);
        assert_eq!(engine.stats().get(StatCounter::MultipleFaces), 2);
    }

    #[tokio::test]
    async fn handle_shares_one_engine() {
        let handle = EngineHandle::new(engine());
        let other = handle.clone();

        other
            .submit(Candidate::new(AlertKind::TabSwitch, "Tab switched"), t(0))
            .await;
        handle
            .submit(Candidate::new(AlertKind::TabSwitch, "Tab switched"), t(1))
            .await;

        let snapshot = handle.snapshot().await;
        assert_eq!(snapshot.alerts.len(), 2);
        assert_eq!(snapshot.stats.get(StatCounter::TabSwitch), 2);
        assert_eq!(snapshot.alerts[0].id, 2);
    }
}
