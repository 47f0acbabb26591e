use std::sync::Arc;

use log::{error, info, warn};
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::alerting::{AlertingEngine, EngineHandle, EngineSnapshot, Stats};
use crate::detectors::{Detector, FacePresence, InputGuard, InputVerdict, VisibilityDetector};
use crate::error::MonitorError;
use crate::models::{Alert, Observation};
use crate::reporter::{drain_dispatch, spawn_dispatch, ReporterEvent, SessionReporter};
use crate::settings::MonitorSettings;

use super::clock::MonitorClock;
use super::loop_worker::{detector_loop, LoopContext};
use super::source::{SignalSource, SourceKind};

/// Detectors fed by host events rather than a polling loop.
#[derive(Default)]
struct PushDetectors {
    visibility: VisibilityDetector,
    input: InputGuard,
}

struct ActiveSession {
    cancel_token: CancellationToken,
    loops: Vec<JoinHandle<Box<dyn SignalSource>>>,
    dispatch: JoinHandle<()>,
    events_tx: mpsc::UnboundedSender<ReporterEvent>,
    clock: MonitorClock,
    push: Mutex<PushDetectors>,
}

/// Owns one monitoring session at a time: its sources, loops, engine and
/// reporter dispatch.
///
/// Dropping a controller mid-session only cancels the loops. Sources are not
/// closed and the reporter never sees the session end; call [`stop`] first.
///
/// [`stop`]: MonitorController::stop
pub struct MonitorController {
    settings: MonitorSettings,
    reporter: Arc<dyn SessionReporter>,
    engine: Option<EngineHandle>,
    session_rx: Option<watch::Receiver<Option<String>>>,
    active: Option<ActiveSession>,
}

impl MonitorController {
    pub fn new(settings: MonitorSettings, reporter: Arc<dyn SessionReporter>) -> Self {
        Self {
            settings,
            reporter,
            engine: None,
            session_rx: None,
            active: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    /// Acquires every source, then spawns one loop per source. If any source
    /// fails to open, the ones already opened are closed and nothing runs.
    pub async fn start(&mut self, sources: Vec<Box<dyn SignalSource>>) -> Result<(), MonitorError> {
        if self.active.is_some() {
            return Err(MonitorError::AlreadyActive);
        }

        let mut opened: Vec<Box<dyn SignalSource>> = Vec::with_capacity(sources.len());
        for mut source in sources {
            if let Err(err) = source.open().await {
                let source_name = source.name().to_string();
                warn!("failed to acquire {source_name}: {err:#}");
                for mut acquired in opened {
                    acquired.close().await;
                }
                return Err(MonitorError::Acquisition {
                    source_name,
                    reason: format!("{err:#}"),
                });
            }
            opened.push(source);
        }

        let clock = MonitorClock::start();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (session_tx, session_rx) = watch::channel(None);
        let dispatch = spawn_dispatch(Arc::clone(&self.reporter), events_rx, session_tx);
        let _ = events_tx.send(ReporterEvent::SessionStarted {
            started_at: clock.started_at(),
        });

        let engine = EngineHandle::new(
            AlertingEngine::new(self.settings.policy.clone(), self.settings.log_capacity)
                .with_reporter(events_tx.clone()),
        );

        let cancel_token = CancellationToken::new();
        let ctx = LoopContext {
            engine: engine.clone(),
            clock,
            inference_timeout: self.settings.schedule.inference_timeout(),
            cancel_token: cancel_token.clone(),
        };

        // Gaze samples only count while the camera sees exactly one face.
        let presence = opened
            .iter()
            .any(|source| source.kind() == SourceKind::Face)
            .then(FacePresence::new);

        let loops: Vec<_> = opened
            .into_iter()
            .map(|source| {
                let kind = source.kind();
                let detector = kind.detector(&self.settings.detectors, presence.as_ref());
                let period = kind.period(&self.settings.schedule);
                info!(
                    "starting {} loop ({}) every {}ms",
                    kind.as_str(),
                    source.name(),
                    period.as_millis()
                );
                tokio::spawn(detector_loop(source, detector, period, ctx.clone()))
            })
            .collect();

        info!("monitoring started at {}", clock.started_at().to_rfc3339());

        self.engine = Some(engine);
        self.session_rx = Some(session_rx);
        self.active = Some(ActiveSession {
            cancel_token,
            loops,
            dispatch,
            events_tx,
            clock,
            push: Mutex::new(PushDetectors::default()),
        });
        Ok(())
    }

    /// Cancels every loop, closes every source and flushes the reporter.
    /// The last session's alerts and stats stay readable afterwards.
    pub async fn stop(&mut self) -> Result<(), MonitorError> {
        let Some(active) = self.active.take() else {
            return Err(MonitorError::NotActive);
        };

        active.cancel_token.cancel();

        let mut join_error = None;
        for handle in active.loops {
            match handle.await {
                Ok(mut source) => source.close().await,
                Err(err) => {
                    error!("detector loop failed to join: {err}");
                    join_error.get_or_insert(err);
                }
            }
        }

        if let Some(engine) = &self.engine {
            engine.detach_reporter().await;
        }
        let _ = active.events_tx.send(ReporterEvent::SessionEnded {
            ended_at: active.clock.now(),
        });
        drop(active.events_tx);
        drain_dispatch(active.dispatch, self.settings.schedule.reporter_drain_timeout()).await?;

        info!("monitoring stopped");

        match join_error {
            Some(err) => Err(MonitorError::Join(err)),
            None => Ok(()),
        }
    }

    /// Feeds a host event (tab visibility or keyboard/clipboard input). For
    /// input events the verdict tells the host whether to cancel the default
    /// action. Ignored while monitoring is inactive.
    pub async fn handle_event(&self, observation: &Observation) -> Option<InputVerdict> {
        let active = self.active.as_ref()?;
        let engine = self.engine.as_ref()?;
        let now = active.clock.now();
        let mut push = active.push.lock().await;

        match observation {
            Observation::VisibilityEvent { .. } => {
                let candidates = push.visibility.evaluate(observation, now);
                engine.submit_all(candidates, now).await;
                None
            }
            Observation::InputEvent { kind } => {
                let verdict = push.input.intercept(kind);
                if let Some(candidate) = verdict.candidate.clone() {
                    engine.submit(candidate, now).await;
                }
                Some(verdict)
            }
            other => {
                warn!("{} is not a host event; ignoring", other.label());
                None
            }
        }
    }

    /// Id assigned by the reporter, once it has opened the session.
    pub fn session_id(&self) -> Option<String> {
        self.session_rx
            .as_ref()
            .and_then(|rx| rx.borrow().clone())
    }

    pub async fn alerts(&self) -> Vec<Alert> {
        match &self.engine {
            Some(engine) => engine.alerts().await,
            None => Vec::new(),
        }
    }

    pub async fn stats(&self) -> Stats {
        match &self.engine {
            Some(engine) => engine.stats().await,
            None => Stats::new(),
        }
    }

    pub async fn snapshot(&self) -> EngineSnapshot {
        match &self.engine {
            Some(engine) => engine.snapshot().await,
            None => EngineSnapshot {
                alerts: Vec::new(),
                stats: Stats::new(),
            },
        }
    }
}

impl Drop for MonitorController {
    fn drop(&mut self) {
        if let Some(active) = &self.active {
            warn!("monitor dropped while a session was active; sources were not closed");
            active.cancel_token.cancel();
        }
    }
}
