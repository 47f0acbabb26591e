//! Offline replay of recorded observations through the detectors and the
//! alerting engine, on a scripted clock.

use std::{fs, path::Path, sync::Arc};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};

use crate::alerting::{AlertingEngine, Stats};
use crate::detectors::DetectorSet;
use crate::models::{Alert, Observation};
use crate::reporter::{drain_dispatch, spawn_dispatch, ReporterEvent, SessionReporter};
use crate::settings::MonitorSettings;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReplayStep {
    /// Offset from the scenario start.
    pub at_ms: u64,
    pub observation: Observation,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Scenario {
    /// Wall time of offset zero. Defaults to the time the replay runs.
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    pub steps: Vec<ReplayStep>,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario from {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse scenario at {}", path.display()))
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReplayOutcome {
    pub session_id: Option<String>,
    /// Every accepted alert, oldest first.
    pub alerts: Vec<Alert>,
    pub stats: Stats,
}

/// Replays `scenario` without a reporter.
pub fn run(scenario: &Scenario, settings: &MonitorSettings) -> Result<ReplayOutcome> {
    let timeline = timeline(scenario)?;
    let mut engine = AlertingEngine::new(settings.policy.clone(), settings.log_capacity);
    let alerts = play(&timeline, settings, &mut engine);
    Ok(ReplayOutcome {
        session_id: None,
        alerts,
        stats: engine.stats(),
    })
}

/// Replays `scenario` and reports the session the way a live run would.
/// Nothing is reported when a step lies outside the representable time range.
pub async fn run_reported(
    scenario: &Scenario,
    settings: &MonitorSettings,
    reporter: Arc<dyn SessionReporter>,
) -> Result<ReplayOutcome> {
    let timeline = timeline(scenario)?;
    let started_at = timeline.started_at;
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (session_tx, session_rx) = watch::channel(None);
    let dispatch = spawn_dispatch(reporter, events_rx, session_tx);

    let _ = events_tx.send(ReporterEvent::SessionStarted { started_at });
    let mut engine = AlertingEngine::new(settings.policy.clone(), settings.log_capacity)
        .with_reporter(events_tx.clone());
    let alerts = play(&timeline, settings, &mut engine);
    engine.detach_reporter();

    let ended_at = timeline.steps.last().map_or(started_at, |(at, _)| *at);
    let _ = events_tx.send(ReporterEvent::SessionEnded { ended_at });
    drop(events_tx);
    drain_dispatch(dispatch, settings.schedule.reporter_drain_timeout())
        .await
        .context("reporter dispatch failed to join")?;

    let session_id = session_rx.borrow().clone();
    Ok(ReplayOutcome {
        session_id,
        alerts,
        stats: engine.stats(),
    })
}

/// Steps resolved to wall time, in time order.
struct Timeline<'a> {
    started_at: DateTime<Utc>,
    steps: Vec<(DateTime<Utc>, &'a Observation)>,
}

fn timeline(scenario: &Scenario) -> Result<Timeline<'_>> {
    let started_at = start_of(scenario);
    let mut ordered: Vec<&ReplayStep> = scenario.steps.iter().collect();
    ordered.sort_by_key(|step| step.at_ms);

    let steps = ordered
        .into_iter()
        .map(|step| Ok((offset(started_at, step.at_ms)?, &step.observation)))
        .collect::<Result<Vec<_>>>()?;
    Ok(Timeline { started_at, steps })
}

fn play(timeline: &Timeline<'_>, settings: &MonitorSettings, engine: &mut AlertingEngine) -> Vec<Alert> {
    let mut detectors = DetectorSet::new(&settings.detectors);
    let mut accepted = Vec::new();
    for (now, observation) in &timeline.steps {
        for candidate in detectors.evaluate(observation, *now) {
            if let Some(alert) = engine.submit(candidate, *now) {
                accepted.push(alert);
            }
        }
    }
    accepted
}

fn start_of(scenario: &Scenario) -> DateTime<Utc> {
    scenario.started_at.unwrap_or_else(Utc::now)
}

fn offset(start: DateTime<Utc>, ms: u64) -> Result<DateTime<Utc>> {
    i64::try_from(ms)
        .ok()
        .and_then(Duration::try_milliseconds)
        .and_then(|delta| start.checked_add_signed(delta))
        .ok_or_else(|| anyhow!("step at {ms}ms lies outside the supported time range"))
}
