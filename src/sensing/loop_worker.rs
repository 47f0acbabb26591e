use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::alerting::EngineHandle;
use crate::detectors::Detector;
use crate::models::{AlertKind, Candidate};

use super::clock::MonitorClock;
use super::source::SignalSource;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

/// Shared by every loop of one session.
#[derive(Clone)]
pub struct LoopContext {
    pub engine: EngineHandle,
    pub clock: MonitorClock,
    pub inference_timeout: Duration,
    pub cancel_token: CancellationToken,
}

/// Samples `source` every `period` and feeds the detector until cancelled.
/// Returns the source so the caller can close it.
pub async fn detector_loop(
    mut source: Box<dyn SignalSource>,
    mut detector: Box<dyn Detector>,
    period: Duration,
    ctx: LoopContext,
) -> Box<dyn SignalSource> {
    let mut ticker = tokio::time::interval(period);
    // A tick that lands during inference is skipped, never queued.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut degraded = false;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let failure = match tokio::time::timeout(ctx.inference_timeout, source.detect()).await {
                    Ok(Ok(Some(observation))) => {
                        let now = ctx.clock.now();
                        let candidates = detector.evaluate(&observation, now);
                        if !candidates.is_empty() {
                            ctx.engine.submit_all(candidates, now).await;
                        }
                        None
                    }
                    Ok(Ok(None)) => {
                        log_debug!("{} produced no observation", source.name());
                        None
                    }
                    Ok(Err(err)) => {
                        log_warn!("{} inference failed: {err:#}", source.name());
                        Some(format!("{err:#}"))
                    }
                    Err(_) => {
                        log_warn!(
                            "{} inference timeout (> {}ms)",
                            source.name(),
                            ctx.inference_timeout.as_millis()
                        );
                        Some(format!("no result within {}ms", ctx.inference_timeout.as_millis()))
                    }
                };

                if let Some(reason) = failure {
                    if !degraded {
                        degraded = true;
                        let candidate = Candidate::new(
                            AlertKind::DetectorDegraded,
                            format!("{} detection degraded: {reason}", detector.name()),
                        );
                        ctx.engine.submit(candidate, ctx.clock.now()).await;
                    }
                }
            }
            _ = ctx.cancel_token.cancelled() => {
                log_info!("{} loop shutting down", source.name());
                break;
            }
        }
    }

    source
}
