use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::detectors::{
    AudioDetector, Detector, DetectorConfig, DisplayDetector, FaceDetector, FacePresence,
    GazeDetector, ObjectDetector,
};
use crate::models::Observation;
use crate::settings::Schedule;

/// The periodic signal a source samples. Each kind runs on its own loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceKind {
    Face,
    Gaze,
    Object,
    Audio,
    Display,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Face => "face",
            SourceKind::Gaze => "gaze",
            SourceKind::Object => "object",
            SourceKind::Audio => "audio",
            SourceKind::Display => "display",
        }
    }

    pub fn period(&self, schedule: &Schedule) -> Duration {
        let ms = match self {
            SourceKind::Face => schedule.face_ms,
            SourceKind::Gaze => schedule.gaze_ms,
            SourceKind::Object => schedule.object_ms,
            SourceKind::Audio => schedule.audio_ms,
            SourceKind::Display => schedule.display_ms,
        };
        // A zero period would make `interval` panic.
        Duration::from_millis(ms.max(1))
    }

    /// Fresh detector for observations of this kind. When `presence` is set,
    /// face detectors publish their face count to it and gaze detectors only
    /// fire while it reads exactly one face.
    pub fn detector(
        &self,
        config: &DetectorConfig,
        presence: Option<&FacePresence>,
    ) -> Box<dyn Detector> {
        match (self, presence) {
            (SourceKind::Face, Some(presence)) => {
                Box::new(FaceDetector::new(config.clone()).with_presence(presence.clone()))
            }
            (SourceKind::Face, None) => Box::new(FaceDetector::new(config.clone())),
            (SourceKind::Gaze, Some(presence)) => {
                Box::new(GazeDetector::new(config.gaze.clone()).with_presence(presence.clone()))
            }
            (SourceKind::Gaze, None) => Box::new(GazeDetector::new(config.gaze.clone())),
            (SourceKind::Object, _) => Box::new(ObjectDetector::new(config.object.clone())),
            (SourceKind::Audio, _) => Box::new(AudioDetector::new(config.audio.clone())),
            (SourceKind::Display, _) => Box::new(DisplayDetector::new(config.display.clone())),
        }
    }
}

/// A camera, microphone or screen backend. `open` acquires the device,
/// `detect` runs one inference and `close` releases the device.
#[async_trait]
pub trait SignalSource: Send {
    fn kind(&self) -> SourceKind;

    fn name(&self) -> &str;

    async fn open(&mut self) -> Result<()>;

    /// `Ok(None)` means the backend produced nothing this tick.
    async fn detect(&mut self) -> Result<Option<Observation>>;

    async fn close(&mut self);
}
