pub mod audio;
pub mod config;
pub mod environment;
pub mod face;
pub mod gaze;
pub mod head;
pub mod object;

use chrono::{DateTime, Utc};

use crate::models::{Candidate, Observation};

pub use audio::AudioDetector;
pub use config::DetectorConfig;
pub use environment::{DisplayDetector, InputGuard, InputVerdict, VisibilityDetector};
pub use face::{FaceDetector, FacePresence};
pub use gaze::GazeDetector;
pub use object::ObjectDetector;

/// Converts raw observations into alert candidates. Implementations own
/// their confirmation state and never touch alert bookkeeping.
pub trait Detector: Send {
    fn name(&self) -> &'static str;

    /// Observations of a variant the detector does not handle yield nothing.
    fn evaluate(&mut self, observation: &Observation, now: DateTime<Utc>) -> Vec<Candidate>;
}

/// One instance of every detector, routing each observation to the one that
/// handles its variant.
pub struct DetectorSet {
    face: FaceDetector,
    gaze: GazeDetector,
    object: ObjectDetector,
    audio: AudioDetector,
    display: DisplayDetector,
    visibility: VisibilityDetector,
    input: InputGuard,
}

impl DetectorSet {
    pub fn new(config: &DetectorConfig) -> Self {
        let presence = FacePresence::new();
        Self {
            face: FaceDetector::new(config.clone()).with_presence(presence.clone()),
            gaze: GazeDetector::new(config.gaze.clone()).with_presence(presence),
            object: ObjectDetector::new(config.object.clone()),
            audio: AudioDetector::new(config.audio.clone()),
            display: DisplayDetector::new(config.display.clone()),
            visibility: VisibilityDetector::new(),
            input: InputGuard::new(),
        }
    }

    pub fn evaluate(&mut self, observation: &Observation, now: DateTime<Utc>) -> Vec<Candidate> {
        let detector: &mut dyn Detector = match observation {
            Observation::FaceSet { .. } => &mut self.face,
            Observation::GazeSample { .. } => &mut self.gaze,
            Observation::AudioFrame { .. } => &mut self.audio,
            Observation::ObjectSet { .. } => &mut self.object,
            Observation::DisplayGeometry { .. } => &mut self.display,
            Observation::VisibilityEvent { .. } => &mut self.visibility,
            Observation::InputEvent { .. } => &mut self.input,
        };
        detector.evaluate(observation, now)
    }
}
