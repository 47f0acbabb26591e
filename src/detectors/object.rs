use chrono::{DateTime, Utc};

use crate::detectors::config::ObjectConfig;
use crate::detectors::Detector;
use crate::models::{AlertKind, Candidate, DetectedObject, Observation};

pub struct ObjectDetector {
    config: ObjectConfig,
}

impl ObjectDetector {
    pub fn new(config: ObjectConfig) -> Self {
        Self { config }
    }

    pub fn phone_in(&self, objects: &[DetectedObject]) -> Option<f32> {
        objects
            .iter()
            .filter(|o| o.class == self.config.phone_label && o.score > self.config.min_score)
            .map(|o| o.score)
            .reduce(f32::max)
    }
}

impl Detector for ObjectDetector {
    fn name(&self) -> &'static str {
        "object"
    }

    fn evaluate(&mut self, observation: &Observation, _now: DateTime<Utc>) -> Vec<Candidate> {
        let Observation::ObjectSet { objects } = observation else {
            return Vec::new();
        };

        match self.phone_in(objects) {
            Some(score) => vec![Candidate::new(
                AlertKind::PhoneDetected,
                format!("Mobile phone detected ({:.0}% confidence)", score * 100.0),
            )],
            None => Vec::new(),
        }
    }
}
