use chrono::{DateTime, Utc};

use crate::detectors::config::GazeConfig;
use crate::detectors::face::FacePresence;
use crate::detectors::Detector;
use crate::models::{AlertKind, Candidate, Observation, Point};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GazeSample {
    /// Signed horizontal distance of the nose tip from the eye midpoint.
    pub nose_offset: f32,
    pub eye_distance: f32,
}

fn mean_of(mesh: &[Point], indices: &[usize]) -> Option<Point> {
    if indices.is_empty() {
        return None;
    }
    let mut sum = Point::default();
    for &index in indices {
        let point = mesh.get(index)?;
        sum.x += point.x;
        sum.y += point.y;
    }
    let n = indices.len() as f32;
    Some(Point::new(sum.x / n, sum.y / n))
}

/// Derives a gaze sample from a full landmark mesh. Returns `None` when the
/// mesh lacks any required landmark.
pub fn sample_from_mesh(mesh: &[Point], config: &GazeConfig) -> Option<GazeSample> {
    let left = mean_of(mesh, &config.left_eye_indices)?;
    let right = mean_of(mesh, &config.right_eye_indices)?;
    let nose = mesh.get(config.nose_tip_index)?;

    let center_x = (left.x + right.x) / 2.0;
    Some(GazeSample {
        nose_offset: nose.x - center_x,
        eye_distance: (right.x - left.x).abs(),
    })
}

pub fn is_looking_away(sample: GazeSample, config: &GazeConfig) -> bool {
    sample.nose_offset.abs() > sample.eye_distance * config.offset_ratio
}

/// Evaluates gaze samples delivered directly by a landmark source rather
/// than derived from a face set. With a [`FacePresence`] attached, samples
/// only count while the latest face set held exactly one face.
pub struct GazeDetector {
    config: GazeConfig,
    presence: Option<FacePresence>,
}

impl GazeDetector {
    pub fn new(config: GazeConfig) -> Self {
        Self {
            config,
            presence: None,
        }
    }

    pub fn with_presence(mut self, presence: FacePresence) -> Self {
        self.presence = Some(presence);
        self
    }
}

impl Detector for GazeDetector {
    fn name(&self) -> &'static str {
        "gaze"
    }

    fn evaluate(&mut self, observation: &Observation, _now: DateTime<Utc>) -> Vec<Candidate> {
        let Observation::GazeSample {
            nose_offset,
            eye_distance,
        } = observation
        else {
            return Vec::new();
        };
        if let Some(presence) = &self.presence {
            if !presence.exactly_one() {
                return Vec::new();
            }
        }

        let sample = GazeSample {
            nose_offset: *nose_offset,
            eye_distance: *eye_distance,
        };
        if is_looking_away(sample, &self.config) {
            vec![Candidate::new(AlertKind::LookingAway, "Looking away from the screen")]
        } else {
            Vec::new()
        }
    }
}
