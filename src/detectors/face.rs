use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::detectors::config::DetectorConfig;
use crate::detectors::gaze::{is_looking_away, sample_from_mesh};
use crate::detectors::head::evaluate_head;
use crate::detectors::Detector;
use crate::models::{AlertKind, Candidate, DetectedFace, Observation};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = false;

use crate::log_debug;

const UNKNOWN_COUNT: usize = usize::MAX;

/// Face count of the most recent face set, shared between the face detector
/// and a gaze detector fed by its own source.
#[derive(Debug, Clone)]
pub struct FacePresence {
    count: Arc<AtomicUsize>,
}

impl FacePresence {
    pub fn new() -> Self {
        Self {
            count: Arc::new(AtomicUsize::new(UNKNOWN_COUNT)),
        }
    }

    pub fn record(&self, faces: usize) {
        self.count.store(faces, Ordering::SeqCst);
    }

    pub fn last_count(&self) -> Option<usize> {
        match self.count.load(Ordering::SeqCst) {
            UNKNOWN_COUNT => None,
            count => Some(count),
        }
    }

    /// False until a face set has been seen.
    pub fn exactly_one(&self) -> bool {
        self.last_count() == Some(1)
    }
}

impl Default for FacePresence {
    fn default() -> Self {
        Self::new()
    }
}

/// Face presence and identity. A single face is further checked for head
/// orientation and gaze.
pub struct FaceDetector {
    config: DetectorConfig,
    absent_frames: u32,
    absent_since: Option<DateTime<Utc>>,
    presence: Option<FacePresence>,
}

impl FaceDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            config,
            absent_frames: 0,
            absent_since: None,
            presence: None,
        }
    }

    /// Publishes every face count to `presence`.
    pub fn with_presence(mut self, presence: FacePresence) -> Self {
        self.presence = Some(presence);
        self
    }

    pub fn absent_frames(&self) -> u32 {
        self.absent_frames
    }

    fn observe_faces(&mut self, faces: &[DetectedFace], now: DateTime<Utc>) -> Vec<Candidate> {
        if let Some(presence) = &self.presence {
            presence.record(faces.len());
        }

        if faces.is_empty() {
            return self.observe_absence(now).into_iter().collect();
        }

        self.absent_frames = 0;
        self.absent_since = None;

        if faces.len() > 1 {
            return vec![Candidate::new(
                AlertKind::MultipleFaces,
                format!("Multiple faces detected ({})", faces.len()),
            )];
        }

        self.observe_single(&faces[0])
    }

    fn observe_absence(&mut self, now: DateTime<Utc>) -> Option<Candidate> {
        self.absent_frames = self.absent_frames.saturating_add(1);
        let since = *self.absent_since.get_or_insert(now);
        let elapsed_ms = (now - since).num_milliseconds();

        log_debug!("no face: {} frames over {}ms", self.absent_frames, elapsed_ms);

        let face = &self.config.face;
        if elapsed_ms > face.absence_min_ms && self.absent_frames > face.absence_min_frames {
            Some(Candidate::new(
                AlertKind::NoFace,
                "No face detected - please stay in front of the camera",
            ))
        } else {
            None
        }
    }

    fn observe_single(&self, face: &DetectedFace) -> Vec<Candidate> {
        let mut candidates = Vec::new();

        if let Some((left, right)) = face.eyes {
            let reading = evaluate_head(left, right, &self.config.head);
            if reading.turned {
                candidates.push(Candidate::new(
                    AlertKind::HeadTurned,
                    format!("Head turned away from screen ({:.0}% of frontal)", reading.ratio * 100.0),
                ));
            }
        }

        if let Some(sample) = sample_from_mesh(&face.mesh, &self.config.gaze) {
            if is_looking_away(sample, &self.config.gaze) {
                candidates.push(Candidate::new(
                    AlertKind::LookingAway,
                    "Looking away from the screen",
                ));
            }
        }

        candidates
    }
}

impl Detector for FaceDetector {
    fn name(&self) -> &'static str {
        "face"
    }

    fn evaluate(&mut self, observation: &Observation, now: DateTime<Utc>) -> Vec<Candidate> {
        match observation {
            Observation::FaceSet { faces } => self.observe_faces(faces, now),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::config::GazeConfig;
    use crate::models::Point;
    use chrono::{Duration, TimeZone};

    fn t(ms: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap() + Duration::milliseconds(ms)
    }

    fn faces(n: usize) -> Observation {
        Observation::FaceSet {
            faces: vec![DetectedFace::default(); n],
        }
    }

    fn kinds(candidates: &[Candidate]) -> Vec<AlertKind> {
        candidates.iter().map(|c| c.kind).collect()
    }

    #[test]
    fn short_absence_then_detection_never_fires() {
        let mut detector = FaceDetector::new(DetectorConfig::default());
        let mut fired = Vec::new();
        for tick in 0..=(1_900 / 300) {
            fired.extend(detector.evaluate(&faces(0), t(tick * 300)));
        }
        fired.extend(detector.evaluate(&faces(1), t(2_100)));

        assert!(fired.is_empty());
        assert_eq!(detector.absent_frames(), 0);
    }

    #[test]
    fn sustained_absence_needs_both_duration_and_frames() {
        let mut detector = FaceDetector::new(DetectorConfig::default());

        // Two frames far apart: duration satisfied, frame count not.
        assert!(detector.evaluate(&faces(0), t(0)).is_empty());
        assert!(detector.evaluate(&faces(0), t(2_500)).is_empty());

        let mut detector = FaceDetector::new(DetectorConfig::default());
        let mut first_fire = None;
        for tick in 0..20 {
            let now = t(tick * 300);
            if !detector.evaluate(&faces(0), now).is_empty() {
                first_fire = Some(now);
                break;
            }
        }
        // 2100ms is the first tick strictly past 2000ms; frame 8 > 4.
        assert_eq!(first_fire, Some(t(2_100)));
    }

    #[test]
    fn detection_resets_absence_tracking() {
        let mut detector = FaceDetector::new(DetectorConfig::default());
        for tick in 0..6 {
            detector.evaluate(&faces(0), t(tick * 300));
        }
        detector.evaluate(&faces(2), t(1_800));
        // Fresh start: 2100 - 2100 = 0ms absent.
        assert!(detector.evaluate(&faces(0), t(2_100)).is_empty());
        assert_eq!(detector.absent_frames(), 1);
    }

    #[test]
    fn multiple_faces_fire_every_tick() {
        let mut detector = FaceDetector::new(DetectorConfig::default());
        assert_eq!(kinds(&detector.evaluate(&faces(2), t(0))), vec![AlertKind::MultipleFaces]);
        assert_eq!(kinds(&detector.evaluate(&faces(3), t(300))), vec![AlertKind::MultipleFaces]);
    }

    #[test]
    fn single_face_checks_head_and_gaze() {
        let config = DetectorConfig::default();
        let gaze = GazeConfig::default();
        let mut mesh = vec![Point::default(); 468];
        for &i in &gaze.left_eye_indices {
            mesh[i] = Point::new(100.0, 100.0);
        }
        for &i in &gaze.right_eye_indices {
            mesh[i] = Point::new(160.0, 100.0);
        }
        mesh[gaze.nose_tip_index] = Point::new(155.0, 130.0);

        let face = DetectedFace {
            eyes: Some((Point::new(100.0, 100.0), Point::new(130.0, 100.0))),
            mesh,
            ..DetectedFace::default()
        };

        let mut detector = FaceDetector::new(config);
        let candidates = detector.evaluate(&Observation::FaceSet { faces: vec![face] }, t(0));
        assert_eq!(kinds(&candidates), vec![AlertKind::HeadTurned, AlertKind::LookingAway]);
    }

    #[test]
    fn ignores_other_observations() {
        let mut detector = FaceDetector::new(DetectorConfig::default());
        assert!(detector
            .evaluate(&Observation::VisibilityEvent { hidden: true }, t(0))
            .is_empty());
    }
}
