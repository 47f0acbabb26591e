use crate::detectors::config::HeadConfig;
use crate::models::Point;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadReading {
    pub ratio: f32,
    pub turned: bool,
}

/// Compares the projected eye spacing against a frontal reference. A head
/// rotated away compresses the horizontal distance between the eyes.
pub fn evaluate_head(left_eye: Point, right_eye: Point, config: &HeadConfig) -> HeadReading {
    let distance = (right_eye.x - left_eye.x).abs();
    let ratio = if config.reference_eye_distance > 0.0 {
        distance / config.reference_eye_distance
    } else {
        1.0
    };

    HeadReading {
        ratio,
        turned: ratio < config.turned_ratio,
    }
}
