use serde::{Deserialize, Serialize};

/// Tunable thresholds for every detector adapter.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetectorConfig {
    pub face: FaceConfig,
    pub head: HeadConfig,
    pub gaze: GazeConfig,
    pub object: ObjectConfig,
    pub audio: AudioConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FaceConfig {
    /// Absence must last strictly longer than this...
    pub absence_min_ms: i64,
    /// ...and span strictly more consecutive empty frames than this.
    pub absence_min_frames: u32,
}

impl Default for FaceConfig {
    fn default() -> Self {
        Self {
            absence_min_ms: 2_000,
            absence_min_frames: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HeadConfig {
    /// Eye-to-eye distance of a frontal face, in landmark units.
    pub reference_eye_distance: f32,
    pub turned_ratio: f32,
}

impl Default for HeadConfig {
    fn default() -> Self {
        Self {
            reference_eye_distance: 60.0,
            turned_ratio: 0.75,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GazeConfig {
    pub left_eye_indices: Vec<usize>,
    pub right_eye_indices: Vec<usize>,
    pub nose_tip_index: usize,
    /// Fraction of the inter-eye distance the nose may drift from centre.
    pub offset_ratio: f32,
}

impl Default for GazeConfig {
    fn default() -> Self {
        Self {
            left_eye_indices: vec![33, 133, 160, 159, 158, 144, 145, 153],
            right_eye_indices: vec![362, 263, 387, 386, 385, 373, 374, 380],
            nose_tip_index: 1,
            offset_ratio: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ObjectConfig {
    pub phone_label: String,
    pub min_score: f32,
}

impl Default for ObjectConfig {
    fn default() -> Self {
        Self {
            phone_label: "cell phone".into(),
            min_score: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    /// Frames with a mean band energy below this are silence.
    pub silence_energy: f32,
    pub band_active_energy: f32,
    pub min_active_bands: usize,
    /// Loud frames required before band counts enter the window.
    pub warmup_frames: u32,
    pub window_len: usize,
    pub window_mean_threshold: f32,
    /// Loud frames required before the condition can fire.
    pub confirm_frames: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            silence_energy: 20.0,
            band_active_energy: 30.0,
            min_active_bands: 2,
            warmup_frames: 5,
            window_len: 20,
            window_mean_threshold: 1.5,
            confirm_frames: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    pub span_ratio: f64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { span_ratio: 1.5 }
    }
}
