//! Raw per-tick observations produced by signal sources.
//!
//! Observations carry no timestamp of their own: the tick that delivers one
//! supplies `now` to the detector that evaluates it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// One face reported by the face/landmark model.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DetectedFace {
    #[serde(default)]
    pub bbox: BoundingBox,
    /// Left and right eye keypoints, when the model reports them.
    #[serde(default)]
    pub eyes: Option<(Point, Point)>,
    /// Full landmark mesh, indexed the way the landmark model numbers it.
    #[serde(default)]
    pub mesh: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedObject {
    pub class: String,
    pub score: f32,
    #[serde(default)]
    pub bbox: BoundingBox,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "input", rename_all = "camelCase")]
pub enum InputKind {
    Copy,
    Paste,
    Cut,
    ContextMenu,
    Key {
        key: String,
        #[serde(default)]
        ctrl: bool,
        #[serde(default)]
        alt: bool,
        #[serde(default)]
        meta: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Observation {
    FaceSet {
        faces: Vec<DetectedFace>,
    },
    #[serde(rename_all = "camelCase")]
    GazeSample {
        nose_offset: f32,
        eye_distance: f32,
    },
    #[serde(rename_all = "camelCase")]
    AudioFrame {
        band_energies: [f32; 3],
    },
    ObjectSet {
        objects: Vec<DetectedObject>,
    },
    DisplayGeometry {
        screen: Size,
        available: Size,
    },
    VisibilityEvent {
        hidden: bool,
    },
    InputEvent {
        kind: InputKind,
    },
}

impl Observation {
    /// Builds an audio frame from an analyser's byte spectrum by splitting the
    /// bins into low/mid/high thirds and averaging each.
    pub fn audio_from_spectrum(bins: &[u8]) -> Self {
        let third = bins.len() / 3;
        let band = |slice: &[u8]| -> f32 {
            if slice.is_empty() {
                0.0
            } else {
                slice.iter().map(|&b| f32::from(b)).sum::<f32>() / slice.len() as f32
            }
        };

        Observation::AudioFrame {
            band_energies: [
                band(&bins[..third]),
                band(&bins[third..third * 2]),
                band(&bins[third * 2..]),
            ],
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Observation::FaceSet { .. } => "face_set",
            Observation::GazeSample { .. } => "gaze_sample",
            Observation::AudioFrame { .. } => "audio_frame",
            Observation::ObjectSet { .. } => "object_set",
            Observation::DisplayGeometry { .. } => "display_geometry",
            Observation::VisibilityEvent { .. } => "visibility_event",
            Observation::InputEvent { .. } => "input_event",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spectrum_splits_into_three_band_averages() {
        let mut bins = vec![10u8; 4];
        bins.extend([40u8; 4]);
        bins.extend([70u8, 70, 70, 70, 100]);

        let Observation::AudioFrame { band_energies } = Observation::audio_from_spectrum(&bins)
        else {
            panic!("expected audio frame");
        };

        assert_eq!(band_energies[0], 10.0);
        assert_eq!(band_energies[1], 40.0);
        assert_eq!(band_energies[2], 76.0);
    }

    #[test]
    fn empty_spectrum_is_silent() {
        let obs = Observation::audio_from_spectrum(&[]);
        assert_eq!(
            obs,
            Observation::AudioFrame {
                band_energies: [0.0, 0.0, 0.0]
            }
        );
    }

    #[test]
    fn observations_parse_from_tagged_json() {
        let raw = r#"{"type":"objectSet","objects":[{"class":"cell phone","score":0.9}]}"#;
        let obs: Observation = serde_json::from_str(raw).unwrap();
        match obs {
            Observation::ObjectSet { objects } => {
                assert_eq!(objects.len(), 1);
                assert_eq!(objects[0].class, "cell phone");
            }
            other => panic!("unexpected observation {other:?}"),
        }

        let raw = r#"{"type":"inputEvent","kind":{"input":"key","key":"Tab","alt":true}}"#;
        let obs: Observation = serde_json::from_str(raw).unwrap();
        assert_eq!(
            obs,
            Observation::InputEvent {
                kind: InputKind::Key {
                    key: "Tab".into(),
                    ctrl: false,
                    alt: true,
                    meta: false,
                }
            }
        );
    }
}
