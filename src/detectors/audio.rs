use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::detectors::config::AudioConfig;
use crate::detectors::Detector;
use crate::models::{AlertKind, Candidate, Observation};

/// Multi-speaker detection over a stream of three-band spectra.
///
/// Two gates must both pass before firing: a run of consecutive loud frames
/// and a rolling mean of active band counts. Firing resets both, so a new run
/// has to build up from scratch.
pub struct AudioDetector {
    config: AudioConfig,
    loud_frames: u32,
    band_window: VecDeque<usize>,
}

impl AudioDetector {
    pub fn new(config: AudioConfig) -> Self {
        let window_len = config.window_len.max(1);
        Self {
            config,
            loud_frames: 0,
            band_window: VecDeque::with_capacity(window_len),
        }
    }

    pub fn loud_frames(&self) -> u32 {
        self.loud_frames
    }

    fn window_mean(&self) -> f32 {
        if self.band_window.is_empty() {
            return 0.0;
        }
        self.band_window.iter().sum::<usize>() as f32 / self.band_window.len() as f32
    }

    /// Feeds one frame; true when multiple voices are confirmed.
    pub fn feed(&mut self, bands: [f32; 3]) -> bool {
        let average = bands.iter().sum::<f32>() / bands.len() as f32;
        if average < self.config.silence_energy {
            self.loud_frames = self.loud_frames.saturating_sub(1);
            return false;
        }

        self.loud_frames = self.loud_frames.saturating_add(1);

        let active = bands
            .iter()
            .filter(|&&energy| energy > self.config.band_active_energy)
            .count();

        if active >= self.config.min_active_bands && self.loud_frames > self.config.warmup_frames {
            self.band_window.push_back(active);
            while self.band_window.len() > self.config.window_len.max(1) {
                self.band_window.pop_front();
            }
        }

        if self.window_mean() >= self.config.window_mean_threshold
            && self.loud_frames > self.config.confirm_frames
        {
            self.band_window.clear();
            self.loud_frames = 0;
            return true;
        }

        false
    }
}

impl Detector for AudioDetector {
    fn name(&self) -> &'static str {
        "audio"
    }

    fn evaluate(&mut self, observation: &Observation, _now: DateTime<Utc>) -> Vec<Candidate> {
        let Observation::AudioFrame { band_energies } = observation else {
            return Vec::new();
        };

        if self.feed(*band_energies) {
            vec![Candidate::new(
                AlertKind::MultipleVoices,
                "Multiple voices detected",
            )]
        } else {
            Vec::new()
        }
    }
}
