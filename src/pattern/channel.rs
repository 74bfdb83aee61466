// Channel - One sample lane of the step grid and its playback parameters

use crate::sampler::SampleRef;
use serde::{Deserialize, Serialize};

pub const MAX_VOLUME: f32 = 3.0;
pub const MIN_PLAYBACK_SPEED: f64 = 0.01;
pub const MAX_PLAYBACK_SPEED: f64 = 16.0;
pub const PITCH_RANGE_SEMITONES: f64 = 48.0;

/// Sample lane with trim, direction, speed and level
///
/// Fields are public for reading; mutation goes through the setters, which
/// keep `0 <= trim_start <= trim_end <= 1`, `playback_speed > 0` and
/// `volume` within `[0, MAX_VOLUME]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub name: String,
    pub sample: Option<SampleRef>,
    pub trim_start: f64,
    pub trim_end: f64,
    pub reverse: bool,
    pub playback_speed: f64,
    /// Transposition applied on top of `playback_speed`
    pub pitch_semitones: f64,
    pub volume: f32,
    pub muted: bool,
    /// Requested attack length in seconds (0 = engine minimum)
    pub fade_in: f64,
    /// Requested release length in seconds (0 = engine minimum)
    pub fade_out: f64,
}

impl Channel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sample: None,
            trim_start: 0.0,
            trim_end: 1.0,
            reverse: false,
            playback_speed: 1.0,
            pitch_semitones: 0.0,
            volume: 1.0,
            muted: false,
            fade_in: 0.0,
            fade_out: 0.0,
        }
    }

    pub fn with_sample(mut self, sample: SampleRef) -> Self {
        self.sample = Some(sample);
        self
    }

    pub fn set_sample(&mut self, sample: Option<SampleRef>) {
        self.sample = sample;
    }

    /// Set the trim window; values are clamped to [0, 1] and swapped if inverted
    pub fn set_trim(&mut self, start: f64, end: f64) {
        let (start, end) = crate::trim::normalize_trim(start, end);
        self.trim_start = start;
        self.trim_end = end;
    }

    pub fn set_reverse(&mut self, reverse: bool) {
        self.reverse = reverse;
    }

    pub fn set_playback_speed(&mut self, speed: f64) {
        if speed.is_finite() && speed > 0.0 {
            self.playback_speed = speed.clamp(MIN_PLAYBACK_SPEED, MAX_PLAYBACK_SPEED);
        }
    }

    pub fn set_pitch(&mut self, semitones: f64) {
        if semitones.is_finite() {
            self.pitch_semitones = semitones.clamp(-PITCH_RANGE_SEMITONES, PITCH_RANGE_SEMITONES);
        }
    }

    pub fn set_volume(&mut self, volume: f32) {
        if volume.is_finite() {
            self.volume = volume.clamp(0.0, MAX_VOLUME);
        }
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn set_fades(&mut self, fade_in: f64, fade_out: f64) {
        let sanitize = |v: f64| if v.is_finite() { v.max(0.0) } else { 0.0 };
        self.fade_in = sanitize(fade_in);
        self.fade_out = sanitize(fade_out);
    }

    /// Effective resampling ratio: speed combined with pitch transposition
    pub fn playback_rate(&self) -> f64 {
        let speed = if self.playback_speed.is_finite() && self.playback_speed > 0.0 {
            self.playback_speed
        } else {
            1.0
        };
        speed * semitones_to_ratio(self.pitch_semitones)
    }
}

impl Default for Channel {
    fn default() -> Self {
        Self::new("Channel")
    }
}

/// Frequency ratio for a transposition in semitones
pub fn semitones_to_ratio(semitones: f64) -> f64 {
    if semitones.is_finite() {
        2f64.powf(semitones / 12.0)
    } else {
        1.0
    }
}
