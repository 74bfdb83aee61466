// Timeline - Tempo and meter arithmetic for the step clock

use serde::{Deserialize, Serialize};
use std::fmt;

pub const MIN_BPM: f64 = 20.0;
pub const MAX_BPM: f64 = 999.0;

/// Tempo in BPM (Beats Per Minute), always within [MIN_BPM, MAX_BPM]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tempo {
    bpm: f64,
}

impl Tempo {
    /// Returns `None` for non-finite or non-positive BPM; other values are clamped
    pub fn new(bpm: f64) -> Option<Self> {
        if bpm.is_finite() && bpm > 0.0 {
            Some(Self {
                bpm: bpm.clamp(MIN_BPM, MAX_BPM),
            })
        } else {
            None
        }
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Duration of one beat in seconds
    pub fn beat_duration_seconds(&self) -> f64 {
        60.0 / self.bpm
    }

    /// Duration of one grid step in seconds
    pub fn step_duration_seconds(&self, steps_per_beat: u32) -> f64 {
        self.beat_duration_seconds() / steps_per_beat.max(1) as f64
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self { bpm: 120.0 }
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} BPM", self.bpm)
    }
}

/// Grid resolution and bar length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meter {
    pub steps_per_beat: u32,
    pub beats_per_bar: u32,
}

impl Meter {
    pub fn new(steps_per_beat: u32, beats_per_bar: u32) -> Self {
        Self {
            steps_per_beat: steps_per_beat.max(1),
            beats_per_bar: beats_per_bar.max(1),
        }
    }

    pub fn steps_per_bar(&self) -> u64 {
        self.steps_per_beat as u64 * self.beats_per_bar as u64
    }

    /// Bar/beat of a step counted since the transport started
    pub fn position(&self, absolute_step: u64) -> StepPosition {
        let steps_per_bar = self.steps_per_bar();
        let in_bar = absolute_step % steps_per_bar;
        StepPosition {
            bar: absolute_step / steps_per_bar,
            beat: (in_bar / self.steps_per_beat as u64) as u32,
            on_beat: in_bar % self.steps_per_beat as u64 == 0,
            on_bar: in_bar == 0,
        }
    }
}

impl Default for Meter {
    fn default() -> Self {
        Self::new(4, 4)
    }
}

impl fmt::Display for Meter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/4 @ 1/{}", self.beats_per_bar, self.steps_per_beat * 4)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepPosition {
    pub bar: u64,
    pub beat: u32,
    pub on_beat: bool,
    pub on_bar: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tempo_rejects_non_positive() {
        assert!(Tempo::new(0.0).is_none());
        assert!(Tempo::new(-120.0).is_none());
        assert!(Tempo::new(f64::NAN).is_none());
        assert_eq!(Tempo::new(5.0).map(|t| t.bpm()), Some(MIN_BPM));
        assert_eq!(Tempo::new(5000.0).map(|t| t.bpm()), Some(MAX_BPM));
    }

    #[test]
    fn test_step_duration() {
        let tempo = Tempo::new(120.0).unwrap();
        assert_eq!(tempo.beat_duration_seconds(), 0.5);
        assert_eq!(tempo.step_duration_seconds(4), 0.125);
        assert_eq!(format!("{}", tempo), "120.0 BPM");
    }

    #[test]
    fn test_meter_position() {
        let meter = Meter::default();
        let p = meter.position(0);
        assert!(p.on_bar && p.on_beat);

        let p = meter.position(5);
        assert_eq!((p.bar, p.beat), (0, 1));
        assert!(!p.on_beat);

        let p = meter.position(36);
        assert_eq!((p.bar, p.beat), (2, 1));
        assert!(p.on_beat && !p.on_bar);
    }

    #[test]
    fn test_meter_three_four() {
        let meter = Meter::new(2, 3);
        assert_eq!(meter.steps_per_bar(), 6);
        assert!(meter.position(6).on_bar);
        assert_eq!(meter.position(4).beat, 2);
    }
}
