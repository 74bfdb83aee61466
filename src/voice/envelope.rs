// Gain envelope - Piecewise-linear gain curve in clock time
// Every envelope starts and ends at zero gain (no clicks at either edge)

use crate::clock::ClockTime;

const MAX_POINTS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopePoint {
    pub time: ClockTime,
    pub gain: f32,
}

impl EnvelopePoint {
    const ZERO: EnvelopePoint = EnvelopePoint {
        time: 0.0,
        gain: 0.0,
    };
}

/// Attack / hold / release curve, stored inline so it can cross to the
/// audio thread without allocating
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainEnvelope {
    points: [EnvelopePoint; MAX_POINTS],
    len: usize,
}

impl GainEnvelope {
    /// Ramp 0 -> `level` over `attack`, hold, ramp back to 0 ending at `stop`
    ///
    /// Ramps are shortened to half the voice length when they would overlap.
    pub fn new(start: ClockTime, stop: ClockTime, level: f32, attack: f64, release: f64) -> Self {
        let stop = stop.max(start);
        let half = (stop - start) / 2.0;
        let attack = attack.max(0.0).min(half);
        let release = release.max(0.0).min(half);

        let mut env = Self::empty();
        env.push(start, 0.0);
        env.push(start + attack, level);
        env.push(stop - release, level);
        env.push(stop, 0.0);
        env
    }

    /// Silent envelope that ends where it starts
    pub fn silent(at: ClockTime) -> Self {
        let mut env = Self::empty();
        env.push(at, 0.0);
        env.push(at, 0.0);
        env
    }

    fn empty() -> Self {
        Self {
            points: [EnvelopePoint::ZERO; MAX_POINTS],
            len: 0,
        }
    }

    fn push(&mut self, time: ClockTime, gain: f32) {
        if self.len == MAX_POINTS {
            // drop the oldest interior breakpoint, keeping the initial zero
            self.points.copy_within(2..MAX_POINTS, 1);
            self.len -= 1;
        }
        self.points[self.len] = EnvelopePoint { time, gain };
        self.len += 1;
    }

    pub fn points(&self) -> &[EnvelopePoint] {
        &self.points[..self.len]
    }

    pub fn start_time(&self) -> ClockTime {
        self.points[0].time
    }

    /// Time at which the gain is back to zero for good
    pub fn end_time(&self) -> ClockTime {
        self.points[self.len - 1].time
    }

    /// Highest gain reached anywhere on the curve
    pub fn peak(&self) -> f32 {
        self.points().iter().fold(0.0, |acc, p| acc.max(p.gain))
    }

    pub fn value_at(&self, t: ClockTime) -> f32 {
        let points = self.points();
        if t <= points[0].time {
            return points[0].gain;
        }
        for pair in points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t < b.time {
                let span = b.time - a.time;
                let frac = ((t - a.time) / span) as f32;
                return a.gain + (b.gain - a.gain) * frac;
            }
        }
        points[self.len - 1].gain
    }

    /// Copy of this envelope that ramps from its value at `at` down to zero
    /// over `fade`, never ending later than the original curve
    pub fn release_at(&self, at: ClockTime, fade: f64) -> Self {
        let end = self.end_time();
        if at >= end {
            return *self;
        }
        if at <= self.start_time() {
            return Self::silent(self.start_time());
        }

        let gain = self.value_at(at);
        let mut env = Self::empty();
        for point in self.points().iter().filter(|p| p.time < at) {
            env.push(point.time, point.gain);
        }
        env.push(at, gain);
        env.push((at + fade.max(0.0)).min(end), 0.0);
        env
    }
}
