// Adaptive lookahead - Widens the scheduling window when passes run slow

use std::collections::VecDeque;
use std::time::Duration;

const HISTORY: usize = 10;
const STEP_SECS: f64 = 0.01;
/// Grow when the slowest recent pass exceeds this share of the window
const GROW_RATIO: f64 = 0.5;
/// Shrink when the average pass is below this share of the window
const SHRINK_RATIO: f64 = 0.1;

/// Lookahead window, optionally tuned from measured pass durations
#[derive(Debug, Clone)]
pub struct Lookahead {
    window: f64,
    min: f64,
    max: f64,
    adaptive: bool,
    history: VecDeque<f64>,
}

impl Lookahead {
    pub fn fixed(window: f64) -> Self {
        Self {
            window,
            min: window,
            max: window,
            adaptive: false,
            history: VecDeque::with_capacity(HISTORY),
        }
    }

    pub fn adaptive(initial: f64, min: f64, max: f64) -> Self {
        Self {
            window: initial.clamp(min, max),
            min,
            max,
            adaptive: true,
            history: VecDeque::with_capacity(HISTORY),
        }
    }

    /// Current window in seconds
    pub fn window(&self) -> f64 {
        self.window
    }

    pub fn is_adaptive(&self) -> bool {
        self.adaptive
    }

    /// Record how long a scheduling pass took; returns the new window if it changed
    pub fn record_pass(&mut self, elapsed: Duration) -> Option<f64> {
        if !self.adaptive {
            return None;
        }
        if self.history.len() == HISTORY {
            self.history.pop_front();
        }
        self.history.push_back(elapsed.as_secs_f64());

        let max = self.history.iter().copied().fold(0.0, f64::max);
        let avg = self.history.iter().sum::<f64>() / self.history.len() as f64;

        let previous = self.window;
        if max > self.window * GROW_RATIO {
            self.window = (self.window + STEP_SECS).min(self.max);
        } else if avg < self.window * SHRINK_RATIO {
            self.window = (self.window - STEP_SECS).max(self.min);
        }

        (self.window != previous).then_some(self.window)
    }

    pub fn reset_history(&mut self) {
        self.history.clear();
    }
}
