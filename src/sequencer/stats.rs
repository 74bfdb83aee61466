// Scheduler statistics - Counters and per-bar timing summaries

use crate::clock::ClockTime;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SchedulerStats {
    pub passes: u64,
    pub steps: u64,
    pub triggers: u64,
    /// Triggers skipped because of a missing buffer, voice limit or full queue
    pub dropped_triggers: u64,
    /// Steps whose time had already passed and were moved to "now"
    pub late_steps: u64,
    pub max_lateness: f64,
    pub lookahead: f64,
}

/// Timing of one completed bar
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarSummary {
    pub bar: u64,
    pub steps: u32,
    pub first_step: ClockTime,
    pub last_step: ClockTime,
    /// Largest difference between a step gap and the nominal step length
    pub max_deviation: f64,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct BarTiming {
    bar: Option<u64>,
    steps: u32,
    first_step: ClockTime,
    last_step: ClockTime,
    expected_gap: f64,
    max_deviation: f64,
    last_summary: Option<BarSummary>,
}

impl BarTiming {
    /// Record a scheduled step; returns the summary of the bar it closes
    pub fn record(&mut self, bar: u64, time: ClockTime, step_duration: f64) -> Option<BarSummary> {
        let mut closed = None;
        match self.bar {
            Some(current) if current == bar => {
                let deviation = ((time - self.last_step) - self.expected_gap).abs();
                self.max_deviation = self.max_deviation.max(deviation);
                self.steps += 1;
            }
            _ => {
                closed = self.summary();
                self.bar = Some(bar);
                self.steps = 1;
                self.first_step = time;
                self.max_deviation = 0.0;
            }
        }
        self.last_step = time;
        self.expected_gap = step_duration;
        if closed.is_some() {
            self.last_summary = closed;
        }
        closed
    }

    fn summary(&self) -> Option<BarSummary> {
        self.bar.map(|bar| BarSummary {
            bar,
            steps: self.steps,
            first_step: self.first_step,
            last_step: self.last_step,
            max_deviation: self.max_deviation,
        })
    }

    pub fn last_summary(&self) -> Option<BarSummary> {
        self.last_summary
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
