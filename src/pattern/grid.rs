// Step grid - Channel x step matrix of trigger cells
// Each cell is one atomic byte, so edits from a UI thread are never torn

use std::sync::atomic::{AtomicU8, Ordering};

const TRIGGER: u8 = 0b001;
const OVERRIDE: u8 = 0b010;
const OVERRIDE_REVERSE: u8 = 0b100;

/// Decoded cell value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepCell {
    pub trigger: bool,
    /// Per-step direction override; `None` uses the channel setting
    pub reverse: Option<bool>,
}

impl StepCell {
    pub const OFF: StepCell = StepCell {
        trigger: false,
        reverse: None,
    };

    pub const ON: StepCell = StepCell {
        trigger: true,
        reverse: None,
    };

    fn to_bits(self) -> u8 {
        let mut bits = 0;
        if self.trigger {
            bits |= TRIGGER;
        }
        match self.reverse {
            Some(true) => bits |= OVERRIDE | OVERRIDE_REVERSE,
            Some(false) => bits |= OVERRIDE,
            None => {}
        }
        bits
    }

    fn from_bits(bits: u8) -> Self {
        Self {
            trigger: bits & TRIGGER != 0,
            reverse: if bits & OVERRIDE != 0 {
                Some(bits & OVERRIDE_REVERSE != 0)
            } else {
                None
            },
        }
    }
}

/// Fixed-width trigger matrix
///
/// Width (`steps`) and height (`channels`) never change after creation.
/// Out-of-range reads return [`StepCell::OFF`]; out-of-range writes are ignored.
#[derive(Debug)]
pub struct StepGrid {
    channels: usize,
    steps: usize,
    cells: Box<[AtomicU8]>,
}

impl StepGrid {
    pub fn new(channels: usize, steps: usize) -> Self {
        let steps = steps.max(1);
        let cells = (0..channels * steps).map(|_| AtomicU8::new(0)).collect();
        Self {
            channels,
            steps,
            cells,
        }
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    fn index(&self, channel: usize, step: usize) -> Option<usize> {
        (channel < self.channels && step < self.steps).then(|| channel * self.steps + step)
    }

    pub fn cell(&self, channel: usize, step: usize) -> StepCell {
        self.index(channel, step)
            .map(|i| StepCell::from_bits(self.cells[i].load(Ordering::Relaxed)))
            .unwrap_or(StepCell::OFF)
    }

    pub fn is_active(&self, channel: usize, step: usize) -> bool {
        self.cell(channel, step).trigger
    }

    pub fn set_cell(&self, channel: usize, step: usize, cell: StepCell) {
        if let Some(i) = self.index(channel, step) {
            self.cells[i].store(cell.to_bits(), Ordering::Relaxed);
        }
    }

    pub fn set_active(&self, channel: usize, step: usize, active: bool) {
        if let Some(i) = self.index(channel, step) {
            if active {
                self.cells[i].fetch_or(TRIGGER, Ordering::Relaxed);
            } else {
                self.cells[i].fetch_and(!TRIGGER, Ordering::Relaxed);
            }
        }
    }

    /// Flip a trigger, returning the new state
    pub fn toggle(&self, channel: usize, step: usize) -> bool {
        match self.index(channel, step) {
            Some(i) => self.cells[i].fetch_xor(TRIGGER, Ordering::Relaxed) & TRIGGER == 0,
            None => false,
        }
    }

    pub fn set_reverse_override(&self, channel: usize, step: usize, reverse: Option<bool>) {
        if let Some(i) = self.index(channel, step) {
            let overrides = StepCell { trigger: false, reverse }.to_bits();
            // a concurrent toggle of the trigger bit must survive
            let _ = self.cells[i].fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bits| {
                Some((bits & TRIGGER) | overrides)
            });
        }
    }

    /// Build a grid from one pattern string per channel (`x` = trigger)
    pub fn from_patterns(steps: usize, patterns: &[&str]) -> Self {
        let grid = Self::new(patterns.len(), steps);
        for (channel, pattern) in patterns.iter().enumerate() {
            for (step, c) in pattern.chars().filter(|c| !c.is_whitespace()).enumerate() {
                match c {
                    'x' | 'X' => grid.set_cell(channel, step, StepCell::ON),
                    'r' | 'R' => grid.set_cell(
                        channel,
                        step,
                        StepCell {
                            trigger: true,
                            reverse: Some(true),
                        },
                    ),
                    _ => {}
                }
            }
        }
        grid
    }
}
