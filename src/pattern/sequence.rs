// Sequence - Named step grid shared by all channels

use super::grid::StepGrid;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Sequence {
    pub name: String,
    pub grid: Arc<StepGrid>,
    /// Eligible for continuous playback
    pub live: bool,
}

impl Sequence {
    pub fn new(name: impl Into<String>, channels: usize, steps: usize) -> Self {
        Self::with_grid(name, StepGrid::new(channels, steps))
    }

    pub fn with_grid(name: impl Into<String>, grid: StepGrid) -> Self {
        Self {
            name: name.into(),
            grid: Arc::new(grid),
            live: true,
        }
    }

    pub fn steps(&self) -> usize {
        self.grid.steps()
    }
}
