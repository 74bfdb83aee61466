// Simulated clock - Host-time clock used when no audio device is available

use super::{AudioClock, ClockTime};
use std::sync::Mutex;
use std::time::Instant;

#[derive(Debug)]
struct SimulatedState {
    accumulated: f64,
    resumed_at: Option<Instant>,
}

/// Wall-clock backed timebase that only counts while resumed
#[derive(Debug)]
pub struct SimulatedClock {
    state: Mutex<SimulatedState>,
}

impl SimulatedClock {
    /// Create a running clock starting at zero
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SimulatedState {
                accumulated: 0.0,
                resumed_at: Some(Instant::now()),
            }),
        }
    }

    /// Create a clock that stays at zero until `resume()`
    pub fn suspended() -> Self {
        Self {
            state: Mutex::new(SimulatedState {
                accumulated: 0.0,
                resumed_at: None,
            }),
        }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut SimulatedState) -> R) -> R {
        let mut guard = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }
}

impl Default for SimulatedClock {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioClock for SimulatedClock {
    fn now(&self) -> ClockTime {
        self.with_state(|s| match s.resumed_at {
            Some(since) => s.accumulated + since.elapsed().as_secs_f64(),
            None => s.accumulated,
        })
    }

    fn resume(&self) {
        self.with_state(|s| {
            if s.resumed_at.is_none() {
                s.resumed_at = Some(Instant::now());
            }
        });
    }

    fn suspend(&self) {
        self.with_state(|s| {
            if let Some(since) = s.resumed_at.take() {
                s.accumulated += since.elapsed().as_secs_f64();
            }
        });
    }

    fn is_suspended(&self) -> bool {
        self.with_state(|s| s.resumed_at.is_none())
    }
}
