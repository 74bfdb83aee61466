// Manual clock - Explicitly driven time for tests and offline rendering

use super::{AudioClock, ClockTime};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct ManualClock {
    bits: AtomicU64,
    suspended: AtomicBool,
}

impl ManualClock {
    pub fn new(start: ClockTime) -> Self {
        Self {
            bits: AtomicU64::new(start.to_bits()),
            suspended: AtomicBool::new(false),
        }
    }

    /// Move time forward by `secs` (ignored while suspended)
    pub fn advance(&self, secs: f64) {
        if self.suspended.load(Ordering::Acquire) || secs <= 0.0 {
            return;
        }
        let now = f64::from_bits(self.bits.load(Ordering::Acquire));
        self.bits.store((now + secs).to_bits(), Ordering::Release);
    }

    /// Jump to an absolute time; never moves backwards
    pub fn set(&self, time: ClockTime) {
        let now = f64::from_bits(self.bits.load(Ordering::Acquire));
        if time > now {
            self.bits.store(time.to_bits(), Ordering::Release);
        }
    }
}

impl AudioClock for ManualClock {
    fn now(&self) -> ClockTime {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }

    fn resume(&self) {
        self.suspended.store(false, Ordering::Release);
    }

    fn suspend(&self) {
        self.suspended.store(true, Ordering::Release);
    }

    fn is_suspended(&self) -> bool {
        self.suspended.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_and_set() {
        let clock = ManualClock::new(1.0);
        clock.advance(0.5);
        assert_eq!(clock.now(), 1.5);
        clock.set(1.2);
        assert_eq!(clock.now(), 1.5);
        clock.set(3.0);
        assert_eq!(clock.now(), 3.0);
    }

    #[test]
    fn test_suspended_ignores_advance() {
        let clock = ManualClock::new(0.0);
        clock.suspend();
        clock.advance(1.0);
        assert_eq!(clock.now(), 0.0);
        clock.resume();
        clock.advance(1.0);
        assert_eq!(clock.now(), 1.0);
    }
}
