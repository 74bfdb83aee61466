// Sample clock - Frame counter advanced by the audio callback

use super::{AudioClock, ClockTime};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

const RUNNING: u8 = 0;
const DRAINING: u8 = 1;
const SUSPENDED: u8 = 2;

struct SampleClockInner {
    frames: AtomicU64,
    state: AtomicU8,
    drain_remaining: AtomicU64,
    grace_frames: u64,
    sample_rate: f64,
}

/// Audio-device clock
///
/// The output callback calls [`SampleClock::advance`] once per block, so
/// `now()` is exactly the number of frames handed to the device divided by
/// the sample rate. Suspending keeps the counter running for a short grace
/// period first, so release ramps that were already scheduled still reach
/// the speakers before the output goes quiet.
#[derive(Clone)]
pub struct SampleClock {
    inner: Arc<SampleClockInner>,
}

impl SampleClock {
    pub fn new(sample_rate: u32) -> Self {
        Self::with_suspend_grace(sample_rate, 0.02)
    }

    pub fn with_suspend_grace(sample_rate: u32, grace_secs: f64) -> Self {
        let sample_rate = sample_rate.max(1) as f64;
        Self {
            inner: Arc::new(SampleClockInner {
                frames: AtomicU64::new(0),
                state: AtomicU8::new(RUNNING),
                drain_remaining: AtomicU64::new(0),
                grace_frames: (grace_secs.max(0.0) * sample_rate).round() as u64,
                sample_rate,
            }),
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.inner.sample_rate
    }

    /// Frames rendered so far
    pub fn current_frame(&self) -> u64 {
        self.inner.frames.load(Ordering::Acquire)
    }

    /// Advance after rendering `frames` (called from the audio callback)
    ///
    /// Returns `false` once the clock is fully suspended, in which case the
    /// caller should output silence for this block.
    pub fn advance(&self, frames: usize) -> bool {
        let inner = &self.inner;
        match inner.state.load(Ordering::Acquire) {
            RUNNING => {
                inner.frames.fetch_add(frames as u64, Ordering::AcqRel);
                true
            }
            DRAINING => {
                inner.frames.fetch_add(frames as u64, Ordering::AcqRel);
                let remaining = inner.drain_remaining.load(Ordering::Acquire);
                let left = remaining.saturating_sub(frames as u64);
                inner.drain_remaining.store(left, Ordering::Release);
                if left == 0 {
                    // resume() may have raced us; only freeze a clock that is still draining
                    let _ = inner.state.compare_exchange(
                        DRAINING,
                        SUSPENDED,
                        Ordering::AcqRel,
                        Ordering::Acquire,
                    );
                }
                true
            }
            _ => false,
        }
    }

    /// Whether the callback should render audio for the next block
    pub fn is_rendering(&self) -> bool {
        self.inner.state.load(Ordering::Acquire) != SUSPENDED
    }
}

impl AudioClock for SampleClock {
    fn now(&self) -> ClockTime {
        self.current_frame() as f64 / self.inner.sample_rate
    }

    fn resume(&self) {
        self.inner.state.store(RUNNING, Ordering::Release);
    }

    fn suspend(&self) {
        let inner = &self.inner;
        if inner.state.load(Ordering::Acquire) != RUNNING {
            return;
        }
        if inner.grace_frames == 0 {
            inner.state.store(SUSPENDED, Ordering::Release);
        } else {
            inner
                .drain_remaining
                .store(inner.grace_frames, Ordering::Release);
            inner.state.store(DRAINING, Ordering::Release);
        }
    }

    fn is_suspended(&self) -> bool {
        self.inner.state.load(Ordering::Acquire) != RUNNING
    }
}
