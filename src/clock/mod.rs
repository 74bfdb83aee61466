// Clock - Timebase shared by the scheduler and the audio output
// All scheduling decisions are expressed in seconds of this clock

mod manual;
mod sample_clock;
mod simulated;

pub use manual::ManualClock;
pub use sample_clock::SampleClock;
pub use simulated::SimulatedClock;

/// Seconds on the audio timeline
pub type ClockTime = f64;

/// Monotonic, sample-accurate source of "now"
///
/// `now()` must never fail and must never go backwards. While suspended the
/// reported time stops advancing; `resume()` continues from where it froze.
pub trait AudioClock: Send + Sync {
    fn now(&self) -> ClockTime;

    fn resume(&self);

    fn suspend(&self);

    fn is_suspended(&self) -> bool;
}
