// Trim - Play window of a buffer for a channel's trim, direction and rate

use crate::pattern::Channel;

/// Smallest audible duration a window is allowed to collapse to (seconds)
pub const MIN_AUDIBLE_DURATION: f64 = 0.001;

/// Region of a buffer to play
///
/// `offset` and `duration` are in buffer seconds (before resampling);
/// `audible_duration` is the wall-clock length once `rate` is applied.
/// For reversed playback `offset` indexes the pre-reversed buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayWindow {
    pub offset: f64,
    pub duration: f64,
    pub audible_duration: f64,
    pub rate: f64,
}

/// Clamp trim points to [0, 1] and order them
///
/// Non-finite values fall back to the full buffer bound they stand for.
pub fn normalize_trim(start: f64, end: f64) -> (f64, f64) {
    let start = if start.is_finite() { start.clamp(0.0, 1.0) } else { 0.0 };
    let end = if end.is_finite() { end.clamp(0.0, 1.0) } else { 1.0 };
    if end < start { (end, start) } else { (start, end) }
}

/// Window for `channel` over a buffer of `buffer_duration` seconds
///
/// Forward: `offset = start * D`, `duration = (end - start) * D`.
/// Reversed: the same musical slice read from the reversed buffer, so
/// `offset = (1 - end) * D` and the window ends at `(1 - start) * D`.
pub fn compute_play_window(channel: &Channel, reverse: bool, buffer_duration: f64) -> PlayWindow {
    let (start, end) = normalize_trim(channel.trim_start, channel.trim_end);
    let total = if buffer_duration.is_finite() {
        buffer_duration.max(0.0)
    } else {
        0.0
    };

    let (offset, window_end) = if reverse {
        ((1.0 - end) * total, (1.0 - start) * total)
    } else {
        (start * total, end * total)
    };
    let duration = (window_end - offset).max(0.0);
    let rate = channel.playback_rate();

    PlayWindow {
        offset,
        duration,
        audible_duration: duration / rate,
        rate,
    }
}
