// Transport events - Immutable payloads published by the scheduler

use crate::clock::ClockTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Step,
    Beat,
    Bar,
    Play,
    Pause,
    Resume,
    Stop,
    /// A channel fired on the step
    Trigger,
    /// Playback moved to another sequence
    Sequence,
}

impl EventKind {
    /// Transport state changes, as opposed to timeline ticks
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            EventKind::Play | EventKind::Pause | EventKind::Resume | EventKind::Stop
        )
    }
}

/// Event with the timeline position it refers to
///
/// `time` is the clock time the step sounds at, which is usually ahead of
/// the moment the event is emitted by up to the lookahead window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransportEvent {
    pub kind: EventKind,
    pub step: usize,
    pub sequence: usize,
    pub time: ClockTime,
    /// Bars since start (0-based)
    pub bar: u64,
    /// Beat within the bar (0-based)
    pub beat: u32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub channel: Option<usize>,
}

impl TransportEvent {
    pub fn new(kind: EventKind, step: usize, sequence: usize, time: ClockTime) -> Self {
        Self {
            kind,
            step,
            sequence,
            time,
            bar: 0,
            beat: 0,
            channel: None,
        }
    }

    pub fn at_position(mut self, bar: u64, beat: u32) -> Self {
        self.bar = bar;
        self.beat = beat;
        self
    }

    pub fn for_channel(mut self, channel: usize) -> Self {
        self.channel = Some(channel);
        self
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
