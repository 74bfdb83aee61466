// Voice - Scheduled playback instances of a channel's buffer

pub mod backend;
pub mod dispatcher;
pub mod envelope;
pub mod mixer;

pub use backend::{
    BackendError, NullBackend, RingVoiceBackend, VoiceBackend, VoiceCommand, create_voice_channel,
};
pub use dispatcher::{DispatcherSettings, VoiceDispatcher};
pub use envelope::{EnvelopePoint, GainEnvelope};
pub use mixer::Mixer;

use crate::clock::ClockTime;
use crate::sampler::SampleRef;

/// Identifier of a voice, unique per dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceId(pub u64);

/// A triggered buffer playback owned by the dispatcher
#[derive(Debug, Clone, PartialEq)]
pub struct Voice {
    pub id: VoiceId,
    pub channel_index: usize,
    pub sample: SampleRef,
    pub start_time: ClockTime,
    pub stop_time: ClockTime,
    pub envelope: GainEnvelope,
}

impl Voice {
    /// Started and not yet silent
    pub fn is_sounding(&self, now: ClockTime) -> bool {
        self.start_time <= now && now < self.stop_time
    }

    /// Scheduled in the future
    pub fn is_pending(&self, now: ClockTime) -> bool {
        self.start_time > now
    }
}

/// Handle returned for a successful trigger
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceHandle {
    pub id: VoiceId,
    pub channel_index: usize,
    pub start_time: ClockTime,
    pub stop_time: ClockTime,
}

/// Reasons a single trigger was skipped
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Channel {0} has no sample assigned")]
    NoSample(usize),

    #[error("No decoded buffer for {0}")]
    MissingBuffer(SampleRef),

    #[error("Trim window of {0} is empty")]
    EmptyWindow(SampleRef),

    #[error("Voice limit reached ({0} voices)")]
    VoiceLimit(usize),

    #[error("Voice backend error: {0}")]
    Backend(#[from] BackendError),
}
