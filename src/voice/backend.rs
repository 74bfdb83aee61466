// Voice backend - Where the dispatcher sends voice commands
// The ring backend feeds the audio-thread mixer without locks

use super::VoiceId;
use super::envelope::GainEnvelope;
use super::mixer::Mixer;
use crate::clock::ClockTime;
use crate::sampler::DecodedBuffer;
use ringbuf::traits::{Producer, Split};
use ringbuf::HeapRb;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum VoiceCommand {
    /// Play `buffer` from `offset` (buffer seconds) at `rate`, starting at `start_time`
    Start {
        id: VoiceId,
        buffer: Arc<DecodedBuffer>,
        start_time: ClockTime,
        stop_time: ClockTime,
        offset: f64,
        rate: f64,
        envelope: GainEnvelope,
    },
    /// Replace the envelope of a voice, usually with an earlier fade to zero
    Release {
        id: VoiceId,
        stop_time: ClockTime,
        envelope: GainEnvelope,
    },
    /// Drop the voice and its buffer reference
    Free { id: VoiceId },
}

impl VoiceCommand {
    pub fn id(&self) -> VoiceId {
        match self {
            VoiceCommand::Start { id, .. }
            | VoiceCommand::Release { id, .. }
            | VoiceCommand::Free { id } => *id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("Voice command queue is full")]
    QueueFull,

    #[error("Voice backend disconnected")]
    Disconnected,
}

pub trait VoiceBackend: Send {
    fn submit(&mut self, command: VoiceCommand) -> Result<(), BackendError>;
}

pub type VoiceCommandProducer = ringbuf::HeapProd<VoiceCommand>;
pub type VoiceCommandConsumer = ringbuf::HeapCons<VoiceCommand>;

/// Lock-free command queue to a [`Mixer`]
pub struct RingVoiceBackend {
    tx: VoiceCommandProducer,
}

impl VoiceBackend for RingVoiceBackend {
    fn submit(&mut self, command: VoiceCommand) -> Result<(), BackendError> {
        self.tx.try_push(command).map_err(|_| BackendError::QueueFull)
    }
}

/// Create a connected backend / mixer pair
pub fn create_voice_channel(capacity: usize, max_voices: usize) -> (RingVoiceBackend, Mixer) {
    let rb = HeapRb::<VoiceCommand>::new(capacity.max(1));
    let (tx, rx) = rb.split();
    (RingVoiceBackend { tx }, Mixer::new(rx, max_voices))
}

/// Backend for headless operation: accepts and discards everything
#[derive(Debug, Default)]
pub struct NullBackend;

impl VoiceBackend for NullBackend {
    fn submit(&mut self, _command: VoiceCommand) -> Result<(), BackendError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_backend_reports_full_queue() {
        let (mut backend, _mixer) = create_voice_channel(2, 4);
        assert!(backend.submit(VoiceCommand::Free { id: VoiceId(1) }).is_ok());
        assert!(backend.submit(VoiceCommand::Free { id: VoiceId(2) }).is_ok());
        assert_eq!(
            backend.submit(VoiceCommand::Free { id: VoiceId(3) }),
            Err(BackendError::QueueFull)
        );
    }

    #[test]
    fn test_command_id() {
        let cmd = VoiceCommand::Release {
            id: VoiceId(7),
            stop_time: 1.0,
            envelope: GainEnvelope::silent(1.0),
        };
        assert_eq!(cmd.id(), VoiceId(7));
    }
}
