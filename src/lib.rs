// pulsegrid - Lookahead step sequencer engine
// Library exports for the demo binary, tests and benchmarks

pub mod audio;
pub mod clock;
pub mod config;
pub mod messaging;
pub mod pattern;
pub mod sampler;
pub mod sequencer;
pub mod trim;
pub mod voice;

// Re-export commonly used types for convenience
pub use clock::{AudioClock, ClockTime, ManualClock, SampleClock, SimulatedClock};
pub use config::{ConfigError, EngineConfig};
pub use messaging::{EventKind, EventReceiver, NotificationBus, TransportEvent};
pub use pattern::{Channel, PatternBank, PatternStore, Sequence, StepCell, StepGrid};
pub use sampler::{BufferCache, BufferProvider, DecodedBuffer, SampleRef};
pub use sequencer::{
    PlaybackMode, SchedulerState, StepScheduler, Tempo, TransportBuilder, TransportController,
    TransportError, TransportState,
};
pub use trim::{PlayWindow, compute_play_window};
pub use voice::{
    DispatchError, GainEnvelope, Mixer, NullBackend, VoiceBackend, VoiceCommand, VoiceDispatcher,
    create_voice_channel,
};
