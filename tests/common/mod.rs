//! Shared fixtures for the integration tests

#![allow(dead_code)]

use pulsegrid::voice::BackendError;
use pulsegrid::{
    BufferCache, Channel, DecodedBuffer, EngineConfig, EventReceiver, ManualClock,
    NotificationBus, PatternBank, SampleRef, Sequence, SimulatedClock, StepGrid,
    TransportController, VoiceBackend, VoiceCommand,
};
use std::sync::{Arc, Mutex};

pub const START_TIME: f64 = 10.0;

/// Backend that keeps every command it receives
#[derive(Clone, Default)]
pub struct RecordingBackend {
    commands: Arc<Mutex<Vec<VoiceCommand>>>,
}

impl RecordingBackend {
    pub fn commands(&self) -> Vec<VoiceCommand> {
        self.commands.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.commands.lock().unwrap().len()
    }

    pub fn since(&self, mark: usize) -> Vec<VoiceCommand> {
        self.commands.lock().unwrap()[mark..].to_vec()
    }

    /// `(start_time, stop_time)` of every Start command
    pub fn starts(&self) -> Vec<(f64, f64)> {
        self.commands()
            .iter()
            .filter_map(|c| match c {
                VoiceCommand::Start {
                    start_time,
                    stop_time,
                    ..
                } => Some((*start_time, *stop_time)),
                _ => None,
            })
            .collect()
    }
}

impl VoiceBackend for RecordingBackend {
    fn submit(&mut self, command: VoiceCommand) -> Result<(), BackendError> {
        self.commands.lock().unwrap().push(command);
        Ok(())
    }
}

pub struct Rig {
    pub clock: Arc<ManualClock>,
    pub bank: Arc<PatternBank>,
    pub cache: Arc<BufferCache>,
    pub sample: SampleRef,
    pub backend: RecordingBackend,
    pub transport: TransportController,
    pub events: Option<EventReceiver>,
}

impl Rig {
    /// Pump, then move the clock, `passes` times
    pub fn run(&self, passes: usize, tick: f64) {
        for _ in 0..passes {
            self.transport.pump();
            self.clock.advance(tick);
        }
    }

    pub fn events(&mut self) -> &mut EventReceiver {
        self.events.as_mut().unwrap()
    }
}

/// One second of constant signal at 1 kHz
pub fn test_buffer() -> DecodedBuffer {
    DecodedBuffer::from_mono(vec![0.5; 1000], 1000)
}

/// Transport over a single sequence, one channel per pattern string
pub fn rig(patterns: &[&str], steps: usize, config: EngineConfig) -> Rig {
    rig_with_sequences(&[patterns], steps, config)
}

pub fn rig_with_sequences(sequences: &[&[&str]], steps: usize, config: EngineConfig) -> Rig {
    let clock = Arc::new(ManualClock::new(START_TIME));
    let cache = Arc::new(BufferCache::new());
    let sample = cache.insert(test_buffer());

    let bank = Arc::new(PatternBank::new());
    let channels = sequences.iter().map(|s| s.len()).max().unwrap_or(0);
    for i in 0..channels {
        bank.add_channel(Channel::new(format!("ch{}", i)).with_sample(sample));
    }
    for (i, patterns) in sequences.iter().enumerate() {
        bank.add_sequence(Sequence::with_grid(
            format!("seq{}", i),
            StepGrid::from_patterns(steps, patterns),
        ));
    }

    let backend = RecordingBackend::default();
    let (bus, events) = NotificationBus::channel(config.notification_capacity);
    let transport = TransportController::builder(config)
        .clock(clock.clone())
        .pattern_store(bank.clone())
        .buffers(cache.clone())
        .voice_backend(Box::new(backend.clone()))
        .notifications(bus)
        .build()
        .unwrap();

    Rig {
        clock,
        bank,
        cache,
        sample,
        backend,
        transport,
        events: Some(events),
    }
}

/// Transport on a real-time simulated clock, for driver thread tests
pub fn simulated_transport(
    patterns: &[&str],
    steps: usize,
    config: EngineConfig,
) -> (TransportController, RecordingBackend) {
    let cache = Arc::new(BufferCache::new());
    let sample = cache.insert(test_buffer());
    let bank = Arc::new(PatternBank::new());
    for i in 0..patterns.len() {
        bank.add_channel(Channel::new(format!("ch{}", i)).with_sample(sample));
    }
    bank.add_sequence(Sequence::with_grid("seq0", StepGrid::from_patterns(steps, patterns)));

    let backend = RecordingBackend::default();
    let transport = TransportController::builder(config)
        .clock(Arc::new(SimulatedClock::new()))
        .pattern_store(bank)
        .buffers(cache)
        .voice_backend(Box::new(backend.clone()))
        .build()
        .unwrap();
    (transport, backend)
}

pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}
