// Transport - Public command surface of the sequencer
// Start/stop/pause/resume, tempo and sequence order, thread-safe via &self

use super::driver::{SchedulerDriver, lock_scheduler, run_pass};
use super::scheduler::{PlaybackMode, SchedulerState, StepScheduler, TransportState};
use super::stats::{BarSummary, SchedulerStats};
use super::timeline::Tempo;
use crate::clock::AudioClock;
use crate::config::{ConfigError, EngineConfig};
use crate::messaging::NotificationBus;
use crate::pattern::PatternStore;
use crate::sampler::BufferProvider;
use crate::voice::{DispatcherSettings, VoiceBackend, VoiceDispatcher};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("No audio clock provided")]
    MissingClock,

    #[error("No pattern store provided")]
    MissingPatternStore,

    #[error("No buffer provider provided")]
    MissingBufferProvider,

    #[error("No voice backend provided")]
    MissingVoiceBackend,

    #[error("Invalid BPM: {0}")]
    InvalidBpm(f64),

    #[error("Sequence order is empty")]
    EmptySequenceOrder,

    #[error("Unknown sequence index: {0}")]
    UnknownSequence(usize),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to spawn scheduler thread: {0}")]
    Thread(#[from] std::io::Error),
}

/// Collects the collaborators a [`TransportController`] needs
pub struct TransportBuilder {
    config: EngineConfig,
    clock: Option<Arc<dyn AudioClock>>,
    store: Option<Arc<dyn PatternStore>>,
    buffers: Option<Arc<dyn BufferProvider>>,
    backend: Option<Box<dyn VoiceBackend>>,
    bus: Option<NotificationBus>,
}

impl TransportBuilder {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            clock: None,
            store: None,
            buffers: None,
            backend: None,
            bus: None,
        }
    }

    pub fn clock(mut self, clock: Arc<dyn AudioClock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn pattern_store(mut self, store: Arc<dyn PatternStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn buffers(mut self, buffers: Arc<dyn BufferProvider>) -> Self {
        self.buffers = Some(buffers);
        self
    }

    pub fn voice_backend(mut self, backend: Box<dyn VoiceBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Without a bus, notifications are discarded
    pub fn notifications(mut self, bus: NotificationBus) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn build(self) -> Result<TransportController, TransportError> {
        self.config.validate()?;
        let clock = self.clock.ok_or(TransportError::MissingClock)?;
        let store = self.store.ok_or(TransportError::MissingPatternStore)?;
        let buffers = self.buffers.ok_or(TransportError::MissingBufferProvider)?;
        let backend = self.backend.ok_or(TransportError::MissingVoiceBackend)?;
        let bus = self.bus.unwrap_or_else(NotificationBus::disabled);

        let dispatcher =
            VoiceDispatcher::new(backend, buffers, DispatcherSettings::from(&self.config));
        let scheduler =
            StepScheduler::new(clock, Arc::clone(&store), dispatcher, bus, &self.config);

        Ok(TransportController {
            core: Arc::new(Mutex::new(scheduler)),
            store,
            tick_interval: Duration::from_millis(self.config.tick_interval_ms.max(1)),
            driver: Mutex::new(None),
        })
    }
}

/// Thread-safe transport
///
/// Either call [`pump`](Self::pump) from your own loop, or let
/// [`spawn_driver`](Self::spawn_driver) run passes on a background thread.
pub struct TransportController {
    core: Arc<Mutex<StepScheduler>>,
    store: Arc<dyn PatternStore>,
    tick_interval: Duration,
    driver: Mutex<Option<SchedulerDriver>>,
}

impl TransportController {
    pub fn builder(config: EngineConfig) -> TransportBuilder {
        TransportBuilder::new(config)
    }

    fn wake_driver(&self) {
        if let Ok(driver) = self.driver.lock() {
            if let Some(driver) = driver.as_ref() {
                driver.wake();
            }
        }
    }

    /// Returns false if already running
    pub fn start(&self) -> bool {
        let started = lock_scheduler(&self.core).start();
        if started {
            self.wake_driver();
        }
        started
    }

    /// Once this returns no further voice is triggered
    pub fn stop(&self) -> bool {
        lock_scheduler(&self.core).stop()
    }

    pub fn pause(&self) -> bool {
        lock_scheduler(&self.core).pause()
    }

    pub fn resume(&self) -> bool {
        let resumed = lock_scheduler(&self.core).resume();
        if resumed {
            self.wake_driver();
        }
        resumed
    }

    /// Change tempo for the next step; returns the BPM actually applied
    ///
    /// Non-positive or non-finite values are rejected and the current tempo
    /// is kept. Others are clamped to the supported range.
    pub fn set_bpm(&self, bpm: f64) -> Result<f64, TransportError> {
        let tempo = match Tempo::new(bpm) {
            Some(tempo) => tempo,
            None => {
                log::warn!("Rejected BPM {}", bpm);
                return Err(TransportError::InvalidBpm(bpm));
            }
        };
        lock_scheduler(&self.core).set_tempo(tempo);
        Ok(tempo.bpm())
    }

    pub fn bpm(&self) -> f64 {
        lock_scheduler(&self.core).tempo().bpm()
    }

    /// Set the sequences to play, in order
    pub fn set_sequence_order(&self, order: Vec<usize>) -> Result<(), TransportError> {
        if order.is_empty() {
            return Err(TransportError::EmptySequenceOrder);
        }
        let count = self.store.sequence_count();
        if let Some(&bad) = order.iter().find(|&&s| s >= count) {
            return Err(TransportError::UnknownSequence(bad));
        }
        lock_scheduler(&self.core).set_sequence_order(order);
        Ok(())
    }

    pub fn set_playback_mode(&self, mode: PlaybackMode) {
        lock_scheduler(&self.core).set_playback_mode(mode);
    }

    /// Run one scheduling pass on the calling thread
    pub fn pump(&self) -> usize {
        run_pass(&self.core)
    }

    /// Start the background scheduling thread (no-op if already running)
    pub fn spawn_driver(&self) -> Result<(), TransportError> {
        let mut driver = self.driver.lock().unwrap_or_else(|e| e.into_inner());
        if driver.is_none() {
            *driver = Some(SchedulerDriver::spawn(
                Arc::clone(&self.core),
                self.tick_interval,
            )?);
        }
        Ok(())
    }

    pub fn stop_driver(&self) {
        let driver = self
            .driver
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(driver) = driver {
            driver.shutdown();
        }
    }

    pub fn has_driver(&self) -> bool {
        self.driver
            .lock()
            .map(|d| d.is_some())
            .unwrap_or(false)
    }

    pub fn state(&self) -> TransportState {
        lock_scheduler(&self.core).transport_state()
    }

    pub fn scheduler_state(&self) -> SchedulerState {
        lock_scheduler(&self.core).state()
    }

    pub fn stats(&self) -> SchedulerStats {
        lock_scheduler(&self.core).stats()
    }

    pub fn last_bar_summary(&self) -> Option<BarSummary> {
        lock_scheduler(&self.core).last_bar_summary()
    }

    /// `(sequence, step)` audible right now, for playhead display
    pub fn audible_step(&self) -> Option<(usize, usize)> {
        lock_scheduler(&self.core).audible_step()
    }

    /// Read-only access to the scheduler and its voices
    pub fn inspect<R>(&self, f: impl FnOnce(&StepScheduler) -> R) -> R {
        f(&lock_scheduler(&self.core))
    }
}

impl Drop for TransportController {
    fn drop(&mut self) {
        self.stop_driver();
    }
}
