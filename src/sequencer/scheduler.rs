// Step scheduler - Lookahead loop turning grid steps into timed voices
//
// Each pass commits every step whose trigger time falls inside
// [now, now + lookahead) to the voice dispatcher, using exact clock times,
// so host-thread jitter never reaches the audio output.

use super::lookahead::Lookahead;
use super::stats::{BarSummary, BarTiming, SchedulerStats};
use super::timeline::{Meter, Tempo};
use crate::clock::{AudioClock, ClockTime};
use crate::config::EngineConfig;
use crate::messaging::{EventKind, NotificationBus, TransportEvent};
use crate::pattern::PatternStore;
use crate::voice::{DispatchError, VoiceDispatcher};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

const RECENT_STEPS: usize = 128;

/// What happens when the last step of a sequence has been scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackMode {
    /// Repeat the current sequence
    #[default]
    Loop,
    /// Move on to the next live sequence of the play order, wrapping around
    Continuous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulerState {
    #[default]
    Idle,
    Running,
    Paused,
}

impl SchedulerState {
    pub fn is_running(&self) -> bool {
        matches!(self, SchedulerState::Running)
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, SchedulerState::Paused)
    }
}

/// Snapshot of the transport
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportState {
    pub bpm: f64,
    pub current_step: usize,
    pub current_sequence_index: usize,
    pub running: bool,
    pub paused: bool,
    pub next_trigger_time: Option<ClockTime>,
}

/// A step already handed to the dispatcher
#[derive(Debug, Clone, Copy, PartialEq)]
struct ScheduledStep {
    time: ClockTime,
    sequence: usize,
    step: usize,
    absolute_step: u64,
    order_position: usize,
    /// A new play order was waiting for the wrap when this step was committed
    order_pending: bool,
}

pub struct StepScheduler {
    clock: Arc<dyn AudioClock>,
    store: Arc<dyn PatternStore>,
    dispatcher: VoiceDispatcher,
    bus: NotificationBus,

    meter: Meter,
    tempo: Tempo,
    start_delay: f64,
    mode: PlaybackMode,
    state: SchedulerState,

    current_step: usize,
    current_sequence: usize,
    absolute_step: u64,
    /// Explicit play order; empty means every sequence in store order
    play_order: Vec<usize>,
    order_position: usize,
    order_changed: bool,

    next_trigger_time: Option<ClockTime>,
    last_scheduled: Option<ClockTime>,

    lookahead: Lookahead,
    stats: SchedulerStats,
    bar_timing: BarTiming,
    recent: VecDeque<ScheduledStep>,
    pass_started: Option<Instant>,
}

impl StepScheduler {
    pub fn new(
        clock: Arc<dyn AudioClock>,
        store: Arc<dyn PatternStore>,
        dispatcher: VoiceDispatcher,
        bus: NotificationBus,
        config: &EngineConfig,
    ) -> Self {
        let lookahead = if config.adaptive_lookahead {
            Lookahead::adaptive(
                config.lookahead_secs,
                config.min_lookahead_secs,
                config.max_lookahead_secs,
            )
        } else {
            Lookahead::fixed(config.lookahead_secs)
        };

        let mut scheduler = Self {
            clock,
            store,
            dispatcher,
            bus,
            meter: Meter::new(config.steps_per_beat, config.beats_per_bar),
            tempo: Tempo::new(config.default_bpm).unwrap_or_default(),
            start_delay: config.start_delay_secs.max(0.0),
            mode: config.playback_mode,
            state: SchedulerState::Idle,
            current_step: 0,
            current_sequence: 0,
            absolute_step: 0,
            play_order: Vec::new(),
            order_position: 0,
            order_changed: false,
            next_trigger_time: None,
            last_scheduled: None,
            stats: SchedulerStats {
                lookahead: lookahead.window(),
                ..Default::default()
            },
            lookahead,
            bar_timing: BarTiming::default(),
            recent: VecDeque::with_capacity(RECENT_STEPS),
            pass_started: None,
        };
        scheduler.rewind();
        scheduler
    }

    /// Idle -> Running; from Paused this resumes. Returns false if already running.
    pub fn start(&mut self) -> bool {
        match self.state {
            SchedulerState::Running => return false,
            SchedulerState::Paused => return self.resume(),
            SchedulerState::Idle => {}
        }

        self.clock.resume();
        let first = self.clock.now() + self.start_delay;
        self.rewind();
        self.next_trigger_time = Some(first);
        self.state = SchedulerState::Running;
        self.lookahead.reset_history();

        log::info!(
            "Transport started at {} (first step at {:.3}s)",
            self.tempo,
            first
        );
        self.emit(EventKind::Play, first);
        true
    }

    /// Running -> Paused, keeping the position. Steps already committed
    /// beyond "now" are cancelled and will be scheduled again on resume.
    pub fn pause(&mut self) -> bool {
        if self.state != SchedulerState::Running {
            return false;
        }
        let now = self.clock.now();
        self.dispatcher.stop_all(now);
        self.clock.suspend();
        self.rewind_to_unplayed(now);
        self.next_trigger_time = None;
        self.state = SchedulerState::Paused;

        log::info!(
            "Transport paused at step {} of sequence {}",
            self.current_step,
            self.current_sequence
        );
        self.emit(EventKind::Pause, now);
        true
    }

    /// Paused -> Running, continuing from the paused step right away
    pub fn resume(&mut self) -> bool {
        if self.state != SchedulerState::Paused {
            return false;
        }
        self.clock.resume();
        let now = self.clock.now();
        self.next_trigger_time = Some(now);
        self.state = SchedulerState::Running;
        self.lookahead.reset_history();

        log::info!("Transport resumed at step {}", self.current_step);
        self.emit(EventKind::Resume, now);
        true
    }

    /// Running|Paused -> Idle: fade everything out and go back to the top
    pub fn stop(&mut self) -> bool {
        if self.state == SchedulerState::Idle {
            return false;
        }
        let now = self.clock.now();
        let faded = self.dispatcher.stop_all(now);
        self.state = SchedulerState::Idle;
        self.next_trigger_time = None;
        self.rewind();

        log::info!("Transport stopped ({} voices faded out)", faded);
        self.emit(EventKind::Stop, now);
        true
    }

    /// Takes effect from the next scheduled step
    pub fn set_tempo(&mut self, tempo: Tempo) {
        if tempo != self.tempo {
            log::debug!("Tempo {} -> {}", self.tempo, tempo);
            self.tempo = tempo;
        }
    }

    /// Takes effect when the current sequence wraps (immediately when idle)
    pub fn set_sequence_order(&mut self, order: Vec<usize>) {
        self.play_order = order;
        if self.state == SchedulerState::Idle {
            self.rewind();
        } else {
            self.order_changed = true;
        }
    }

    pub fn set_playback_mode(&mut self, mode: PlaybackMode) {
        self.mode = mode;
    }

    /// Mark the start of a scheduling pass
    pub fn begin_pass(&mut self) {
        self.pass_started = Some(Instant::now());
        self.stats.passes += 1;
    }

    /// Schedule the next step if it is due within the lookahead window.
    /// Returns false when nothing (more) is due.
    pub fn schedule_next_due_step(&mut self) -> bool {
        if self.state != SchedulerState::Running {
            return false;
        }
        let Some(mut at) = self.next_trigger_time else {
            return false;
        };

        let now = self.clock.now();
        if at < now {
            let lateness = now - at;
            self.stats.late_steps += 1;
            self.stats.max_lateness = self.stats.max_lateness.max(lateness);
            if lateness > self.lookahead.window() {
                log::warn!(
                    "Scheduler fell {:.1}ms behind, step {} moved to now",
                    lateness * 1000.0,
                    self.current_step
                );
            } else {
                log::debug!("Step {} late by {:.2}ms", self.current_step, lateness * 1000.0);
            }
            at = now;
        }

        if at >= now + self.lookahead.window() {
            self.next_trigger_time = Some(at);
            return false;
        }

        self.schedule_step(at);
        true
    }

    /// Housekeeping after a pass: voice teardown and lookahead tuning
    pub fn end_pass(&mut self) {
        let now = self.clock.now();
        self.dispatcher.reap(now);

        if let Some(started) = self.pass_started.take() {
            if self.state == SchedulerState::Running {
                if let Some(window) = self.lookahead.record_pass(started.elapsed()) {
                    log::debug!("Lookahead adjusted to {:.0}ms", window * 1000.0);
                }
            }
        }
        self.stats.lookahead = self.lookahead.window();
    }

    /// One complete pass; returns the number of steps scheduled
    pub fn pump(&mut self) -> usize {
        self.begin_pass();
        let mut scheduled = 0;
        while self.schedule_next_due_step() {
            scheduled += 1;
        }
        self.end_pass();
        scheduled
    }

    fn schedule_step(&mut self, at: ClockTime) {
        let sequence = self.current_sequence;
        let grid = self.store.step_grid(sequence);
        let steps = grid
            .as_ref()
            .map(|g| g.steps())
            .unwrap_or(self.meter.steps_per_bar() as usize);
        let step = self.current_step % steps;

        if let Some(grid) = &grid {
            let channels = self.store.channel_count().min(grid.channels());
            for index in 0..channels {
                let cell = grid.cell(index, step);
                if !cell.trigger {
                    continue;
                }
                let Some(channel) = self.store.channel(index) else {
                    continue;
                };
                if channel.muted {
                    continue;
                }
                let reverse = cell.reverse.unwrap_or(channel.reverse);
                match self.dispatcher.trigger(index, &channel, reverse, at) {
                    Ok(_) => {
                        self.stats.triggers += 1;
                        let event = TransportEvent::new(EventKind::Trigger, step, sequence, at)
                            .for_channel(index);
                        self.bus.emit(event);
                    }
                    Err(DispatchError::NoSample(_)) => {
                        log::trace!("Channel {} has no sample, step {} skipped", index, step);
                    }
                    Err(e) => {
                        self.stats.dropped_triggers += 1;
                        log::warn!("Step {} channel {} skipped: {}", step, index, e);
                    }
                }
            }
        } else {
            log::trace!("Sequence {} has no grid", sequence);
        }

        let step_duration = self.tempo.step_duration_seconds(self.meter.steps_per_beat);
        let position = self.meter.position(self.absolute_step);
        let tick = TransportEvent::new(EventKind::Step, step, sequence, at)
            .at_position(position.bar, position.beat);
        self.bus.emit(tick);
        if position.on_beat {
            self.bus.emit(TransportEvent { kind: EventKind::Beat, ..tick });
        }
        if position.on_bar {
            self.bus.emit(TransportEvent { kind: EventKind::Bar, ..tick });
        }
        if let Some(summary) = self.bar_timing.record(position.bar, at, step_duration) {
            log::debug!(
                "Bar {}: {} steps from {:.3}s to {:.3}s, max deviation {:.3}ms",
                summary.bar,
                summary.steps,
                summary.first_step,
                summary.last_step,
                summary.max_deviation * 1000.0
            );
        }

        if self.recent.len() == RECENT_STEPS {
            self.recent.pop_front();
        }
        self.recent.push_back(ScheduledStep {
            time: at,
            sequence,
            step,
            absolute_step: self.absolute_step,
            order_position: self.order_position,
            order_pending: self.order_changed,
        });

        self.stats.steps += 1;
        self.last_scheduled = Some(at);
        self.absolute_step += 1;
        self.current_step = (step + 1) % steps;

        // the next step is timed from the tempo in force right now
        let next = at + step_duration;
        if self.current_step == 0 {
            self.advance_sequence(next);
        }
        self.next_trigger_time = Some(next);
    }

    fn advance_sequence(&mut self, at: ClockTime) {
        let previous = self.current_sequence;

        if self.order_changed {
            self.order_changed = false;
            self.order_position = 0;
            self.current_sequence = self.order_at(0);
            if self.mode == PlaybackMode::Continuous && !self.is_playable(self.current_sequence) {
                if let Some((position, sequence)) = self.next_live_sequence(0) {
                    self.order_position = position;
                    self.current_sequence = sequence;
                }
            }
        } else if self.mode == PlaybackMode::Continuous {
            if let Some((position, sequence)) = self.next_live_sequence(self.order_position) {
                self.order_position = position;
                self.current_sequence = sequence;
            }
        }

        if self.current_sequence != previous {
            log::info!("Sequence {} -> {}", previous, self.current_sequence);
            self.bus
                .emit(TransportEvent::new(EventKind::Sequence, 0, self.current_sequence, at));
        }
    }

    fn order_len(&self) -> usize {
        if self.play_order.is_empty() {
            self.store.sequence_count()
        } else {
            self.play_order.len()
        }
    }

    fn order_at(&self, position: usize) -> usize {
        if self.play_order.is_empty() {
            position
        } else {
            self.play_order
                .get(position)
                .copied()
                .unwrap_or_default()
        }
    }

    fn is_playable(&self, sequence: usize) -> bool {
        self.store.is_live(sequence) && self.store.step_grid(sequence).is_some()
    }

    /// First playable sequence after `from` in play order, wrapping around
    fn next_live_sequence(&self, from: usize) -> Option<(usize, usize)> {
        let len = self.order_len();
        (1..=len)
            .map(|offset| (from + offset) % len)
            .map(|position| (position, self.order_at(position)))
            .find(|&(_, sequence)| self.is_playable(sequence))
    }

    /// Back to step 0 of the first sequence in play order
    fn rewind(&mut self) {
        self.current_step = 0;
        self.absolute_step = 0;
        self.order_position = 0;
        self.order_changed = false;
        self.current_sequence = self.order_at(0);
        if self.mode == PlaybackMode::Continuous
            && self.order_len() > 0
            && !self.is_playable(self.current_sequence)
        {
            if let Some((position, sequence)) = self.next_live_sequence(0) {
                self.order_position = position;
                self.current_sequence = sequence;
            }
        }
        self.last_scheduled = None;
        self.recent.clear();
        self.bar_timing.reset();
    }

    /// Move the position back to the first committed step that has not started
    fn rewind_to_unplayed(&mut self, now: ClockTime) {
        let Some(index) = self.recent.iter().position(|s| s.time >= now) else {
            return;
        };
        let first = self.recent[index];
        self.recent.truncate(index);
        self.current_step = first.step;
        self.current_sequence = first.sequence;
        self.absolute_step = first.absolute_step;
        self.order_position = first.order_position;
        // the wrap that applied a new play order may be among the cancelled steps
        self.order_changed |= first.order_pending;
        self.last_scheduled = self.recent.back().map(|s| s.time);
        self.bar_timing.reset();
    }

    fn emit(&mut self, kind: EventKind, at: ClockTime) {
        let position = self.meter.position(self.absolute_step);
        let event = TransportEvent::new(kind, self.current_step, self.current_sequence, at)
            .at_position(position.bar, position.beat);
        self.bus.emit(event);
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn transport_state(&self) -> TransportState {
        TransportState {
            bpm: self.tempo.bpm(),
            current_step: self.current_step,
            current_sequence_index: self.current_sequence,
            running: self.state.is_running(),
            paused: self.state.is_paused(),
            next_trigger_time: self.next_trigger_time,
        }
    }

    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    pub fn meter(&self) -> Meter {
        self.meter
    }

    pub fn playback_mode(&self) -> PlaybackMode {
        self.mode
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    pub fn last_bar_summary(&self) -> Option<BarSummary> {
        self.bar_timing.last_summary()
    }

    /// Time of the most recently committed step
    pub fn last_scheduled_time(&self) -> Option<ClockTime> {
        self.last_scheduled
    }

    /// `(sequence, step)` sounding at the clock's current time
    pub fn audible_step(&self) -> Option<(usize, usize)> {
        if self.state == SchedulerState::Idle {
            return None;
        }
        let now = self.clock.now();
        self.recent
            .iter()
            .rev()
            .find(|s| s.time <= now)
            .map(|s| (s.sequence, s.step))
    }

    pub fn dispatcher(&self) -> &VoiceDispatcher {
        &self.dispatcher
    }

    pub fn clock(&self) -> &Arc<dyn AudioClock> {
        &self.clock
    }

    pub fn dropped_events(&self) -> u64 {
        self.bus.dropped()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::messaging::EventReceiver;
    use crate::pattern::{Channel, PatternBank, Sequence, StepGrid};
    use crate::sampler::{BufferCache, DecodedBuffer};
    use crate::voice::{DispatcherSettings, NullBackend};

    struct Rig {
        clock: Arc<ManualClock>,
        bank: Arc<PatternBank>,
        scheduler: StepScheduler,
        events: EventReceiver,
    }

    fn rig(patterns: &[&str], steps: usize, config: EngineConfig) -> Rig {
        let clock = Arc::new(ManualClock::new(10.0));
        let cache = Arc::new(BufferCache::new());
        let sample = cache.insert(DecodedBuffer::from_mono(vec![0.5; 100], 1000));
        let bank = Arc::new(PatternBank::new());
        for i in 0..patterns.len() {
            bank.add_channel(Channel::new(format!("ch{}", i)).with_sample(sample));
        }
        bank.add_sequence(Sequence::with_grid("A", StepGrid::from_patterns(steps, patterns)));

        let dispatcher = VoiceDispatcher::new(
            Box::new(NullBackend),
            cache,
            DispatcherSettings::from(&config),
        );
        let (bus, events) = NotificationBus::channel(4096);
        let scheduler = StepScheduler::new(clock.clone(), bank.clone(), dispatcher, bus, &config);
        Rig {
            clock,
            bank,
            scheduler,
            events,
        }
    }

    fn trigger_times(events: &mut EventReceiver) -> Vec<f64> {
        events
            .drain()
            .into_iter()
            .filter(|e| e.kind == EventKind::Trigger)
            .map(|e| e.time)
            .collect()
    }

    #[test]
    fn test_start_is_idempotent() {
        let mut rig = rig(&["x..."], 4, EngineConfig::default());
        assert!(rig.scheduler.start());
        assert!(!rig.scheduler.start());
        let plays = rig
            .events
            .drain()
            .iter()
            .filter(|e| e.kind == EventKind::Play)
            .count();
        assert_eq!(plays, 1);
    }

    #[test]
    fn test_pump_fills_lookahead_window_only() {
        let mut rig = rig(&["xxxx"], 4, EngineConfig::default());
        rig.scheduler.start();
        // 120 BPM, 4 steps per beat: 125ms per step, 100ms window
        assert_eq!(rig.scheduler.pump(), 1);
        assert_eq!(rig.scheduler.pump(), 0);

        rig.clock.advance(0.05);
        assert_eq!(rig.scheduler.pump(), 1);
        assert_eq!(trigger_times(&mut rig.events), vec![10.0, 10.125]);
    }

    #[test]
    fn test_late_step_moved_to_now() {
        let mut rig = rig(&["xxxx"], 4, EngineConfig::default());
        rig.scheduler.start();
        rig.scheduler.pump();
        rig.clock.advance(1.0);
        rig.scheduler.pump();

        let times = trigger_times(&mut rig.events);
        assert_eq!(times[0], 10.0);
        assert_eq!(times[1], 11.0);
        assert!(times.windows(2).all(|w| w[1] >= w[0]));
        assert_eq!(rig.scheduler.stats().late_steps, 1);
    }

    #[test]
    fn test_muted_channel_and_reverse_override() {
        let mut rig = rig(&["x...", "r...", "x..."], 4, EngineConfig::default());
        rig.bank.update_channel(2, |c| c.set_muted(true));
        rig.scheduler.start();
        rig.scheduler.pump();

        let voices = rig.scheduler.dispatcher().voices();
        assert_eq!(voices.len(), 2);
        let channels: Vec<usize> = rig
            .events
            .drain()
            .iter()
            .filter_map(|e| e.channel)
            .collect();
        assert_eq!(channels, vec![0, 1]);
    }

    #[test]
    fn test_pause_rewinds_to_unplayed_step() {
        let config = EngineConfig {
            lookahead_secs: 0.3,
            ..Default::default()
        };
        let mut rig = rig(&["xxxx"], 4, config);
        rig.scheduler.start();
        rig.scheduler.pump(); // steps at 10.0, 10.125, 10.25
        assert_eq!(rig.scheduler.transport_state().current_step, 3);

        rig.clock.advance(0.13);
        assert!(rig.scheduler.pause());
        let state = rig.scheduler.transport_state();
        assert!(state.paused);
        assert_eq!(state.current_step, 2);
        assert_eq!(state.next_trigger_time, None);
        assert!(!rig.scheduler.pause());
        assert_eq!(rig.scheduler.dispatcher().pending_count(rig.clock.now()), 0);
    }

    #[test]
    fn test_pause_after_committed_wrap_keeps_new_order() {
        let config = EngineConfig {
            lookahead_secs: 0.3,
            ..Default::default()
        };
        let mut rig = rig(&["xxxx"], 4, config);
        rig.bank
            .add_sequence(Sequence::with_grid("B", StepGrid::from_patterns(4, &["x.x."])));
        rig.scheduler.start();
        rig.scheduler.pump();
        rig.scheduler.set_sequence_order(vec![1]);

        // the wrap into B is committed at 10.5, inside the window
        rig.clock.advance(0.21);
        rig.scheduler.pump();
        assert_eq!(rig.scheduler.transport_state().current_sequence_index, 1);

        rig.clock.advance(0.09);
        assert!(rig.scheduler.pause());
        assert_eq!(rig.scheduler.transport_state().current_sequence_index, 0);
        assert_eq!(rig.scheduler.transport_state().current_step, 3);
        rig.events.drain();

        assert!(rig.scheduler.resume());
        for _ in 0..10 {
            rig.scheduler.pump();
            rig.clock.advance(0.1);
        }
        let sequences: Vec<usize> = rig
            .events
            .drain()
            .into_iter()
            .filter(|e| e.kind == EventKind::Step)
            .map(|e| e.sequence)
            .collect();
        assert_eq!(sequences[0], 0);
        assert!(sequences.len() > 2);
        assert!(sequences[1..].iter().all(|&s| s == 1), "{:?}", sequences);
    }

    #[test]
    fn test_resume_schedules_from_now() {
        let mut rig = rig(&["xxxx"], 4, EngineConfig::default());
        rig.scheduler.start();
        rig.scheduler.pump();
        rig.clock.advance(0.2);
        rig.scheduler.pause();
        rig.clock.advance(5.0); // suspended, ignored
        assert!(rig.scheduler.resume());
        assert!(!rig.scheduler.resume());
        rig.events.drain();

        rig.scheduler.pump();
        let times = trigger_times(&mut rig.events);
        assert_eq!(times.len(), 1);
        assert!((times[0] - 10.2).abs() < 1e-9);
    }

    #[test]
    fn test_stop_resets_position() {
        let mut rig = rig(&["xxxx"], 4, EngineConfig::default());
        rig.scheduler.start();
        rig.scheduler.pump();
        rig.clock.advance(0.2);
        rig.scheduler.pump();
        assert!(rig.scheduler.stop());
        assert!(!rig.scheduler.stop());

        let state = rig.scheduler.transport_state();
        assert_eq!(state.current_step, 0);
        assert_eq!(state.current_sequence_index, 0);
        assert!(!state.running && !state.paused);
        assert_eq!(state.next_trigger_time, None);
        assert_eq!(rig.scheduler.pump(), 0);
    }

    #[test]
    fn test_beat_and_bar_events() {
        let config = EngineConfig {
            lookahead_secs: 2.1,
            ..Default::default()
        };
        let mut rig = rig(&["................"], 16, config);
        rig.scheduler.start();
        assert_eq!(rig.scheduler.pump(), 17);

        let events = rig.events.drain();
        let beats = events.iter().filter(|e| e.kind == EventKind::Beat).count();
        let bars: Vec<u64> = events
            .iter()
            .filter(|e| e.kind == EventKind::Bar)
            .map(|e| e.bar)
            .collect();
        assert_eq!(beats, 5);
        assert_eq!(bars, vec![0, 1]);
        assert_eq!(rig.scheduler.last_bar_summary().map(|s| s.steps), Some(16));
    }

    #[test]
    fn test_audible_step_follows_clock() {
        let config = EngineConfig {
            lookahead_secs: 0.5,
            ..Default::default()
        };
        let mut rig = rig(&["xxxx"], 4, config);
        assert_eq!(rig.scheduler.audible_step(), None);
        rig.scheduler.start();
        rig.scheduler.pump();
        assert_eq!(rig.scheduler.audible_step(), Some((0, 0)));
        rig.clock.advance(0.26);
        assert_eq!(rig.scheduler.audible_step(), Some((0, 2)));
    }
}
