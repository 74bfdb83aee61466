//! Voice creation, choke, fade and teardown as seen from the transport

mod common;

use common::{START_TIME, approx_eq, rig};
use pulsegrid::{
    BufferCache, Channel, DecodedBuffer, EngineConfig, ManualClock, PatternBank, Sequence,
    StepGrid, TransportController, VoiceCommand, create_voice_channel,
};
use std::sync::Arc;

#[test]
fn test_every_envelope_starts_and_ends_silent() {
    let rig = rig(&["xxxx", "x.x.", "...x"], 4, EngineConfig::default());
    rig.transport.start();
    rig.run(100, 0.01);
    rig.transport.stop();

    let commands = rig.backend.commands();
    assert!(!commands.is_empty());
    for command in commands {
        match command {
            VoiceCommand::Start {
                start_time,
                stop_time,
                envelope,
                ..
            } => {
                assert_eq!(envelope.value_at(start_time), 0.0);
                assert_eq!(envelope.value_at(stop_time), 0.0);
                assert!(envelope.peak() > 0.0);
            }
            VoiceCommand::Release {
                stop_time,
                envelope,
                ..
            } => {
                assert_eq!(envelope.value_at(stop_time), 0.0);
                assert!(approx_eq(envelope.end_time(), stop_time));
            }
            VoiceCommand::Free { .. } => {}
        }
    }
}

#[test]
fn test_rapid_retrigger_crossfades_once() {
    let mut config = EngineConfig::default();
    config.default_bpm = 999.0;
    let rig = rig(&["xxxxxxxxxxxxxxxx"], 16, config);
    rig.transport.start();
    rig.run(50, 0.01);

    let release = 0.005;
    rig.transport.inspect(|s| {
        let voices = s.dispatcher().voices();
        assert!(voices.len() > 20);
        for pair in voices.windows(2) {
            let (old, new) = (&pair[0], &pair[1]);
            assert!(new.start_time > old.start_time);
            // the previous hit is gone once the new one is past its release ramp
            assert!(old.stop_time <= new.start_time + release + 1e-9);
        }

        // never more than the crossfading pair at once
        for voice in voices {
            let t = voice.start_time + 0.001;
            let sounding = voices.iter().filter(|v| v.is_sounding(t)).count();
            assert!(sounding <= 2, "{} voices at {}", sounding, t);
        }
    });
}

#[test]
fn test_trim_and_reverse_shape_the_voice() {
    let rig = rig(&["x...", "r..."], 4, EngineConfig::default());
    rig.bank.update_channel(0, |c| c.set_trim(0.25, 0.75));
    rig.bank.update_channel(1, |c| {
        c.set_trim(0.1, 0.4);
        c.set_playback_speed(2.0);
    });
    rig.transport.start();
    rig.transport.pump();

    let starts: Vec<(f64, f64, f64)> = rig
        .backend
        .commands()
        .into_iter()
        .filter_map(|c| match c {
            VoiceCommand::Start {
                stop_time,
                offset,
                rate,
                ..
            } => Some((stop_time, offset, rate)),
            _ => None,
        })
        .collect();
    assert_eq!(starts.len(), 2);

    // forward: half the buffer from 0.25s
    assert!(approx_eq(starts[0].0, START_TIME + 0.5));
    assert!(approx_eq(starts[0].1, 0.25));
    // reversed slice [0.1, 0.4] read from 0.6s of the reversed buffer, twice as fast
    assert!(approx_eq(starts[1].1, 0.6));
    assert!(approx_eq(starts[1].0, START_TIME + 0.15));
    assert_eq!(starts[1].2, 2.0);
}

#[test]
fn test_channel_without_sample_is_skipped() {
    let rig = rig(&["x...", "x..."], 4, EngineConfig::default());
    rig.bank.update_channel(1, |c| c.set_sample(None));
    rig.transport.start();
    rig.transport.pump();

    assert_eq!(rig.backend.starts().len(), 1);
    let stats = rig.transport.stats();
    assert_eq!(stats.triggers, 1);
    assert_eq!(stats.dropped_triggers, 0);
}

#[test]
fn test_removed_buffer_drops_trigger_only() {
    let rig = rig(&["xxxx"], 4, EngineConfig::default());
    rig.transport.start();
    rig.transport.pump();
    rig.cache.remove(rig.sample);
    rig.run(40, 0.01);

    assert_eq!(rig.backend.starts().len(), 1);
    let stats = rig.transport.stats();
    assert!(stats.dropped_triggers >= 3);
    assert!(stats.steps >= 4);
}

#[test]
fn test_finished_voices_are_torn_down() {
    let rig = rig(&["x..."], 4, EngineConfig::default());
    rig.transport.start();
    rig.transport.pump();
    rig.clock.advance(0.005);
    rig.transport.stop();
    assert_eq!(rig.transport.inspect(|s| s.dispatcher().voice_count()), 1);

    // faded out at 10.015, teardown margin 1s
    rig.clock.advance(0.9);
    rig.transport.pump();
    assert_eq!(rig.transport.inspect(|s| s.dispatcher().voice_count()), 1);
    rig.clock.advance(0.2);
    rig.transport.pump();
    assert_eq!(rig.transport.inspect(|s| s.dispatcher().voice_count()), 0);
    assert!(
        rig.backend
            .commands()
            .iter()
            .any(|c| matches!(c, VoiceCommand::Free { .. }))
    );
}

#[test]
fn test_mixer_renders_scheduled_steps() {
    let clock = Arc::new(ManualClock::new(START_TIME));
    let cache = Arc::new(BufferCache::new());
    let sample = cache.insert(DecodedBuffer::from_mono(vec![0.5; 1000], 1000));
    let bank = Arc::new(PatternBank::new());
    bank.add_channel(Channel::new("dc").with_sample(sample));
    bank.add_sequence(Sequence::with_grid("A", StepGrid::from_patterns(4, &["x.x."])));

    let (backend, mut mixer) = create_voice_channel(64, 16);
    let transport = TransportController::builder(EngineConfig::default())
        .clock(clock.clone())
        .pattern_store(bank)
        .buffers(cache)
        .voice_backend(Box::new(backend))
        .build()
        .unwrap();
    transport.start();
    transport.pump();

    // 1 kHz output: one frame per millisecond
    let mut out = vec![0.0f32; 300];
    mixer.render(&mut out, 1, 1000.0, START_TIME);
    assert_eq!(out[0], 0.0);
    assert!(out[50] > 0.3);
    // the step at 10.25 chokes the first voice
    clock.advance(0.1);
    transport.pump();
    clock.advance(0.1);
    transport.pump();
    let mut next = vec![0.0f32; 300];
    mixer.render(&mut next, 1, 1000.0, START_TIME + 0.3);
    assert!(next[..240].iter().all(|s| s.is_finite() && s.abs() < 1.0));
    assert!(next[100] > 0.3);
}
