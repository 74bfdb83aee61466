// Voice dispatcher - Turns a (channel, time) trigger into a scheduled voice
// Owns every voice from creation to teardown

use super::backend::{VoiceBackend, VoiceCommand};
use super::envelope::GainEnvelope;
use super::{DispatchError, Voice, VoiceHandle, VoiceId};
use crate::clock::ClockTime;
use crate::config::EngineConfig;
use crate::pattern::Channel;
use crate::sampler::BufferProvider;
use crate::trim::{MIN_AUDIBLE_DURATION, compute_play_window};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DispatcherSettings {
    pub attack: f64,
    pub release: f64,
    pub stop_fade: f64,
    pub teardown_margin: f64,
    pub max_voices: usize,
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for DispatcherSettings {
    fn from(config: &EngineConfig) -> Self {
        Self {
            attack: config.attack_secs,
            release: config.release_secs,
            stop_fade: config.stop_fade_secs,
            teardown_margin: config.teardown_margin_secs,
            max_voices: config.max_voices,
        }
    }
}

/// Creates, chokes, fades and frees voices
///
/// Retriggering a channel always starts a fresh voice; whatever that
/// channel still has sounding is faded out from the new trigger time over
/// the release ramp, so the two overlap only as a short crossfade.
pub struct VoiceDispatcher {
    backend: Box<dyn VoiceBackend>,
    buffers: Arc<dyn BufferProvider>,
    settings: DispatcherSettings,
    voices: Vec<Voice>,
    next_id: u64,
    /// Latest clock time seen through `reap`/`stop_all`
    now: ClockTime,
}

impl VoiceDispatcher {
    pub fn new(
        backend: Box<dyn VoiceBackend>,
        buffers: Arc<dyn BufferProvider>,
        settings: DispatcherSettings,
    ) -> Self {
        Self {
            backend,
            buffers,
            voices: Vec::with_capacity(settings.max_voices),
            settings,
            next_id: 1,
            now: ClockTime::NEG_INFINITY,
        }
    }

    pub fn settings(&self) -> &DispatcherSettings {
        &self.settings
    }

    /// Schedule `channel`'s buffer to start exactly at `at`
    pub fn trigger(
        &mut self,
        channel_index: usize,
        channel: &Channel,
        reverse: bool,
        at: ClockTime,
    ) -> Result<VoiceHandle, DispatchError> {
        let sample = channel.sample.ok_or(DispatchError::NoSample(channel_index))?;
        let forward = self
            .buffers
            .decoded_buffer(sample)
            .ok_or(DispatchError::MissingBuffer(sample))?;
        let buffer = if reverse {
            self.buffers
                .reversed_buffer(sample)
                .ok_or(DispatchError::MissingBuffer(sample))?
        } else {
            forward
        };

        let window = compute_play_window(channel, reverse, buffer.duration());
        if window.audible_duration < MIN_AUDIBLE_DURATION {
            return Err(DispatchError::EmptyWindow(sample));
        }

        // the mixer holds a voice until the clock passes its stop time
        let live = self.voices.iter().filter(|v| v.stop_time > self.now).count();
        if live >= self.settings.max_voices {
            return Err(DispatchError::VoiceLimit(self.settings.max_voices));
        }

        let stop_time = at + window.audible_duration;
        let attack = self.settings.attack.max(channel.fade_in);
        let release = self.settings.release.max(channel.fade_out);
        let envelope = GainEnvelope::new(at, stop_time, channel.volume, attack, release);

        let id = VoiceId(self.next_id);
        self.backend.submit(VoiceCommand::Start {
            id,
            buffer,
            start_time: at,
            stop_time,
            offset: window.offset,
            rate: window.rate,
            envelope,
        })?;
        self.next_id += 1;

        self.choke_channel(channel_index, at);

        self.voices.push(Voice {
            id,
            channel_index,
            sample,
            start_time: at,
            stop_time,
            envelope,
        });

        Ok(VoiceHandle {
            id,
            channel_index,
            start_time: at,
            stop_time,
        })
    }

    /// Fade out the channel's voices that would still sound at `at`
    fn choke_channel(&mut self, channel_index: usize, at: ClockTime) {
        let fade = self.settings.release;
        for voice in self
            .voices
            .iter_mut()
            .filter(|v| v.channel_index == channel_index && v.stop_time > at)
        {
            let envelope = voice.envelope.release_at(at, fade);
            voice.envelope = envelope;
            voice.stop_time = envelope.end_time();
            let command = VoiceCommand::Release {
                id: voice.id,
                stop_time: voice.stop_time,
                envelope,
            };
            if let Err(e) = self.backend.submit(command) {
                log::warn!("Could not choke voice {:?}: {}", voice.id, e);
            }
        }
    }

    /// Silence everything: pending voices are cancelled, sounding ones fade out
    ///
    /// Returns the number of voices affected.
    pub fn stop_all(&mut self, now: ClockTime) -> usize {
        self.now = self.now.max(now);
        let fade = self.settings.stop_fade;
        let mut affected = 0;
        let backend = &mut self.backend;

        self.voices.retain_mut(|voice| {
            if voice.start_time >= now {
                affected += 1;
                if let Err(e) = backend.submit(VoiceCommand::Free { id: voice.id }) {
                    log::warn!("Could not cancel voice {:?}: {}", voice.id, e);
                }
                return false;
            }
            if voice.stop_time > now {
                affected += 1;
                let envelope = voice.envelope.release_at(now, fade);
                voice.envelope = envelope;
                voice.stop_time = envelope.end_time();
                if let Err(e) = backend.submit(VoiceCommand::Release {
                    id: voice.id,
                    stop_time: voice.stop_time,
                    envelope,
                }) {
                    log::warn!("Could not release voice {:?}: {}", voice.id, e);
                }
            }
            true
        });

        affected
    }

    /// Tear down voices whose stop time is older than the teardown margin
    pub fn reap(&mut self, now: ClockTime) -> usize {
        self.now = self.now.max(now);
        let margin = self.settings.teardown_margin;
        let before = self.voices.len();
        let backend = &mut self.backend;

        self.voices.retain(|voice| {
            if voice.stop_time + margin > now {
                return true;
            }
            if let Err(e) = backend.submit(VoiceCommand::Free { id: voice.id }) {
                // the mixer frees finished voices on its own
                log::debug!("Free for voice {:?} not delivered: {}", voice.id, e);
            }
            false
        });

        before - self.voices.len()
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    /// Voices not yet torn down
    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    pub fn pending_count(&self, now: ClockTime) -> usize {
        self.voices.iter().filter(|v| v.is_pending(now)).count()
    }

    pub fn sounding_count(&self, now: ClockTime) -> usize {
        self.voices.iter().filter(|v| v.is_sounding(now)).count()
    }
}
