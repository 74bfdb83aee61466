// Mixer - Renders scheduled voices on the audio thread
// No allocation or locking here; commands arrive through the ringbuffer

use super::VoiceId;
use super::backend::{VoiceCommand, VoiceCommandConsumer};
use super::envelope::GainEnvelope;
use crate::clock::ClockTime;
use crate::sampler::DecodedBuffer;
use ringbuf::traits::Consumer;
use std::sync::Arc;

struct MixerVoice {
    id: VoiceId,
    buffer: Arc<DecodedBuffer>,
    start_time: ClockTime,
    stop_time: ClockTime,
    /// Read position at `start_time`, in buffer frames
    offset_frames: f64,
    /// Buffer frames consumed per second of clock time
    frames_per_second: f64,
    /// Last readable frame of the play window
    end_frame: f64,
    envelope: GainEnvelope,
}

impl MixerVoice {
    #[inline]
    fn position_at(&self, t: ClockTime) -> f64 {
        self.offset_frames + (t - self.start_time) * self.frames_per_second
    }
}

/// Sample-accurate voice renderer
///
/// Each output frame is mapped to a clock time, so a voice starts on the
/// exact frame its start time falls on regardless of block boundaries.
pub struct Mixer {
    commands: VoiceCommandConsumer,
    voices: Vec<MixerVoice>,
    max_voices: usize,
    dropped: usize,
}

impl Mixer {
    pub fn new(commands: VoiceCommandConsumer, max_voices: usize) -> Self {
        let max_voices = max_voices.max(1);
        Self {
            commands,
            voices: Vec::with_capacity(max_voices),
            max_voices,
            dropped: 0,
        }
    }

    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    /// Starts refused because the pool was full
    pub fn dropped_voices(&self) -> usize {
        self.dropped
    }

    fn apply(&mut self, command: VoiceCommand) {
        match command {
            VoiceCommand::Start {
                id,
                buffer,
                start_time,
                stop_time,
                offset,
                rate,
                envelope,
            } => {
                let sr = buffer.sample_rate() as f64;
                let offset_frames = offset * sr;
                let window_frames = (stop_time - start_time) * rate * sr;
                let voice = MixerVoice {
                    id,
                    start_time,
                    stop_time,
                    offset_frames,
                    frames_per_second: rate * sr,
                    end_frame: offset_frames + window_frames,
                    envelope,
                    buffer,
                };
                // pool full: the new voice is dropped, sounding ones keep their ramps
                if self.voices.len() >= self.max_voices {
                    self.dropped += 1;
                    return;
                }
                self.voices.push(voice);
            }
            VoiceCommand::Release {
                id,
                stop_time,
                envelope,
            } => {
                if let Some(voice) = self.voices.iter_mut().find(|v| v.id == id) {
                    voice.stop_time = stop_time;
                    voice.envelope = envelope;
                }
            }
            VoiceCommand::Free { id } => {
                if let Some(idx) = self.voices.iter().position(|v| v.id == id) {
                    self.voices.swap_remove(idx);
                }
            }
        }
    }

    /// Mix one interleaved block whose first frame plays at `block_start`
    pub fn render(
        &mut self,
        output: &mut [f32],
        channels: usize,
        sample_rate: f64,
        block_start: ClockTime,
    ) {
        while let Some(command) = self.commands.try_pop() {
            self.apply(command);
        }

        output.fill(0.0);
        let channels = channels.max(1);
        let frames = output.len() / channels;
        let dt = 1.0 / sample_rate;

        for voice in &self.voices {
            for frame in 0..frames {
                let t = block_start + frame as f64 * dt;
                if t < voice.start_time {
                    continue;
                }
                if t >= voice.stop_time {
                    break;
                }
                let position = voice.position_at(t);
                if position > voice.end_frame {
                    break;
                }
                let gain = voice.envelope.value_at(t);
                if gain == 0.0 {
                    continue;
                }
                let out = &mut output[frame * channels..(frame + 1) * channels];
                for (c, sample) in out.iter_mut().enumerate() {
                    *sample += voice.buffer.interpolate(position, c) * gain;
                }
            }
        }

        for sample in output.iter_mut() {
            *sample = flush_denormals(sample.tanh());
        }

        let block_end = block_start + frames as f64 * dt;
        self.voices.retain(|v| v.stop_time > block_end);
    }
}

#[inline]
fn flush_denormals(x: f32) -> f32 {
    if x.abs() < 1e-15 { 0.0 } else { x }
}
