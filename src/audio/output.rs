// Audio output - Real-time cpal callback
//
// The callback renders the mixer at the sample clock's current time, then
// advances the clock by the block length. Everything is rendered in f32 and
// converted to the device format when written out (F32, I16 and U16).

use super::device::AudioDeviceManager;
use super::status::{AtomicOutputStatus, OutputStatus};
use super::OutputError;
use crate::clock::{AudioClock, SampleClock};
use crate::voice::Mixer;
use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{Device, FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};

const SCRATCH_FRAMES: usize = 4096;

pub struct AudioOutput {
    _stream: Stream,
    clock: SampleClock,
    sample_rate: u32,
    channels: u16,
    device_name: String,
    status: AtomicOutputStatus,
}

impl AudioOutput {
    /// Open `device` (or the default output) and start rendering `mixer`
    pub fn open(device: Option<&str>, mixer: Mixer) -> Result<Self, OutputError> {
        let device = AudioDeviceManager::new().output_device(device)?;
        let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());

        let supported = device.default_output_config()?;
        let sample_format = supported.sample_format();
        let config: StreamConfig = supported.into();
        let sample_rate = config.sample_rate.0;
        let channels = config.channels;

        log::info!(
            "Audio output: {} ({} Hz, {} channels, {:?})",
            device_name,
            sample_rate,
            channels,
            sample_format
        );

        let clock = SampleClock::new(sample_rate);
        let status = AtomicOutputStatus::default();

        let stream = match sample_format {
            SampleFormat::F32 => {
                build_stream::<f32>(&device, &config, mixer, clock.clone(), status.clone())
            }
            SampleFormat::I16 => {
                build_stream::<i16>(&device, &config, mixer, clock.clone(), status.clone())
            }
            SampleFormat::U16 => {
                build_stream::<u16>(&device, &config, mixer, clock.clone(), status.clone())
            }
            other => return Err(OutputError::UnsupportedFormat(format!("{:?}", other))),
        }?;

        stream.play()?;
        status.set(OutputStatus::Running);

        Ok(Self {
            _stream: stream,
            clock,
            sample_rate,
            channels,
            device_name,
            status,
        })
    }

    /// Clock advanced by this stream
    pub fn clock(&self) -> SampleClock {
        self.clock.clone()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn status(&self) -> OutputStatus {
        self.status.get()
    }
}

fn build_stream<T>(
    device: &Device,
    config: &StreamConfig,
    mut mixer: Mixer,
    clock: SampleClock,
    status: AtomicOutputStatus,
) -> Result<Stream, OutputError>
where
    T: SizedSample + FromSample<f32> + Send + 'static,
{
    let channels = config.channels.max(1) as usize;
    let sample_rate = config.sample_rate.0 as f64;
    let mut scratch = vec![0.0f32; SCRATCH_FRAMES * channels];

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            if scratch.len() < data.len() {
                // only when the host hands us an unusually large block
                scratch.resize(data.len(), 0.0);
            }
            let block = &mut scratch[..data.len()];

            if clock.is_rendering() {
                mixer.render(block, channels, sample_rate, clock.now());
            } else {
                block.fill(0.0);
            }
            clock.advance(data.len() / channels);

            for (out, &sample) in data.iter_mut().zip(block.iter()) {
                *out = T::from_sample(sample);
            }
        },
        move |err| {
            log::error!("Audio stream error: {}", err);
            status.set(OutputStatus::Error);
        },
        None,
    )?;

    Ok(stream)
}

#[cfg(test)]
mod tests {
    use cpal::Sample;

    #[test]
    fn test_sample_conversion_bounds() {
        assert_eq!(i16::from_sample(0.0f32), 0);
        assert!(i16::from_sample(1.0f32) >= i16::MAX - 1);
        assert_eq!(u16::from_sample(0.0f32), 32768);
        assert_eq!(f32::from_sample(0.25f32).to_sample::<f32>(), 0.25);
    }
}
