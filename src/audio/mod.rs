// Audio output - cpal stream rendering the mixer and driving the sample clock

pub mod device;
pub mod output;
pub mod status;

pub use device::{AudioDeviceInfo, AudioDeviceManager};
pub use output::AudioOutput;
pub use status::{AtomicOutputStatus, OutputStatus};

#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("No audio output device found")]
    NoDevice,

    #[error("Audio device not found: {0}")]
    DeviceNotFound(String),

    #[error("Configuration error: {0}")]
    Config(#[from] cpal::DefaultStreamConfigError),

    #[error("Failed to build stream: {0}")]
    Build(#[from] cpal::BuildStreamError),

    #[error("Failed to start stream: {0}")]
    Play(#[from] cpal::PlayStreamError),

    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),
}
