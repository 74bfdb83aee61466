// Output device lookup

use super::OutputError;
use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{Device, Host};

#[derive(Clone, Debug)]
pub struct AudioDeviceInfo {
    pub name: String,
    pub is_default: bool,
}

pub struct AudioDeviceManager {
    host: Host,
}

impl AudioDeviceManager {
    pub fn new() -> Self {
        Self {
            host: cpal::default_host(),
        }
    }

    pub fn list_output_devices(&self) -> Vec<AudioDeviceInfo> {
        let default_name = self
            .host
            .default_output_device()
            .and_then(|d| d.name().ok())
            .unwrap_or_default();

        match self.host.output_devices() {
            Ok(devices) => devices
                .filter_map(|d| d.name().ok())
                .map(|name| AudioDeviceInfo {
                    is_default: name == default_name,
                    name,
                })
                .collect(),
            Err(e) => {
                log::warn!("Could not enumerate output devices: {}", e);
                Vec::new()
            }
        }
    }

    /// Named device, or the host default when `name` is `None`
    pub fn output_device(&self, name: Option<&str>) -> Result<Device, OutputError> {
        match name {
            None => self
                .host
                .default_output_device()
                .ok_or(OutputError::NoDevice),
            Some(wanted) => self
                .host
                .output_devices()
                .ok()
                .and_then(|mut devices| {
                    devices.find(|d| d.name().map(|n| n == wanted).unwrap_or(false))
                })
                .ok_or_else(|| OutputError::DeviceNotFound(wanted.to_string())),
        }
    }
}

impl Default for AudioDeviceManager {
    fn default() -> Self {
        Self::new()
    }
}
