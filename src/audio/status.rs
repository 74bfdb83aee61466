// Output status - Shared between the stream error callback and the host

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStatus {
    Starting = 0,
    Running = 1,
    Error = 2,
}

impl From<u8> for OutputStatus {
    fn from(value: u8) -> Self {
        match value {
            1 => OutputStatus::Running,
            2 => OutputStatus::Error,
            _ => OutputStatus::Starting,
        }
    }
}

#[derive(Clone)]
pub struct AtomicOutputStatus {
    inner: Arc<AtomicU8>,
}

impl AtomicOutputStatus {
    pub fn new(status: OutputStatus) -> Self {
        Self {
            inner: Arc::new(AtomicU8::new(status as u8)),
        }
    }

    pub fn get(&self) -> OutputStatus {
        OutputStatus::from(self.inner.load(Ordering::Relaxed))
    }

    pub fn set(&self, status: OutputStatus) {
        self.inner.store(status as u8, Ordering::Relaxed);
    }
}

impl Default for AtomicOutputStatus {
    fn default() -> Self {
        Self::new(OutputStatus::Starting)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_shared_between_clones() {
        let status = AtomicOutputStatus::default();
        let other = status.clone();
        assert_eq!(status.get(), OutputStatus::Starting);
        other.set(OutputStatus::Error);
        assert_eq!(status.get(), OutputStatus::Error);
    }

    #[test]
    fn test_unknown_value_maps_to_starting() {
        assert_eq!(OutputStatus::from(42), OutputStatus::Starting);
    }
}
