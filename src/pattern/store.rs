// Pattern store - Read interface the scheduler pulls channels and grids from

use super::channel::Channel;
use super::grid::StepGrid;
use super::sequence::Sequence;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Source of channel settings and step grids
///
/// Read once per step by the scheduling thread while an editor may be
/// writing concurrently; implementations must hand out consistent values.
pub trait PatternStore: Send + Sync {
    fn channel_count(&self) -> usize;

    fn channel(&self, index: usize) -> Option<Channel>;

    fn sequence_count(&self) -> usize;

    fn step_grid(&self, sequence: usize) -> Option<Arc<StepGrid>>;

    /// Whether the sequence takes part in continuous playback
    fn is_live(&self, sequence: usize) -> bool {
        sequence < self.sequence_count()
    }
}

/// In-memory pattern store
#[derive(Debug, Default)]
pub struct PatternBank {
    channels: RwLock<Vec<Channel>>,
    sequences: RwLock<Vec<Sequence>>,
}

impl PatternBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_channels(channels: Vec<Channel>) -> Self {
        Self {
            channels: RwLock::new(channels),
            sequences: RwLock::new(Vec::new()),
        }
    }

    fn read_channels(&self) -> RwLockReadGuard<'_, Vec<Channel>> {
        self.channels.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_channels(&self) -> RwLockWriteGuard<'_, Vec<Channel>> {
        self.channels.write().unwrap_or_else(|e| e.into_inner())
    }

    fn read_sequences(&self) -> RwLockReadGuard<'_, Vec<Sequence>> {
        self.sequences.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_sequences(&self) -> RwLockWriteGuard<'_, Vec<Sequence>> {
        self.sequences.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Append a channel, returning its index
    pub fn add_channel(&self, channel: Channel) -> usize {
        let mut channels = self.write_channels();
        channels.push(channel);
        channels.len() - 1
    }

    /// Edit a channel in place; returns false for an unknown index
    pub fn update_channel(&self, index: usize, edit: impl FnOnce(&mut Channel)) -> bool {
        match self.write_channels().get_mut(index) {
            Some(channel) => {
                edit(channel);
                true
            }
            None => false,
        }
    }

    /// Append a sequence, returning its index
    pub fn add_sequence(&self, sequence: Sequence) -> usize {
        let mut sequences = self.write_sequences();
        sequences.push(sequence);
        sequences.len() - 1
    }

    pub fn sequence(&self, index: usize) -> Option<Sequence> {
        self.read_sequences().get(index).cloned()
    }

    pub fn set_live(&self, index: usize, live: bool) {
        if let Some(sequence) = self.write_sequences().get_mut(index) {
            sequence.live = live;
        }
    }
}

impl PatternStore for PatternBank {
    fn channel_count(&self) -> usize {
        self.read_channels().len()
    }

    fn channel(&self, index: usize) -> Option<Channel> {
        self.read_channels().get(index).cloned()
    }

    fn sequence_count(&self) -> usize {
        self.read_sequences().len()
    }

    fn step_grid(&self, sequence: usize) -> Option<Arc<StepGrid>> {
        self.read_sequences()
            .get(sequence)
            .map(|s| Arc::clone(&s.grid))
    }

    fn is_live(&self, sequence: usize) -> bool {
        self.read_sequences()
            .get(sequence)
            .map(|s| s.live)
            .unwrap_or(false)
    }
}
