// Buffer provider - Lookup of decoded buffers by sample handle
// Reversed variants are computed once at insertion, never on the scheduling path

use super::SampleRef;
use super::buffer::DecodedBuffer;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

pub trait BufferProvider: Send + Sync {
    fn decoded_buffer(&self, sample: SampleRef) -> Option<Arc<DecodedBuffer>>;

    fn reversed_buffer(&self, sample: SampleRef) -> Option<Arc<DecodedBuffer>>;
}

#[derive(Debug)]
struct CachedBuffer {
    forward: Arc<DecodedBuffer>,
    reversed: Arc<DecodedBuffer>,
}

/// In-memory buffer store holding forward and pre-reversed copies
#[derive(Debug, Default)]
pub struct BufferCache {
    entries: RwLock<HashMap<SampleRef, CachedBuffer>>,
}

impl BufferCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a buffer under a fresh handle
    pub fn insert(&self, buffer: DecodedBuffer) -> SampleRef {
        let sample = SampleRef::next();
        self.insert_at(sample, buffer);
        sample
    }

    /// Store (or replace) a buffer under an existing handle
    pub fn insert_at(&self, sample: SampleRef, buffer: DecodedBuffer) {
        let reversed = Arc::new(buffer.reversed());
        let entry = CachedBuffer {
            forward: Arc::new(buffer),
            reversed,
        };
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(sample, entry);
    }

    pub fn remove(&self, sample: SampleRef) -> bool {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&sample)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BufferProvider for BufferCache {
    fn decoded_buffer(&self, sample: SampleRef) -> Option<Arc<DecodedBuffer>> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&sample)
            .map(|e| Arc::clone(&e.forward))
    }

    fn reversed_buffer(&self, sample: SampleRef) -> Option<Arc<DecodedBuffer>> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&sample)
            .map(|e| Arc::clone(&e.reversed))
    }
}
