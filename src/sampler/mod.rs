// Sampler - Decoded sample buffers and the provider the dispatcher reads them from

pub mod buffer;
pub mod provider;

pub use buffer::DecodedBuffer;
pub use provider::{BufferCache, BufferProvider};

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SAMPLE_REF: AtomicU64 = AtomicU64::new(1);

/// Opaque handle to a decoded sample owned by a [`BufferProvider`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SampleRef(pub u64);

impl SampleRef {
    /// Allocate a process-unique handle
    pub fn next() -> Self {
        SampleRef(NEXT_SAMPLE_REF.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for SampleRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sample#{}", self.0)
    }
}
