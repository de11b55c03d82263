//! Request counters.
//!
//! Counters are plain owned objects: the server creates one at startup and
//! shares it through its state. There are no process-wide statics, so every
//! server instance (and every test) counts independently.
use std::sync::atomic::{AtomicU64, Ordering};

/// Number of static-file visits since startup or the last reset.
#[derive(Debug, Default)]
pub struct VisitCounter {
    hits: AtomicU64,
}

impl VisitCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one visit and return the new total.
    pub fn increment(&self) -> u64 {
        self.hits.fetch_add(1, Ordering::Relaxed).saturating_add(1)
    }

    pub fn load(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Zero the counter, returning the value it held.
    pub fn reset(&self) -> u64 {
        self.hits.swap(0, Ordering::Relaxed)
    }
}
