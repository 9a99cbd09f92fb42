//! Shared logical clock.
//!
//! One clock instance orders all writes and OCC snapshots in a processor.
//! `now` observes the clock without advancing it; `tick` advances it and
//! returns the new value. A `tick` that happens after a `now` always returns
//! a strictly greater timestamp, which is the property OCC validation relies
//! on: a write installed after a transaction took its snapshot is stamped
//! past that snapshot.

use crate::types::Timestamp;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic logical clock backed by an atomic counter.
#[derive(Debug, Default)]
pub struct LogicalClock(AtomicU64);

impl LogicalClock {
    /// Create a clock at time 0.
    pub fn new() -> Self {
        LogicalClock(AtomicU64::new(0))
    }

    /// Current time, without advancing the clock.
    #[inline]
    pub fn now(&self) -> Timestamp {
        self.0.load(Ordering::Acquire)
    }

    /// Advance the clock and return the new time.
    #[inline]
    pub fn tick(&self) -> Timestamp {
        self.0.fetch_add(1, Ordering::AcqRel) + 1
    }
}
