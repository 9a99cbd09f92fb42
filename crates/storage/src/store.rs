//! The backing key/value store.
//!
//! # Design
//!
//! - DashMap cells: per-entry locking, concurrent reads from executors and
//!   validators while the certifying side writes
//! - One logical clock per store: write stamps and OCC snapshots come from
//!   the same counter, so a write installed after a snapshot was taken is
//!   always stamped past it
//!
//! # Thread Safety
//!
//! Each operation is atomic with respect to its key. Nothing here provides
//! cross-key atomicity; that is the concurrency-control regime's job.

use dashmap::DashMap;
use lockstep_core::clock::LogicalClock;
use lockstep_core::types::{Key, Timestamp, Value};

/// A stored value and the time it was last written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionedValue {
    /// Current payload.
    pub value: Value,
    /// Clock reading at the most recent write of this key.
    pub last_modified: Timestamp,
}

/// Concurrent key/value store with per-key last-write timestamps.
#[derive(Debug, Default)]
pub struct TxnStore {
    cells: DashMap<Key, VersionedValue>,
    clock: LogicalClock,
}

impl TxnStore {
    /// Create an empty store with a clock at time 0.
    pub fn new() -> Self {
        TxnStore {
            cells: DashMap::new(),
            clock: LogicalClock::new(),
        }
    }

    /// Current value of `key`, or `None` if it has never been written.
    pub fn read(&self, key: Key) -> Option<Value> {
        self.cells.get(&key).map(|cell| cell.value)
    }

    /// Overwrite `key`, stamping it with a fresh clock tick.
    pub fn write(&self, key: Key, value: Value) {
        let last_modified = self.clock.tick();
        self.cells.insert(
            key,
            VersionedValue {
                value,
                last_modified,
            },
        );
    }

    /// Last-write time of `key`, or 0 if it has never been written. The
    /// sentinel is earlier than any snapshot a transaction can take.
    pub fn last_modified(&self, key: Key) -> Timestamp {
        self.cells
            .get(&key)
            .map(|cell| cell.last_modified)
            .unwrap_or(0)
    }

    /// Current clock reading. Used to stamp OCC admission snapshots.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Number of keys ever written.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
