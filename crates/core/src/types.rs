//! Fundamental types shared across the workspace.

use serde::{Deserialize, Serialize};

/// Opaque key identifier. Clients choose the key space.
pub type Key = u64;

/// Opaque value payload.
pub type Value = u64;

/// Point on the shared logical clock.
///
/// Timestamps are strictly increasing across writes; 0 is the sentinel for
/// "never written", earlier than any snapshot a transaction can take.
pub type Timestamp = u64;

/// Unique transaction identifier.
///
/// Assigned in submission order, strictly increasing for the lifetime of a
/// processor. Identity is preserved across optimistic restarts, so a TxnId
/// names one logical transaction no matter how many attempts it takes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TxnId(u64);

impl TxnId {
    /// Placeholder id for a transaction that has not been submitted yet.
    pub const UNASSIGNED: TxnId = TxnId(0);

    /// Create a TxnId from a raw counter value.
    pub fn new(raw: u64) -> Self {
        TxnId(raw)
    }

    /// Raw counter value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TxnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Concurrency-control regime, selected at processor construction.
///
/// Each mode runs independently; a processor never mixes regimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CcMode {
    /// One transaction at a time on the scheduler thread.
    Serial,
    /// Two-phase locking where every lock is exclusive.
    ExclusiveLocking,
    /// Two-phase locking with shared read locks and exclusive write locks.
    SharedLocking,
    /// Optimistic concurrency control, validated on the scheduler thread.
    Occ,
    /// Optimistic concurrency control with validation on worker threads.
    ParallelOcc,
}

impl CcMode {
    /// All modes, in comparison order. Handy for sweeping tests and benches.
    pub const ALL: [CcMode; 5] = [
        CcMode::Serial,
        CcMode::ExclusiveLocking,
        CcMode::SharedLocking,
        CcMode::Occ,
        CcMode::ParallelOcc,
    ];
}

impl std::fmt::Display for CcMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CcMode::Serial => "serial",
            CcMode::ExclusiveLocking => "locking-exclusive",
            CcMode::SharedLocking => "locking-shared",
            CcMode::Occ => "occ",
            CcMode::ParallelOcc => "occ-parallel",
        };
        f.write_str(name)
    }
}
