//! Lock table vocabulary and the manager interface.

use lockstep_core::types::{Key, TxnId};

/// Access mode of a lock request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// Multiple holders allowed while no exclusive request is ahead.
    Shared,
    /// Single holder, granted only at the head of the queue.
    Exclusive,
}

/// One entry in a per-key request queue.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LockRequest {
    pub(crate) txn: TxnId,
    pub(crate) mode: LockMode,
}

impl LockRequest {
    pub(crate) fn new(txn: TxnId, mode: LockMode) -> Self {
        LockRequest { txn, mode }
    }
}

/// Who currently holds a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockState {
    /// Nobody queued on the key.
    Unlocked,
    /// The head of the queue holds the key exclusively.
    Exclusive(TxnId),
    /// The maximal shared prefix of the queue holds the key together.
    Shared(Vec<TxnId>),
}

/// Per-key FIFO lock manager.
///
/// Acquisition calls return whether the lock was granted immediately; a
/// refusal increments the transaction's wait counter. [`release`] removes
/// the caller's request and returns every transaction whose wait counter
/// reached zero as a consequence, in queue order.
///
/// [`release`]: LockManager::release
pub trait LockManager: Send {
    /// Request a read lock on `key`. Returns true if granted immediately.
    fn read_lock(&mut self, txn: TxnId, key: Key) -> bool;

    /// Request a write lock on `key`. Returns true if granted immediately.
    fn write_lock(&mut self, txn: TxnId, key: Key) -> bool;

    /// Drop `txn`'s request on `key`, waking successors per the FIFO rule.
    /// Returns the transactions that became runnable.
    fn release(&mut self, txn: TxnId, key: Key) -> Vec<TxnId>;

    /// Current holder(s) of `key`.
    fn status(&self, key: Key) -> LockState;

    /// Number of keys on which `txn` is still blocked. Zero means runnable.
    fn wait_count(&self, txn: TxnId) -> usize;
}
