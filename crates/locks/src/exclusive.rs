//! Exclusive-only lock manager.
//!
//! Every request, read or write, enters the key's queue as exclusive and is
//! granted only at the head. This is the simplest correct rendering of
//! FIFO two-phase locking; it over-serializes readers but needs no mode
//! bookkeeping at release time.

use crate::table::{LockManager, LockMode, LockRequest, LockState};
use lockstep_core::types::{Key, TxnId};
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use tracing::trace;

/// Lock manager where every lock is exclusive.
#[derive(Debug, Default)]
pub struct ExclusiveLockManager {
    lock_table: FxHashMap<Key, VecDeque<LockRequest>>,
    txn_waits: FxHashMap<TxnId, usize>,
}

impl ExclusiveLockManager {
    /// Create an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&mut self, txn: TxnId, key: Key) -> bool {
        let queue = self.lock_table.entry(key).or_default();
        queue.push_back(LockRequest::new(txn, LockMode::Exclusive));
        if queue.len() == 1 {
            trace!(%txn, key, "exclusive lock granted");
            true
        } else {
            *self.txn_waits.entry(txn).or_insert(0) += 1;
            trace!(%txn, key, "exclusive lock blocked");
            false
        }
    }

    /// Decrement `txn`'s wait counter; report it runnable at zero.
    fn wake(&mut self, txn: TxnId, woken: &mut Vec<TxnId>) {
        let count = self
            .txn_waits
            .get_mut(&txn)
            .expect("waiting transaction has a wait counter");
        *count -= 1;
        if *count == 0 {
            self.txn_waits.remove(&txn);
            woken.push(txn);
        }
    }
}

impl LockManager for ExclusiveLockManager {
    fn read_lock(&mut self, txn: TxnId, key: Key) -> bool {
        // Reads take exclusive locks too; same policy as writes.
        self.lock(txn, key)
    }

    fn write_lock(&mut self, txn: TxnId, key: Key) -> bool {
        self.lock(txn, key)
    }

    fn release(&mut self, txn: TxnId, key: Key) -> Vec<TxnId> {
        let mut woken = Vec::new();
        let Some(queue) = self.lock_table.get_mut(&key) else {
            return woken;
        };
        let Some(pos) = queue.iter().position(|req| req.txn == txn) else {
            return woken;
        };
        queue.remove(pos);

        if queue.is_empty() {
            self.lock_table.remove(&key);
            return woken;
        }

        // Removing a waiter cannot grant anyone; only vacating the head
        // promotes the next request.
        if pos == 0 {
            let next = queue.front().expect("queue checked non-empty").txn;
            self.wake(next, &mut woken);
        }
        woken
    }

    fn status(&self, key: Key) -> LockState {
        match self.lock_table.get(&key).and_then(|queue| queue.front()) {
            Some(head) => LockState::Exclusive(head.txn),
            None => LockState::Unlocked,
        }
    }

    fn wait_count(&self, txn: TxnId) -> usize {
        self.txn_waits.get(&txn).copied().unwrap_or(0)
    }
}
