//! Shared/exclusive lock manager.
//!
//! Writes queue as exclusive requests and are granted only at the head.
//! Reads queue as shared requests and are granted as long as no exclusive
//! request is ahead of them, so a run of readers at the head of a queue
//! holds the key together.
//!
//! # Wakeup rule
//!
//! Release removes the caller's request and then examines the head:
//!
//! - a removal below the head grants nobody;
//! - if the new head is exclusive, it was blocked until now: decrement it;
//! - if an exclusive head departed and a shared run now leads the queue,
//!   every request in that run gets a decrement.
//!
//! A transaction whose wait counter reaches zero is reported runnable, in
//! queue order.

use crate::table::{LockManager, LockMode, LockRequest, LockState};
use lockstep_core::types::{Key, TxnId};
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use tracing::trace;

/// Lock manager with shared read locks and exclusive write locks.
#[derive(Debug, Default)]
pub struct SharedExclusiveLockManager {
    lock_table: FxHashMap<Key, VecDeque<LockRequest>>,
    txn_waits: FxHashMap<TxnId, usize>,
}

impl SharedExclusiveLockManager {
    /// Create an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    fn block(&mut self, txn: TxnId) {
        *self.txn_waits.entry(txn).or_insert(0) += 1;
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

impl LockManager for SharedExclusiveLockManager {
    fn read_lock(&mut self, txn: TxnId, key: Key) -> bool {
        let queue = self.lock_table.entry(key).or_default();
        let writer_ahead = queue.iter().any(|req| req.mode == LockMode::Exclusive);
        queue.push_back(LockRequest::new(txn, LockMode::Shared));
        if writer_ahead {
            self.block(txn);
            trace!(%txn, key, "shared lock blocked");
            false
        } else {
            trace!(%txn, key, "shared lock granted");
            true
        }
    }

    fn write_lock(&mut self, txn: TxnId, key: Key) -> bool {
        let queue = self.lock_table.entry(key).or_default();
        let head = queue.is_empty();
        queue.push_back(LockRequest::new(txn, LockMode::Exclusive));
        if head {
            trace!(%txn, key, "exclusive lock granted");
            true
        } else {
            self.block(txn);
            trace!(%txn, key, "exclusive lock blocked");
            false
        }
    }

    fn release(&mut self, txn: TxnId, key: Key) -> Vec<TxnId> {
        let mut woken = Vec::new();
        let Some(queue) = self.lock_table.get_mut(&key) else {
            return woken;
        };
        let Some(pos) = queue.iter().position(|req| req.txn == txn) else {
            return woken;
        };
        let removed = queue.remove(pos).expect("position found above");

        if queue.is_empty() {
            self.lock_table.remove(&key);
            return woken;
        }

        if pos != 0 {
            // Removing a waiter (or a non-head shared holder) cannot grant
            // anyone: the head of the queue is unchanged.
            return woken;
        }

        let new_head_mode = queue.front().expect("queue checked non-empty").mode;
        match new_head_mode {
            LockMode::Exclusive => {
                // The writer reached the head; it was blocked until now.
                let next = queue.front().expect("queue checked non-empty").txn;
                self.wake(next, &mut woken);
            }
            LockMode::Shared if removed.mode == LockMode::Exclusive => {
                // A departing writer exposes a run of readers; grant the
                // whole shared prefix.
                let run: Vec<TxnId> = queue
                    .iter()
                    .take_while(|req| req.mode == LockMode::Shared)
                    .map(|req| req.txn)
                    .collect();
                for reader in run {
                    self.wake(reader, &mut woken);
                }
            }
            LockMode::Shared => {
                // A departing reader leaves the rest of the shared run
                // granted as before.
            }
        }
        woken
    }

    fn status(&self, key: Key) -> LockState {
        let Some(queue) = self.lock_table.get(&key) else {
            return LockState::Unlocked;
        };
        match queue.front() {
            None => LockState::Unlocked,
            Some(head) if head.mode == LockMode::Exclusive => LockState::Exclusive(head.txn),
            Some(_) => LockState::Shared(
                queue
                    .iter()
                    .take_while(|req| req.mode == LockMode::Shared)
                    .map(|req| req.txn)
                    .collect(),
            ),
        }
    }

    fn wait_count(&self, txn: TxnId) -> usize {
        self.txn_waits.get(&txn).copied().unwrap_or(0)
    }
}
