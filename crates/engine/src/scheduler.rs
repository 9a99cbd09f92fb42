//! The scheduler loops, one per concurrency-control mode.
//!
//! A single scheduler thread owns all concurrency-control state: the lock
//! table and parked transactions under locking, the active set under
//! parallel OCC. Worker threads only ever execute transaction bodies and
//! (in parallel OCC) validations over by-value snapshots, so none of that
//! state needs interior locking.
//!
//! Transactions move by ownership: request channel, to the scheduler, to a
//! worker, back through the completion channel, out through the result
//! channel. The lock table and active set hold [`TxnId`] handles and copied
//! key sets, never the transaction itself.

use crate::pool::WorkerPool;
use crossbeam_channel::{Receiver, Sender};
use lockstep_core::txn::{Txn, TxnOutcome, TxnStatus};
use lockstep_core::types::{CcMode, Key, TxnId};
use lockstep_locks::{ExclusiveLockManager, LockManager, SharedExclusiveLockManager};
use lockstep_storage::TxnStore;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Completed transactions admitted to validation per scheduler iteration
/// under parallel OCC. Bounding the drain keeps the loop responsive to new
/// admissions under burst load, and it bounds the active-set snapshot each
/// validator copies.
const VALIDATION_BATCH: usize = 200;

/// Read/write key sets of a transaction currently in validation.
///
/// Validators receive these by value; they share nothing with the
/// transaction they describe.
#[derive(Clone)]
struct ActivePeer {
    reads: FxHashSet<Key>,
    writes: FxHashSet<Key>,
}

impl ActivePeer {
    fn of(txn: &Txn) -> Self {
        ActivePeer {
            reads: txn.readset().clone(),
            writes: txn.writeset().clone(),
        }
    }

    fn observes(&self, key: Key) -> bool {
        self.reads.contains(&key) || self.writes.contains(&key)
    }
}

pub(crate) struct Scheduler {
    mode: CcMode,
    store: Arc<TxnStore>,
    pool: WorkerPool,
    live: Arc<AtomicBool>,
    requests_tx: Sender<Txn>,
    requests_rx: Receiver<Txn>,
    completions_tx: Sender<Txn>,
    completions_rx: Receiver<Txn>,
    validated_tx: Sender<(Txn, bool)>,
    validated_rx: Receiver<(Txn, bool)>,
    results_tx: Sender<Txn>,
}

impl Scheduler {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        mode: CcMode,
        store: Arc<TxnStore>,
        pool: WorkerPool,
        live: Arc<AtomicBool>,
        requests_tx: Sender<Txn>,
        requests_rx: Receiver<Txn>,
        results_tx: Sender<Txn>,
    ) -> Self {
        let (completions_tx, completions_rx) = crossbeam_channel::unbounded();
        let (validated_tx, validated_rx) = crossbeam_channel::unbounded();
        Scheduler {
            mode,
            store,
            pool,
            live,
            requests_tx,
            requests_rx,
            completions_tx,
            completions_rx,
            validated_tx,
            validated_rx,
            results_tx,
        }
    }

    /// Run the mode's loop until the processor shuts down.
    pub(crate) fn run(self) {
        debug!(mode = %self.mode, "scheduler started");
        match self.mode {
            CcMode::Serial => self.run_serial(),
            CcMode::ExclusiveLocking => self.run_locking(ExclusiveLockManager::new()),
            CcMode::SharedLocking => self.run_locking(SharedExclusiveLockManager::new()),
            CcMode::Occ => self.run_occ(),
            CcMode::ParallelOcc => self.run_parallel_occ(),
        }
    }

    fn alive(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    // =========================================================================
    // Serial
    // =========================================================================

    fn run_serial(self) {
        while self.alive() {
            match self.requests_rx.try_recv() {
                Ok(mut txn) => {
                    execute(&mut txn, &self.store);
                    self.finalize(txn);
                }
                Err(_) => std::thread::yield_now(),
            }
        }
    }

    // =========================================================================
    // Two-phase locking (both variants)
    // =========================================================================

    fn run_locking<L: LockManager>(self, mut locks: L) {
        // Transactions holding incomplete lock sets, parked until their
        // wait counters drain.
        let mut parked: FxHashMap<TxnId, Txn> = FxHashMap::default();
        let mut runnable: VecDeque<TxnId> = VecDeque::new();

        while self.alive() {
            let mut idle = true;

            // Admit at most one new request per iteration.
            if let Ok(txn) = self.requests_rx.try_recv() {
                idle = false;
                let mut blocked = 0;
                // A key in both sets takes only the write lock; each
                // transaction appears at most once per key queue.
                for &key in txn.readset() {
                    if txn.writeset().contains(&key) {
                        continue;
                    }
                    if !locks.read_lock(txn.id(), key) {
                        blocked += 1;
                    }
                }
                for &key in txn.writeset() {
                    if !locks.write_lock(txn.id(), key) {
                        blocked += 1;
                    }
                }
                if blocked == 0 {
                    self.dispatch_execute(txn);
                } else {
                    debug!(txn = %txn.id(), blocked, "parked awaiting locks");
                    parked.insert(txn.id(), txn);
                }
            }

            // Finalize everything that finished running.
            while let Ok(txn) = self.completions_rx.try_recv() {
                idle = false;
                for &key in txn.readset() {
                    if txn.writeset().contains(&key) {
                        continue;
                    }
                    runnable.extend(locks.release(txn.id(), key));
                }
                for &key in txn.writeset() {
                    runnable.extend(locks.release(txn.id(), key));
                }
                self.finalize(txn);
            }

            // Dispatch transactions whose last lock just arrived.
            while let Some(id) = runnable.pop_front() {
                idle = false;
                let txn = parked
                    .remove(&id)
                    .expect("runnable transaction is parked");
                self.dispatch_execute(txn);
            }

            if idle {
                std::thread::yield_now();
            }
        }
    }

    // =========================================================================
    // OCC, validation on the scheduler thread
    // =========================================================================

    fn run_occ(self) {
        while self.alive() {
            let mut idle = true;

            if let Ok(mut txn) = self.requests_rx.try_recv() {
                idle = false;
                txn.set_occ_start_time(self.store.now());
                self.dispatch_execute(txn);
            }

            while let Ok(mut txn) = self.completions_rx.try_recv() {
                idle = false;
                let start = txn.occ_start_time();
                let unchanged = |key: &Key| self.store.last_modified(*key) <= start;
                let verified =
                    txn.readset().iter().all(unchanged) && txn.writeset().iter().all(unchanged);

                match txn.status() {
                    TxnStatus::CompletedCommit if verified => {
                        apply_writes(&mut txn, &self.store);
                        self.post(txn);
                    }
                    TxnStatus::CompletedCommit => {
                        debug!(txn = %txn.id(), "validation failed; restarting");
                        txn.reset_for_restart();
                        let _ = self.requests_tx.send(txn);
                    }
                    TxnStatus::CompletedAbort => {
                        txn.set_status(TxnStatus::Aborted);
                        self.post(txn);
                    }
                    status => invalid_completion(txn.id(), status),
                }
            }

            if idle {
                std::thread::yield_now();
            }
        }
    }

    // =========================================================================
    // OCC, validation on worker threads
    // =========================================================================

    fn run_parallel_occ(self) {
        // Transactions that entered validation and have not come back.
        let mut active: FxHashMap<TxnId, ActivePeer> = FxHashMap::default();

        while self.alive() {
            let mut idle = true;

            if let Ok(mut txn) = self.requests_rx.try_recv() {
                idle = false;
                txn.set_occ_start_time(self.store.now());
                self.dispatch_execute(txn);
            }

            // Hand completed transactions to validators, in bounded batches.
            for _ in 0..VALIDATION_BATCH {
                let Ok(txn) = self.completions_rx.try_recv() else {
                    break;
                };
                idle = false;
                // The snapshot excludes the transaction itself.
                let peers: Vec<ActivePeer> = active.values().cloned().collect();
                active.insert(txn.id(), ActivePeer::of(&txn));
                let store = Arc::clone(&self.store);
                let validated = self.validated_tx.clone();
                self.pool.run_task(move || {
                    validate(txn, peers, &store, &validated);
                });
            }

            // Retire validated transactions, in bounded batches.
            for _ in 0..VALIDATION_BATCH {
                let Ok((mut txn, verified)) = self.validated_rx.try_recv() else {
                    break;
                };
                idle = false;
                active.remove(&txn.id());
                if verified {
                    self.post(txn);
                } else {
                    debug!(txn = %txn.id(), "validation failed; restarting");
                    txn.reset_for_restart();
                    let _ = self.requests_tx.send(txn);
                }
            }

            if idle {
                std::thread::yield_now();
            }
        }
    }

    // =========================================================================
    // Shared plumbing
    // =========================================================================

    /// Hand a transaction body to a worker.
    fn dispatch_execute(&self, txn: Txn) {
        let store = Arc::clone(&self.store);
        let completions = self.completions_tx.clone();
        self.pool.run_task(move || {
            let mut txn = txn;
            execute(&mut txn, &store);
            let _ = completions.send(txn);
        });
    }

    /// Certify a completed transaction (serial and locking paths) and post
    /// the result.
    fn finalize(&self, mut txn: Txn) {
        match txn.status() {
            TxnStatus::CompletedCommit => {
                apply_writes(&mut txn, &self.store);
            }
            TxnStatus::CompletedAbort => {
                txn.set_status(TxnStatus::Aborted);
            }
            status => invalid_completion(txn.id(), status),
        }
        self.post(txn);
    }

    fn post(&self, txn: Txn) {
        debug!(txn = %txn.id(), status = ?txn.status(), "posting result");
        let _ = self.results_tx.send(txn);
    }
}

/// Prefetch, run the program body, and record its decision.
///
/// Keys in the writeset are prefetched along with the readset so that
/// read-modify-write bodies see current values. Storage is not written
/// here; installing writes is the certifying side's job.
fn execute(txn: &mut Txn, store: &TxnStore) {
    txn.clear_buffers();
    let keys: Vec<Key> = txn
        .readset()
        .iter()
        .chain(txn.writeset().iter())
        .copied()
        .collect();
    for key in keys {
        if let Some(value) = store.read(key) {
            txn.stage_read(key, value);
        }
    }
    let outcome = txn.execute_program();
    txn.set_status(match outcome {
        TxnOutcome::Commit => TxnStatus::CompletedCommit,
        TxnOutcome::Abort => TxnStatus::CompletedAbort,
    });
}

/// Install buffered writes and mark the transaction committed.
fn apply_writes(txn: &mut Txn, store: &TxnStore) {
    for (&key, &value) in txn.writes() {
        store.write(key, value);
    }
    txn.set_status(TxnStatus::Committed);
}

/// Backward validation for one transaction, on a worker thread.
///
/// The transaction fails if storage moved past its admission snapshot on
/// any key it read, or if its writeset touches anything a concurrently
/// validating transaction reads or writes. On success the writes are
/// installed *before* the verdict is posted: the next validator must
/// observe the bumped storage timestamps, which is exactly what makes the
/// writeset-versus-storage check unnecessary here.
fn validate(mut txn: Txn, peers: Vec<ActivePeer>, store: &TxnStore, out: &Sender<(Txn, bool)>) {
    match txn.status() {
        TxnStatus::CompletedAbort => {
            // An intentional abort is not a validation failure.
            txn.set_status(TxnStatus::Aborted);
            let _ = out.send((txn, true));
            return;
        }
        TxnStatus::CompletedCommit => {}
        status => invalid_completion(txn.id(), status),
    }

    let start = txn.occ_start_time();
    let mut verified = txn
        .readset()
        .iter()
        .all(|&key| store.last_modified(key) <= start);

    if verified {
        verified = !peers
            .iter()
            .any(|peer| txn.writeset().iter().any(|&key| peer.observes(key)));
    }

    if verified {
        apply_writes(&mut txn, store);
    }
    let _ = out.send((txn, verified));
}

fn invalid_completion(id: TxnId, status: TxnStatus) -> ! {
    panic!("transaction {id} completed with invalid status {status:?}");
}
