//! Transaction entity and the client program contract.
//!
//! A [`Txn`] is the unit the scheduler moves through its pipeline. Clients
//! never construct one directly; they implement [`Program`] and hand it to
//! the processor, which wraps it, assigns an id, and owns the transaction
//! until its result is returned.
//!
//! # Lifecycle
//!
//! ```text
//! Incomplete ──execute──▶ CompletedCommit ──certify──▶ Committed
//!      ▲                  CompletedAbort  ──────────▶ Aborted
//!      └──── reset_for_restart (OCC validation failure)
//! ```
//!
//! A restart preserves the transaction's id and program; only the buffered
//! reads, writes, status, and OCC snapshot are cleared.

use crate::types::{Key, Timestamp, TxnId, Value};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

/// Where a transaction stands in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxnStatus {
    /// Not yet executed (or reset for a fresh optimistic attempt).
    Incomplete,
    /// The program body finished and asked to commit; not yet certified.
    CompletedCommit,
    /// The program body finished and asked to abort; not yet finalized.
    CompletedAbort,
    /// Writes are installed in storage; the result is final.
    Committed,
    /// Writes were discarded; the result is final.
    Aborted,
}

impl TxnStatus {
    /// True once the transaction's result has been decided.
    pub fn is_final(&self) -> bool {
        matches!(self, TxnStatus::Committed | TxnStatus::Aborted)
    }
}

/// How a program body ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnOutcome {
    /// Buffered writes should be installed.
    Commit,
    /// Buffered writes should be discarded.
    Abort,
}

/// The view a program body gets while it runs.
///
/// Reads come from the values the executor prefetched before the body
/// started; writes are buffered and installed only if the transaction
/// commits under its concurrency-control regime. The body never touches
/// storage directly.
pub struct OpContext<'a> {
    reads: &'a FxHashMap<Key, Value>,
    writes: &'a mut FxHashMap<Key, Value>,
    writeset: &'a FxHashSet<Key>,
}

impl OpContext<'_> {
    /// Value of `key` as of the prefetch, or `None` if the key did not
    /// exist in storage. Keys in the declared writeset are prefetched too,
    /// so read-modify-write bodies can read what they are about to write.
    pub fn read(&self, key: Key) -> Option<Value> {
        self.reads.get(&key).copied()
    }

    /// Buffer a write of `key`. The key must be in the declared writeset.
    pub fn write(&mut self, key: Key, value: Value) {
        debug_assert!(
            self.writeset.contains(&key),
            "write to key {key} outside the declared writeset"
        );
        self.writes.insert(key, value);
    }
}

/// Client-implemented transaction logic.
///
/// The read and write sets are declared once, when the transaction is
/// created, and are frozen from then on; `run` may be invoked multiple
/// times (once per optimistic attempt) and must be deterministic in the
/// keys it touches, though not in the values it writes.
pub trait Program: Send + 'static {
    /// Keys the body will read.
    fn readset(&self) -> FxHashSet<Key>;

    /// Keys the body may write.
    fn writeset(&self) -> FxHashSet<Key>;

    /// The transaction body. Reads and writes go through `ctx`; the return
    /// value is the commit or abort decision.
    fn run(&self, ctx: &mut OpContext<'_>) -> TxnOutcome;
}

/// A transaction moving through the processor.
pub struct Txn {
    id: TxnId,
    status: TxnStatus,
    readset: FxHashSet<Key>,
    writeset: FxHashSet<Key>,
    reads: FxHashMap<Key, Value>,
    writes: FxHashMap<Key, Value>,
    occ_start_time: Timestamp,
    program: Box<dyn Program>,
}

impl Txn {
    /// Wrap a program. The read and write sets are captured here and never
    /// consulted from the program again.
    pub fn new(program: impl Program) -> Self {
        let readset = program.readset();
        let writeset = program.writeset();
        Txn {
            id: TxnId::UNASSIGNED,
            status: TxnStatus::Incomplete,
            readset,
            writeset,
            reads: FxHashMap::default(),
            writes: FxHashMap::default(),
            occ_start_time: 0,
            program: Box::new(program),
        }
    }

    /// Unique id, assigned at submission.
    pub fn id(&self) -> TxnId {
        self.id
    }

    /// Assign the unique id. Called once by the processor.
    pub fn set_id(&mut self, id: TxnId) {
        self.id = id;
    }

    /// Current lifecycle status.
    pub fn status(&self) -> TxnStatus {
        self.status
    }

    /// Move to a new lifecycle status.
    pub fn set_status(&mut self, status: TxnStatus) {
        self.status = status;
    }

    /// Keys the transaction declared it will read.
    pub fn readset(&self) -> &FxHashSet<Key> {
        &self.readset
    }

    /// Keys the transaction declared it may write.
    pub fn writeset(&self) -> &FxHashSet<Key> {
        &self.writeset
    }

    /// Values observed during the prefetch of the current attempt.
    pub fn reads(&self) -> &FxHashMap<Key, Value> {
        &self.reads
    }

    /// Writes buffered by the current attempt.
    pub fn writes(&self) -> &FxHashMap<Key, Value> {
        &self.writes
    }

    /// Timestamp at which the current optimistic attempt was admitted.
    pub fn occ_start_time(&self) -> Timestamp {
        self.occ_start_time
    }

    /// Stamp the admission time for an optimistic attempt.
    pub fn set_occ_start_time(&mut self, at: Timestamp) {
        self.occ_start_time = at;
    }

    /// Drop any buffered state from a previous attempt. The executor calls
    /// this before prefetching.
    pub fn clear_buffers(&mut self) {
        self.reads.clear();
        self.writes.clear();
    }

    /// Record a prefetched value.
    pub fn stage_read(&mut self, key: Key, value: Value) {
        self.reads.insert(key, value);
    }

    /// Run the program body against the buffered reads and writes.
    pub fn execute_program(&mut self) -> TxnOutcome {
        let Txn {
            program,
            writeset,
            reads,
            writes,
            ..
        } = self;
        let mut ctx = OpContext {
            reads,
            writes,
            writeset,
        };
        program.run(&mut ctx)
    }

    /// Prepare a fresh optimistic attempt after a validation failure.
    ///
    /// Identity (id and program) is preserved; buffered reads and writes,
    /// the status, and the admission timestamp are cleared.
    pub fn reset_for_restart(&mut self) {
        self.status = TxnStatus::Incomplete;
        self.reads.clear();
        self.writes.clear();
        self.occ_start_time = 0;
    }
}

impl std::fmt::Debug for Txn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Txn")
            .field("id", &self.id)
            .field("status", &self.status)
            .field("readset", &self.readset.len())
            .field("writeset", &self.writeset.len())
            .field("occ_start_time", &self.occ_start_time)
            .finish()
    }
}
