//! Reusable transaction programs.
//!
//! Small building blocks for seeding stores, asserting on their contents,
//! and generating contended load. The scenario tests and benches are built
//! from these; they are exported because they are just as useful for
//! client smoke tests.

use crate::{Key, OpContext, Program, TxnOutcome, Value};
use rand::Rng;
use rustc_hash::{FxHashMap, FxHashSet};
use std::time::Duration;

/// Empty transaction that immediately commits.
pub struct Noop;

impl Program for Noop {
    fn readset(&self) -> FxHashSet<Key> {
        FxHashSet::default()
    }

    fn writeset(&self) -> FxHashSet<Key> {
        FxHashSet::default()
    }

    fn run(&self, _ctx: &mut OpContext<'_>) -> TxnOutcome {
        TxnOutcome::Commit
    }
}

/// Writes a fixed set of key/value pairs and commits.
pub struct Put {
    entries: FxHashMap<Key, Value>,
}

impl Put {
    /// Put every `(key, value)` pair in `entries`.
    pub fn new(entries: impl IntoIterator<Item = (Key, Value)>) -> Self {
        Put {
            entries: entries.into_iter().collect(),
        }
    }
}

impl Program for Put {
    fn readset(&self) -> FxHashSet<Key> {
        FxHashSet::default()
    }

    fn writeset(&self) -> FxHashSet<Key> {
        self.entries.keys().copied().collect()
    }

    fn run(&self, ctx: &mut OpContext<'_>) -> TxnOutcome {
        for (&key, &value) in &self.entries {
            ctx.write(key, value);
        }
        TxnOutcome::Commit
    }
}

/// Commits iff every expected key exists with the expected value.
pub struct Expect {
    entries: FxHashMap<Key, Value>,
}

impl Expect {
    /// Expect every `(key, value)` pair in `entries` to hold.
    pub fn new(entries: impl IntoIterator<Item = (Key, Value)>) -> Self {
        Expect {
            entries: entries.into_iter().collect(),
        }
    }
}

impl Program for Expect {
    fn readset(&self) -> FxHashSet<Key> {
        self.entries.keys().copied().collect()
    }

    fn writeset(&self) -> FxHashSet<Key> {
        FxHashSet::default()
    }

    fn run(&self, ctx: &mut OpContext<'_>) -> TxnOutcome {
        for (&key, &value) in &self.entries {
            if ctx.read(key) != Some(value) {
                return TxnOutcome::Abort;
            }
        }
        TxnOutcome::Commit
    }
}

/// Reads a set of keys, increments another set, optionally lingers, then
/// commits. The workhorse of the contention benchmarks.
pub struct ReadModifyWrite {
    reads: FxHashSet<Key>,
    writes: FxHashSet<Key>,
    linger: Duration,
}

impl ReadModifyWrite {
    /// Build from explicit key sets.
    pub fn new(
        reads: impl IntoIterator<Item = Key>,
        writes: impl IntoIterator<Item = Key>,
        linger: Duration,
    ) -> Self {
        ReadModifyWrite {
            reads: reads.into_iter().collect(),
            writes: writes.into_iter().collect(),
            linger,
        }
    }

    /// Pick `read_keys` + `write_keys` distinct keys uniformly from
    /// `[0, db_size)`. Smaller key spaces mean more contention.
    pub fn random(db_size: u64, read_keys: usize, write_keys: usize, linger: Duration) -> Self {
        assert!(
            (read_keys + write_keys) as u64 <= db_size,
            "key sets larger than the key space"
        );
        let mut rng = rand::thread_rng();
        let mut taken: FxHashSet<Key> = FxHashSet::default();
        let mut draw = |taken: &mut FxHashSet<Key>| loop {
            let key = rng.gen_range(0..db_size);
            if taken.insert(key) {
                return key;
            }
        };
        let reads = (0..read_keys).map(|_| draw(&mut taken)).collect();
        let writes = (0..write_keys).map(|_| draw(&mut taken)).collect();
        ReadModifyWrite {
            reads,
            writes,
            linger,
        }
    }
}

impl Program for ReadModifyWrite {
    fn readset(&self) -> FxHashSet<Key> {
        self.reads.clone()
    }

    fn writeset(&self) -> FxHashSet<Key> {
        self.writes.clone()
    }

    fn run(&self, ctx: &mut OpContext<'_>) -> TxnOutcome {
        for &key in &self.reads {
            let _ = ctx.read(key);
        }
        for &key in &self.writes {
            let current = ctx.read(key).unwrap_or(0);
            ctx.write(key, current + 1);
        }
        if !self.linger.is_zero() {
            std::thread::sleep(self.linger);
        }
        TxnOutcome::Commit
    }
}
