//! Shared fixtures for the scenario tests.

use lockstep::prelude::*;
use lockstep::workload::Put;
use lockstep::{Key, Value};
use rand::Rng;
use rustc_hash::FxHashSet;
use std::time::Duration;

/// Worker count for the scenario processors. Small enough to stress queue
/// handoff, large enough that five sleeping transactions overlap.
pub const WORKERS: usize = 8;

pub fn processor(mode: CcMode) -> Processor {
    Processor::with_workers(mode, WORKERS)
}

/// Seed the store through the front door and wait for the write to land.
pub fn seed(p: &Processor, entries: impl IntoIterator<Item = (Key, Value)>) {
    p.submit(Put::new(entries)).unwrap();
    let txn = p.next_result().unwrap();
    assert_eq!(txn.status(), TxnStatus::Committed, "seeding must commit");
}

/// Sleep for roughly `linger`, with a little jitter so concurrent
/// transactions interleave differently run to run.
pub fn linger_with_jitter(linger: Duration) {
    if linger.is_zero() {
        return;
    }
    let base = linger.as_micros() as u64;
    let jitter = rand::thread_rng().gen_range(0..=base / 5);
    std::thread::sleep(Duration::from_micros(base * 9 / 10 + jitter));
}

/// Reads an account, writes back balance + 1, lingers, commits.
///
/// Five of these against one account are the classic lost-update probe:
/// the final balance equals the number of committed transfers only if the
/// regime actually serializes them.
pub struct BankTxn {
    account: Key,
    linger: Duration,
}

impl BankTxn {
    pub fn new(account: Key, linger: Duration) -> Self {
        BankTxn { account, linger }
    }
}

impl Program for BankTxn {
    fn readset(&self) -> FxHashSet<Key> {
        [self.account].into_iter().collect()
    }

    fn writeset(&self) -> FxHashSet<Key> {
        [self.account].into_iter().collect()
    }

    fn run(&self, ctx: &mut OpContext<'_>) -> TxnOutcome {
        let Some(balance) = ctx.read(self.account) else {
            return TxnOutcome::Abort;
        };
        ctx.write(self.account, balance + 1);
        linger_with_jitter(self.linger);
        TxnOutcome::Commit
    }
}

/// Key holding the shared stock count in the shopping scenario.
pub const STOCK: Key = 1;

/// Conditionally takes one unit of stock and credits its own account.
///
/// With stock seeded at 3 and five shoppers, exactly three may take the
/// decrement branch; a regime that lets two shoppers both observe the same
/// stock value produces four or five credits instead.
pub struct Shopping {
    account: Key,
    linger: Duration,
}

impl Shopping {
    pub fn new(account: Key, linger: Duration) -> Self {
        Shopping { account, linger }
    }
}

impl Program for Shopping {
    fn readset(&self) -> FxHashSet<Key> {
        [STOCK].into_iter().collect()
    }

    fn writeset(&self) -> FxHashSet<Key> {
        [STOCK, self.account].into_iter().collect()
    }

    fn run(&self, ctx: &mut OpContext<'_>) -> TxnOutcome {
        let Some(stock) = ctx.read(STOCK) else {
            return TxnOutcome::Abort;
        };
        if stock > 0 {
            ctx.write(STOCK, stock - 1);
            let balance = ctx.read(self.account).unwrap_or(0);
            ctx.write(self.account, balance + 1);
        }
        linger_with_jitter(self.linger);
        TxnOutcome::Commit
    }
}
