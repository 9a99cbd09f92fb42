//! Single-transaction behavior and the put/expect round-trip laws.

use crate::common::*;
use lockstep::prelude::*;
use lockstep::workload::{Expect, Noop, Put};

#[test]
fn noop_commits_in_every_mode() {
    for mode in CcMode::ALL {
        let p = processor(mode);
        p.submit(Noop).unwrap();
        let txn = p.next_result().unwrap();
        assert_eq!(txn.status(), TxnStatus::Committed, "mode {mode}");
    }
}

#[test]
fn put_then_expect_in_every_mode() {
    for mode in CcMode::ALL {
        let p = processor(mode);

        seed(&p, [(1, 2), (3, 4), (5, 6), (7, 8)]);

        // Missing key.
        p.submit(Expect::new([(2, 2)])).unwrap();
        assert_eq!(
            p.next_result().unwrap().status(),
            TxnStatus::Aborted,
            "mode {mode}: absent key must abort"
        );

        // Wrong value.
        p.submit(Expect::new([(1, 1)])).unwrap();
        assert_eq!(
            p.next_result().unwrap().status(),
            TxnStatus::Aborted,
            "mode {mode}: wrong value must abort"
        );

        // Exact match.
        p.submit(Expect::new([(1, 2)])).unwrap();
        assert_eq!(
            p.next_result().unwrap().status(),
            TxnStatus::Committed,
            "mode {mode}: matching value must commit"
        );
    }
}

#[test]
fn intentional_abort_discards_writes() {
    struct WriteThenAbort;
    impl Program for WriteThenAbort {
        fn readset(&self) -> rustc_hash::FxHashSet<lockstep::Key> {
            Default::default()
        }
        fn writeset(&self) -> rustc_hash::FxHashSet<lockstep::Key> {
            [42].into_iter().collect()
        }
        fn run(&self, ctx: &mut OpContext<'_>) -> TxnOutcome {
            ctx.write(42, 1);
            TxnOutcome::Abort
        }
    }

    for mode in CcMode::ALL {
        let p = processor(mode);
        p.submit(WriteThenAbort).unwrap();
        let txn = p.next_result().unwrap();
        assert_eq!(txn.status(), TxnStatus::Aborted, "mode {mode}");
        assert_eq!(
            p.storage().read(42),
            None,
            "mode {mode}: aborted write must not land"
        );
    }
}

#[test]
fn ids_are_strictly_increasing() {
    let p = processor(CcMode::Occ);
    let ids: Vec<TxnId> = (0..20).map(|_| p.submit(Noop).unwrap()).collect();
    for pair in ids.windows(2) {
        assert!(pair[0] < pair[1]);
    }
    for _ in 0..20 {
        p.next_result().unwrap();
    }
}

#[test]
fn each_result_is_posted_exactly_once() {
    for mode in CcMode::ALL {
        let p = processor(mode);
        let submitted: Vec<TxnId> = (0..10)
            .map(|i| p.submit(Put::new([(i, i)])).unwrap())
            .collect();

        let mut seen = Vec::new();
        for _ in 0..10 {
            let txn = p.next_result().unwrap();
            assert!(txn.status().is_final(), "mode {mode}");
            seen.push(txn.id());
        }
        seen.sort();
        let mut expected = submitted.clone();
        expected.sort();
        assert_eq!(seen, expected, "mode {mode}: one result per transaction");
    }
}
