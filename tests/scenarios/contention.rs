//! Contended workloads: lost updates and conditional branches.

use crate::common::*;
use lockstep::prelude::*;
use lockstep::workload::Expect;
use std::time::Duration;

/// Five transfers against one account; the final balance must equal five
/// in every mode. The OCC modes may restart some attempts along the way,
/// which must not change the answer.
#[test]
fn bank_balance_survives_concurrency() {
    let delays = [0, 1, 3, 6, 10].map(Duration::from_millis);

    for mode in CcMode::ALL {
        let p = processor(mode);
        seed(&p, [(1, 0)]);

        let submitted: Vec<TxnId> = delays
            .iter()
            .map(|&d| p.submit(BankTxn::new(1, d)).unwrap())
            .collect();

        let mut committed = Vec::new();
        for _ in 0..delays.len() {
            let txn = p.next_result().unwrap();
            assert_eq!(txn.status(), TxnStatus::Committed, "mode {mode}");
            committed.push(txn.id());
        }

        // Restarts preserve identity: the results are exactly the
        // submitted transactions, however many attempts each took.
        committed.sort();
        let mut expected = submitted.clone();
        expected.sort();
        assert_eq!(committed, expected, "mode {mode}");

        assert_eq!(
            p.storage().read(1),
            Some(5),
            "mode {mode}: lost update detected"
        );

        // And the store agrees through the front door too.
        p.submit(Expect::new([(1, 5)])).unwrap();
        assert_eq!(p.next_result().unwrap().status(), TxnStatus::Committed);
    }
}

/// Five shoppers against a stock of three. Exactly three may take a unit,
/// no matter how the attempts interleave or restart.
#[test]
fn shopping_never_oversells() {
    let delays = [0, 1, 2, 5, 8].map(Duration::from_millis);
    let accounts: [lockstep::Key; 5] = [2, 3, 4, 5, 6];

    for mode in CcMode::ALL {
        let p = processor(mode);
        seed(
            &p,
            [(STOCK, 3), (2, 0), (3, 0), (4, 0), (5, 0), (6, 0), (7, 0), (8, 0)],
        );

        for (&account, &delay) in accounts.iter().zip(delays.iter()) {
            p.submit(Shopping::new(account, delay)).unwrap();
        }
        for _ in 0..accounts.len() {
            let txn = p.next_result().unwrap();
            assert_eq!(txn.status(), TxnStatus::Committed, "mode {mode}");
        }

        let store = p.storage();
        assert_eq!(store.read(STOCK), Some(0), "mode {mode}: stock must drain");

        let credits: Vec<u64> = accounts
            .iter()
            .map(|&account| store.read(account).unwrap_or(0))
            .collect();
        for &credit in &credits {
            assert!(credit <= 1, "mode {mode}: account credited twice");
        }
        assert_eq!(
            credits.iter().sum::<u64>(),
            3,
            "mode {mode}: exactly three shoppers may succeed (credits {credits:?})"
        );
    }
}
