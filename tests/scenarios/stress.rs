//! Sustained load: a window of concurrently active transactions over a
//! wide key space, in every mode. The assertion is completion without
//! stall, not throughput.

use crate::common::*;
use lockstep::prelude::*;
use lockstep::workload::{Put, ReadModifyWrite};
use std::time::Duration;

const DB_SIZE: u64 = 10_000;
const ACTIVE: usize = 100;
const TOTAL: usize = 300;

#[test]
fn sustained_load_completes_in_every_mode() {
    for mode in CcMode::ALL {
        let p = processor(mode);

        // Seed the whole key space so every read hits.
        p.submit(Put::new((0..DB_SIZE).map(|k| (k, 0)))).unwrap();
        assert_eq!(p.next_result().unwrap().status(), TxnStatus::Committed);

        let fresh = || ReadModifyWrite::random(DB_SIZE, 5, 5, Duration::ZERO);

        // Keep ACTIVE transactions in flight until TOTAL have finished.
        let mut submitted = 0;
        let mut finished = 0;
        while submitted < ACTIVE {
            p.submit(fresh()).unwrap();
            submitted += 1;
        }
        while finished < TOTAL {
            let txn = p.next_result().unwrap();
            assert!(txn.status().is_final(), "mode {mode}");
            assert_eq!(txn.status(), TxnStatus::Committed, "mode {mode}");
            finished += 1;
            if submitted < TOTAL {
                p.submit(fresh()).unwrap();
                submitted += 1;
            }
        }
    }
}

/// High contention flavor: tiny key space, writers everywhere. Exercises
/// the OCC restart path hard; the increments must still all land.
#[test]
fn contended_increments_all_land() {
    const KEYS: u64 = 8;
    const TXNS: usize = 64;

    for mode in CcMode::ALL {
        let p = processor(mode);
        seed(&p, (0..KEYS).map(|k| (k, 0)));

        for i in 0..TXNS {
            let key = (i as u64) % KEYS;
            // The written value depends on the current one, so the key is
            // declared read as well as written.
            p.submit(ReadModifyWrite::new([key], [key], Duration::ZERO))
                .unwrap();
        }
        for _ in 0..TXNS {
            let txn = p.next_result().unwrap();
            assert_eq!(txn.status(), TxnStatus::Committed, "mode {mode}");
        }

        let total: u64 = (0..KEYS).map(|k| p.storage().read(k).unwrap_or(0)).sum();
        assert_eq!(
            total,
            TXNS as u64,
            "mode {mode}: every committed increment must be visible"
        );
    }
}
