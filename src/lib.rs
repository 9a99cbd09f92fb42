//! # lockstep
//!
//! In-memory transaction processor with selectable concurrency control.
//!
//! lockstep executes client-defined transactions against a single-node
//! key/value store under one of five regimes, so the same workload can be
//! compared across serial execution, two-phase locking (exclusive-only and
//! shared/exclusive), optimistic concurrency control, and parallel OCC
//! with validation offloaded to worker threads.
//!
//! ## Quick Start
//!
//! ```ignore
//! use lockstep::prelude::*;
//! use lockstep::workload::{Expect, Put};
//!
//! let processor = Processor::new(CcMode::SharedLocking);
//!
//! processor.submit(Put::new([(1, 2), (3, 4)]))?;
//! processor.next_result()?;
//!
//! processor.submit(Expect::new([(1, 2)]))?;
//! let txn = processor.next_result()?;
//! assert_eq!(txn.status(), TxnStatus::Committed);
//! ```
//!
//! ## Writing transactions
//!
//! Implement [`Program`]: declare the keys you will read and write, then
//! express the body against an [`OpContext`]. Reads see a prefetched
//! snapshot; writes are buffered and installed only if the transaction
//! commits under the processor's regime. Under the OCC modes a body may run
//! several times; the transaction keeps its identity across restarts.

#![warn(missing_docs)]

pub mod workload;

pub mod prelude;

pub use lockstep_core::error::{Error, Result};
pub use lockstep_core::txn::{OpContext, Program, Txn, TxnOutcome, TxnStatus};
pub use lockstep_core::types::{CcMode, Key, Timestamp, TxnId, Value};
pub use lockstep_engine::Processor;
pub use lockstep_storage::TxnStore;
