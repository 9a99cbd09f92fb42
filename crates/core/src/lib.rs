//! Core vocabulary for the lockstep transaction processor.
//!
//! This crate defines the types every other layer speaks:
//! - [`types`]: keys, values, timestamps, transaction ids, CC modes
//! - [`clock`]: the shared logical clock that orders writes and OCC snapshots
//! - [`txn`]: the transaction entity and the client program contract
//! - [`error`]: the workspace error type

#![warn(missing_docs)]

pub mod clock;
pub mod error;
pub mod txn;
pub mod types;

pub use clock::LogicalClock;
pub use error::{Error, Result};
pub use txn::{OpContext, Program, Txn, TxnOutcome, TxnStatus};
pub use types::{CcMode, Key, Timestamp, TxnId, Value};
