//! Versioned in-memory key/value storage for lockstep.
//!
//! A [`TxnStore`] is the single backing store a processor executes against.
//! Every write is stamped with the store's logical clock, and the last-write
//! timestamp of each key is what OCC validation compares against a
//! transaction's admission snapshot.

#![warn(missing_docs)]

mod store;

pub use store::{TxnStore, VersionedValue};
