//! Convenience re-exports for the common path.
//!
//! ```ignore
//! use lockstep::prelude::*;
//! ```

pub use crate::{
    CcMode, Error, OpContext, Processor, Program, Result, Txn, TxnId, TxnOutcome, TxnStatus,
};
