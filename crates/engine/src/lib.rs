//! Scheduler, worker pool, and processor API.
//!
//! The [`Processor`] is the public entry point: construct one in a
//! [`CcMode`], submit programs, and drain results. Internally a dedicated
//! scheduler thread runs the mode's loop for the processor's lifetime,
//! dispatching transaction bodies (and, under parallel OCC, validations)
//! onto a fixed [`WorkerPool`].
//!
//! [`CcMode`]: lockstep_core::types::CcMode

#![warn(missing_docs)]

mod pool;
mod processor;
mod scheduler;

pub use pool::WorkerPool;
pub use processor::Processor;
