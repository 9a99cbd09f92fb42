//! Workspace error type.
//!
//! The hot path of the processor is infallible by construction; the fallible
//! surface is the client-facing API of a processor whose scheduler has
//! stopped. Invariant violations inside the scheduler are not errors, they
//! panic with a diagnostic.

use thiserror::Error;

/// All lockstep errors.
#[derive(Debug, Error)]
pub enum Error {
    /// The processor's scheduler has stopped; no further submissions are
    /// accepted and no further results will be produced.
    #[error("processor is shut down")]
    Shutdown,
}

impl Error {
    /// True if the error means the processor is gone rather than a transient
    /// condition.
    pub fn is_shutdown(&self) -> bool {
        matches!(self, Error::Shutdown)
    }
}

/// Result type for lockstep operations.
pub type Result<T> = std::result::Result<T, Error>;
