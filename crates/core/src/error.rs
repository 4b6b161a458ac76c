//! Error types for the vellum engine
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! ## Error Categories
//!
//! - **Unsupported operation**: a reflective operation the facade layer
//!   refuses (kind mismatches, length manipulation on records, ...)
//! - **Revoked**: access through a facade whose bookkeeping was discarded
//! - **Not recognized**: an attempt to wrap a value that is not a container
//! - **Invariant violation**: incoherent facade bookkeeping (programmer error)
//!
//! Errors raised by user-supplied closures (mutators, subscribers) are never
//! caught by the engine; they propagate to the caller unchanged.

use thiserror::Error;

/// Result type alias for vellum operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the vellum engine
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A reflective operation the facade layer does not support
    #[error("unsupported operation: {op}")]
    UnsupportedOperation {
        /// Short description of the rejected operation
        op: &'static str,
    },

    /// Access through a revoked facade
    #[error("facade has been revoked")]
    Revoked,

    /// The value cannot be wrapped in a facade
    #[error("value of kind `{kind}` is not a recognized container")]
    NotRecognized {
        /// Kind name of the offending value
        kind: &'static str,
    },

    /// Facade bookkeeping observed in an incoherent state
    ///
    /// This indicates a bug in the engine itself, not a user error.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

impl Error {
    /// Shorthand constructor for [`Error::UnsupportedOperation`]
    pub fn unsupported(op: &'static str) -> Self {
        Error::UnsupportedOperation { op }
    }

    /// Check if this error is an unsupported-operation error
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Error::UnsupportedOperation { .. })
    }

    /// Check if this error is a revoked-facade error
    pub fn is_revoked(&self) -> bool {
        matches!(self, Error::Revoked)
    }
}
