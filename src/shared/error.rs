//! Shared Error Types
//!
//! This module defines the errors raised by the pure editing layer: the
//! transaction model, the change algebra and the rebase function. None of
//! them describe a data condition to recover from; they signal a bookkeeping
//! bug in whoever built the change.
//!
//! # Error Categories
//!
//! - `MisalignedChange` - `concat` or rebase preconditions violated
//! - `OutOfRange` - `truncate` / `most_recent` asked for positions a change does not hold
//! - `InvalidTransaction` - a transaction that cannot be applied or shifted
//! - `SerializationError` - JSON serialization/deserialization failures
//!
//! # Usage
//!
//! ```rust
//! use xfcollab::shared::error::SharedError;
//!
//! let error = SharedError::misaligned(3, 5);
//! assert!(error.is_misalignment());
//! ```
use thiserror::Error;

/// Errors raised by the change algebra and rebase function
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    /// A change did not start where the preceding change ends
    #[error("Misaligned change: expected start {expected}, found {found}")]
    MisalignedChange {
        /// Position the change was required to start at
        expected: usize,
        /// Position the change actually starts at
        found: usize,
    },

    /// A slice of a change was requested outside the range it covers
    #[error("Change range error: {message}")]
    OutOfRange {
        /// Human-readable error message
        message: String,
    },

    /// A transaction could not be applied, shifted or decoded
    #[error("Invalid transaction: {message}")]
    InvalidTransaction {
        /// Human-readable error message
        message: String,
    },

    /// JSON serialization or deserialization error
    #[error("Serialization error: {message}")]
    SerializationError {
        /// Human-readable error message
        message: String,
    },
}

impl SharedError {
    /// Create a new misalignment error
    pub fn misaligned(expected: usize, found: usize) -> Self {
        Self::MisalignedChange { expected, found }
    }

    /// Create a new out-of-range error
    pub fn out_of_range(message: impl Into<String>) -> Self {
        Self::OutOfRange {
            message: message.into(),
        }
    }

    /// Create a new invalid transaction error
    pub fn invalid_transaction(message: impl Into<String>) -> Self {
        Self::InvalidTransaction {
            message: message.into(),
        }
    }

    /// Create a new serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }

    /// Whether this error comes from misusing `concat`, `truncate` or `most_recent`
    pub fn is_misalignment(&self) -> bool {
        matches!(self, Self::MisalignedChange { .. } | Self::OutOfRange { .. })
    }
}

impl From<serde_json::Error> for SharedError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}
