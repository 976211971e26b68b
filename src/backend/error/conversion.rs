/**
 * Error Conversion
 *
 * This module provides conversion implementations for backend errors:
 * poisoned std locks become `StateError`, and errors render as a JSON report
 * for tooling and logs.
 *
 * # Report Format
 *
 * ```json
 * {
 *   "error": "Unmatched starts on notes: expected 4, found 3",
 *   "kind": "conflict",
 *   "resync": true
 * }
 * ```
 */

use std::sync::PoisonError;

use crate::backend::error::types::{BackendError, ErrorKind};

impl<T> From<PoisonError<T>> for BackendError {
    fn from(err: PoisonError<T>) -> Self {
        BackendError::state(format!("lock poisoned: {}", err))
    }
}

impl ErrorKind {
    /// Lower-case name used in reports
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Protocol => "protocol",
            Self::Conflict => "conflict",
            Self::Storage => "storage",
            Self::Invariant => "invariant",
        }
    }
}

impl From<&BackendError> for serde_json::Value {
    fn from(err: &BackendError) -> Self {
        serde_json::json!({
            "error": err.message(),
            "kind": err.kind().as_str(),
            "resync": err.requires_resync(),
        })
    }
}
