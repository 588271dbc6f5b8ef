//! Error taxonomy for the query execution layer.
//!
//! One variant per kind named in the error-handling design: syntax errors
//! are surfaced here only so callers have a single error type to match on,
//! though this crate never produces one itself (the parser is external).

use thiserror::Error;

/// Errors produced while validating, planning, optimizing, or executing a
/// query plan.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Parser-level error. Never constructed by this crate; reserved so
    /// callers can fold the external parser's errors into the same type.
    #[error("syntax error: {message}")]
    Syntax { message: String },

    /// Validator rejection: unknown column/tag/edge/property, type
    /// mismatch, forbidden expression nesting, mismatched set shapes,
    /// duplicate/missing variable.
    #[error("semantic error: {message}")]
    Semantic { message: String },

    /// Session-level ACL rejection.
    #[error("permission denied: {message}")]
    Permission { message: String },

    /// Remote storage RPC failed outright (completeness == 0, or transport
    /// failure below the completeness layer).
    #[error("storage error: {message}")]
    Storage { message: String },

    /// Remote storage RPC returned a non-zero, non-100 completeness.
    /// Distinct from `Storage` because it does not, by itself, fail the
    /// statement (see `Status::PartialSuccess`).
    #[error("partial storage failure: {message}")]
    PartialStorage { message: String },

    /// Metadata client returned a non-ok response (unknown schema, stale
    /// cache that a retry didn't resolve, etc).
    #[error("metadata error: {message}")]
    Meta { message: String },

    /// Unrecoverable internal condition during execution: null iterator,
    /// a value of unexpected type reaching a strict operator, a plan
    /// invariant violated at runtime.
    #[error("execution error: {message}")]
    Execution { message: String },

    /// The driver cancelled the in-flight query (session close, deadline).
    #[error("query canceled")]
    Canceled,
}

impl Error {
    pub fn semantic(message: impl Into<String>) -> Self {
        Error::Semantic { message: message.into() }
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Error::Execution { message: message.into() }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Error::Storage { message: message.into() }
    }

    pub fn meta(message: impl Into<String>) -> Self {
        Error::Meta { message: message.into() }
    }

    /// A stable, machine-readable code for `ExecutionResponse::error_code`.
    pub fn code(&self) -> i32 {
        match self {
            Error::Syntax { .. } => -1,
            Error::Semantic { .. } => -2,
            Error::Permission { .. } => -3,
            Error::Storage { .. } => -4,
            Error::PartialStorage { .. } => -5,
            Error::Meta { .. } => -6,
            Error::Execution { .. } => -7,
            Error::Canceled => -8,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Per-executor completion signal. Kept distinct from `Error` so that
/// `PartialSuccess` can be threaded through `Result::finish()` without
/// forcing every caller down the `Err` path (see §7: "PartialSuccess never
/// short-circuits").
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Success,
    PartialSuccess,
    Error(Error),
}

impl Status {
    pub fn is_ok(&self) -> bool {
        !matches!(self, Status::Error(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Status::Error(_))
    }
}

impl From<Error> for Status {
    fn from(e: Error) -> Self {
        Status::Error(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_ok_for_success_and_partial() {
        assert!(Status::Success.is_ok());
        assert!(Status::PartialSuccess.is_ok());
        assert!(!Status::Error(Error::Canceled).is_ok());
    }

    #[test]
    fn error_codes_are_distinct() {
        let errs = vec![
            Error::Syntax { message: "x".into() },
            Error::Semantic { message: "x".into() },
            Error::Permission { message: "x".into() },
            Error::Storage { message: "x".into() },
            Error::PartialStorage { message: "x".into() },
            Error::Meta { message: "x".into() },
            Error::Execution { message: "x".into() },
            Error::Canceled,
        ];
        let codes: std::collections::HashSet<i32> = errs.iter().map(Error::code).collect();
        assert_eq!(codes.len(), errs.len());
    }
}
