//! Error types for the transflow engine.
//!
//! `TransflowError` is the opaque error value carried by [`Reduced::Fail`],
//! [`Prim::Fail`] and [`Either::Fail`]. It can wrap a native fault, can be
//! combined with another error, and has a `Bottom` sentinel for computations
//! that were expected to produce a value but produced none.
//!
//! [`Reduced::Fail`]: crate::core::Reduced::Fail
//! [`Prim::Fail`]: crate::core::Prim::Fail
//! [`Either::Fail`]: crate::core::Either::Fail

use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// The main error type for transflow operations.
#[derive(Debug, Clone, Error)]
pub enum TransflowError {
    /// A plain error message.
    #[error("{0}")]
    Message(String),

    /// A native fault raised by user code.
    #[error("{0}")]
    Fault(Fault),

    /// A computation that must produce a value produced none.
    #[error("Bottom: computation produced no value")]
    Bottom,

    /// A single-channel consumer received the alternate (left) branch.
    #[error("Unexpected alternate value of type {type_name}")]
    UnexpectedAlternate {
        /// Type name of the alternate value.
        type_name: &'static str,
    },

    /// The run was cancelled through its cancellation token.
    #[error("Pipeline cancelled: {0}")]
    Cancelled(String),

    /// The run's deadline passed before it could finish.
    #[error("Deadline exceeded")]
    DeadlineExceeded,

    /// Several independent failures combined into one.
    #[error("{}", join_errors(.0))]
    Many(Vec<TransflowError>),
}

/// A shareable wrapper around a native fault.
#[derive(Clone)]
pub struct Fault(Arc<anyhow::Error>);

impl Fault {
    /// Returns the wrapped error.
    #[must_use]
    pub fn inner(&self) -> &anyhow::Error {
        &self.0
    }
}

impl fmt::Debug for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

fn join_errors(errors: &[TransflowError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl TransflowError {
    /// Creates an error from a message.
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    /// Creates an error from a native fault.
    #[must_use]
    pub fn from_fault<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Fault(Fault(Arc::new(anyhow::Error::new(error))))
    }

    /// Returns the `Bottom` sentinel.
    #[must_use]
    pub fn bottom() -> Self {
        Self::Bottom
    }

    /// Creates an unexpected-alternate error for a value of type `X`.
    #[must_use]
    pub fn unexpected_alternate<X>() -> Self {
        Self::UnexpectedAlternate {
            type_name: std::any::type_name::<X>(),
        }
    }

    /// Creates a cancellation error.
    #[must_use]
    pub fn cancelled(reason: impl Into<String>) -> Self {
        Self::Cancelled(reason.into())
    }

    /// Combines two errors, keeping both.
    ///
    /// Nested `Many` values are flattened so the result is always one level deep.
    #[must_use]
    pub fn combine(self, other: Self) -> Self {
        let mut errors = match self {
            Self::Many(errors) => errors,
            single => vec![single],
        };
        match other {
            Self::Many(more) => errors.extend(more),
            single => errors.push(single),
        }
        Self::Many(errors)
    }

    /// Returns true for the `Bottom` sentinel.
    #[must_use]
    pub fn is_bottom(&self) -> bool {
        matches!(self, Self::Bottom)
    }

    /// Returns true if this error was produced by cancellation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    /// Returns the individual errors; a single error yields a one-element slice.
    #[must_use]
    pub fn errors(&self) -> &[Self] {
        match self {
            Self::Many(errors) => errors,
            single => std::slice::from_ref(single),
        }
    }
}

impl From<anyhow::Error> for TransflowError {
    fn from(error: anyhow::Error) -> Self {
        Self::Fault(Fault(Arc::new(error)))
    }
}

impl From<String> for TransflowError {
    fn from(message: String) -> Self {
        Self::Message(message)
    }
}

impl From<&str> for TransflowError {
    fn from(message: &str) -> Self {
        Self::Message(message.to_string())
    }
}

/// Result alias used by fallible user callbacks.
pub type Result<T, E = TransflowError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_display() {
        let err = TransflowError::message("boom");
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_fault_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let err = TransflowError::from_fault(io);
        assert!(matches!(err, TransflowError::Fault(_)));
        assert_eq!(err.to_string(), "disk gone");
    }

    #[test]
    fn test_fault_from_anyhow() {
        let err: TransflowError = anyhow::anyhow!("wrapped").into();
        assert_eq!(err.to_string(), "wrapped");
    }

    #[test]
    fn test_combine_flattens() {
        let a = TransflowError::message("a");
        let b = TransflowError::message("b");
        let c = TransflowError::message("c");

        let combined = a.combine(b).combine(c);
        assert_eq!(combined.errors().len(), 3);
        assert_eq!(combined.to_string(), "a; b; c");
    }

    #[test]
    fn test_combine_many_with_many() {
        let left = TransflowError::message("a").combine(TransflowError::message("b"));
        let right = TransflowError::message("c").combine(TransflowError::Bottom);

        let combined = left.combine(right);
        assert_eq!(combined.errors().len(), 4);
        assert!(combined.errors()[3].is_bottom());
    }

    #[test]
    fn test_single_error_slice() {
        let err = TransflowError::bottom();
        assert_eq!(err.errors().len(), 1);
        assert!(err.is_bottom());
    }

    #[test]
    fn test_unexpected_alternate_names_type() {
        let err = TransflowError::unexpected_alternate::<String>();
        assert!(err.to_string().contains("String"));
    }
}
