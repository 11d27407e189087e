//! The outcome of feeding one value through one stage.

use crate::errors::TransflowError;
use std::any::Any;
use std::fmt;

/// Tagged outcome of processing one value, parameterised by the accumulator type.
///
/// Every stage reports back to its caller with one of these. `Continue` asks for
/// the next input item, `Complete` stops the whole run successfully, `Fail`
/// aborts it and `Alt` carries the other branch of a two-channel stage out to a
/// consumer that only understands one channel.
#[derive(Debug)]
pub enum Reduced<S> {
    /// Keep going with the updated accumulator.
    Continue(S),
    /// Stop now; the accumulator is final.
    Complete(S),
    /// Abort with an error.
    Fail(TransflowError),
    /// An alternate value produced instead of one destined for the accumulator.
    Alt(AltValue),
}

impl<S> Reduced<S> {
    /// Returns true for `Continue`.
    #[must_use]
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue(_))
    }

    /// Returns true for `Complete`.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete(_))
    }

    /// Returns true for `Fail`.
    #[must_use]
    pub fn is_fail(&self) -> bool {
        matches!(self, Self::Fail(_))
    }

    /// Returns true for `Alt`.
    #[must_use]
    pub fn is_alt(&self) -> bool {
        matches!(self, Self::Alt(_))
    }

    /// Returns true if the run must not process further input.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !self.is_continue()
    }

    /// Returns the accumulator for `Continue` and `Complete`.
    #[must_use]
    pub fn value(&self) -> Option<&S> {
        match self {
            Self::Continue(s) | Self::Complete(s) => Some(s),
            Self::Fail(_) | Self::Alt(_) => None,
        }
    }

    /// Maps the accumulator, keeping the tag.
    pub fn map<T, F>(self, f: F) -> Reduced<T>
    where
        F: FnOnce(S) -> T,
    {
        match self {
            Self::Continue(s) => Reduced::Continue(f(s)),
            Self::Complete(s) => Reduced::Complete(f(s)),
            Self::Fail(e) => Reduced::Fail(e),
            Self::Alt(x) => Reduced::Alt(x),
        }
    }

    /// Turns a `Continue` into a `Complete`, leaving other outcomes untouched.
    #[must_use]
    pub fn into_complete(self) -> Self {
        match self {
            Self::Continue(s) => Self::Complete(s),
            other => other,
        }
    }

    /// Collapses the outcome into a `Result`.
    ///
    /// `Alt` is treated as faulted, as generic code has no use for the other branch.
    pub fn into_result(self) -> Result<S, TransflowError> {
        match self {
            Self::Continue(s) | Self::Complete(s) => Ok(s),
            Self::Fail(e) => Err(e),
            Self::Alt(x) => Err(x.into_error()),
        }
    }
}

/// A type-erased alternate value carried by [`Reduced::Alt`].
pub struct AltValue {
    value: Box<dyn Any + Send>,
    type_name: &'static str,
}

impl AltValue {
    /// Wraps an alternate value.
    pub fn new<X: Send + 'static>(value: X) -> Self {
        Self {
            value: Box::new(value),
            type_name: std::any::type_name::<X>(),
        }
    }

    /// Returns the type name of the wrapped value.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Recovers the value if it has type `X`, otherwise hands the wrapper back.
    pub fn downcast<X: 'static>(self) -> Result<X, Self> {
        let type_name = self.type_name;
        self.value
            .downcast::<X>()
            .map(|boxed| *boxed)
            .map_err(|value| Self { value, type_name })
    }

    /// Converts the alternate into the error generic code reports for it.
    #[must_use]
    pub fn into_error(self) -> TransflowError {
        TransflowError::UnexpectedAlternate {
            type_name: self.type_name,
        }
    }
}

impl fmt::Debug for AltValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AltValue")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}
