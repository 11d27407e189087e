//! Cooperative cancellation for pipeline runs.
//!
//! A run carries one token in its execution state. Cancellation is expressed
//! to stages as a `Fail` with [`TransflowError::Cancelled`].
//!
//! [`TransflowError::Cancelled`]: crate::errors::TransflowError::Cancelled

mod token;

pub use token::CancellationToken;
