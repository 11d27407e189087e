//! Retrying stages on a schedule of delays.
//!
//! A [`Schedule`] is a restartable, lazy sequence of delays. [`retry`] re-runs
//! a stage on the same input once per delay until its output satisfies a
//! predicate, and the `fold_*_schedule` family accumulates the output of every
//! attempt instead. Waits go through a [`Sleeper`] and race the run's
//! cancellation token; a wait that would overrun the run's deadline fails with
//! [`TransflowError::DeadlineExceeded`](crate::errors::TransflowError::DeadlineExceeded).

mod config;
mod fold;
mod policy;
mod retry;
mod sleeper;

pub use config::{BackoffStrategy, JitterStrategy, ScheduleConfig};
pub use fold::{fold_schedule, fold_until_schedule, fold_while_schedule, ScheduledFold};
pub use policy::{Delays, Schedule};
pub use retry::{retry, Retry};
pub use sleeper::{InstantSleeper, Sleeper, TokioSleeper, TrackingSleeper};

#[cfg(test)]
pub use sleeper::MockSleeper;
