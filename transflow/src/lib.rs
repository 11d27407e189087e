//! # Transflow
//!
//! Composable transducer pipelines for Rust.
//!
//! A pipeline is built from immutable stage descriptors ([`Transducer`]s) and
//! run against one input at a time. Stages pass values to their continuation
//! and react to its result, which lets a pipeline:
//!
//! - **Stop early**: `take`, `take_while` and friends complete the run without
//!   draining the source
//! - **Fail fast**: a failure short-circuits everything downstream
//! - **Branch**: `choice` falls back to an alternative, `zip` runs two stages
//!   side by side, and the [`either`] layer routes two-channel values
//! - **Own resources**: [`scope`] releases every resource acquired inside it
//!   when the scope ends, on success and failure alike
//! - **Retry**: [`schedule`] re-runs a stage on a schedule of delays
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use transflow::prelude::*;
//!
//! let pipeline = compose!(
//!     each(),
//!     filter(|x: &i32| x % 2 == 0),
//!     map(|x: i32| x * 10),
//!     take(2),
//! );
//!
//! let result = apply_many(&pipeline, vec![1, 2, 3, 4, 5, 6]).await;
//! assert_eq!(result.into_vec()?, vec![20, 40]);
//! ```
//!
//! [`Transducer`]: transducer::Transducer

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod apply;
pub mod cancellation;
pub mod context;
pub mod core;
pub mod either;
pub mod errors;
pub mod observability;
pub mod schedule;
pub mod scope;
pub mod sources;
pub mod testing;
pub mod transducer;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::apply::{apply_many, apply_many_with, apply_one, apply_one_with};
    pub use crate::cancellation::CancellationToken;
    pub use crate::compose;
    pub use crate::context::{Disposable, Resources, RunContext, RunIdentity, TState};
    pub use crate::core::{AltValue, Either, Prim, Reduced};
    pub use crate::either::{
        and_then, and_then_fn, and_then_map, bifilter, bimap, expect_right, map_left,
        map_right, match_either, match_with,
    };
    pub use crate::errors::{Result, TransflowError};
    pub use crate::schedule::{
        fold_schedule, fold_until_schedule, fold_while_schedule, retry, Schedule,
        ScheduleConfig, Sleeper,
    };
    pub use crate::scope::{acquire, acquire_disposable, release, scope, scope_many};
    pub use crate::sources::{channel, each, observe, stream};
    pub use crate::transducer::{
        bind, choice, compose, constant, filter, filter_map, flatten, fold, fold_until,
        fold_while, identity, inspect, map, map2, skip, skip_until, skip_while, take,
        take_until, take_while, zip, BoxReducer, Reducer, Transducer, TransducerExt,
    };
}
