//! Two-channel pipelines over [`Either`] values.
//!
//! This module provides:
//! - `BiTransducer`, lifting a pair of ordinary stages onto the two channels
//! - Channel-wise filtering and take/skip combinators
//! - Kleisli chaining (`and_then`) across stages that produce `Either`
//! - `expect_right` and `match_either`, which collapse back to a single channel
//!
//! [`Either`]: crate::core::Either

mod bimap;
mod kleisli;
mod matching;

pub use bimap::{
    bifilter, bimap, biskip, biskip_until, biskip_while, bitake, bitake_until, bitake_while,
    filter_left, filter_right, map_left, map_right, BiTransducer,
};
pub use kleisli::{and_then, and_then_fn, and_then_map, expect_right, BindRight, ExpectRight};
pub use matching::{match_either, match_with, MatchEither};
