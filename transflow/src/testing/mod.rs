//! Testing utilities for transflow pipelines.
//!
//! This module provides:
//! - Assertions over `Prim` and `Reduced` results
//! - Mock stages that count, fail or track their resources

mod assertions;
mod mocks;

pub use assertions::{
    assert_complete, assert_continue, assert_prim_failed, assert_prim_many, assert_prim_none,
    assert_prim_one,
};
pub use mocks::{CountingTransducer, FailingTransducer, TrackedResource};
