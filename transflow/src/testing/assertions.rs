//! Test assertions for pipeline results.

use crate::core::{Prim, Reduced};
use crate::errors::TransflowError;
use std::fmt::Debug;

/// Asserts that exactly one value was produced and that it equals `expected`.
pub fn assert_prim_one<A: Debug + PartialEq>(prim: Prim<A>, expected: A) {
    match prim {
        Prim::One(actual) => assert_eq!(actual, expected),
        other => panic!("Expected one value {:?}, got {:?}", expected, other),
    }
}

/// Asserts that the produced values equal `expected`, in order.
///
/// An empty `expected` matches `Prim::None`, a single value matches `Prim::One`.
pub fn assert_prim_many<A: Debug + PartialEq>(prim: Prim<A>, expected: Vec<A>) {
    match prim.into_vec() {
        Ok(actual) => assert_eq!(actual, expected),
        Err(err) => panic!("Expected values {:?}, got failure: {}", expected, err),
    }
}

/// Asserts that no value was produced.
pub fn assert_prim_none<A: Debug>(prim: Prim<A>) {
    assert!(prim.is_none(), "Expected no value, got {:?}", prim);
}

/// Asserts that the run faulted and returns the error.
pub fn assert_prim_failed<A: Debug>(prim: Prim<A>) -> TransflowError {
    match prim {
        Prim::Fail(err) => err,
        other => panic!("Expected failure, got {:?}", other),
    }
}

/// Asserts a `Complete` outcome and returns its accumulator.
pub fn assert_complete<S: Debug>(reduced: Reduced<S>) -> S {
    match reduced {
        Reduced::Complete(value) => value,
        other => panic!("Expected Complete, got {:?}", other),
    }
}

/// Asserts a `Continue` outcome and returns its accumulator.
pub fn assert_continue<S: Debug>(reduced: Reduced<S>) -> S {
    match reduced {
        Reduced::Continue(value) => value,
        other => panic!("Expected Continue, got {:?}", other),
    }
}
