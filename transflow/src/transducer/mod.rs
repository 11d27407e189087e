//! The transducer protocol and the base combinator library.
//!
//! A [`Transducer`] is an immutable stage descriptor. Given the continuation
//! for its outputs (a [`Reducer`] over `B`) it builds a step function over its
//! inputs (a [`Reducer`] over `A`). The built reducer is the per-run stage
//! instance and owns any mutable counters the stage needs, so one transducer
//! value can drive any number of concurrent runs.
//!
//! ```rust,ignore
//! use transflow::prelude::*;
//!
//! let pipeline = compose!(each(), filter(|x: &i32| x % 2 == 0), map(|x: i32| x * 10), take(2));
//! let result = apply_many(&pipeline, vec![1, 2, 3, 4, 5, 6]).await;
//! ```

mod basic;
mod choice;
mod flatten;
mod fold;
#[cfg(test)]
mod integration_tests;
mod skip;
mod take;
mod zip;

pub use basic::{
    compose, constant, filter, filter_map, identity, inspect, map, Compose, Constant, Filter,
    FilterMap, Identity, Inspect, Map,
};
pub(crate) use basic::MapReducer;
pub use choice::{choice, Choice};
pub use flatten::{bind, flatten, Flatten};
pub use fold::{fold, fold_until, fold_while, Fold, FoldUntil, FoldWhile};
pub use skip::{skip, skip_until, skip_while, Skip, SkipUntil, SkipWhile};
pub use take::{take, take_until, take_while, Take, TakeUntil, TakeWhile};
pub use zip::{map2, zip, Zip};

use crate::context::TState;
use crate::core::Reduced;
use async_trait::async_trait;
use std::sync::Arc;

/// A continuation: what to do with one value and the current state.
#[async_trait]
pub trait Reducer<S, A>: Send {
    /// Processes one value.
    async fn run(&mut self, state: TState<S>, value: A) -> Reduced<S>;
}

/// A boxed, type-erased reducer.
pub type BoxReducer<S, A> = Box<dyn Reducer<S, A>>;

/// A stage turning a continuation over `B` into a step function over `A`.
pub trait Transducer<A, B>: Send + Sync {
    /// Builds a fresh stage instance feeding `reducer`.
    fn transform<S: Send + 'static>(&self, reducer: BoxReducer<S, B>) -> BoxReducer<S, A>;
}

impl<A, B, T> Transducer<A, B> for Arc<T>
where
    T: Transducer<A, B>,
{
    fn transform<S: Send + 'static>(&self, reducer: BoxReducer<S, B>) -> BoxReducer<S, A> {
        (**self).transform(reducer)
    }
}

impl<A, B, T> Transducer<A, B> for &T
where
    T: Transducer<A, B>,
{
    fn transform<S: Send + 'static>(&self, reducer: BoxReducer<S, B>) -> BoxReducer<S, A> {
        (**self).transform(reducer)
    }
}

/// A reducer backed by a synchronous closure.
pub struct FnReducer<F>(F);

#[async_trait]
impl<S, A, F> Reducer<S, A> for FnReducer<F>
where
    S: Send + 'static,
    A: Send + 'static,
    F: FnMut(TState<S>, A) -> Reduced<S> + Send,
{
    async fn run(&mut self, state: TState<S>, value: A) -> Reduced<S> {
        (self.0)(state, value)
    }
}

/// Boxes a closure as a reducer.
pub fn reducer_fn<S, A, F>(f: F) -> BoxReducer<S, A>
where
    S: Send + 'static,
    A: Send + 'static,
    F: FnMut(TState<S>, A) -> Reduced<S> + Send + 'static,
{
    Box::new(FnReducer(f))
}

/// A continuation shared by several upstream stage instances.
///
/// Used where one stage fans its input out to alternative inner pipelines
/// that all end in the same continuation. Calls are serialised; the
/// continuation must not call back into itself.
pub struct SharedReducer<S, A> {
    inner: Arc<futures::lock::Mutex<BoxReducer<S, A>>>,
}

impl<S, A> SharedReducer<S, A> {
    /// Wraps a reducer for sharing.
    #[must_use]
    pub fn new(reducer: BoxReducer<S, A>) -> Self {
        Self {
            inner: Arc::new(futures::lock::Mutex::new(reducer)),
        }
    }
}

impl<S, A> Clone for SharedReducer<S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl<S, A> Reducer<S, A> for SharedReducer<S, A>
where
    S: Send + 'static,
    A: Send + 'static,
{
    async fn run(&mut self, state: TState<S>, value: A) -> Reduced<S> {
        let mut reducer = self.inner.lock().await;
        reducer.run(state, value).await
    }
}

/// Feeds values one by one into a reducer, stopping at the first terminal outcome.
pub(crate) async fn feed<S, A, I>(
    reducer: &mut BoxReducer<S, A>,
    state: TState<S>,
    values: I,
) -> Reduced<S>
where
    S: Send + 'static,
    A: Send + 'static,
    I: IntoIterator<Item = A> + Send,
    I::IntoIter: Send,
{
    let (mut acc, context) = state.into_parts();
    for value in values {
        if let Some(err) = context.interruption() {
            return Reduced::Fail(err);
        }
        match reducer.run(TState::with_context(context.clone(), acc), value).await {
            Reduced::Continue(next) => acc = next,
            other => return other,
        }
    }
    Reduced::Continue(acc)
}

/// Terminal reducer keeping only the first produced value and stopping.
pub(crate) fn capture_first<B: Send + 'static>() -> BoxReducer<Option<B>, B> {
    reducer_fn(|_state: TState<Option<B>>, value: B| Reduced::Complete(Some(value)))
}

/// Terminal reducer keeping only the latest produced value.
pub(crate) fn capture_last<B: Send + 'static>() -> BoxReducer<Option<B>, B> {
    reducer_fn(|_state: TState<Option<B>>, value: B| Reduced::Continue(Some(value)))
}

/// Terminal reducer collecting every produced value in order.
pub(crate) fn capture_all<B: Send + 'static>() -> BoxReducer<Vec<B>, B> {
    reducer_fn(|state: TState<Vec<B>>, value: B| {
        let mut values = state.into_value();
        values.push(value);
        Reduced::Continue(values)
    })
}

/// Fluent chaining for transducers.
pub trait TransducerExt<A, B>: Transducer<A, B> + Sized {
    /// Feeds this stage's output into `next`.
    fn then<T>(self, next: T) -> Compose<Self, T, B> {
        compose(self, next)
    }

    /// Maps every output.
    fn map<C, F>(self, f: F) -> Compose<Self, Map<F>, B>
    where
        F: Fn(B) -> C + Send + Sync + 'static,
    {
        compose(self, map(f))
    }

    /// Keeps only outputs matching the predicate.
    fn filter<P>(self, predicate: P) -> Compose<Self, Filter<P>, B>
    where
        P: Fn(&B) -> bool + Send + Sync + 'static,
    {
        compose(self, filter(predicate))
    }

    /// Stops after `count` outputs.
    fn take(self, count: usize) -> Compose<Self, Take, B> {
        compose(self, take(count))
    }

    /// Drops the first `count` outputs.
    fn skip(self, count: usize) -> Compose<Self, Skip, B> {
        compose(self, skip(count))
    }
}

impl<A, B, T> TransducerExt<A, B> for T where T: Transducer<A, B> {}

/// Composes any number of transducers left to right.
///
/// `compose!(a, b, c)` is `compose(a, compose(b, c))`.
#[macro_export]
macro_rules! compose {
    ($t:expr $(,)?) => {
        $t
    };
    ($t:expr, $($rest:expr),+ $(,)?) => {
        $crate::transducer::compose($t, $crate::compose!($($rest),+))
    };
}
