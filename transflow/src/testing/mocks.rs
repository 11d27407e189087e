//! Mock stages and resources for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::context::{Disposable, TState};
use crate::core::Reduced;
use crate::errors::TransflowError;
use crate::transducer::{BoxReducer, Reducer, Transducer};

/// A pass-through stage that counts the values it sees.
///
/// Clones share the same counter.
#[derive(Debug, Clone, Default)]
pub struct CountingTransducer {
    calls: Arc<Mutex<usize>>,
}

impl CountingTransducer {
    /// Creates a new counting stage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of values seen across all runs.
    #[must_use]
    pub fn call_count(&self) -> usize {
        *self.calls.lock()
    }
}

struct CountingReducer<S, A> {
    calls: Arc<Mutex<usize>>,
    next: BoxReducer<S, A>,
}

#[async_trait]
impl<S, A> Reducer<S, A> for CountingReducer<S, A>
where
    S: Send + 'static,
    A: Send + 'static,
{
    async fn run(&mut self, state: TState<S>, value: A) -> Reduced<S> {
        *self.calls.lock() += 1;
        self.next.run(state, value).await
    }
}

impl<A> Transducer<A, A> for CountingTransducer
where
    A: Send + 'static,
{
    fn transform<S: Send + 'static>(&self, reducer: BoxReducer<S, A>) -> BoxReducer<S, A> {
        Box::new(CountingReducer {
            calls: Arc::clone(&self.calls),
            next: reducer,
        })
    }
}

/// A stage that fails every value without calling its continuation.
#[derive(Debug, Clone)]
pub struct FailingTransducer {
    error: String,
    calls: Arc<Mutex<usize>>,
}

impl FailingTransducer {
    /// Creates a stage failing with `error`.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Returns the number of values this stage has rejected.
    #[must_use]
    pub fn call_count(&self) -> usize {
        *self.calls.lock()
    }
}

struct FailingReducer {
    error: String,
    calls: Arc<Mutex<usize>>,
}

#[async_trait]
impl<S, A> Reducer<S, A> for FailingReducer
where
    S: Send + 'static,
    A: Send + 'static,
{
    async fn run(&mut self, _state: TState<S>, _value: A) -> Reduced<S> {
        *self.calls.lock() += 1;
        Reduced::Fail(TransflowError::message(self.error.clone()))
    }
}

impl<A, B> Transducer<A, B> for FailingTransducer
where
    A: Send + 'static,
    B: Send + 'static,
{
    fn transform<S: Send + 'static>(&self, _reducer: BoxReducer<S, B>) -> BoxReducer<S, A> {
        Box::new(FailingReducer {
            error: self.error.clone(),
            calls: Arc::clone(&self.calls),
        })
    }
}

/// A disposable resource recording how often it was released.
#[derive(Debug, Clone)]
pub struct TrackedResource {
    name: String,
    releases: Arc<Mutex<usize>>,
}

impl TrackedResource {
    /// Creates a new tracked resource.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            releases: Arc::new(Mutex::new(0)),
        }
    }

    /// Returns the resource name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns how many times the resource was released.
    #[must_use]
    pub fn release_count(&self) -> usize {
        *self.releases.lock()
    }
}

impl Disposable for TrackedResource {
    fn dispose(&self) {
        *self.releases.lock() += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply::apply_many;
    use crate::context::Resources;
    use crate::core::Prim;
    use crate::sources::each;
    use crate::testing::{assert_prim_failed, assert_prim_many};
    use crate::transducer::compose;

    #[tokio::test]
    async fn test_counting_transducer_counts_values() {
        let counter = CountingTransducer::new();
        let pipeline = compose(each(), counter.clone());
        assert_prim_many(apply_many(&pipeline, vec![1, 2, 3]).await, vec![1, 2, 3]);
        assert_eq!(counter.call_count(), 3);
    }

    #[tokio::test]
    async fn test_failing_transducer_fails() {
        let failing = FailingTransducer::new("boom");
        let pipeline = compose::<_, _, i32>(each(), failing.clone());
        let result: Prim<i32> = apply_many(&pipeline, vec![1, 2]).await;
        let err = assert_prim_failed(result);
        assert_eq!(err.to_string(), "boom");
        assert_eq!(failing.call_count(), 1);
    }

    #[test]
    fn test_tracked_resource_counts_releases() {
        let tracked = Arc::new(TrackedResource::new("db"));
        let resources = Resources::new();
        resources.acquire_disposable(&tracked);
        resources.clean();
        assert_eq!(tracked.release_count(), 1);
        assert_eq!(tracked.name(), "db");
    }
}
