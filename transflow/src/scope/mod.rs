//! Resource scopes: regions whose acquired resources are released when one
//! input item has been processed.
//!
//! This module provides:
//! - `scope` / `scope_many`, which run an inner pipeline per item inside a fresh registry
//! - `acquire` / `acquire_disposable`, which register a produced resource in the current registry
//! - `release`, which disposes one registered resource before its scope ends

mod resource;

pub use resource::{acquire, acquire_disposable, release, Acquire, Release};

use crate::context::{CleanupGuard, RunContext, TState};
use crate::core::Reduced;
use crate::errors::TransflowError;
use crate::transducer::{capture_all, capture_first, BoxReducer, Reducer, Transducer};
use async_trait::async_trait;
use tracing::trace;

/// Runs an inner pipeline per item in its own registry and delegates its
/// single output.
///
/// An item for which the inner pipeline produces nothing fails with
/// [`TransflowError::Bottom`].
#[derive(Debug, Clone)]
pub struct Scope<T> {
    inner: T,
}

/// Wraps `inner` in a per-item resource scope expecting exactly one output.
pub fn scope<T>(inner: T) -> Scope<T> {
    Scope { inner }
}

/// Runs an inner pipeline per item in its own registry and delegates every
/// output it produced, collected in order.
#[derive(Debug, Clone)]
pub struct ScopeMany<T> {
    inner: T,
}

/// Wraps `inner` in a per-item resource scope collecting all outputs.
pub fn scope_many<T>(inner: T) -> ScopeMany<T> {
    ScopeMany { inner }
}

/// Runs `inner` on one item inside a nested registry, cleaning the registry
/// before returning whatever way the inner run ended.
async fn run_scoped<A, V>(
    inner: &mut BoxReducer<V, A>,
    outer: &RunContext,
    seed: V,
    value: A,
) -> Reduced<V>
where
    A: Send + 'static,
    V: Send + 'static,
{
    let nested = outer.nested_scope();
    let _guard = CleanupGuard::new(nested.resources());
    trace!(scope_id = %nested.identity().scope_id, "Scope opened");
    let outcome = inner.run(TState::with_context(nested, seed), value).await;
    trace!("Scope closing");
    outcome
}

struct ScopeReducer<S, A, B> {
    inner: BoxReducer<Option<B>, A>,
    next: BoxReducer<S, B>,
}

#[async_trait]
impl<S, A, B> Reducer<S, A> for ScopeReducer<S, A, B>
where
    S: Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
{
    async fn run(&mut self, state: TState<S>, value: A) -> Reduced<S> {
        let outcome = run_scoped(&mut self.inner, state.context(), None, value).await;
        match outcome {
            Reduced::Continue(Some(b)) | Reduced::Complete(Some(b)) => self.next.run(state, b).await,
            Reduced::Continue(None) | Reduced::Complete(None) => {
                Reduced::Fail(TransflowError::bottom())
            }
            Reduced::Fail(err) => Reduced::Fail(err),
            Reduced::Alt(alt) => Reduced::Alt(alt),
        }
    }
}

impl<A, B, T> Transducer<A, B> for Scope<T>
where
    A: Send + 'static,
    B: Send + 'static,
    T: Transducer<A, B>,
{
    fn transform<S: Send + 'static>(&self, reducer: BoxReducer<S, B>) -> BoxReducer<S, A> {
        Box::new(ScopeReducer {
            inner: self.inner.transform(capture_first()),
            next: reducer,
        })
    }
}

struct ScopeManyReducer<S, A, B> {
    inner: BoxReducer<Vec<B>, A>,
    next: BoxReducer<S, Vec<B>>,
}

#[async_trait]
impl<S, A, B> Reducer<S, A> for ScopeManyReducer<S, A, B>
where
    S: Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
{
    async fn run(&mut self, state: TState<S>, value: A) -> Reduced<S> {
        let outcome = run_scoped(&mut self.inner, state.context(), Vec::new(), value).await;
        match outcome {
            Reduced::Continue(values) | Reduced::Complete(values) => {
                self.next.run(state, values).await
            }
            Reduced::Fail(err) => Reduced::Fail(err),
            Reduced::Alt(alt) => Reduced::Alt(alt),
        }
    }
}

impl<A, B, T> Transducer<A, Vec<B>> for ScopeMany<T>
where
    A: Send + 'static,
    B: Send + 'static,
    T: Transducer<A, B>,
{
    fn transform<S: Send + 'static>(&self, reducer: BoxReducer<S, Vec<B>>) -> BoxReducer<S, A> {
        Box::new(ScopeManyReducer {
            inner: self.inner.transform(capture_all()),
            next: reducer,
        })
    }
}
