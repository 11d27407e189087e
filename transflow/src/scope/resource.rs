//! Stages that register and release resources in the current scope's registry.

use crate::context::{Disposable, TState};
use crate::core::Reduced;
use crate::errors::TransflowError;
use crate::transducer::{BoxReducer, Reducer, Transducer};
use async_trait::async_trait;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::trace;

/// Opens a resource per value and registers it for release when the
/// enclosing scope ends.
pub struct Acquire<F, D> {
    open: Arc<F>,
    release: Arc<D>,
}

impl<F, D> Clone for Acquire<F, D> {
    fn clone(&self) -> Self {
        Self {
            open: Arc::clone(&self.open),
            release: Arc::clone(&self.release),
        }
    }
}

/// Creates a stage that opens a resource with `open` and registers `release`
/// for it. The shared handle is delegated downstream.
pub fn acquire<A, R, F, D>(open: F, release: D) -> Acquire<F, D>
where
    F: Fn(A) -> Result<R, TransflowError> + Send + Sync + 'static,
    D: Fn(&R) + Send + Sync + 'static,
{
    Acquire {
        open: Arc::new(open),
        release: Arc::new(release),
    }
}

/// Like [`acquire`], releasing through [`Disposable::dispose`].
pub fn acquire_disposable<A, R, F>(open: F) -> Acquire<F, fn(&R)>
where
    F: Fn(A) -> Result<R, TransflowError> + Send + Sync + 'static,
    R: Disposable + 'static,
{
    acquire(open, <R as Disposable>::dispose as fn(&R))
}

struct AcquireReducer<F, D, S, R> {
    open: Arc<F>,
    release: Arc<D>,
    next: BoxReducer<S, Arc<R>>,
}

#[async_trait]
impl<S, A, R, F, D> Reducer<S, A> for AcquireReducer<F, D, S, R>
where
    S: Send + 'static,
    A: Send + 'static,
    R: Send + Sync + 'static,
    F: Fn(A) -> Result<R, TransflowError> + Send + Sync + 'static,
    D: Fn(&R) + Send + Sync + 'static,
{
    async fn run(&mut self, state: TState<S>, value: A) -> Reduced<S> {
        let resource = match (self.open)(value) {
            Ok(resource) => Arc::new(resource),
            Err(err) => return Reduced::Fail(err),
        };
        let release = Arc::clone(&self.release);
        state
            .resources()
            .acquire(&resource, move |r: &R| release(r));
        self.next.run(state, resource).await
    }
}

impl<A, R, F, D> Transducer<A, Arc<R>> for Acquire<F, D>
where
    A: Send + 'static,
    R: Send + Sync + 'static,
    F: Fn(A) -> Result<R, TransflowError> + Send + Sync + 'static,
    D: Fn(&R) + Send + Sync + 'static,
{
    fn transform<S: Send + 'static>(&self, reducer: BoxReducer<S, Arc<R>>) -> BoxReducer<S, A> {
        Box::new(AcquireReducer {
            open: Arc::clone(&self.open),
            release: Arc::clone(&self.release),
            next: reducer,
        })
    }
}

/// Disposes a registered resource early and passes its handle on.
pub struct Release<R: ?Sized> {
    _resource: PhantomData<fn(Arc<R>)>,
}

impl<R: ?Sized> Clone for Release<R> {
    fn clone(&self) -> Self {
        release()
    }
}

/// Creates a stage releasing the resource it receives from the current registry.
///
/// A handle that is not registered in the current scope passes through untouched.
#[must_use]
pub fn release<R: ?Sized>() -> Release<R> {
    Release {
        _resource: PhantomData,
    }
}

struct ReleaseReducer<S, R: ?Sized> {
    next: BoxReducer<S, Arc<R>>,
}

#[async_trait]
impl<S, R> Reducer<S, Arc<R>> for ReleaseReducer<S, R>
where
    S: Send + 'static,
    R: ?Sized + Send + Sync + 'static,
{
    async fn run(&mut self, state: TState<S>, resource: Arc<R>) -> Reduced<S> {
        if !state.resources().release(&resource) {
            trace!(
                resource = std::any::type_name::<R>(),
                "Release requested for an unregistered resource"
            );
        }
        self.next.run(state, resource).await
    }
}

impl<R> Transducer<Arc<R>, Arc<R>> for Release<R>
where
    R: ?Sized + Send + Sync + 'static,
{
    fn transform<S: Send + 'static>(&self, reducer: BoxReducer<S, Arc<R>>) -> BoxReducer<S, Arc<R>> {
        Box::new(ReleaseReducer { next: reducer })
    }
}
