//! Stateless stages: identity, map, filter, constant and sequential composition.

use super::{BoxReducer, Reducer, Transducer};
use crate::context::TState;
use crate::core::Reduced;
use async_trait::async_trait;
use std::marker::PhantomData;
use std::sync::Arc;

/// Passes every value through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

/// Creates the identity stage.
#[must_use]
pub fn identity() -> Identity {
    Identity
}

impl<A> Transducer<A, A> for Identity
where
    A: Send + 'static,
{
    fn transform<S: Send + 'static>(&self, reducer: BoxReducer<S, A>) -> BoxReducer<S, A> {
        reducer
    }
}

/// Applies a function to every value.
pub struct Map<F> {
    f: Arc<F>,
}

/// Creates a stage mapping every value through `f`.
pub fn map<A, B, F>(f: F) -> Map<F>
where
    F: Fn(A) -> B + Send + Sync + 'static,
{
    Map { f: Arc::new(f) }
}

impl<F> Clone for Map<F> {
    fn clone(&self) -> Self {
        Self {
            f: Arc::clone(&self.f),
        }
    }
}

pub(crate) struct MapReducer<F, S, B> {
    f: Arc<F>,
    next: BoxReducer<S, B>,
}

impl<F, S, B> MapReducer<F, S, B> {
    pub(crate) fn new(f: Arc<F>, next: BoxReducer<S, B>) -> Self {
        Self { f, next }
    }
}

#[async_trait]
impl<S, A, B, F> Reducer<S, A> for MapReducer<F, S, B>
where
    S: Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
    F: Fn(A) -> B + Send + Sync + 'static,
{
    async fn run(&mut self, state: TState<S>, value: A) -> Reduced<S> {
        let mapped = (self.f)(value);
        self.next.run(state, mapped).await
    }
}

impl<A, B, F> Transducer<A, B> for Map<F>
where
    A: Send + 'static,
    B: Send + 'static,
    F: Fn(A) -> B + Send + Sync + 'static,
{
    fn transform<S: Send + 'static>(&self, reducer: BoxReducer<S, B>) -> BoxReducer<S, A> {
        Box::new(MapReducer::new(Arc::clone(&self.f), reducer))
    }
}

/// Drops values that do not match a predicate.
pub struct Filter<P> {
    predicate: Arc<P>,
}

/// Creates a stage keeping only values for which `predicate` holds.
pub fn filter<A, P>(predicate: P) -> Filter<P>
where
    P: Fn(&A) -> bool + Send + Sync + 'static,
{
    Filter {
        predicate: Arc::new(predicate),
    }
}

struct FilterReducer<P, S, A> {
    predicate: Arc<P>,
    next: BoxReducer<S, A>,
}

#[async_trait]
impl<S, A, P> Reducer<S, A> for FilterReducer<P, S, A>
where
    S: Send + 'static,
    A: Send + 'static,
    P: Fn(&A) -> bool + Send + Sync + 'static,
{
    async fn run(&mut self, state: TState<S>, value: A) -> Reduced<S> {
        if (self.predicate)(&value) {
            self.next.run(state, value).await
        } else {
            Reduced::Continue(state.into_value())
        }
    }
}

impl<A, P> Transducer<A, A> for Filter<P>
where
    A: Send + 'static,
    P: Fn(&A) -> bool + Send + Sync + 'static,
{
    fn transform<S: Send + 'static>(&self, reducer: BoxReducer<S, A>) -> BoxReducer<S, A> {
        Box::new(FilterReducer {
            predicate: Arc::clone(&self.predicate),
            next: reducer,
        })
    }
}

/// Maps values, dropping those for which the function returns `None`.
pub struct FilterMap<F> {
    f: Arc<F>,
}

/// Creates a combined filter and map stage.
pub fn filter_map<A, B, F>(f: F) -> FilterMap<F>
where
    F: Fn(A) -> Option<B> + Send + Sync + 'static,
{
    FilterMap { f: Arc::new(f) }
}

struct FilterMapReducer<F, S, B> {
    f: Arc<F>,
    next: BoxReducer<S, B>,
}

#[async_trait]
impl<S, A, B, F> Reducer<S, A> for FilterMapReducer<F, S, B>
where
    S: Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
    F: Fn(A) -> Option<B> + Send + Sync + 'static,
{
    async fn run(&mut self, state: TState<S>, value: A) -> Reduced<S> {
        match (self.f)(value) {
            Some(mapped) => self.next.run(state, mapped).await,
            None => Reduced::Continue(state.into_value()),
        }
    }
}

impl<A, B, F> Transducer<A, B> for FilterMap<F>
where
    A: Send + 'static,
    B: Send + 'static,
    F: Fn(A) -> Option<B> + Send + Sync + 'static,
{
    fn transform<S: Send + 'static>(&self, reducer: BoxReducer<S, B>) -> BoxReducer<S, A> {
        Box::new(FilterMapReducer {
            f: Arc::clone(&self.f),
            next: reducer,
        })
    }
}

/// Observes every value without changing it.
pub struct Inspect<F> {
    f: Arc<F>,
}

/// Creates a side-effect tap.
pub fn inspect<A, F>(f: F) -> Inspect<F>
where
    F: Fn(&A) + Send + Sync + 'static,
{
    Inspect { f: Arc::new(f) }
}

struct InspectReducer<F, S, A> {
    f: Arc<F>,
    next: BoxReducer<S, A>,
}

#[async_trait]
impl<S, A, F> Reducer<S, A> for InspectReducer<F, S, A>
where
    S: Send + 'static,
    A: Send + 'static,
    F: Fn(&A) + Send + Sync + 'static,
{
    async fn run(&mut self, state: TState<S>, value: A) -> Reduced<S> {
        (self.f)(&value);
        self.next.run(state, value).await
    }
}

impl<A, F> Transducer<A, A> for Inspect<F>
where
    A: Send + 'static,
    F: Fn(&A) + Send + Sync + 'static,
{
    fn transform<S: Send + 'static>(&self, reducer: BoxReducer<S, A>) -> BoxReducer<S, A> {
        Box::new(InspectReducer {
            f: Arc::clone(&self.f),
            next: reducer,
        })
    }
}

/// Ignores the input and always produces the same value.
#[derive(Debug, Clone)]
pub struct Constant<B> {
    value: B,
}

/// Creates a stage producing `value` for every input.
pub fn constant<B>(value: B) -> Constant<B>
where
    B: Clone + Send + Sync + 'static,
{
    Constant { value }
}

struct ConstantReducer<S, B> {
    value: B,
    next: BoxReducer<S, B>,
}

#[async_trait]
impl<S, A, B> Reducer<S, A> for ConstantReducer<S, B>
where
    S: Send + 'static,
    A: Send + 'static,
    B: Clone + Send + Sync + 'static,
{
    async fn run(&mut self, state: TState<S>, _value: A) -> Reduced<S> {
        let value = self.value.clone();
        self.next.run(state, value).await
    }
}

impl<A, B> Transducer<A, B> for Constant<B>
where
    A: Send + 'static,
    B: Clone + Send + Sync + 'static,
{
    fn transform<S: Send + 'static>(&self, reducer: BoxReducer<S, B>) -> BoxReducer<S, A> {
        Box::new(ConstantReducer {
            value: self.value.clone(),
            next: reducer,
        })
    }
}

/// Sequential composition: the output of `first` feeds `second`.
///
/// `B` is the intermediate type between the two stages.
pub struct Compose<T1, T2, B> {
    first: T1,
    second: T2,
    _intermediate: PhantomData<fn() -> B>,
}

/// Composes two transducers.
pub fn compose<T1, T2, B>(first: T1, second: T2) -> Compose<T1, T2, B> {
    Compose {
        first,
        second,
        _intermediate: PhantomData,
    }
}

impl<T1: Clone, T2: Clone, B> Clone for Compose<T1, T2, B> {
    fn clone(&self) -> Self {
        compose(self.first.clone(), self.second.clone())
    }
}

impl<A, B, C, T1, T2> Transducer<A, C> for Compose<T1, T2, B>
where
    T1: Transducer<A, B>,
    T2: Transducer<B, C>,
{
    fn transform<S: Send + 'static>(&self, reducer: BoxReducer<S, C>) -> BoxReducer<S, A> {
        self.first.transform(self.second.transform(reducer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply::apply_many;
    use crate::core::Prim;
    use crate::sources::each;
    use crate::testing::assert_prim_many;

    #[tokio::test]
    async fn test_map_single_value() {
        let result = apply_many(&map(|x: i32| x * 2), 21).await;
        assert!(matches!(result, Prim::One(42)));
    }

    #[tokio::test]
    async fn test_identity_passes_through() {
        let result = apply_many(&identity(), "same").await;
        assert!(matches!(result, Prim::One("same")));
    }

    #[tokio::test]
    async fn test_filter_rejects() {
        let result = apply_many(&filter(|x: &i32| *x > 10), 5).await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_filter_map_over_sequence() {
        let pipeline = compose(each(), filter_map(|s: &str| s.parse::<i32>().ok()));
        let result = apply_many(&pipeline, vec!["1", "x", "3"]).await;
        assert_prim_many(result, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_inspect_sees_every_value() {
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = seen.clone();
        let pipeline = compose(each(), inspect(move |x: &i32| sink.lock().push(*x)));

        let result = apply_many(&pipeline, vec![1, 2, 3]).await;
        assert_prim_many(result, vec![1, 2, 3]);
        assert_eq!(*seen.lock(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_constant_ignores_input() {
        let pipeline = compose(each(), constant("k"));
        let result = apply_many(&pipeline, vec![1, 2]).await;
        assert_prim_many(result, vec!["k", "k"]);
    }

    #[tokio::test]
    async fn test_compose_chains_stages() {
        let pipeline = compose(map(|x: i32| x + 1), map(|x: i32| x.to_string()));
        let result = apply_many(&pipeline, 1).await;
        assert!(matches!(result, Prim::One(ref s) if s == "2"));
    }
}
