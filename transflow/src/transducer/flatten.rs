//! Monadic chaining: stages that produce further stages.

use super::{compose, map, BoxReducer, Compose, Map, Reducer, SharedReducer, Transducer};
use crate::context::TState;
use crate::core::Reduced;
use async_trait::async_trait;
use std::marker::PhantomData;

/// Runs every inner transducer produced by an outer stage.
///
/// Each produced inner transducer is built against the original continuation
/// and immediately driven with the unit input. `I` is the inner transducer type.
pub struct Flatten<T, I> {
    outer: T,
    _inner: PhantomData<fn() -> I>,
}

/// Creates a flattening stage over `outer`.
pub fn flatten<T, I>(outer: T) -> Flatten<T, I> {
    Flatten {
        outer,
        _inner: PhantomData,
    }
}

impl<T: Clone, I> Clone for Flatten<T, I> {
    fn clone(&self) -> Self {
        flatten(self.outer.clone())
    }
}

/// Monadic bind: maps every output of `stage` to a transducer and runs it.
pub fn bind<A, B, C, T, I, F>(stage: T, f: F) -> Flatten<Compose<T, Map<F>, B>, I>
where
    T: Transducer<A, B>,
    F: Fn(B) -> I + Send + Sync + 'static,
    I: Transducer<(), C> + 'static,
{
    flatten(compose(stage, map(f)))
}

struct InnerRunner<S, B> {
    next: SharedReducer<S, B>,
}

#[async_trait]
impl<S, B, I> Reducer<S, I> for InnerRunner<S, B>
where
    S: Send + 'static,
    B: Send + 'static,
    I: Transducer<(), B> + 'static,
{
    async fn run(&mut self, state: TState<S>, inner: I) -> Reduced<S> {
        let mut chain = inner.transform(Box::new(self.next.clone()));
        chain.run(state, ()).await
    }
}

impl<A, B, T, I> Transducer<A, B> for Flatten<T, I>
where
    A: Send + 'static,
    B: Send + 'static,
    T: Transducer<A, I>,
    I: Transducer<(), B> + 'static,
{
    fn transform<S: Send + 'static>(&self, reducer: BoxReducer<S, B>) -> BoxReducer<S, A> {
        self.outer.transform(Box::new(InnerRunner {
            next: SharedReducer::new(reducer),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply::apply_many;
    use crate::core::Prim;
    use crate::sources::each;
    use crate::testing::{assert_prim_failed, assert_prim_many, FailingTransducer};
    use crate::transducer::{constant, take};

    #[tokio::test]
    async fn test_bind_runs_each_produced_stage() {
        let pipeline = compose(
            each(),
            bind(map(|x: i32| x), |x: i32| compose(constant(vec![x; x as usize]), each())),
        );
        assert_prim_many(apply_many(&pipeline, vec![1, 2]).await, vec![1, 2, 2]);
    }

    #[tokio::test]
    async fn test_flatten_stops_on_downstream_completion() {
        let pipeline = compose(
            compose(each(), flatten(map(|x: i32| constant(x)))),
            take(2),
        );
        assert_prim_many(apply_many(&pipeline, vec![4, 5, 6]).await, vec![4, 5]);
    }

    #[tokio::test]
    async fn test_flatten_propagates_inner_failure() {
        let pipeline = compose(each(), flatten(map(|_: i32| FailingTransducer::new("inner"))));
        let result: Prim<i32> = apply_many(&pipeline, vec![1, 2]).await;
        assert_eq!(assert_prim_failed(result).to_string(), "inner");
    }
}
