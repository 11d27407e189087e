//! Stages that stop the run once a boundary is reached.

use super::{BoxReducer, Reducer, Transducer};
use crate::context::TState;
use crate::core::Reduced;
use async_trait::async_trait;
use std::sync::Arc;

/// Delegates the first `count` values, then completes the run.
#[derive(Debug, Clone, Copy)]
pub struct Take {
    count: usize,
}

/// Creates a stage taking at most `count` values.
#[must_use]
pub fn take(count: usize) -> Take {
    Take { count }
}

struct TakeReducer<S, A> {
    remaining: usize,
    next: BoxReducer<S, A>,
}

#[async_trait]
impl<S, A> Reducer<S, A> for TakeReducer<S, A>
where
    S: Send + 'static,
    A: Send + 'static,
{
    async fn run(&mut self, state: TState<S>, value: A) -> Reduced<S> {
        if self.remaining == 0 {
            return Reduced::Complete(state.into_value());
        }
        self.remaining -= 1;
        self.next.run(state, value).await
    }
}

impl<A> Transducer<A, A> for Take
where
    A: Send + 'static,
{
    fn transform<S: Send + 'static>(&self, reducer: BoxReducer<S, A>) -> BoxReducer<S, A> {
        Box::new(TakeReducer {
            remaining: self.count,
            next: reducer,
        })
    }
}

/// Delegates while a predicate holds, then completes the run.
pub struct TakeWhile<P> {
    predicate: Arc<P>,
}

/// Creates a stage taking values while `predicate` holds.
pub fn take_while<A, P>(predicate: P) -> TakeWhile<P>
where
    P: Fn(&A) -> bool + Send + Sync + 'static,
{
    TakeWhile {
        predicate: Arc::new(predicate),
    }
}

/// Delegates until a predicate holds, then completes the run.
pub struct TakeUntil<P> {
    predicate: Arc<P>,
}

/// Creates a stage taking values until `predicate` holds.
pub fn take_until<A, P>(predicate: P) -> TakeUntil<P>
where
    P: Fn(&A) -> bool + Send + Sync + 'static,
{
    TakeUntil {
        predicate: Arc::new(predicate),
    }
}

/// Shared instance for the predicate-bounded variants; `take_when` is the
/// predicate outcome that keeps the stage delegating.
struct TakePredicateReducer<P, S, A> {
    predicate: Arc<P>,
    take_when: bool,
    next: BoxReducer<S, A>,
}

#[async_trait]
impl<S, A, P> Reducer<S, A> for TakePredicateReducer<P, S, A>
where
    S: Send + 'static,
    A: Send + 'static,
    P: Fn(&A) -> bool + Send + Sync + 'static,
{
    async fn run(&mut self, state: TState<S>, value: A) -> Reduced<S> {
        if (self.predicate)(&value) == self.take_when {
            self.next.run(state, value).await
        } else {
            Reduced::Complete(state.into_value())
        }
    }
}

impl<A, P> Transducer<A, A> for TakeWhile<P>
where
    A: Send + 'static,
    P: Fn(&A) -> bool + Send + Sync + 'static,
{
    fn transform<S: Send + 'static>(&self, reducer: BoxReducer<S, A>) -> BoxReducer<S, A> {
        Box::new(TakePredicateReducer {
            predicate: Arc::clone(&self.predicate),
            take_when: true,
            next: reducer,
        })
    }
}

impl<A, P> Transducer<A, A> for TakeUntil<P>
where
    A: Send + 'static,
    P: Fn(&A) -> bool + Send + Sync + 'static,
{
    fn transform<S: Send + 'static>(&self, reducer: BoxReducer<S, A>) -> BoxReducer<S, A> {
        Box::new(TakePredicateReducer {
            predicate: Arc::clone(&self.predicate),
            take_when: false,
            next: reducer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply::apply_many;
    use crate::sources::each;
    use crate::testing::assert_prim_many;
    use crate::transducer::compose;

    #[tokio::test]
    async fn test_take_over_sequence() {
        let pipeline = compose(each(), take(2));
        assert_prim_many(apply_many(&pipeline, vec![1, 2, 3, 4]).await, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_take_more_than_available() {
        let pipeline = compose(each(), take(10));
        assert_prim_many(apply_many(&pipeline, vec![1, 2]).await, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_take_while() {
        let pipeline = compose(each(), take_while(|x: &i32| *x < 3));
        assert_prim_many(apply_many(&pipeline, vec![1, 2, 3, 1]).await, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_take_until() {
        let pipeline = compose(each(), take_until(|x: &i32| *x == 3));
        assert_prim_many(apply_many(&pipeline, vec![1, 2, 3, 4]).await, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_take_counters_are_per_run() {
        let pipeline = compose(each(), take(1));
        assert_prim_many(apply_many(&pipeline, vec![1, 2]).await, vec![1]);
        assert_prim_many(apply_many(&pipeline, vec![3, 4]).await, vec![3]);
    }
}
