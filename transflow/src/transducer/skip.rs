//! Stages that suppress a leading window of values.

use super::{BoxReducer, Reducer, Transducer};
use crate::context::TState;
use crate::core::Reduced;
use async_trait::async_trait;
use std::sync::Arc;

/// Suppresses the first `count` values, then delegates every value.
#[derive(Debug, Clone, Copy)]
pub struct Skip {
    count: usize,
}

/// Creates a stage skipping the first `count` values.
#[must_use]
pub fn skip(count: usize) -> Skip {
    Skip { count }
}

struct SkipReducer<S, A> {
    remaining: usize,
    next: BoxReducer<S, A>,
}

#[async_trait]
impl<S, A> Reducer<S, A> for SkipReducer<S, A>
where
    S: Send + 'static,
    A: Send + 'static,
{
    async fn run(&mut self, state: TState<S>, value: A) -> Reduced<S> {
        if self.remaining > 0 {
            self.remaining -= 1;
            return Reduced::Continue(state.into_value());
        }
        self.next.run(state, value).await
    }
}

impl<A> Transducer<A, A> for Skip
where
    A: Send + 'static,
{
    fn transform<S: Send + 'static>(&self, reducer: BoxReducer<S, A>) -> BoxReducer<S, A> {
        Box::new(SkipReducer {
            remaining: self.count,
            next: reducer,
        })
    }
}

/// Suppresses values while a predicate holds.
pub struct SkipWhile<P> {
    predicate: Arc<P>,
}

/// Creates a stage skipping values while `predicate` holds.
pub fn skip_while<A, P>(predicate: P) -> SkipWhile<P>
where
    P: Fn(&A) -> bool + Send + Sync + 'static,
{
    SkipWhile {
        predicate: Arc::new(predicate),
    }
}

/// Suppresses values until a predicate holds.
pub struct SkipUntil<P> {
    predicate: Arc<P>,
}

/// Creates a stage skipping values until `predicate` holds.
pub fn skip_until<A, P>(predicate: P) -> SkipUntil<P>
where
    P: Fn(&A) -> bool + Send + Sync + 'static,
{
    SkipUntil {
        predicate: Arc::new(predicate),
    }
}

struct SkipPredicateReducer<P, S, A> {
    predicate: Arc<P>,
    skip_when: bool,
    skipping: bool,
    next: BoxReducer<S, A>,
}

#[async_trait]
impl<S, A, P> Reducer<S, A> for SkipPredicateReducer<P, S, A>
where
    S: Send + 'static,
    A: Send + 'static,
    P: Fn(&A) -> bool + Send + Sync + 'static,
{
    async fn run(&mut self, state: TState<S>, value: A) -> Reduced<S> {
        if self.skipping {
            if (self.predicate)(&value) == self.skip_when {
                return Reduced::Continue(state.into_value());
            }
            // The window closes for good on the first non-matching value.
            self.skipping = false;
        }
        self.next.run(state, value).await
    }
}

impl<A, P> Transducer<A, A> for SkipWhile<P>
where
    A: Send + 'static,
    P: Fn(&A) -> bool + Send + Sync + 'static,
{
    fn transform<S: Send + 'static>(&self, reducer: BoxReducer<S, A>) -> BoxReducer<S, A> {
        Box::new(SkipPredicateReducer {
            predicate: Arc::clone(&self.predicate),
            skip_when: true,
            skipping: true,
            next: reducer,
        })
    }
}

impl<A, P> Transducer<A, A> for SkipUntil<P>
where
    A: Send + 'static,
    P: Fn(&A) -> bool + Send + Sync + 'static,
{
    fn transform<S: Send + 'static>(&self, reducer: BoxReducer<S, A>) -> BoxReducer<S, A> {
        Box::new(SkipPredicateReducer {
            predicate: Arc::clone(&self.predicate),
            skip_when: false,
            skipping: true,
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
    async fn test_skip_while_window_closes_once() {
        let pipeline = compose(each(), skip_while(|x: &i32| *x < 3));
        assert_prim_many(apply_many(&pipeline, vec![1, 2, 3, 1, 5]).await, vec![3, 1, 5]);
    }

    #[tokio::test]
    async fn test_skip_until() {
        let pipeline = compose(each(), skip_until(|x: &i32| *x == 2));
        assert_prim_many(apply_many(&pipeline, vec![1, 2, 3]).await, vec![2, 3]);
    }

    #[tokio::test]
    async fn test_skip_everything() {
        let pipeline = compose(each(), skip(5));
        assert!(apply_many(&pipeline, vec![1, 2, 3]).await.is_none());
    }
}
