//! Running folds over the values flowing through a stage.
//!
//! Each stage instance keeps its own running state, seeded from a clone of the
//! descriptor's seed when the instance is built. The two bounded variants
//! treat the triggering value differently:
//!
//! - `fold_until` stops as soon as the newly folded state satisfies the
//!   predicate, discards that state and completes with the accumulator as it was
//!   before the triggering value.
//! - `fold_while` delegates the newly folded state even when it no longer
//!   satisfies the predicate, then completes.

use super::{BoxReducer, Reducer, Transducer};
use crate::context::TState;
use crate::core::Reduced;
use async_trait::async_trait;
use std::sync::Arc;

/// Folds every value into a running state and delegates each new state.
pub struct Fold<T, F> {
    seed: T,
    folder: Arc<F>,
}

/// Creates a running fold seeded with `seed`.
pub fn fold<A, T, F>(seed: T, folder: F) -> Fold<T, F>
where
    T: Clone + Send + Sync + 'static,
    F: Fn(T, A) -> T + Send + Sync + 'static,
{
    Fold {
        seed,
        folder: Arc::new(folder),
    }
}

/// Folds until the folded state satisfies a predicate.
pub struct FoldUntil<T, F, P> {
    seed: T,
    folder: Arc<F>,
    predicate: Arc<P>,
}

/// Creates a running fold that completes once `predicate` holds for the new state.
pub fn fold_until<A, T, F, P>(seed: T, folder: F, predicate: P) -> FoldUntil<T, F, P>
where
    T: Clone + Send + Sync + 'static,
    F: Fn(T, A) -> T + Send + Sync + 'static,
    P: Fn(&T) -> bool + Send + Sync + 'static,
{
    FoldUntil {
        seed,
        folder: Arc::new(folder),
        predicate: Arc::new(predicate),
    }
}

/// Folds while the folded state satisfies a predicate.
pub struct FoldWhile<T, F, P> {
    seed: T,
    folder: Arc<F>,
    predicate: Arc<P>,
}

/// Creates a running fold that completes once `predicate` fails for the new state.
pub fn fold_while<A, T, F, P>(seed: T, folder: F, predicate: P) -> FoldWhile<T, F, P>
where
    T: Clone + Send + Sync + 'static,
    F: Fn(T, A) -> T + Send + Sync + 'static,
    P: Fn(&T) -> bool + Send + Sync + 'static,
{
    FoldWhile {
        seed,
        folder: Arc::new(folder),
        predicate: Arc::new(predicate),
    }
}

#[derive(Clone, Copy)]
enum Boundary {
    None,
    Until,
    While,
}

type Predicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

struct FoldReducer<T, F, S> {
    current: T,
    folder: Arc<F>,
    boundary: Boundary,
    predicate: Option<Predicate<T>>,
    next: BoxReducer<S, T>,
}

#[async_trait]
impl<S, A, T, F> Reducer<S, A> for FoldReducer<T, F, S>
where
    S: Send + 'static,
    A: Send + 'static,
    T: Clone + Send + Sync + 'static,
    F: Fn(T, A) -> T + Send + Sync + 'static,
{
    async fn run(&mut self, state: TState<S>, value: A) -> Reduced<S> {
        let folded = (self.folder)(self.current.clone(), value);
        let holds = self.predicate.as_ref().is_some_and(|p| p(&folded));

        match self.boundary {
            Boundary::Until if holds => Reduced::Complete(state.into_value()),
            Boundary::While if !holds => {
                self.current = folded.clone();
                self.next.run(state, folded).await.into_complete()
            }
            _ => {
                self.current = folded.clone();
                self.next.run(state, folded).await
            }
        }
    }
}

impl<A, T, F> Transducer<A, T> for Fold<T, F>
where
    A: Send + 'static,
    T: Clone + Send + Sync + 'static,
    F: Fn(T, A) -> T + Send + Sync + 'static,
{
    fn transform<S: Send + 'static>(&self, reducer: BoxReducer<S, T>) -> BoxReducer<S, A> {
        Box::new(FoldReducer {
            current: self.seed.clone(),
            folder: Arc::clone(&self.folder),
            boundary: Boundary::None,
            predicate: None,
            next: reducer,
        })
    }
}

impl<A, T, F, P> Transducer<A, T> for FoldUntil<T, F, P>
where
    A: Send + 'static,
    T: Clone + Send + Sync + 'static,
    F: Fn(T, A) -> T + Send + Sync + 'static,
    P: Fn(&T) -> bool + Send + Sync + 'static,
{
    fn transform<S: Send + 'static>(&self, reducer: BoxReducer<S, T>) -> BoxReducer<S, A> {
        let predicate: Predicate<T> = self.predicate.clone();
        Box::new(FoldReducer {
            current: self.seed.clone(),
            folder: Arc::clone(&self.folder),
            boundary: Boundary::Until,
            predicate: Some(predicate),
            next: reducer,
        })
    }
}

impl<A, T, F, P> Transducer<A, T> for FoldWhile<T, F, P>
where
    A: Send + 'static,
    T: Clone + Send + Sync + 'static,
    F: Fn(T, A) -> T + Send + Sync + 'static,
    P: Fn(&T) -> bool + Send + Sync + 'static,
{
    fn transform<S: Send + 'static>(&self, reducer: BoxReducer<S, T>) -> BoxReducer<S, A> {
        let predicate: Predicate<T> = self.predicate.clone();
        Box::new(FoldReducer {
            current: self.seed.clone(),
            folder: Arc::clone(&self.folder),
            boundary: Boundary::While,
            predicate: Some(predicate),
            next: reducer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply::{apply_many, apply_one};
    use crate::core::Prim;
    use crate::sources::each;
    use crate::testing::assert_prim_many;
    use crate::transducer::{compose, take};

    #[tokio::test]
    async fn test_fold_delegates_each_running_total() {
        let pipeline = compose(each(), fold(0, |acc: i32, x: i32| acc + x));
        assert_prim_many(apply_many(&pipeline, vec![1, 2, 3]).await, vec![1, 3, 6]);
    }

    #[tokio::test]
    async fn test_fold_while_includes_triggering_state() {
        let pipeline = compose(each(), fold_while(0, |acc: i32, x: i32| acc + x, |t: &i32| *t < 5));
        assert_prim_many(apply_many(&pipeline, vec![1, 2, 2, 7]).await, vec![1, 3, 5]);
    }

    #[tokio::test]
    async fn test_fold_until_excludes_triggering_state() {
        let pipeline = compose(each(), fold_until(0, |acc: i32, x: i32| acc + x, |t: &i32| *t >= 5));
        assert_prim_many(apply_many(&pipeline, vec![1, 2, 2, 7]).await, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_fold_seed_is_fresh_per_run() {
        let pipeline = compose(each(), compose(fold(10, |acc: i32, x: i32| acc + x), take(1)));
        assert!(matches!(apply_one(&pipeline, vec![1, 2]).await, Prim::One(11)));
        assert!(matches!(apply_one(&pipeline, vec![1, 2]).await, Prim::One(11)));
    }
}
