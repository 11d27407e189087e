//! Running two stages against the same input and pairing their results.

use super::{capture_first, compose, map, BoxReducer, Reducer, Transducer};
use crate::context::TState;
use crate::core::Reduced;
use async_trait::async_trait;

/// Runs `left` and `right` on the same input and delegates the pair of their
/// first outputs.
///
/// If both sides fail the two errors are combined. If either side produces
/// nothing, the input is dropped.
#[derive(Debug, Clone)]
pub struct Zip<T1, T2> {
    left: T1,
    right: T2,
}

/// Creates a pairing stage.
pub fn zip<T1, T2>(left: T1, right: T2) -> Zip<T1, T2> {
    Zip { left, right }
}

/// Applies a two-argument function to the outputs of two stages.
///
/// Nest calls to lift functions of more arguments.
pub fn map2<A, B, C, D, T1, T2, F>(left: T1, right: T2, f: F) -> impl Transducer<A, D>
where
    A: Clone + Send + 'static,
    B: Send + 'static,
    C: Send + 'static,
    D: Send + 'static,
    T1: Transducer<A, B>,
    T2: Transducer<A, C>,
    F: Fn(B, C) -> D + Send + Sync + 'static,
{
    compose(zip(left, right), map(move |(b, c): (B, C)| f(b, c)))
}

struct ZipReducer<S, A, B, C> {
    left: BoxReducer<Option<B>, A>,
    right: BoxReducer<Option<C>, A>,
    next: BoxReducer<S, (B, C)>,
}

fn captured<T>(reduced: Reduced<Option<T>>) -> Option<T> {
    match reduced {
        Reduced::Continue(value) | Reduced::Complete(value) => value,
        Reduced::Fail(_) | Reduced::Alt(_) => None,
    }
}

#[async_trait]
impl<S, A, B, C> Reducer<S, A> for ZipReducer<S, A, B, C>
where
    S: Send + 'static,
    A: Clone + Send + 'static,
    B: Send + 'static,
    C: Send + 'static,
{
    async fn run(&mut self, state: TState<S>, value: A) -> Reduced<S> {
        let context = state.context().clone();
        let left = self
            .left
            .run(TState::with_context(context.clone(), None), value.clone())
            .await;
        let right = self.right.run(TState::with_context(context, None), value).await;

        match (left, right) {
            (Reduced::Fail(e1), Reduced::Fail(e2)) => Reduced::Fail(e1.combine(e2)),
            (Reduced::Fail(err), _) | (_, Reduced::Fail(err)) => Reduced::Fail(err),
            (Reduced::Alt(alt), _) | (_, Reduced::Alt(alt)) => Reduced::Alt(alt),
            (left, right) => match (captured(left), captured(right)) {
                (Some(b), Some(c)) => self.next.run(state, (b, c)).await,
                _ => Reduced::Continue(state.into_value()),
            },
        }
    }
}

impl<A, B, C, T1, T2> Transducer<A, (B, C)> for Zip<T1, T2>
where
    A: Clone + Send + 'static,
    B: Send + 'static,
    C: Send + 'static,
    T1: Transducer<A, B>,
    T2: Transducer<A, C>,
{
    fn transform<S: Send + 'static>(&self, reducer: BoxReducer<S, (B, C)>) -> BoxReducer<S, A> {
        Box::new(ZipReducer {
            left: self.left.transform(capture_first()),
            right: self.right.transform(capture_first()),
            next: reducer,
        })
    }
}
