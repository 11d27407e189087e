//! Single-level fallback between two alternative stages.

use super::{BoxReducer, Reducer, SharedReducer, Transducer};
use crate::context::TState;
use crate::core::Reduced;
use crate::errors::TransflowError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::mem;
use std::sync::Arc;
use tracing::debug;

/// Tries `first`; on failure retries the same input through `second`.
///
/// Outputs of `first` reach the continuation as they are produced, so a
/// terminal outcome downstream stops `first` at once. Values `first` delivered
/// before failing stay delivered; `second` continues from that accumulator.
/// Only one fallback level exists: a failure of `second` propagates.
#[derive(Debug, Clone)]
pub struct Choice<T1, T2> {
    first: T1,
    second: T2,
}

/// Creates a fallback stage.
pub fn choice<T1, T2>(first: T1, second: T2) -> Choice<T1, T2> {
    Choice { first, second }
}

/// Where the accumulator lives while `first` runs.
enum Slot<S> {
    Empty,
    Holding(S),
    /// The continuation ended the run; its outcome is final.
    Stopped(Reduced<S>),
}

type SharedSlot<S> = Arc<Mutex<Slot<S>>>;

fn take_slot<S>(slot: &SharedSlot<S>) -> Slot<S> {
    mem::replace(&mut *slot.lock(), Slot::Empty)
}

/// Continuation handed to `first`. `first` threads a unit state; the real
/// accumulator is parked in the slot so that it survives a failure of `first`.
struct Relay<S, B> {
    slot: SharedSlot<S>,
    next: SharedReducer<S, B>,
}

#[async_trait]
impl<S, B> Reducer<(), B> for Relay<S, B>
where
    S: Send + 'static,
    B: Send + 'static,
{
    async fn run(&mut self, state: TState<()>, value: B) -> Reduced<()> {
        let acc = match take_slot(&self.slot) {
            Slot::Holding(acc) => acc,
            other => {
                *self.slot.lock() = other;
                return Reduced::Complete(());
            }
        };

        let (_, context) = state.into_parts();
        match self.next.run(TState::with_context(context, acc), value).await {
            Reduced::Continue(acc) => {
                *self.slot.lock() = Slot::Holding(acc);
                Reduced::Continue(())
            }
            terminal => {
                *self.slot.lock() = Slot::Stopped(terminal);
                Reduced::Complete(())
            }
        }
    }
}

struct ChoiceReducer<S, A> {
    slot: SharedSlot<S>,
    first: BoxReducer<(), A>,
    second: BoxReducer<S, A>,
}

#[async_trait]
impl<S, A> Reducer<S, A> for ChoiceReducer<S, A>
where
    S: Send + 'static,
    A: Clone + Send + 'static,
{
    async fn run(&mut self, state: TState<S>, value: A) -> Reduced<S> {
        let (acc, context) = state.into_parts();
        *self.slot.lock() = Slot::Holding(acc);

        let outcome = self
            .first
            .run(TState::with_context(context.clone(), ()), value.clone())
            .await;

        let acc = match take_slot(&self.slot) {
            Slot::Holding(acc) => acc,
            Slot::Stopped(terminal) => return terminal,
            Slot::Empty => {
                return Reduced::Fail(TransflowError::message("choice lost its accumulator"))
            }
        };
        match outcome {
            Reduced::Continue(()) => Reduced::Continue(acc),
            Reduced::Complete(()) => Reduced::Complete(acc),
            Reduced::Fail(err) => {
                debug!(error = %err, "First alternative failed, trying second");
                self.second.run(TState::with_context(context, acc), value).await
            }
            Reduced::Alt(alt) => Reduced::Alt(alt),
        }
    }
}

impl<A, B, T1, T2> Transducer<A, B> for Choice<T1, T2>
where
    A: Clone + Send + 'static,
    B: Send + 'static,
    T1: Transducer<A, B>,
    T2: Transducer<A, B>,
{
    fn transform<S: Send + 'static>(&self, reducer: BoxReducer<S, B>) -> BoxReducer<S, A> {
        let shared = SharedReducer::new(reducer);
        let slot = Arc::new(Mutex::new(Slot::Empty));
        Box::new(ChoiceReducer {
            first: self.first.transform(Box::new(Relay {
                slot: Arc::clone(&slot),
                next: shared.clone(),
            })),
            second: self.second.transform(Box::new(shared)),
            slot,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply::{apply_many, apply_one};
    use crate::core::Prim;
    use crate::sources::each;
    use crate::testing::{
        assert_prim_failed, assert_prim_many, assert_prim_one, CountingTransducer,
        FailingTransducer,
    };
    use crate::transducer::{compose, constant, map, take};

    #[tokio::test]
    async fn test_choice_falls_back_on_failure() {
        let pipeline = choice(FailingTransducer::new("first"), constant("x"));
        assert_prim_one(apply_one(&pipeline, 1).await, "x");
        assert_prim_one(apply_one(&pipeline, 2).await, "x");
    }

    #[tokio::test]
    async fn test_choice_success_never_runs_second() {
        let counter = CountingTransducer::new();
        let pipeline = choice(map(|x: i32| x + 1), compose(counter.clone(), map(|x: i32| x * 100)));

        assert_prim_one(apply_one(&pipeline, 1).await, 2);
        assert_eq!(counter.call_count(), 0);
    }

    #[tokio::test]
    async fn test_choice_second_failure_propagates() {
        let pipeline = choice(FailingTransducer::new("a"), FailingTransducer::new("b"));
        let result: Prim<i32> = apply_one(&pipeline, 1).await;
        assert_eq!(assert_prim_failed(result).to_string(), "b");
    }

    #[tokio::test]
    async fn test_choice_streams_outputs_in_order() {
        let pipeline = compose(
            each(),
            choice(map(|x: i32| x * 2), FailingTransducer::new("unused")),
        );
        assert_prim_many(apply_many(&pipeline, vec![1, 2, 3]).await, vec![2, 4, 6]);
    }

    #[tokio::test]
    async fn test_downstream_completion_stops_first() {
        let counter = CountingTransducer::new();
        let pipeline = compose(
            choice(compose(each(), counter.clone()), constant(0u64)),
            take(2),
        );

        assert_prim_many(apply_many(&pipeline, 0u64..200_000).await, vec![0, 1]);
        // take(2) completes on the third value it is offered.
        assert_eq!(counter.call_count(), 3);
    }

    #[tokio::test]
    async fn test_downstream_failure_is_not_a_fallback() {
        let second = CountingTransducer::new();
        let pipeline = compose(
            choice(map(|x: i32| x), second.clone()),
            FailingTransducer::new("sink down"),
        );

        let result: Prim<i32> = apply_one(&pipeline, 1).await;
        assert_eq!(assert_prim_failed(result).to_string(), "sink down");
        assert_eq!(second.call_count(), 0);
    }

    #[tokio::test]
    async fn test_choice_respects_downstream_completion() {
        let pipeline = compose(each(), compose(choice(map(|x: i32| x), constant(0)), take(2)));
        assert_prim_many(apply_many(&pipeline, vec![7, 8, 9]).await, vec![7, 8]);
    }
}
