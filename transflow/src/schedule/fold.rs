//! Scheduled retries that accumulate every attempt's output.
//!
//! The accumulator is seeded once per input, before the first attempt. An
//! attempt that fails aborts the loop with that failure; an attempt that
//! produces nothing leaves the accumulator unchanged.

use super::retry::{attempt, pause};
use super::{Schedule, Sleeper, TokioSleeper};
use crate::context::TState;
use crate::core::Reduced;
use crate::transducer::{BoxReducer, Reducer, Transducer};
use async_trait::async_trait;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Boundary {
    Exhausted,
    Until,
    While,
}

type Predicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// Folds the output of every scheduled attempt into one accumulator.
pub struct ScheduledFold<X, T, F, B> {
    inner: Arc<X>,
    schedule: Schedule,
    seed: T,
    folder: Arc<F>,
    boundary: Boundary,
    predicate: Option<Predicate<T>>,
    sleeper: Arc<dyn Sleeper>,
    _output: PhantomData<fn(B)>,
}

impl<X, T: Clone, F, B> Clone for ScheduledFold<X, T, F, B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            schedule: self.schedule.clone(),
            seed: self.seed.clone(),
            folder: Arc::clone(&self.folder),
            boundary: self.boundary,
            predicate: self.predicate.clone(),
            sleeper: Arc::clone(&self.sleeper),
            _output: PhantomData,
        }
    }
}

impl<X, T, F, B> ScheduledFold<X, T, F, B> {
    fn new(inner: X, schedule: Schedule, seed: T, folder: F) -> Self {
        Self {
            inner: Arc::new(inner),
            schedule,
            seed,
            folder: Arc::new(folder),
            boundary: Boundary::Exhausted,
            predicate: None,
            sleeper: Arc::new(TokioSleeper),
            _output: PhantomData,
        }
    }

    fn bounded(mut self, boundary: Boundary, predicate: Predicate<T>) -> Self {
        self.boundary = boundary;
        self.predicate = Some(predicate);
        self
    }

    /// Uses `sleeper` for the waits between attempts.
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Arc::new(sleeper);
        self
    }
}

/// Runs `inner` once per schedule step and delivers the accumulator once the
/// schedule is exhausted.
pub fn fold_schedule<B, X, T, F>(
    inner: X,
    schedule: impl Into<Schedule>,
    seed: T,
    folder: F,
) -> ScheduledFold<X, T, F, B>
where
    T: Clone + Send + Sync + 'static,
    F: Fn(T, B) -> T + Send + Sync + 'static,
{
    ScheduledFold::new(inner, schedule.into(), seed, folder)
}

/// Like [`fold_schedule`], but stops as soon as the newly folded value
/// satisfies `predicate`, delivering the accumulator from before that attempt.
pub fn fold_until_schedule<B, X, T, F, P>(
    inner: X,
    schedule: impl Into<Schedule>,
    seed: T,
    folder: F,
    predicate: P,
) -> ScheduledFold<X, T, F, B>
where
    T: Clone + Send + Sync + 'static,
    F: Fn(T, B) -> T + Send + Sync + 'static,
    P: Fn(&T) -> bool + Send + Sync + 'static,
{
    ScheduledFold::new(inner, schedule.into(), seed, folder)
        .bounded(Boundary::Until, Arc::new(predicate))
}

/// Like [`fold_schedule`], but stops as soon as the newly folded value fails
/// `predicate`, delivering that value.
pub fn fold_while_schedule<B, X, T, F, P>(
    inner: X,
    schedule: impl Into<Schedule>,
    seed: T,
    folder: F,
    predicate: P,
) -> ScheduledFold<X, T, F, B>
where
    T: Clone + Send + Sync + 'static,
    F: Fn(T, B) -> T + Send + Sync + 'static,
    P: Fn(&T) -> bool + Send + Sync + 'static,
{
    ScheduledFold::new(inner, schedule.into(), seed, folder)
        .bounded(Boundary::While, Arc::new(predicate))
}

struct ScheduledFoldReducer<X, T, F, B, S> {
    fold: ScheduledFold<X, T, F, B>,
    next: BoxReducer<S, T>,
}

#[async_trait]
impl<S, A, B, X, T, F> Reducer<S, A> for ScheduledFoldReducer<X, T, F, B, S>
where
    S: Send + 'static,
    A: Clone + Send + 'static,
    B: Send + 'static,
    X: Transducer<A, B> + 'static,
    T: Clone + Send + Sync + 'static,
    F: Fn(T, B) -> T + Send + Sync + 'static,
{
    async fn run(&mut self, state: TState<S>, value: A) -> Reduced<S> {
        let context = state.context().clone();
        let mut delays = self.fold.schedule.iter();
        let mut current = self.fold.seed.clone();
        let mut attempts = 1usize;

        loop {
            let outcome = attempt(&*self.fold.inner, &context, value.clone()).await;
            let (produced, completed) = match outcome {
                Reduced::Continue(produced) => (produced, false),
                Reduced::Complete(produced) => (produced, true),
                Reduced::Fail(err) => {
                    debug!(attempts, error = %err, "Scheduled fold aborted");
                    return Reduced::Fail(err);
                }
                Reduced::Alt(alt) => return Reduced::Alt(alt),
            };

            if let Some(b) = produced {
                let folded = (self.fold.folder)(current.clone(), b);
                let holds = self.fold.predicate.as_ref().is_some_and(|p| p(&folded));
                match self.fold.boundary {
                    Boundary::Until if holds => {
                        debug!(attempts, "Scheduled fold reached its bound");
                        return self.next.run(state, current).await;
                    }
                    Boundary::While if !holds => {
                        debug!(attempts, "Scheduled fold left its bound");
                        return self.next.run(state, folded).await;
                    }
                    _ => current = folded,
                }
            }

            if completed {
                return self.next.run(state, current).await.into_complete();
            }

            let Some(delay) = delays.next() else {
                debug!(attempts, "Schedule exhausted, delivering accumulator");
                return self.next.run(state, current).await;
            };
            if let Err(err) = pause(&context, &*self.fold.sleeper, delay).await {
                return Reduced::Fail(err);
            }
            attempts += 1;
        }
    }
}

impl<A, B, X, T, F> Transducer<A, T> for ScheduledFold<X, T, F, B>
where
    A: Clone + Send + 'static,
    B: Send + 'static,
    X: Transducer<A, B> + 'static,
    T: Clone + Send + Sync + 'static,
    F: Fn(T, B) -> T + Send + Sync + 'static,
{
    fn transform<S: Send + 'static>(&self, reducer: BoxReducer<S, T>) -> BoxReducer<S, A> {
        Box::new(ScheduledFoldReducer {
            fold: self.clone(),
            next: reducer,
        })
    }
}
