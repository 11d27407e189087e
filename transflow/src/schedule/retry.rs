//! Re-running a stage on one input according to a schedule.

use super::{Schedule, Sleeper, TokioSleeper};
use crate::context::{RunContext, TState};
use crate::core::Reduced;
use crate::errors::TransflowError;
use crate::transducer::{capture_last, BoxReducer, Reducer, Transducer};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Runs one attempt of `inner` on `value` with a fresh stage instance,
/// keeping its last output.
pub(super) async fn attempt<T, A, B>(
    inner: &T,
    context: &RunContext,
    value: A,
) -> Reduced<Option<B>>
where
    T: Transducer<A, B>,
    A: Send + 'static,
    B: Send + 'static,
{
    let mut chain = inner.transform(capture_last());
    chain.run(TState::with_context(context.clone(), None), value).await
}

/// Waits `delay` before the next attempt, racing the run's cancellation token.
///
/// Fails without waiting if the run is already interrupted or if the wait
/// would end past the run's deadline.
pub(super) async fn pause(
    context: &RunContext,
    sleeper: &dyn Sleeper,
    delay: Duration,
) -> Result<(), TransflowError> {
    if let Some(err) = context.interruption() {
        return Err(err);
    }
    if let Some(deadline) = context.deadline() {
        if Instant::now().checked_add(delay).map_or(true, |end| end > deadline) {
            return Err(TransflowError::DeadlineExceeded);
        }
    }
    tokio::select! {
        () = sleeper.sleep(delay) => Ok(()),
        () = context.cancellation().cancelled() => {
            Err(context.interruption().unwrap_or_else(|| TransflowError::cancelled("")))
        }
    }
}

/// Re-runs `inner` until its output satisfies a predicate or the schedule
/// runs out.
///
/// A `Fail` or `Complete` from an attempt ends the loop at once. When the
/// schedule is exhausted, the last attempt's output is delivered whether or
/// not it satisfied the predicate.
pub struct Retry<T, P> {
    inner: Arc<T>,
    schedule: Schedule,
    predicate: Arc<P>,
    sleeper: Arc<dyn Sleeper>,
}

impl<T, P> Clone for Retry<T, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            schedule: self.schedule.clone(),
            predicate: Arc::clone(&self.predicate),
            sleeper: Arc::clone(&self.sleeper),
        }
    }
}

/// Wraps `inner` in a scheduled retry loop that stops once `predicate` holds.
pub fn retry<B, T, P>(inner: T, schedule: impl Into<Schedule>, predicate: P) -> Retry<T, P>
where
    P: Fn(&B) -> bool + Send + Sync + 'static,
{
    Retry {
        inner: Arc::new(inner),
        schedule: schedule.into(),
        predicate: Arc::new(predicate),
        sleeper: Arc::new(TokioSleeper),
    }
}

impl<T, P> Retry<T, P> {
    /// Uses `sleeper` for the waits between attempts.
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Arc::new(sleeper);
        self
    }
}

struct RetryReducer<T, P, S, B> {
    inner: Arc<T>,
    schedule: Schedule,
    predicate: Arc<P>,
    sleeper: Arc<dyn Sleeper>,
    next: BoxReducer<S, B>,
}

impl<T, P, S, B> RetryReducer<T, P, S, B>
where
    S: Send + 'static,
    B: Send + 'static,
{
    async fn deliver(&mut self, state: TState<S>, produced: Option<B>) -> Reduced<S> {
        match produced {
            Some(value) => self.next.run(state, value).await,
            None => Reduced::Continue(state.into_value()),
        }
    }
}

#[async_trait]
impl<S, A, B, T, P> Reducer<S, A> for RetryReducer<T, P, S, B>
where
    S: Send + 'static,
    A: Clone + Send + 'static,
    B: Send + 'static,
    T: Transducer<A, B> + 'static,
    P: Fn(&B) -> bool + Send + Sync + 'static,
{
    async fn run(&mut self, state: TState<S>, value: A) -> Reduced<S> {
        let context = state.context().clone();
        let mut delays = self.schedule.iter();
        let mut attempts = 1usize;

        loop {
            let produced = match attempt(&*self.inner, &context, value.clone()).await {
                Reduced::Continue(produced) => produced,
                Reduced::Complete(produced) => {
                    return self.deliver(state, produced).await.into_complete();
                }
                Reduced::Fail(err) => {
                    debug!(attempts, error = %err, "Scheduled attempt failed");
                    return Reduced::Fail(err);
                }
                Reduced::Alt(alt) => return Reduced::Alt(alt),
            };

            if produced.as_ref().is_some_and(|b| (self.predicate)(b)) {
                debug!(attempts, "Scheduled attempt satisfied predicate");
                return self.deliver(state, produced).await;
            }

            let Some(delay) = delays.next() else {
                debug!(attempts, "Schedule exhausted, delivering last attempt");
                return self.deliver(state, produced).await;
            };

            debug!(attempts, delay_ms = delay.as_millis() as u64, "Retrying after delay");
            if let Err(err) = pause(&context, &*self.sleeper, delay).await {
                return Reduced::Fail(err);
            }
            attempts += 1;
        }
    }
}

impl<A, B, T, P> Transducer<A, B> for Retry<T, P>
where
    A: Clone + Send + 'static,
    B: Send + 'static,
    T: Transducer<A, B> + 'static,
    P: Fn(&B) -> bool + Send + Sync + 'static,
{
    fn transform<S: Send + 'static>(&self, reducer: BoxReducer<S, B>) -> BoxReducer<S, A> {
        Box::new(RetryReducer {
            inner: Arc::clone(&self.inner),
            schedule: self.schedule.clone(),
            predicate: Arc::clone(&self.predicate),
            sleeper: Arc::clone(&self.sleeper),
            next: reducer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply::{apply_one, apply_one_with};
    use crate::core::Prim;
    use crate::schedule::{InstantSleeper, MockSleeper, TrackingSleeper};
    use crate::testing::{assert_prim_failed, assert_prim_one, FailingTransducer};
    use crate::transducer::map;
    use parking_lot::Mutex;

    fn counter() -> (Arc<Mutex<i32>>, impl Fn(i32) -> i32 + Send + Sync + 'static) {
        let calls = Arc::new(Mutex::new(0));
        let seen = calls.clone();
        (calls, move |_| {
            let mut calls = seen.lock();
            *calls += 1;
            *calls
        })
    }

    #[tokio::test]
    async fn test_retry_stops_when_predicate_holds() {
        let (calls, f) = counter();
        let pipeline = retry(map(f), Schedule::recurs(10), |n: &i32| *n >= 3)
            .with_sleeper(InstantSleeper);

        assert_prim_one(apply_one(&pipeline, 0).await, 3);
        assert_eq!(*calls.lock(), 3);
    }

    #[tokio::test]
    async fn test_retry_exhausted_returns_last_attempt() {
        let (calls, f) = counter();
        let sleeper = TrackingSleeper::new();
        let pipeline = retry(map(f), vec![Duration::ZERO; 3], |_: &i32| false)
            .with_sleeper(sleeper.clone());

        assert_prim_one(apply_one(&pipeline, 0).await, 4);
        assert_eq!(*calls.lock(), 4);
        assert_eq!(sleeper.calls(), vec![Duration::ZERO; 3]);
    }

    #[tokio::test]
    async fn test_retry_failure_is_not_retried() {
        let failing = FailingTransducer::new("down");
        let pipeline = retry(failing.clone(), Schedule::recurs(5), |_: &i32| true)
            .with_sleeper(InstantSleeper);

        let result: Prim<i32> = apply_one(&pipeline, 1).await;
        assert_eq!(assert_prim_failed(result).to_string(), "down");
        assert_eq!(failing.call_count(), 1);
    }

    #[tokio::test]
    async fn test_retry_uses_injected_sleeper() {
        let mut sleeper = MockSleeper::new();
        sleeper.expect_sleep().times(2).returning(|_| ());

        let pipeline = retry(map(|x: i32| x), Schedule::recurs(2), |_: &i32| false)
            .with_sleeper(sleeper);
        assert_prim_one(apply_one(&pipeline, 9).await, 9);
    }

    #[tokio::test]
    async fn test_retry_cancelled_while_waiting() {
        let context = RunContext::new();
        let token = Arc::clone(context.cancellation());
        let hourly = Schedule::spaced(Duration::from_secs(3600));
        let pipeline = retry(map(|x: i32| x), hourly, |_: &i32| false);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            token.cancel("shutdown");
        });

        let err = assert_prim_failed(apply_one_with(&pipeline, 1, context).await);
        assert!(err.is_cancelled());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_zero_delay_retry_yields_to_canceller() {
        let context = RunContext::new();
        let token = Arc::clone(context.cancellation());
        let pipeline = retry(map(|x: i32| x), Schedule::forever(), |_: &i32| false);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            token.cancel("shutdown");
        });

        let result = tokio::time::timeout(
            Duration::from_secs(2),
            apply_one_with(&pipeline, 1, context),
        )
        .await
        .expect("zero-delay retries must let the canceller run");
        assert!(assert_prim_failed(result).is_cancelled());
    }

    #[tokio::test]
    async fn test_retry_respects_deadline() {
        let context = RunContext::new().with_deadline(Instant::now() + Duration::from_millis(50));
        let slow = Schedule::spaced(Duration::from_secs(10));
        let pipeline = retry(map(|x: i32| x), slow, |_: &i32| false)
            .with_sleeper(InstantSleeper);

        let err = assert_prim_failed(apply_one_with(&pipeline, 1, context).await);
        assert!(matches!(err, TransflowError::DeadlineExceeded));
    }
}
