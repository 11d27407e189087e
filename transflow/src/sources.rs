//! Source stages: turn one collection-like input into a sequence of values.
//!
//! `each` drives an iterable, `stream` an async stream, and `observe` a stream
//! of results such as the receiving half of [`channel`]. All of them stop at the
//! first terminal outcome downstream and check the run's cancellation token and
//! deadline between values.

use crate::context::{RunContext, TState};
use crate::core::Reduced;
use crate::errors::TransflowError;
use crate::transducer::{feed, BoxReducer, Reducer, Transducer};
use async_trait::async_trait;
use futures::channel::mpsc;
use futures::{Stream, StreamExt};
use std::marker::PhantomData;
use tracing::trace;

/// Iterates over a collection input, delegating each element.
#[derive(Debug, Clone, Copy, Default)]
pub struct Each;

/// Creates a stage that iterates over its input.
#[must_use]
pub fn each() -> Each {
    Each
}

struct EachReducer<S, B> {
    next: BoxReducer<S, B>,
}

#[async_trait]
impl<S, I, B> Reducer<S, I> for EachReducer<S, B>
where
    S: Send + 'static,
    I: IntoIterator<Item = B> + Send + 'static,
    I::IntoIter: Send,
    B: Send + 'static,
{
    async fn run(&mut self, state: TState<S>, values: I) -> Reduced<S> {
        feed(&mut self.next, state, values).await
    }
}

impl<I> Transducer<I, I::Item> for Each
where
    I: IntoIterator + Send + 'static,
    I::IntoIter: Send,
    I::Item: Send + 'static,
{
    fn transform<S: Send + 'static>(&self, reducer: BoxReducer<S, I::Item>) -> BoxReducer<S, I> {
        Box::new(EachReducer { next: reducer })
    }
}

/// Drains an async stream input, delegating each item.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamSource;

/// Creates a stage that drains a stream input.
#[must_use]
pub fn stream() -> StreamSource {
    StreamSource
}

/// Drains a stream of results; an error item fails the run.
#[derive(Debug, Clone, Copy, Default)]
pub struct Observe;

/// Creates a stage that drains a stream of results.
#[must_use]
pub fn observe() -> Observe {
    Observe
}

/// Pulls items until the stream ends, the run is interrupted or downstream
/// reports a terminal outcome. Waiting for the next item races cancellation.
async fn drain<S, St, B, F>(
    next: &mut BoxReducer<S, B>,
    state: TState<S>,
    mut items: St,
    lift: F,
) -> Reduced<S>
where
    S: Send + 'static,
    St: Stream + Unpin + Send,
    B: Send + 'static,
    F: Fn(St::Item) -> Result<B, TransflowError> + Send,
{
    let (mut acc, context) = state.into_parts();
    loop {
        let item = match next_item(&context, &mut items).await {
            Ok(Some(item)) => item,
            Ok(None) => return Reduced::Continue(acc),
            Err(err) => return Reduced::Fail(err),
        };
        let value = match lift(item) {
            Ok(value) => value,
            Err(err) => return Reduced::Fail(err),
        };
        match next.run(TState::with_context(context.clone(), acc), value).await {
            Reduced::Continue(updated) => acc = updated,
            other => return other,
        }
    }
}

async fn next_item<St>(context: &RunContext, items: &mut St) -> Result<Option<St::Item>, TransflowError>
where
    St: Stream + Unpin,
{
    if let Some(err) = context.interruption() {
        return Err(err);
    }
    tokio::select! {
        item = items.next() => Ok(item),
        () = context.cancellation().cancelled() => {
            trace!("Stream source interrupted by cancellation");
            Err(context.interruption().unwrap_or_else(|| TransflowError::cancelled("")))
        }
    }
}

struct StreamReducer<S, B, St> {
    next: BoxReducer<S, B>,
    _stream: PhantomData<fn(St)>,
}

#[async_trait]
impl<S, B, St> Reducer<S, St> for StreamReducer<S, B, St>
where
    S: Send + 'static,
    B: Send + 'static,
    St: Stream<Item = B> + Unpin + Send + 'static,
{
    async fn run(&mut self, state: TState<S>, items: St) -> Reduced<S> {
        drain(&mut self.next, state, items, Ok).await
    }
}

impl<St> Transducer<St, St::Item> for StreamSource
where
    St: Stream + Unpin + Send + 'static,
    St::Item: Send + 'static,
{
    fn transform<S: Send + 'static>(&self, reducer: BoxReducer<S, St::Item>) -> BoxReducer<S, St> {
        Box::new(StreamReducer {
            next: reducer,
            _stream: PhantomData,
        })
    }
}

struct ObserveReducer<S, B, St> {
    next: BoxReducer<S, B>,
    _stream: PhantomData<fn(St)>,
}

#[async_trait]
impl<S, B, St> Reducer<S, St> for ObserveReducer<S, B, St>
where
    S: Send + 'static,
    B: Send + 'static,
    St: Stream<Item = Result<B, TransflowError>> + Unpin + Send + 'static,
{
    async fn run(&mut self, state: TState<S>, items: St) -> Reduced<S> {
        drain(&mut self.next, state, items, |item| item).await
    }
}

impl<B, St> Transducer<St, B> for Observe
where
    B: Send + 'static,
    St: Stream<Item = Result<B, TransflowError>> + Unpin + Send + 'static,
{
    fn transform<S: Send + 'static>(&self, reducer: BoxReducer<S, B>) -> BoxReducer<S, St> {
        Box::new(ObserveReducer {
            next: reducer,
            _stream: PhantomData,
        })
    }
}

/// The push side of a [`channel`].
#[derive(Debug)]
pub struct Observer<A> {
    sender: mpsc::UnboundedSender<Result<A, TransflowError>>,
}

impl<A> Clone for Observer<A> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<A> Observer<A> {
    /// Pushes a value. Returns false once the receiving side is gone.
    pub fn next(&self, value: A) -> bool {
        self.sender.unbounded_send(Ok(value)).is_ok()
    }

    /// Pushes an error, which fails the observing run.
    pub fn error(&self, error: impl Into<TransflowError>) -> bool {
        self.sender.unbounded_send(Err(error.into())).is_ok()
    }

    /// Ends the sequence.
    pub fn complete(&self) {
        self.sender.close_channel();
    }
}

/// The receiving side of a [`channel`], to be fed into [`observe`].
pub type Observed<A> = mpsc::UnboundedReceiver<Result<A, TransflowError>>;

/// Creates a push-based source: values pushed into the [`Observer`] are
/// delivered by an [`observe`] stage reading the returned stream.
#[must_use]
pub fn channel<A>() -> (Observer<A>, Observed<A>) {
    let (sender, receiver) = mpsc::unbounded();
    (Observer { sender }, receiver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply::{apply_many, apply_many_with};
    use crate::core::Prim;
    use crate::testing::{assert_prim_failed, assert_prim_many};
    use crate::transducer::{compose, take};

    #[tokio::test]
    async fn test_each_over_vec() {
        assert_prim_many(apply_many(&each(), vec![1, 2, 3]).await, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_each_over_range_stops_early() {
        let pipeline = compose(each(), take(3));
        assert_prim_many(apply_many(&pipeline, 0..1_000_000).await, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_stream_source() {
        let items = futures::stream::iter(vec!["a", "b"]);
        assert_prim_many(apply_many(&stream(), items).await, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_observe_error_fails_run() {
        let (observer, observed) = channel::<i32>();
        observer.next(1);
        observer.error("broken");
        observer.complete();

        let err = assert_prim_failed(apply_many(&observe(), observed).await);
        assert_eq!(err.to_string(), "broken");
    }

    #[tokio::test]
    async fn test_channel_delivers_pushed_values() {
        let (observer, observed) = channel();
        let producer = tokio::spawn(async move {
            for i in 0..3 {
                observer.next(i);
            }
            observer.complete();
        });

        let result = apply_many(&observe(), observed).await;
        producer.await.unwrap();
        assert_prim_many(result, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_each_stops_when_cancelled() {
        let context = RunContext::new();
        context.cancellation().cancel("stop");
        let result: Prim<i32> = apply_many_with(&each(), vec![1, 2], context).await;
        assert!(assert_prim_failed(result).is_cancelled());
    }

    #[tokio::test]
    async fn test_pending_stream_unblocks_on_cancel() {
        let context = RunContext::new();
        let token = context.cancellation().clone();
        let (_observer, observed) = channel::<i32>();

        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            token.cancel("timeout");
        });

        let result = apply_many_with(&observe(), observed, context).await;
        assert!(assert_prim_failed(result).is_cancelled());
    }
}
