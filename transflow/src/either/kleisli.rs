//! Kleisli chaining across stages that produce [`Either`] values.
//!
//! Only the right channel flows into the next stage. A `Left` or `Fail` skips
//! it and is passed on re-tagged at the output's right type.

use crate::context::TState;
use crate::core::{AltValue, Either, Reduced};
use crate::transducer::{compose, map, BoxReducer, Compose, Reducer, SharedReducer, Transducer};
use async_trait::async_trait;

/// Feeds right values into an `Either`-producing stage and passes the other
/// arms through.
#[derive(Debug, Clone)]
pub struct BindRight<T> {
    stage: T,
}

/// Chains `first` with an `Either`-producing `second` that consumes only the
/// right channel.
pub fn and_then<T1, T2, X, A>(first: T1, second: T2) -> Compose<T1, BindRight<T2>, Either<X, A>> {
    compose(first, BindRight { stage: second })
}

/// Chains `first` with a function returning an `Either`.
pub fn and_then_fn<E, X, A, B, T, F>(first: T, f: F) -> impl Transducer<E, Either<X, B>>
where
    E: Send + 'static,
    X: Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
    T: Transducer<E, Either<X, A>>,
    F: Fn(A) -> Either<X, B> + Send + Sync + 'static,
{
    and_then::<_, _, X, A>(first, map(f))
}

/// Chains `first` with an ordinary stage applied to the right channel; every
/// output of `second` comes out as `Right`.
pub fn and_then_map<E, X, A, B, T1, T2>(first: T1, second: T2) -> impl Transducer<E, Either<X, B>>
where
    E: Send + 'static,
    X: Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
    T1: Transducer<E, Either<X, A>>,
    T2: Transducer<A, B>,
{
    and_then::<_, _, X, A>(first, compose::<_, _, B>(second, map(Either::<X, B>::Right)))
}

struct BindRightReducer<S, X, A, B> {
    stage: BoxReducer<S, A>,
    next: BoxReducer<S, Either<X, B>>,
}

#[async_trait]
impl<S, X, A, B> Reducer<S, Either<X, A>> for BindRightReducer<S, X, A, B>
where
    S: Send + 'static,
    X: Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
{
    async fn run(&mut self, state: TState<S>, value: Either<X, A>) -> Reduced<S> {
        match value {
            Either::Right(a) => self.stage.run(state, a).await,
            Either::Left(x) => self.next.run(state, Either::Left(x)).await,
            Either::Fail(err) => self.next.run(state, Either::Fail(err)).await,
        }
    }
}

impl<X, A, B, T> Transducer<Either<X, A>, Either<X, B>> for BindRight<T>
where
    X: Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
    T: Transducer<A, Either<X, B>>,
{
    fn transform<S: Send + 'static>(
        &self,
        reducer: BoxReducer<S, Either<X, B>>,
    ) -> BoxReducer<S, Either<X, A>> {
        let shared = SharedReducer::new(reducer);
        Box::new(BindRightReducer {
            stage: self.stage.transform(Box::new(shared.clone())),
            next: Box::new(shared),
        })
    }
}

/// Unwraps the right channel. A `Left` ends the run with [`Reduced::Alt`]
/// carrying the left value; a `Fail` fails it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpectRight;

/// Creates a stage that expects only right values.
#[must_use]
pub fn expect_right() -> ExpectRight {
    ExpectRight
}

struct ExpectRightReducer<S, A> {
    next: BoxReducer<S, A>,
}

#[async_trait]
impl<S, X, A> Reducer<S, Either<X, A>> for ExpectRightReducer<S, A>
where
    S: Send + 'static,
    X: Send + 'static,
    A: Send + 'static,
{
    async fn run(&mut self, state: TState<S>, value: Either<X, A>) -> Reduced<S> {
        match value {
            Either::Right(a) => self.next.run(state, a).await,
            Either::Left(x) => Reduced::Alt(AltValue::new(x)),
            Either::Fail(err) => Reduced::Fail(err),
        }
    }
}

impl<X, A> Transducer<Either<X, A>, A> for ExpectRight
where
    X: Send + 'static,
    A: Send + 'static,
{
    fn transform<S: Send + 'static>(&self, reducer: BoxReducer<S, A>) -> BoxReducer<S, Either<X, A>> {
        Box::new(ExpectRightReducer { next: reducer })
    }
}
