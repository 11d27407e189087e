//! Lifting ordinary stages onto the two channels of an [`Either`].

use crate::context::TState;
use crate::core::{Either, Reduced};
use crate::transducer::{
    filter, identity, skip, skip_until, skip_while, take, take_until, take_while, BoxReducer,
    Filter, Identity, MapReducer, Reducer, SharedReducer, Skip, SkipUntil, SkipWhile, Take,
    TakeUntil, TakeWhile, Transducer,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Runs `left` on `Left` values and `right` on `Right` values, re-wrapping
/// each output on its own channel.
///
/// A `Fail` value fails the run without reaching either side.
#[derive(Debug, Clone)]
pub struct BiTransducer<TL, TR> {
    left: TL,
    right: TR,
}

/// Pairs a left-channel stage with a right-channel stage.
pub fn bimap<TL, TR>(left: TL, right: TR) -> BiTransducer<TL, TR> {
    BiTransducer { left, right }
}

/// Applies `left` to the left channel only.
pub fn map_left<TL>(left: TL) -> BiTransducer<TL, Identity> {
    bimap(left, identity())
}

/// Applies `right` to the right channel only.
pub fn map_right<TR>(right: TR) -> BiTransducer<Identity, TR> {
    bimap(identity(), right)
}

/// Keeps left values matching `predicate`; right values pass through.
pub fn filter_left<X, P>(predicate: P) -> BiTransducer<Filter<P>, Identity>
where
    P: Fn(&X) -> bool + Send + Sync + 'static,
{
    map_left(filter(predicate))
}

/// Keeps right values matching `predicate`; left values pass through.
pub fn filter_right<A, P>(predicate: P) -> BiTransducer<Identity, Filter<P>>
where
    P: Fn(&A) -> bool + Send + Sync + 'static,
{
    map_right(filter(predicate))
}

/// Filters each channel with its own predicate.
pub fn bifilter<X, A, PL, PR>(left: PL, right: PR) -> BiTransducer<Filter<PL>, Filter<PR>>
where
    PL: Fn(&X) -> bool + Send + Sync + 'static,
    PR: Fn(&A) -> bool + Send + Sync + 'static,
{
    bimap(filter(left), filter(right))
}

/// Takes up to `left` left values and `right` right values; the run completes
/// as soon as either channel goes past its count.
#[must_use]
pub fn bitake(left: usize, right: usize) -> BiTransducer<Take, Take> {
    bimap(take(left), take(right))
}

/// Skips the first `left` left values and the first `right` right values.
#[must_use]
pub fn biskip(left: usize, right: usize) -> BiTransducer<Skip, Skip> {
    bimap(skip(left), skip(right))
}

/// Takes values on each channel while its predicate holds.
pub fn bitake_while<X, A, PL, PR>(left: PL, right: PR) -> BiTransducer<TakeWhile<PL>, TakeWhile<PR>>
where
    PL: Fn(&X) -> bool + Send + Sync + 'static,
    PR: Fn(&A) -> bool + Send + Sync + 'static,
{
    bimap(take_while(left), take_while(right))
}

/// Takes values on each channel until its predicate holds.
pub fn bitake_until<X, A, PL, PR>(left: PL, right: PR) -> BiTransducer<TakeUntil<PL>, TakeUntil<PR>>
where
    PL: Fn(&X) -> bool + Send + Sync + 'static,
    PR: Fn(&A) -> bool + Send + Sync + 'static,
{
    bimap(take_until(left), take_until(right))
}

/// Skips values on each channel while its predicate holds.
pub fn biskip_while<X, A, PL, PR>(left: PL, right: PR) -> BiTransducer<SkipWhile<PL>, SkipWhile<PR>>
where
    PL: Fn(&X) -> bool + Send + Sync + 'static,
    PR: Fn(&A) -> bool + Send + Sync + 'static,
{
    bimap(skip_while(left), skip_while(right))
}

/// Skips values on each channel until its predicate holds.
pub fn biskip_until<X, A, PL, PR>(left: PL, right: PR) -> BiTransducer<SkipUntil<PL>, SkipUntil<PR>>
where
    PL: Fn(&X) -> bool + Send + Sync + 'static,
    PR: Fn(&A) -> bool + Send + Sync + 'static,
{
    bimap(skip_until(left), skip_until(right))
}

struct BiReducer<S, X, A> {
    left: BoxReducer<S, X>,
    right: BoxReducer<S, A>,
}

#[async_trait]
impl<S, X, A> Reducer<S, Either<X, A>> for BiReducer<S, X, A>
where
    S: Send + 'static,
    X: Send + 'static,
    A: Send + 'static,
{
    async fn run(&mut self, state: TState<S>, value: Either<X, A>) -> Reduced<S> {
        match value {
            Either::Left(x) => self.left.run(state, x).await,
            Either::Right(a) => self.right.run(state, a).await,
            Either::Fail(err) => Reduced::Fail(err),
        }
    }
}

impl<X, Y, A, B, TL, TR> Transducer<Either<X, A>, Either<Y, B>> for BiTransducer<TL, TR>
where
    X: Send + 'static,
    Y: Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
    TL: Transducer<X, Y>,
    TR: Transducer<A, B>,
{
    fn transform<S: Send + 'static>(
        &self,
        reducer: BoxReducer<S, Either<Y, B>>,
    ) -> BoxReducer<S, Either<X, A>> {
        let shared = SharedReducer::new(reducer);
        let into_left = MapReducer::new(
            Arc::new(Either::<Y, B>::Left),
            Box::new(shared.clone()) as BoxReducer<S, Either<Y, B>>,
        );
        let into_right = MapReducer::new(
            Arc::new(Either::<Y, B>::Right),
            Box::new(shared) as BoxReducer<S, Either<Y, B>>,
        );
        Box::new(BiReducer {
            left: self.left.transform(Box::new(into_left)),
            right: self.right.transform(Box::new(into_right)),
        })
    }
}
