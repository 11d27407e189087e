//! Collapsing an [`Either`] back into a single channel.

use crate::context::TState;
use crate::core::{Either, Reduced};
use crate::transducer::{compose, BoxReducer, Compose, Reducer, Transducer};
use async_trait::async_trait;
use std::sync::Arc;

/// Handles each arm of an `Either` with its own function. A `Fail` value is
/// never handed to user code; it fails the run.
pub struct MatchEither<FL, FR> {
    on_left: Arc<FL>,
    on_right: Arc<FR>,
}

impl<FL, FR> Clone for MatchEither<FL, FR> {
    fn clone(&self) -> Self {
        Self {
            on_left: Arc::clone(&self.on_left),
            on_right: Arc::clone(&self.on_right),
        }
    }
}

/// Creates a two-armed match stage.
pub fn match_either<X, A, C, FL, FR>(on_left: FL, on_right: FR) -> MatchEither<FL, FR>
where
    FL: Fn(X) -> C + Send + Sync + 'static,
    FR: Fn(A) -> C + Send + Sync + 'static,
{
    MatchEither {
        on_left: Arc::new(on_left),
        on_right: Arc::new(on_right),
    }
}

/// Runs `stage` and matches on the `Either` it produces.
pub fn match_with<X, A, C, T, FL, FR>(
    stage: T,
    on_left: FL,
    on_right: FR,
) -> Compose<T, MatchEither<FL, FR>, Either<X, A>>
where
    FL: Fn(X) -> C + Send + Sync + 'static,
    FR: Fn(A) -> C + Send + Sync + 'static,
{
    compose(stage, match_either(on_left, on_right))
}

struct MatchReducer<FL, FR, S, C> {
    on_left: Arc<FL>,
    on_right: Arc<FR>,
    next: BoxReducer<S, C>,
}

#[async_trait]
impl<S, X, A, C, FL, FR> Reducer<S, Either<X, A>> for MatchReducer<FL, FR, S, C>
where
    S: Send + 'static,
    X: Send + 'static,
    A: Send + 'static,
    C: Send + 'static,
    FL: Fn(X) -> C + Send + Sync + 'static,
    FR: Fn(A) -> C + Send + Sync + 'static,
{
    async fn run(&mut self, state: TState<S>, value: Either<X, A>) -> Reduced<S> {
        let collapsed = match value {
            Either::Left(x) => (self.on_left)(x),
            Either::Right(a) => (self.on_right)(a),
            Either::Fail(err) => return Reduced::Fail(err),
        };
        self.next.run(state, collapsed).await
    }
}

impl<X, A, C, FL, FR> Transducer<Either<X, A>, C> for MatchEither<FL, FR>
where
    X: Send + 'static,
    A: Send + 'static,
    C: Send + 'static,
    FL: Fn(X) -> C + Send + Sync + 'static,
    FR: Fn(A) -> C + Send + Sync + 'static,
{
    fn transform<S: Send + 'static>(&self, reducer: BoxReducer<S, C>) -> BoxReducer<S, Either<X, A>> {
        Box::new(MatchReducer {
            on_left: Arc::clone(&self.on_left),
            on_right: Arc::clone(&self.on_right),
            next: reducer,
        })
    }
}
