//! End-to-end behaviour of composed pipelines.

use super::*;
use crate::apply::{apply_many, apply_one};
use crate::context::TState;
use crate::core::{Either, Prim, Reduced};
use crate::either::{and_then, bimap};
use crate::schedule::{retry, TrackingSleeper};
use crate::scope::{acquire_disposable, scope};
use crate::sources::each;
use crate::testing::{
    assert_complete, assert_continue, assert_prim_failed, assert_prim_many, assert_prim_one,
    CountingTransducer, FailingTransducer, TrackedResource,
};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

/// Terminal reducer collecting values and counting its invocations.
fn recording(calls: &Arc<Mutex<usize>>) -> BoxReducer<Vec<i32>, i32> {
    let calls = Arc::clone(calls);
    reducer_fn(move |state: TState<Vec<i32>>, value: i32| {
        *calls.lock() += 1;
        let mut values = state.into_value();
        values.push(value);
        Reduced::Continue(values)
    })
}

#[tokio::test]
async fn test_composition_is_associative() {
    let inputs = [vec![], vec![1], vec![1, 2, 3, 4, 5, 6, 7, 8]];

    for input in inputs {
        let left = compose(
            compose(each(), map(|x: i32| x * 3)),
            compose(filter(|x: &i32| x % 2 == 0), take(2)),
        );
        let right = compose(
            each(),
            compose(map(|x: i32| x * 3), compose(filter(|x: &i32| x % 2 == 0), take(2))),
        );

        let expected = apply_many(&left, input.clone()).await.into_vec().unwrap();
        let actual = apply_many(&right, input).await.into_vec().unwrap();
        assert_eq!(expected, actual);
    }
}

#[tokio::test]
async fn test_take_zero_never_invokes_continuation() {
    let calls = Arc::new(Mutex::new(0));
    let mut step = take(0).transform(recording(&calls));

    let acc = assert_complete(step.run(TState::new(vec![9]), 1).await);
    assert_eq!(acc, vec![9]);
    assert_eq!(*calls.lock(), 0);
}

#[tokio::test]
async fn test_take_completes_on_the_item_after_n() {
    let calls = Arc::new(Mutex::new(0));
    let mut step = take(2).transform(recording(&calls));

    let acc = assert_continue(step.run(TState::new(Vec::new()), 1).await);
    let acc = assert_continue(step.run(TState::new(acc), 2).await);
    let acc = assert_complete(step.run(TState::new(acc), 3).await);
    assert_eq!(acc, vec![1, 2]);
    assert_eq!(*calls.lock(), 2);
}

#[tokio::test]
async fn test_skip_suppresses_exactly_n() {
    let calls = Arc::new(Mutex::new(0));
    let mut step = skip(2).transform(recording(&calls));

    let mut acc = Vec::new();
    for value in 1..=4 {
        acc = assert_continue(step.run(TState::new(acc), value).await);
    }
    assert_eq!(acc, vec![3, 4]);
    assert_eq!(*calls.lock(), 2);
}

#[tokio::test]
async fn test_filter_delegates_evens_in_order() {
    let pipeline = compose(each(), filter(|x: &i32| x % 2 == 0));
    assert_prim_many(apply_many(&pipeline, vec![1, 2, 3, 4]).await, vec![2, 4]);
}

#[tokio::test]
async fn test_fold_sums_to_six() {
    let pipeline = compose(each(), fold(0, |acc: i32, x: i32| acc + x));
    let totals = apply_many(&pipeline, vec![1, 2, 3]).await.into_vec().unwrap();
    assert_eq!(totals.last(), Some(&6));
}

#[tokio::test]
async fn test_fold_until_returns_previous_total() {
    let mut step = fold_until(0, |acc: i32, x: i32| acc + x, |t: &i32| *t >= 5)
        .transform(reducer_fn(|_state: TState<i32>, total: i32| Reduced::Continue(total)));

    let mut acc = 0;
    for value in [1, 2] {
        acc = assert_continue(step.run(TState::new(acc), value).await);
    }
    let acc = assert_complete(step.run(TState::new(acc), 2).await);
    assert_eq!(acc, 3);
}

#[tokio::test]
async fn test_choice_fallback_and_short_circuit() {
    let pipeline = choice(FailingTransducer::new("first"), constant("x"));
    for input in [1, 2, 3] {
        assert_prim_one(apply_one(&pipeline, input).await, "x");
    }

    let second = CountingTransducer::new();
    let pipeline = choice(map(|x: i32| x), second.clone());
    assert_prim_one(apply_one(&pipeline, 4).await, 4);
    assert_eq!(second.call_count(), 0);
}

#[tokio::test]
async fn test_scope_releases_once_before_failure_returns() {
    let tracked = TrackedResource::new("db");
    let handle = tracked.clone();
    let pipeline = scope(compose(
        acquire_disposable(move |_: i32| Ok(handle.clone())),
        FailingTransducer::new("query failed"),
    ));

    let result: Prim<i32> = apply_one(&pipeline, 1).await;
    assert_eq!(assert_prim_failed(result).to_string(), "query failed");
    assert_eq!(tracked.release_count(), 1);
}

#[tokio::test]
async fn test_schedule_attempts_once_plus_each_delay() {
    let attempts = Arc::new(Mutex::new(0));
    let seen = Arc::clone(&attempts);
    let sleeper = TrackingSleeper::new();
    let pipeline = retry(
        map(move |_: i32| {
            let mut attempts = seen.lock();
            *attempts += 1;
            *attempts
        }),
        vec![Duration::ZERO; 3],
        |_: &i32| false,
    )
    .with_sleeper(sleeper.clone());

    assert_prim_one(apply_one(&pipeline, 0).await, 4);
    assert_eq!(*attempts.lock(), 4);
    assert_eq!(sleeper.calls().len(), 3);
}

#[tokio::test]
async fn test_bimap_on_right_never_runs_left() {
    let left = CountingTransducer::new();
    let pipeline = bimap(left.clone(), map(|a: i32| a + 1));

    let result = apply_one(&pipeline, Either::<String, i32>::Right(5)).await;
    assert!(matches!(result, Prim::One(Either::Right(6))));
    assert_eq!(left.call_count(), 0);
}

#[tokio::test]
async fn test_kleisli_left_is_retagged_without_running_second() {
    let second = CountingTransducer::new();
    let pipeline = and_then(
        map(|_: i32| Either::<&str, i32>::Left("missing")),
        compose(second.clone(), map(|a: i32| Either::<&str, bool>::Right(a > 0))),
    );

    let result: Prim<Either<&str, bool>> = apply_one(&pipeline, 1).await;
    assert!(matches!(result, Prim::One(Either::Left("missing"))));
    assert_eq!(second.call_count(), 0);
}
