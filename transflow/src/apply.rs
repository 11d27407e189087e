//! Entry points that run a pipeline on one input and collect its outputs.
//!
//! Every entry point cleans the resource registry of the run context it used
//! before returning. Cleanup also runs when the pipeline panics or when the
//! returned future is dropped mid-run.

use crate::context::{CleanupGuard, RunContext, TState};
use crate::core::{Prim, Reduced};
use crate::transducer::{capture_all, reducer_fn, Transducer};
use tracing::{debug, trace};

fn settle<V, B>(outcome: Reduced<V>, into_prim: impl FnOnce(V) -> Prim<B>) -> Prim<B> {
    match outcome {
        Reduced::Continue(values) | Reduced::Complete(values) => into_prim(values),
        Reduced::Fail(err) => Prim::Fail(err),
        Reduced::Alt(alt) => {
            debug!(type_name = alt.type_name(), "Run ended on an alternate value");
            Prim::Fail(alt.into_error())
        }
    }
}

/// Runs `transducer` on `input` in a fresh context, collecting every output.
pub async fn apply_many<A, B, T>(transducer: &T, input: A) -> Prim<B>
where
    A: Send + 'static,
    B: Send + 'static,
    T: Transducer<A, B>,
{
    apply_many_with(transducer, input, RunContext::new()).await
}

/// Runs `transducer` on `input` within `context`, collecting every output.
///
/// The context's registry is cleaned before this returns.
pub async fn apply_many_with<A, B, T>(transducer: &T, input: A, context: RunContext) -> Prim<B>
where
    A: Send + 'static,
    B: Send + 'static,
    T: Transducer<A, B>,
{
    let _guard = CleanupGuard::new(context.resources());
    trace!(run_id = %context.identity().run_id, "Applying pipeline (many)");

    let mut reducer = transducer.transform(capture_all());
    let outcome = reducer.run(TState::with_context(context, Vec::new()), input).await;
    settle(outcome, Prim::from)
}

/// Runs `transducer` on `input` in a fresh context, keeping the first output.
///
/// The run stops as soon as one value has been produced.
pub async fn apply_one<A, B, T>(transducer: &T, input: A) -> Prim<B>
where
    A: Send + 'static,
    B: Send + 'static,
    T: Transducer<A, B>,
{
    apply_one_with(transducer, input, RunContext::new()).await
}

/// Runs `transducer` on `input` within `context`, keeping the first output.
pub async fn apply_one_with<A, B, T>(transducer: &T, input: A, context: RunContext) -> Prim<B>
where
    A: Send + 'static,
    B: Send + 'static,
    T: Transducer<A, B>,
{
    let _guard = CleanupGuard::new(context.resources());
    trace!(run_id = %context.identity().run_id, "Applying pipeline (one)");

    let mut reducer = transducer.transform(reducer_fn(|_state: TState<Option<B>>, value: B| {
        Reduced::Complete(Some(value))
    }));
    let outcome = reducer.run(TState::with_context(context, None), input).await;
    settle(outcome, Prim::from)
}

/// Blocking bridges for synchronous callers.
///
/// These drive the pipeline on the current thread. Pipelines that wait on the
/// tokio timer (scheduled retries with the default sleeper) need the async
/// entry points instead.
pub mod blocking {
    use crate::core::Prim;
    use crate::transducer::Transducer;

    /// Blocking form of [`apply_many`](super::apply_many).
    pub fn apply_many<A, B, T>(transducer: &T, input: A) -> Prim<B>
    where
        A: Send + 'static,
        B: Send + 'static,
        T: Transducer<A, B>,
    {
        futures::executor::block_on(super::apply_many(transducer, input))
    }

    /// Blocking form of [`apply_one`](super::apply_one).
    pub fn apply_one<A, B, T>(transducer: &T, input: A) -> Prim<B>
    where
        A: Send + 'static,
        B: Send + 'static,
        T: Transducer<A, B>,
    {
        futures::executor::block_on(super::apply_one(transducer, input))
    }
}
