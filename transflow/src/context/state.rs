//! Execution state threaded through every stage invocation.

use super::{Resources, RunIdentity};
use crate::cancellation::CancellationToken;
use crate::errors::TransflowError;
use std::sync::Arc;
use std::time::Instant;

/// The part of the execution state that outlives a single accumulator value.
///
/// Cloning is cheap: the registry and the cancellation token are shared.
#[derive(Debug, Clone)]
pub struct RunContext {
    identity: RunIdentity,
    resources: Arc<Resources>,
    cancellation: Arc<CancellationToken>,
    deadline: Option<Instant>,
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RunContext {
    /// Creates a context for a fresh run with an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            identity: RunIdentity::new(),
            resources: Arc::new(Resources::new()),
            cancellation: Arc::new(CancellationToken::new()),
            deadline: None,
        }
    }

    /// Uses an externally owned cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: Arc<CancellationToken>) -> Self {
        self.cancellation = token;
        self
    }

    /// Sets a deadline after which scheduled retries stop.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Returns a context for a nested scope: same run, same token, fresh registry.
    #[must_use]
    pub fn nested_scope(&self) -> Self {
        Self {
            identity: self.identity.nested(),
            resources: Arc::new(Resources::new()),
            cancellation: Arc::clone(&self.cancellation),
            deadline: self.deadline,
        }
    }

    /// Returns the owner identity.
    #[must_use]
    pub fn identity(&self) -> &RunIdentity {
        &self.identity
    }

    /// Returns the resource registry of the current scope.
    #[must_use]
    pub fn resources(&self) -> &Arc<Resources> {
        &self.resources
    }

    /// Returns the cancellation token.
    #[must_use]
    pub fn cancellation(&self) -> &Arc<CancellationToken> {
        &self.cancellation
    }

    /// Returns the deadline, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns the error a stage should fail with if the run must stop now.
    #[must_use]
    pub fn interruption(&self) -> Option<TransflowError> {
        if let Some(reason) = self.cancellation.reason() {
            return Some(TransflowError::Cancelled(reason));
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(TransflowError::DeadlineExceeded),
            _ => None,
        }
    }
}

/// Per-run execution state: the accumulator plus the run context.
#[derive(Debug, Clone)]
pub struct TState<S> {
    value: S,
    context: RunContext,
}

impl<S> TState<S> {
    /// Creates a state for a fresh run.
    #[must_use]
    pub fn new(value: S) -> Self {
        Self {
            value,
            context: RunContext::new(),
        }
    }

    /// Creates a state within an existing context.
    #[must_use]
    pub fn with_context(context: RunContext, value: S) -> Self {
        Self { value, context }
    }

    /// Returns the accumulator.
    #[must_use]
    pub fn value(&self) -> &S {
        &self.value
    }

    /// Consumes the state, returning the accumulator.
    pub fn into_value(self) -> S {
        self.value
    }

    /// Splits the state into its accumulator and context.
    pub fn into_parts(self) -> (S, RunContext) {
        (self.value, self.context)
    }

    /// Returns the run context.
    #[must_use]
    pub fn context(&self) -> &RunContext {
        &self.context
    }

    /// Returns the resource registry of the current scope.
    #[must_use]
    pub fn resources(&self) -> &Arc<Resources> {
        self.context.resources()
    }

    /// Rebinds the accumulator, keeping the same registry.
    pub fn set_value<T>(self, value: T) -> TState<T> {
        TState {
            value,
            context: self.context,
        }
    }

    /// Rebinds the accumulator inside a fresh, empty registry.
    ///
    /// The old registry is left untouched; the caller owns cleaning the new one.
    pub fn set_value_scoped<T>(self, value: T) -> TState<T> {
        TState {
            value,
            context: self.context.nested_scope(),
        }
    }
}
