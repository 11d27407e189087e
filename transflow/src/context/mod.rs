//! Execution state for pipeline runs.
//!
//! This module provides:
//! - The per-run state (`TState`) threading the accumulator through stages
//! - The shareable run context (identity, resources, cancellation, deadline)
//! - The resource registry backing scoped resource management

mod identity;
mod resources;
mod state;

pub use identity::RunIdentity;
#[cfg(test)]
pub use resources::MockDisposable;
pub(crate) use resources::CleanupGuard;
pub use resources::{Disposable, ResourceKey, Resources};
pub use state::{RunContext, TState};
