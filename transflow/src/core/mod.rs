//! Core value types shared by every stage.
//!
//! This module contains:
//! - The result algebra (`Reduced`) a stage reports back with
//! - The primitive container (`Prim`) the apply entry points return
//! - The two-armed `Either` value used by branch-aware pipelines

mod either;
mod prim;
mod reduced;

pub use either::Either;
pub use prim::Prim;
pub use reduced::{AltValue, Reduced};
