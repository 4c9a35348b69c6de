//! Shared primitives for the Ductus sketch-understanding ecosystem.
//!
//! `ductus-core` provides the foundation that the other Ductus crates
//! build on:
//!
//! - **Error types** — [`DuctusError`] and [`Result`] for structured error handling
//! - **Probability** — [`LogProb`] for underflow-free log-space accumulation

pub mod error;
pub mod prob;

pub use error::{DuctusError, Result};
pub use prob::LogProb;
