//! Structured error types for the Ductus ecosystem.

use thiserror::Error;

/// Unified error type for all Ductus operations.
#[derive(Debug, Error)]
pub enum DuctusError {
    /// Training data cannot support a well-defined model (degenerate
    /// Gaussian, state without observations, malformed parameter tables)
    #[error("configuration error: {0}")]
    Config(String),

    /// A decode or probability query was attempted before training completed
    #[error("model not trained: {0}")]
    NotTrained(String),

    /// Malformed call arguments (empty sequences, mismatched lengths,
    /// out-of-range values)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A discrete feature value with no entry in the injected value index
    #[error("lookup error: {0}")]
    Lookup(String),
}

/// Convenience alias used throughout the Ductus ecosystem.
pub type Result<T> = std::result::Result<T, DuctusError>;
