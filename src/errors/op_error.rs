//! Error types for operator kernels.

use thiserror::Error;

/// Errors that can occur while a backend kernel executes an operator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OpError {
    #[error("Operator `{operator}` expects {expected} inputs, got {actual}")]
    ArityMismatch {
        operator: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Shape mismatch in `{operator}`: {left:?} vs {right:?}")]
    ShapeMismatch {
        operator: &'static str,
        left: Vec<usize>,
        right: Vec<usize>,
    },

    #[error("Operator `{operator}` requires rank {expected} inputs, got rank {actual}")]
    RankMismatch {
        operator: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid shape {shape:?} for a buffer of {len} elements")]
    InvalidShape { shape: Vec<usize>, len: usize },
}
