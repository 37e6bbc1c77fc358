//! Error types for operator execution.
//!
//! Harness-level failures (settings, configuration files, workers) live in
//! [`crate::benchmarks::BenchmarkError`]; this module only covers what a
//! backend kernel can report while running.

mod op_error;

pub use op_error::OpError;

/// Result type alias for kernel invocations.
pub type OpResult<T> = std::result::Result<T, OpError>;
