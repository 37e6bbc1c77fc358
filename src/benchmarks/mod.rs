//! Benchmark harness for comparing operator backends.
//!
//! Times every backend's kernel for an operator under each configuration and
//! collects the results into records consumed by the console analysis and
//! by the chart reports.

pub mod benchmark_errors;
pub mod benchmark_runner;
pub mod benchmark_types;
pub mod performance_metrics;

pub use benchmark_errors::{BenchmarkError, BenchmarkResult};
pub use benchmark_runner::{
    BenchmarkRunner, DEVIATION_TOLERANCE, benchmark_configuration, exceeds_tolerance, run_operator_benchmark,
};
pub use benchmark_types::{BenchmarkRecord, Measurement, ReportEntry, RunSettings};
pub use performance_metrics::{print_performance_analysis, time_kernel};
