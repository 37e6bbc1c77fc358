//! Cross-backend benchmarking of numerical array operators.
//!
//! Each operator (add, multiply, exp, tanh, sum, matmul) is implemented on
//! several backends: naive scalar loops, `ndarray`, and `rayon` parallel
//! loops. The harness times forward and backward kernels per backend under
//! configurable input shapes, and renders the speedups over a baseline
//! backend as bar charts embedded in RST report pages.

pub mod backends;
pub mod benchmarks;
pub mod errors;
pub mod operators;
pub mod report;
pub mod tensor;
pub mod toolkits;

pub use backends::{Backend, Device};
pub use benchmarks::{BenchmarkError, BenchmarkRecord, BenchmarkResult, BenchmarkRunner, RunSettings};
pub use errors::{OpError, OpResult};
pub use operators::{Mode, Operator, OperatorRegistry};
pub use tensor::Tensor;
pub use toolkits::{ConfigSet, Configuration, Toolkit, ToolkitRegistry};
