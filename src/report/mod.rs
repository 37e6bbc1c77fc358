//! Report pipeline: aggregation of benchmark records, chart rendering and
//! the RST report sweep.

pub mod aggregator;
pub mod chart;
pub mod generator;
pub mod worker;

pub use aggregator::aggregate;
pub use chart::{BarChart, ChartLayout, OutputMode, compute_speedups, render_chart};
pub use generator::{ChartJob, ReportGenerator, ReportPaths, ReportSettings};
pub use worker::{InProcessWorker, ReportWorker, SubprocessWorker};
