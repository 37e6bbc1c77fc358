use crate::benchmarks::{BenchmarkError, BenchmarkRecord, BenchmarkResult, ReportEntry};
use crate::toolkits::Configuration;

/// Pairs each configuration with its record, preserving order.
pub fn aggregate(
    configurations: &[Configuration],
    records: Vec<BenchmarkRecord>,
) -> BenchmarkResult<Vec<ReportEntry>> {
    if configurations.len() != records.len() {
        return Err(BenchmarkError::RecordCountMismatch {
            configurations: configurations.len(),
            records: records.len(),
        });
    }
    Ok(configurations
        .iter()
        .cloned()
        .zip(records)
        .map(|(configuration, record)| ReportEntry {
            configuration,
            record,
        })
        .collect())
}
