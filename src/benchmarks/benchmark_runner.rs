//! Core benchmark execution logic.

use log::{debug, info, warn};
use std::collections::BTreeMap;

use super::benchmark_errors::{BenchmarkError, BenchmarkResult};
use super::benchmark_types::{BenchmarkRecord, Measurement, ReportEntry, RunSettings};
use super::performance_metrics::time_kernel;
use crate::backends::Backend;
use crate::operators::{Mode, Operator, OperatorRegistry};
use crate::report::aggregator::aggregate;
use crate::tensor::Tensor;
use crate::toolkits::{Configuration, Toolkit, ToolkitRegistry};

/// Output deviation from the reference backend above which a warning is
/// logged, relative to `max(1, max |reference|)`.
pub const DEVIATION_TOLERANCE: f64 = 1e-3;

/// Whether `deviation` is above [`DEVIATION_TOLERANCE`] scaled by the
/// magnitude of the reference outputs.
pub fn exceeds_tolerance(deviation: f64, reference: &[Tensor]) -> bool {
    let scale = reference
        .iter()
        .flat_map(|t| t.data().iter())
        .fold(1.0f64, |acc, v| acc.max(f64::from(v.abs())));
    deviation > DEVIATION_TOLERANCE * scale
}

/// Benchmarks `operator` under every configuration, producing one record per
/// configuration in the same order.
///
/// The first entry of `backends` is the reference for output deviations.
pub fn run_operator_benchmark(
    operator: &dyn Operator,
    configurations: &[Configuration],
    backends: &[Backend],
    settings: &RunSettings,
) -> BenchmarkResult<Vec<BenchmarkRecord>> {
    settings.validate()?;
    Ok(configurations
        .iter()
        .map(|configuration| benchmark_configuration(operator, configuration, backends, settings))
        .collect())
}

/// Benchmarks `operator` under one configuration on every backend.
///
/// Backends without a kernel for the mode, and backends whose kernel fails,
/// get a `None` timing; neither aborts the run.
pub fn benchmark_configuration(
    operator: &dyn Operator,
    configuration: &Configuration,
    backends: &[Backend],
    settings: &RunSettings,
) -> BenchmarkRecord {
    let inputs = configuration.inputs(settings.random_inputs);
    let upstream = match settings.mode {
        Mode::Forward => None,
        Mode::Backward => upstream_gradient(operator, &inputs, backends),
    };

    let mut record = BenchmarkRecord::new();
    let mut outputs: Vec<(Backend, Vec<Tensor>)> = Vec::new();

    for &backend in backends {
        match measure_backend(operator, backend, &inputs, upstream.as_ref(), settings) {
            Some((measurement, output)) => {
                debug!(
                    "`{}` {} on {}: {:.6} ms",
                    operator.name(),
                    settings.mode,
                    backend,
                    measurement.mean_ms()
                );
                record.insert(backend, Some(measurement));
                outputs.push((backend, output));
            }
            None => record.insert(backend, None),
        }
    }

    if let Some(reference) = backends.first() {
        record_deviations(operator, *reference, &outputs, &mut record);
    }
    record
}

fn measure_backend(
    operator: &dyn Operator,
    backend: Backend,
    inputs: &[Tensor],
    upstream: Option<&Tensor>,
    settings: &RunSettings,
) -> Option<(Measurement, Vec<Tensor>)> {
    let result = match settings.mode {
        Mode::Forward => {
            let Some(forward) = operator.forward(backend) else {
                debug!("`{}` has no forward kernel on {}", operator.name(), backend);
                return None;
            };
            time_kernel(settings, || forward(inputs))
                .map(|(m, output)| (m, output.map(|t| vec![t]).unwrap_or_default()))
        }
        Mode::Backward => {
            let Some(backward) = operator.backward(backend) else {
                debug!("`{}` has no backward kernel on {}", operator.name(), backend);
                return None;
            };
            let grad = upstream?;
            time_kernel(settings, || backward(inputs, grad))
                .map(|(m, output)| (m, output.unwrap_or_default()))
        }
    };

    match result {
        Ok(measured) => Some(measured),
        Err(e) => {
            warn!(
                "`{}` {} failed on {}: {}",
                operator.name(),
                settings.mode,
                backend,
                e
            );
            None
        }
    }
}

/// Gradient of ones shaped like the forward output, computed through the
/// first backend able to run the forward pass.
fn upstream_gradient(operator: &dyn Operator, inputs: &[Tensor], backends: &[Backend]) -> Option<Tensor> {
    let candidates = backends.iter().chain(Backend::ALL.iter());
    for &backend in candidates {
        if let Some(forward) = operator.forward(backend) {
            match forward(inputs) {
                Ok(output) => return Some(Tensor::ones(output.shape())),
                Err(e) => debug!("forward on {} failed while shaping gradient: {}", backend, e),
            }
        }
    }
    warn!(
        "`{}` has no working forward kernel; backward runs are skipped",
        operator.name()
    );
    None
}

fn record_deviations(
    operator: &dyn Operator,
    reference: Backend,
    outputs: &[(Backend, Vec<Tensor>)],
    record: &mut BenchmarkRecord,
) {
    let Some((_, expected)) = outputs.iter().find(|(b, _)| *b == reference) else {
        return;
    };
    for (backend, actual) in outputs {
        let deviation = if actual.len() != expected.len() {
            f64::INFINITY
        } else {
            expected
                .iter()
                .zip(actual.iter())
                .map(|(e, a)| e.max_abs_diff(a))
                .fold(0.0, f64::max)
        };
        if exceeds_tolerance(deviation, expected) {
            warn!(
                "`{}` output on {} deviates from {} by {:.3e}",
                operator.name(),
                backend,
                reference,
                deviation
            );
        }
        record.insert_deviation(*backend, deviation);
    }
}

/// Runs benchmarks for the toolkits of a [`ToolkitRegistry`].
pub struct BenchmarkRunner<'a> {
    operators: &'a OperatorRegistry,
    toolkits: &'a ToolkitRegistry,
}

impl<'a> BenchmarkRunner<'a> {
    pub fn new(operators: &'a OperatorRegistry, toolkits: &'a ToolkitRegistry) -> Self {
        Self {
            operators,
            toolkits,
        }
    }

    fn operator_for(&self, toolkit: &Toolkit) -> BenchmarkResult<&'a dyn Operator> {
        self.operators
            .get(&toolkit.operator)
            .ok_or_else(|| BenchmarkError::UnknownOperator {
                name: toolkit.operator.clone(),
            })
    }

    /// Benchmarks one configuration set of one toolkit on the mode's default backends.
    pub fn run_config_set(
        &self,
        toolkit_name: &str,
        set_id: &str,
        settings: &RunSettings,
    ) -> BenchmarkResult<Vec<ReportEntry>> {
        let toolkit = self.toolkits.get(toolkit_name).ok_or_else(|| BenchmarkError::UnknownToolkit {
            name: toolkit_name.to_string(),
        })?;
        let set = toolkit.config_set(settings.mode, set_id).ok_or_else(|| {
            BenchmarkError::UnknownConfigSet {
                toolkit: toolkit_name.to_string(),
                set: set_id.to_string(),
                mode: settings.mode.to_string(),
            }
        })?;
        let operator = self.operator_for(toolkit)?;
        let records = run_operator_benchmark(
            operator,
            &set.configurations,
            settings.mode.default_backends(),
            settings,
        )?;
        aggregate(&set.configurations, records)
    }

    /// Benchmarks every configuration set of `toolkit` for the settings' mode.
    pub fn run_toolkit(&self, toolkit: &Toolkit, settings: &RunSettings) -> BenchmarkResult<Vec<ReportEntry>> {
        let operator = self.operator_for(toolkit)?;
        let configurations: Vec<Configuration> = toolkit
            .sets(settings.mode)
            .iter()
            .flat_map(|set| set.configurations.iter().cloned())
            .collect();
        let records = run_operator_benchmark(
            operator,
            &configurations,
            settings.mode.default_backends(),
            settings,
        )?;
        aggregate(&configurations, records)
    }

    /// Benchmarks every toolkit, keyed by toolkit name.
    pub fn run_all_operators(&self, settings: &RunSettings) -> BenchmarkResult<BTreeMap<String, Vec<ReportEntry>>> {
        settings.validate()?;
        let mut results = BTreeMap::new();
        for toolkit in self.toolkits.iter() {
            if toolkit.sets(settings.mode).is_empty() {
                continue;
            }
            let entries = self.run_toolkit(toolkit, settings)?;
            info!("Done benchmark for `{}`!", toolkit.name);
            results.insert(toolkit.name.clone(), entries);
        }
        Ok(results)
    }

    pub fn list_operators(&self) {
        println!("Available operators:");
        for toolkit in self.toolkits.iter() {
            println!(
                "  {:<10} forward sets: {:?}, backward sets: {:?}",
                toolkit.name,
                toolkit.set_ids(Mode::Forward),
                toolkit.set_ids(Mode::Backward)
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tolerance_scales_with_reference_magnitude() {
        let small = vec![Tensor::filled(&[4], 0.5)];
        assert!(!exceeds_tolerance(5e-4, &small));
        assert!(exceeds_tolerance(2e-3, &small));

        let large = vec![Tensor::filled(&[2, 2], 4096.0)];
        assert!(!exceeds_tolerance(2.0, &large));
        assert!(exceeds_tolerance(5.0, &large));
        assert!(exceeds_tolerance(f64::INFINITY, &large));
    }
}
