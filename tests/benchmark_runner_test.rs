//! Integration tests for the benchmark runner.
//!
//! Runs real kernels with tiny shapes and a single timed sample, plus a few
//! hand-written operators to exercise missing and failing kernels.

use arraybench::backends::Backend;
use arraybench::benchmarks::{
    BenchmarkError, BenchmarkRunner, DEVIATION_TOLERANCE, RunSettings, benchmark_configuration,
    run_operator_benchmark,
};
use arraybench::errors::{OpError, OpResult};
use arraybench::operators::{ForwardFn, Mode, Operator, OperatorRegistry};
use arraybench::report::aggregate;
use arraybench::report::chart::BarChart;
use arraybench::tensor::Tensor;
use arraybench::toolkits::{ConfigSet, Configuration, Toolkit, ToolkitRegistry};

fn quick(mode: Mode) -> RunSettings {
    RunSettings::new(mode, 0, 1)
}

fn identity(inputs: &[Tensor]) -> OpResult<Tensor> {
    Ok(inputs[0].clone())
}

fn always_fails(inputs: &[Tensor]) -> OpResult<Tensor> {
    Err(OpError::InvalidShape {
        shape: inputs[0].shape().to_vec(),
        len: 0,
    })
}

/// Forward-only operator: works on the scalar backend, fails on ndarray,
/// missing on rayon.
struct Flaky;

impl Operator for Flaky {
    fn name(&self) -> &'static str {
        "flaky"
    }

    fn arity(&self) -> usize {
        1
    }

    fn forward(&self, backend: Backend) -> Option<ForwardFn> {
        match backend {
            Backend::Scalar => Some(identity),
            Backend::Ndarray => Some(always_fails),
            Backend::Rayon => None,
        }
    }
}

#[cfg(test)]
mod benchmark_runner_tests {
    use super::*;

    #[test]
    fn test_add_end_to_end() {
        let operators = OperatorRegistry::builtin();
        let add = operators.get("add").unwrap();
        let configurations = vec![Configuration::new(vec![vec![4, 4], vec![4, 4]])];

        let records = run_operator_benchmark(
            add,
            &configurations,
            Mode::Forward.default_backends(),
            &quick(Mode::Forward),
        )
        .unwrap();

        assert_eq!(records.len(), 1);
        for &backend in Mode::Forward.default_backends() {
            let (mean, std_dev) = records[0].pair(backend);
            assert!(mean.unwrap() >= 0.0);
            assert_eq!(std_dev, Some(0.0));
            assert!(records[0].deviation(backend).unwrap() <= DEVIATION_TOLERANCE);
        }

        let entries = aggregate(&configurations, records).unwrap();
        assert_eq!(entries.len(), 1);
        let backends = Mode::Forward.default_backends();
        let chart = BarChart::build("add", &entries, backends, Mode::Forward, None);
        assert_eq!(chart.bars.len(), backends.len());
        assert_eq!(chart.bars[0].backend, Backend::Scalar);
        assert_eq!(chart.bars[0].value, 1.0);
        assert_eq!(chart.groups, vec!["config1"]);
    }

    #[test]
    fn test_missing_backward_kernel_is_none() {
        let flaky = Flaky;
        let configurations = vec![Configuration::new(vec![vec![3]])];
        let records = run_operator_benchmark(
            &flaky,
            &configurations,
            Mode::Backward.default_backends(),
            &quick(Mode::Backward),
        )
        .unwrap();

        for &backend in Mode::Backward.default_backends() {
            assert_eq!(records[0].pair(backend), (None, None));
        }
    }

    #[test]
    fn test_failing_kernel_is_contained() {
        let configuration = Configuration::new(vec![vec![2, 3]]);
        let record = benchmark_configuration(&Flaky, &configuration, &Backend::ALL, &quick(Mode::Forward));

        assert!(record.latency(Backend::Scalar).is_some());
        assert_eq!(record.pair(Backend::Ndarray), (None, None));
        assert_eq!(record.pair(Backend::Rayon), (None, None));
        assert_eq!(record.deviation(Backend::Scalar), Some(0.0));
        assert_eq!(record.deviation(Backend::Ndarray), None);
    }

    #[test]
    fn test_matmul_backward_only_on_ndarray() {
        let operators = OperatorRegistry::builtin();
        let configuration = Configuration::new(vec![vec![3, 4], vec![4, 2]]);
        let record = benchmark_configuration(
            operators.get("matmul").unwrap(),
            &configuration,
            Mode::Backward.default_backends(),
            &quick(Mode::Backward),
        );
        assert!(record.latency(Backend::Ndarray).is_some());
        assert_eq!(record.pair(Backend::Rayon), (None, None));
    }

    #[test]
    fn test_backends_agree_in_both_modes() {
        let operators = OperatorRegistry::builtin();
        let toolkits = ToolkitRegistry::builtin();
        for name in operators.names() {
            let operator = operators.get(name).unwrap();
            let configuration = &toolkits.get(name).unwrap().forward_sets[0].configurations[0];
            for mode in [Mode::Forward, Mode::Backward] {
                let settings = quick(mode).with_random_inputs(true);
                let record = benchmark_configuration(operator, configuration, mode.default_backends(), &settings);
                for backend in record.backends() {
                    if let Some(deviation) = record.deviation(backend) {
                        let scale = if name == "matmul" || name == "sum" { 1e3 } else { 1.0 };
                        assert!(
                            deviation <= DEVIATION_TOLERANCE * scale,
                            "{} {} on {} deviates by {}",
                            name,
                            mode,
                            backend,
                            deviation
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_entries_follow_configuration_order() {
        let operators = OperatorRegistry::builtin();
        let shapes = [vec![2], vec![5, 1], vec![3, 3]];
        let toolkits = ToolkitRegistry {
            toolkits: vec![Toolkit::new(
                "exp",
                vec![ConfigSet::new(
                    "tiny",
                    shapes.iter().map(|s| Configuration::new(vec![s.clone()])).collect(),
                )],
                vec![],
            )],
        };
        let runner = BenchmarkRunner::new(&operators, &toolkits);
        let entries = runner.run_config_set("exp", "tiny", &quick(Mode::Forward)).unwrap();

        assert_eq!(entries.len(), 3);
        for (entry, shape) in entries.iter().zip(shapes.iter()) {
            assert_eq!(&entry.configuration.shapes[0], shape);
        }

        let all = runner.run_all_operators(&quick(Mode::Forward)).unwrap();
        assert_eq!(all.keys().collect::<Vec<_>>(), vec!["exp"]);
        assert!(runner.run_all_operators(&quick(Mode::Backward)).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_set_and_invalid_settings() {
        let operators = OperatorRegistry::builtin();
        let toolkits = ToolkitRegistry::builtin();
        let runner = BenchmarkRunner::new(&operators, &toolkits);

        assert!(matches!(
            runner.run_config_set("add", "large", &quick(Mode::Backward)),
            Err(BenchmarkError::UnknownConfigSet { .. })
        ));
        assert!(matches!(
            runner.run_config_set("conv", "small", &quick(Mode::Forward)),
            Err(BenchmarkError::UnknownToolkit { .. })
        ));
        assert!(matches!(
            runner.run_config_set("add", "small", &RunSettings::new(Mode::Forward, 0, 0)),
            Err(BenchmarkError::InvalidSettings { .. })
        ));
    }
}
