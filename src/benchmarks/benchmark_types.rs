//! Benchmark settings and result records.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::benchmark_errors::{BenchmarkError, BenchmarkResult};
use crate::backends::Backend;
use crate::operators::Mode;
use crate::toolkits::Configuration;

/// Parameters of one benchmark run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSettings {
    pub mode: Mode,
    /// Untimed invocations before measuring.
    pub warmup: u32,
    /// Timed samples.
    pub runs: u32,
    /// Back-to-back invocations per timed sample.
    pub repeat: u32,
    /// Seeded random inputs instead of the deterministic pattern.
    pub random_inputs: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            mode: Mode::Forward,
            warmup: 10,
            runs: 25,
            repeat: 1,
            random_inputs: false,
        }
    }
}

impl RunSettings {
    pub fn new(mode: Mode, warmup: u32, runs: u32) -> Self {
        Self {
            mode,
            warmup,
            runs,
            ..Self::default()
        }
    }

    pub fn with_repeat(mut self, repeat: u32) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn with_random_inputs(mut self, random_inputs: bool) -> Self {
        self.random_inputs = random_inputs;
        self
    }

    pub fn validate(&self) -> BenchmarkResult<()> {
        if self.runs == 0 {
            return Err(BenchmarkError::InvalidSettings {
                message: "runs must be greater than 0".to_string(),
            });
        }
        if self.repeat == 0 {
            return Err(BenchmarkError::InvalidSettings {
                message: "repeat must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

/// Per-call latency statistics of one backend, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub mean_secs: f64,
    pub std_dev_secs: f64,
}

impl Measurement {
    /// Mean and population standard deviation of `samples`.
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self {
                mean_secs: 0.0,
                std_dev_secs: 0.0,
            };
        }
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let variance = samples
            .iter()
            .map(|s| {
                let diff = s - mean;
                diff * diff
            })
            .sum::<f64>()
            / n;
        Self {
            mean_secs: mean.max(0.0),
            std_dev_secs: variance.sqrt(),
        }
    }

    pub fn mean_ms(&self) -> f64 {
        self.mean_secs * 1000.0
    }

    pub fn std_dev_ms(&self) -> f64 {
        self.std_dev_secs * 1000.0
    }
}

/// Results of one operator under one configuration, keyed by backend.
///
/// A `None` timing means the backend has no kernel for the operator in the
/// benchmarked mode, or the kernel failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRecord {
    timings: BTreeMap<Backend, Option<Measurement>>,
    deviations: BTreeMap<Backend, f64>,
}

impl BenchmarkRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, backend: Backend, measurement: Option<Measurement>) {
        self.timings.insert(backend, measurement);
    }

    pub fn insert_deviation(&mut self, backend: Backend, deviation: f64) {
        self.deviations.insert(backend, deviation);
    }

    pub fn measurement(&self, backend: Backend) -> Option<Measurement> {
        self.timings.get(&backend).copied().flatten()
    }

    /// `(mean, std_dev)` in seconds, `(None, None)` when unsupported.
    pub fn pair(&self, backend: Backend) -> (Option<f64>, Option<f64>) {
        match self.measurement(backend) {
            Some(m) => (Some(m.mean_secs), Some(m.std_dev_secs)),
            None => (None, None),
        }
    }

    pub fn latency(&self, backend: Backend) -> Option<f64> {
        self.measurement(backend).map(|m| m.mean_secs)
    }

    /// Max absolute difference between this backend's output and the
    /// reference backend's output.
    pub fn deviation(&self, backend: Backend) -> Option<f64> {
        self.deviations.get(&backend).copied()
    }

    pub fn backends(&self) -> impl Iterator<Item = Backend> + '_ {
        self.timings.keys().copied()
    }
}

/// A configuration paired with its benchmark record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub configuration: Configuration,
    pub record: BenchmarkRecord,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_single_sample_has_zero_deviation() {
        let m = Measurement::from_samples(&[0.25]);
        assert_eq!(m.mean_secs, 0.25);
        assert_eq!(m.std_dev_secs, 0.0);
    }

    #[test]
    fn test_population_statistics() {
        let m = Measurement::from_samples(&[1.0, 2.0, 3.0, 4.0]);
        assert_relative_eq!(m.mean_secs, 2.5);
        assert_relative_eq!(m.std_dev_secs, 1.25f64.sqrt());
        assert_relative_eq!(m.mean_ms(), 2500.0);
    }

    #[test]
    fn test_record_pairs() {
        let mut record = BenchmarkRecord::new();
        record.insert(
            Backend::Scalar,
            Some(Measurement {
                mean_secs: 0.5,
                std_dev_secs: 0.1,
            }),
        );
        record.insert(Backend::Rayon, None);
        assert_eq!(record.pair(Backend::Scalar), (Some(0.5), Some(0.1)));
        assert_eq!(record.pair(Backend::Rayon), (None, None));
        assert_eq!(record.pair(Backend::Ndarray), (None, None));
        assert_eq!(
            record.backends().collect::<Vec<_>>(),
            vec![Backend::Scalar, Backend::Rayon]
        );
    }

    #[test]
    fn test_validate_rejects_zero_runs_and_repeat() {
        assert!(RunSettings::default().validate().is_ok());
        assert!(RunSettings::new(Mode::Forward, 0, 0).validate().is_err());
        assert!(RunSettings::default().with_repeat(0).validate().is_err());
    }
}
