//! Device selection for the process-global rayon thread pool.
//!
//! The rayon global pool can be configured once per process, before its
//! first use. Report workers therefore pin the device at start-up, and the
//! report generator runs each chart in its own worker process.

use std::fmt;
use std::str::FromStr;

use crate::benchmarks::{BenchmarkError, BenchmarkResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Device {
    /// rayon's default pool (one worker per logical core).
    #[default]
    Cpu,
    /// A pool with a fixed number of worker threads.
    CpuThreads(usize),
}

impl Device {
    pub fn threads(self) -> Option<usize> {
        match self {
            Device::Cpu => None,
            Device::CpuThreads(threads) => Some(threads),
        }
    }

    /// Builds the rayon global pool for this device.
    ///
    /// Fails if the global pool was already initialised in this process.
    pub fn pin(self) -> BenchmarkResult<()> {
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(threads) = self.threads() {
            builder = builder.num_threads(threads);
        }
        builder
            .build_global()
            .map_err(|e| BenchmarkError::DevicePinFailed {
                device: self.to_string(),
                message: e.to_string(),
            })?;
        log::debug!(
            "Pinned device {} ({} rayon threads)",
            self,
            rayon::current_num_threads()
        );
        Ok(())
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::CpuThreads(threads) => write!(f, "cpu:{}", threads),
        }
    }
}

impl FromStr for Device {
    type Err = BenchmarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || BenchmarkError::UnknownDevice {
            device: s.to_string(),
        };
        match s.trim().split_once(':') {
            None if s.trim() == "cpu" => Ok(Device::Cpu),
            Some(("cpu", threads)) => match threads.parse::<usize>() {
                Ok(threads) if threads > 0 => Ok(Device::CpuThreads(threads)),
                _ => Err(unknown()),
            },
            _ => Err(unknown()),
        }
    }
}
