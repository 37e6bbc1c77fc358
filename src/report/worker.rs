//! Execution of chart jobs.

use log::{debug, error};
use std::env;
use std::path::PathBuf;
use std::process::Command;

use super::generator::{ChartJob, ReportPaths, generate_one_html};
use crate::benchmarks::{BenchmarkError, BenchmarkResult};
use crate::operators::OperatorRegistry;
use crate::toolkits::ToolkitRegistry;

/// Runs one chart job to completion.
pub trait ReportWorker {
    /// Returns `false` when the job ran but produced no chart.
    fn render(&self, job: &ChartJob) -> BenchmarkResult<bool>;
}

/// Renders jobs in the calling process, on whatever rayon pool it has.
pub struct InProcessWorker<'a> {
    operators: &'a OperatorRegistry,
    toolkits: &'a ToolkitRegistry,
    paths: ReportPaths,
}

impl<'a> InProcessWorker<'a> {
    pub fn new(operators: &'a OperatorRegistry, toolkits: &'a ToolkitRegistry, paths: ReportPaths) -> Self {
        Self {
            operators,
            toolkits,
            paths,
        }
    }
}

impl ReportWorker for InProcessWorker<'_> {
    fn render(&self, job: &ChartJob) -> BenchmarkResult<bool> {
        let path = generate_one_html(job, self.operators, self.toolkits, &self.paths)?;
        debug!("Rendered {} to {}", job.describe(), path.display());
        Ok(true)
    }
}

/// Renders each job in a fresh child process running the hidden
/// `render-one` subcommand, which pins the job's device first.
///
/// Children run one at a time and are awaited before the next job starts.
pub struct SubprocessWorker {
    program: PathBuf,
    toolkits_path: PathBuf,
    root: PathBuf,
}

impl SubprocessWorker {
    pub fn new(program: PathBuf, toolkits_path: PathBuf, root: PathBuf) -> Self {
        Self {
            program,
            toolkits_path,
            root,
        }
    }

    /// Worker re-invoking the running executable.
    pub fn current(toolkits_path: PathBuf, root: PathBuf) -> BenchmarkResult<Self> {
        Ok(Self::new(env::current_exe()?, toolkits_path, root))
    }

    pub fn command(&self, job: &ChartJob) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg("render-one")
            .arg("--toolkit")
            .arg(&job.toolkit)
            .arg("--set")
            .arg(&job.set)
            .arg("--mode")
            .arg(job.mode.identifier())
            .arg("--warmup")
            .arg(job.warmup.to_string())
            .arg("--runs")
            .arg(job.runs.to_string())
            .arg("--repeat")
            .arg(job.repeat.to_string())
            .arg("--device")
            .arg(job.device.to_string())
            .arg("--toolkits")
            .arg(&self.toolkits_path)
            .arg("--root")
            .arg(&self.root);
        // One token, so an info starting with `-` is not read as a flag.
        if let Some(info) = &job.info {
            command.arg(format!("--info={}", info));
        }
        command
    }
}

impl ReportWorker for SubprocessWorker {
    fn render(&self, job: &ChartJob) -> BenchmarkResult<bool> {
        debug!("Spawning worker for {}", job.describe());
        let status = self
            .command(job)
            .status()
            .map_err(|source| BenchmarkError::WorkerSpawnError {
                job: job.describe(),
                source,
            })?;
        if !status.success() {
            error!("Worker for {} failed with {}", job.describe(), status);
        }
        Ok(status.success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::Device;
    use crate::operators::Mode;

    #[test]
    fn test_command_line() {
        let worker = SubprocessWorker::new(
            PathBuf::from("/bin/arraybench"),
            PathBuf::from("configs/toolkits.json"),
            PathBuf::from("."),
        );
        let job = ChartJob {
            toolkit: "matmul".to_string(),
            set: "large".to_string(),
            mode: Mode::Forward,
            warmup: 2,
            runs: 3,
            repeat: 1,
            info: Some("ci".to_string()),
            device: Device::CpuThreads(4),
        };
        let command = worker.command(&job);
        let args: Vec<String> = command
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(command.get_program(), "/bin/arraybench");
        assert_eq!(args[0], "render-one");
        assert!(args.windows(2).any(|w| w == ["--device", "cpu:4"]));
        assert!(args.windows(2).any(|w| w == ["--mode", "forward"]));
        assert_eq!(args.last().map(String::as_str), Some("--info=ci"));

        let hyphenated = ChartJob {
            info: Some("-O3 build".to_string()),
            ..job
        };
        let args: Vec<String> = worker
            .command(&hyphenated)
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(args.last().map(String::as_str), Some("--info=-O3 build"));
        assert!(!args.iter().any(|a| a == "-O3 build"));
    }

    #[test]
    fn test_spawn_failure_is_an_error() {
        let worker = SubprocessWorker::new(
            PathBuf::from("/nonexistent/arraybench-worker"),
            PathBuf::from("toolkits.json"),
            PathBuf::from("."),
        );
        let job = ChartJob {
            toolkit: "add".to_string(),
            set: "small".to_string(),
            mode: Mode::Forward,
            warmup: 0,
            runs: 1,
            repeat: 1,
            info: None,
            device: Device::Cpu,
        };
        assert!(matches!(
            worker.render(&job),
            Err(BenchmarkError::WorkerSpawnError { .. })
        ));
    }
}
