//! arraybench command line.
//!
//! Without a subcommand, runs the report sweep: for every toolkit, writes its
//! RST page under `<root>/doc/reports/` and renders one speedup chart per
//! configuration set under `<root>/doc/_static/temp/`.
//!
//! ```bash
//! arraybench --warmup 10 --runs 25 --info "Xeon 8175M" --device cpu:8
//! arraybench --full-update --in-process
//! arraybench bench --mode backward --operator matmul
//! arraybench list
//! ```

use arraybench::benchmarks::{BenchmarkResult, BenchmarkRunner, RunSettings, print_performance_analysis};
use arraybench::operators::{Mode, OperatorRegistry};
use arraybench::report::generator::{ChartJob, ReportGenerator, ReportPaths, ReportSettings, generate_one_html};
use arraybench::report::worker::{InProcessWorker, SubprocessWorker};
use arraybench::{BenchmarkError, Device, ToolkitRegistry};
use clap::{Args, Parser, Subcommand};
use log::{error, info};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "arraybench")]
#[command(about = "Benchmark array operators across backends and generate speedup reports")]
#[command(version, args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    report: ReportArgs,
}

/// Where toolkits are read from and reports are written to.
#[derive(Args, Debug, Clone)]
struct PathArgs {
    /// Toolkit configuration file; built-in toolkits are used when missing
    #[arg(long, default_value = "configs/toolkits.json")]
    toolkits: PathBuf,

    /// Directory containing `doc/`
    #[arg(long, default_value = ".")]
    root: PathBuf,
}

#[derive(Args, Debug, Clone)]
struct TimingArgs {
    /// Untimed invocations per backend before measuring
    #[arg(long, default_value_t = 10)]
    warmup: u32,

    /// Timed samples per backend
    #[arg(long, default_value_t = 25)]
    runs: u32,

    /// Back-to-back invocations per timed sample
    #[arg(long, default_value_t = 1)]
    repeat: u32,
}

#[derive(Args, Debug)]
struct ReportArgs {
    #[command(flatten)]
    timing: TimingArgs,

    /// Free-form text appended to chart titles (machine, build, ...)
    #[arg(long, allow_hyphen_values = true)]
    info: Option<String>,

    /// `cpu` or `cpu:<threads>`
    #[arg(long, default_value = "cpu")]
    device: Device,

    /// Regenerate reports whose RST page already exists
    #[arg(long = "full_update", alias = "full-update")]
    full_update: bool,

    /// Render charts in this process instead of one worker process per chart
    #[arg(long)]
    in_process: bool,

    #[command(flatten)]
    paths: PathArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Benchmark operators and print the analysis to the console
    Bench {
        #[arg(long, default_value = "forward")]
        mode: Mode,

        /// Only this toolkit; all toolkits otherwise
        #[arg(long)]
        operator: Option<String>,

        /// Seeded random inputs instead of the deterministic pattern
        #[arg(long)]
        random: bool,

        /// Also write the results as JSON
        #[arg(long)]
        json: Option<PathBuf>,

        #[command(flatten)]
        timing: TimingArgs,

        #[command(flatten)]
        paths: PathArgs,
    },

    /// List toolkits and their configuration sets
    List {
        #[command(flatten)]
        paths: PathArgs,
    },

    /// Render a single chart; spawned by the report sweep
    #[command(hide = true)]
    RenderOne {
        #[arg(long)]
        toolkit: String,

        #[arg(long)]
        set: String,

        #[arg(long)]
        mode: Mode,

        #[arg(long, allow_hyphen_values = true)]
        info: Option<String>,

        #[arg(long, default_value = "cpu")]
        device: Device,

        #[command(flatten)]
        timing: TimingArgs,

        #[command(flatten)]
        paths: PathArgs,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        error!("arraybench failed: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> BenchmarkResult<()> {
    let operators = OperatorRegistry::builtin();

    match cli.command {
        None => run_report_sweep(&operators, cli.report),
        Some(Command::Bench {
            mode,
            operator,
            random,
            json,
            timing,
            paths,
        }) => {
            let toolkits = ToolkitRegistry::load_or_default(&paths.toolkits, &operators)?;
            let settings = RunSettings::new(mode, timing.warmup, timing.runs)
                .with_repeat(timing.repeat)
                .with_random_inputs(random);
            let runner = BenchmarkRunner::new(&operators, &toolkits);

            let results = match operator {
                Some(name) => {
                    let toolkit = toolkits
                        .get(&name)
                        .ok_or(BenchmarkError::UnknownToolkit { name: name.clone() })?;
                    let mut results = BTreeMap::new();
                    results.insert(name, runner.run_toolkit(toolkit, &settings)?);
                    results
                }
                None => runner.run_all_operators(&settings)?,
            };

            for (name, entries) in &results {
                print_performance_analysis(name, entries, mode.default_backends());
            }
            if let Some(path) = json {
                let content = serde_json::to_string_pretty(&results).map_err(io::Error::from)?;
                fs::write(&path, content)?;
                info!("Wrote results to {}", path.display());
            }
            Ok(())
        }
        Some(Command::List { paths }) => {
            let toolkits = ToolkitRegistry::load_or_default(&paths.toolkits, &operators)?;
            BenchmarkRunner::new(&operators, &toolkits).list_operators();
            Ok(())
        }
        Some(Command::RenderOne {
            toolkit,
            set,
            mode,
            info,
            device,
            timing,
            paths,
        }) => {
            device.pin()?;
            let toolkits = ToolkitRegistry::load_or_default(&paths.toolkits, &operators)?;
            let job = ChartJob {
                toolkit,
                set,
                mode,
                warmup: timing.warmup,
                runs: timing.runs,
                repeat: timing.repeat,
                info,
                device,
            };
            let html_file = generate_one_html(&job, &operators, &toolkits, &ReportPaths::from_root(&paths.root))?;
            info!("Wrote {}", html_file.display());
            Ok(())
        }
    }
}

fn run_report_sweep(operators: &OperatorRegistry, args: ReportArgs) -> BenchmarkResult<()> {
    let toolkits = ToolkitRegistry::load_or_default(&args.paths.toolkits, operators)?;
    let paths = ReportPaths::from_root(&args.paths.root);
    let settings = ReportSettings {
        warmup: args.timing.warmup,
        runs: args.timing.runs,
        repeat: args.timing.repeat,
        info: args.info,
        device: args.device,
        full_update: args.full_update,
    };

    info!(
        "Generating reports for {} toolkits into {}",
        toolkits.len(),
        paths.reports_dir.display()
    );

    let generated = if args.in_process {
        args.device.pin()?;
        let worker = InProcessWorker::new(operators, &toolkits, paths.clone());
        ReportGenerator::new(&toolkits, paths, settings, worker).generate_operator_reports()?
    } else {
        let worker = SubprocessWorker::current(args.paths.toolkits.clone(), args.paths.root.clone())?;
        ReportGenerator::new(&toolkits, paths, settings, worker).generate_operator_reports()?
    };

    info!("Generated {} of {} reports", generated, toolkits.len());
    Ok(())
}
