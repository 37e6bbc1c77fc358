//! RST report sweep.
//!
//! For every toolkit the generator asks a [`ReportWorker`] to benchmark and
//! render one chart per configuration set into `doc/_static/temp/`, then
//! writes `doc/reports/<name>.rst`, which includes those charts.

use log::{error, info};
use std::fs;
use std::path::{Path, PathBuf};

use super::chart::{OutputMode, render_chart};
use super::worker::ReportWorker;
use crate::backends::Device;
use crate::benchmarks::{BenchmarkError, BenchmarkResult, BenchmarkRunner, RunSettings};
use crate::operators::{Mode, OperatorRegistry};
use crate::toolkits::{Toolkit, ToolkitRegistry};

/// Output directories of a report sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub reports_dir: PathBuf,
    pub assets_dir: PathBuf,
}

impl ReportPaths {
    pub fn from_root<P: AsRef<Path>>(root: P) -> Self {
        let doc = root.as_ref().join("doc");
        Self {
            reports_dir: doc.join("reports"),
            assets_dir: doc.join("_static").join("temp"),
        }
    }

    pub fn rst_path(&self, name: &str) -> PathBuf {
        self.reports_dir.join(format!("{}.rst", name))
    }

    pub fn html_path(&self, name: &str, mode: Mode, set: &str) -> PathBuf {
        self.assets_dir.join(html_file_name(name, mode, set))
    }
}

/// `<name>_f_<set>.html` or `<name>_b_<set>.html`.
pub fn html_file_name(name: &str, mode: Mode, set: &str) -> String {
    format!("{}_{}_{}.html", name, mode.file_tag(), set)
}

/// Content of a toolkit's RST page.
pub fn rst_page(toolkit: &Toolkit) -> String {
    let title = format!("Operator `{}`", toolkit.name);
    let mut page = format!("{}\n{}\n\n", title, "=".repeat(title.len()));
    for mode in [Mode::Forward, Mode::Backward] {
        for set in toolkit.set_ids(mode) {
            page.push_str(&format!(
                ".. include:: /_static/temp/{}\n\n",
                html_file_name(&toolkit.name, mode, set)
            ));
        }
    }
    page
}

/// Wraps an HTML fragment as an RST `raw` directive.
pub fn wrap_raw_html(fragment: &str) -> String {
    let mut wrapped = String::from(".. raw:: html\n\n");
    for line in fragment.lines() {
        wrapped.push_str("    ");
        wrapped.push_str(line);
        wrapped.push('\n');
    }
    wrapped
}

/// Writes the RST page of `toolkit`.
///
/// Returns `true` when the page already exists and `full_update` is off, in
/// which case nothing is written and the toolkit should be skipped.
pub fn generate_one_rst(toolkit: &Toolkit, paths: &ReportPaths, full_update: bool) -> BenchmarkResult<bool> {
    let rst_file = paths.rst_path(&toolkit.name);
    if rst_file.exists() && !full_update {
        return Ok(true);
    }
    fs::create_dir_all(&paths.reports_dir)?;
    fs::write(&rst_file, rst_page(toolkit))?;
    Ok(false)
}

/// One chart to benchmark and render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartJob {
    pub toolkit: String,
    pub set: String,
    pub mode: Mode,
    pub warmup: u32,
    pub runs: u32,
    pub repeat: u32,
    pub info: Option<String>,
    pub device: Device,
}

impl ChartJob {
    /// `"<info>, <set>, forward only"`, or `None` without info.
    pub fn chart_info(&self) -> Option<String> {
        self.info
            .as_deref()
            .filter(|info| !info.is_empty())
            .map(|info| format!("{}, {}, {} only", info, self.set, self.mode))
    }

    pub fn run_settings(&self) -> RunSettings {
        RunSettings::new(self.mode, self.warmup, self.runs).with_repeat(self.repeat)
    }

    pub fn describe(&self) -> String {
        format!("`{}` {} set `{}`", self.toolkit, self.mode, self.set)
    }
}

/// Benchmarks the job's configuration set and writes its chart, wrapped as
/// raw HTML, to the assets directory.
pub fn generate_one_html(
    job: &ChartJob,
    operators: &OperatorRegistry,
    toolkits: &ToolkitRegistry,
    paths: &ReportPaths,
) -> BenchmarkResult<PathBuf> {
    let toolkit = toolkits
        .get(&job.toolkit)
        .ok_or_else(|| BenchmarkError::UnknownToolkit {
            name: job.toolkit.clone(),
        })?;
    let runner = BenchmarkRunner::new(operators, toolkits);
    let entries = runner.run_config_set(&job.toolkit, &job.set, &job.run_settings())?;

    let html_file = paths.html_path(&toolkit.name, job.mode, &job.set);
    let info = job.chart_info();
    let fragment = render_chart(
        &toolkit.name,
        &entries,
        job.mode.default_backends(),
        job.mode,
        info.as_deref(),
        &OutputMode::File(html_file.clone()),
    )?;
    fs::write(&html_file, wrap_raw_html(&fragment))?;
    Ok(html_file)
}

/// Parameters of a report sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSettings {
    pub warmup: u32,
    pub runs: u32,
    pub repeat: u32,
    pub info: Option<String>,
    pub device: Device,
    pub full_update: bool,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            warmup: 10,
            runs: 25,
            repeat: 1,
            info: None,
            device: Device::Cpu,
            full_update: false,
        }
    }
}

pub struct ReportGenerator<'a, W: ReportWorker> {
    toolkits: &'a ToolkitRegistry,
    paths: ReportPaths,
    settings: ReportSettings,
    worker: W,
}

impl<'a, W: ReportWorker> ReportGenerator<'a, W> {
    pub fn new(toolkits: &'a ToolkitRegistry, paths: ReportPaths, settings: ReportSettings, worker: W) -> Self {
        Self {
            toolkits,
            paths,
            settings,
            worker,
        }
    }

    pub fn worker(&self) -> &W {
        &self.worker
    }

    /// Chart jobs of `toolkit`: every forward set, then every backward set.
    pub fn jobs(&self, toolkit: &Toolkit) -> Vec<ChartJob> {
        [Mode::Forward, Mode::Backward]
            .into_iter()
            .flat_map(|mode| {
                toolkit.set_ids(mode).into_iter().map(move |set| ChartJob {
                    toolkit: toolkit.name.clone(),
                    set: set.to_string(),
                    mode,
                    warmup: self.settings.warmup,
                    runs: self.settings.runs,
                    repeat: self.settings.repeat,
                    info: self.settings.info.clone(),
                    device: self.settings.device,
                })
            })
            .collect()
    }

    /// Dispatches the chart jobs of one toolkit, then writes its RST page.
    ///
    /// Returns `false` when the toolkit was skipped because its page exists,
    /// or when a chart failed. The page is only written once every chart
    /// rendered, so a failed toolkit is retried by the next sweep.
    pub fn generate_one_report(&self, toolkit: &Toolkit) -> BenchmarkResult<bool> {
        if self.paths.rst_path(&toolkit.name).exists() && !self.settings.full_update {
            info!("Report for `{}` exists, skipping", toolkit.name);
            return Ok(false);
        }
        let jobs = self.jobs(toolkit);
        let mut failed = 0;
        for job in &jobs {
            if !self.worker.render(job)? {
                failed += 1;
            }
        }
        if failed > 0 {
            error!(
                "{} of {} charts for `{}` failed; its report page was not written",
                failed,
                jobs.len(),
                toolkit.name
            );
            return Ok(false);
        }
        generate_one_rst(toolkit, &self.paths, true)?;
        info!("Done report generation for `{}`!", toolkit.name);
        Ok(true)
    }

    /// Runs the sweep over every toolkit, returning how many were generated.
    pub fn generate_operator_reports(&self) -> BenchmarkResult<usize> {
        RunSettings::new(Mode::Forward, self.settings.warmup, self.settings.runs)
            .with_repeat(self.settings.repeat)
            .validate()?;
        let mut generated = 0;
        for toolkit in self.toolkits.iter() {
            if self.generate_one_report(toolkit)? {
                generated += 1;
            }
        }
        Ok(generated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(info: Option<&str>) -> ChartJob {
        ChartJob {
            toolkit: "add".to_string(),
            set: "small".to_string(),
            mode: Mode::Backward,
            warmup: 0,
            runs: 1,
            repeat: 1,
            info: info.map(str::to_string),
            device: Device::Cpu,
        }
    }

    #[test]
    fn test_paths_and_file_names() {
        let paths = ReportPaths::from_root("/tmp/root");
        assert_eq!(paths.rst_path("add"), PathBuf::from("/tmp/root/doc/reports/add.rst"));
        assert_eq!(
            paths.html_path("add", Mode::Forward, "small"),
            PathBuf::from("/tmp/root/doc/_static/temp/add_f_small.html")
        );
        assert_eq!(html_file_name("exp", Mode::Backward, "large"), "exp_b_large.html");
    }

    #[test]
    fn test_rst_page_layout() {
        let toolkits = ToolkitRegistry::builtin();
        let page = rst_page(toolkits.get("add").unwrap());
        let expected = "Operator `add`\n\
                        ==============\n\
                        \n\
                        .. include:: /_static/temp/add_f_small.html\n\
                        \n\
                        .. include:: /_static/temp/add_f_large.html\n\
                        \n\
                        .. include:: /_static/temp/add_b_small.html\n\
                        \n";
        assert_eq!(page, expected);
    }

    #[test]
    fn test_wrap_raw_html() {
        assert_eq!(
            wrap_raw_html("<div>\n<svg/>\n</div>"),
            ".. raw:: html\n\n    <div>\n    <svg/>\n    </div>\n"
        );
    }

    #[test]
    fn test_chart_info() {
        assert_eq!(
            job(Some("i7, 8 threads")).chart_info().as_deref(),
            Some("i7, 8 threads, small, backward only")
        );
        assert_eq!(job(None).chart_info(), None);
        assert_eq!(job(None).run_settings().mode, Mode::Backward);
    }
}
