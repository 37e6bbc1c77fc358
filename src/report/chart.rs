//! Grouped speedup bar charts rendered as self-contained SVG fragments.
//!
//! Every configuration is one group on the x axis with one bar per backend.
//! A bar's height is the backend's speedup over the baseline (the first
//! backend) for that configuration. Backends that could not be timed, and
//! configurations whose baseline could not be timed, are drawn at a small
//! negative floor so they stand apart from real results.

use std::fmt;
use std::fs;
use std::path::PathBuf;

use crate::backends::Backend;
use crate::benchmarks::{BenchmarkResult, ReportEntry};
use crate::operators::Mode;

/// Speedup of a backend that has no usable timing.
pub const UNSUPPORTED_MARKER: f64 = -1.0;

const MARGIN_LEFT: f64 = 64.0;
const MARGIN_RIGHT: f64 = 24.0;
const MARGIN_TOP: f64 = 48.0;
const MARGIN_BOTTOM: f64 = 72.0;
const Y_TICKS: usize = 5;

/// Where a rendered chart goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMode {
    /// Write the fragment to this path.
    File(PathBuf),
    /// Print the fragment to stdout.
    Inline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartLayout {
    pub width: u32,
    pub height: u32,
}

impl ChartLayout {
    pub fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::Forward => Self {
                width: 800,
                height: 600,
            },
            Mode::Backward => Self {
                width: 700,
                height: 530,
            },
        }
    }
}

/// `baseline / latency`, or [`UNSUPPORTED_MARKER`] when either side is
/// missing or zero.
pub fn speedup(baseline: Option<f64>, latency: Option<f64>) -> f64 {
    match (baseline, latency) {
        (Some(base), Some(lat)) if base > 0.0 && lat > 0.0 => base / lat,
        _ => UNSUPPORTED_MARKER,
    }
}

/// Raw speedups, configuration-major, one per `(entry, backend)` pair.
/// The first backend is the baseline and always gets exactly `1.0`.
pub fn compute_speedups(entries: &[ReportEntry], backends: &[Backend]) -> Vec<f64> {
    let Some(&baseline) = backends.first() else {
        return Vec::new();
    };
    entries
        .iter()
        .flat_map(|entry| {
            let base = entry.record.latency(baseline);
            backends.iter().map(move |&backend| {
                if backend == baseline {
                    1.0
                } else {
                    speedup(base, entry.record.latency(backend))
                }
            })
        })
        .collect()
}

/// `-max(speedups) / 15`, the value non-positive speedups are floored to.
pub fn floor_offset(speedups: &[f64]) -> f64 {
    let max = speedups.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max.is_finite() { -max / 15.0 } else { 0.0 }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub group: usize,
    pub backend: Backend,
    /// Speedup after flooring.
    pub value: f64,
    pub tooltip: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarChart {
    pub title: String,
    pub layout: ChartLayout,
    pub backends: Vec<Backend>,
    pub groups: Vec<String>,
    pub bars: Vec<Bar>,
    pub offset: f64,
}

impl BarChart {
    pub fn build(name: &str, entries: &[ReportEntry], backends: &[Backend], mode: Mode, info: Option<&str>) -> Self {
        let title = match info {
            Some(info) if !info.is_empty() => format!("Operator {} - {}", name, info),
            _ => format!("Operator {}", name),
        };

        let speedups = compute_speedups(entries, backends);
        let offset = floor_offset(&speedups);
        let mut rates = speedups.into_iter();

        let mut bars = Vec::with_capacity(entries.len() * backends.len());
        for (group, entry) in entries.iter().enumerate() {
            for &backend in backends {
                let rate = rates.next().unwrap_or(UNSUPPORTED_MARKER);
                let value = if rate > 0.0 { rate } else { offset };
                bars.push(Bar {
                    group,
                    backend,
                    value,
                    tooltip: tooltip(entry, backend, rate),
                });
            }
        }

        Self {
            title,
            layout: ChartLayout::for_mode(mode),
            backends: backends.to_vec(),
            groups: (1..=entries.len()).map(|i| format!("config{}", i)).collect(),
            bars,
            offset,
        }
    }

    /// Upper end of the y axis.
    fn y_top(&self) -> f64 {
        let max = self.bars.iter().map(|b| b.value).fold(1.0, f64::max);
        max * 1.1
    }

    pub fn to_html(&self) -> String {
        self.to_string()
    }
}

fn tooltip(entry: &ReportEntry, backend: Backend, rate: f64) -> String {
    let mut text = format!("config:\n{}\nbackend: {}\n", entry.configuration.label(), backend);
    match entry.record.measurement(backend) {
        Some(m) => {
            text.push_str(&format!("latency: {:.4} ms\nstd_dev: {:.4} ms\n", m.mean_ms(), m.std_dev_ms()));
        }
        None => text.push_str("latency: n/a\nstd_dev: n/a\n"),
    }
    if rate > 0.0 {
        text.push_str(&format!("speedup: {:.3}", rate));
    } else {
        text.push_str("speedup: n/a");
    }
    if let Some(deviation) = entry.record.deviation(backend) {
        text.push_str(&format!("\ndeviation: {:.3e}", deviation));
    }
    text
}

pub(crate) fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            '\n' => escaped.push_str("&#10;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

impl fmt::Display for BarChart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = f64::from(self.layout.width);
        let height = f64::from(self.layout.height);
        let plot_w = width - MARGIN_LEFT - MARGIN_RIGHT;
        let plot_h = height - MARGIN_TOP - MARGIN_BOTTOM;
        let y_top = self.y_top();
        let span = (y_top - self.offset).max(f64::EPSILON);
        let y_px = |v: f64| MARGIN_TOP + plot_h * (y_top - v) / span;

        writeln!(f, r#"<div class="arraybench-chart">"#)?;
        writeln!(
            f,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif" font-size="11">"#,
            w = self.layout.width,
            h = self.layout.height
        )?;
        writeln!(
            f,
            r#"<text x="{}" y="24" font-size="15" font-weight="bold">{}</text>"#,
            MARGIN_LEFT,
            escape_xml(&self.title)
        )?;

        for i in 0..=Y_TICKS {
            let value = self.offset + span * i as f64 / Y_TICKS as f64;
            let y = y_px(value);
            writeln!(
                f,
                r##"<line x1="{:.1}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="#e5e5e5"/><text x="{:.1}" y="{:.1}" text-anchor="end">{:.2}</text>"##,
                MARGIN_LEFT,
                MARGIN_LEFT + plot_w,
                MARGIN_LEFT - 6.0,
                y + 4.0,
                value
            )?;
        }
        writeln!(
            f,
            r#"<text transform="translate(16,{:.1}) rotate(-90)" text-anchor="middle">Speedup</text>"#,
            MARGIN_TOP + plot_h / 2.0
        )?;

        let groups = self.groups.len().max(1) as f64;
        let group_w = plot_w / groups;
        let bar_w = 0.9 * group_w / self.backends.len().max(1) as f64;
        let bottom = y_px(self.offset);

        for bar in &self.bars {
            let slot = self.backends.iter().position(|b| *b == bar.backend).unwrap_or(0) as f64;
            let x = MARGIN_LEFT + group_w * bar.group as f64 + 0.05 * group_w + bar_w * slot;
            let top = y_px(bar.value);
            writeln!(
                f,
                r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}" stroke="white"><title>{}</title></rect>"#,
                x,
                top,
                bar_w,
                (bottom - top).max(0.0),
                bar.backend.color(),
                escape_xml(&bar.tooltip)
            )?;
        }

        for (i, label) in self.groups.iter().enumerate() {
            writeln!(
                f,
                r#"<text x="{:.1}" y="{:.1}" text-anchor="middle">{}</text>"#,
                MARGIN_LEFT + group_w * (i as f64 + 0.5),
                MARGIN_TOP + plot_h + 18.0,
                escape_xml(label)
            )?;
        }

        for (i, backend) in self.backends.iter().enumerate() {
            let x = MARGIN_LEFT + 110.0 * i as f64;
            let y = height - 20.0;
            writeln!(
                f,
                r#"<rect x="{:.1}" y="{:.1}" width="12" height="12" fill="{}"/><text x="{:.1}" y="{:.1}">{}</text>"#,
                x,
                y - 10.0,
                backend.color(),
                x + 16.0,
                y,
                backend
            )?;
        }

        writeln!(f, "</svg>")?;
        write!(f, "</div>")
    }
}

/// Builds the chart and sends it to `output`, returning the HTML fragment.
pub fn render_chart(
    name: &str,
    entries: &[ReportEntry],
    backends: &[Backend],
    mode: Mode,
    info: Option<&str>,
    output: &OutputMode,
) -> BenchmarkResult<String> {
    let html = BarChart::build(name, entries, backends, mode, info).to_html();
    match output {
        OutputMode::File(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, &html)?;
        }
        OutputMode::Inline => println!("{}", html),
    }
    Ok(html)
}
