//! Timing loop and console analysis of benchmark results.

use log::debug;
use std::hint::black_box;
use std::time::Instant;

use super::benchmark_types::{Measurement, ReportEntry, RunSettings};
use crate::backends::Backend;
use crate::errors::OpResult;

/// Times `kernel` according to `settings`.
///
/// Runs `warmup` untimed calls, then `runs` samples of `repeat` calls each,
/// and returns per-call statistics together with the output of the first
/// call. Any kernel error aborts the measurement.
pub fn time_kernel<T, F>(settings: &RunSettings, mut kernel: F) -> OpResult<(Measurement, Option<T>)>
where
    F: FnMut() -> OpResult<T>,
{
    let mut first_output = None;

    for _ in 0..settings.warmup {
        let output = kernel()?;
        if first_output.is_none() {
            first_output = Some(output);
        }
    }

    let mut samples = Vec::with_capacity(settings.runs as usize);
    for _ in 0..settings.runs {
        let start = Instant::now();
        for _ in 0..settings.repeat {
            let output = black_box(kernel()?);
            if first_output.is_none() {
                first_output = Some(output);
            }
        }
        let elapsed = start.elapsed().as_secs_f64();
        samples.push(elapsed / f64::from(settings.repeat.max(1)));
    }

    let measurement = Measurement::from_samples(&samples);
    debug!(
        "  {} samples: mean {:.6} ms, std {:.6} ms",
        samples.len(),
        measurement.mean_ms(),
        measurement.std_dev_ms()
    );
    Ok((measurement, first_output))
}

/// Prints per-configuration latencies and speed rankings for one operator.
pub fn print_performance_analysis(name: &str, entries: &[ReportEntry], backends: &[Backend]) {
    if entries.is_empty() || backends.is_empty() {
        return;
    }
    let baseline = backends[0];

    println!("\n{}", "=".repeat(80));
    println!("Operator `{}` (baseline: {})", name, baseline);
    println!("{}", "=".repeat(80));

    for (i, entry) in entries.iter().enumerate() {
        println!("\n📊 config{}: {}", i + 1, entry.configuration);
        let baseline_latency = entry.record.latency(baseline);

        for &backend in backends {
            match entry.record.measurement(backend) {
                Some(m) => {
                    let mut line = format!(
                        "   {:<8} {:>10.4} ms ± {:.4} ms",
                        backend.identifier(),
                        m.mean_ms(),
                        m.std_dev_ms()
                    );
                    if backend != baseline {
                        if let Some(base) = baseline_latency.filter(|b| *b > 0.0) {
                            if m.mean_secs > 0.0 {
                                line.push_str(&format!("   speedup {:.2}x", base / m.mean_secs));
                            }
                        }
                    }
                    if let Some(deviation) = entry.record.deviation(backend) {
                        line.push_str(&format!("   max |Δ| {:.2e}", deviation));
                    }
                    println!("{}", line);
                }
                None => println!("   {:<8} {:>10}", backend.identifier(), "unsupported"),
            }
        }

        println!("   🚀 Speed ranking:");
        let mut ranked: Vec<(Backend, f64)> = backends
            .iter()
            .filter_map(|&b| entry.record.latency(b).map(|l| (b, l)))
            .collect();
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
        for (rank, (backend, latency)) in ranked.iter().enumerate() {
            let rank_emoji = match rank {
                0 => "🥇",
                1 => "🥈",
                2 => "🥉",
                _ => "  ",
            };
            println!(
                "      {} {}: {:.4} ms",
                rank_emoji,
                backend,
                latency * 1000.0
            );
        }
    }
}
