use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "micrognn workspace automation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the benchmark suite serially and in parallel, then compare
    Bench {
        /// Run quickly (lower sample size/time)
        #[arg(long, default_value_t = false)]
        quick: bool,

        /// Generate report only (skip running benchmarks)
        #[arg(long, default_value_t = false)]
        report_only: bool,
    },
}

const SERIAL: &str = "serial";
const PARALLEL: &str = "parallel";

/// Criterion baseline name and the cargo feature arguments that produce it.
const BUILDS: [(&str, &[&str]); 2] = [
    (SERIAL, &["--no-default-features"]),
    (PARALLEL, &["--no-default-features", "--features", "parallel"]),
];

const CRITERION_DIR: &str = "target/criterion";
const REPORT_PATH: &str = "benchmark_results/report.md";

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Bench { quick, report_only } => {
            if !report_only {
                run_benchmarks(quick)?;
            }
            let rows = load_measurements(Path::new(CRITERION_DIR))?;
            let report_path = Path::new(REPORT_PATH);
            if let Some(parent) = report_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(report_path, render_report(&rows))
                .with_context(|| format!("writing {}", report_path.display()))?;
            println!("Report written to {}", report_path.display());
        }
    }

    Ok(())
}

fn run_benchmarks(quick: bool) -> Result<()> {
    for (baseline, features) in BUILDS {
        println!("\n>>> Benchmarking {baseline} build");
        let start = Instant::now();

        let mut cmd = Command::new("cargo");
        cmd.args(["bench", "--bench", "suite"]).args(features);
        // Criterion arguments follow the separator.
        cmd.args(["--", "--save-baseline", baseline]);
        if quick {
            cmd.args(["--measurement-time", "0.1", "--sample-size", "10", "--noplot"]);
        }

        let status = cmd
            .status()
            .with_context(|| format!("spawning cargo bench for {baseline}"))?;
        if !status.success() {
            bail!("cargo bench failed for the {baseline} build");
        }
        println!("Finished {baseline} in {:.2?}", start.elapsed());
    }
    Ok(())
}

/// The parts of criterion's `benchmark.json` the report reads.
#[derive(Deserialize)]
struct BenchmarkInfo {
    full_id: String,
    #[serde(default)]
    throughput: Option<Throughput>,
}

#[derive(Deserialize, Default)]
struct Throughput {
    #[serde(rename = "Elements", default)]
    elements: Option<u64>,
}

/// The parts of criterion's `estimates.json` the report reads.
#[derive(Deserialize)]
struct Estimates {
    mean: PointEstimate,
}

#[derive(Deserialize)]
struct PointEstimate {
    point_estimate: f64,
}

/// Rates of one workload, keyed by baseline.
#[derive(Default)]
struct Row {
    per_element: bool,
    rates: BTreeMap<&'static str, f64>,
}

impl Row {
    fn speedup(&self) -> Option<f64> {
        let serial = self.rates.get(SERIAL)?;
        let parallel = self.rates.get(PARALLEL)?;
        (*serial > 0.0).then(|| parallel / serial)
    }
}

/// Reads every `<bench>/<baseline>/{benchmark,estimates}.json` pair saved for one of
/// [`BUILDS`] under `root`.
fn load_measurements(root: &Path) -> Result<BTreeMap<String, Row>> {
    if !root.is_dir() {
        bail!("no criterion output at {}", root.display());
    }
    let mut rows: BTreeMap<String, Row> = BTreeMap::new();
    let mut pending: Vec<PathBuf> = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir)?.flatten() {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            match BUILDS.iter().find(|(b, _)| *b == name) {
                Some(&(baseline, _)) => {
                    let (id, per_element, rate) = read_baseline(&path)?;
                    let row = rows.entry(id).or_default();
                    row.per_element = per_element;
                    row.rates.insert(baseline, rate);
                }
                None => pending.push(path),
            }
        }
    }
    Ok(rows)
}

/// Returns the benchmark id, whether the rate is per element, and the rate per second.
fn read_baseline(dir: &Path) -> Result<(String, bool, f64)> {
    let info: BenchmarkInfo = read_json(&dir.join("benchmark.json"))?;
    let estimates: Estimates = read_json(&dir.join("estimates.json"))?;
    let elements = info.throughput.and_then(|t| t.elements);
    let mean_ns = estimates.mean.point_estimate;
    #[allow(clippy::cast_precision_loss)]
    let work = elements.unwrap_or(1) as f64;
    let rate = if mean_ns > 0.0 { work * 1e9 / mean_ns } else { 0.0 };
    Ok((info.full_id, elements.is_some(), rate))
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn render_report(rows: &BTreeMap<String, Row>) -> String {
    let mut out = String::from("# Serial vs Parallel Benchmark Report\n\n");
    out.push_str("| Workload | Unit | serial | parallel | Speedup |\n");
    out.push_str("|---|---|---|---|---|\n");
    for (id, row) in rows {
        let unit = if row.per_element { "elem/s" } else { "iter/s" };
        let cell = |baseline: &str| {
            row.rates
                .get(baseline)
                .map_or_else(|| "-".to_string(), |r| human_rate(*r))
        };
        let speedup = row
            .speedup()
            .map_or_else(|| "-".to_string(), |s| format!("**{s:.2}x**"));
        let _ = writeln!(
            out,
            "| {id} | {unit} | {} | {} | {speedup} |",
            cell(SERIAL),
            cell(PARALLEL)
        );
    }
    out
}

fn human_rate(rate: f64) -> String {
    const UNITS: [(f64, &str); 3] = [(1e9, "G"), (1e6, "M"), (1e3, "K")];
    UNITS
        .iter()
        .find(|(scale, _)| rate >= *scale)
        .map_or_else(|| format!("{rate:.0}"), |(scale, suffix)| format!("{:.2}{suffix}", rate / scale))
}
