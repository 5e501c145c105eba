// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IGML-Lite CLI: build triangle and line geometry for an indoor model.
//!
//! Usage:
//!   igml-lite <model.json> [--parallel] [--json]

use std::env;
use std::fs::File;
use std::io::BufReader;

use anyhow::{Context, Result};
use igml_lite_core::IndoorModel;
use igml_lite_geometry::{BuildReport, GeometryDirectoryBuilder};
use serde::Serialize;

mod config;

use config::Config;

/// Parsed command-line arguments
#[derive(Debug, Default, PartialEq)]
struct Args {
    model_path: String,
    parallel: bool,
    json: bool,
}

impl Args {
    /// `Ok(None)` means help was requested
    fn parse(args: &[String]) -> std::result::Result<Option<Self>, String> {
        let mut parsed = Args::default();

        for arg in args.iter().skip(1) {
            match arg.as_str() {
                "--help" | "-h" => return Ok(None),
                "--parallel" => parsed.parallel = true,
                "--json" => parsed.json = true,
                flag if flag.starts_with("--") => return Err(format!("Unknown option: {}", flag)),
                path if parsed.model_path.is_empty() => parsed.model_path = path.to_string(),
                extra => return Err(format!("Unexpected argument: {}", extra)),
            }
        }

        if parsed.model_path.is_empty() {
            return Err("Missing model path".to_string());
        }
        Ok(Some(parsed))
    }
}

#[derive(Debug, Serialize)]
struct FailureSummary {
    kind: String,
    id: String,
    error: String,
}

/// What the CLI prints; the geometry itself stays in memory
#[derive(Debug, Serialize)]
struct BuildSummary {
    scale: f64,
    translate: [f64; 3],
    cells: usize,
    cell_boundaries: usize,
    boundary_lines: usize,
    triangles: usize,
    failures: Vec<FailureSummary>,
    duplicate_ids: Vec<String>,
}

impl From<&BuildReport> for BuildSummary {
    fn from(report: &BuildReport) -> Self {
        let t = &report.transform.translate;
        Self {
            scale: report.transform.scale,
            translate: [t.x, t.y, t.z],
            cells: report.cells.len(),
            cell_boundaries: report.cell_boundaries.len(),
            boundary_lines: report
                .cell_boundaries
                .iter()
                .filter(|(_, g)| g.is_line())
                .count(),
            triangles: report.triangle_count(),
            failures: report
                .failures
                .iter()
                .map(|f| FailureSummary {
                    kind: f.kind.to_string(),
                    id: f.id.clone(),
                    error: f.error.to_string(),
                })
                .collect(),
            duplicate_ids: report.duplicates.iter().map(|d| d.id.clone()).collect(),
        }
    }
}

fn print_usage() {
    println!("igml-lite - build renderable geometry for an IndoorGML model");
    println!();
    println!("Usage:");
    println!("  igml-lite <model.json> [options]");
    println!();
    println!("Options:");
    println!("  --parallel   Process entities on all worker threads");
    println!("  --json       Print the build summary as JSON");
    println!("  -h, --help   Show this message");
    println!();
    println!("Environment:");
    println!("  WORKER_THREADS   Worker thread count (default: CPU count)");
    println!("  PARALLEL_BUILD   Same as --parallel when set to 1/true");
    println!("  RUST_LOG         Log filter (default: info)");
}

fn print_summary(summary: &BuildSummary) {
    println!("Scale:           {}", summary.scale);
    println!(
        "Translate:       [{}, {}, {}]",
        summary.translate[0], summary.translate[1], summary.translate[2]
    );
    println!("Cells:           {}", summary.cells);
    println!(
        "Cell boundaries: {} ({} lines)",
        summary.cell_boundaries, summary.boundary_lines
    );
    println!("Triangles:       {}", summary.triangles);

    if !summary.duplicate_ids.is_empty() {
        println!("Duplicate ids:   {}", summary.duplicate_ids.join(", "));
    }
    if !summary.failures.is_empty() {
        println!("Failed entities:");
        for f in &summary.failures {
            println!("  {} {}: {}", f.kind, f.id, f.error);
        }
    }
}

fn main() -> Result<()> {
    let argv: Vec<String> = env::args().collect();
    let args = match Args::parse(&argv) {
        Ok(Some(args)) => args,
        Ok(None) => {
            print_usage();
            return Ok(());
        }
        Err(message) => {
            eprintln!("{}", message);
            print_usage();
            std::process::exit(2);
        }
    };

    let config = Config::from_env();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(config.log_filter.as_str())
        .with_writer(std::io::stderr)
        .init();

    let parallel = args.parallel || config.parallel_build;

    tracing::info!(
        model = %args.model_path,
        parallel,
        worker_threads = config.worker_threads,
        "Starting IGML-Lite geometry build"
    );

    if parallel {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.worker_threads)
            .build_global()
            .context("Failed to initialize worker pool")?;
    }

    let file = File::open(&args.model_path)
        .with_context(|| format!("Failed to open {}", args.model_path))?;
    let model = IndoorModel::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to load model {}", args.model_path))?;

    let report = GeometryDirectoryBuilder::new()
        .with_parallel(parallel)
        .build(&model)
        .context("Geometry build failed")?;

    let summary = BuildSummary::from(&report);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }

    Ok(())
}
