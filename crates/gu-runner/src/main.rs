// SPDX-License-Identifier: Apache-2.0
//! Thin runnable wrapper around [`gu_core::run_in_process`].
//!
//! Reads whitespace-separated `u v` edge pairs from stdin (one per line),
//! runs the matching engine over an in-process worker pool, and prints a
//! one-line summary. Graph ingestion, config-file discovery, and metrics
//! export are all out of scope — this binary exists to exercise the engine
//! end to end, not to be a production launcher.

use std::io::Read;

use anyhow::{Context, Result};
use clap::Parser;
use gu_core::{Config, TracingSink};

/// Runs the sublinear MPC maximal matching engine over stdin edges.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Number of in-process workers to simulate.
    #[arg(long, default_value_t = 4)]
    workers: usize,

    /// Approximate vertex count hint, used to size the per-machine edge
    /// budget.
    #[arg(long, default_value_t = 1_000)]
    n_hint: u64,

    /// Optional path to a TOML config file (see `gu_core::Config`).
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Memory Guard limit in bytes. `0` (the default) disables the guard;
    /// this binary has no real RSS probe wired up, so a caller that wants
    /// the guard to trip under real memory pressure needs its own
    /// `gu_core::MemoryProbe` and `gu_core::run_in_process_with` directly.
    #[arg(long, default_value_t = 0)]
    memory_limit_bytes: u64,
}

fn read_edges(mut input: impl Read) -> Result<Vec<(u64, u64)>> {
    let mut raw = String::new();
    input.read_to_string(&mut raw).context("reading edge list from stdin")?;

    let mut edges = Vec::new();
    for (line_no, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.split_whitespace();
        let u: u64 = parts
            .next()
            .with_context(|| format!("line {}: missing first endpoint", line_no + 1))?
            .parse()
            .with_context(|| format!("line {}: invalid first endpoint", line_no + 1))?;
        let v: u64 = parts
            .next()
            .with_context(|| format!("line {}: missing second endpoint", line_no + 1))?
            .parse()
            .with_context(|| format!("line {}: invalid second endpoint", line_no + 1))?;
        edges.push((u, v));
    }
    Ok(edges)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let cfg = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            Config::from_toml_str(&raw).context("parsing config file")?
        }
        None => Config::default(),
    };
    cfg.validate().context("validating config")?;

    let edges = read_edges(std::io::stdin().lock())?;
    tracing::info!(edge_count = edges.len(), workers = args.workers, "starting run");

    let sink = TracingSink;
    let probe = gu_core::NullMemoryProbe;
    let results = gu_core::run_in_process_with(
        edges,
        args.workers,
        args.n_hint,
        cfg,
        args.memory_limit_bytes,
        &probe,
        &sink,
    )
    .map_err(|e| anyhow::anyhow!("engine run failed: {e} ({})", e_tag(&e)))?;

    let total_matched: usize = results.iter().map(|r| r.matched_local.len()).sum();
    let converged = results.iter().all(gu_core::MatchingResult::converged);
    #[allow(clippy::print_stdout)]
    {
        println!("matched_edges={total_matched} converged={converged}");
    }

    Ok(())
}

fn e_tag(e: &gu_core::GuError) -> &'static str {
    e.tag()
}
