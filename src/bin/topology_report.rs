//! Settle the layout of a topology snapshot and print a JSON report

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use topology_explorer::{
    ExplorerConfig, JsonFileTopologyProvider, NodePosition, NoopSink, PerformanceStats, TopologyExplorer,
    ViewportSize,
};

/// Settle the layout of a topology snapshot and report the result as JSON
#[derive(Parser, Debug)]
#[command(name = "topology-report")]
struct Args {
    /// Snapshot file with `nodes` and `edges`
    snapshot: PathBuf,

    /// Viewport width in pixels
    #[arg(long, default_value_t = 1280.0)]
    width: f64,

    /// Viewport height in pixels
    #[arg(long, default_value_t = 800.0)]
    height: f64,

    /// Give up on settling after this many ticks
    #[arg(long, default_value_t = 1000)]
    max_ticks: usize,

    /// Zoom level used for level-of-detail selection
    #[arg(long, default_value_t = 1.0)]
    zoom: f64,
}

#[derive(Serialize)]
struct Report {
    snapshot: PathBuf,
    total_nodes: usize,
    total_edges: usize,
    rejected_edges: Vec<String>,
    ticks: usize,
    settled: bool,
    stats: PerformanceStats,
    positions: Vec<NodePosition>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut explorer = TopologyExplorer::new(
        ExplorerConfig::default(),
        Arc::new(NoopSink),
        ViewportSize::new(args.width, args.height),
    );
    let provider = JsonFileTopologyProvider::new(&args.snapshot);
    explorer
        .refresh(&provider)
        .await
        .with_context(|| format!("failed to load {}", args.snapshot.display()))?;
    explorer.on_viewport_change(args.zoom, 0.0, 0.0);

    let mut ticks = 0;
    while ticks < args.max_ticks && !explorer.is_idle() {
        explorer.frame();
        ticks += 1;
    }

    let store = explorer.store();
    let report = Report {
        snapshot: args.snapshot.clone(),
        total_nodes: store.len(),
        total_edges: store.edge_count(),
        rejected_edges: store.rejected_edges().iter().map(ToString::to_string).collect(),
        ticks,
        settled: explorer.is_idle(),
        stats: explorer.performance_stats().clone(),
        positions: explorer.positions(),
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
