//! gapbench - run graph benchmark kernels over persisted CSR graphs.
//!
//! # Commands
//!
//! - `gapbench bfs <graph>` - direction-optimizing BFS trials
//! - `gapbench sssp <graph>` - delta-stepping SSSP trials (weighted graphs)
//! - `gapbench info <graph>` - print the header and graph statistics
//!
//! # Examples
//!
//! ```bash
//! # 16 verified BFS trials on 8 threads
//! gapbench bfs web.csr --verify --threads 8
//!
//! # SSSP with delta 32, graph placed in a reserved physical range
//! gapbench sssp road.wcsr --delta 32 --arena-base 0x100000000 --arena-size 8589934592
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use gapgraph::bench::{bench_bfs, bench_sssp, BenchConfig, KernelReport};
use gapgraph::graph::io;
use gapgraph::{AllocatorChoice, CsrGraph, NodeId, Session, WNode};

#[cfg(feature = "alloc-mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[cfg(all(feature = "alloc-jemalloc", not(feature = "alloc-mimalloc")))]
#[global_allocator]
static GLOBAL: jemallocator::Jemalloc = jemallocator::Jemalloc;

/// Shared-memory graph benchmark kernels
#[derive(Parser)]
#[command(name = "gapbench")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run direction-optimizing BFS trials
    Bfs {
        #[command(flatten)]
        run: RunArgs,

        /// Top-down to bottom-up switch divisor
        #[arg(long)]
        alpha: Option<u64>,

        /// Bottom-up to top-down switch divisor
        #[arg(long)]
        beta: Option<u64>,
    },

    /// Run delta-stepping SSSP trials
    Sssp {
        #[command(flatten)]
        run: RunArgs,

        /// Bucket width
        #[arg(short, long)]
        delta: Option<u32>,
    },

    /// Print the file header and graph statistics
    Info {
        /// Persisted CSR graph
        graph: PathBuf,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Persisted CSR graph
    graph: PathBuf,

    /// JSON configuration file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of trials
    #[arg(short = 'n', long)]
    trials: Option<usize>,

    /// Verify every trial against the serial reference
    #[arg(long)]
    verify: bool,

    /// Worker threads (0 = all cores)
    #[arg(short, long)]
    threads: Option<usize>,

    /// Fixed source vertex
    #[arg(short, long)]
    root: Option<NodeId>,

    /// Seed for random source picking
    #[arg(long)]
    seed: Option<u64>,

    /// Physical base address of a reserved region to build the graph in
    #[arg(long, value_parser = parse_address, requires = "arena_size")]
    arena_base: Option<u64>,

    /// Arena size in bytes (anonymous mapping unless --arena-base is given)
    #[arg(long)]
    arena_size: Option<usize>,

    /// Write the JSON report here
    #[arg(long)]
    report: Option<PathBuf>,
}

impl RunArgs {
    fn config(&self) -> anyhow::Result<BenchConfig> {
        let mut config = match &self.config {
            Some(path) => BenchConfig::from_json_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => BenchConfig::default(),
        };
        if let Some(trials) = self.trials {
            config.bench.trials = trials;
        }
        config.bench.verify |= self.verify;
        if let Some(threads) = self.threads {
            config.bench.threads = threads;
        }
        if self.root.is_some() {
            config.bench.start_vertex = self.root;
        }
        if let Some(seed) = self.seed {
            config.bench.seed = seed;
        }
        match (self.arena_base, self.arena_size) {
            (Some(base_address), Some(size)) => {
                config.allocator = AllocatorChoice::FixedRegion { base_address, size };
            }
            (None, Some(size)) => config.allocator = AllocatorChoice::AnonymousRegion { size },
            _ => {}
        }
        Ok(config)
    }
}

fn parse_address(s: &str) -> Result<u64, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid address {s:?}: {e}"))
}

fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn load<D: gapgraph::graph::Neighbor>(
    session: &Session,
    path: &Path,
) -> anyhow::Result<CsrGraph<D>> {
    let graph = session
        .load::<D>(path)
        .with_context(|| format!("loading graph {}", path.display()))?;
    graph.log_stats();
    Ok(graph)
}

fn finish(report: &KernelReport, path: Option<&Path>) -> anyhow::Result<()> {
    if let Some(path) = path {
        report
            .write_json(path)
            .with_context(|| format!("writing report {}", path.display()))?;
    }
    println!(
        "{}: {} trials, average {:.5} s, min {:.5} s, max {:.5} s",
        report.kernel,
        report.trials.len(),
        report.average_seconds,
        report.min_seconds,
        report.max_seconds
    );
    if !report.passed() {
        bail!("{} verification failed", report.kernel);
    }
    Ok(())
}

fn run_bfs(run: &RunArgs, alpha: Option<u64>, beta: Option<u64>) -> anyhow::Result<()> {
    let mut config = run.config()?;
    if let Some(alpha) = alpha {
        config.bfs.alpha = alpha;
    }
    if let Some(beta) = beta {
        config.bfs.beta = beta;
    }
    config.validate()?;
    let session = Session::new(&config.allocator).context("setting up storage")?;

    let header = io::peek_header(&run.graph)
        .with_context(|| format!("reading header of {}", run.graph.display()))?;
    let report = if header.weighted() {
        bench_bfs(&load::<WNode>(&session, &run.graph)?, &config)?
    } else {
        bench_bfs(&load::<NodeId>(&session, &run.graph)?, &config)?
    };
    finish(&report, run.report.as_deref())
}

fn run_sssp(run: &RunArgs, delta: Option<u32>) -> anyhow::Result<()> {
    let mut config = run.config()?;
    if let Some(delta) = delta {
        config.sssp.delta = delta;
    }
    config.validate()?;
    let session = Session::new(&config.allocator).context("setting up storage")?;

    let header = io::peek_header(&run.graph)
        .with_context(|| format!("reading header of {}", run.graph.display()))?;
    if !header.weighted() {
        bail!("sssp needs a weighted graph; {} is unweighted", run.graph.display());
    }
    let graph = load::<WNode>(&session, &run.graph)?;
    let report = bench_sssp(&graph, &config)?;
    finish(&report, run.report.as_deref())
}

fn run_info(path: &Path) -> anyhow::Result<()> {
    let header = io::peek_header(path)
        .with_context(|| format!("reading header of {}", path.display()))?;
    println!("vertices:        {}", header.num_nodes);
    println!("stored edges:    {}", header.num_edges_directed);
    println!("directed:        {}", header.directed());
    println!("weighted:        {}", header.weighted());
    println!("inverse:         {}", header.has_inverse());

    let session = Session::heap();
    if header.weighted() {
        load::<WNode>(&session, path)?;
    } else {
        load::<NodeId>(&session, path)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Commands::Bfs { run, alpha, beta } => run_bfs(run, *alpha, *beta),
        Commands::Sssp { run, delta } => run_sssp(run, *delta),
        Commands::Info { graph } => run_info(graph),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
