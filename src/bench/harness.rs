//! Timed trial loop.
//!
//! Every trial runs inside a dedicated rayon pool so the thread count is a
//! per-run setting. Verification happens after the timer stops and a failure
//! only marks the trial; it never aborts the run.

use std::path::Path;
use std::time::Instant;

use rayon::ThreadPoolBuilder;
use serde::Serialize;

use super::config::{BenchConfig, BenchOptions};
use super::source::SourcePicker;
use crate::error::Result;
use crate::graph::{CsrGraph, Neighbor, NodeId, WNode};
use crate::kernels::{
    delta_stepping, direction_optimizing_bfs, verify_bfs_tree, verify_distances, BfsTree,
    ShortestPaths, VerificationFailure,
};

/// Anything a trial can report a reach count for.
pub trait KernelOutput: Send + Sync {
    /// Vertices reached from the source, including it.
    fn reached_count(&self) -> usize;
}

impl KernelOutput for BfsTree {
    fn reached_count(&self) -> usize {
        BfsTree::reached_count(self)
    }
}

impl KernelOutput for ShortestPaths {
    fn reached_count(&self) -> usize {
        ShortestPaths::reached_count(self)
    }
}

/// One timed kernel invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialReport {
    /// Zero-based trial index.
    pub trial: usize,
    /// Source vertex.
    pub source: NodeId,
    /// Wall-clock kernel time.
    pub seconds: f64,
    /// Vertices reached.
    pub reached: usize,
    /// `None` when verification was off.
    pub verified: Option<bool>,
    /// Why verification failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

/// Aggregate over all trials of one kernel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KernelReport {
    /// Kernel name.
    pub kernel: &'static str,
    /// Threads in the pool that ran the trials.
    pub threads: usize,
    /// Graph vertex count.
    pub nodes: usize,
    /// Graph edge count.
    pub edges: usize,
    /// Mean trial time.
    pub average_seconds: f64,
    /// Fastest trial.
    pub min_seconds: f64,
    /// Slowest trial.
    pub max_seconds: f64,
    /// Per-trial detail.
    pub trials: Vec<TrialReport>,
}

impl KernelReport {
    /// `false` if any verified trial failed.
    pub fn passed(&self) -> bool {
        self.trials.iter().all(|t| t.verified != Some(false))
    }

    /// Writes the report as pretty JSON.
    ///
    /// # Errors
    /// Propagates I/O and serialization failures.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(file), self)?;
        Ok(())
    }
}

/// Runs `kernel` once per trial, timing each call.
///
/// # Errors
/// Fails if the pool cannot be built, the source picker rejects the graph, or
/// the kernel itself fails.
pub fn run_trials<D, R, K, V>(
    g: &CsrGraph<D>,
    options: &BenchOptions,
    name: &'static str,
    kernel: K,
    verify: V,
) -> Result<KernelReport>
where
    D: Neighbor,
    R: KernelOutput,
    K: Fn(NodeId) -> Result<R> + Sync,
    V: Fn(&R) -> std::result::Result<(), VerificationFailure> + Sync,
{
    let pool = ThreadPoolBuilder::new()
        .num_threads(options.threads)
        .thread_name(|i| format!("gap-worker-{i}"))
        .build()?;
    let mut picker = SourcePicker::new(g, options.start_vertex, options.seed)?;
    let mut trials = Vec::with_capacity(options.trials);

    for trial in 0..options.trials {
        let source = picker.pick_next();
        let start = Instant::now();
        let output = pool.install(|| kernel(source))?;
        let seconds = start.elapsed().as_secs_f64();
        let reached = output.reached_count();

        let (verified, failure) = if options.verify {
            match pool.install(|| verify(&output)) {
                Ok(()) => (Some(true), None),
                Err(err) => {
                    tracing::error!(trial, source, %err, "verification failed");
                    (Some(false), Some(err.reason))
                }
            }
        } else {
            (None, None)
        };
        tracing::info!(
            kernel = name,
            trial,
            source,
            seconds = format_args!("{seconds:.5}"),
            reached,
            ?verified,
            "trial time"
        );
        trials.push(TrialReport {
            trial,
            source,
            seconds,
            reached,
            verified,
            failure,
        });
    }

    let total: f64 = trials.iter().map(|t| t.seconds).sum();
    let min_seconds = trials.iter().map(|t| t.seconds).fold(f64::INFINITY, f64::min);
    let max_seconds = trials.iter().map(|t| t.seconds).fold(0.0, f64::max);
    let report = KernelReport {
        kernel: name,
        threads: pool.current_num_threads(),
        nodes: g.num_nodes(),
        edges: g.num_edges(),
        average_seconds: total / trials.len().max(1) as f64,
        min_seconds,
        max_seconds,
        trials,
    };
    tracing::info!(
        kernel = name,
        threads = report.threads,
        average_seconds = format_args!("{:.5}", report.average_seconds),
        passed = report.passed(),
        "average time"
    );
    Ok(report)
}

/// Benchmarks direction-optimizing BFS.
///
/// # Errors
/// See [`run_trials`].
pub fn bench_bfs<D: Neighbor>(g: &CsrGraph<D>, config: &BenchConfig) -> Result<KernelReport> {
    run_trials(
        g,
        &config.bench,
        "bfs",
        |source| direction_optimizing_bfs(g, source, &config.bfs),
        |tree| verify_bfs_tree(g, tree),
    )
}

/// Benchmarks delta-stepping SSSP.
///
/// # Errors
/// See [`run_trials`].
pub fn bench_sssp(g: &CsrGraph<WNode>, config: &BenchConfig) -> Result<KernelReport> {
    run_trials(
        g,
        &config.bench,
        "sssp",
        |source| delta_stepping(g, source, &config.sssp),
        |paths| verify_distances(g, paths),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{BuildOptions, Builder, Edge};

    #[test]
    fn test_bfs_trials_verify() {
        let edges: Vec<Edge> = (0..50).map(|u| Edge::new(u, (u * 7 + 3) % 50)).collect();
        let g = Builder::with_heap(BuildOptions::undirected()).build(edges).unwrap();
        let mut config = BenchConfig::default();
        config.bench.trials = 4;
        config.bench.verify = true;
        config.bench.threads = 2;

        let report = bench_bfs(&g, &config).unwrap();
        assert_eq!(report.trials.len(), 4);
        assert_eq!(report.threads, 2);
        assert!(report.passed());
        assert!(report.min_seconds <= report.max_seconds);
    }

    #[test]
    fn test_failed_verification_marks_trial() {
        let g = Builder::with_heap(BuildOptions::undirected())
            .build(vec![Edge::new(0, 1)])
            .unwrap();
        let options = BenchOptions {
            trials: 2,
            verify: true,
            start_vertex: Some(0),
            ..BenchOptions::default()
        };
        let report = run_trials(
            &g,
            &options,
            "broken",
            |source| direction_optimizing_bfs(&g, source, &Default::default()),
            |_| {
                Err(VerificationFailure {
                    reason: "always".into(),
                })
            },
        )
        .unwrap();
        assert!(!report.passed());
        assert_eq!(report.trials[0].failure.as_deref(), Some("always"));
    }

    #[test]
    fn test_sssp_report_serializes() {
        let g = Builder::<WNode>::with_heap(BuildOptions::undirected())
            .build(vec![Edge::weighted(0, 1, 3), Edge::weighted(1, 2, 4)])
            .unwrap();
        let mut config = BenchConfig::default();
        config.bench.trials = 1;
        config.bench.verify = true;
        let report = bench_sssp(&g, &config).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["kernel"], "sssp");
        assert_eq!(json["trials"][0]["verified"], true);
    }
}
