//! Benchmark harness: configuration, source picking and timed trials.

pub mod config;
pub mod harness;
pub mod source;

pub use config::{BenchConfig, BenchOptions, DEFAULT_SEED};
pub use harness::{bench_bfs, bench_sssp, run_trials, KernelOutput, KernelReport, TrialReport};
pub use source::SourcePicker;
