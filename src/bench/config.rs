//! Benchmark configuration.
//!
//! One record gathers everything a run needs. It deserializes from JSON with
//! every field optional; the `gapbench` binary layers its flags on top.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::alloc::AllocatorChoice;
use crate::error::{GraphError, Result};
use crate::graph::{BuildOptions, NodeId};
use crate::kernels::{BfsOptions, SsspOptions};

/// Seed used when none is configured.
pub const DEFAULT_SEED: u64 = 27_491_095;

/// Trial-loop settings shared by every kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BenchOptions {
    /// Number of timed trials.
    pub trials: usize,
    /// Check every trial against the serial reference.
    pub verify: bool,
    /// Worker threads; `0` lets rayon decide.
    pub threads: usize,
    /// Fixed source vertex; random non-isolated vertices otherwise.
    pub start_vertex: Option<NodeId>,
    /// Seed for the source picker.
    pub seed: u64,
}

impl Default for BenchOptions {
    fn default() -> Self {
        Self {
            trials: 16,
            verify: false,
            threads: 0,
            start_vertex: None,
            seed: DEFAULT_SEED,
        }
    }
}

/// Complete benchmark configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BenchConfig {
    /// Graph construction options.
    pub build: BuildOptions,
    /// Storage strategy.
    pub allocator: AllocatorChoice,
    /// Trial loop.
    pub bench: BenchOptions,
    /// BFS thresholds.
    pub bfs: BfsOptions,
    /// SSSP bucket width.
    pub sssp: SsspOptions,
}

impl BenchConfig {
    /// Parses and validates a JSON document.
    ///
    /// # Errors
    /// [`GraphError::Json`] for malformed JSON, [`GraphError::Config`] for
    /// invalid values.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON file.
    ///
    /// # Errors
    /// See [`BenchConfig::from_json_str`]; also I/O failures.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Checks every section.
    ///
    /// # Errors
    /// [`GraphError::Config`] describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        if self.bench.trials == 0 {
            return Err(GraphError::Config("trials must be at least 1".into()));
        }
        match self.allocator {
            AllocatorChoice::FixedRegion { size: 0, .. }
            | AllocatorChoice::AnonymousRegion { size: 0 } => {
                return Err(GraphError::Config("arena size must be non-zero".into()));
            }
            _ => {}
        }
        self.build.validate()?;
        self.bfs.validate()?;
        self.sssp.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::MergePolicy;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = BenchConfig::from_json_str("{}").unwrap();
        assert_eq!(config, BenchConfig::default());
        assert_eq!(config.bfs.alpha, 15);
        assert_eq!(config.bench.trials, 16);
    }

    #[test]
    fn test_nested_sections() {
        let config = BenchConfig::from_json_str(
            r#"{
                "build": { "symmetrize": true, "merge_policy": "sum_weights" },
                "allocator": { "kind": "anonymous_region", "size": 1048576 },
                "bench": { "trials": 3, "start_vertex": 7 },
                "sssp": { "delta": 4 }
            }"#,
        )
        .unwrap();
        assert!(config.build.symmetrize);
        assert_eq!(config.build.merge_policy, MergePolicy::SumWeights);
        assert_eq!(config.allocator, AllocatorChoice::AnonymousRegion { size: 1 << 20 });
        assert_eq!(config.bench.start_vertex, Some(7));
        assert_eq!(config.sssp.delta, 4);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            BenchConfig::from_json_str(r#"{ "sssp": { "delta": 0 } }"#),
            Err(GraphError::Config(_))
        ));
        assert!(matches!(
            BenchConfig::from_json_str(r#"{ "bench": { "trials": 0 } }"#),
            Err(GraphError::Config(_))
        ));
        assert!(matches!(
            BenchConfig::from_json_str(r#"{ "bench": { "trails": 2 } }"#),
            Err(GraphError::Json(_))
        ));
    }
}
