//! Delta-stepping single-source shortest paths.
//!
//! Vertices are binned by `floor(dist / delta)`. The lowest non-empty bucket
//! is drained with repeated light-edge rounds (weight ≤ delta) until no light
//! relaxation lands back in it; the vertices it settled then relax their heavy
//! edges once, which can only target later buckets.
//!
//! Relaxation is an atomic strict-minimum on the distance slot. Workers fill
//! private bins during a round and the bins are merged at the round barrier.
//! A vertex may sit in several bins; entries whose distance no longer maps to
//! the bucket being drained are skipped.

use core::sync::atomic::{AtomicU64, Ordering};
use std::collections::BTreeMap;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::concurrency::{fetch_min_strict, Bitmap};
use crate::error::{GraphError, Result};
use crate::graph::{CsrGraph, NodeId, WNode, Weight};

/// Distance of an unreached vertex.
pub const DIST_INF: u64 = u64::MAX;

/// Delta-stepping configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SsspOptions {
    /// Bucket width.
    pub delta: Weight,
}

impl Default for SsspOptions {
    fn default() -> Self {
        Self { delta: 1 }
    }
}

impl SsspOptions {
    /// Checks the bucket width.
    ///
    /// # Errors
    /// [`GraphError::Config`] if `delta` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.delta == 0 {
            return Err(GraphError::Config("sssp delta must be at least 1".into()));
        }
        Ok(())
    }
}

/// Output of a shortest-path run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortestPaths {
    /// Source vertex.
    pub source: NodeId,
    /// Distance per vertex; [`DIST_INF`] if unreached.
    pub dist: Vec<u64>,
}

impl ShortestPaths {
    /// Distance to `v`, or `None` if unreached.
    pub fn distance(&self, v: NodeId) -> Option<u64> {
        let d = self.dist[v as usize];
        (d != DIST_INF).then_some(d)
    }

    /// Number of reached vertices, including the source.
    pub fn reached_count(&self) -> usize {
        self.dist.par_iter().filter(|&&d| d != DIST_INF).count()
    }
}

type Bins = BTreeMap<u64, Vec<NodeId>>;

fn merge_bins(mut into: Bins, from: Bins) -> Bins {
    for (bucket, mut vertices) in from {
        into.entry(bucket).or_default().append(&mut vertices);
    }
    into
}

/// Which edges a relaxation pass follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EdgeClass {
    Light,
    Heavy,
}

struct Relaxer<'g> {
    g: &'g CsrGraph<WNode>,
    dist: Vec<AtomicU64>,
    delta: u64,
}

impl Relaxer<'_> {
    #[inline]
    fn bucket_of(&self, u: NodeId) -> u64 {
        self.dist[u as usize].load(Ordering::Relaxed) / self.delta
    }

    /// Relaxes one class of `u`'s edges, recording improved vertices in `bins`.
    fn relax(&self, u: NodeId, class: EdgeClass, bins: &mut Bins) {
        let du = self.dist[u as usize].load(Ordering::Relaxed);
        for wn in self.g.out_neighbors(u) {
            let light = u64::from(wn.w) <= self.delta;
            if light != (class == EdgeClass::Light) {
                continue;
            }
            let new_dist = du.saturating_add(u64::from(wn.w));
            if fetch_min_strict(&self.dist[wn.v as usize], new_dist) {
                bins.entry(new_dist / self.delta).or_default().push(wn.v);
            }
        }
    }

    fn relax_all(&self, vertices: &[NodeId], class: EdgeClass) -> Bins {
        vertices
            .par_iter()
            .fold(Bins::new, |mut bins, &u| {
                self.relax(u, class, &mut bins);
                bins
            })
            .reduce(Bins::new, merge_bins)
    }
}

/// Computes shortest-path distances from `source` with delta-stepping.
///
/// # Errors
/// [`GraphError::InvalidVertex`] for an out-of-range source and
/// [`GraphError::Config`] for `delta == 0`.
pub fn delta_stepping(
    g: &CsrGraph<WNode>,
    source: NodeId,
    options: &SsspOptions,
) -> Result<ShortestPaths> {
    options.validate()?;
    let n = g.num_nodes();
    if source as usize >= n {
        return Err(GraphError::InvalidVertex {
            vertex: source,
            num_nodes: n,
        });
    }

    let start = Instant::now();
    let relaxer = Relaxer {
        g,
        dist: (0..n).into_par_iter().map(|_| AtomicU64::new(DIST_INF)).collect(),
        delta: u64::from(options.delta),
    };
    relaxer.dist[source as usize].store(0, Ordering::Relaxed);

    let settled = Bitmap::new(n);
    let mut buckets = Bins::new();
    buckets.insert(0, vec![source]);
    let mut buckets_drained = 0usize;
    let mut light_rounds = 0usize;

    while let Some((bucket, mut frontier)) = buckets.pop_first() {
        let mut members: Vec<NodeId> = Vec::new();
        loop {
            let live: Vec<NodeId> = frontier
                .par_iter()
                .copied()
                .filter(|&u| relaxer.bucket_of(u) == bucket)
                .collect();
            if live.is_empty() {
                break;
            }
            members.par_extend(
                live.par_iter()
                    .copied()
                    .filter(|&u| settled.test_and_set(u as usize)),
            );
            let mut bins = relaxer.relax_all(&live, EdgeClass::Light);
            frontier = bins.remove(&bucket).unwrap_or_default();
            buckets = merge_bins(buckets, bins);
            light_rounds += 1;
        }
        if members.is_empty() {
            continue;
        }
        let heavy = relaxer.relax_all(&members, EdgeClass::Heavy);
        debug_assert!(heavy.keys().all(|&b| b > bucket));
        buckets = merge_bins(buckets, heavy);
        buckets_drained += 1;
        tracing::trace!(bucket, settled = members.len(), "bucket drained");
    }

    let dist: Vec<u64> = relaxer
        .dist
        .into_par_iter()
        .map(AtomicU64::into_inner)
        .collect();
    tracing::debug!(
        source,
        buckets = buckets_drained,
        light_rounds,
        elapsed_ms = start.elapsed().as_secs_f64() * 1e3,
        "sssp done"
    );
    Ok(ShortestPaths { source, dist })
}
