//! Direction-optimizing breadth-first search.
//!
//! Each round either pushes from the frontier (top-down) or pulls into the
//! unvisited set (bottom-up). Top-down rounds keep the frontier in a
//! [`SlidingQueue`]; bottom-up rounds keep it in a pair of [`Bitmap`]s that
//! are swapped after every sweep.
//!
//! Parent slots are `AtomicI64`. A negative slot means unvisited and holds
//! `-(out_degree)` (or `-1` for isolated vertices), so a successful top-down
//! claim also yields the degree it adds to the scout count. Claims go through
//! compare-and-swap; exactly one racing claimant wins.

use core::sync::atomic::{AtomicI64, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::collections::{QueueBuffer, SlidingQueue};
use crate::concurrency::Bitmap;
use crate::error::{GraphError, Result};
use crate::graph::{CsrGraph, Neighbor, NodeId};

/// Switching thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BfsOptions {
    /// Go bottom-up once the frontier's out-degree sum exceeds
    /// `unexplored_edges / alpha`.
    pub alpha: u64,
    /// Stay bottom-up while the frontier grows or exceeds `num_nodes / beta`.
    pub beta: u64,
}

impl Default for BfsOptions {
    fn default() -> Self {
        Self { alpha: 15, beta: 18 }
    }
}

impl BfsOptions {
    /// Checks the thresholds.
    ///
    /// # Errors
    /// [`GraphError::Config`] if either divisor is zero.
    pub fn validate(&self) -> Result<()> {
        if self.alpha == 0 || self.beta == 0 {
            return Err(GraphError::Config(format!(
                "bfs alpha and beta must be positive (alpha={}, beta={})",
                self.alpha, self.beta
            )));
        }
        Ok(())
    }
}

/// A BFS parent tree.
///
/// `parent[source] == source`; unreached vertices hold `-1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BfsTree {
    /// Root of the traversal.
    pub source: NodeId,
    /// Parent of every vertex, or `-1`.
    pub parent: Vec<i64>,
}

impl BfsTree {
    /// Parent of `v`, or `None` if unreached.
    pub fn parent_of(&self, v: NodeId) -> Option<NodeId> {
        let p = self.parent[v as usize];
        (p >= 0).then_some(p as NodeId)
    }

    /// Number of vertices reached, including the source.
    pub fn reached_count(&self) -> usize {
        self.parent.par_iter().filter(|&&p| p >= 0).count()
    }

    /// Depth of every vertex in the tree, `None` if unreached.
    ///
    /// Returns `None` entries along any chain that does not lead back to the
    /// source, so a corrupt tree never loops.
    pub fn depths(&self) -> Vec<Option<u32>> {
        const UNKNOWN: u32 = u32::MAX;
        const BROKEN: u32 = u32::MAX - 1;
        let n = self.parent.len();
        let mut depth = vec![UNKNOWN; n];
        if (self.source as usize) < n {
            depth[self.source as usize] = 0;
        }
        let mut chain = Vec::new();
        for start in 0..n {
            if depth[start] != UNKNOWN {
                continue;
            }
            chain.clear();
            let mut v = start;
            let base = loop {
                if depth[v] != UNKNOWN {
                    break depth[v];
                }
                let p = self.parent[v];
                if p < 0 || p as usize >= n || chain.len() > n {
                    break BROKEN;
                }
                chain.push(v);
                v = p as usize;
            };
            for (k, &u) in chain.iter().rev().enumerate() {
                depth[u] = if base == BROKEN { BROKEN } else { base + 1 + k as u32 };
            }
            if chain.is_empty() {
                depth[start] = BROKEN;
            }
        }
        depth
            .into_iter()
            .map(|d| (d < BROKEN).then_some(d))
            .collect()
    }
}

/// Runs direction-optimizing BFS from `source`.
///
/// Directed graphs need an inverse adjacency for bottom-up rounds; without one
/// the search stays top-down.
///
/// # Errors
/// [`GraphError::InvalidVertex`] for an out-of-range source and
/// [`GraphError::Config`] for invalid options.
pub fn direction_optimizing_bfs<D: Neighbor>(
    g: &CsrGraph<D>,
    source: NodeId,
    options: &BfsOptions,
) -> Result<BfsTree> {
    options.validate()?;
    check_source(g, source)?;
    if !g.has_in_adjacency() {
        tracing::warn!("directed graph has no inverse adjacency; running top-down only");
        return top_down_bfs(g, source);
    }

    let start = Instant::now();
    let n = g.num_nodes();
    let parent = init_parent(g);
    parent[source as usize].store(i64::from(source), Ordering::Relaxed);

    let mut queue = SlidingQueue::with_capacity(n);
    queue.push_back(source);
    queue.slide_window();
    let mut curr = Bitmap::new(n);
    let mut front = Bitmap::new(n);

    let mut edges_to_check = g.num_edges_directed() as u64;
    let mut scout_count = g.out_degree(source) as u64;
    let mut rounds = 0usize;
    while !queue.is_empty() {
        if scout_count > edges_to_check / options.alpha {
            queue_to_bitmap(&queue, &front);
            let mut awake_count = queue.len() as u64;
            queue.slide_window();
            loop {
                let old_awake_count = awake_count;
                awake_count = bu_step(g, &parent, &front, &curr);
                core::mem::swap(&mut front, &mut curr);
                rounds += 1;
                tracing::trace!(awake_count, "bottom-up round");
                if !(awake_count >= old_awake_count || awake_count > n as u64 / options.beta) {
                    break;
                }
            }
            bitmap_to_queue(&front, &mut queue);
            scout_count = 1;
            tracing::debug!(frontier = queue.len(), "switched back to top-down");
        } else {
            edges_to_check = edges_to_check.saturating_sub(scout_count);
            scout_count = td_step(g, &parent, &queue);
            queue.slide_window();
            rounds += 1;
            tracing::trace!(frontier = queue.len(), scout_count, "top-down round");
        }
    }

    let tree = finish(source, parent);
    tracing::debug!(
        source,
        rounds,
        elapsed_ms = start.elapsed().as_secs_f64() * 1e3,
        "bfs done"
    );
    Ok(tree)
}

/// Runs BFS with top-down rounds only.
///
/// # Errors
/// [`GraphError::InvalidVertex`] for an out-of-range source.
pub fn top_down_bfs<D: Neighbor>(g: &CsrGraph<D>, source: NodeId) -> Result<BfsTree> {
    check_source(g, source)?;
    let parent = init_parent(g);
    parent[source as usize].store(i64::from(source), Ordering::Relaxed);

    let mut queue = SlidingQueue::with_capacity(g.num_nodes());
    queue.push_back(source);
    queue.slide_window();
    while !queue.is_empty() {
        td_step(g, &parent, &queue);
        queue.slide_window();
    }
    Ok(finish(source, parent))
}

fn check_source<D: Neighbor>(g: &CsrGraph<D>, source: NodeId) -> Result<()> {
    if source as usize >= g.num_nodes() {
        return Err(GraphError::InvalidVertex {
            vertex: source,
            num_nodes: g.num_nodes(),
        });
    }
    Ok(())
}

fn init_parent<D: Neighbor>(g: &CsrGraph<D>) -> Vec<AtomicI64> {
    g.vertices()
        .into_par_iter()
        .map(|u| {
            let degree = g.out_degree(u) as i64;
            AtomicI64::new(if degree != 0 { -degree } else { -1 })
        })
        .collect()
}

fn finish(source: NodeId, parent: Vec<AtomicI64>) -> BfsTree {
    let parent = parent
        .into_par_iter()
        .map(|p| p.into_inner().max(-1))
        .collect();
    BfsTree { source, parent }
}

/// Expands every frontier vertex; returns the out-degree sum of the vertices
/// claimed this round.
fn td_step<D: Neighbor>(
    g: &CsrGraph<D>,
    parent: &[AtomicI64],
    queue: &SlidingQueue<NodeId>,
) -> u64 {
    queue
        .window()
        .par_iter()
        .map_init(
            || QueueBuffer::new(queue),
            |buf, &u| {
                let mut scout = 0u64;
                for d in g.out_neighbors(u) {
                    let v = d.node();
                    let slot = &parent[v as usize];
                    let curr = slot.load(Ordering::Relaxed);
                    if curr < 0
                        && slot
                            .compare_exchange(curr, i64::from(u), Ordering::Relaxed, Ordering::Relaxed)
                            .is_ok()
                    {
                        buf.push(v);
                        scout += curr.unsigned_abs();
                    }
                }
                scout
            },
        )
        .sum()
}

/// Pulls every unvisited vertex toward the frontier in `front`; marks the
/// newly claimed vertices in `next` and returns how many there were.
fn bu_step<D: Neighbor>(
    g: &CsrGraph<D>,
    parent: &[AtomicI64],
    front: &Bitmap,
    next: &Bitmap,
) -> u64 {
    next.reset();
    g.vertices()
        .into_par_iter()
        .with_min_len(1024)
        .map(|u| {
            let slot = &parent[u as usize];
            let curr = slot.load(Ordering::Relaxed);
            if curr < 0 {
                for d in g.in_neighbors(u) {
                    let v = d.node();
                    if front.get_bit(v as usize) {
                        if slot
                            .compare_exchange(curr, i64::from(v), Ordering::Relaxed, Ordering::Relaxed)
                            .is_err()
                        {
                            return 0;
                        }
                        next.set_bit(u as usize);
                        return 1;
                    }
                }
            }
            0
        })
        .sum()
}

fn queue_to_bitmap(queue: &SlidingQueue<NodeId>, bm: &Bitmap) {
    bm.reset();
    queue
        .window()
        .par_iter()
        .for_each(|&u| bm.set_bit(u as usize));
}

fn bitmap_to_queue(bm: &Bitmap, queue: &mut SlidingQueue<NodeId>) {
    {
        let shared: &SlidingQueue<NodeId> = queue;
        (0..bm.word_count()).into_par_iter().for_each_init(
            || QueueBuffer::new(shared),
            |buf, word| bm.for_each_set_in_word(word, |u| buf.push(u as NodeId)),
        );
    }
    queue.slide_window();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{BuildOptions, Builder, Edge};

    fn cycle(n: NodeId) -> CsrGraph {
        let edges: Vec<Edge> = (0..n).map(|u| Edge::new(u, (u + 1) % n)).collect();
        Builder::with_heap(BuildOptions::undirected())
            .build(edges)
            .unwrap()
    }

    #[test]
    fn test_five_cycle_depths() {
        let g = cycle(5);
        let tree = direction_optimizing_bfs(&g, 0, &BfsOptions::default()).unwrap();
        assert_eq!(tree.parent_of(0), Some(0));
        assert_eq!(tree.reached_count(), 5);
        let depths = tree.depths();
        assert_eq!(depths, vec![Some(0), Some(1), Some(2), Some(2), Some(1)]);
    }

    #[test]
    fn test_forced_bottom_up_matches_top_down_depths() {
        // A huge alpha switches to bottom-up on the first round.
        let g = cycle(64);
        let options = BfsOptions { alpha: 1 << 20, beta: 1 };
        let dobfs = direction_optimizing_bfs(&g, 3, &options).unwrap();
        let td = top_down_bfs(&g, 3).unwrap();
        assert_eq!(dobfs.depths(), td.depths());
        assert_eq!(dobfs.reached_count(), 64);
    }

    #[test]
    fn test_bottom_up_sweep_claims_each_vertex_once() {
        let edges: Vec<Edge> = (1..5_000).map(|v| Edge::new(0, v)).collect();
        let g = Builder::with_heap(BuildOptions::undirected()).build(edges).unwrap();
        let parent = init_parent(&g);
        parent[0].store(0, Ordering::Relaxed);
        // Already claimed before the sweep; must keep its parent.
        parent[7].store(0, Ordering::Relaxed);

        let front = Bitmap::new(g.num_nodes());
        front.set_bit(0);
        let next = Bitmap::new(g.num_nodes());
        let awake = bu_step(&g, &parent, &front, &next);
        assert_eq!(awake, 4_998);
        assert_eq!(next.count_ones(), 4_998);
        assert!(!next.get_bit(7));
        assert!(parent.iter().all(|p| p.load(Ordering::Relaxed) == 0));

        // Nothing is left to claim on a second sweep.
        assert_eq!(bu_step(&g, &parent, &front, &next), 0);
        assert_eq!(next.count_ones(), 0);
    }

    #[test]
    fn test_unreached_vertices_report_no_parent() {
        let g = Builder::with_heap(BuildOptions::undirected().with_num_nodes(4))
            .build(vec![Edge::new(0, 1)])
            .unwrap();
        let tree = direction_optimizing_bfs(&g, 0, &BfsOptions::default()).unwrap();
        assert_eq!(tree.parent, vec![0, 0, -1, -1]);
        assert_eq!(tree.depths()[3], None);
    }

    #[test]
    fn test_directed_without_inverse_falls_back() {
        let options = BuildOptions {
            invert: false,
            ..BuildOptions::default()
        };
        let g = Builder::with_heap(options)
            .build(vec![Edge::new(0, 1), Edge::new(1, 2)])
            .unwrap();
        let tree = direction_optimizing_bfs(&g, 0, &BfsOptions { alpha: 1 << 20, beta: 1 }).unwrap();
        assert_eq!(tree.parent, vec![0, 0, 1]);
    }

    #[test]
    fn test_rejects_bad_source_and_options() {
        let g = cycle(3);
        assert!(matches!(
            direction_optimizing_bfs(&g, 3, &BfsOptions::default()),
            Err(GraphError::InvalidVertex { vertex: 3, num_nodes: 3 })
        ));
        assert!(matches!(
            direction_optimizing_bfs(&g, 0, &BfsOptions { alpha: 0, beta: 18 }),
            Err(GraphError::Config(_))
        ));
    }
}
