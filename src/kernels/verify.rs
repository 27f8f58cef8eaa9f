//! Serial reference implementations and result checkers.
//!
//! A parallel BFS may return any valid parent tree, so BFS results are
//! checked by depth and edge membership, never by exact parents. SSSP
//! distances are unique and compared exactly.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};

use crate::graph::{CsrGraph, Neighbor, NodeId, WNode};
use crate::kernels::bfs::BfsTree;
use crate::kernels::sssp::{ShortestPaths, DIST_INF};

/// A kernel result disagreed with the serial reference.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("verification failed: {reason}")]
pub struct VerificationFailure {
    /// First disagreement found.
    pub reason: String,
}

impl VerificationFailure {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Serial queue-based BFS; `None` for unreached vertices.
pub fn serial_bfs_depths<D: Neighbor>(g: &CsrGraph<D>, source: NodeId) -> Vec<Option<u32>> {
    let mut depth = vec![None; g.num_nodes()];
    depth[source as usize] = Some(0);
    let mut queue = VecDeque::from([source]);
    while let Some(u) = queue.pop_front() {
        let next = depth[u as usize].map(|d| d + 1);
        for v in g.out_neighbors(u) {
            let slot = &mut depth[v.node() as usize];
            if slot.is_none() {
                *slot = next;
                queue.push_back(v.node());
            }
        }
    }
    depth
}

/// Checks a BFS tree against a serial BFS.
///
/// Every reached vertex other than the source must have a parent one level
/// closer to the source with an edge `parent -> v`, and reachability must
/// match exactly.
///
/// # Errors
/// Returns the first [`VerificationFailure`] found.
pub fn verify_bfs_tree<D: Neighbor>(
    g: &CsrGraph<D>,
    tree: &BfsTree,
) -> Result<(), VerificationFailure> {
    if tree.parent.len() != g.num_nodes() {
        return Err(VerificationFailure::new(format!(
            "parent array has {} entries for {} vertices",
            tree.parent.len(),
            g.num_nodes()
        )));
    }
    if tree.source as usize >= g.num_nodes() {
        return Err(VerificationFailure::new(format!(
            "source {} out of range",
            tree.source
        )));
    }
    let depth = serial_bfs_depths(g, tree.source);
    for v in g.vertices() {
        let expected = depth[v as usize];
        match (expected, tree.parent_of(v)) {
            (None, None) => {}
            (Some(_), None) | (None, Some(_)) => {
                return Err(VerificationFailure::new(format!("reachability mismatch at {v}")));
            }
            (Some(0), Some(p)) => {
                if p != v {
                    return Err(VerificationFailure::new(format!(
                        "source {v} has parent {p}"
                    )));
                }
            }
            (Some(d), Some(p)) => {
                if p as usize >= g.num_nodes() {
                    return Err(VerificationFailure::new(format!(
                        "parent {p} of {v} out of range"
                    )));
                }
                if depth[p as usize] != Some(d - 1) {
                    return Err(VerificationFailure::new(format!(
                        "parent {p} of {v} is not one level up"
                    )));
                }
                if !g.has_edge(p, v) {
                    return Err(VerificationFailure::new(format!(
                        "tree edge {p} -> {v} is not in the graph"
                    )));
                }
            }
        }
    }
    Ok(())
}

/// Serial Dijkstra with a binary heap.
pub fn serial_dijkstra(g: &CsrGraph<WNode>, source: NodeId) -> Vec<u64> {
    let mut dist = vec![DIST_INF; g.num_nodes()];
    dist[source as usize] = 0;
    let mut heap = BinaryHeap::from([Reverse((0u64, source))]);
    while let Some(Reverse((d, u))) = heap.pop() {
        if d > dist[u as usize] {
            continue;
        }
        for wn in g.out_neighbors(u) {
            let nd = d.saturating_add(u64::from(wn.w));
            if nd < dist[wn.v as usize] {
                dist[wn.v as usize] = nd;
                heap.push(Reverse((nd, wn.v)));
            }
        }
    }
    dist
}

/// Compares shortest-path distances against serial Dijkstra.
///
/// # Errors
/// Returns the first mismatching vertex.
pub fn verify_distances(
    g: &CsrGraph<WNode>,
    paths: &ShortestPaths,
) -> Result<(), VerificationFailure> {
    let expected = serial_dijkstra(g, paths.source);
    if expected.len() != paths.dist.len() {
        return Err(VerificationFailure::new("distance array length mismatch"));
    }
    match expected
        .iter()
        .zip(&paths.dist)
        .position(|(want, got)| want != got)
    {
        Some(v) => Err(VerificationFailure::new(format!(
            "distance to {v} is {} but should be {}",
            paths.dist[v], expected[v]
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{BuildOptions, Builder, Edge};

    fn path() -> CsrGraph {
        Builder::with_heap(BuildOptions::undirected())
            .build(vec![Edge::new(0, 1), Edge::new(1, 2)])
            .unwrap()
    }

    #[test]
    fn test_serial_depths() {
        assert_eq!(serial_bfs_depths(&path(), 1), vec![Some(1), Some(0), Some(1)]);
    }

    #[test]
    fn test_accepts_valid_tree() {
        let tree = BfsTree {
            source: 0,
            parent: vec![0, 0, 1],
        };
        assert_eq!(verify_bfs_tree(&path(), &tree), Ok(()));
    }

    #[test]
    fn test_rejects_shortcut_parent() {
        // 0 is not adjacent to 2.
        let tree = BfsTree {
            source: 0,
            parent: vec![0, 0, 0],
        };
        assert!(verify_bfs_tree(&path(), &tree).is_err());

        let missing = BfsTree {
            source: 0,
            parent: vec![0, 0, -1],
        };
        let err = verify_bfs_tree(&path(), &missing).unwrap_err();
        assert!(err.reason.contains("reachability"));
    }

    #[test]
    fn test_distance_mismatch_reported() {
        let g = Builder::<WNode>::with_heap(BuildOptions::default())
            .build(vec![Edge::weighted(0, 1, 5)])
            .unwrap();
        let good = ShortestPaths {
            source: 0,
            dist: vec![0, 5],
        };
        assert!(verify_distances(&g, &good).is_ok());
        let bad = ShortestPaths {
            source: 0,
            dist: vec![0, 4],
        };
        assert!(verify_distances(&g, &bad).is_err());
    }
}
