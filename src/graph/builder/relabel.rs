//! Renumbering by descending degree.
//!
//! High-degree vertices get small ids, which clusters the hot part of the
//! graph at the front of every array. Only meaningful for symmetrized graphs,
//! where out-degree is the full degree.

use rayon::prelude::*;

use super::{prefix_sum, split_by_offsets};
use crate::alloc::{SharedAlloc, StorageBuf};
use crate::graph::csr_graph::{Adjacency, CsrGraph};
use crate::graph::types::{Neighbor, NodeId};

/// Returns a copy of `graph` with vertex `order[k]` renamed to `k`, where
/// `order` sorts by descending degree (ties by old id).
pub(super) fn by_degree<D: Neighbor>(graph: &CsrGraph<D>, alloc: &SharedAlloc) -> CsrGraph<D> {
    debug_assert!(!graph.directed());
    let num_nodes = graph.num_nodes();

    let mut order: Vec<NodeId> = graph.vertices().collect();
    order.par_sort_unstable_by(|&a, &b| {
        graph
            .out_degree(b)
            .cmp(&graph.out_degree(a))
            .then(a.cmp(&b))
    });
    let mut new_ids = vec![0 as NodeId; num_nodes];
    for (rank, &old) in order.iter().enumerate() {
        new_ids[old as usize] = rank as NodeId;
    }

    let degrees: Vec<u64> = order
        .par_iter()
        .map(|&old| graph.out_degree(old) as u64)
        .collect();
    let offsets = prefix_sum(&degrees);
    let total = offsets[num_nodes] as usize;

    // SAFETY: the per-vertex slices tile `0..total` and each is filled from a
    // list of exactly its length.
    let mut neighbors = unsafe { StorageBuf::<D>::new_uninit(alloc, total) };
    split_by_offsets(&mut neighbors, &offsets)
        .into_par_iter()
        .zip(order.par_iter())
        .for_each(|(dst, &old)| {
            for (slot, d) in dst.iter_mut().zip(graph.out_neighbors(old)) {
                *slot = d.retarget(new_ids[d.node() as usize]);
            }
            dst.sort_unstable();
        });

    let adjacency = Adjacency::from_buffers(StorageBuf::from_slice(alloc, &offsets), neighbors);
    CsrGraph::from_parts(num_nodes, false, adjacency, None)
}
