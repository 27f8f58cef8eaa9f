//! Per-vertex cleanup of scattered neighbor lists.

use rayon::prelude::*;

use super::{prefix_sum, split_by_offsets, MergePolicy};
use crate::alloc::{SharedAlloc, StorageBuf};
use crate::collections::PVec;
use crate::error::{GraphError, Result};
use crate::graph::csr_graph::Adjacency;
use crate::graph::types::{Neighbor, NodeId};

/// Sorts each list, drops self-loops, merges duplicates, and copies the
/// survivors into allocator-owned buffers.
pub(super) fn squish<D: Neighbor>(
    offsets: &[u64],
    mut scattered: PVec<D>,
    policy: MergePolicy,
    alloc: &SharedAlloc,
) -> Result<Adjacency<D>> {
    let mut lists = split_by_offsets(&mut scattered, offsets);
    let kept: Vec<u64> = lists
        .par_iter_mut()
        .enumerate()
        .map(|(u, list)| squish_list(u as NodeId, list, policy))
        .collect::<Result<_>>()?;

    let new_offsets = prefix_sum(&kept);
    let total = new_offsets[kept.len()] as usize;
    // SAFETY: the per-vertex slices below tile `0..total` exactly.
    let mut neighbors = unsafe { StorageBuf::<D>::new_uninit(alloc, total) };
    split_by_offsets(&mut neighbors, &new_offsets)
        .into_par_iter()
        .zip(lists.par_iter())
        .for_each(|(dst, src)| dst.copy_from_slice(&src[..dst.len()]));

    let offsets = StorageBuf::from_slice(alloc, &new_offsets);
    Ok(Adjacency::from_buffers(offsets, neighbors))
}

/// Compacts one list in place and returns how many entries survive.
fn squish_list<D: Neighbor>(u: NodeId, list: &mut [D], policy: MergePolicy) -> Result<u64> {
    list.sort_unstable();
    let mut kept = 0usize;
    for i in 0..list.len() {
        let d = list[i];
        if d.node() == u {
            continue;
        }
        if kept > 0 && list[kept - 1].node() == d.node() {
            match policy {
                // Sorted ascending, so the kept copy is already the lightest.
                MergePolicy::KeepLightest => {}
                MergePolicy::SumWeights => list[kept - 1] = list[kept - 1].merge_sum(d),
                MergePolicy::Reject => {
                    return Err(GraphError::DuplicateEdge {
                        src: u,
                        dst: d.node(),
                    })
                }
            }
            continue;
        }
        list[kept] = d;
        kept += 1;
    }
    Ok(kept as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::types::WNode;

    #[test]
    fn test_squish_list_drops_loops_and_duplicates() {
        let mut list = vec![3u32, 1, 0, 3, 2, 1];
        let kept = squish_list(0, &mut list, MergePolicy::KeepLightest).unwrap();
        assert_eq!(&list[..kept as usize], &[1, 2, 3]);
    }

    #[test]
    fn test_squish_list_weight_policies() {
        let input = vec![WNode::new(2, 9), WNode::new(2, 4), WNode::new(1, 1)];

        let mut lightest = input.clone();
        let kept = squish_list(0, &mut lightest, MergePolicy::KeepLightest).unwrap();
        assert_eq!(&lightest[..kept as usize], &[WNode::new(1, 1), WNode::new(2, 4)]);

        let mut summed = input.clone();
        let kept = squish_list(0, &mut summed, MergePolicy::SumWeights).unwrap();
        assert_eq!(&summed[..kept as usize], &[WNode::new(1, 1), WNode::new(2, 13)]);

        let mut rejected = input;
        assert!(matches!(
            squish_list(0, &mut rejected, MergePolicy::Reject),
            Err(GraphError::DuplicateEdge { src: 0, dst: 2 })
        ));
    }
}
