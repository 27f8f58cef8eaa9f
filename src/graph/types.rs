//! Vertex, weight and edge types.

use core::fmt;

use zerocopy::{AsBytes, FromBytes, FromZeroes};

/// Dense vertex id in `[0, num_nodes)`.
pub type NodeId = u32;

/// Edge weight. Unsigned: negative weights are not representable.
pub type Weight = u32;

/// A destination entry in a neighbor list.
///
/// Implemented by [`NodeId`] for unweighted graphs and [`WNode`] for weighted
/// ones. Entries order by destination first, so a sorted neighbor list groups
/// duplicates together with the lightest copy first.
pub trait Neighbor:
    Copy + Ord + Send + Sync + fmt::Debug + AsBytes + FromBytes + FromZeroes + 'static
{
    /// Whether entries carry a weight.
    const WEIGHTED: bool;

    /// Destination vertex.
    fn node(self) -> NodeId;

    /// Weight of the edge leading here (1 for unweighted graphs).
    fn weight(self) -> Weight;

    /// The same entry pointing at `node` instead.
    #[must_use]
    fn retarget(self, node: NodeId) -> Self;

    /// Combines two parallel edges into one whose weight is the saturating sum.
    #[must_use]
    fn merge_sum(self, other: Self) -> Self;
}

impl Neighbor for NodeId {
    const WEIGHTED: bool = false;

    #[inline(always)]
    fn node(self) -> NodeId {
        self
    }

    #[inline(always)]
    fn weight(self) -> Weight {
        1
    }

    #[inline(always)]
    fn retarget(self, node: NodeId) -> Self {
        node
    }

    #[inline(always)]
    fn merge_sum(self, _other: Self) -> Self {
        self
    }
}

/// Weighted neighbor entry.
#[repr(C)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, AsBytes, FromBytes, FromZeroes,
)]
pub struct WNode {
    /// Destination vertex.
    pub v: NodeId,
    /// Edge weight.
    pub w: Weight,
}

impl WNode {
    /// Creates a weighted entry.
    pub const fn new(v: NodeId, w: Weight) -> Self {
        Self { v, w }
    }
}

impl Neighbor for WNode {
    const WEIGHTED: bool = true;

    #[inline(always)]
    fn node(self) -> NodeId {
        self.v
    }

    #[inline(always)]
    fn weight(self) -> Weight {
        self.w
    }

    #[inline(always)]
    fn retarget(self, node: NodeId) -> Self {
        Self { v: node, w: self.w }
    }

    #[inline(always)]
    fn merge_sum(self, other: Self) -> Self {
        Self {
            v: self.v,
            w: self.w.saturating_add(other.w),
        }
    }
}

impl fmt::Display for WNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.v, self.w)
    }
}

/// A directed edge `u -> v` where `v` may carry a weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Edge<D = NodeId> {
    /// Source vertex.
    pub u: NodeId,
    /// Destination entry.
    pub v: D,
}

impl Edge<NodeId> {
    /// Unweighted edge `u -> v`.
    pub const fn new(u: NodeId, v: NodeId) -> Self {
        Self { u, v }
    }
}

impl Edge<WNode> {
    /// Weighted edge `u -> v` with weight `w`.
    pub const fn weighted(u: NodeId, v: NodeId, w: Weight) -> Self {
        Self {
            u,
            v: WNode::new(v, w),
        }
    }
}

impl<D: Neighbor> Edge<D> {
    /// The same edge pointing the other way.
    #[must_use]
    pub fn reversed(self) -> Self {
        Self {
            u: self.v.node(),
            v: self.v.retarget(self.u),
        }
    }
}

impl<D> From<(NodeId, D)> for Edge<D> {
    fn from((u, v): (NodeId, D)) -> Self {
        Self { u, v }
    }
}

impl From<(NodeId, NodeId, Weight)> for Edge<WNode> {
    fn from((u, v, w): (NodeId, NodeId, Weight)) -> Self {
        Self::weighted(u, v, w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wnode_orders_by_destination_then_weight() {
        let mut list = vec![WNode::new(3, 1), WNode::new(1, 9), WNode::new(1, 2)];
        list.sort_unstable();
        assert_eq!(list, vec![WNode::new(1, 2), WNode::new(1, 9), WNode::new(3, 1)]);
    }

    #[test]
    fn test_reversed_keeps_weight() {
        let e = Edge::weighted(0, 5, 7);
        assert_eq!(e.reversed(), Edge::weighted(5, 0, 7));
        assert_eq!(Edge::new(2, 4).reversed(), Edge::new(4, 2));
    }

    #[test]
    fn test_merge_sum_saturates() {
        let a = WNode::new(1, Weight::MAX - 1);
        assert_eq!(a.merge_sum(WNode::new(1, 5)).w, Weight::MAX);
    }
}
