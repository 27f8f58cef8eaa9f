//! Trial source selection.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{GraphError, Result};
use crate::graph::{CsrGraph, Neighbor, NodeId};

/// Picks trial sources: a fixed vertex, or seeded-random vertices that have
/// at least one out-edge.
#[derive(Debug)]
pub struct SourcePicker<'g, D> {
    graph: &'g CsrGraph<D>,
    fixed: Option<NodeId>,
    rng: StdRng,
}

impl<'g, D: Neighbor> SourcePicker<'g, D> {
    /// Creates a picker.
    ///
    /// # Errors
    /// [`GraphError::InvalidVertex`] for an out-of-range fixed source and
    /// [`GraphError::Config`] when random picking is requested on a graph
    /// without edges.
    pub fn new(graph: &'g CsrGraph<D>, fixed: Option<NodeId>, seed: u64) -> Result<Self> {
        match fixed {
            Some(v) if v as usize >= graph.num_nodes() => {
                return Err(GraphError::InvalidVertex {
                    vertex: v,
                    num_nodes: graph.num_nodes(),
                });
            }
            None if graph.num_edges_directed() == 0 => {
                return Err(GraphError::Config(
                    "graph has no edges to pick a random source from".into(),
                ));
            }
            _ => {}
        }
        Ok(Self {
            graph,
            fixed,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Next source vertex.
    pub fn pick_next(&mut self) -> NodeId {
        if let Some(v) = self.fixed {
            return v;
        }
        let n = self.graph.num_nodes() as NodeId;
        loop {
            let v = self.rng.gen_range(0..n);
            if self.graph.out_degree(v) != 0 {
                return v;
            }
        }
    }
}
