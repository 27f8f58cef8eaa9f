//! Error types shared by the builder, the loader and the kernels.

use crate::alloc::AllocError;
use crate::graph::NodeId;

/// Errors raised while constructing, loading or running kernels over a graph.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// An edge endpoint lies outside the declared vertex range.
    #[error("edge ({src}, {dst}) references a vertex outside 0..{num_nodes}")]
    VertexOutOfRange {
        /// Source endpoint of the offending edge.
        src: u64,
        /// Destination endpoint of the offending edge.
        dst: u64,
        /// Declared vertex count.
        num_nodes: usize,
    },

    /// A duplicate edge was found while the merge policy rejects duplicates.
    #[error("duplicate edge ({src}, {dst}) rejected by merge policy")]
    DuplicateEdge {
        /// Source endpoint.
        src: NodeId,
        /// Destination endpoint.
        dst: NodeId,
    },

    /// Malformed graph data (edge stream or persisted CSR file).
    #[error("malformed graph data: {0}")]
    Format(String),

    /// A configuration value failed validation.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A vertex id passed to a kernel is out of range.
    #[error("vertex {vertex} out of range for graph with {num_nodes} vertices")]
    InvalidVertex {
        /// Offending vertex id.
        vertex: NodeId,
        /// Vertex count of the graph.
        num_nodes: usize,
    },

    /// The storage allocator could not be set up.
    #[error("storage allocator: {0}")]
    Alloc(#[from] AllocError),

    /// Underlying I/O failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The worker pool could not be created.
    #[error(transparent)]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// A configuration file could not be parsed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl GraphError {
    /// Whether the error reports malformed input data.
    ///
    /// [`Self::VertexOutOfRange`] and [`Self::DuplicateEdge`] are the edge
    /// stream's structured forms of [`Self::Format`]; all three abort a build
    /// or a load without producing a graph.
    pub fn is_format(&self) -> bool {
        matches!(
            self,
            Self::Format(_) | Self::VertexOutOfRange { .. } | Self::DuplicateEdge { .. }
        )
    }
}

/// Result type for graph operations.
pub type Result<T> = std::result::Result<T, GraphError>;
