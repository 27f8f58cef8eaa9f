//! Process-wide context that owns the storage strategy.
//!
//! The strategy is chosen once, before any graph exists, and every buffer a
//! builder or loader produces keeps a handle to it. An arena region therefore
//! stays mapped until the last graph built in it is dropped.

use std::path::Path;
use std::sync::Arc;

use crate::alloc::{AllocatorChoice, HeapAlloc, SharedAlloc};
#[cfg(unix)]
use crate::alloc::RegionArena;
use crate::error::Result;
use crate::graph::builder::{BuildOptions, Builder};
use crate::graph::csr_graph::CsrGraph;
use crate::graph::io;
use crate::graph::types::Neighbor;

/// Owns the allocator graphs are built in.
#[derive(Debug, Clone)]
pub struct Session {
    alloc: SharedAlloc,
    choice: AllocatorChoice,
}

impl Session {
    /// Sets up the strategy named by `choice`.
    ///
    /// `FixedRegion` maps physical memory through `/dev/mem`. The configured
    /// range must be reserved from the kernel (for example with `memmap=`) and
    /// mapping it usually requires root and `iomem=relaxed`.
    ///
    /// # Errors
    /// [`GraphError::Alloc`](crate::GraphError::Alloc) if the region cannot be mapped, and
    /// [`GraphError::Config`](crate::GraphError::Config) for region strategies on non-Unix targets.
    pub fn new(choice: &AllocatorChoice) -> Result<Self> {
        let alloc: SharedAlloc = match *choice {
            AllocatorChoice::Heap => Arc::new(HeapAlloc::new()),
            #[cfg(unix)]
            AllocatorChoice::FixedRegion { base_address, size } => {
                // SAFETY: the operator configured this range as reserved for us.
                Arc::new(unsafe { RegionArena::map_physical(base_address, size)? })
            }
            #[cfg(unix)]
            AllocatorChoice::AnonymousRegion { size } => Arc::new(RegionArena::anonymous(size)?),
            #[cfg(not(unix))]
            _ => {
                return Err(crate::error::GraphError::Config(
                    "region allocators are only available on Unix".into(),
                ))
            }
        };
        tracing::debug!(allocator = alloc.name(), "session ready");
        Ok(Self {
            alloc,
            choice: *choice,
        })
    }

    /// A session over the process heap.
    pub fn heap() -> Self {
        Self {
            alloc: Arc::new(HeapAlloc::new()),
            choice: AllocatorChoice::Heap,
        }
    }

    /// The shared allocator handle.
    pub fn allocator(&self) -> &SharedAlloc {
        &self.alloc
    }

    /// The strategy this session was created with.
    pub fn choice(&self) -> &AllocatorChoice {
        &self.choice
    }

    /// Bytes consumed so far, for strategies that track it.
    pub fn used_bytes(&self) -> Option<usize> {
        self.alloc.used_bytes()
    }

    /// A builder whose graphs live in this session's storage.
    pub fn builder<D: Neighbor>(&self, options: BuildOptions) -> Builder<D> {
        Builder::new(Arc::clone(&self.alloc), options)
    }

    /// Loads a persisted graph into this session's storage.
    ///
    /// # Errors
    /// See [`io::load`].
    pub fn load<D: Neighbor>(&self, path: impl AsRef<Path>) -> Result<CsrGraph<D>> {
        io::load(path, &self.alloc)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::heap()
    }
}
