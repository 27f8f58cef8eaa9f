//! Flat on-disk CSR layout.
//!
//! ```text
//! FileHeader (40 bytes)
//! out offsets        [u64; num_nodes + 1]
//! out neighbors      [D;   num_edges_directed]
//! inverse offsets    [u64; num_nodes + 1]      (FLAG_INVERSE only)
//! inverse neighbors  [D;   inverse_edges]      (FLAG_INVERSE only)
//! ```
//!
//! All integers are native-endian; `D` is `u32` or the 8-byte `WNode` pair.
//! [`load`] knows the file length up front and reads arrays straight into
//! allocator-owned buffers. [`read_graph`] trusts nothing about the stream
//! length and stages arrays on the heap in bounded chunks first.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use zerocopy::{AsBytes, FromBytes, FromZeroes};

use crate::alloc::{SharedAlloc, StorageBuf};
use crate::error::{GraphError, Result};
use crate::graph::csr_graph::{Adjacency, CsrGraph};
use crate::graph::types::{Neighbor, NodeId};

/// File signature.
pub const MAGIC: [u8; 8] = *b"GAPCSR\0\0";
/// Current layout version.
pub const FORMAT_VERSION: u32 = 1;

/// Neighbor entries carry weights.
pub const FLAG_WEIGHTED: u32 = 1;
/// The graph is directed.
pub const FLAG_DIRECTED: u32 = 1 << 1;
/// An inverse adjacency follows the forward one.
pub const FLAG_INVERSE: u32 = 1 << 2;

/// Fixed-size file header.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsBytes, FromBytes, FromZeroes)]
pub struct FileHeader {
    /// [`MAGIC`].
    pub magic: [u8; 8],
    /// [`FORMAT_VERSION`].
    pub version: u32,
    /// `FLAG_*` bits.
    pub flags: u32,
    /// Vertex count.
    pub num_nodes: u64,
    /// Forward neighbor entries.
    pub num_edges_directed: u64,
    /// Inverse neighbor entries (0 without an inverse).
    pub inverse_edges: u64,
}

/// Entries read per step when the stream length is unknown.
const READ_CHUNK: usize = 1 << 20;

impl FileHeader {
    fn describe<D: Neighbor>(graph: &CsrGraph<D>) -> Self {
        let mut flags = 0;
        if D::WEIGHTED {
            flags |= FLAG_WEIGHTED;
        }
        if graph.directed() {
            flags |= FLAG_DIRECTED;
        }
        let inverse_edges = match graph.inverse_adjacency() {
            Some(inv) => {
                flags |= FLAG_INVERSE;
                inv.neighbors().len() as u64
            }
            None => 0,
        };
        Self {
            magic: MAGIC,
            version: FORMAT_VERSION,
            flags,
            num_nodes: graph.num_nodes() as u64,
            num_edges_directed: graph.num_edges_directed() as u64,
            inverse_edges,
        }
    }

    /// Whether neighbor entries carry weights.
    pub fn weighted(&self) -> bool {
        self.flags & FLAG_WEIGHTED != 0
    }

    /// Whether the graph is directed.
    pub fn directed(&self) -> bool {
        self.flags & FLAG_DIRECTED != 0
    }

    /// Whether an inverse adjacency is stored.
    pub fn has_inverse(&self) -> bool {
        self.flags & FLAG_INVERSE != 0
    }

    fn check(&self) -> Result<()> {
        if self.magic != MAGIC {
            return Err(GraphError::Format("not a CSR graph file (bad magic)".into()));
        }
        if self.version != FORMAT_VERSION {
            return Err(GraphError::Format(format!(
                "unsupported format version {} (expected {FORMAT_VERSION})",
                self.version
            )));
        }
        if self.flags & !(FLAG_WEIGHTED | FLAG_DIRECTED | FLAG_INVERSE) != 0 {
            return Err(GraphError::Format(format!("unknown flags {:#x}", self.flags)));
        }
        if self.has_inverse() && !self.directed() {
            return Err(GraphError::Format(
                "inverse adjacency on an undirected graph".into(),
            ));
        }
        if !self.has_inverse() && self.inverse_edges != 0 {
            return Err(GraphError::Format(
                "inverse edge count without an inverse adjacency".into(),
            ));
        }
        if self.num_nodes > u64::from(NodeId::MAX) {
            return Err(GraphError::Format(format!(
                "vertex count {} exceeds the id space",
                self.num_nodes
            )));
        }
        let payload = self.payload_len(if self.weighted() { 8 } else { 4 });
        if payload.map_or(true, |len| len > isize::MAX as u64) {
            return Err(GraphError::Format(
                "header counts imply an unaddressable file size".into(),
            ));
        }
        Ok(())
    }

    /// Total file size implied by the header, if it fits in `u64`.
    fn payload_len(&self, neighbor_size: u64) -> Option<u64> {
        let offsets = self.num_nodes.checked_add(1)?.checked_mul(8)?;
        let directions = if self.has_inverse() { 2 } else { 1 };
        let edges = self.num_edges_directed.checked_add(self.inverse_edges)?;
        (core::mem::size_of::<Self>() as u64)
            .checked_add(offsets.checked_mul(directions)?)?
            .checked_add(edges.checked_mul(neighbor_size)?)
    }
}

/// Serializes `graph` into `w`.
///
/// # Errors
/// Propagates I/O failures.
pub fn write_graph<D: Neighbor, W: Write>(graph: &CsrGraph<D>, w: &mut W) -> Result<()> {
    let header = FileHeader::describe(graph);
    w.write_all(header.as_bytes())?;
    write_adjacency(graph.out_adjacency(), w)?;
    if let Some(inv) = graph.inverse_adjacency() {
        write_adjacency(inv, w)?;
    }
    w.flush()?;
    Ok(())
}

fn write_adjacency<D: Neighbor, W: Write>(adj: &Adjacency<D>, w: &mut W) -> Result<()> {
    w.write_all(adj.offsets().as_bytes())?;
    w.write_all(adj.neighbors().as_bytes())?;
    Ok(())
}

/// Reads and checks a header.
///
/// # Errors
/// [`GraphError::Format`] for a bad signature, version or flag combination.
pub fn read_header<R: Read>(r: &mut R) -> Result<FileHeader> {
    let mut header = FileHeader::new_zeroed();
    r.read_exact(header.as_bytes_mut())?;
    header.check()?;
    Ok(header)
}

/// Deserializes a graph from `r`, placing its arrays in `alloc`.
///
/// # Errors
/// - [`GraphError::Format`] if the header or any CSR invariant is violated,
///   or if the stored weightedness differs from `D`
/// - [`GraphError::Io`] on short reads
pub fn read_graph<D: Neighbor, R: Read>(r: &mut R, alloc: &SharedAlloc) -> Result<CsrGraph<D>> {
    let header = read_header(r)?;
    read_body(&header, r, alloc, Staging::Chunked)
}

/// How array bytes reach their final buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Staging {
    /// The stream length was checked against the header.
    Direct,
    /// Unknown length; grow a heap copy as bytes actually arrive.
    Chunked,
}

fn read_body<D: Neighbor, R: Read>(
    header: &FileHeader,
    r: &mut R,
    alloc: &SharedAlloc,
    staging: Staging,
) -> Result<CsrGraph<D>> {
    if header.weighted() != D::WEIGHTED {
        return Err(GraphError::Format(format!(
            "file holds a {} graph",
            if header.weighted() { "weighted" } else { "unweighted" }
        )));
    }
    let num_nodes = usize::try_from(header.num_nodes)
        .map_err(|_| GraphError::Format("vertex count exceeds the address space".into()))?;
    let out = read_adjacency(r, alloc, num_nodes, header.num_edges_directed, staging)?;
    let inverse = if header.has_inverse() {
        Some(read_adjacency(r, alloc, num_nodes, header.inverse_edges, staging)?)
    } else {
        None
    };
    CsrGraph::from_csr_parts(num_nodes, header.directed(), out, inverse)
}

fn read_adjacency<D: Neighbor, R: Read>(
    r: &mut R,
    alloc: &SharedAlloc,
    num_nodes: usize,
    num_entries: u64,
    staging: Staging,
) -> Result<Adjacency<D>> {
    let num_entries = usize::try_from(num_entries)
        .map_err(|_| GraphError::Format("edge count exceeds the address space".into()))?;
    let offsets = read_array::<u64, R>(r, alloc, num_nodes + 1, staging)?;
    let neighbors = read_array::<D, R>(r, alloc, num_entries, staging)?;
    if offsets[num_nodes] != num_entries as u64 {
        return Err(GraphError::Format(format!(
            "offsets end at {} but the header declares {num_entries} entries",
            offsets[num_nodes]
        )));
    }
    Ok(Adjacency::from_buffers(offsets, neighbors))
}

fn read_array<T, R>(
    r: &mut R,
    alloc: &SharedAlloc,
    len: usize,
    staging: Staging,
) -> Result<StorageBuf<T>>
where
    T: AsBytes + FromBytes + FromZeroes + Copy + Send + Sync,
    R: Read,
{
    match staging {
        Staging::Direct => {
            let mut buf = StorageBuf::<T>::zeroed(alloc, len);
            r.read_exact(buf.as_bytes_mut())?;
            Ok(buf)
        }
        Staging::Chunked => {
            let mut staged: Vec<T> = Vec::new();
            while staged.len() < len {
                let start = staged.len();
                let step = (len - start).min(READ_CHUNK);
                staged.resize(start + step, T::new_zeroed());
                r.read_exact(staged[start..].as_bytes_mut())?;
            }
            Ok(StorageBuf::from_slice(alloc, &staged))
        }
    }
}

/// Writes `graph` to `path`.
///
/// # Errors
/// Propagates I/O failures.
pub fn save<D: Neighbor>(graph: &CsrGraph<D>, path: impl AsRef<Path>) -> Result<()> {
    let mut w = BufWriter::new(File::create(path.as_ref())?);
    write_graph(graph, &mut w)?;
    tracing::info!(path = %path.as_ref().display(), "graph written");
    Ok(())
}

/// Reads only the header of the file at `path`.
///
/// # Errors
/// See [`read_header`].
pub fn peek_header(path: impl AsRef<Path>) -> Result<FileHeader> {
    read_header(&mut File::open(path)?)
}

/// Loads the graph stored at `path` into `alloc`.
///
/// The file length must match the header exactly; the check runs before any
/// array is allocated.
///
/// # Errors
/// See [`read_graph`].
pub fn load<D: Neighbor>(path: impl AsRef<Path>, alloc: &SharedAlloc) -> Result<CsrGraph<D>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let file_len = file.metadata()?.len();
    let mut r = BufReader::new(file);
    let header = read_header(&mut r)?;
    let expected = header.payload_len(core::mem::size_of::<D>() as u64);
    if expected != Some(file_len) {
        return Err(GraphError::Format(format!(
            "file is {file_len} bytes, header implies {}",
            expected.map_or_else(|| "an overflowing size".to_string(), |n| n.to_string())
        )));
    }
    let graph = read_body(&header, &mut r, alloc, Staging::Direct)?;
    tracing::info!(
        path = %path.display(),
        nodes = graph.num_nodes(),
        edges = graph.num_edges(),
        allocator = alloc.name(),
        "graph loaded"
    );
    Ok(graph)
}

impl<D: Neighbor> CsrGraph<D> {
    /// Writes the graph to `path` in the flat CSR layout.
    ///
    /// # Errors
    /// Propagates I/O failures.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        save(self, path)
    }
}
