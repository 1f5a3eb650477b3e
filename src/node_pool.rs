//! Chunked node pool.
//!
//! Chain nodes are handed out from fixed-size chunks; `ChunkLayout` picks
//! how many nodes a chunk holds. Released nodes go onto a free list that is
//! threaded through their `next` links, so steady-state insert/erase never
//! touches the allocator. Nodes are addressed by `NodeId` rather than by
//! pointer; chunks never move their nodes, and the pool only frees whole
//! chunks on `clear` or drop.

use crate::error::{TableError, TableResult};
use core::mem::size_of;
use core::num::NonZeroU32;

pub const CACHE_LINE_SIZE: usize = 64;
pub const CHUNK_LOWER_BOUND: usize = 32;
pub const CHUNK_UPPER_BOUND: usize = 128;

/// Index of a node in the pool. Stored off by one so `Option<NodeId>`
/// stays four bytes.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub(crate) struct NodeId(NonZeroU32);

impl NodeId {
    fn from_index(index: usize) -> Option<Self> {
        let raw = u32::try_from(index.checked_add(1)?).ok()?;
        NonZeroU32::new(raw).map(NodeId)
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0.get() as usize - 1
    }
}

/// One element of the table plus its links through the global order.
#[derive(Debug)]
pub(crate) struct Node<E> {
    pub prev: Option<NodeId>,
    pub next: Option<NodeId>,
    pub hash: u64,
    value: Option<E>,
}

impl<E> Node<E> {
    const fn vacant(next: Option<NodeId>) -> Self {
        Self {
            prev: None,
            next,
            hash: 0,
            value: None,
        }
    }

    #[inline]
    pub fn value(&self) -> Option<&E> {
        self.value.as_ref()
    }

    #[inline]
    pub fn value_mut(&mut self) -> Option<&mut E> {
        self.value.as_mut()
    }

    /// Element of a node that is known to be linked into the table.
    #[inline]
    pub fn elem(&self) -> &E {
        self.value
            .as_ref()
            .expect("linked node must hold an element")
    }

    #[inline]
    pub fn elem_mut(&mut self) -> &mut E {
        self.value
            .as_mut()
            .expect("linked node must hold an element")
    }
}

/// Chunk sizing policy for a given node size.
///
/// `nodes` is the smallest count in `[32, 128)` for which a byte budget of
/// `nodes * node_size + size_of::<usize>()` (the nodes plus one chunk link
/// word) is a multiple of the cache line size. When no such count exists
/// the chunk holds 128 nodes and `padding` rounds the budget up to the next
/// cache line.
///
/// Only `nodes` shapes the allocation: a chunk is a boxed slice of exactly
/// `nodes` nodes (`chunk_bytes`), aligned like a node. The link word and
/// padding are part of the budget, not of the allocation, and chunks are
/// not cache-line aligned.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ChunkLayout {
    pub nodes: usize,
    pub node_size: usize,
    pub padding: usize,
}

impl ChunkLayout {
    pub const fn for_node_size(node_size: usize) -> Self {
        let link = size_of::<usize>();
        let mut n = CHUNK_LOWER_BOUND;
        while n < CHUNK_UPPER_BOUND {
            if (n * node_size + link) % CACHE_LINE_SIZE == 0 {
                return Self {
                    nodes: n,
                    node_size,
                    padding: 0,
                };
            }
            n += 1;
        }
        let raw = CHUNK_UPPER_BOUND * node_size + link;
        Self {
            nodes: CHUNK_UPPER_BOUND,
            node_size,
            padding: (CACHE_LINE_SIZE - raw % CACHE_LINE_SIZE) % CACHE_LINE_SIZE,
        }
    }

    /// Bytes actually allocated per chunk.
    pub const fn chunk_bytes(&self) -> usize {
        self.nodes * self.node_size
    }

    /// Byte budget per chunk: `chunk_bytes` plus the link word and padding.
    pub const fn footprint(&self) -> usize {
        self.nodes * self.node_size + size_of::<usize>() + self.padding
    }
}

pub(crate) struct NodePool<E> {
    chunks: Vec<Box<[Node<E>]>>,
    free: Option<NodeId>,
    layout: ChunkLayout,
    live: usize,
}

impl<E> NodePool<E> {
    pub fn new() -> Self {
        Self {
            chunks: Vec::new(),
            free: None,
            layout: ChunkLayout::for_node_size(size_of::<Node<E>>()),
            live: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn layout(&self) -> ChunkLayout {
        self.layout
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    #[inline]
    fn locate(&self, id: NodeId) -> (usize, usize) {
        let i = id.index();
        (i / self.layout.nodes, i % self.layout.nodes)
    }

    /// Node behind `id`, or `None` if its chunk no longer exists.
    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&Node<E>> {
        let (c, s) = self.locate(id);
        self.chunks.get(c).map(|chunk| &chunk[s])
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node<E>> {
        let (c, s) = self.locate(id);
        self.chunks.get_mut(c).map(|chunk| &mut chunk[s])
    }

    /// Node behind an id taken from the table's own links.
    #[inline]
    pub fn node(&self, id: NodeId) -> &Node<E> {
        let (c, s) = self.locate(id);
        &self.chunks[c][s]
    }

    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node<E> {
        let (c, s) = self.locate(id);
        &mut self.chunks[c][s]
    }

    /// Takes a node off the free list and stores `value` in it. The node's
    /// links are cleared; linking it into the table is the caller's job.
    pub fn request(&mut self, hash: u64, value: E) -> TableResult<NodeId> {
        if self.free.is_none() {
            self.grow()?;
        }
        let id = self.free.ok_or(TableError::AllocFailed)?;
        let node = self.node_mut(id);
        let next_free = node.next;
        node.prev = None;
        node.next = None;
        node.hash = hash;
        node.value = Some(value);
        self.free = next_free;
        self.live += 1;
        Ok(id)
    }

    /// Returns a node to the free list and hands back its element.
    pub fn release(&mut self, id: NodeId) -> Option<E> {
        let free = self.free;
        let node = self.node_mut(id);
        let value = node.value.take();
        node.prev = None;
        node.next = free;
        node.hash = 0;
        self.free = Some(id);
        self.live -= 1;
        value
    }

    fn grow(&mut self) -> TableResult<()> {
        let per_chunk = self.layout.nodes;
        let base = self
            .chunks
            .len()
            .checked_mul(per_chunk)
            .ok_or(TableError::CapacityOverflow)?;
        // every slot of the new chunk must be addressable
        base.checked_add(per_chunk - 1)
            .and_then(NodeId::from_index)
            .ok_or(TableError::CapacityOverflow)?;

        self.chunks.try_reserve(1)?;
        let mut nodes: Vec<Node<E>> = Vec::new();
        nodes.try_reserve_exact(per_chunk)?;
        // Thread the new slots onto the free list in slot order.
        for i in base..base + per_chunk - 1 {
            nodes.push(Node::vacant(NodeId::from_index(i + 1)));
        }
        nodes.push(Node::vacant(self.free));
        self.free = NodeId::from_index(base);
        self.chunks.push(nodes.into_boxed_slice());

        log::trace!(
            "node pool: chunk #{} ({} nodes, {} bytes)",
            self.chunks.len(),
            per_chunk,
            self.layout.footprint()
        );
        Ok(())
    }

    /// Drops every chunk. All ids become dangling.
    pub fn clear(&mut self) {
        self.chunks.clear();
        self.free = None;
        self.live = 0;
    }
}
