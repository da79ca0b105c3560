//! Block-allocated node store
//!
//! The arena owns every node of a resolution graph. Storage grows one fixed-size
//! block at a time and nodes are addressed by [`NodeId`] indices, so adding a block
//! never invalidates a handle. Nodes are never freed one by one: [`NodeArena::reset`]
//! releases everything at once.

use thiserror::Error;

use crate::models::{Node, NodeId, ReleaseStats, Target};

/// Number of node slots per block.
pub const BLOCK_SIZE: usize = 16;

/// Default hard limit on the number of blocks.
pub const MAX_BLOCKS: usize = 4096;

/// Error raised while building an arena.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArenaError {
    /// The arena reached its block limit
    #[error("node arena full: limit of {max_blocks} blocks ({} nodes) reached", max_blocks * BLOCK_SIZE)]
    CapacityExceeded { max_blocks: usize },
    /// A node failed shape validation
    #[error("invalid node {id}: {reason}")]
    InvalidNode { id: NodeId, reason: String },
    /// A handle does not refer to an allocated slot
    #[error("unknown node {0}")]
    UnknownNode(NodeId),
}

/// A reference from one node to a slot that does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DanglingLink {
    pub from: NodeId,
    pub to: NodeId,
}

/// Index-addressed block store of resolver nodes.
#[derive(Debug, Clone)]
pub struct NodeArena {
    blocks: Vec<Vec<Node>>,
    len: usize,
    max_blocks: usize,
}

impl Default for NodeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeArena {
    /// Create an empty arena with the default block limit.
    pub fn new() -> Self {
        Self::with_max_blocks(MAX_BLOCKS)
    }

    /// Create an empty arena that refuses to grow past `max_blocks` blocks.
    pub fn with_max_blocks(max_blocks: usize) -> Self {
        Self { blocks: Vec::new(), len: 0, max_blocks }
    }

    /// Number of allocated nodes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of blocks currently held.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Maximum number of nodes this arena may hold.
    pub fn capacity_limit(&self) -> usize {
        self.max_blocks * BLOCK_SIZE
    }

    /// Allocate a zeroed slot, growing by one block when the current one is full.
    pub fn allocate(&mut self) -> Result<NodeId, ArenaError> {
        let id = u32::try_from(self.len)
            .map_err(|_| ArenaError::CapacityExceeded { max_blocks: self.max_blocks })?;
        if self.len % BLOCK_SIZE == 0 {
            if self.blocks.len() >= self.max_blocks {
                return Err(ArenaError::CapacityExceeded { max_blocks: self.max_blocks });
            }
            self.blocks.push(Vec::with_capacity(BLOCK_SIZE));
        }

        if let Some(block) = self.blocks.last_mut() {
            block.push(Node::default());
        }
        self.len += 1;
        Ok(NodeId(id))
    }

    /// Allocate a slot and store `node` in it.
    pub fn insert(&mut self, node: Node) -> Result<NodeId, ArenaError> {
        let id = self.allocate()?;
        self.set(id, node)?;
        Ok(id)
    }

    /// Store `node` in a previously allocated slot.
    ///
    /// Used while a graph is being constructed, before it is shared with a resolver.
    pub fn set(&mut self, id: NodeId, node: Node) -> Result<(), ArenaError> {
        node.validate().map_err(|reason| ArenaError::InvalidNode { id, reason })?;
        let slot = self.slot_mut(id).ok_or(ArenaError::UnknownNode(id))?;
        *slot = node;
        Ok(())
    }

    /// Look up a node.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        let index = id.index();
        self.blocks.get(index / BLOCK_SIZE)?.get(index % BLOCK_SIZE)
    }

    fn slot_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let index = id.index();
        self.blocks.get_mut(index / BLOCK_SIZE)?.get_mut(index % BLOCK_SIZE)
    }

    /// Iterate over all nodes in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.blocks.iter().flatten().enumerate().map(|(i, node)| (NodeId(i as u32), node))
    }

    /// Find every child reference that points outside the arena.
    pub fn validate_links(&self) -> Vec<DanglingLink> {
        let mut dangling = Vec::new();
        for (from, node) in self.iter() {
            for to in node.targets().into_iter().flatten() {
                if self.get(to).is_none() {
                    dangling.push(DanglingLink { from, to });
                }
            }
        }
        dangling
    }

    /// Whether `target` is null or refers to an allocated slot.
    pub fn contains_target(&self, target: Target) -> bool {
        target.map_or(true, |id| self.get(id).is_some())
    }

    /// Release every node and block.
    ///
    /// Each node drops the sub-lists its kind owns before the blocks themselves go.
    /// Previously issued handles become unknown.
    pub fn reset(&mut self) -> ReleaseStats {
        let mut stats = ReleaseStats::default();
        for block in &mut self.blocks {
            for node in block.iter_mut() {
                node.release(&mut stats);
            }
        }
        let blocks = self.blocks.len();
        self.blocks = Vec::new();
        self.len = 0;
        tracing::debug!(
            blocks,
            nodes = stats.nodes,
            adjustments = stats.adjustments,
            ranges = stats.ranges,
            targets = stats.targets,
            "Released node arena"
        );
        stats
    }
}
