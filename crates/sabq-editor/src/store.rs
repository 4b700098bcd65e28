use crate::blocks::{BlockType, ContentBlock};
use crate::ordering::{self, Direction};
use serde_json::Value;
use tracing::debug;

#[derive(Clone, Debug, PartialEq)]
pub enum BlockChange {
    Appended { id: String },
    Moved { id: String, direction: Direction },
    Removed { id: String },
    Reordered { dragged_id: String, target_id: String },
    ContentUpdated { id: String },
    Replaced,
}

/// The block collection of one draft, kept sorted by `order`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BlockStore {
    blocks: Vec<ContentBlock>,
    revision: u64,
    pending: Vec<BlockChange>,
}

impl BlockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes ownership of an already-dense collection, e.g. one produced by
    /// the persistence adapter.
    pub fn from_blocks(mut blocks: Vec<ContentBlock>) -> Self {
        ordering::normalize(&mut blocks);
        Self {
            blocks,
            revision: 0,
            pending: Vec::new(),
        }
    }

    pub fn blocks(&self) -> &[ContentBlock] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn get(&self, block_id: &str) -> Option<&ContentBlock> {
        self.blocks.iter().find(|block| block.id == block_id)
    }

    pub fn position(&self, block_id: &str) -> Option<usize> {
        ordering::position(&self.blocks, block_id)
    }

    pub fn append(&mut self, block_type: BlockType) -> &ContentBlock {
        let id = ordering::append(&mut self.blocks, block_type).id.clone();
        debug!(block_id = %id, %block_type, "appended block");
        self.record(BlockChange::Appended { id });
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn move_block(&mut self, block_id: &str, direction: Direction) -> bool {
        if !ordering::move_block(&mut self.blocks, block_id, direction) {
            return false;
        }
        debug!(block_id, ?direction, "moved block");
        self.record(BlockChange::Moved {
            id: block_id.to_string(),
            direction,
        });
        true
    }

    pub fn remove(&mut self, block_id: &str) -> Option<ContentBlock> {
        let removed = ordering::remove(&mut self.blocks, block_id)?;
        debug!(block_id, remaining = self.blocks.len(), "removed block");
        self.record(BlockChange::Removed {
            id: removed.id.clone(),
        });
        Some(removed)
    }

    pub fn reorder(&mut self, dragged_id: &str, target_id: &str) -> bool {
        if !ordering::reorder(&mut self.blocks, dragged_id, target_id) {
            return false;
        }
        debug!(dragged_id, target_id, "reordered block");
        self.record(BlockChange::Reordered {
            dragged_id: dragged_id.to_string(),
            target_id: target_id.to_string(),
        });
        true
    }

    pub fn update_content(&mut self, block_id: &str, content: Value) -> bool {
        if !ordering::update_content(&mut self.blocks, block_id, content) {
            return false;
        }
        self.record(BlockChange::ContentUpdated {
            id: block_id.to_string(),
        });
        true
    }

    pub fn replace_all(&mut self, blocks: Vec<ContentBlock>) {
        let mut blocks = blocks;
        ordering::normalize(&mut blocks);
        self.blocks = blocks;
        self.record(BlockChange::Replaced);
    }

    /// Changes since the last drain, oldest first. Back-to-back content
    /// updates to one block collapse into a single entry, and a replace
    /// supersedes everything queued before it.
    pub fn drain_changes(&mut self) -> Vec<BlockChange> {
        std::mem::take(&mut self.pending)
    }

    fn record(&mut self, change: BlockChange) {
        self.revision += 1;
        match (&change, self.pending.last()) {
            (BlockChange::Replaced, _) => self.pending.clear(),
            (BlockChange::ContentUpdated { id }, Some(BlockChange::ContentUpdated { id: last }))
                if id == last =>
            {
                return;
            }
            _ => {}
        }
        self.pending.push(change);
    }
}
