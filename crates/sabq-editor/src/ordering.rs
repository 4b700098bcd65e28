//! Order-maintaining mutations over a draft's block collection.
//!
//! Every function expects `blocks` sorted by `order` with orders `0..len`
//! and leaves it that way. Operations that cannot apply (unknown id, move
//! past an edge, drop onto itself) return `false` and touch nothing.

use crate::blocks::{BlockType, ContentBlock};
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "up" => Some(Direction::Up),
            "down" => Some(Direction::Down),
            _ => None,
        }
    }
}

pub fn position(blocks: &[ContentBlock], block_id: &str) -> Option<usize> {
    blocks.iter().position(|block| block.id == block_id)
}

/// Rewrites every `order` from the block's index.
pub fn renumber(blocks: &mut [ContentBlock]) {
    for (ix, block) in blocks.iter_mut().enumerate() {
        block.order = ix;
    }
}

/// Stable sort by the incoming `order`, then renumber densely.
pub fn normalize(blocks: &mut [ContentBlock]) {
    blocks.sort_by_key(|block| block.order);
    renumber(blocks);
}

pub fn is_dense(blocks: &[ContentBlock]) -> bool {
    blocks
        .iter()
        .enumerate()
        .all(|(ix, block)| block.order == ix)
}

pub fn append(blocks: &mut Vec<ContentBlock>, block_type: BlockType) -> &ContentBlock {
    let order = blocks.len();
    blocks.push(ContentBlock::new(block_type, order));
    &blocks[order]
}

pub fn move_block(blocks: &mut [ContentBlock], block_id: &str, direction: Direction) -> bool {
    let Some(ix) = position(blocks, block_id) else {
        return false;
    };
    let neighbor = match direction {
        Direction::Up if ix > 0 => ix - 1,
        Direction::Down if ix + 1 < blocks.len() => ix + 1,
        _ => return false,
    };
    blocks.swap(ix, neighbor);
    blocks[ix].order = ix;
    blocks[neighbor].order = neighbor;
    true
}

pub fn remove(blocks: &mut Vec<ContentBlock>, block_id: &str) -> Option<ContentBlock> {
    let ix = position(blocks, block_id)?;
    let removed = blocks.remove(ix);
    for block in &mut blocks[ix..] {
        block.order -= 1;
    }
    Some(removed)
}

/// Moves `dragged_id` so that it sits directly before `target_id`.
pub fn reorder(blocks: &mut Vec<ContentBlock>, dragged_id: &str, target_id: &str) -> bool {
    if dragged_id == target_id {
        return false;
    }
    let Some(from) = position(blocks, dragged_id) else {
        return false;
    };
    if position(blocks, target_id).is_none() {
        return false;
    }
    let dragged = blocks.remove(from);
    let to = position(blocks, target_id).unwrap_or(blocks.len());
    if to == from {
        blocks.insert(from, dragged);
        return false;
    }
    blocks.insert(to, dragged);
    renumber(blocks);
    true
}

pub fn update_content(blocks: &mut [ContentBlock], block_id: &str, content: Value) -> bool {
    match blocks.iter_mut().find(|block| block.id == block_id) {
        Some(block) => {
            block.content = content;
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn block(id: &str, block_type: BlockType, order: usize) -> ContentBlock {
        ContentBlock::with_content(id, block_type, block_type.default_content(), order)
    }

    fn ids(blocks: &[ContentBlock]) -> Vec<&str> {
        blocks.iter().map(|block| block.id.as_str()).collect()
    }

    fn five() -> Vec<ContentBlock> {
        ["a", "b", "c", "d", "e"]
            .iter()
            .enumerate()
            .map(|(ix, id)| block(id, BlockType::Paragraph, ix))
            .collect()
    }

    #[test]
    fn append_lands_last() {
        let mut blocks = five();
        let appended = append(&mut blocks, BlockType::Quote).clone();
        assert_eq!(appended.order, 5);
        assert_eq!(blocks.last().map(|b| b.id.as_str()), Some(appended.id.as_str()));
        assert!(is_dense(&blocks));
    }

    #[test]
    fn append_after_emptying_starts_at_zero() {
        let mut blocks = vec![block("a", BlockType::Image, 0)];
        assert!(remove(&mut blocks, "a").is_some());
        let appended = append(&mut blocks, BlockType::Tweet);
        assert_eq!(appended.order, 0);
    }

    #[test]
    fn move_up_swaps_with_previous() {
        let mut blocks = five();
        assert!(move_block(&mut blocks, "c", Direction::Up));
        assert_eq!(ids(&blocks), vec!["a", "c", "b", "d", "e"]);
        assert!(is_dense(&blocks));
    }

    #[test]
    fn move_down_swaps_with_next() {
        let mut blocks = five();
        assert!(move_block(&mut blocks, "a", Direction::Down));
        assert_eq!(ids(&blocks), vec!["b", "a", "c", "d", "e"]);
        assert!(is_dense(&blocks));
    }

    #[test]
    fn move_past_edges_is_noop() {
        let mut blocks = five();
        let before = blocks.clone();
        assert!(!move_block(&mut blocks, "a", Direction::Up));
        assert!(!move_block(&mut blocks, "e", Direction::Down));
        assert!(!move_block(&mut blocks, "missing", Direction::Up));
        assert_eq!(blocks, before);
    }

    #[test]
    fn remove_middle_keeps_relative_order() {
        let mut blocks = five();
        let removed = remove(&mut blocks, "c").expect("remove");
        assert_eq!(removed.id, "c");
        assert_eq!(ids(&blocks), vec!["a", "b", "d", "e"]);
        let orders: Vec<usize> = blocks.iter().map(|b| b.order).collect();
        assert_eq!(orders, vec![0, 1, 2, 3]);
    }

    #[test]
    fn remove_unknown_is_noop() {
        let mut blocks = five();
        assert!(remove(&mut blocks, "zzz").is_none());
        assert_eq!(blocks.len(), 5);
    }

    #[test]
    fn reorder_onto_self_is_noop() {
        let mut blocks = five();
        let before = blocks.clone();
        assert!(!reorder(&mut blocks, "b", "b"));
        assert_eq!(blocks, before);
    }

    #[test]
    fn reorder_missing_ids_is_noop() {
        let mut blocks = five();
        let before = blocks.clone();
        assert!(!reorder(&mut blocks, "missing", "b"));
        assert!(!reorder(&mut blocks, "b", "missing"));
        assert_eq!(blocks, before);
    }

    #[test]
    fn reorder_upward_places_before_target() {
        let mut blocks = five();
        assert!(reorder(&mut blocks, "d", "b"));
        assert_eq!(ids(&blocks), vec!["a", "d", "b", "c", "e"]);
        assert!(is_dense(&blocks));
    }

    #[test]
    fn reorder_downward_places_before_target() {
        let mut blocks = five();
        assert!(reorder(&mut blocks, "a", "d"));
        assert_eq!(ids(&blocks), vec!["b", "c", "a", "d", "e"]);
        assert!(is_dense(&blocks));
    }

    #[test]
    fn reorder_onto_next_neighbor_changes_nothing() {
        let mut blocks = five();
        let before = blocks.clone();
        assert!(!reorder(&mut blocks, "b", "c"));
        assert_eq!(blocks, before);
    }

    #[test]
    fn update_content_keeps_id_and_order() {
        let mut blocks = five();
        assert!(update_content(&mut blocks, "b", json!({ "anything": true })));
        assert_eq!(blocks[1].id, "b");
        assert_eq!(blocks[1].order, 1);
        assert_eq!(blocks[1].content, json!({ "anything": true }));
        assert!(!update_content(&mut blocks, "missing", json!({})));
    }

    #[test]
    fn normalize_sorts_and_closes_gaps() {
        let mut blocks = vec![
            block("c", BlockType::Paragraph, 9),
            block("a", BlockType::Paragraph, 1),
            block("b", BlockType::Paragraph, 4),
        ];
        normalize(&mut blocks);
        assert_eq!(ids(&blocks), vec!["a", "b", "c"]);
        assert!(is_dense(&blocks));
    }

    #[test]
    fn density_holds_across_mixed_operations() {
        let mut blocks: Vec<ContentBlock> = Vec::new();
        let kinds = BlockType::ALL;
        let mut seed: u64 = 0x5eed;
        for step in 0..400 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let roll = (seed >> 33) as usize;
            let pick = |blocks: &[ContentBlock], salt: usize| -> Option<String> {
                if blocks.is_empty() {
                    None
                } else {
                    Some(blocks[(roll + salt) % blocks.len()].id.clone())
                }
            };
            match roll % 5 {
                0 | 1 => {
                    append(&mut blocks, kinds[step % kinds.len()]);
                }
                2 => {
                    if let Some(id) = pick(blocks.as_slice(), 0) {
                        remove(&mut blocks, &id);
                    }
                }
                3 => {
                    if let Some(id) = pick(blocks.as_slice(), 1) {
                        let direction = if roll % 2 == 0 { Direction::Up } else { Direction::Down };
                        move_block(&mut blocks, &id, direction);
                    }
                }
                _ => {
                    if let (Some(dragged), Some(target)) = (pick(blocks.as_slice(), 0), pick(blocks.as_slice(), 3)) {
                        reorder(&mut blocks, &dragged, &target);
                    }
                }
            }
            assert!(is_dense(&blocks), "orders not dense after step {step}");
        }
    }

    #[test]
    fn direction_parse() {
        assert_eq!(Direction::parse("UP"), Some(Direction::Up));
        assert_eq!(Direction::parse("down"), Some(Direction::Down));
        assert_eq!(Direction::parse("left"), None);
    }
}
