//! Conversion between the in-memory block collection and the article's
//! `content_blocks` wire field.

use crate::blocks::ContentBlock;
use crate::ordering;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fmt;
use tracing::warn;

pub const CONTENT_BLOCKS_FIELD: &str = "content_blocks";

/// What to do with a `content_blocks` payload that does not parse cleanly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadPolicy {
    /// Reject the whole payload.
    #[default]
    Strict,
    /// Drop bad elements, then sort and renumber the rest.
    Lenient,
}

#[derive(Debug)]
pub enum LoadError {
    Malformed(serde_json::Error),
    NotAnArray,
    InvalidBlock {
        index: usize,
        source: serde_json::Error,
    },
    DuplicateId {
        index: usize,
        id: String,
    },
    NonContiguousOrder {
        position: usize,
        order: usize,
    },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Malformed(err) => write!(f, "{CONTENT_BLOCKS_FIELD} is not valid json: {err}"),
            LoadError::NotAnArray => write!(f, "{CONTENT_BLOCKS_FIELD} is not an array"),
            LoadError::InvalidBlock { index, source } => {
                write!(f, "block at index {index} is invalid: {source}")
            }
            LoadError::DuplicateId { index, id } => {
                write!(f, "block at index {index} repeats id {id}")
            }
            LoadError::NonContiguousOrder { position, order } => {
                write!(f, "expected order {position} but found {order}")
            }
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Malformed(err) => Some(err),
            LoadError::InvalidBlock { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Article body sent to the storage API: free-form metadata plus the blocks.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ArticlePayload {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    pub content_blocks: Vec<ContentBlock>,
}

impl ArticlePayload {
    pub fn new(mut fields: Map<String, Value>, blocks: &[ContentBlock]) -> Self {
        fields.remove(CONTENT_BLOCKS_FIELD);
        Self {
            fields,
            content_blocks: sorted(blocks),
        }
    }

    pub fn to_value(&self) -> Value {
        let mut object = self.fields.clone();
        object.insert(CONTENT_BLOCKS_FIELD.to_string(), to_content_blocks(&self.content_blocks));
        Value::Object(object)
    }
}

fn sorted(blocks: &[ContentBlock]) -> Vec<ContentBlock> {
    let mut blocks = blocks.to_vec();
    blocks.sort_by_key(|block| block.order);
    blocks
}

fn block_value(block: ContentBlock) -> Value {
    let mut object = Map::new();
    object.insert("id".to_string(), Value::String(block.id));
    object.insert(
        "type".to_string(),
        Value::String(block.block_type.as_str().to_string()),
    );
    object.insert("content".to_string(), block.content);
    object.insert("order".to_string(), Value::from(block.order));
    Value::Object(object)
}

pub fn to_content_blocks(blocks: &[ContentBlock]) -> Value {
    Value::Array(sorted(blocks).into_iter().map(block_value).collect())
}

pub fn from_content_blocks(
    value: Option<&Value>,
    policy: LoadPolicy,
) -> Result<Vec<ContentBlock>, LoadError> {
    let items = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => match policy {
            LoadPolicy::Strict => return Err(LoadError::NotAnArray),
            LoadPolicy::Lenient => {
                warn!("{CONTENT_BLOCKS_FIELD} is not an array, starting empty");
                return Ok(Vec::new());
            }
        },
    };

    let mut blocks = Vec::with_capacity(items.len());
    let mut seen = HashSet::new();
    for (index, item) in items.iter().enumerate() {
        let block = match serde_json::from_value::<ContentBlock>(item.clone()) {
            Ok(block) => block,
            Err(source) => match policy {
                LoadPolicy::Strict => return Err(LoadError::InvalidBlock { index, source }),
                LoadPolicy::Lenient => {
                    warn!(index, error = %source, "skipping invalid content block");
                    continue;
                }
            },
        };
        if !seen.insert(block.id.clone()) {
            match policy {
                LoadPolicy::Strict => {
                    return Err(LoadError::DuplicateId {
                        index,
                        id: block.id,
                    })
                }
                LoadPolicy::Lenient => {
                    warn!(index, block_id = %block.id, "skipping duplicate content block id");
                    continue;
                }
            }
        }
        blocks.push(block);
    }

    match policy {
        LoadPolicy::Strict => {
            blocks.sort_by_key(|block| block.order);
            if let Some((position, block)) = blocks
                .iter()
                .enumerate()
                .find(|(position, block)| block.order != *position)
            {
                return Err(LoadError::NonContiguousOrder {
                    position,
                    order: block.order,
                });
            }
        }
        LoadPolicy::Lenient => ordering::normalize(&mut blocks),
    }
    Ok(blocks)
}

pub fn parse_content_blocks(raw: &str, policy: LoadPolicy) -> Result<Vec<ContentBlock>, LoadError> {
    let value: Value = serde_json::from_str(raw).map_err(LoadError::Malformed)?;
    from_content_blocks(Some(&value), policy)
}

/// Stable fingerprint of a collection, used to tell whether a draft changed
/// since it was last saved or loaded.
pub fn digest(blocks: &[ContentBlock]) -> String {
    let serialized = to_content_blocks(blocks).to_string();
    let mut hasher = Sha256::new();
    hasher.update(serialized.as_bytes());
    hex::encode(hasher.finalize())
}
