use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    #[default]
    Paragraph,
    Heading,
    Quote,
    Image,
    Video,
    Tweet,
    List,
    Link,
    Highlight,
}

impl BlockType {
    pub const ALL: [BlockType; 9] = [
        BlockType::Paragraph,
        BlockType::Heading,
        BlockType::Quote,
        BlockType::Image,
        BlockType::Video,
        BlockType::Tweet,
        BlockType::List,
        BlockType::Link,
        BlockType::Highlight,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Paragraph => "paragraph",
            BlockType::Heading => "heading",
            BlockType::Quote => "quote",
            BlockType::Image => "image",
            BlockType::Video => "video",
            BlockType::Tweet => "tweet",
            BlockType::List => "list",
            BlockType::Link => "link",
            BlockType::Highlight => "highlight",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(raw))
    }

    /// Empty payload a freshly appended block starts with.
    pub fn default_content(&self) -> Value {
        match self {
            BlockType::Paragraph | BlockType::Highlight => json!({ "text": "" }),
            BlockType::Heading => json!({ "text": "", "level": 2 }),
            BlockType::Quote => json!({ "text": "", "author": "" }),
            BlockType::Image => json!({ "url": "", "caption": "", "alt": "" }),
            BlockType::Video => json!({ "url": "", "caption": "" }),
            BlockType::Tweet => json!({ "url": "" }),
            BlockType::List => json!({ "ordered": false, "items": [""] }),
            BlockType::Link => json!({ "url": "", "text": "" }),
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of article content. `order` is its zero-based position in the draft.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    pub id: String,
    #[serde(rename = "type")]
    pub block_type: BlockType,
    pub content: Value,
    pub order: usize,
}

impl ContentBlock {
    pub fn new(block_type: BlockType, order: usize) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            block_type,
            content: block_type.default_content(),
            order,
        }
    }

    pub fn with_content(id: &str, block_type: BlockType, content: Value, order: usize) -> Self {
        Self {
            id: id.to_string(),
            block_type,
            content,
            order,
        }
    }
}
