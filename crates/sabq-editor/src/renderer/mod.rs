//! Type dispatch from a block to its editing view.
//!
//! Each [`BlockType`] maps to one [`BlockEditor`]. The renderer turns a block
//! into a [`BlockView`] that a front end can draw, and routes edits made in
//! that view back into the store as content updates.

mod editors;
mod labels;

pub use editors::{default_editor, HeadingEditor, ListEditor, TextFieldsEditor};
pub use labels::{block_label, field_label};

use crate::blocks::{BlockType, ContentBlock};
use crate::config::{TextDirection, Theme, ViewConfig};
use crate::store::BlockStore;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    LongText,
    Url,
    Level,
    Toggle,
    Items,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn new(key: &'static str, kind: FieldKind) -> Self {
        Self { key, kind }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(i64),
    Toggle(bool),
    Items(Vec<String>),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Field {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub value: FieldValue,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViewBody {
    Fields { fields: Vec<Field> },
    Unimplemented { message: String },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BlockView {
    pub id: String,
    pub block_type: BlockType,
    pub order: usize,
    pub direction: TextDirection,
    pub theme: Theme,
    pub body: ViewBody,
}

impl BlockView {
    pub fn field(&self, key: &str) -> Option<&Field> {
        match &self.body {
            ViewBody::Fields { fields } => fields.iter().find(|field| field.key == key),
            ViewBody::Unimplemented { .. } => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.body, ViewBody::Unimplemented { .. })
    }
}

/// An edit made in a block's view.
#[derive(Clone, Debug, PartialEq)]
pub enum BlockEdit {
    SetText { field: String, value: String },
    SetLevel(i64),
    SetToggle { field: String, value: bool },
    AddItem,
    EditItem { index: usize, value: String },
    RemoveItem { index: usize },
}

pub trait BlockEditor {
    fn block_type(&self) -> BlockType;

    /// Current values of the editable fields. Missing or mistyped content
    /// yields default values.
    fn fields(&self, content: &Value) -> Vec<(FieldSpec, FieldValue)>;

    /// New content after `edit`, or `None` when the edit does not apply to
    /// this kind of block.
    fn apply(&self, content: &Value, edit: &BlockEdit) -> Option<Value>;
}

pub struct BlockRenderer {
    editors: HashMap<BlockType, Box<dyn BlockEditor>>,
}

impl Default for BlockRenderer {
    fn default() -> Self {
        let mut renderer = Self::empty();
        for block_type in BlockType::ALL {
            renderer.register(default_editor(block_type));
        }
        renderer
    }
}

impl BlockRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A renderer with no editors; every block renders as a placeholder.
    pub fn empty() -> Self {
        Self {
            editors: HashMap::new(),
        }
    }

    pub fn register(&mut self, editor: Box<dyn BlockEditor>) {
        self.editors.insert(editor.block_type(), editor);
    }

    pub fn render(&self, block: &ContentBlock, view: &ViewConfig) -> BlockView {
        let body = match self.editors.get(&block.block_type) {
            Some(editor) => ViewBody::Fields {
                fields: editor
                    .fields(&block.content)
                    .into_iter()
                    .map(|(spec, value)| Field {
                        key: spec.key,
                        label: field_label(spec.key, view.locale),
                        kind: spec.kind,
                        value,
                    })
                    .collect(),
            },
            None => ViewBody::Unimplemented {
                message: labels::unimplemented_message(block.block_type, view.locale),
            },
        };
        BlockView {
            id: block.id.clone(),
            block_type: block.block_type,
            order: block.order,
            direction: view.locale.direction(),
            theme: view.theme,
            body,
        }
    }

    pub fn render_all(&self, store: &BlockStore, view: &ViewConfig) -> Vec<BlockView> {
        store
            .blocks()
            .iter()
            .map(|block| self.render(block, view))
            .collect()
    }

    /// Applies `edit` to the block's content through the store. Returns
    /// `false` for unknown blocks, missing editors and edits that do not fit
    /// the block type.
    pub fn apply_edit(&self, store: &mut BlockStore, block_id: &str, edit: &BlockEdit) -> bool {
        let Some(block) = store.get(block_id) else {
            return false;
        };
        let Some(editor) = self.editors.get(&block.block_type) else {
            return false;
        };
        let Some(content) = editor.apply(&block.content, edit) else {
            debug!(block_id, block_type = %block.block_type, ?edit, "edit does not apply");
            return false;
        };
        store.update_content(block_id, content)
    }
}
