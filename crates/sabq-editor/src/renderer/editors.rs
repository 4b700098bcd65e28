use super::{BlockEdit, BlockEditor, FieldKind, FieldSpec, FieldValue};
use crate::blocks::BlockType;
use serde_json::{Map, Value};

const MIN_HEADING_LEVEL: i64 = 1;
const MAX_HEADING_LEVEL: i64 = 6;
const DEFAULT_HEADING_LEVEL: i64 = 2;

const PARAGRAPH_FIELDS: &[FieldSpec] = &[FieldSpec::new("text", FieldKind::LongText)];
const QUOTE_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("text", FieldKind::LongText),
    FieldSpec::new("author", FieldKind::Text),
];
const IMAGE_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("url", FieldKind::Url),
    FieldSpec::new("caption", FieldKind::Text),
    FieldSpec::new("alt", FieldKind::Text),
];
const VIDEO_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("url", FieldKind::Url),
    FieldSpec::new("caption", FieldKind::Text),
];
const TWEET_FIELDS: &[FieldSpec] = &[FieldSpec::new("url", FieldKind::Url)];
const LINK_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("url", FieldKind::Url),
    FieldSpec::new("text", FieldKind::Text),
];
const HIGHLIGHT_FIELDS: &[FieldSpec] = &[FieldSpec::new("text", FieldKind::LongText)];

/// The editor each block type gets out of the box.
pub fn default_editor(block_type: BlockType) -> Box<dyn BlockEditor> {
    match block_type {
        BlockType::Paragraph => Box::new(TextFieldsEditor::new(block_type, PARAGRAPH_FIELDS)),
        BlockType::Heading => Box::new(HeadingEditor),
        BlockType::Quote => Box::new(TextFieldsEditor::new(block_type, QUOTE_FIELDS)),
        BlockType::Image => Box::new(TextFieldsEditor::new(block_type, IMAGE_FIELDS)),
        BlockType::Video => Box::new(TextFieldsEditor::new(block_type, VIDEO_FIELDS)),
        BlockType::Tweet => Box::new(TextFieldsEditor::new(block_type, TWEET_FIELDS)),
        BlockType::List => Box::new(ListEditor),
        BlockType::Link => Box::new(TextFieldsEditor::new(block_type, LINK_FIELDS)),
        BlockType::Highlight => Box::new(TextFieldsEditor::new(block_type, HIGHLIGHT_FIELDS)),
    }
}

fn read_str(content: &Value, key: &str) -> String {
    content
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn read_bool(content: &Value, key: &str) -> bool {
    content.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn with_field(content: &Value, key: &str, value: Value) -> Value {
    let mut object = content.as_object().cloned().unwrap_or_else(Map::new);
    object.insert(key.to_string(), value);
    Value::Object(object)
}

/// Blocks whose content is a flat set of string fields.
pub struct TextFieldsEditor {
    block_type: BlockType,
    specs: &'static [FieldSpec],
}

impl TextFieldsEditor {
    pub fn new(block_type: BlockType, specs: &'static [FieldSpec]) -> Self {
        Self { block_type, specs }
    }

    fn owns(&self, field: &str) -> bool {
        self.specs.iter().any(|spec| spec.key == field)
    }
}

impl BlockEditor for TextFieldsEditor {
    fn block_type(&self) -> BlockType {
        self.block_type
    }

    fn fields(&self, content: &Value) -> Vec<(FieldSpec, FieldValue)> {
        self.specs
            .iter()
            .map(|spec| (*spec, FieldValue::Text(read_str(content, spec.key))))
            .collect()
    }

    fn apply(&self, content: &Value, edit: &BlockEdit) -> Option<Value> {
        match edit {
            BlockEdit::SetText { field, value } if self.owns(field) => {
                Some(with_field(content, field, Value::String(value.clone())))
            }
            _ => None,
        }
    }
}

pub struct HeadingEditor;

impl HeadingEditor {
    fn level(content: &Value) -> i64 {
        content
            .get("level")
            .and_then(Value::as_i64)
            .map(|level| level.clamp(MIN_HEADING_LEVEL, MAX_HEADING_LEVEL))
            .unwrap_or(DEFAULT_HEADING_LEVEL)
    }
}

impl BlockEditor for HeadingEditor {
    fn block_type(&self) -> BlockType {
        BlockType::Heading
    }

    fn fields(&self, content: &Value) -> Vec<(FieldSpec, FieldValue)> {
        vec![
            (
                FieldSpec::new("text", FieldKind::Text),
                FieldValue::Text(read_str(content, "text")),
            ),
            (
                FieldSpec::new("level", FieldKind::Level),
                FieldValue::Number(Self::level(content)),
            ),
        ]
    }

    fn apply(&self, content: &Value, edit: &BlockEdit) -> Option<Value> {
        match edit {
            BlockEdit::SetText { field, value } if field == "text" => {
                let mut next = with_field(content, "text", Value::String(value.clone()));
                if next.get("level").and_then(Value::as_i64).is_none() {
                    next = with_field(&next, "level", Value::from(DEFAULT_HEADING_LEVEL));
                }
                Some(next)
            }
            BlockEdit::SetLevel(level) => {
                let level = (*level).clamp(MIN_HEADING_LEVEL, MAX_HEADING_LEVEL);
                Some(with_field(content, "level", Value::from(level)))
            }
            _ => None,
        }
    }
}

/// Ordered or bulleted list. The item list never becomes empty.
pub struct ListEditor;

impl ListEditor {
    pub fn items(content: &Value) -> Vec<String> {
        let items: Vec<String> = content
            .get("items")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .map(|item| item.as_str().unwrap_or_default().to_string())
                    .collect()
            })
            .unwrap_or_default();
        if items.is_empty() {
            vec![String::new()]
        } else {
            items
        }
    }

    fn with_items(content: &Value, items: Vec<String>) -> Value {
        let items = if items.is_empty() {
            vec![String::new()]
        } else {
            items
        };
        let mut next = with_field(
            content,
            "items",
            Value::Array(items.into_iter().map(Value::String).collect()),
        );
        if next.get("ordered").and_then(Value::as_bool).is_none() {
            next = with_field(&next, "ordered", Value::Bool(false));
        }
        next
    }
}

impl BlockEditor for ListEditor {
    fn block_type(&self) -> BlockType {
        BlockType::List
    }

    fn fields(&self, content: &Value) -> Vec<(FieldSpec, FieldValue)> {
        vec![
            (
                FieldSpec::new("ordered", FieldKind::Toggle),
                FieldValue::Toggle(read_bool(content, "ordered")),
            ),
            (
                FieldSpec::new("items", FieldKind::Items),
                FieldValue::Items(Self::items(content)),
            ),
        ]
    }

    fn apply(&self, content: &Value, edit: &BlockEdit) -> Option<Value> {
        let mut items = Self::items(content);
        match edit {
            BlockEdit::SetToggle { field, value } if field == "ordered" => {
                let next = with_field(content, "ordered", Value::Bool(*value));
                return Some(Self::with_items(&next, items));
            }
            BlockEdit::AddItem => items.push(String::new()),
            BlockEdit::EditItem { index, value } => {
                let item = items.get_mut(*index)?;
                *item = value.clone();
            }
            BlockEdit::RemoveItem { index } => {
                if *index >= items.len() {
                    return None;
                }
                items.remove(*index);
            }
            _ => return None,
        }
        Some(Self::with_items(content, items))
    }
}
