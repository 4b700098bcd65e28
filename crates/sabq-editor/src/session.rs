use crate::api::{id_to_string, ApiError, ArticleClient, ArticleRecord, SaveResponse};
use crate::blocks::{BlockType, ContentBlock};
use crate::config::Locale;
use crate::drag::DragState;
use crate::notifications::NotificationCenter;
use crate::ordering::Direction;
use crate::persistence::{self, ArticlePayload, LoadError, LoadPolicy, CONTENT_BLOCKS_FIELD};
use crate::renderer::{BlockEdit, BlockRenderer};
use crate::store::{BlockChange, BlockStore};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::fmt;
use tracing::{debug, info, warn};

#[derive(Debug)]
pub enum SessionError {
    Api(ApiError),
    Load(LoadError),
}

impl From<ApiError> for SessionError {
    fn from(err: ApiError) -> Self {
        Self::Api(err)
    }
}

impl From<LoadError> for SessionError {
    fn from(err: LoadError) -> Self {
        Self::Load(err)
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Api(err) => err.fmt(f),
            SessionError::Load(err) => write!(f, "article content is invalid: {err}"),
        }
    }
}

impl std::error::Error for SessionError {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    Failed,
    AlreadySaving,
}

/// One article being authored: its metadata, blocks, drag state and save
/// bookkeeping.
#[derive(Debug)]
pub struct DraftSession {
    article_id: Option<String>,
    fields: Map<String, Value>,
    store: BlockStore,
    drag: DragState,
    saving: bool,
    pending_digest: Option<String>,
    saved_digest: String,
    last_saved_at: Option<DateTime<Utc>>,
    notifications: NotificationCenter,
}

impl DraftSession {
    pub fn new(locale: Locale) -> Self {
        let store = BlockStore::new();
        Self {
            article_id: None,
            fields: Map::new(),
            saved_digest: persistence::digest(store.blocks()),
            store,
            drag: DragState::Idle,
            saving: false,
            pending_digest: None,
            last_saved_at: None,
            notifications: NotificationCenter::new(locale),
        }
    }

    /// Builds a session from an article object. `content_blocks` is parsed
    /// with `policy`; a missing field starts an empty draft.
    pub fn from_article(
        mut record: ArticleRecord,
        policy: LoadPolicy,
        locale: Locale,
    ) -> Result<Self, LoadError> {
        let blocks = persistence::from_content_blocks(record.get(CONTENT_BLOCKS_FIELD), policy)?;
        record.remove(CONTENT_BLOCKS_FIELD);
        let article_id = record.remove("id").as_ref().and_then(id_to_string);

        let mut session = Self::new(locale);
        session.article_id = article_id;
        session.fields = record;
        session.store = BlockStore::from_blocks(blocks);
        session.saved_digest = persistence::digest(session.store.blocks());
        Ok(session)
    }

    pub fn open(
        client: &dyn ArticleClient,
        article_id: &str,
        policy: LoadPolicy,
        locale: Locale,
    ) -> Result<Self, SessionError> {
        let record = client.load_article(article_id)?;
        let mut session = Self::from_article(record, policy, locale)?;
        if session.article_id.is_none() {
            session.article_id = Some(article_id.to_string());
        }
        info!(article_id, blocks = session.store.len(), "opened draft");
        Ok(session)
    }

    /// Replaces the draft with the server copy. On failure the current
    /// blocks are kept and an error notification is raised.
    pub fn reload(&mut self, client: &dyn ArticleClient, policy: LoadPolicy) -> bool {
        let Some(article_id) = self.article_id.clone() else {
            return false;
        };
        let loaded = client
            .load_article(&article_id)
            .map_err(SessionError::from)
            .and_then(|mut record| {
                let blocks =
                    persistence::from_content_blocks(record.get(CONTENT_BLOCKS_FIELD), policy)?;
                record.remove(CONTENT_BLOCKS_FIELD);
                record.remove("id");
                Ok((record, blocks))
            });
        match loaded {
            Ok((fields, blocks)) => {
                self.fields = fields;
                self.store.replace_all(blocks);
                self.drag.cancel();
                self.saved_digest = persistence::digest(self.store.blocks());
                true
            }
            Err(err) => {
                warn!(article_id = %article_id, error = %err, "reload failed");
                self.notifications.load_failed(err.to_string());
                false
            }
        }
    }

    pub fn article_id(&self) -> Option<&str> {
        self.article_id.as_deref()
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn set_field(&mut self, key: &str, value: Value) {
        if key == CONTENT_BLOCKS_FIELD || key == "id" {
            return;
        }
        self.fields.insert(key.to_string(), value);
    }

    pub fn store(&self) -> &BlockStore {
        &self.store
    }

    /// Block changes since the last call, for refreshing rendered views.
    pub fn take_changes(&mut self) -> Vec<BlockChange> {
        self.store.drain_changes()
    }

    pub fn blocks(&self) -> &[ContentBlock] {
        self.store.blocks()
    }

    pub fn drag_state(&self) -> &DragState {
        &self.drag
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        self.last_saved_at
    }

    pub fn is_dirty(&self) -> bool {
        persistence::digest(self.store.blocks()) != self.saved_digest
    }

    pub fn append(&mut self, block_type: BlockType) -> String {
        self.store.append(block_type).id.clone()
    }

    pub fn move_block(&mut self, block_id: &str, direction: Direction) -> bool {
        self.store.move_block(block_id, direction)
    }

    pub fn remove(&mut self, block_id: &str) -> bool {
        self.store.remove(block_id).is_some()
    }

    pub fn update_content(&mut self, block_id: &str, content: Value) -> bool {
        self.store.update_content(block_id, content)
    }

    pub fn apply_edit(&mut self, renderer: &BlockRenderer, block_id: &str, edit: &BlockEdit) -> bool {
        renderer.apply_edit(&mut self.store, block_id, edit)
    }

    pub fn begin_drag(&mut self, block_id: &str) -> bool {
        self.drag.begin(&self.store, block_id)
    }

    pub fn drop_on(&mut self, target_id: &str) -> bool {
        self.drag.drop_on(&mut self.store, target_id)
    }

    pub fn cancel_drag(&mut self) {
        self.drag.cancel();
    }

    pub fn payload(&self) -> ArticlePayload {
        ArticlePayload::new(self.fields.clone(), self.store.blocks())
    }

    /// The whole article as one JSON object, `id` included when known.
    pub fn to_document(&self) -> Value {
        let mut document = self.payload().to_value();
        if let (Some(id), Value::Object(object)) = (self.article_id.as_ref(), &mut document) {
            object.insert("id".to_string(), Value::String(id.clone()));
        }
        document
    }

    /// Marks a save as in flight and returns what to send, or `None` when a
    /// save is already running.
    pub fn begin_save(&mut self) -> Option<ArticlePayload> {
        if self.saving {
            debug!("save already in flight");
            return None;
        }
        self.saving = true;
        self.pending_digest = Some(persistence::digest(self.store.blocks()));
        Some(self.payload())
    }

    pub fn finish_save(&mut self, result: Result<SaveResponse, ApiError>) -> SaveOutcome {
        self.saving = false;
        let pending_digest = self.pending_digest.take();
        match result {
            Ok(response) => {
                if self.article_id.is_none() {
                    self.article_id = response.article_id();
                }
                if let Some(digest) = pending_digest {
                    self.saved_digest = digest;
                }
                self.last_saved_at = Some(Utc::now());
                self.notifications.saved(response.message);
                SaveOutcome::Saved
            }
            Err(err) => {
                warn!(article_id = self.article_id.as_deref(), error = %err, "save failed");
                self.notifications.failed(err.to_string());
                SaveOutcome::Failed
            }
        }
    }

    pub fn save_with(&mut self, client: &dyn ArticleClient) -> SaveOutcome {
        let Some(payload) = self.begin_save() else {
            return SaveOutcome::AlreadySaving;
        };
        let result = client.save_article(self.article_id.as_deref(), &payload);
        self.finish_save(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_server::serve_once;
    use crate::api::HttpArticleClient;
    use crate::notifications::NotificationKind;
    use std::time::Duration;
    use serde_json::json;
    use std::cell::RefCell;

    #[derive(Default)]
    struct FakeClient {
        record: Option<ArticleRecord>,
        fail_saves: bool,
        saved: RefCell<Vec<(Option<String>, Value)>>,
    }

    impl ArticleClient for FakeClient {
        fn load_article(&self, article_id: &str) -> Result<ArticleRecord, ApiError> {
            self.record.clone().ok_or_else(|| ApiError::Status {
                code: 404,
                message: format!("article {article_id} not found"),
            })
        }

        fn save_article(
            &self,
            article_id: Option<&str>,
            payload: &ArticlePayload,
        ) -> Result<SaveResponse, ApiError> {
            if self.fail_saves {
                return Err(ApiError::Transport("connection reset".to_string()));
            }
            self.saved
                .borrow_mut()
                .push((article_id.map(str::to_string), payload.to_value()));
            Ok(SaveResponse {
                success: true,
                message: None,
                id: Some(json!(101)),
                data: None,
            })
        }
    }

    fn record(value: Value) -> ArticleRecord {
        match value {
            Value::Object(object) => object,
            _ => panic!("record must be an object"),
        }
    }

    #[test]
    fn new_session_is_clean_and_empty() {
        let session = DraftSession::new(Locale::Ar);
        assert!(session.blocks().is_empty());
        assert!(!session.is_dirty());
        assert!(session.article_id().is_none());
    }

    #[test]
    fn from_article_splits_metadata_and_blocks() {
        let session = DraftSession::from_article(
            record(json!({
                "id": 12,
                "title": "t",
                "content_blocks": [
                    { "id": "b", "type": "quote", "content": { "text": "q" }, "order": 1 },
                    { "id": "a", "type": "paragraph", "content": { "text": "p" }, "order": 0 }
                ]
            })),
            LoadPolicy::Strict,
            Locale::Ar,
        )
        .expect("load");
        assert_eq!(session.article_id(), Some("12"));
        assert_eq!(session.fields().get("title"), Some(&json!("t")));
        assert!(!session.fields().contains_key(CONTENT_BLOCKS_FIELD));
        assert_eq!(session.blocks()[0].id, "a");
        assert!(!session.is_dirty());
    }

    #[test]
    fn second_save_is_blocked_while_in_flight() {
        let mut session = DraftSession::new(Locale::En);
        session.append(BlockType::Paragraph);
        assert!(session.begin_save().is_some());
        assert!(session.is_saving());
        assert!(session.begin_save().is_none());

        let outcome = session.finish_save(Ok(SaveResponse {
            success: true,
            ..SaveResponse::default()
        }));
        assert_eq!(outcome, SaveOutcome::Saved);
        assert!(!session.is_saving());
        assert!(session.begin_save().is_some());
    }

    #[test]
    fn successful_save_clears_dirty_and_adopts_id() {
        let client = FakeClient::default();
        let mut session = DraftSession::new(Locale::En);
        session.set_field("title", json!("Breaking"));
        let id = session.append(BlockType::Heading);
        assert!(session.is_dirty());

        assert_eq!(session.save_with(&client), SaveOutcome::Saved);
        assert!(!session.is_dirty());
        assert_eq!(session.article_id(), Some("101"));
        assert!(session.last_saved_at().is_some());

        let saved = client.saved.borrow();
        assert_eq!(saved[0].0, None);
        assert_eq!(saved[0].1["title"], json!("Breaking"));
        assert_eq!(saved[0].1["content_blocks"][0]["id"], json!(id));

        let latest = session.notifications().latest().expect("notification");
        assert_eq!(latest.kind, NotificationKind::Success);
    }

    #[test]
    fn failed_save_keeps_blocks_and_notifies() {
        let client = FakeClient {
            fail_saves: true,
            ..FakeClient::default()
        };
        let mut session = DraftSession::new(Locale::En);
        session.append(BlockType::Quote);
        session.append(BlockType::List);
        let before = session.blocks().to_vec();

        assert_eq!(session.save_with(&client), SaveOutcome::Failed);
        assert_eq!(session.blocks(), before.as_slice());
        assert!(session.is_dirty());
        assert!(!session.is_saving());
        let latest = session.notifications().latest().expect("notification");
        assert_eq!(latest.kind, NotificationKind::Error);
        assert!(latest.message.contains("connection reset"));
        assert!(client.saved.borrow().is_empty());
    }

    #[test]
    fn edits_while_saving_stay_dirty() {
        let mut session = DraftSession::new(Locale::En);
        let id = session.append(BlockType::Paragraph);
        session.begin_save().expect("payload");
        session.update_content(&id, json!({ "text": "typed during save" }));
        session.finish_save(Ok(SaveResponse {
            success: true,
            ..SaveResponse::default()
        }));
        assert!(session.is_dirty());
    }

    #[test]
    fn reload_failure_keeps_current_blocks() {
        let client = FakeClient::default();
        let mut session = DraftSession::from_article(
            record(json!({ "id": "5", "content_blocks": [] })),
            LoadPolicy::Strict,
            Locale::En,
        )
        .expect("load");
        session.append(BlockType::Tweet);
        assert!(!session.reload(&client, LoadPolicy::Strict));
        assert_eq!(session.blocks().len(), 1);
        assert_eq!(session.notifications().active_count(), 1);
    }

    #[test]
    fn reload_replaces_blocks_from_server() {
        let client = FakeClient {
            record: Some(record(json!({
                "id": "5",
                "content_blocks": [
                    { "id": "srv", "type": "highlight", "content": { "text": "h" }, "order": 0 }
                ]
            }))),
            ..FakeClient::default()
        };
        let mut session = DraftSession::from_article(
            record(json!({ "id": "5" })),
            LoadPolicy::Strict,
            Locale::En,
        )
        .expect("load");
        let local = session.append(BlockType::Paragraph);
        session.begin_drag(&local);
        assert!(session.reload(&client, LoadPolicy::Strict));
        assert_eq!(session.blocks()[0].id, "srv");
        assert_eq!(session.drag_state(), &DragState::Idle);
        assert!(!session.is_dirty());
    }

    #[test]
    fn open_propagates_invalid_content() {
        let client = FakeClient {
            record: Some(record(json!({
                "content_blocks": [{ "id": "x", "type": "carousel", "content": {}, "order": 0 }]
            }))),
            ..FakeClient::default()
        };
        let err = DraftSession::open(&client, "3", LoadPolicy::Strict, Locale::En)
            .expect_err("invalid");
        assert!(matches!(err, SessionError::Load(_)));

        let session = DraftSession::open(&client, "3", LoadPolicy::Lenient, Locale::En)
            .expect("lenient");
        assert!(session.blocks().is_empty());
        assert_eq!(session.article_id(), Some("3"));
    }

    #[test]
    fn change_queue_stays_small_under_typing() {
        let mut session = DraftSession::new(Locale::En);
        let id = session.append(BlockType::Paragraph);
        for n in 0..10_000 {
            session.update_content(&id, json!({ "text": "x".repeat(n % 7) }));
        }
        assert_eq!(session.take_changes().len(), 2);
        assert!(session.take_changes().is_empty());

        let other = session.append(BlockType::Quote);
        session.move_block(&other, Direction::Up);
        assert_eq!(session.take_changes().len(), 2);
    }

    #[test]
    fn open_fails_on_error_envelope() {
        let (base, server) =
            serve_once(200, r#"{"success":false,"message":"Article not found"}"#);
        let client = HttpArticleClient::new(&base, Duration::from_secs(5));
        let err = DraftSession::open(&client, "42", LoadPolicy::Strict, Locale::En)
            .expect_err("load failure");
        assert!(matches!(err, SessionError::Api(ApiError::Rejected(_))));
        server.join().expect("server");
    }

    #[test]
    fn reload_after_error_envelope_keeps_blocks() {
        let mut session = DraftSession::from_article(
            record(json!({ "id": "42", "title": "draft" })),
            LoadPolicy::Strict,
            Locale::En,
        )
        .expect("load");
        session.append(BlockType::Heading);
        session.append(BlockType::Paragraph);
        let before = session.blocks().to_vec();

        let (base, server) =
            serve_once(200, r#"{"success":false,"message":"Article not found"}"#);
        let client = HttpArticleClient::new(&base, Duration::from_secs(5));
        assert!(!session.reload(&client, LoadPolicy::Strict));
        server.join().expect("server");

        assert_eq!(session.blocks(), before.as_slice());
        assert_eq!(session.fields().get("title"), Some(&json!("draft")));
        assert!(!session.fields().contains_key("success"));
        assert_eq!(session.notifications().active_count(), 1);
        let latest = session.notifications().latest().expect("notification");
        assert_eq!(latest.kind, NotificationKind::Error);
        assert!(latest.message.contains("Article not found"));
    }

    #[test]
    fn drag_drop_through_session() {
        let mut session = DraftSession::new(Locale::Ar);
        let a = session.append(BlockType::Paragraph);
        let b = session.append(BlockType::Image);
        assert!(session.begin_drag(&b));
        assert!(session.drop_on(&a));
        assert_eq!(session.blocks()[0].id, b);
        assert!(!session.drag_state().is_dragging());
    }

    #[test]
    fn document_includes_id() {
        let session = DraftSession::from_article(
            record(json!({ "id": "77", "title": "x" })),
            LoadPolicy::Strict,
            Locale::En,
        )
        .expect("load");
        let document = session.to_document();
        assert_eq!(document["id"], json!("77"));
        assert_eq!(document["content_blocks"], json!([]));
    }

    #[test]
    fn set_field_ignores_reserved_keys() {
        let mut session = DraftSession::new(Locale::En);
        session.set_field("content_blocks", json!("nope"));
        session.set_field("id", json!("nope"));
        assert!(session.fields().is_empty());
    }
}
