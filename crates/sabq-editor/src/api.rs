//! Client for the external article-storage API.

use crate::persistence::ArticlePayload;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;
use std::time::Duration;
use tracing::{info, warn};

/// An article as returned by the storage API. Only `id` and
/// `content_blocks` are interpreted; every other field is carried as-is.
pub type ArticleRecord = Map<String, Value>;

#[derive(Debug)]
pub enum ApiError {
    Transport(String),
    Status { code: u16, message: String },
    Rejected(String),
    Decode(serde_json::Error),
    Io(std::io::Error),
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err)
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<ureq::Error> for ApiError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, response) => {
                let body = response.into_string().unwrap_or_default();
                Self::Status {
                    code,
                    message: error_message(&body).unwrap_or(body),
                }
            }
            ureq::Error::Transport(transport) => Self::Transport(transport.to_string()),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Transport(message) => write!(f, "could not reach the server: {message}"),
            ApiError::Status { code, message } if message.is_empty() => {
                write!(f, "server responded with status {code}")
            }
            ApiError::Status { code, message } => {
                write!(f, "server responded with status {code}: {message}")
            }
            ApiError::Rejected(message) => write!(f, "server rejected the article: {message}"),
            ApiError::Decode(err) => write!(f, "unexpected response body: {err}"),
            ApiError::Io(err) => write!(f, "failed to read response: {err}"),
        }
    }
}

impl std::error::Error for ApiError {}

fn error_message(body: &str) -> Option<String> {
    match serde_json::from_str(body).ok()? {
        Value::Object(object) => envelope_message(&object),
        _ => None,
    }
}

fn envelope_message(object: &Map<String, Value>) -> Option<String> {
    ["message", "error"]
        .iter()
        .find_map(|key| object.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct SaveResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub data: Option<Value>,
}

impl SaveResponse {
    /// Id the server assigned or confirmed, looking in `id` then `data.id`.
    pub fn article_id(&self) -> Option<String> {
        self.id
            .as_ref()
            .or_else(|| self.data.as_ref().and_then(|data| data.get("id")))
            .and_then(id_to_string)
    }
}

pub fn id_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(id) if !id.trim().is_empty() => Some(id.trim().to_string()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

pub trait ArticleClient {
    fn load_article(&self, article_id: &str) -> Result<ArticleRecord, ApiError>;

    /// Creates the article when `article_id` is `None`, updates it otherwise.
    fn save_article(
        &self,
        article_id: Option<&str>,
        payload: &ArticlePayload,
    ) -> Result<SaveResponse, ApiError>;
}

pub struct HttpArticleClient {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpArticleClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn articles_url(&self) -> String {
        format!("{}/api/articles", self.base_url)
    }

    /// The id is percent-encoded so `/`, `?` and `#` stay inside the segment.
    fn article_url(&self, article_id: &str) -> String {
        format!(
            "{}/{}",
            self.articles_url(),
            urlencoding::encode(article_id.trim())
        )
    }
}

impl ArticleClient for HttpArticleClient {
    fn load_article(&self, article_id: &str) -> Result<ArticleRecord, ApiError> {
        let url = self.article_url(article_id);
        let response = self
            .agent
            .get(&url)
            .set("Accept", "application/json")
            .call()?;
        let body = response.into_string()?;
        let value: Value = serde_json::from_str(&body)?;
        let record = unwrap_article(article_id, value).map_err(|err| {
            warn!(article_id, error = %err, "article load rejected");
            err
        })?;
        info!(article_id, "loaded article");
        Ok(record)
    }

    fn save_article(
        &self,
        article_id: Option<&str>,
        payload: &ArticlePayload,
    ) -> Result<SaveResponse, ApiError> {
        let body = serde_json::to_string(payload)?;
        let request = match article_id {
            Some(id) => self.agent.put(&self.article_url(id)),
            None => self.agent.post(&self.articles_url()),
        };
        let response = request
            .set("Content-Type", "application/json")
            .set("Accept", "application/json")
            .send_string(&body)?;
        let text = response.into_string()?;
        let parsed: SaveResponse = serde_json::from_str(&text)?;
        if !parsed.success {
            let message = parsed.message.unwrap_or_default();
            warn!(article_id, %message, "article save rejected");
            return Err(ApiError::Rejected(message));
        }
        let saved_id = parsed.article_id();
        info!(
            article_id = saved_id.as_deref().or(article_id),
            blocks = payload.content_blocks.len(),
            "saved article"
        );
        Ok(parsed)
    }
}

/// Accepts both a bare article object and the `{ "data": {...} }` /
/// `{ "article": {...} }` envelopes. A body with `"success": false`, or an
/// envelope with no article in it, is a failed load.
fn unwrap_article(article_id: &str, value: Value) -> Result<ArticleRecord, ApiError> {
    let Value::Object(mut object) = value else {
        return Err(ApiError::Rejected(format!(
            "article {article_id} response is not an object"
        )));
    };
    let Some(success) = object.get("success").map(|flag| flag.as_bool() == Some(true)) else {
        return Ok(object);
    };
    if !success {
        return Err(ApiError::Rejected(envelope_message(&object).unwrap_or_else(
            || format!("article {article_id} could not be loaded"),
        )));
    }
    for key in ["data", "article"] {
        if let Some(Value::Object(inner)) = object.get_mut(key) {
            return Ok(std::mem::take(inner));
        }
    }
    if object.contains_key("content_blocks") || object.contains_key("id") {
        object.remove("success");
        object.remove("message");
        return Ok(object);
    }
    Err(ApiError::Rejected(format!(
        "article {article_id} response carries no article"
    )))
}
