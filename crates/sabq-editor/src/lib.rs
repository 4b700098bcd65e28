//! Block-based article editor for the Sabq newsroom.
//!
//! A draft is an ordered list of typed [`ContentBlock`]s whose `order`
//! values are always `0..len`. [`BlockStore`] owns the list, [`ordering`]
//! holds the mutations that keep it dense, [`renderer`] maps each block type
//! to its editing view, and [`persistence`] converts the list to and from the
//! article's `content_blocks` field. [`DraftSession`] ties these together with
//! the article API for loading and saving.

pub mod api;
pub mod blocks;
pub mod config;
pub mod drag;
pub mod notifications;
pub mod ordering;
pub mod persistence;
pub mod renderer;
pub mod session;
pub mod store;

pub use api::{ApiError, ArticleClient, ArticleRecord, HttpArticleClient, SaveResponse};
pub use blocks::{BlockType, ContentBlock};
pub use config::{ConfigStore, EditorConfig, Locale, Theme, ViewConfig};
pub use drag::DragState;
pub use ordering::Direction;
pub use persistence::{ArticlePayload, LoadError, LoadPolicy};
pub use renderer::{BlockEdit, BlockRenderer, BlockView};
pub use session::{DraftSession, SaveOutcome, SessionError};
pub use store::{BlockChange, BlockStore};
