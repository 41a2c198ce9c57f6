//! Remote collection gateway.
//!
//! The synchronization core only sees the [`Gateway`] trait; [`HttpGateway`]
//! talks to the real server and tests substitute scripted implementations.
mod http;

use crate::model::{
    CrawlResult, CreateFeedOutcome, Feed, FeedErrors, FeedId, FeedPatch, Folder, FolderId,
    FolderPatch, ItemDetail, ItemId, ItemPage, ItemQuery, ItemStatus, NewFeed, ServerStatus,
    SettingsPatch, TagId, TagSnapshot,
};
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

pub use http::HttpGateway;

// ============================================================================
// Error Types
// ============================================================================

/// Failure of one gateway call. The core never retries; callers log and move on.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Invalid server URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Failed to read upload: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// Gateway
// ============================================================================

/// Asynchronous operations offered by the feed server.
///
/// Every method is a single round-trip with no retry and no client-side timeout
/// beyond the transport's own.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Fetch-in-progress flag plus per-feed counters.
    async fn status(&self) -> Result<ServerStatus, ApiError>;

    async fn list_folders(&self) -> Result<Vec<Folder>, ApiError>;
    async fn create_folder(&self, title: &str) -> Result<Folder, ApiError>;
    async fn update_folder(&self, id: FolderId, patch: &FolderPatch) -> Result<(), ApiError>;
    async fn delete_folder(&self, id: FolderId) -> Result<(), ApiError>;

    async fn list_feeds(&self) -> Result<Vec<Feed>, ApiError>;
    /// Subscribe to a url. Ambiguous or empty discovery is reported in the outcome.
    async fn create_feed(&self, feed: &NewFeed) -> Result<CreateFeedOutcome, ApiError>;
    async fn update_feed(&self, id: FeedId, patch: &FeedPatch) -> Result<(), ApiError>;
    async fn delete_feed(&self, id: FeedId) -> Result<(), ApiError>;
    /// Ask the server to fetch every feed now.
    async fn refresh_feeds(&self) -> Result<(), ApiError>;
    async fn list_feed_errors(&self) -> Result<FeedErrors, ApiError>;

    async fn list_items(&self, query: &ItemQuery) -> Result<ItemPage, ApiError>;
    async fn get_item(&self, id: ItemId) -> Result<ItemDetail, ApiError>;
    async fn update_item(&self, id: ItemId, status: ItemStatus) -> Result<(), ApiError>;
    /// Mark every item matched by `query` as read.
    async fn mark_read(&self, query: &ItemQuery) -> Result<(), ApiError>;

    async fn list_tags(&self) -> Result<TagSnapshot, ApiError>;
    /// Replace a feed's tags from a comma-separated list of names.
    async fn update_tags(&self, feed_id: FeedId, tags: &str) -> Result<(), ApiError>;
    async fn update_tag_parent(&self, tag: TagId, parent: Option<TagId>) -> Result<(), ApiError>;

    async fn update_settings(&self, patch: &SettingsPatch) -> Result<(), ApiError>;
    /// Server-side full-text extraction of an article page.
    async fn crawl(&self, url: &str) -> Result<CrawlResult, ApiError>;

    async fn logout(&self) -> Result<(), ApiError>;
    async fn upload_opml(&self, path: &Path) -> Result<(), ApiError>;
}
