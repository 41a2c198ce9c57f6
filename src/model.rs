//! Data model shared by the gateway, the synchronization core, and the UI.
//!
//! Shapes mirror the server's JSON API. Everything here is plain data; the
//! in-memory model that owns these values lives in [`crate::state`].
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

pub type FolderId = i64;
pub type FeedId = i64;
pub type ItemId = i64;
pub type TagId = i64;

// ============================================================================
// Folders & Feeds
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: FolderId,
    pub title: String,
    #[serde(default)]
    pub is_expanded: bool,
}

/// A subscribed feed. `folder_id = None` places it in the unfiled bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feed {
    pub id: FeedId,
    pub title: String,
    #[serde(default)]
    pub folder_id: Option<FolderId>,
    #[serde(default)]
    pub filter_rule: Option<String>,
    #[serde(default)]
    pub readability: bool,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub feed_link: Option<String>,
}

// ============================================================================
// Items
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Unread,
    Read,
    Starred,
}

impl ItemStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unread => "unread",
            Self::Read => "read",
            Self::Starred => "starred",
        }
    }
}

/// Row in the item list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub feed_id: FeedId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    pub status: ItemStatus,
}

/// Full payload of one item, fetched lazily when it becomes selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDetail {
    pub id: ItemId,
    pub feed_id: FeedId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    pub status: ItemStatus,
}

/// One page of the item list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemPage {
    #[serde(default)]
    pub list: Vec<Item>,
    #[serde(default)]
    pub has_more: bool,
}

// ============================================================================
// Stats & Status
// ============================================================================

/// Per-feed counters. Refreshed wholesale on every status poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsEntry {
    pub feed_id: FeedId,
    #[serde(default)]
    pub unread: i64,
    #[serde(default)]
    pub starred: i64,
    #[serde(default)]
    pub read: i64,
}

impl StatsEntry {
    pub fn empty(feed_id: FeedId) -> Self {
        Self {
            feed_id,
            ..Self::default()
        }
    }

    /// Counter for a status. `read` is carried but not maintained locally.
    pub fn count(&self, status: ItemStatus) -> i64 {
        match status {
            ItemStatus::Unread => self.unread,
            ItemStatus::Starred => self.starred,
            ItemStatus::Read => self.read,
        }
    }

    /// Adjust a locally maintained counter. Only `unread` and `starred` participate.
    pub fn bump(&mut self, status: ItemStatus, delta: i64) {
        match status {
            ItemStatus::Unread => self.unread += delta,
            ItemStatus::Starred => self.starred += delta,
            ItemStatus::Read => {}
        }
    }
}

/// Response of the status query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ServerStatus {
    #[serde(deserialize_with = "running_flag")]
    pub running: bool,
    #[serde(default)]
    pub stats: Vec<StatsEntry>,
}

/// The server reports `running` either as a flag or as a count of pending feeds.
fn running_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Running {
        Flag(bool),
        Count(u64),
    }

    Ok(match Running::deserialize(deserializer)? {
        Running::Flag(flag) => flag,
        Running::Count(n) => n > 0,
    })
}

/// Feed id → last fetch error message.
pub type FeedErrors = HashMap<FeedId, String>;

// ============================================================================
// Tags
// ============================================================================

/// Tag metadata, always replaced as one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TagSnapshot {
    #[serde(default)]
    pub feed_tags: HashMap<FeedId, Vec<TagId>>,
    #[serde(default)]
    pub names: HashMap<TagId, String>,
    #[serde(default)]
    pub parents: HashMap<TagId, TagId>,
}

impl TagSnapshot {
    pub fn parent(&self, tag: TagId) -> Option<TagId> {
        self.parents.get(&tag).copied()
    }

    /// Comma-joined tag names of a feed, in membership order.
    pub fn names_for_feed(&self, feed_id: FeedId) -> String {
        self.feed_tags
            .get(&feed_id)
            .map(|tags| {
                tags.iter()
                    .filter_map(|t| self.names.get(t).map(String::as_str))
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .unwrap_or_default()
    }

    /// Tag ids ordered by display name, then id.
    pub fn ordered_tags(&self) -> Vec<TagId> {
        let mut tags: Vec<(&str, TagId)> =
            self.names.iter().map(|(id, n)| (n.as_str(), *id)).collect();
        tags.sort();
        tags.into_iter().map(|(_, id)| id).collect()
    }
}

// ============================================================================
// Current View selector
// ============================================================================

/// The feed-or-folder selection driving the item query.
///
/// Serialized as `feed:<id>` / `folder:<id>`; "no selection" is modelled as
/// `Option::<Selection>::None` and serialized as the empty string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Selection {
    Feed(FeedId),
    Folder(FolderId),
}

impl Selection {
    /// Parse a composite selector. Empty or malformed input means no selection.
    pub fn parse(s: &str) -> Option<Self> {
        s.parse().ok()
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Feed(id) => write!(f, "feed:{}", id),
            Self::Folder(id) => write!(f, "folder:{}", id),
        }
    }
}

impl FromStr for Selection {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s.split_once(':').ok_or(())?;
        let id: i64 = id.trim().parse().map_err(|_| ())?;
        match kind {
            "feed" => Ok(Self::Feed(id)),
            "folder" => Ok(Self::Folder(id)),
            _ => Err(()),
        }
    }
}

/// Active status filter. `All` is the degenerate "no filter" dimension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StatusFilter {
    #[default]
    All,
    Unread,
    Starred,
}

impl StatusFilter {
    pub fn parse(s: &str) -> Self {
        match s {
            "unread" => Self::Unread,
            "starred" => Self::Starred,
            _ => Self::All,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "",
            Self::Unread => "unread",
            Self::Starred => "starred",
        }
    }

    pub fn status(self) -> Option<ItemStatus> {
        match self {
            Self::All => None,
            Self::Unread => Some(ItemStatus::Unread),
            Self::Starred => Some(ItemStatus::Starred),
        }
    }
}

// ============================================================================
// Requests
// ============================================================================

/// Query accepted by `items.list` and `items.mark_read`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemQuery {
    pub feed_id: Option<FeedId>,
    pub folder_id: Option<FolderId>,
    pub status: Option<ItemStatus>,
    pub search: Option<String>,
    pub oldest_first: bool,
    pub tag: Option<TagId>,
    pub after: Option<ItemId>,
}

impl ItemQuery {
    /// Query-string pairs, omitting unset fields.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(id) = self.feed_id {
            params.push(("feed_id", id.to_string()));
        }
        if let Some(id) = self.folder_id {
            params.push(("folder_id", id.to_string()));
        }
        if let Some(status) = self.status {
            params.push(("status", status.as_str().to_string()));
        }
        if let Some(search) = &self.search {
            params.push(("search", search.clone()));
        }
        if self.oldest_first {
            params.push(("oldest_first", "true".to_string()));
        }
        if let Some(tag) = self.tag {
            params.push(("tag", tag.to_string()));
        }
        if let Some(after) = self.after {
            params.push(("after", after.to_string()));
        }
        params
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewFeed {
    pub url: String,
    pub folder_id: Option<FolderId>,
}

/// Candidate returned when a url exposes several feeds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FeedChoice {
    pub url: String,
    #[serde(default)]
    pub title: String,
}

/// Outcome of `feeds.create`. Ambiguity and misses are data, not errors.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CreateFeedOutcome {
    Success { feed: Feed },
    Multiple { choice: Vec<FeedChoice> },
    #[serde(other)]
    NotFound,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FolderPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_expanded: Option<bool>,
}

/// Partial feed update. `folder_id: Some(None)` moves the feed to the unfiled bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeedPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<Option<FolderId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_rule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readability: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_rate: Option<u64>,
}

/// Full-text extraction result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CrawlResult {
    #[serde(default)]
    pub content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_selection_parse() {
        assert_eq!(Selection::parse("feed:12"), Some(Selection::Feed(12)));
        assert_eq!(Selection::parse("folder:3"), Some(Selection::Folder(3)));
        assert_eq!(Selection::parse(""), None);
        assert_eq!(Selection::parse("folder:null"), None);
        assert_eq!(Selection::parse("tag:1"), None);
        assert_eq!(Selection::Feed(7).to_string(), "feed:7");
    }

    #[test]
    fn test_status_running_as_flag_or_count() {
        let s: ServerStatus = serde_json::from_str(r#"{"running": 3, "stats": []}"#).unwrap();
        assert!(s.running);
        let s: ServerStatus = serde_json::from_str(r#"{"running": 0, "stats": []}"#).unwrap();
        assert!(!s.running);
        let s: ServerStatus = serde_json::from_str(
            r#"{"running": true, "stats": [{"feed_id": 1, "unread": 3, "starred": 1}]}"#,
        )
        .unwrap();
        assert!(s.running);
        assert_eq!(s.stats[0].unread, 3);
        assert_eq!(s.stats[0].read, 0);
    }

    #[test]
    fn test_create_feed_outcomes() {
        let ok: CreateFeedOutcome = serde_json::from_str(
            r#"{"status": "success", "feed": {"id": 4, "title": "Blog", "folder_id": null}}"#,
        )
        .unwrap();
        assert!(matches!(ok, CreateFeedOutcome::Success { feed } if feed.id == 4));

        let multi: CreateFeedOutcome = serde_json::from_str(
            r#"{"status": "multiple", "choice": [{"url": "https://a/rss", "title": "A"}]}"#,
        )
        .unwrap();
        assert!(matches!(multi, CreateFeedOutcome::Multiple { choice } if choice.len() == 1));

        let none: CreateFeedOutcome = serde_json::from_str(r#"{"status": "notfound"}"#).unwrap();
        assert_eq!(none, CreateFeedOutcome::NotFound);
    }

    #[test]
    fn test_tag_snapshot_string_keys() {
        let tags: TagSnapshot = serde_json::from_str(
            r#"{"feed_tags": {"1": [10, 11]}, "names": {"10": "rust", "11": "go"}, "parents": {"11": 10}}"#,
        )
        .unwrap();
        assert_eq!(tags.names_for_feed(1), "rust,go");
        assert_eq!(tags.parent(11), Some(10));
        assert_eq!(tags.ordered_tags(), vec![11, 10]);
    }

    #[test]
    fn test_feed_patch_moves_to_unfiled() {
        let patch = FeedPatch {
            folder_id: Some(None),
            ..FeedPatch::default()
        };
        assert_eq!(serde_json::to_string(&patch).unwrap(), r#"{"folder_id":null}"#);
    }

    #[test]
    fn test_query_params_skip_unset() {
        let q = ItemQuery {
            feed_id: Some(2),
            status: Some(ItemStatus::Unread),
            oldest_first: true,
            after: Some(99),
            ..ItemQuery::default()
        };
        assert_eq!(
            q.to_params(),
            vec![
                ("feed_id", "2".to_string()),
                ("status", "unread".to_string()),
                ("oldest_first", "true".to_string()),
                ("after", "99".to_string()),
            ]
        );
    }
}
