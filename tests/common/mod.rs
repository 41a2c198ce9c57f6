//! Scripted in-memory gateway shared by the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use feedwire::api::{ApiError, Gateway};
use feedwire::app::{App, AppEvent};
use feedwire::config::Config;
use feedwire::model::{
    CrawlResult, CreateFeedOutcome, Feed, FeedErrors, FeedId, FeedPatch, Folder, FolderId,
    FolderPatch, Item, ItemDetail, ItemId, ItemPage, ItemQuery, ItemStatus, NewFeed, ServerStatus,
    SettingsPatch, StatsEntry, TagId, TagSnapshot,
};
use feedwire::preferences::PreferenceManager;
use feedwire::ui::handle_app_event;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// Gateway answering from canned data and counting every call by name.
#[derive(Default)]
pub struct FakeGateway {
    /// Returned in order; the last entry repeats once the queue runs dry.
    pub statuses: Mutex<VecDeque<ServerStatus>>,
    pub folders: Mutex<Vec<Folder>>,
    pub feeds: Mutex<Vec<Feed>>,
    pub tags: Mutex<TagSnapshot>,
    pub items: Mutex<Vec<Item>>,
    pub details: Mutex<HashMap<ItemId, ItemDetail>>,
    pub create_outcomes: Mutex<VecDeque<CreateFeedOutcome>>,
    /// Names of calls that fail with a 500.
    pub failing: Mutex<HashSet<&'static str>>,
    calls: Mutex<Vec<String>>,
    item_queries: Mutex<Vec<ItemQuery>>,
    item_updates: Mutex<Vec<(ItemId, ItemStatus)>>,
    created: Mutex<Vec<NewFeed>>,
    last_status: Mutex<Option<ServerStatus>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Two feeds in one folder, an unfiled feed, and two unread items in feed 1.
    pub fn seeded() -> Self {
        let gw = Self::new();
        *gw.folders.lock().unwrap() = vec![Folder {
            id: 1,
            title: "Tech".to_string(),
            is_expanded: true,
        }];
        *gw.feeds.lock().unwrap() = vec![
            feed(1, "Alpha", Some(1)),
            feed(2, "Beta", Some(1)),
            feed(3, "Gamma", None),
        ];
        *gw.items.lock().unwrap() = vec![
            item(10, 1, ItemStatus::Unread),
            item(11, 1, ItemStatus::Unread),
        ];
        gw.details
            .lock()
            .unwrap()
            .insert(10, detail(10, 1, ItemStatus::Unread));
        gw.push_status(false, vec![stats(1, 2, 0), stats(2, 0, 1)]);
        gw
    }

    pub fn push_status(&self, running: bool, stats: Vec<StatsEntry>) {
        self.statuses
            .lock()
            .unwrap()
            .push_back(ServerStatus { running, stats });
    }

    pub fn fail(&self, call: &'static str) {
        self.failing.lock().unwrap().insert(call);
    }

    pub fn calls(&self, name: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == name).count()
    }

    pub fn call_log(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn item_queries(&self) -> Vec<ItemQuery> {
        self.item_queries.lock().unwrap().clone()
    }

    pub fn item_updates(&self) -> Vec<(ItemId, ItemStatus)> {
        self.item_updates.lock().unwrap().clone()
    }

    pub fn created(&self) -> Vec<NewFeed> {
        self.created.lock().unwrap().clone()
    }

    fn record(&self, name: &'static str) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push(name.to_string());
        if self.failing.lock().unwrap().contains(name) {
            return Err(ApiError::HttpStatus(500));
        }
        Ok(())
    }
}

#[async_trait]
impl Gateway for FakeGateway {
    async fn status(&self) -> Result<ServerStatus, ApiError> {
        self.record("status")?;
        let next = self.statuses.lock().unwrap().pop_front();
        let mut last = self.last_status.lock().unwrap();
        if let Some(status) = next {
            *last = Some(status);
        }
        Ok(last.clone().unwrap_or_default())
    }

    async fn list_folders(&self) -> Result<Vec<Folder>, ApiError> {
        self.record("list_folders")?;
        Ok(self.folders.lock().unwrap().clone())
    }

    async fn create_folder(&self, title: &str) -> Result<Folder, ApiError> {
        self.record("create_folder")?;
        let mut folders = self.folders.lock().unwrap();
        let folder = Folder {
            id: folders.iter().map(|f| f.id).max().unwrap_or(0) + 1,
            title: title.to_string(),
            is_expanded: true,
        };
        folders.push(folder.clone());
        Ok(folder)
    }

    async fn update_folder(&self, _id: FolderId, _patch: &FolderPatch) -> Result<(), ApiError> {
        self.record("update_folder")
    }

    async fn delete_folder(&self, id: FolderId) -> Result<(), ApiError> {
        self.record("delete_folder")?;
        self.folders.lock().unwrap().retain(|f| f.id != id);
        Ok(())
    }

    async fn list_feeds(&self) -> Result<Vec<Feed>, ApiError> {
        self.record("list_feeds")?;
        Ok(self.feeds.lock().unwrap().clone())
    }

    async fn create_feed(&self, new: &NewFeed) -> Result<CreateFeedOutcome, ApiError> {
        self.record("create_feed")?;
        self.created.lock().unwrap().push(new.clone());
        Ok(self
            .create_outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(CreateFeedOutcome::NotFound))
    }

    async fn update_feed(&self, _id: FeedId, _patch: &FeedPatch) -> Result<(), ApiError> {
        self.record("update_feed")
    }

    async fn delete_feed(&self, id: FeedId) -> Result<(), ApiError> {
        self.record("delete_feed")?;
        self.feeds.lock().unwrap().retain(|f| f.id != id);
        Ok(())
    }

    async fn refresh_feeds(&self) -> Result<(), ApiError> {
        self.record("refresh_feeds")
    }

    async fn list_feed_errors(&self) -> Result<FeedErrors, ApiError> {
        self.record("list_feed_errors")?;
        Ok(FeedErrors::new())
    }

    async fn list_items(&self, query: &ItemQuery) -> Result<ItemPage, ApiError> {
        self.record("list_items")?;
        self.item_queries.lock().unwrap().push(query.clone());
        let list = self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|i| query.feed_id.map_or(true, |id| i.feed_id == id))
            .cloned()
            .collect();
        Ok(ItemPage {
            list,
            has_more: false,
        })
    }

    async fn get_item(&self, id: ItemId) -> Result<ItemDetail, ApiError> {
        self.record("get_item")?;
        self.details
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(ApiError::HttpStatus(404))
    }

    async fn update_item(&self, id: ItemId, status: ItemStatus) -> Result<(), ApiError> {
        self.record("update_item")?;
        self.item_updates.lock().unwrap().push((id, status));
        Ok(())
    }

    async fn mark_read(&self, _query: &ItemQuery) -> Result<(), ApiError> {
        self.record("mark_read")
    }

    async fn list_tags(&self) -> Result<TagSnapshot, ApiError> {
        self.record("list_tags")?;
        Ok(self.tags.lock().unwrap().clone())
    }

    async fn update_tags(&self, _feed_id: FeedId, _tags: &str) -> Result<(), ApiError> {
        self.record("update_tags")
    }

    async fn update_tag_parent(&self, _tag: TagId, _parent: Option<TagId>) -> Result<(), ApiError> {
        self.record("update_tag_parent")
    }

    async fn update_settings(&self, _patch: &SettingsPatch) -> Result<(), ApiError> {
        self.record("update_settings")
    }

    async fn crawl(&self, _url: &str) -> Result<CrawlResult, ApiError> {
        self.record("crawl")?;
        Ok(CrawlResult {
            content: Some("<p>Full text</p>".to_string()),
        })
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.record("logout")
    }

    async fn upload_opml(&self, _path: &Path) -> Result<(), ApiError> {
        self.record("upload_opml")
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn feed(id: FeedId, title: &str, folder_id: Option<FolderId>) -> Feed {
    Feed {
        id,
        title: title.to_string(),
        folder_id,
        filter_rule: None,
        readability: false,
        link: None,
        feed_link: None,
    }
}

pub fn item(id: ItemId, feed_id: FeedId, status: ItemStatus) -> Item {
    Item {
        id,
        feed_id,
        title: format!("Item {}", id),
        link: Some(format!("https://example.com/{}", id)),
        date: None,
        status,
    }
}

pub fn detail(id: ItemId, feed_id: FeedId, status: ItemStatus) -> ItemDetail {
    ItemDetail {
        id,
        feed_id,
        title: format!("Item {}", id),
        link: Some(format!("https://example.com/{}", id)),
        date: None,
        author: None,
        content: Some("<p>Body</p>".to_string()),
        status,
    }
}

pub fn stats(feed_id: FeedId, unread: i64, starred: i64) -> StatsEntry {
    StatsEntry {
        feed_id,
        unread,
        starred,
        read: 0,
    }
}

// ============================================================================
// App harness
// ============================================================================

/// An app wired to `gateway`, with config-only preferences.
pub fn test_app(gateway: Arc<FakeGateway>) -> (App, mpsc::Receiver<AppEvent>) {
    let config = Config::default();
    let (tx, rx) = mpsc::channel(32);
    let app = App::new(gateway, PreferenceManager::from_config(&config), &config, tx);
    (app, rx)
}

/// Apply completions until none arrive for a while.
///
/// Meant for paused-time tests, where the idle timeout elapses instantly once
/// every pending timer has fired.
pub async fn settle(app: &mut App, rx: &mut mpsc::Receiver<AppEvent>) -> Vec<&'static str> {
    let mut seen = Vec::new();
    while let Ok(Some(event)) = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await {
        seen.push(event.name());
        handle_app_event(app, event).await;
    }
    seen
}
