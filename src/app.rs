use crate::api::{ApiError, Gateway};
use crate::config::Config;
use crate::keybindings::KeybindingRegistry;
use crate::model::{
    CreateFeedOutcome, Feed, FeedErrors, FeedId, FeedPatch, Folder, FolderId, FolderPatch,
    ItemDetail, ItemId, ItemPage, ItemStatus, NewFeed, Selection, ServerStatus, SettingsPatch,
    StatusFilter, TagId, TagSnapshot,
};
use crate::preferences::{self, PreferenceManager};
use crate::state::AppState;
use crate::sync::navigation::{self, RowBox};
use crate::sync::{mutation, pagination, refresh, stats};
use crate::sync::{Debouncer, RefreshPlan, ScrollArea, ScrollDirection, StatusChange};
use crate::theme::{self, ReaderFont, StyleMap, ThemeVariant};
use crate::util::catch_task_panic;
use ratatui::style::Style;
use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Bounds for both list pane widths.
pub const MIN_LIST_WIDTH: i64 = 200;
pub const MAX_LIST_WIDTH: i64 = 700;
/// Width change per `<`/`>`/`{`/`}` press.
pub const LIST_WIDTH_STEP: i64 = 20;

/// Base window title.
pub const TITLE: &str = "feedwire";

const NO_FEEDS_FOUND: &str = "No feeds found at the given url.";

// ============================================================================
// Timing & Geometry
// ============================================================================

/// The config values the controller consults after startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSettings {
    pub poll_interval: Duration,
    pub scroll_padding: i64,
    pub content_scroll_margin: i64,
    pub load_more_threshold: i64,
}

impl SyncSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            scroll_padding: config.scroll_padding,
            content_scroll_margin: config.content_scroll_margin,
            load_more_threshold: config.load_more_threshold,
        }
    }
}

// ============================================================================
// Prompts & Dialogs
// ============================================================================

/// What a text prompt is collecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// Live item search; edits apply through the search debounce.
    Search,
    AddFeed,
    NewFolder,
    RenameFolder(FolderId),
    RenameFeed(FeedId),
    /// Folder name to move a feed into; unknown names create the folder.
    MoveFeed(FeedId),
    EditTags(FeedId),
    /// Parent tag name for a tag; empty clears the parent.
    TagParent(TagId),
    FilterRule(FeedId),
    RefreshRate,
}

impl PromptKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Search => "Search",
            Self::AddFeed => "Feed or site url",
            Self::NewFolder => "New folder",
            Self::RenameFolder(_) => "Rename folder",
            Self::RenameFeed(_) => "Rename feed",
            Self::MoveFeed(_) => "Move to folder (empty: unfiled)",
            Self::EditTags(_) => "Tags (comma separated)",
            Self::TagParent(_) => "Parent tag (empty: none)",
            Self::FilterRule(_) => "Filter rule",
            Self::RefreshRate => "Refresh rate (minutes, 0: manual)",
        }
    }
}

/// An open text prompt. Global keys are ignored while one is shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub kind: PromptKind,
    pub input: String,
}

/// Pending confirmation for destructive operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    DeleteFeed {
        feed_id: FeedId,
        folder_id: Option<FolderId>,
        title: String,
    },
    DeleteFolder {
        folder_id: FolderId,
        title: String,
    },
}

// ============================================================================
// Events
// ============================================================================

/// Completions reported by background tasks.
///
/// Tasks never touch the model; the event loop applies these in arrival order.
#[derive(Debug)]
pub enum AppEvent {
    /// A status response. `loop_mode` is set for polls after the first one of
    /// a chain; `chained` is false only for the bootstrap status call.
    StatusLoaded {
        status: ServerStatus,
        loop_mode: bool,
        chained: bool,
    },
    TagsLoaded(TagSnapshot),
    TreeLoaded {
        folders: Vec<Folder>,
        feeds: Vec<Feed>,
    },
    BootstrapComplete,
    FeedErrorsLoaded(FeedErrors),

    ItemsLoaded {
        generation: u64,
        load_more: bool,
        result: Result<ItemPage, String>,
    },
    ItemDetailLoaded {
        generation: u64,
        result: Result<ItemDetail, String>,
    },
    ReadabilityLoaded {
        item_id: ItemId,
        result: Result<Option<String>, String>,
    },
    ItemStatusConfirmed(StatusChange),
    MarkedAllRead,

    FolderCreated(Folder),
    FolderRenamed {
        folder_id: FolderId,
        title: String,
    },
    FolderDeleted {
        folder_id: FolderId,
    },

    FeedCreated(Result<CreateFeedOutcome, String>),
    FeedPatched {
        feed_id: FeedId,
        patch: FeedPatch,
    },
    FeedMovedToNewFolder,
    FeedDeleted {
        feed_id: FeedId,
        folder_id: Option<FolderId>,
    },
    FeedsRefreshStarted,

    TagsUpdated,
    TagParentUpdated {
        tag_id: TagId,
        parent_id: Option<TagId>,
    },
    RefreshRateUpdated(u64),

    /// A gateway call failed; the model is left as it was.
    RequestFailed {
        action: &'static str,
        error: String,
    },
    /// A background task panicked.
    ///
    /// Fields:
    /// - `task`: Name of the task that panicked (e.g., "items", "status_poll")
    /// - `error`: The panic message extracted from the panic payload
    TaskPanicked {
        task: &'static str,
        error: String,
    },
}

impl AppEvent {
    /// Variant name for log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Self::StatusLoaded { .. } => "StatusLoaded",
            Self::TagsLoaded(_) => "TagsLoaded",
            Self::TreeLoaded { .. } => "TreeLoaded",
            Self::BootstrapComplete => "BootstrapComplete",
            Self::FeedErrorsLoaded(_) => "FeedErrorsLoaded",
            Self::ItemsLoaded { .. } => "ItemsLoaded",
            Self::ItemDetailLoaded { .. } => "ItemDetailLoaded",
            Self::ReadabilityLoaded { .. } => "ReadabilityLoaded",
            Self::ItemStatusConfirmed(_) => "ItemStatusConfirmed",
            Self::MarkedAllRead => "MarkedAllRead",
            Self::FolderCreated(_) => "FolderCreated",
            Self::FolderRenamed { .. } => "FolderRenamed",
            Self::FolderDeleted { .. } => "FolderDeleted",
            Self::FeedCreated(_) => "FeedCreated",
            Self::FeedPatched { .. } => "FeedPatched",
            Self::FeedMovedToNewFolder => "FeedMovedToNewFolder",
            Self::FeedDeleted { .. } => "FeedDeleted",
            Self::FeedsRefreshStarted => "FeedsRefreshStarted",
            Self::TagsUpdated => "TagsUpdated",
            Self::TagParentUpdated { .. } => "TagParentUpdated",
            Self::RefreshRateUpdated(_) => "RefreshRateUpdated",
            Self::RequestFailed { .. } => "RequestFailed",
            Self::TaskPanicked { .. } => "TaskPanicked",
        }
    }
}

/// Deliver an event to the loop, logging if it has shut down.
pub async fn send_event(tx: &mpsc::Sender<AppEvent>, event: AppEvent) {
    let name = event.name();
    if let Err(e) = tx.send(event).await {
        tracing::warn!(error = %e, event = name, "Channel send failed (receiver dropped)");
    }
}

/// Log a gateway failure and turn it into the event the loop reports.
fn request_failed(action: &'static str, error: ApiError) -> Option<AppEvent> {
    tracing::warn!(action, error = %error, "Gateway call failed");
    Some(AppEvent::RequestFailed {
        action,
        error: error.to_string(),
    })
}

// ============================================================================
// Application State
// ============================================================================

/// The single application-state object.
///
/// Owned by the event loop. Operations that need the server spawn a task and
/// return immediately; the result comes back as an [`AppEvent`].
pub struct App {
    pub gateway: Arc<dyn Gateway>,
    pub event_tx: mpsc::Sender<AppEvent>,
    pub prefs: PreferenceManager,
    pub settings: SyncSettings,

    /// Server data, the current view and everything derived from them.
    pub state: AppState,

    // Appearance
    pub theme_variant: ThemeVariant,
    pub reader_font: ReaderFont,
    /// Reading size multiplier, one decimal.
    pub font_size: f64,
    /// Active style map for all UI rendering.
    pub theme: StyleMap,
    pub keybindings: KeybindingRegistry,
    pub feed_list_width: i64,
    pub item_list_width: i64,

    // Viewports, refreshed by the renderer every frame.
    pub feeds_scroll: ScrollArea,
    pub items_scroll: ScrollArea,
    pub content_scroll: ScrollArea,

    // Overlays
    pub prompt: Option<Prompt>,
    pub pending_confirm: Option<ConfirmAction>,
    /// Blocking notice; dismissed with Esc.
    pub notice: Option<String>,
    pub show_help: bool,
    pub help_scroll_offset: usize,

    /// Status message with expiry. `Cow` avoids allocation for static literals.
    pub status_message: Option<(Cow<'static, str>, Instant)>,
    /// Window title, recomputed through the stats debounce.
    pub title: String,
    pub needs_redraw: bool,
    /// Current frame of the loading spinner animation.
    pub spinner_frame: usize,

    // Trailing-edge writers
    pub search_debounce: Debouncer<()>,
    pub width_debounce: Debouncer<(i64, i64)>,
    pub stats_debounce: Debouncer<()>,

    /// Bumped per item selection; detail responses for older selections are dropped.
    pub detail_generation: u64,
    items_handle: Option<JoinHandle<()>>,
    detail_handle: Option<JoinHandle<()>>,
    readability_handle: Option<JoinHandle<()>>,
    poll_handle: Option<JoinHandle<()>>,
}

impl App {
    /// Build the controller with preferences applied. Nothing is fetched until [`App::start`].
    pub fn new(
        gateway: Arc<dyn Gateway>,
        prefs: PreferenceManager,
        config: &Config,
        event_tx: mpsc::Sender<AppEvent>,
    ) -> Self {
        let mut state = AppState::new();
        state.filter = prefs.filter();
        state.current = prefs.feed_selected();
        state.tag_selected = prefs.tag_selected();
        state.sort_newest_first = prefs.sort_newest_first();

        let theme_variant = ThemeVariant::from_str_name(prefs.theme_name()).unwrap_or_else(|| {
            tracing::warn!(name = prefs.theme_name(), "Unknown theme, using light");
            ThemeVariant::Light
        });
        let reader_font = ReaderFont::from_str_name(prefs.theme_font());
        let font_size = theme::step_font_size(prefs.theme_size(), 0);
        let feed_list_width = clamp_width(prefs.feed_list_width());
        let item_list_width = clamp_width(prefs.item_list_width());

        Self {
            gateway,
            event_tx,
            settings: SyncSettings::from_config(config),
            state,
            theme_variant,
            reader_font,
            font_size,
            theme: StyleMap::from_palette(&theme_variant.palette(), reader_font),
            keybindings: KeybindingRegistry::new(),
            feed_list_width,
            item_list_width,
            feeds_scroll: ScrollArea::default(),
            items_scroll: ScrollArea::default(),
            content_scroll: ScrollArea::default(),
            prompt: None,
            pending_confirm: None,
            notice: None,
            show_help: false,
            help_scroll_offset: 0,
            status_message: None,
            title: TITLE.to_string(),
            needs_redraw: true,
            spinner_frame: 0,
            search_debounce: Debouncer::new(config.search_debounce()),
            width_debounce: Debouncer::new(config.resize_debounce()),
            stats_debounce: Debouncer::new(config.stats_debounce()),
            detail_generation: 0,
            items_handle: None,
            detail_handle: None,
            readability_handle: None,
            poll_handle: None,
            prefs,
        }
    }

    /// Resolve a semantic role name to its `Style`.
    pub fn style(&self, role: &str) -> Style {
        self.theme.resolve(role)
    }

    // ========================================================================
    // Status line & notices
    // ========================================================================

    /// Set status message (will auto-expire after 3 seconds)
    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
    }

    /// Clear status message if expired (older than 3 seconds)
    /// Returns true if a message was actually cleared
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed().as_secs() >= 3 {
                self.status_message = None;
                return true;
            }
        }
        false
    }

    pub fn show_notice(&mut self, msg: impl Into<String>) {
        self.notice = Some(msg.into());
    }

    // ========================================================================
    // Task plumbing
    // ========================================================================

    /// Spawn `work`; the event it yields (if any) is sent back to the loop.
    fn spawn<F>(&self, task: &'static str, work: F) -> JoinHandle<()>
    where
        F: Future<Output = Option<AppEvent>> + Send + 'static,
    {
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            match catch_task_panic(work).await {
                Ok(Some(event)) => send_event(&tx, event).await,
                Ok(None) => {}
                Err(panic_msg) => {
                    tracing::error!(task, error = %panic_msg, "Background task panicked");
                    send_event(
                        &tx,
                        AppEvent::TaskPanicked {
                            task,
                            error: panic_msg,
                        },
                    )
                    .await;
                }
            }
        })
    }

    /// Spawn a task that sends its own events (the refresh chains).
    fn spawn_chain<F>(&self, task: &'static str, chain: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.spawn(task, async move {
            chain.await;
            None
        })
    }

    async fn persist(&mut self, key: &str, value: &str) {
        if let Err(e) = self.prefs.set(key, value).await {
            tracing::warn!(key, error = %e, "Failed to store preference");
        }
    }

    // ========================================================================
    // Refresh chains
    // ========================================================================

    /// Kick off the bootstrap chain. The first item page follows `BootstrapComplete`.
    pub fn start(&mut self) {
        tracing::info!("Starting bootstrap");
        let chain = refresh::bootstrap(self.gateway.clone(), self.event_tx.clone());
        self.spawn_chain("bootstrap", chain);
    }

    /// Fetch status and stats now, polling on while the server is busy.
    ///
    /// Replaces any running poll chain so at most one is active.
    pub fn refresh_stats(&mut self) {
        self.begin_poll(false, false);
    }

    /// Continue polling after a status that reported `running`.
    pub fn start_poll_chain(&mut self) {
        self.begin_poll(true, true);
    }

    fn begin_poll(&mut self, delay_first: bool, loop_mode: bool) {
        if let Some(handle) = self.poll_handle.take() {
            handle.abort();
            tracing::debug!("Aborted previous status poll");
        }
        let chain = refresh::poll_status(
            self.gateway.clone(),
            self.event_tx.clone(),
            self.settings.poll_interval,
            delay_first,
            loop_mode,
        );
        self.poll_handle = Some(self.spawn_chain("status_poll", chain));
    }

    pub fn refresh_tree(&self) {
        let gateway = self.gateway.clone();
        self.spawn("tree", async move {
            match futures::try_join!(gateway.list_folders(), gateway.list_feeds()) {
                Ok((folders, feeds)) => Some(AppEvent::TreeLoaded { folders, feeds }),
                Err(e) => request_failed("folders and feeds", e),
            }
        });
    }

    pub fn refresh_tags(&self) {
        let gateway = self.gateway.clone();
        self.spawn("tags", async move {
            match gateway.list_tags().await {
                Ok(tags) => Some(AppEvent::TagsLoaded(tags)),
                Err(e) => request_failed("tags", e),
            }
        });
    }

    pub fn refresh_feed_errors(&self) {
        let gateway = self.gateway.clone();
        self.spawn("feed_errors", async move {
            match gateway.list_feed_errors().await {
                Ok(errors) => Some(AppEvent::FeedErrorsLoaded(errors)),
                Err(e) => request_failed("feed errors", e),
            }
        });
    }

    /// Apply a status response.
    pub fn apply_status(&mut self, status: ServerStatus, loop_mode: bool, chained: bool) {
        if loop_mode && self.state.selected_item.is_none() {
            self.refresh_items(false);
        }
        self.state.loading.feeds = status.running;
        if status.running && !chained {
            self.start_poll_chain();
        }
        self.state.replace_stats(status.stats);
        self.stats_debounce.push(());
        self.refresh_feed_errors();
    }

    // ========================================================================
    // Item list
    // ========================================================================

    /// Reload the item list, or fetch the next page when `load_more` is set.
    pub fn refresh_items(&mut self, load_more: bool) {
        match pagination::begin_refresh(&mut self.state, load_more) {
            RefreshPlan::Clear => {
                if let Some(handle) = self.items_handle.take() {
                    handle.abort();
                }
            }
            RefreshPlan::Skip => {}
            RefreshPlan::Fetch {
                query,
                generation,
                load_more,
            } => {
                if !load_more {
                    if let Some(handle) = self.items_handle.take() {
                        handle.abort();
                        tracing::debug!("Aborted superseded item load");
                    }
                }
                tracing::debug!(generation, load_more, "Loading items");
                let gateway = self.gateway.clone();
                self.items_handle = Some(self.spawn("items", async move {
                    let result = gateway.list_items(&query).await.map_err(|e| {
                        tracing::warn!(error = %e, "Item list request failed");
                        e.to_string()
                    });
                    Some(AppEvent::ItemsLoaded {
                        generation,
                        load_more,
                        result,
                    })
                }));
            }
        }
    }

    /// Fetch the next page once the item list is scrolled near its bottom.
    pub fn maybe_load_more(&mut self) {
        if pagination::should_load_more(
            &self.state,
            self.items_scroll,
            self.settings.load_more_threshold,
        ) {
            self.refresh_items(true);
        }
    }

    /// Mark everything matched by the current query as read.
    pub fn mark_all_read(&mut self) {
        let Some(query) = pagination::build_query(&self.state) else {
            return;
        };
        let gateway = self.gateway.clone();
        self.spawn("mark_read", async move {
            match gateway.mark_read(&query).await {
                Ok(()) => Some(AppEvent::MarkedAllRead),
                Err(e) => request_failed("mark all read", e),
            }
        });
    }

    // ========================================================================
    // Current view
    // ========================================================================

    /// Change the feed/folder selection and restart the item list.
    pub async fn select_view(&mut self, view: Option<Selection>) {
        self.state.fuzzy.close();
        if self.state.current == view {
            return;
        }
        self.state.current = view;
        let value = view.map(|v| v.to_string()).unwrap_or_default();
        self.persist(preferences::KEY_FEED_SELECTED, &value).await;
        self.refresh_items(false);
        self.items_scroll.scroll_top = 0;
        self.scroll_feed_into_view();
    }

    pub async fn set_filter(&mut self, filter: StatusFilter) {
        if self.state.filter == filter {
            return;
        }
        self.state.filter = filter;
        self.persist(preferences::KEY_FILTER, filter.as_str()).await;
        self.refresh_items(false);
        self.state.recompute_stats();
    }

    pub async fn set_tag(&mut self, tag: Option<TagId>) {
        if self.state.tag_selected == tag {
            return;
        }
        self.state.tag_selected = tag;
        let value = tag.map(|t| t.to_string()).unwrap_or_default();
        self.persist(preferences::KEY_TAG_SELECTED, &value).await;
        self.refresh_items(false);
        self.state.recompute_stats();
    }

    /// All tags, then each tag by name, then back to all.
    pub async fn cycle_tag(&mut self) {
        let ordered = self.state.tags.ordered_tags();
        let next = match self.state.tag_selected {
            None => ordered.first().copied(),
            Some(current) => ordered
                .iter()
                .position(|t| *t == current)
                .and_then(|i| ordered.get(i + 1).copied()),
        };
        self.set_tag(next).await;
    }

    pub async fn toggle_sort(&mut self) {
        self.state.sort_newest_first = !self.state.sort_newest_first;
        let value = self.state.sort_newest_first.to_string();
        self.persist(preferences::KEY_SORT_NEWEST_FIRST, &value).await;
        self.refresh_items(false);
    }

    /// Edit the search term; the reload waits for the search debounce.
    pub fn set_search(&mut self, term: impl Into<String>) {
        let term = term.into();
        if self.state.search == term {
            return;
        }
        self.state.search = term;
        self.search_debounce.push(());
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Select an item: reset the reading pane and fetch its detail.
    pub fn select_item(&mut self, item: Option<ItemId>) {
        if self.state.selected_item == item {
            return;
        }
        self.state.selected_item = item;
        self.state.readability = None;
        self.state.loading.readability = false;
        if let Some(handle) = self.readability_handle.take() {
            handle.abort();
        }
        if let Some(handle) = self.detail_handle.take() {
            handle.abort();
        }
        self.detail_generation = self.detail_generation.wrapping_add(1);

        let Some(item_id) = item else {
            self.state.item_detail = None;
            return;
        };
        self.content_scroll.scroll_top = 0;
        self.scroll_item_into_view();

        let generation = self.detail_generation;
        let gateway = self.gateway.clone();
        self.detail_handle = Some(self.spawn("item_detail", async move {
            let result = gateway.get_item(item_id).await.map_err(|e| {
                tracing::warn!(item_id, error = %e, "Item detail request failed");
                e.to_string()
            });
            Some(AppEvent::ItemDetailLoaded { generation, result })
        }));
    }

    pub fn apply_item_detail(&mut self, generation: u64, detail: ItemDetail) {
        if generation != self.detail_generation || self.state.selected_item != Some(detail.id) {
            tracing::debug!(item_id = detail.id, "Discarding stale item detail");
            return;
        }
        let auto_readability = self
            .state
            .feed(detail.feed_id)
            .map_or(false, |f| f.readability);
        self.state.item_detail = Some(detail);
        if auto_readability {
            self.toggle_readability();
        }
    }

    pub fn navigate_item(&mut self, delta: i64) {
        if let Some(id) =
            navigation::navigate_item(&self.state.items, self.state.selected_item, delta)
        {
            self.select_item(Some(id));
            self.maybe_load_more();
        }
    }

    pub async fn navigate_feed(&mut self, delta: i64) {
        let selectors = self.state.visible_selectors();
        if let Some(next) = navigation::navigate_feed(&selectors, self.state.current, delta) {
            self.select_view(next).await;
        }
    }

    fn scroll_item_into_view(&mut self) {
        let Some(id) = self.state.selected_item else {
            return;
        };
        let Some(index) = self.state.items.iter().position(|i| i.id == id) else {
            return;
        };
        if let Some(top) = navigation::scroll_into_view(
            RowBox::for_index(index),
            self.items_scroll,
            self.settings.scroll_padding,
        ) {
            self.items_scroll.scroll_top = top;
        }
    }

    fn scroll_feed_into_view(&mut self) {
        let Some(current) = self.state.current else {
            return;
        };
        let Some(index) = self
            .state
            .visible_selectors()
            .iter()
            .position(|s| *s == current)
        else {
            return;
        };
        if let Some(top) = navigation::scroll_into_view(
            RowBox::for_index(index),
            self.feeds_scroll,
            self.settings.scroll_padding,
        ) {
            self.feeds_scroll.scroll_top = top;
        }
    }

    /// Page the reading pane.
    pub fn scroll_content(&mut self, direction: ScrollDirection) {
        self.content_scroll.scroll_top = navigation::scroll_content(
            self.content_scroll,
            direction,
            self.settings.content_scroll_margin,
        );
    }

    pub fn scroll_content_top(&mut self) {
        self.content_scroll.scroll_top = 0;
    }

    pub fn scroll_content_bottom(&mut self) {
        self.content_scroll.scroll_top = self.content_scroll.max_scroll();
    }

    // ========================================================================
    // Item status
    // ========================================================================

    /// Toggle the selected item between `target` and `fallback`.
    ///
    /// Nothing changes locally until the server confirms.
    pub fn toggle_item_status(&mut self, target: ItemStatus, fallback: ItemStatus) {
        let Some(change) = StatusChange::for_selected(&self.state, target, fallback) else {
            return;
        };
        let gateway = self.gateway.clone();
        self.spawn("item_status", async move {
            match gateway.update_item(change.item_id, change.new).await {
                Ok(()) => Some(AppEvent::ItemStatusConfirmed(change)),
                Err(e) => request_failed("item status", e),
            }
        });
    }

    pub fn toggle_item_starred(&mut self) {
        self.toggle_item_status(ItemStatus::Starred, ItemStatus::Read);
    }

    pub fn toggle_item_read(&mut self) {
        self.toggle_item_status(ItemStatus::Unread, ItemStatus::Read);
    }

    pub fn apply_status_change(&mut self, change: StatusChange) {
        mutation::apply_confirmed(&mut self.state, &change);
        self.stats_debounce.push(());
    }

    // ========================================================================
    // Reading pane
    // ========================================================================

    /// Drop the extracted text, or fetch it for the selected item.
    pub fn toggle_readability(&mut self) {
        if self.state.readability.is_some() {
            self.state.readability = None;
            return;
        }
        let Some(detail) = self.state.item_detail.as_ref() else {
            return;
        };
        let Some(link) = detail.link.clone() else {
            return;
        };
        let item_id = detail.id;
        self.state.loading.readability = true;
        if let Some(handle) = self.readability_handle.take() {
            handle.abort();
        }
        let gateway = self.gateway.clone();
        self.readability_handle = Some(self.spawn("readability", async move {
            let result = gateway.crawl(&link).await.map(|r| r.content).map_err(|e| {
                tracing::warn!(item_id, error = %e, "Full-text extraction failed");
                e.to_string()
            });
            Some(AppEvent::ReadabilityLoaded { item_id, result })
        }));
    }

    /// Link of the item being read.
    pub fn selected_link(&self) -> Option<&str> {
        self.state
            .item_detail
            .as_ref()
            .filter(|d| Some(d.id) == self.state.selected_item)
            .and_then(|d| d.link.as_deref())
    }

    // ========================================================================
    // Folders
    // ========================================================================

    pub fn toggle_folder_expanded(&mut self, folder_id: FolderId) {
        let Some(folder) = self.state.folder_mut(folder_id) else {
            return;
        };
        folder.is_expanded = !folder.is_expanded;
        let patch = FolderPatch {
            is_expanded: Some(folder.is_expanded),
            ..FolderPatch::default()
        };
        let gateway = self.gateway.clone();
        self.spawn("folder_expand", async move {
            match gateway.update_folder(folder_id, &patch).await {
                Ok(()) => None,
                Err(e) => request_failed("expand folder", e),
            }
        });
    }

    pub fn create_folder(&mut self, title: &str) {
        let title = title.trim().to_string();
        if title.is_empty() {
            return;
        }
        let gateway = self.gateway.clone();
        self.spawn("create_folder", async move {
            match gateway.create_folder(&title).await {
                Ok(folder) => Some(AppEvent::FolderCreated(folder)),
                Err(e) => request_failed("create folder", e),
            }
        });
    }

    pub fn rename_folder(&mut self, folder_id: FolderId, title: &str) {
        let title = title.trim().to_string();
        if title.is_empty() {
            return;
        }
        let patch = FolderPatch {
            title: Some(title.clone()),
            ..FolderPatch::default()
        };
        let gateway = self.gateway.clone();
        self.spawn("rename_folder", async move {
            match gateway.update_folder(folder_id, &patch).await {
                Ok(()) => Some(AppEvent::FolderRenamed { folder_id, title }),
                Err(e) => request_failed("rename folder", e),
            }
        });
    }

    pub fn delete_folder(&mut self, folder_id: FolderId) {
        let gateway = self.gateway.clone();
        self.spawn("delete_folder", async move {
            match gateway.delete_folder(folder_id).await {
                Ok(()) => Some(AppEvent::FolderDeleted { folder_id }),
                Err(e) => request_failed("delete folder", e),
            }
        });
    }

    pub async fn apply_folder_deleted(&mut self, folder_id: FolderId) {
        if self.state.current == Some(Selection::Folder(folder_id)) {
            self.state.items.clear();
            self.select_item(None);
            self.select_view(None).await;
        }
        self.refresh_stats();
        self.refresh_tree();
    }

    // ========================================================================
    // Feeds
    // ========================================================================

    /// Folder a new subscription lands in: the folder being viewed, or the
    /// folder of the feed being viewed.
    pub fn default_folder_for_new_feed(&self) -> Option<FolderId> {
        match self.state.current? {
            Selection::Folder(id) => Some(id),
            Selection::Feed(_) => self.state.current_feed().and_then(|f| f.folder_id),
        }
    }

    pub fn create_feed(&mut self, url: &str, folder_id: Option<FolderId>) {
        let url = url.trim().to_string();
        if url.is_empty() {
            return;
        }
        self.state.loading.new_feed = true;
        self.state.feed_new_choice.clear();
        let gateway = self.gateway.clone();
        self.spawn("create_feed", async move {
            let result = gateway
                .create_feed(&NewFeed { url, folder_id })
                .await
                .map_err(|e| {
                    tracing::warn!(error = %e, "Feed creation failed");
                    e.to_string()
                });
            Some(AppEvent::FeedCreated(result))
        });
    }

    pub async fn apply_feed_created(&mut self, outcome: CreateFeedOutcome) {
        match outcome {
            CreateFeedOutcome::Success { feed } => {
                tracing::info!(feed_id = feed.id, title = %feed.title, "Subscribed");
                self.set_status(format!("Subscribed to {}", feed.title));
                self.refresh_tree();
                self.refresh_stats();
                self.select_view(Some(Selection::Feed(feed.id))).await;
            }
            CreateFeedOutcome::Multiple { choice } => {
                self.state.feed_new_choice = choice;
                self.state.feed_new_choice_selected = 0;
            }
            CreateFeedOutcome::NotFound => self.show_notice(NO_FEEDS_FOUND),
        }
    }

    /// Subscribe to the highlighted candidate of an ambiguous url.
    pub fn choose_feed_candidate(&mut self) {
        let Some(choice) = self
            .state
            .feed_new_choice
            .get(self.state.feed_new_choice_selected)
            .cloned()
        else {
            return;
        };
        let folder_id = self.default_folder_for_new_feed();
        self.create_feed(&choice.url, folder_id);
    }

    pub fn move_feed_candidate_cursor(&mut self, delta: i64) {
        let len = self.state.feed_new_choice.len() as i64;
        if len == 0 {
            return;
        }
        let next = (self.state.feed_new_choice_selected as i64 + delta).clamp(0, len - 1);
        self.state.feed_new_choice_selected = next as usize;
    }

    fn patch_feed(&mut self, task: &'static str, feed_id: FeedId, patch: FeedPatch) {
        let gateway = self.gateway.clone();
        self.spawn(task, async move {
            match gateway.update_feed(feed_id, &patch).await {
                Ok(()) => Some(AppEvent::FeedPatched { feed_id, patch }),
                Err(e) => request_failed(task, e),
            }
        });
    }

    pub fn rename_feed(&mut self, feed_id: FeedId, title: &str) {
        let title = title.trim();
        if title.is_empty() {
            return;
        }
        let patch = FeedPatch {
            title: Some(title.to_string()),
            ..FeedPatch::default()
        };
        self.patch_feed("rename feed", feed_id, patch);
    }

    pub fn set_filter_rule(&mut self, feed_id: FeedId, rule: &str) {
        let rule = rule.trim();
        if rule.is_empty() {
            return;
        }
        let patch = FeedPatch {
            filter_rule: Some(rule.to_string()),
            ..FeedPatch::default()
        };
        self.patch_feed("filter rule", feed_id, patch);
    }

    pub fn toggle_feed_readability(&mut self, feed_id: FeedId) {
        let Some(feed) = self.state.feed(feed_id) else {
            return;
        };
        let patch = FeedPatch {
            readability: Some(!feed.readability),
            ..FeedPatch::default()
        };
        self.patch_feed("feed readability", feed_id, patch);
    }

    pub fn move_feed(&mut self, feed_id: FeedId, folder_id: Option<FolderId>) {
        let patch = FeedPatch {
            folder_id: Some(folder_id),
            ..FeedPatch::default()
        };
        self.patch_feed("move feed", feed_id, patch);
    }

    /// Move to the folder named `name` (case-insensitive), creating it if needed.
    /// An empty name moves the feed to the unfiled bucket.
    pub fn move_feed_to_named_folder(&mut self, feed_id: FeedId, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            self.move_feed(feed_id, None);
            return;
        }
        let existing = self
            .state
            .folders
            .iter()
            .find(|f| f.title.eq_ignore_ascii_case(name))
            .map(|f| f.id);
        match existing {
            Some(folder_id) => self.move_feed(feed_id, Some(folder_id)),
            None => self.move_feed_to_new_folder(feed_id, name),
        }
    }

    pub fn move_feed_to_new_folder(&mut self, feed_id: FeedId, title: &str) {
        let title = title.trim().to_string();
        if title.is_empty() {
            return;
        }
        let gateway = self.gateway.clone();
        self.spawn("move_feed_new_folder", async move {
            let folder = match gateway.create_folder(&title).await {
                Ok(folder) => folder,
                Err(e) => return request_failed("create folder", e),
            };
            let patch = FeedPatch {
                folder_id: Some(Some(folder.id)),
                ..FeedPatch::default()
            };
            match gateway.update_feed(feed_id, &patch).await {
                Ok(()) => Some(AppEvent::FeedMovedToNewFolder),
                Err(e) => request_failed("move feed", e),
            }
        });
    }

    /// Apply a confirmed feed patch to the local copy.
    pub fn apply_feed_patch(&mut self, feed_id: FeedId, patch: FeedPatch) {
        let moved = patch.folder_id.is_some();
        if let Some(feed) = self.state.feed_mut(feed_id) {
            if let Some(title) = patch.title {
                feed.title = title;
            }
            if let Some(folder_id) = patch.folder_id {
                feed.folder_id = folder_id;
            }
            if let Some(rule) = patch.filter_rule {
                feed.filter_rule = if rule.is_empty() { None } else { Some(rule) };
            }
            if let Some(readability) = patch.readability {
                feed.readability = readability;
            }
        }
        if moved {
            self.refresh_stats();
        }
    }

    pub fn delete_feed(&mut self, feed_id: FeedId, folder_id: Option<FolderId>) {
        let gateway = self.gateway.clone();
        self.spawn("delete_feed", async move {
            match gateway.delete_feed(feed_id).await {
                Ok(()) => Some(AppEvent::FeedDeleted { feed_id, folder_id }),
                Err(e) => request_failed("delete feed", e),
            }
        });
    }

    pub async fn apply_feed_deleted(&mut self, feed_id: FeedId, folder_id: Option<FolderId>) {
        let current = self.state.current;
        let affected = current.is_none()
            || current == Some(Selection::Feed(feed_id))
            || folder_id.is_some_and(|id| current == Some(Selection::Folder(id)));
        if affected {
            self.select_item(None);
            self.select_view(None).await;
        }
        self.refresh_stats();
        self.refresh_tree();
    }

    /// Ask the server to fetch every feed, unless it already is.
    pub fn fetch_all_feeds(&mut self) {
        if self.state.loading.feeds {
            self.set_status("Already fetching feeds");
            return;
        }
        let gateway = self.gateway.clone();
        self.spawn("refresh_feeds", async move {
            match gateway.refresh_feeds().await {
                Ok(()) => Some(AppEvent::FeedsRefreshStarted),
                Err(e) => request_failed("fetch feeds", e),
            }
        });
    }

    /// Ask for confirmation before deleting whatever the current view points at.
    pub fn request_delete(&mut self) {
        self.pending_confirm = match self.state.current {
            Some(Selection::Feed(id)) => self.state.feed(id).map(|f| ConfirmAction::DeleteFeed {
                feed_id: f.id,
                folder_id: f.folder_id,
                title: f.title.clone(),
            }),
            Some(Selection::Folder(id)) => {
                self.state
                    .folder(id)
                    .map(|f| ConfirmAction::DeleteFolder {
                        folder_id: f.id,
                        title: f.title.clone(),
                    })
            }
            None => None,
        };
    }

    pub fn confirm_pending(&mut self) {
        match self.pending_confirm.take() {
            Some(ConfirmAction::DeleteFeed {
                feed_id,
                folder_id,
                title,
            }) => {
                self.set_status(format!("Deleting {}...", title));
                self.delete_feed(feed_id, folder_id);
            }
            Some(ConfirmAction::DeleteFolder { folder_id, title }) => {
                self.set_status(format!("Deleting {}...", title));
                self.delete_folder(folder_id);
            }
            None => {}
        }
    }

    // ========================================================================
    // Tags
    // ========================================================================

    pub fn set_tags(&mut self, feed_id: FeedId, tags: &str) {
        let tags = tags.trim().to_string();
        if tags.is_empty() {
            return;
        }
        let gateway = self.gateway.clone();
        self.spawn("update_tags", async move {
            match gateway.update_tags(feed_id, &tags).await {
                Ok(()) => Some(AppEvent::TagsUpdated),
                Err(e) => request_failed("update tags", e),
            }
        });
    }

    pub fn update_parent_tag(&mut self, tag_id: TagId, parent_id: Option<TagId>) {
        let gateway = self.gateway.clone();
        self.spawn("tag_parent", async move {
            match gateway.update_tag_parent(tag_id, parent_id).await {
                Ok(()) => Some(AppEvent::TagParentUpdated { tag_id, parent_id }),
                Err(e) => request_failed("tag parent", e),
            }
        });
    }

    /// Resolve a parent tag by display name; empty clears the parent.
    pub fn set_parent_tag_by_name(&mut self, tag_id: TagId, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            self.update_parent_tag(tag_id, None);
            return;
        }
        let parent = self
            .state
            .tags
            .names
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(name))
            .map(|(id, _)| *id);
        match parent {
            Some(parent) if parent != tag_id => self.update_parent_tag(tag_id, Some(parent)),
            Some(_) => self.set_status("A tag cannot be its own parent"),
            None => self.set_status(format!("No tag named '{}'", name)),
        }
    }

    pub fn apply_tag_parent(&mut self, tag_id: TagId, parent_id: Option<TagId>) {
        match parent_id {
            Some(parent) => {
                self.state.tags.parents.insert(tag_id, parent);
            }
            None => {
                self.state.tags.parents.remove(&tag_id);
            }
        }
        self.state.recompute_stats();
    }

    // ========================================================================
    // Settings & appearance
    // ========================================================================

    pub fn set_refresh_rate(&mut self, minutes: u64) {
        if self.state.refresh_rate == Some(minutes) {
            return;
        }
        let patch = SettingsPatch {
            refresh_rate: Some(minutes),
        };
        let gateway = self.gateway.clone();
        self.spawn("settings", async move {
            match gateway.update_settings(&patch).await {
                Ok(()) => Some(AppEvent::RefreshRateUpdated(minutes)),
                Err(e) => request_failed("refresh rate", e),
            }
        });
    }

    fn rebuild_theme(&mut self) {
        self.theme = StyleMap::from_palette(&self.theme_variant.palette(), self.reader_font);
        self.needs_redraw = true;
    }

    pub async fn set_theme(&mut self, variant: ThemeVariant) {
        self.theme_variant = variant;
        self.rebuild_theme();
        self.persist(preferences::KEY_THEME_NAME, variant.name()).await;
    }

    /// Cycle to the next theme variant. Returns its name for status display.
    pub async fn cycle_theme(&mut self) -> &'static str {
        let next = self.theme_variant.next();
        self.set_theme(next).await;
        next.name()
    }

    pub async fn cycle_font(&mut self) -> &'static str {
        self.reader_font = self.reader_font.next();
        self.rebuild_theme();
        let name = self.reader_font.name();
        self.persist(preferences::KEY_THEME_FONT, name).await;
        name
    }

    /// Change the reading size by `steps` tenths.
    pub async fn incr_font(&mut self, steps: i32) {
        self.font_size = theme::step_font_size(self.font_size, steps);
        let value = format!("{:.1}", self.font_size);
        self.persist(preferences::KEY_THEME_SIZE, &value).await;
    }

    pub fn resize_feed_list(&mut self, delta: i64) {
        self.feed_list_width = clamp_width(self.feed_list_width + delta);
        self.width_debounce
            .push((self.feed_list_width, self.item_list_width));
    }

    pub fn resize_item_list(&mut self, delta: i64) {
        self.item_list_width = clamp_width(self.item_list_width + delta);
        self.width_debounce
            .push((self.feed_list_width, self.item_list_width));
    }

    /// Recompute the window title and filtered stats.
    pub fn update_title(&mut self) {
        let count = stats::unread_badge(&self.state.stats);
        self.title = if count > 0 {
            format!("{} ({})", TITLE, count)
        } else {
            TITLE.to_string()
        };
        self.state.recompute_stats();
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Release debounced work whose delay has elapsed.
    pub async fn on_tick(&mut self) {
        let now = Instant::now();
        if self.search_debounce.take_ready(now).is_some() {
            tracing::debug!(search = %self.state.search, "Search settled");
            self.refresh_items(false);
            self.needs_redraw = true;
        }
        if let Some((feed_width, item_width)) = self.width_debounce.take_ready(now) {
            self.persist(preferences::KEY_FEED_LIST_WIDTH, &feed_width.to_string())
                .await;
            self.persist(preferences::KEY_ITEM_LIST_WIDTH, &item_width.to_string())
                .await;
        }
        if self.stats_debounce.take_ready(now).is_some() {
            self.update_title();
            self.needs_redraw = true;
        }
        let loading = self.state.loading;
        if loading.items || loading.readability || loading.new_feed || loading.feeds {
            self.spinner_frame = self.spinner_frame.wrapping_add(1);
            self.needs_redraw = true;
        }
    }
}

fn clamp_width(width: i64) -> i64 {
    width.clamp(MIN_LIST_WIDTH, MAX_LIST_WIDTH)
}

// ============================================================================
// Resource Cleanup
// ============================================================================

/// Abort in-flight tasks so nothing outlives the event loop.
impl Drop for App {
    fn drop(&mut self) {
        for handle in [
            self.items_handle.take(),
            self.detail_handle.take(),
            self.readability_handle.take(),
            self.poll_handle.take(),
        ]
        .into_iter()
        .flatten()
        {
            handle.abort();
        }
        tracing::debug!("Aborted background tasks on App drop");
    }
}
