//! The in-memory model shared by every synchronization component.
//!
//! `AppState` is owned by the event loop and mutated only there. Spawned
//! gateway calls never see it; their results come back as events and are
//! applied here, so no locking is needed.
use crate::model::{
    Feed, FeedChoice, FeedErrors, FeedId, Folder, FolderId, Item, ItemDetail, ItemId, Selection,
    StatsEntry, StatusFilter, TagId, TagSnapshot,
};
use crate::sync::fuzzy::FuzzySelector;
use crate::sync::stats::{self, FilteredStats};
use std::collections::HashMap;

/// Busy flags shown by the UI and used to suppress overlapping work.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadingFlags {
    /// The server is fetching feeds; drives the poll loop.
    pub feeds: bool,
    pub items: bool,
    pub readability: bool,
    pub new_feed: bool,
}

/// One folder row of the tree with its feeds. `folder == None` is the unfiled bucket.
#[derive(Debug, Clone)]
pub struct FolderGroup<'a> {
    pub folder: Option<&'a Folder>,
    pub feeds: Vec<&'a Feed>,
}

#[derive(Debug, Clone)]
pub struct AppState {
    // -- Server data --
    pub folders: Vec<Folder>,
    pub feeds: Vec<Feed>,
    pub items: Vec<Item>,
    pub items_has_more: bool,
    pub stats: HashMap<FeedId, StatsEntry>,
    pub tags: TagSnapshot,
    pub feed_errors: FeedErrors,
    pub refresh_rate: Option<u64>,

    // -- Current view --
    pub current: Option<Selection>,
    pub filter: StatusFilter,
    pub search: String,
    pub sort_newest_first: bool,
    /// `None` is "all tags".
    pub tag_selected: Option<TagId>,

    // -- Selected item --
    pub selected_item: Option<ItemId>,
    pub item_detail: Option<ItemDetail>,
    /// Extracted full text overriding the detail content.
    pub readability: Option<String>,

    // -- Derived --
    pub loading: LoadingFlags,
    pub filtered: FilteredStats,
    pub fuzzy: FuzzySelector,

    // -- Feed creation --
    pub feed_new_choice: Vec<FeedChoice>,
    pub feed_new_choice_selected: usize,

    /// Bumped whenever the item query changes; stale pages are discarded.
    pub(crate) items_generation: u64,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            folders: Vec::new(),
            feeds: Vec::new(),
            items: Vec::new(),
            items_has_more: true,
            stats: HashMap::new(),
            tags: TagSnapshot::default(),
            feed_errors: FeedErrors::new(),
            refresh_rate: None,
            current: None,
            filter: StatusFilter::All,
            search: String::new(),
            sort_newest_first: true,
            tag_selected: None,
            selected_item: None,
            item_detail: None,
            readability: None,
            loading: LoadingFlags::default(),
            filtered: FilteredStats::default(),
            fuzzy: FuzzySelector::default(),
            feed_new_choice: Vec::new(),
            feed_new_choice_selected: 0,
            items_generation: 0,
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    pub fn feed(&self, id: FeedId) -> Option<&Feed> {
        self.feeds.iter().find(|f| f.id == id)
    }

    pub fn feed_mut(&mut self, id: FeedId) -> Option<&mut Feed> {
        self.feeds.iter_mut().find(|f| f.id == id)
    }

    pub fn folder(&self, id: FolderId) -> Option<&Folder> {
        self.folders.iter().find(|f| f.id == id)
    }

    pub fn folder_mut(&mut self, id: FolderId) -> Option<&mut Folder> {
        self.folders.iter_mut().find(|f| f.id == id)
    }

    /// The feed behind `current`, if the view is a feed that still exists.
    pub fn current_feed(&self) -> Option<&Feed> {
        match self.current {
            Some(Selection::Feed(id)) => self.feed(id),
            _ => None,
        }
    }

    pub fn current_folder(&self) -> Option<&Folder> {
        match self.current {
            Some(Selection::Folder(id)) => self.folder(id),
            _ => None,
        }
    }

    /// List row of the selected item.
    pub fn selected_item_row(&self) -> Option<&Item> {
        let id = self.selected_item?;
        self.items.iter().find(|i| i.id == id)
    }

    /// Missing stats entries read as zero.
    pub fn stats_for(&self, feed_id: FeedId) -> StatsEntry {
        self.stats
            .get(&feed_id)
            .copied()
            .unwrap_or_else(|| StatsEntry::empty(feed_id))
    }

    /// Text for the reading pane: extracted text, then item content, then nothing.
    pub fn item_selected_content(&self) -> &str {
        if self.selected_item.is_none() {
            return "";
        }
        if let Some(text) = self.readability.as_deref().filter(|t| !t.is_empty()) {
            return text;
        }
        self.item_detail
            .as_ref()
            .and_then(|d| d.content.as_deref())
            .unwrap_or("")
    }

    // ========================================================================
    // Snapshot replacement
    // ========================================================================

    /// Replace the stats map wholesale with a freshly polled list.
    pub fn replace_stats(&mut self, entries: Vec<StatsEntry>) {
        self.stats = entries.into_iter().map(|s| (s.feed_id, s)).collect();
    }

    pub fn recompute_stats(&mut self) {
        self.filtered = stats::compute(
            &self.stats,
            &self.feeds,
            &self.tags,
            self.filter,
            self.tag_selected,
        );
    }

    /// Folders ordered by title, case-insensitively.
    pub fn sort_folders(&mut self) {
        self.folders
            .sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()));
    }

    // ========================================================================
    // Tree view
    // ========================================================================

    /// Folders in server order with their feeds, then the unfiled bucket.
    pub fn folders_with_feeds(&self) -> Vec<FolderGroup<'_>> {
        let mut groups: Vec<FolderGroup<'_>> = self
            .folders
            .iter()
            .map(|folder| FolderGroup {
                folder: Some(folder),
                feeds: self
                    .feeds
                    .iter()
                    .filter(|f| f.folder_id == Some(folder.id))
                    .collect(),
            })
            .collect();

        let known: std::collections::HashSet<FolderId> =
            self.folders.iter().map(|f| f.id).collect();
        groups.push(FolderGroup {
            folder: None,
            feeds: self
                .feeds
                .iter()
                .filter(|f| f.folder_id.map_or(true, |id| !known.contains(&id)))
                .collect(),
        });
        groups
    }

    /// A filter or a tag narrows the tree.
    pub fn is_narrowed(&self) -> bool {
        self.filter != StatusFilter::All || self.tag_selected.is_some()
    }

    pub fn feed_is_visible(&self, feed: &Feed) -> bool {
        if !stats::matches_tag(&self.tags, feed.id, self.tag_selected) {
            return false;
        }
        self.filter == StatusFilter::All
            || self.filtered.feed(feed.id) > 0
            || self.current == Some(Selection::Feed(feed.id))
    }

    pub fn group_is_visible(&self, group: &FolderGroup<'_>) -> bool {
        !self.is_narrowed() || group.feeds.iter().any(|f| self.feed_is_visible(f))
    }

    /// Selectors in display order; the input to feed navigation.
    pub fn visible_selectors(&self) -> Vec<Selection> {
        let mut out = Vec::new();
        for group in self.folders_with_feeds() {
            let show_feeds = match group.folder {
                Some(folder) => {
                    if !self.group_is_visible(&group) {
                        continue;
                    }
                    out.push(Selection::Folder(folder.id));
                    folder.is_expanded
                }
                None => true,
            };
            if show_feeds {
                out.extend(
                    group
                        .feeds
                        .iter()
                        .filter(|f| self.feed_is_visible(f))
                        .map(|f| Selection::Feed(f.id)),
                );
            }
        }
        out
    }
}
