//! Quick-switch feed picker.
//!
//! Case-insensitive substring match on feed titles with its own cursor,
//! independent of the main navigation selection.
use crate::model::{Feed, FeedId};

#[derive(Debug, Clone, Default)]
pub struct FuzzySelector {
    pub enabled: bool,
    pub query: String,
    /// Matching feeds in their original relative order.
    pub results: Vec<Feed>,
    /// `None` means the text input has focus.
    pub cursor: Option<usize>,
}

impl FuzzySelector {
    /// Activate with an empty query over all feeds. Returns false if already open.
    pub fn open(&mut self, feeds: &[Feed]) -> bool {
        if self.enabled {
            return false;
        }
        self.enabled = true;
        self.query.clear();
        self.results = feeds.to_vec();
        self.cursor = None;
        true
    }

    pub fn close(&mut self) {
        self.enabled = false;
    }

    /// Replace the query and refilter. Focus returns to the input.
    pub fn set_query(&mut self, query: impl Into<String>, feeds: &[Feed]) {
        self.query = query.into();
        self.cursor = None;
        let needle = self.query.to_uppercase();
        self.results = feeds
            .iter()
            .filter(|f| f.title.to_uppercase().contains(&needle))
            .cloned()
            .collect();
    }

    pub fn push_char(&mut self, c: char, feeds: &[Feed]) {
        let mut query = std::mem::take(&mut self.query);
        query.push(c);
        self.set_query(query, feeds);
    }

    pub fn pop_char(&mut self, feeds: &[Feed]) {
        let mut query = std::mem::take(&mut self.query);
        query.pop();
        self.set_query(query, feeds);
    }

    /// Move the cursor. Above the first result focus returns to the input;
    /// past the last result it wraps to the first.
    pub fn move_cursor(&mut self, delta: i64) {
        if self.results.is_empty() {
            self.cursor = None;
            return;
        }
        let current = self.cursor.map(|c| c as i64).unwrap_or(-1);
        let next = current + delta;
        self.cursor = if next <= -1 {
            None
        } else if next >= self.results.len() as i64 {
            Some(0)
        } else {
            Some(next as usize)
        };
    }

    /// The feed under the cursor, or the first result when the input has focus.
    pub fn highlighted(&self) -> Option<&Feed> {
        self.results.get(self.cursor.unwrap_or(0))
    }

    /// Pick the highlighted feed and close. With no results nothing happens.
    pub fn confirm(&mut self) -> Option<FeedId> {
        let id = self.highlighted()?.id;
        self.close();
        Some(id)
    }
}
