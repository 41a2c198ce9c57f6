//! View preferences: config.toml defaults layered under the local store.
//!
//! Each key is read once at startup. A write goes to the store only when the
//! value differs from what is already held, so unrelated state changes never
//! touch the database.
use std::collections::HashMap;

use crate::config::Config;
use crate::model::{Selection, StatusFilter, TagId};
use crate::storage::{Database, DatabaseError};

pub const KEY_FILTER: &str = "filter";
pub const KEY_FEED_SELECTED: &str = "feed_selected";
pub const KEY_TAG_SELECTED: &str = "tag_selected";
pub const KEY_FEED_LIST_WIDTH: &str = "feed_list_width";
pub const KEY_ITEM_LIST_WIDTH: &str = "item_list_width";
pub const KEY_SORT_NEWEST_FIRST: &str = "sort_newest_first";
pub const KEY_THEME_NAME: &str = "theme.name";
pub const KEY_THEME_FONT: &str = "theme.font";
pub const KEY_THEME_SIZE: &str = "theme.size";

/// Default width of both list panes.
pub const DEFAULT_LIST_WIDTH: i64 = 300;

// ============================================================================
// PreferenceManager
// ============================================================================

/// In-memory preference map backed by the `user_preferences` table.
///
/// Without a database (see [`PreferenceManager::from_config`]) writes only
/// update memory.
pub struct PreferenceManager {
    prefs: HashMap<String, String>,
    db: Option<Database>,
}

impl PreferenceManager {
    /// Flatten config defaults, then layer every stored row on top.
    pub async fn load(config: &Config, db: Database) -> Result<Self, DatabaseError> {
        let mut prefs = Self::flatten_config(config);
        for (key, value) in db.get_preferences_by_prefix("").await? {
            prefs.insert(key, value);
        }
        Ok(Self {
            prefs,
            db: Some(db),
        })
    }

    /// Config only. Used when the store cannot be opened.
    pub fn from_config(config: &Config) -> Self {
        Self {
            prefs: Self::flatten_config(config),
            db: None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.prefs.get(key).map(String::as_str)
    }

    /// Store `value` under `key` if it changed. Returns whether a write happened.
    pub async fn set(&mut self, key: &str, value: &str) -> Result<bool, DatabaseError> {
        if self.get(key) == Some(value) {
            return Ok(false);
        }
        if let Some(db) = &self.db {
            db.set_preference(key, value).await?;
        }
        self.prefs.insert(key.to_string(), value.to_string());
        tracing::debug!(key, value, "Preference stored");
        Ok(true)
    }

    // ========================================================================
    // Type-safe Accessors
    // ========================================================================

    pub fn filter(&self) -> StatusFilter {
        StatusFilter::parse(self.get(KEY_FILTER).unwrap_or(""))
    }

    pub fn feed_selected(&self) -> Option<Selection> {
        self.get(KEY_FEED_SELECTED).and_then(Selection::parse)
    }

    /// `None` is "all tags".
    pub fn tag_selected(&self) -> Option<TagId> {
        self.get(KEY_TAG_SELECTED).and_then(|v| v.parse().ok())
    }

    pub fn feed_list_width(&self) -> i64 {
        self.get(KEY_FEED_LIST_WIDTH)
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_LIST_WIDTH)
    }

    pub fn item_list_width(&self) -> i64 {
        self.get(KEY_ITEM_LIST_WIDTH)
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_LIST_WIDTH)
    }

    pub fn sort_newest_first(&self) -> bool {
        self.get(KEY_SORT_NEWEST_FIRST)
            .and_then(|v| v.parse().ok())
            .unwrap_or(true)
    }

    pub fn theme_name(&self) -> &str {
        self.get(KEY_THEME_NAME).unwrap_or("light")
    }

    pub fn theme_font(&self) -> &str {
        self.get(KEY_THEME_FONT).unwrap_or("")
    }

    pub fn theme_size(&self) -> f64 {
        self.get(KEY_THEME_SIZE)
            .and_then(|v| v.parse().ok())
            .unwrap_or(1.0)
    }

    // ========================================================================
    // Internal Helpers
    // ========================================================================

    fn flatten_config(config: &Config) -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert(KEY_THEME_NAME.to_string(), config.theme.clone());
        for (action, key_str) in &config.keybindings {
            map.insert(format!("keybind.{}", action), key_str.clone());
        }
        // Credentials stay out of the preference store.
        map
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::storage::Database;

    async fn test_db() -> Database {
        Database::open(":memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_defaults_without_stored_values() {
        let pm = PreferenceManager::load(&Config::default(), test_db().await)
            .await
            .unwrap();

        assert_eq!(pm.filter(), StatusFilter::All);
        assert_eq!(pm.feed_selected(), None);
        assert_eq!(pm.tag_selected(), None);
        assert_eq!(pm.feed_list_width(), 300);
        assert_eq!(pm.item_list_width(), 300);
        assert!(pm.sort_newest_first());
        assert_eq!(pm.theme_name(), "light");
        assert_eq!(pm.theme_font(), "");
        assert_eq!(pm.theme_size(), 1.0);
    }

    #[tokio::test]
    async fn test_db_overrides_config() {
        let db = test_db().await;
        let mut config = Config::default();
        config.theme = "sepia".to_string();
        db.set_preference(KEY_THEME_NAME, "night").await.unwrap();

        let pm = PreferenceManager::load(&config, db).await.unwrap();
        assert_eq!(pm.theme_name(), "night");
    }

    #[tokio::test]
    async fn test_set_only_writes_on_change() {
        let db = test_db().await;
        let mut pm = PreferenceManager::load(&Config::default(), db.clone())
            .await
            .unwrap();

        assert!(pm.set(KEY_FILTER, "unread").await.unwrap());
        assert!(!pm.set(KEY_FILTER, "unread").await.unwrap());
        assert_eq!(pm.filter(), StatusFilter::Unread);
        assert_eq!(
            db.get_preference(KEY_FILTER).await.unwrap(),
            Some("unread".to_string())
        );
    }

    #[tokio::test]
    async fn test_typed_values_survive_reload() {
        let db = test_db().await;
        let config = Config::default();
        let mut pm = PreferenceManager::load(&config, db.clone()).await.unwrap();
        pm.set(KEY_FEED_SELECTED, "folder:4").await.unwrap();
        pm.set(KEY_TAG_SELECTED, "9").await.unwrap();
        pm.set(KEY_SORT_NEWEST_FIRST, "false").await.unwrap();
        pm.set(KEY_THEME_SIZE, "1.2").await.unwrap();
        drop(pm);

        let pm = PreferenceManager::load(&config, db).await.unwrap();
        assert_eq!(pm.feed_selected(), Some(Selection::Folder(4)));
        assert_eq!(pm.tag_selected(), Some(9));
        assert!(!pm.sort_newest_first());
        assert_eq!(pm.theme_size(), 1.2);
    }

    #[tokio::test]
    async fn test_unset_selection_reads_as_none() {
        let mut pm = PreferenceManager::from_config(&Config::default());
        pm.set(KEY_FEED_SELECTED, "").await.unwrap();
        pm.set(KEY_TAG_SELECTED, "").await.unwrap();
        assert_eq!(pm.feed_selected(), None);
        assert_eq!(pm.tag_selected(), None);
    }

    #[tokio::test]
    async fn test_config_keybindings_flattened() {
        let mut config = Config::default();
        config
            .keybindings
            .insert("quit".to_string(), "Ctrl+q".to_string());
        let pm = PreferenceManager::from_config(&config);
        assert_eq!(pm.get("keybind.quit"), Some("Ctrl+q"));
        assert_eq!(pm.get("password"), None);
    }
}
