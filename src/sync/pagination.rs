//! Item list pagination.
//!
//! A refresh is split into a planning step that runs on the event loop
//! (`begin_refresh`), the gateway call in a spawned task, and an apply step
//! back on the loop (`apply_page`). Every query change bumps
//! `items_generation`, so a page that arrives for an older query is dropped
//! instead of being mixed into the current list.
use crate::model::{ItemPage, ItemQuery, Selection};
use crate::state::AppState;
use crate::sync::navigation::ScrollArea;
use std::collections::HashSet;

/// What the caller should do after `begin_refresh`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshPlan {
    /// No view is selected; the list was cleared.
    Clear,
    /// A load-more request that must be dropped.
    Skip,
    Fetch {
        query: ItemQuery,
        generation: u64,
        load_more: bool,
    },
}

/// Query for the current view, or `None` when nothing is selected.
pub fn build_query(state: &AppState) -> Option<ItemQuery> {
    let mut query = ItemQuery {
        status: state.filter.status(),
        oldest_first: !state.sort_newest_first,
        tag: state.tag_selected,
        ..ItemQuery::default()
    };
    match state.current? {
        Selection::Feed(id) => query.feed_id = Some(id),
        Selection::Folder(id) => query.folder_id = Some(id),
    }
    let search = state.search.trim();
    if !search.is_empty() {
        query.search = Some(search.to_string());
    }
    Some(query)
}

pub fn begin_refresh(state: &mut AppState, load_more: bool) -> RefreshPlan {
    let Some(mut query) = build_query(state) else {
        state.items.clear();
        state.items_generation += 1;
        state.loading.items = false;
        return RefreshPlan::Clear;
    };

    if load_more {
        if !state.items_has_more || state.loading.items {
            return RefreshPlan::Skip;
        }
        let Some(last) = state.items.last() else {
            return RefreshPlan::Skip;
        };
        query.after = Some(last.id);
    } else {
        state.items_generation += 1;
    }

    state.loading.items = true;
    RefreshPlan::Fetch {
        query,
        generation: state.items_generation,
        load_more,
    }
}

/// Apply a fetched page. Returns false when the page belongs to a superseded query.
pub fn apply_page(state: &mut AppState, generation: u64, load_more: bool, page: ItemPage) -> bool {
    if generation != state.items_generation {
        return false;
    }
    state.loading.items = false;

    if load_more {
        let seen: HashSet<_> = state.items.iter().map(|i| i.id).collect();
        state
            .items
            .extend(page.list.into_iter().filter(|i| !seen.contains(&i.id)));
        state.items_has_more = state.items_has_more && page.has_more;
    } else {
        state.items = page.list;
        state.items_has_more = page.has_more;
    }
    true
}

/// Release the busy flag after a failed load, leaving the list untouched.
pub fn fail_page(state: &mut AppState, generation: u64) {
    if generation == state.items_generation {
        state.loading.items = false;
    }
}

/// Whether the item list is close enough to its bottom to fetch the next page.
pub fn should_load_more(state: &AppState, area: ScrollArea, threshold: i64) -> bool {
    if !state.items_has_more || state.loading.items || state.items.is_empty() {
        return false;
    }
    area.content_height - area.scroll_top - area.height < threshold
}

/// Local effect of a confirmed bulk mark-read: the list is consumed.
pub fn apply_mark_all_read(state: &mut AppState) {
    state.items.clear();
    state.selected_item = None;
    state.item_detail = None;
    state.readability = None;
    state.items_has_more = false;
    state.items_generation += 1;
    state.loading.items = false;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Item, ItemId, ItemStatus, StatusFilter};
    use pretty_assertions::assert_eq;

    fn item(id: ItemId) -> Item {
        Item {
            id,
            feed_id: 1,
            title: format!("Item {}", id),
            link: None,
            date: None,
            status: ItemStatus::Unread,
        }
    }

    fn page(ids: &[ItemId], has_more: bool) -> ItemPage {
        ItemPage {
            list: ids.iter().copied().map(item).collect(),
            has_more,
        }
    }

    fn ids(state: &AppState) -> Vec<ItemId> {
        state.items.iter().map(|i| i.id).collect()
    }

    fn with_feed() -> AppState {
        let mut state = AppState::new();
        state.current = Some(Selection::Feed(3));
        state
    }

    #[test]
    fn test_build_query_from_view() {
        let mut state = with_feed();
        state.filter = StatusFilter::Starred;
        state.search = "  rust ".to_string();
        state.sort_newest_first = false;
        state.tag_selected = Some(4);

        assert_eq!(
            build_query(&state),
            Some(ItemQuery {
                feed_id: Some(3),
                folder_id: None,
                status: Some(ItemStatus::Starred),
                search: Some("rust".to_string()),
                oldest_first: true,
                tag: Some(4),
                after: None,
            })
        );

        state.current = Some(Selection::Folder(8));
        let q = build_query(&state).unwrap();
        assert_eq!((q.feed_id, q.folder_id), (None, Some(8)));
    }

    #[test]
    fn test_no_selection_clears() {
        let mut state = AppState::new();
        state.items = vec![item(1)];
        assert_eq!(begin_refresh(&mut state, false), RefreshPlan::Clear);
        assert!(state.items.is_empty());
    }

    #[test]
    fn test_fresh_then_load_more_appends_with_cursor() {
        let mut state = with_feed();
        let RefreshPlan::Fetch { generation, .. } = begin_refresh(&mut state, false) else {
            panic!("expected fetch");
        };
        assert!(state.loading.items);
        assert!(apply_page(&mut state, generation, false, page(&[1, 2], true)));
        assert!(!state.loading.items);

        let RefreshPlan::Fetch { query, generation, load_more } = begin_refresh(&mut state, true) else {
            panic!("expected fetch");
        };
        assert!(load_more);
        assert_eq!(query.after, Some(2));
        apply_page(&mut state, generation, true, page(&[2, 3], false));
        assert_eq!(ids(&state), vec![1, 2, 3]);
        assert!(!state.items_has_more);
    }

    #[test]
    fn test_load_more_dropped_while_busy_or_exhausted() {
        let mut state = with_feed();
        state.items = vec![item(1)];
        state.loading.items = true;
        assert_eq!(begin_refresh(&mut state, true), RefreshPlan::Skip);

        state.loading.items = false;
        state.items_has_more = false;
        assert_eq!(begin_refresh(&mut state, true), RefreshPlan::Skip);

        // a query change re-enables pagination
        assert!(matches!(begin_refresh(&mut state, false), RefreshPlan::Fetch { .. }));
    }

    #[test]
    fn test_stale_page_is_discarded() {
        let mut state = with_feed();
        let RefreshPlan::Fetch { generation: old, .. } = begin_refresh(&mut state, false) else {
            panic!("expected fetch");
        };
        state.current = Some(Selection::Feed(4));
        let RefreshPlan::Fetch { generation: new, .. } = begin_refresh(&mut state, false) else {
            panic!("expected fetch");
        };

        assert!(!apply_page(&mut state, old, false, page(&[100], true)));
        assert!(state.items.is_empty());
        assert!(state.loading.items);

        assert!(apply_page(&mut state, new, false, page(&[7], true)));
        assert_eq!(ids(&state), vec![7]);
    }

    #[test]
    fn test_fail_page_releases_busy_flag() {
        let mut state = with_feed();
        let RefreshPlan::Fetch { generation, .. } = begin_refresh(&mut state, false) else {
            panic!("expected fetch");
        };
        fail_page(&mut state, generation);
        assert!(!state.loading.items);
    }

    #[test]
    fn test_should_load_more_near_bottom() {
        let mut state = with_feed();
        state.items = vec![item(1)];
        let area = ScrollArea {
            scroll_top: 760,
            height: 200,
            content_height: 1000,
        };
        assert!(should_load_more(&state, area, 50));
        assert!(!should_load_more(
            &state,
            ScrollArea {
                scroll_top: 700,
                ..area
            },
            50
        ));
        state.items_has_more = false;
        assert!(!should_load_more(&state, area, 50));
    }

    #[test]
    fn test_mark_all_read_consumes_list() {
        let mut state = with_feed();
        state.items = vec![item(1), item(2)];
        state.selected_item = Some(1);
        apply_mark_all_read(&mut state);
        assert!(state.items.is_empty());
        assert_eq!(state.selected_item, None);
        assert!(!state.items_has_more);
        assert_eq!(begin_refresh(&mut state, true), RefreshPlan::Skip);
    }
}
