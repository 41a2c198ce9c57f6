//! Item status toggles.
//!
//! The remote update is issued first; local counters and both copies of the
//! item (list row and detail) change only after the server confirms. A failed
//! call leaves everything as it was and the next status poll reconciles.
use crate::model::{FeedId, ItemId, ItemStatus};
use crate::state::AppState;

/// `target` unless the item already has it, in which case `fallback`.
pub fn toggled_status(current: ItemStatus, target: ItemStatus, fallback: ItemStatus) -> ItemStatus {
    if current == target {
        fallback
    } else {
        target
    }
}

/// A pending status change, captured before the remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub item_id: ItemId,
    pub feed_id: FeedId,
    pub old: ItemStatus,
    pub new: ItemStatus,
}

impl StatusChange {
    pub fn toggle(
        item_id: ItemId,
        feed_id: FeedId,
        current: ItemStatus,
        target: ItemStatus,
        fallback: ItemStatus,
    ) -> Self {
        Self {
            item_id,
            feed_id,
            old: current,
            new: toggled_status(current, target, fallback),
        }
    }

    /// Toggle on the item being read, or on the highlighted list row.
    pub fn for_selected(state: &AppState, target: ItemStatus, fallback: ItemStatus) -> Option<Self> {
        if let Some(detail) = state
            .item_detail
            .as_ref()
            .filter(|d| Some(d.id) == state.selected_item)
        {
            return Some(Self::toggle(detail.id, detail.feed_id, detail.status, target, fallback));
        }
        let row = state.selected_item_row()?;
        Some(Self::toggle(row.id, row.feed_id, row.status, target, fallback))
    }
}

/// Apply a confirmed change to counters, the list row and the detail.
pub fn apply_confirmed(state: &mut AppState, change: &StatusChange) {
    let entry = state
        .stats
        .entry(change.feed_id)
        .or_insert_with(|| crate::model::StatsEntry::empty(change.feed_id));
    entry.bump(change.old, -1);
    entry.bump(change.new, 1);

    if let Some(item) = state.items.iter_mut().find(|i| i.id == change.item_id) {
        item.status = change.new;
    }
    if let Some(detail) = state.item_detail.as_mut().filter(|d| d.id == change.item_id) {
        detail.status = change.new;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Item, ItemDetail, StatsEntry};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn state_with(status: ItemStatus) -> AppState {
        let mut state = AppState::new();
        state.items = vec![Item {
            id: 7,
            feed_id: 2,
            title: "Seven".to_string(),
            link: None,
            date: None,
            status,
        }];
        state.selected_item = Some(7);
        state.item_detail = Some(ItemDetail {
            id: 7,
            feed_id: 2,
            title: "Seven".to_string(),
            link: None,
            date: None,
            author: None,
            content: None,
            status,
        });
        state.replace_stats(vec![StatsEntry {
            feed_id: 2,
            unread: 5,
            starred: 1,
            read: 10,
        }]);
        state
    }

    fn confirm_toggle(state: &mut AppState, target: ItemStatus, fallback: ItemStatus) {
        let change = StatusChange::for_selected(state, target, fallback).unwrap();
        apply_confirmed(state, &change);
    }

    #[test]
    fn test_toggled_status() {
        use ItemStatus::*;
        assert_eq!(toggled_status(Unread, Starred, Read), Starred);
        assert_eq!(toggled_status(Starred, Starred, Read), Read);
        assert_eq!(toggled_status(Unread, Unread, Read), Read);
        assert_eq!(toggled_status(Read, Unread, Read), Unread);
    }

    #[test]
    fn test_confirmed_star_updates_counters_and_both_copies() {
        let mut state = state_with(ItemStatus::Unread);
        confirm_toggle(&mut state, ItemStatus::Starred, ItemStatus::Read);

        let stats = state.stats_for(2);
        assert_eq!((stats.unread, stats.starred, stats.read), (4, 2, 10));
        assert_eq!(state.items[0].status, ItemStatus::Starred);
        assert_eq!(state.item_detail.as_ref().unwrap().status, ItemStatus::Starred);
    }

    #[test]
    fn test_toggle_without_detail_uses_list_row() {
        let mut state = state_with(ItemStatus::Unread);
        state.item_detail = None;
        confirm_toggle(&mut state, ItemStatus::Unread, ItemStatus::Read);
        assert_eq!(state.items[0].status, ItemStatus::Read);
        assert_eq!(state.stats_for(2).unread, 4);
    }

    #[test]
    fn test_detail_outside_list_still_updated() {
        let mut state = state_with(ItemStatus::Read);
        state.items.clear();
        confirm_toggle(&mut state, ItemStatus::Starred, ItemStatus::Read);
        assert_eq!(state.item_detail.as_ref().unwrap().status, ItemStatus::Starred);
    }

    #[test]
    fn test_missing_stats_entry_is_created() {
        let mut state = state_with(ItemStatus::Read);
        state.stats.clear();
        confirm_toggle(&mut state, ItemStatus::Starred, ItemStatus::Read);
        assert_eq!(state.stats_for(2).starred, 1);
    }

    #[test]
    fn test_nothing_selected_is_none() {
        let mut state = state_with(ItemStatus::Unread);
        state.selected_item = None;
        assert_eq!(
            StatusChange::for_selected(&state, ItemStatus::Starred, ItemStatus::Read),
            None
        );
    }

    fn status() -> impl Strategy<Value = ItemStatus> {
        prop_oneof![
            Just(ItemStatus::Unread),
            Just(ItemStatus::Read),
            Just(ItemStatus::Starred)
        ]
    }

    proptest! {
        #[test]
        fn prop_double_toggle_round_trips(target in status(), fallback in status(), start_on_target in any::<bool>()) {
            prop_assume!(target != fallback);
            let start = if start_on_target { target } else { fallback };
            let mut state = state_with(start);
            let before = state.stats_for(2);

            confirm_toggle(&mut state, target, fallback);
            confirm_toggle(&mut state, target, fallback);

            prop_assert_eq!(state.items[0].status, start);
            prop_assert_eq!(state.stats_for(2), before);
        }
    }
}
