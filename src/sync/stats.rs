//! Filtered statistics over feeds, folders and tags.
//!
//! A pure function of the stats map, the tag snapshot and the active
//! filter/tag selection; callers recompute wholesale whenever any input changes.
use crate::model::{Feed, FeedId, FolderId, StatsEntry, StatusFilter, TagId, TagSnapshot};
use std::collections::HashMap;

/// Counts under the active filter.
///
/// With no filter all maps are empty and `total` is `None`, telling the view
/// to show raw per-feed counts instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilteredStats {
    pub feeds: HashMap<FeedId, i64>,
    /// Keyed by folder id; `None` is the unfiled bucket.
    pub folders: HashMap<Option<FolderId>, i64>,
    pub total: Option<i64>,
}

impl FilteredStats {
    pub fn feed(&self, id: FeedId) -> i64 {
        self.feeds.get(&id).copied().unwrap_or(0)
    }

    pub fn folder(&self, id: Option<FolderId>) -> i64 {
        self.folders.get(&id).copied().unwrap_or(0)
    }
}

/// Whether `feed_id` belongs to `tag`, directly or through one parent hop.
///
/// `None` is "all tags" and matches every feed.
pub fn matches_tag(tags: &TagSnapshot, feed_id: FeedId, tag: Option<TagId>) -> bool {
    let Some(tag) = tag else {
        return true;
    };
    let Some(feed_tags) = tags.feed_tags.get(&feed_id) else {
        return false;
    };
    feed_tags.contains(&tag) || feed_tags.iter().any(|t| tags.parent(*t) == Some(tag))
}

/// Counter for `filter` on one entry; starred items also count as unread.
pub fn filtered_count(entry: &StatsEntry, filter: StatusFilter) -> i64 {
    match filter {
        StatusFilter::All => 0,
        StatusFilter::Unread => entry.unread + entry.starred,
        StatusFilter::Starred => entry.starred,
    }
}

/// Recompute filtered per-feed, per-folder and total counts.
pub fn compute(
    stats: &HashMap<FeedId, StatsEntry>,
    feeds: &[Feed],
    tags: &TagSnapshot,
    filter: StatusFilter,
    tag: Option<TagId>,
) -> FilteredStats {
    if filter == StatusFilter::All {
        return FilteredStats::default();
    }

    let mut out = FilteredStats {
        total: Some(0),
        ..FilteredStats::default()
    };
    let mut total = 0;

    for feed in feeds {
        if !matches_tag(tags, feed.id, tag) {
            continue;
        }
        let bucket = out.folders.entry(feed.folder_id).or_insert(0);
        let Some(entry) = stats.get(&feed.id) else {
            continue;
        };
        let n = filtered_count(entry, filter);
        *bucket += n;
        out.feeds.insert(feed.id, n);
        total += n;
    }

    out.total = Some(total);
    out
}

/// Σ(unread + starred) across the raw stats map, shown in the window title.
pub fn unread_badge(stats: &HashMap<FeedId, StatsEntry>) -> i64 {
    stats.values().map(|s| s.unread + s.starred).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn feed(id: FeedId, folder_id: Option<FolderId>) -> Feed {
        Feed {
            id,
            title: format!("Feed {}", id),
            folder_id,
            filter_rule: None,
            readability: false,
            link: None,
            feed_link: None,
        }
    }

    fn stats(entries: &[(FeedId, i64, i64)]) -> HashMap<FeedId, StatsEntry> {
        entries
            .iter()
            .map(|&(id, unread, starred)| {
                (
                    id,
                    StatsEntry {
                        feed_id: id,
                        unread,
                        starred,
                        read: 0,
                    },
                )
            })
            .collect()
    }

    fn tagged(pairs: &[(FeedId, Vec<TagId>)], parents: &[(TagId, TagId)]) -> TagSnapshot {
        TagSnapshot {
            feed_tags: pairs.iter().cloned().collect(),
            names: HashMap::new(),
            parents: parents.iter().cloned().collect(),
        }
    }

    #[test]
    fn test_no_filter_is_degenerate() {
        let out = compute(
            &stats(&[(1, 3, 1)]),
            &[feed(1, Some(1))],
            &TagSnapshot::default(),
            StatusFilter::All,
            None,
        );
        assert!(out.feeds.is_empty());
        assert!(out.folders.is_empty());
        assert_eq!(out.total, None);
    }

    #[test]
    fn test_unread_includes_starred() {
        let out = compute(
            &stats(&[(1, 3, 1)]),
            &[feed(1, Some(7))],
            &TagSnapshot::default(),
            StatusFilter::Unread,
            None,
        );
        assert_eq!(out.feed(1), 4);
        assert_eq!(out.folder(Some(7)), 4);
        assert_eq!(out.total, Some(4));
    }

    #[test]
    fn test_starred_filter_and_unfiled_bucket() {
        let out = compute(
            &stats(&[(1, 3, 1), (2, 0, 2)]),
            &[feed(1, Some(7)), feed(2, None)],
            &TagSnapshot::default(),
            StatusFilter::Starred,
            None,
        );
        assert_eq!(out.feed(1), 1);
        assert_eq!(out.folder(None), 2);
        assert_eq!(out.total, Some(3));
    }

    #[test]
    fn test_missing_stats_skipped_but_folder_present() {
        let out = compute(
            &stats(&[]),
            &[feed(5, Some(2))],
            &TagSnapshot::default(),
            StatusFilter::Unread,
            None,
        );
        assert!(!out.feeds.contains_key(&5));
        assert_eq!(out.folders.get(&Some(2)), Some(&0));
        assert_eq!(out.total, Some(0));
    }

    #[test]
    fn test_tag_matches_one_parent_hop_only() {
        // 30 -> 20 -> 10
        let tags = tagged(&[(1, vec![20]), (2, vec![30]), (3, vec![10])], &[(20, 10), (30, 20)]);
        assert!(matches_tag(&tags, 1, Some(10)));
        assert!(!matches_tag(&tags, 2, Some(10)));
        assert!(matches_tag(&tags, 3, Some(10)));
        assert!(!matches_tag(&tags, 4, Some(10)));
        assert!(matches_tag(&tags, 4, None));
    }

    #[test]
    fn test_tag_selection_excludes_unmatched() {
        let tags = tagged(&[(1, vec![10])], &[]);
        let out = compute(
            &stats(&[(1, 2, 0), (2, 5, 0)]),
            &[feed(1, None), feed(2, None)],
            &tags,
            StatusFilter::Unread,
            Some(10),
        );
        assert_eq!(out.feeds.len(), 1);
        assert_eq!(out.total, Some(2));
    }

    #[test]
    fn test_unread_badge() {
        assert_eq!(unread_badge(&stats(&[(1, 3, 1), (2, 2, 0)])), 6);
        assert_eq!(unread_badge(&HashMap::new()), 0);
    }

    proptest! {
        #[test]
        fn prop_total_is_sum_of_feeds(
            counts in proptest::collection::vec((0i64..50, 0i64..50, proptest::option::of(0i64..3)), 0..20),
            starred in any::<bool>(),
        ) {
            let feeds: Vec<Feed> = counts
                .iter()
                .enumerate()
                .map(|(i, (_, _, folder))| feed(i as FeedId, *folder))
                .collect();
            let map: HashMap<FeedId, StatsEntry> = counts
                .iter()
                .enumerate()
                .map(|(i, (u, s, _))| (i as FeedId, StatsEntry { feed_id: i as FeedId, unread: *u, starred: *s, read: 0 }))
                .collect();
            let filter = if starred { StatusFilter::Starred } else { StatusFilter::Unread };

            let out = compute(&map, &feeds, &TagSnapshot::default(), filter, None);
            let feed_sum: i64 = out.feeds.values().sum();
            let folder_sum: i64 = out.folders.values().sum();
            prop_assert_eq!(out.total, Some(feed_sum));
            prop_assert_eq!(feed_sum, folder_sum);
        }

        #[test]
        fn prop_all_filter_always_empty(
            counts in proptest::collection::vec((0i64..50, 0i64..50), 0..10),
            tag in proptest::option::of(0i64..5),
        ) {
            let feeds: Vec<Feed> = (0..counts.len()).map(|i| feed(i as FeedId, None)).collect();
            let map: HashMap<FeedId, StatsEntry> = counts
                .iter()
                .enumerate()
                .map(|(i, (u, s))| (i as FeedId, StatsEntry { feed_id: i as FeedId, unread: *u, starred: *s, read: 0 }))
                .collect();
            let out = compute(&map, &feeds, &TagSnapshot::default(), StatusFilter::All, tag);
            prop_assert_eq!(out, FilteredStats::default());
        }
    }
}
