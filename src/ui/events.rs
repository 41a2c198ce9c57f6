//! Application event handling.
//!
//! Applies background task completions to the model. Each arm is short; the
//! real work lives on `App` and in `crate::sync`.

use crate::app::{App, AppEvent};
use crate::sync::pagination;

/// Apply one completion. Runs on the event loop only.
pub async fn handle_app_event(app: &mut App, event: AppEvent) {
    tracing::trace!(event = event.name(), "Handling app event");
    match event {
        AppEvent::StatusLoaded {
            status,
            loop_mode,
            chained,
        } => app.apply_status(status, loop_mode, chained),
        AppEvent::TagsLoaded(tags) => {
            app.state.tags = tags;
            app.state.recompute_stats();
        }
        AppEvent::TreeLoaded { folders, feeds } => {
            tracing::debug!(folders = folders.len(), feeds = feeds.len(), "Tree loaded");
            app.state.folders = folders;
            app.state.feeds = feeds;
            app.state.recompute_stats();
        }
        AppEvent::BootstrapComplete => {
            tracing::info!("Bootstrap complete");
            app.refresh_items(false);
        }
        AppEvent::FeedErrorsLoaded(errors) => app.state.feed_errors = errors,

        AppEvent::ItemsLoaded {
            generation,
            load_more,
            result,
        } => match result {
            Ok(page) => {
                if !pagination::apply_page(&mut app.state, generation, load_more, page) {
                    tracing::debug!(generation, "Discarding stale item page");
                }
            }
            Err(error) => {
                pagination::fail_page(&mut app.state, generation);
                app.set_status(format!("Loading items failed: {}", error));
            }
        },
        AppEvent::ItemDetailLoaded { generation, result } => match result {
            Ok(detail) => app.apply_item_detail(generation, detail),
            Err(error) => {
                if generation == app.detail_generation {
                    app.set_status(format!("Loading item failed: {}", error));
                }
            }
        },
        AppEvent::ReadabilityLoaded { item_id, result } => {
            if app.state.selected_item != Some(item_id) {
                return;
            }
            app.state.loading.readability = false;
            match result {
                Ok(content) => app.state.readability = content.filter(|c| !c.trim().is_empty()),
                Err(error) => app.set_status(format!("Full text failed: {}", error)),
            }
            if app.state.readability.is_none() {
                tracing::debug!(item_id, "No extracted text, keeping feed content");
            }
            app.content_scroll.scroll_top = 0;
        }
        AppEvent::ItemStatusConfirmed(change) => app.apply_status_change(change),
        AppEvent::MarkedAllRead => {
            pagination::apply_mark_all_read(&mut app.state);
            app.refresh_stats();
        }

        AppEvent::FolderCreated(folder) => {
            app.set_status(format!("Created folder {}", folder.title));
            app.refresh_tree();
        }
        AppEvent::FolderRenamed { folder_id, title } => {
            if let Some(folder) = app.state.folder_mut(folder_id) {
                folder.title = title;
            }
            app.state.sort_folders();
        }
        AppEvent::FolderDeleted { folder_id } => app.apply_folder_deleted(folder_id).await,

        AppEvent::FeedCreated(result) => {
            app.state.loading.new_feed = false;
            match result {
                Ok(outcome) => app.apply_feed_created(outcome).await,
                Err(error) => app.set_status(format!("Adding feed failed: {}", error)),
            }
        }
        AppEvent::FeedPatched { feed_id, patch } => app.apply_feed_patch(feed_id, patch),
        AppEvent::FeedMovedToNewFolder => {
            app.refresh_tree();
            app.refresh_stats();
        }
        AppEvent::FeedDeleted { feed_id, folder_id } => {
            app.apply_feed_deleted(feed_id, folder_id).await
        }
        AppEvent::FeedsRefreshStarted => {
            app.set_status("Fetching feeds...");
            app.refresh_stats();
        }

        AppEvent::TagsUpdated => app.refresh_tags(),
        AppEvent::TagParentUpdated { tag_id, parent_id } => {
            app.apply_tag_parent(tag_id, parent_id)
        }
        AppEvent::RefreshRateUpdated(minutes) => {
            app.state.refresh_rate = Some(minutes);
            app.set_status(match minutes {
                0 => "Automatic refresh off".to_string(),
                n => format!("Refreshing every {} min", n),
            });
        }

        AppEvent::RequestFailed { action, error } => {
            app.set_status(format!("{} failed: {}", capitalize(action), error));
        }
        AppEvent::TaskPanicked { task, error } => {
            tracing::error!(task, error, "Background task panicked");
            app.set_status(format!("Internal error in {} task", task));
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
