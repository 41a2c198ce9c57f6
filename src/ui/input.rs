//! Input handling for the TUI.
//!
//! Overlays capture keys in a fixed order: help, notice, confirmation, feed
//! candidates, text prompt, fuzzy finder. Only when none is open do keys go
//! through the keybinding registry.

use crate::app::{App, Prompt, PromptKind, LIST_WIDTH_STEP};
use crate::keybindings::{Action as KbAction, Context as KbContext};
use crate::model::{Selection, StatusFilter};
use crate::sync::ScrollDirection;
use crate::util::{validate_url_for_open, MAX_SEARCH_QUERY_LENGTH};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::Action;

const ERR_ITEM_NO_LINK: &str = "Item has no link";
const ERR_NO_FEED: &str = "Select a feed first";

/// Main input dispatch function.
pub async fn handle_input(app: &mut App, key: KeyEvent) -> Result<Action> {
    if key.kind == KeyEventKind::Release {
        return Ok(Action::Continue);
    }
    let (code, modifiers) = (key.code, key.modifiers);

    if app.show_help {
        handle_help_input(app, code, modifiers);
        return Ok(Action::Continue);
    }
    if app.notice.is_some() {
        if matches!(code, KeyCode::Esc | KeyCode::Enter) {
            app.notice = None;
        }
        return Ok(Action::Continue);
    }
    if app.pending_confirm.is_some() {
        handle_confirm_input(app, code);
        return Ok(Action::Continue);
    }
    if !app.state.feed_new_choice.is_empty() {
        handle_choice_input(app, code);
        return Ok(Action::Continue);
    }
    if app.prompt.is_some() {
        handle_prompt_input(app, code, modifiers).await;
        return Ok(Action::Continue);
    }
    if app.state.fuzzy.enabled {
        handle_fuzzy_input(app, code, modifiers).await;
        return Ok(Action::Continue);
    }

    match app
        .keybindings
        .action_for_key(code, modifiers, KbContext::Global)
    {
        Some(action) => dispatch(app, action).await,
        None => Ok(Action::Continue),
    }
}

/// j/k/Up/Down scroll, Esc/? dismiss.
fn handle_help_input(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    if app.keybindings.action_for_key(code, modifiers, KbContext::Help) == Some(KbAction::Back)
    {
        app.show_help = false;
        app.help_scroll_offset = 0;
        return;
    }
    match code {
        KeyCode::Char('j') | KeyCode::Down => {
            app.help_scroll_offset = app.help_scroll_offset.saturating_add(1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.help_scroll_offset = app.help_scroll_offset.saturating_sub(1);
        }
        KeyCode::Char('q') => {
            app.show_help = false;
            app.help_scroll_offset = 0;
        }
        _ => {}
    }
}

fn handle_confirm_input(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => app.confirm_pending(),
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            app.pending_confirm = None;
            app.set_status("Cancelled");
        }
        _ => {}
    }
}

/// Pick one of several feeds discovered at a url.
fn handle_choice_input(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Up | KeyCode::Char('k') => app.move_feed_candidate_cursor(-1),
        KeyCode::Down | KeyCode::Char('j') => app.move_feed_candidate_cursor(1),
        KeyCode::Enter => app.choose_feed_candidate(),
        KeyCode::Esc => {
            app.state.feed_new_choice.clear();
            app.state.feed_new_choice_selected = 0;
        }
        _ => {}
    }
}

async fn handle_prompt_input(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    let Some(prompt) = app.prompt.as_mut() else {
        return;
    };
    let kind = prompt.kind;
    match code {
        KeyCode::Esc => {
            app.prompt = None;
            if kind == PromptKind::Search {
                app.set_search("");
            }
        }
        KeyCode::Enter => {
            if let Some(prompt) = app.prompt.take() {
                submit_prompt(app, prompt).await;
            }
        }
        KeyCode::Backspace => {
            prompt.input.pop();
            if kind == PromptKind::Search {
                let term = prompt.input.clone();
                app.set_search(term);
            }
        }
        KeyCode::Char('u') if modifiers.contains(KeyModifiers::CONTROL) => {
            prompt.input.clear();
            if kind == PromptKind::Search {
                app.set_search("");
            }
        }
        KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => {
            if kind == PromptKind::Search && prompt.input.len() >= MAX_SEARCH_QUERY_LENGTH {
                app.set_status(format!(
                    "Search query too long (max {} chars)",
                    MAX_SEARCH_QUERY_LENGTH
                ));
                return;
            }
            prompt.input.push(c);
            if kind == PromptKind::Search {
                let term = prompt.input.clone();
                app.set_search(term);
            }
        }
        _ => {}
    }
}

async fn submit_prompt(app: &mut App, prompt: Prompt) {
    let input = prompt.input.trim();
    match prompt.kind {
        PromptKind::Search => {}
        PromptKind::AddFeed => {
            let folder_id = app.default_folder_for_new_feed();
            app.create_feed(input, folder_id);
        }
        PromptKind::NewFolder => app.create_folder(input),
        PromptKind::RenameFolder(id) => app.rename_folder(id, input),
        PromptKind::RenameFeed(id) => app.rename_feed(id, input),
        PromptKind::MoveFeed(id) => app.move_feed_to_named_folder(id, input),
        PromptKind::EditTags(id) => app.set_tags(id, input),
        PromptKind::TagParent(id) => app.set_parent_tag_by_name(id, input),
        PromptKind::FilterRule(id) => app.set_filter_rule(id, input),
        PromptKind::RefreshRate => match input.parse::<u64>() {
            Ok(minutes) => app.set_refresh_rate(minutes),
            Err(_) => app.set_status(format!("Not a number of minutes: {}", input)),
        },
    }
}

async fn handle_fuzzy_input(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    match app
        .keybindings
        .action_for_key(code, modifiers, KbContext::Fuzzy)
    {
        Some(KbAction::FuzzyUp) => app.state.fuzzy.move_cursor(-1),
        Some(KbAction::FuzzyDown) => app.state.fuzzy.move_cursor(1),
        Some(KbAction::FuzzyConfirm) => {
            if let Some(feed_id) = app.state.fuzzy.confirm() {
                app.select_view(Some(Selection::Feed(feed_id))).await;
            }
        }
        Some(KbAction::Back) => app.state.fuzzy.close(),
        // Everything else is typing.
        _ => match code {
            KeyCode::Backspace => app.state.fuzzy.pop_char(&app.state.feeds),
            KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => {
                app.state.fuzzy.push_char(c, &app.state.feeds)
            }
            _ => {}
        },
    }
}

fn open_prompt(app: &mut App, kind: PromptKind, input: impl Into<String>) {
    app.prompt = Some(Prompt {
        kind,
        input: input.into(),
    });
}

/// Run a global action.
async fn dispatch(app: &mut App, action: KbAction) -> Result<Action> {
    match action {
        KbAction::Quit => return Ok(Action::Quit),
        KbAction::ShowHelp => {
            app.show_help = true;
            app.help_scroll_offset = 0;
        }
        KbAction::Back => {
            if !app.state.search.is_empty() {
                app.set_search("");
            }
        }

        // Reading
        KbAction::OpenLink => open_item_link(app),
        KbAction::ToggleReadability => app.toggle_readability(),
        KbAction::ToggleRead => app.toggle_item_read(),
        KbAction::MarkAllRead => {
            if app.state.filter == StatusFilter::Unread {
                app.mark_all_read();
            }
        }
        KbAction::ToggleStar => app.toggle_item_starred(),
        KbAction::FocusSearch => {
            let term = app.state.search.clone();
            open_prompt(app, PromptKind::Search, term);
        }
        KbAction::NextItem => app.navigate_item(1),
        KbAction::PrevItem => app.navigate_item(-1),
        KbAction::NextFeed => app.navigate_feed(1).await,
        KbAction::PrevFeed => app.navigate_feed(-1).await,
        KbAction::ScrollForward => app.scroll_content(ScrollDirection::Forward),
        KbAction::ScrollBackward => app.scroll_content(ScrollDirection::Backward),
        KbAction::ScrollTop => app.scroll_content_top(),
        KbAction::ScrollBottom => app.scroll_content_bottom(),
        KbAction::FilterUnread => app.set_filter(StatusFilter::Unread).await,
        KbAction::FilterStarred => app.set_filter(StatusFilter::Starred).await,
        KbAction::FilterAll => app.set_filter(StatusFilter::All).await,
        KbAction::UnselectFeed => app.select_view(None).await,
        KbAction::FuzzyFinder => {
            app.state.fuzzy.open(&app.state.feeds);
        }

        // Application
        KbAction::FetchAllFeeds => app.fetch_all_feeds(),
        KbAction::ToggleSort => {
            app.toggle_sort().await;
            app.set_status(if app.state.sort_newest_first {
                "Newest first"
            } else {
                "Oldest first"
            });
        }
        KbAction::CycleTag => {
            app.cycle_tag().await;
            let label = app
                .state
                .tag_selected
                .and_then(|t| app.state.tags.names.get(&t).cloned())
                .unwrap_or_else(|| "all tags".to_string());
            app.set_status(format!("Tag: {}", label));
        }

        // Subscriptions
        KbAction::ToggleFolder => {
            let folder_id = match app.state.current {
                Some(Selection::Folder(id)) => Some(id),
                Some(Selection::Feed(_)) => app.state.current_feed().and_then(|f| f.folder_id),
                None => None,
            };
            if let Some(id) = folder_id {
                app.toggle_folder_expanded(id);
            }
        }
        KbAction::AddFeed => open_prompt(app, PromptKind::AddFeed, ""),
        KbAction::NewFolder => open_prompt(app, PromptKind::NewFolder, ""),
        KbAction::Rename => {
            if let Some(folder) = app.state.current_folder() {
                let (id, title) = (folder.id, folder.title.clone());
                open_prompt(app, PromptKind::RenameFolder(id), title);
            } else if let Some(feed) = app.state.current_feed() {
                let (id, title) = (feed.id, feed.title.clone());
                open_prompt(app, PromptKind::RenameFeed(id), title);
            }
        }
        KbAction::Delete => app.request_delete(),
        KbAction::MoveFeed => match app.state.current_feed() {
            Some(feed) => {
                let id = feed.id;
                let folder = feed
                    .folder_id
                    .and_then(|f| app.state.folder(f))
                    .map(|f| f.title.clone())
                    .unwrap_or_default();
                open_prompt(app, PromptKind::MoveFeed(id), folder);
            }
            None => app.set_status(ERR_NO_FEED),
        },
        KbAction::EditTags => match app.state.current_feed().map(|f| f.id) {
            Some(id) => {
                let tags = app.state.tags.names_for_feed(id);
                open_prompt(app, PromptKind::EditTags(id), tags);
            }
            None => app.set_status(ERR_NO_FEED),
        },
        KbAction::SetTagParent => match app.state.tag_selected {
            Some(tag) => {
                let parent = app
                    .state
                    .tags
                    .parent(tag)
                    .and_then(|p| app.state.tags.names.get(&p).cloned())
                    .unwrap_or_default();
                open_prompt(app, PromptKind::TagParent(tag), parent);
            }
            None => app.set_status("Select a tag first (T)"),
        },
        KbAction::FilterRule => match app.state.current_feed() {
            Some(feed) => {
                let id = feed.id;
                let rule = feed.filter_rule.clone().unwrap_or_default();
                open_prompt(app, PromptKind::FilterRule(id), rule);
            }
            None => app.set_status(ERR_NO_FEED),
        },
        KbAction::ToggleFeedReadability => match app.state.current_feed().map(|f| f.id) {
            Some(id) => app.toggle_feed_readability(id),
            None => app.set_status(ERR_NO_FEED),
        },
        KbAction::RefreshRate => {
            let current = app
                .state
                .refresh_rate
                .map(|r| r.to_string())
                .unwrap_or_default();
            open_prompt(app, PromptKind::RefreshRate, current);
        }

        // Appearance
        KbAction::CycleTheme => {
            let name = app.cycle_theme().await;
            app.set_status(format!("Theme: {}", name));
        }
        KbAction::CycleFont => {
            let name = app.cycle_font().await;
            let label = if name.is_empty() { "default" } else { name };
            app.set_status(format!("Font: {}", label));
        }
        KbAction::FontLarger => app.incr_font(1).await,
        KbAction::FontSmaller => app.incr_font(-1).await,
        KbAction::NarrowFeedList => app.resize_feed_list(-LIST_WIDTH_STEP),
        KbAction::WidenFeedList => app.resize_feed_list(LIST_WIDTH_STEP),
        KbAction::NarrowItemList => app.resize_item_list(-LIST_WIDTH_STEP),
        KbAction::WidenItemList => app.resize_item_list(LIST_WIDTH_STEP),

        // Only bound in the fuzzy context.
        KbAction::FuzzyUp | KbAction::FuzzyDown | KbAction::FuzzyConfirm => {}
    }
    Ok(Action::Continue)
}

fn open_item_link(app: &mut App) {
    let Some(url) = app.selected_link().map(str::to_string) else {
        if app.state.selected_item.is_some() {
            app.set_status(ERR_ITEM_NO_LINK);
        }
        return;
    };
    // Links come from feeds; only http(s) reaches the system opener.
    if let Err(e) = validate_url_for_open(&url) {
        app.set_status(e.to_string());
    } else if let Err(e) = open::that(&url) {
        tracing::warn!(error = %e, url = %url, "Failed to open browser");
        app.set_status(format!("Failed to open browser: {}", e));
    }
}
