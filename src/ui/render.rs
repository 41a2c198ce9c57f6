//! Render functions for the TUI.
//!
//! Three panes side by side (feed tree, item list, reading pane) over a one
//! line status bar, with overlays drawn last.

use crate::app::{App, ConfirmAction};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};

use super::help::centered_rect;
use super::{articles, feeds, help, reader, status};

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 60;
pub(super) const MIN_HEIGHT: u16 = 10;

/// Stored list widths are in the web client's pixel units.
const PIXELS_PER_COLUMN: i64 = 10;

/// Reading pane columns kept free when the lists are wide.
const MIN_READER_COLUMNS: u16 = 20;

/// Main render dispatch function.
pub(super) fn render(f: &mut Frame, app: &mut App) {
    let area = f.area();
    if area.width < 1 || area.height < 1 {
        return;
    }

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);
    let [feed_cols, item_cols] = list_columns(app, rows[0].width);
    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(feed_cols),
            Constraint::Length(item_cols),
            Constraint::Min(MIN_READER_COLUMNS),
        ])
        .split(rows[0]);

    feeds::render(f, app, panes[0]);
    articles::render(f, app, panes[1]);
    reader::render(f, app, panes[2]);
    status::render(f, app, rows[1]);

    if app.state.fuzzy.enabled {
        render_fuzzy_overlay(f, app);
    }
    if !app.state.feed_new_choice.is_empty() {
        render_choice_overlay(f, app);
    }
    if let Some(confirm) = &app.pending_confirm {
        render_confirm_overlay(f, app, confirm);
    }
    if let Some(notice) = &app.notice {
        render_notice_overlay(f, app, notice);
    }
    if app.show_help {
        help::render(f, app);
    }
}

/// Column widths of the two lists, shrunk together if the terminal is narrow.
fn list_columns(app: &App, total: u16) -> [u16; 2] {
    let feed = (app.feed_list_width / PIXELS_PER_COLUMN) as u16;
    let item = (app.item_list_width / PIXELS_PER_COLUMN) as u16;
    let room = total.saturating_sub(MIN_READER_COLUMNS);
    if feed + item <= room {
        return [feed, item];
    }
    let feed_share = (u32::from(room) * u32::from(feed) / u32::from(feed + item).max(1)) as u16;
    [feed_share, room - feed_share]
}

/// A bordered box of `width` x `height` centered on screen, or `None` if it
/// would not fit.
fn dialog_rect(area: Rect, width: u16, height: u16) -> Option<Rect> {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(4));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let rect = Rect::new(x, y, width, height);
    (rect.width >= 10 && rect.height >= 3).then_some(rect)
}

fn render_confirm_overlay(f: &mut Frame, app: &App, confirm: &ConfirmAction) {
    let text = match confirm {
        ConfirmAction::DeleteFeed { title, .. } => format!(
            "Delete feed \"{}\"?\n\nIts items are removed from the server.\n\n(y) Confirm  (n/Esc) Cancel",
            title
        ),
        ConfirmAction::DeleteFolder { title, .. } => format!(
            "Delete folder \"{}\"?\n\nIts feeds move to the unfiled list.\n\n(y) Confirm  (n/Esc) Cancel",
            title
        ),
    };
    let Some(overlay) = dialog_rect(f.area(), 54, 8) else {
        return;
    };

    f.render_widget(Clear, overlay);
    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.style("panel_border_focused"))
                .title(" Confirm "),
        )
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .style(app.style("reader_body"));
    f.render_widget(paragraph, overlay);
}

fn render_notice_overlay(f: &mut Frame, app: &App, notice: &str) {
    let Some(overlay) = dialog_rect(f.area(), 50, 5) else {
        return;
    };
    f.render_widget(Clear, overlay);
    let paragraph = Paragraph::new(format!("{}\n\n(Esc) Dismiss", notice))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.style("panel_border_focused")),
        )
        .alignment(Alignment::Center)
        .style(app.style("reader_body"));
    f.render_widget(paragraph, overlay);
}

/// Candidates found at an ambiguous url.
fn render_choice_overlay(f: &mut Frame, app: &App) {
    let choices = &app.state.feed_new_choice;
    let height = choices.len().min(12) as u16 + 4;
    let Some(overlay) = dialog_rect(f.area(), 70, height) else {
        return;
    };
    f.render_widget(Clear, overlay);

    let mut lines: Vec<Line> = choices
        .iter()
        .enumerate()
        .map(|(i, choice)| {
            let label = if choice.title.is_empty() {
                choice.url.clone()
            } else {
                format!("{}  {}", choice.title, choice.url)
            };
            if i == app.state.feed_new_choice_selected {
                Line::from(Span::styled(format!("> {}", label), app.style("item_selected")))
            } else {
                Line::from(format!("  {}", label))
            }
        })
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "(Enter) Subscribe  (Esc) Cancel",
        app.style("reader_metadata"),
    )));

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.style("panel_border_focused"))
                .title(" Several feeds found "),
        )
        .style(app.style("reader_body"));
    f.render_widget(paragraph, overlay);
}

fn render_fuzzy_overlay(f: &mut Frame, app: &App) {
    let overlay = centered_rect(60, 60, f.area());
    if overlay.width < 20 || overlay.height < 5 {
        return;
    }
    f.render_widget(Clear, overlay);

    let fuzzy = &app.state.fuzzy;
    let highlighted = fuzzy.cursor.unwrap_or(0);
    let visible = overlay.height.saturating_sub(2) as usize;
    let skip = highlighted.saturating_sub(visible.saturating_sub(1));
    let items: Vec<ListItem> = fuzzy
        .results
        .iter()
        .enumerate()
        .skip(skip)
        .take(visible)
        .map(|(i, feed)| {
            let style = if i == highlighted {
                app.style("feed_selected")
            } else {
                app.style("feed_normal")
            };
            ListItem::new(Line::from(Span::styled(feed.title.clone(), style)))
        })
        .collect();

    let title = format!(" Go to feed: {}_ ", fuzzy.query);
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(app.style("panel_border_focused"))
            .title(title),
    );
    f.render_widget(list, overlay);
}
