use crate::app::App;
use crate::model::{Selection, StatusFilter};
use crate::sync::ScrollArea;
use crate::util::truncate_to_width;
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

/// One rendered row of the tree.
struct TreeRow {
    selector: Selection,
    label: String,
    count: i64,
    is_folder: bool,
    has_error: bool,
}

/// Rows in the same order feed navigation walks them.
fn tree_rows(app: &App) -> Vec<TreeRow> {
    let state = &app.state;
    state
        .visible_selectors()
        .into_iter()
        .filter_map(|selector| match selector {
            Selection::Folder(id) => {
                let folder = state.folder(id)?;
                let marker = if folder.is_expanded { "▾" } else { "▸" };
                let count = match state.filter {
                    StatusFilter::All => state
                        .feeds
                        .iter()
                        .filter(|f| f.folder_id == Some(id))
                        .map(|f| state.stats_for(f.id).unread)
                        .sum(),
                    _ => state.filtered.folder(Some(id)),
                };
                Some(TreeRow {
                    selector,
                    label: format!("{} {}", marker, folder.title),
                    count,
                    is_folder: true,
                    has_error: false,
                })
            }
            Selection::Feed(id) => {
                let feed = state.feed(id)?;
                let indent = if feed.folder_id.and_then(|f| state.folder(f)).is_some() {
                    "  "
                } else {
                    ""
                };
                let count = match state.filter {
                    StatusFilter::All => state.stats_for(id).unread,
                    _ => state.filtered.feed(id),
                };
                Some(TreeRow {
                    selector,
                    label: format!("{}{}", indent, feed.title),
                    count,
                    is_folder: false,
                    has_error: state.feed_errors.contains_key(&id),
                })
            }
        })
        .collect()
}

/// Render the feed tree panel
pub fn render(f: &mut Frame, app: &mut App, area: Rect) {
    let rows = tree_rows(app);
    let visible = area.height.saturating_sub(2) as usize;
    app.feeds_scroll = ScrollArea::for_rows(rows.len(), visible, app.feeds_scroll.scroll_top);
    let first = app.feeds_scroll.first_row();
    let inner_width = area.width.saturating_sub(2) as usize;

    let items: Vec<ListItem> = if rows.is_empty() {
        vec![ListItem::new("No feeds")]
    } else {
        rows.iter()
            .skip(first)
            .take(visible)
            .map(|row| {
                let selected = app.state.current == Some(row.selector);
                let style = if selected {
                    app.style("feed_selected")
                } else if row.is_folder {
                    app.style("folder")
                } else {
                    app.style("feed_normal")
                };

                let count = if row.count > 0 {
                    format!(" {}", row.count)
                } else {
                    String::new()
                };
                let marker = if row.has_error { "! " } else { "" };
                let room = inner_width.saturating_sub(count.len() + marker.len());

                let mut spans = Vec::with_capacity(3);
                if row.has_error {
                    spans.push(Span::styled(marker, app.style("feed_error")));
                }
                spans.push(Span::styled(
                    truncate_to_width(&row.label, room).into_owned(),
                    style,
                ));
                if !count.is_empty() {
                    spans.push(Span::styled(count, app.style("feed_count")));
                }
                ListItem::new(Line::from(spans))
            })
            .collect()
    };

    let title = match (app.state.filter, app.state.filtered.total) {
        (StatusFilter::All, _) | (_, None) => " Feeds ".to_string(),
        (filter, Some(total)) => format!(" Feeds · {} {} ", total, filter.as_str()),
    };
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(app.style("panel_border"))
            .title(title),
    );

    f.render_widget(list, area);
}
