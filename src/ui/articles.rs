use crate::app::App;
use crate::model::ItemStatus;
use crate::sync::ScrollArea;
use crate::util::{strip_control_chars, truncate_to_width};
use chrono::{DateTime, Utc};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

/// Format timestamp as relative time
pub fn format_relative_time(date: Option<DateTime<Utc>>) -> String {
    let Some(date) = date else {
        return String::new();
    };
    let diff = (Utc::now() - date).num_seconds();

    // Future dates (malformed feeds)
    if diff < 0 {
        return "now".to_string();
    }
    if diff < 3600 {
        return format!("{}m", diff / 60);
    }
    if diff < 86400 {
        return format!("{}h", diff / 3600);
    }
    if diff < 604800 {
        return format!("{}d", diff / 86400);
    }
    date.format("%b %d").to_string()
}

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

/// Render the item list panel
pub fn render(f: &mut Frame, app: &mut App, area: Rect) {
    let visible = area.height.saturating_sub(2) as usize;
    app.items_scroll = ScrollArea::for_rows(
        app.state.items.len(),
        visible,
        app.items_scroll.scroll_top,
    );
    let first = app.items_scroll.first_row();
    let inner_width = area.width.saturating_sub(2) as usize;

    let items: Vec<ListItem> = if app.state.items.is_empty() {
        let msg = if app.state.loading.items {
            "Loading..."
        } else if app.state.current.is_none() {
            "Select a feed"
        } else {
            "No items"
        };
        vec![ListItem::new(msg)]
    } else {
        app.state
            .items
            .iter()
            .skip(first)
            .take(visible)
            .map(|item| {
                let time_str = format_relative_time(item.date);
                let mut spans = Vec::with_capacity(3);

                let star = if item.status == ItemStatus::Starred {
                    "★ "
                } else {
                    ""
                };
                if !star.is_empty() {
                    spans.push(Span::styled(star, app.style("item_star")));
                }

                let title_style = if app.state.selected_item == Some(item.id) {
                    app.style("item_selected")
                } else if item.status == ItemStatus::Read {
                    app.style("item_read")
                } else {
                    app.style("item_unread")
                };
                let title = if item.title.trim().is_empty() {
                    "untitled"
                } else {
                    item.title.as_str()
                };
                let room = inner_width.saturating_sub(time_str.len() + 2 + star.len());
                spans.push(Span::styled(
                    truncate_to_width(&strip_control_chars(title), room).into_owned(),
                    title_style,
                ));

                if !time_str.is_empty() {
                    spans.push(Span::styled(format!("  {}", time_str), app.style("item_date")));
                }
                ListItem::new(Line::from(spans))
            })
            .collect()
    };

    let mut title = match app.state.current_feed() {
        Some(feed) => format!(" {} ", feed.title),
        None => match app.state.current_folder() {
            Some(folder) => format!(" {} ", folder.title),
            None => " Items ".to_string(),
        },
    };
    if !app.state.search.is_empty() {
        title.push_str(&format!("[/{}] ", app.state.search));
    }
    if app.state.loading.items && !app.state.items.is_empty() {
        title.push_str(SPINNER[app.spinner_frame % SPINNER.len()]);
        title.push(' ');
    }

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(app.style("panel_border"))
            .title(title),
    );

    f.render_widget(list, area);
}
