use crate::app::App;
use crate::model::StatusFilter;
use ratatui::{layout::Rect, widgets::Paragraph, Frame};
use std::borrow::Cow;

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

/// Render the status bar
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    let text: Cow<'_, str> = if let Some(prompt) = &app.prompt {
        Cow::Owned(format!("{}: {}_", prompt.kind.label(), prompt.input))
    } else if let Some((msg, _)) = &app.status_message {
        Cow::Borrowed(msg.as_ref())
    } else {
        Cow::Owned(summary(app))
    };

    let style = if app.prompt.is_some() {
        app.style("prompt")
    } else {
        app.style("status_bar")
    };
    f.render_widget(Paragraph::new(text).style(style), area);
}

/// Filter, sort and busy state when nothing else needs the line.
fn summary(app: &App) -> String {
    let state = &app.state;
    let mut parts: Vec<String> = Vec::new();
    if state.loading.feeds || state.loading.new_feed {
        let frame = SPINNER[app.spinner_frame % SPINNER.len()];
        let what = if state.loading.new_feed {
            "adding feed"
        } else {
            "fetching feeds"
        };
        parts.push(format!("{} {}", frame, what));
    }
    parts.push(
        match state.filter {
            StatusFilter::All => "all",
            StatusFilter::Unread => "unread",
            StatusFilter::Starred => "starred",
        }
        .to_string(),
    );
    if let Some(name) = state.tag_selected.and_then(|t| state.tags.names.get(&t)) {
        parts.push(format!("#{}", name));
    }
    parts.push(if state.sort_newest_first { "newest" } else { "oldest" }.to_string());
    if !state.feed_errors.is_empty() {
        parts.push(format!("{} feed errors", state.feed_errors.len()));
    }
    parts.push("? help".to_string());
    parts.join(" | ")
}
