use crate::app::App;
use crate::sync::ScrollArea;
use crate::theme;
use crate::ui::articles::format_relative_time;
use crate::util::{display_width, html_to_paragraphs, strip_control_chars};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthChar;

/// Render the reading pane
pub fn render(f: &mut Frame, app: &mut App, area: Rect) {
    // Layout may produce zero-sized rects during extreme terminal resizes
    if area.width < 3 || area.height < 3 {
        return;
    }
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.style("panel_border"));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let margin = theme::reader_margin(app.font_size, inner.width);
    let text_area = Rect {
        x: inner.x + margin,
        width: inner.width.saturating_sub(margin * 2),
        ..inner
    };
    let width = text_area.width as usize;
    let lines = build_lines(app, width);

    let visible = text_area.height as usize;
    app.content_scroll =
        ScrollArea::for_rows(lines.len(), visible, app.content_scroll.scroll_top);
    let first = app.content_scroll.first_row();

    let shown: Vec<Line> = lines.into_iter().skip(first).take(visible).collect();
    f.render_widget(Paragraph::new(shown).style(app.style("reader_body")), text_area);
}

/// Header plus wrapped body for the selected item.
fn build_lines(app: &App, width: usize) -> Vec<Line<'static>> {
    let state = &app.state;
    if state.selected_item.is_none() {
        return vec![Line::from(Span::styled(
            "No item selected",
            app.style("reader_metadata"),
        ))];
    }
    let Some(detail) = state
        .item_detail
        .as_ref()
        .filter(|d| Some(d.id) == state.selected_item)
    else {
        return vec![Line::from(Span::styled(
            "Loading...",
            app.style("reader_metadata"),
        ))];
    };

    let mut lines = Vec::new();
    let title = strip_control_chars(&detail.title);
    for row in wrap(&title, width) {
        lines.push(Line::from(Span::styled(row, app.style("reader_heading"))));
    }

    let mut meta = Vec::new();
    if let Some(feed) = state.feed(detail.feed_id) {
        meta.push(feed.title.clone());
    }
    if let Some(author) = detail.author.as_deref().filter(|a| !a.is_empty()) {
        meta.push(author.to_string());
    }
    let when = format_relative_time(detail.date);
    if !when.is_empty() {
        meta.push(when);
    }
    if state.readability.is_some() {
        meta.push("full text".to_string());
    }
    for row in wrap(&meta.join(" · "), width) {
        lines.push(Line::from(Span::styled(row, app.style("reader_metadata"))));
    }
    lines.push(Line::from(""));

    if state.loading.readability {
        lines.push(Line::from(Span::styled(
            "Extracting full text...",
            app.style("reader_metadata"),
        )));
        lines.push(Line::from(""));
    }

    let preserve = app.reader_font.preserves_whitespace();
    for paragraph in html_to_paragraphs(state.item_selected_content(), preserve) {
        for row in paragraph.split('\n').flat_map(|l| wrap(l, width)) {
            lines.push(Line::from(row));
        }
        lines.push(Line::from(""));
    }
    lines
}

/// Greedy word wrap by display width. Words wider than the line are split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return Vec::new();
    }
    let mut rows = Vec::new();
    let mut row = String::new();
    let mut row_width = 0;
    // Words placed on the current row; leading spaces are empty words.
    let mut words = 0;

    for word in text.split(' ') {
        let word_width = display_width(word);
        let sep = usize::from(words > 0);
        if row_width + sep + word_width <= width {
            if sep == 1 {
                row.push(' ');
            }
            row.push_str(word);
            row_width += sep + word_width;
            words += 1;
            continue;
        }
        if words > 0 {
            rows.push(std::mem::take(&mut row));
            row_width = 0;
        }
        for c in word.chars() {
            let w = c.width().unwrap_or(0);
            if row_width + w > width && !row.is_empty() {
                rows.push(std::mem::take(&mut row));
                row_width = 0;
            }
            row.push(c);
            row_width += w;
        }
        words = 1;
    }
    if !row.is_empty() || rows.is_empty() {
        rows.push(row);
    }
    rows
}
