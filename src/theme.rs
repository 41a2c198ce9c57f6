//! Theme system for the TUI.
//!
//! A theme is `{name, font, size}`. The name picks a `ColorPalette`; font and
//! size only affect the reading pane. `StyleMap` resolves role names to
//! concrete styles for the render functions.

use ratatui::style::{Color, Modifier, Style};
use std::collections::HashMap;

/// Reading size bounds; one step is 0.1.
pub const MIN_FONT_SIZE: f64 = 0.5;
pub const MAX_FONT_SIZE: f64 = 2.0;

// ============================================================================
// Theme Variant
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeVariant {
    Light,
    Sepia,
    Night,
}

impl ThemeVariant {
    /// Parse a variant name (case-insensitive).
    pub fn from_str_name(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "light" => Some(Self::Light),
            "sepia" => Some(Self::Sepia),
            "night" => Some(Self::Night),
            _ => None,
        }
    }

    pub fn palette(self) -> ColorPalette {
        match self {
            Self::Light => ColorPalette::light(),
            Self::Sepia => ColorPalette::sepia(),
            Self::Night => ColorPalette::night(),
        }
    }

    /// Light → Sepia → Night → Light.
    pub fn next(self) -> Self {
        match self {
            Self::Light => Self::Sepia,
            Self::Sepia => Self::Night,
            Self::Night => Self::Light,
        }
    }

    /// Stored preference value.
    pub fn name(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Sepia => "sepia",
            Self::Night => "night",
        }
    }
}

// ============================================================================
// Reading pane font & size
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReaderFont {
    #[default]
    Default,
    Serif,
    Monospace,
}

impl ReaderFont {
    pub fn from_str_name(s: &str) -> Self {
        match s {
            "serif" => Self::Serif,
            "monospace" => Self::Monospace,
            _ => Self::Default,
        }
    }

    /// Stored preference value; the default font is the empty string.
    pub fn name(self) -> &'static str {
        match self {
            Self::Default => "",
            Self::Serif => "serif",
            Self::Monospace => "monospace",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Default => Self::Serif,
            Self::Serif => Self::Monospace,
            Self::Monospace => Self::Default,
        }
    }

    /// Whether the reading pane keeps the source's line breaks and spacing.
    pub fn preserves_whitespace(self) -> bool {
        self == Self::Monospace
    }
}

/// `size` moved by `steps` tenths, rounded to one decimal and kept in bounds.
pub fn step_font_size(size: f64, steps: i32) -> f64 {
    let next = ((size + 0.1 * f64::from(steps)) * 10.0).round() / 10.0;
    next.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE)
}

/// Columns taken from each side of the reading pane for a size. Larger
/// sizes narrow the text column.
pub fn reader_margin(size: f64, width: u16) -> u16 {
    let extra = (size - 1.0).max(0.0);
    let margin = (f64::from(width) * extra / 4.0).round() as u16;
    margin.min(width.saturating_sub(20) / 2)
}

// ============================================================================
// Color Palette
// ============================================================================

/// Every semantic UI role mapped to a `Style`.
#[derive(Debug, Clone)]
pub struct ColorPalette {
    // -- Feed tree --
    pub feed_normal: Style,
    pub feed_selected: Style,
    pub feed_count: Style,
    pub feed_error: Style,
    pub folder: Style,

    // -- Item list --
    pub item_unread: Style,
    pub item_read: Style,
    pub item_selected: Style,
    pub item_date: Style,
    pub item_star: Style,

    // -- Reader --
    pub reader_heading: Style,
    pub reader_body: Style,
    pub reader_metadata: Style,
    pub reader_error: Style,

    // -- Chrome --
    pub status_bar: Style,
    pub panel_border: Style,
    pub panel_border_focused: Style,
    pub prompt: Style,
}

impl ColorPalette {
    fn light() -> Self {
        Self {
            feed_normal: Style::default().fg(Color::Black),
            feed_selected: Style::default().bg(Color::Blue).fg(Color::White),
            feed_count: Style::default().fg(Color::DarkGray),
            feed_error: Style::default().fg(Color::Red),
            folder: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),

            item_unread: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            item_read: Style::default().fg(Color::DarkGray),
            item_selected: Style::default().bg(Color::Blue).fg(Color::White),
            item_date: Style::default().fg(Color::DarkGray),
            item_star: Style::default().fg(Color::Magenta),

            reader_heading: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            reader_body: Style::default().fg(Color::Black),
            reader_metadata: Style::default().fg(Color::DarkGray),
            reader_error: Style::default().fg(Color::Red),

            status_bar: Style::default().bg(Color::White).fg(Color::Black),
            panel_border: Style::default().fg(Color::DarkGray),
            panel_border_focused: Style::default().fg(Color::Blue),
            prompt: Style::default().fg(Color::Blue),
        }
    }

    fn sepia() -> Self {
        let ink = Color::Rgb(91, 70, 54);
        let paper = Color::Rgb(244, 236, 216);
        Self {
            feed_normal: Style::default().fg(ink),
            feed_selected: Style::default().bg(Color::Rgb(112, 66, 20)).fg(paper),
            feed_count: Style::default().fg(Color::Rgb(150, 120, 90)),
            feed_error: Style::default().fg(Color::Rgb(170, 50, 30)),
            folder: Style::default().fg(ink).add_modifier(Modifier::BOLD),

            item_unread: Style::default().fg(ink).add_modifier(Modifier::BOLD),
            item_read: Style::default().fg(Color::Rgb(150, 120, 90)),
            item_selected: Style::default().bg(Color::Rgb(112, 66, 20)).fg(paper),
            item_date: Style::default().fg(Color::Rgb(150, 120, 90)),
            item_star: Style::default().fg(Color::Rgb(190, 110, 20)),

            reader_heading: Style::default()
                .fg(Color::Rgb(112, 66, 20))
                .add_modifier(Modifier::BOLD),
            reader_body: Style::default().fg(ink).bg(paper),
            reader_metadata: Style::default().fg(Color::Rgb(150, 120, 90)),
            reader_error: Style::default().fg(Color::Rgb(170, 50, 30)),

            status_bar: Style::default().bg(paper).fg(ink),
            panel_border: Style::default().fg(Color::Rgb(150, 120, 90)),
            panel_border_focused: Style::default().fg(Color::Rgb(112, 66, 20)),
            prompt: Style::default().fg(Color::Rgb(112, 66, 20)),
        }
    }

    fn night() -> Self {
        Self {
            feed_normal: Style::default(),
            feed_selected: Style::default().bg(Color::DarkGray).fg(Color::White),
            feed_count: Style::default().fg(Color::Gray),
            feed_error: Style::default().fg(Color::Red),
            folder: Style::default().add_modifier(Modifier::BOLD),

            item_unread: Style::default().add_modifier(Modifier::BOLD),
            item_read: Style::default().fg(Color::Gray),
            item_selected: Style::default().bg(Color::DarkGray).fg(Color::White),
            item_date: Style::default().fg(Color::DarkGray),
            item_star: Style::default().fg(Color::Yellow),

            reader_heading: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            reader_body: Style::default(),
            reader_metadata: Style::default().fg(Color::DarkGray),
            reader_error: Style::default().fg(Color::Red),

            status_bar: Style::default().bg(Color::DarkGray).fg(Color::White),
            panel_border: Style::default(),
            panel_border_focused: Style::default().fg(Color::Cyan),
            prompt: Style::default().fg(Color::Cyan),
        }
    }
}

// ============================================================================
// Style Map
// ============================================================================

/// String-keyed style lookup built from a `ColorPalette`.
#[derive(Debug, Clone)]
pub struct StyleMap {
    map: HashMap<&'static str, Style>,
}

const ROLE_NAMES: [&str; 18] = [
    "feed_normal",
    "feed_selected",
    "feed_count",
    "feed_error",
    "folder",
    "item_unread",
    "item_read",
    "item_selected",
    "item_date",
    "item_star",
    "reader_heading",
    "reader_body",
    "reader_metadata",
    "reader_error",
    "status_bar",
    "panel_border",
    "panel_border_focused",
    "prompt",
];

impl StyleMap {
    /// Build from a palette, applying the reading font to the body role.
    pub fn from_palette(p: &ColorPalette, font: ReaderFont) -> Self {
        let body = match font {
            ReaderFont::Serif => p.reader_body.add_modifier(Modifier::ITALIC),
            ReaderFont::Default | ReaderFont::Monospace => p.reader_body,
        };
        let styles: [Style; 18] = [
            p.feed_normal,
            p.feed_selected,
            p.feed_count,
            p.feed_error,
            p.folder,
            p.item_unread,
            p.item_read,
            p.item_selected,
            p.item_date,
            p.item_star,
            p.reader_heading,
            body,
            p.reader_metadata,
            p.reader_error,
            p.status_bar,
            p.panel_border,
            p.panel_border_focused,
            p.prompt,
        ];

        let map = ROLE_NAMES.iter().copied().zip(styles).collect();
        Self { map }
    }

    /// Unknown roles resolve to `Style::default()`.
    pub fn resolve(&self, role: &str) -> Style {
        self.map.get(role).copied().unwrap_or_default()
    }
}
