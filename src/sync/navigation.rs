//! Keyboard navigation over items and the feed tree, plus viewport scrolling.
//!
//! Geometry is expressed in scroll units; one list row is [`ROW_UNITS`] units
//! tall so the configured paddings and margins keep their proportions on a
//! character grid.
use crate::model::{Item, ItemId, Selection};

/// Height of one list row in scroll units.
pub const ROW_UNITS: i64 = 20;

/// Scroll state of one container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrollArea {
    pub scroll_top: i64,
    /// Visible height.
    pub height: i64,
    /// Total height of the content.
    pub content_height: i64,
}

impl ScrollArea {
    pub fn max_scroll(&self) -> i64 {
        (self.content_height - self.height).max(0)
    }

    pub fn clamp(&self, top: i64) -> i64 {
        top.clamp(0, self.max_scroll())
    }

    /// Size the area to `rows` list rows with `visible` of them on screen.
    pub fn for_rows(rows: usize, visible: usize, scroll_top: i64) -> Self {
        let area = Self {
            scroll_top: 0,
            height: visible as i64 * ROW_UNITS,
            content_height: rows as i64 * ROW_UNITS,
        };
        Self {
            scroll_top: area.clamp(scroll_top),
            ..area
        }
    }

    /// First list row shown at the top of the viewport.
    pub fn first_row(&self) -> usize {
        (self.scroll_top.max(0) / ROW_UNITS) as usize
    }
}

/// A row inside a scroll container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowBox {
    pub offset: i64,
    pub height: i64,
}

impl RowBox {
    pub fn for_index(index: usize) -> Self {
        Self {
            offset: index as i64 * ROW_UNITS,
            height: ROW_UNITS,
        }
    }
}

/// Minimal scroll that brings `row` within `padding` of both viewport edges.
///
/// Returns `None` when the row is already comfortably visible. Never centers:
/// the row's near edge is moved exactly to the padding boundary.
pub fn scroll_into_view(row: RowBox, area: ScrollArea, padding: i64) -> Option<i64> {
    let rel = row.offset - area.scroll_top;
    if padding <= rel && rel + row.height <= area.height - padding {
        return None;
    }
    let target = if rel < padding {
        row.offset - padding
    } else {
        row.offset - area.height + row.height + padding
    };
    Some(area.clamp(target))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Forward,
    Backward,
}

/// Page the reading pane by half its height less `margin`.
pub fn scroll_content(area: ScrollArea, direction: ScrollDirection, margin: i64) -> i64 {
    let step = (area.height / 2 - margin).max(0);
    let target = match direction {
        ScrollDirection::Forward => area.scroll_top + step,
        ScrollDirection::Backward => area.scroll_top - step,
    };
    area.clamp(target)
}

/// Next item selection, or `None` when nothing changes.
///
/// With no (or a stale) selection the first item is chosen; otherwise moving
/// past either end is a no-op.
pub fn navigate_item(items: &[Item], selected: Option<ItemId>, delta: i64) -> Option<ItemId> {
    let first = items.first()?.id;
    let Some(current) = selected else {
        return Some(first);
    };
    let Some(index) = items.iter().position(|i| i.id == current) else {
        return Some(first);
    };
    let next = index as i64 + delta;
    if next < 0 || next >= items.len() as i64 || next == index as i64 {
        return None;
    }
    Some(items[next as usize].id)
}

/// Next tree selection over the visible selectors, or `None` when nothing changes.
///
/// `Some(None)` unsets the view. That happens when the current selector is no
/// longer visible. With no view, moving forward enters the first selector.
pub fn navigate_feed(
    selectors: &[Selection],
    current: Option<Selection>,
    delta: i64,
) -> Option<Option<Selection>> {
    let Some(current) = current else {
        return if delta > 0 {
            selectors.first().map(|s| Some(*s))
        } else {
            None
        };
    };
    let Some(index) = selectors.iter().position(|s| *s == current) else {
        return Some(None);
    };
    let next = index as i64 + delta;
    if next < 0 || next >= selectors.len() as i64 || next == index as i64 {
        return None;
    }
    Some(Some(selectors[next as usize]))
}
