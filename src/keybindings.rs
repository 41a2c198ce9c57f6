//! Keybinding registry: maps key events to actions with config overrides.
use crossterm::event::{KeyCode, KeyModifiers};
use std::collections::HashMap;

// ============================================================================
// Action Enum
// ============================================================================

/// All user-facing actions that can be triggered by keybindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    // Reading
    OpenLink,
    ToggleReadability,
    ToggleRead,
    MarkAllRead,
    ToggleStar,
    FocusSearch,
    NextItem,
    PrevItem,
    NextFeed,
    PrevFeed,
    ScrollForward,
    ScrollBackward,
    ScrollTop,
    ScrollBottom,
    FilterUnread,
    FilterStarred,
    FilterAll,
    UnselectFeed,
    FuzzyFinder,

    // Application
    Quit,
    ShowHelp,
    Back,
    FetchAllFeeds,
    ToggleSort,
    CycleTag,

    // Subscriptions
    ToggleFolder,
    AddFeed,
    NewFolder,
    Rename,
    Delete,
    MoveFeed,
    EditTags,
    SetTagParent,
    FilterRule,
    ToggleFeedReadability,
    RefreshRate,

    // Appearance
    CycleTheme,
    CycleFont,
    FontLarger,
    FontSmaller,
    NarrowFeedList,
    WidenFeedList,
    NarrowItemList,
    WidenItemList,

    // Fuzzy finder
    FuzzyUp,
    FuzzyDown,
    FuzzyConfirm,
}

impl Action {
    /// Human-readable description for the help screen.
    pub fn describe(self) -> &'static str {
        match self {
            Self::OpenLink => "Open item link in browser",
            Self::ToggleReadability => "Toggle full-text extraction",
            Self::ToggleRead => "Toggle read",
            Self::MarkAllRead => "Mark all read (unread filter)",
            Self::ToggleStar => "Toggle starred",
            Self::FocusSearch => "Search items",
            Self::NextItem => "Next item",
            Self::PrevItem => "Previous item",
            Self::NextFeed => "Next feed",
            Self::PrevFeed => "Previous feed",
            Self::ScrollForward => "Scroll content forward",
            Self::ScrollBackward => "Scroll content backward",
            Self::ScrollTop => "Scroll content to top",
            Self::ScrollBottom => "Scroll content to bottom",
            Self::FilterUnread => "Show unread",
            Self::FilterStarred => "Show starred",
            Self::FilterAll => "Show all",
            Self::UnselectFeed => "Unselect feed",
            Self::FuzzyFinder => "Find feed by name",
            Self::Quit => "Quit application",
            Self::ShowHelp => "Show help",
            Self::Back => "Dismiss / clear search",
            Self::FetchAllFeeds => "Fetch all feeds now",
            Self::ToggleSort => "Toggle newest/oldest first",
            Self::CycleTag => "Cycle tag filter",
            Self::ToggleFolder => "Expand / collapse folder",
            Self::AddFeed => "Add feed",
            Self::NewFolder => "New folder",
            Self::Rename => "Rename feed or folder",
            Self::Delete => "Delete feed or folder",
            Self::MoveFeed => "Move feed to folder",
            Self::EditTags => "Edit feed tags",
            Self::SetTagParent => "Set parent of selected tag",
            Self::FilterRule => "Edit feed filter rule",
            Self::ToggleFeedReadability => "Toggle auto full-text for feed",
            Self::RefreshRate => "Set server refresh rate",
            Self::CycleTheme => "Cycle theme",
            Self::CycleFont => "Cycle reading font",
            Self::FontLarger => "Larger reading size",
            Self::FontSmaller => "Smaller reading size",
            Self::NarrowFeedList => "Narrow feed list",
            Self::WidenFeedList => "Widen feed list",
            Self::NarrowItemList => "Narrow item list",
            Self::WidenItemList => "Widen item list",
            Self::FuzzyUp => "Move selection up",
            Self::FuzzyDown => "Move selection down",
            Self::FuzzyConfirm => "Open highlighted feed",
        }
    }
}

// ============================================================================
// Context Enum
// ============================================================================

/// Dispatch context; determines which bindings are active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Context {
    Global,
    Fuzzy,
    Help,
}

// ============================================================================
// Key Specification
// ============================================================================

/// A key event: code + modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeySpec {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeySpec {
    pub const fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    pub const fn plain(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }

    pub const fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    /// Terminals report shifted characters with SHIFT set; character keys
    /// are matched on the character alone.
    fn normalized(self) -> Self {
        match self.code {
            KeyCode::Char(_) => Self::new(self.code, self.modifiers.difference(KeyModifiers::SHIFT)),
            _ => self,
        }
    }
}

/// Parse a key string from config into a KeySpec.
///
/// Accepts a single character (`"q"`, `"#"`), a named key (`"Enter"`,
/// `"Esc"`, `"Up"`, `"Space"`, ...), `"Ctrl+<char>"`, or `"F1"`..`"F12"`.
fn parse_key_string(s: &str) -> Option<KeySpec> {
    let s = s.trim();

    if let Some(rest) = s.strip_prefix("Ctrl+") {
        let mut chars = rest.trim().chars();
        return match (chars.next(), chars.next()) {
            (Some(c), None) => Some(KeySpec::ctrl(c)),
            _ => None,
        };
    }

    let named = match s.to_lowercase().as_str() {
        "enter" | "return" => Some(KeyCode::Enter),
        "esc" | "escape" => Some(KeyCode::Esc),
        "tab" => Some(KeyCode::Tab),
        "up" => Some(KeyCode::Up),
        "down" => Some(KeyCode::Down),
        "left" => Some(KeyCode::Left),
        "right" => Some(KeyCode::Right),
        "backspace" => Some(KeyCode::Backspace),
        "pageup" => Some(KeyCode::PageUp),
        "pagedown" => Some(KeyCode::PageDown),
        "space" => Some(KeyCode::Char(' ')),
        _ => None,
    };
    if let Some(code) = named {
        return Some(KeySpec::plain(code));
    }

    if let Some(n) = s.strip_prefix(['F', 'f']).and_then(|n| n.parse::<u8>().ok()) {
        return (1..=12).contains(&n).then(|| KeySpec::plain(KeyCode::F(n)));
    }

    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(KeySpec::plain(KeyCode::Char(c))),
        _ => None,
    }
}

/// Format a KeySpec for the help screen.
fn format_key(key: &KeySpec) -> String {
    let modifier = if key.modifiers.contains(KeyModifiers::CONTROL) {
        "Ctrl+"
    } else {
        ""
    };

    let key_name = match key.code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::Up => "Up".to_string(),
        KeyCode::Down => "Down".to_string(),
        KeyCode::Left => "Left".to_string(),
        KeyCode::Right => "Right".to_string(),
        KeyCode::PageUp => "PageUp".to_string(),
        KeyCode::PageDown => "PageDown".to_string(),
        KeyCode::Backspace => "Backspace".to_string(),
        KeyCode::F(n) => format!("F{}", n),
        _ => "?".to_string(),
    };

    format!("{}{}", modifier, key_name)
}

// ============================================================================
// Keybinding Registry
// ============================================================================

/// Registry of keybindings with context-aware dispatch.
///
/// The same key can map to different actions in different contexts; lookups
/// fall back to `Global` when the context has no binding of its own.
pub struct KeybindingRegistry {
    lookup: HashMap<(Context, KeySpec), Action>,
    /// Registration order, for the help screen.
    bindings: Vec<(Context, KeySpec, Action)>,
}

impl KeybindingRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            lookup: HashMap::new(),
            bindings: Vec::new(),
        };
        registry.register_defaults();
        registry
    }

    fn bind(&mut self, context: Context, key: KeySpec, action: Action) {
        self.lookup.insert((context, key), action);
        self.bindings.push((context, key, action));
    }

    fn bind_char(&mut self, c: char, action: Action) {
        self.bind(Context::Global, KeySpec::plain(KeyCode::Char(c)), action);
    }

    fn register_defaults(&mut self) {
        // === Reading ===
        self.bind_char('o', Action::OpenLink);
        self.bind_char('i', Action::ToggleReadability);
        self.bind_char('r', Action::ToggleRead);
        self.bind_char('R', Action::MarkAllRead);
        self.bind_char('s', Action::ToggleStar);
        self.bind_char('/', Action::FocusSearch);
        self.bind_char('j', Action::NextItem);
        self.bind(Context::Global, KeySpec::plain(KeyCode::Down), Action::NextItem);
        self.bind_char('k', Action::PrevItem);
        self.bind(Context::Global, KeySpec::plain(KeyCode::Up), Action::PrevItem);
        self.bind_char('l', Action::NextFeed);
        self.bind_char('h', Action::PrevFeed);
        self.bind_char('f', Action::ScrollForward);
        self.bind(
            Context::Global,
            KeySpec::plain(KeyCode::PageDown),
            Action::ScrollForward,
        );
        self.bind_char('b', Action::ScrollBackward);
        self.bind(
            Context::Global,
            KeySpec::plain(KeyCode::PageUp),
            Action::ScrollBackward,
        );
        self.bind_char('g', Action::ScrollTop);
        self.bind_char('G', Action::ScrollBottom);
        self.bind_char('1', Action::FilterUnread);
        self.bind_char('2', Action::FilterStarred);
        self.bind_char('3', Action::FilterAll);
        self.bind_char('0', Action::UnselectFeed);
        self.bind_char('p', Action::FuzzyFinder);

        // === Application ===
        self.bind_char('q', Action::Quit);
        self.bind_char('?', Action::ShowHelp);
        self.bind(Context::Global, KeySpec::plain(KeyCode::Esc), Action::Back);
        self.bind_char('U', Action::FetchAllFeeds);
        self.bind_char('S', Action::ToggleSort);
        self.bind_char('T', Action::CycleTag);

        // === Subscriptions ===
        self.bind_char('z', Action::ToggleFolder);
        self.bind_char('a', Action::AddFeed);
        self.bind_char('A', Action::NewFolder);
        self.bind_char('n', Action::Rename);
        self.bind_char('D', Action::Delete);
        self.bind_char('m', Action::MoveFeed);
        self.bind_char('#', Action::EditTags);
        self.bind_char('P', Action::SetTagParent);
        self.bind_char('F', Action::FilterRule);
        self.bind_char('I', Action::ToggleFeedReadability);
        self.bind_char('e', Action::RefreshRate);

        // === Appearance ===
        self.bind_char('t', Action::CycleTheme);
        self.bind_char('c', Action::CycleFont);
        self.bind_char('+', Action::FontLarger);
        self.bind_char('-', Action::FontSmaller);
        self.bind_char('<', Action::NarrowFeedList);
        self.bind_char('>', Action::WidenFeedList);
        self.bind_char('{', Action::NarrowItemList);
        self.bind_char('}', Action::WidenItemList);

        // === Fuzzy finder ===
        self.bind(Context::Fuzzy, KeySpec::plain(KeyCode::Up), Action::FuzzyUp);
        self.bind(
            Context::Fuzzy,
            KeySpec::plain(KeyCode::Down),
            Action::FuzzyDown,
        );
        self.bind(
            Context::Fuzzy,
            KeySpec::plain(KeyCode::Enter),
            Action::FuzzyConfirm,
        );
        self.bind(Context::Fuzzy, KeySpec::plain(KeyCode::Esc), Action::Back);

        // === Help ===
        self.bind(Context::Help, KeySpec::plain(KeyCode::Esc), Action::Back);
        self.bind(
            Context::Help,
            KeySpec::plain(KeyCode::Char('?')),
            Action::Back,
        );
    }

    /// Apply user overrides from the `[keybindings]` config table.
    ///
    /// Keys are action names (`"toggle_star"`), values key strings (`"x"`,
    /// `"Ctrl+d"`). An override replaces every default key of that action in
    /// each context it was bound in. Returns warnings for unknown actions or
    /// unparseable keys.
    pub fn apply_overrides(&mut self, overrides: &HashMap<String, String>) -> Vec<String> {
        let mut warnings = Vec::new();

        for (action_name, key_str) in overrides {
            let Some(action) = parse_action_name(action_name) else {
                warnings.push(format!("Unknown action '{}', ignoring", action_name));
                continue;
            };
            let Some(key) = parse_key_string(key_str) else {
                warnings.push(format!(
                    "Cannot parse key '{}' for action '{}', ignoring",
                    key_str, action_name
                ));
                continue;
            };

            let mut contexts: Vec<Context> = Vec::new();
            for (ctx, _, a) in &self.bindings {
                if *a == action && !contexts.contains(ctx) {
                    contexts.push(*ctx);
                }
            }

            self.lookup.retain(|_, a| *a != action);
            self.bindings.retain(|(_, _, a)| *a != action);
            for ctx in contexts {
                self.bind(ctx, key, action);
            }

            tracing::info!(
                action = %action_name,
                key = %key_str,
                "Applied keybinding override"
            );
        }

        warnings
    }

    /// Look up the action for a key, trying `context` first and then `Global`.
    pub fn action_for_key(
        &self,
        code: KeyCode,
        modifiers: KeyModifiers,
        context: Context,
    ) -> Option<Action> {
        let key = KeySpec::new(code, modifiers).normalized();

        if let Some(&action) = self.lookup.get(&(context, key)) {
            return Some(action);
        }
        if context != Context::Global {
            if let Some(&action) = self.lookup.get(&(Context::Global, key)) {
                return Some(action);
            }
        }
        None
    }

    /// (context, key display string, action, description) for the help screen.
    pub fn all_bindings(&self) -> Vec<(Context, String, Action, &'static str)> {
        self.bindings
            .iter()
            .map(|(ctx, key, action)| (*ctx, format_key(key), *action, action.describe()))
            .collect()
    }
}

impl Default for KeybindingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse an action name from config.
fn parse_action_name(name: &str) -> Option<Action> {
    let action = match name.to_lowercase().replace('-', "_").as_str() {
        "open_link" | "open" => Action::OpenLink,
        "toggle_readability" | "readability" => Action::ToggleReadability,
        "toggle_read" | "read" => Action::ToggleRead,
        "mark_all_read" => Action::MarkAllRead,
        "toggle_star" | "star" => Action::ToggleStar,
        "focus_search" | "search" => Action::FocusSearch,
        "next_item" => Action::NextItem,
        "prev_item" => Action::PrevItem,
        "next_feed" => Action::NextFeed,
        "prev_feed" => Action::PrevFeed,
        "scroll_forward" => Action::ScrollForward,
        "scroll_backward" => Action::ScrollBackward,
        "scroll_top" => Action::ScrollTop,
        "scroll_bottom" => Action::ScrollBottom,
        "filter_unread" => Action::FilterUnread,
        "filter_starred" => Action::FilterStarred,
        "filter_all" => Action::FilterAll,
        "unselect_feed" => Action::UnselectFeed,
        "fuzzy_finder" | "fuzzy" => Action::FuzzyFinder,
        "quit" => Action::Quit,
        "show_help" | "help" => Action::ShowHelp,
        "back" => Action::Back,
        "fetch_all_feeds" | "refresh" => Action::FetchAllFeeds,
        "toggle_sort" | "sort" => Action::ToggleSort,
        "cycle_tag" | "tag" => Action::CycleTag,
        "toggle_folder" => Action::ToggleFolder,
        "add_feed" | "subscribe" => Action::AddFeed,
        "new_folder" => Action::NewFolder,
        "rename" => Action::Rename,
        "delete" => Action::Delete,
        "move_feed" | "move" => Action::MoveFeed,
        "edit_tags" | "tags" => Action::EditTags,
        "set_tag_parent" => Action::SetTagParent,
        "filter_rule" => Action::FilterRule,
        "toggle_feed_readability" => Action::ToggleFeedReadability,
        "refresh_rate" => Action::RefreshRate,
        "cycle_theme" | "theme" => Action::CycleTheme,
        "cycle_font" | "font" => Action::CycleFont,
        "font_larger" => Action::FontLarger,
        "font_smaller" => Action::FontSmaller,
        "narrow_feed_list" => Action::NarrowFeedList,
        "widen_feed_list" => Action::WidenFeedList,
        "narrow_item_list" => Action::NarrowItemList,
        "widen_item_list" => Action::WidenItemList,
        _ => return None,
    };
    Some(action)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn global(reg: &KeybindingRegistry, c: char) -> Option<Action> {
        reg.action_for_key(KeyCode::Char(c), KeyModifiers::NONE, Context::Global)
    }

    #[test]
    fn test_reading_keys() {
        let reg = KeybindingRegistry::new();
        assert_eq!(global(&reg, 'o'), Some(Action::OpenLink));
        assert_eq!(global(&reg, 'i'), Some(Action::ToggleReadability));
        assert_eq!(global(&reg, 'r'), Some(Action::ToggleRead));
        assert_eq!(global(&reg, 'R'), Some(Action::MarkAllRead));
        assert_eq!(global(&reg, 's'), Some(Action::ToggleStar));
        assert_eq!(global(&reg, 'j'), Some(Action::NextItem));
        assert_eq!(global(&reg, 'k'), Some(Action::PrevItem));
        assert_eq!(global(&reg, 'l'), Some(Action::NextFeed));
        assert_eq!(global(&reg, 'h'), Some(Action::PrevFeed));
        assert_eq!(global(&reg, 'f'), Some(Action::ScrollForward));
        assert_eq!(global(&reg, 'b'), Some(Action::ScrollBackward));
        assert_eq!(global(&reg, 'g'), Some(Action::ScrollTop));
        assert_eq!(global(&reg, 'G'), Some(Action::ScrollBottom));
        assert_eq!(global(&reg, '1'), Some(Action::FilterUnread));
        assert_eq!(global(&reg, '2'), Some(Action::FilterStarred));
        assert_eq!(global(&reg, '3'), Some(Action::FilterAll));
        assert_eq!(global(&reg, '0'), Some(Action::UnselectFeed));
        assert_eq!(global(&reg, 'p'), Some(Action::FuzzyFinder));
    }

    #[test]
    fn test_shifted_chars_match() {
        let reg = KeybindingRegistry::new();
        assert_eq!(
            reg.action_for_key(KeyCode::Char('G'), KeyModifiers::SHIFT, Context::Global),
            Some(Action::ScrollBottom)
        );
        assert_eq!(
            reg.action_for_key(KeyCode::Char('#'), KeyModifiers::SHIFT, Context::Global),
            Some(Action::EditTags)
        );
    }

    #[test]
    fn test_fuzzy_context_overrides_global() {
        let reg = KeybindingRegistry::new();
        assert_eq!(
            reg.action_for_key(KeyCode::Down, KeyModifiers::NONE, Context::Fuzzy),
            Some(Action::FuzzyDown)
        );
        assert_eq!(
            reg.action_for_key(KeyCode::Enter, KeyModifiers::NONE, Context::Fuzzy),
            Some(Action::FuzzyConfirm)
        );
        // falls back to global
        assert_eq!(
            reg.action_for_key(KeyCode::Char('q'), KeyModifiers::NONE, Context::Fuzzy),
            Some(Action::Quit)
        );
    }

    #[test]
    fn test_help_context() {
        let reg = KeybindingRegistry::new();
        assert_eq!(
            reg.action_for_key(KeyCode::Char('?'), KeyModifiers::NONE, Context::Help),
            Some(Action::Back)
        );
    }

    #[test]
    fn test_unknown_key_returns_none() {
        let reg = KeybindingRegistry::new();
        assert_eq!(
            reg.action_for_key(KeyCode::F(12), KeyModifiers::NONE, Context::Global),
            None
        );
    }

    #[test]
    fn test_apply_overrides_valid() {
        let mut reg = KeybindingRegistry::new();
        let mut overrides = HashMap::new();
        overrides.insert("toggle_star".to_string(), "x".to_string());

        assert!(reg.apply_overrides(&overrides).is_empty());
        assert_eq!(global(&reg, 's'), None);
        assert_eq!(global(&reg, 'x'), Some(Action::ToggleStar));
    }

    #[test]
    fn test_apply_overrides_replaces_all_keys_of_action() {
        let mut reg = KeybindingRegistry::new();
        let mut overrides = HashMap::new();
        overrides.insert("next-item".to_string(), "Ctrl+n".to_string());

        assert!(reg.apply_overrides(&overrides).is_empty());
        assert_eq!(global(&reg, 'j'), None);
        assert_eq!(
            reg.action_for_key(KeyCode::Down, KeyModifiers::NONE, Context::Global),
            None
        );
        assert_eq!(
            reg.action_for_key(KeyCode::Char('n'), KeyModifiers::CONTROL, Context::Global),
            Some(Action::NextItem)
        );
    }

    #[test]
    fn test_apply_overrides_warnings() {
        let mut reg = KeybindingRegistry::new();
        let mut overrides = HashMap::new();
        overrides.insert("nonexistent_action".to_string(), "q".to_string());
        overrides.insert("quit".to_string(), "Ctrl+Alt+Q".to_string());

        let mut warnings = reg.apply_overrides(&overrides);
        warnings.sort();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("Cannot parse key"));
        assert!(warnings[1].contains("Unknown action"));
    }

    #[test]
    fn test_parse_key_string() {
        assert_eq!(parse_key_string("Enter"), Some(KeySpec::plain(KeyCode::Enter)));
        assert_eq!(parse_key_string("esc"), Some(KeySpec::plain(KeyCode::Esc)));
        assert_eq!(
            parse_key_string("space"),
            Some(KeySpec::plain(KeyCode::Char(' ')))
        );
        assert_eq!(parse_key_string("F5"), Some(KeySpec::plain(KeyCode::F(5))));
        assert_eq!(parse_key_string("F13"), None);
        assert_eq!(parse_key_string("Ctrl+d"), Some(KeySpec::ctrl('d')));
        assert_eq!(parse_key_string("#"), Some(KeySpec::plain(KeyCode::Char('#'))));
        assert_eq!(parse_key_string("F"), Some(KeySpec::plain(KeyCode::Char('F'))));
        assert_eq!(parse_key_string("xy"), None);
    }

    #[test]
    fn test_format_key_display() {
        assert_eq!(format_key(&KeySpec::plain(KeyCode::Char('q'))), "q");
        assert_eq!(format_key(&KeySpec::ctrl('d')), "Ctrl+d");
        assert_eq!(format_key(&KeySpec::plain(KeyCode::Char(' '))), "Space");
        assert_eq!(format_key(&KeySpec::plain(KeyCode::F(5))), "F5");
    }

    #[test]
    fn test_every_action_has_a_default_binding() {
        let reg = KeybindingRegistry::new();
        let bound: std::collections::HashSet<Action> =
            reg.all_bindings().into_iter().map(|(_, _, a, _)| a).collect();
        assert!(bound.contains(&Action::WidenItemList));
        assert!(bound.contains(&Action::FuzzyConfirm));
        assert!(reg.all_bindings().len() >= 50);
    }
}
