//! Keybinding registry: maps key events to actions, with config overrides.
use crossterm::event::{KeyCode, KeyModifiers};
use std::collections::HashMap;

// ============================================================================
// Action Enum
// ============================================================================

/// All user-facing actions that can be triggered by keybindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Quit,
    NavDown,
    NavUp,
    PageDown,
    PageUp,
    Open,
    Back,
    SwipeLeft,
    SwipeRight,
    Undo,
    ToggleShowRead,
    ToggleSortOrder,
    Refresh,
    MarkAllRead,
    OpenInBrowser,
    ToggleBookmark,
    ShowNews,
    ShowBookmarks,
    ShowFeeds,
    CycleTheme,
    Search,
}

impl Action {
    /// Human-readable description for the footer hints.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Quit => "Quit",
            Self::NavDown => "Down",
            Self::NavUp => "Up",
            Self::PageDown => "Page down",
            Self::PageUp => "Page up",
            Self::Open => "Open",
            Self::Back => "Back",
            Self::SwipeLeft => "Swipe left",
            Self::SwipeRight => "Swipe right",
            Self::Undo => "Undo",
            Self::ToggleShowRead => "Show/hide read",
            Self::ToggleSortOrder => "Sort order",
            Self::Refresh => "Refresh / retry",
            Self::MarkAllRead => "Mark all read",
            Self::OpenInBrowser => "Open in browser",
            Self::ToggleBookmark => "Bookmark",
            Self::ShowNews => "News",
            Self::ShowBookmarks => "Bookmarks",
            Self::ShowFeeds => "Feeds",
            Self::CycleTheme => "Theme",
            Self::Search => "Search",
        }
    }
}

// ============================================================================
// Context Enum
// ============================================================================

/// Dispatch context: determines which bindings are active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Context {
    Global,
    EntryList,
    FeedList,
    SearchResults,
    Detail,
    Dialog,
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

    pub const fn ch(c: char) -> Self {
        Self::plain(KeyCode::Char(c))
    }

    pub const fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }
}

/// Parse a key string from config into a KeySpec.
///
/// Supported formats:
/// - Single char: "q", "j", "/"
/// - Named keys: "Enter", "Esc", "Tab", "Up", "Down", "PageUp", "Home", ...
/// - Ctrl combos: "Ctrl+d"
/// - Function keys: "F1" through "F12"
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
        "pageup" => Some(KeyCode::PageUp),
        "pagedown" => Some(KeyCode::PageDown),
        "home" => Some(KeyCode::Home),
        "end" => Some(KeyCode::End),
        "backspace" => Some(KeyCode::Backspace),
        "space" => Some(KeyCode::Char(' ')),
        _ => None,
    };
    if let Some(code) = named {
        return Some(KeySpec::plain(code));
    }

    if let Some(n) = s
        .strip_prefix(['F', 'f'])
        .and_then(|n| n.parse::<u8>().ok())
    {
        return (1..=12).contains(&n).then(|| KeySpec::plain(KeyCode::F(n)));
    }

    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(KeySpec::ch(c)),
        _ => None,
    }
}

/// Format a KeySpec for footer hints.
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
        KeyCode::Up => "↑".to_string(),
        KeyCode::Down => "↓".to_string(),
        KeyCode::Left => "←".to_string(),
        KeyCode::Right => "→".to_string(),
        KeyCode::PageUp => "PgUp".to_string(),
        KeyCode::PageDown => "PgDn".to_string(),
        KeyCode::Home => "Home".to_string(),
        KeyCode::End => "End".to_string(),
        KeyCode::Backspace => "Backspace".to_string(),
        KeyCode::F(n) => format!("F{}", n),
        _ => "?".to_string(),
    };

    format!("{}{}", modifier, key_name)
}

// ============================================================================
// Keybinding Registry
// ============================================================================

/// Registry of keybindings, supporting default bindings and config overrides.
///
/// The same key can map to different actions in different contexts; lookups
/// fall back to [`Context::Global`].
pub struct KeybindingRegistry {
    lookup: HashMap<(Context, KeySpec), Action>,
    /// Registration order, for hints
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

    fn bind_all(&mut self, context: Context, keys: &[KeySpec], action: Action) {
        for key in keys {
            self.bind(context, *key, action);
        }
    }

    fn register_defaults(&mut self) {
        use Context::*;

        // === Global ===
        self.bind(Global, KeySpec::ch('q'), Action::Quit);
        self.bind_all(
            Global,
            &[KeySpec::ch('j'), KeySpec::plain(KeyCode::Down)],
            Action::NavDown,
        );
        self.bind_all(
            Global,
            &[KeySpec::ch('k'), KeySpec::plain(KeyCode::Up)],
            Action::NavUp,
        );
        self.bind_all(
            Global,
            &[KeySpec::ctrl('d'), KeySpec::plain(KeyCode::PageDown)],
            Action::PageDown,
        );
        self.bind_all(
            Global,
            &[KeySpec::ctrl('u'), KeySpec::plain(KeyCode::PageUp)],
            Action::PageUp,
        );
        self.bind(Global, KeySpec::plain(KeyCode::Esc), Action::Back);
        self.bind(Global, KeySpec::ch('1'), Action::ShowNews);
        self.bind(Global, KeySpec::ch('2'), Action::ShowBookmarks);
        self.bind(Global, KeySpec::ch('3'), Action::ShowFeeds);
        self.bind(Global, KeySpec::ch('T'), Action::CycleTheme);

        // === Entry list ===
        self.bind(EntryList, KeySpec::plain(KeyCode::Enter), Action::Open);
        self.bind_all(
            EntryList,
            &[KeySpec::ch('h'), KeySpec::plain(KeyCode::Left)],
            Action::SwipeLeft,
        );
        self.bind_all(
            EntryList,
            &[KeySpec::ch('l'), KeySpec::plain(KeyCode::Right)],
            Action::SwipeRight,
        );
        self.bind(EntryList, KeySpec::ch('u'), Action::Undo);
        self.bind(EntryList, KeySpec::ch('v'), Action::ToggleShowRead);
        self.bind(EntryList, KeySpec::ch('s'), Action::ToggleSortOrder);
        self.bind(EntryList, KeySpec::ch('r'), Action::Refresh);
        self.bind(EntryList, KeySpec::ch('A'), Action::MarkAllRead);
        self.bind(EntryList, KeySpec::ch('/'), Action::Search);

        // === Feed list ===
        self.bind(FeedList, KeySpec::plain(KeyCode::Enter), Action::Open);

        // === Search results (typing a query bypasses the registry) ===
        self.bind(SearchResults, KeySpec::plain(KeyCode::Enter), Action::Open);
        self.bind(SearchResults, KeySpec::ch('/'), Action::Search);

        // === Detail ===
        self.bind(Detail, KeySpec::ch('b'), Action::Back);
        self.bind(Detail, KeySpec::ch('o'), Action::OpenInBrowser);
        self.bind(Detail, KeySpec::ch('s'), Action::ToggleBookmark);

        // === Error dialog ===
        self.bind_all(
            Dialog,
            &[KeySpec::plain(KeyCode::Enter), KeySpec::plain(KeyCode::Esc)],
            Action::Back,
        );
    }

    /// Apply user overrides from config keybindings map.
    ///
    /// Keys in the map are action names (e.g., "quit", "swipe_left").
    /// Values are key strings (e.g., "q", "Ctrl+d", "F5"). An override
    /// replaces every default key of the action, in each context where the
    /// action was bound.
    ///
    /// Returns a list of warnings for unrecognized action names or unparseable keys.
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

            let mut contexts: Vec<Context> = self
                .bindings
                .iter()
                .filter(|(_, _, a)| *a == action)
                .map(|(c, _, _)| *c)
                .collect();
            contexts.dedup();

            self.lookup.retain(|_, a| *a != action);
            self.bindings.retain(|(_, _, a)| *a != action);
            for ctx in contexts {
                self.bind(ctx, key, action);
            }

            tracing::info!(action = %action_name, key = %key_str, "Applied keybinding override");
        }

        warnings
    }

    /// Look up the action for a key, trying `context` first, then Global.
    ///
    /// The dialog context does not fall back: only its own keys work there.
    pub fn action_for_key(
        &self,
        code: KeyCode,
        modifiers: KeyModifiers,
        context: Context,
    ) -> Option<Action> {
        let key = KeySpec::new(code, modifiers);

        if let Some(&action) = self.lookup.get(&(context, key)) {
            return Some(action);
        }
        match context {
            Context::Global | Context::Dialog => None,
            _ => self.lookup.get(&(Context::Global, key)).copied(),
        }
    }

    /// First key bound to `action` in `context` (or Global), formatted.
    pub fn key_hint(&self, action: Action, context: Context) -> Option<String> {
        self.bindings
            .iter()
            .find(|(c, _, a)| *a == action && (*c == context || *c == Context::Global))
            .map(|(_, key, _)| format_key(key))
    }
}

impl Default for KeybindingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse an action name string (from config) into an Action.
fn parse_action_name(name: &str) -> Option<Action> {
    let action = match name.to_lowercase().replace('-', "_").as_str() {
        "quit" => Action::Quit,
        "nav_down" | "down" => Action::NavDown,
        "nav_up" | "up" => Action::NavUp,
        "page_down" => Action::PageDown,
        "page_up" => Action::PageUp,
        "open" | "select" | "enter" => Action::Open,
        "back" => Action::Back,
        "swipe_left" | "mark_read" => Action::SwipeLeft,
        "swipe_right" => Action::SwipeRight,
        "undo" => Action::Undo,
        "toggle_show_read" | "show_read" => Action::ToggleShowRead,
        "toggle_sort_order" | "sort" => Action::ToggleSortOrder,
        "refresh" | "retry" => Action::Refresh,
        "mark_all_read" => Action::MarkAllRead,
        "open_in_browser" | "browser" => Action::OpenInBrowser,
        "toggle_bookmark" | "bookmark" => Action::ToggleBookmark,
        "show_news" | "news" => Action::ShowNews,
        "show_bookmarks" | "bookmarks" => Action::ShowBookmarks,
        "show_feeds" | "feeds" => Action::ShowFeeds,
        "cycle_theme" | "theme" => Action::CycleTheme,
        "search" => Action::Search,
        _ => return None,
    };
    Some(action)
}

// ============================================================================
// Tests
// ============================================================================
