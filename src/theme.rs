//! Theme system for the TUI.
//!
//! `ThemeVariant` selects between Dark and Light palettes; `ColorPalette`
//! maps each semantic UI role to a ratatui `Style`.

use ratatui::style::{Color, Modifier, Style};

// ============================================================================
// Theme Variant
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeVariant {
    Dark,
    Light,
}

impl ThemeVariant {
    /// Parse a variant name (case-insensitive).
    pub fn from_str_name(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            _ => None,
        }
    }

    pub fn palette(self) -> ColorPalette {
        match self {
            Self::Dark => ColorPalette::dark(),
            Self::Light => ColorPalette::light(),
        }
    }

    /// Dark → Light → Dark.
    pub fn next(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Dark => "Dark",
            Self::Light => "Light",
        }
    }
}

// ============================================================================
// Color Palette
// ============================================================================

/// Semantic roles of the newsdesk screens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorPalette {
    // -- Toolbar --
    pub toolbar_title: Style,
    pub toolbar_action: Style,
    pub toolbar_tab: Style,
    pub toolbar_tab_active: Style,
    pub refreshing: Style,

    // -- Entry list --
    pub entry_unread: Style,
    pub entry_read: Style,
    pub entry_selected: Style,
    pub entry_meta: Style,
    pub entry_bookmark: Style,

    // -- Panels --
    pub progress: Style,
    pub message: Style,
    pub retry: Style,

    // -- Detail --
    pub detail_heading: Style,
    pub detail_body: Style,
    pub detail_meta: Style,
    pub detail_link: Style,

    // -- Chrome --
    pub snackbar: Style,
    pub status_bar: Style,
    pub panel_border: Style,
    pub dialog_border: Style,
    pub dialog_text: Style,
}

impl ColorPalette {
    fn dark() -> Self {
        Self {
            toolbar_title: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            toolbar_action: Style::default().fg(Color::Gray),
            toolbar_tab: Style::default().fg(Color::DarkGray),
            toolbar_tab_active: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            refreshing: Style::default().fg(Color::Yellow),

            entry_unread: Style::default().add_modifier(Modifier::BOLD),
            entry_read: Style::default().fg(Color::Gray),
            entry_selected: Style::default().bg(Color::DarkGray).fg(Color::White),
            entry_meta: Style::default().fg(Color::DarkGray),
            entry_bookmark: Style::default().fg(Color::Yellow),

            progress: Style::default().fg(Color::Cyan),
            message: Style::default().fg(Color::Gray),
            retry: Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),

            detail_heading: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            detail_body: Style::default(),
            detail_meta: Style::default().fg(Color::DarkGray),
            detail_link: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::UNDERLINED),

            snackbar: Style::default().bg(Color::Gray).fg(Color::Black),
            status_bar: Style::default().bg(Color::DarkGray).fg(Color::White),
            panel_border: Style::default(),
            dialog_border: Style::default().fg(Color::Red),
            dialog_text: Style::default().fg(Color::White),
        }
    }

    fn light() -> Self {
        Self {
            toolbar_title: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            toolbar_action: Style::default().fg(Color::DarkGray),
            toolbar_tab: Style::default().fg(Color::Gray),
            toolbar_tab_active: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            refreshing: Style::default().fg(Color::Magenta),

            entry_unread: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            entry_read: Style::default().fg(Color::DarkGray),
            entry_selected: Style::default().bg(Color::Blue).fg(Color::White),
            entry_meta: Style::default().fg(Color::DarkGray),
            entry_bookmark: Style::default().fg(Color::Magenta),

            progress: Style::default().fg(Color::Blue),
            message: Style::default().fg(Color::DarkGray),
            retry: Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),

            detail_heading: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            detail_body: Style::default().fg(Color::Black),
            detail_meta: Style::default().fg(Color::DarkGray),
            detail_link: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::UNDERLINED),

            snackbar: Style::default().bg(Color::Black).fg(Color::White),
            status_bar: Style::default().bg(Color::White).fg(Color::Black),
            panel_border: Style::default().fg(Color::DarkGray),
            dialog_border: Style::default().fg(Color::Red),
            dialog_text: Style::default().fg(Color::Black),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_from_str_name() {
        assert_eq!(ThemeVariant::from_str_name("dark"), Some(ThemeVariant::Dark));
        assert_eq!(ThemeVariant::from_str_name("Light"), Some(ThemeVariant::Light));
        assert_eq!(ThemeVariant::from_str_name("neon"), None);
    }

    #[test]
    fn variant_cycles() {
        assert_eq!(ThemeVariant::Dark.next(), ThemeVariant::Light);
        assert_eq!(ThemeVariant::Light.next().next(), ThemeVariant::Light);
    }

    #[test]
    fn light_palette_differs_from_dark() {
        let dark = ThemeVariant::Dark.palette();
        let light = ThemeVariant::Light.palette();
        assert_ne!(dark.entry_selected, light.entry_selected);
        assert_ne!(dark.snackbar, light.snackbar);
    }

    #[test]
    fn read_entries_are_dimmed() {
        for variant in [ThemeVariant::Dark, ThemeVariant::Light] {
            let p = variant.palette();
            assert!(p.entry_unread.add_modifier.contains(Modifier::BOLD));
            assert!(!p.entry_read.add_modifier.contains(Modifier::BOLD));
        }
    }
}
