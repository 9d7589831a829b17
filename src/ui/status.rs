use crate::app::{App, View};
use crate::keybindings::{Action as KbAction, Context as KbContext};
use ratatui::{layout::Rect, widgets::Paragraph, Frame};
use std::borrow::Cow;

const ENTRY_HINTS: [KbAction; 5] = [
    KbAction::Open,
    KbAction::Undo,
    KbAction::ShowNews,
    KbAction::CycleTheme,
    KbAction::Quit,
];
const FEED_HINTS: [KbAction; 4] = [
    KbAction::Open,
    KbAction::ShowNews,
    KbAction::ShowBookmarks,
    KbAction::Quit,
];
const SEARCH_HINTS: [KbAction; 4] = [
    KbAction::Open,
    KbAction::Search,
    KbAction::Back,
    KbAction::Quit,
];
const DETAIL_HINTS: [KbAction; 4] = [
    KbAction::Back,
    KbAction::OpenInBrowser,
    KbAction::ToggleBookmark,
    KbAction::Quit,
];

/// Render the status bar: the current status message, or key hints.
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    let typing = app.view == View::Search && app.search.as_ref().is_some_and(|s| s.editing);
    let text: Cow<'_, str> = if let Some((msg, _)) = &app.status_message {
        Cow::Borrowed(msg.as_ref())
    } else if typing {
        Cow::Borrowed("[Enter] Search  [Esc] Cancel")
    } else {
        let (context, actions): (KbContext, &[KbAction]) = match app.view {
            View::Entries => (KbContext::EntryList, &ENTRY_HINTS),
            View::Feeds => (KbContext::FeedList, &FEED_HINTS),
            View::Search => (KbContext::SearchResults, &SEARCH_HINTS),
            View::Detail => (KbContext::Detail, &DETAIL_HINTS),
        };
        let hints: Vec<String> = actions
            .iter()
            .filter_map(|&action| {
                app.keybindings
                    .key_hint(action, context)
                    .map(|key| format!("[{}] {}", key, action.describe()))
            })
            .collect();
        Cow::Owned(hints.join("  "))
    };

    f.render_widget(Paragraph::new(text).style(app.palette.status_bar), area);
}
