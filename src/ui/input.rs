//! Keyboard input dispatch.
//!
//! Keys resolve to actions through the keybinding registry in the context of
//! the view that has focus. The error dialog captures input while open, and
//! a search query being typed takes raw keys.

use crate::app::{App, Tab, View};
use crate::entries::{CommandError, EntriesScreen, SwipeDirection};
use crate::keybindings::{Action as KbAction, Context as KbContext};
use crossterm::event::{KeyCode, KeyModifiers};

use super::loop_runner::Action;

fn context_for(app: &App) -> KbContext {
    if app.error_dialog.is_some() {
        return KbContext::Dialog;
    }
    match app.view {
        View::Entries => KbContext::EntryList,
        View::Feeds => KbContext::FeedList,
        View::Search => KbContext::SearchResults,
        View::Detail => KbContext::Detail,
    }
}

fn is_typing_query(app: &App) -> bool {
    app.error_dialog.is_none()
        && app.view == View::Search
        && app.search.as_ref().is_some_and(|s| s.editing)
}

pub(super) fn handle_input(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> Action {
    // Letter case already carries shift
    let modifiers = match code {
        KeyCode::Char(_) => modifiers.difference(KeyModifiers::SHIFT),
        _ => modifiers,
    };
    if is_typing_query(app) {
        handle_query_input(app, code, modifiers);
        return Action::Continue;
    }
    let context = context_for(app);
    let Some(action) = app.keybindings.action_for_key(code, modifiers, context) else {
        return Action::Continue;
    };
    tracing::trace!(?action, ?context, "Key action");

    if context == KbContext::Dialog {
        if action == KbAction::Back {
            app.dismiss_error();
        }
        return Action::Continue;
    }

    match action {
        KbAction::Quit => return Action::Quit,
        KbAction::ShowNews => app.select_tab(Tab::News),
        KbAction::ShowBookmarks => app.select_tab(Tab::Bookmarks),
        KbAction::ShowFeeds => app.select_tab(Tab::Feeds),
        KbAction::CycleTheme => app.cycle_theme(),
        KbAction::Back => app.back(),
        _ => match app.view {
            View::Entries => handle_entries_action(app, action),
            View::Feeds => handle_feeds_action(app, action),
            View::Search => handle_search_action(app, action),
            View::Detail => handle_detail_action(app, action),
        },
    }
    Action::Continue
}

fn handle_entries_action(app: &mut App, action: KbAction) {
    match action {
        KbAction::Open => {
            app.activate_selected();
            return;
        }
        KbAction::Search => {
            app.open_search();
            return;
        }
        _ => {}
    }

    let rows = app.list_rows.max(1);
    let Some(screen) = app.screen_mut() else {
        return;
    };

    let result: Result<Option<&'static str>, CommandError> = match action {
        KbAction::NavDown => {
            screen.scroll_by(1, rows);
            Ok(None)
        }
        KbAction::NavUp => {
            screen.scroll_by(-1, rows);
            Ok(None)
        }
        KbAction::PageDown => {
            screen.scroll_by(rows as isize, rows);
            Ok(None)
        }
        KbAction::PageUp => {
            screen.scroll_by(-(rows as isize), rows);
            Ok(None)
        }
        // The snackbar renders from the pending undo
        KbAction::SwipeLeft => swipe(screen, SwipeDirection::Left),
        KbAction::SwipeRight => swipe(screen, SwipeDirection::Right),
        KbAction::Undo => screen
            .on_undo()
            .map(|undone| undone.then_some("Undone")),
        KbAction::ToggleShowRead => screen.on_toggle_show_read().map(|_| None),
        KbAction::ToggleSortOrder => screen.on_change_sort_order().map(|_| None),
        KbAction::MarkAllRead => screen
            .on_mark_all_as_read()
            .map(|()| Some("Marking all as read")),
        KbAction::Refresh => refresh(screen),
        _ => Ok(None),
    };

    match result {
        Ok(Some(status)) => app.set_status(status),
        Ok(None) => {}
        Err(e) => app.on_command_error(e),
    }
}

fn swipe(
    screen: &mut EntriesScreen,
    direction: SwipeDirection,
) -> Result<Option<&'static str>, CommandError> {
    let position = screen.selected();
    screen.on_swipe(position, direction).map(|_| None)
}

/// Retry a failed sync, otherwise pull to refresh.
fn refresh(screen: &mut EntriesScreen) -> Result<Option<&'static str>, CommandError> {
    if screen.on_retry()? {
        return Ok(None);
    }
    screen
        .on_pull_refresh()
        .map(|started| started.then_some("Syncing news"))
}

fn handle_feeds_action(app: &mut App, action: KbAction) {
    match action {
        KbAction::NavDown => app.move_feed_selection(1),
        KbAction::NavUp => app.move_feed_selection(-1),
        KbAction::PageDown => app.move_feed_selection(app.list_rows.max(1) as isize),
        KbAction::PageUp => app.move_feed_selection(-(app.list_rows.max(1) as isize)),
        KbAction::Open => app.open_selected_feed(),
        _ => {}
    }
}

/// Keys while the search query is being typed.
fn handle_query_input(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    match code {
        KeyCode::Esc => app.back(),
        KeyCode::Enter => app.commit_search(),
        KeyCode::Backspace => app.pop_search_char(),
        KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => {
            app.push_search_char(c)
        }
        _ => {}
    }
}

fn handle_search_action(app: &mut App, action: KbAction) {
    let page = app.list_rows.max(1) as isize;
    match action {
        KbAction::NavDown => app.move_search_selection(1),
        KbAction::NavUp => app.move_search_selection(-1),
        KbAction::PageDown => app.move_search_selection(page),
        KbAction::PageUp => app.move_search_selection(-page),
        KbAction::Open => app.open_selected_result(),
        KbAction::Search => app.edit_search(),
        _ => {}
    }
}

fn handle_detail_action(app: &mut App, action: KbAction) {
    let page = app.list_rows.max(1) as i32;
    match action {
        KbAction::NavDown => app.scroll_detail(1),
        KbAction::NavUp => app.scroll_detail(-1),
        KbAction::PageDown => app.scroll_detail(page),
        KbAction::PageUp => app.scroll_detail(-page),
        KbAction::OpenInBrowser => app.open_detail_in_browser(),
        KbAction::ToggleBookmark => app.toggle_detail_bookmark(),
        _ => {}
    }
}
