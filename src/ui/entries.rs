use crate::app::App;
use crate::entries::{EntriesScreen, Panel, Toolbar};
use crate::storage::Entry;
use crate::keybindings::{Action as KbAction, Context as KbContext, KeybindingRegistry};
use crate::theme::ColorPalette;
use crate::util::{display_width, format_published, strip_control_chars, truncate_to_width};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub(super) const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Render the entry list: toolbar row plus the one panel the state selects.
pub fn render(f: &mut Frame, app: &mut App, area: Rect) {
    if area.width < 3 || area.height < 4 {
        return;
    }
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(area);

    // Borders take two rows
    app.list_rows = usize::from(chunks[1].height.saturating_sub(2));

    let Some(screen) = app.screen() else {
        return;
    };
    let palette = &app.palette;
    let spinner = SPINNER[app.spinner_frame % SPINNER.len()];
    let bar = screen.toolbar();

    render_toolbar(f, &bar, &app.keybindings, palette, spinner, chunks[0]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(palette.panel_border)
        .title(Span::styled(
            format!(" {} ", strip_control_chars(&bar.title)),
            palette.toolbar_title,
        ));
    let body = block.inner(chunks[1]);
    f.render_widget(block, chunks[1]);

    match screen.panel() {
        Panel::Progress { caption } => {
            let text = match caption {
                Some(caption) => format!("{} {}", spinner, caption),
                None => spinner.to_string(),
            };
            render_centered(f, body, vec![Line::styled(text, palette.progress)]);
        }
        Panel::Retry { cause } => {
            let mut lines = vec![
                Line::styled("Couldn't sync news", palette.retry),
                Line::styled(cause.to_string(), palette.message),
                Line::from(""),
            ];
            if let Some(key) = app.keybindings.key_hint(KbAction::Refresh, KbContext::EntryList) {
                lines.push(Line::styled(format!("[{}] Retry", key), palette.toolbar_action));
            }
            render_centered(f, body, lines);
        }
        Panel::Message(message) => {
            render_centered(f, body, vec![Line::styled(message, palette.message)]);
        }
        Panel::Content(_) => render_rows(f, screen, palette, body),
    }
}

fn render_toolbar(
    f: &mut Frame,
    bar: &Toolbar<'_>,
    keys: &KeybindingRegistry,
    palette: &ColorPalette,
    spinner: &str,
    area: Rect,
) {
    let mut buttons: Vec<(KbAction, &str)> = Vec::with_capacity(8);
    if bar.back {
        buttons.push((KbAction::Back, "Back"));
    }
    if bar.search {
        buttons.push((KbAction::Search, "Search"));
    }
    if let Some(label) = bar.show_read {
        buttons.push((KbAction::ToggleShowRead, label));
    }
    if let Some(label) = bar.sort {
        buttons.push((KbAction::ToggleSortOrder, label));
    }
    if bar.mark_all_read {
        buttons.push((KbAction::MarkAllRead, "Mark all as read"));
    }
    if bar.pull_refresh {
        buttons.push((KbAction::Refresh, "Refresh"));
    }
    if let Some(action) = bar.swipe_left {
        buttons.push((KbAction::SwipeLeft, action.label()));
    }
    if let Some(action) = bar.swipe_right.filter(|a| Some(*a) != bar.swipe_left) {
        buttons.push((KbAction::SwipeRight, action.label()));
    }

    let mut spans = Vec::with_capacity(buttons.len() * 2 + 1);
    for (action, label) in buttons {
        let Some(key) = keys.key_hint(action, KbContext::EntryList) else {
            continue;
        };
        spans.push(Span::styled(
            format!("[{}] {}", key, label),
            palette.toolbar_action,
        ));
        spans.push(Span::raw("  "));
    }
    if bar.refreshing {
        spans.push(Span::styled(format!("{} Syncing", spinner), palette.refreshing));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_rows(f: &mut Frame, screen: &EntriesScreen, palette: &ColorPalette, area: Rect) {
    let lines = entry_rows(
        screen.entries(),
        screen.selected(),
        screen.offset(),
        palette,
        area,
    );
    f.render_widget(Paragraph::new(lines), area);
}

/// One line per visible entry: bookmark marker, title, date.
///
/// `offset` is adjusted so `selected` stays inside `area`. A `selected`
/// past the end highlights nothing.
pub(super) fn entry_rows(
    entries: &[Entry],
    selected: usize,
    offset: usize,
    palette: &ColorPalette,
    area: Rect,
) -> Vec<Line<'static>> {
    let rows = usize::from(area.height);
    if rows == 0 {
        return Vec::new();
    }

    // The viewport may have shrunk since the last scroll
    let mut offset = offset;
    if selected < entries.len() {
        if selected < offset {
            offset = selected;
        } else if selected >= offset + rows {
            offset = selected + 1 - rows;
        }
    }

    let width = usize::from(area.width);
    entries
        .iter()
        .enumerate()
        .skip(offset)
        .take(rows)
        .map(|(i, entry)| {
            let marker = if entry.bookmarked { "★ " } else { "  " };
            let date = format_published(entry.published);
            let title_width = width.saturating_sub(display_width(&date) + 4);
            let title = strip_control_chars(&entry.title);
            let title = truncate_to_width(&title, title_width).into_owned();
            let pad = width.saturating_sub(2 + display_width(&title) + display_width(&date));

            let title_style = if i == selected {
                palette.entry_selected
            } else if entry.read {
                palette.entry_read
            } else {
                palette.entry_unread
            };
            let meta_style = if i == selected {
                palette.entry_selected
            } else {
                palette.entry_meta
            };

            Line::from(vec![
                Span::styled(marker, palette.entry_bookmark),
                Span::styled(title, title_style),
                Span::styled(" ".repeat(pad), title_style),
                Span::styled(date, meta_style),
            ])
        })
        .collect()
}

pub(super) fn render_centered(f: &mut Frame, area: Rect, lines: Vec<Line<'static>>) {
    let height = (lines.len() as u16).min(area.height);
    let y = area.y + (area.height - height) / 2;
    let target = Rect::new(area.x, y, area.width, height);
    f.render_widget(Paragraph::new(lines).alignment(Alignment::Center), target);
}
