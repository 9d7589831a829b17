//! Render dispatch: tab bar, main area per view, snackbar, status bar and
//! the error dialog overlay.

use crate::app::{App, Tab, View};
use crate::keybindings::{Action as KbAction, Context as KbContext};
use crate::util::wrap_to_width;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use super::{detail, entries, feeds, search, status};

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 40;
pub(super) const MIN_HEIGHT: u16 = 8;

pub(super) fn render(f: &mut Frame, app: &mut App) {
    let area = f.area();
    if area.width < 1 || area.height < 1 {
        return;
    }
    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        return;
    }

    let snackbar = app.screen().and_then(|s| s.pending_undo()).filter(|_| {
        app.view == View::Entries
    });

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(u16::from(snackbar.is_some())),
            Constraint::Length(1),
        ])
        .split(area);

    render_tabs(f, app, chunks[0]);
    match app.view {
        View::Entries => entries::render(f, app, chunks[1]),
        View::Feeds => feeds::render(f, app, chunks[1]),
        View::Search => search::render(f, app, chunks[1]),
        View::Detail => detail::render(f, app, chunks[1]),
    }
    if let Some(label) = snackbar {
        render_snackbar(f, app, chunks[2], label);
    }
    status::render(f, app, chunks[3]);

    if let Some(message) = app.error_dialog.as_deref() {
        render_error_dialog(f, app, message);
    }
}

fn render_tabs(f: &mut Frame, app: &App, area: Rect) {
    let mut spans = Vec::with_capacity(Tab::ALL.len() * 2);
    for tab in Tab::ALL {
        let style = if tab == app.tab {
            app.palette.toolbar_tab_active
        } else {
            app.palette.toolbar_tab
        };
        spans.push(Span::styled(format!(" {} ", tab.label()), style));
        spans.push(Span::raw(" "));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_snackbar(f: &mut Frame, app: &App, area: Rect, label: &str) {
    let text = match app.keybindings.key_hint(KbAction::Undo, KbContext::EntryList) {
        Some(key) => format!(" {}   [{}] Undo", label, key),
        None => format!(" {}", label),
    };
    f.render_widget(Paragraph::new(text).style(app.palette.snackbar), area);
}

fn render_error_dialog(f: &mut Frame, app: &App, message: &str) {
    let area = f.area();
    let width = 60u16.min(area.width.saturating_sub(4));
    let inner_width = usize::from(width.saturating_sub(4));

    let mut lines: Vec<Line> = wrap_to_width(message, inner_width.max(1))
        .into_iter()
        .map(Line::from)
        .collect();
    lines.push(Line::from(""));
    let dismiss = app
        .keybindings
        .key_hint(KbAction::Back, KbContext::Dialog)
        .unwrap_or_else(|| "Enter".to_string());
    lines.push(Line::from(format!("[{}] OK", dismiss)));

    let height = (lines.len() as u16 + 2).min(area.height.saturating_sub(2));
    let overlay = centered(width, height, area);
    if overlay.width < 10 || overlay.height < 3 {
        return;
    }

    f.render_widget(Clear, overlay);
    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.palette.dialog_border)
                .title(" Error "),
        )
        .alignment(Alignment::Center)
        .style(app.palette.dialog_text);
    f.render_widget(paragraph, overlay);
}

/// A `width` x `height` rectangle centred in `area`.
pub(super) fn centered(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width - width) / 2;
    let y = area.y + (area.height - height) / 2;
    Rect::new(x, y, width, height)
}
