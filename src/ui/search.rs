use crate::app::App;
use crate::util::{strip_control_chars, truncate_to_width};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::entries::{entry_rows, render_centered, SPINNER};

/// Render the query box and the result list.
pub fn render(f: &mut Frame, app: &mut App, area: Rect) {
    if area.width < 3 || area.height < 6 {
        return;
    }
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    app.list_rows = usize::from(chunks[1].height.saturating_sub(2));
    let Some(search) = app.search.as_ref() else {
        return;
    };
    let palette = &app.palette;

    let query_width = usize::from(chunks[0].width.saturating_sub(4));
    let query = strip_control_chars(&search.query);
    let mut query = truncate_to_width(&query, query_width.saturating_sub(1)).into_owned();
    if search.editing {
        query.push('▏');
    }
    let query_style = if search.editing {
        palette.entry_unread
    } else {
        palette.entry_meta
    };
    let input = Paragraph::new(Span::styled(query, query_style)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(palette.panel_border)
            .title(Span::styled(" Search ", palette.toolbar_title)),
    );
    f.render_widget(input, chunks[0]);

    let title = if search.searched && !search.searching {
        format!(" {} found ", search.results.len())
    } else {
        " Results ".to_string()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(palette.panel_border)
        .title(Span::styled(title, palette.toolbar_title));
    let body = block.inner(chunks[1]);
    f.render_widget(block, chunks[1]);

    if search.searching && search.results.is_empty() {
        let spinner = SPINNER[app.spinner_frame % SPINNER.len()];
        let line = Line::styled(format!("{} Searching", spinner), palette.progress);
        render_centered(f, body, vec![line]);
    } else if search.results.is_empty() {
        let text = if search.searched {
            "No matching news"
        } else {
            "Type to search all cached news"
        };
        render_centered(f, body, vec![Line::styled(text, palette.message)]);
    } else {
        // No highlight while the query has focus
        let selected = if search.editing {
            usize::MAX
        } else {
            search.selected
        };
        let lines = entry_rows(&search.results, selected, 0, palette, body);
        f.render_widget(Paragraph::new(lines), body);
    }
}
