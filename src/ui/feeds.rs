use crate::app::App;
use crate::util::{strip_control_chars, truncate_to_width};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

/// Render the feed picker.
pub fn render(f: &mut Frame, app: &mut App, area: Rect) {
    if area.width < 3 || area.height < 3 {
        return;
    }
    app.list_rows = usize::from(area.height.saturating_sub(2));
    let palette = &app.palette;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(palette.panel_border)
        .title(Span::styled(" Feeds ", palette.toolbar_title));

    let width = usize::from(area.width.saturating_sub(4));
    let items: Vec<ListItem> = if app.feeds.feeds.is_empty() {
        let text = if app.feeds.loading {
            "Loading feeds…"
        } else {
            "No feeds yet"
        };
        vec![ListItem::new(Line::styled(text, palette.message))]
    } else {
        app.feeds
            .feeds
            .iter()
            .map(|feed| {
                let title = strip_control_chars(&feed.title);
                ListItem::new(truncate_to_width(&title, width).into_owned())
                    .style(palette.entry_unread)
            })
            .collect()
    };

    let mut state = ListState::default();
    if !app.feeds.feeds.is_empty() {
        state.select(Some(app.feeds.selected));
    }
    let list = List::new(items)
        .block(block)
        .highlight_style(palette.entry_selected);
    f.render_stateful_widget(list, area, &mut state);
}
