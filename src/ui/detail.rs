use crate::app::App;
use crate::util::{format_published, html_to_text, strip_control_chars, wrap_to_width};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Render one entry in full: title, meta line, summary and links.
pub fn render(f: &mut Frame, app: &mut App, area: Rect) {
    if area.width < 3 || area.height < 3 {
        return;
    }
    app.list_rows = usize::from(area.height.saturating_sub(2));
    let palette = &app.palette;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(palette.panel_border)
        .title(" Entry ");
    let inner_width = usize::from(area.width.saturating_sub(2)).max(1);

    let Some(detail) = app.detail.as_ref() else {
        f.render_widget(Paragraph::new("No entry selected").block(block), area);
        return;
    };
    let Some(entry) = detail.entry.as_ref() else {
        f.render_widget(
            Paragraph::new(Line::styled("Loading…", palette.progress)).block(block),
            area,
        );
        return;
    };

    let mut lines: Vec<Line> = Vec::new();
    let title = strip_control_chars(&entry.title);
    for line in wrap_to_width(&title, inner_width) {
        lines.push(Line::styled(line, palette.detail_heading));
    }

    let mut meta = vec![Span::styled(
        format_published(entry.published),
        palette.detail_meta,
    )];
    if entry.bookmarked {
        meta.push(Span::styled("  ★ Bookmarked", palette.entry_bookmark));
    }
    if entry.read {
        meta.push(Span::styled("  Read", palette.detail_meta));
    }
    lines.push(Line::from(meta));
    lines.push(Line::from(""));

    match entry.summary.as_deref() {
        Some(summary) if !summary.trim().is_empty() => {
            let text = html_to_text(&strip_control_chars(summary));
            for line in wrap_to_width(&text, inner_width) {
                lines.push(Line::styled(line, palette.detail_body));
            }
        }
        _ => lines.push(Line::styled("No summary", palette.detail_meta)),
    }

    if !entry.links.is_empty() {
        lines.push(Line::from(""));
        for link in &entry.links {
            let label = format!("{}: {}", link.rel, strip_control_chars(&link.href));
            for line in wrap_to_width(&label, inner_width) {
                lines.push(Line::styled(line, palette.detail_link));
            }
        }
    }

    let max_scroll = lines.len().saturating_sub(app.list_rows) as u16;
    let paragraph = Paragraph::new(lines)
        .block(block)
        .scroll((detail.scroll.min(max_scroll), 0));
    f.render_widget(paragraph, area);
}
