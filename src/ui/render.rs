//! UI renderer implementation.
//!
//! The screen has three bands: the working directory on the first row, the status message on
//! the last row and the entry window in between. All text starts one column in.
//!
//! This module should stay “pure rendering”: it reads the session and produces widgets. The only
//! state it writes back is the scroll offset of the entry window.

use crate::app::AppState;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::Line,
    widgets::Paragraph,
};
use unicode_width::UnicodeWidthChar;

/// Column where every row starts.
const LEFT_MARGIN: u16 = 1;

/// Render function which renders the whole frame from the session.
pub fn render(frame: &mut Frame, app: &mut AppState) {
    let area = frame.area();
    if area.width <= LEFT_MARGIN || area.height == 0 {
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    let header = inset(chunks[0]);
    let body = inset(chunks[1]);
    let footer = inset(chunks[2]);

    let path = app.working_dir().display().to_string();
    frame.render_widget(
        Paragraph::new(clip_to_width(&path, header.width as usize)),
        header,
    );

    render_entries(frame, app, body);

    let status = app.status_text();
    frame.render_widget(
        Paragraph::new(clip_to_width(&status, footer.width as usize)),
        footer,
    );
}

fn render_entries(frame: &mut Frame, app: &mut AppState, area: Rect) {
    let rows = area.height as usize;
    let width = area.width as usize;
    let selected = app.selected_idx();
    let count = app.entry_count();

    let offset = scroll_offset(app.scroll(), selected, count, rows);
    app.set_scroll(offset);
    if rows == 0 {
        return;
    }

    let selected_style = Style::default().add_modifier(Modifier::REVERSED);
    let lines: Vec<Line> = app.with_entries(|entries| {
        entries
            .iter()
            .enumerate()
            .skip(offset)
            .take(rows)
            .map(|(i, entry)| {
                let name = clip_to_width(&entry.name_str(), width);
                if i == selected {
                    Line::styled(name, selected_style)
                } else {
                    Line::raw(name)
                }
            })
            .collect()
    });

    frame.render_widget(Paragraph::new(lines), area);
}

fn inset(area: Rect) -> Rect {
    Rect {
        x: area.x + LEFT_MARGIN,
        width: area.width.saturating_sub(LEFT_MARGIN),
        ..area
    }
}

/// Computes the first visible row of a window of `rows` rows over `count` entries.
///
/// Starts from the previous offset and moves it as little as possible so that `selected` stays
/// visible. The result never leaves empty rows at the bottom while there are entries above.
pub fn scroll_offset(prev: usize, selected: usize, count: usize, rows: usize) -> usize {
    if rows == 0 || count <= rows {
        return 0;
    }
    let selected = selected.min(count - 1);
    let mut offset = prev.min(count - rows);

    if selected < offset {
        offset = selected;
    } else if selected >= offset + rows {
        offset = selected + 1 - rows;
    }
    offset
}

/// Drops control characters and cuts `s` to at most `max_width` terminal columns.
///
/// Tabs become a single space so a name cannot shift the columns after it.
pub fn clip_to_width(s: &str, max_width: usize) -> String {
    let mut out = String::with_capacity(s.len().min(max_width * 4));
    let mut current_w = 0;

    for c in s.chars() {
        let c = if c == '\t' { ' ' } else { c };
        if c.is_control() {
            continue;
        }
        let w = c.width().unwrap_or(0);
        if current_w + w > max_width {
            break;
        }
        out.push(c);
        current_w += w;
    }
    out
}
