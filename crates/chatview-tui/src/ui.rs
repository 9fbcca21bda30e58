use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
};
use crate::app::App;
use crate::render::{render_transcript, slice_columns};
use unicode_width::UnicodeWidthChar;

pub fn render(app: &mut App, frame: &mut Frame) {
    let [chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store area for mouse hit-testing
    app.chat_area = Some(area);

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(format!(" chatview: {} ", app.endpoint));

    let inner_width = area.width.saturating_sub(2);
    let inner_height = area.height.saturating_sub(2);

    let transcript = app.session.transcript();
    if transcript.is_empty() && !app.session.is_loading() {
        app.update_scroll_bounds(0, inner_height, 0);
        let hint = Paragraph::new(Text::from(Span::styled(
            "Type a message below and press Enter to start the conversation.",
            Style::default().fg(Color::DarkGray),
        )))
        .block(chat_block);
        frame.render_widget(hint, area);
        return;
    }

    let thinking = app.session.is_loading().then_some(app.animation_frame);
    let view = render_transcript(transcript.turns(), inner_width, app.code_scroll, thinking);
    let total_lines = view.lines.len().min(u16::MAX as usize) as u16;
    app.update_scroll_bounds(total_lines, inner_height, view.max_code_scroll);

    // Lines are pre-wrapped; code panels must not be re-flowed
    let chat = Paragraph::new(Text::from(view.lines))
        .block(chat_block)
        .scroll((app.scroll, 0));
    frame.render_widget(chat, area);

    if app.max_scroll > 0 {
        let mut scrollbar_state = ScrollbarState::new(app.max_scroll as usize)
            .position(app.scroll as usize);
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(None)
            .end_symbol(None);
        let track = Rect {
            y: area.y + 1,
            height: area.height.saturating_sub(2),
            ..area
        };
        frame.render_stateful_widget(scrollbar, track, &mut scrollbar_state);
    }
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let loading = app.session.is_loading();

    let (title, border_color) = if loading {
        (" Sending... ", Color::DarkGray)
    } else {
        (" Send (Enter) ", Color::Yellow)
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    let draft = app.session.draft();

    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let (visible_text, cursor_x) = input_window(draft.text(), draft.cursor(), inner_width);

    let input = if draft.text().is_empty() {
        Paragraph::new(Span::styled(
            app.placeholder.clone(),
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        // Input is disabled while a request is outstanding
        let style = if loading {
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM)
        } else {
            Style::default().fg(Color::Cyan)
        };
        Paragraph::new(visible_text).style(style)
    };

    frame.render_widget(input.block(input_block), area);

    if !loading {
        let cursor_x = cursor_x.min(u16::MAX as usize) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

/// Horizontal window over the draft that keeps the cursor visible.
/// `cursor` counts characters; the returned cursor offset counts columns.
fn input_window(text: &str, cursor: usize, width: usize) -> (String, usize) {
    let cursor_col: usize = text.chars().take(cursor).map(|c| c.width().unwrap_or(0)).sum();
    let scroll_offset = if width > 0 && cursor_col >= width {
        cursor_col - width + 1
    } else {
        0
    };
    let (visible, _) = slice_columns(text, scroll_offset, width);
    (visible, cursor_col - scroll_offset)
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let key = Style::default().fg(Color::Yellow);
    let text = Style::default().fg(Color::DarkGray);

    let mut spans = vec![
        Span::styled("Enter", key),
        Span::styled(" send  ", text),
        Span::styled("↑↓ PgUp PgDn", key),
        Span::styled(" scroll  ", text),
    ];
    if app.max_code_scroll > 0 {
        spans.push(Span::styled("Shift+←→", key));
        spans.push(Span::styled(" scroll code  ", text));
    }
    spans.push(Span::styled("Esc", key));
    spans.push(Span::styled(" quit", text));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
