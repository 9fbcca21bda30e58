//! Turns transcript content into terminal lines.
//!
//! Prose is word-wrapped here rather than by `Paragraph::wrap` because code
//! panels must never wrap: they are padded to the bubble width and shifted
//! by the shared horizontal code offset instead.

use chatview_core::{parse_markdown, Block, ChatRole, Inline, InlineStyle, Turn};
use ratatui::{
    layout::Alignment,
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Dark panel behind fenced code
pub const CODE_PANEL_BG: Color = Color::Rgb(31, 41, 55);
/// Highlight for inline code spans
pub const INLINE_CODE_BG: Color = Color::Rgb(55, 65, 81);
const INLINE_CODE_FG: Color = Color::Rgb(243, 244, 246);

/// Share of the transcript width a single turn may use
const BUBBLE_PERCENT: usize = 85;
const TAB_WIDTH: usize = 4;

pub struct TranscriptView {
    pub lines: Vec<Line<'static>>,
    /// Largest useful horizontal offset across all code panels
    pub max_code_scroll: u16,
}

fn char_width(c: char) -> usize {
    UnicodeWidthChar::width(c).unwrap_or(0)
}

/// Byte index of the longest prefix of `s` that fits in `columns`
fn split_at_width(s: &str, columns: usize) -> usize {
    let mut used = 0;
    for (i, c) in s.char_indices() {
        used += char_width(c);
        if used > columns {
            return i;
        }
    }
    s.len()
}

/// Cut the terminal columns `skip..skip + take` out of `s`.
/// Wide characters straddling either edge become spaces so the result
/// keeps its column positions. Returns the text and its display width.
pub fn slice_columns(s: &str, skip: usize, take: usize) -> (String, usize) {
    let end = skip + take;
    let mut out = String::new();
    let mut col = 0;
    let mut width = 0;
    for c in s.chars() {
        let w = char_width(c);
        let start = col;
        col += w;
        if col <= skip {
            continue;
        }
        if start >= end {
            break;
        }
        if start < skip || col > end {
            let visible = col.min(end) - start.max(skip);
            out.push_str(&" ".repeat(visible));
            width += visible;
        } else {
            out.push(c);
            width += w;
        }
    }
    (out, width)
}

fn role_style(role: ChatRole) -> Style {
    match role {
        ChatRole::User => Style::default().fg(Color::Cyan),
        ChatRole::Assistant => Style::default(),
    }
}

fn role_alignment(role: ChatRole) -> Alignment {
    match role {
        ChatRole::User => Alignment::Right,
        ChatRole::Assistant => Alignment::Left,
    }
}

fn inline_style(base: Style, style: InlineStyle) -> Style {
    let mut out = base;
    if style.code {
        out = out.fg(INLINE_CODE_FG).bg(INLINE_CODE_BG);
    }
    if style.link && !style.code {
        out = out.fg(Color::Blue).add_modifier(Modifier::UNDERLINED);
    }
    if style.strong {
        out = out.add_modifier(Modifier::BOLD);
    }
    if style.emphasis {
        out = out.add_modifier(Modifier::ITALIC);
    }
    if style.strikethrough {
        out = out.add_modifier(Modifier::CROSSED_OUT);
    }
    out
}

/// Greedy word wrapper over styled runs
struct Wrapper {
    width: usize,
    rest_prefix: Option<(String, Style)>,
    lines: Vec<Vec<(String, Style)>>,
    current: Vec<(String, Style)>,
    len: usize,
    /// Nothing but the prefix on the current line
    empty: bool,
}

impl Wrapper {
    fn new(width: usize, first_prefix: Option<(String, Style)>, rest_prefix: Option<(String, Style)>) -> Self {
        let mut wrapper = Self {
            width: width.max(1),
            rest_prefix,
            lines: Vec::new(),
            current: Vec::new(),
            len: 0,
            empty: true,
        };
        wrapper.start_line(first_prefix);
        wrapper
    }

    fn start_line(&mut self, prefix: Option<(String, Style)>) {
        self.current = Vec::new();
        self.len = 0;
        self.empty = true;
        if let Some((text, style)) = prefix {
            self.len = text.width();
            self.current.push((text, style));
        }
    }

    fn break_line(&mut self) {
        if !self.empty {
            if let Some((text, _)) = self.current.last_mut() {
                let trimmed = text.trim_end_matches(' ').len();
                text.truncate(trimmed);
            }
        }
        let line = std::mem::take(&mut self.current);
        self.lines.push(line);
        let prefix = self.rest_prefix.clone();
        self.start_line(prefix);
    }

    fn append(&mut self, text: &str, style: Style) {
        if text.is_empty() {
            return;
        }
        match self.current.last_mut() {
            Some((last, last_style)) if !self.empty && *last_style == style => last.push_str(text),
            _ => self.current.push((text.to_string(), style)),
        }
        self.len += text.width();
        self.empty = false;
    }

    fn push_piece(&mut self, piece: &str, style: Style) {
        let word_width = piece.trim_end_matches(' ').width();
        if word_width == 0 {
            // Leading whitespace on a wrapped line is dropped
            if !self.empty {
                self.append(piece, style);
            }
            return;
        }
        if !self.empty && self.len + word_width > self.width {
            self.break_line();
        }

        let mut piece = piece;
        loop {
            let available = self.width.saturating_sub(self.len);
            if piece.trim_end_matches(' ').width() <= available {
                self.append(piece, style);
                return;
            }
            // Word longer than a whole line: hard split it
            let mut split = split_at_width(piece, available);
            if split == 0 {
                if !self.empty {
                    self.break_line();
                    continue;
                }
                // Not even one character fits; place it anyway
                split = piece.chars().next().map_or(piece.len(), char::len_utf8);
            }
            self.append(&piece[..split], style);
            self.break_line();
            piece = &piece[split..];
        }
    }

    fn push_text(&mut self, text: &str, style: Style) {
        for (i, segment) in text.split('\n').enumerate() {
            if i > 0 {
                self.break_line();
            }
            for piece in segment.split_inclusive(' ') {
                self.push_piece(piece, style);
            }
        }
    }

    fn finish(mut self) -> Vec<Vec<(String, Style)>> {
        if !self.empty {
            self.break_line();
        }
        self.lines
    }
}

fn to_line(spans: Vec<(String, Style)>, alignment: Alignment) -> Line<'static> {
    Line::from(
        spans
            .into_iter()
            .map(|(text, style)| Span::styled(text, style))
            .collect::<Vec<_>>(),
    )
    .alignment(alignment)
}

fn wrap_inlines(
    inlines: &[Inline],
    base: Style,
    width: usize,
    first_prefix: Option<(String, Style)>,
    rest_prefix: Option<(String, Style)>,
) -> Vec<Vec<(String, Style)>> {
    let mut wrapper = Wrapper::new(width, first_prefix, rest_prefix);
    for inline in inlines {
        wrapper.push_text(&inline.text, inline_style(base, inline.style));
    }
    wrapper.finish()
}

/// Draw a code block as a fixed-width dark panel.
/// Returns the lines and how far the panel could scroll horizontally.
fn code_panel(
    language: Option<&str>,
    lines: &[String],
    width: usize,
    code_scroll: usize,
) -> (Vec<Vec<(String, Style)>>, usize) {
    let panel = Style::default().fg(Color::White).bg(CODE_PANEL_BG);
    let inner = width.saturating_sub(2).max(1);

    let expanded: Vec<String> = lines
        .iter()
        .map(|l| l.replace('\t', &" ".repeat(TAB_WIDTH)))
        .collect();
    let longest = expanded.iter().map(|l| l.width()).max().unwrap_or(0);
    let max_scroll = longest.saturating_sub(inner);
    let offset = code_scroll.min(max_scroll);

    let mut out = Vec::with_capacity(expanded.len() + 1);

    // Header with language and overflow arrows
    let left = if offset > 0 { "◀" } else { " " };
    let right = if offset < max_scroll { "▶" } else { " " };
    let label_width = inner.saturating_sub(2);
    let (label, used) = slice_columns(language.unwrap_or("code"), 0, label_width);
    let header = format!(
        " {}{}{}{} ",
        left,
        label,
        " ".repeat(label_width - used),
        right,
    );
    out.push(vec![(
        header,
        panel.fg(Color::Gray).add_modifier(Modifier::DIM),
    )]);

    for line in &expanded {
        let (visible, used) = slice_columns(line, offset, inner);
        let padded = format!(" {}{} ", visible, " ".repeat(inner - used));
        out.push(vec![(padded, panel)]);
    }

    (out, max_scroll)
}

fn block_lines(
    block: &Block,
    base: Style,
    width: usize,
    code_scroll: usize,
    max_code_scroll: &mut usize,
) -> Vec<Vec<(String, Style)>> {
    match block {
        Block::Paragraph(inlines) => wrap_inlines(inlines, base, width, None, None),
        Block::Heading { level, content } => {
            let mut style = base.add_modifier(Modifier::BOLD);
            if *level <= 2 {
                style = style.add_modifier(Modifier::UNDERLINED);
            }
            wrap_inlines(content, style, width, None, None)
        }
        Block::ListItem { depth, marker, content } => {
            let indent = "  ".repeat(*depth);
            let marker_width = if marker.is_empty() { 2 } else { marker.width() + 1 };
            let first = if marker.is_empty() {
                format!("{}{}", indent, " ".repeat(marker_width))
            } else {
                format!("{}{} ", indent, marker)
            };
            let rest = format!("{}{}", indent, " ".repeat(marker_width));
            wrap_inlines(
                content,
                base,
                width,
                Some((first, base.add_modifier(Modifier::BOLD))),
                Some((rest, base)),
            )
        }
        Block::Quote(inlines) => {
            let bar = ("│ ".to_string(), Style::default().fg(Color::DarkGray));
            wrap_inlines(
                inlines,
                base.add_modifier(Modifier::ITALIC),
                width,
                Some(bar.clone()),
                Some(bar),
            )
        }
        Block::CodeBlock { language, lines } => {
            let (panel, max_scroll) = code_panel(language.as_deref(), lines, width, code_scroll);
            *max_code_scroll = (*max_code_scroll).max(max_scroll);
            panel
        }
        Block::Rule => vec![vec![(
            "─".repeat(width),
            Style::default().fg(Color::DarkGray),
        )]],
        Block::TableRow { cells, header } => {
            let separator = Inline::plain(" │ ");
            let mut row: Vec<Inline> = Vec::new();
            for (i, cell) in cells.iter().enumerate() {
                if i > 0 {
                    row.push(separator.clone());
                }
                row.extend(cell.iter().cloned());
            }
            let style = if *header { base.add_modifier(Modifier::BOLD) } else { base };
            wrap_inlines(&row, style, width, None, None)
        }
    }
}

/// Blocks that read as one unit are not separated by a blank line
fn joins_previous(previous: &Block, current: &Block) -> bool {
    matches!(
        (previous, current),
        (Block::ListItem { .. }, Block::ListItem { .. })
            | (Block::TableRow { .. }, Block::TableRow { .. })
            | (Block::Quote(_), Block::Quote(_))
    )
}

fn bubble_width(width: u16) -> usize {
    let width = width as usize;
    (width * BUBBLE_PERCENT / 100).max(10).min(width.max(1))
}

fn header_line(role: ChatRole) -> Line<'static> {
    let color = match role {
        ChatRole::User => Color::Cyan,
        ChatRole::Assistant => Color::Yellow,
    };
    Line::from(Span::styled(
        format!("{}:", role.label()),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    ))
    .alignment(role_alignment(role))
}

/// Lay out the whole conversation for a transcript pane `width` columns wide.
/// `thinking` carries the animation frame while a request is outstanding.
pub fn render_transcript(
    turns: &[Turn],
    width: u16,
    code_scroll: u16,
    thinking: Option<u8>,
) -> TranscriptView {
    let bubble = bubble_width(width);
    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut max_code_scroll = 0usize;

    for turn in turns {
        let base = role_style(turn.role);
        let alignment = role_alignment(turn.role);
        lines.push(header_line(turn.role));

        let blocks = parse_markdown(&turn.content);
        let mut previous: Option<&Block> = None;
        for block in &blocks {
            if let Some(prev) = previous {
                if !joins_previous(prev, block) {
                    lines.push(Line::default());
                }
            }
            for spans in block_lines(block, base, bubble, code_scroll as usize, &mut max_code_scroll) {
                lines.push(to_line(spans, alignment));
            }
            previous = Some(block);
        }
        lines.push(Line::default());
    }

    if let Some(frame) = thinking {
        lines.push(header_line(ChatRole::Assistant));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat(frame as usize % 3 + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    TranscriptView {
        lines,
        max_code_scroll: max_code_scroll.min(u16::MAX as usize) as u16,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    fn texts(view: &TranscriptView) -> Vec<String> {
        view.lines.iter().map(line_text).collect()
    }

    #[test]
    fn test_roles_get_alignment_and_headers() {
        let turns = vec![Turn::user("hi"), Turn::assistant("hello")];
        let view = render_transcript(&turns, 40, 0, None);

        assert_eq!(texts(&view), vec!["You:", "hi", "", "Assistant:", "hello", ""]);
        assert_eq!(view.lines[1].alignment, Some(Alignment::Right));
        assert_eq!(view.lines[4].alignment, Some(Alignment::Left));
        assert_eq!(view.lines[1].spans[0].style.fg, Some(Color::Cyan));
    }

    #[test]
    fn test_prose_wraps_within_bubble() {
        let turns = vec![Turn::assistant("alpha beta gamma delta epsilon")];
        // 20 columns -> bubble of 17
        let view = render_transcript(&turns, 20, 0, None);
        let body: Vec<String> = texts(&view)[1..].iter().filter(|l| !l.is_empty()).cloned().collect();
        assert_eq!(body, vec!["alpha beta gamma", "delta epsilon"]);
        assert!(view.lines.iter().all(|l| l.width() <= 17));
    }

    #[test]
    fn test_long_word_is_hard_split() {
        let turns = vec![Turn::assistant("abcdefghijklmnopqrstuvwxyz")];
        let view = render_transcript(&turns, 12, 0, None);
        // bubble floor is 10 columns
        assert_eq!(texts(&view)[1..4], ["abcdefghij", "klmnopqrst", "uvwxyz"]);
    }

    #[test]
    fn test_code_block_is_unwrapped_dark_panel() {
        let long = "x".repeat(60);
        let content = format!("Example:\n\n```python\nprint('hi')\n{}\n```", long);
        let view = render_transcript(&[Turn::assistant(content)], 30, 0, None);
        let all = texts(&view);

        // bubble = 25, inner = 23
        let header_idx = all.iter().position(|l| l.contains("python")).unwrap();
        assert!(all[header_idx].ends_with("▶ "));
        let code = &view.lines[header_idx + 1..header_idx + 3];
        for line in code {
            assert_eq!(line.width(), 25);
            assert_eq!(line.spans[0].style.bg, Some(CODE_PANEL_BG));
        }
        assert_eq!(line_text(&code[0]).trim_end(), " print('hi')");
        assert_eq!(view.max_code_scroll, 60 - 23);
    }

    #[test]
    fn test_code_scroll_shifts_panel_only() {
        let content = "Some prose here\n\n```\n0123456789abcdefghijklmnopqrstuvwxyz\n```";
        let view = render_transcript(&[Turn::assistant(content)], 20, 5, None);
        let all = texts(&view);
        assert_eq!(all[1], "Some prose here");
        let code_line = all.iter().find(|l| l.contains("56789")).unwrap();
        assert!(code_line.starts_with(" 56789abc"));
        let header = all.iter().find(|l| l.contains("code")).unwrap();
        assert!(header.starts_with(" ◀"));
    }

    #[test]
    fn test_inline_code_is_highlighted_inline() {
        let view = render_transcript(&[Turn::assistant("use `cargo` now")], 40, 0, None);
        let line = &view.lines[1];
        assert_eq!(line_text(line), "use cargo now");
        let code_span = line.spans.iter().find(|s| s.content == "cargo").unwrap();
        assert_eq!(code_span.style.bg, Some(INLINE_CODE_BG));
        assert!(line.spans.iter().filter(|s| s.content != "cargo").all(|s| s.style.bg.is_none()));
        assert_eq!(view.max_code_scroll, 0);
    }

    #[test]
    fn test_list_items_are_indented_and_adjacent() {
        let view = render_transcript(&[Turn::assistant("- one\n- two\n  - deep")], 40, 0, None);
        assert_eq!(texts(&view)[1..4], ["• one", "• two", "  • deep"]);
    }

    #[test]
    fn test_wide_characters_stay_inside_bubble() {
        let content = "日本語 説明文です 漢字\n\n```\n漢字漢字漢字漢字漢字漢字漢字漢字漢字\n```";
        // 20 columns -> bubble of 17, code inner of 15
        let view = render_transcript(&[Turn::assistant(content)], 20, 0, None);
        assert!(view.lines.iter().all(|l| l.width() <= 17));

        let all = texts(&view);
        // Nine characters, but seventeen columns on the first line
        assert_eq!(all[1..3], ["日本語 説明文です", "漢字"]);
        let code = view.lines.iter().find(|l| line_text(l).contains("漢字漢字")).unwrap();
        assert_eq!(code.width(), 17);
        // The character cut by the right edge becomes a space
        assert_eq!(line_text(code), " 漢字漢字漢字漢  ");
        assert_eq!(view.max_code_scroll, 36 - 15);
        let header = all.iter().find(|l| l.contains("code")).unwrap();
        assert!(header.ends_with("▶ "));
    }

    #[test]
    fn test_code_scroll_through_wide_character_keeps_columns() {
        let content = "```\n漢字漢字漢字漢字漢字漢字漢字漢字漢字\n```";
        let view = render_transcript(&[Turn::assistant(content)], 20, 1, None);
        let code = view.lines.iter().find(|l| line_text(l).contains("字")).unwrap();
        assert_eq!(code.width(), 17);
        assert!(line_text(code).starts_with("  字漢"));
    }

    #[test]
    fn test_unknown_server_role_renders_as_assistant() {
        let body = r#"{
            "user_message": {"role": "user", "content": "hi"},
            "bot_response": {"role": "bot", "content": "hello"}
        }"#;
        let exchange: chatview_core::ChatExchange = serde_json::from_str(body).unwrap();
        let turns = vec![exchange.user_message, exchange.bot_response];
        let view = render_transcript(&turns, 40, 0, None);

        assert_eq!(texts(&view)[3..5], ["Assistant:", "hello"]);
        assert_eq!(view.lines[4].alignment, Some(Alignment::Left));
    }

    #[test]
    fn test_thinking_indicator() {
        let view = render_transcript(&[], 40, 0, Some(1));
        assert_eq!(texts(&view), vec!["Assistant:", "Thinking.."]);
    }
}
