//! Markdown to UI-agnostic blocks.
//!
//! Front-ends only need to know how to draw a handful of block kinds and a
//! set of inline style flags; everything GitHub-flavoured that pulldown-cmark
//! understands is flattened into those.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

/// Style flags for a run of inline text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InlineStyle {
    pub strong: bool,
    pub emphasis: bool,
    pub strikethrough: bool,
    pub code: bool,
    pub link: bool,
}

/// A run of text sharing one style. A `\n` inside `text` is a hard break.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inline {
    pub text: String,
    pub style: InlineStyle,
}

impl Inline {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: InlineStyle::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(Vec<Inline>),
    Heading {
        level: u8,
        content: Vec<Inline>,
    },
    /// `marker` is empty for continuation paragraphs inside an item
    ListItem {
        depth: usize,
        marker: String,
        content: Vec<Inline>,
    },
    Quote(Vec<Inline>),
    CodeBlock {
        language: Option<String>,
        lines: Vec<String>,
    },
    Rule,
    TableRow {
        cells: Vec<Vec<Inline>>,
        header: bool,
    },
}

#[derive(Default)]
struct BlockBuilder {
    blocks: Vec<Block>,
    inlines: Vec<Inline>,

    strong: usize,
    emphasis: usize,
    strikethrough: usize,
    link: usize,

    heading: Option<u8>,
    quote_depth: usize,
    /// One entry per open list: next number for ordered lists
    lists: Vec<Option<u64>>,
    item_depth: usize,
    pending_marker: Option<String>,

    code: Option<(Option<String>, String)>,
    table_cells: Vec<Vec<Inline>>,
}

impl BlockBuilder {
    fn style(&self) -> InlineStyle {
        InlineStyle {
            strong: self.strong > 0,
            emphasis: self.emphasis > 0,
            strikethrough: self.strikethrough > 0,
            code: false,
            link: self.link > 0,
        }
    }

    fn push_text(&mut self, text: &str, style: InlineStyle) {
        if text.is_empty() {
            return;
        }
        match self.inlines.last_mut() {
            Some(last) if last.style == style => last.text.push_str(text),
            _ => self.inlines.push(Inline {
                text: text.to_string(),
                style,
            }),
        }
    }

    /// Emit whatever inline text has accumulated as the right kind of block
    fn flush(&mut self) {
        if self.inlines.is_empty() && self.pending_marker.is_none() {
            return;
        }
        let content = std::mem::take(&mut self.inlines);

        let block = if let Some(level) = self.heading {
            Block::Heading { level, content }
        } else if let Some(marker) = self.pending_marker.take() {
            Block::ListItem {
                depth: self.item_depth.saturating_sub(1),
                marker,
                content,
            }
        } else if self.item_depth > 0 {
            Block::ListItem {
                depth: self.item_depth - 1,
                marker: String::new(),
                content,
            }
        } else if self.quote_depth > 0 {
            Block::Quote(content)
        } else {
            Block::Paragraph(content)
        };
        self.blocks.push(block);
    }

    fn next_marker(&mut self) -> String {
        match self.lists.last_mut() {
            Some(Some(n)) => {
                let marker = format!("{}.", n);
                *n += 1;
                marker
            }
            _ => "•".to_string(),
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {}
            Tag::Heading { level, .. } => {
                self.flush();
                self.heading = Some(level as u8);
            }
            Tag::BlockQuote { .. } => {
                self.flush();
                self.quote_depth += 1;
            }
            Tag::CodeBlock(kind) => {
                self.flush();
                let language = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(|lang| lang.to_string()),
                    CodeBlockKind::Indented => None,
                };
                self.code = Some((language, String::new()));
            }
            Tag::List(start) => {
                self.flush();
                self.lists.push(start);
            }
            Tag::Item => {
                self.flush();
                self.item_depth += 1;
                self.pending_marker = Some(self.next_marker());
            }
            Tag::FootnoteDefinition(label) => {
                self.flush();
                self.push_text(&format!("[^{}]: ", label), InlineStyle::default());
            }
            Tag::Table(_) => self.flush(),
            Tag::TableCell => self.inlines.clear(),
            Tag::Emphasis => self.emphasis += 1,
            Tag::Strong => self.strong += 1,
            Tag::Strikethrough => self.strikethrough += 1,
            Tag::Link { .. } | Tag::Image { .. } => self.link += 1,
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.flush(),
            TagEnd::Heading(_) => {
                self.flush();
                self.heading = None;
            }
            TagEnd::BlockQuote { .. } => {
                self.flush();
                self.quote_depth = self.quote_depth.saturating_sub(1);
            }
            TagEnd::CodeBlock => {
                if let Some((language, buffer)) = self.code.take() {
                    let lines = buffer.lines().map(|l| l.to_string()).collect();
                    self.blocks.push(Block::CodeBlock { language, lines });
                }
            }
            TagEnd::List(_) => {
                self.flush();
                self.lists.pop();
            }
            TagEnd::Item => {
                self.flush();
                self.item_depth = self.item_depth.saturating_sub(1);
            }
            TagEnd::FootnoteDefinition | TagEnd::HtmlBlock => self.flush(),
            TagEnd::TableCell => {
                let cell = std::mem::take(&mut self.inlines);
                self.table_cells.push(cell);
            }
            TagEnd::TableHead => self.push_row(true),
            TagEnd::TableRow => self.push_row(false),
            TagEnd::Emphasis => self.emphasis = self.emphasis.saturating_sub(1),
            TagEnd::Strong => self.strong = self.strong.saturating_sub(1),
            TagEnd::Strikethrough => self.strikethrough = self.strikethrough.saturating_sub(1),
            TagEnd::Link | TagEnd::Image => self.link = self.link.saturating_sub(1),
            _ => {}
        }
    }

    fn push_row(&mut self, header: bool) {
        let cells = std::mem::take(&mut self.table_cells);
        if !cells.is_empty() {
            self.blocks.push(Block::TableRow { cells, header });
        }
    }

    fn event(&mut self, event: Event<'_>) {
        if self.code.is_some() {
            match event {
                Event::Text(text) => {
                    if let Some((_, buffer)) = self.code.as_mut() {
                        buffer.push_str(&text);
                    }
                }
                Event::End(TagEnd::CodeBlock) => self.end(TagEnd::CodeBlock),
                _ => {}
            }
            return;
        }

        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => self.push_text(&text, self.style()),
            Event::Code(text) => {
                let style = InlineStyle {
                    code: true,
                    ..self.style()
                };
                self.push_text(&text, style);
            }
            Event::Html(html) => {
                // Block HTML arrives line by line; keep the line structure
                if !self.inlines.is_empty() {
                    self.push_text("\n", self.style());
                }
                self.push_text(html.trim_end_matches('\n'), self.style())
            }
            Event::InlineHtml(html) => self.push_text(&html, self.style()),
            Event::FootnoteReference(label) => {
                self.push_text(&format!("[^{}]", label), self.style())
            }
            Event::SoftBreak => self.push_text(" ", self.style()),
            Event::HardBreak => self.push_text("\n", self.style()),
            Event::Rule => {
                self.flush();
                self.blocks.push(Block::Rule);
            }
            Event::TaskListMarker(checked) => {
                let mark = if checked { "[x] " } else { "[ ] " };
                self.push_text(mark, InlineStyle::default());
            }
            _ => {}
        }
    }

    fn finish(mut self) -> Vec<Block> {
        self.flush();
        self.blocks
    }
}

/// Parse GitHub-flavoured Markdown into blocks ready for drawing
pub fn parse_markdown(source: &str) -> Vec<Block> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_FOOTNOTES);

    let mut builder = BlockBuilder::default();
    for event in Parser::new_ext(source, options) {
        builder.event(event);
    }
    builder.finish()
}
