use std::collections::HashMap;

use once_cell::sync::Lazy;
use pulldown_cmark::{Alignment, CodeBlockKind, Event, LinkType, Options, Parser, Tag, TagEnd};
use regex::Regex;

use crate::ast::{
    Block, BlockKind, CodeBlock, Container, DetailsBlock, Document, Footnote, Inline, InlineSeq,
    LineBreak, Link, LinkAttrs, LinkOrigin, List, ListItem, MessageBlock, Table, TableAlign,
};
use crate::container::{MAX_NESTING, Segment, split_containers};
use crate::linkify::linkify;
use crate::options::RenderOptions;

static HTML_COMMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").expect("comment pattern is valid"));

/// Builds the document tree for `source`.
///
/// Block and inline grammar comes from pulldown-cmark; `:::` containers are
/// split out beforehand and every block is stamped with its nearest container.
pub fn parse(source: &str, options: &RenderOptions) -> Document {
    let segments = split_containers(source);
    let mut builder = TreeBuilder::new(options.linkify);
    let blocks = builder.segments(&segments, Container::Root);
    builder.finish(blocks)
}

fn markdown_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
}

struct EventCursor<'e, 'a> {
    events: &'e [Event<'a>],
    pos: usize,
}

impl<'e, 'a> EventCursor<'e, 'a> {
    fn peek(&self) -> Option<&'e Event<'a>> {
        self.events.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&'e Event<'a>> {
        self.events.get(self.pos + offset)
    }

    fn next(&mut self) -> Option<&'e Event<'a>> {
        let event = self.events.get(self.pos);
        if event.is_some() {
            self.pos += 1;
        }
        event
    }

    fn advance(&mut self) {
        self.pos += 1;
    }
}

struct BlockSeq {
    blocks: Vec<Block>,
    // An explicit paragraph was seen, which pulldown only emits for loose lists.
    loose: bool,
}

struct TreeBuilder {
    linkify: bool,
    link_depth: usize,
    // Open blocks and inline wrappers; past `MAX_NESTING` wrappers are dropped
    // and their content joins the enclosing level.
    depth: usize,
    footnote_numbers: HashMap<String, usize>,
    footnote_labels: Vec<String>,
    footnote_refs: Vec<usize>,
    footnote_defs: HashMap<String, Vec<Block>>,
}

impl TreeBuilder {
    fn new(linkify: bool) -> Self {
        Self {
            linkify,
            link_depth: 0,
            depth: 0,
            footnote_numbers: HashMap::new(),
            footnote_labels: Vec::new(),
            footnote_refs: Vec::new(),
            footnote_defs: HashMap::new(),
        }
    }

    fn nested<T>(&mut self, read: impl FnOnce(&mut Self) -> T) -> T {
        self.depth += 1;
        let out = read(self);
        self.depth -= 1;
        out
    }

    fn at_limit(&self) -> bool {
        self.depth >= MAX_NESTING
    }

    fn finish(mut self, blocks: Vec<Block>) -> Document {
        let mut footnotes = Vec::new();
        for (idx, label) in self.footnote_labels.iter().enumerate() {
            if let Some(body) = self.footnote_defs.remove(&footnote_key(label)) {
                footnotes.push(Footnote {
                    number: idx + 1,
                    label: label.clone(),
                    references: self.footnote_refs[idx],
                    blocks: body,
                });
            }
        }
        Document { blocks, footnotes }
    }

    fn segments(&mut self, segments: &[Segment], container: Container) -> Vec<Block> {
        let mut blocks = Vec::new();
        for segment in segments {
            match segment {
                Segment::Markdown(text) => {
                    let events: Vec<Event<'_>> =
                        Parser::new_ext(text, markdown_options()).collect();
                    let mut cursor = EventCursor {
                        events: &events,
                        pos: 0,
                    };
                    blocks.extend(self.blocks(&mut cursor, container).blocks);
                }
                Segment::Message { variant, body } => {
                    let inner = self.nested(|builder| builder.segments(body, Container::Message));
                    blocks.push(Block::new(
                        container,
                        BlockKind::Message(MessageBlock {
                            variant: *variant,
                            blocks: inner,
                        }),
                    ));
                }
                Segment::Details { summary, body } => {
                    let inner = self.nested(|builder| builder.segments(body, Container::Details));
                    blocks.push(Block::new(
                        container,
                        BlockKind::Details(DetailsBlock {
                            summary: summary.clone(),
                            blocks: inner,
                        }),
                    ));
                }
            }
        }
        blocks
    }

    /// Reads blocks up to and including the end tag of the enclosing element.
    fn blocks(&mut self, cursor: &mut EventCursor<'_, '_>, container: Container) -> BlockSeq {
        let mut blocks = Vec::new();
        let mut loose = false;
        let mut flattened = 0usize;

        while let Some(event) = cursor.peek() {
            match event {
                Event::End(_) => {
                    cursor.advance();
                    if flattened == 0 {
                        break;
                    }
                    flattened -= 1;
                }
                Event::Start(Tag::BlockQuote(_) | Tag::List(_) | Tag::Item) if self.at_limit() => {
                    cursor.advance();
                    flattened += 1;
                }
                Event::Start(Tag::Paragraph) => {
                    cursor.advance();
                    loose = true;
                    let content = self.inlines(cursor, false);
                    blocks.push(Block::new(container, BlockKind::Paragraph { content }));
                }
                Event::Start(Tag::Heading { level, .. }) => {
                    let level = *level as u8;
                    cursor.advance();
                    let title = self.inlines(cursor, false);
                    blocks.push(Block::new(container, BlockKind::Heading { level, title }));
                }
                Event::Start(Tag::BlockQuote(_)) => {
                    cursor.advance();
                    let inner =
                        self.nested(|builder| builder.blocks(cursor, Container::BlockQuote).blocks);
                    blocks.push(Block::new(container, BlockKind::BlockQuote { blocks: inner }));
                }
                Event::Start(Tag::CodeBlock(kind)) => {
                    let lang = match kind {
                        CodeBlockKind::Fenced(info) => {
                            info.split_whitespace().next().map(str::to_string)
                        }
                        CodeBlockKind::Indented => None,
                    };
                    cursor.advance();
                    let text = raw_text(cursor);
                    blocks.push(Block::new(
                        container,
                        BlockKind::CodeBlock(CodeBlock { lang, text }),
                    ));
                }
                Event::Start(Tag::HtmlBlock) => {
                    cursor.advance();
                    let raw = raw_text(cursor);
                    let content = self.html_as_text(&raw);
                    if !content.is_empty() {
                        blocks.push(Block::new(container, BlockKind::Paragraph { content }));
                    }
                }
                Event::Start(Tag::List(start)) => {
                    let start = *start;
                    cursor.advance();
                    let list = self.nested(|builder| builder.list(cursor, start));
                    blocks.push(Block::new(container, BlockKind::List(list)));
                }
                Event::Start(Tag::FootnoteDefinition(label)) => {
                    let key = footnote_key(label);
                    cursor.advance();
                    let body = self.blocks(cursor, Container::Footnote).blocks;
                    self.footnote_defs.entry(key).or_insert(body);
                }
                Event::Start(Tag::Table(aligns)) => {
                    let aligns = aligns.iter().map(table_align).collect();
                    cursor.advance();
                    let table = self.table(cursor, aligns);
                    blocks.push(Block::new(container, BlockKind::Table(table)));
                }
                Event::Rule => {
                    cursor.advance();
                    blocks.push(Block::new(container, BlockKind::ThematicBreak));
                }
                Event::TaskListMarker(_) => cursor.advance(),
                Event::Start(tag) if !is_inline_tag(tag) => {
                    cursor.advance();
                    skip_to_end(cursor);
                }
                _ => {
                    // Tight list items carry their inline content without a paragraph.
                    let content = self.inlines(cursor, true);
                    if !content.is_empty() {
                        blocks.push(Block::new(container, BlockKind::Paragraph { content }));
                    }
                }
            }
        }

        BlockSeq { blocks, loose }
    }

    fn list(&mut self, cursor: &mut EventCursor<'_, '_>, start: Option<u64>) -> List {
        let mut items = Vec::new();
        let mut tight = true;
        while let Some(event) = cursor.next() {
            match event {
                Event::Start(Tag::Item) => {
                    let task = match (cursor.peek(), cursor.peek_at(1)) {
                        (Some(Event::TaskListMarker(checked)), _) => {
                            cursor.advance();
                            Some(*checked)
                        }
                        (Some(Event::Start(Tag::Paragraph)), Some(Event::TaskListMarker(checked))) => {
                            Some(*checked)
                        }
                        _ => None,
                    };
                    let seq = self.blocks(cursor, Container::ListItem);
                    tight &= !seq.loose;
                    items.push(ListItem {
                        blocks: seq.blocks,
                        task,
                    });
                }
                Event::End(_) => break,
                _ => {}
            }
        }
        List {
            ordered: start.is_some(),
            start,
            tight,
            items,
        }
    }

    fn table(&mut self, cursor: &mut EventCursor<'_, '_>, aligns: Vec<TableAlign>) -> Table {
        let mut headers = Vec::new();
        let mut rows = Vec::new();
        while let Some(event) = cursor.next() {
            match event {
                Event::Start(Tag::TableHead) => headers = self.table_cells(cursor),
                Event::Start(Tag::TableRow) => rows.push(self.table_cells(cursor)),
                Event::End(TagEnd::Table) => break,
                _ => {}
            }
        }
        Table {
            aligns,
            headers,
            rows,
        }
    }

    fn table_cells(&mut self, cursor: &mut EventCursor<'_, '_>) -> Vec<InlineSeq> {
        let mut cells = Vec::new();
        while let Some(event) = cursor.next() {
            match event {
                Event::Start(Tag::TableCell) => cells.push(self.inlines(cursor, false)),
                Event::End(_) => break,
                _ => {}
            }
        }
        cells
    }

    /// Reads inline content. An explicit run consumes its closing tag; an
    /// implicit one stops in front of the next block-level event.
    fn inlines(&mut self, cursor: &mut EventCursor<'_, '_>, implicit: bool) -> InlineSeq {
        let mut seq = InlineBuf::new(self.linkify && self.link_depth == 0);
        let mut flattened = 0usize;

        while let Some(event) = cursor.peek() {
            match event {
                Event::End(_) if flattened > 0 => {
                    cursor.advance();
                    flattened -= 1;
                    continue;
                }
                Event::End(_) => {
                    if !implicit {
                        cursor.advance();
                    }
                    break;
                }
                Event::Start(tag) if implicit && !is_inline_tag(tag) => break,
                Event::Rule | Event::TaskListMarker(_) if implicit => break,
                _ => cursor.advance(),
            }

            match event {
                Event::Text(text) => seq.push_text(text),
                Event::Code(code) => seq.push(Inline::CodeSpan(code.to_string())),
                Event::SoftBreak => seq.push(Inline::LineBreak(LineBreak::soft())),
                Event::HardBreak => seq.push(Inline::LineBreak(LineBreak::hard())),
                // Raw HTML is shown as text, comments are dropped.
                Event::Html(raw) | Event::InlineHtml(raw) => {
                    seq.push_text(&HTML_COMMENT_RE.replace_all(raw, ""))
                }
                Event::FootnoteReference(label) => seq.push(self.footnote_ref(label)),
                Event::Start(_) if self.at_limit() => flattened += 1,
                Event::Start(tag) => {
                    let inlines = self.nested(|builder| builder.inline_tag(tag, cursor));
                    seq.extend(inlines);
                }
                _ => {}
            }
        }

        seq.finish()
    }

    fn inline_tag(&mut self, tag: &Tag<'_>, cursor: &mut EventCursor<'_, '_>) -> InlineSeq {
        match tag {
            Tag::Emphasis => vec![Inline::Emph(self.inlines(cursor, false))],
            Tag::Strong => vec![Inline::Strong(self.inlines(cursor, false))],
            Tag::Strikethrough => vec![Inline::Strikethrough(self.inlines(cursor, false))],
            Tag::Link {
                link_type,
                dest_url,
                title,
                ..
            } => {
                let (origin, href) = match link_type {
                    LinkType::Autolink => (LinkOrigin::Angle, dest_url.to_string()),
                    LinkType::Email => (LinkOrigin::Angle, format!("mailto:{}", dest_url)),
                    LinkType::Inline => (LinkOrigin::Inline, dest_url.to_string()),
                    _ => (LinkOrigin::Reference, dest_url.to_string()),
                };
                let children = self.nested_in_link(cursor);
                vec![Inline::Link(Link {
                    href,
                    title: non_empty(title),
                    origin,
                    attrs: LinkAttrs::none(),
                    hidden: false,
                    children,
                })]
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                let alt = self.nested_in_link(cursor);
                vec![Inline::Image {
                    url: dest_url.to_string(),
                    title: non_empty(title),
                    alt,
                }]
            }
            // Unknown inline wrappers keep their content.
            _ => self.inlines(cursor, false),
        }
    }

    fn nested_in_link(&mut self, cursor: &mut EventCursor<'_, '_>) -> InlineSeq {
        self.link_depth += 1;
        let children = self.inlines(cursor, false);
        self.link_depth -= 1;
        children
    }

    fn html_as_text(&mut self, raw: &str) -> InlineSeq {
        let stripped = HTML_COMMENT_RE.replace_all(raw, "");
        let mut seq = InlineBuf::new(self.linkify && self.link_depth == 0);
        for (idx, line) in stripped.trim_end().lines().enumerate() {
            if idx > 0 {
                seq.push(Inline::LineBreak(LineBreak::soft()));
            }
            seq.push_text(line);
        }
        seq.finish()
    }

    fn footnote_ref(&mut self, label: &str) -> Inline {
        let key = footnote_key(label);
        let number = match self.footnote_numbers.get(&key) {
            Some(number) => *number,
            None => {
                self.footnote_labels.push(label.to_string());
                self.footnote_refs.push(0);
                let number = self.footnote_labels.len();
                self.footnote_numbers.insert(key, number);
                number
            }
        };
        let occurrence = self.footnote_refs[number - 1];
        self.footnote_refs[number - 1] += 1;
        Inline::FootnoteRef { number, occurrence }
    }
}

/// Collects inline nodes, merging adjacent text so the linkifier sees whole runs.
struct InlineBuf {
    out: InlineSeq,
    text: String,
    linkify: bool,
}

impl InlineBuf {
    fn new(linkify: bool) -> Self {
        Self {
            out: Vec::new(),
            text: String::new(),
            linkify,
        }
    }

    fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    fn push(&mut self, inline: Inline) {
        self.flush();
        self.out.push(inline);
    }

    fn extend(&mut self, inlines: InlineSeq) {
        self.flush();
        self.out.extend(inlines);
    }

    fn flush(&mut self) {
        if self.text.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.text);
        if self.linkify {
            self.out.extend(linkify(&text));
        } else {
            self.out.push(Inline::Text(text));
        }
    }

    fn finish(mut self) -> InlineSeq {
        self.flush();
        self.out
    }
}

fn raw_text(cursor: &mut EventCursor<'_, '_>) -> String {
    let mut text = String::new();
    while let Some(event) = cursor.next() {
        match event {
            Event::Text(chunk) | Event::Html(chunk) => text.push_str(chunk),
            Event::End(_) => break,
            _ => {}
        }
    }
    text
}

fn skip_to_end(cursor: &mut EventCursor<'_, '_>) {
    let mut depth = 1usize;
    while let Some(event) = cursor.next() {
        match event {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            _ => {}
        }
    }
}

fn is_inline_tag(tag: &Tag<'_>) -> bool {
    matches!(
        tag,
        Tag::Emphasis
            | Tag::Strong
            | Tag::Strikethrough
            | Tag::Link { .. }
            | Tag::Image { .. }
    )
}

fn table_align(align: &Alignment) -> TableAlign {
    match align {
        Alignment::None => TableAlign::None,
        Alignment::Left => TableAlign::Left,
        Alignment::Center => TableAlign::Center,
        Alignment::Right => TableAlign::Right,
    }
}

fn footnote_key(label: &str) -> String {
    label.to_lowercase()
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}
