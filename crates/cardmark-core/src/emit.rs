use std::borrow::Cow;

use percent_encoding::{AsciiSet, CONTROLS, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::ast::{
    Block, BlockKind, BreakKind, CodeBlock, DetailsBlock, Document, Embed, EmbedKind, Footnote,
    Inline, LineBreak, Link, List, MessageBlock, Table, TableAlign,
};
use crate::options::RenderOptions;

// Characters markdown-it percent-encodes when normalizing a link destination.
const HREF_ENCODE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'[')
    .add(b']')
    .add(b'\\')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

// Same set as JavaScript's encodeURIComponent.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const HIDDEN_STYLE: &str = "display: none";

const MSG_ICON_OPEN: &str = "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 101 101\" role=\"img\" aria-label=\"";
const MSG_ICON_CLOSE: &str = "\" class=\"msg-icon\"><circle cx=\"51\" cy=\"51\" r=\"50\" fill=\"currentColor\"></circle><text x=\"50%\" y=\"50%\" text-anchor=\"middle\" fill=\"#ffffff\" font-size=\"70\" font-weight=\"bold\" dominant-baseline=\"central\">!</text></svg>";

const FOOTNOTES_OPEN: &str = "<section class=\"footnotes\">\n<div class=\"footnotes-title\"><img src=\"https://twemoji.maxcdn.com/2/svg/1f58b.svg\" class=\"emoji footnotes-twemoji\" loading=\"lazy\" width=\"20\" height=\"20\">脚注</div>\n<ol class=\"footnotes-list\">\n";
const FOOTNOTES_CLOSE: &str = "</ol>\n</section>\n";

/// Serializes a document in markdown-it's output layout: one newline after
/// every block-level tag, nothing inside inline content.
pub fn emit_html(document: &Document, options: &RenderOptions) -> String {
    let mut writer = HtmlWriter::new(options);
    for block in &document.blocks {
        writer.block(block);
    }
    if !document.footnotes.is_empty() {
        writer.footnotes(&document.footnotes);
    }
    writer.out
}

struct HtmlWriter<'o> {
    out: String,
    options: &'o RenderOptions,
}

impl<'o> HtmlWriter<'o> {
    fn new(options: &'o RenderOptions) -> Self {
        Self {
            out: String::new(),
            options,
        }
    }

    fn push(&mut self, s: &str) {
        self.out.push_str(s);
    }

    fn ensure_newline(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
    }

    fn block(&mut self, block: &Block) {
        match &block.kind {
            BlockKind::Paragraph { content } => {
                self.push("<p>");
                self.inlines(content);
                self.push("</p>\n");
            }
            BlockKind::Heading { level, title } => {
                self.push(&format!("<h{}>", level));
                self.inlines(title);
                self.push(&format!("</h{}>\n", level));
            }
            BlockKind::BlockQuote { blocks } => {
                self.push("<blockquote>\n");
                for child in blocks {
                    self.block(child);
                }
                self.push("</blockquote>\n");
            }
            BlockKind::List(list) => self.list(list),
            BlockKind::CodeBlock(code) => self.code_block(code),
            BlockKind::Message(message) => self.message(message),
            BlockKind::Details(details) => self.details(details),
            BlockKind::Table(table) => self.table(table),
            BlockKind::ThematicBreak => self.push("<hr>\n"),
        }
    }

    fn list(&mut self, list: &List) {
        let tag = if list.ordered { "ol" } else { "ul" };
        self.push("<");
        self.push(tag);
        if let Some(start) = list.start.filter(|start| *start != 1) {
            self.push(&format!(" start=\"{}\"", start));
        }
        if list.has_tasks() {
            self.push(" class=\"contains-task-list\"");
        }
        self.push(">\n");

        for item in &list.items {
            match item.task {
                Some(_) => self.push("<li class=\"task-list-item enabled\">"),
                None => self.push("<li>"),
            }
            if !list.tight {
                self.push("\n");
            }
            let checkbox = item.task.map(task_checkbox);
            let last = item.blocks.len().saturating_sub(1);
            for (idx, child) in item.blocks.iter().enumerate() {
                let checkbox = if idx == 0 { checkbox } else { None };
                match &child.kind {
                    BlockKind::Paragraph { content } if list.tight => {
                        self.push(checkbox.unwrap_or_default());
                        self.inlines(content);
                        if idx != last {
                            self.push("\n");
                        }
                    }
                    BlockKind::Paragraph { content } => {
                        self.push("<p>");
                        self.push(checkbox.unwrap_or_default());
                        self.inlines(content);
                        self.push("</p>\n");
                    }
                    _ => {
                        self.ensure_newline();
                        self.block(child);
                    }
                }
            }
            self.push("</li>\n");
        }

        self.push("</");
        self.push(tag);
        self.push(">\n");
    }

    fn code_block(&mut self, code: &CodeBlock) {
        match &code.lang {
            Some(lang) => {
                self.push("<pre><code class=\"language-");
                self.push(&escape_html(lang));
                self.push("\">");
            }
            None => self.push("<pre><code>"),
        }
        self.push(&escape_html(&code.text));
        self.push("</code></pre>\n");
    }

    fn message(&mut self, message: &MessageBlock) {
        let variant = message.variant.as_str();
        self.push(&format!("<aside class=\"msg {}\">", variant));
        self.push(MSG_ICON_OPEN);
        self.push(variant);
        self.push(MSG_ICON_CLOSE);
        self.push("<div class=\"msg-content\">");
        for child in &message.blocks {
            self.block(child);
        }
        self.push("</div></aside>\n");
    }

    fn details(&mut self, details: &DetailsBlock) {
        self.push("<details><summary>");
        self.push(&escape_html(&details.summary));
        self.push("</summary><div class=\"details-content\">");
        for child in &details.blocks {
            self.block(child);
        }
        self.push("</div></details>\n");
    }

    fn table(&mut self, table: &Table) {
        self.push("<table>\n<thead>\n<tr>\n");
        for (idx, cell) in table.headers.iter().enumerate() {
            self.table_cell("th", table.aligns.get(idx).copied(), cell);
        }
        self.push("</tr>\n</thead>\n");
        if !table.rows.is_empty() {
            self.push("<tbody>\n");
            for row in &table.rows {
                self.push("<tr>\n");
                for (idx, cell) in row.iter().enumerate() {
                    self.table_cell("td", table.aligns.get(idx).copied(), cell);
                }
                self.push("</tr>\n");
            }
            self.push("</tbody>\n");
        }
        self.push("</table>\n");
    }

    fn table_cell(&mut self, tag: &str, align: Option<TableAlign>, content: &[Inline]) {
        let style = match align {
            Some(TableAlign::Left) => " style=\"text-align:left\"",
            Some(TableAlign::Center) => " style=\"text-align:center\"",
            Some(TableAlign::Right) => " style=\"text-align:right\"",
            Some(TableAlign::None) | None => "",
        };
        self.push(&format!("<{}{}>", tag, style));
        self.inlines(content);
        self.push(&format!("</{}>\n", tag));
    }

    fn footnotes(&mut self, footnotes: &[Footnote]) {
        self.push(FOOTNOTES_OPEN);
        for note in footnotes {
            self.push(&format!(
                "<li id=\"fn{}\" class=\"footnote-item\">",
                note.number
            ));
            let backrefs = footnote_backrefs(note);
            let last_paragraph = note
                .blocks
                .iter()
                .rposition(|block| matches!(block.kind, BlockKind::Paragraph { .. }));
            for (idx, child) in note.blocks.iter().enumerate() {
                match &child.kind {
                    BlockKind::Paragraph { content } if Some(idx) == last_paragraph => {
                        self.push("<p>");
                        self.inlines(content);
                        self.push(" ");
                        self.push(&backrefs);
                        self.push("</p>\n");
                    }
                    _ => self.block(child),
                }
            }
            if last_paragraph.is_none() {
                self.push(&backrefs);
                self.push("\n");
            }
            self.push("</li>\n");
        }
        self.push(FOOTNOTES_CLOSE);
    }

    fn inlines(&mut self, inlines: &[Inline]) {
        for inline in inlines {
            self.inline(inline);
        }
    }

    fn inline(&mut self, inline: &Inline) {
        match inline {
            Inline::Text(text) => self.push(&escape_html(text)),
            Inline::Emph(children) => self.wrapped("em", children),
            Inline::Strong(children) => self.wrapped("strong", children),
            Inline::Strikethrough(children) => self.wrapped("s", children),
            Inline::CodeSpan(code) => {
                self.push("<code>");
                self.push(&escape_html(code));
                self.push("</code>");
            }
            Inline::LineBreak(line_break) => self.line_break(*line_break),
            Inline::Link(link) => self.link(link),
            Inline::Image { url, title, alt } => {
                self.push("<img src=\"");
                self.push(&escape_html(&normalize_href(url)));
                self.push("\" alt=\"");
                self.push(&escape_html(&plain_text(alt)));
                self.push("\"");
                if let Some(title) = title {
                    self.push(" title=\"");
                    self.push(&escape_html(title));
                    self.push("\"");
                }
                self.push(">");
            }
            Inline::Embed(embed) => self.embed(embed),
            Inline::FootnoteRef { number, occurrence } => {
                self.push(&format!(
                    "<sup class=\"footnote-ref\"><a href=\"#fn{}\" id=\"{}\">[{}]</a></sup>",
                    number,
                    footnote_ref_id(*number, *occurrence),
                    number
                ));
            }
        }
    }

    fn wrapped(&mut self, tag: &str, children: &[Inline]) {
        self.push(&format!("<{}>", tag));
        self.inlines(children);
        self.push(&format!("</{}>", tag));
    }

    fn line_break(&mut self, line_break: LineBreak) {
        if line_break.hidden {
            self.push("<br style=\"display: none\">\n");
            return;
        }
        match line_break.kind {
            BreakKind::Soft if !self.options.breaks => self.push("\n"),
            BreakKind::Soft | BreakKind::Hard => self.push("<br>\n"),
        }
    }

    fn link(&mut self, link: &Link) {
        self.push("<a href=\"");
        self.push(&escape_html(&normalize_href(&link.href)));
        self.push("\"");
        if let Some(title) = &link.title {
            self.push(" title=\"");
            self.push(&escape_html(title));
            self.push("\"");
        }
        if link.hidden {
            self.push(" style=\"");
            self.push(HIDDEN_STYLE);
            self.push("\"");
        }
        if let Some(target) = link.attrs.target {
            self.push(" target=\"");
            self.push(target);
            self.push("\"");
        }
        if let Some(rel) = link.attrs.rel {
            self.push(" rel=\"");
            self.push(rel);
            self.push("\"");
        }
        self.push(">");
        self.inlines(&link.children);
        self.push("</a>");
    }

    fn embed(&mut self, embed: &Embed) {
        self.push("<div class=\"");
        self.push(embed.kind.wrapper_class());
        self.push("\">");
        match embed.kind {
            EmbedKind::GenericCard => {
                let encoded = utf8_percent_encode(&embed.href, URI_COMPONENT).to_string();
                let src = self.options.card_src(&encoded);
                self.push("<iframe src=\"");
                self.push(&escape_html(&src));
                self.push("\" frameborder=\"0\" scrolling=\"no\" loading=\"lazy\"></iframe>");
            }
            EmbedKind::PlatformPost => {
                // Status-post hrefs are restricted to URL-safe characters, so the
                // widget gets them exactly as written.
                self.push("<embed-tweet src=\"");
                self.push(&embed.href);
                self.push("\"></embed-tweet>");
            }
        }
        self.push("</div>");
    }
}

fn task_checkbox(checked: bool) -> &'static str {
    if checked {
        "<input class=\"task-list-item-checkbox\" checked=\"\" type=\"checkbox\"> "
    } else {
        "<input class=\"task-list-item-checkbox\" type=\"checkbox\"> "
    }
}

fn footnote_ref_id(number: usize, occurrence: usize) -> String {
    if occurrence == 0 {
        format!("fnref{}", number)
    } else {
        format!("fnref{}:{}", number, occurrence)
    }
}

fn footnote_backrefs(note: &Footnote) -> String {
    (0..note.references.max(1))
        .map(|occurrence| {
            format!(
                "<a href=\"#{}\" class=\"footnote-backref\">\u{21a9}\u{fe0e}</a>",
                footnote_ref_id(note.number, occurrence)
            )
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn plain_text(inlines: &[Inline]) -> String {
    let mut out = String::new();
    for inline in inlines {
        match inline {
            Inline::Text(text) | Inline::CodeSpan(text) => out.push_str(text),
            Inline::Emph(children)
            | Inline::Strong(children)
            | Inline::Strikethrough(children) => out.push_str(&plain_text(children)),
            Inline::Link(link) => out.push_str(&plain_text(&link.children)),
            Inline::Image { alt, .. } => out.push_str(&plain_text(alt)),
            Inline::LineBreak(_) => out.push('\n'),
            Inline::Embed(_) | Inline::FootnoteRef { .. } => {}
        }
    }
    out
}

/// Percent-encodes characters that may not appear raw in a link destination,
/// leaving existing `%XX` escapes alone.
pub fn normalize_href(href: &str) -> Cow<'_, str> {
    utf8_percent_encode(href, HREF_ENCODE).into()
}

fn escape_html(text: &str) -> Cow<'_, str> {
    html_escape::encode_double_quoted_attribute(text)
}
