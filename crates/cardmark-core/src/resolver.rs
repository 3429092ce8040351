use crate::ast::{Block, BlockKind, Document, Inline};
use crate::embed::promote_paragraph;
use crate::options::RenderOptions;
use crate::policy::decorate;

/// Post-parse passes: link attributes on every anchor, then embed promotion
/// for paragraphs.
///
/// Attributes go first so fallback anchors left behind by promotion carry
/// the same `target`/`rel` an ordinary link would.
pub fn resolve(document: Document, options: &RenderOptions) -> Document {
    let mut document = document;
    decorate_blocks(&mut document.blocks, options);
    for note in &mut document.footnotes {
        decorate_blocks(&mut note.blocks, options);
    }

    if options.embeds {
        promote_blocks(&mut document.blocks);
        for note in &mut document.footnotes {
            promote_blocks(&mut note.blocks);
        }
    }
    document
}

fn decorate_blocks(blocks: &mut [Block], options: &RenderOptions) {
    for block in blocks {
        match &mut block.kind {
            BlockKind::Paragraph { content } => decorate_inlines(content, options),
            BlockKind::Heading { title, .. } => decorate_inlines(title, options),
            BlockKind::List(list) => {
                for item in &mut list.items {
                    decorate_blocks(&mut item.blocks, options);
                }
            }
            BlockKind::BlockQuote { blocks } => decorate_blocks(blocks, options),
            BlockKind::Message(message) => decorate_blocks(&mut message.blocks, options),
            BlockKind::Details(details) => decorate_blocks(&mut details.blocks, options),
            BlockKind::Table(table) => {
                for cell in &mut table.headers {
                    decorate_inlines(cell, options);
                }
                for row in &mut table.rows {
                    for cell in row {
                        decorate_inlines(cell, options);
                    }
                }
            }
            BlockKind::CodeBlock(_) | BlockKind::ThematicBreak => {}
        }
    }
}

fn decorate_inlines(inlines: &mut [Inline], options: &RenderOptions) {
    for inline in inlines {
        match inline {
            Inline::Link(link) => {
                link.attrs = decorate(&link.href, options);
                decorate_inlines(&mut link.children, options);
            }
            Inline::Emph(children)
            | Inline::Strong(children)
            | Inline::Strikethrough(children) => decorate_inlines(children, options),
            _ => {}
        }
    }
}

// Only paragraphs are candidates; the container stamp on each block decides
// whether promotion is allowed there.
fn promote_blocks(blocks: &mut [Block]) {
    for block in blocks {
        let container = block.container;
        match &mut block.kind {
            BlockKind::Paragraph { content } => {
                let taken = std::mem::take(content);
                *content = promote_paragraph(taken, container);
            }
            BlockKind::List(list) => {
                for item in &mut list.items {
                    promote_blocks(&mut item.blocks);
                }
            }
            BlockKind::BlockQuote { blocks } => promote_blocks(blocks),
            BlockKind::Message(message) => promote_blocks(&mut message.blocks),
            BlockKind::Details(details) => promote_blocks(&mut details.blocks),
            BlockKind::Heading { .. }
            | BlockKind::Table(_)
            | BlockKind::CodeBlock(_)
            | BlockKind::ThematicBreak => {}
        }
    }
}
