use crate::ast::{Container, Embed, EmbedKind, Inline, InlineSeq, Link};
use crate::classify::{Decision, classify};

/// Replaces a promoted link with its embed and a hidden copy of the anchor.
pub fn materialize(link: Link, kind: EmbedKind) -> [Inline; 2] {
    let embed = Embed {
        kind,
        href: link.href.clone(),
    };
    let fallback = Link {
        hidden: true,
        ..link
    };
    [Inline::Embed(embed), Inline::Link(fallback)]
}

/// Rebuilds a paragraph's children with every standalone bare link promoted.
///
/// Decisions are taken against the original sequence before anything is
/// replaced. A line break touching a promoted link on either side is hidden.
pub fn promote_paragraph(content: InlineSeq, container: Container) -> InlineSeq {
    let decisions: Vec<Decision> = (0..content.len())
        .map(|idx| classify(&content, idx, container))
        .collect();
    let promoted = |idx: usize| matches!(decisions.get(idx), Some(Decision::Promote(_)));
    if !(0..decisions.len()).any(promoted) {
        return content;
    }

    let mut out = Vec::with_capacity(content.len() + decisions.len());
    for (idx, inline) in content.into_iter().enumerate() {
        match (inline, decisions[idx]) {
            (Inline::Link(link), Decision::Promote(kind)) => {
                tracing::debug!(href = %link.href, ?kind, "promoting bare link to embed");
                out.extend(materialize(link, kind));
            }
            (Inline::LineBreak(mut line_break), _) => {
                let touches_embed = (idx > 0 && promoted(idx - 1)) || promoted(idx + 1);
                line_break.hidden |= touches_embed;
                out.push(Inline::LineBreak(line_break));
            }
            (inline, _) => out.push(inline),
        }
    }
    out
}
