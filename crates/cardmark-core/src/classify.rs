use once_cell::sync::Lazy;
use regex::Regex;

use crate::ast::{Container, EmbedKind, Inline, Link};
use crate::policy::parse_destination;

static STATUS_POST_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^https://(?:www\.|mobile\.)?(?:twitter|x)\.com/[A-Za-z0-9_]{1,15}/status/[0-9]+(?:\?[A-Za-z0-9=&_\-.%]*)?$",
    )
    .expect("status post pattern is valid")
});

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Decision {
    Promote(EmbedKind),
    Keep,
}

/// Decides whether the link at `index` among a paragraph's direct children
/// becomes an embed.
///
/// Anything that is not a bare link sitting alone on its own source line in a
/// top-level paragraph is kept.
pub fn classify(siblings: &[Inline], index: usize, container: Container) -> Decision {
    let Some(Inline::Link(link)) = siblings.get(index) else {
        return Decision::Keep;
    };
    if !link.is_bare() || !container.allows_embeds() {
        return Decision::Keep;
    }
    if let Err(err) = parse_destination(&link.href) {
        tracing::debug!(href = %link.href, error = %err, "bare link is not an embeddable URL");
        return Decision::Keep;
    }
    if !occupies_whole_line(siblings, index) {
        tracing::trace!(href = %link.href, "bare link shares its line with other content");
        return Decision::Keep;
    }
    Decision::Promote(embed_kind(link))
}

/// True when both neighbours are line breaks or paragraph boundaries.
/// An index past the end is never on a line of its own.
pub fn occupies_whole_line(siblings: &[Inline], index: usize) -> bool {
    if index >= siblings.len() {
        return false;
    }
    let preceded = index == 0
        || siblings
            .get(index - 1)
            .is_some_and(Inline::is_line_break);
    let followed = siblings.get(index + 1).is_none_or(Inline::is_line_break);
    preceded && followed
}

pub fn embed_kind(link: &Link) -> EmbedKind {
    if STATUS_POST_RE.is_match(&link.href) {
        EmbedKind::PlatformPost
    } else {
        EmbedKind::GenericCard
    }
}
