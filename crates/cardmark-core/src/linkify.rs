use once_cell::sync::Lazy;
use regex::Regex;

use crate::ast::{Inline, Link, LinkOrigin};

static LINK_CANDIDATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)(?P<url>\b(?:https?|ftp)://[^\s<>"]+)|(?P<email>\b(?:mailto:)?[a-z0-9._%+\-]+@[a-z0-9\-]+(?:\.[a-z0-9\-]+)*\.[a-z]{2,})"#,
    )
    .expect("linkify pattern is valid")
});

const TRAILING_PUNCT: &[char] = &['.', ',', ':', ';', '!', '?', '\'', '*'];

/// Splits a text run into text and bare links.
///
/// Only scheme-qualified URLs and e-mail addresses are recognized; a bare
/// domain such as `example.com` stays text.
pub fn linkify(text: &str) -> Vec<Inline> {
    let mut out = Vec::new();
    let mut last = 0;
    for caps in LINK_CANDIDATE_RE.captures_iter(text) {
        let (start, link) = if let Some(url) = caps.name("url") {
            let trimmed = trim_url(url.as_str());
            if !has_host(trimmed) {
                continue;
            }
            (url.start(), Link::bare(trimmed))
        } else if let Some(email) = caps.name("email") {
            (email.start(), email_link(email.as_str()))
        } else {
            continue;
        };
        if start < last {
            continue;
        }
        push_text(&mut out, &text[last..start]);
        last = start + link_text_len(&link);
        out.push(Inline::Link(link));
    }
    push_text(&mut out, &text[last..]);
    out
}

fn email_link(matched: &str) -> Link {
    let prefixed = matched
        .get(..7)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("mailto:"));
    let href = if prefixed {
        matched.to_string()
    } else {
        format!("mailto:{}", matched)
    };
    Link::new(href, LinkOrigin::Bare, vec![Inline::text(matched)])
}

fn link_text_len(link: &Link) -> usize {
    link.children
        .iter()
        .map(|child| match child {
            Inline::Text(text) => text.len(),
            _ => 0,
        })
        .sum()
}

fn push_text(out: &mut Vec<Inline>, text: &str) {
    if !text.is_empty() {
        out.push(Inline::text(text));
    }
}

/// Drops trailing sentence punctuation and closing brackets that have no
/// opener inside the URL.
fn trim_url(url: &str) -> &str {
    // (opener, closer, open count, close count)
    let mut brackets = [('(', ')', 0usize, 0usize), ('[', ']', 0, 0), ('{', '}', 0, 0)];
    for ch in url.chars() {
        for (open, close, opens, closes) in &mut brackets {
            if ch == *open {
                *opens += 1;
            } else if ch == *close {
                *closes += 1;
            }
        }
    }

    let mut end = url.len();
    while let Some(last) = url[..end].chars().next_back() {
        if !TRAILING_PUNCT.contains(&last) {
            let Some((_, _, opens, closes)) =
                brackets.iter_mut().find(|(_, close, _, _)| *close == last)
            else {
                break;
            };
            if *opens >= *closes {
                break;
            }
            *closes -= 1;
        }
        end -= last.len_utf8();
    }
    &url[..end]
}

fn has_host(url: &str) -> bool {
    url.split_once("://")
        .and_then(|(_, rest)| rest.chars().next())
        .is_some_and(|ch| ch.is_alphanumeric() || ch == '[')
}
