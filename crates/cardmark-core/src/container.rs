use once_cell::sync::Lazy;
use regex::Regex;

use crate::ast::MessageVariant;

static OPEN_FENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^ {0,3}(?P<fence>:{3,})[ \t]*(?P<name>[A-Za-z]+)(?:[ \t]+(?P<params>.*?))?[ \t]*$")
        .expect("container fence pattern is valid")
});
static CLOSE_FENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^ {0,3}(?P<fence>:{3,})[ \t]*$").expect("container close pattern is valid")
});
static CODE_FENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^ {0,3}(?P<fence>`{3,}|~{3,})").expect("code fence pattern is valid")
});

/// A slice of the source: plain markdown, or a `:::` container around more slices.
#[derive(Clone, Debug, PartialEq)]
pub enum Segment {
    Markdown(String),
    Message {
        variant: MessageVariant,
        body: Vec<Segment>,
    },
    Details {
        summary: String,
        body: Vec<Segment>,
    },
}

#[derive(Clone, Debug, PartialEq)]
enum Opener {
    Message(MessageVariant),
    Details(String),
}

/// Deepest container nesting; an opener below it is plain text.
pub const MAX_NESTING: usize = 100;

/// Splits `:::message` and `:::details` containers out of the source.
///
/// An opener's body runs to the first bare fence at least as long as the
/// opener, or to the end of the enclosing body. Inner containers are only
/// looked for inside that body. Fences inside code blocks do not open
/// containers.
pub fn split_containers(source: &str) -> Vec<Segment> {
    let lines: Vec<&str> = source.split_inclusive('\n').collect();
    let mut stack = vec![Frame::new(None, lines.len(), false)];
    let mut pos = 0;

    loop {
        let depth = stack.len().saturating_sub(1);
        let Some(top) = stack.last_mut() else {
            return Vec::new();
        };

        if pos >= top.end {
            let Some(mut frame) = stack.pop() else {
                return Vec::new();
            };
            frame.flush();
            let (Some(opener), Some(parent)) = (frame.opener, stack.last_mut()) else {
                return frame.out;
            };
            if frame.closed {
                pos += 1;
            } else {
                tracing::warn!("`:::` container is never closed, closing it with its parent");
            }
            parent.out.push(opener.into_segment(frame.out));
            continue;
        }

        let line = lines[pos];
        let content = line.trim_end_matches(['\n', '\r']);
        pos += 1;

        if top.in_code(content) {
            top.markdown.push_str(line);
            continue;
        }

        if let Some((opener, fence_len)) = parse_opener(content).filter(|_| depth < MAX_NESTING) {
            let body_end = top.end;
            top.flush();
            let frame = match find_close(&lines[pos..body_end], fence_len) {
                Some(offset) => Frame::new(Some(opener), pos + offset, true),
                None => Frame::new(Some(opener), body_end, false),
            };
            stack.push(frame);
            continue;
        }

        top.markdown.push_str(line);
    }
}

struct Frame {
    opener: Option<Opener>,
    // Index of the first line after the body; the closing fence when `closed`.
    end: usize,
    closed: bool,
    out: Vec<Segment>,
    markdown: String,
    code_fence: Option<(char, usize)>,
}

impl Frame {
    fn new(opener: Option<Opener>, end: usize, closed: bool) -> Self {
        Self {
            opener,
            end,
            closed,
            out: Vec::new(),
            markdown: String::new(),
            code_fence: None,
        }
    }

    /// Tracks fenced code; true when `line` belongs to a code block.
    fn in_code(&mut self, line: &str) -> bool {
        if let Some((ch, len)) = self.code_fence {
            if closes_code_fence(line, ch, len) {
                self.code_fence = None;
            }
            return true;
        }
        if let Some(caps) = CODE_FENCE_RE.captures(line) {
            let fence = &caps["fence"];
            let ch = fence.chars().next().unwrap_or('`');
            self.code_fence = Some((ch, fence.len()));
            return true;
        }
        false
    }

    fn flush(&mut self) {
        if !self.markdown.trim().is_empty() {
            self.out.push(Segment::Markdown(std::mem::take(&mut self.markdown)));
        }
        self.markdown.clear();
    }
}

impl Opener {
    fn into_segment(self, body: Vec<Segment>) -> Segment {
        match self {
            Opener::Message(variant) => Segment::Message { variant, body },
            Opener::Details(summary) => Segment::Details { summary, body },
        }
    }
}

fn find_close(lines: &[&str], fence_len: usize) -> Option<usize> {
    lines.iter().position(|line| {
        let content = line.trim_end_matches(['\n', '\r']);
        CLOSE_FENCE_RE
            .captures(content)
            .is_some_and(|caps| caps["fence"].len() >= fence_len)
    })
}

fn parse_opener(line: &str) -> Option<(Opener, usize)> {
    let caps = OPEN_FENCE_RE.captures(line)?;
    let fence_len = caps["fence"].len();
    let params = caps.name("params").map(|m| m.as_str().trim()).unwrap_or("");
    let opener = match &caps["name"] {
        "message" => {
            let variant = if params == "alert" {
                MessageVariant::Alert
            } else {
                MessageVariant::Message
            };
            Opener::Message(variant)
        }
        "details" if !params.is_empty() => Opener::Details(params.to_string()),
        _ => return None,
    };
    Some((opener, fence_len))
}

fn closes_code_fence(line: &str, ch: char, len: usize) -> bool {
    let trimmed = line.trim_start_matches(' ');
    if line.len() - trimmed.len() > 3 {
        return false;
    }
    let run = trimmed.chars().take_while(|c| *c == ch).count();
    run >= len && trimmed[run * ch.len_utf8()..].trim().is_empty()
}
