mod ast;
mod classify;
mod container;
mod embed;
mod emit;
mod error;
mod linkify;
mod options;
mod parser;
mod policy;
mod render;
mod resolver;

pub use ast::{
    Block, BlockKind, BreakKind, CodeBlock, Container, DetailsBlock, Document, Embed, EmbedKind,
    Footnote, Inline, InlineSeq, LineBreak, Link, LinkAttrs, LinkOrigin, List, ListItem,
    MessageBlock, MessageVariant, Table, TableAlign,
};
pub use classify::{Decision, classify, embed_kind, occupies_whole_line};
pub use container::{Segment, split_containers};
pub use embed::{materialize, promote_paragraph};
pub use emit::{emit_html, normalize_href};
pub use error::{HrefError, OptionsError};
pub use linkify::linkify;
pub use options::{DEFAULT_CARD_PROXY, DEFAULT_TRUSTED_HOST, RenderOptions};
pub use parser::parse;
pub use policy::{REL_UNTRUSTED, TARGET_BLANK, decorate, parse_destination};
pub use render::{Renderer, markdown_to_html};
pub use resolver::resolve;
