pub type InlineSeq = Vec<Inline>;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    pub blocks: Vec<Block>,
    // Ordered by footnote number; unreferenced definitions are never stored.
    pub footnotes: Vec<Footnote>,
}

impl Document {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty() && self.footnotes.is_empty()
    }
}

/// Nearest container-kind ancestor of a block, stamped when the tree is built.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum Container {
    #[default]
    Root,
    ListItem,
    BlockQuote,
    Message,
    Details,
    Footnote,
}

impl Container {
    /// Only top-level paragraphs may turn bare URLs into embeds.
    pub fn allows_embeds(self) -> bool {
        matches!(self, Container::Root)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    pub container: Container,
    pub kind: BlockKind,
}

impl Block {
    pub fn new(container: Container, kind: BlockKind) -> Self {
        Self { container, kind }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum BlockKind {
    Paragraph { content: InlineSeq },
    Heading { level: u8, title: InlineSeq },
    List(List),
    BlockQuote { blocks: Vec<Block> },
    CodeBlock(CodeBlock),
    Message(MessageBlock),
    Details(DetailsBlock),
    Table(Table),
    ThematicBreak,
}

#[derive(Clone, Debug, PartialEq)]
pub struct List {
    pub ordered: bool,
    pub start: Option<u64>,
    pub tight: bool,
    pub items: Vec<ListItem>,
}

impl List {
    pub fn has_tasks(&self) -> bool {
        self.items.iter().any(|item| item.task.is_some())
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListItem {
    pub blocks: Vec<Block>,
    pub task: Option<bool>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CodeBlock {
    pub lang: Option<String>,
    pub text: String,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MessageVariant {
    Message,
    Alert,
}

impl MessageVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageVariant::Message => "message",
            MessageVariant::Alert => "alert",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MessageBlock {
    pub variant: MessageVariant,
    pub blocks: Vec<Block>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DetailsBlock {
    pub summary: String,
    pub blocks: Vec<Block>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    pub aligns: Vec<TableAlign>,
    pub headers: Vec<InlineSeq>,
    pub rows: Vec<Vec<InlineSeq>>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TableAlign {
    None,
    Left,
    Center,
    Right,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Footnote {
    pub number: usize,
    pub label: String,
    // How many times the footnote is referenced; one back-reference each.
    pub references: usize,
    pub blocks: Vec<Block>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Inline {
    Text(String),
    Emph(InlineSeq),
    Strong(InlineSeq),
    Strikethrough(InlineSeq),
    CodeSpan(String),
    LineBreak(LineBreak),
    Link(Link),
    Image {
        url: String,
        title: Option<String>,
        alt: InlineSeq,
    },
    Embed(Embed),
    FootnoteRef {
        number: usize,
        occurrence: usize,
    },
}

impl Inline {
    pub fn text(value: impl Into<String>) -> Self {
        Inline::Text(value.into())
    }

    pub fn is_line_break(&self) -> bool {
        matches!(self, Inline::LineBreak(_))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BreakKind {
    Soft,
    Hard,
}

/// One literal line boundary inside a paragraph.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LineBreak {
    pub kind: BreakKind,
    pub hidden: bool,
}

impl LineBreak {
    pub fn soft() -> Self {
        Self {
            kind: BreakKind::Soft,
            hidden: false,
        }
    }

    pub fn hard() -> Self {
        Self {
            kind: BreakKind::Hard,
            hidden: false,
        }
    }
}

/// How the parser recognized a link.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LinkOrigin {
    /// A URL written as plain text and picked up by the linkifier.
    Bare,
    /// `<https://...>`
    Angle,
    /// `[text](url)`
    Inline,
    /// `[text][label]`, `[label][]` and `[label]`
    Reference,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LinkAttrs {
    pub target: Option<&'static str>,
    pub rel: Option<&'static str>,
}

impl LinkAttrs {
    pub fn none() -> Self {
        Self::default()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Link {
    pub href: String,
    pub title: Option<String>,
    pub origin: LinkOrigin,
    pub attrs: LinkAttrs,
    /// Fallback anchor kept behind an embed.
    pub hidden: bool,
    pub children: InlineSeq,
}

impl Link {
    pub fn new(href: impl Into<String>, origin: LinkOrigin, children: InlineSeq) -> Self {
        Self {
            href: href.into(),
            title: None,
            origin,
            attrs: LinkAttrs::none(),
            hidden: false,
            children,
        }
    }

    /// A bare URL; its text always equals its href.
    pub fn bare(href: impl Into<String>) -> Self {
        let href = href.into();
        let children = vec![Inline::Text(href.clone())];
        Self::new(href, LinkOrigin::Bare, children)
    }

    pub fn is_bare(&self) -> bool {
        self.origin == LinkOrigin::Bare
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EmbedKind {
    GenericCard,
    PlatformPost,
}

impl EmbedKind {
    /// Wrapper class consumed by the front-end widgets.
    pub fn wrapper_class(self) -> &'static str {
        match self {
            EmbedKind::GenericCard => "embed-zenn-link",
            EmbedKind::PlatformPost => "embed-tweet",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Embed {
    pub kind: EmbedKind,
    pub href: String,
}
