//! Block and inline nodes of a compiled document

use serde::{Deserialize, Serialize};

/// A block-level node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Paragraph {
        content: Vec<Inline>,
    },
    Heading {
        level: u8,
        /// Anchor identifier, filled in by the heading-slug pass
        id: Option<String>,
        content: Vec<Inline>,
    },
    CodeBlock(CodeBlock),
    Quote {
        content: Vec<Block>,
    },
    List {
        ordered: bool,
        start: Option<u64>,
        items: Vec<ListItem>,
    },
    Table(Table),
    Rule,
    Html {
        html: String,
    },
}

/// Discriminant used to key per-node rendering overrides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Paragraph,
    Heading,
    CodeBlock,
    Quote,
    List,
    Table,
    Rule,
    Html,
}

impl Block {
    pub fn kind(&self) -> BlockKind {
        match self {
            Block::Paragraph { .. } => BlockKind::Paragraph,
            Block::Heading { .. } => BlockKind::Heading,
            Block::CodeBlock(_) => BlockKind::CodeBlock,
            Block::Quote { .. } => BlockKind::Quote,
            Block::List { .. } => BlockKind::List,
            Block::Table(_) => BlockKind::Table,
            Block::Rule => BlockKind::Rule,
            Block::Html { .. } => BlockKind::Html,
        }
    }
}

/// A fenced or indented code block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeBlock {
    /// Declared language, taken from the fence info string
    pub language: Option<String>,
    /// Title lifted out of the info string by the code-title pass
    pub title: Option<String>,
    /// Verbatim code content
    pub code: String,
    /// Highlight tokens, filled in by the syntax-highlight pass
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<Vec<HighlightSpan>>,
}

/// One item of an ordered or unordered list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    /// Some(_) for task-list items
    pub checked: Option<bool>,
    pub content: Vec<Block>,
}

/// A table with per-column alignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub alignments: Vec<Alignment>,
    /// Header cells, one per column
    pub header: Vec<Vec<Inline>>,
    /// Body rows, each a list of cells
    pub rows: Vec<Vec<Vec<Inline>>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    None,
    Left,
    Center,
    Right,
}

/// An inline node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inline {
    Text {
        text: String,
    },
    Code {
        code: String,
    },
    Emphasis {
        content: Vec<Inline>,
    },
    Strong {
        content: Vec<Inline>,
    },
    Strikethrough {
        content: Vec<Inline>,
    },
    Link {
        url: String,
        title: Option<String>,
        content: Vec<Inline>,
    },
    Image {
        url: String,
        title: Option<String>,
        alt: Vec<Inline>,
    },
    Html {
        html: String,
    },
    SoftBreak,
    HardBreak,
}

/// A single highlighted token of a code block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightSpan {
    pub text: String,
    pub style: TokenStyle,
}

/// Style classification attached to a highlight token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenStyle {
    /// Foreground color as `#rrggbb`
    pub color: String,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

/// Concatenate the plain text of a run of inline nodes
pub fn inline_text(content: &[Inline]) -> String {
    let mut out = String::new();
    collect_text(content, &mut out);
    out
}

fn collect_text(content: &[Inline], out: &mut String) {
    for inline in content {
        match inline {
            Inline::Text { text } => out.push_str(text),
            Inline::Code { code } => out.push_str(code),
            Inline::Emphasis { content }
            | Inline::Strong { content }
            | Inline::Strikethrough { content }
            | Inline::Link { content, .. } => collect_text(content, out),
            Inline::Image { alt, .. } => collect_text(alt, out),
            Inline::SoftBreak | Inline::HardBreak => out.push(' '),
            Inline::Html { .. } => {}
        }
    }
}
