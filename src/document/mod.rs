//! Document model - the render-ready output of compilation

mod meta;
mod node;

pub use meta::{CodeBlockRef, Degradation, DocumentMeta, HeadingRef};
pub use node::{
    inline_text, Alignment, Block, BlockKind, CodeBlock, HighlightSpan, Inline, ListItem, Table,
    TokenStyle,
};

use serde::{Deserialize, Serialize};

/// The output of compilation: a tree of block nodes plus structural
/// metadata. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledDocument {
    pub blocks: Vec<Block>,
    pub meta: DocumentMeta,
}

impl CompiledDocument {
    /// Serialize to compact JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Rehydrate a document from its JSON serialization
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
