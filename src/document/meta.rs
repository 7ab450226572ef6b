//! Side-channel metadata accumulated during compilation

use std::fmt;

use serde::{Deserialize, Serialize};

/// Structural metadata for a compiled document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMeta {
    /// Headings in document order
    pub headings: Vec<HeadingRef>,
    /// Code blocks in document order
    pub code_blocks: Vec<CodeBlockRef>,
    /// Non-fatal plugin degradations observed while compiling
    pub degradations: Vec<Degradation>,
}

/// A heading with its generated anchor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadingRef {
    pub level: u8,
    pub id: Option<String>,
    pub text: String,
}

/// Language and title of a code block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeBlockRef {
    pub language: Option<String>,
    pub title: Option<String>,
}

/// A plugin that could not fully apply. The affected node loses only the
/// metadata that plugin would have added; compilation continues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Degradation {
    /// Code fence declared a language no syntax definition matches
    UnknownLanguage { language: String },
    /// Info string carried a title annotation with an empty title
    AmbiguousTitle { info: String },
    /// The highlighter failed on a block of this language
    HighlightFailed { language: String },
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Degradation::UnknownLanguage { language } => {
                write!(f, "unrecognized code language `{}`", language)
            }
            Degradation::AmbiguousTitle { info } => {
                write!(f, "ambiguous title annotation in info string `{}`", info)
            }
            Degradation::HighlightFailed { language } => {
                write!(f, "highlighting failed for language `{}`", language)
            }
        }
    }
}
