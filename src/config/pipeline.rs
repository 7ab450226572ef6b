//! Plugin pipeline configuration
//!
//! The pipeline is an explicit, ordered configuration object validated
//! before compilation starts. Unknown identifiers, duplicates, and
//! order violations all fail here, never mid-compilation.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::PipelineConfigError;

/// A text-phase plugin: selects syntax extensions applied while parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextPlugin {
    /// GitHub-flavored Markdown: tables, strikethrough, task lists,
    /// autolink-style extensions
    Gfm,
}

impl TextPlugin {
    pub fn id(&self) -> &'static str {
        match self {
            TextPlugin::Gfm => "gfm",
        }
    }

    fn from_id(id: &str) -> Option<Self> {
        match id {
            "gfm" => Some(TextPlugin::Gfm),
            _ => None,
        }
    }
}

/// A tree-phase plugin: transforms the parsed node tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreePlugin {
    /// Inject stable anchor identifiers into headings
    HeadingSlugs,
    /// Lift `lang:title` info-string annotations into block metadata
    CodeBlockTitles,
    /// Tokenize fenced code for syntax highlighting
    SyntaxHighlight,
}

impl TreePlugin {
    pub fn id(&self) -> &'static str {
        match self {
            TreePlugin::HeadingSlugs => "headingSlugs",
            TreePlugin::CodeBlockTitles => "codeBlockTitles",
            TreePlugin::SyntaxHighlight => "syntaxHighlight",
        }
    }

    fn from_id(id: &str) -> Option<Self> {
        match id {
            "headingSlugs" => Some(TreePlugin::HeadingSlugs),
            "codeBlockTitles" => Some(TreePlugin::CodeBlockTitles),
            "syntaxHighlight" => Some(TreePlugin::SyntaxHighlight),
            _ => None,
        }
    }
}

/// Validated, ordered plugin pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    text_plugins: Vec<TextPlugin>,
    tree_plugins: Vec<TreePlugin>,
}

impl PipelineConfig {
    /// Resolve and validate plugin identifiers for both phases.
    pub fn from_ids<S: AsRef<str>>(
        text: &[S],
        tree: &[S],
    ) -> Result<Self, PipelineConfigError> {
        let mut text_plugins = Vec::with_capacity(text.len());
        for id in text {
            let id = id.as_ref();
            let plugin = TextPlugin::from_id(id).ok_or_else(|| {
                if TreePlugin::from_id(id).is_some() {
                    PipelineConfigError::WrongPhase {
                        id: id.to_string(),
                        actual: "tree",
                        listed: "text",
                    }
                } else {
                    PipelineConfigError::UnknownPlugin(id.to_string())
                }
            })?;
            if text_plugins.contains(&plugin) {
                return Err(PipelineConfigError::Duplicate(id.to_string()));
            }
            text_plugins.push(plugin);
        }

        let mut tree_plugins = Vec::with_capacity(tree.len());
        for id in tree {
            let id = id.as_ref();
            let plugin = TreePlugin::from_id(id).ok_or_else(|| {
                if TextPlugin::from_id(id).is_some() {
                    PipelineConfigError::WrongPhase {
                        id: id.to_string(),
                        actual: "text",
                        listed: "tree",
                    }
                } else {
                    PipelineConfigError::UnknownPlugin(id.to_string())
                }
            })?;
            if tree_plugins.contains(&plugin) {
                return Err(PipelineConfigError::Duplicate(id.to_string()));
            }
            tree_plugins.push(plugin);
        }

        check_order(&tree_plugins)?;

        Ok(Self {
            text_plugins,
            tree_plugins,
        })
    }

    /// Load a pipeline from a TOML file. Identifier resolution and
    /// ordering checks run after deserialization.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read pipeline config {:?}", path))?;
        let raw: RawPipelineConfig = toml::from_str(&content)
            .with_context(|| format!("failed to parse pipeline config {:?}", path))?;
        let config = PipelineConfig::try_from(raw)
            .with_context(|| format!("invalid pipeline config {:?}", path))?;
        Ok(config)
    }

    pub fn text_plugins(&self) -> &[TextPlugin] {
        &self.text_plugins
    }

    pub fn tree_plugins(&self) -> &[TreePlugin] {
        &self.tree_plugins
    }
}

impl Default for PipelineConfig {
    /// The full fixed pipeline: GFM extensions, heading slugs, code
    /// titles, then syntax highlighting.
    fn default() -> Self {
        Self {
            text_plugins: vec![TextPlugin::Gfm],
            tree_plugins: vec![
                TreePlugin::HeadingSlugs,
                TreePlugin::CodeBlockTitles,
                TreePlugin::SyntaxHighlight,
            ],
        }
    }
}

impl fmt::Display for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text: Vec<&str> = self.text_plugins.iter().map(|p| p.id()).collect();
        let tree: Vec<&str> = self.tree_plugins.iter().map(|p| p.id()).collect();
        write!(f, "text: [{}], tree: [{}]", text.join(", "), tree.join(", "))
    }
}

/// Highlighting must see the clean language token, so the title pass
/// has to run first when both are configured.
fn check_order(tree_plugins: &[TreePlugin]) -> Result<(), PipelineConfigError> {
    let titles = tree_plugins
        .iter()
        .position(|p| *p == TreePlugin::CodeBlockTitles);
    let highlight = tree_plugins
        .iter()
        .position(|p| *p == TreePlugin::SyntaxHighlight);

    if let (Some(titles), Some(highlight)) = (titles, highlight) {
        if highlight < titles {
            return Err(PipelineConfigError::InvalidOrder {
                before: "codeBlockTitles",
                after: "syntaxHighlight",
            });
        }
    }
    Ok(())
}

/// Unvalidated pipeline shape as it appears in a config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPipelineConfig {
    #[serde(default)]
    pub text_plugins: Vec<String>,
    #[serde(default)]
    pub tree_plugins: Vec<String>,
}

impl TryFrom<RawPipelineConfig> for PipelineConfig {
    type Error = PipelineConfigError;

    fn try_from(raw: RawPipelineConfig) -> Result<Self, Self::Error> {
        PipelineConfig::from_ids(&raw.text_plugins, &raw.tree_plugins)
    }
}
