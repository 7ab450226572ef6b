//! Content compiler - parses Markdown/MDX and runs the plugin pipeline
//!
//! Compilation is a pure function of (source text, pipeline config):
//! the compiler holds only immutable syntax and theme assets, caches
//! nothing across calls, and may be shared freely between threads.

mod highlight;
mod parser;
mod slugs;
mod titles;

use pulldown_cmark::Options;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::SyntaxSet;

use crate::config::{PipelineConfig, TextPlugin, TreePlugin};
use crate::document::{
    inline_text, Block, CodeBlockRef, CompiledDocument, Degradation, DocumentMeta, HeadingRef,
};
use crate::error::CompileError;

/// Default syntax highlighting theme
pub const DEFAULT_THEME: &str = "base16-ocean.dark";

/// Compiles raw Markdown/MDX source into render-ready documents
pub struct Compiler {
    config: PipelineConfig,
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    theme_name: String,
}

impl Compiler {
    /// Create a compiler with the given pipeline and the default theme
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_theme(config, DEFAULT_THEME)
    }

    /// Create a compiler with a specific highlighting theme
    pub fn with_theme(config: PipelineConfig, theme: &str) -> Self {
        Self {
            config,
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
            theme_name: theme.to_string(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Compile one source document.
    ///
    /// Structural failures abort with no partial output. Per-plugin
    /// degradations are logged and recorded in the document metadata
    /// instead of failing the call.
    pub fn compile(&self, source: &str) -> Result<CompiledDocument, CompileError> {
        parser::check_fences(source)?;

        let mut blocks = parser::parse_blocks(source, self.parse_options());
        let mut degradations = Vec::new();

        for plugin in self.config.tree_plugins() {
            match plugin {
                TreePlugin::HeadingSlugs => slugs::apply(&mut blocks),
                TreePlugin::CodeBlockTitles => titles::apply(&mut blocks, &mut degradations),
                TreePlugin::SyntaxHighlight => highlight::apply(
                    &mut blocks,
                    &self.syntax_set,
                    self.theme(),
                    &mut degradations,
                ),
            }
        }

        let meta = collect_meta(&blocks, degradations);
        Ok(CompiledDocument { blocks, meta })
    }

    fn parse_options(&self) -> Options {
        let mut options = Options::empty();
        for plugin in self.config.text_plugins() {
            match plugin {
                TextPlugin::Gfm => {
                    options.insert(Options::ENABLE_TABLES);
                    options.insert(Options::ENABLE_STRIKETHROUGH);
                    options.insert(Options::ENABLE_TASKLISTS);
                    options.insert(Options::ENABLE_GFM);
                }
            }
        }
        options
    }

    fn theme(&self) -> &Theme {
        self.theme_set
            .themes
            .get(&self.theme_name)
            .unwrap_or_else(|| {
                self.theme_set
                    .themes
                    .values()
                    .next()
                    .expect("No themes available")
            })
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

/// One-shot compilation with a fresh compiler
pub fn compile(source: &str, config: PipelineConfig) -> Result<CompiledDocument, CompileError> {
    Compiler::new(config).compile(source)
}

fn collect_meta(blocks: &[Block], degradations: Vec<Degradation>) -> DocumentMeta {
    let mut meta = DocumentMeta {
        degradations,
        ..Default::default()
    };
    walk_meta(blocks, &mut meta);
    meta
}

fn walk_meta(blocks: &[Block], meta: &mut DocumentMeta) {
    for block in blocks {
        match block {
            Block::Heading { level, id, content } => meta.headings.push(HeadingRef {
                level: *level,
                id: id.clone(),
                text: inline_text(content),
            }),
            Block::CodeBlock(code) => meta.code_blocks.push(CodeBlockRef {
                language: code.language.clone(),
                title: code.title.clone(),
            }),
            Block::Quote { content } => walk_meta(content, meta),
            Block::List { items, .. } => {
                for item in items {
                    walk_meta(&item.content, meta);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Inline;

    fn compiler() -> Compiler {
        Compiler::new(PipelineConfig::default())
    }

    #[test]
    fn test_compile_is_idempotent() {
        let source = "# Title\n\n```rust:src/lib.rs\npub fn id() {}\n```\n\n| a |\n| - |\n| 1 |\n";
        let compiler = compiler();
        let first = compiler.compile(source).unwrap().to_json().unwrap();
        let second = compiler.compile(source).unwrap().to_json().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_full_pipeline() {
        let source = "\
# Intro

# Intro

```rust:src/main.rs
fn main() {}
```
";
        let doc = compiler().compile(source).unwrap();

        assert_eq!(doc.meta.headings.len(), 2);
        assert_eq!(doc.meta.headings[0].id.as_deref(), Some("intro"));
        assert_eq!(doc.meta.headings[1].id.as_deref(), Some("intro-1"));

        assert_eq!(doc.meta.code_blocks.len(), 1);
        assert_eq!(doc.meta.code_blocks[0].language.as_deref(), Some("rust"));
        assert_eq!(doc.meta.code_blocks[0].title.as_deref(), Some("src/main.rs"));

        let Block::CodeBlock(code) = &doc.blocks[2] else {
            panic!("expected code block");
        };
        assert!(code.tokens.is_some());
        assert!(!code.code.contains("src/main.rs"));
        assert!(doc.meta.degradations.is_empty());
    }

    #[test]
    fn test_unterminated_fence_is_fatal() {
        let err = compiler().compile("```rust\nfn main() {}\n").unwrap_err();
        assert!(matches!(err, CompileError::UnterminatedFence { line: 1 }));
    }

    #[test]
    fn test_unknown_language_degrades_not_fails() {
        let doc = compiler()
            .compile("```zorklang\nGO NORTH\n```\n")
            .unwrap();
        let Block::CodeBlock(code) = &doc.blocks[0] else {
            panic!("expected code block");
        };
        assert_eq!(code.code, "GO NORTH\n");
        assert!(code.tokens.is_none());
        assert_eq!(doc.meta.degradations.len(), 1);
        assert!(matches!(
            doc.meta.degradations[0],
            Degradation::UnknownLanguage { .. }
        ));
    }

    #[test]
    fn test_gfm_table_and_strikethrough() {
        let doc = compiler()
            .compile("| a | b |\n|---|---|\n| 1 | 2 |\n\nso ~~wrong~~ right\n")
            .unwrap();
        assert!(matches!(doc.blocks[0], Block::Table(_)));
        let Block::Paragraph { content } = &doc.blocks[1] else {
            panic!("expected paragraph");
        };
        assert!(content
            .iter()
            .any(|i| matches!(i, Inline::Strikethrough { .. })));
    }

    #[test]
    fn test_gfm_off_without_text_plugins() {
        let config = PipelineConfig::from_ids::<&str>(&[], &["headingSlugs"]).unwrap();
        let doc = Compiler::new(config)
            .compile("| a | b |\n|---|---|\n| 1 | 2 |\n")
            .unwrap();
        // Without the gfm extension the pipe syntax stays literal text.
        assert!(doc.blocks.iter().all(|b| !matches!(b, Block::Table(_))));
    }

    #[test]
    fn test_plugins_run_only_when_configured() {
        let config = PipelineConfig::from_ids(&["gfm"], &["codeBlockTitles"]).unwrap();
        let doc = Compiler::new(config)
            .compile("# Title\n\n```rust:src/main.rs\nfn main() {}\n```\n")
            .unwrap();

        assert_eq!(doc.meta.headings[0].id, None);
        let Block::CodeBlock(code) = &doc.blocks[1] else {
            panic!("expected code block");
        };
        assert_eq!(code.title.as_deref(), Some("src/main.rs"));
        assert!(code.tokens.is_none());
    }

    #[test]
    fn test_compiler_shared_across_threads() {
        let compiler = std::sync::Arc::new(compiler());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let compiler = std::sync::Arc::clone(&compiler);
                std::thread::spawn(move || {
                    compiler.compile(&format!("# Doc {}\n", i)).unwrap()
                })
            })
            .collect();
        for handle in handles {
            let doc = handle.join().unwrap();
            assert_eq!(doc.meta.headings.len(), 1);
        }
    }

    #[test]
    fn test_headings_collected_without_slug_plugin() {
        let config = PipelineConfig::from_ids::<&str>(&["gfm"], &[]).unwrap();
        let doc = Compiler::new(config).compile("## Section\n").unwrap();
        assert_eq!(doc.meta.headings.len(), 1);
        assert_eq!(doc.meta.headings[0].text, "Section");
        assert_eq!(doc.meta.headings[0].id, None);
    }
}
