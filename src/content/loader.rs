//! Content loader - pairs front matter with compiled documents
//!
//! The loader is the boundary between raw files and the compiler: it
//! strips front matter, hands only the body text to the compiler, and
//! fills in a fallback description when the front matter omits one.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::compiler::Compiler;
use crate::content::FrontMatter;
use crate::document::CompiledDocument;
use crate::helpers::text::{plainify, slugify, truncate_chars};

/// Fallback description length when front matter omits one
const DESCRIPTION_LIMIT: usize = 120;

/// A loaded content item: front matter plus its compiled body
#[derive(Debug)]
pub struct ContentItem {
    /// URL-friendly name derived from the file stem
    pub slug: String,
    pub front: FrontMatter,
    /// Description from front matter, or truncated body text
    pub description: String,
    pub document: CompiledDocument,
    /// Source file path
    pub source: PathBuf,
}

/// Loads content items from the filesystem
pub struct ContentLoader<'a> {
    compiler: &'a Compiler,
}

impl<'a> ContentLoader<'a> {
    pub fn new(compiler: &'a Compiler) -> Self {
        Self { compiler }
    }

    /// Load every Markdown/MDX file under a directory.
    ///
    /// Files that fail to load are skipped with a warning; a broken
    /// item never aborts the batch. Items are sorted newest first,
    /// undated items last.
    pub fn load_dir(&self, dir: &Path) -> Result<Vec<ContentItem>> {
        let mut items = Vec::new();

        for entry in WalkDir::new(dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.is_file() && is_content_file(path) {
                match self.load_file(path) {
                    Ok(item) => items.push(item),
                    Err(e) => {
                        tracing::warn!("Failed to load content {:?}: {}", path, e);
                    }
                }
            }
        }

        items.sort_by(|a, b| {
            let (a_date, b_date) = (a.front.parse_date(), b.front.parse_date());
            b_date
                .cmp(&a_date)
                .then_with(|| a.slug.cmp(&b.slug))
        });

        Ok(items)
    }

    /// Load and compile a single file
    pub fn load_file(&self, path: &Path) -> Result<ContentItem> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {:?}", path))?;
        let (front, body) = FrontMatter::parse(&content)?;

        let document = self
            .compiler
            .compile(body)
            .with_context(|| format!("failed to compile {:?}", path))?;

        let description = front
            .description
            .clone()
            .unwrap_or_else(|| truncate_chars(&plainify(body), DESCRIPTION_LIMIT));

        let slug = path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(slugify)
            .unwrap_or_else(|| "untitled".to_string());

        Ok(ContentItem {
            slug,
            front,
            description,
            document,
            source: path.to_path_buf(),
        })
    }
}

/// Check if a file is a Markdown/MDX file
fn is_content_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == "md" || e == "mdx" || e == "markdown")
        .unwrap_or(false)
}
