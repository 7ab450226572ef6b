//! Code-block title extraction
//!
//! A fence info string of the form `lang:title` (for example
//! `rust:src/main.rs`) carries a display title. The title is lifted
//! into block metadata and the language token is left clean for the
//! highlighter. An annotation with an empty title is an ambiguous
//! parse: the block keeps its language and loses only the title.

use crate::document::{Block, Degradation};

pub(crate) fn apply(blocks: &mut [Block], degradations: &mut Vec<Degradation>) {
    for block in blocks {
        match block {
            Block::CodeBlock(code) => {
                let Some(info) = code.language.clone() else {
                    continue;
                };
                let Some((language, title)) = info.split_once(':') else {
                    continue;
                };

                code.language = if language.is_empty() {
                    None
                } else {
                    Some(language.to_string())
                };

                let title = title.trim();
                if title.is_empty() {
                    tracing::warn!("ambiguous code title annotation in `{}`", info);
                    degradations.push(Degradation::AmbiguousTitle { info });
                } else {
                    code.title = Some(title.to_string());
                }
            }
            Block::Quote { content } => apply(content, degradations),
            Block::List { items, .. } => {
                for item in items {
                    apply(&mut item.content, degradations);
                }
            }
            _ => {}
        }
    }
}
