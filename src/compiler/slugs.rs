//! Heading anchor injection
//!
//! Anchors are derived from heading text: lower-cased, punctuation and
//! whitespace normalized to hyphens. Duplicate normalized text within
//! one document gets numeric disambiguators (`foo`, `foo-1`, `foo-2`).

use std::collections::HashMap;

use crate::document::{inline_text, Block};

pub(crate) fn apply(blocks: &mut [Block]) {
    let mut used: HashMap<String, usize> = HashMap::new();
    visit(blocks, &mut used);
}

fn visit(blocks: &mut [Block], used: &mut HashMap<String, usize>) {
    for block in blocks {
        match block {
            Block::Heading { id, content, .. } => {
                if let Some(existing) = id {
                    // An explicit anchor occupies its slot.
                    used.entry(existing.clone()).or_insert(1);
                    continue;
                }
                let base = slug::slugify(inline_text(content));
                if base.is_empty() {
                    continue;
                }
                let n = used.entry(base.clone()).or_insert(0);
                *id = if *n == 0 {
                    Some(base.clone())
                } else {
                    Some(format!("{}-{}", base, n))
                };
                *n += 1;
            }
            Block::Quote { content } => visit(content, used),
            Block::List { items, .. } => {
                for item in items {
                    visit(&mut item.content, used);
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

    fn heading(text: &str) -> Block {
        Block::Heading {
            level: 2,
            id: None,
            content: vec![Inline::Text {
                text: text.to_string(),
            }],
        }
    }

    fn id_of(block: &Block) -> Option<&str> {
        match block {
            Block::Heading { id, .. } => id.as_deref(),
            _ => None,
        }
    }

    #[test]
    fn test_slug_normalization() {
        let mut blocks = vec![heading("Hello, World!  Again")];
        apply(&mut blocks);
        assert_eq!(id_of(&blocks[0]), Some("hello-world-again"));
    }

    #[test]
    fn test_duplicate_headings_get_numeric_suffixes() {
        let mut blocks = vec![heading("Setup"), heading("Setup"), heading("Setup")];
        apply(&mut blocks);
        assert_eq!(id_of(&blocks[0]), Some("setup"));
        assert_eq!(id_of(&blocks[1]), Some("setup-1"));
        assert_eq!(id_of(&blocks[2]), Some("setup-2"));
    }

    #[test]
    fn test_headings_inside_quotes_share_the_namespace() {
        let mut blocks = vec![
            heading("Notes"),
            Block::Quote {
                content: vec![heading("Notes")],
            },
        ];
        apply(&mut blocks);
        assert_eq!(id_of(&blocks[0]), Some("notes"));
        match &blocks[1] {
            Block::Quote { content } => assert_eq!(id_of(&content[0]), Some("notes-1")),
            other => panic!("expected quote, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_heading_gets_no_anchor() {
        let mut blocks = vec![Block::Heading {
            level: 1,
            id: None,
            content: Vec::new(),
        }];
        apply(&mut blocks);
        assert_eq!(id_of(&blocks[0]), None);
    }
}
