//! Source validation and event-stream to node-tree conversion

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use crate::document::{Alignment, Block, CodeBlock, Inline, ListItem, Table};
use crate::error::CompileError;

/// Reject sources with an opening code fence that never closes.
///
/// A fence marker is three or more backticks or tildes indented at most
/// three spaces. A closing fence must use the same character, be at
/// least as long as the opener, and carry nothing but trailing
/// whitespace.
pub(crate) fn check_fences(source: &str) -> Result<(), CompileError> {
    let mut open: Option<(char, usize, usize)> = None;

    for (idx, line) in source.lines().enumerate() {
        let indent = line.len() - line.trim_start_matches(' ').len();
        if indent > 3 {
            continue;
        }
        let rest = &line[indent..];

        let marker = match rest.chars().next() {
            Some(c @ ('`' | '~')) => c,
            _ => continue,
        };
        let len = rest.chars().take_while(|&c| c == marker).count();
        if len < 3 {
            continue;
        }
        let after: &str = &rest[len..];

        match open {
            None => open = Some((marker, len, idx + 1)),
            Some((open_marker, open_len, _)) => {
                if marker == open_marker && len >= open_len && after.trim().is_empty() {
                    open = None;
                }
                // Anything else is fence content, including markers of
                // the other character.
            }
        }
    }

    match open {
        Some((_, _, line)) => Err(CompileError::UnterminatedFence { line }),
        None => Ok(()),
    }
}

/// Parse source text into a block tree with the given syntax extensions.
pub(crate) fn parse_blocks(source: &str, options: Options) -> Vec<Block> {
    let parser = Parser::new_ext(source, options);
    let mut builder = TreeBuilder::default();
    for event in parser {
        builder.event(event);
    }
    builder.finish()
}

/// A block container under construction
enum BlockFrame {
    Quote(Vec<Block>),
    List {
        ordered: bool,
        start: Option<u64>,
        items: Vec<ListItem>,
    },
    Item {
        checked: Option<bool>,
        content: Vec<Block>,
        /// Inlines of a tight list item, wrapped in a paragraph on close
        loose: Vec<Inline>,
    },
    Code {
        language: Option<String>,
        code: String,
    },
    Table {
        alignments: Vec<Alignment>,
        header: Vec<Vec<Inline>>,
        rows: Vec<Vec<Vec<Inline>>>,
        current_row: Vec<Vec<Inline>>,
        in_head: bool,
    },
    Html(String),
}

/// An inline container under construction
enum InlineFrame {
    Paragraph(Vec<Inline>),
    Heading {
        level: u8,
        id: Option<String>,
        content: Vec<Inline>,
    },
    Emphasis(Vec<Inline>),
    Strong(Vec<Inline>),
    Strikethrough(Vec<Inline>),
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
    Cell(Vec<Inline>),
}

impl InlineFrame {
    fn push(&mut self, inline: Inline) {
        match self {
            InlineFrame::Paragraph(content)
            | InlineFrame::Heading { content, .. }
            | InlineFrame::Emphasis(content)
            | InlineFrame::Strong(content)
            | InlineFrame::Strikethrough(content)
            | InlineFrame::Link { content, .. }
            | InlineFrame::Cell(content) => content.push(inline),
            InlineFrame::Image { alt, .. } => alt.push(inline),
        }
    }
}

#[derive(Default)]
struct TreeBuilder {
    root: Vec<Block>,
    blocks: Vec<BlockFrame>,
    inlines: Vec<InlineFrame>,
}

impl TreeBuilder {
    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.push_inline(Inline::Code {
                code: code.to_string(),
            }),
            Event::Html(html) => self.block_html(&html),
            Event::InlineHtml(html) => self.push_inline(Inline::Html {
                html: html.to_string(),
            }),
            Event::SoftBreak => self.push_inline(Inline::SoftBreak),
            Event::HardBreak => self.push_inline(Inline::HardBreak),
            Event::Rule => self.push_block(Block::Rule),
            Event::TaskListMarker(done) => self.task_marker(done),
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.inlines.push(InlineFrame::Paragraph(Vec::new())),
            Tag::Heading { level, id, .. } => self.inlines.push(InlineFrame::Heading {
                level: level as u8,
                id: id.map(|s| s.to_string()),
                content: Vec::new(),
            }),
            Tag::BlockQuote { .. } => self.blocks.push(BlockFrame::Quote(Vec::new())),
            Tag::CodeBlock(kind) => {
                let language = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .filter(|s| !s.is_empty())
                        .map(|s| s.to_string()),
                    CodeBlockKind::Indented => None,
                };
                self.blocks.push(BlockFrame::Code {
                    language,
                    code: String::new(),
                });
            }
            Tag::List(start) => self.blocks.push(BlockFrame::List {
                ordered: start.is_some(),
                start,
                items: Vec::new(),
            }),
            Tag::Item => self.blocks.push(BlockFrame::Item {
                checked: None,
                content: Vec::new(),
                loose: Vec::new(),
            }),
            Tag::Table(alignments) => self.blocks.push(BlockFrame::Table {
                alignments: alignments.iter().map(convert_alignment).collect(),
                header: Vec::new(),
                rows: Vec::new(),
                current_row: Vec::new(),
                in_head: false,
            }),
            Tag::TableHead => {
                if let Some(BlockFrame::Table { in_head, .. }) = self.blocks.last_mut() {
                    *in_head = true;
                }
            }
            Tag::TableRow => {
                if let Some(BlockFrame::Table { current_row, .. }) = self.blocks.last_mut() {
                    current_row.clear();
                }
            }
            Tag::TableCell => self.inlines.push(InlineFrame::Cell(Vec::new())),
            Tag::Emphasis => self.inlines.push(InlineFrame::Emphasis(Vec::new())),
            Tag::Strong => self.inlines.push(InlineFrame::Strong(Vec::new())),
            Tag::Strikethrough => self.inlines.push(InlineFrame::Strikethrough(Vec::new())),
            Tag::Link {
                dest_url, title, ..
            } => self.inlines.push(InlineFrame::Link {
                url: dest_url.to_string(),
                title: none_if_empty(&title),
                content: Vec::new(),
            }),
            Tag::Image {
                dest_url, title, ..
            } => self.inlines.push(InlineFrame::Image {
                url: dest_url.to_string(),
                title: none_if_empty(&title),
                alt: Vec::new(),
            }),
            Tag::HtmlBlock => self.blocks.push(BlockFrame::Html(String::new())),
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                if let Some(InlineFrame::Paragraph(content)) = self.inlines.pop() {
                    self.push_block(Block::Paragraph { content });
                }
            }
            TagEnd::Heading { .. } => {
                if let Some(InlineFrame::Heading { level, id, content }) = self.inlines.pop() {
                    self.push_block(Block::Heading { level, id, content });
                }
            }
            TagEnd::BlockQuote { .. } => {
                if let Some(BlockFrame::Quote(content)) = self.blocks.pop() {
                    self.push_block(Block::Quote { content });
                }
            }
            TagEnd::CodeBlock => {
                if let Some(BlockFrame::Code { language, code }) = self.blocks.pop() {
                    self.push_block(Block::CodeBlock(CodeBlock {
                        language,
                        title: None,
                        code,
                        tokens: None,
                    }));
                }
            }
            TagEnd::List { .. } => {
                if let Some(BlockFrame::List {
                    ordered,
                    start,
                    items,
                }) = self.blocks.pop()
                {
                    self.push_block(Block::List {
                        ordered,
                        start,
                        items,
                    });
                }
            }
            TagEnd::Item => {
                if let Some(BlockFrame::Item {
                    checked,
                    mut content,
                    loose,
                }) = self.blocks.pop()
                {
                    if !loose.is_empty() {
                        content.push(Block::Paragraph { content: loose });
                    }
                    if let Some(BlockFrame::List { items, .. }) = self.blocks.last_mut() {
                        items.push(ListItem { checked, content });
                    }
                }
            }
            TagEnd::Table => {
                if let Some(BlockFrame::Table {
                    alignments,
                    header,
                    rows,
                    ..
                }) = self.blocks.pop()
                {
                    self.push_block(Block::Table(Table {
                        alignments,
                        header,
                        rows,
                    }));
                }
            }
            TagEnd::TableHead => {
                if let Some(BlockFrame::Table { in_head, .. }) = self.blocks.last_mut() {
                    *in_head = false;
                }
            }
            TagEnd::TableRow => {
                if let Some(BlockFrame::Table {
                    rows, current_row, ..
                }) = self.blocks.last_mut()
                {
                    rows.push(std::mem::take(current_row));
                }
            }
            TagEnd::TableCell => {
                if let Some(InlineFrame::Cell(content)) = self.inlines.pop() {
                    if let Some(BlockFrame::Table {
                        header,
                        current_row,
                        in_head,
                        ..
                    }) = self.blocks.last_mut()
                    {
                        if *in_head {
                            header.push(content);
                        } else {
                            current_row.push(content);
                        }
                    }
                }
            }
            TagEnd::Emphasis => {
                if let Some(InlineFrame::Emphasis(content)) = self.inlines.pop() {
                    self.push_inline(Inline::Emphasis { content });
                }
            }
            TagEnd::Strong => {
                if let Some(InlineFrame::Strong(content)) = self.inlines.pop() {
                    self.push_inline(Inline::Strong { content });
                }
            }
            TagEnd::Strikethrough => {
                if let Some(InlineFrame::Strikethrough(content)) = self.inlines.pop() {
                    self.push_inline(Inline::Strikethrough { content });
                }
            }
            TagEnd::Link => {
                if let Some(InlineFrame::Link {
                    url,
                    title,
                    content,
                }) = self.inlines.pop()
                {
                    self.push_inline(Inline::Link {
                        url,
                        title,
                        content,
                    });
                }
            }
            TagEnd::Image => {
                if let Some(InlineFrame::Image { url, title, alt }) = self.inlines.pop() {
                    self.push_inline(Inline::Image { url, title, alt });
                }
            }
            TagEnd::HtmlBlock => {
                if let Some(BlockFrame::Html(html)) = self.blocks.pop() {
                    self.push_block(Block::Html { html });
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if self.inlines.is_empty() {
            match self.blocks.last_mut() {
                Some(BlockFrame::Code { code, .. }) => {
                    code.push_str(text);
                    return;
                }
                Some(BlockFrame::Html(html)) => {
                    html.push_str(text);
                    return;
                }
                _ => {}
            }
        }
        self.push_inline(Inline::Text {
            text: text.to_string(),
        });
    }

    fn block_html(&mut self, html: &str) {
        if let Some(BlockFrame::Html(buffer)) = self.blocks.last_mut() {
            buffer.push_str(html);
        } else if !self.inlines.is_empty() {
            self.push_inline(Inline::Html {
                html: html.to_string(),
            });
        } else {
            self.push_block(Block::Html {
                html: html.to_string(),
            });
        }
    }

    fn task_marker(&mut self, done: bool) {
        for frame in self.blocks.iter_mut().rev() {
            if let BlockFrame::Item { checked, .. } = frame {
                *checked = Some(done);
                return;
            }
        }
    }

    fn push_inline(&mut self, inline: Inline) {
        if let Some(frame) = self.inlines.last_mut() {
            frame.push(inline);
            return;
        }
        // Tight list items carry inlines without a paragraph wrapper.
        if let Some(BlockFrame::Item { loose, .. }) = self.blocks.last_mut() {
            loose.push(inline);
            return;
        }
        self.push_block(Block::Paragraph {
            content: vec![inline],
        });
    }

    fn push_block(&mut self, block: Block) {
        for frame in self.blocks.iter_mut().rev() {
            match frame {
                BlockFrame::Quote(content) => {
                    content.push(block);
                    return;
                }
                BlockFrame::Item { content, loose, .. } => {
                    if !loose.is_empty() {
                        content.push(Block::Paragraph {
                            content: std::mem::take(loose),
                        });
                    }
                    content.push(block);
                    return;
                }
                _ => {}
            }
        }
        self.root.push(block);
    }

    fn finish(self) -> Vec<Block> {
        self.root
    }
}

fn convert_alignment(alignment: &pulldown_cmark::Alignment) -> Alignment {
    match alignment {
        pulldown_cmark::Alignment::None => Alignment::None,
        pulldown_cmark::Alignment::Left => Alignment::Left,
        pulldown_cmark::Alignment::Center => Alignment::Center,
        pulldown_cmark::Alignment::Right => Alignment::Right,
    }
}

fn none_if_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::inline_text;

    fn gfm_options() -> Options {
        Options::ENABLE_TABLES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_GFM
    }

    #[test]
    fn test_check_fences_accepts_closed_fence() {
        assert!(check_fences("```rust\nfn main() {}\n```\n").is_ok());
        assert!(check_fences("~~~\nplain\n~~~\n").is_ok());
    }

    #[test]
    fn test_check_fences_rejects_unterminated() {
        let err = check_fences("intro\n\n```rust\nfn main() {}\n").unwrap_err();
        assert!(matches!(err, CompileError::UnterminatedFence { line: 3 }));
    }

    #[test]
    fn test_check_fences_other_marker_is_content() {
        // A tilde fence inside a backtick fence neither closes nor nests.
        assert!(check_fences("```\n~~~\ncontent\n~~~\n```\n").is_ok());
        let err = check_fences("```\n~~~\n").unwrap_err();
        assert!(matches!(err, CompileError::UnterminatedFence { line: 1 }));
    }

    #[test]
    fn test_check_fences_shorter_close_is_content() {
        let err = check_fences("````\n```\n").unwrap_err();
        assert!(matches!(err, CompileError::UnterminatedFence { line: 1 }));
        assert!(check_fences("````\n```\n````\n").is_ok());
    }

    #[test]
    fn test_check_fences_ignores_indented_code() {
        // Four-space indentation is an indented code block, not a fence.
        assert!(check_fences("    ```\n    code\n").is_ok());
    }

    #[test]
    fn test_parse_paragraph_and_heading() {
        let blocks = parse_blocks("# Title\n\nSome *emphasis* here.\n", gfm_options());
        assert_eq!(blocks.len(), 2);
        match &blocks[0] {
            Block::Heading { level, id, content } => {
                assert_eq!(*level, 1);
                assert!(id.is_none());
                assert_eq!(inline_text(content), "Title");
            }
            other => panic!("expected heading, got {:?}", other),
        }
        match &blocks[1] {
            Block::Paragraph { content } => {
                assert_eq!(inline_text(content), "Some emphasis here.");
                assert!(content
                    .iter()
                    .any(|i| matches!(i, Inline::Emphasis { .. })));
            }
            other => panic!("expected paragraph, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_fenced_code_block() {
        let blocks = parse_blocks("```rust\nfn main() {}\n```\n", gfm_options());
        match &blocks[0] {
            Block::CodeBlock(code) => {
                assert_eq!(code.language.as_deref(), Some("rust"));
                assert_eq!(code.code, "fn main() {}\n");
                assert!(code.title.is_none());
                assert!(code.tokens.is_none());
            }
            other => panic!("expected code block, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_indented_code_block() {
        let blocks = parse_blocks("    let x = 1;\n", gfm_options());
        match &blocks[0] {
            Block::CodeBlock(code) => {
                assert!(code.language.is_none());
                assert_eq!(code.code, "let x = 1;\n");
            }
            other => panic!("expected code block, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_table() {
        let source = "| a | b |\n| --- | :-: |\n| 1 | 2 |\n";
        let blocks = parse_blocks(source, gfm_options());
        match &blocks[0] {
            Block::Table(table) => {
                assert_eq!(
                    table.alignments,
                    vec![Alignment::None, Alignment::Center]
                );
                assert_eq!(table.header.len(), 2);
                assert_eq!(inline_text(&table.header[0]), "a");
                assert_eq!(table.rows.len(), 1);
                assert_eq!(inline_text(&table.rows[0][1]), "2");
            }
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_strikethrough() {
        let blocks = parse_blocks("some ~~gone~~ text\n", gfm_options());
        match &blocks[0] {
            Block::Paragraph { content } => {
                let strike = content
                    .iter()
                    .find(|i| matches!(i, Inline::Strikethrough { .. }));
                assert!(strike.is_some(), "expected a strikethrough node");
            }
            other => panic!("expected paragraph, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_task_list() {
        let blocks = parse_blocks("- [x] done\n- [ ] todo\n", gfm_options());
        match &blocks[0] {
            Block::List { ordered, items, .. } => {
                assert!(!ordered);
                assert_eq!(items[0].checked, Some(true));
                assert_eq!(items[1].checked, Some(false));
            }
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_nested_quote_and_list() {
        let source = "> quote\n>\n> - one\n> - two\n";
        let blocks = parse_blocks(source, gfm_options());
        match &blocks[0] {
            Block::Quote { content } => {
                assert!(matches!(content[0], Block::Paragraph { .. }));
                match &content[1] {
                    Block::List { items, .. } => assert_eq!(items.len(), 2),
                    other => panic!("expected nested list, got {:?}", other),
                }
            }
            other => panic!("expected quote, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_links_and_images() {
        let blocks = parse_blocks(
            "[text](https://example.com \"t\") ![alt](/img.png)\n",
            gfm_options(),
        );
        match &blocks[0] {
            Block::Paragraph { content } => {
                let link = content.iter().find_map(|i| match i {
                    Inline::Link { url, title, .. } => Some((url.clone(), title.clone())),
                    _ => None,
                });
                assert_eq!(
                    link,
                    Some(("https://example.com".to_string(), Some("t".to_string())))
                );
                let image = content.iter().find_map(|i| match i {
                    Inline::Image { url, alt, .. } => Some((url.clone(), inline_text(alt))),
                    _ => None,
                });
                assert_eq!(image, Some(("/img.png".to_string(), "alt".to_string())));
            }
            other => panic!("expected paragraph, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_html_block() {
        let blocks = parse_blocks("<div class=\"note\">\nhi\n</div>\n", gfm_options());
        match &blocks[0] {
            Block::Html { html } => assert!(html.contains("class=\"note\"")),
            other => panic!("expected html block, got {:?}", other),
        }
    }

    #[test]
    fn test_ordered_list_start() {
        let blocks = parse_blocks("3. three\n4. four\n", gfm_options());
        match &blocks[0] {
            Block::List { ordered, start, .. } => {
                assert!(*ordered);
                assert_eq!(*start, Some(3));
            }
            other => panic!("expected list, got {:?}", other),
        }
    }
}
