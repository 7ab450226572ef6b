//! HTML presentation for compiled documents
//!
//! Rendering is owned by the caller, not the compiler. Per-node-kind
//! overrides are a dispatch table passed explicitly into the renderer;
//! kinds without an override fall back to the built-in markup.

use std::collections::HashMap;

use crate::document::{
    inline_text, Alignment, Block, BlockKind, CodeBlock, CompiledDocument, HighlightSpan, Inline,
    ListItem, Table,
};

/// A rendering override for one block kind
pub type BlockFn = Box<dyn Fn(&HtmlRenderer, &Block) -> String + Send + Sync>;

/// Dispatch table mapping block kinds to custom render functions
#[derive(Default)]
pub struct Components {
    blocks: HashMap<BlockKind, BlockFn>,
}

impl Components {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an override for a block kind, replacing any previous one
    pub fn block<F>(mut self, kind: BlockKind, f: F) -> Self
    where
        F: Fn(&HtmlRenderer, &Block) -> String + Send + Sync + 'static,
    {
        self.blocks.insert(kind, Box::new(f));
        self
    }

    fn get(&self, kind: BlockKind) -> Option<&BlockFn> {
        self.blocks.get(&kind)
    }
}

/// Renders a compiled document to an HTML string
#[derive(Default)]
pub struct HtmlRenderer {
    components: Components,
}

impl HtmlRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_components(components: Components) -> Self {
        Self { components }
    }

    pub fn render(&self, doc: &CompiledDocument) -> String {
        let mut out = String::new();
        for block in &doc.blocks {
            out.push_str(&self.render_block(block));
            out.push('\n');
        }
        out
    }

    pub fn render_block(&self, block: &Block) -> String {
        if let Some(f) = self.components.get(block.kind()) {
            return f(self, block);
        }
        self.default_block(block)
    }

    fn default_block(&self, block: &Block) -> String {
        match block {
            Block::Paragraph { content } => format!("<p>{}</p>", self.render_inlines(content)),
            Block::Heading { level, id, content } => {
                let id_attr = id
                    .as_ref()
                    .map(|id| format!(r#" id="{}""#, html_escape(id)))
                    .unwrap_or_default();
                format!(
                    "<h{level}{id_attr}>{}</h{level}>",
                    self.render_inlines(content)
                )
            }
            Block::CodeBlock(code) => self.render_code(code),
            Block::Quote { content } => {
                let inner: String = content
                    .iter()
                    .map(|b| format!("{}\n", self.render_block(b)))
                    .collect();
                format!("<blockquote>\n{}</blockquote>", inner)
            }
            Block::List {
                ordered,
                start,
                items,
            } => self.render_list(*ordered, *start, items),
            Block::Table(table) => self.render_table(table),
            Block::Rule => "<hr>".to_string(),
            Block::Html { html } => html.clone(),
        }
    }

    fn render_list(&self, ordered: bool, start: Option<u64>, items: &[ListItem]) -> String {
        let tag = if ordered { "ol" } else { "ul" };
        let start_attr = match start {
            Some(n) if n != 1 => format!(r#" start="{}""#, n),
            _ => String::new(),
        };

        let mut out = format!("<{}{}>\n", tag, start_attr);
        for item in items {
            let inner: String = item
                .content
                .iter()
                .map(|b| self.render_block(b))
                .collect::<Vec<_>>()
                .join("\n");
            match item.checked {
                Some(checked) => {
                    let checked_attr = if checked { " checked" } else { "" };
                    out.push_str(&format!(
                        "<li class=\"task-list-item\"><input type=\"checkbox\" disabled{}> {}</li>\n",
                        checked_attr, inner
                    ));
                }
                None => out.push_str(&format!("<li>{}</li>\n", inner)),
            }
        }
        out.push_str(&format!("</{}>", tag));
        out
    }

    fn render_table(&self, table: &Table) -> String {
        let mut out = String::from("<table>\n<thead>\n<tr>");
        for (i, cell) in table.header.iter().enumerate() {
            out.push_str(&format!(
                "<th{}>{}</th>",
                align_attr(table.alignments.get(i)),
                self.render_inlines(cell)
            ));
        }
        out.push_str("</tr>\n</thead>\n<tbody>\n");
        for row in &table.rows {
            out.push_str("<tr>");
            for (i, cell) in row.iter().enumerate() {
                out.push_str(&format!(
                    "<td{}>{}</td>",
                    align_attr(table.alignments.get(i)),
                    self.render_inlines(cell)
                ));
            }
            out.push_str("</tr>\n");
        }
        out.push_str("</tbody>\n</table>");
        out
    }

    fn render_code(&self, code: &CodeBlock) -> String {
        let lang_class = code
            .language
            .as_ref()
            .map(|lang| format!(r#" class="language-{}""#, html_escape(lang)))
            .unwrap_or_default();

        let body = match &code.tokens {
            Some(tokens) => render_tokens(tokens),
            None => html_escape(&code.code),
        };
        let pre = format!("<pre><code{}>{}</code></pre>", lang_class, body);

        match &code.title {
            Some(title) => format!(
                "<figure class=\"code-block\"><figcaption class=\"code-title\">{}</figcaption>{}</figure>",
                html_escape(title),
                pre
            ),
            None => pre,
        }
    }

    pub fn render_inlines(&self, content: &[Inline]) -> String {
        content.iter().map(|i| self.render_inline(i)).collect()
    }

    fn render_inline(&self, inline: &Inline) -> String {
        match inline {
            Inline::Text { text } => html_escape(text),
            Inline::Code { code } => format!("<code>{}</code>", html_escape(code)),
            Inline::Emphasis { content } => format!("<em>{}</em>", self.render_inlines(content)),
            Inline::Strong { content } => {
                format!("<strong>{}</strong>", self.render_inlines(content))
            }
            Inline::Strikethrough { content } => {
                format!("<del>{}</del>", self.render_inlines(content))
            }
            Inline::Link {
                url,
                title,
                content,
            } => {
                let title_attr = title
                    .as_ref()
                    .map(|t| format!(r#" title="{}""#, html_escape(t)))
                    .unwrap_or_default();
                format!(
                    r#"<a href="{}"{}>{}</a>"#,
                    html_escape(url),
                    title_attr,
                    self.render_inlines(content)
                )
            }
            Inline::Image { url, title, alt } => {
                let title_attr = title
                    .as_ref()
                    .map(|t| format!(r#" title="{}""#, html_escape(t)))
                    .unwrap_or_default();
                format!(
                    r#"<img src="{}" alt="{}"{}>"#,
                    html_escape(url),
                    html_escape(&inline_text(alt)),
                    title_attr
                )
            }
            Inline::Html { html } => html.clone(),
            Inline::SoftBreak => "\n".to_string(),
            Inline::HardBreak => "<br>".to_string(),
        }
    }
}

fn render_tokens(tokens: &[HighlightSpan]) -> String {
    let mut out = String::new();
    for token in tokens {
        let mut style = format!("color:{}", token.style.color);
        if token.style.bold {
            style.push_str(";font-weight:bold");
        }
        if token.style.italic {
            style.push_str(";font-style:italic");
        }
        if token.style.underline {
            style.push_str(";text-decoration:underline");
        }
        out.push_str(&format!(
            r#"<span style="{}">{}</span>"#,
            style,
            html_escape(&token.text)
        ));
    }
    out
}

fn align_attr(alignment: Option<&Alignment>) -> String {
    let value = match alignment {
        Some(Alignment::Left) => "left",
        Some(Alignment::Center) => "center",
        Some(Alignment::Right) => "right",
        _ => return String::new(),
    };
    format!(r#" style="text-align:{}""#, value)
}

/// Simple HTML escaping
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::Compiler;
    use crate::config::PipelineConfig;

    fn render(source: &str) -> String {
        let doc = Compiler::new(PipelineConfig::default())
            .compile(source)
            .unwrap();
        HtmlRenderer::new().render(&doc)
    }

    #[test]
    fn test_render_heading_with_anchor() {
        let html = render("## Getting Started\n");
        assert!(html.contains(r#"<h2 id="getting-started">Getting Started</h2>"#));
    }

    #[test]
    fn test_render_escapes_text() {
        let html = render("a < b & c\n");
        assert!(html.contains("a &lt; b &amp; c"));
    }

    #[test]
    fn test_render_code_title_as_figure() {
        let html = render("```rust:src/main.rs\nfn main() {}\n```\n");
        assert!(html.contains(r#"<figcaption class="code-title">src/main.rs</figcaption>"#));
        assert!(html.contains(r#"class="language-rust""#));
        assert!(!html.contains("src/main.rs</code>"));
    }

    #[test]
    fn test_render_highlighted_tokens_as_spans() {
        let html = render("```rust\nfn main() {}\n```\n");
        assert!(html.contains("<span style=\"color:#"));
    }

    #[test]
    fn test_render_table_alignment() {
        let html = render("| a | b |\n|:-:|---|\n| 1 | 2 |\n");
        assert!(html.contains(r#"<th style="text-align:center">a</th>"#));
        assert!(html.contains("<th>b</th>"));
    }

    #[test]
    fn test_render_task_list() {
        let html = render("- [x] done\n- [ ] todo\n");
        assert!(html.contains(r#"<input type="checkbox" disabled checked>"#));
        assert!(html.contains(r#"<input type="checkbox" disabled>"#));
    }

    #[test]
    fn test_component_override_dispatch() {
        let components = Components::new().block(BlockKind::Rule, |_, _| {
            "<hr class=\"divider\">".to_string()
        });
        let renderer = HtmlRenderer::with_components(components);

        let doc = Compiler::new(PipelineConfig::default())
            .compile("above\n\n---\n\nbelow\n")
            .unwrap();
        let html = renderer.render(&doc);
        assert!(html.contains("<hr class=\"divider\">"));
        assert!(!html.contains("<hr>\n"));
        // Kinds without an override keep the built-in markup.
        assert!(html.contains("<p>above</p>"));
    }

    #[test]
    fn test_override_can_delegate_to_inlines() {
        let components = Components::new().block(BlockKind::Paragraph, |renderer, block| {
            let Block::Paragraph { content } = block else {
                return String::new();
            };
            format!(
                "<p class=\"content\">{}</p>",
                renderer.render_inlines(content)
            )
        });
        let renderer = HtmlRenderer::with_components(components);
        let doc = Compiler::new(PipelineConfig::default())
            .compile("hello *world*\n")
            .unwrap();
        let html = renderer.render(&doc);
        assert!(html.contains(r#"<p class="content">hello <em>world</em></p>"#));
    }
}
