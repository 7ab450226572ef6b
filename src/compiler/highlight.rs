//! Syntax-highlight tokenization for fenced code blocks
//!
//! Each block's code is tokenized according to its declared language
//! and the resulting style spans are attached to the node. Blocks with
//! no declared language pass through untouched; an unrecognized
//! language degrades to plain text instead of failing.

use syntect::easy::HighlightLines;
use syntect::highlighting::{FontStyle, Style, Theme};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use crate::document::{Block, CodeBlock, Degradation, HighlightSpan, TokenStyle};

pub(crate) fn apply(
    blocks: &mut [Block],
    syntax_set: &SyntaxSet,
    theme: &Theme,
    degradations: &mut Vec<Degradation>,
) {
    for block in blocks {
        match block {
            Block::CodeBlock(code) => highlight_block(code, syntax_set, theme, degradations),
            Block::Quote { content } => apply(content, syntax_set, theme, degradations),
            Block::List { items, .. } => {
                for item in items {
                    apply(&mut item.content, syntax_set, theme, degradations);
                }
            }
            _ => {}
        }
    }
}

fn highlight_block(
    code: &mut CodeBlock,
    syntax_set: &SyntaxSet,
    theme: &Theme,
    degradations: &mut Vec<Degradation>,
) {
    let Some(language) = code.language.as_deref() else {
        return;
    };

    let Some(syntax) = syntax_set
        .find_syntax_by_token(language)
        .or_else(|| syntax_set.find_syntax_by_extension(language))
    else {
        tracing::warn!("no syntax definition for language `{}`", language);
        degradations.push(Degradation::UnknownLanguage {
            language: language.to_string(),
        });
        return;
    };

    let mut highlighter = HighlightLines::new(syntax, theme);
    let mut spans = Vec::new();

    for line in LinesWithEndings::from(&code.code) {
        match highlighter.highlight_line(line, syntax_set) {
            Ok(regions) => {
                for (style, text) in regions {
                    spans.push(HighlightSpan {
                        text: text.to_string(),
                        style: token_style(style),
                    });
                }
            }
            Err(e) => {
                tracing::warn!("highlighting failed for language `{}`: {}", language, e);
                degradations.push(Degradation::HighlightFailed {
                    language: language.to_string(),
                });
                return;
            }
        }
    }

    code.tokens = Some(spans);
}

fn token_style(style: Style) -> TokenStyle {
    let fg = style.foreground;
    TokenStyle {
        color: format!("#{:02x}{:02x}{:02x}", fg.r, fg.g, fg.b),
        bold: style.font_style.contains(FontStyle::BOLD),
        italic: style.font_style.contains(FontStyle::ITALIC),
        underline: style.font_style.contains(FontStyle::UNDERLINE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syntect::highlighting::ThemeSet;

    fn assets() -> (SyntaxSet, Theme) {
        let syntax_set = SyntaxSet::load_defaults_newlines();
        let theme = ThemeSet::load_defaults()
            .themes
            .remove("base16-ocean.dark")
            .unwrap();
        (syntax_set, theme)
    }

    fn rust_block() -> CodeBlock {
        CodeBlock {
            language: Some("rust".to_string()),
            title: None,
            code: "fn main() {}\n".to_string(),
            tokens: None,
        }
    }

    #[test]
    fn test_known_language_gets_tokens() {
        let (syntax_set, theme) = assets();
        let mut blocks = vec![Block::CodeBlock(rust_block())];
        let mut degradations = Vec::new();
        apply(&mut blocks, &syntax_set, &theme, &mut degradations);

        let Block::CodeBlock(code) = &blocks[0] else {
            unreachable!()
        };
        let tokens = code.tokens.as_ref().expect("tokens attached");
        assert!(!tokens.is_empty());
        let joined: String = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(joined, "fn main() {}\n");
        assert!(degradations.is_empty());
    }

    #[test]
    fn test_unknown_language_degrades() {
        let (syntax_set, theme) = assets();
        let mut blocks = vec![Block::CodeBlock(CodeBlock {
            language: Some("zorklang".to_string()),
            title: None,
            code: "GO NORTH\n".to_string(),
            tokens: None,
        })];
        let mut degradations = Vec::new();
        apply(&mut blocks, &syntax_set, &theme, &mut degradations);

        let Block::CodeBlock(code) = &blocks[0] else {
            unreachable!()
        };
        assert_eq!(code.code, "GO NORTH\n");
        assert!(code.tokens.is_none());
        assert_eq!(
            degradations,
            vec![Degradation::UnknownLanguage {
                language: "zorklang".to_string()
            }]
        );
    }

    #[test]
    fn test_no_language_passes_through_silently() {
        let (syntax_set, theme) = assets();
        let mut blocks = vec![Block::CodeBlock(CodeBlock {
            language: None,
            title: None,
            code: "plain\n".to_string(),
            tokens: None,
        })];
        let mut degradations = Vec::new();
        apply(&mut blocks, &syntax_set, &theme, &mut degradations);

        let Block::CodeBlock(code) = &blocks[0] else {
            unreachable!()
        };
        assert!(code.tokens.is_none());
        assert!(degradations.is_empty());
    }

    #[test]
    fn test_token_style_mapping() {
        let style = Style {
            foreground: syntect::highlighting::Color {
                r: 0xab,
                g: 0xcd,
                b: 0xef,
                a: 0xff,
            },
            background: syntect::highlighting::Color::WHITE,
            font_style: FontStyle::BOLD | FontStyle::ITALIC,
        };
        let token = token_style(style);
        assert_eq!(token.color, "#abcdef");
        assert!(token.bold);
        assert!(token.italic);
        assert!(!token.underline);
    }
}
