//! Highlight categories for every token of a document.
//!
//! Categories live in a side-table of spans; tokens themselves are never
//! modified.

use serde::Serialize;

use crate::ast::{Arg, Block};
use crate::catalog::{Category, Shape};
use crate::config::ModeConfig;
use crate::lexer::{source_lines, split_string_token, Token, TokenKind};
use crate::lines::{Line, LineParser, ParsedLine};

/// A highlighted run of characters within one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    /// Offset in characters from the start of the line.
    pub start: usize,
    pub length: usize,
    pub category: Category,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HighlightedLine {
    pub spans: Vec<Span>,
    /// Open c-blocks and if-blocks around this line.
    pub depth: usize,
}

/// Tracks which mouths are open while lines are replayed in order.
#[derive(Debug, Clone, Default)]
pub struct Nesting {
    open: Vec<Shape>,
}

impl Nesting {
    /// Depth of a line with the given text, before it is applied.
    pub fn depth_of(&self, text: &str) -> usize {
        let first = text.split_whitespace().next();
        let closes = matches!(first, Some("end" | "else"));
        self.open.len().saturating_sub(closes as usize)
    }

    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// Whether an `else` may come next.
    pub fn else_allowed(&self) -> bool {
        self.open.last() == Some(&Shape::IfBlock)
    }

    pub fn end_allowed(&self) -> bool {
        !self.open.is_empty()
    }

    pub fn apply(&mut self, line: &Line) {
        match line {
            Line::Blank => self.open.clear(),
            Line::Block(block) => match block.shape() {
                Shape::CBlock | Shape::CBlockCap | Shape::IfBlock => self.open.push(block.shape()),
                Shape::End => {
                    self.open.pop();
                }
                Shape::Else => {
                    if let Some(top) = self.open.last_mut() {
                        *top = Shape::Else;
                    }
                }
                _ => {}
            },
            _ => {}
        }
    }
}

/// Highlight every line of `text`, with parameters scoped to their
/// definitions exactly as when compiling.
pub fn highlight_document(text: &str, config: &ModeConfig) -> Vec<HighlightedLine> {
    let mut parser = LineParser::new(config);
    let mut nesting = Nesting::default();
    source_lines(text)
        .map(|line| {
            let depth = nesting.depth_of(line);
            let parsed = parser.parse(line);
            nesting.apply(&parsed.line);
            HighlightedLine {
                spans: highlight_line(&parsed),
                depth,
            }
        })
        .collect()
}

/// Indentation level for line `index` of `text`.
pub fn indent_depth(text: &str, index: usize, config: &ModeConfig) -> usize {
    highlight_document(text, config)
        .get(index)
        .map_or(0, |line| line.depth)
}

pub fn highlight_line(parsed: &ParsedLine) -> Vec<Span> {
    let tokens = &parsed.tokens;
    let mut categories: Vec<Option<Category>> = vec![None; tokens.len()];
    match &parsed.line {
        Line::Error { .. } => {
            for (category, token) in categories.iter_mut().zip(tokens) {
                let quoted = token.kind == TokenKind::Error
                    && token.trimmed().starts_with(['"', '\'']);
                *category = Some(if quoted { Category::String } else { Category::Error });
            }
        }
        Line::Block(block) => paint_block(block, &mut categories),
        _ => {}
    }
    for &(index, category) in &parsed.paints {
        if let Some(slot) = categories.get_mut(index) {
            *slot = Some(category);
        }
    }

    let mut spans = Vec::new();
    let mut offset = 0;
    for (token, category) in tokens.iter().zip(categories) {
        if token.kind == TokenKind::String {
            for part in split_string_token(token) {
                let category = match part.kind {
                    TokenKind::Escape => Category::Escape,
                    _ => Category::String,
                };
                offset = push_span(&mut spans, &part, offset, Some(category));
            }
        } else {
            offset = push_span(&mut spans, token, offset, category.or_else(|| kind_category(token.kind)));
        }
    }
    spans
}

fn paint_block(block: &Block, categories: &mut [Option<Category>]) {
    let category = block.info.category();
    for &index in &block.tokens {
        if let Some(slot) = categories.get_mut(index) {
            *slot = Some(category);
        }
    }
    for arg in &block.args {
        if let Arg::Block(child) = arg {
            paint_block(child, categories);
        }
    }
}

fn kind_category(kind: TokenKind) -> Option<Category> {
    match kind {
        TokenKind::Number => Some(Category::Number),
        TokenKind::Color => Some(Category::Color),
        TokenKind::Empty => Some(Category::Empty),
        TokenKind::Zero => Some(Category::Zero),
        TokenKind::False => Some(Category::False),
        TokenKind::Comment => Some(Category::Comment),
        TokenKind::Ellipsis => Some(Category::Ellipsis),
        TokenKind::Escape => Some(Category::Escape),
        TokenKind::String => Some(Category::String),
        _ => None,
    }
}

/// Add a span for the visible part of `token`, which starts `offset`
/// characters into the line. Returns the offset after the token.
fn push_span(spans: &mut Vec<Span>, token: &Token, offset: usize, category: Option<Category>) -> usize {
    let total = token.text.chars().count();
    let leading = token.text.chars().take_while(|c| *c == ' ' || *c == '\t').count();
    let length = token.trimmed().chars().count();
    if let Some(category) = category {
        if length > 0 {
            spans.push(Span {
                start: offset + leading,
                length,
                category,
            });
        }
    }
    offset + total
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categories(text: &str) -> Vec<Vec<(String, Category)>> {
        highlight_document(text, &ModeConfig::default())
            .into_iter()
            .zip(source_lines(text))
            .map(|(line, source)| {
                let chars: Vec<char> = source.chars().collect();
                line.spans
                    .iter()
                    .map(|s| (chars[s.start..s.start + s.length].iter().collect(), s.category))
                    .collect()
            })
            .collect()
    }

    #[test]
    fn block_words_take_the_block_category() {
        let lines = categories("move 10 steps");
        assert_eq!(
            lines[0],
            vec![
                ("move".to_owned(), Category::Motion),
                ("10".to_owned(), Category::Number),
                ("steps".to_owned(), Category::Motion),
            ]
        );
    }

    #[test]
    fn nested_reporters_keep_their_own_category() {
        let lines = categories("say (x position)");
        assert!(lines[0].contains(&("say".to_owned(), Category::Looks)));
        assert!(lines[0].contains(&("x".to_owned(), Category::Motion)));
        assert!(lines[0].contains(&("position".to_owned(), Category::Motion)));
    }

    #[test]
    fn strings_split_around_escapes() {
        let lines = categories(r#"say "a\"b""#);
        assert_eq!(
            lines[0],
            vec![
                ("say".to_owned(), Category::Looks),
                ("\"a".to_owned(), Category::String),
                ("\\".to_owned(), Category::Escape),
                ("\"".to_owned(), Category::String),
                ("b\"".to_owned(), Category::String),
            ]
        );
    }

    #[test]
    fn unparsable_lines_are_errors() {
        let lines = categories("move banana");
        assert!(lines[0].iter().all(|(_, c)| *c == Category::Error));
    }

    #[test]
    fn definitions_paint_custom_and_parameters() {
        let lines = categories("define jump (height)\nchange y by height");
        assert_eq!(lines[0][0], ("define".to_owned(), Category::Custom));
        assert_eq!(lines[0][1], ("jump".to_owned(), Category::Custom));
        assert!(lines[0].contains(&("height".to_owned(), Category::Parameter)));
        assert!(lines[1].contains(&("height".to_owned(), Category::Parameter)));
    }

    #[test]
    fn comments_and_ellipses_fall_back_to_kind() {
        let lines = categories("// note\nforever\n  ...\nend");
        assert_eq!(lines[0], vec![("// note".to_owned(), Category::Comment)]);
        assert_eq!(lines[2], vec![("...".to_owned(), Category::Grey)]);
    }

    #[test]
    fn depth_follows_open_mouths() {
        let text = "forever\nif <mouse down?> then\nshow\nelse\nend\nend\n\nshow";
        let depths: Vec<usize> = highlight_document(text, &ModeConfig::default())
            .iter()
            .map(|l| l.depth)
            .collect();
        assert_eq!(depths, vec![0, 1, 2, 1, 1, 0, 0, 0]);
        assert_eq!(indent_depth(text, 2, &ModeConfig::default()), 2);
    }
}
