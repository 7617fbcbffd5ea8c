//! Semantic tokens from the core highlighter.
//!
//! Every highlight category is one token type. Categories with a standard
//! LSP counterpart use it, so themes color them without configuration;
//! block palette categories get their own names.

use lsp_types::{SemanticToken, SemanticTokenModifier, SemanticTokenType};
use tosh_core::{highlight_document, source_lines, Category, ModeConfig};

use crate::document::utf16_column;

/// Semantic token types registered with the client, indexed like
/// [`Category::ALL`].
pub fn token_types() -> Vec<SemanticTokenType> {
    Category::ALL.iter().map(|c| token_type(*c)).collect()
}

pub static TOKEN_MODIFIERS: &[SemanticTokenModifier] = &[];

fn token_type(category: Category) -> SemanticTokenType {
    match category {
        Category::Variable => SemanticTokenType::VARIABLE,
        Category::Parameter => SemanticTokenType::PARAMETER,
        Category::Custom => SemanticTokenType::FUNCTION,
        Category::Control => SemanticTokenType::KEYWORD,
        Category::Operators => SemanticTokenType::OPERATOR,
        Category::Number | Category::Zero | Category::Empty => SemanticTokenType::NUMBER,
        Category::String => SemanticTokenType::STRING,
        Category::Comment => SemanticTokenType::COMMENT,
        other => SemanticTokenType::new(other.as_str()),
    }
}

fn type_index(category: Category) -> u32 {
    Category::ALL
        .iter()
        .position(|c| *c == category)
        .unwrap_or_default() as u32
}

/// A raw token with absolute position before delta-encoding.
struct RawSemanticToken {
    line: u32,
    col: u32,
    length: u32,
    token_type: u32,
}

pub fn compute_semantic_tokens(content: &str, config: &ModeConfig) -> Vec<SemanticToken> {
    let mut raw = Vec::new();
    for ((index, highlighted), text) in highlight_document(content, config)
        .into_iter()
        .enumerate()
        .zip(source_lines(content))
    {
        for span in highlighted.spans {
            let col = utf16_column(text, span.start);
            let end = utf16_column(text, span.start + span.length);
            raw.push(RawSemanticToken {
                line: index as u32,
                col,
                length: end - col,
                token_type: type_index(span.category),
            });
        }
    }
    delta_encode(&raw)
}

fn delta_encode(raw: &[RawSemanticToken]) -> Vec<SemanticToken> {
    let mut result = Vec::with_capacity(raw.len());
    let mut prev_line: u32 = 0;
    let mut prev_col: u32 = 0;

    for tok in raw {
        let delta_line = tok.line - prev_line;
        let delta_start = if delta_line == 0 {
            tok.col - prev_col
        } else {
            tok.col
        };

        result.push(SemanticToken {
            delta_line,
            delta_start,
            length: tok.length,
            token_type: tok.token_type,
            token_modifiers_bitset: 0,
        });

        prev_line = tok.line;
        prev_col = tok.col;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legend_covers_every_category() {
        let types = token_types();
        assert_eq!(types.len(), Category::ALL.len());
        assert_eq!(types[type_index(Category::Motion) as usize].as_str(), "motion");
        assert_eq!(types[type_index(Category::Number) as usize], SemanticTokenType::NUMBER);
    }

    #[test]
    fn tokens_are_delta_encoded() {
        let tokens = compute_semantic_tokens("move 10 steps\nshow", &ModeConfig::default());
        let starts: Vec<(u32, u32, u32)> = tokens
            .iter()
            .map(|t| (t.delta_line, t.delta_start, t.length))
            .collect();
        assert_eq!(starts, vec![(0, 0, 4), (0, 5, 2), (0, 3, 5), (1, 0, 4)]);
        assert_eq!(tokens[1].token_type, type_index(Category::Number));
    }
}
