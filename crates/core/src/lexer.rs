//! Line tokenizer.
//!
//! Every token keeps its raw text including trailing whitespace, so the
//! concatenated texts of a line's tokens reproduce the line exactly.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenKind {
    Ellipsis,
    Comment,
    /// `<>`
    False,
    /// `()`
    Zero,
    /// `_`
    Empty,
    Number,
    Color,
    String,
    LParen,
    RParen,
    LAngle,
    RAngle,
    LSquare,
    RSquare,
    Cloud,
    Input,
    Symbol,
    Iden,
    /// Backslash escape inside a split string token.
    Escape,
    /// Terminal token; its value is the error message.
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub value: String,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, value: impl Into<String>) -> Self {
        Token {
            kind,
            text: text.into(),
            value: value.into(),
        }
    }

    /// Raw text without surrounding whitespace.
    pub fn trimmed(&self) -> &str {
        self.text.trim_matches(|c| c == ' ' || c == '\t')
    }
}

/// Ordered token table; the first pattern that matches at the cursor wins.
static TOKENS: Lazy<Vec<(TokenKind, Regex)>> = Lazy::new(|| {
    [
        (TokenKind::Ellipsis, r"\.{3}"),
        (TokenKind::Comment, r"//(.*)$"),
        (TokenKind::False, r"<>"),
        (TokenKind::Zero, r"\(\)"),
        (TokenKind::Empty, r"_( |$)"),
        (TokenKind::Number, r"([0-9]+(\.[0-9]+)?e-?[0-9]+)"),
        (TokenKind::Number, r"((0|[1-9][0-9]*)?\.[0-9]+)"),
        (TokenKind::Number, r"((0|[1-9][0-9]*)\.[0-9]*)"),
        (TokenKind::Number, r"(0|[1-9][0-9]*)"),
        (TokenKind::Color, r"#([A-Fa-f0-9]{3}(?:[A-Fa-f0-9]{3})?)"),
        (TokenKind::String, r#""((\\["\\]|[^"\\])*)""#),
        (TokenKind::String, r#"'((\\['\\]|[^'\\])*)'"#),
        (TokenKind::LParen, r"\("),
        (TokenKind::RParen, r"\)"),
        (TokenKind::LAngle, r"<"),
        (TokenKind::RAngle, r">"),
        (TokenKind::LSquare, r"\["),
        (TokenKind::RSquare, r"\]"),
        (TokenKind::Cloud, r"[☁]"),
        (TokenKind::Input, r"%[a-z](?:\.[a-zA-Z]+)?"),
        (TokenKind::Symbol, r"[-%#+*/=^,?]"),
        (TokenKind::Symbol, r"[_A-Za-z][-_A-Za-z0-9:',.]*"),
        (TokenKind::Iden, r#"[^ \t"'()<>=*/+-]+"#),
    ]
    .into_iter()
    .map(|(kind, pat)| {
        let re = Regex::new(&format!("^(?:{})", pat)).expect("token pattern compiles");
        (kind, re)
    })
    .collect()
});

/// Whitespace between tokens. End of line counts as whitespace.
static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[ \t]+|$)").expect("whitespace pattern compiles"));

static ESCAPE_DOUBLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\\["\\]"#).expect("escape pattern compiles"));
static ESCAPE_SINGLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\['\\]").expect("escape pattern compiles"));

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Length of the whitespace run at the start of `s`, or `None` when `s`
/// neither starts with whitespace nor is empty.
fn leading_whitespace(s: &str) -> Option<usize> {
    WHITESPACE.find(s).map(|m| m.end())
}

fn match_token(remain: &str) -> Option<(TokenKind, usize, String)> {
    for (kind, re) in TOKENS.iter() {
        if let Some(caps) = re.captures(remain) {
            let whole = caps.get(0)?;
            let value = caps
                .get(1)
                .map(|m| m.as_str())
                .unwrap_or_else(|| whole.as_str());
            return Some((*kind, whole.end(), value.to_owned()));
        }
    }
    None
}

/// Lines of a document, split on `\n` with any `\r` before it dropped.
/// A trailing newline yields a final empty line.
pub fn source_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n').map(|line| line.strip_suffix('\r').unwrap_or(line))
}

/// Tokenize a single line.
///
/// Tokenization stops at the first error: an `Unknown token` or
/// `Expected whitespace` error token covers the rest of the line.
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut remain = input;
    let mut leading = "";
    if let Some(n) = leading_whitespace(remain) {
        leading = &remain[..n];
        remain = &remain[n..];
    }

    let mut tokens: Vec<Token> = Vec::new();
    let mut saw_whitespace = true;
    let mut expected_whitespace = false;

    let push_error = |tokens: &mut Vec<Token>, remain: &str, message: &str| {
        let text = if tokens.is_empty() {
            format!("{}{}", leading, remain)
        } else {
            remain.to_owned()
        };
        tokens.push(Token::new(TokenKind::Error, text, message));
    };

    while !remain.is_empty() {
        let Some((kind, len, mut value)) = match_token(remain) else {
            push_error(&mut tokens, remain, "Unknown token");
            return tokens;
        };
        if kind == TokenKind::Empty {
            value.clear();
        }
        let mut text = remain[..len].to_owned();

        // an identifier may immediately follow a symbol
        if kind == TokenKind::Iden
            && tokens.last().map(|t| t.kind) == Some(TokenKind::Symbol)
        {
            expected_whitespace = false;
        }
        if expected_whitespace && char_len(&text) > 1 && !saw_whitespace {
            push_error(&mut tokens, remain, "Expected whitespace");
            return tokens;
        }

        remain = &remain[len..];
        saw_whitespace = match leading_whitespace(remain) {
            Some(n) => {
                text.push_str(&remain[..n]);
                remain = &remain[n..];
                true
            }
            None => false,
        };
        if kind == TokenKind::Empty {
            saw_whitespace = true;
        }

        if kind == TokenKind::Iden {
            if let Some(last) = tokens.last_mut() {
                if last.kind == TokenKind::Symbol && !last.text.ends_with([' ', '\t']) {
                    last.text.push_str(&text);
                    last.value.push_str(&value);
                    last.kind = TokenKind::Iden;
                    expected_whitespace = true;
                    continue;
                }
            }
        }

        if tokens.is_empty() {
            text = format!("{}{}", leading, text);
        }
        expected_whitespace = char_len(&text) > 1;
        tokens.push(Token::new(kind, text, value));
    }
    tokens
}

/// Split a string token into alternating `string` and `escape` parts for
/// highlighting. The parts' texts concatenate to the token's text.
pub fn split_string_token(token: &Token) -> Vec<Token> {
    let quote = token.trimmed().chars().next().unwrap_or('"');
    let escape = if quote == '"' {
        &*ESCAPE_DOUBLE
    } else {
        &*ESCAPE_SINGLE
    };

    let mut parts = Vec::new();
    let mut last = 0;
    for m in escape.find_iter(&token.text) {
        parts.push(&token.text[last..m.start()]);
        parts.push(m.as_str());
        last = m.end();
    }
    parts.push(&token.text[last..]);

    let mut out: Vec<Token> = Vec::new();
    for part in parts {
        if part.is_empty() {
            continue;
        }
        let mut chars = part.chars();
        if chars.next() == Some('\\') && part.len() == 2 {
            let escaped = chars.as_str();
            if escaped == "\\" || escaped.starts_with(quote) {
                out.push(Token::new(TokenKind::Escape, "\\", "\\"));
                out.push(Token::new(TokenKind::String, escaped, escaped));
                continue;
            }
        }
        let mut text = part;
        let ws = text.len() - text.trim_start_matches([' ', '\t']).len();
        if ws > 0 {
            if let Some(prev) = out.last_mut() {
                prev.text.push_str(&text[..ws]);
                text = &text[ws..];
                if text.is_empty() {
                    continue;
                }
            }
        }
        out.push(Token::new(TokenKind::String, text, text));
    }
    out
}

/// Concatenated raw text of `tokens`.
pub fn join_text(tokens: &[Token]) -> String {
    tokens.iter().map(|t| t.text.as_str()).collect()
}
