use serde::{Deserialize, Serialize};

/// A compile failure, reported against a 1-based source line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, thiserror::Error)]
#[error("line {line}: {message}")]
pub struct CompileError {
    pub line: usize,
    pub message: String,
}

impl CompileError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        CompileError {
            line,
            message: message.into(),
        }
    }

    /// Serialize to the `{line, message}` shape editors consume.
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "line": self.line,
            "message": self.message,
        })
    }
}

/// A non-fatal diagnostic, e.g. an ambiguous parse.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Warning {
    pub line: usize,
    pub message: String,
}

/// Why a single line failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The tokenizer gave up on this line (`Unknown token`, `Expected whitespace`).
    #[error("{0}")]
    Token(String),
    #[error("Unexpected {0}")]
    Unexpected(String),
    #[error("Unexpected end of line")]
    EndOfLine,
    #[error("Expected a block")]
    NotABlock,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GrammarError {
    #[error("rule {0} has no symbols")]
    EmptyRule(String),
    #[error("name {name:?} is not valid here: {message}")]
    InvalidName { name: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("unknown opcode: {0}")]
    UnknownOpcode(String),
    #[error("missing block: {0}")]
    MissingBlock(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerateError {
    #[error("missing block: {0}")]
    MissingBlock(String),
    #[error("block {0} has no usable mutation")]
    BadMutation(String),
    #[error("block {0} links back into its own script")]
    Cycle(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("error reading config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid definition {line:?}: {message}")]
    Definition { line: String, message: String },
}
