//! tosh-core: the tosh language and its two-way compiler to Scratch blocks.
//!
//! Text goes through the [`lexer`] and the Earley [`earley::Parser`] bound
//! to a [`grammar::Grammar`] built by [`language`], one line at a time
//! ([`lines`]). The [`compile`] pass turns parsed lines into a block graph
//! held by a [`target::Target`]; [`generate`] turns a block graph back into
//! canonical text. [`highlight`] and [`autocomplete`] serve editors.
//!
//! # Public API
//!
//! - [`compile()`] -- parsed lines into a target's block store
//! - [`generate()`] -- block store into canonical text
//! - [`parse_lines()`] -- a document into per-line results and warnings
//! - [`Autocomplete`] -- ranked suggestions at a cursor
//! - [`highlight_document()`] -- per-line highlight spans
//! - [`ModeConfig`] -- variables, lists and custom blocks in scope

pub mod action;
pub mod ast;
pub mod autocomplete;
pub mod catalog;
pub mod compile;
pub mod config;
pub mod earley;
pub mod error;
pub mod generate;
pub mod grammar;
pub mod highlight;
pub mod language;
pub mod lexer;
pub mod lines;
pub mod menus;
pub mod target;

// ── Convenience re-exports: key types ────────────────────────────────

pub use autocomplete::{Autocomplete, Position, Selection, Suggestion};
pub use catalog::{Category, Shape};
pub use config::ModeConfig;
pub use error::{CompileError, ConfigError, GenerateError, Warning};
pub use highlight::{HighlightedLine, Span};
pub use lines::{Line, ParsedLines};
pub use target::{BlockStore, Target, VariableKind};

// ── Convenience re-exports: entry points ─────────────────────────────

pub use compile::compile;
pub use generate::generate;
pub use highlight::{highlight_document, indent_depth};
pub use lexer::{source_lines, tokenize};
pub use lines::parse_lines;
