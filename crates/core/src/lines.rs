//! Per-line parsing of a whole document.
//!
//! Lines are parsed independently, but a `define` line puts its
//! parameters in scope until the next blank line.

use crate::action::{Eval, Value};
use crate::ast::{Block, Definition};
use crate::catalog::{Category, Shape};
use crate::config::ModeConfig;
use crate::earley::Parser;
use crate::error::{ParseError, Warning};
use crate::grammar::Grammar;
use crate::language::{add_parameters, build_grammar};
use crate::lexer::{source_lines, tokenize, Token};

/// The result of parsing one line.
#[derive(Debug, Clone, PartialEq)]
pub enum Line {
    Blank,
    /// A line holding only a comment.
    Comment,
    Error {
        message: String,
    },
    Block(Block),
    Definition(Definition),
}

impl Line {
    /// Shape of a block or definition line.
    pub fn shape(&self) -> Option<Shape> {
        match self {
            Line::Block(block) => Some(block.shape()),
            Line::Definition(_) => Some(Shape::Hat),
            _ => None,
        }
    }
}

/// A parsed line with everything the highlighter needs.
#[derive(Debug, Clone)]
pub struct ParsedLine {
    pub tokens: Vec<Token>,
    pub line: Line,
    /// Categories painted by semantic actions, by token index.
    pub paints: Vec<(usize, Category)>,
    /// Number of derivations when the line was ambiguous.
    pub ambiguity: Option<usize>,
}

/// Parse one line of tokens with `grammar`.
pub fn parse_tokens(grammar: &Grammar, tokens: Vec<Token>) -> ParsedLine {
    if tokens.is_empty() {
        return ParsedLine {
            tokens,
            line: Line::Blank,
            paints: Vec::new(),
            ambiguity: None,
        };
    }

    let trees = match Parser::new(grammar).parse(&tokens) {
        Ok(trees) => trees,
        Err(err) => {
            return ParsedLine {
                tokens,
                line: Line::Error {
                    message: err.to_string(),
                },
                paints: Vec::new(),
                ambiguity: None,
            }
        }
    };
    let ambiguity = (trees.len() > 1).then_some(trees.len());
    let tree = &trees[0];

    let mut eval = Eval::new(&tokens);
    let value = tree.process(&mut eval);
    let paints = eval.paints;
    let line = match value {
        Value::Block(block) => Line::Block(*block),
        Value::Definition(definition) => Line::Definition(definition),
        Value::Nothing if tree.rule.name == "line" => Line::Comment,
        _ => Line::Error {
            message: ParseError::NotABlock.to_string(),
        },
    };
    ParsedLine {
        tokens,
        line,
        paints,
        ambiguity,
    }
}

/// Parses lines in order, tracking which definition's parameters are in
/// scope.
pub struct LineParser {
    start: Grammar,
    scoped: Option<Grammar>,
}

impl LineParser {
    pub fn new(config: &ModeConfig) -> Self {
        LineParser::with_grammar(build_grammar(config))
    }

    pub fn with_grammar(start: Grammar) -> Self {
        LineParser {
            start,
            scoped: None,
        }
    }

    /// The grammar the next line will be parsed with.
    pub fn grammar(&self) -> &Grammar {
        self.scoped.as_ref().unwrap_or(&self.start)
    }

    pub fn parse(&mut self, text: &str) -> ParsedLine {
        let parsed = parse_tokens(self.grammar(), tokenize(text));
        match &parsed.line {
            Line::Definition(definition) => self.enter(definition),
            Line::Blank => self.scoped = None,
            _ => {}
        }
        parsed
    }

    /// Put the parameters of `definition` in scope.
    pub fn enter(&mut self, definition: &Definition) {
        let mut grammar = self.start.copy();
        if let Err(err) = add_parameters(&mut grammar, definition) {
            tracing::warn!(%err, spec = %definition.spec, "skipping parameters");
        }
        self.scoped = Some(grammar);
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParsedLines {
    pub lines: Vec<Line>,
    pub warnings: Vec<Warning>,
}

/// Parse every line of `code`. Ambiguous lines use their first
/// derivation and are reported as warnings.
pub fn parse_lines(code: &str, config: &ModeConfig) -> ParsedLines {
    let mut parser = LineParser::new(config);
    let mut out = ParsedLines::default();
    for (index, text) in source_lines(code).enumerate() {
        let parsed = parser.parse(text);
        if let Some(count) = parsed.ambiguity {
            tracing::warn!(line = index + 1, count, "ambiguous parse");
            out.warnings.push(Warning {
                line: index + 1,
                message: format!("Ambiguous line: {} possible parses", count),
            });
        }
        out.lines.push(parsed.line);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Arg;

    fn parse(code: &str) -> Vec<Line> {
        parse_lines(code, &ModeConfig::default()).lines
    }

    fn selector(line: &Line) -> Option<&'static str> {
        match line {
            Line::Block(b) => b.selector(),
            _ => None,
        }
    }

    #[test]
    fn one_result_per_line() {
        let lines = parse("when flag clicked\nmove 10 steps\n\n// note\nfoo bar baz");
        assert_eq!(lines.len(), 5);
        assert_eq!(selector(&lines[0]), Some("event_whenflagclicked"));
        assert_eq!(selector(&lines[1]), Some("motion_movesteps"));
        assert_eq!(lines[2], Line::Blank);
        assert_eq!(lines[3], Line::Comment);
        assert!(matches!(lines[4], Line::Error { .. }));
    }

    #[test]
    fn arguments_are_coerced() {
        let lines = parse("move _ steps\nsay 10");
        match &lines[0] {
            Line::Block(b) => assert_eq!(b.args, vec![Arg::Number(0.0)]),
            other => panic!("unexpected {:?}", other),
        }
        match &lines[1] {
            Line::Block(b) => assert_eq!(b.args, vec![Arg::Text("10".into())]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn standalone_reporters_parse() {
        let lines = parse("x position\n(x position)\n<mouse down?>");
        assert!(lines.iter().all(|l| l.shape().map_or(false, Shape::is_reporter)), "{:?}", lines);
    }

    #[test]
    fn parameters_are_scoped_to_their_definition() {
        let lines = parse("define jump (height)\nchange y by height\n\nchange y by height");
        assert!(matches!(lines[0], Line::Definition(_)));
        assert_eq!(selector(&lines[1]), Some("motion_changeyby"));
        assert!(matches!(lines[3], Line::Error { .. }));
    }

    #[test]
    fn comment_after_block_keeps_block() {
        let lines = parse("show // visible");
        assert_eq!(selector(&lines[0]), Some("looks_show"));
    }

    #[test]
    fn stop_other_scripts_is_a_stack_block() {
        let lines = parse("stop other scripts in sprite\nstop all");
        assert_eq!(lines[0].shape(), Some(Shape::Stack));
        assert_eq!(lines[1].shape(), Some(Shape::Cap));
    }
}
