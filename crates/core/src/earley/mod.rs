//! Earley parsing and prefix completion over a [`Grammar`].
//!
//! The parser keeps every derivation of an ambiguous line; picking one is
//! left to the caller. The completer runs the same chart construction up
//! to the cursor and reports what could come next.

pub mod chart;
pub mod tree;

use std::rc::Rc;
use std::sync::Arc;

use crate::error::ParseError;
use crate::grammar::{Grammar, Rule, Symbol};
use crate::lexer::{Token, TokenKind};

pub use chart::{Chart, Item, ItemRef};
pub use tree::{Forest, Node, ParseTree, MAX_DERIVATIONS};

/// Start symbols tried in order: a statement line, then a standalone
/// reporter, then a standalone predicate.
pub const START_SYMBOLS: [&str; 3] = ["line", "r-value", "b8"];

pub struct Parser<'g> {
    grammar: &'g Grammar,
}

impl<'g> Parser<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Parser { grammar }
    }

    /// Derivations of a whole line from `start`, in chart order.
    pub fn parse_from(
        &self,
        start: &str,
        tokens: &[Token],
    ) -> Result<Vec<Rc<ParseTree>>, ParseError> {
        if let Some(err) = tokens.iter().find(|t| t.kind == TokenKind::Error) {
            return Err(ParseError::Token(err.value.clone()));
        }
        let chart = Chart::build(self.grammar, start, tokens, tokens.len());
        let reached = chart.reached();
        if reached < tokens.len() {
            let token = &tokens[reached];
            let shown = if token.kind == TokenKind::String {
                token.trimmed()
            } else {
                token.value.as_str()
            };
            return Err(ParseError::Unexpected(shown.to_owned()));
        }
        let mut forest = Forest::new(&chart);
        let mut trees = Vec::new();
        for at in chart.finished(start, tokens.len()) {
            for tree in forest.trees(at).iter() {
                if trees.len() >= MAX_DERIVATIONS {
                    break;
                }
                trees.push(Rc::clone(tree));
            }
        }
        if trees.is_empty() {
            return Err(ParseError::EndOfLine);
        }
        Ok(trees)
    }

    /// Parse a line, trying each of [`START_SYMBOLS`] in turn. The root
    /// rule of each tree names the start symbol that matched. On failure
    /// the error for `line` is reported.
    pub fn parse(&self, tokens: &[Token]) -> Result<Vec<Rc<ParseTree>>, ParseError> {
        let mut first_err = None;
        for start in START_SYMBOLS {
            match self.parse_from(start, tokens) {
                Ok(trees) => return Ok(trees),
                Err(err) => {
                    if first_err.is_none() {
                        first_err = Some(err);
                    }
                }
            }
        }
        Err(first_err.unwrap_or(ParseError::EndOfLine))
    }
}

/// A rule that could continue the input at the cursor.
#[derive(Debug, Clone)]
pub struct Completion {
    pub rule: Arc<Rule>,
    /// Token index where the rule starts.
    pub start: usize,
    /// Token index of the cursor.
    pub end: usize,
    /// Symbols already matched.
    pub pre: Vec<Symbol>,
    /// Symbols still to come, starting at the cursor.
    pub completion: Vec<Symbol>,
    pub predicted_by: Vec<Arc<Rule>>,
}

pub struct Completer<'g> {
    grammar: &'g Grammar,
}

impl<'g> Completer<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Completer { grammar }
    }

    /// Every partially matched `line` rule that is active at token index
    /// `cursor`. Returns nothing when the tokens before the cursor cannot
    /// start a line.
    pub fn complete(&self, tokens: &[Token], cursor: usize) -> Vec<Completion> {
        let cursor = cursor.min(tokens.len());
        if tokens[..cursor].iter().any(|t| t.kind == TokenKind::Error) {
            return Vec::new();
        }
        let chart = Chart::build(self.grammar, START_SYMBOLS[0], tokens, cursor);
        let Some(set) = chart.sets.get(cursor) else {
            return Vec::new();
        };
        set.items
            .iter()
            .filter(|item| !item.is_complete())
            .map(|item| Completion {
                rule: Arc::clone(&item.rule),
                start: item.origin,
                end: cursor,
                pre: item.rule.symbols[..item.dot].to_vec(),
                completion: item.rule.symbols[item.dot..].to_vec(),
                predicted_by: item.predicted_by.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Action;
    use crate::lexer::tokenize;

    fn grammar() -> Grammar {
        Grammar::from_rules([
            Rule::new("line", vec![Symbol::nt("cmd")], Action::Pick(0)),
            Rule::new(
                "cmd",
                vec![Symbol::word("move"), Symbol::token(TokenKind::Number), Symbol::word("steps")],
                Action::Nothing,
            ),
            Rule::new("cmd", vec![Symbol::word("forever")], Action::Nothing),
        ])
        .expect("grammar")
    }

    #[test]
    fn parse_reports_the_unexpected_token() {
        let g = grammar();
        let parser = Parser::new(&g);
        assert!(parser.parse(&tokenize("move 10 steps")).is_ok());
        assert_eq!(
            parser.parse(&tokenize("move ten steps")).expect_err("fails"),
            ParseError::Unexpected("ten".into())
        );
        assert_eq!(
            parser.parse(&tokenize("move 10")).expect_err("fails"),
            ParseError::EndOfLine
        );
        assert_eq!(
            parser.parse(&tokenize("move 10 @@")).expect_err("fails"),
            ParseError::Unexpected("@@".into())
        );
    }

    #[test]
    fn completer_offers_continuations() {
        let g = grammar();
        let completer = Completer::new(&g);
        let tokens = tokenize("move 10 ");
        let items = completer.complete(&tokens, tokens.len());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].completion, vec![Symbol::word("steps")]);
        assert_eq!(items[0].pre.len(), 2);

        let at_start = completer.complete(&[], 0);
        let firsts: Vec<String> = at_start
            .iter()
            .filter_map(|c| c.completion.first().map(|s| s.to_string()))
            .collect();
        assert!(firsts.contains(&"move".to_owned()));
        assert!(firsts.contains(&"forever".to_owned()));
    }

    #[test]
    fn completer_gives_up_on_dead_prefix() {
        let g = grammar();
        let tokens = tokenize("jump around");
        assert!(Completer::new(&g).complete(&tokens, 2).is_empty());
    }
}
