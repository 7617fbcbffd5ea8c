//! Completion candidates for a cursor position in a document.
//!
//! The lines of the current script before the cursor are replayed to find
//! which definition's parameters are in scope and whether `else` or `end`
//! may come next. The Earley completer then proposes every rule that could
//! continue the tokens before the cursor.

use std::cmp::Ordering;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::ast::BlockInfo;
use crate::catalog::{Category, Shape};
use crate::config::ModeConfig;
use crate::earley::{Completer, Completion, Parser};
use crate::grammar::{Action, Grammar, Symbol, SymbolSpec};
use crate::highlight::Nesting;
use crate::language::{build_grammar, prefer_rank};
use crate::lexer::{source_lines, tokenize, Token, TokenKind};
use crate::lines::LineParser;

/// Zero-based line and character column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

/// Characters of an inserted label to select afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub start: usize,
    pub length: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    /// Text to insert.
    pub label: String,
    /// Text to show in a menu.
    pub display: String,
    pub category: Option<Category>,
    /// Without a selection the cursor goes after the label.
    pub selection: Option<Selection>,
    /// Columns of the cursor line replaced by `label`.
    pub from: usize,
    pub to: usize,
}

pub struct Autocomplete {
    grammar: Grammar,
}

impl Autocomplete {
    pub fn new(config: &ModeConfig) -> Self {
        Autocomplete::with_grammar(build_grammar(config))
    }

    pub fn with_grammar(grammar: Grammar) -> Self {
        Autocomplete { grammar }
    }

    /// Ranked suggestions for `at`. Unless `explicit`, nothing is offered
    /// while the word under the cursor already completes a valid line.
    pub fn suggest(&self, text: &str, at: Position, explicit: bool) -> Vec<Suggestion> {
        let lines: Vec<&str> = source_lines(text).collect();
        let Some(current) = lines.get(at.line) else {
            return Vec::new();
        };
        let (grammar, nesting) = self.context(&lines, at.line);
        let suggestions = Hint {
            grammar: &grammar,
            line: LineAtCursor::new(current, at.column),
            suggest_end: nesting.end_allowed(),
            suggest_else: nesting.else_allowed(),
        }
        .compute(explicit);
        tracing::debug!(line = at.line, count = suggestions.len(), "completions");
        suggestions
    }

    /// Grammar in scope and open mouths just before line `index`.
    fn context(&self, lines: &[&str], index: usize) -> (Grammar, Nesting) {
        let start = lines[..index]
            .iter()
            .rposition(|l| l.trim_matches([' ', '\t']).is_empty())
            .map_or(0, |blank| blank + 1);
        let mut parser = LineParser::with_grammar(self.grammar.clone());
        let mut nesting = Nesting::default();
        for line in &lines[start..index] {
            nesting.apply(&parser.parse(line).line);
        }
        (parser.grammar().clone(), nesting)
    }
}

/// The cursor line split into tokens before and after the cursor.
struct LineAtCursor<'t> {
    indent: &'t str,
    tokens: Vec<Token>,
    /// Index of the first token after the cursor.
    cursor: usize,
    /// The cursor touches the end of the token before it.
    partial: bool,
    /// The text after the cursor starts with a space or `?`.
    padded: bool,
}

impl<'t> LineAtCursor<'t> {
    fn new(text: &'t str, column: usize) -> Self {
        let cut = text.char_indices().nth(column).map_or(text.len(), |(i, _)| i);
        let indent_len = text.len() - text.trim_start_matches([' ', '\t']).len();
        let indent = &text[..indent_len];
        let prefix = &text[indent_len.min(cut)..cut];
        let suffix = &text[cut..];

        let mut tokens = tokenize(prefix);
        let cursor = tokens.len();
        tokens.extend(tokenize(suffix));
        LineAtCursor {
            indent,
            tokens,
            cursor,
            partial: !prefix.is_empty() && !prefix.ends_with([' ', '\t']),
            padded: suffix.starts_with([' ', '?']),
        }
    }

    fn column_after(&self, count: usize) -> usize {
        self.indent.chars().count()
            + self.tokens[..count]
                .iter()
                .map(|t| t.text.chars().count())
                .sum::<usize>()
    }
}

struct Hint<'g, 't> {
    grammar: &'g Grammar,
    line: LineAtCursor<'t>,
    suggest_end: bool,
    suggest_else: bool,
}

/// A completion with its first symbol expanded.
struct Expansion<'c> {
    symbols: Vec<Symbol>,
    via: &'c Completion,
}

impl Expansion<'_> {
    fn selector(&self) -> &str {
        match self.via.rule.info() {
            Some(info) => info.selector().unwrap_or("procedures_call"),
            None => self.via.rule.name.as_str(),
        }
    }

    fn text(&self) -> String {
        let words: Vec<String> = self.symbols.iter().map(ToString::to_string).collect();
        words.join(" ")
    }
}

impl Hint<'_, '_> {
    fn compute(self, explicit: bool) -> Vec<Suggestion> {
        let to = self.line.column_after(self.line.cursor);
        let mut tokens = self.line.tokens.clone();
        let mut cursor = self.line.cursor;
        let is_valid = Parser::new(self.grammar).parse(&tokens).is_ok();

        let mut partial = None;
        if self.line.partial && cursor > 0 {
            partial = Some(tokens.remove(cursor - 1));
            cursor -= 1;
            // "stop all" should not go on to suggest "stop all sounds"
            if is_valid && !explicit {
                return Vec::new();
            }
        }
        let from = self.line.column_after(cursor);

        let completions: Vec<Completion> = Completer::new(self.grammar)
            .complete(&tokens, cursor)
            .into_iter()
            .filter(useful)
            .collect();
        let mut expansions: Vec<Expansion> = completions
            .iter()
            .flat_map(|c| self.expand(c))
            .collect();

        match &partial {
            Some(partial) => expansions.retain(|x| {
                partial.kind == TokenKind::Symbol
                    && first_word(x).is_some_and(|word| word.starts_with(partial.value.as_str()))
            }),
            None => {
                // single characters are key names
                expansions.retain(|x| !first_word(x).is_some_and(is_key));
                if cursor == tokens.len() && cursor > 0 {
                    expansions.retain(|x| !x.via.pre.is_empty());
                }
            }
        }

        expansions.sort_by(rank);

        expansions
            .iter()
            .filter_map(|x| self.render(x, partial.as_ref(), is_valid))
            .map(|(label, display, category, selection)| Suggestion {
                label,
                display,
                category,
                selection,
                from,
                to,
            })
            .collect()
    }

    fn expand<'c>(&self, completion: &'c Completion) -> Vec<Expansion<'c>> {
        static EXPANDED: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"^([md]_|[A-Z])").expect("expansion pattern compiles"));
        let Some((first, rest)) = completion.completion.split_first() else {
            return Vec::new();
        };
        let heads: Vec<Vec<Symbol>> = match first {
            // names are offered through their own rules
            Symbol::NonTerminal(name)
                if matches!(name.as_str(), "VariableName" | "ListName" | "ReporterParam") =>
            {
                Vec::new()
            }
            Symbol::NonTerminal(name) if name.starts_with('@') => self
                .grammar
                .first_rule(name)
                .map(|rule| vec![rule.symbols.clone()])
                .unwrap_or_default(),
            Symbol::NonTerminal(name) if EXPANDED.is_match(name) => self
                .grammar
                .rules_for(name)
                .map(|rule| rule.symbols.clone())
                .collect(),
            other => vec![vec![other.clone()]],
        };
        heads
            .into_iter()
            .map(|mut symbols| {
                symbols.extend_from_slice(rest);
                Expansion {
                    symbols,
                    via: completion,
                }
            })
            .collect()
    }

    fn render(
        &self,
        x: &Expansion<'_>,
        partial: Option<&Token>,
        is_valid: bool,
    ) -> Option<(String, String, Option<Category>, Option<Selection>)> {
        static BOOLEAN: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"^b[0-9]?$").expect("boolean pattern compiles"));

        let mut text = String::new();
        let mut selection = None;
        for (i, symbol) in x.symbols.iter().enumerate() {
            let part = match symbol {
                Symbol::Terminal(SymbolSpec {
                    kind: TokenKind::Symbol,
                    value: Some(value),
                }) => value.clone(),
                Symbol::Terminal(_) => return None,
                Symbol::NonTerminal(name) if name.starts_with('@') => self
                    .grammar
                    .first_rule(name)?
                    .symbols
                    .first()?
                    .as_terminal()?
                    .value
                    .clone()?,
                Symbol::NonTerminal(name) => {
                    let slot = if BOOLEAN.is_match(name) { "<>" } else { "_" };
                    if i > 0 {
                        text.push(' ');
                    }
                    if selection.is_none() {
                        selection = Some(Selection {
                            start: text.chars().count(),
                            length: slot.chars().count(),
                        });
                    }
                    text.push_str(slot);
                    continue;
                }
            };
            if i > 0 && part != "?" {
                text.push(' ');
            }
            text.push_str(&part);
        }

        if text == "<>" || text == "_" {
            return None;
        }
        if (text == "else" && !self.suggest_else) || (text == "end" && !self.suggest_end) {
            return None;
        }
        let display = text.clone();
        if let Some(stripped) = text.strip_suffix(" ?") {
            text = format!("{}?", stripped);
        }
        if !self.line.padded && !is_valid && partial.is_some_and(|p| p.trimmed() == text) {
            text.push(' ');
        }

        let info = x
            .via
            .rule
            .info()
            .or_else(|| x.via.predicted_by.last().and_then(|rule| rule.info()));
        if info.is_some_and(|info| matches!(info.shape(), Shape::CBlock | Shape::CBlockCap | Shape::IfBlock)) {
            if selection.is_none() {
                selection = Some(Selection {
                    start: text.chars().count(),
                    length: 0,
                });
            }
            text.push('\n');
            text.push_str(self.line.indent);
            text.push_str("end");
        }

        let category = info.map(BlockInfo::category).or(match x.via.rule.name.as_str() {
            "VariableName" => Some(Category::Variable),
            "ListName" => Some(Category::List),
            "define" => Some(Category::Custom),
            _ => None,
        });
        Some((text, display, category, selection))
    }
}

/// Drop completions that only restate what is already typed.
fn useful(c: &Completion) -> bool {
    if c.pre.len() == 1 && c.pre[0].as_nonterminal().is_some() {
        return false;
    }
    if c.pre.first().and_then(Symbol::as_nonterminal) == Some("block") {
        return false;
    }
    if matches!(c.rule.action, Action::NegativeNumber) {
        return false;
    }
    let starts_with_word = c.rule.symbols[0]
        .as_terminal()
        .is_some_and(|spec| spec.value.is_some());
    c.rule.info().is_some() || starts_with_word
}

fn first_word<'x>(x: &'x Expansion<'_>) -> Option<&'x str> {
    match x.symbols.first()? {
        Symbol::Terminal(SymbolSpec {
            kind: TokenKind::Symbol,
            value: Some(value),
        }) => Some(value),
        _ => None,
    }
}

fn is_key(word: &str) -> bool {
    let mut chars = word.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_ascii_lowercase() || c.is_ascii_digit())
}

/// Unlisted selectors first, then listed ones in list order, then by text.
fn rank(a: &Expansion<'_>, b: &Expansion<'_>) -> Ordering {
    let by_list = match (prefer_rank(a.selector()), prefer_rank(b.selector())) {
        (Some(i), Some(j)) => i.cmp(&j),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    };
    by_list.then_with(|| a.text().cmp(&b.text()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suggest(text: &str, line: usize, column: usize) -> Vec<Suggestion> {
        Autocomplete::new(&ModeConfig::default()).suggest(text, Position { line, column }, false)
    }

    fn labels(suggestions: &[Suggestion]) -> Vec<&str> {
        suggestions.iter().map(|s| s.label.as_str()).collect()
    }

    #[test]
    fn end_is_offered_only_inside_a_mouth() {
        let at_end = suggest("repeat 5", 0, 8);
        assert!(!labels(&at_end).contains(&"end"));

        let next_line = suggest("repeat 5\n", 1, 0);
        assert!(labels(&next_line).contains(&"end"));
        assert!(!labels(&next_line).contains(&"else"));

        let outside = suggest("show\n", 1, 0);
        assert!(!labels(&outside).contains(&"end"));
    }

    #[test]
    fn else_follows_an_open_if() {
        let text = "if <mouse down?> then\n  show\n  ";
        let suggestions = suggest(text, 2, 2);
        assert!(labels(&suggestions).contains(&"else"));
        assert!(labels(&suggestions).contains(&"end"));

        let closed = suggest("if <mouse down?> then\nelse\n", 2, 0);
        assert!(!labels(&closed).contains(&"else"));
        assert!(labels(&closed).contains(&"end"));
    }

    #[test]
    fn partial_words_filter_candidates() {
        let suggestions = suggest("mo", 0, 2);
        let move_steps = suggestions
            .iter()
            .find(|s| s.label == "move _ steps")
            .expect("move block");
        assert_eq!(move_steps.selection, Some(Selection { start: 5, length: 1 }));
        assert_eq!((move_steps.from, move_steps.to), (0, 2));
        assert_eq!(move_steps.category, Some(Category::Motion));
        assert!(suggestions.iter().all(|s| s.label.starts_with("mo")));
    }

    #[test]
    fn complete_words_need_an_explicit_request() {
        assert!(suggest("show", 0, 4).is_empty());
        let explicit = Autocomplete::new(&ModeConfig::default()).suggest(
            "stop all",
            Position { line: 0, column: 8 },
            true,
        );
        assert!(explicit.iter().all(|s| s.label.starts_with("all")));
    }

    #[test]
    fn c_blocks_close_themselves() {
        let suggestions = suggest("  for", 0, 5);
        let forever = suggestions
            .iter()
            .find(|s| s.display == "forever")
            .expect("forever");
        assert_eq!(forever.label, "forever\n  end");
        assert_eq!(forever.selection, Some(Selection { start: 7, length: 0 }));
        assert_eq!((forever.from, forever.to), (2, 5));
    }

    #[test]
    fn parameters_are_scoped_to_their_definition() {
        let inside = suggest("define check <ready>\nif re", 1, 5);
        assert!(labels(&inside).iter().any(|l| l.starts_with("ready")));

        let outside = suggest("define check <ready>\n\nif re", 2, 5);
        assert!(!labels(&outside).iter().any(|l| l.starts_with("ready")));
    }

    #[test]
    fn out_of_range_lines_give_nothing() {
        assert!(suggest("show", 3, 0).is_empty());
    }
}
