//! Grammar model: symbols, rules and rule tables.
//!
//! A [`Grammar`] is a stack of frozen rule tables shared behind `Arc`,
//! plus a private overlay that new rules are appended to. Copying a
//! grammar duplicates only the overlay, so scoped extensions (custom block
//! parameters inside one definition) never leak into sibling scopes.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::ast::{BlockInfo, Literal};
use crate::catalog::Category;
use crate::error::GrammarError;
use crate::lexer::{Token, TokenKind};

/// Terminal matcher: a token kind plus an optional exact value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SymbolSpec {
    pub kind: TokenKind,
    pub value: Option<String>,
}

impl SymbolSpec {
    pub fn kind(kind: TokenKind) -> Self {
        SymbolSpec { kind, value: None }
    }

    pub fn exact(kind: TokenKind, value: impl Into<String>) -> Self {
        SymbolSpec {
            kind,
            value: Some(value.into()),
        }
    }

    /// A literal word, e.g. `move` or `?`.
    pub fn word(value: impl Into<String>) -> Self {
        SymbolSpec::exact(TokenKind::Symbol, value)
    }

    pub fn matches(&self, token: &Token) -> bool {
        self.kind == token.kind
            && self
                .value
                .as_ref()
                .map_or(true, |value| *value == token.value)
    }
}

impl fmt::Display for SymbolSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.kind, &self.value) {
            (TokenKind::LParen, _) => f.write_str("("),
            (TokenKind::RParen, _) => f.write_str(")"),
            (TokenKind::LAngle, _) => f.write_str("<"),
            (TokenKind::RAngle, _) => f.write_str(">"),
            (TokenKind::False, _) => f.write_str("<>"),
            (TokenKind::Comment, _) => f.write_str("// …"),
            (_, Some(value)) => f.write_str(value),
            (kind, None) => write!(f, "{:?}", kind),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Symbol {
    Terminal(SymbolSpec),
    NonTerminal(String),
}

impl Symbol {
    pub fn nt(name: impl Into<String>) -> Self {
        Symbol::NonTerminal(name.into())
    }

    pub fn word(value: impl Into<String>) -> Self {
        Symbol::Terminal(SymbolSpec::word(value))
    }

    pub fn token(kind: TokenKind) -> Self {
        Symbol::Terminal(SymbolSpec::kind(kind))
    }

    pub fn as_terminal(&self) -> Option<&SymbolSpec> {
        match self {
            Symbol::Terminal(spec) => Some(spec),
            Symbol::NonTerminal(_) => None,
        }
    }

    pub fn as_nonterminal(&self) -> Option<&str> {
        match self {
            Symbol::NonTerminal(name) => Some(name),
            Symbol::Terminal(_) => None,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Terminal(spec) => spec.fmt(f),
            Symbol::NonTerminal(name) => f.write_str(name),
        }
    }
}

/// Semantic action attached to a rule. Evaluation lives in
/// [`crate::action`]; the variants are plain data so grammars can be
/// inspected and compared.
#[derive(Debug, Clone)]
pub enum Action {
    /// Pass child `n` through unchanged.
    Pick(usize),
    /// A comment-only line.
    Nothing,
    Constant(Literal),
    /// The token's value as text.
    Literal,
    Number,
    /// `-` followed by a number token.
    NegativeNumber,
    StringLiteral,
    HexColor,
    NamedColor,
    /// `( … )` or `< … >` around an expression.
    Brackets,
    /// Menu option or name: keep the tokens, the value is their text.
    Embed,
    /// Menu option stored under a different value than its label.
    EmbedConstant(Literal),
    /// Build a block from the children at `args`.
    Block { info: BlockInfo, args: Vec<usize> },
    Definition,
    Param,
    /// `%n[name]` style parameter.
    HackedParam,
    PaintLiteral(Category),
    PaintWords(Category),
    Paint(Category),
    PaintList(Category),
    Box,
    Push,
    /// Append the third child, skipping a separator.
    Push2,
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub name: String,
    pub symbols: Vec<Symbol>,
    pub action: Action,
}

impl Rule {
    pub fn new(name: impl Into<String>, symbols: Vec<Symbol>, action: Action) -> Self {
        Rule {
            name: name.into(),
            symbols,
            action,
        }
    }

    /// Block info for rules that build a block.
    pub fn info(&self) -> Option<&BlockInfo> {
        match &self.action {
            Action::Block { info, .. } => Some(info),
            _ => None,
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} →", self.name)?;
        for symbol in &self.symbols {
            write!(f, " {}", symbol)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
struct RuleTable {
    by_name: HashMap<String, Vec<Arc<Rule>>>,
    len: usize,
}

impl RuleTable {
    fn push(&mut self, rule: Arc<Rule>) {
        self.by_name.entry(rule.name.clone()).or_default().push(rule);
        self.len += 1;
    }

    fn get(&self, name: &str) -> &[Arc<Rule>] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default)]
pub struct Grammar {
    layers: Vec<Arc<RuleTable>>,
    overlay: RuleTable,
}

impl Grammar {
    pub fn new() -> Self {
        Grammar::default()
    }

    pub fn from_rules(rules: impl IntoIterator<Item = Rule>) -> Result<Self, GrammarError> {
        let mut grammar = Grammar::new();
        for rule in rules {
            grammar.add_rule(rule)?;
        }
        Ok(grammar)
    }

    /// Append a rule. Rules must have at least one symbol: the parser has
    /// no support for empty productions.
    pub fn add_rule(&mut self, rule: Rule) -> Result<Arc<Rule>, GrammarError> {
        if rule.symbols.is_empty() {
            return Err(GrammarError::EmptyRule(rule.name));
        }
        let rule = Arc::new(rule);
        self.overlay.push(Arc::clone(&rule));
        Ok(rule)
    }

    /// An independent copy. Existing rules are shared, new rules added to
    /// either side are not.
    pub fn copy(&self) -> Grammar {
        self.clone()
    }

    /// Freeze the rules added so far into a shared layer. Later copies of
    /// the result share them without cloning the table.
    pub fn scope(&self) -> Grammar {
        let mut layers = self.layers.clone();
        if self.overlay.len > 0 {
            layers.push(Arc::new(self.overlay.clone()));
        }
        Grammar {
            layers,
            overlay: RuleTable::default(),
        }
    }

    /// Rules for `name` in insertion order.
    pub fn rules_for<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Arc<Rule>> + 'a {
        self.layers
            .iter()
            .flat_map(move |layer| layer.get(name).iter())
            .chain(self.overlay.get(name).iter())
    }

    pub fn first_rule<'a>(&'a self, name: &'a str) -> Option<&'a Arc<Rule>> {
        self.rules_for(name).next()
    }

    pub fn has_rules(&self, name: &str) -> bool {
        self.first_rule(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.layers.iter().map(|l| l.len).sum::<usize>() + self.overlay.len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
