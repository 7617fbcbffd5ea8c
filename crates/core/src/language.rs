//! The tosh language: the static grammar generated from the block catalog
//! and the menu tables, plus the dynamic rules contributed by variables,
//! lists, custom blocks and their parameters.

use std::collections::HashSet;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::action::COLORS;
use crate::ast::{BlockInfo, CustomBlock, Definition, Literal};
use crate::catalog::{self, Category, Part, Shape};
use crate::config::ModeConfig;
use crate::error::GrammarError;
use crate::grammar::{Action, Grammar, Rule, Symbol, SymbolSpec};
use crate::lexer::{tokenize, TokenKind};
use crate::menus::{self, MENUS};

// ── Rule construction ────────────────────────────────────────────────

fn nt(name: &str) -> Symbol {
    Symbol::nt(name)
}

fn w(word: &str) -> Symbol {
    Symbol::word(word)
}

fn t(kind: TokenKind) -> Symbol {
    Symbol::token(kind)
}

#[derive(Default)]
struct Rules(Vec<Rule>);

impl Rules {
    fn add(&mut self, name: &str, symbols: Vec<Symbol>, action: Action) {
        self.0.push(Rule::new(name, symbols, action));
    }

    fn pick(&mut self, name: &str, child: &str) {
        self.add(name, vec![nt(child)], Action::Pick(0));
    }

    fn block(&mut self, name: &str, symbols: Vec<Symbol>, selector: &str, args: &[usize]) {
        match catalog::block(selector) {
            Some(d) => self.add(
                name,
                symbols,
                Action::Block {
                    info: BlockInfo::Builtin(d),
                    args: args.to_vec(),
                },
            ),
            None => tracing::error!(selector, "grammar references unknown block"),
        }
    }

    fn infix(&mut self, name: &str, symbols: Vec<Symbol>, selector: &str) {
        self.block(name, symbols, selector, &[0, 2]);
    }

    fn into_grammar(self) -> Grammar {
        let mut grammar = Grammar::new();
        for rule in self.0 {
            if let Err(err) = grammar.add_rule(rule) {
                tracing::error!(%err, "invalid static rule");
            }
        }
        grammar.scope()
    }
}

/// Turn one word of a spec or menu option into a terminal. Words that
/// tokenize as something other than a plain symbol keep their kind, so
/// `10` matches a number token.
fn word_symbol(word: &str) -> Result<Symbol, GrammarError> {
    let tokens = tokenize(word);
    match tokens.as_slice() {
        [token] if token.kind == TokenKind::Symbol => Ok(Symbol::word(token.value.clone())),
        [token] if token.kind != TokenKind::Error => Ok(Symbol::Terminal(SymbolSpec::exact(
            token.kind,
            token.value.clone(),
        ))),
        _ => Err(GrammarError::InvalidName {
            name: word.to_owned(),
            message: "not a single token".into(),
        }),
    }
}

fn text_symbols(text: &str) -> Result<Vec<Symbol>, GrammarError> {
    text.split(' ')
        .filter(|s| !s.is_empty())
        .map(word_symbol)
        .collect()
}

/// Split literal spec text into words. `?` always stands alone.
fn spec_words(text: &str) -> Vec<&str> {
    let mut words = Vec::new();
    for chunk in text.split(' ') {
        let mut rest = chunk;
        while let Some(i) = rest.find('?') {
            if i > 0 {
                words.push(&rest[..i]);
            }
            words.push("?");
            rest = &rest[i + 1..];
        }
        if !rest.is_empty() {
            words.push(rest);
        }
    }
    words
}

/// Terminals matching a user-chosen name exactly as it tokenizes.
pub fn name_symbols(name: &str) -> Result<Vec<Symbol>, GrammarError> {
    let tokens = tokenize(name);
    if tokens.is_empty() {
        return Err(GrammarError::InvalidName {
            name: name.to_owned(),
            message: "empty name".into(),
        });
    }
    tokens
        .into_iter()
        .map(|token| {
            if token.kind == TokenKind::Error {
                Err(GrammarError::InvalidName {
                    name: name.to_owned(),
                    message: token.value,
                })
            } else {
                Ok(Symbol::Terminal(SymbolSpec::exact(token.kind, token.value)))
            }
        })
        .collect()
}

// ── Define lines ─────────────────────────────────────────────────────

fn define_rules(rules: &mut Rules) {
    rules.add("line", vec![nt("define"), nt("spec-seq")], Action::Definition);

    rules.add("define", vec![w("define")], Action::PaintLiteral(Category::Custom));
    rules.add("define", vec![w("define-atomic")], Action::PaintLiteral(Category::Custom));

    rules.add("spec-seq", vec![nt("spec-seq"), nt("spec")], Action::Push);
    rules.add("spec-seq", vec![nt("spec")], Action::Box);

    for kind in [TokenKind::Symbol, TokenKind::Iden, TokenKind::Number] {
        rules.add("spec", vec![t(kind)], Action::PaintLiteral(Category::Custom));
    }
    rules.add(
        "spec",
        vec![t(TokenKind::LParen), nt("arg-words"), t(TokenKind::RParen)],
        Action::Param,
    );
    rules.add(
        "spec",
        vec![t(TokenKind::LAngle), nt("arg-words"), t(TokenKind::RAngle)],
        Action::Param,
    );
    rules.add(
        "spec",
        vec![
            t(TokenKind::Input),
            t(TokenKind::LSquare),
            nt("arg-words"),
            t(TokenKind::RSquare),
        ],
        Action::HackedParam,
    );

    rules.add("arg-words", vec![nt("word-seq")], Action::PaintList(Category::Parameter));
    rules.add("word-seq", vec![nt("word-seq"), nt("word")], Action::Push);
    rules.add("word-seq", vec![nt("word")], Action::Box);
    for kind in [TokenKind::Symbol, TokenKind::Iden, TokenKind::Number] {
        rules.add("word", vec![t(kind)], Action::Pick(0));
    }
}

static DEFINE: Lazy<Grammar> = Lazy::new(|| {
    let mut rules = Rules::default();
    define_rules(&mut rules);
    rules.into_grammar()
});

/// Grammar for `define` lines on their own.
pub fn define_grammar() -> &'static Grammar {
    &DEFINE
}

pub fn is_definition_line(line: &str) -> bool {
    static DEFINE_LINE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^[ \t]*define(-atomic)? ").expect("define pattern compiles"));
    DEFINE_LINE.is_match(line)
}

// ── Core grammar ─────────────────────────────────────────────────────
//
// Precedence, loosest first:
//   8. and, or (parenthesized when nested in each other)
//   7. not
//   6. <, >, =, contains
//   4. +, -
//   3. *, /, mod
//   2. right-recursive reporters (round, of, pick random, ...)
//   1. parentheses, simple reporters
//   0. literals

fn core_rules(r: &mut Rules) {
    r.pick("line", "thing");
    r.add("line", vec![nt("thing"), t(TokenKind::Comment)], Action::Pick(0));
    r.add("line", vec![t(TokenKind::Comment)], Action::Nothing);

    r.pick("thing", "block");
    r.pick("thing", "r-parens");
    r.pick("thing", "b-parens");

    r.pick("n", "n4");
    r.pick("sb", "join");
    r.pick("sb", "n4");
    r.pick("sb", "s0");
    r.pick("b", "b8");
    r.pick("c", "r-parens");
    r.pick("c", "c0");

    r.add(
        "r-parens",
        vec![t(TokenKind::LParen), nt("r-value"), t(TokenKind::RParen)],
        Action::Brackets,
    );
    r.pick("r-value", "join");
    r.pick("r-value", "n4");
    r.add(
        "b-parens",
        vec![t(TokenKind::LAngle), nt("b8"), t(TokenKind::RAngle)],
        Action::Brackets,
    );

    r.pick("predicate", "simple-predicate");

    r.block("join", vec![w("join"), nt("jpart"), nt("jpart")], "operator_join", &[1, 2]);
    r.pick("jpart", "s0");
    r.add("jpart", vec![t(TokenKind::Empty)], Action::Constant(Literal::text("")));
    r.pick("jpart", "join");
    r.pick("jpart", "r-parens");
    r.pick("jpart", "b-parens");

    r.block(
        "predicate",
        vec![w("touching"), w("color"), nt("c"), w("?")],
        "sensing_touchingcolor",
        &[2],
    );
    r.block(
        "predicate",
        vec![w("color"), nt("c"), w("is"), w("touching"), nt("c"), w("?")],
        "sensing_coloristouchingcolor",
        &[1, 4],
    );

    r.pick("b8", "b-and");
    r.pick("b8", "b-or");
    r.pick("b8", "b7");

    r.infix("b-and", vec![nt("b-and"), w("and"), nt("b7")], "operator_and");
    r.infix("b-and", vec![nt("b7"), w("and"), nt("b7")], "operator_and");
    r.infix("b-or", vec![nt("b-or"), w("or"), nt("b7")], "operator_or");
    r.infix("b-or", vec![nt("b7"), w("or"), nt("b7")], "operator_or");

    r.block("b7", vec![w("not"), nt("b7")], "operator_not", &[1]);
    r.pick("b7", "b6");

    // `<` and `>` tokenize as angle brackets, not symbols
    r.infix("b6", vec![nt("sb"), t(TokenKind::LAngle), nt("sb")], "operator_lt");
    r.infix("b6", vec![nt("sb"), t(TokenKind::RAngle), nt("sb")], "operator_gt");
    r.infix("b6", vec![nt("sb"), w("="), nt("sb")], "operator_equals");
    r.infix(
        "b6",
        vec![nt("sb"), w("contains"), nt("sb"), w("?")],
        "operator_contains",
    );
    r.infix(
        "b6",
        vec![nt("m_listNonempty"), w("contains"), nt("sb"), w("?")],
        "data_listcontainsitem",
    );
    r.pick("b6", "predicate");
    r.pick("b6", "b2");

    r.pick("b2", "b-parens");
    r.pick("b2", "b0");

    r.infix("n4", vec![nt("n4"), w("+"), nt("n3")], "operator_add");
    r.infix("n4", vec![nt("n4"), w("-"), nt("n3")], "operator_subtract");
    r.pick("n4", "n3");

    r.infix("n3", vec![nt("n3"), w("*"), nt("n2")], "operator_multiply");
    r.infix("n3", vec![nt("n3"), w("/"), nt("n2")], "operator_divide");
    r.infix("n3", vec![nt("n3"), w("mod"), nt("n2")], "operator_mod");
    r.pick("n3", "n2");

    r.block("n2", vec![w("round"), nt("n2")], "operator_round", &[1]);
    r.infix("n2", vec![nt("m_mathOp"), w("of"), nt("n2")], "operator_mathop");
    r.block(
        "n2",
        vec![w("pick"), w("random"), nt("n4"), w("to"), nt("n2")],
        "operator_random",
        &[2, 4],
    );
    r.infix(
        "n2",
        vec![nt("m_attribute"), w("of"), nt("m_sensing_of_object_menu")],
        "sensing_of",
    );
    r.block(
        "n2",
        vec![w("distance"), w("to"), nt("m_sensing_distancetomenu")],
        "sensing_distanceto",
        &[2],
    );
    r.block("n2", vec![w("length"), w("of"), nt("s2")], "operator_length", &[2]);
    r.block(
        "n2",
        vec![w("letter"), nt("n"), w("of"), nt("s2")],
        "operator_letter_of",
        &[1, 3],
    );
    r.pick("n2", "n1");

    r.pick("n1", "simple-reporter");
    r.pick("n1", "r-parens");
    r.pick("n1", "b-parens");
    r.pick("n1", "n0");

    r.pick("s2", "s0");
    r.pick("s2", "n1");

    r.add("n0", vec![w("-"), t(TokenKind::Number)], Action::NegativeNumber);
    r.add("n0", vec![t(TokenKind::Number)], Action::Number);
    r.add("n0", vec![t(TokenKind::Empty)], Action::Constant(Literal::text("")));
    r.add("s0", vec![t(TokenKind::String)], Action::StringLiteral);
    r.add("b0", vec![t(TokenKind::False)], Action::Constant(Literal::Bool(false)));
    r.add("c0", vec![t(TokenKind::Color)], Action::HexColor);

    r.add("@greenFlag", vec![w("flag")], Action::Paint(Category::Green));
    r.add("@greenFlag", vec![w("green"), w("flag")], Action::Paint(Category::Green));
    r.add("@turnLeft", vec![w("ccw")], Action::Pick(0));
    r.add("@turnLeft", vec![w("left")], Action::Pick(0));
    r.add("@turnRight", vec![w("cw")], Action::Pick(0));
    r.add("@turnRight", vec![w("right")], Action::Pick(0));

    for (name, _) in COLORS {
        r.add("c0", vec![w(name)], Action::NamedColor);
    }
}

fn menu_rules(r: &mut Rules) {
    for menu in MENUS {
        let name = format!("m_{}", menu.name);
        if menu.accepts_reporters {
            r.pick(&name, "jpart");
        } else if menu.accepts_strings {
            r.pick(&name, "s0");
        }
        for option in menu.options {
            let symbols = match text_symbols(option) {
                Ok(symbols) => symbols,
                Err(err) => {
                    tracing::error!(menu = menu.name, %err, "skipping menu option");
                    continue;
                }
            };
            let action = match menus::option_value(menu.name, option) {
                Some(value) => Action::EmbedConstant(value),
                None => Action::Embed,
            };
            r.add(&name, symbols, action);
        }
        // reporter menus already accept `_` through `jpart`
        if !menu.must_not_be_empty && !menu.accepts_reporters {
            r.add(&name, vec![t(TokenKind::Empty)], Action::Literal);
        }
    }
    r.pick("m_var", "VariableName");
    r.pick("m_list", "ListName");
    r.pick("m_listNonempty", "ListName");
}

/// Blocks given hand-written rules above. `control_if` shares its rule
/// with `control_if_else`; the compiler picks one by what follows.
const ALREADY_DEFINED: &[&str] = &[
    "operator_letter_of",
    "operator_join",
    "operator_and",
    "operator_or",
    "operator_not",
    "operator_equals",
    "operator_lt",
    "operator_gt",
    "operator_contains",
    "data_listcontainsitem",
    "operator_random",
    "operator_length",
    "operator_round",
    "operator_mathop",
    "sensing_of",
    "sensing_distanceto",
    "operator_multiply",
    "operator_divide",
    "operator_mod",
    "operator_add",
    "operator_subtract",
    "control_if",
    "sensing_touchingcolor",
    "sensing_coloristouchingcolor",
];

fn catalog_rules(r: &mut Rules) {
    let mut done_specs = HashSet::new();
    for block in catalog::blocks() {
        if ALREADY_DEFINED.contains(&block.selector) {
            continue;
        }
        let param = block.selector.starts_with("argument_reporter_");
        // one display string must never compile to two opcodes
        if !done_specs.insert(block.spec) && !param {
            continue;
        }

        let mut symbols = Vec::new();
        let mut args = Vec::new();
        let mut valid = true;
        for part in &block.parts {
            match part {
                Part::Text(text) => {
                    for word in spec_words(text) {
                        if word.starts_with('@') {
                            symbols.push(nt(word));
                            continue;
                        }
                        match word_symbol(word) {
                            Ok(symbol) => symbols.push(symbol),
                            Err(err) => {
                                tracing::error!(selector = block.selector, %err, "bad spec word");
                                valid = false;
                            }
                        }
                    }
                }
                Part::Slot(slot) => {
                    args.push(symbols.len());
                    symbols.push(nt(&slot.nonterminal()));
                }
            }
        }
        if !valid {
            continue;
        }

        let mut name = match block.shape {
            Shape::Reporter => "simple-reporter",
            Shape::Predicate => "simple-predicate",
            _ => "block",
        };
        match block.selector {
            "data_variable" => symbols = vec![nt("VariableName")],
            "data_listcontents" => {
                symbols = vec![nt("ListName")];
                name = "r-value";
            }
            "argument_reporter_string_number" => symbols = vec![nt("ReporterParam")],
            "argument_reporter_boolean" => symbols = vec![nt("BooleanParam")],
            _ => {}
        }

        r.add(
            name,
            symbols,
            Action::Block {
                info: BlockInfo::Builtin(block),
                args,
            },
        );
    }
}

static BASE: Lazy<Grammar> = Lazy::new(|| {
    let mut rules = Rules::default();
    core_rules(&mut rules);
    menu_rules(&mut rules);
    catalog_rules(&mut rules);
    define_rules(&mut rules);
    rules.into_grammar()
});

/// The grammar shared by every document before any vocabulary is added.
pub fn base_grammar() -> &'static Grammar {
    &BASE
}

// ── Dynamic rules ────────────────────────────────────────────────────

pub fn add_variable(grammar: &mut Grammar, name: &str) -> Result<(), GrammarError> {
    grammar.add_rule(Rule::new("VariableName", name_symbols(name)?, Action::Embed))?;
    Ok(())
}

pub fn add_list(grammar: &mut Grammar, name: &str) -> Result<(), GrammarError> {
    grammar.add_rule(Rule::new("ListName", name_symbols(name)?, Action::Embed))?;
    Ok(())
}

/// Add the call rule for a custom block.
pub fn add_custom_block(
    grammar: &mut Grammar,
    definition: &Definition,
) -> Result<Arc<CustomBlock>, GrammarError> {
    let custom = Arc::new(definition.custom_block());
    let mut symbols = Vec::new();
    let mut args = Vec::new();
    for part in &custom.parts {
        match part {
            Part::Text(text) => {
                for token in tokenize(text) {
                    if token.kind == TokenKind::Error {
                        return Err(GrammarError::InvalidName {
                            name: custom.spec.clone(),
                            message: token.value,
                        });
                    }
                    symbols.push(Symbol::Terminal(SymbolSpec::exact(token.kind, token.value)));
                }
            }
            Part::Slot(slot) => {
                args.push(symbols.len());
                symbols.push(nt(&slot.nonterminal()));
            }
        }
    }
    grammar.add_rule(Rule::new(
        "block",
        symbols,
        Action::Block {
            info: BlockInfo::Custom(Arc::clone(&custom)),
            args,
        },
    ))?;
    Ok(custom)
}

/// Add rules for the parameters of `definition`, usable inside its body.
pub fn add_parameters(grammar: &mut Grammar, definition: &Definition) -> Result<(), GrammarError> {
    for param in definition.params() {
        let name = if param.arg == "b" {
            "BooleanParam"
        } else {
            "ReporterParam"
        };
        grammar.add_rule(Rule::new(
            name,
            name_symbols(&param.name)?,
            Action::PaintWords(Category::Parameter),
        ))?;
    }
    Ok(())
}

/// The grammar for one editing context. Names that cannot be expressed
/// in tosh are skipped with a warning.
pub fn build_grammar(config: &ModeConfig) -> Grammar {
    let mut grammar = base_grammar().copy();
    for name in &config.variables {
        if let Err(err) = add_variable(&mut grammar, name) {
            tracing::warn!(%err, "skipping variable");
        }
    }
    for name in &config.lists {
        if let Err(err) = add_list(&mut grammar, name) {
            tracing::warn!(%err, "skipping list");
        }
    }
    for definition in &config.definitions {
        if let Err(err) = add_custom_block(&mut grammar, definition) {
            tracing::warn!(%err, "skipping custom block");
        }
    }
    grammar.scope()
}

// ── Name hygiene ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    Variable,
    List,
    Parameter,
    Custom,
}

impl NameKind {
    fn short(self) -> &'static str {
        match self {
            NameKind::Variable => "var",
            NameKind::List => "list",
            NameKind::Parameter => "arg",
            NameKind::Custom => "custom",
        }
    }
}

/// Names that would collide with block text or menu options.
const RESERVED_NAMES: &[&str] = &[
    "x", "y", "z",
    "pen color", "pen hue", "pen saturation", "pen brightness", "pen transparency", "pen size",
    "video transparency", "instrument",
    "color effect", "whirl effect", "pixelate effect", "mosaic effect", "brightness effect",
    "ghost effect", "fisheye effect", "pitch effect", "pan effect",
    "voice", "language",
    "costume #", "backdrop #",
    "x position", "y position", "direction", "costume number", "costume name", "size",
    "backdrop number", "backdrop name", "volume", "tempo", "answer", "mouse x", "mouse y",
    "loudness", "timer", "current year", "current month", "current date",
    "current day of week", "current hour", "current minute", "current second",
    "days since 2000", "username",
    "mouse-pointer", "Stage", "edge",
    "all", "last", "random",
];

const RESERVED_WORDS: &[&str] = &["to", "on", "of", "for", "with", "mod", "round"];

static QUESTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r" \?( |$)").expect("question pattern compiles"));
static NUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+(\.[0-9]+)?$").expect("numeric pattern compiles"));

/// Rewrite a host name into one that tokenizes cleanly and is unique
/// among `seen` and `stage_seen`.
pub fn clean_name(
    kind: NameKind,
    name: &str,
    seen: &HashSet<String>,
    stage_seen: &HashSet<String>,
) -> String {
    let original = name;
    let mut name = name.to_owned();
    let mut tokens = tokenize(&name);

    // drop or split whatever stopped the tokenizer
    for _ in 0..=original.len() {
        let Some(last) = tokens.last() else { break };
        if last.kind != TokenKind::Error {
            break;
        }
        let suffix = if last.value == "Expected whitespace" {
            format!(" {}", last.text)
        } else {
            last.text.chars().skip(1).collect()
        };
        tokens.pop();
        let values: Vec<&str> = tokens.iter().map(|t| t.value.as_str()).collect();
        name = values.join(" ") + &suffix;
        tokens = tokenize(&name);
    }
    tokens.retain(|t| t.kind != TokenKind::Error);

    for i in 0..tokens.len() {
        let marks = |kind: TokenKind| matches!(kind, TokenKind::Iden | TokenKind::Symbol);
        match tokens[i].kind {
            TokenKind::LParen | TokenKind::LAngle => {
                if let Some(next) = tokens.get_mut(i + 1).filter(|n| marks(n.kind)) {
                    next.value.insert(0, '_');
                    next.kind = TokenKind::Iden;
                }
            }
            TokenKind::RParen | TokenKind::RAngle if i > 0 => {
                if let Some(prev) = tokens.get_mut(i - 1).filter(|p| marks(p.kind)) {
                    prev.value.push('_');
                    prev.kind = TokenKind::Iden;
                }
            }
            _ => {}
        }
    }

    let custom = kind == NameKind::Custom;
    let words: Vec<&str> = tokens
        .iter()
        .enumerate()
        .filter(|(index, token)| {
            let keep = match token.kind {
                TokenKind::Symbol => !matches!(token.value.as_str(), "=" | "*" | "/" | "+" | "-"),
                TokenKind::Iden | TokenKind::Number => true,
                TokenKind::Cloud => *index == 0,
                TokenKind::Input => custom,
                _ => false,
            };
            keep && !RESERVED_WORDS.contains(&token.value.as_str())
                && (token.value != "y:" || custom)
        })
        .map(|(_, token)| token.value.as_str())
        .collect();
    let mut name = QUESTION.replace_all(&words.join(" "), "?").into_owned();

    let short = kind.short();
    if name.is_empty() {
        let mut chars = original.chars();
        let single_symbol = matches!((chars.next(), chars.next()), (Some(c), None) if !c.is_ascii_alphabetic());
        name = if single_symbol { "_".into() } else { short.into() };
    }

    let has = |n: &str| seen.contains(n) || stage_seen.contains(n);
    let invalid = RESERVED_NAMES.contains(&name.as_str()) || NUMERIC.is_match(&name);
    if name != "_" && (invalid || (kind == NameKind::Parameter && has(&name))) {
        name.push(' ');
        name.push_str(short);
    }

    let prefix = name.clone();
    let mut offset = 1;
    while name == "_" || name == short || has(&name) {
        name = format!("{}{}", prefix, offset);
        offset += 1;
    }
    name
}

// ── Generator support ────────────────────────────────────────────────

/// Precedence level of infix reporters, tightest first. `join` sits
/// below everything; custom block arguments are at -2.
pub fn precedence(selector: &str) -> Option<i32> {
    let level = match selector {
        "operator_join" => -1,
        "operator_multiply" | "operator_divide" | "operator_mod" => 1,
        "operator_add" | "operator_subtract" => 2,
        "operator_equals" | "operator_lt" | "operator_gt" | "operator_contains"
        | "data_listcontainsitem" => 3,
        "operator_not" => 4,
        "operator_and" => 5,
        "operator_or" => 6,
        _ => return None,
    };
    Some(level)
}

/// Only these blocks render numeric-looking string arguments unquoted.
pub const BLOCKS_WITH_NUMBER_LITERALS: &[&str] = &[
    "data_setvariableto",
    "operator_lt",
    "operator_gt",
    "operator_equals",
];

/// Completion ranking: these sort first, in this order.
pub const PREFER_SELECTORS: &[&str] = &[
    // predicates
    "BooleanParam",
    "sensing_coloristouchingcolor",
    "sensing_touchingobject",
    "sensing_touchingcolor",
    "sensing_mousedown",
    "sensing_keypressed",
    "data_listcontainsitem",
    "operator_contains",
    "operator_not",
    // reporters
    "ReporterParam",
    "VariableName",
    "operator_add",
    "operator_subtract",
    "operator_multiply",
    "operator_divide",
    "operator_mod",
    "operator_length",
    "operator_letter_of",
    "data_lengthoflist",
    "sensing_timer",
    "operator_round",
    "operator_mathop",
    "motion_direction",
    "sensing_distanceto",
    "looks_costumenumbername",
    "looks_backdropnumbername",
    "operator_random",
    "sensing_current",
    "sensing_mousex",
    "sensing_mousey",
    "sensing_username",
    "music_getTempo",
    "sound_volume",
    "sensing_loudness",
    "data_itemoflist",
    "data_itemnumoflist",
    "sensing_of",
    "videoSensing_videoOn",
    "translate_getTranslate",
    "translate_getViewerLanguage",
    // stack blocks
    "data_addtolist",
    "sensing_askandwait",
    "event_broadcast",
    "event_broadcastandwait",
    "motion_changexby",
    "motion_changeyby",
    "looks_changesizeby",
    "looks_changeeffectby",
    "pen_changePenSizeBy",
    "pen_changePenColorParamBy",
    "sound_changevolumeby",
    "sound_changeeffectby",
    "music_changeTempo",
    "data_changevariableby",
    "looks_cleareffects",
    "sound_cleareffects",
    "control_create_clone_of",
    "control_delete_this_clone",
    "data_deleteoflist",
    "data_deletealloflist",
    "pen_clear",
    "control_forever",
    "motion_gotoxy",
    "motion_goto",
    "looks_gotofrontback",
    "looks_goforwardbackwardlayers",
    "motion_glidesecstoxy",
    "motion_glideto",
    "looks_hide",
    "data_hidevariable",
    "data_hidelist",
    "control_if_else",
    "data_insertatlist",
    "motion_ifonedgebounce",
    "motion_movesteps",
    "makeymakey_whenMakeyKeyPressed",
    "makeymakey_whenCodePressed",
    "looks_nextcostume",
    "looks_nextbackdrop",
    "motion_pointindirection",
    "motion_pointtowards",
    "pen_penDown",
    "pen_penUp",
    "sound_playuntildone",
    "music_playNoteForBeats",
    "music_playDrumForBeats",
    "control_repeat",
    "control_repeat_until",
    "data_replaceitemoflist",
    "sensing_resettimer",
    "music_restForBeats",
    "looks_say",
    "looks_sayforsecs",
    "data_setvariableto",
    "motion_setxy",
    "motion_sety",
    "looks_setsizeto",
    "looks_seteffectto",
    "pen_setPenSizeTo",
    "pen_setPenColorToColor",
    "pen_setPenColorParamTo",
    "sound_setvolumeto",
    "sound_seteffectto",
    "motion_setrotationstyle",
    "sensing_setdragmode",
    "music_setInstrument",
    "music_setTempo",
    "videoSensing_setVideoTransparency",
    "text2speech_setVoice",
    "text2speech_setLanguage",
    "looks_show",
    "data_showvariable",
    "data_showlist",
    "control_stop",
    "sound_play",
    "sound_stopallsounds",
    "pen_stamp",
    "text2speech_speakAndWait",
    "looks_switchcostumeto",
    "looks_switchbackdropto",
    "looks_switchbackdroptoandwait",
    "motion_turnright",
    "motion_turnleft",
    "looks_think",
    "looks_thinkforsecs",
    "videoSensing_videoToggle",
    "event_whenflagclicked",
    "control_wait",
    "control_wait_until",
    "event_whenkeypressed",
    "control_start_as_clone",
    "event_whenbroadcastreceived",
    "event_whenthisspriteclicked",
    "event_whenbackdropswitchesto",
    "end",
    "else",
];

pub fn prefer_rank(selector: &str) -> Option<usize> {
    PREFER_SELECTORS.iter().position(|s| *s == selector)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> HashSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn spec_words_split_question_marks() {
        assert_eq!(spec_words("touching color?"), vec!["touching", "color", "?"]);
        assert_eq!(spec_words(" is touching "), vec!["is", "touching"]);
        assert_eq!(spec_words("?"), vec!["?"]);
    }

    #[test]
    fn option_words_keep_their_kind() {
        let symbols = text_symbols("10 ^").expect("symbols");
        assert_eq!(
            symbols,
            vec![
                Symbol::Terminal(SymbolSpec::exact(TokenKind::Number, "10")),
                Symbol::word("^"),
            ]
        );
    }

    #[test]
    fn base_grammar_has_block_rules() {
        let g = base_grammar();
        assert!(g.has_rules("block"));
        assert!(g.has_rules("simple-reporter"));
        assert!(g.has_rules("m_key"));
        assert!(!g.has_rules("VariableName"));
        let forever = g
            .rules_for("block")
            .find(|r| r.info().and_then(|i| i.selector()) == Some("control_forever"))
            .expect("forever rule");
        assert_eq!(forever.symbols, vec![Symbol::word("forever")]);
    }

    #[test]
    fn menus_without_reporters_accept_empty() {
        let g = base_grammar();
        let empty = Symbol::token(TokenKind::Empty);
        assert!(g.rules_for("m_stop").any(|r| r.symbols == vec![empty.clone()]));
        assert!(!g.rules_for("m_mathOp").any(|r| r.symbols == vec![empty.clone()]));
        assert!(!g.rules_for("m_motion_goto_menu").any(|r| r.symbols == vec![empty.clone()]));
    }

    #[test]
    fn vocabulary_rules() {
        let mut g = base_grammar().copy();
        add_variable(&mut g, "my score").expect("variable");
        let rule = g.first_rule("VariableName").expect("rule");
        assert_eq!(rule.symbols.len(), 2);
        let err = add_variable(&mut g, "say \"oops").expect_err("invalid");
        assert!(matches!(err, GrammarError::InvalidName { .. }));
        assert!(add_list(&mut g, "").is_err());
    }

    #[test]
    fn definition_lines() {
        assert!(is_definition_line("define foo"));
        assert!(is_definition_line("  define-atomic foo (x)"));
        assert!(!is_definition_line("defined"));
        assert!(!is_definition_line("say [define ]"));
    }

    #[test]
    fn clean_name_rewrites_host_names() {
        let none = HashSet::new();
        assert_eq!(clean_name(NameKind::Variable, "score", &none, &none), "score");
        assert_eq!(clean_name(NameKind::Variable, "x", &none, &none), "x var");
        assert_eq!(clean_name(NameKind::Variable, "42", &none, &none), "42 var");
        assert_eq!(clean_name(NameKind::Variable, "a + b", &none, &none), "a b");
        assert_eq!(clean_name(NameKind::Variable, "go to", &none, &none), "go");
        assert_eq!(clean_name(NameKind::Variable, "done ?", &none, &none), "done?");
        assert_eq!(clean_name(NameKind::Variable, "(foo)", &none, &none), "_foo_");
        assert_eq!(clean_name(NameKind::List, "", &none, &none), "list1");
        assert_eq!(clean_name(NameKind::Variable, "+", &none, &none), "_1");
        assert_eq!(
            clean_name(NameKind::Variable, "score", &names(&["score"]), &none),
            "score1"
        );
        assert_eq!(
            clean_name(NameKind::Parameter, "n", &names(&["n"]), &none),
            "n arg"
        );
    }

    #[test]
    fn precedence_ladder() {
        assert!(precedence("operator_multiply") < precedence("operator_add"));
        assert!(precedence("operator_add") < precedence("operator_equals"));
        assert_eq!(precedence("operator_join"), Some(-1));
        assert_eq!(precedence("motion_xposition"), None);
        assert_eq!(prefer_rank("BooleanParam"), Some(0));
    }
}
