//! Semantic action evaluation.
//!
//! Actions never touch tokens. Highlight categories chosen by an action
//! are recorded in [`Eval::paints`] and merged by the highlighter.

use crate::ast::{parse_number, Arg, Block, BlockInfo, Definition, Literal, Param, SpecPart};
use crate::catalog::{self, Category, InputShape};
use crate::grammar::Action;
use crate::lexer::{Token, TokenKind};

/// Intermediate value of a parse tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nothing,
    /// Index of a line token.
    Token(usize),
    Tokens(Vec<usize>),
    Number(f64),
    Text(String),
    Bool(bool),
    Block(Box<Block>),
    Embed {
        constant: Option<Literal>,
        tokens: Vec<usize>,
    },
    List(Vec<Value>),
    Param(Param),
    Definition(Definition),
}

/// Evaluation context for one line.
pub struct Eval<'a> {
    pub tokens: &'a [Token],
    pub paints: Vec<(usize, Category)>,
}

impl<'a> Eval<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Eval {
            tokens,
            paints: Vec::new(),
        }
    }

    fn token(&self, value: &Value) -> Option<&'a Token> {
        match value {
            Value::Token(i) => self.tokens.get(*i),
            _ => None,
        }
    }

    fn token_value(&self, value: &Value) -> String {
        self.token(value).map(|t| t.value.clone()).unwrap_or_default()
    }

    fn paint(&mut self, value: &Value, category: Category) {
        if let Value::Token(i) = value {
            self.paints.push((*i, category));
        }
    }

    /// Apply `action` to already-evaluated children.
    pub fn apply(&mut self, action: &Action, mut children: Vec<Value>) -> Value {
        match action {
            Action::Pick(n) => {
                if *n < children.len() {
                    children.swap_remove(*n)
                } else {
                    Value::Nothing
                }
            }
            Action::Nothing => Value::Nothing,
            Action::Constant(lit) => literal_value(lit.clone()),
            Action::Literal => Value::Text(self.first_token_value(&children)),
            Action::Number => Value::Number(parse_number(&self.first_token_value(&children))),
            Action::NegativeNumber => {
                if let Some(minus) = children.first() {
                    self.paint(minus, Category::Number);
                }
                let n = children
                    .get(1)
                    .map(|v| parse_number(&self.token_value(v)))
                    .unwrap_or(0.0);
                Value::Number(-n)
            }
            Action::StringLiteral => {
                let token = children.first().and_then(|v| self.token(v));
                Value::Text(token.map(unescape_string).unwrap_or_default())
            }
            Action::HexColor => {
                let hex = self.first_token_value(&children);
                Value::Text(expand_hex(&hex))
            }
            Action::NamedColor => {
                let name = self.first_token_value(&children);
                if let Some(first) = children.first() {
                    self.paint(first, Category::Color);
                }
                Value::Text(named_color(&name).unwrap_or("#000").to_owned())
            }
            Action::Brackets => brackets(children),
            Action::Embed => Value::Embed {
                constant: None,
                tokens: token_indexes(&children),
            },
            Action::EmbedConstant(lit) => Value::Embed {
                constant: Some(lit.clone()),
                tokens: token_indexes(&children),
            },
            Action::Block { info, args } => self.block(info, args, children),
            Action::Definition => {
                let keyword = match children.first() {
                    Some(Value::Text(s)) => s.clone(),
                    _ => String::new(),
                };
                let parts = match children.into_iter().nth(1) {
                    Some(Value::List(items)) => items
                        .into_iter()
                        .filter_map(|item| match item {
                            Value::Text(word) => Some(SpecPart::Word(word)),
                            Value::Param(p) => Some(SpecPart::Param(p)),
                            _ => None,
                        })
                        .collect(),
                    _ => Vec::new(),
                };
                Value::Definition(Definition::new(keyword == "define-atomic", parts))
            }
            Action::Param => {
                let kind = children.first().and_then(|v| self.token(v)).map(|t| t.kind);
                if let (Some(open), Some(close)) = (children.first(), children.get(2)) {
                    self.paint(open, Category::Parameter);
                    self.paint(close, Category::Parameter);
                }
                let arg = if kind == Some(TokenKind::LAngle) { "b" } else { "s" };
                Value::Param(Param {
                    arg: arg.to_owned(),
                    name: text_of(children.get(1)),
                })
            }
            Action::HackedParam => {
                let input = children.first().map(|v| self.token_value(v)).unwrap_or_default();
                for i in [0, 1, 3] {
                    if let Some(v) = children.get(i) {
                        self.paint(v, Category::Parameter);
                    }
                }
                Value::Param(Param {
                    arg: input.trim_start_matches('%').to_owned(),
                    name: text_of(children.get(2)),
                })
            }
            Action::PaintLiteral(category) => {
                if let Some(first) = children.first() {
                    self.paint(first, *category);
                }
                Value::Text(self.first_token_value(&children))
            }
            Action::PaintWords(category) => {
                let words = self.paint_all(&children, *category);
                Value::Text(words.join(" "))
            }
            Action::Paint(category) => {
                self.paint_all(&children, *category);
                Value::Tokens(token_indexes(&children))
            }
            Action::PaintList(category) => {
                let items = match children.into_iter().next() {
                    Some(Value::List(items)) => items,
                    _ => Vec::new(),
                };
                let words = self.paint_all(&items, *category);
                Value::Text(words.join(" "))
            }
            Action::Box => Value::List(children.into_iter().take(1).collect()),
            Action::Push | Action::Push2 => {
                let last = if matches!(action, Action::Push) { 1 } else { 2 };
                let mut iter = children.into_iter();
                let mut list = match iter.next() {
                    Some(Value::List(items)) => items,
                    _ => Vec::new(),
                };
                if let Some(item) = iter.nth(last - 1) {
                    list.push(item);
                }
                Value::List(list)
            }
        }
    }

    fn first_token_value(&self, children: &[Value]) -> String {
        children.first().map(|v| self.token_value(v)).unwrap_or_default()
    }

    fn paint_all(&mut self, values: &[Value], category: Category) -> Vec<String> {
        values
            .iter()
            .filter_map(|v| {
                self.paint(v, category);
                self.token(v).map(|t| t.value.clone())
            })
            .collect()
    }

    fn block(&mut self, info: &BlockInfo, indexes: &[usize], children: Vec<Value>) -> Value {
        let mut args: Vec<Arg> = indexes
            .iter()
            .map(|&i| children.get(i).map(|v| self.to_arg(v)).unwrap_or(Arg::Text(String::new())))
            .collect();

        let mut tokens = Vec::new();
        for child in &children {
            match child {
                Value::Token(i) => tokens.push(*i),
                Value::Tokens(list) | Value::Embed { tokens: list, .. } => {
                    tokens.extend_from_slice(list)
                }
                _ => {}
            }
        }

        let mut out_info = info.clone();
        if info.selector() == Some("control_stop") {
            let option = args.first().and_then(Arg::text).unwrap_or("");
            if option != "all" && option != "this script" {
                out_info = BlockInfo::Builtin(catalog::stop_other_scripts());
            }
        }

        for (arg, slot) in args.iter_mut().zip(info.inputs()) {
            convert_arg(arg, slot.shape());
        }

        Value::Block(Box::new(Block {
            info: out_info,
            args,
            tokens,
        }))
    }

    fn to_arg(&self, value: &Value) -> Arg {
        match value {
            Value::Embed {
                constant: Some(lit),
                ..
            } => literal_arg(lit.clone()),
            Value::Embed { tokens, .. } => Arg::Text(
                tokens
                    .iter()
                    .filter_map(|i| self.tokens.get(*i))
                    .map(|t| t.value.as_str())
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
            Value::Token(_) => Arg::Text(self.token_value(value)),
            Value::Number(n) => Arg::Number(*n),
            Value::Text(s) => Arg::Text(s.clone()),
            Value::Bool(b) => Arg::Bool(*b),
            Value::Block(b) => Arg::Block(b.clone()),
            _ => Arg::Text(String::new()),
        }
    }
}

fn literal_value(lit: Literal) -> Value {
    match lit {
        Literal::Bool(b) => Value::Bool(b),
        Literal::Number(n) => Value::Number(n),
        Literal::Text(s) => Value::Text(s),
    }
}

fn literal_arg(lit: Literal) -> Arg {
    match lit {
        Literal::Bool(b) => Arg::Bool(b),
        Literal::Number(n) => Arg::Number(n),
        Literal::Text(s) => Arg::Text(s),
    }
}

/// Coerce a literal argument to its slot: number slots hold numbers (an
/// empty or unparsable value is zero), string slots hold text.
fn convert_arg(arg: &mut Arg, shape: Option<InputShape>) {
    let Some(lit) = arg.literal() else {
        return;
    };
    match shape {
        Some(InputShape::Number) => {
            let n = lit.to_number();
            *arg = Arg::Number(if n.is_nan() || n == 0.0 { 0.0 } else { n });
        }
        Some(InputShape::String) => *arg = Arg::Text(lit.to_text()),
        _ => {}
    }
}

fn brackets(children: Vec<Value>) -> Value {
    let mut iter = children.into_iter();
    let open = iter.next();
    let inner = iter.next();
    let close = iter.next();
    match inner {
        Some(Value::Block(mut block)) => {
            let mut tokens = Vec::with_capacity(block.tokens.len() + 2);
            if let Some(Value::Token(i)) = open {
                tokens.push(i);
            }
            tokens.append(&mut block.tokens);
            if let Some(Value::Token(i)) = close {
                tokens.push(i);
            }
            block.tokens = tokens;
            Value::Block(block)
        }
        Some(other) => other,
        None => Value::Nothing,
    }
}

fn token_indexes(children: &[Value]) -> Vec<usize> {
    children
        .iter()
        .flat_map(|v| match v {
            Value::Token(i) => vec![*i],
            Value::Tokens(list) | Value::Embed { tokens: list, .. } => list.clone(),
            _ => Vec::new(),
        })
        .collect()
}

fn text_of(value: Option<&Value>) -> String {
    match value {
        Some(Value::Text(s)) => s.clone(),
        _ => String::new(),
    }
}

/// Undo backslash escapes of the quote character and backslash.
pub fn unescape_string(token: &Token) -> String {
    let quote = token.trimmed().chars().next().unwrap_or('"');
    let mut out = String::with_capacity(token.value.len());
    let mut chars = token.value.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if next == '\\' || next == quote {
                    out.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

fn expand_hex(hex: &str) -> String {
    if hex.len() == 3 {
        let doubled: String = hex.chars().flat_map(|c| [c, c]).collect();
        format!("#{}", doubled)
    } else {
        format!("#{}", hex)
    }
}

/// Color names usable in color slots.
pub const COLORS: &[(&str, &str)] = &[
    ("red", "#e50000"),
    ("orange", "#f97306"),
    ("yellow", "#ffff14"),
    ("green", "#15b01a"),
    ("blue", "#0343df"),
    ("purple", "#7e1e9c"),
    ("black", "#000"),
    ("white", "#fff"),
    ("pink", "#ff81c0"),
    ("brown", "#653700"),
];

pub fn named_color(name: &str) -> Option<&'static str> {
    COLORS.iter().find(|(n, _)| *n == name).map(|(_, hex)| *hex)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    #[test]
    fn strings_unescape_their_own_quote() {
        let tokens = tokenize(r#""say \"hi\" \\ 'x'""#);
        assert_eq!(unescape_string(&tokens[0]), r#"say "hi" \ 'x'"#);
        let tokens = tokenize(r#"'it\'s \\'"#);
        assert_eq!(unescape_string(&tokens[0]), r#"it's \"#);
    }

    #[test]
    fn hex_colors_expand() {
        assert_eq!(expand_hex("f0a"), "#ff00aa");
        assert_eq!(expand_hex("123456"), "#123456");
    }

    #[test]
    fn number_slots_coerce_to_numbers() {
        let mut arg = Arg::Text(String::new());
        convert_arg(&mut arg, Some(InputShape::Number));
        assert_eq!(arg, Arg::Number(0.0));
        let mut arg = Arg::Text("abc".into());
        convert_arg(&mut arg, Some(InputShape::Number));
        assert_eq!(arg, Arg::Number(0.0));
        let mut arg = Arg::Number(3.0);
        convert_arg(&mut arg, Some(InputShape::String));
        assert_eq!(arg, Arg::Text("3".into()));
        let mut arg = Arg::Bool(false);
        convert_arg(&mut arg, Some(InputShape::Boolean));
        assert_eq!(arg, Arg::Bool(false));
    }

    #[test]
    fn push_appends_to_list() {
        let tokens = tokenize("a b");
        let mut eval = Eval::new(&tokens);
        let list = eval.apply(&Action::Box, vec![Value::Token(0)]);
        let list = eval.apply(&Action::Push, vec![list, Value::Token(1)]);
        assert_eq!(list, Value::List(vec![Value::Token(0), Value::Token(1)]));
        let words = eval.apply(&Action::PaintList(Category::Parameter), vec![list]);
        assert_eq!(words, Value::Text("a b".into()));
        assert_eq!(eval.paints.len(), 2);
    }
}
