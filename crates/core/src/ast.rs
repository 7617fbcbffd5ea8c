//! Values produced by evaluating a parse tree.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::{self, BlockDescriptor, Category, Part, Shape, Slot};

// ── Literals ─────────────────────────────────────────────────────────

/// A scalar value stored in a block field or passed as an argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Literal {
    pub fn text(s: impl Into<String>) -> Self {
        Literal::Text(s.into())
    }

    /// Numeric coercion with the same rules as block inputs: empty text is
    /// zero, unparsable text is NaN.
    pub fn to_number(&self) -> f64 {
        match self {
            Literal::Number(n) => *n,
            Literal::Text(s) => parse_number(s),
            Literal::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    pub fn to_text(&self) -> String {
        match self {
            Literal::Number(n) => format_number(*n),
            Literal::Text(s) => s.clone(),
            Literal::Bool(b) => b.to_string(),
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Literal::Bool(b) => *b,
            Literal::Number(n) => *n != 0.0 && !n.is_nan(),
            Literal::Text(s) => !s.is_empty(),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// Format a number the way Scratch projects store it: integers without a
/// fractional part, exponents only for very large or very small values.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_owned();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_owned();
    }
    if n == 0.0 {
        return "0".to_owned();
    }
    let abs = n.abs();
    if abs >= 1e21 || abs < 1e-6 {
        // `1e21`, not `1e+21`: the tokenizer takes no sign after `e`
        return format!("{:e}", n);
    }
    if n.fract() == 0.0 {
        format!("{:.0}", n)
    } else {
        format!("{}", n)
    }
}

/// Numeric conversion of text. Surrounding whitespace is ignored, empty
/// text is zero, anything else unparsable is NaN.
pub fn parse_number(s: &str) -> f64 {
    let t = s.trim();
    if t.is_empty() {
        return 0.0;
    }
    match t {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    if let Some(hex) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16)
            .map(|v| v as f64)
            .unwrap_or(f64::NAN);
    }
    let numeric = t
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'));
    if !numeric {
        return f64::NAN;
    }
    t.parse::<f64>().unwrap_or(f64::NAN)
}

// ── Block info ───────────────────────────────────────────────────────

/// A user-defined block, callable once its `define` line is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomBlock {
    pub spec: String,
    pub parts: Vec<Part>,
    pub inputs: Vec<Slot>,
}

impl CustomBlock {
    pub fn from_spec(spec: impl Into<String>) -> Self {
        let spec = spec.into();
        let parts = catalog::split_spec(&spec);
        let inputs = catalog::slots(&parts);
        CustomBlock {
            spec,
            parts,
            inputs,
        }
    }
}

#[derive(Debug, Clone)]
pub enum BlockInfo {
    Builtin(&'static BlockDescriptor),
    Custom(Arc<CustomBlock>),
}

impl BlockInfo {
    /// Opcode; custom blocks have none until compiled to `procedures_call`.
    pub fn selector(&self) -> Option<&'static str> {
        match self {
            BlockInfo::Builtin(d) => Some(d.selector),
            BlockInfo::Custom(_) => None,
        }
    }

    pub fn shape(&self) -> Shape {
        match self {
            BlockInfo::Builtin(d) => d.shape,
            BlockInfo::Custom(_) => Shape::Stack,
        }
    }

    pub fn category(&self) -> Category {
        match self {
            BlockInfo::Builtin(d) => d.category,
            BlockInfo::Custom(_) => Category::Custom,
        }
    }

    pub fn spec(&self) -> &str {
        match self {
            BlockInfo::Builtin(d) => d.spec,
            BlockInfo::Custom(c) => &c.spec,
        }
    }

    pub fn parts(&self) -> &[Part] {
        match self {
            BlockInfo::Builtin(d) => &d.parts,
            BlockInfo::Custom(c) => &c.parts,
        }
    }

    pub fn inputs(&self) -> &[Slot] {
        match self {
            BlockInfo::Builtin(d) => &d.inputs,
            BlockInfo::Custom(c) => &c.inputs,
        }
    }

    /// Input name for the argument at `index`. Custom block inputs are
    /// numbered.
    pub fn input_name(&self, index: usize) -> Cow<'static, str> {
        match self {
            BlockInfo::Builtin(d) => Cow::Borrowed(d.input_names.get(index).copied().unwrap_or("")),
            BlockInfo::Custom(_) => Cow::Owned(index.to_string()),
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, BlockInfo::Custom(_))
    }
}

impl PartialEq for BlockInfo {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (BlockInfo::Builtin(a), BlockInfo::Builtin(b)) => {
                a.selector == b.selector && a.shape == b.shape
            }
            (BlockInfo::Custom(a), BlockInfo::Custom(b)) => a.spec == b.spec,
            _ => false,
        }
    }
}

// ── Blocks ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Number(f64),
    Text(String),
    Bool(bool),
    Block(Box<Block>),
}

impl Arg {
    pub fn as_block(&self) -> Option<&Block> {
        match self {
            Arg::Block(b) => Some(b),
            _ => None,
        }
    }

    /// The literal value, or `None` for a nested reporter.
    pub fn literal(&self) -> Option<Literal> {
        match self {
            Arg::Number(n) => Some(Literal::Number(*n)),
            Arg::Text(s) => Some(Literal::Text(s.clone())),
            Arg::Bool(b) => Some(Literal::Bool(*b)),
            Arg::Block(_) => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Arg::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// A parsed block: which block it is, its arguments aligned with the
/// block's inputs, and the indexes of the line tokens it consumed directly.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub info: BlockInfo,
    pub args: Vec<Arg>,
    pub tokens: Vec<usize>,
}

impl Block {
    pub fn shape(&self) -> Shape {
        self.info.shape()
    }

    pub fn selector(&self) -> Option<&'static str> {
        self.info.selector()
    }
}

// ── Definitions ──────────────────────────────────────────────────────

/// A declared custom block parameter. `arg` is the placeholder letter
/// without `%` (`s`, `b`, `n`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub arg: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecPart {
    Word(String),
    Param(Param),
}

/// A parsed `define` / `define-atomic` line.
#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    pub spec: String,
    pub input_names: Vec<String>,
    pub defaults: Vec<Literal>,
    pub atomic: bool,
    pub parts: Vec<SpecPart>,
}

impl Definition {
    pub fn new(atomic: bool, parts: Vec<SpecPart>) -> Self {
        let mut input_names = Vec::new();
        let mut defaults = Vec::new();
        let spec_parts: Vec<String> = parts
            .iter()
            .map(|part| match part {
                SpecPart::Word(w) => w.clone(),
                SpecPart::Param(p) => {
                    input_names.push(p.name.clone());
                    if p.arg == "b" {
                        defaults.push(Literal::Bool(false));
                    } else {
                        defaults.push(Literal::text(""));
                    }
                    format!("%{}", p.arg)
                }
            })
            .collect();
        Definition {
            spec: spec_parts.join(" "),
            input_names,
            defaults,
            atomic,
            parts,
        }
    }

    pub fn params(&self) -> impl Iterator<Item = &Param> {
        self.parts.iter().filter_map(|p| match p {
            SpecPart::Param(p) => Some(p),
            SpecPart::Word(_) => None,
        })
    }

    /// The callable block this definition declares.
    pub fn custom_block(&self) -> CustomBlock {
        CustomBlock::from_spec(self.spec.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_format_like_scratch() {
        assert_eq!(format_number(10.0), "10");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(1.5), "1.5");
        assert_eq!(format_number(-2.25), "-2.25");
        assert_eq!(format_number(1e21), "1e21");
        assert_eq!(format_number(2.5e-7), "2.5e-7");
        assert_eq!(format_number(f64::NAN), "NaN");
    }

    #[test]
    fn text_coerces_to_number() {
        assert_eq!(parse_number(""), 0.0);
        assert_eq!(parse_number(" 12 "), 12.0);
        assert_eq!(parse_number("1e3"), 1000.0);
        assert_eq!(parse_number("0x10"), 16.0);
        assert!(parse_number("abc").is_nan());
        assert!(parse_number("inf").is_nan());
    }

    #[test]
    fn definition_spec_and_defaults() {
        let def = Definition::new(
            true,
            vec![
                SpecPart::Word("jump".into()),
                SpecPart::Param(Param {
                    arg: "s".into(),
                    name: "height".into(),
                }),
                SpecPart::Param(Param {
                    arg: "b".into(),
                    name: "fast".into(),
                }),
            ],
        );
        assert_eq!(def.spec, "jump %s %b");
        assert_eq!(def.input_names, vec!["height", "fast"]);
        assert_eq!(
            def.defaults,
            vec![Literal::text(""), Literal::Bool(false)]
        );
        assert_eq!(def.custom_block().inputs.len(), 2);
    }
}
