//! Block graph back to canonical text.
//!
//! Scripts come out top to bottom by `y`. Nested reporters get brackets
//! only where re-parsing would otherwise pick a different tree.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ast::{format_number, Literal};
use crate::catalog::{self, InputShape, Part, Shape, Slot};
use crate::error::GenerateError;
use crate::language::{precedence, BLOCKS_WITH_NUMBER_LITERALS};
use crate::menus;
use crate::target::{BlockStore, Mutation, ScratchBlock};

static WORDS: Lazy<Regex> = Lazy::new(|| Regex::new(r" +|[^ ]+").expect("word pattern compiles"));
static SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r" +").expect("space pattern compiles"));
static NUMBER_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?(0|[1-9][0-9]*)(\.[0-9]*)?$").expect("number pattern compiles"));

/// Precedence of the top level; every reporter is bracketed there.
const TOP: i32 = i32::MIN;
/// Precedence of stack block arguments; only `join` is bracketed there.
const STATEMENT: i32 = i32::MAX;
/// Precedence of custom block call arguments.
const CUSTOM: i32 = -2;

/// Render every script in `blocks`, separated by blank lines.
pub fn generate(blocks: &BlockStore) -> Result<String, GenerateError> {
    let generator = Generator { blocks };
    let mut scripts: Vec<&ScratchBlock> = blocks
        .scripts()
        .iter()
        .filter_map(|id| blocks.get(id))
        .collect();
    scripts.sort_by_key(|b| b.y);

    let mut out = Vec::new();
    for top in scripts {
        check_acyclic(blocks, &top.id)?;
        let standalone = catalog::block(&top.opcode).map_or(false, |d| d.shape.is_reporter());
        // parameters mean nothing outside their definition
        if standalone && generator.contains_parameter(top) {
            tracing::debug!(opcode = %top.opcode, "dropping standalone parameter reporter");
            continue;
        }
        out.push(generator.stack(top)?.join("\n"));
    }

    let mut text = out.join("\n\n");
    if !text.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }
    tracing::debug!(scripts = out.len(), "generated");
    Ok(text)
}

/// Fail if following `next` and input links from `top` leads back to a
/// block still being walked. Shared children are fine.
fn check_acyclic<'a>(blocks: &'a BlockStore, top: &'a str) -> Result<(), GenerateError> {
    let mut done: HashSet<&str> = HashSet::new();
    let mut path: HashSet<&str> = HashSet::new();
    // (id, leaving): a block is pushed again to be taken off the path
    let mut stack: Vec<(&str, bool)> = vec![(top, false)];
    while let Some((id, leaving)) = stack.pop() {
        if leaving {
            path.remove(id);
            done.insert(id);
            continue;
        }
        if done.contains(id) {
            continue;
        }
        path.insert(id);
        stack.push((id, true));
        let Some(block) = blocks.get(id) else {
            continue;
        };
        let inputs = block
            .inputs
            .iter()
            .flat_map(|input| [input.block.as_deref(), input.shadow.as_deref()]);
        for child in std::iter::once(block.next.as_deref()).chain(inputs).flatten() {
            if path.contains(child) {
                return Err(GenerateError::Cycle(child.to_owned()));
            }
            if !done.contains(child) {
                stack.push((child, false));
            }
        }
    }
    Ok(())
}

/// What an input slot holds.
enum Value<'a> {
    Block(&'a ScratchBlock),
    Literal(&'a Literal),
    Empty,
}

struct Generator<'a> {
    blocks: &'a BlockStore,
}

impl<'a> Generator<'a> {
    fn contains_parameter(&self, block: &ScratchBlock) -> bool {
        block.opcode.starts_with("argument_")
            || block.inputs.iter().any(|input| {
                input
                    .block
                    .as_deref()
                    .and_then(|id| self.blocks.get(id))
                    .map_or(false, |child| self.contains_parameter(child))
            })
    }

    fn stack(&self, top: &'a ScratchBlock) -> Result<Vec<String>, GenerateError> {
        let mut lines = Vec::new();
        let mut block = top;
        loop {
            lines.extend(self.block(block)?);
            let Some(next) = block.next.as_deref() else {
                return Ok(lines);
            };
            block = self
                .blocks
                .get(next)
                .ok_or_else(|| GenerateError::MissingBlock(next.to_owned()))?;
        }
    }

    fn mouth(&self, block: &'a ScratchBlock, n: usize) -> Result<Vec<String>, GenerateError> {
        let mut lines = match self.blocks.branch(&block.id, n) {
            Some(top) => self.stack(top)?,
            None => Vec::new(),
        };
        if lines.is_empty() {
            lines.push("...".to_owned());
        }
        Ok(lines.into_iter().map(|line| format!("  {}", line)).collect())
    }

    fn block(&self, block: &'a ScratchBlock) -> Result<Vec<String>, GenerateError> {
        if block.opcode == "procedures_definition" {
            return Ok(vec![self.definition(block)?]);
        }
        let Some(resolved) = self.blocks.resolve(block) else {
            return Ok(vec![String::new()]);
        };
        if resolved.shape.is_reporter() {
            return Ok(vec![self.reporter(block, None, TOP, None, 0)]);
        }

        let level = if resolved.info.is_custom() { CUSTOM } else { STATEMENT };
        let selector = resolved.info.selector();
        let text = self.parts(block, resolved.info.parts(), &resolved.input_names, selector, level);
        let mut lines = vec![text];
        match resolved.shape {
            Shape::IfBlock => {
                lines.extend(self.mouth(block, 1)?);
                lines.push("else".to_owned());
                lines.extend(self.mouth(block, 2)?);
                lines.push("end".to_owned());
            }
            Shape::CBlock | Shape::CBlockCap => {
                lines.extend(self.mouth(block, 1)?);
                lines.push("end".to_owned());
            }
            _ => {}
        }
        Ok(lines)
    }

    fn definition(&self, block: &ScratchBlock) -> Result<String, GenerateError> {
        let bad = || GenerateError::BadMutation(block.id.clone());
        let prototype = block
            .input("custom_block")
            .and_then(|input| input.block.as_deref())
            .ok_or_else(bad)?;
        let prototype = self
            .blocks
            .get(prototype)
            .ok_or_else(|| GenerateError::MissingBlock(prototype.to_owned()))?;
        let Some(Mutation::Prototype {
            proccode,
            argumentnames,
            warp,
            ..
        }) = &prototype.mutation
        else {
            return Err(bad());
        };

        let mut names = argumentnames.iter();
        let mut out = String::from(if *warp { "define-atomic " } else { "define " });
        for part in catalog::split_spec(proccode) {
            match part {
                Part::Slot(slot) => {
                    let name = names.next().map(String::as_str).unwrap_or("");
                    let name = tidy_question(name);
                    match slot.shape() {
                        Some(InputShape::Number | InputShape::String) => {
                            out.push_str(&format!("({})", name))
                        }
                        Some(InputShape::Boolean) => out.push_str(&format!("<{}>", name)),
                        _ => out.push_str(&format!("{}[{}]", slot.as_str(), name)),
                    }
                }
                Part::Text(text) => {
                    let words: Vec<&str> = text
                        .split(' ')
                        .filter(|w| !w.is_empty())
                        .map(|w| if w == "\\%" { "%" } else { w })
                        .collect();
                    if text.starts_with(' ') {
                        out.push(' ');
                    }
                    out.push_str(&words.join(" "));
                    if text.ends_with(' ') && !words.is_empty() {
                        out.push(' ');
                    }
                }
            }
        }
        Ok(out)
    }

    /// Render a reporter inside a slot of shape `slot`, bracketing it when
    /// the enclosing block at `outer` precedence requires.
    fn reporter(
        &self,
        block: &'a ScratchBlock,
        slot: Option<InputShape>,
        outer: i32,
        outer_selector: Option<&str>,
        arg_index: usize,
    ) -> String {
        let Some(descriptor) = catalog::block(&block.opcode) else {
            return String::new();
        };
        let selector = descriptor.selector;
        let level = precedence(selector).unwrap_or(0);
        let names: Vec<String> = descriptor.input_names.iter().map(|s| s.to_string()).collect();
        let text = self.parts(block, &descriptor.parts, &names, Some(selector), level);

        let same = level == outer;
        let needs_brackets = level > outer
            || (selector == "operator_or" && Some(outer) == precedence("operator_and"))
            || (selector == "operator_and" && Some(outer) == precedence("operator_or"))
            || slot == Some(InputShape::Color)
            || (slot != Some(InputShape::Boolean) && descriptor.shape == Shape::Predicate)
            // x - (y + z), x / (y * z), x mod (y * z)
            || (same
                && matches!(
                    outer_selector,
                    Some("operator_subtract" | "operator_divide" | "operator_mod")
                )
                && arg_index == 1)
            // x * (y mod z)
            || (same && selector == "operator_mod" && arg_index == 1)
            || slot == Some(InputShape::ReadonlyMenu)
            || selector == "data_listcontents"
            || (level == -1 && outer > 0);
        if !needs_brackets {
            return text;
        }
        match descriptor.shape {
            Shape::Predicate => format!("<{}>", text),
            _ => format!("({})", text),
        }
    }

    fn value(&self, block: &'a ScratchBlock, name: &str) -> Value<'a> {
        if let Some(input) = block.input(name) {
            if input.is_shadow_only() {
                return match self.blocks.shadow_value(input) {
                    Some(literal) => Value::Literal(literal),
                    None => Value::Empty,
                };
            }
            return match input.block.as_deref().and_then(|id| self.blocks.get(id)) {
                Some(child) => Value::Block(child),
                None => Value::Empty,
            };
        }
        match block.field(name) {
            Some(field) => Value::Literal(&field.value),
            None => Value::Empty,
        }
    }

    fn parts(
        &self,
        block: &'a ScratchBlock,
        parts: &[Part],
        input_names: &[String],
        selector: Option<&str>,
        level: i32,
    ) -> String {
        let mut arg_index = 0;
        let mut out = String::new();
        for part in parts {
            match part {
                Part::Slot(slot) => {
                    let name = input_names.get(arg_index).map(String::as_str).unwrap_or("");
                    let shape = slot.shape();
                    let text = match self.value(block, name) {
                        Value::Block(child) => self.reporter(child, shape, level, selector, arg_index),
                        value => {
                            let literal = match value {
                                Value::Literal(literal) => Some(literal),
                                _ => None,
                            };
                            let number_literal = slot.as_str() == "%s"
                                && selector.map_or(false, |s| BLOCKS_WITH_NUMBER_LITERALS.contains(&s));
                            if number_literal {
                                let text = literal.map(Literal::to_text).unwrap_or_default();
                                if NUMBER_LITERAL.is_match(&text) {
                                    text
                                } else {
                                    string_literal(&text)
                                }
                            } else {
                                literal_text(literal, slot)
                            }
                        }
                    };
                    out.push_str(&text);
                    arg_index += 1;
                }
                Part::Text(text) => {
                    for word in WORDS.find_iter(text).map(|m| m.as_str()) {
                        match word {
                            "@greenFlag" => out.push_str("flag"),
                            "@turnLeft" => out.push_str("ccw"),
                            "@turnRight" => out.push_str("cw"),
                            _ => {
                                out.push_str(word);
                                if word.ends_with(':') {
                                    out.push(' ');
                                }
                            }
                        }
                    }
                }
            }
        }
        SPACES.replace_all(&out, " ").into_owned()
    }
}

fn literal_text(value: Option<&Literal>, slot: &Slot) -> String {
    let text = || value.map(Literal::to_text).unwrap_or_default();
    match slot.shape() {
        Some(InputShape::Color) => color_literal(&text()),
        Some(InputShape::Boolean) => "<>".to_owned(),
        Some(InputShape::ReadonlyMenu) => {
            let empty = Literal::text("");
            menu_literal(value.unwrap_or(&empty), slot.menu().unwrap_or(""))
        }
        Some(InputShape::String) => string_literal(&text()),
        // empty number slots are stored as zero
        Some(InputShape::Number) => {
            let n = value.map(Literal::to_number).unwrap_or(0.0);
            format_number(if n.is_nan() { 0.0 } else { n })
        }
        Some(InputShape::NumberMenu) | None => text(),
    }
}

fn menu_literal(value: &Literal, menu: &str) -> String {
    if let Some(label) = menus::option_label(menu, value) {
        return label.to_owned();
    }
    let is_string = menus::menu(menu).map_or(false, |m| {
        (m.accepts_reporters || m.accepts_strings) && !m.is_option(value)
    });
    if is_string {
        return string_literal(&value.to_text());
    }
    let text = value.to_text();
    if menu == "param" {
        return tidy_question(&text);
    }
    text
}

fn tidy_question(name: &str) -> String {
    match name.strip_suffix(" ?") {
        Some(stem) => format!("{}?", stem),
        None => name.to_owned(),
    }
}

pub fn string_literal(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// `#rrggbb`, shortened to `#rgb` when every channel repeats its digit.
pub fn color_literal(hex: &str) -> String {
    let mut digits: Vec<char> = hex.replacen('#', "", 1).chars().collect();
    while digits.len() < 6 {
        digits.insert(0, '0');
    }
    if digits[0] == digits[1] && digits[2] == digits[3] && digits[4] == digits[5] {
        digits = vec![digits[0], digits[2], digits[4]];
    }
    let hex: String = digits.into_iter().collect();
    format!("#{}", hex)
}
