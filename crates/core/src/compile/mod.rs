//! Parsed lines to a block graph.
//!
//! A hand-written recursive descent over line shapes: blank lines separate
//! scripts, c-blocks and if-blocks open mouths closed by `end`. Blocks are
//! built into a fresh store and only committed to the target when the
//! whole document compiles, so a failed compile leaves it untouched.

pub mod layout;

use crate::ast::{Arg, Block, Definition, Literal};
use crate::catalog::{InputShape, Shape};
use crate::error::CompileError;
use crate::lines::Line;
use crate::menus;
use crate::target::{
    lookup_variable, BlockId, BlockStore, Field, Input, Mutation, ScratchBlock, Target,
    VariableKind, VariableTable,
};

pub use layout::{layout, measure_block, measure_stack, GAP};

/// Compile `lines` into `target`, replacing its blocks.
///
/// `stage` is the stage's variable table when `target` is a sprite.
/// Variables are looked up on the target first, then on the stage; a
/// broadcast that does not exist yet is created on the stage.
pub fn compile(
    target: &mut Target,
    stage: Option<&mut VariableTable>,
    lines: &[Line],
) -> Result<(), CompileError> {
    let mut compiler = Compiler {
        lines,
        pos: 0,
        blocks: BlockStore::new(),
        variables: target.variables.clone(),
        stage: stage.as_deref().cloned(),
    };
    compiler.skip_comments();
    compiler.compile_file()?;

    let Compiler {
        mut blocks,
        variables,
        stage: stage_variables,
        ..
    } = compiler;
    layout::layout(&mut blocks).map_err(|err| CompileError::new(lines.len().max(1), err.to_string()))?;

    tracing::debug!(
        target = %target.name,
        blocks = blocks.len(),
        scripts = blocks.scripts().len(),
        "compiled"
    );
    target.blocks = blocks;
    target.variables = variables;
    if let (Some(stage), Some(updated)) = (stage, stage_variables) {
        *stage = updated;
    }
    Ok(())
}

/// What the stream holds at the current position.
#[derive(Clone, Copy)]
enum Peek<'a> {
    Eof,
    Line(&'a Line),
}

impl<'a> Peek<'a> {
    fn shape(self) -> Option<Shape> {
        match self {
            Peek::Line(line) => line.shape(),
            Peek::Eof => None,
        }
    }
}

struct Compiler<'a> {
    lines: &'a [Line],
    pos: usize,
    blocks: BlockStore,
    variables: VariableTable,
    stage: Option<VariableTable>,
}

impl<'a> Compiler<'a> {
    // ── Stream ───────────────────────────────────────────────────────

    fn peek(&self) -> Peek<'a> {
        match self.lines.get(self.pos) {
            Some(line) => Peek::Line(line),
            None => Peek::Eof,
        }
    }

    fn shift(&mut self) {
        self.pos += 1;
        self.skip_comments();
    }

    fn skip_comments(&mut self) {
        while matches!(self.lines.get(self.pos), Some(Line::Comment)) {
            self.pos += 1;
        }
    }

    /// An error reported against the current line. Running off the end
    /// blames the last line.
    fn error(&self, message: impl Into<String>) -> CompileError {
        let last = self.lines.len().saturating_sub(1);
        CompileError::new(self.pos.min(last) + 1, message)
    }

    fn expect_end(&mut self) -> Result<(), CompileError> {
        if self.peek().shape() != Some(Shape::End) {
            return Err(self.error("Expected \"end\""));
        }
        self.shift();
        Ok(())
    }

    // ── Structure ────────────────────────────────────────────────────

    fn compile_file(&mut self) -> Result<(), CompileError> {
        loop {
            match self.peek() {
                Peek::Eof => return Ok(()),
                Peek::Line(Line::Blank) => self.shift(),
                Peek::Line(_) => {
                    self.compile_script()?;
                    match self.peek() {
                        Peek::Eof => return Ok(()),
                        Peek::Line(Line::Blank) => {}
                        Peek::Line(Line::Error { message }) => return Err(self.error(message.clone())),
                        Peek::Line(_) => return Err(self.error("Expected a blank line")),
                    }
                }
            }
        }
    }

    fn compile_script(&mut self) -> Result<(), CompileError> {
        if let Peek::Line(Line::Block(block)) = self.peek() {
            if block.shape().is_reporter() {
                self.shift();
                self.compile_reporter(block, None);
                return Ok(());
            }
        }
        if let Some(first) = self.compile_block(None)? {
            self.compile_blocks(first)?;
        }
        Ok(())
    }

    /// Compile a run of blocks under `parent`, chaining them through
    /// `next`. Returns the first block of the run.
    fn compile_blocks(&mut self, parent: BlockId) -> Result<Option<BlockId>, CompileError> {
        if self.peek().shape() == Some(Shape::Ellips) {
            self.shift();
        }
        // a mouth's owner is stored after its contents, so the first block
        // of a mouth is never chained to it
        let mut prev = self.blocks.contains(&parent).then(|| parent.clone());
        let mut parent = parent;
        let mut first = None;
        loop {
            let ends = matches!(self.peek().shape(), Some(Shape::Cap | Shape::CBlockCap));
            let Some(id) = self.compile_block(Some(&parent))? else {
                return Ok(first);
            };
            if let Some(block) = prev.as_deref().and_then(|p| self.blocks.get_mut(p)) {
                block.next = Some(id.clone());
            }
            if first.is_none() {
                first = Some(id.clone());
            }
            if ends {
                return Ok(first);
            }
            parent = id.clone();
            prev = Some(id);
        }
    }

    /// Compile the block on the current line, if it can go here.
    fn compile_block(&mut self, parent: Option<&BlockId>) -> Result<Option<BlockId>, CompileError> {
        let line = match self.peek() {
            Peek::Line(line) => line,
            Peek::Eof => return Ok(None),
        };
        let mut scratch = ScratchBlock::new("", parent.cloned());
        match line {
            Line::Definition(definition) if parent.is_none() => {
                self.shift();
                self.compile_definition(&mut scratch, definition);
            }
            Line::Block(block) => match block.shape() {
                Shape::CBlock | Shape::CBlockCap => {
                    self.shift();
                    scratch.opcode = opcode(block).to_owned();
                    self.compile_inputs(&mut scratch, block);
                    self.compile_mouth(&mut scratch, "SUBSTACK")?;
                    self.expect_end()?;
                }
                Shape::IfBlock => {
                    self.shift();
                    self.compile_inputs(&mut scratch, block);
                    self.compile_mouth(&mut scratch, "SUBSTACK")?;
                    scratch.opcode = "control_if".to_owned();
                    match self.peek().shape() {
                        Some(Shape::Else) => {
                            scratch.opcode = "control_if_else".to_owned();
                            self.shift();
                            self.compile_mouth(&mut scratch, "SUBSTACK2")?;
                            self.expect_end()?;
                        }
                        Some(Shape::End) => self.shift(),
                        _ => return Err(self.error("Expected \"else\" or \"end\"")),
                    }
                }
                Shape::Cap | Shape::Stack => {
                    self.shift();
                    scratch.opcode = opcode(block).to_owned();
                    if block.info.is_custom() {
                        scratch.mutation = Some(Mutation::Call {
                            proccode: block.info.spec().to_owned(),
                            argumentids: (0..block.info.inputs().len()).map(|i| i.to_string()).collect(),
                        });
                    }
                    if block.selector() == Some("control_stop") {
                        let option = block.args.first().and_then(Arg::text).unwrap_or("");
                        scratch.mutation = Some(Mutation::Stop {
                            hasnext: option != "all" && option != "this script",
                        });
                    }
                    self.compile_inputs(&mut scratch, block);
                }
                Shape::Hat if parent.is_none() => {
                    self.shift();
                    scratch.opcode = opcode(block).to_owned();
                    self.compile_inputs(&mut scratch, block);
                }
                _ => return Ok(None),
            },
            _ => return Ok(None),
        }
        Ok(Some(self.blocks.insert(scratch)))
    }

    fn compile_mouth(&mut self, scratch: &mut ScratchBlock, name: &str) -> Result<(), CompileError> {
        if let Some(first) = self.compile_blocks(scratch.id.clone())? {
            scratch.set_input(Input {
                name: name.to_owned(),
                shadow: None,
                block: Some(first),
            });
        }
        Ok(())
    }

    /// A `procedures_definition` hat and the prototype shadow carrying its
    /// signature.
    fn compile_definition(&mut self, scratch: &mut ScratchBlock, definition: &Definition) {
        scratch.opcode = "procedures_definition".to_owned();
        let mut prototype = ScratchBlock::new("procedures_prototype", Some(scratch.id.clone()));
        prototype.shadow = true;
        prototype.mutation = Some(Mutation::Prototype {
            proccode: definition.spec.clone(),
            argumentids: (0..definition.input_names.len()).map(|i| i.to_string()).collect(),
            argumentnames: definition.input_names.clone(),
            argumentdefaults: definition.defaults.clone(),
            warp: definition.atomic,
        });
        let prototype = self.blocks.insert(prototype);
        scratch.set_input(Input {
            name: "custom_block".to_owned(),
            shadow: Some(prototype.clone()),
            block: Some(prototype),
        });
    }

    fn compile_reporter(&mut self, block: &Block, parent: Option<BlockId>) -> BlockId {
        let mut scratch = ScratchBlock::new(opcode(block), parent);
        self.compile_inputs(&mut scratch, block);
        self.blocks.insert(scratch)
    }

    // ── Inputs ───────────────────────────────────────────────────────

    fn compile_inputs(&mut self, scratch: &mut ScratchBlock, block: &Block) {
        for (index, arg) in block.args.iter().enumerate() {
            let name = block.info.input_name(index).into_owned();
            let slot = block.info.inputs().get(index);
            let literal = arg.literal();
            let reporter = arg.as_block();

            let variable_id = match (variable_kind(&name), &literal) {
                (Some(kind), Some(value)) => self.variable_id(&value.to_text(), kind),
                _ => None,
            };

            let value_or = |empty: &str| match &literal {
                Some(value) => value.clone(),
                None => Literal::text(empty),
            };
            let shadow = match slot.and_then(|s| s.shape()) {
                Some(InputShape::Number) => Some(("math_number".to_owned(), field("NUM", value_or(""), None))),
                Some(InputShape::String) => Some(("text".to_owned(), field("TEXT", value_or(""), None))),
                Some(InputShape::Color) => {
                    Some(("colour_picker".to_owned(), field("COLOUR", value_or("#3373cc"), None)))
                }
                Some(InputShape::ReadonlyMenu) => {
                    let menu = slot.and_then(|s| s.menu()).unwrap_or("");
                    if menus::menu(menu).map_or(false, |m| m.accepts_reporters) {
                        let field_name = match menu {
                            "event_broadcast_menu" => "BROADCAST_OPTION",
                            "pen_menu_colorParam" => "colorParam",
                            _ => name.as_str(),
                        };
                        Some((menu.to_owned(), field(field_name, value_or(""), variable_id.clone())))
                    } else {
                        scratch.set_field(field(&name, value_or(""), variable_id.clone()));
                        continue;
                    }
                }
                _ => None,
            };

            let mut input = Input {
                name,
                shadow: None,
                block: None,
            };
            if let Some((shadow_opcode, shadow_field)) = shadow {
                let mut shadow = ScratchBlock::new(shadow_opcode, Some(scratch.id.clone()));
                shadow.shadow = true;
                shadow.set_field(shadow_field);
                let id = self.blocks.insert(shadow);
                input.shadow = Some(id.clone());
                input.block = Some(id);
            }
            if let Some(reporter) = reporter {
                input.block = Some(self.compile_reporter(reporter, Some(scratch.id.clone())));
            }
            scratch.set_input(input);
        }
    }

    /// Id of the named variable, creating broadcasts on first use.
    fn variable_id(&mut self, name: &str, kind: VariableKind) -> Option<String> {
        if let Some(found) = lookup_variable(&self.variables, self.stage.as_ref(), name, kind) {
            return Some(found.id.clone());
        }
        if kind != VariableKind::Broadcast {
            return None;
        }
        tracing::debug!(name, "creating broadcast");
        let table = self.stage.as_mut().unwrap_or(&mut self.variables);
        Some(table.create(name, kind))
    }
}

fn opcode(block: &Block) -> &'static str {
    block.selector().unwrap_or("procedures_call")
}

fn variable_kind(input_name: &str) -> Option<VariableKind> {
    match input_name {
        "VARIABLE" => Some(VariableKind::Scalar),
        "LIST" => Some(VariableKind::List),
        "BROADCAST_OPTION" | "BROADCAST_INPUT" => Some(VariableKind::Broadcast),
        _ => None,
    }
}

fn field(name: &str, value: Literal, id: Option<String>) -> Field {
    Field {
        name: name.to_owned(),
        value,
        id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModeConfig;
    use crate::lines::parse_lines;

    fn compile_text(code: &str, config: &ModeConfig) -> Result<Target, CompileError> {
        let lines = parse_lines(code, config).lines;
        let mut target = Target::sprite("Sprite1");
        let mut stage = VariableTable::default();
        compile(&mut target, Some(&mut stage), &lines)?;
        Ok(target)
    }

    fn only<'a>(target: &'a Target, opcode: &str) -> &'a ScratchBlock {
        let found: Vec<_> = target.blocks.iter().filter(|b| b.opcode == opcode).collect();
        assert_eq!(found.len(), 1, "{} blocks with opcode {}", found.len(), opcode);
        found[0]
    }

    #[test]
    fn scripts_chain_through_next() {
        let target = compile_text("when flag clicked\nmove 10 steps\nshow", &ModeConfig::default())
            .expect("compiles");
        let hat = only(&target, "event_whenflagclicked");
        let mv = only(&target, "motion_movesteps");
        let show = only(&target, "looks_show");
        assert_eq!(hat.next.as_deref(), Some(mv.id.as_str()));
        assert_eq!(mv.next.as_deref(), Some(show.id.as_str()));
        assert_eq!(mv.parent.as_deref(), Some(hat.id.as_str()));
        assert!(hat.top_level);
        assert!(!mv.top_level);
        let steps = mv.input("STEPS").expect("STEPS");
        assert!(steps.is_shadow_only());
        assert_eq!(
            target.blocks.shadow_value(steps),
            Some(&Literal::Number(10.0))
        );
    }

    #[test]
    fn repeat_owns_its_body() {
        let target = compile_text("repeat 10\n  move 10 steps\nend\n", &ModeConfig::default())
            .expect("compiles");
        let repeat = only(&target, "control_repeat");
        let mv = only(&target, "motion_movesteps");
        let body = repeat.input("SUBSTACK").expect("SUBSTACK");
        assert_eq!(body.block.as_deref(), Some(mv.id.as_str()));
        assert_eq!(mv.parent.as_deref(), Some(repeat.id.as_str()));
        assert_eq!(repeat.next, None);
    }

    #[test]
    fn missing_end_blames_the_end_of_input() {
        let err = compile_text("repeat 10\n  move 10 steps\n", &ModeConfig::default())
            .expect_err("fails");
        assert_eq!(err, CompileError::new(3, "Expected \"end\""));
    }

    #[test]
    fn if_else_gets_both_branches() {
        let target = compile_text(
            "if <mouse down?> then\n  show\nelse\n  hide\nend",
            &ModeConfig::default(),
        )
        .expect("compiles");
        let if_else = only(&target, "control_if_else");
        assert!(if_else.input("SUBSTACK").is_some());
        assert!(if_else.input("SUBSTACK2").is_some());
        let condition = if_else.input("CONDITION").expect("CONDITION");
        assert_eq!(condition.shadow, None);
        let sensing = target.blocks.get(condition.block.as_deref().expect("block")).expect("reporter");
        assert_eq!(sensing.opcode, "sensing_mousedown");

        let target = compile_text("if <mouse down?> then\nend", &ModeConfig::default()).expect("compiles");
        let if_block = only(&target, "control_if");
        assert!(if_block.input("SUBSTACK").is_none());
    }

    #[test]
    fn structural_errors_name_their_line() {
        let config = ModeConfig::default();
        let err = compile_text("if <mouse down?> then\n  show\nshow\n\nshow", &config).expect_err("fails");
        assert_eq!(err, CompileError::new(4, "Expected \"else\" or \"end\""));
        let err = compile_text("show\nwhen flag clicked", &config).expect_err("fails");
        assert_eq!(err, CompileError::new(2, "Expected a blank line"));
        let err = compile_text("show\nmove foo bar", &config).expect_err("fails");
        assert_eq!(err.line, 2);
        assert!(err.message.starts_with("Unexpected"), "{}", err.message);
    }

    #[test]
    fn comments_are_skipped_everywhere() {
        let target = compile_text(
            "// intro\nwhen flag clicked\n// between\nshow\n// after",
            &ModeConfig::default(),
        )
        .expect("compiles");
        let hat = only(&target, "event_whenflagclicked");
        assert!(hat.next.is_some());
    }

    #[test]
    fn stop_records_whether_the_script_continues() {
        let target = compile_text("stop other scripts in sprite\nstop all", &ModeConfig::default())
            .expect("compiles");
        let stops: Vec<_> = target.blocks.iter().filter(|b| b.opcode == "control_stop").collect();
        assert_eq!(stops[0].mutation, Some(Mutation::Stop { hasnext: true }));
        assert_eq!(stops[1].mutation, Some(Mutation::Stop { hasnext: false }));
        assert_eq!(stops[0].next.as_deref(), Some(stops[1].id.as_str()));
        assert_eq!(
            stops[1].field("STOP_OPTION").map(|f| f.value.clone()),
            Some(Literal::text("all"))
        );
    }

    #[test]
    fn definitions_get_a_prototype() {
        let target = compile_text("define-atomic jump (height)\nchange y by height", &ModeConfig::default())
            .expect("compiles");
        let definition = only(&target, "procedures_definition");
        let prototype = only(&target, "procedures_prototype");
        assert!(prototype.shadow);
        assert_eq!(prototype.parent.as_deref(), Some(definition.id.as_str()));
        assert_eq!(
            prototype.mutation,
            Some(Mutation::Prototype {
                proccode: "jump %s".into(),
                argumentids: vec!["0".into()],
                argumentnames: vec!["height".into()],
                argumentdefaults: vec![Literal::text("")],
                warp: true,
            })
        );
        let change = only(&target, "motion_changeyby");
        assert_eq!(definition.next.as_deref(), Some(change.id.as_str()));
        only(&target, "argument_reporter_string_number");
    }

    #[test]
    fn custom_calls_carry_their_signature() {
        let config = ModeConfig::from_toml_str("definitions = [\"define jump (height)\"]").expect("config");
        let target = compile_text("jump 10", &config).expect("compiles");
        let call = only(&target, "procedures_call");
        assert_eq!(
            call.mutation,
            Some(Mutation::Call {
                proccode: "jump %s".into(),
                argumentids: vec!["0".into()],
            })
        );
        assert!(call.input("0").is_some());
    }

    #[test]
    fn broadcasts_are_created_on_the_stage() {
        let lines = parse_lines("broadcast \"go\"\nbroadcast \"go\"", &ModeConfig::default()).lines;
        let mut target = Target::sprite("Sprite1");
        let mut stage = VariableTable::default();
        compile(&mut target, Some(&mut stage), &lines).expect("compiles");
        let names: Vec<_> = stage.names(VariableKind::Broadcast).collect();
        assert_eq!(names, vec!["go"]);
        let id = stage.find("go", VariableKind::Broadcast).map(|v| v.id.clone());
        let menus: Vec<_> = target
            .blocks
            .iter()
            .filter(|b| b.opcode == "event_broadcast_menu")
            .collect();
        assert_eq!(menus.len(), 2);
        assert!(menus.iter().all(|m| m.field("BROADCAST_OPTION").and_then(|f| f.id.clone()) == id));
    }

    #[test]
    fn failed_compile_leaves_the_target_alone() {
        let mut target = compile_text("show", &ModeConfig::default()).expect("compiles");
        let before = target.clone();
        let lines = parse_lines("repeat 3\nshow", &ModeConfig::default()).lines;
        assert!(compile(&mut target, None, &lines).is_err());
        assert_eq!(target, before);
    }
}
