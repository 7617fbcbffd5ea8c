//! Block graph of a sprite or the stage.
//!
//! Blocks live in a [`BlockStore`] keyed by id and linked through `next`,
//! `parent` and inputs. The store keeps creation order so that scripts
//! come out in the order they were written.

use std::collections::HashMap;
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ast::{BlockInfo, CustomBlock, Literal};
use crate::catalog::{self, Shape};

pub type BlockId = String;

/// Characters Scratch uses for block and variable ids.
const ID_SOUP: &[u8] =
    b"!#%()*+,-./:;=?@[]^_`{|}~ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// A fresh 20-character id.
pub fn new_id() -> String {
    let mut rng = rand::thread_rng();
    (0..20)
        .map(|_| ID_SOUP[rng.gen_range(0..ID_SOUP.len())] as char)
        .collect()
}

// ── Blocks ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Input {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow: Option<BlockId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<BlockId>,
}

impl Input {
    /// The input holds only its shadow, i.e. a literal.
    pub fn is_shadow_only(&self) -> bool {
        self.block.is_some() && self.block == self.shadow
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub value: Literal,
    /// Variable, list or broadcast id for fields naming one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mutation {
    Call {
        proccode: String,
        argumentids: Vec<String>,
    },
    Prototype {
        proccode: String,
        argumentids: Vec<String>,
        argumentnames: Vec<String>,
        argumentdefaults: Vec<Literal>,
        warp: bool,
    },
    Stop {
        hasnext: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScratchBlock {
    pub id: BlockId,
    pub opcode: String,
    #[serde(default)]
    pub parent: Option<BlockId>,
    #[serde(default)]
    pub next: Option<BlockId>,
    #[serde(default)]
    pub inputs: Vec<Input>,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutation: Option<Mutation>,
    #[serde(default)]
    pub shadow: bool,
    #[serde(default)]
    pub top_level: bool,
    #[serde(default)]
    pub x: i64,
    #[serde(default)]
    pub y: i64,
}

impl ScratchBlock {
    pub fn new(opcode: impl Into<String>, parent: Option<BlockId>) -> Self {
        ScratchBlock {
            id: new_id(),
            opcode: opcode.into(),
            top_level: parent.is_none(),
            parent,
            next: None,
            inputs: Vec::new(),
            fields: Vec::new(),
            mutation: None,
            shadow: false,
            x: 0,
            y: 0,
        }
    }

    pub fn input(&self, name: &str) -> Option<&Input> {
        self.inputs.iter().find(|i| i.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn set_input(&mut self, input: Input) {
        match self.inputs.iter_mut().find(|i| i.name == input.name) {
            Some(existing) => *existing = input,
            None => self.inputs.push(input),
        }
    }

    pub fn set_field(&mut self, field: Field) {
        match self.fields.iter_mut().find(|f| f.name == field.name) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
    }
}

/// What a stored block is, resolved against the catalog or its mutation.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub info: BlockInfo,
    pub shape: Shape,
    /// Input names aligned with `info.inputs()`.
    pub input_names: Vec<String>,
}

// ── Store ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<ScratchBlock>", into = "Vec<ScratchBlock>")]
pub struct BlockStore {
    blocks: Vec<ScratchBlock>,
    index: HashMap<BlockId, usize>,
}

impl From<Vec<ScratchBlock>> for BlockStore {
    fn from(blocks: Vec<ScratchBlock>) -> Self {
        let index = blocks
            .iter()
            .enumerate()
            .map(|(i, b)| (b.id.clone(), i))
            .collect();
        BlockStore { blocks, index }
    }
}

impl From<BlockStore> for Vec<ScratchBlock> {
    fn from(store: BlockStore) -> Self {
        store.blocks
    }
}

impl BlockStore {
    pub fn new() -> Self {
        BlockStore::default()
    }

    pub fn insert(&mut self, block: ScratchBlock) -> BlockId {
        let id = block.id.clone();
        match self.index.get(&id) {
            Some(&i) => self.blocks[i] = block,
            None => {
                self.index.insert(id.clone(), self.blocks.len());
                self.blocks.push(block);
            }
        }
        id
    }

    pub fn get(&self, id: &str) -> Option<&ScratchBlock> {
        self.index.get(id).map(|&i| &self.blocks[i])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut ScratchBlock> {
        let i = *self.index.get(id)?;
        self.blocks.get_mut(i)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScratchBlock> {
        self.blocks.iter()
    }

    /// Ids of top-level blocks in creation order.
    pub fn scripts(&self) -> Vec<BlockId> {
        self.blocks
            .iter()
            .filter(|b| b.top_level)
            .map(|b| b.id.clone())
            .collect()
    }

    pub fn next(&self, id: &str) -> Option<&ScratchBlock> {
        let next = self.get(id)?.next.as_deref()?;
        self.get(next)
    }

    /// First block of mouth `n` (1 or 2) of a c-block or if-block.
    pub fn branch(&self, id: &str, n: usize) -> Option<&ScratchBlock> {
        let name = if n <= 1 { "SUBSTACK" } else { "SUBSTACK2" };
        let input = self.get(id)?.input(name)?;
        self.get(input.block.as_deref()?)
    }

    /// The literal held by an input's shadow block.
    pub fn shadow_value(&self, input: &Input) -> Option<&Literal> {
        let shadow = self.get(input.block.as_deref()?)?;
        shadow.fields.first().map(|f| &f.value)
    }

    pub fn resolve(&self, block: &ScratchBlock) -> Option<Resolved> {
        match block.opcode.as_str() {
            "procedures_call" => match &block.mutation {
                Some(Mutation::Call {
                    proccode,
                    argumentids,
                }) => Some(Resolved {
                    info: BlockInfo::Custom(Arc::new(CustomBlock::from_spec(proccode.clone()))),
                    shape: Shape::Stack,
                    input_names: argumentids.clone(),
                }),
                _ => None,
            },
            opcode => {
                let descriptor = catalog::block(opcode)?;
                let mut shape = descriptor.shape;
                if let Some(Mutation::Stop { hasnext: true }) = block.mutation {
                    shape = Shape::Stack;
                }
                Some(Resolved {
                    info: BlockInfo::Builtin(descriptor),
                    shape,
                    input_names: descriptor.input_names.iter().map(|s| s.to_string()).collect(),
                })
            }
        }
    }
}

// ── Variables and targets ────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    Scalar,
    List,
    Broadcast,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub id: String,
    pub name: String,
    pub kind: VariableKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableTable {
    variables: Vec<Variable>,
}

impl VariableTable {
    pub fn find(&self, name: &str, kind: VariableKind) -> Option<&Variable> {
        self.variables
            .iter()
            .find(|v| v.kind == kind && v.name == name)
    }

    /// Add a variable with a fresh id and return the id.
    pub fn create(&mut self, name: impl Into<String>, kind: VariableKind) -> String {
        let id = new_id();
        self.variables.push(Variable {
            id: id.clone(),
            name: name.into(),
            kind,
        });
        id
    }

    pub fn names(&self, kind: VariableKind) -> impl Iterator<Item = &str> {
        self.variables
            .iter()
            .filter(move |v| v.kind == kind)
            .map(|v| v.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.variables.iter()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub name: String,
    #[serde(default)]
    pub is_stage: bool,
    #[serde(default)]
    pub variables: VariableTable,
    #[serde(default)]
    pub blocks: BlockStore,
}

impl Target {
    pub fn sprite(name: impl Into<String>) -> Self {
        Target {
            name: name.into(),
            ..Target::default()
        }
    }

    pub fn stage() -> Self {
        Target {
            name: "Stage".into(),
            is_stage: true,
            ..Target::default()
        }
    }
}

/// Find a variable visible from `target`: its own first, then the
/// stage's.
pub fn lookup_variable<'a>(
    target: &'a VariableTable,
    stage: Option<&'a VariableTable>,
    name: &str,
    kind: VariableKind,
) -> Option<&'a Variable> {
    target
        .find(name, kind)
        .or_else(|| stage.and_then(|s| s.find(name, kind)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_use_the_block_alphabet() {
        let id = new_id();
        assert_eq!(id.chars().count(), 20);
        assert!(id.bytes().all(|b| ID_SOUP.contains(&b)));
        assert_ne!(new_id(), new_id());
    }

    #[test]
    fn store_keeps_creation_order() {
        let mut store = BlockStore::new();
        let a = store.insert(ScratchBlock::new("event_whenflagclicked", None));
        let b = store.insert(ScratchBlock::new("motion_movesteps", Some(a.clone())));
        let c = store.insert(ScratchBlock::new("looks_show", None));
        if let Some(first) = store.get_mut(&a) {
            first.next = Some(b.clone());
        }
        assert_eq!(store.scripts(), vec![a.clone(), c]);
        assert_eq!(store.next(&a).map(|n| n.id.clone()), Some(b));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn store_serializes_as_a_list() {
        let mut store = BlockStore::new();
        store.insert(ScratchBlock::new("looks_show", None));
        let json = serde_json::to_value(&store).expect("serialize");
        assert!(json.is_array());
        let back: BlockStore = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, store);
    }

    #[test]
    fn stage_variables_are_visible() {
        let mut sprite = VariableTable::default();
        let mut stage = VariableTable::default();
        let own = sprite.create("score", VariableKind::Scalar);
        let global = stage.create("level", VariableKind::Scalar);
        stage.create("score", VariableKind::Scalar);
        let find = |name, kind| lookup_variable(&sprite, Some(&stage), name, kind).map(|v| v.id.clone());
        assert_eq!(find("score", VariableKind::Scalar), Some(own));
        assert_eq!(find("level", VariableKind::Scalar), Some(global));
        assert_eq!(find("level", VariableKind::List), None);
    }

    #[test]
    fn stop_with_next_resolves_as_stack() {
        let mut block = ScratchBlock::new("control_stop", None);
        let store = BlockStore::new();
        assert_eq!(store.resolve(&block).map(|r| r.shape), Some(Shape::Cap));
        block.mutation = Some(Mutation::Stop { hasnext: true });
        assert_eq!(store.resolve(&block).map(|r| r.shape), Some(Shape::Stack));
    }
}
