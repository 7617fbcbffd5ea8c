//! Pixel-height estimates used to stack compiled scripts vertically.

use crate::catalog::{self, Category, Shape, Slot};
use crate::error::LayoutError;
use crate::target::{BlockStore, ScratchBlock};

/// Space between scripts, and their left edge.
pub const GAP: i64 = 48;
const NOTCH: i64 = 8;
const HAT: i64 = 16;
const DEFINE_HAT: i64 = 20;
const DEFINITION: i64 = 92;

/// Heights of the block body without inputs, and the least it can be.
fn heights(shape: Shape) -> Option<(i64, i64)> {
    match shape {
        Shape::IfBlock => Some((80, 120)),
        Shape::CBlockCap => Some((40, 80)),
        Shape::Cap => Some((8, 48)),
        Shape::CBlock => Some((48, 88)),
        Shape::Stack => Some((16, 56)),
        Shape::Hat => Some((32, 72)),
        Shape::Reporter | Shape::Predicate => Some((8, 40)),
        Shape::Else | Shape::End | Shape::Ellips => None,
    }
}

/// Height of an input holding a literal or nothing. `None` is a mouth.
fn empty_slot(slot: Option<&Slot>) -> i64 {
    match slot {
        None => 24,
        Some(_) => 32,
    }
}

/// Place every top-level script at `x = GAP`, one under the other in
/// creation order.
pub fn layout(blocks: &mut BlockStore) -> Result<(), LayoutError> {
    let mut y = GAP;
    for id in blocks.scripts() {
        let Some(top) = blocks.get(&id) else {
            continue;
        };
        let height = measure_stack(blocks, top, false)?;
        let offset = if top.opcode == "procedures_definition" {
            DEFINE_HAT
        } else if catalog::block(&top.opcode).map(|d| d.shape) == Some(Shape::Hat) {
            HAT
        } else {
            0
        };
        if let Some(top) = blocks.get_mut(&id) {
            top.x = GAP;
            top.y = y + offset;
        }
        y += height + GAP;
    }
    Ok(())
}

/// Height of `top` and everything chained after it. Inside a mouth the
/// last block loses its notch unless it is a cap.
pub fn measure_stack(
    blocks: &BlockStore,
    top: &ScratchBlock,
    in_mouth: bool,
) -> Result<i64, LayoutError> {
    let mut height = measure_block(blocks, top)?;
    if let Some(next) = top.next.as_deref() {
        let next = blocks
            .get(next)
            .ok_or_else(|| LayoutError::MissingBlock(next.to_owned()))?;
        height += measure_stack(blocks, next, in_mouth)? - NOTCH;
    } else if in_mouth {
        let shape = blocks
            .resolve(top)
            .map(|r| r.shape)
            .ok_or_else(|| LayoutError::UnknownOpcode(top.opcode.clone()))?;
        if !matches!(shape, Shape::Cap | Shape::CBlockCap) {
            height -= NOTCH;
        }
    }
    Ok(height)
}

pub fn measure_block(blocks: &BlockStore, block: &ScratchBlock) -> Result<i64, LayoutError> {
    if block.opcode == "procedures_definition" {
        return Ok(DEFINITION);
    }
    let unknown = || LayoutError::UnknownOpcode(block.opcode.clone());
    let resolved = blocks.resolve(block).ok_or_else(unknown)?;
    let (internal, mut min) = heights(resolved.shape).ok_or_else(unknown)?;
    let slots = resolved.info.inputs();

    let mut arg_height = 0;
    let mut stack_height = 0;
    if !slots.is_empty() || resolved.shape.has_mouth() {
        let mut names: Vec<&str> = resolved.input_names.iter().map(String::as_str).collect();
        match resolved.shape {
            Shape::CBlock | Shape::CBlockCap => names.push("SUBSTACK"),
            Shape::IfBlock => names.extend(["SUBSTACK", "SUBSTACK2"]),
            _ => {}
        }
        for (i, name) in names.into_iter().enumerate() {
            // literals and fields measure as empty slots
            let child = block
                .input(name)
                .filter(|input| !input.is_shadow_only())
                .and_then(|input| input.block.as_deref())
                .and_then(|id| blocks.get(id));
            let slot = slots.get(i);
            match (slot, child) {
                (None, Some(child)) => stack_height += measure_stack(blocks, child, true)?,
                (Some(_), Some(child)) => arg_height = arg_height.max(measure_block(blocks, child)?),
                (None, None) => stack_height += empty_slot(None),
                (Some(slot), None) => arg_height = arg_height.max(empty_slot(Some(slot))),
            }
        }
    }

    if resolved.info.category() == Category::Extension {
        // room for the extension icon
        min += 8;
    }
    Ok((internal + arg_height).max(min) + stack_height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::Input;

    fn add(store: &mut BlockStore, opcode: &str, parent: Option<&str>) -> String {
        store.insert(ScratchBlock::new(opcode, parent.map(str::to_owned)))
    }

    fn link(store: &mut BlockStore, from: &str, to: &str) {
        if let Some(b) = store.get_mut(from) {
            b.next = Some(to.to_owned());
        }
    }

    #[test]
    fn stack_heights_share_notches() {
        let mut store = BlockStore::new();
        let hat = add(&mut store, "event_whenflagclicked", None);
        let show = add(&mut store, "looks_show", Some(&hat));
        link(&mut store, &hat, &show);
        let top = store.get(&hat).cloned().expect("hat");
        assert_eq!(measure_stack(&store, &top, false), Ok(72 - 8 + 56));
    }

    #[test]
    fn empty_mouth_counts_as_a_slot() {
        let mut store = BlockStore::new();
        let forever = add(&mut store, "control_forever", None);
        let block = store.get(&forever).cloned().expect("forever");
        assert_eq!(measure_block(&store, &block), Ok(80 + 24));
    }

    #[test]
    fn mouth_contents_are_measured() {
        let mut store = BlockStore::new();
        let forever_id = crate::target::new_id();
        let show = add(&mut store, "looks_show", Some(&forever_id));
        let mut forever = ScratchBlock::new("control_forever", None);
        forever.id = forever_id;
        forever.set_input(Input {
            name: "SUBSTACK".into(),
            shadow: None,
            block: Some(show),
        });
        store.insert(forever.clone());
        // the only block in the mouth is not a cap, so it loses its notch
        assert_eq!(measure_block(&store, &forever), Ok(80 + 56 - 8));
    }

    #[test]
    fn layout_places_scripts_in_order() {
        let mut store = BlockStore::new();
        let hat = add(&mut store, "event_whenflagclicked", None);
        let show = add(&mut store, "looks_show", None);
        layout(&mut store).expect("layout");
        let first = store.get(&hat).expect("hat");
        assert_eq!((first.x, first.y), (GAP, GAP + HAT));
        let second = store.get(&show).expect("show");
        assert_eq!(second.y, GAP + 72 + GAP);
    }

    #[test]
    fn unknown_opcodes_fail() {
        let mut store = BlockStore::new();
        add(&mut store, "nonsense_block", None);
        assert_eq!(
            layout(&mut store),
            Err(LayoutError::UnknownOpcode("nonsense_block".into()))
        );
    }
}
