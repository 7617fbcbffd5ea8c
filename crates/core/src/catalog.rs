//! Block descriptor catalog.
//!
//! The static table of every block the language knows: its opcode, the
//! spec pattern shown to the user, the names of its inputs, its shape and
//! its palette category.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shape {
    #[serde(rename = "stack")]
    Stack,
    #[serde(rename = "cap")]
    Cap,
    #[serde(rename = "hat")]
    Hat,
    #[serde(rename = "c-block")]
    CBlock,
    #[serde(rename = "c-block cap")]
    CBlockCap,
    #[serde(rename = "if-block")]
    IfBlock,
    #[serde(rename = "reporter")]
    Reporter,
    #[serde(rename = "predicate")]
    Predicate,
    #[serde(rename = "else")]
    Else,
    #[serde(rename = "end")]
    End,
    #[serde(rename = "ellips")]
    Ellips,
}

impl Shape {
    pub fn as_str(self) -> &'static str {
        match self {
            Shape::Stack => "stack",
            Shape::Cap => "cap",
            Shape::Hat => "hat",
            Shape::CBlock => "c-block",
            Shape::CBlockCap => "c-block cap",
            Shape::IfBlock => "if-block",
            Shape::Reporter => "reporter",
            Shape::Predicate => "predicate",
            Shape::Else => "else",
            Shape::End => "end",
            Shape::Ellips => "ellips",
        }
    }

    /// Shapes that open a nested body closed by `end`.
    pub fn has_mouth(self) -> bool {
        matches!(self, Shape::CBlock | Shape::CBlockCap | Shape::IfBlock)
    }

    pub fn is_reporter(self) -> bool {
        matches!(self, Shape::Reporter | Shape::Predicate)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Highlight category. Blocks carry one of the palette categories; the
/// remaining variants tag literal tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Motion,
    Looks,
    Sound,
    Events,
    Control,
    Sensing,
    Pen,
    Operators,
    Variable,
    List,
    Custom,
    Extension,
    Parameter,
    Grey,
    Green,
    Number,
    String,
    Escape,
    Color,
    Comment,
    False,
    Zero,
    Empty,
    Ellipsis,
    Error,
}

impl Category {
    pub const ALL: [Category; 25] = [
        Category::Motion,
        Category::Looks,
        Category::Sound,
        Category::Events,
        Category::Control,
        Category::Sensing,
        Category::Pen,
        Category::Operators,
        Category::Variable,
        Category::List,
        Category::Custom,
        Category::Extension,
        Category::Parameter,
        Category::Grey,
        Category::Green,
        Category::Number,
        Category::String,
        Category::Escape,
        Category::Color,
        Category::Comment,
        Category::False,
        Category::Zero,
        Category::Empty,
        Category::Ellipsis,
        Category::Error,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Motion => "motion",
            Category::Looks => "looks",
            Category::Sound => "sound",
            Category::Events => "events",
            Category::Control => "control",
            Category::Sensing => "sensing",
            Category::Pen => "pen",
            Category::Operators => "operators",
            Category::Variable => "variable",
            Category::List => "list",
            Category::Custom => "custom",
            Category::Extension => "extension",
            Category::Parameter => "parameter",
            Category::Grey => "grey",
            Category::Green => "green",
            Category::Number => "number",
            Category::String => "string",
            Category::Escape => "escape",
            Category::Color => "color",
            Category::Comment => "comment",
            Category::False => "false",
            Category::Zero => "zero",
            Category::Empty => "empty",
            Category::Ellipsis => "ellipsis",
            Category::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputShape {
    Boolean,
    Color,
    NumberMenu,
    ReadonlyMenu,
    Number,
    String,
}

static INPUT_PAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%[a-zA-Z](?:\.[a-zA-Z_]+)?").expect("input pattern compiles"));

/// An input placeholder such as `%n` or `%m.var`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slot(String);

impl Slot {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Slot(placeholder.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn shape(&self) -> Option<InputShape> {
        match self.0.get(..2)? {
            "%b" => Some(InputShape::Boolean),
            "%c" => Some(InputShape::Color),
            "%d" => Some(InputShape::NumberMenu),
            "%m" => Some(InputShape::ReadonlyMenu),
            "%n" => Some(InputShape::Number),
            "%s" => Some(InputShape::String),
            _ => None,
        }
    }

    /// Menu name for `%m.name` / `%d.name` slots.
    pub fn menu(&self) -> Option<&str> {
        self.0.split_once('.').map(|(_, menu)| menu)
    }

    /// Grammar nonterminal accepting values for this slot. String slots
    /// accept booleans too.
    pub fn nonterminal(&self) -> String {
        let name = self.0[1..].replace('.', "_");
        if name == "s" {
            "sb".to_owned()
        } else {
            name
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Text(String),
    Slot(Slot),
}

/// Split a spec pattern into literal text and placeholders. Empty text
/// between adjacent placeholders is dropped.
pub fn split_spec(spec: &str) -> Vec<Part> {
    let mut parts = Vec::new();
    let mut last = 0;
    for m in INPUT_PAT.find_iter(spec) {
        if m.start() > last {
            parts.push(Part::Text(spec[last..m.start()].to_owned()));
        }
        parts.push(Part::Slot(Slot::new(m.as_str())));
        last = m.end();
    }
    if last < spec.len() {
        parts.push(Part::Text(spec[last..].to_owned()));
    }
    parts
}

pub fn slots(parts: &[Part]) -> Vec<Slot> {
    parts
        .iter()
        .filter_map(|p| match p {
            Part::Slot(s) => Some(s.clone()),
            Part::Text(_) => None,
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct BlockDescriptor {
    pub selector: &'static str,
    pub spec: &'static str,
    pub input_names: Vec<&'static str>,
    pub shape: Shape,
    pub category: Category,
    pub parts: Vec<Part>,
    pub inputs: Vec<Slot>,
}

impl BlockDescriptor {
    fn new(
        selector: &'static str,
        spec: &'static str,
        input_names: &[&'static str],
        shape: Shape,
    ) -> Self {
        let parts = split_spec(spec);
        let inputs = slots(&parts);
        BlockDescriptor {
            selector,
            spec,
            input_names: input_names.to_vec(),
            shape,
            category: default_category(selector),
            parts,
            inputs,
        }
    }
}

fn default_category(selector: &str) -> Category {
    match selector {
        "else" | "end" => return Category::Control,
        "ellips" => return Category::Grey,
        _ => {}
    }
    let prefix = selector.split('_').next().unwrap_or(selector);
    match prefix {
        "motion" => Category::Motion,
        "looks" => Category::Looks,
        "sound" => Category::Sound,
        "event" => Category::Events,
        "control" => Category::Control,
        "sensing" => Category::Sensing,
        "operator" => Category::Operators,
        "data" if selector.contains("list") => Category::List,
        "data" => Category::Variable,
        "pen" => Category::Pen,
        "music" | "videoSensing" => Category::Extension,
        "argument" => Category::Parameter,
        _ => Category::Grey,
    }
}

type Raw = (&'static str, &'static str, &'static [&'static str], Shape);

#[rustfmt::skip]
const BLOCKS: &[Raw] = &[
    // motion
    ("motion_movesteps", "move %n steps", &["STEPS"], Shape::Stack),
    ("motion_turnright", "turn @turnRight %n degrees", &["DEGREES"], Shape::Stack),
    ("motion_turnleft", "turn @turnLeft %n degrees", &["DEGREES"], Shape::Stack),
    ("motion_goto", "go to %m.motion_goto_menu", &["TO"], Shape::Stack),
    ("motion_gotoxy", "go to x:%n y:%n", &["X", "Y"], Shape::Stack),
    ("motion_glideto", "glide %n secs to %m.motion_glideto_menu", &["SECS", "TO"], Shape::Stack),
    ("motion_glidesecstoxy", "glide %n secs to x:%n y:%n", &["SECS", "X", "Y"], Shape::Stack),
    ("motion_pointindirection", "point in direction %n", &["DIRECTION"], Shape::Stack),
    ("motion_pointtowards", "point towards %m.motion_pointtowards_menu", &["TOWARDS"], Shape::Stack),
    ("motion_changexby", "change x by %n", &["DX"], Shape::Stack),
    ("motion_setx", "set x to %n", &["X"], Shape::Stack),
    ("motion_changeyby", "change y by %n", &["DY"], Shape::Stack),
    ("motion_sety", "set y to %n", &["Y"], Shape::Stack),
    ("motion_ifonedgebounce", "if on edge, bounce", &[], Shape::Stack),
    ("motion_setrotationstyle", "set rotation style %m.rotationStyle", &["STYLE"], Shape::Stack),
    ("motion_xposition", "x position", &[], Shape::Reporter),
    ("motion_yposition", "y position", &[], Shape::Reporter),
    ("motion_direction", "direction", &[], Shape::Reporter),
    // looks
    ("looks_sayforsecs", "say %s for %n seconds", &["MESSAGE", "SECS"], Shape::Stack),
    ("looks_say", "say %s", &["MESSAGE"], Shape::Stack),
    ("looks_thinkforsecs", "think %s for %n seconds", &["MESSAGE", "SECS"], Shape::Stack),
    ("looks_think", "think %s", &["MESSAGE"], Shape::Stack),
    ("looks_switchcostumeto", "switch costume to %m.looks_costume", &["COSTUME"], Shape::Stack),
    ("looks_nextcostume", "next costume", &[], Shape::Stack),
    ("looks_switchbackdropto", "switch backdrop to %m.looks_backdrops", &["BACKDROP"], Shape::Stack),
    ("looks_switchbackdroptoandwait", "switch backdrop to %m.looks_backdrops and wait", &["BACKDROP"], Shape::Stack),
    ("looks_nextbackdrop", "next backdrop", &[], Shape::Stack),
    ("looks_changesizeby", "change size by %n", &["CHANGE"], Shape::Stack),
    ("looks_setsizeto", "set size to %n%", &["SIZE"], Shape::Stack),
    ("looks_changeeffectby", "change %m.effect effect by %n", &["EFFECT", "CHANGE"], Shape::Stack),
    ("looks_seteffectto", "set %m.effect effect to %n", &["EFFECT", "VALUE"], Shape::Stack),
    ("looks_cleargraphiceffects", "clear graphic effects", &[], Shape::Stack),
    ("looks_show", "show", &[], Shape::Stack),
    ("looks_hide", "hide", &[], Shape::Stack),
    ("looks_gotofrontback", "go to %m.frontBack layer", &["FRONT_BACK"], Shape::Stack),
    ("looks_goforwardbackwardlayers", "go %m.forwardBackward %n layers", &["FORWARD_BACKWARD", "NUM"], Shape::Stack),
    ("looks_costumenumbername", "costume %m.numberName", &["NUMBER_NAME"], Shape::Reporter),
    ("looks_backdropnumbername", "backdrop %m.numberName", &["NUMBER_NAME"], Shape::Reporter),
    ("looks_size", "size", &[], Shape::Reporter),
    // sound
    ("sound_playuntildone", "play sound %m.sound_sounds_menu until done", &["SOUND_MENU"], Shape::Stack),
    ("sound_play", "start sound %m.sound_sounds_menu", &["SOUND_MENU"], Shape::Stack),
    ("sound_stopallsounds", "stop all sounds", &[], Shape::Stack),
    ("sound_changeeffectby", "change %m.soundEffect effect by %n", &["EFFECT", "VALUE"], Shape::Stack),
    ("sound_seteffectto", "set %m.soundEffect effect to %n", &["EFFECT", "VALUE"], Shape::Stack),
    ("sound_cleareffects", "clear sound effects", &[], Shape::Stack),
    ("sound_changevolumeby", "change volume by %n", &["VOLUME"], Shape::Stack),
    ("sound_setvolumeto", "set volume to %n%", &["VOLUME"], Shape::Stack),
    ("sound_volume", "volume", &[], Shape::Reporter),
    // events
    ("event_whenflagclicked", "when @greenFlag clicked", &[], Shape::Hat),
    ("event_whenkeypressed", "when %m.key key pressed", &["KEY_OPTION"], Shape::Hat),
    ("event_whenthisspriteclicked", "when this sprite clicked", &[], Shape::Hat),
    ("event_whenbackdropswitchesto", "when backdrop switches to %m.backdrop", &["BACKDROP"], Shape::Hat),
    ("event_whengreaterthan", "when %m.triggerSensor > %n", &["WHENGREATERTHANMENU", "VALUE"], Shape::Hat),
    ("event_whenbroadcastreceived", "when I receive %m.broadcast", &["BROADCAST_OPTION"], Shape::Hat),
    ("event_broadcast", "broadcast %m.event_broadcast_menu", &["BROADCAST_INPUT"], Shape::Stack),
    ("event_broadcastandwait", "broadcast %m.event_broadcast_menu and wait", &["BROADCAST_INPUT"], Shape::Stack),
    // control
    ("control_wait", "wait %n seconds", &["DURATION"], Shape::Stack),
    ("control_repeat", "repeat %n", &["TIMES"], Shape::CBlock),
    ("control_forever", "forever", &[], Shape::CBlockCap),
    ("control_if", "if %b then", &["CONDITION"], Shape::CBlock),
    ("control_if_else", "if %b then", &["CONDITION"], Shape::IfBlock),
    ("control_wait_until", "wait until %b", &["CONDITION"], Shape::Stack),
    ("control_repeat_until", "repeat until %b", &["CONDITION"], Shape::CBlock),
    ("control_stop", "stop %m.stop", &["STOP_OPTION"], Shape::Cap),
    ("control_start_as_clone", "when I start as a clone", &[], Shape::Hat),
    ("control_create_clone_of", "create clone of %m.control_create_clone_of_menu", &["CLONE_OPTION"], Shape::Stack),
    ("control_delete_this_clone", "delete this clone", &[], Shape::Cap),
    ("else", "else", &[], Shape::Else),
    ("end", "end", &[], Shape::End),
    // sensing
    ("sensing_touchingobject", "touching %m.sensing_touchingobjectmenu?", &["TOUCHINGOBJECTMENU"], Shape::Predicate),
    ("sensing_touchingcolor", "touching color %c?", &["COLOR"], Shape::Predicate),
    ("sensing_coloristouchingcolor", "color %c is touching %c?", &["COLOR", "COLOR2"], Shape::Predicate),
    ("sensing_distanceto", "distance to %m.sensing_distancetomenu", &["DISTANCETOMENU"], Shape::Reporter),
    ("sensing_askandwait", "ask %s and wait", &["QUESTION"], Shape::Stack),
    ("sensing_answer", "answer", &[], Shape::Reporter),
    ("sensing_keypressed", "key %m.sensing_keyoptions pressed?", &["KEY_OPTION"], Shape::Predicate),
    ("sensing_mousedown", "mouse down?", &[], Shape::Predicate),
    ("sensing_mousex", "mouse x", &[], Shape::Reporter),
    ("sensing_mousey", "mouse y", &[], Shape::Reporter),
    ("sensing_setdragmode", "set drag mode %m.dragMode", &["DRAG_MODE"], Shape::Stack),
    ("sensing_loudness", "loudness", &[], Shape::Reporter),
    ("sensing_timer", "timer", &[], Shape::Reporter),
    ("sensing_resettimer", "reset timer", &[], Shape::Stack),
    ("sensing_of", "%m.attribute of %m.sensing_of_object_menu", &["PROPERTY", "OBJECT"], Shape::Reporter),
    ("sensing_current", "current %m.timeAndDate", &["CURRENTMENU"], Shape::Reporter),
    ("sensing_dayssince2000", "days since 2000", &[], Shape::Reporter),
    ("sensing_username", "username", &[], Shape::Reporter),
    // operators
    ("operator_add", "%n + %n", &["NUM1", "NUM2"], Shape::Reporter),
    ("operator_subtract", "%n - %n", &["NUM1", "NUM2"], Shape::Reporter),
    ("operator_multiply", "%n * %n", &["NUM1", "NUM2"], Shape::Reporter),
    ("operator_divide", "%n / %n", &["NUM1", "NUM2"], Shape::Reporter),
    ("operator_random", "pick random %n to %n", &["FROM", "TO"], Shape::Reporter),
    ("operator_gt", "%s > %s", &["OPERAND1", "OPERAND2"], Shape::Predicate),
    ("operator_lt", "%s < %s", &["OPERAND1", "OPERAND2"], Shape::Predicate),
    ("operator_equals", "%s = %s", &["OPERAND1", "OPERAND2"], Shape::Predicate),
    ("operator_and", "%b and %b", &["OPERAND1", "OPERAND2"], Shape::Predicate),
    ("operator_or", "%b or %b", &["OPERAND1", "OPERAND2"], Shape::Predicate),
    ("operator_not", "not %b", &["OPERAND"], Shape::Predicate),
    ("operator_join", "join %s %s", &["STRING1", "STRING2"], Shape::Reporter),
    ("operator_letter_of", "letter %n of %s", &["LETTER", "STRING"], Shape::Reporter),
    ("operator_length", "length of %s", &["STRING"], Shape::Reporter),
    ("operator_contains", "%s contains %s?", &["STRING1", "STRING2"], Shape::Predicate),
    ("operator_mod", "%n mod %n", &["NUM1", "NUM2"], Shape::Reporter),
    ("operator_round", "round %n", &["NUM"], Shape::Reporter),
    ("operator_mathop", "%m.mathOp of %n", &["OPERATOR", "NUM"], Shape::Reporter),
    // variables
    ("data_variable", "%m.var", &["VARIABLE"], Shape::Reporter),
    ("data_setvariableto", "set %m.var to %s", &["VARIABLE", "VALUE"], Shape::Stack),
    ("data_changevariableby", "change %m.var by %n", &["VARIABLE", "VALUE"], Shape::Stack),
    ("data_showvariable", "show variable %m.var", &["VARIABLE"], Shape::Stack),
    ("data_hidevariable", "hide variable %m.var", &["VARIABLE"], Shape::Stack),
    // lists
    ("data_listcontents", "%m.list", &["LIST"], Shape::Reporter),
    ("data_addtolist", "add %s to %m.list", &["ITEM", "LIST"], Shape::Stack),
    ("data_deleteoflist", "delete %n of %m.list", &["INDEX", "LIST"], Shape::Stack),
    ("data_deletealloflist", "delete all of %m.list", &["LIST"], Shape::Stack),
    ("data_insertatlist", "insert %s at %n of %m.list", &["ITEM", "INDEX", "LIST"], Shape::Stack),
    ("data_replaceitemoflist", "replace item %n of %m.list with %s", &["INDEX", "LIST", "ITEM"], Shape::Stack),
    ("data_itemoflist", "item %n of %m.list", &["INDEX", "LIST"], Shape::Reporter),
    ("data_itemnumoflist", "item # of %s in %m.list", &["ITEM", "LIST"], Shape::Reporter),
    ("data_lengthoflist", "length of %m.listNonempty", &["LIST"], Shape::Reporter),
    ("data_listcontainsitem", "%m.listNonempty contains %s?", &["LIST", "ITEM"], Shape::Predicate),
    ("data_showlist", "show list %m.list", &["LIST"], Shape::Stack),
    ("data_hidelist", "hide list %m.list", &["LIST"], Shape::Stack),
    // pen
    ("pen_clear", "erase all", &[], Shape::Stack),
    ("pen_stamp", "stamp", &[], Shape::Stack),
    ("pen_penDown", "pen down", &[], Shape::Stack),
    ("pen_penUp", "pen up", &[], Shape::Stack),
    ("pen_setPenColorToColor", "set pen color to %c", &["COLOR"], Shape::Stack),
    ("pen_changePenColorParamBy", "change pen %m.pen_menu_colorParam by %n", &["COLOR_PARAM", "VALUE"], Shape::Stack),
    ("pen_setPenColorParamTo", "set pen %m.pen_menu_colorParam to %n", &["COLOR_PARAM", "VALUE"], Shape::Stack),
    ("pen_changePenSizeBy", "change pen size by %n", &["SIZE"], Shape::Stack),
    ("pen_setPenSizeTo", "set pen size to %n", &["SIZE"], Shape::Stack),
    // music
    ("music_playDrumForBeats", "play drum %m.music_menu_DRUM for %n beats", &["DRUM", "BEATS"], Shape::Stack),
    ("music_restForBeats", "rest for %n beats", &["BEATS"], Shape::Stack),
    ("music_playNoteForBeats", "play note %n for %n beats", &["NOTE", "BEATS"], Shape::Stack),
    ("music_setInstrument", "set instrument to %m.music_menu_INSTRUMENT", &["INSTRUMENT"], Shape::Stack),
    ("music_setTempo", "set tempo to %n", &["TEMPO"], Shape::Stack),
    ("music_changeTempo", "change tempo by %n", &["TEMPO"], Shape::Stack),
    ("music_getTempo", "tempo", &[], Shape::Reporter),
    // video sensing
    ("videoSensing_whenMotionGreaterThan", "when video motion > %n", &["REFERENCE"], Shape::Hat),
    ("videoSensing_videoOn", "video %m.videoSensing_menu_ATTRIBUTE on %m.videoSensing_menu_SUBJECT", &["ATTRIBUTE", "SUBJECT"], Shape::Reporter),
    ("videoSensing_videoToggle", "turn video %m.videoSensing_menu_VIDEO_STATE", &["VIDEO_STATE"], Shape::Stack),
    ("videoSensing_setVideoTransparency", "set video transparency to %n", &["TRANSPARENCY"], Shape::Stack),
    // custom block parameters
    ("argument_reporter_string_number", "%m.param", &["VALUE"], Shape::Reporter),
    ("argument_reporter_boolean", "%m.param", &["VALUE"], Shape::Predicate),
    ("ellips", "...", &[], Shape::Ellips),
];

static CATALOG: Lazy<Vec<BlockDescriptor>> = Lazy::new(|| {
    BLOCKS
        .iter()
        .map(|&(selector, spec, inputs, shape)| BlockDescriptor::new(selector, spec, inputs, shape))
        .collect()
});

static BY_SELECTOR: Lazy<HashMap<&'static str, &'static BlockDescriptor>> =
    Lazy::new(|| CATALOG.iter().map(|b| (b.selector, b)).collect());

/// `stop other scripts in sprite` does not end the script, so it is a
/// stack block rather than a cap.
static STOP_OTHER_SCRIPTS: Lazy<BlockDescriptor> = Lazy::new(|| {
    BlockDescriptor::new("control_stop", "stop %m.stop", &["STOP_OPTION"], Shape::Stack)
});

/// Every descriptor, in palette order.
pub fn blocks() -> &'static [BlockDescriptor] {
    &CATALOG
}

pub fn block(selector: &str) -> Option<&'static BlockDescriptor> {
    BY_SELECTOR.get(selector).copied()
}

pub fn stop_other_scripts() -> &'static BlockDescriptor {
    &STOP_OTHER_SCRIPTS
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn selectors_are_unique() {
        let mut seen = HashSet::new();
        for b in blocks() {
            assert!(seen.insert(b.selector), "duplicate {}", b.selector);
        }
    }

    #[test]
    fn input_names_align_with_placeholders() {
        for b in blocks() {
            assert_eq!(
                b.inputs.len(),
                b.input_names.len(),
                "{} ({})",
                b.selector,
                b.spec
            );
        }
    }

    #[test]
    fn categories_follow_opcode_prefix() {
        assert_eq!(block("event_broadcast").map(|b| b.category), Some(Category::Events));
        assert_eq!(block("data_variable").map(|b| b.category), Some(Category::Variable));
        assert_eq!(block("data_itemoflist").map(|b| b.category), Some(Category::List));
        assert_eq!(block("music_getTempo").map(|b| b.category), Some(Category::Extension));
        assert_eq!(
            block("argument_reporter_boolean").map(|b| b.category),
            Some(Category::Parameter)
        );
        assert_eq!(block("end").map(|b| b.category), Some(Category::Control));
        assert_eq!(block("ellips").map(|b| b.category), Some(Category::Grey));
    }

    #[test]
    fn spec_splits_into_parts() {
        let b = block("motion_gotoxy").expect("gotoxy");
        assert_eq!(
            b.parts,
            vec![
                Part::Text("go to x:".into()),
                Part::Slot(Slot::new("%n")),
                Part::Text(" y:".into()),
                Part::Slot(Slot::new("%n")),
            ]
        );
        let b = block("looks_setsizeto").expect("setsizeto");
        assert_eq!(b.parts.last(), Some(&Part::Text("%".into())));
    }

    #[test]
    fn slot_shapes() {
        let slot = Slot::new("%m.sensing_touchingobjectmenu");
        assert_eq!(slot.shape(), Some(InputShape::ReadonlyMenu));
        assert_eq!(slot.menu(), Some("sensing_touchingobjectmenu"));
        assert_eq!(slot.nonterminal(), "m_sensing_touchingobjectmenu");
        assert_eq!(Slot::new("%s").nonterminal(), "sb");
        assert_eq!(Slot::new("%n").menu(), None);
    }

    #[test]
    fn stop_other_scripts_is_a_stack_block() {
        assert_eq!(stop_other_scripts().shape, Shape::Stack);
        assert_eq!(block("control_stop").map(|b| b.shape), Some(Shape::Cap));
    }
}
