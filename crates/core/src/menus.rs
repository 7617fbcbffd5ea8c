//! Menu inputs: the options each menu offers and the values they store.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::ast::{format_number, Literal};

#[derive(Debug, Clone, Copy)]
pub struct Menu {
    pub name: &'static str,
    pub options: &'static [&'static str],
    /// Accepts any reporter or string in place of an option.
    pub accepts_reporters: bool,
    /// Accepts string literals but not reporters.
    pub accepts_strings: bool,
    /// Has no empty-slot rule, so an empty input stays unambiguous.
    pub must_not_be_empty: bool,
}

impl Menu {
    const fn plain(name: &'static str, options: &'static [&'static str]) -> Self {
        Menu {
            name,
            options,
            accepts_reporters: false,
            accepts_strings: false,
            must_not_be_empty: false,
        }
    }

    const fn reporters(name: &'static str, options: &'static [&'static str]) -> Self {
        Menu {
            accepts_reporters: true,
            ..Menu::plain(name, options)
        }
    }

    const fn strings(name: &'static str, options: &'static [&'static str]) -> Self {
        Menu {
            accepts_strings: true,
            ..Menu::plain(name, options)
        }
    }

    const fn non_empty(name: &'static str, options: &'static [&'static str]) -> Self {
        Menu {
            must_not_be_empty: true,
            ..Menu::plain(name, options)
        }
    }

    /// Whether `value` is literally one of the options. Digit options
    /// (key names) only match numbers.
    pub fn is_option(&self, value: &Literal) -> bool {
        self.options.iter().any(|o| {
            let digit = is_digits(o);
            match value {
                Literal::Text(t) => !digit && t == o,
                Literal::Number(n) => digit && format_number(*n) == *o,
                Literal::Bool(_) => false,
            }
        })
    }
}

pub(crate) fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

const MOUSE_RANDOM: &[&str] = &["mouse-pointer", "random position"];

const KEYS: &[&str] = &[
    "space", "up arrow", "down arrow", "right arrow", "left arrow", "any", "a", "b", "c", "d",
    "e", "f", "g", "h", "i", "j", "k", "l", "m", "n", "o", "p", "q", "r", "s", "t", "u", "v",
    "w", "x", "y", "z", "0", "1", "2", "3", "4", "5", "6", "7", "8", "9",
];

const DRUMS: &[&str] = &[
    "Snare Drum", "Bass Drum", "Side Stick", "Crash Cymbal", "Open Hi-Hat", "Closed Hi-Hat",
    "Tambourine", "Hand Clap", "Claves", "Wood Block", "Cowbell", "Triangle", "Bongo", "Conga",
    "Cabasa", "Guiro", "Vibraslap", "Cuica",
];

const INSTRUMENTS: &[&str] = &[
    "Piano", "Electric Piano", "Organ", "Guitar", "Electric Guitar", "Bass", "Pizzicato", "Cello",
    "Trombone", "Clarinet", "Saxophone", "Flute", "Wooden Flute", "Bassoon", "Choir",
    "Vibraphone", "Music Box", "Steel Drum", "Marimba", "Synth Lead", "Synth Pad",
];

// Language names containing parentheses are renamed so they tokenize.
const TTS_LANGUAGES: &[&str] = &[
    "Arabic", "Brazilian Portuguese", "Danish", "Dutch", "English", "French", "German", "Hindi",
    "Icelandic", "Italian", "Japanese", "Korean", "Latin American Spanish", "Mandarin",
    "Norwegian", "Polish", "Portuguese", "Romanian", "Russian", "Spanish", "Swedish", "Turkish",
    "Welsh",
];

const TRANSLATE_LANGUAGES: &[&str] = &[
    "Amharic", "Arabic", "Azerbaijani", "Basque", "Bulgarian", "Catalan", "Croatian", "Czech",
    "Danish", "Dutch", "English", "Estonian", "Finnish", "French", "Galician", "German", "Greek",
    "Hebrew", "Hungarian", "Icelandic", "Indonesian", "Irish Gaelic", "Italian", "Japanese",
    "Korean", "Latvian", "Lithuanian", "Maori", "Norwegian", "Persian", "Polish", "Portuguese",
    "Romanian", "Russian", "Scots Gaelic", "Serbian", "Simplified Chinese", "Slovak", "Slovenian",
    "Sorani Kurdish", "Spanish", "Swedish", "Thai", "Traditional Chinese", "Turkish", "Ukrainian",
    "Vietnamese", "Welsh", "Zulu",
];

#[rustfmt::skip]
pub const MENUS: &[Menu] = &[
    Menu::reporters("motion_goto_menu", MOUSE_RANDOM),
    Menu::reporters("motion_glideto_menu", MOUSE_RANDOM),
    Menu::reporters("motion_pointtowards_menu", &["mouse-pointer"]),
    Menu::reporters("looks_costume", &[]),
    Menu::reporters("looks_backdrops", &["next backdrop", "previous backdrop", "random backdrop"]),
    Menu::reporters("sound_sounds_menu", &[]),
    Menu::reporters("event_broadcast_menu", &[]),
    Menu::reporters("control_create_clone_of_menu", &["myself"]),
    Menu::reporters("sensing_touchingobjectmenu", &["mouse-pointer", "edge"]),
    Menu::reporters("sensing_distancetomenu", &["mouse-pointer"]),
    Menu::reporters("sensing_keyoptions", KEYS),
    Menu::reporters("sensing_of_object_menu", &["Stage"]),
    Menu::reporters("pen_menu_colorParam", &["hue", "saturation", "brightness", "transparency"]),
    Menu::reporters("music_menu_DRUM", DRUMS),
    Menu::reporters("music_menu_INSTRUMENT", INSTRUMENTS),
    Menu::reporters("videoSensing_menu_ATTRIBUTE", &["motion", "direction"]),
    Menu::reporters("videoSensing_menu_SUBJECT", &["sprite", "stage"]),
    Menu::reporters("videoSensing_menu_VIDEO_STATE", &["off", "on", "on flipped"]),
    Menu::reporters("tts_menu_voices", &["alto", "tenor", "squeak", "giant", "kitten"]),
    Menu::reporters("tts_menu_languages", TTS_LANGUAGES),
    Menu::reporters("translate_menu_languages", TRANSLATE_LANGUAGES),

    Menu::strings("attribute", &[
        "x position", "y position", "direction", "costume #", "costume name", "backdrop #",
        "backdrop name", "size", "volume",
    ]),
    Menu::strings("backdrop", &[]),
    Menu::strings("broadcast", &[]),
    Menu::plain("dragMode", &["draggable", "not draggable"]),
    Menu::plain("effect", &["color", "fisheye", "whirl", "pixelate", "mosaic", "brightness", "ghost"]),
    Menu::plain("forwardBackward", &["forward", "backward"]),
    Menu::plain("frontBack", &["front", "back"]),
    Menu::plain("key", KEYS),
    Menu::plain("list", &[]),
    Menu::non_empty("listNonempty", &[]),
    Menu::non_empty("mathOp", &[
        "abs", "floor", "ceiling", "sqrt", "sin", "cos", "tan", "asin", "acos", "atan", "ln",
        "log", "e ^", "10 ^",
    ]),
    Menu::plain("numberName", &["number", "name"]),
    Menu::plain("rotationStyle", &["left-right", "don't rotate", "all around"]),
    // "pan left/right" in the editor; `/` is an operator here
    Menu::non_empty("soundEffect", &["pitch", "pan"]),
    Menu::plain("stop", &["all", "this script", "other scripts in sprite"]),
    Menu::plain("timeAndDate", &["year", "month", "date", "day of week", "hour", "minute", "second"]),
    Menu::plain("triggerSensor", &["loudness", "timer"]),
    Menu::plain("var", &[]),
];

static BY_NAME: Lazy<HashMap<&'static str, &'static Menu>> =
    Lazy::new(|| MENUS.iter().map(|m| (m.name, m)).collect());

pub fn menu(name: &str) -> Option<&'static Menu> {
    BY_NAME.get(name).copied()
}

/// Stored value for option labels that differ from what is displayed.
#[rustfmt::skip]
const RENAMED: &[(&str, &str)] = &[
    ("mouse-pointer", "_mouse_"), ("myself", "_myself_"), ("Stage", "_stage_"),
    ("edge", "_edge_"), ("random position", "_random_"), ("hue", "color"),
    ("sprite", "this sprite"), ("stage", "Stage"), ("on flipped", "on-flipped"),
    ("Amharic", "am"), ("Arabic", "ar"), ("Azerbaijani", "az"), ("Basque", "eu"),
    ("Brazilian Portuguese", "pt-br"), ("Bulgarian", "bg"), ("Catalan", "ca"),
    ("Croatian", "hr"), ("Czech", "cs"), ("Danish", "da"), ("Dutch", "nl"), ("English", "en"),
    ("Estonian", "et"), ("Finnish", "fi"), ("French", "fr"), ("Galician", "gl"),
    ("German", "de"), ("Greek", "el"), ("Hebrew", "he"), ("Hindi", "hi"), ("Hungarian", "hu"),
    ("Icelandic", "is"), ("Indonesian", "id"), ("Irish Gaelic", "ga"), ("Italian", "it"),
    ("Japanese", "ja"), ("Korean", "ko"), ("Latin American Spanish", "es-419"),
    ("Latvian", "lv"), ("Lithuanian", "lt"), ("Mandarin", "zh-cn"), ("Maori", "mi"),
    ("Norwegian", "nb"), ("Persian", "fa"), ("Polish", "pl"), ("Portuguese", "pt"),
    ("Romanian", "ro"), ("Russian", "ru"), ("Scots Gaelic", "gd"), ("Serbian", "sr"),
    ("Simplified Chinese", "zh-cn"), ("Slovak", "sk"), ("Slovenian", "sl"),
    ("Sorani Kurdish", "ckb"), ("Spanish", "es"), ("Swedish", "sv"), ("Thai", "th"),
    ("Traditional Chinese", "zh-tw"), ("Turkish", "tr"), ("Ukrainian", "uk"),
    ("Vietnamese", "vi"), ("Welsh", "cy"), ("Zulu", "zu"),
];

/// Menus whose stored values are the upper-cased label without spaces.
const UPPERCASE_MENUS: &[&str] = &["effect", "soundEffect", "timeAndDate", "triggerSensor", "tts_menu_voices"];

/// Menus whose stored values are 1-based option indexes.
const INDEXED_MENUS: &[&str] = &["music_menu_DRUM", "music_menu_INSTRUMENT"];

static VALUES: Lazy<HashMap<&'static str, Literal>> = Lazy::new(|| {
    let mut values: HashMap<&'static str, Literal> = RENAMED
        .iter()
        .map(|&(label, value)| (label, Literal::text(value)))
        .collect();
    for name in UPPERCASE_MENUS {
        if let Some(m) = menu(name) {
            for label in m.options {
                let value: String = label
                    .to_uppercase()
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .collect();
                values.insert(*label, Literal::Text(value));
            }
        }
    }
    for name in INDEXED_MENUS {
        if let Some(m) = menu(name) {
            for (index, label) in m.options.iter().enumerate() {
                values.insert(*label, Literal::Number((index + 1) as f64));
            }
        }
    }
    values
});

/// The value stored for `option` when it differs from the label.
///
/// The pen's `brightness` parameter is stored as-is even though the
/// graphic effect of the same name is not.
pub fn option_value(menu: &str, option: &str) -> Option<Literal> {
    if menu == "pen_menu_colorParam" && option == "brightness" {
        return None;
    }
    VALUES.get(option).cloned()
}

static LABELS: Lazy<HashMap<&'static str, HashMap<String, &'static str>>> = Lazy::new(|| {
    MENUS
        .iter()
        .map(|m| {
            let labels = m
                .options
                .iter()
                .filter_map(|option| {
                    option_value(m.name, option).map(|value| (value.to_text(), *option))
                })
                .collect();
            (m.name, labels)
        })
        .collect()
});

/// Display label for a stored menu value, when the two differ.
pub fn option_label(menu: &str, value: &Literal) -> Option<&'static str> {
    LABELS.get(menu)?.get(&value.to_text()).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menus_are_unique() {
        let mut names: Vec<_> = MENUS.iter().map(|m| m.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), MENUS.len());
    }

    #[test]
    fn values_map_labels() {
        assert_eq!(
            option_value("motion_goto_menu", "mouse-pointer"),
            Some(Literal::text("_mouse_"))
        );
        assert_eq!(
            option_value("timeAndDate", "day of week"),
            Some(Literal::text("DAYOFWEEK"))
        );
        assert_eq!(
            option_value("music_menu_DRUM", "Bass Drum"),
            Some(Literal::Number(2.0))
        );
        assert_eq!(option_value("effect", "brightness"), Some(Literal::text("BRIGHTNESS")));
        assert_eq!(option_value("pen_menu_colorParam", "brightness"), None);
        assert_eq!(option_value("stop", "all"), None);
    }

    #[test]
    fn labels_invert_values() {
        assert_eq!(
            option_label("pen_menu_colorParam", &Literal::text("color")),
            Some("hue")
        );
        assert_eq!(
            option_label("music_menu_INSTRUMENT", &Literal::Number(1.0)),
            Some("Piano")
        );
        assert_eq!(
            option_label("music_menu_INSTRUMENT", &Literal::text("1")),
            Some("Piano")
        );
        assert_eq!(option_label("effect", &Literal::text("color")), None);
    }

    #[test]
    fn digit_options_match_numbers_only() {
        let keys = menu("sensing_keyoptions").expect("menu");
        assert!(keys.is_option(&Literal::Number(5.0)));
        assert!(!keys.is_option(&Literal::text("5")));
        assert!(keys.is_option(&Literal::text("space")));
    }
}
