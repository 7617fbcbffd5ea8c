//! End-to-end properties of the tosh pipeline: text to blocks and back.

use std::path::{Path, PathBuf};

use tosh_core::grammar::{Grammar, Symbol, SymbolSpec};
use tosh_core::language::build_grammar;
use tosh_core::menus;
use tosh_core::lines::{parse_tokens, Line};
use tosh_core::target::{ScratchBlock, VariableTable};
use tosh_core::{
    compile, generate, parse_lines, tokenize, Autocomplete, CompileError, ModeConfig, Position,
    Target, VariableKind,
};

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn compile_text(code: &str, config: &ModeConfig) -> Result<Target, CompileError> {
    let mut target = Target::sprite("Sprite1");
    let mut stage = VariableTable::default();
    compile(&mut target, Some(&mut stage), &parse_lines(code, config).lines)?;
    Ok(target)
}

fn canonical(code: &str, config: &ModeConfig) -> String {
    let target = compile_text(code, config).unwrap_or_else(|e| panic!("compile failed: {}", e));
    generate(&target.blocks).unwrap()
}

fn blocks_with<'a>(target: &'a Target, opcode: &str) -> Vec<&'a ScratchBlock> {
    target.blocks.iter().filter(|b| b.opcode == opcode).collect()
}

// ── Round trips ──────────────────────────────────────────────────────

#[test]
fn fixtures_are_stable_after_one_normalization() {
    let config = ModeConfig::load(fixtures().join("tosh.toml")).unwrap();
    let mut tested = 0;
    let mut paths: Vec<_> = std::fs::read_dir(fixtures())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().map_or(false, |e| e == "tosh"))
        .collect();
    paths.sort();
    for path in paths {
        let code = std::fs::read_to_string(&path).unwrap();
        let once = canonical(&code, &config);
        let twice = canonical(&once, &config);
        assert_eq!(once, twice, "{} is not stable", path.display());
        assert!(once.ends_with('\n') && !once.ends_with("\n\n"));
        tested += 1;
    }
    assert!(tested >= 2, "expected fixtures in {}", fixtures().display());
}

#[test]
fn precedence_survives_generation() {
    let config = ModeConfig::default();
    assert_eq!(canonical("say (1 + 2 * 3)", &config), "say 1 + 2 * 3\n");
    assert_eq!(canonical("say ((1 + 2) * 3)", &config), "say (1 + 2) * 3\n");
}

#[test]
fn exponent_numbers_survive_generation() {
    let config = ModeConfig::default();
    for (code, expected) in [
        ("move 1e21 steps", "move 1e21 steps\n"),
        ("move 2.5e22 steps", "move 2.5e22 steps\n"),
        ("move 0.0000001 steps", "move 1e-7 steps\n"),
    ] {
        let once = canonical(code, &config);
        assert_eq!(once, expected);
        assert_eq!(canonical(&once, &config), once);
    }
}

#[test]
fn crlf_sources_compile_like_lf_sources() {
    let config = ModeConfig::default();
    let crlf = "when flag clicked\r\nrepeat 10\r\n  move 10 steps\r\nend\r\n";
    let lf = crlf.replace("\r\n", "\n");
    assert!(parse_lines(crlf, &config).lines.iter().all(|l| !matches!(l, Line::Error { .. })));
    assert_eq!(canonical(crlf, &config), canonical(&lf, &config));
    assert_eq!(canonical(crlf, &config), "when flag clicked\nrepeat 10\n  move 10 steps\nend\n");
}

#[test]
fn tokens_reconstruct_their_line() {
    let lines = [
        "  move 10 steps",
        "say \"a \\\"quoted\\\" word\" for 2 seconds",
        "if <(x position) > 10> then // far right",
        "set pen color to #f0a",
        "go to x: -1.5e3 y: .5",
        "when flag clicked\t",
        "say ☁ banana",
        "move (+ steps",
    ];
    for line in lines {
        let text: String = tokenize(line).iter().map(|t| t.text.as_str()).collect();
        assert_eq!(text, line);
    }
}

// ── Structure ────────────────────────────────────────────────────────

#[test]
fn repeat_nests_its_body() {
    let config = ModeConfig::default();
    let target = compile_text("repeat 10\n  move 10 steps\nend\n", &config).unwrap();
    let repeat = blocks_with(&target, "control_repeat");
    let moves = blocks_with(&target, "motion_movesteps");
    assert_eq!(repeat.len(), 1);
    assert_eq!(moves.len(), 1);
    let body = repeat[0].input("SUBSTACK").unwrap();
    assert_eq!(body.block.as_deref(), Some(moves[0].id.as_str()));

    let err = compile_text("repeat 10\n  move 10 steps\n", &config).unwrap_err();
    assert_eq!(err.line, 3);
}

#[test]
fn known_variables_are_reused() {
    let config = ModeConfig {
        variables: vec!["myVar".into()],
        ..ModeConfig::default()
    };
    let mut target = Target::sprite("Sprite1");
    let id = target.variables.create("myVar", VariableKind::Scalar);
    compile(&mut target, None, &parse_lines("set myVar to 5", &config).lines).unwrap();

    let set = blocks_with(&target, "data_setvariableto");
    let field = set[0].field("VARIABLE").unwrap();
    assert_eq!(field.id.as_deref(), Some(id.as_str()));
    assert_eq!(target.variables.iter().count(), 1);
}

#[test]
fn stage_variables_resolve_from_sprites() {
    let config = ModeConfig {
        variables: vec!["level".into()],
        ..ModeConfig::default()
    };
    let mut stage = Target::stage();
    let id = stage.variables.create("level", VariableKind::Scalar);
    let mut sprite = Target::sprite("Cat");
    compile(
        &mut sprite,
        Some(&mut stage.variables),
        &parse_lines("change level by 1", &config).lines,
    )
    .unwrap();
    let change = blocks_with(&sprite, "data_changevariableby");
    assert_eq!(change[0].field("VARIABLE").unwrap().id.as_deref(), Some(id.as_str()));
    assert_eq!(sprite.variables.iter().count(), 0);
}

// ── Editing ──────────────────────────────────────────────────────────

#[test]
fn end_is_suggested_only_on_the_next_line() {
    let complete = Autocomplete::new(&ModeConfig::default());
    let labels = |text: &str, line, column| -> Vec<String> {
        complete
            .suggest(text, Position { line, column }, false)
            .into_iter()
            .map(|s| s.label)
            .collect()
    };
    assert!(!labels("repeat 5", 0, 8).contains(&"end".to_owned()));
    assert!(labels("repeat 5\n", 1, 0).contains(&"end".to_owned()));
}

// ── Catalog ──────────────────────────────────────────────────────────

const SAMPLE_VARIABLE: &str = "foo";
const SAMPLE_LIST: &str = "bar";

/// Text for a menu slot: its first option, or a string where the menu takes
/// one, or `_` where it may be left empty.
fn sample_menu(name: &str) -> Option<String> {
    match name {
        "var" => return Some(SAMPLE_VARIABLE.to_owned()),
        "list" | "listNonempty" => return Some(SAMPLE_LIST.to_owned()),
        _ => {}
    }
    let menu = menus::menu(name)?;
    if let Some(option) = menu.options.first() {
        Some((*option).to_owned())
    } else if menu.accepts_reporters || menu.accepts_strings {
        Some("\"a\"".to_owned())
    } else if !menu.must_not_be_empty {
        Some("_".to_owned())
    } else {
        None
    }
}

/// A block rule rendered with a default for each slot, or `None` when a
/// slot has no single obvious default.
fn sample_line(grammar: &Grammar, symbols: &[Symbol]) -> Option<String> {
    let mut words = Vec::new();
    for symbol in symbols {
        let word = match symbol {
            Symbol::Terminal(SymbolSpec {
                value: Some(value), ..
            }) => value.clone(),
            Symbol::Terminal(_) => return None,
            Symbol::NonTerminal(name) => match name.as_str() {
                "n" => "1".to_owned(),
                "sb" => "\"a\"".to_owned(),
                "b" => "<>".to_owned(),
                "c" => "#f00".to_owned(),
                "VariableName" => SAMPLE_VARIABLE.to_owned(),
                "ListName" => SAMPLE_LIST.to_owned(),
                icon if icon.starts_with('@') => {
                    sample_line(grammar, &grammar.first_rule(icon)?.symbols)?
                }
                other => sample_menu(other.strip_prefix("m_")?)?,
            },
        };
        words.push(word);
    }
    Some(words.join(" "))
}

#[test]
fn every_block_parses_back_to_itself() {
    let config = ModeConfig {
        variables: vec![SAMPLE_VARIABLE.into()],
        lists: vec![SAMPLE_LIST.into()],
        ..ModeConfig::default()
    };
    let grammar = build_grammar(&config);
    let mut checked = 0;
    let mut skipped = Vec::new();
    let mut failures = Vec::new();
    for name in ["block", "simple-reporter", "simple-predicate"] {
        for rule in grammar.rules_for(name) {
            let Some(selector) = rule.info().and_then(|info| info.selector()) else {
                continue;
            };
            let Some(text) = sample_line(&grammar, &rule.symbols) else {
                // parameter reporters only parse inside a definition
                if !selector.starts_with("argument_reporter") {
                    skipped.push(selector);
                }
                continue;
            };
            let parsed = parse_tokens(&grammar, tokenize(&text));
            match &parsed.line {
                Line::Block(block) if block.selector() == Some(selector) && parsed.ambiguity.is_none() => {}
                other => failures.push(format!("{:?} ({}) -> {:?}", text, selector, other)),
            }
            checked += 1;
        }
    }
    assert!(checked > 80, "only {} blocks checked", checked);
    assert!(skipped.is_empty(), "no sample for: {:?}", skipped);
    assert!(failures.is_empty(), "collisions:\n{}", failures.join("\n"));
}
