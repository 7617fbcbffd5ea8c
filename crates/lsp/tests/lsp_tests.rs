//! Tests for LSP diagnostics, completion, and semantic tokens.
//!
//! These tests write `.tosh` documents (and sometimes a `tosh.toml`) into a
//! temporary directory and call the feature functions directly (not via
//! LSP protocol).

use lsp_types::{CompletionTextEdit, DiagnosticSeverity, InsertTextFormat, Position};
use tempfile::TempDir;
use tosh_core::ModeConfig;
use tosh_lsp::document::{mode_config_for, CONFIG_FILE};

fn project(config: &str) -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    std::fs::write(dir.path().join(CONFIG_FILE), config).expect("write config");
    dir
}

// ──────────────────────────────────────────────
// Diagnostics
// ──────────────────────────────────────────────

#[test]
fn clean_script_has_no_diagnostics() {
    let source = "when flag clicked\nforever\nturn right 15 degrees\nend\n";
    let diags = tosh_lsp::diagnostics::compute_diagnostics(source, &ModeConfig::default());
    assert!(diags.is_empty(), "unexpected diagnostics: {:?}", diags);
}

#[test]
fn missing_end_is_an_error_at_the_end_of_input() {
    let source = "when flag clicked\nrepeat 10\nmove 10 steps\n";
    let diags = tosh_lsp::diagnostics::compute_diagnostics(source, &ModeConfig::default());
    let error = diags
        .iter()
        .find(|d| d.severity == Some(DiagnosticSeverity::ERROR))
        .expect("an error");
    assert_eq!(error.source.as_deref(), Some("tosh"));
    assert_eq!(error.message, "Expected \"end\"");
    assert_eq!(error.range.start.line, 3);
}

#[test]
fn unparseable_line_is_reported_where_it_is() {
    let source = "when flag clicked\nmove 10 steps\nflibbertigibbet\n";
    let diags = tosh_lsp::diagnostics::compute_diagnostics(source, &ModeConfig::default());
    let error = diags
        .iter()
        .find(|d| d.severity == Some(DiagnosticSeverity::ERROR))
        .expect("an error");
    assert_eq!(error.range.start.line, 2);
}

#[test]
fn project_variables_come_from_tosh_toml() {
    let dir = project("variables = [\"score\"]\n");
    let doc = dir.path().join("cat.tosh");
    let source = "when flag clicked\nset score to 0\nchange score by 1\n";
    let config = mode_config_for(&doc, source);
    let diags = tosh_lsp::diagnostics::compute_diagnostics(source, &config);
    assert!(diags.is_empty(), "unexpected diagnostics: {:?}", diags);
}

// ──────────────────────────────────────────────
// Completion
// ──────────────────────────────────────────────

#[test]
fn completion_replaces_the_partial_word() {
    let source = "when flag clicked\nmo";
    let items = tosh_lsp::completion::compute_completions(
        source,
        Position::new(1, 2),
        &ModeConfig::default(),
        true,
    );
    let item = items
        .iter()
        .find(|i| i.label == "move _ steps")
        .expect("move completion");
    assert_eq!(item.insert_text_format, Some(InsertTextFormat::SNIPPET));
    match &item.text_edit {
        Some(CompletionTextEdit::Edit(edit)) => {
            assert_eq!(edit.range.start, Position::new(1, 0));
            assert_eq!(edit.range.end, Position::new(1, 2));
            assert_eq!(edit.new_text, "move ${1:_} steps");
        }
        other => panic!("expected a text edit, got {:?}", other),
    }
}

#[test]
fn completion_keeps_ranking_order() {
    let source = "when flag clicked\nmo";
    let items = tosh_lsp::completion::compute_completions(
        source,
        Position::new(1, 2),
        &ModeConfig::default(),
        true,
    );
    assert!(items.len() > 1);
    let sort_texts: Vec<&str> = items
        .iter()
        .filter_map(|i| i.sort_text.as_deref())
        .collect();
    let mut sorted = sort_texts.clone();
    sorted.sort();
    assert_eq!(sort_texts, sorted);
}

#[test]
fn completion_offers_custom_blocks_from_the_document() {
    let source = "define hop (height)\nchange y by (height)\n\nwhen flag clicked\nho";
    let dir = project("");
    let config = mode_config_for(&dir.path().join("frog.tosh"), source);
    let items =
        tosh_lsp::completion::compute_completions(source, Position::new(4, 2), &config, true);
    assert!(
        items.iter().any(|i| i.label.starts_with("hop")),
        "labels: {:?}",
        items.iter().map(|i| &i.label).collect::<Vec<_>>()
    );
}

#[test]
fn completion_past_the_document_is_empty() {
    let items = tosh_lsp::completion::compute_completions(
        "show\n",
        Position::new(9, 0),
        &ModeConfig::default(),
        true,
    );
    assert!(items.is_empty());
}

// ──────────────────────────────────────────────
// Semantic tokens
// ──────────────────────────────────────────────

#[test]
fn semantic_tokens_cover_each_word() {
    let tokens = tosh_lsp::semantic_tokens::compute_semantic_tokens(
        "when flag clicked\nsay \"hello\"\n",
        &ModeConfig::default(),
    );
    // when, flag, clicked, say, "hello"
    assert_eq!(tokens.len(), 5);
    assert_eq!(tokens[3].delta_line, 1);
    assert_eq!(tokens[4].length, 7);
}

#[test]
fn semantic_tokens_measure_utf16() {
    let tokens = tosh_lsp::semantic_tokens::compute_semantic_tokens(
        "say \"𝄞\"",
        &ModeConfig::default(),
    );
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[1].delta_start, 4);
    assert_eq!(tokens[1].length, 4);
}
