//! Compile-to-diagnostic conversion.
//!
//! Compiles the whole document into a scratch target. The compiler stops
//! at the first structural error, so at most one ERROR is reported;
//! ambiguous lines add a WARNING each.

use lsp_types::{Diagnostic, DiagnosticSeverity, Position, Range};
use tosh_core::target::VariableTable;
use tosh_core::{compile, parse_lines, ModeConfig, Target};

/// Diagnostics for `content`, compiled with `config`.
pub fn compute_diagnostics(content: &str, config: &ModeConfig) -> Vec<Diagnostic> {
    let parsed = parse_lines(content, config);
    let mut diagnostics: Vec<Diagnostic> = parsed
        .warnings
        .iter()
        .map(|w| line_diagnostic(w.line, DiagnosticSeverity::WARNING, w.message.clone()))
        .collect();

    let mut target = Target::sprite("Sprite1");
    let mut stage = VariableTable::default();
    if let Err(err) = compile(&mut target, Some(&mut stage), &parsed.lines) {
        diagnostics.push(line_diagnostic(err.line, DiagnosticSeverity::ERROR, err.message));
    }
    diagnostics
}

/// A diagnostic covering 1-based `line`.
fn line_diagnostic(line: usize, severity: DiagnosticSeverity, message: String) -> Diagnostic {
    let line = line.saturating_sub(1) as u32;
    Diagnostic {
        range: Range::new(Position::new(line, 0), Position::new(line, u32::MAX)),
        severity: Some(severity),
        source: Some("tosh".to_string()),
        message,
        ..Default::default()
    }
}
