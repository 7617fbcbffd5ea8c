//! Completion items from the core autocomplete controller.
//!
//! Suggestions keep their ranking through `sort_text`. A suggestion with
//! an argument slot to fill becomes a snippet with that slot as its
//! placeholder.

use lsp_types::{
    CompletionItem, CompletionItemKind, CompletionTextEdit, InsertTextFormat, Position, Range,
    TextEdit,
};
use tosh_core::{source_lines, Autocomplete, Category, ModeConfig, Suggestion};

use crate::document::{char_column, utf16_column};

/// Completions at `position`. `explicit` is set when the user asked for
/// completion rather than typing a trigger character.
pub fn compute_completions(
    content: &str,
    position: Position,
    config: &ModeConfig,
    explicit: bool,
) -> Vec<CompletionItem> {
    let Some(line) = source_lines(content).nth(position.line as usize) else {
        return Vec::new();
    };
    let at = tosh_core::Position {
        line: position.line as usize,
        column: char_column(line, position.character),
    };
    Autocomplete::new(config)
        .suggest(content, at, explicit)
        .iter()
        .enumerate()
        .map(|(rank, s)| completion_item(s, rank, line, position.line))
        .collect()
}

fn completion_item(s: &Suggestion, rank: usize, line: &str, line_number: u32) -> CompletionItem {
    let range = Range::new(
        Position::new(line_number, utf16_column(line, s.from)),
        Position::new(line_number, utf16_column(line, s.to)),
    );
    let (new_text, format) = match snippet(s) {
        Some(snippet) => (snippet, InsertTextFormat::SNIPPET),
        None => (s.label.clone(), InsertTextFormat::PLAIN_TEXT),
    };
    CompletionItem {
        label: s.display.clone(),
        kind: Some(item_kind(s.category)),
        detail: s.category.map(|c| c.as_str().to_string()),
        sort_text: Some(format!("{:04}", rank)),
        filter_text: Some(s.display.clone()),
        insert_text_format: Some(format),
        text_edit: Some(CompletionTextEdit::Edit(TextEdit { range, new_text })),
        ..Default::default()
    }
}

/// The label as a snippet, when the cursor should land inside it.
fn snippet(s: &Suggestion) -> Option<String> {
    let selection = s.selection?;
    let chars: Vec<char> = s.label.chars().collect();
    if selection.length == 0 && selection.start >= chars.len() {
        return None;
    }
    let end = (selection.start + selection.length).min(chars.len());
    let text = |range: &[char]| escape_snippet(&range.iter().collect::<String>());
    let before = text(&chars[..selection.start.min(end)]);
    let after = text(&chars[end..]);
    Some(if selection.length == 0 {
        format!("{}$0{}", before, after)
    } else {
        format!("{}${{1:{}}}{}", before, text(&chars[selection.start..end]), after)
    })
}

fn escape_snippet(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '$' | '}' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn item_kind(category: Option<Category>) -> CompletionItemKind {
    match category {
        Some(Category::Variable | Category::List) => CompletionItemKind::VARIABLE,
        Some(Category::Parameter) => CompletionItemKind::VARIABLE,
        Some(Category::Control) => CompletionItemKind::KEYWORD,
        Some(Category::Operators) => CompletionItemKind::OPERATOR,
        Some(Category::Events) => CompletionItemKind::EVENT,
        Some(Category::Custom) => CompletionItemKind::FUNCTION,
        Some(_) => CompletionItemKind::METHOD,
        None => CompletionItemKind::TEXT,
    }
}
