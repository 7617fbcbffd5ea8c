//! Document state management for open files in the editor.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tosh_core::ModeConfig;

/// Name of the vocabulary file looked up next to documents.
pub const CONFIG_FILE: &str = "tosh.toml";

/// Tracks which documents are currently open in the editor.
#[derive(Default)]
pub struct DocumentState {
    documents: HashMap<String, DocumentInfo>,
}

/// Information about a single open document.
pub struct DocumentInfo {
    /// File system path for this document.
    pub path: PathBuf,
    /// Editor-reported version number.
    pub version: i32,
    pub content: String,
}

impl DocumentInfo {
    /// The vocabulary for this document: the nearest `tosh.toml`, plus the
    /// custom blocks the document defines itself.
    pub fn mode_config(&self) -> ModeConfig {
        mode_config_for(&self.path, &self.content)
    }
}

impl DocumentState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a newly opened document.
    pub fn open(&mut self, uri: &str, path: PathBuf, version: i32, content: String) {
        self.documents.insert(
            uri.to_owned(),
            DocumentInfo {
                path,
                version,
                content,
            },
        );
    }

    /// Update content for an already-open document.
    pub fn change(&mut self, uri: &str, version: i32, content: String) {
        if let Some(doc) = self.documents.get_mut(uri) {
            doc.version = version;
            doc.content = content;
        }
    }

    /// Remove a closed document from tracking.
    pub fn close(&mut self, uri: &str) {
        self.documents.remove(uri);
    }

    pub fn get(&self, uri: &str) -> Option<&DocumentInfo> {
        self.documents.get(uri)
    }
}

/// The nearest `tosh.toml` in the directory of `path` or any ancestor.
pub fn find_config(path: &Path) -> Option<PathBuf> {
    path.ancestors()
        .skip(1)
        .map(|dir| dir.join(CONFIG_FILE))
        .find(|candidate| candidate.is_file())
}

/// Vocabulary for a document at `path`. An unreadable `tosh.toml` is
/// logged and ignored.
pub fn mode_config_for(path: &Path, content: &str) -> ModeConfig {
    let base = match find_config(path) {
        Some(file) => ModeConfig::load(&file).unwrap_or_else(|err| {
            tracing::warn!(file = %file.display(), %err, "ignoring config");
            ModeConfig::default()
        }),
        None => ModeConfig::default(),
    };
    base.with_definitions_from(content)
}

// ── Columns ──────────────────────────────────────────────────────────
//
// LSP columns count UTF-16 code units; the core counts characters.

/// UTF-16 column of character `column` in `line`.
pub fn utf16_column(line: &str, column: usize) -> u32 {
    line.chars().take(column).map(char::len_utf16).sum::<usize>() as u32
}

/// Character column of UTF-16 column `column` in `line`.
pub fn char_column(line: &str, column: u32) -> usize {
    let mut units = 0;
    for (i, c) in line.chars().enumerate() {
        if units >= column as usize {
            return i;
        }
        units += c.len_utf16();
    }
    line.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_convert_both_ways() {
        let line = "say \"𝄞\" x";
        assert_eq!(utf16_column(line, 6), 7);
        assert_eq!(char_column(line, 7), 6);
        assert_eq!(char_column(line, 99), line.chars().count());
    }

    #[test]
    fn config_is_found_in_ancestors() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("sprites");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "variables = [\"score\"]\n").unwrap();

        let doc = nested.join("cat.tosh");
        assert_eq!(find_config(&doc), Some(dir.path().join(CONFIG_FILE)));
        let config = mode_config_for(&doc, "define hop\n");
        assert_eq!(config.variables, vec!["score"]);
        assert_eq!(config.definitions.len(), 1);
    }
}
