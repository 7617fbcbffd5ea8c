//! Vocabulary for one editing context: variable and list names plus the
//! custom blocks defined so far.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::action::{Eval, Value};
use crate::ast::Definition;
use crate::earley::Parser;
use crate::error::ConfigError;
use crate::language::{clean_name, define_grammar, is_definition_line, NameKind};
use crate::lexer::{source_lines, tokenize};
use crate::target::{Target, VariableKind};

/// Names the grammar is extended with.
///
/// Loads from TOML, where `definitions` are written as `define` lines:
///
/// ```toml
/// variables = ["score", "lives"]
/// lists = ["inventory"]
/// definitions = ["define jump (height)"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "RawModeConfig")]
pub struct ModeConfig {
    pub variables: Vec<String>,
    pub lists: Vec<String>,
    pub definitions: Vec<Definition>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawModeConfig {
    #[serde(default)]
    variables: Vec<String>,
    #[serde(default)]
    lists: Vec<String>,
    #[serde(default)]
    definitions: Vec<String>,
}

impl TryFrom<RawModeConfig> for ModeConfig {
    type Error = ConfigError;

    fn try_from(raw: RawModeConfig) -> Result<Self, Self::Error> {
        let definitions = raw
            .definitions
            .iter()
            .map(|line| parse_definition(line))
            .collect::<Result<_, _>>()?;
        Ok(ModeConfig {
            variables: raw.variables,
            lists: raw.lists,
            definitions,
        })
    }
}

impl ModeConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Variables and lists visible from `target`: its own, then the
    /// stage's. Names are rewritten where they would not tokenize or would
    /// collide with block text.
    pub fn for_target(target: &Target, stage: Option<&Target>) -> Self {
        let stage = stage.filter(|_| !target.is_stage);
        let mut config = ModeConfig::default();
        for (kind, name_kind) in [
            (VariableKind::Scalar, NameKind::Variable),
            (VariableKind::List, NameKind::List),
        ] {
            let mut seen = HashSet::new();
            let mut stage_seen = HashSet::new();
            let mut names = Vec::new();
            for name in target.variables.names(kind) {
                let clean = clean_name(name_kind, name, &seen, &stage_seen);
                note_rename(name, &clean);
                seen.insert(clean.clone());
                names.push(clean);
            }
            if let Some(stage) = stage {
                for name in stage.variables.names(kind) {
                    let clean = clean_name(name_kind, name, &stage_seen, &seen);
                    note_rename(name, &clean);
                    stage_seen.insert(clean.clone());
                    names.push(clean);
                }
            }
            match kind {
                VariableKind::List => config.lists = names,
                _ => config.variables = names,
            }
        }
        config
    }

    /// Add every well-formed `define` line of `code` as a custom block.
    /// Lines that do not parse, parse more than one way, or repeat a spec
    /// already known are skipped.
    pub fn scan_definitions(&mut self, code: &str) {
        for line in source_lines(code).filter(|l| is_definition_line(l)) {
            match parse_definition(line) {
                Ok(definition) if self.definitions.iter().any(|d| d.spec == definition.spec) => {
                    tracing::debug!(spec = %definition.spec, "already defined");
                }
                Ok(definition) => self.definitions.push(definition),
                Err(err) => tracing::debug!(%err, "skipping define line"),
            }
        }
    }

    pub fn with_definitions_from(mut self, code: &str) -> Self {
        self.scan_definitions(code);
        self
    }
}

fn note_rename(name: &str, clean: &str) {
    if name != clean {
        tracing::debug!(name, clean, "renamed for tosh");
    }
}

/// Parse a single `define` / `define-atomic` line.
pub fn parse_definition(line: &str) -> Result<Definition, ConfigError> {
    let invalid = |message: String| ConfigError::Definition {
        line: line.to_owned(),
        message,
    };
    let tokens = tokenize(line);
    let trees = Parser::new(define_grammar())
        .parse_from("line", &tokens)
        .map_err(|err| invalid(err.to_string()))?;
    if trees.len() > 1 {
        return Err(invalid(format!("ambiguous: {} possible parses", trees.len())));
    }
    let mut eval = Eval::new(&tokens);
    match trees[0].process(&mut eval) {
        Value::Definition(definition) => Ok(definition),
        _ => Err(invalid("not a definition".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Literal;

    #[test]
    fn loads_from_toml() {
        let config = ModeConfig::from_toml_str(
            r#"
variables = ["score", "lives"]
lists = ["inventory"]
definitions = ["define jump (height)", "define-atomic reset <fast>"]
"#,
        )
        .expect("config");
        assert_eq!(config.variables, vec!["score", "lives"]);
        assert_eq!(config.lists, vec!["inventory"]);
        assert_eq!(config.definitions.len(), 2);
        assert_eq!(config.definitions[0].spec, "jump %s");
        assert!(config.definitions[1].atomic);
        assert_eq!(config.definitions[1].defaults, vec![Literal::Bool(false)]);
    }

    #[test]
    fn missing_tables_default_to_empty() {
        assert_eq!(ModeConfig::from_toml_str("").expect("config"), ModeConfig::default());
    }

    #[test]
    fn bad_definitions_are_rejected() {
        let err = ModeConfig::from_toml_str(r#"definitions = ["define"]"#).expect_err("fails");
        assert!(err.to_string().contains("define"), "{}", err);
        assert!(ModeConfig::from_toml_str("colours = []").is_err());
    }

    #[test]
    fn scans_definitions_from_code() {
        let config = ModeConfig::default().with_definitions_from(
            "define jump (height)\nchange y by height\n\n  define-atomic spin\nsay \"define me\"\ndefine",
        );
        let specs: Vec<_> = config.definitions.iter().map(|d| d.spec.as_str()).collect();
        assert_eq!(specs, vec!["jump %s", "spin"]);

        let again = config.with_definitions_from("define jump (distance)");
        assert_eq!(again.definitions.len(), 2);
    }

    #[test]
    fn target_vocabulary_includes_the_stage() {
        let mut sprite = Target::sprite("Cat");
        sprite.variables.create("speed", VariableKind::Scalar);
        sprite.variables.create("bag", VariableKind::List);
        let mut stage = Target::stage();
        stage.variables.create("level", VariableKind::Scalar);
        stage.variables.create("go", VariableKind::Broadcast);

        let config = ModeConfig::for_target(&sprite, Some(&stage));
        assert_eq!(config.variables, vec!["speed", "level"]);
        assert_eq!(config.lists, vec!["bag"]);

        let config = ModeConfig::for_target(&stage, Some(&stage));
        assert_eq!(config.variables, vec!["level"]);
    }

    #[test]
    fn target_names_are_cleaned() {
        let mut sprite = Target::sprite("Cat");
        sprite.variables.create("x position", VariableKind::Scalar);
        let config = ModeConfig::for_target(&sprite, None);
        assert_eq!(config.variables, vec!["x position var"]);
    }
}
