use std::path::Path;
use std::process;

use tosh_core::target::VariableTable;
use tosh_core::{parse_lines, CompileError, ModeConfig, Target};

use crate::project::Project;
use crate::{load_config, read_file, OutputFormat};

pub(crate) fn cmd_compile(
    file: &Path,
    config: Option<&Path>,
    stage: bool,
    output: OutputFormat,
    quiet: bool,
) {
    let source = read_file(file, output, quiet);
    let mode = load_config(file, config, &source, output, quiet);

    match compile_source(&source, &mode, sprite_name(file), stage, output, quiet) {
        Ok(targets) => {
            let pretty = serde_json::to_string_pretty(&Project { targets })
                .unwrap_or_else(|e| format!("serialization error: {}", e));
            println!("{}", pretty);
        }
        Err(e) => {
            report_compile_error(&e, output, quiet);
            process::exit(1);
        }
    }
}

/// Compile `source` into a sprite named `name` (plus the stage it sees),
/// or into the stage alone. Returns the targets stage first.
pub(crate) fn compile_source(
    source: &str,
    mode: &ModeConfig,
    name: String,
    stage: bool,
    output: OutputFormat,
    quiet: bool,
) -> Result<Vec<Target>, CompileError> {
    let parsed = parse_lines(source, mode);
    if output == OutputFormat::Text && !quiet {
        for w in &parsed.warnings {
            eprintln!("warning: line {}: {}", w.line, w.message);
        }
    }

    let mut stage_target = Target::stage();
    if stage {
        tosh_core::compile(&mut stage_target, None, &parsed.lines)?;
        return Ok(vec![stage_target]);
    }
    let mut sprite = Target::sprite(name);
    let mut stage_variables = VariableTable::default();
    tosh_core::compile(&mut sprite, Some(&mut stage_variables), &parsed.lines)?;
    stage_target.variables = stage_variables;
    Ok(vec![stage_target, sprite])
}

/// Sprite name from the file stem, `Sprite1` if there is none.
pub(crate) fn sprite_name(file: &Path) -> String {
    file.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Sprite1".to_string())
}

/// Print a compile error as `{line, message}`.
pub(crate) fn report_compile_error(e: &CompileError, output: OutputFormat, quiet: bool) {
    match output {
        OutputFormat::Json => {
            let err_json = serde_json::to_string_pretty(&e.to_json_value())
                .unwrap_or_else(|_| format!("{{\"error\": \"{}\"}}", e));
            eprintln!("{}", err_json);
        }
        OutputFormat::Text => {
            if !quiet {
                let err_json = serde_json::to_string_pretty(&e.to_json_value())
                    .unwrap_or_else(|_| e.to_string());
                eprintln!("{}", err_json);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sprites_see_a_stage() {
        let targets = compile_source(
            "when I receive \"go\"\nshow\n",
            &ModeConfig::default(),
            "Cat".into(),
            false,
            OutputFormat::Json,
            true,
        )
        .expect("compiles");
        assert_eq!(targets.len(), 2);
        assert!(targets[0].is_stage);
        assert_eq!(targets[1].name, "Cat");
        assert_eq!(targets[1].blocks.scripts().len(), 1);
    }

    #[test]
    fn stage_compiles_alone() {
        let targets = compile_source(
            "when flag clicked\nswitch backdrop to \"night\"\n",
            &ModeConfig::default(),
            "ignored".into(),
            true,
            OutputFormat::Json,
            true,
        )
        .expect("compiles");
        assert_eq!(targets.len(), 1);
        assert!(targets[0].is_stage);
    }

    #[test]
    fn sprite_names_come_from_the_file() {
        assert_eq!(sprite_name(Path::new("games/cat.tosh")), "cat");
        assert_eq!(sprite_name(Path::new("")), "Sprite1");
    }
}
