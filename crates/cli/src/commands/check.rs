use std::path::Path;
use std::process;

use tosh_core::target::VariableTable;
use tosh_core::{compile, parse_lines, Target};

use crate::{load_config, read_file, OutputFormat};

/// Parse and compile without printing the result. Exits 1 on a compile
/// error; ambiguity warnings alone do not fail the check.
pub(crate) fn cmd_check(file: &Path, config: Option<&Path>, output: OutputFormat, quiet: bool) {
    let source = read_file(file, output, quiet);
    let mode = load_config(file, config, &source, output, quiet);

    let parsed = parse_lines(&source, &mode);
    let mut target = Target::sprite("Sprite1");
    let mut stage = VariableTable::default();
    let error = compile(&mut target, Some(&mut stage), &parsed.lines).err();

    match output {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "valid": error.is_none(),
                "errors": error.iter().map(|e| e.to_json_value()).collect::<Vec<_>>(),
                "warnings": parsed.warnings,
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&json).unwrap_or_default()
            );
        }
        OutputFormat::Text => {
            if !quiet {
                for w in &parsed.warnings {
                    eprintln!("{}:{}: warning: {}", file.display(), w.line, w.message);
                }
                match &error {
                    Some(e) => eprintln!("{}:{}: error: {}", file.display(), e.line, e.message),
                    None => println!(
                        "ok: {} script(s), {} block(s)",
                        target.blocks.scripts().len(),
                        target.blocks.len()
                    ),
                }
            }
        }
    }

    if error.is_some() {
        process::exit(1);
    }
}
