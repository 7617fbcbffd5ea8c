use std::path::Path;
use std::process;

use tosh_core::{Autocomplete, Position};

use crate::{load_config, read_file, report_error, OutputFormat};

/// Print the ranked suggestions at 1-based `line`, `column`.
pub(crate) fn cmd_complete(
    file: &Path,
    line: usize,
    column: usize,
    config: Option<&Path>,
    output: OutputFormat,
    quiet: bool,
) {
    let source = read_file(file, output, quiet);
    let mode = load_config(file, config, &source, output, quiet);

    if line == 0 || column == 0 {
        report_error("--line and --column start at 1", output, quiet);
        process::exit(1);
    }
    let at = Position {
        line: line - 1,
        column: column - 1,
    };
    let suggestions = Autocomplete::new(&mode).suggest(&source, at, true);

    match output {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&suggestions).unwrap_or_default()
            );
        }
        OutputFormat::Text => {
            if suggestions.is_empty() && !quiet {
                eprintln!("no suggestions");
            }
            for s in &suggestions {
                println!("{}", s.label.replace('\n', "\\n"));
            }
        }
    }
}
