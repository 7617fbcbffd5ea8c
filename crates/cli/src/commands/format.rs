use std::path::Path;
use std::process;

use tosh_core::generate;

use super::compile::{compile_source, report_compile_error, sprite_name};
use crate::{load_config, read_file, report_error, OutputFormat};

/// Compile and regenerate, so the text comes out in canonical form.
pub(crate) fn cmd_format(
    file: &Path,
    config: Option<&Path>,
    write: bool,
    output: OutputFormat,
    quiet: bool,
) {
    let source = read_file(file, output, quiet);
    let mode = load_config(file, config, &source, output, quiet);

    let targets = match compile_source(&source, &mode, sprite_name(file), false, output, quiet) {
        Ok(t) => t,
        Err(e) => {
            report_compile_error(&e, output, quiet);
            process::exit(1);
        }
    };
    let Some(sprite) = targets.last() else {
        return;
    };
    let text = match generate(&sprite.blocks) {
        Ok(t) => t,
        Err(e) => {
            report_error(&format!("generate error: {}", e), output, quiet);
            process::exit(1);
        }
    };

    if write {
        let changed = text != source;
        if changed {
            if let Err(e) = std::fs::write(file, &text) {
                let msg = format!("error writing '{}': {}", file.display(), e);
                report_error(&msg, output, quiet);
                process::exit(1);
            }
        }
        if !quiet {
            match output {
                OutputFormat::Text if changed => println!("formatted {}", file.display()),
                OutputFormat::Text => println!("unchanged {}", file.display()),
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::json!({ "file": file.display().to_string(), "changed": changed })
                ),
            }
        }
        return;
    }

    match output {
        OutputFormat::Text => print!("{}", text),
        OutputFormat::Json => println!("{}", serde_json::json!({ "text": text })),
    }
}
