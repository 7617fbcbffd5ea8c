use std::path::Path;
use std::process;

use tosh_core::generate;

use crate::project::{pick_target, Document};
use crate::{read_file, report_error, OutputFormat};

pub(crate) fn cmd_generate(file: &Path, target: Option<&str>, output: OutputFormat, quiet: bool) {
    let json = read_file(file, output, quiet);
    let document: Document = match serde_json::from_str(&json) {
        Ok(d) => d,
        Err(e) => {
            let msg = format!("error parsing JSON in '{}': {}", file.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };

    let Some(chosen) = pick_target(document.into_targets(), target) else {
        let msg = match target {
            Some(name) => format!("no target named '{}' in '{}'", name, file.display()),
            None => format!("no targets in '{}'", file.display()),
        };
        report_error(&msg, output, quiet);
        process::exit(1);
    };

    match generate(&chosen.blocks) {
        Ok(text) => match output {
            OutputFormat::Text => print!("{}", text),
            OutputFormat::Json => {
                let json = serde_json::json!({ "target": chosen.name, "text": text });
                println!(
                    "{}",
                    serde_json::to_string_pretty(&json).unwrap_or_default()
                );
            }
        },
        Err(e) => {
            report_error(&format!("generate error: {}", e), output, quiet);
            process::exit(1);
        }
    }
}
