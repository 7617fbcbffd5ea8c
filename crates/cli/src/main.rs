mod commands;
mod project;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tosh_core::ModeConfig;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Tosh: text for Scratch blocks.
#[derive(Parser)]
#[command(name = "tosh", version, about = "Tosh: write Scratch scripts as text")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Log filter for stderr (e.g. warn, debug, tosh_core=trace)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a .tosh file to a target's block graph (JSON)
    Compile {
        /// Path to the .tosh source file
        file: PathBuf,
        /// Vocabulary file (variables, lists, custom blocks)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Compile for the stage instead of a sprite
        #[arg(long)]
        stage: bool,
    },

    /// Turn a compiled target back into canonical text
    Generate {
        /// Path to a target or project JSON file
        file: PathBuf,
        /// Name of the target to generate (default: the first sprite)
        #[arg(long)]
        target: Option<String>,
    },

    /// Print a .tosh file in canonical form
    Format {
        /// Path to the .tosh source file
        file: PathBuf,
        /// Vocabulary file (variables, lists, custom blocks)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Rewrite the file in place instead of printing it
        #[arg(long)]
        write: bool,
    },

    /// Report compile errors and ambiguous lines in a .tosh file
    Check {
        /// Path to the .tosh source file
        file: PathBuf,
        /// Vocabulary file (variables, lists, custom blocks)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List completions at a cursor position
    Complete {
        /// Path to the .tosh source file
        file: PathBuf,
        /// Cursor line (1-based)
        #[arg(long)]
        line: usize,
        /// Cursor column (1-based, in characters)
        #[arg(long, default_value = "1")]
        column: usize,
        /// Vocabulary file (variables, lists, custom blocks)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Start the Language Server Protocol server over stdio
    Lsp,
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match cli.command {
        Commands::Compile {
            file,
            config,
            stage,
        } => {
            commands::compile::cmd_compile(&file, config.as_deref(), stage, cli.output, cli.quiet);
        }
        Commands::Generate { file, target } => {
            commands::generate::cmd_generate(&file, target.as_deref(), cli.output, cli.quiet);
        }
        Commands::Format {
            file,
            config,
            write,
        } => {
            commands::format::cmd_format(&file, config.as_deref(), write, cli.output, cli.quiet);
        }
        Commands::Check { file, config } => {
            commands::check::cmd_check(&file, config.as_deref(), cli.output, cli.quiet);
        }
        Commands::Complete {
            file,
            line,
            column,
            config,
        } => {
            commands::complete::cmd_complete(
                &file,
                line,
                column,
                config.as_deref(),
                cli.output,
                cli.quiet,
            );
        }
        Commands::Lsp => {
            if let Err(e) = tosh_lsp::run() {
                eprintln!("LSP server error: {}", e);
                process::exit(1);
            }
        }
    }
}

/// Send `tracing` output to stderr so stdout stays machine-readable.
fn init_logging(filter: &str) {
    let filter = tracing_subscriber::EnvFilter::try_new(filter)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Read a file or exit with an error.
pub(crate) fn read_file(path: &Path, output: OutputFormat, quiet: bool) -> String {
    match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            let msg = format!("error reading '{}': {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }
}

/// Vocabulary for `source`: the `--config` file if given, else the nearest
/// `tosh.toml` next to `file`, plus the custom blocks `source` defines.
pub(crate) fn load_config(
    file: &Path,
    config: Option<&Path>,
    source: &str,
    output: OutputFormat,
    quiet: bool,
) -> ModeConfig {
    let config_path = config
        .map(Path::to_path_buf)
        .or_else(|| tosh_lsp::document::find_config(&absolute(file)));
    let base = match config_path {
        Some(path) => match ModeConfig::load(&path) {
            Ok(c) => c,
            Err(e) => {
                let msg = format!("error in config '{}': {}", path.display(), e);
                report_error(&msg, output, quiet);
                process::exit(1);
            }
        },
        None => ModeConfig::default(),
    };
    base.with_definitions_from(source)
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Report an error message in the appropriate output format.
pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
