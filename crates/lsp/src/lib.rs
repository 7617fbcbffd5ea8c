//! Tosh Language Server Protocol implementation for IDE integration.
//!
//! Provides diagnostics, semantic token highlighting and completion for
//! open `.tosh` documents. Connects to editors via the `tosh lsp` CLI
//! subcommand over stdio.

pub mod completion;
pub mod diagnostics;
pub mod document;
pub mod semantic_tokens;
pub mod server;

/// Run the LSP server over stdio. This is the public entry point
/// called by `tosh lsp`.
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    server::run()
}
