//! LSP server main loop with request/notification dispatch.
//!
//! Uses `lsp-server` (synchronous, crossbeam-based) for the transport.
//! Every request is answered from the in-memory document, so nothing
//! here needs an async runtime.

use lsp_server::{Connection, Message, Notification, Response};
use lsp_types::notification::{
    DidChangeTextDocument, DidCloseTextDocument, DidOpenTextDocument, DidSaveTextDocument,
    Notification as _, PublishDiagnostics,
};
use lsp_types::request::{Completion, SemanticTokensFullRequest};
use lsp_types::{
    CompletionOptions, CompletionResponse, CompletionTriggerKind, PublishDiagnosticsParams,
    SaveOptions, SemanticTokens, SemanticTokensFullOptions, SemanticTokensLegend,
    SemanticTokensOptions, SemanticTokensResult, ServerCapabilities, TextDocumentSyncCapability,
    TextDocumentSyncKind, TextDocumentSyncOptions, TextDocumentSyncSaveOptions, Uri,
};
use std::path::PathBuf;

use crate::completion;
use crate::diagnostics;
use crate::document::{mode_config_for, DocumentState};
use crate::semantic_tokens;

/// Run the LSP server over stdio until shutdown.
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (connection, io_threads) = Connection::stdio();

    // ── Initialize handshake ──────────────────────────────────────────
    let server_capabilities = build_capabilities();
    let init_json = serde_json::to_value(&server_capabilities)?;
    connection.initialize(init_json)?;
    tracing::info!("tosh language server initialized");

    // ── Main loop ─────────────────────────────────────────────────────
    let mut doc_state = DocumentState::new();

    for msg in &connection.receiver {
        match msg {
            Message::Request(req) => {
                if connection.handle_shutdown(&req)? {
                    break;
                }
                handle_request(&connection, &doc_state, req)?;
            }
            Message::Notification(not) => {
                handle_notification(&connection, &mut doc_state, not)?;
            }
            Message::Response(_) => {
                // Ignore responses (we don't send requests to the client)
            }
        }
    }

    io_threads.join()?;
    Ok(())
}

pub fn build_capabilities() -> ServerCapabilities {
    ServerCapabilities {
        text_document_sync: Some(TextDocumentSyncCapability::Options(
            TextDocumentSyncOptions {
                open_close: Some(true),
                change: Some(TextDocumentSyncKind::FULL),
                save: Some(TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
                    include_text: Some(false),
                })),
                ..Default::default()
            },
        )),
        semantic_tokens_provider: Some(
            lsp_types::SemanticTokensServerCapabilities::SemanticTokensOptions(
                SemanticTokensOptions {
                    full: Some(SemanticTokensFullOptions::Delta { delta: Some(false) }),
                    legend: SemanticTokensLegend {
                        token_types: semantic_tokens::token_types(),
                        token_modifiers: semantic_tokens::TOKEN_MODIFIERS.to_vec(),
                    },
                    ..Default::default()
                },
            ),
        ),
        completion_provider: Some(CompletionOptions {
            trigger_characters: Some(vec![" ".into()]),
            resolve_provider: Some(false),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn handle_request(
    connection: &Connection,
    doc_state: &DocumentState,
    req: lsp_server::Request,
) -> Result<(), Box<dyn std::error::Error>> {
    use lsp_types::request::Request as _;

    if req.method == SemanticTokensFullRequest::METHOD {
        let params: lsp_types::SemanticTokensParams = serde_json::from_value(req.params.clone())?;
        let (path, content) = get_document(doc_state, &params.text_document.uri);
        let config = mode_config_for(&path, &content);
        let result = SemanticTokensResult::Tokens(SemanticTokens {
            result_id: None,
            data: semantic_tokens::compute_semantic_tokens(&content, &config),
        });
        let resp = Response::new_ok(req.id, serde_json::to_value(result)?);
        connection.sender.send(Message::Response(resp))?;
    } else if req.method == Completion::METHOD {
        let params: lsp_types::CompletionParams = serde_json::from_value(req.params.clone())?;
        let uri = &params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;
        let explicit = params
            .context
            .map_or(true, |c| c.trigger_kind == CompletionTriggerKind::INVOKED);
        let (path, content) = get_document(doc_state, uri);
        let config = mode_config_for(&path, &content);
        let items = completion::compute_completions(&content, position, &config, explicit);
        let result = CompletionResponse::Array(items);
        let resp = Response::new_ok(req.id, serde_json::to_value(result)?);
        connection.sender.send(Message::Response(resp))?;
    } else {
        // Unknown request -- method not found
        let resp = Response::new_err(
            req.id,
            lsp_server::ErrorCode::MethodNotFound as i32,
            format!("method not found: {}", req.method),
        );
        connection.sender.send(Message::Response(resp))?;
    }
    Ok(())
}

/// Path and content of a document, from the editor if open, else from disk.
fn get_document(doc_state: &DocumentState, uri: &Uri) -> (PathBuf, String) {
    match doc_state.get(uri.as_str()) {
        Some(doc) => (doc.path.clone(), doc.content.clone()),
        None => {
            let path = uri_to_path(uri);
            let content = std::fs::read_to_string(&path).unwrap_or_default();
            (path, content)
        }
    }
}

fn handle_notification(
    connection: &Connection,
    doc_state: &mut DocumentState,
    not: Notification,
) -> Result<(), Box<dyn std::error::Error>> {
    match not.method.as_str() {
        m if m == DidOpenTextDocument::METHOD => {
            let params: lsp_types::DidOpenTextDocumentParams = serde_json::from_value(not.params)?;
            let uri_str = params.text_document.uri.as_str().to_string();
            let path = uri_to_path(&params.text_document.uri);
            doc_state.open(
                &uri_str,
                path,
                params.text_document.version,
                params.text_document.text,
            );
            refresh_diagnostics(connection, doc_state, params.text_document.uri)?;
        }
        m if m == DidChangeTextDocument::METHOD => {
            let params: lsp_types::DidChangeTextDocumentParams =
                serde_json::from_value(not.params)?;
            let uri_str = params.text_document.uri.as_str().to_string();
            // FULL sync: last content change has the entire document
            if let Some(change) = params.content_changes.into_iter().last() {
                doc_state.change(&uri_str, params.text_document.version, change.text);
            }
            refresh_diagnostics(connection, doc_state, params.text_document.uri)?;
        }
        m if m == DidSaveTextDocument::METHOD => {
            let params: lsp_types::DidSaveTextDocumentParams = serde_json::from_value(not.params)?;
            refresh_diagnostics(connection, doc_state, params.text_document.uri)?;
        }
        m if m == DidCloseTextDocument::METHOD => {
            let params: lsp_types::DidCloseTextDocumentParams = serde_json::from_value(not.params)?;
            let uri_str = params.text_document.uri.as_str().to_string();
            doc_state.close(&uri_str);
            // Clear diagnostics for closed file
            publish_diagnostics(connection, params.text_document.uri, Vec::new())?;
        }
        _ => {
            // Unknown notification -- ignore
        }
    }
    Ok(())
}

fn refresh_diagnostics(
    connection: &Connection,
    doc_state: &DocumentState,
    uri: Uri,
) -> Result<(), Box<dyn std::error::Error>> {
    let (path, content) = get_document(doc_state, &uri);
    let config = mode_config_for(&path, &content);
    let diags = diagnostics::compute_diagnostics(&content, &config);
    tracing::debug!(uri = uri.as_str(), count = diags.len(), "publishing diagnostics");
    publish_diagnostics(connection, uri, diags)
}

/// Send `textDocument/publishDiagnostics` notification to the client.
fn publish_diagnostics(
    connection: &Connection,
    uri: Uri,
    diagnostics: Vec<lsp_types::Diagnostic>,
) -> Result<(), Box<dyn std::error::Error>> {
    let params = PublishDiagnosticsParams {
        uri,
        diagnostics,
        version: None,
    };
    let not = Notification::new(PublishDiagnostics::METHOD.to_string(), params);
    connection.sender.send(Message::Notification(not))?;
    Ok(())
}

/// Convert an LSP URI to a file system path.
///
/// Handles `file:///path/to/file` URIs by stripping the scheme and authority
/// and percent-decoding (e.g. `%20` → ` `).
pub fn uri_to_path(uri: &Uri) -> PathBuf {
    let s = uri.as_str();
    match s.strip_prefix("file://") {
        Some(path) => {
            let decoded = percent_decode(path);
            #[cfg(windows)]
            let decoded = decoded.strip_prefix('/').map(str::to_owned).unwrap_or(decoded);
            PathBuf::from(decoded)
        }
        None => PathBuf::from(s),
    }
}

/// Decode percent-encoded bytes in a URI path. Malformed escapes pass
/// through unchanged.
fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let escaped = (bytes[i] == b'%')
            .then(|| bytes.get(i + 1..i + 3))
            .flatten()
            .and_then(|pair| std::str::from_utf8(pair).ok())
            .and_then(|pair| u8::from_str_radix(pair, 16).ok());
        match escaped {
            Some(byte) => {
                out.push(byte);
                i += 3;
            }
            None => {
                out.push(bytes[i]);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_uris_become_paths() {
        let uri: Uri = "file:///home/kid/My%20Game/cat.tosh".parse().unwrap();
        #[cfg(not(windows))]
        assert_eq!(uri_to_path(&uri), PathBuf::from("/home/kid/My Game/cat.tosh"));
        assert_eq!(percent_decode("a%2"), "a%2");
        assert_eq!(percent_decode("%E2%98%81"), "☁");
    }

    #[test]
    fn capabilities_advertise_completion_and_tokens() {
        let caps = build_capabilities();
        assert!(caps.completion_provider.is_some());
        assert!(caps.semantic_tokens_provider.is_some());
    }
}
