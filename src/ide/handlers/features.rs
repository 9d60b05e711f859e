//! LSP feature handlers
//!
//! Handles `completion`, `hover`, `goto_definition` and `references`.

use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::{
    CompletionParams,
    CompletionResponse,
    GotoDefinitionParams,
    GotoDefinitionResponse,
    Hover,
    HoverContents,
    HoverParams,
    Location,
    MarkupContent,
    MarkupKind,
    ReferenceParams,
};

use super::super::backend::Backend;
use crate::input::catalog::message_key_at_position;
use crate::types::SourcePosition;

/// Handles `textDocument/completion`.
pub async fn handle_completion(
    backend: &Backend,
    params: CompletionParams,
) -> Result<Option<CompletionResponse>> {
    let uri = params.text_document_position.text_document.uri;
    let position = params.text_document_position.position;

    tracing::debug!(uri = %uri, line = position.line, character = position.character, "Completion request");

    // Translation memory spans every catalog
    if !backend.wait_for_index().await {
        tracing::debug!("Completion request - catalogs not indexed yet");
        return Ok(None);
    }

    let Some(file) = backend.catalog_for_uri(&uri).await else {
        return Ok(None);
    };
    let catalogs = backend.state.catalogs().await;

    let items = {
        let db = backend.state.db.lock().await;
        crate::ide::completion::generate_completions(
            &*db,
            file,
            SourcePosition::from(position),
            &catalogs,
        )
    };

    tracing::debug!("Generated {} completion items", items.len());

    if items.is_empty() { Ok(None) } else { Ok(Some(CompletionResponse::Array(items))) }
}

/// Handles `textDocument/hover`.
pub async fn handle_hover(backend: &Backend, params: HoverParams) -> Result<Option<Hover>> {
    let uri = params.text_document_position_params.text_document.uri;
    let position = params.text_document_position_params.position;

    tracing::debug!(uri = %uri, line = position.line, character = position.character, "Hover request");

    if !backend.wait_for_index().await {
        tracing::debug!("Hover request timeout - catalogs not indexed yet");
        return Ok(None);
    }

    let Some(file) = backend.catalog_for_uri(&uri).await else {
        return Ok(None);
    };
    let catalogs = backend.state.catalogs().await;
    let primary_languages =
        backend.config_manager.lock().await.get_settings().primary_languages.clone();
    let current_language = backend.state.current_language.lock().await.clone();

    let hover_text = {
        let db = backend.state.db.lock().await;
        let Some(key) = message_key_at_position(&*db, file, SourcePosition::from(position)) else {
            tracing::debug!("No message found at position");
            return Ok(None);
        };
        crate::ide::hover::generate_hover_content(
            &*db,
            key,
            &catalogs,
            current_language.as_deref(),
            primary_languages.as_deref(),
        )
    };

    let Some(hover_text) = hover_text else {
        return Ok(None);
    };

    Ok(Some(Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value: hover_text,
        }),
        range: None,
    }))
}

/// Handles `textDocument/definition`.
pub async fn handle_goto_definition(
    backend: &Backend,
    params: GotoDefinitionParams,
) -> Result<Option<GotoDefinitionResponse>> {
    let uri = params.text_document_position_params.text_document.uri;
    let position = params.text_document_position_params.position;

    tracing::debug!(uri = %uri, line = position.line, character = position.character, "Goto Definition request");

    let Some(file) = backend.catalog_for_uri(&uri).await else {
        return Ok(None);
    };

    let location = {
        let db = backend.state.db.lock().await;
        crate::ide::goto_definition::find_definition(&*db, file, SourcePosition::from(position))
    };

    Ok(location.map(GotoDefinitionResponse::Scalar))
}

/// Handles `textDocument/references`.
pub async fn handle_references(
    backend: &Backend,
    params: ReferenceParams,
) -> Result<Option<Vec<Location>>> {
    let uri = params.text_document_position.text_document.uri;
    let position = params.text_document_position.position;

    tracing::debug!(uri = %uri, line = position.line, character = position.character, "References request");

    // Partial results would be misleading, so do not wait
    if !backend.workspace_indexer.is_indexing_completed() {
        tracing::debug!("References request - indexing not completed, returning empty results");
        return Ok(Some(vec![]));
    }

    let Some(file) = backend.catalog_for_uri(&uri).await else {
        return Ok(None);
    };
    let catalogs = backend.state.catalogs().await;

    let locations = {
        let db = backend.state.db.lock().await;
        let Some(key) = message_key_at_position(&*db, file, SourcePosition::from(position)) else {
            tracing::debug!("No message found at position");
            return Ok(None);
        };
        crate::ide::references::find_references(&*db, key, &catalogs)
    };

    tracing::debug!("Found {} references", locations.len());

    if locations.is_empty() { Ok(None) } else { Ok(Some(locations)) }
}
