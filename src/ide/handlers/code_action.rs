//! Code Action handler

use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::{
    CodeActionParams,
    CodeActionResponse,
};

use super::super::backend::Backend;
use crate::types::SourcePosition;

/// Handles `textDocument/codeAction`.
///
/// Actions only concern the message under the start of the range.
pub async fn handle_code_action(
    backend: &Backend,
    params: CodeActionParams,
) -> Result<Option<CodeActionResponse>> {
    let uri = &params.text_document.uri;
    let position = params.range.start;

    tracing::debug!(uri = %uri, line = position.line, character = position.character, "Code Action request");

    let Some(file) = backend.catalog_for_uri(uri).await else {
        return Ok(Some(vec![]));
    };

    let actions = {
        let db = backend.state.db.lock().await;
        crate::ide::code_actions::generate_code_actions(
            &*db,
            file,
            uri,
            SourcePosition::from(position),
        )
    };

    tracing::debug!("Generated {} code actions", actions.len());

    Ok(Some(actions))
}
