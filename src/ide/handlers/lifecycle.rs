//! LSP lifecycle handlers: `initialize`, `initialized`, `shutdown`.

use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::{
    CodeActionKind,
    CodeActionOptions,
    CodeActionProviderCapability,
    CompletionOptions,
    ExecuteCommandOptions,
    HoverProviderCapability,
    InitializeParams,
    InitializeResult,
    InitializedParams,
    MessageType,
    NumberOrString,
    OneOf,
    ProgressParams,
    ProgressParamsValue,
    ServerCapabilities,
    ServerInfo,
    TextDocumentSyncCapability,
    TextDocumentSyncKind,
    WorkDoneProgress,
    WorkDoneProgressBegin,
    WorkDoneProgressEnd,
    WorkDoneProgressOptions,
    WorkDoneProgressReport,
    notification::Progress,
};

use super::super::backend::Backend;
use super::execute_command::COMMANDS;

/// Progress token of the initial indexing.
const INDEXING_TOKEN: &str = "workspace-indexing";

pub async fn handle_initialize(
    backend: &Backend,
    params: InitializeParams,
) -> Result<InitializeResult> {
    #[allow(deprecated)]
    let workspace_root = params
        .workspace_folders
        .as_ref()
        .and_then(|folders| folders.first())
        .and_then(|folder| folder.uri.to_file_path().ok())
        .or_else(|| params.root_uri.as_ref().and_then(|uri| uri.to_file_path().ok()));

    let mut config_manager = backend.config_manager.lock().await;
    if let Err(error) = config_manager.load_settings(workspace_root) {
        backend
            .client
            .log_message(MessageType::ERROR, format!("Configuration error: {error}"))
            .await;
        tracing::error!("Configuration error during initialize: {}", error);
    }
    drop(config_manager);

    Ok(InitializeResult {
        server_info: Some(ServerInfo {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
        }),
        capabilities: ServerCapabilities {
            text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL)),
            hover_provider: Some(HoverProviderCapability::Simple(true)),
            completion_provider: Some(CompletionOptions {
                resolve_provider: Some(false),
                trigger_characters: Some(vec![">".to_string()]),
                work_done_progress_options: WorkDoneProgressOptions::default(),
                all_commit_characters: None,
                completion_item: None,
            }),
            definition_provider: Some(OneOf::Left(true)),
            references_provider: Some(OneOf::Left(true)),
            code_action_provider: Some(CodeActionProviderCapability::Options(CodeActionOptions {
                code_action_kinds: Some(vec![CodeActionKind::QUICKFIX]),
                work_done_progress_options: WorkDoneProgressOptions::default(),
                resolve_provider: Some(false),
            })),
            execute_command_provider: Some(ExecuteCommandOptions {
                commands: COMMANDS.iter().map(ToString::to_string).collect(),
                work_done_progress_options: WorkDoneProgressOptions::default(),
            }),
            ..ServerCapabilities::default()
        },
    })
}

pub async fn handle_initialized(backend: &Backend, _: InitializedParams) {
    backend.client.log_message(MessageType::INFO, "initialized!").await;

    let roots = backend.workspace_roots().await;
    backend
        .client
        .log_message(MessageType::INFO, format!("Workspace roots: {roots:?}"))
        .await;

    let token = NumberOrString::String(INDEXING_TOKEN.to_string());
    send_progress(
        backend,
        &token,
        WorkDoneProgress::Begin(WorkDoneProgressBegin {
            title: "Indexing translation catalogs".to_string(),
            cancellable: Some(false),
            message: Some("Starting...".to_string()),
            percentage: Some(0),
        }),
    )
    .await;

    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::channel::<(u32, u32)>(100);
    let progress_task = {
        let client = backend.client.clone();
        let token = token.clone();
        tokio::spawn(async move {
            while let Some((current, total)) = progress_rx.recv().await {
                let percentage = (current * 100).checked_div(total).unwrap_or(0);
                client
                    .send_notification::<Progress>(ProgressParams {
                        token: token.clone(),
                        value: ProgressParamsValue::WorkDone(WorkDoneProgress::Report(
                            WorkDoneProgressReport {
                                cancellable: Some(false),
                                message: Some(format!("Reading catalogs: {current}/{total}")),
                                percentage: Some(percentage),
                            },
                        )),
                    })
                    .await;
            }
        })
    };

    let progress_callback = move |current: u32, total: u32| {
        let _ = progress_tx.try_send((current, total));
    };
    let added = backend.index_roots(&roots, progress_callback).await;
    let _ = progress_task.await;
    backend.workspace_indexer.mark_completed();

    send_progress(
        backend,
        &token,
        WorkDoneProgress::End(WorkDoneProgressEnd {
            message: Some(format!("Indexed {added} catalogs")),
        }),
    )
    .await;

    backend.send_diagnostics_to_opened_files().await;
    backend.register_file_watchers().await;
}

#[allow(clippy::unused_async)]
pub async fn handle_shutdown() -> Result<()> {
    Ok(())
}

/// Sends one `$/progress` notification.
async fn send_progress(backend: &Backend, token: &NumberOrString, progress: WorkDoneProgress) {
    backend
        .client
        .send_notification::<Progress>(ProgressParams {
            token: token.clone(),
            value: ProgressParamsValue::WorkDone(progress),
        })
        .await;
}
