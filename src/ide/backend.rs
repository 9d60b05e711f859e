//! LSP Backend implementation

use std::path::{
    Path,
    PathBuf,
};
use std::sync::Arc;
use std::time::Duration;

use salsa::Setter;
use tokio::sync::Mutex;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::{
    CodeActionParams,
    CodeActionResponse,
    CompletionParams,
    CompletionResponse,
    DidChangeConfigurationParams,
    DidChangeTextDocumentParams,
    DidChangeWatchedFilesParams,
    DidChangeWatchedFilesRegistrationOptions,
    DidCloseTextDocumentParams,
    DidOpenTextDocumentParams,
    DidSaveTextDocumentParams,
    ExecuteCommandParams,
    FileChangeType,
    FileSystemWatcher,
    GlobPattern,
    GotoDefinitionParams,
    GotoDefinitionResponse,
    Hover,
    HoverParams,
    InitializeParams,
    InitializeResult,
    InitializedParams,
    Location,
    MessageType,
    ReferenceParams,
    Registration,
    Url,
    WatchKind,
};
use tower_lsp::{
    Client,
    LanguageServer,
};

use super::handlers;
use super::state::ServerState;
use crate::catalog::{
    ValidationOptions,
    looks_like_ts_catalog,
};
use crate::config::{
    CONFIG_FILE_NAME,
    ConfigManager,
    FileMatcher,
};
use crate::db::LinguistDatabaseImpl;
use crate::indexer::workspace::WorkspaceIndexer;
use crate::input::catalog::CatalogFile;

/// How long requests wait for the initial index.
const INDEX_WAIT_TIMEOUT: Duration = Duration::from_secs(10);

/// LSP Backend
#[derive(Clone)]
pub struct Backend {
    pub client: Client,
    pub config_manager: Arc<Mutex<ConfigManager>>,
    pub workspace_indexer: Arc<WorkspaceIndexer>,
    pub state: ServerState,
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend")
            .field("config_manager", &"<ConfigManager>")
            .field("workspace_indexer", &self.workspace_indexer)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Backend {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            config_manager: Arc::new(Mutex::new(ConfigManager::new())),
            workspace_indexer: Arc::new(WorkspaceIndexer::new()),
            state: ServerState::new(LinguistDatabaseImpl::default()),
        }
    }

    /// Converts a `file://` URI into a path.
    pub(crate) fn uri_to_path(uri: &Url) -> Option<PathBuf> {
        uri.to_file_path().map_or_else(
            |()| {
                tracing::warn!("Failed to convert URI to file path: {}", uri);
                None
            },
            Some,
        )
    }

    /// Whether the path is a `.qt-linguist.json` file.
    pub(crate) fn is_config_file(path: &Path) -> bool {
        path.file_name().is_some_and(|name| name == CONFIG_FILE_NAME)
    }

    /// Workspace roots to index: the client's folders, else the root
    /// given at `initialize`.
    pub(crate) async fn workspace_roots(&self) -> Vec<PathBuf> {
        match self.client.workspace_folders().await {
            Ok(Some(folders)) if !folders.is_empty() => {
                folders.iter().filter_map(|folder| folder.uri.to_file_path().ok()).collect()
            }
            _ => self.config_manager.lock().await.workspace_root().cloned().into_iter().collect(),
        }
    }

    /// Waits for the initial index. Returns `false` on timeout.
    pub(crate) async fn wait_for_index(&self) -> bool {
        self.workspace_indexer.wait_for_completion(INDEX_WAIT_TIMEOUT).await
    }

    /// Indexed catalog for a document.
    pub(crate) async fn catalog_for_uri(&self, uri: &Url) -> Option<CatalogFile> {
        let path = Self::uri_to_path(uri)?;
        let catalog_files = self.state.catalog_files.lock().await;
        catalog_files.get(&path).copied()
    }

    /// Language to prefer when a request names none.
    pub(crate) async fn effective_language(&self, available: &[String]) -> Option<String> {
        let primary_languages =
            self.config_manager.lock().await.get_settings().primary_languages.clone();
        let current_language = self.state.current_language.lock().await.clone();
        resolve_effective_language(
            current_language.as_deref(),
            primary_languages.as_deref(),
            available,
        )
    }

    /// Indexes the workspace roots into the current database.
    ///
    /// Returns the number of catalogs added.
    pub(crate) async fn index_roots<F>(&self, roots: &[PathBuf], progress_callback: F) -> usize
    where
        F: Fn(u32, u32) + Clone + Send + Sync + 'static,
    {
        let mut added = 0;
        for root in roots {
            let config_manager = self.config_manager.lock().await;
            let db = self.state.db.lock().await.clone();
            let result = self
                .workspace_indexer
                .index_workspace(
                    db,
                    root,
                    &config_manager,
                    self.state.catalog_files.clone(),
                    Some(progress_callback.clone()),
                )
                .await;
            drop(config_manager);

            match result {
                Ok(count) => added += count,
                Err(error) => {
                    tracing::error!(%error, root = %root.display(), "Indexing failed");
                    self.client
                        .log_message(MessageType::ERROR, format!("error indexing workspace: {error}"))
                        .await;
                }
            }
        }
        added
    }

    /// Rebuilds the index from scratch with a fresh database.
    pub(crate) async fn reindex_workspace(&self) {
        self.client.log_message(MessageType::INFO, "Reindexing workspace...").await;
        self.workspace_indexer.reset();

        {
            let (mut db, mut catalog_files) = self.state.lock_db_and_catalog_files().await;
            *db = LinguistDatabaseImpl::default();
            catalog_files.clear();
        }

        let roots = self.workspace_roots().await;
        let added = self.index_roots(&roots, |_, _| {}).await;
        self.workspace_indexer.mark_completed();

        self.client
            .log_message(MessageType::INFO, format!("Reindexing complete: {added} catalogs"))
            .await;
        self.send_diagnostics_to_opened_files().await;
    }

    /// Asks the client to watch catalogs and the configuration file.
    pub(crate) async fn register_file_watchers(&self) {
        let watchers = ["**/*.ts".to_string(), format!("**/{CONFIG_FILE_NAME}")]
            .into_iter()
            .map(|pattern| FileSystemWatcher {
                glob_pattern: GlobPattern::String(pattern),
                kind: Some(WatchKind::Create | WatchKind::Change | WatchKind::Delete),
            })
            .collect();

        let Ok(register_options) =
            serde_json::to_value(DidChangeWatchedFilesRegistrationOptions { watchers })
        else {
            return;
        };
        let registration = Registration {
            id: "qt-linguist-file-watcher".to_string(),
            method: "workspace/didChangeWatchedFiles".to_string(),
            register_options: Some(register_options),
        };

        if let Err(error) = self.client.register_capability(vec![registration]).await {
            tracing::warn!(%error, "Failed to register file watchers");
        }
    }

    /// Whether the path matches the configured translation file patterns.
    pub(crate) async fn is_translation_file(&self, path: &Path) -> bool {
        let config_manager = self.config_manager.lock().await;
        let Some(root) = config_manager.workspace_root().cloned() else {
            return path.extension().is_some_and(|ext| ext == "ts");
        };
        FileMatcher::new(root, config_manager.get_settings())
            .is_ok_and(|matcher| matcher.is_translation_file(path))
    }

    /// Replaces (or creates) the catalog input for a path.
    ///
    /// Text that is not a TS document drops the catalog instead.
    pub(crate) async fn set_catalog_text(&self, path: &Path, text: String) -> Option<CatalogFile> {
        if !looks_like_ts_catalog(&text) {
            self.remove_catalog_file(path).await;
            return None;
        }

        let (mut db, mut catalog_files) = self.state.lock_db_and_catalog_files().await;
        if let Some(existing) = catalog_files.get(path).copied() {
            existing.set_text(&mut *db).to(text);
            return Some(existing);
        }
        let file = CatalogFile::new(&*db, path.to_path_buf(), text);
        catalog_files.insert(path.to_path_buf(), file);
        Some(file)
    }

    /// Re-reads a catalog from disk unless the editor owns its text.
    pub(crate) async fn reload_catalog_file(&self, path: &Path) {
        if let Ok(uri) = Url::from_file_path(path)
            && self.state.opened_files.lock().await.contains(&uri)
        {
            tracing::debug!("Skipping reload of open document: {}", path.display());
            return;
        }

        if !self.wait_for_index().await {
            tracing::warn!("Indexing still running, skipping reload of {}", path.display());
            return;
        }
        match tokio::fs::read_to_string(path).await {
            Ok(text) => {
                self.set_catalog_text(path, text).await;
            }
            Err(error) => {
                tracing::warn!(%error, "Failed to read catalog: {}", path.display());
            }
        }
    }

    /// Drops the catalog input for a path.
    pub(crate) async fn remove_catalog_file(&self, path: &Path) {
        let removed = self.state.catalog_files.lock().await.remove(path);
        if removed.is_some() {
            tracing::debug!("Removed catalog: {}", path.display());
        }
    }

    /// Reloads `.qt-linguist.json` and rebuilds the index.
    pub(crate) async fn handle_config_file_change(&self, path: &Path, change: FileChangeType) {
        tracing::info!("Configuration file changed: {} ({:?})", path.display(), change);

        let mut config_manager = self.config_manager.lock().await;
        let root = config_manager.workspace_root().cloned();
        let result = config_manager.load_settings(root);
        drop(config_manager);

        if let Err(error) = result {
            self.client
                .log_message(MessageType::ERROR, format!("Configuration error: {error}"))
                .await;
            return;
        }
        self.reindex_workspace().await;
    }

    /// Stores the document text and publishes its diagnostics.
    pub(crate) async fn update_and_diagnose(&self, uri: Url, text: String) {
        let Some(path) = Self::uri_to_path(&uri) else {
            return;
        };
        // Setting an input blocks while the indexer holds a database snapshot
        if !self.wait_for_index().await {
            tracing::warn!("Indexing still running, ignoring update of {}", uri);
            return;
        }

        if self.set_catalog_text(&path, text).await.is_none() {
            self.client.publish_diagnostics(uri, Vec::new(), None).await;
            return;
        }
        self.publish_diagnostics(uri).await;
    }

    /// Publishes the diagnostics of one indexed document.
    pub(crate) async fn publish_diagnostics(&self, uri: Url) {
        let options = ValidationOptions::from(
            &self.config_manager.lock().await.get_settings().diagnostics,
        );
        let Some(file) = self.catalog_for_uri(&uri).await else {
            return;
        };
        let diagnostics = {
            let db = self.state.db.lock().await;
            crate::ide::diagnostics::generate_diagnostics(&*db, file, &options)
        };

        tracing::debug!(uri = %uri, count = diagnostics.len(), "Publishing diagnostics");
        self.client.publish_diagnostics(uri, diagnostics, None).await;
    }

    /// Republishes diagnostics for every open document.
    pub(crate) async fn send_diagnostics_to_opened_files(&self) {
        let opened: Vec<Url> = self.state.opened_files.lock().await.iter().cloned().collect();
        for uri in opened {
            self.publish_diagnostics(uri).await;
        }
    }
}

/// Picks the language to use: the current language when available, then
/// the first available primary language, then the first available one.
pub(crate) fn resolve_effective_language(
    current_language: Option<&str>,
    primary_languages: Option<&[String]>,
    available_languages: &[String],
) -> Option<String> {
    if let Some(current) = current_language
        && available_languages.iter().any(|lang| lang == current)
    {
        return Some(current.to_string());
    }

    if let Some(primary) = primary_languages
        .into_iter()
        .flatten()
        .find(|lang| available_languages.contains(lang))
    {
        return Some(primary.clone());
    }

    available_languages.first().cloned()
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        handlers::lifecycle::handle_initialize(self, params).await
    }

    async fn initialized(&self, params: InitializedParams) {
        handlers::lifecycle::handle_initialized(self, params).await;
    }

    async fn shutdown(&self) -> Result<()> {
        handlers::lifecycle::handle_shutdown().await
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        handlers::document_sync::handle_did_open(self, params).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        handlers::document_sync::handle_did_change(self, params).await;
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        handlers::document_sync::handle_did_save(self, params).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        handlers::document_sync::handle_did_close(self, params).await;
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        handlers::workspace::handle_did_change_configuration(self, params).await;
    }

    async fn did_change_watched_files(&self, params: DidChangeWatchedFilesParams) {
        handlers::workspace::handle_did_change_watched_files(self, params).await;
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        handlers::features::handle_hover(self, params).await
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        handlers::features::handle_goto_definition(self, params).await
    }

    async fn references(&self, params: ReferenceParams) -> Result<Option<Vec<Location>>> {
        handlers::features::handle_references(self, params).await
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        handlers::features::handle_completion(self, params).await
    }

    async fn code_action(&self, params: CodeActionParams) -> Result<Option<CodeActionResponse>> {
        handlers::code_action::handle_code_action(self, params).await
    }

    async fn execute_command(
        &self,
        params: ExecuteCommandParams,
    ) -> Result<Option<serde_json::Value>> {
        handlers::execute_command::handle_execute_command(self, params).await
    }
}
