//! Finds and loads the translation catalogs of a workspace.

use std::collections::HashMap;
use std::path::{
    Path,
    PathBuf,
};
use std::sync::Arc;
use std::sync::atomic::{
    AtomicBool,
    AtomicU32,
    Ordering,
};
use std::time::Duration;

use ignore::WalkBuilder;
use tokio::sync::{
    Mutex,
    Notify,
    Semaphore,
};

use crate::catalog::looks_like_ts_catalog;
use crate::config::{
    ConfigManager,
    FileMatcher,
};
use crate::db::LinguistDatabaseImpl;
use crate::indexer::types::{
    DiscoveredCatalog,
    IndexerError,
};
use crate::input::catalog::CatalogFile;

/// Loads catalogs into the database and tracks whether the initial scan
/// has finished.
#[derive(Clone, Debug, Default)]
pub struct WorkspaceIndexer {
    indexing_completed: Arc<AtomicBool>,
    indexing_notify: Arc<Notify>,
}

impl WorkspaceIndexer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_indexing_completed(&self) -> bool {
        self.indexing_completed.load(Ordering::Acquire)
    }

    /// Marks the index as stale, e.g. before a full reindex.
    pub fn reset(&self) {
        self.indexing_completed.store(false, Ordering::Release);
    }

    /// Marks the index as complete and wakes every waiting request.
    pub fn mark_completed(&self) {
        self.indexing_completed.store(true, Ordering::Release);
        self.indexing_notify.notify_waiters();
    }

    /// Waits until indexing completes. Returns `false` on timeout.
    pub async fn wait_for_completion(&self, timeout: Duration) -> bool {
        let notified = self.indexing_notify.notified();
        if self.is_indexing_completed() {
            return true;
        }
        tokio::time::timeout(timeout, notified).await.is_ok()
    }

    /// Indexes every catalog of the workspace.
    ///
    /// Files are read concurrently, at most `indexing.numThreads` at a
    /// time. Files that match the patterns but are not TS documents
    /// (TypeScript sources share the extension) are skipped. Catalogs
    /// already present in `catalog_files` keep their current input.
    ///
    /// Returns the number of catalogs added.
    ///
    /// # Errors
    /// Invalid patterns or a failed read task.
    pub async fn index_workspace<F>(
        &self,
        db: LinguistDatabaseImpl,
        workspace_path: &Path,
        config_manager: &ConfigManager,
        catalog_files: Arc<Mutex<HashMap<PathBuf, CatalogFile>>>,
        progress_callback: Option<F>,
    ) -> Result<usize, IndexerError>
    where
        F: Fn(u32, u32) + Send + Sync + 'static,
    {
        tracing::debug!(workspace_path = %workspace_path.display(), "Indexing workspace");
        let settings = config_manager.get_settings();
        let matcher = FileMatcher::new(workspace_path.to_path_buf(), settings)?;

        let files = Self::find_catalog_files(&matcher);
        tracing::debug!("Found {} candidate files", files.len());

        let discovered =
            Self::read_catalogs(files, settings.indexing_threads(), progress_callback).await?;

        let mut catalog_files = catalog_files.lock().await;
        let mut added = 0;
        for catalog in discovered {
            if catalog_files.contains_key(&catalog.path) {
                continue;
            }
            let file = CatalogFile::new(&db, catalog.path.clone(), catalog.text);
            catalog_files.insert(catalog.path, file);
            added += 1;
        }
        drop(catalog_files);

        tracing::info!(workspace_path = %workspace_path.display(), added, "Workspace indexed");
        Ok(added)
    }

    /// Reads the candidate files concurrently and keeps the TS documents.
    async fn read_catalogs<F>(
        files: Vec<PathBuf>,
        num_threads: usize,
        progress_callback: Option<F>,
    ) -> Result<Vec<DiscoveredCatalog>, IndexerError>
    where
        F: Fn(u32, u32) + Send + Sync + 'static,
    {
        let total = u32::try_from(files.len()).unwrap_or(u32::MAX);
        let semaphore = Arc::new(Semaphore::new(num_threads.max(1)));
        let processed = Arc::new(AtomicU32::new(0));
        let progress_callback = progress_callback.map(Arc::new);

        let tasks: Vec<_> = files
            .into_iter()
            .map(|path| {
                let semaphore = Arc::clone(&semaphore);
                let processed = Arc::clone(&processed);
                let progress_callback = progress_callback.clone();
                tokio::spawn(async move {
                    let _permit = semaphore.acquire_owned().await.ok()?;
                    let catalog = read_catalog(path).await;
                    let current = processed.fetch_add(1, Ordering::AcqRel) + 1;
                    if let Some(callback) = &progress_callback {
                        callback(current, total);
                    }
                    catalog
                })
            })
            .collect();

        let mut discovered = Vec::new();
        for result in futures::future::join_all(tasks).await {
            if let Some(catalog) = result? {
                discovered.push(catalog);
            }
        }
        Ok(discovered)
    }

    /// Walks the workspace, honoring `.gitignore`, and returns the files
    /// matching the translation patterns.
    fn find_catalog_files(matcher: &FileMatcher) -> Vec<PathBuf> {
        let workspace_path = matcher.workspace_root();
        let mut found_files = Vec::new();

        for result in WalkBuilder::new(workspace_path)
            .hidden(false)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .follow_links(false)
            .build()
        {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::debug!(?err, "Failed to read directory entry");
                    continue;
                }
            };

            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let path = entry.path();
            let Ok(relative_path) = path.strip_prefix(workspace_path) else {
                continue;
            };
            if matcher.is_translation_file_relative(relative_path) {
                found_files.push(path.to_path_buf());
            }
        }

        found_files
    }
}

/// Reads one file. Unreadable files and non-TS documents yield `None`.
async fn read_catalog(path: PathBuf) -> Option<DiscoveredCatalog> {
    let text = match tokio::fs::read_to_string(&path).await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("Failed to read file {:?}: {}", path, e);
            return None;
        }
    };

    if !looks_like_ts_catalog(&text) {
        tracing::debug!("Skipping non-catalog file {:?}", path);
        return None;
    }

    Some(DiscoveredCatalog { path, text })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;

    use googletest::prelude::*;
    use tempfile::TempDir;

    use super::*;
    use crate::test_utils::PATCHANCE_FR;

    /// Lays out a workspace with one catalog, one TypeScript source and
    /// one catalog inside an excluded directory.
    fn create_workspace() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("locale")).unwrap();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::write(root.join("locale/patchance_fr.ts"), PATCHANCE_FR).unwrap();
        fs::write(root.join("src/main.ts"), "export const answer = 42;\n").unwrap();
        fs::write(root.join("node_modules/pkg/vendor_de.ts"), PATCHANCE_FR).unwrap();
        temp_dir
    }

    async fn index(
        temp_dir: &TempDir,
        catalog_files: Arc<Mutex<HashMap<PathBuf, CatalogFile>>>,
        progress: Option<impl Fn(u32, u32) + Send + Sync + 'static>,
    ) -> usize {
        let mut config_manager = ConfigManager::new();
        config_manager.load_settings(Some(temp_dir.path().to_path_buf())).unwrap();
        WorkspaceIndexer::new()
            .index_workspace(
                LinguistDatabaseImpl::default(),
                temp_dir.path(),
                &config_manager,
                catalog_files,
                progress,
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn index_workspace_loads_only_catalogs() {
        let temp_dir = create_workspace();
        let catalog_files = Arc::new(Mutex::new(HashMap::new()));

        let added = index(&temp_dir, Arc::clone(&catalog_files), None::<fn(u32, u32)>).await;

        assert_that!(added, eq(1));
        let catalog_files = catalog_files.lock().await;
        assert!(catalog_files.contains_key(&temp_dir.path().join("locale/patchance_fr.ts")));
    }

    #[tokio::test]
    async fn index_workspace_reports_progress() {
        let temp_dir = create_workspace();
        let reports = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = Arc::clone(&reports);

        index(
            &temp_dir,
            Arc::new(Mutex::new(HashMap::new())),
            Some(move |current, total| sink.lock().unwrap().push((current, total))),
        )
        .await;

        let mut reports = reports.lock().unwrap().clone();
        reports.sort_unstable();
        assert_eq!(reports, vec![(1, 2), (2, 2)]);
    }

    #[tokio::test]
    async fn index_workspace_keeps_existing_inputs() {
        let temp_dir = create_workspace();
        let db = LinguistDatabaseImpl::default();
        let path = temp_dir.path().join("locale/patchance_fr.ts");
        let existing = CatalogFile::new(&db, path.clone(), "<TS></TS>".to_string());
        let catalog_files = Arc::new(Mutex::new(HashMap::from([(path.clone(), existing)])));

        let added = index(&temp_dir, Arc::clone(&catalog_files), None::<fn(u32, u32)>).await;

        assert_that!(added, eq(0));
        assert_eq!(catalog_files.lock().await.get(&path), Some(&existing));
    }

    #[tokio::test]
    async fn wait_for_completion_times_out_then_succeeds() {
        let indexer = WorkspaceIndexer::new();

        assert!(!indexer.wait_for_completion(Duration::from_millis(10)).await);

        let waiter = {
            let indexer = indexer.clone();
            tokio::spawn(async move { indexer.wait_for_completion(Duration::from_secs(5)).await })
        };
        tokio::task::yield_now().await;
        indexer.mark_completed();

        assert!(waiter.await.unwrap());
        assert!(indexer.is_indexing_completed());
    }

    #[test]
    fn reset_makes_requests_wait_again() {
        let indexer = WorkspaceIndexer::new();
        indexer.mark_completed();
        assert!(tokio_test::block_on(indexer.wait_for_completion(Duration::from_millis(10))));

        indexer.reset();

        assert!(!indexer.is_indexing_completed());
        assert!(!tokio_test::block_on(indexer.wait_for_completion(Duration::from_millis(10))));
    }
}
