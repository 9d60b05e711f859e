//! Shared state of the language server.

use std::collections::{
    HashMap,
    HashSet,
};
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{
    Mutex,
    MutexGuard,
};

use crate::db::LinguistDatabaseImpl;
use crate::input::catalog::CatalogFile;

/// State shared by the request handlers.
///
/// # Lock order
///
/// When several locks are held at once, take them in this order:
/// 1. `db`
/// 2. `catalog_files`
/// 3. `opened_files`
/// 4. `current_language`
#[derive(Clone)]
pub struct ServerState {
    pub db: Arc<Mutex<LinguistDatabaseImpl>>,
    /// Indexed catalogs by absolute path.
    pub catalog_files: Arc<Mutex<HashMap<PathBuf, CatalogFile>>>,
    /// Documents currently open in the editor.
    pub opened_files: Arc<Mutex<HashSet<tower_lsp::lsp_types::Url>>>,
    /// Language selected with `linguist.setCurrentLanguage`.
    pub current_language: Arc<Mutex<Option<String>>>,
}

impl ServerState {
    pub fn new(db: LinguistDatabaseImpl) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            catalog_files: Arc::new(Mutex::new(HashMap::new())),
            opened_files: Arc::new(Mutex::new(HashSet::new())),
            current_language: Arc::new(Mutex::new(None)),
        }
    }

    /// Locks `db` then `catalog_files`.
    pub async fn lock_db_and_catalog_files(
        &self,
    ) -> (MutexGuard<'_, LinguistDatabaseImpl>, MutexGuard<'_, HashMap<PathBuf, CatalogFile>>) {
        let db = self.db.lock().await;
        let catalog_files = self.catalog_files.lock().await;
        (db, catalog_files)
    }

    /// Snapshot of every indexed catalog, sorted by path.
    pub async fn catalogs(&self) -> Vec<CatalogFile> {
        let catalog_files = self.catalog_files.lock().await;
        let mut entries: Vec<_> = catalog_files.iter().map(|(path, file)| (path.clone(), *file)).collect();
        drop(catalog_files);
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries.into_iter().map(|(_, file)| file).collect()
    }
}

impl std::fmt::Debug for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerState")
            .field("db", &"<LinguistDatabaseImpl>")
            .field("catalog_files", &"<HashMap<PathBuf, CatalogFile>>")
            .field("opened_files", &"<HashSet<Url>>")
            .field("current_language", &"<Option<String>>")
            .finish()
    }
}
