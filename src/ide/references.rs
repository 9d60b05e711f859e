//! References implementation

use tower_lsp::lsp_types::{
    Location,
    Url,
};

use crate::db::LinguistDatabase;
use crate::input::catalog::{
    CatalogFile,
    parse_catalog_file,
};
use crate::interned::MessageKey;

/// Finds the message in every catalog, matched by context, source and
/// disambiguation comment. Each location covers the `<source>` text.
pub fn find_references(
    db: &dyn LinguistDatabase,
    key: MessageKey<'_>,
    catalogs: &[CatalogFile],
) -> Vec<Location> {
    let context = key.context(db);
    let source = key.source(db);
    let comment = key.comment(db).as_deref();
    let mut locations = Vec::new();

    for file in catalogs {
        // Parse results are cached by salsa
        let Ok(parsed) = parse_catalog_file(db, *file) else {
            continue;
        };
        let Some(message) = parsed.catalog.find(context, source, comment) else {
            continue;
        };

        let path = file.path(db);
        let Ok(uri) = Url::from_file_path(path) else {
            tracing::warn!("Failed to create URI from file path: {}", path.display());
            continue;
        };
        locations.push(Location { uri, range: message.ranges.source.into() });
    }

    locations
}
