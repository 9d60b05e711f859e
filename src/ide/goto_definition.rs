//! Go to Definition implementation

use std::path::{
    Component,
    Path,
    PathBuf,
};

use tower_lsp::lsp_types::{
    Location,
    Position,
    Range,
    Url,
};

use crate::catalog::Location as SourceLocation;
use crate::db::LinguistDatabase;
use crate::input::catalog::{
    CatalogFile,
    parse_catalog_file,
};
use crate::types::SourcePosition;

/// Finds the source file a message was extracted from.
///
/// On a `<location>` element the target is that location; elsewhere in a
/// message it is the message's first location. Filenames are resolved
/// against the catalog's directory, as lupdate writes them.
pub fn find_definition(
    db: &dyn LinguistDatabase,
    file: CatalogFile,
    position: SourcePosition,
) -> Option<Location> {
    let parsed = parse_catalog_file(db, file).ok()?;
    let (_, message) = parsed.catalog.message_at(position)?;

    let location = message
        .locations
        .iter()
        .find(|location| location.range.contains(position))
        .or_else(|| message.locations.iter().find(|location| location.filename.is_some()))?;

    resolve_location(file.path(db), location)
}

/// Converts a `<location>` into an LSP location.
fn resolve_location(catalog_path: &Path, location: &SourceLocation) -> Option<Location> {
    let filename = location.filename.as_deref().filter(|name| !name.is_empty())?;
    let base = catalog_path.parent().unwrap_or_else(|| Path::new(""));
    let target = normalize_path(&base.join(filename));

    let Ok(uri) = Url::from_file_path(&target) else {
        tracing::warn!("Failed to create URI from file path: {}", target.display());
        return None;
    };

    let line = location.line.map_or(0, |line| line.saturating_sub(1));
    let position = Position { line, character: 0 };
    Some(Location { uri, range: Range { start: position, end: position } })
}

/// Removes `.` and `..` components without touching the file system.
fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}
