//! Catalog file input and the queries derived from it.

use std::path::PathBuf;

use crate::catalog::locale::detect_language_from_path;
use crate::catalog::{
    CatalogError,
    ParsedCatalog,
    parse_catalog,
};
use crate::db::LinguistDatabase;
use crate::interned::MessageKey;
use crate::types::SourcePosition;

/// Salsa input holding the text of one `.ts` catalog.
#[salsa::input(debug)]
pub struct CatalogFile {
    #[returns(ref)]
    pub path: PathBuf,

    #[returns(ref)]
    pub text: String,
}

/// Parses the catalog text. Re-runs only when the text changes.
#[salsa::tracked]
pub fn parse_catalog_file(
    db: &dyn LinguistDatabase,
    file: CatalogFile,
) -> Result<ParsedCatalog, CatalogError> {
    let result = parse_catalog(file.text(db));
    if let Err(error) = &result {
        tracing::debug!(path = %file.path(db).display(), %error, "Catalog failed to parse");
    }
    result
}

/// Target language of the catalog: the `language` attribute of `<TS>`,
/// else a locale code found in the file path.
#[salsa::tracked]
pub fn catalog_language(db: &dyn LinguistDatabase, file: CatalogFile) -> Option<String> {
    parse_catalog_file(db, file)
        .ok()
        .and_then(|parsed| parsed.catalog.language)
        .filter(|language| !language.is_empty())
        .or_else(|| detect_language_from_path(file.path(db)))
}

/// Identity of the message whose element contains the position.
#[salsa::tracked]
pub fn message_key_at_position(
    db: &dyn LinguistDatabase,
    file: CatalogFile,
    position: SourcePosition,
) -> Option<MessageKey<'_>> {
    let parsed = parse_catalog_file(db, file).ok()?;
    let (context, message) = parsed.catalog.message_at(position)?;
    Some(MessageKey::new(db, context.to_string(), message.source.clone(), message.comment.clone()))
}

impl CatalogFile {
    /// Human-readable label: the language when known, else the file name.
    pub fn label(self, db: &dyn LinguistDatabase) -> String {
        catalog_language(db, self).unwrap_or_else(|| {
            self.path(db)
                .file_name()
                .map_or_else(String::new, |name| name.to_string_lossy().to_string())
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::path::PathBuf;

    use googletest::prelude::*;
    use rstest::*;
    use salsa::Setter;

    use super::*;
    use crate::db::LinguistDatabaseImpl;
    use crate::test_utils::{
        PATCHANCE_FR,
        catalog_file,
    };

    #[rstest]
    fn parse_catalog_file_reads_fixture() {
        let db = LinguistDatabaseImpl::default();
        let file = catalog_file(&db, "/ws/locale/patchance_fr.ts", PATCHANCE_FR);

        let parsed = parse_catalog_file(&db, file).unwrap();

        assert_that!(parsed.catalog.contexts.len(), eq(3));
        assert_eq!(catalog_language(&db, file).as_deref(), Some("fr"));
    }

    #[rstest]
    fn catalog_language_falls_back_to_path() {
        let db = LinguistDatabaseImpl::default();
        let file = catalog_file(
            &db,
            "/ws/locale/patchance_de.ts",
            "<?xml version=\"1.0\"?>\n<TS version=\"2.1\">\n</TS>\n",
        );

        assert_eq!(catalog_language(&db, file).as_deref(), Some("de"));
        assert_that!(file.label(&db), eq("de"));
    }

    #[rstest]
    fn label_uses_file_name_without_language() {
        let db = LinguistDatabaseImpl::default();
        let file = catalog_file(&db, "/ws/broken.ts", "<TS>");

        assert!(parse_catalog_file(&db, file).is_err());
        assert_that!(file.label(&db), eq("broken.ts"));
    }

    #[rstest]
    fn message_key_at_position_finds_message() {
        let db = LinguistDatabaseImpl::default();
        let file = catalog_file(&db, "/ws/patchance_fr.ts", PATCHANCE_FR);
        let parsed = parse_catalog_file(&db, file).unwrap();
        let message = &parsed.catalog.contexts[0].messages[0];

        let key = message_key_at_position(&db, file, message.ranges.source.start).unwrap();

        assert_eq!(key.context(&db), &parsed.catalog.contexts[0].name);
        assert_eq!(key.source(&db), &message.source);
        assert!(message_key_at_position(&db, file, SourcePosition::default()).is_none());
    }

    #[rstest]
    fn parse_result_follows_text_changes() {
        let mut db = LinguistDatabaseImpl::default();
        let file = CatalogFile::new(&db, PathBuf::from("/ws/app_fr.ts"), "<TS>".to_string());
        assert!(parse_catalog_file(&db, file).is_err());

        file.set_text(&mut db).to("<TS version=\"2.1\" language=\"fr\"></TS>".to_string());

        assert!(parse_catalog_file(&db, file).is_ok());
    }
}
