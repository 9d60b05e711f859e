//! Helpers shared by the unit tests.
#![cfg(test)]

use std::path::PathBuf;

use crate::db::LinguistDatabaseImpl;
use crate::input::catalog::CatalogFile;

/// The French Patchance catalog used as the main fixture.
pub(crate) const PATCHANCE_FR: &str = include_str!("../tests/fixtures/patchance_fr.ts");

/// Creates a `CatalogFile` input for the given path and text.
pub(crate) fn catalog_file(db: &LinguistDatabaseImpl, path: &str, text: &str) -> CatalogFile {
    CatalogFile::new(db, PathBuf::from(path), text.to_string())
}

/// Builds a minimal catalog document with one context.
///
/// Each message is `(source, translation, unfinished)`.
pub(crate) fn catalog_text(language: &str, context: &str, messages: &[(&str, &str, bool)]) -> String {
    let mut text = format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<!DOCTYPE TS>\n<TS version=\"2.1\" language=\"{language}\">\n<context>\n    <name>{context}</name>\n"
    );
    for (source, translation, unfinished) in messages {
        let kind = if *unfinished { " type=\"unfinished\"" } else { "" };
        text.push_str(&format!(
            "    <message>\n        <source>{source}</source>\n        <translation{kind}>{translation}</translation>\n    </message>\n"
        ));
    }
    text.push_str("</context>\n</TS>\n");
    text
}
