//! Loading catalogs from disk and translating with them.

#![allow(clippy::unwrap_used)]
#![allow(missing_docs)]

use std::fs;

use pretty_assertions::assert_eq;
use qt_linguist_language_server::catalog::{
    Translator,
    TranslatorChain,
    parse_catalog,
    write_catalog,
};
use rstest::rstest;
use tempfile::TempDir;

const PATCHANCE_FR: &str = include_str!("fixtures/patchance_fr.ts");

fn message_tuples(text: &str) -> Vec<(String, String, String, bool)> {
    let catalog = parse_catalog(text).unwrap().catalog;
    catalog
        .messages()
        .map(|(context, message)| {
            (
                context.to_string(),
                message.source.clone(),
                message.translation.body.forms().join("|"),
                !message.translation.is_usable(),
            )
        })
        .collect()
}

#[rstest]
fn test_fixture_survives_rewrite() {
    let rewritten = write_catalog(&parse_catalog(PATCHANCE_FR).unwrap().catalog);

    assert_eq!(rewritten, PATCHANCE_FR);
    assert_eq!(message_tuples(&rewritten), message_tuples(PATCHANCE_FR));
}

#[rstest]
#[case::exact("fr_FR.UTF-8")]
#[case::language_only("fr")]
fn test_chain_loads_catalog_for_locale(#[case] locale: &str) {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("patchance_fr.ts"), PATCHANCE_FR).unwrap();

    let mut chain = TranslatorChain::new();
    let found = chain.load(dir.path(), "patchance", "_", locale).unwrap();

    assert!(found);
    assert_eq!(chain.translate("MainWindow", "toolBar", None), "Barre d'outils");
    assert_eq!(chain.translate("MainWindow", "Unknown text", None), "Unknown text");
}

#[rstest]
fn test_chain_without_catalog_is_unchanged() {
    let dir = TempDir::new().unwrap();

    let mut chain = TranslatorChain::new();
    let found = chain.load(dir.path(), "patchance", "_", "de_DE").unwrap();

    assert!(!found);
    assert!(chain.is_empty());
}

#[rstest]
fn test_later_translator_wins() {
    let dir = TempDir::new().unwrap();
    let override_path = dir.path().join("override_fr.ts");
    fs::write(
        &override_path,
        "<TS version=\"2.1\" language=\"fr\"><context><name>MainWindow</name><message><source>toolBar</source><translation>Outils</translation></message></context></TS>",
    )
    .unwrap();
    let fixture_path = dir.path().join("patchance_fr.ts");
    fs::write(&fixture_path, PATCHANCE_FR).unwrap();

    let mut chain = TranslatorChain::new();
    chain.install(Translator::load(&fixture_path).unwrap());
    chain.install(Translator::load(&override_path).unwrap());

    assert_eq!(chain.translate("MainWindow", "toolBar", None), "Outils");
    chain.uninstall_last();
    assert_eq!(chain.translate("MainWindow", "toolBar", None), "Barre d'outils");
}
