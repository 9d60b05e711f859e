//! Completion implementation

use std::collections::HashSet;

use tower_lsp::lsp_types::{
    CompletionItem,
    CompletionItemKind,
    CompletionTextEdit,
    Documentation,
    MarkupContent,
    MarkupKind,
};

use crate::catalog::{
    Message,
    TranslationBody,
};
use crate::db::LinguistDatabase;
use crate::ide::code_actions::translation_edit;
use crate::input::catalog::{
    CatalogFile,
    catalog_language,
    parse_catalog_file,
};
use crate::types::SourcePosition;

/// A finished translation of the same source found elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
struct MemoryEntry {
    text: String,
    context: String,
    catalog: String,
}

/// Generates completion items inside a `<translation>` element.
///
/// Candidates are the finished translations of the same source text in
/// any context of the catalogs sharing the document's language, followed
/// by the source text itself.
pub fn generate_completions(
    db: &dyn LinguistDatabase,
    file: CatalogFile,
    position: SourcePosition,
    catalogs: &[CatalogFile],
) -> Vec<CompletionItem> {
    let Ok(parsed) = parse_catalog_file(db, file) else {
        return Vec::new();
    };
    let Some((context, message)) = parsed.catalog.message_at(position) else {
        return Vec::new();
    };
    if message.numerus || !message.ranges.translation.contains(position) {
        return Vec::new();
    }

    let memory = translation_memory(db, file, context, message, catalogs);
    let mut completion_items = Vec::with_capacity(memory.len() + 1);

    for (index, entry) in memory.iter().enumerate() {
        completion_items.push(CompletionItem {
            label: entry.text.clone(),
            kind: Some(CompletionItemKind::TEXT),
            detail: Some(format!("Translation memory: {}", entry.context)),
            documentation: Some(Documentation::MarkupContent(MarkupContent {
                kind: MarkupKind::Markdown,
                value: format!("Used in context `{}` of **{}**", entry.context, entry.catalog),
            })),
            sort_text: Some(format!("0{index:04}")),
            text_edit: Some(CompletionTextEdit::Edit(translation_edit(message, &entry.text))),
            ..Default::default()
        });
    }

    if !message.source.is_empty() && !memory.iter().any(|entry| entry.text == message.source) {
        completion_items.push(CompletionItem {
            label: message.source.clone(),
            kind: Some(CompletionItemKind::TEXT),
            detail: Some("Source text".to_string()),
            sort_text: Some("1".to_string()),
            text_edit: Some(CompletionTextEdit::Edit(translation_edit(message, &message.source))),
            ..Default::default()
        });
    }

    completion_items
}

/// Collects distinct finished translations of `message.source`, in
/// catalog then document order, excluding the message itself.
fn translation_memory(
    db: &dyn LinguistDatabase,
    file: CatalogFile,
    context: &str,
    message: &Message,
    catalogs: &[CatalogFile],
) -> Vec<MemoryEntry> {
    let language = catalog_language(db, file);
    let mut seen = HashSet::new();
    let mut memory = Vec::new();

    for catalog in catalogs {
        if catalog_language(db, *catalog) != language {
            continue;
        }
        let Ok(parsed) = parse_catalog_file(db, *catalog) else {
            continue;
        };
        for (other_context, other) in parsed.catalog.messages() {
            let is_self = *catalog == file
                && other_context == context
                && other.comment == message.comment;
            if is_self || other.source != message.source || !other.translation.is_usable() {
                continue;
            }
            let TranslationBody::Text(text) = &other.translation.body else {
                continue;
            };
            if seen.insert(text.clone()) {
                memory.push(MemoryEntry {
                    text: text.clone(),
                    context: other_context.to_string(),
                    catalog: catalog.label(db),
                });
            }
        }
    }

    memory
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::panic)]
mod tests {
    use googletest::prelude::*;
    use rstest::*;

    use super::*;
    use crate::db::LinguistDatabaseImpl;
    use crate::test_utils::{
        catalog_file,
        catalog_text,
    };

    /// Position inside the `<translation>` of the first message.
    const IN_TRANSLATION: SourcePosition = SourcePosition { line: 7, character: 22 };

    fn labels(items: &[CompletionItem]) -> Vec<String> {
        items.iter().map(|item| item.label.clone()).collect()
    }

    #[rstest]
    fn completions_offer_memory_then_source() {
        let db = LinguistDatabaseImpl::default();
        let current =
            catalog_file(&db, "/ws/app_fr.ts", &catalog_text("fr", "Dialog", &[("Save", "", false)]));
        let other = catalog_file(
            &db,
            "/ws/tools_fr.ts",
            &catalog_text(
                "fr",
                "MainWindow",
                &[("Save", "Enregistrer", false), ("Save", "Sauver", true), ("Open", "Ouvrir", false)],
            ),
        );
        let german =
            catalog_file(&db, "/ws/app_de.ts", &catalog_text("de", "Dialog", &[("Save", "Speichern", false)]));

        let items = generate_completions(&db, current, IN_TRANSLATION, &[current, other, german]);

        assert_that!(labels(&items), elements_are![eq("Enregistrer"), eq("Save")]);
        assert_that!(items[0].detail.clone().unwrap(), eq("Translation memory: MainWindow"));
        assert_that!(items[1].detail.clone().unwrap(), eq("Source text"));
    }

    #[rstest]
    fn completion_edit_replaces_translation_text() {
        let db = LinguistDatabaseImpl::default();
        let current = catalog_file(
            &db,
            "/ws/app_fr.ts",
            &catalog_text("fr", "Dialog", &[("Fish &amp; Chips", "Poisson", true)]),
        );

        let items = generate_completions(&db, current, IN_TRANSLATION, &[current]);

        let Some(CompletionTextEdit::Edit(edit)) = items[0].text_edit.clone() else {
            panic!("expected a text edit");
        };
        assert_that!(edit.new_text, eq("Fish &amp; Chips"));
        assert_that!(edit.range.start.character, eq(39));
        assert_that!(edit.range.end.character, eq(46));
    }

    #[rstest]
    fn no_completions_outside_translation() {
        let db = LinguistDatabaseImpl::default();
        let current =
            catalog_file(&db, "/ws/app_fr.ts", &catalog_text("fr", "Dialog", &[("Save", "", false)]));

        let items =
            generate_completions(&db, current, SourcePosition { line: 6, character: 18 }, &[current]);

        assert_that!(items, len(eq(0)));
    }
}
