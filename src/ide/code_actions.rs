//! Code actions on catalog messages.

use std::collections::{
    HashMap,
    HashSet,
};

use tower_lsp::lsp_types::{
    CodeAction,
    CodeActionKind,
    CodeActionOrCommand,
    Position,
    Range,
    TextEdit,
    Url,
    WorkspaceEdit,
};

use crate::catalog::{
    Message,
    TranslationBody,
    TranslationKind,
    escape_text,
};
use crate::db::LinguistDatabase;
use crate::input::catalog::{
    CatalogFile,
    parse_catalog_file,
};
use crate::types::SourcePosition;

/// Generates the code actions available for the message at `position`.
///
/// - "Mark translation as finished" on an unfinished, non-empty translation
/// - "Copy source text into translation" on an empty translation
/// - "Use translation from context X" for every other context of the
///   catalog translating the same source differently
pub fn generate_code_actions(
    db: &dyn LinguistDatabase,
    file: CatalogFile,
    uri: &Url,
    position: SourcePosition,
) -> Vec<CodeActionOrCommand> {
    let Ok(parsed) = parse_catalog_file(db, file) else {
        return Vec::new();
    };
    let Some((context, message)) = parsed.catalog.message_at(position) else {
        return Vec::new();
    };
    if message.translation.kind.is_obsolete() {
        return Vec::new();
    }

    let mut actions = Vec::new();

    if message.translation.kind == TranslationKind::Unfinished
        && !message.translation.body.is_empty()
        && let Some(type_range) = message.ranges.translation_type
    {
        // The attribute is preceded by a single space
        let start = Position {
            line: type_range.start.line,
            character: type_range.start.character.saturating_sub(1),
        };
        let edit = TextEdit {
            range: Range { start, end: type_range.end.into() },
            new_text: String::new(),
        };
        actions.push(create_action("Mark translation as finished", uri, edit, true));
    }

    let is_text = matches!(message.translation.body, TranslationBody::Text(_));
    if is_text && message.translation.body.is_empty() && !message.source.is_empty() {
        let edit = translation_edit(message, &message.source);
        actions.push(create_action("Copy source text into translation", uri, edit, false));
    }

    if is_text {
        let current = message.translation.body.first_form();
        let mut offered = HashSet::new();
        for (other_context, other) in parsed.catalog.messages() {
            if other_context == context || other.source != message.source {
                continue;
            }
            let TranslationBody::Text(text) = &other.translation.body else {
                continue;
            };
            if !other.translation.is_usable() || text == current || !offered.insert(other_context)
            {
                continue;
            }
            let edit = translation_edit(message, text);
            let title = format!("Use translation from context \"{other_context}\"");
            actions.push(create_action(&title, uri, edit, false));
        }
    }

    actions
}

/// Edit replacing the translation text of `message` with `text`.
///
/// A self-closing `<translation/>` is rewritten as a full element.
pub(crate) fn translation_edit(message: &Message, text: &str) -> TextEdit {
    let ranges = &message.ranges;
    let self_closing = ranges.translation_text.start == ranges.translation.end
        && ranges.translation_text.end == ranges.translation.end;

    if self_closing {
        let kind = message
            .translation
            .kind
            .as_attribute()
            .map_or_else(String::new, |kind| format!(" type=\"{kind}\""));
        return TextEdit {
            range: ranges.translation.into(),
            new_text: format!("<translation{kind}>{}</translation>", escape_text(text)),
        };
    }

    TextEdit { range: ranges.translation_text.into(), new_text: escape_text(text).into_owned() }
}

/// Quick fix applying a single edit to the document.
fn create_action(title: &str, uri: &Url, edit: TextEdit, preferred: bool) -> CodeActionOrCommand {
    let mut changes = HashMap::new();
    changes.insert(uri.clone(), vec![edit]);

    CodeActionOrCommand::CodeAction(CodeAction {
        title: title.to_string(),
        kind: Some(CodeActionKind::QUICKFIX),
        diagnostics: None,
        edit: Some(WorkspaceEdit { changes: Some(changes), ..WorkspaceEdit::default() }),
        command: None,
        is_preferred: preferred.then_some(true),
        disabled: None,
        data: None,
    })
}
