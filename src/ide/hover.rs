//! Hover implementation

use std::cmp::Ordering;
use std::fmt::Write as _;

use crate::catalog::{
    Message,
    TranslationKind,
};
use crate::db::LinguistDatabase;
use crate::input::catalog::{
    CatalogFile,
    parse_catalog_file,
};
use crate::interned::MessageKey;

/// Separator between numerus forms on one line.
const FORM_SEPARATOR: &str = " | ";

/// Generates hover content for a message: its translation in every
/// indexed catalog.
///
/// # Sort order
/// 1. `current_language` (when set)
/// 2. `primary_languages` (in configured order)
/// 3. others (alphabetical)
pub fn generate_hover_content(
    db: &dyn LinguistDatabase,
    key: MessageKey<'_>,
    catalogs: &[CatalogFile],
    current_language: Option<&str>,
    primary_languages: Option<&[String]>,
) -> Option<String> {
    let context = key.context(db);
    let source = key.source(db);
    let comment = key.comment(db).as_deref();

    let mut translations_found = Vec::new();
    let mut extra_comment = None;
    for file in catalogs {
        let Ok(parsed) = parse_catalog_file(db, *file) else {
            continue;
        };
        let Some(message) = parsed.catalog.find(context, source, comment) else {
            continue;
        };
        if extra_comment.is_none() {
            extra_comment.clone_from(&message.extra_comment);
        }
        translations_found.push((file.label(db), format_translation(message)));
    }

    if translations_found.is_empty() {
        return None;
    }

    let mut content = format!("**Context:** `{context}`\n\n**Source:** {source}\n\n");
    if let Some(comment) = comment.filter(|c| !c.is_empty()) {
        let _ = writeln!(content, "*Disambiguation:* {comment}\n");
    }
    if let Some(extra_comment) = extra_comment.filter(|c| !c.is_empty()) {
        let _ = writeln!(content, "*Developer comment:* {extra_comment}\n");
    }

    sort_by_language_priority(&mut translations_found, current_language, primary_languages);

    for (language, value) in translations_found {
        let _ = writeln!(content, "**{language}**{value}");
    }

    Some(content)
}

/// Status suffix and text of one translation, e.g. ` (unfinished): Aide`.
fn format_translation(message: &Message) -> String {
    let translation = &message.translation;
    let status = match translation.kind {
        TranslationKind::Finished if translation.body.is_empty() => Some("untranslated"),
        TranslationKind::Finished => None,
        TranslationKind::Unfinished => Some("unfinished"),
        TranslationKind::Vanished | TranslationKind::Obsolete => Some("obsolete"),
    };

    let mut line = status.map_or_else(String::new, |status| format!(" ({status})"));
    if !translation.body.is_empty() {
        let _ = write!(line, ": {}", translation.body.forms().join(FORM_SEPARATOR));
    }
    if let Some(note) = message.translator_comment.as_deref().filter(|c| !c.is_empty()) {
        let _ = write!(line, " _({note})_");
    }
    line
}

/// Sorts `(language, value)` pairs by language priority.
///
/// Order:
/// 1. `current_language` (when set)
/// 2. `primary_languages` (in configured order)
/// 3. others (alphabetical)
pub(crate) fn sort_by_language_priority<T>(
    entries: &mut [(String, T)],
    current_language: Option<&str>,
    primary_languages: Option<&[String]>,
) {
    entries.sort_by(|a, b| {
        let priority_a = get_language_priority(&a.0, current_language, primary_languages);
        let priority_b = get_language_priority(&b.0, current_language, primary_languages);

        match (priority_a, priority_b) {
            (LanguagePriority::Current, LanguagePriority::Current) => Ordering::Equal,
            (LanguagePriority::Current, _) => Ordering::Less,
            (_, LanguagePriority::Current) => Ordering::Greater,
            (LanguagePriority::Primary(a_idx), LanguagePriority::Primary(b_idx)) => {
                a_idx.cmp(&b_idx)
            }
            (LanguagePriority::Primary(_), _) => Ordering::Less,
            (_, LanguagePriority::Primary(_)) => Ordering::Greater,
            (LanguagePriority::Other(a_lang), LanguagePriority::Other(b_lang)) => {
                a_lang.cmp(b_lang)
            }
        }
    });
}

/// Language priority for sorting
#[derive(Debug, Clone, PartialEq, Eq)]
enum LanguagePriority<'a> {
    /// Current language (highest priority)
    Current,
    /// Primary language with its position index
    Primary(usize),
    /// Other language (sorted alphabetically)
    Other(&'a str),
}

/// Priority of one language.
fn get_language_priority<'a>(
    lang: &'a str,
    current_language: Option<&str>,
    primary_languages: Option<&[String]>,
) -> LanguagePriority<'a> {
    if current_language.is_some_and(|c| c == lang) {
        return LanguagePriority::Current;
    }

    if let Some(primaries) = primary_languages
        && let Some(pos) = primaries.iter().position(|p| p == lang)
    {
        return LanguagePriority::Primary(pos);
    }

    LanguagePriority::Other(lang)
}
