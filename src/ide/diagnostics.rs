//! Diagnostics for catalog documents.

use tower_lsp::lsp_types::{
    Diagnostic,
    DiagnosticSeverity,
    NumberOrString,
    Position,
    Range,
};

use crate::catalog::{
    CatalogError,
    Issue,
    IssueKind,
    Message,
    ValidationOptions,
    validate_catalog,
};
use crate::db::LinguistDatabase;
use crate::input::catalog::{
    CatalogFile,
    parse_catalog_file,
};
use crate::types::{
    LineIndex,
    SourcePosition,
    SourceRange,
};

/// Value of `Diagnostic::source`.
pub const DIAGNOSTIC_SOURCE: &str = "qt-linguist";

/// Generates the diagnostics of a catalog.
///
/// A document that does not parse gets a single error at the failure
/// position. Otherwise every issue found by the catalog checks becomes a
/// diagnostic on the part of the message it concerns.
pub fn generate_diagnostics(
    db: &dyn LinguistDatabase,
    file: CatalogFile,
    options: &ValidationOptions,
) -> Vec<Diagnostic> {
    tracing::debug!("Generating diagnostics for catalog '{}'", file.path(db).display());

    let parsed = match parse_catalog_file(db, file) {
        Ok(parsed) => parsed,
        Err(error) => return vec![parse_error_diagnostic(file.text(db), &error)],
    };

    validate_catalog(&parsed.catalog, options)
        .into_iter()
        .filter_map(|issue| {
            let message = parsed
                .catalog
                .contexts
                .get(issue.context_index)?
                .messages
                .get(issue.message_index)?;
            Some(issue_diagnostic(&issue, message))
        })
        .collect()
}

/// Error diagnostic for a document that failed to parse.
fn parse_error_diagnostic(text: &str, error: &CatalogError) -> Diagnostic {
    let range = match error {
        CatalogError::Xml { position, .. }
        | CatalogError::MissingElement { position, .. }
        | CatalogError::UnexpectedElement { position, .. }
        | CatalogError::UnexpectedText { position, .. } => line_range(text, *position),
        _ => Range::default(),
    };

    Diagnostic {
        range,
        severity: Some(DiagnosticSeverity::ERROR),
        code: Some(NumberOrString::String("parse-error".to_string())),
        source: Some(DIAGNOSTIC_SOURCE.to_string()),
        message: error.to_string(),
        ..Diagnostic::default()
    }
}

/// Range from the position to the end of its line.
fn line_range(text: &str, position: SourcePosition) -> Range {
    let index = LineIndex::new(text);
    let line_end = text
        .lines()
        .nth(position.line as usize)
        .map_or(position.character, |line| {
            u32::try_from(line.encode_utf16().count()).unwrap_or(u32::MAX)
        });
    let start = index.offset(text, position).map_or(position, |offset| index.position(text, offset));
    Range {
        start: start.into(),
        end: Position { line: start.line, character: line_end.max(start.character) },
    }
}

/// Converts a catalog issue into a diagnostic.
fn issue_diagnostic(issue: &Issue, message: &Message) -> Diagnostic {
    Diagnostic {
        range: issue_range(issue.kind, message).into(),
        severity: Some(severity(issue.kind)),
        code: Some(NumberOrString::String(issue.kind.code().to_string())),
        source: Some(DIAGNOSTIC_SOURCE.to_string()),
        message: issue.message.clone(),
        ..Diagnostic::default()
    }
}

/// Empty sources and conflicting duplicates break lookups; the rest are advisory.
const fn severity(kind: IssueKind) -> DiagnosticSeverity {
    match kind {
        IssueKind::EmptySource | IssueKind::ConflictingDuplicate => DiagnosticSeverity::ERROR,
        IssueKind::Unfinished => DiagnosticSeverity::INFORMATION,
        IssueKind::Untranslated
        | IssueKind::PlaceholderTranslation
        | IssueKind::DuplicateSource
        | IssueKind::PlaceMarkerMismatch
        | IssueKind::AcceleratorMismatch
        | IssueKind::PunctuationMismatch
        | IssueKind::NumerusFormCount => DiagnosticSeverity::WARNING,
    }
}

/// The part of the message an issue points at.
fn issue_range(kind: IssueKind, message: &Message) -> SourceRange {
    let ranges = &message.ranges;
    match kind {
        IssueKind::EmptySource | IssueKind::DuplicateSource | IssueKind::ConflictingDuplicate => {
            ranges.source
        }
        IssueKind::Unfinished => ranges.translation_type.unwrap_or(ranges.translation),
        IssueKind::Untranslated
        | IssueKind::PlaceholderTranslation
        | IssueKind::PlaceMarkerMismatch
        | IssueKind::AcceleratorMismatch
        | IssueKind::PunctuationMismatch
        | IssueKind::NumerusFormCount => ranges.translation,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use rstest::*;

    use super::*;
    use crate::db::LinguistDatabaseImpl;
    use crate::test_utils::{
        PATCHANCE_FR,
        catalog_file,
        catalog_text,
    };

    /// Diagnostic codes in order.
    fn codes(diagnostics: &[Diagnostic]) -> Vec<String> {
        diagnostics
            .iter()
            .filter_map(|d| match &d.code {
                Some(NumberOrString::String(code)) => Some(code.clone()),
                _ => None,
            })
            .collect()
    }

    #[rstest]
    fn fixture_reports_only_the_empty_translation() {
        let db = LinguistDatabaseImpl::default();
        let file = catalog_file(&db, "/ws/patchance_fr.ts", PATCHANCE_FR);

        let diagnostics = generate_diagnostics(&db, file, &ValidationOptions::default());

        assert_that!(codes(&diagnostics), elements_are![eq("untranslated")]);
        assert_eq!(diagnostics[0].severity, Some(DiagnosticSeverity::WARNING));
        assert_that!(diagnostics[0].message, contains_substring("empty"));
    }

    #[rstest]
    fn unfinished_translation_points_at_type_attribute() {
        let db = LinguistDatabaseImpl::default();
        let text = catalog_text("fr", "MainWindow", &[("Save", "Enregistrer", true)]);
        let file = catalog_file(&db, "/ws/app_fr.ts", &text);

        let diagnostics = generate_diagnostics(&db, file, &ValidationOptions::default());

        assert_that!(codes(&diagnostics), elements_are![eq("unfinished")]);
        assert_eq!(diagnostics[0].severity, Some(DiagnosticSeverity::INFORMATION));
        assert_eq!(
            diagnostics[0].range,
            Range {
                start: Position { line: 7, character: 21 },
                end: Position { line: 7, character: 38 },
            }
        );
    }

    #[rstest]
    fn conflicting_duplicate_is_an_error_on_the_source() {
        let db = LinguistDatabaseImpl::default();
        let text = catalog_text(
            "fr",
            "MainWindow",
            &[("Save", "Enregistrer", false), ("Save", "Sauvegarder", false)],
        );
        let file = catalog_file(&db, "/ws/app_fr.ts", &text);

        let diagnostics = generate_diagnostics(&db, file, &ValidationOptions::default());

        assert_that!(codes(&diagnostics), elements_are![eq("conflicting-duplicate")]);
        assert_eq!(diagnostics[0].severity, Some(DiagnosticSeverity::ERROR));
        assert_eq!(diagnostics[0].range.start, Position { line: 10, character: 16 });
    }

    #[rstest]
    fn disabled_checks_are_not_reported() {
        let db = LinguistDatabaseImpl::default();
        let text = catalog_text("fr", "MainWindow", &[("Save", "Enregistrer", true)]);
        let file = catalog_file(&db, "/ws/app_fr.ts", &text);
        let options = ValidationOptions { unfinished: false, ..ValidationOptions::default() };

        assert_that!(generate_diagnostics(&db, file, &options), len(eq(0)));
    }

    #[rstest]
    fn malformed_document_yields_one_parse_error() {
        let db = LinguistDatabaseImpl::default();
        let text = "<TS version=\"2.1\">\n<context>\n    <name>A</name>\n</TS>\n";
        let file = catalog_file(&db, "/ws/app_fr.ts", text);

        let diagnostics = generate_diagnostics(&db, file, &ValidationOptions::default());

        assert_that!(codes(&diagnostics), elements_are![eq("parse-error")]);
        assert_eq!(diagnostics[0].severity, Some(DiagnosticSeverity::ERROR));
        assert_eq!(diagnostics[0].source.as_deref(), Some(DIAGNOSTIC_SOURCE));
        assert_that!(diagnostics[0].message, contains_substring("Malformed XML"));
    }
}
