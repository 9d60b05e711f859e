//! Integrity checks over a catalog.

use std::collections::HashMap;
use std::fmt;

use crate::catalog::locale::PluralRule;
use crate::catalog::model::{
    Catalog,
    Message,
    TranslationKind,
};

/// Translations that only hold a reminder for the translator.
const PLACEHOLDERS: &[&str] = &["TODO", "FIXME", "XXX", "...", "…"];

/// Kind of problem found by [`validate_catalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueKind {
    EmptySource,
    Untranslated,
    PlaceholderTranslation,
    Unfinished,
    DuplicateSource,
    ConflictingDuplicate,
    PlaceMarkerMismatch,
    AcceleratorMismatch,
    PunctuationMismatch,
    NumerusFormCount,
}

impl IssueKind {
    /// Stable identifier, used as diagnostic code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::EmptySource => "empty-source",
            Self::Untranslated => "untranslated",
            Self::PlaceholderTranslation => "placeholder-translation",
            Self::Unfinished => "unfinished",
            Self::DuplicateSource => "duplicate-source",
            Self::ConflictingDuplicate => "conflicting-duplicate",
            Self::PlaceMarkerMismatch => "place-marker-mismatch",
            Self::AcceleratorMismatch => "accelerator-mismatch",
            Self::PunctuationMismatch => "punctuation-mismatch",
            Self::NumerusFormCount => "numerus-form-count",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One problem, pointing at a message by its indices in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub kind: IssueKind,
    pub context_index: usize,
    pub message_index: usize,
    pub message: String,
}

/// Switches for the optional checks. Empty sources and duplicates are
/// always reported. `untranslated` also covers placeholder translations
/// such as `TODO`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct ValidationOptions {
    pub unfinished: bool,
    pub untranslated: bool,
    pub place_markers: bool,
    pub accelerators: bool,
    pub punctuation: bool,
    pub numerus_forms: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            unfinished: true,
            untranslated: true,
            place_markers: true,
            accelerators: true,
            punctuation: true,
            numerus_forms: true,
        }
    }
}

/// Runs every enabled check. Obsolete and vanished messages are skipped.
#[must_use]
pub fn validate_catalog(catalog: &Catalog, options: &ValidationOptions) -> Vec<Issue> {
    let rule = catalog.language.as_deref().map(PluralRule::for_language);
    let mut issues = Vec::new();

    for (context_index, context) in catalog.contexts.iter().enumerate() {
        let mut seen: HashMap<(&str, Option<&str>), &Message> = HashMap::new();

        for (message_index, message) in context.messages.iter().enumerate() {
            if message.translation.kind.is_obsolete() {
                continue;
            }
            let mut report = |kind, text: String| {
                issues.push(Issue { kind, context_index, message_index, message: text });
            };

            if message.source.is_empty() {
                report(IssueKind::EmptySource, "Source text is empty".to_string());
            }

            if let Some(first) = seen.get(&(message.source.as_str(), message.comment.as_deref())) {
                if first.translation.body == message.translation.body {
                    report(
                        IssueKind::DuplicateSource,
                        format!("'{}' already appears in context '{}'", message.source, context.name),
                    );
                } else {
                    report(
                        IssueKind::ConflictingDuplicate,
                        format!(
                            "'{}' already appears in context '{}' with the translation '{}'",
                            message.source,
                            context.name,
                            first.translation.body.first_form()
                        ),
                    );
                }
            } else {
                seen.insert((message.source.as_str(), message.comment.as_deref()), message);
            }

            match message.translation.kind {
                TranslationKind::Unfinished if options.unfinished => {
                    report(IssueKind::Unfinished, "Translation is marked unfinished".to_string());
                }
                TranslationKind::Finished if message.translation.body.is_empty() => {
                    if options.untranslated {
                        report(IssueKind::Untranslated, "Translation is empty".to_string());
                    }
                }
                TranslationKind::Finished => {
                    check_finished(message, rule, options, &mut report);
                }
                _ => {}
            }
        }
    }

    issues
}

/// Checks that only apply to finished, non-empty translations.
fn check_finished(
    message: &Message,
    rule: Option<PluralRule>,
    options: &ValidationOptions,
    report: &mut impl FnMut(IssueKind, String),
) {
    let forms = message.translation.body.forms();

    if options.untranslated && forms.iter().any(|form| is_placeholder(&message.source, form)) {
        report(
            IssueKind::PlaceholderTranslation,
            format!("Translation '{}' is a placeholder", message.translation.body.first_form()),
        );
    }

    if options.place_markers {
        let mut expected = place_markers(&message.source);
        if message.numerus {
            expected.retain(|marker| marker != "%n");
        }
        for form in &forms {
            let mut found = place_markers(form);
            if message.numerus {
                found.retain(|marker| marker != "%n");
            }
            if found != expected {
                report(
                    IssueKind::PlaceMarkerMismatch,
                    format!(
                        "Place markers differ: source has [{}], translation has [{}]",
                        expected.join(", "),
                        found.join(", ")
                    ),
                );
                break;
            }
        }
    }

    if options.accelerators {
        let in_source = has_accelerator(&message.source);
        if forms.iter().any(|form| has_accelerator(form) != in_source) {
            let text = if in_source {
                "Source has an accelerator (&) but the translation does not"
            } else {
                "Translation has an accelerator (&) but the source does not"
            };
            report(IssueKind::AcceleratorMismatch, text.to_string());
        }
    }

    if options.punctuation {
        let expected = ending(&message.source);
        if forms.iter().any(|form| ending(form) != expected) {
            report(
                IssueKind::PunctuationMismatch,
                "Ending punctuation differs between source and translation".to_string(),
            );
        }
    }

    if options.numerus_forms
        && message.numerus
        && let Some(rule) = rule
        && forms.len() != rule.form_count()
    {
        report(
            IssueKind::NumerusFormCount,
            format!("Expected {} plural forms, found {}", rule.form_count(), forms.len()),
        );
    }
}

/// True when a translation only holds a reminder such as `TODO`.
#[must_use]
pub fn is_placeholder(source: &str, translation: &str) -> bool {
    let translation = translation.trim();
    PLACEHOLDERS.contains(&translation) && translation != source.trim()
}

/// Sorted place markers of a string: `%1`..`%99`, `%L1`, `%n`, `%s`, `%d`.
///
/// `%%` is a literal percent sign.
#[must_use]
pub fn place_markers(text: &str) -> Vec<String> {
    let mut markers = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some((start, ch)) = chars.next() {
        if ch != '%' {
            continue;
        }
        if chars.next_if(|&(_, next)| next == '%').is_some() {
            continue;
        }
        chars.next_if(|&(_, next)| next == 'L');

        let mut end = start + 1;
        let mut digits = 0;
        while digits < 2
            && let Some((index, digit)) = chars.next_if(|&(_, next)| next.is_ascii_digit())
        {
            end = index + digit.len_utf8();
            digits += 1;
        }
        if digits == 0 {
            if let Some((index, letter)) = chars.next_if(|&(_, next)| matches!(next, 'n' | 's' | 'd')) {
                end = index + letter.len_utf8();
            } else {
                continue;
            }
        }

        let marker = text.get(start..end).unwrap_or_default().replacen("%L", "%", 1);
        if marker != "%0" && marker != "%00" {
            markers.push(marker);
        }
    }

    markers.sort();
    markers
}

/// Whether the text carries a keyboard accelerator (`&File`).
///
/// `&&` is a literal ampersand and entity-like sequences such as
/// `&quot;` or `&#39;` do not count.
#[must_use]
pub fn has_accelerator(text: &str) -> bool {
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '&' {
            continue;
        }
        let Some(next) = chars.next() else {
            return false;
        };
        if next == '&' || next.is_whitespace() || next.is_control() {
            continue;
        }
        if !next.is_ascii_alphabetic() && next != '#' {
            return true;
        }

        let mut name = 0;
        while chars.next_if(char::is_ascii_alphanumeric).is_some() {
            name += 1;
        }
        if name == 0 || chars.peek() != Some(&';') {
            return true;
        }
    }
    false
}

/// Ending punctuation of a string, ignoring trailing whitespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ending {
    None,
    FullStop,
    Ellipsis,
    Colon,
    Exclamation,
    Question,
}

fn ending(text: &str) -> Ending {
    let text = text.trim_end();
    match text.chars().last() {
        Some('.') if text.ends_with("...") => Ending::Ellipsis,
        Some('…') => Ending::Ellipsis,
        Some('.' | '。') => Ending::FullStop,
        Some(':' | '：') => Ending::Colon,
        Some('!' | '！') => Ending::Exclamation,
        Some('?' | '？') => Ending::Question,
        _ => Ending::None,
    }
}
