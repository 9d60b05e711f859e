//! Translation catalog data model (Qt Linguist TS format, version 2.1).

use std::fmt;
use std::str::FromStr;

use crate::catalog::error::CatalogError;
use crate::types::SourceRange;

/// A translation catalog: an ordered list of contexts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Catalog {
    /// `version` attribute of the `TS` element (lupdate writes `2.1`).
    pub version: Option<String>,
    /// `sourcelanguage` attribute.
    pub source_language: Option<String>,
    /// `language` attribute (locale code such as `fr` or `pt_BR`).
    pub language: Option<String>,
    /// Qt 4 `<defaultcodec>`.
    pub default_codec: Option<String>,
    /// `catalog` attribute of each `<dependency>`.
    pub dependencies: Vec<String>,
    /// How `<location>` elements are written.
    pub location_mode: LocationMode,
    pub extras: Vec<Extra>,
    pub contexts: Vec<Context>,
}

/// lupdate's `-locations` modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LocationMode {
    /// `filename` and `line` on every location.
    #[default]
    Absolute,
    /// File names only when they change within a context, line numbers as
    /// offsets from the previous location of the same file (`line="+12"`).
    Relative,
}

/// An `extra-*` element, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Extra {
    /// Full element name, `extra-po-flags` for instance.
    pub name: String,
    pub content: String,
}

/// A named group of messages belonging to one UI surface.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Context {
    pub name: String,
    /// Context-level `<comment>`.
    pub comment: Option<String>,
    pub messages: Vec<Message>,
    pub extras: Vec<Extra>,
}

/// A translatable string and its translation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Message {
    pub id: Option<String>,
    /// `numerus="yes"`: the translation holds plural forms.
    pub numerus: bool,
    pub locations: Vec<Location>,
    pub source: String,
    pub old_source: Option<String>,
    /// Disambiguation comment.
    pub comment: Option<String>,
    pub old_comment: Option<String>,
    /// Comment written by the developer for translators.
    pub extra_comment: Option<String>,
    pub translator_comment: Option<String>,
    pub translation: Translation,
    /// Opaque `<userdata>` of the message.
    pub userdata: Option<String>,
    pub extras: Vec<Extra>,
    /// Positions in the document the message was parsed from.
    pub ranges: MessageRanges,
}

/// Advisory pointer to where the source string was extracted from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    pub filename: Option<String>,
    pub line: Option<u32>,
    pub range: SourceRange,
}

/// Translation of a message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Translation {
    pub kind: TranslationKind,
    pub body: TranslationBody,
    /// `<lengthvariant>`s of each form, longest first, parallel to
    /// [`TranslationBody::forms`]. Empty for forms written as plain text.
    /// The body holds the first variant.
    pub length_variants: Vec<Vec<String>>,
}

/// Value of the `type` attribute of `<translation>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TranslationKind {
    /// No `type` attribute.
    #[default]
    Finished,
    Unfinished,
    /// The source string disappeared from the sources (lupdate, new style).
    Vanished,
    /// The source string disappeared from the sources (lupdate, old style).
    Obsolete,
}

/// Content of `<translation>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationBody {
    Text(String),
    /// One `<numerusform>` per plural form.
    Numerus(Vec<String>),
}

/// Document ranges of the parts of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MessageRanges {
    /// From `<message` to `</message>`.
    pub message: SourceRange,
    /// The text between `<source>` and `</source>`.
    pub source: SourceRange,
    /// From `<translation` to `</translation>`.
    pub translation: SourceRange,
    /// The text between `<translation ...>` and `</translation>`.
    pub translation_text: SourceRange,
    /// The `type="..."` attribute, when present.
    pub translation_type: Option<SourceRange>,
}

/// Uniquely identifies a message inside a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId {
    pub context: String,
    pub source: String,
    pub comment: Option<String>,
}

impl Default for TranslationBody {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl TranslationKind {
    /// Attribute value, or `None` for finished translations.
    #[must_use]
    pub const fn as_attribute(self) -> Option<&'static str> {
        match self {
            Self::Finished => None,
            Self::Unfinished => Some("unfinished"),
            Self::Vanished => Some("vanished"),
            Self::Obsolete => Some("obsolete"),
        }
    }

    /// Vanished and obsolete entries are kept for reference only.
    #[must_use]
    pub const fn is_obsolete(self) -> bool {
        matches!(self, Self::Vanished | Self::Obsolete)
    }
}

impl FromStr for TranslationKind {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unfinished" => Ok(Self::Unfinished),
            "vanished" => Ok(Self::Vanished),
            "obsolete" => Ok(Self::Obsolete),
            other => Err(CatalogError::InvalidAttribute {
                element: "translation",
                attribute: "type",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for TranslationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_attribute().unwrap_or("finished"))
    }
}

impl TranslationBody {
    /// First form of the translation (the only one for non-numerus messages).
    #[must_use]
    pub fn first_form(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::Numerus(forms) => forms.first().map_or("", String::as_str),
        }
    }

    /// All forms, a single one for non-numerus messages.
    #[must_use]
    pub fn forms(&self) -> Vec<&str> {
        match self {
            Self::Text(text) => vec![text.as_str()],
            Self::Numerus(forms) => forms.iter().map(String::as_str).collect(),
        }
    }

    /// True when every form is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.is_empty(),
            Self::Numerus(forms) => forms.iter().all(String::is_empty),
        }
    }
}

impl Translation {
    #[must_use]
    pub fn finished(text: impl Into<String>) -> Self {
        Self::new(TranslationKind::Finished, TranslationBody::Text(text.into()))
    }

    #[must_use]
    pub fn unfinished(text: impl Into<String>) -> Self {
        Self::new(TranslationKind::Unfinished, TranslationBody::Text(text.into()))
    }

    #[must_use]
    pub const fn new(kind: TranslationKind, body: TranslationBody) -> Self {
        Self { kind, body, length_variants: Vec::new() }
    }

    /// Length variants of form `index`, when it has more than plain text.
    #[must_use]
    pub fn variants_of(&self, index: usize) -> Option<&[String]> {
        self.length_variants.get(index).map(Vec::as_slice).filter(|variants| !variants.is_empty())
    }

    /// A translation usable at runtime: finished and not empty.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.kind == TranslationKind::Finished && !self.body.is_empty()
    }
}

impl Message {
    #[must_use]
    pub fn new(source: impl Into<String>, translation: Translation) -> Self {
        Self { source: source.into(), translation, ..Self::default() }
    }

    #[must_use]
    pub fn with_location(mut self, filename: impl Into<String>, line: u32) -> Self {
        self.locations.push(Location {
            filename: Some(filename.into()),
            line: Some(line),
            range: SourceRange::default(),
        });
        self
    }

    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Identity of this message inside the given context.
    #[must_use]
    pub fn id_in(&self, context: &str) -> MessageId {
        MessageId {
            context: context.to_string(),
            source: self.source.clone(),
            comment: self.comment.clone(),
        }
    }

    /// The `(context, source, translation, unfinished)` tuple preserved by round-trips.
    #[must_use]
    pub fn summary<'a>(&'a self, context: &'a str) -> (&'a str, &'a str, Vec<&'a str>, bool) {
        (
            context,
            self.source.as_str(),
            self.translation.body.forms(),
            self.translation.kind == TranslationKind::Unfinished,
        )
    }
}

impl Context {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    #[must_use]
    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }
}

impl Catalog {
    /// An empty catalog with the version lupdate writes.
    #[must_use]
    pub fn new(language: Option<String>) -> Self {
        Self { version: Some("2.1".to_string()), language, ..Self::default() }
    }

    #[must_use]
    pub fn context(&self, name: &str) -> Option<&Context> {
        self.contexts.iter().find(|context| context.name == name)
    }

    /// Adds a message, creating its context on first use.
    pub fn insert(&mut self, context: &str, message: Message) {
        if let Some(existing) = self.contexts.iter_mut().find(|c| c.name == context) {
            existing.messages.push(message);
        } else {
            self.contexts.push(Context::new(context).with_message(message));
        }
    }

    /// Iterates over `(context name, message)` pairs in document order.
    pub fn messages(&self) -> impl Iterator<Item = (&str, &Message)> {
        self.contexts
            .iter()
            .flat_map(|context| context.messages.iter().map(|m| (context.name.as_str(), m)))
    }

    /// Finds a message by context, source and disambiguation comment.
    #[must_use]
    pub fn find(&self, context: &str, source: &str, comment: Option<&str>) -> Option<&Message> {
        self.context(context)?
            .messages
            .iter()
            .find(|message| message.source == source && message.comment.as_deref() == comment)
    }

    /// Finds the message whose element contains the given position.
    #[must_use]
    pub fn message_at(&self, position: crate::types::SourcePosition) -> Option<(&str, &Message)> {
        self.messages().find(|(_, message)| message.ranges.message.contains(position))
    }

    #[must_use]
    pub fn message_count(&self) -> usize {
        self.contexts.iter().map(|context| context.messages.len()).sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;

    fn sample_catalog() -> Catalog {
        let mut catalog = Catalog::new(Some("fr".to_string()));
        catalog.insert("MainWindow", Message::new("File", Translation::finished("Fichier")));
        catalog.insert("MainWindow", Message::new("Help", Translation::unfinished("")));
        catalog.insert("Dialog", Message::new("Donations", Translation::finished("Dons")));
        catalog
    }

    #[googletest::test]
    fn test_insert_groups_messages_by_context() {
        let catalog = sample_catalog();

        expect_that!(catalog.contexts.len(), eq(2));
        expect_that!(catalog.context("MainWindow").unwrap().messages.len(), eq(2));
        expect_that!(catalog.message_count(), eq(3));
    }

    #[googletest::test]
    fn test_find_respects_disambiguation() {
        let mut catalog = sample_catalog();
        catalog.insert(
            "MainWindow",
            Message::new("File", Translation::finished("Dossier")).with_comment("folder"),
        );

        assert_eq!(
            catalog.find("MainWindow", "File", None).map(|m| m.translation.body.first_form()),
            Some("Fichier")
        );
        assert_eq!(
            catalog
                .find("MainWindow", "File", Some("folder"))
                .map(|m| m.translation.body.first_form()),
            Some("Dossier")
        );
        assert!(catalog.find("Dialog", "File", None).is_none());
    }

    #[rstest]
    #[case::finished(Translation::finished("Dons"), true)]
    #[case::empty(Translation::finished(""), false)]
    #[case::unfinished(Translation::unfinished("Dons"), false)]
    #[case::vanished(
        Translation::new(TranslationKind::Vanished, TranslationBody::Text("Dons".into())),
        false
    )]
    fn test_translation_is_usable(#[case] translation: Translation, #[case] expected: bool) {
        assert_eq!(translation.is_usable(), expected);
    }

    #[rstest]
    #[case("unfinished", TranslationKind::Unfinished)]
    #[case("vanished", TranslationKind::Vanished)]
    #[case("obsolete", TranslationKind::Obsolete)]
    fn test_translation_kind_from_str(#[case] value: &str, #[case] expected: TranslationKind) {
        assert_eq!(value.parse::<TranslationKind>().unwrap(), expected);
        assert_eq!(expected.as_attribute(), Some(value));
    }

    #[googletest::test]
    fn test_translation_kind_rejects_unknown_value() {
        assert!("done".parse::<TranslationKind>().is_err());
    }

    #[googletest::test]
    fn test_numerus_body_forms() {
        let body = TranslationBody::Numerus(vec!["%n fichier".into(), "%n fichiers".into()]);

        assert_eq!(body.first_form(), "%n fichier");
        assert_eq!(body.forms(), vec!["%n fichier", "%n fichiers"]);
        expect_that!(body.is_empty(), eq(false));
        expect_that!(TranslationBody::Numerus(vec![String::new()]).is_empty(), eq(true));
    }
}
