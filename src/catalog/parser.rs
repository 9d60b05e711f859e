//! Reader for the TS XML format.
//!
//! Built on the pull parser of `quick-xml` so that every message keeps the
//! byte offsets it was read from. Offsets are converted to LSP positions
//! with a [`LineIndex`].

use std::collections::HashMap;

use quick_xml::Reader;
use quick_xml::events::{
    BytesStart,
    Event,
};

use crate::catalog::error::CatalogError;
use crate::catalog::model::{
    Catalog,
    Context,
    Extra,
    Location,
    LocationMode,
    Message,
    Translation,
    TranslationBody,
    TranslationKind,
};
use crate::types::{
    LineIndex,
    SourceRange,
};

/// A parsed catalog with the document ranges that are not part of the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCatalog {
    pub catalog: Catalog,
    /// Range of every context's `<name>` text, parallel to `catalog.contexts`.
    pub context_names: Vec<SourceRange>,
}

/// Parses a TS document.
///
/// The XML declaration and the `<!DOCTYPE TS>` line are optional. Any
/// well-formedness problem aborts the whole catalog.
pub fn parse_catalog(text: &str) -> Result<ParsedCatalog, CatalogError> {
    CatalogParser::new(text).parse()
}

/// Tells TS catalogs apart from TypeScript sources sharing the `.ts` extension.
#[must_use]
pub fn looks_like_ts_catalog(text: &str) -> bool {
    let text = text.trim_start_matches('\u{feff}').trim_start();
    text.starts_with('<') && text.contains("<TS")
}

/// Text content of an element.
#[derive(Debug)]
struct ElementText {
    /// The text, or the first `<lengthvariant>` when there are any.
    value: String,
    /// Every `<lengthvariant>`, in document order.
    variants: Vec<String>,
    /// Between the opening and the closing tag.
    range: SourceRange,
    /// Byte offset just past the closing tag.
    end: usize,
}

/// lupdate's relative location mode omits repeated file names and writes
/// line numbers as offsets (`line="+12"`) from the previous location of the
/// same file in the same context.
#[derive(Debug, Default)]
struct LocationState {
    current_file: Option<String>,
    last_lines: HashMap<String, i64>,
}

impl LocationState {
    fn resolve(
        &mut self,
        filename: Option<String>,
        line: Option<&str>,
    ) -> Result<(Option<String>, Option<u32>), CatalogError> {
        let filename = filename.or_else(|| self.current_file.clone());
        self.current_file.clone_from(&filename);

        let Some(raw) = line else {
            return Ok((filename, None));
        };
        let invalid = || CatalogError::InvalidAttribute {
            element: "location",
            attribute: "line",
            value: raw.to_string(),
        };

        let key = filename.clone().unwrap_or_default();
        let absolute = if is_relative_line(raw) {
            let delta = raw.parse::<i64>().map_err(|_| invalid())?;
            self.last_lines.get(&key).copied().unwrap_or(0) + delta
        } else {
            i64::from(raw.parse::<u32>().map_err(|_| invalid())?)
        };
        let line = u32::try_from(absolute).map_err(|_| invalid())?;
        self.last_lines.insert(key, absolute);

        Ok((filename, Some(line)))
    }
}

fn is_relative_line(line: &str) -> bool {
    line.starts_with(['+', '-'])
}

/// Pull parser over a single document.
struct CatalogParser<'a> {
    text: &'a str,
    reader: Reader<&'a [u8]>,
    index: LineIndex,
    /// Set once a `line="+N"` location is seen.
    relative_locations: bool,
}

impl<'a> CatalogParser<'a> {
    fn new(text: &'a str) -> Self {
        let mut reader = Reader::from_str(text);
        reader.trim_text(false);
        Self { text, reader, index: LineIndex::new(text), relative_locations: false }
    }

    fn parse(mut self) -> Result<ParsedCatalog, CatalogError> {
        loop {
            let (event, end) = self.next_event()?;
            match event {
                Event::Start(tag) => return self.parse_root(&tag, end, false),
                Event::Empty(tag) => return self.parse_root(&tag, end, true),
                Event::Eof => return Err(CatalogError::MissingRoot),
                _ => {}
            }
        }
    }

    fn parse_root(
        &mut self,
        tag: &BytesStart<'_>,
        end: usize,
        empty: bool,
    ) -> Result<ParsedCatalog, CatalogError> {
        if tag.name().as_ref() != b"TS" {
            return Err(CatalogError::UnexpectedRoot { found: element_name(tag) });
        }

        let mut catalog = Catalog::default();
        for (key, value) in self.attributes(tag, end)? {
            match key.as_str() {
                "version" => catalog.version = Some(value),
                "sourcelanguage" => catalog.source_language = Some(value),
                "language" => catalog.language = Some(value),
                _ => {}
            }
        }

        let mut context_names = Vec::new();
        if empty {
            return Ok(ParsedCatalog { catalog, context_names });
        }

        loop {
            let (event, end) = self.next_event()?;
            match event {
                Event::Start(tag) => match tag.name().as_ref() {
                    b"context" => {
                        let (context, name_range) = self.parse_context(end)?;
                        catalog.contexts.push(context);
                        context_names.push(name_range);
                    }
                    b"defaultcodec" => {
                        catalog.default_codec = Some(self.read_text(end, "defaultcodec")?.value);
                    }
                    b"dependencies" => catalog.dependencies = self.parse_dependencies()?,
                    element if is_extra(element) => {
                        catalog.extras.push(self.read_extra(&tag, end)?);
                    }
                    _ => return Err(self.unexpected(&tag, "TS", end)),
                },
                Event::Empty(tag) => match tag.name().as_ref() {
                    b"context" => return Err(self.missing("context", "name", end)),
                    b"defaultcodec" => catalog.default_codec = Some(String::new()),
                    b"dependencies" => {}
                    element if is_extra(element) => catalog.extras.push(empty_extra(&tag)),
                    _ => return Err(self.unexpected(&tag, "TS", end)),
                },
                Event::End(_) => break,
                Event::Eof => return Err(self.unexpected_eof()),
                _ => {}
            }
        }

        if self.relative_locations {
            catalog.location_mode = LocationMode::Relative;
        }
        Ok(ParsedCatalog { catalog, context_names })
    }

    /// `catalog` attributes of the `<dependency>` elements.
    fn parse_dependencies(&mut self) -> Result<Vec<String>, CatalogError> {
        let mut dependencies = Vec::new();
        loop {
            let (event, end) = self.next_event()?;
            match event {
                Event::Empty(tag) if tag.name().as_ref() == b"dependency" => {
                    let catalog = self
                        .attributes(&tag, end)?
                        .into_iter()
                        .find_map(|(key, value)| (key == "catalog").then_some(value));
                    dependencies.extend(catalog);
                }
                Event::Start(tag) | Event::Empty(tag) => {
                    return Err(self.unexpected(&tag, "dependencies", end));
                }
                Event::End(_) => return Ok(dependencies),
                Event::Eof => return Err(self.unexpected_eof()),
                _ => {}
            }
        }
    }

    fn read_extra(&mut self, tag: &BytesStart<'_>, end: usize) -> Result<Extra, CatalogError> {
        let content = self.read_text(end, "extra")?.value;
        Ok(Extra { name: element_name(tag), content })
    }

    fn parse_context(&mut self, open_end: usize) -> Result<(Context, SourceRange), CatalogError> {
        let mut name = None;
        let mut context = Context::default();
        let mut locations = LocationState::default();

        loop {
            let (event, end) = self.next_event()?;
            match event {
                Event::Start(tag) => match tag.name().as_ref() {
                    b"name" => {
                        let text = self.read_text(end, "name")?;
                        name = Some((text.value, text.range));
                    }
                    b"comment" => context.comment = Some(self.read_text(end, "comment")?.value),
                    b"message" => {
                        context.messages.push(self.parse_message(&tag, end, &mut locations)?);
                    }
                    element if is_extra(element) => {
                        context.extras.push(self.read_extra(&tag, end)?);
                    }
                    _ => return Err(self.unexpected(&tag, "context", end)),
                },
                Event::Empty(tag) => match tag.name().as_ref() {
                    b"name" => name = Some((String::new(), self.index.range(self.text, end, end))),
                    b"comment" => context.comment = Some(String::new()),
                    b"message" => return Err(self.missing("message", "source", end)),
                    element if is_extra(element) => context.extras.push(empty_extra(&tag)),
                    _ => return Err(self.unexpected(&tag, "context", end)),
                },
                Event::End(_) => break,
                Event::Eof => return Err(self.unexpected_eof()),
                _ => {}
            }
        }

        let (name, range) = name.ok_or_else(|| self.missing("context", "name", open_end))?;
        context.name = name;
        Ok((context, range))
    }

    fn parse_message(
        &mut self,
        tag: &BytesStart<'_>,
        open_end: usize,
        locations: &mut LocationState,
    ) -> Result<Message, CatalogError> {
        let open_start = self.tag_start(open_end);
        let mut message = Message::default();
        for (key, value) in self.attributes(tag, open_end)? {
            match key.as_str() {
                "id" => message.id = Some(value),
                "numerus" => message.numerus = value == "yes",
                _ => {}
            }
        }

        let mut source = None;
        loop {
            let (event, end) = self.next_event()?;
            match event {
                Event::Start(child) => match child.name().as_ref() {
                    b"source" => {
                        let text = self.read_text(end, "source")?;
                        message.ranges.source = text.range;
                        source = Some(text.value);
                    }
                    b"oldsource" => message.old_source = Some(self.read_text(end, "oldsource")?.value),
                    b"comment" => message.comment = Some(self.read_text(end, "comment")?.value),
                    b"oldcomment" => {
                        message.old_comment = Some(self.read_text(end, "oldcomment")?.value);
                    }
                    b"extracomment" => {
                        message.extra_comment = Some(self.read_text(end, "extracomment")?.value);
                    }
                    b"translatorcomment" => {
                        message.translator_comment =
                            Some(self.read_text(end, "translatorcomment")?.value);
                    }
                    b"translation" => self.parse_translation(&child, end, false, &mut message)?,
                    b"userdata" => message.userdata = Some(self.read_text(end, "userdata")?.value),
                    element if is_extra(element) => {
                        message.extras.push(self.read_extra(&child, end)?);
                    }
                    _ => return Err(self.unexpected(&child, "message", end)),
                },
                Event::Empty(child) => match child.name().as_ref() {
                    b"location" => {
                        let location = self.parse_location(&child, end, locations)?;
                        message.locations.push(location);
                    }
                    b"source" => {
                        message.ranges.source = self.index.range(self.text, end, end);
                        source = Some(String::new());
                    }
                    b"comment" => message.comment = Some(String::new()),
                    b"translation" => self.parse_translation(&child, end, true, &mut message)?,
                    b"oldsource" => message.old_source = Some(String::new()),
                    b"oldcomment" => message.old_comment = Some(String::new()),
                    b"extracomment" => message.extra_comment = Some(String::new()),
                    b"translatorcomment" => message.translator_comment = Some(String::new()),
                    b"userdata" => message.userdata = Some(String::new()),
                    element if is_extra(element) => message.extras.push(empty_extra(&child)),
                    _ => return Err(self.unexpected(&child, "message", end)),
                },
                Event::End(_) => {
                    message.ranges.message = self.index.range(self.text, open_start, end);
                    break;
                }
                Event::Eof => return Err(self.unexpected_eof()),
                _ => {}
            }
        }

        message.source = source.ok_or_else(|| self.missing("message", "source", open_end))?;
        Ok(message)
    }

    fn parse_location(
        &mut self,
        tag: &BytesStart<'_>,
        end: usize,
        locations: &mut LocationState,
    ) -> Result<Location, CatalogError> {
        let mut filename = None;
        let mut line = None;
        for (key, value) in self.attributes(tag, end)? {
            match key.as_str() {
                "filename" => filename = Some(value),
                "line" => line = Some(value),
                _ => {}
            }
        }

        self.relative_locations |= line.as_deref().is_some_and(is_relative_line);
        let (filename, line) = locations.resolve(filename, line.as_deref())?;
        let range = self.index.range(self.text, self.tag_start(end), end);
        Ok(Location { filename, line, range })
    }

    fn parse_translation(
        &mut self,
        tag: &BytesStart<'_>,
        open_end: usize,
        empty: bool,
        message: &mut Message,
    ) -> Result<(), CatalogError> {
        let open_start = self.tag_start(open_end);
        let mut kind = TranslationKind::Finished;
        for (key, value) in self.attributes(tag, open_end)? {
            if key == "type" {
                kind = value.parse()?;
            }
        }

        let mut length_variants = Vec::new();
        let (body, text_range, close_end) = if empty {
            let body = if message.numerus {
                TranslationBody::Numerus(Vec::new())
            } else {
                TranslationBody::Text(String::new())
            };
            (body, self.index.range(self.text, open_end, open_end), open_end)
        } else if message.numerus {
            let forms = self.read_numerus_forms(open_end)?;
            length_variants = forms.variants;
            (TranslationBody::Numerus(forms.values), forms.range, forms.end)
        } else {
            let text = self.read_text(open_end, "translation")?;
            if !text.variants.is_empty() {
                length_variants.push(text.variants);
            }
            (TranslationBody::Text(text.value), text.range, text.end)
        };

        message.translation = Translation { kind, body, length_variants };
        message.ranges.translation = self.index.range(self.text, open_start, close_end);
        message.ranges.translation_text = text_range;
        message.ranges.translation_type = self.attribute_range(open_start, open_end, "type");
        Ok(())
    }

    /// Reads the `<numerusform>`s of a translation.
    ///
    /// Text without any `<numerusform>` is kept as the only form; text
    /// mixed with forms is an error.
    fn read_numerus_forms(&mut self, open_end: usize) -> Result<NumerusForms, CatalogError> {
        let mut values = Vec::new();
        let mut variants = Vec::new();
        let mut stray = String::new();
        let mut stray_at = None;
        loop {
            let (event, end) = self.next_event()?;
            match event {
                Event::Start(tag) if tag.name().as_ref() == b"numerusform" => {
                    let form = self.read_text(end, "numerusform")?;
                    values.push(form.value);
                    variants.push(form.variants);
                }
                Event::Empty(tag) if tag.name().as_ref() == b"numerusform" => {
                    values.push(String::new());
                    variants.push(Vec::new());
                }
                Event::Empty(tag) if tag.name().as_ref() == b"byte" => {
                    stray.push(self.byte_value(&tag, end)?);
                    stray_at.get_or_insert(end);
                }
                Event::Start(tag) | Event::Empty(tag) => {
                    return Err(self.unexpected(&tag, "translation", end));
                }
                Event::Text(text) => {
                    let unescaped = text.unescape().map_err(|err| self.xml_error(&err))?;
                    if !unescaped.trim().is_empty() {
                        stray_at.get_or_insert(end);
                    }
                    stray.push_str(&unescaped);
                }
                Event::CData(data) => {
                    stray.push_str(&String::from_utf8_lossy(&data));
                    stray_at.get_or_insert(end);
                }
                Event::End(_) => {
                    let range = self.index.range(self.text, open_end, self.tag_start(end));
                    if let Some(offset) = stray_at {
                        if !values.is_empty() {
                            return Err(CatalogError::UnexpectedText {
                                parent: "translation",
                                position: self.index.position(self.text, offset),
                            });
                        }
                        values.push(stray);
                        variants.push(Vec::new());
                    }
                    if variants.iter().all(Vec::is_empty) {
                        variants.clear();
                    }
                    return Ok(NumerusForms { values, variants, range, end });
                }
                Event::Eof => return Err(self.unexpected_eof()),
                _ => {}
            }
        }
    }

    /// Reads character data up to the closing tag of the current element.
    ///
    /// `<byte value="xNN"/>` decodes to the character it encodes. With
    /// `<lengthvariant>` children the value is the first (longest) one.
    fn read_text(&mut self, open_end: usize, parent: &'static str) -> Result<ElementText, CatalogError> {
        let mut value = String::new();
        let mut variants = Vec::new();

        loop {
            let (event, end) = self.next_event()?;
            match event {
                Event::Text(text) => {
                    let unescaped = text.unescape().map_err(|err| self.xml_error(&err))?;
                    value.push_str(&unescaped);
                }
                Event::CData(data) => value.push_str(&String::from_utf8_lossy(&data)),
                Event::Empty(tag) if tag.name().as_ref() == b"byte" => {
                    value.push(self.byte_value(&tag, end)?);
                }
                Event::Start(tag) if tag.name().as_ref() == b"lengthvariant" => {
                    variants.push(self.read_text(end, "lengthvariant")?.value);
                }
                Event::Start(tag) | Event::Empty(tag) => {
                    return Err(self.unexpected(&tag, parent, end));
                }
                Event::End(_) => {
                    let range = self.index.range(self.text, open_end, self.tag_start(end));
                    if let Some(first) = variants.first() {
                        value.clone_from(first);
                    }
                    return Ok(ElementText { value, variants, range, end });
                }
                Event::Eof => return Err(self.unexpected_eof()),
                _ => {}
            }
        }
    }

    fn byte_value(&self, tag: &BytesStart<'_>, end: usize) -> Result<char, CatalogError> {
        let value = self
            .attributes(tag, end)?
            .into_iter()
            .find_map(|(key, value)| (key == "value").then_some(value))
            .unwrap_or_default();

        let code = value.strip_prefix('x').map_or_else(
            || value.parse::<u32>().ok(),
            |hex| u32::from_str_radix(hex, 16).ok(),
        );
        code.and_then(char::from_u32).ok_or_else(|| CatalogError::InvalidAttribute {
            element: "byte",
            attribute: "value",
            value,
        })
    }

    /// Reads the next event together with the byte offset just past it.
    fn next_event(&mut self) -> Result<(Event<'a>, usize), CatalogError> {
        let event = self.reader.read_event();
        let end = self.reader.buffer_position();
        event.map(|event| (event, end)).map_err(|err| self.xml_error(&err))
    }

    /// Decoded attributes of a tag, in document order.
    fn attributes(
        &self,
        tag: &BytesStart<'_>,
        end: usize,
    ) -> Result<Vec<(String, String)>, CatalogError> {
        tag.attributes()
            .map(|attribute| {
                let attribute = attribute.map_err(|err| self.xml_error_at(&err, end))?;
                let value = attribute.unescape_value().map_err(|err| self.xml_error_at(&err, end))?;
                Ok((String::from_utf8_lossy(attribute.key.as_ref()).into_owned(), value.into_owned()))
            })
            .collect()
    }

    /// Range of `name="..."` inside the tag spanning `start..end`.
    fn attribute_range(&self, start: usize, end: usize, name: &str) -> Option<SourceRange> {
        let tag = self.text.get(start..end)?;
        let needle = format!(" {name}=");
        let attribute_start = tag.find(&needle)? + 1;
        let quote_at = attribute_start + needle.len() - 1;
        let quote = tag.get(quote_at..)?.chars().next()?;
        let closing = tag.get(quote_at + 1..)?.find(quote)? + quote_at + 1;
        Some(self.index.range(self.text, start + attribute_start, start + closing + 1))
    }

    /// Byte offset of the `<` opening the tag that ends at `end`.
    fn tag_start(&self, end: usize) -> usize {
        self.text.get(..end).and_then(|head| head.rfind('<')).unwrap_or(0)
    }

    fn missing(&self, parent: &'static str, child: &'static str, end: usize) -> CatalogError {
        CatalogError::MissingElement {
            parent,
            child,
            position: self.index.position(self.text, self.tag_start(end)),
        }
    }

    fn unexpected(&self, tag: &BytesStart<'_>, parent: &'static str, end: usize) -> CatalogError {
        CatalogError::UnexpectedElement {
            name: element_name(tag),
            parent,
            position: self.index.position(self.text, self.tag_start(end)),
        }
    }

    fn unexpected_eof(&self) -> CatalogError {
        CatalogError::Xml {
            message: "unexpected end of document".to_string(),
            position: self.index.end_position(self.text),
        }
    }

    fn xml_error(&self, err: &impl std::fmt::Display) -> CatalogError {
        self.xml_error_at(err, self.reader.buffer_position())
    }

    fn xml_error_at(&self, err: &impl std::fmt::Display, offset: usize) -> CatalogError {
        CatalogError::Xml { message: err.to_string(), position: self.index.position(self.text, offset) }
    }
}

/// Forms of a numerus translation.
#[derive(Debug)]
struct NumerusForms {
    values: Vec<String>,
    /// Parallel to `values`, empty when no form has length variants.
    variants: Vec<Vec<String>>,
    range: SourceRange,
    end: usize,
}

fn element_name(tag: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(tag.name().as_ref()).into_owned()
}

fn is_extra(name: &[u8]) -> bool {
    name.starts_with(b"extra-")
}

fn empty_extra(tag: &BytesStart<'_>) -> Extra {
    Extra { name: element_name(tag), content: String::new() }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;
    use crate::types::SourcePosition;

    const FIXTURE: &str = include_str!("../../tests/fixtures/patchance_fr.ts");

    #[googletest::test]
    fn test_parse_fixture_structure() {
        let parsed = parse_catalog(FIXTURE).unwrap();
        let catalog = &parsed.catalog;

        assert_eq!(catalog.version.as_deref(), Some("2.1"));
        assert_eq!(catalog.language.as_deref(), Some("fr"));
        expect_that!(catalog.contexts.len(), eq(3));
        expect_that!(parsed.context_names.len(), eq(3));
        expect_that!(catalog.context("Dialog").unwrap().messages.len(), eq(6));
        expect_that!(catalog.context("DialogAboutPatchance").unwrap().messages.len(), eq(3));
        expect_that!(catalog.context("MainWindow").unwrap().messages.len(), eq(12));
    }

    #[rstest]
    fn test_parse_fixture_decodes_entities() {
        let catalog = parse_catalog(FIXTURE).unwrap().catalog;
        let toolbar = catalog.find("MainWindow", "toolBar", None).unwrap();

        assert_eq!(toolbar.translation.body.first_form(), "Barre d'outils");

        let about = &catalog.context("DialogAboutPatchance").unwrap().messages[1];
        assert!(about.source.starts_with("<html><head/><body><p><span style=\" font-weight:600;\">"));
        assert!(about.source.contains("version : %s"));
    }

    #[rstest]
    fn test_parse_fixture_empty_translation() {
        let catalog = parse_catalog(FIXTURE).unwrap().catalog;
        let message = catalog.find("MainWindow", "Ctrl+M", None).unwrap();

        assert_eq!(message.translation.kind, TranslationKind::Finished);
        assert!(message.translation.body.is_empty());
    }

    #[rstest]
    fn test_parse_records_ranges() {
        let text = "<TS version=\"2.1\" language=\"fr\">\n<context>\n    <name>Dialog</name>\n    <message>\n        <location filename=\"a.ui\" line=\"3\"/>\n        <source>Donations</source>\n        <translation type=\"unfinished\">Dons</translation>\n    </message>\n</context>\n</TS>\n";
        let parsed = parse_catalog(text).unwrap();
        let message = &parsed.catalog.contexts[0].messages[0];

        let pos = |line, character| SourcePosition { line, character };
        assert_eq!(parsed.context_names[0], SourceRange::new(pos(2, 10), pos(2, 16)));
        assert_eq!(message.ranges.message, SourceRange::new(pos(3, 4), pos(7, 14)));
        assert_eq!(message.ranges.source, SourceRange::new(pos(5, 16), pos(5, 25)));
        assert_eq!(message.ranges.translation, SourceRange::new(pos(6, 8), pos(6, 57)));
        assert_eq!(message.ranges.translation_text, SourceRange::new(pos(6, 39), pos(6, 43)));
        assert_eq!(message.ranges.translation_type, Some(SourceRange::new(pos(6, 21), pos(6, 38))));
        assert_eq!(message.locations[0].range, SourceRange::new(pos(4, 8), pos(4, 44)));
        assert_eq!(message.translation.kind, TranslationKind::Unfinished);
    }

    #[rstest]
    fn test_parse_numerus_forms() {
        let text = r#"<TS version="2.1" language="fr">
<context>
    <name>MainWindow</name>
    <message numerus="yes">
        <source>%n port(s)</source>
        <translation>
            <numerusform>%n port</numerusform>
            <numerusform>%n ports</numerusform>
        </translation>
    </message>
</context>
</TS>
"#;
        let catalog = parse_catalog(text).unwrap().catalog;
        let message = &catalog.contexts[0].messages[0];

        assert!(message.numerus);
        assert_eq!(
            message.translation.body,
            TranslationBody::Numerus(vec!["%n port".to_string(), "%n ports".to_string()])
        );
    }

    #[rstest]
    fn test_parse_relative_locations() {
        let text = r#"<TS version="2.1">
<context>
    <name>MainWindow</name>
    <message>
        <location filename="main_win.ui" line="+12"/>
        <location line="+3"/>
        <source>Menu</source>
        <translation>Menu</translation>
    </message>
</context>
</TS>
"#;
        let catalog = parse_catalog(text).unwrap().catalog;
        let locations = &catalog.contexts[0].messages[0].locations;

        assert_eq!(locations[0].line, Some(12));
        assert_eq!(locations[1].filename.as_deref(), Some("main_win.ui"));
        assert_eq!(locations[1].line, Some(15));
        assert_eq!(catalog.location_mode, LocationMode::Relative);
    }

    #[rstest]
    fn test_parse_absolute_locations() {
        let catalog = parse_catalog(FIXTURE).unwrap().catalog;

        assert_eq!(catalog.location_mode, LocationMode::Absolute);
    }

    #[rstest]
    fn test_parse_numerus_text_without_forms() {
        let text = r#"<TS version="2.1"><context><name>C</name><message numerus="yes"><source>%n item(s)</source><translation>%n éléments</translation></message></context></TS>"#;
        let catalog = parse_catalog(text).unwrap().catalog;

        assert_eq!(
            catalog.contexts[0].messages[0].translation.body,
            TranslationBody::Numerus(vec!["%n éléments".to_string()])
        );
    }

    #[rstest]
    fn test_parse_numerus_text_mixed_with_forms() {
        let text = "<TS version=\"2.1\"><context><name>C</name><message numerus=\"yes\"><source>%n item(s)</source>\n<translation>stray<numerusform>%n élément</numerusform></translation></message></context></TS>";

        let err = parse_catalog(text).unwrap_err();

        assert!(matches!(err, CatalogError::UnexpectedText { parent: "translation", .. }));
        assert_that!(err.to_string(), contains_substring("line 2"));
    }

    #[rstest]
    fn test_parse_keeps_comments_userdata_and_variants() {
        let text = r#"<TS version="2.1"><dependencies><dependency catalog="qtbase_fr"/></dependencies><context><name>C</name><comment>context note</comment><message><source>Zoom</source><translation variants="yes"><lengthvariant>Agrandissement</lengthvariant><lengthvariant>Zoom</lengthvariant></translation><userdata>42</userdata></message></context></TS>"#;
        let catalog = parse_catalog(text).unwrap().catalog;
        let context = &catalog.contexts[0];
        let message = &context.messages[0];

        assert_eq!(catalog.dependencies, vec!["qtbase_fr".to_string()]);
        assert_eq!(context.comment.as_deref(), Some("context note"));
        assert_eq!(message.userdata.as_deref(), Some("42"));
        assert_eq!(message.translation.body.first_form(), "Agrandissement");
        assert_eq!(
            message.translation.variants_of(0),
            Some(["Agrandissement".to_string(), "Zoom".to_string()].as_slice())
        );
    }

    #[rstest]
    fn test_parse_byte_elements_and_extra_elements() {
        let text = r#"<TS version="2.1"><context><name>C</name><message><source>a<byte value="x9"/>b</source><translation>c</translation><extra-po-flags>x</extra-po-flags></message></context></TS>"#;
        let catalog = parse_catalog(text).unwrap().catalog;
        let message = &catalog.contexts[0].messages[0];

        assert_eq!(message.source, "a\tb");
        assert_eq!(
            message.extras,
            vec![Extra { name: "extra-po-flags".to_string(), content: "x".to_string() }]
        );
    }

    #[rstest]
    #[case::not_xml("<TS><context>", "unexpected end")]
    #[case::wrong_root("<root/>", "Expected root element <TS>")]
    #[case::no_root("<?xml version=\"1.0\"?>", "no <TS> root")]
    #[case::missing_name("<TS><context><message><source>a</source></message></context></TS>", "missing its <name>")]
    #[case::missing_source("<TS><context><name>C</name><message><translation>a</translation></message></context></TS>", "missing its <source>")]
    #[case::bad_line("<TS><context><name>C</name><message><location line=\"abc\"/><source>a</source></message></context></TS>", "'line'")]
    #[case::bad_type("<TS><context><name>C</name><message><source>a</source><translation type=\"done\">a</translation></message></context></TS>", "'type'")]
    #[case::unknown_element("<TS><context><name>C</name><bogus/></context></TS>", "<bogus>")]
    fn test_parse_errors(#[case] text: &str, #[case] expected: &str) {
        let err = parse_catalog(text).unwrap_err();

        assert_that!(err.to_string(), contains_substring(expected));
    }

    #[rstest]
    #[case::catalog("<?xml version=\"1.0\"?>\n<!DOCTYPE TS>\n<TS version=\"2.1\"></TS>", true)]
    #[case::bom("\u{feff}<TS version=\"2.1\"/>", true)]
    #[case::typescript("export const ts = '<TS>';\n", false)]
    #[case::generic("<T>(value: T) => value;\n", false)]
    fn test_looks_like_ts_catalog(#[case] text: &str, #[case] expected: bool) {
        assert_eq!(looks_like_ts_catalog(text), expected);
    }
}
