//! Serializer reproducing the layout `lupdate` writes.

use std::borrow::Cow;

use quick_xml::escape::escape;

use std::collections::HashMap;

use crate::catalog::model::{
    Catalog,
    Context,
    Extra,
    Location,
    LocationMode,
    Message,
    Translation,
    TranslationBody,
};

/// One indentation level.
const INDENT: &str = "    ";

/// Serializes a catalog.
///
/// Contexts sit at column 0 and every nested level adds four spaces. An
/// lupdate-produced document comes back byte for byte.
#[must_use]
pub fn write_catalog(catalog: &Catalog) -> String {
    let mut out = String::with_capacity(catalog.message_count() * 256 + 128);
    out.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<!DOCTYPE TS>\n<TS");
    push_attribute(&mut out, "version", catalog.version.as_deref());
    push_attribute(&mut out, "language", catalog.language.as_deref());
    push_attribute(&mut out, "sourcelanguage", catalog.source_language.as_deref());
    out.push_str(">\n");

    if let Some(codec) = &catalog.default_codec {
        push_element(&mut out, 0, "defaultcodec", codec);
    }
    if !catalog.dependencies.is_empty() {
        out.push_str("<dependencies>\n");
        for dependency in &catalog.dependencies {
            push_indent(&mut out, 1);
            out.push_str(&format!("<dependency catalog=\"{}\"/>\n", escape(dependency.as_str())));
        }
        out.push_str("</dependencies>\n");
    }
    write_extras(&mut out, 0, &catalog.extras);

    for context in &catalog.contexts {
        write_context(&mut out, context, catalog.location_mode);
    }

    out.push_str("</TS>\n");
    out
}

fn write_context(out: &mut String, context: &Context, mode: LocationMode) {
    out.push_str("<context>\n");
    push_element(out, 1, "name", &context.name);
    if let Some(comment) = &context.comment {
        push_element(out, 1, "comment", comment);
    }
    let mut locations = RelativeLocations::default();
    for message in &context.messages {
        write_message(out, message, mode, &mut locations);
    }
    write_extras(out, 1, &context.extras);
    out.push_str("</context>\n");
}

fn write_message(
    out: &mut String,
    message: &Message,
    mode: LocationMode,
    locations: &mut RelativeLocations,
) {
    push_indent(out, 1);
    out.push_str("<message");
    push_attribute(out, "id", message.id.as_deref());
    if message.numerus {
        out.push_str(" numerus=\"yes\"");
    }
    out.push_str(">\n");

    for location in &message.locations {
        let (filename, line) = match mode {
            LocationMode::Absolute => {
                (location.filename.as_deref(), location.line.map(|line| line.to_string()))
            }
            LocationMode::Relative => locations.relative(location),
        };
        write_location(out, filename, line);
    }
    push_element(out, 2, "source", &message.source);
    let optional = [
        ("oldsource", &message.old_source),
        ("comment", &message.comment),
        ("oldcomment", &message.old_comment),
        ("extracomment", &message.extra_comment),
        ("translatorcomment", &message.translator_comment),
    ];
    for (name, value) in optional {
        if let Some(value) = value {
            push_element(out, 2, name, value);
        }
    }

    write_translation(out, &message.translation);
    if let Some(userdata) = &message.userdata {
        push_element(out, 2, "userdata", userdata);
    }
    write_extras(out, 2, &message.extras);

    push_indent(out, 1);
    out.push_str("</message>\n");
}

fn write_translation(out: &mut String, translation: &Translation) {
    push_indent(out, 2);
    out.push_str("<translation");
    push_attribute(out, "type", translation.kind.as_attribute());
    match &translation.body {
        TranslationBody::Text(text) => match translation.variants_of(0) {
            Some(variants) => write_length_variants(out, 2, variants),
            None => {
                out.push('>');
                out.push_str(&escape_text(text));
            }
        },
        TranslationBody::Numerus(forms) if forms.is_empty() => out.push('>'),
        TranslationBody::Numerus(forms) => {
            out.push_str(">\n");
            for (index, form) in forms.iter().enumerate() {
                match translation.variants_of(index) {
                    Some(variants) => {
                        push_indent(out, 3);
                        out.push_str("<numerusform");
                        write_length_variants(out, 3, variants);
                        out.push_str("</numerusform>\n");
                    }
                    None => push_element(out, 3, "numerusform", form),
                }
            }
            push_indent(out, 2);
        }
    }
    out.push_str("</translation>\n");
}

/// Finishes an open tag with `variants="yes"` and writes one
/// `<lengthvariant>` per variant, leaving the cursor before the closing tag.
fn write_length_variants(out: &mut String, level: usize, variants: &[String]) {
    out.push_str(" variants=\"yes\">\n");
    for variant in variants {
        push_element(out, level + 1, "lengthvariant", variant);
    }
    push_indent(out, level);
}

fn write_extras(out: &mut String, level: usize, extras: &[Extra]) {
    for extra in extras {
        push_element(out, level, &extra.name, &extra.content);
    }
}

fn write_location(out: &mut String, filename: Option<&str>, line: Option<String>) {
    push_indent(out, 2);
    out.push_str("<location");
    push_attribute(out, "filename", filename);
    push_attribute(out, "line", line.as_deref());
    out.push_str("/>\n");
}

/// Tracks the previous location of each file within one context.
#[derive(Debug, Default)]
struct RelativeLocations {
    current_file: Option<String>,
    last_lines: HashMap<String, i64>,
}

impl RelativeLocations {
    /// The file name when it changed, and the line as an offset.
    fn relative<'a>(&mut self, location: &'a Location) -> (Option<&'a str>, Option<String>) {
        let filename = location.filename.as_deref();
        let changed = filename.is_some() && filename != self.current_file.as_deref();
        if changed {
            self.current_file = filename.map(str::to_string);
        }

        let line = location.line.map(|line| {
            let key = filename.or(self.current_file.as_deref()).unwrap_or_default().to_string();
            let line = i64::from(line);
            let offset = line - self.last_lines.get(&key).copied().unwrap_or(0);
            self.last_lines.insert(key, line);
            if offset < 0 { offset.to_string() } else { format!("+{offset}") }
        });

        (changed.then_some(filename).flatten(), line)
    }
}

fn push_indent(out: &mut String, level: usize) {
    for _ in 0..level {
        out.push_str(INDENT);
    }
}

fn push_element(out: &mut String, level: usize, name: &str, text: &str) {
    push_indent(out, level);
    out.push_str(&format!("<{name}>{}</{name}>\n", escape_text(text)));
}

fn push_attribute(out: &mut String, name: &str, value: Option<&str>) {
    if let Some(value) = value {
        out.push_str(&format!(" {name}=\"{}\"", escape(value)));
    }
}

/// Escapes character data. Control characters that XML 1.0 cannot carry
/// become `<byte value="xNN"/>` elements.
#[must_use]
pub fn escape_text(text: &str) -> Cow<'_, str> {
    if !text.chars().any(needs_byte_element) {
        return escape(text);
    }

    let mut out = String::with_capacity(text.len() + 16);
    let mut buffer = [0; 4];
    for ch in text.chars() {
        if needs_byte_element(ch) {
            out.push_str(&format!("<byte value=\"x{:x}\"/>", u32::from(ch)));
        } else {
            out.push_str(&escape(ch.encode_utf8(&mut buffer)));
        }
    }
    Cow::Owned(out)
}

const fn needs_byte_element(ch: char) -> bool {
    ch < ' ' && !matches!(ch, '\t' | '\n' | '\r')
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::catalog::parser::parse_catalog;

    const FIXTURE: &str = include_str!("../../tests/fixtures/patchance_fr.ts");

    #[rstest]
    fn test_fixture_round_trips_byte_for_byte() {
        let catalog = parse_catalog(FIXTURE).unwrap().catalog;

        assert_eq!(write_catalog(&catalog), FIXTURE);
    }

    #[rstest]
    fn test_write_small_catalog() {
        let mut catalog = Catalog::new(Some("fr".to_string()));
        catalog.insert(
            "Dialog",
            Message::new("Say \"Thank you\"", Translation::unfinished("Dites <b>merci</b>"))
                .with_location("../resources/ui/donations.ui", 60),
        );

        let expected = r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE TS>
<TS version="2.1" language="fr">
<context>
    <name>Dialog</name>
    <message>
        <location filename="../resources/ui/donations.ui" line="60"/>
        <source>Say &quot;Thank you&quot;</source>
        <translation type="unfinished">Dites &lt;b&gt;merci&lt;/b&gt;</translation>
    </message>
</context>
</TS>
"#;
        assert_eq!(write_catalog(&catalog), expected);
    }

    #[rstest]
    fn test_write_numerus_message() {
        let mut message = Message::new(
            "%n port(s)",
            Translation::new(
                crate::catalog::model::TranslationKind::Finished,
                TranslationBody::Numerus(vec!["%n port".into(), "%n ports".into()]),
            ),
        );
        message.numerus = true;
        let mut catalog = Catalog::new(None);
        catalog.insert("MainWindow", message);

        let written = write_catalog(&catalog);

        assert!(written.contains(
            "    <message numerus=\"yes\">\n        <source>%n port(s)</source>\n        <translation>\n            <numerusform>%n port</numerusform>\n            <numerusform>%n ports</numerusform>\n        </translation>\n"
        ));
        assert_eq!(parse_catalog(&written).unwrap().catalog.contexts[0].messages[0].translation, catalog.contexts[0].messages[0].translation);
    }

    const PRESERVED: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE TS>
<TS version="2.1" language="fr">
<dependencies>
    <dependency catalog="qtbase_fr"/>
</dependencies>
<extra-po-header-language>fr</extra-po-header-language>
<context>
    <name>MainWindow</name>
    <comment>Main window of the patchbay</comment>
    <message>
        <location filename="main.ui" line="+12"/>
        <location line="+3"/>
        <source>%1 clients</source>
        <translation>%1 clients</translation>
        <extra-po-flags>c-format</extra-po-flags>
    </message>
    <message numerus="yes">
        <location filename="patchbay.cpp" line="+40"/>
        <location filename="main.ui" line="-5"/>
        <source>%n port(s)</source>
        <translation>
            <numerusform variants="yes">
                <lengthvariant>%n port connecté</lengthvariant>
                <lengthvariant>%n port</lengthvariant>
            </numerusform>
            <numerusform>%n ports</numerusform>
        </translation>
    </message>
    <message id="zoom">
        <source>Zoom</source>
        <translation variants="yes">
            <lengthvariant>Agrandissement</lengthvariant>
            <lengthvariant>Zoom</lengthvariant>
        </translation>
        <userdata>opaque</userdata>
    </message>
</context>
</TS>
"#;

    #[rstest]
    fn test_rewrite_keeps_extras_variants_and_relative_locations() {
        let catalog = parse_catalog(PRESERVED).unwrap().catalog;

        assert_eq!(write_catalog(&catalog), PRESERVED);
    }

    #[rstest]
    fn test_relative_locations_are_rebased_after_edits() {
        let mut catalog = parse_catalog(PRESERVED).unwrap().catalog;
        catalog.contexts[0].messages[0].locations[1].line = Some(20);

        let written = write_catalog(&catalog);

        assert!(written.contains("<location filename=\"main.ui\" line=\"+12\"/>\n        <location line=\"+8\"/>"));
        assert!(written.contains("<location filename=\"main.ui\" line=\"-10\"/>"));
    }

    #[rstest]
    fn test_control_characters_use_byte_elements() {
        assert_eq!(escape_text("a\u{7}b\tc&"), "a<byte value=\"x7\"/>b\tc&amp;");
    }

    #[rstest]
    fn test_round_trip_preserves_message_tuples() {
        let catalog = parse_catalog(FIXTURE).unwrap().catalog;
        let reparsed = parse_catalog(&write_catalog(&catalog)).unwrap().catalog;

        let before: Vec<_> = catalog.messages().map(|(context, m)| m.summary(context)).collect();
        let after: Vec<_> = reparsed.messages().map(|(context, m)| m.summary(context)).collect();
        assert_eq!(before, after);
    }
}
