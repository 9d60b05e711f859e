//! Runtime lookup of translations.
//!
//! A [`Translator`] maps `(context, source, disambiguation)` to the finished
//! translation of a catalog. Anything else (no entry, an unfinished or
//! obsolete entry, an empty translation) resolves to the source string.

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{
    Path,
    PathBuf,
};

use crate::catalog::error::LoadError;
use crate::catalog::locale::{
    PluralRule,
    detect_language_from_path,
    detect_locale,
    locale_candidates,
};
use crate::catalog::model::Catalog;
use crate::catalog::parser::parse_catalog;

/// A finished translation and its disambiguation comment.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    comment: Option<String>,
    forms: Vec<String>,
}

/// Lookup table built from one catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translator {
    language: Option<String>,
    rule: PluralRule,
    /// context -> source -> entries
    entries: HashMap<String, HashMap<String, Vec<Entry>>>,
}

impl Translator {
    /// Indexes the usable translations of a catalog.
    #[must_use]
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let mut entries: HashMap<String, HashMap<String, Vec<Entry>>> = HashMap::new();
        for (context, message) in catalog.messages() {
            if !message.translation.is_usable() {
                continue;
            }
            entries
                .entry(context.to_string())
                .or_default()
                .entry(message.source.clone())
                .or_default()
                .push(Entry {
                    comment: message.comment.clone(),
                    forms: message.translation.body.forms().into_iter().map(str::to_string).collect(),
                });
        }

        let language = catalog.language.clone();
        let rule = PluralRule::for_language(language.as_deref().unwrap_or("en"));
        Self { language, rule, entries }
    }

    /// Reads and indexes a catalog file.
    ///
    /// When the catalog has no `language` attribute it is guessed from the path.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| LoadError::Io { path: path.to_path_buf(), source })?;
        let mut catalog = parse_catalog(&text)
            .map_err(|source| LoadError::Parse { path: path.to_path_buf(), source })?
            .catalog;
        if catalog.language.is_none() {
            catalog.language = detect_language_from_path(path);
        }

        tracing::debug!(
            path = %path.display(),
            messages = catalog.message_count(),
            "Loaded catalog"
        );
        Ok(Self::from_catalog(&catalog))
    }

    /// Loads `{dir}/{stem}{prefix}{candidate}.ts` for the first locale
    /// candidate that exists on disk.
    pub fn load_for_locale(
        dir: &Path,
        stem: &str,
        prefix: &str,
        locale: &str,
    ) -> Result<Option<Self>, LoadError> {
        for candidate in locale_candidates(locale) {
            let path = dir.join(format!("{stem}{prefix}{candidate}.ts"));
            if path.is_file() {
                return Self::load(&path).map(Some);
            }
        }
        tracing::debug!(dir = %dir.display(), stem, locale, "No catalog for locale");
        Ok(None)
    }

    #[must_use]
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// Finished translation, if any. Tries the disambiguation first, then
    /// the entry without one.
    #[must_use]
    pub fn find(&self, context: &str, source: &str, disambiguation: Option<&str>) -> Option<&[String]> {
        let entries = self.entries.get(context)?.get(source)?;
        let exact = entries.iter().find(|entry| entry.comment.as_deref() == disambiguation);
        let entry = match exact {
            Some(entry) => Some(entry),
            None if disambiguation.is_some() => entries.iter().find(|entry| entry.comment.is_none()),
            None => None,
        }?;
        Some(entry.forms.as_slice())
    }

    /// Translation of `source`, or `source` itself.
    #[must_use]
    pub fn translate<'a>(
        &'a self,
        context: &str,
        source: &'a str,
        disambiguation: Option<&str>,
    ) -> Cow<'a, str> {
        self.find(context, source, disambiguation)
            .and_then(|forms| forms.first())
            .filter(|form| !form.is_empty())
            .map_or(Cow::Borrowed(source), |form| Cow::Borrowed(form.as_str()))
    }

    /// Plural-aware translation with `%n` replaced by `n`.
    #[must_use]
    pub fn translate_plural(
        &self,
        context: &str,
        source: &str,
        disambiguation: Option<&str>,
        n: u64,
    ) -> String {
        self.plural_form(context, source, disambiguation, n)
            .unwrap_or(source)
            .replace("%n", &n.to_string())
    }

    fn plural_form(&self, context: &str, source: &str, disambiguation: Option<&str>, n: u64) -> Option<&str> {
        let forms = self.find(context, source, disambiguation)?;
        let index = self.rule.form_index(n).min(forms.len().saturating_sub(1));
        forms.get(index).map(String::as_str).filter(|form| !form.is_empty())
    }
}

/// Several translators consulted like Qt's installed translators: the most
/// recently installed one first.
#[derive(Debug, Clone, Default)]
pub struct TranslatorChain {
    translators: Vec<Translator>,
}

impl TranslatorChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install(&mut self, translator: Translator) {
        self.translators.push(translator);
    }

    /// Removes and returns the most recently installed translator.
    pub fn uninstall_last(&mut self) -> Option<Translator> {
        self.translators.pop()
    }

    /// Loads and installs the catalog matching `locale`.
    ///
    /// Returns whether a catalog was found. The chain is unchanged otherwise.
    pub fn load(&mut self, dir: &Path, stem: &str, prefix: &str, locale: &str) -> Result<bool, LoadError> {
        let Some(translator) = Translator::load_for_locale(dir, stem, prefix, locale)? else {
            return Ok(false);
        };
        self.install(translator);
        Ok(true)
    }

    /// [`Self::load`] with the locale of the running process.
    pub fn load_system(&mut self, dir: &Path, stem: &str, prefix: &str) -> Result<bool, LoadError> {
        self.load(dir, stem, prefix, &detect_locale())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.translators.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.translators.is_empty()
    }

    #[must_use]
    pub fn translate<'a>(
        &'a self,
        context: &str,
        source: &'a str,
        disambiguation: Option<&str>,
    ) -> Cow<'a, str> {
        self.translators
            .iter()
            .rev()
            .find_map(|translator| {
                translator
                    .find(context, source, disambiguation)
                    .and_then(|forms| forms.first())
                    .filter(|form| !form.is_empty())
            })
            .map_or(Cow::Borrowed(source), |form| Cow::Borrowed(form.as_str()))
    }

    #[must_use]
    pub fn translate_plural(
        &self,
        context: &str,
        source: &str,
        disambiguation: Option<&str>,
        n: u64,
    ) -> String {
        self.translators
            .iter()
            .rev()
            .find_map(|translator| translator.plural_form(context, source, disambiguation, n))
            .unwrap_or(source)
            .replace("%n", &n.to_string())
    }
}

/// Catalog files under `dir` whose name starts with `{stem}{prefix}`.
pub fn available_catalogs(dir: &Path, stem: &str, prefix: &str) -> std::io::Result<Vec<PathBuf>> {
    let head = format!("{stem}{prefix}");
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension().is_some_and(|ext| ext == "ts")
                && path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with(&head))
        })
        .collect();
    paths.sort();
    Ok(paths)
}
