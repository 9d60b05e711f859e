//! Locale negotiation and plural rules.

use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

/// ISO 639 language codes accepted when guessing a catalog's language from its path.
static LANGUAGE_CODES: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "af", "am", "ar", "as", "ast", "az", "be", "bg", "bn", "br", "bs", "ca", "cs", "cy",
        "da", "de", "dz", "el", "en", "eo", "es", "et", "eu", "fa", "fi", "fil", "fo", "fr",
        "fy", "ga", "gd", "gl", "gu", "he", "hi", "hr", "hu", "hy", "ia", "id", "is", "it",
        "ja", "jv", "ka", "kk", "km", "kn", "ko", "ku", "ky", "la", "lb", "ln", "lo", "lt",
        "lv", "mg", "mk", "ml", "mn", "mr", "ms", "mt", "my", "nb", "ne", "nl", "nn", "no",
        "oc", "om", "or", "pa", "pl", "ps", "pt", "ro", "ru", "rw", "sa", "sd", "si", "sk",
        "sl", "sq", "sr", "su", "sv", "sw", "ta", "te", "tg", "th", "ti", "tk", "tl", "tr",
        "tt", "ug", "uk", "ur", "uz", "vi", "wa", "yo", "zh", "zu",
    ]
    .into_iter()
    .collect()
});

/// Environment variables consulted by [`detect_locale`], highest priority first.
const LOCALE_VARIABLES: [&str; 3] = ["LC_ALL", "LC_MESSAGES", "LANG"];

/// Strips the encoding and modifier of a POSIX locale and uses `_` as separator.
///
/// `fr_FR.UTF-8@euro` becomes `fr_FR`, `pt-BR` becomes `pt_BR`.
#[must_use]
pub fn normalize_locale(locale: &str) -> String {
    let end = locale.find(['.', '@']).unwrap_or(locale.len());
    locale.get(..end).unwrap_or(locale).trim().replace('-', "_")
}

/// Catalog name suffixes to try for a locale, most specific first.
///
/// ```
/// use qt_linguist_language_server::catalog::locale::locale_candidates;
///
/// assert_eq!(locale_candidates("fr_FR.UTF-8@euro"), vec!["fr_FR", "fr"]);
/// assert_eq!(locale_candidates("zh-Hant-TW"), vec!["zh_Hant_TW", "zh_Hant", "zh"]);
/// ```
#[must_use]
pub fn locale_candidates(locale: &str) -> Vec<String> {
    let normalized = normalize_locale(locale);
    if is_untranslated_locale(&normalized) {
        return Vec::new();
    }

    let mut candidates = vec![normalized.clone()];
    let mut rest = normalized.as_str();
    while let Some(cut) = rest.rfind('_') {
        rest = rest.get(..cut).unwrap_or_default();
        if !rest.is_empty() {
            candidates.push(rest.to_string());
        }
    }
    candidates
}

/// Locale of the running process.
///
/// Asks the operating system first, then falls back to the environment.
#[must_use]
pub fn detect_locale() -> String {
    sys_locale::get_locale()
        .map(|locale| normalize_locale(&locale))
        .filter(|locale| !locale.is_empty() && !is_untranslated_locale(locale))
        .unwrap_or_else(|| detect_locale_with(|name| std::env::var(name).ok()))
}

/// Same as [`detect_locale`] with a custom variable lookup.
///
/// The first variable holding a real locale wins; `C` and `POSIX` are
/// skipped. Falls back to `en`.
pub fn detect_locale_with(lookup: impl Fn(&str) -> Option<String>) -> String {
    LOCALE_VARIABLES
        .iter()
        .filter_map(|name| lookup(name))
        .map(|value| normalize_locale(&value))
        .find(|value| !value.is_empty() && !is_untranslated_locale(value))
        .unwrap_or_else(|| "en".to_string())
}

/// Guesses a catalog's language from its path.
///
/// Qt names catalogs `{name}_{locale}.ts`, so the file stem is searched
/// first (`patchance_fr.ts` → `fr`, `app_pt_BR.ts` → `pt_BR`), then the
/// parent directories from the innermost (`locale/de/app.ts` → `de`).
#[must_use]
pub fn detect_language_from_path(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_string_lossy();
    if is_locale_code(&stem) {
        return Some(stem.into_owned());
    }
    let from_stem = stem
        .match_indices(['_', '.'])
        .filter_map(|(index, _)| stem.get(index + 1..))
        .find(|suffix| is_locale_code(suffix));
    if let Some(language) = from_stem {
        return Some(language.to_string());
    }

    path.parent()?
        .components()
        .rev()
        .map(|component| component.as_os_str().to_string_lossy())
        .find(|name| is_locale_code(name))
        .map(|name| name.replace('-', "_"))
}

/// The language part of a locale (`pt_BR` → `pt`).
#[must_use]
pub fn language_part(locale: &str) -> &str {
    locale.split(['_', '-']).next().unwrap_or(locale)
}

fn is_untranslated_locale(locale: &str) -> bool {
    matches!(locale, "C" | "POSIX")
}

/// `fr`, `pt_BR`, `zh-Hant`, `es_419`.
fn is_locale_code(text: &str) -> bool {
    let mut parts = text.split(['_', '-']);
    let Some(language) = parts.next() else {
        return false;
    };
    if !LANGUAGE_CODES.contains(language) {
        return false;
    }
    parts.all(|part| {
        let is_region = (part.len() == 2 && part.chars().all(|c| c.is_ascii_uppercase()))
            || (part.len() == 3 && part.chars().all(|c| c.is_ascii_digit()));
        let is_script = part.len() == 4
            && part.chars().next().is_some_and(|c| c.is_ascii_uppercase())
            && part.chars().skip(1).all(|c| c.is_ascii_lowercase());
        is_region || is_script
    })
}

/// How a language selects among numerus forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluralRule {
    /// One form for every count (Japanese, Chinese, Korean, ...).
    Single,
    /// `n == 1` uses the first form (English, German, ...).
    OneOther,
    /// `n <= 1` uses the first form (French, Brazilian Portuguese, ...).
    ZeroOneOther,
    /// Three forms keyed on the last digits (Russian, Ukrainian, ...).
    Slavic,
    /// Three forms, the first one for exactly one (Polish).
    Polish,
    /// Three forms: one, two to four, other (Czech, Slovak).
    Czech,
    /// Six forms (Arabic).
    Arabic,
}

impl PluralRule {
    /// Rule for a language or locale code.
    #[must_use]
    pub fn for_language(locale: &str) -> Self {
        let normalized = normalize_locale(locale);
        if normalized == "pt_BR" {
            return Self::ZeroOneOther;
        }
        match language_part(&normalized) {
            "ja" | "zh" | "ko" | "vi" | "th" | "id" | "ms" | "my" | "jv" | "su" | "tr" | "hu"
            | "fa" | "tt" | "bo" | "dz" | "yo" => Self::Single,
            "fr" | "br" | "fil" | "tl" | "hy" | "ln" | "mg" | "ti" | "wa" | "oc" => {
                Self::ZeroOneOther
            }
            "ru" | "uk" | "be" | "sr" | "hr" | "bs" => Self::Slavic,
            "pl" => Self::Polish,
            "cs" | "sk" => Self::Czech,
            "ar" => Self::Arabic,
            _ => Self::OneOther,
        }
    }

    /// Number of `<numerusform>` elements a translation should carry.
    #[must_use]
    pub const fn form_count(self) -> usize {
        match self {
            Self::Single => 1,
            Self::OneOther | Self::ZeroOneOther => 2,
            Self::Slavic | Self::Polish | Self::Czech => 3,
            Self::Arabic => 6,
        }
    }

    /// Index of the form to use for `n`.
    #[must_use]
    pub fn form_index(self, n: u64) -> usize {
        let (last, last_two) = (n % 10, n % 100);
        let few = (2..=4).contains(&last) && !(10..20).contains(&last_two);
        match self {
            Self::Single => 0,
            Self::OneOther => usize::from(n != 1),
            Self::ZeroOneOther => usize::from(n > 1),
            Self::Slavic if last == 1 && last_two != 11 => 0,
            Self::Polish | Self::Czech if n == 1 => 0,
            Self::Slavic | Self::Polish if few => 1,
            Self::Czech if (2..=4).contains(&n) => 1,
            Self::Slavic | Self::Polish | Self::Czech => 2,
            Self::Arabic => match (n, last_two) {
                (0, _) => 0,
                (1, _) => 1,
                (2, _) => 2,
                (_, 3..=10) => 3,
                (_, 11..) => 4,
                _ => 5,
            },
        }
    }
}

/// Shorthand for [`PluralRule::for_language`].
#[must_use]
pub fn plural_rule(language: &str) -> PluralRule {
    PluralRule::for_language(language)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::Path;

    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("fr_FR.UTF-8@euro", vec!["fr_FR", "fr"])]
    #[case("fr", vec!["fr"])]
    #[case("pt-BR", vec!["pt_BR", "pt"])]
    #[case("C", vec![])]
    #[case("POSIX", vec![])]
    fn test_locale_candidates(#[case] locale: &str, #[case] expected: Vec<&str>) {
        assert_eq!(locale_candidates(locale), expected);
    }

    #[rstest]
    #[case::lc_all_wins(&[("LC_ALL", "de_DE.UTF-8"), ("LANG", "fr_FR.UTF-8")], "de_DE")]
    #[case::c_is_skipped(&[("LC_ALL", "C"), ("LANG", "fr_FR.UTF-8")], "fr_FR")]
    #[case::lc_messages(&[("LC_MESSAGES", "ja_JP"), ("LANG", "fr_FR")], "ja_JP")]
    #[case::empty_is_skipped(&[("LC_ALL", ""), ("LANG", "fr")], "fr")]
    #[case::nothing_set(&[], "en")]
    fn test_detect_locale_with(#[case] vars: &[(&str, &str)], #[case] expected: &str) {
        let vars: HashMap<&str, &str> = vars.iter().copied().collect();

        let locale = detect_locale_with(|name| vars.get(name).map(ToString::to_string));

        assert_that!(locale, eq(expected));
    }

    #[rstest]
    fn test_detect_locale_is_normalized() {
        let locale = detect_locale();

        assert!(!locale.is_empty());
        assert_that!(locale, not(contains_substring(".")));
        assert_that!(locale, not(contains_substring("-")));
        assert!(!matches!(locale.as_str(), "C" | "POSIX"));
    }

    #[rstest]
    #[case("locale/patchance_fr.ts", Some("fr"))]
    #[case("translations/app_pt_BR.ts", Some("pt_BR"))]
    #[case("i18n/de.ts", Some("de"))]
    #[case("locale/es/app.ts", Some("es"))]
    #[case("i18n/zh-Hant/app.ts", Some("zh_Hant"))]
    #[case("src/components/button.ts", None)]
    fn test_detect_language_from_path(#[case] path: &str, #[case] expected: Option<&str>) {
        assert_eq!(detect_language_from_path(Path::new(path)).as_deref(), expected);
    }

    #[rstest]
    #[case::french_zero("fr", 0, 0)]
    #[case::french_one("fr", 1, 0)]
    #[case::french_two("fr", 2, 1)]
    #[case::english_zero("en", 0, 1)]
    #[case::english_one("en_GB", 1, 0)]
    #[case::brazilian("pt_BR", 0, 0)]
    #[case::portuguese("pt_PT", 0, 1)]
    #[case::japanese("ja", 5, 0)]
    #[case::russian_one("ru", 21, 0)]
    #[case::russian_few("ru", 23, 1)]
    #[case::russian_many("ru", 11, 2)]
    #[case::polish_few("pl", 22, 1)]
    #[case::polish_many("pl", 12, 2)]
    #[case::czech_few("cs", 3, 1)]
    #[case::arabic_two("ar", 2, 2)]
    #[case::arabic_many("ar", 11, 4)]
    fn test_plural_form_index(#[case] language: &str, #[case] n: u64, #[case] expected: usize) {
        let rule = plural_rule(language);

        assert_eq!(rule.form_index(n), expected);
        assert!(rule.form_index(n) < rule.form_count());
    }
}
