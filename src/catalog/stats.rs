//! Translation progress of a catalog.

use serde::Serialize;

use crate::catalog::model::{
    Catalog,
    TranslationKind,
};

/// Message counts by translation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStats {
    /// Finished and not empty.
    pub finished: usize,
    pub unfinished: usize,
    /// Finished but empty.
    pub untranslated: usize,
    /// Vanished or obsolete.
    pub obsolete: usize,
    /// Every message, obsolete ones included.
    pub total: usize,
}

impl CatalogStats {
    #[must_use]
    pub fn of(catalog: &Catalog) -> Self {
        let mut stats = Self::default();
        for (_, message) in catalog.messages() {
            stats.total += 1;
            match message.translation.kind {
                TranslationKind::Unfinished => stats.unfinished += 1,
                TranslationKind::Vanished | TranslationKind::Obsolete => stats.obsolete += 1,
                TranslationKind::Finished if message.translation.body.is_empty() => {
                    stats.untranslated += 1;
                }
                TranslationKind::Finished => stats.finished += 1,
            }
        }
        stats
    }

    /// Messages that still matter at runtime.
    #[must_use]
    pub const fn active(&self) -> usize {
        self.total - self.obsolete
    }

    /// Share of active messages that are finished, rounded down.
    #[must_use]
    pub const fn percent_finished(&self) -> usize {
        let active = self.active();
        if active == 0 { 100 } else { self.finished * 100 / active }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;

    use super::*;
    use crate::catalog::model::{
        Message,
        Translation,
        TranslationBody,
    };
    use crate::catalog::parser::parse_catalog;

    #[googletest::test]
    fn test_fixture_stats() {
        let catalog =
            parse_catalog(include_str!("../../tests/fixtures/patchance_fr.ts")).unwrap().catalog;

        let stats = CatalogStats::of(&catalog);

        expect_that!(stats.total, eq(21));
        expect_that!(stats.finished, eq(20));
        expect_that!(stats.untranslated, eq(1));
        expect_that!(stats.unfinished, eq(0));
        expect_that!(stats.percent_finished(), eq(95));
    }

    #[googletest::test]
    fn test_obsolete_messages_do_not_count_toward_progress() {
        let mut catalog = Catalog::new(Some("fr".to_string()));
        catalog.insert("MainWindow", Message::new("File", Translation::finished("Fichier")));
        catalog.insert("MainWindow", Message::new("Help", Translation::unfinished("Aide")));
        catalog.insert(
            "MainWindow",
            Message::new(
                "Old",
                Translation::new(TranslationKind::Vanished, TranslationBody::Text("Vieux".into())),
            ),
        );

        let stats = CatalogStats::of(&catalog);

        expect_that!(stats.obsolete, eq(1));
        expect_that!(stats.active(), eq(2));
        expect_that!(stats.percent_finished(), eq(50));
    }

    #[googletest::test]
    fn test_empty_catalog_is_complete() {
        expect_that!(CatalogStats::of(&Catalog::default()).percent_finished(), eq(100));
    }
}
