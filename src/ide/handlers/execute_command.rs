//! Execute Command handler
//!
//! Handles `workspace/executeCommand` for the custom commands.

use std::collections::HashMap;

use serde::{
    Deserialize,
    Serialize,
};
use serde_json::Value;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::{
    ExecuteCommandParams,
    MessageType,
    Range,
    TextEdit,
    Url,
    WorkspaceEdit,
};

use super::super::backend::Backend;
use crate::catalog::locale::{
    locale_candidates,
    normalize_locale,
};
use crate::catalog::{
    CatalogStats,
    Translator,
    TranslatorChain,
    write_catalog,
};
use crate::input::catalog::{
    CatalogFile,
    catalog_language,
    parse_catalog_file,
};
use crate::types::{
    LineIndex,
    SourcePosition,
};

/// Commands advertised at `initialize`.
pub const COMMANDS: &[&str] = &[
    "linguist.lookup",
    "linguist.catalogStats",
    "linguist.normalizeCatalog",
    "linguist.setCurrentLanguage",
];

/// Handles `workspace/executeCommand`.
pub async fn handle_execute_command(
    backend: &Backend,
    params: ExecuteCommandParams,
) -> Result<Option<Value>> {
    tracing::debug!(command = %params.command, "Execute Command request");

    let argument = params.arguments.into_iter().next();
    match params.command.as_str() {
        "linguist.lookup" => handle_lookup(backend, argument).await,
        "linguist.catalogStats" => handle_catalog_stats(backend, argument).await,
        "linguist.normalizeCatalog" => handle_normalize_catalog(backend, argument).await,
        "linguist.setCurrentLanguage" => handle_set_current_language(backend, argument).await,
        _ => {
            tracing::warn!("Unknown command: {}", params.command);
            Ok(None)
        }
    }
}

/// Parses the first command argument, logging invalid input.
fn parse_args<T: for<'de> Deserialize<'de>>(command: &str, argument: Option<Value>) -> Option<T> {
    let Some(argument) = argument else {
        tracing::warn!("Missing arguments for {}", command);
        return None;
    };
    match serde_json::from_value(argument) {
        Ok(args) => Some(args),
        Err(error) => {
            tracing::warn!("Invalid arguments for {}: {}", command, error);
            None
        }
    }
}

/// `linguist.lookup` arguments
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupArgs {
    context: String,
    source: String,
    /// Disambiguation comment
    comment: Option<String>,
    /// Count for numerus messages
    n: Option<u64>,
    /// Catalog language; defaults to the current language
    language: Option<String>,
}

/// `linguist.lookup` result
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupResult {
    translation: String,
    /// Language of the catalog consulted, `None` when no catalog matched.
    language: Option<String>,
}

/// Runs `linguist.lookup`: the runtime translation of a message, falling
/// back to the source text. Lookups in the configured source language
/// return the source text.
///
/// Every catalog whose language is a candidate of the requested locale is
/// installed into one chain: `fr` catalogs first, then `fr_FR` ones, each
/// group in path order. Later catalogs win.
async fn handle_lookup(backend: &Backend, argument: Option<Value>) -> Result<Option<Value>> {
    let Some(args) = parse_args::<LookupArgs>("linguist.lookup", argument) else {
        return Ok(None);
    };

    let catalogs = backend.state.catalogs().await;
    let available: Vec<String> = {
        let db = backend.state.db.lock().await;
        let mut languages: Vec<String> = Vec::new();
        for language in catalogs.iter().filter_map(|file| catalog_language(&*db, *file)) {
            if !languages.contains(&language) {
                languages.push(language);
            }
        }
        languages
    };
    let language = match args.language {
        Some(language) => Some(language),
        None => backend.effective_language(&available).await,
    };
    let source_language =
        backend.config_manager.lock().await.get_settings().source_language.clone();
    if language.is_some() && language == source_language {
        let translation = args.n.map_or_else(
            || args.source.clone(),
            |n| args.source.replace("%n", &n.to_string()),
        );
        return Ok(serde_json::to_value(LookupResult { translation, language }).ok());
    }

    let (chain, matched_language) = {
        let db = backend.state.db.lock().await;
        let languages: Vec<(CatalogFile, Option<String>)> = catalogs
            .iter()
            .map(|file| (*file, catalog_language(&*db, *file).map(|lang| normalize_locale(&lang))))
            .collect();
        let candidates = language.as_deref().map(locale_candidates).unwrap_or_default();
        let mut chain = TranslatorChain::new();
        // Least specific first, so `fr_FR` catalogs override `fr` ones
        for candidate in candidates.iter().rev() {
            for (file, _) in languages.iter().filter(|(_, lang)| lang.as_ref() == Some(candidate)) {
                match parse_catalog_file(&*db, *file) {
                    Ok(parsed) => chain.install(Translator::from_catalog(&parsed.catalog)),
                    Err(error) => tracing::debug!(
                        "Skipping unparsable catalog {}: {}",
                        file.path(&*db).display(),
                        error
                    ),
                }
            }
        }
        let matched = candidates.into_iter().find(|candidate| {
            languages.iter().any(|(_, lang)| lang.as_deref() == Some(candidate.as_str()))
        });
        (chain, matched)
    };

    let comment = args.comment.as_deref();
    let translation = match args.n {
        Some(n) => chain.translate_plural(&args.context, &args.source, comment, n),
        None => chain.translate(&args.context, &args.source, comment).into_owned(),
    };
    let language = (!chain.is_empty()).then_some(matched_language).flatten();
    let result = LookupResult { translation, language };

    Ok(serde_json::to_value(result).ok())
}

/// `linguist.catalogStats` arguments
#[derive(Debug, Default, Deserialize)]
struct CatalogStatsArgs {
    /// Restricts the report to one catalog.
    uri: Option<Url>,
}

/// One row of the `linguist.catalogStats` result
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CatalogStatsEntry {
    uri: Url,
    language: Option<String>,
    #[serde(flatten)]
    stats: CatalogStats,
    percent_finished: usize,
}

/// Runs `linguist.catalogStats`.
async fn handle_catalog_stats(backend: &Backend, argument: Option<Value>) -> Result<Option<Value>> {
    let args = match argument {
        Some(_) => parse_args::<CatalogStatsArgs>("linguist.catalogStats", argument)
            .unwrap_or_default(),
        None => CatalogStatsArgs::default(),
    };
    let wanted = args.uri.as_ref().and_then(Backend::uri_to_path);

    let catalogs = backend.state.catalogs().await;
    let db = backend.state.db.lock().await;
    let mut entries = Vec::new();
    for file in catalogs {
        let path = file.path(&*db);
        if wanted.as_ref().is_some_and(|wanted| wanted != path) {
            continue;
        }
        let Ok(uri) = Url::from_file_path(path) else {
            continue;
        };
        let Ok(parsed) = parse_catalog_file(&*db, file) else {
            tracing::debug!("Skipping unparsable catalog: {}", path.display());
            continue;
        };
        let stats = CatalogStats::of(&parsed.catalog);
        entries.push(CatalogStatsEntry {
            uri,
            language: catalog_language(&*db, file),
            stats,
            percent_finished: stats.percent_finished(),
        });
    }
    drop(db);

    match serde_json::to_value(&entries) {
        Ok(value) => Ok(Some(value)),
        Err(error) => {
            tracing::error!("Failed to serialize catalog stats: {}", error);
            Ok(Some(serde_json::json!([])))
        }
    }
}

/// `linguist.normalizeCatalog` arguments
#[derive(Debug, Deserialize)]
struct NormalizeCatalogArgs {
    uri: Url,
}

/// Runs `linguist.normalizeCatalog`: rewrites the document in lupdate's
/// layout.
async fn handle_normalize_catalog(
    backend: &Backend,
    argument: Option<Value>,
) -> Result<Option<Value>> {
    let Some(args) = parse_args::<NormalizeCatalogArgs>("linguist.normalizeCatalog", argument)
    else {
        return Ok(None);
    };
    let Some(file) = backend.catalog_for_uri(&args.uri).await else {
        tracing::warn!("Not an indexed catalog: {}", args.uri);
        return Ok(None);
    };

    let edit = {
        let db = backend.state.db.lock().await;
        let text = file.text(&*db);
        match parse_catalog_file(&*db, file) {
            Ok(parsed) => {
                let normalized = write_catalog(&parsed.catalog);
                (normalized != *text).then(|| {
                    let end = LineIndex::new(text).end_position(text);
                    TextEdit {
                        range: Range { start: SourcePosition::default().into(), end: end.into() },
                        new_text: normalized,
                    }
                })
            }
            Err(error) => {
                drop(db);
                backend
                    .client
                    .show_message(MessageType::ERROR, format!("Cannot normalize catalog: {error}"))
                    .await;
                return Ok(None);
            }
        }
    };

    let Some(edit) = edit else {
        tracing::debug!("Catalog already normalized: {}", args.uri);
        return Ok(None);
    };

    let mut changes = HashMap::new();
    changes.insert(args.uri, vec![edit]);
    if let Err(error) =
        backend.client.apply_edit(WorkspaceEdit { changes: Some(changes), ..Default::default() }).await
    {
        tracing::error!("Failed to apply workspace edit: {}", error);
    }

    Ok(None)
}

/// `linguist.setCurrentLanguage` arguments
#[derive(Debug, Default, Deserialize)]
struct SetCurrentLanguageArgs {
    /// Language code; `null` resets.
    language: Option<String>,
}

/// Runs `linguist.setCurrentLanguage`.
///
/// The current language comes first in hovers and is the default for
/// `linguist.lookup`.
async fn handle_set_current_language(
    backend: &Backend,
    argument: Option<Value>,
) -> Result<Option<Value>> {
    let args = match argument {
        Some(_) => {
            let Some(args) =
                parse_args::<SetCurrentLanguageArgs>("linguist.setCurrentLanguage", argument)
            else {
                return Ok(None);
            };
            args
        }
        None => SetCurrentLanguageArgs::default(),
    };

    tracing::debug!(language = ?args.language, "Executing linguist.setCurrentLanguage");

    let mut current_language = backend.state.current_language.lock().await;
    current_language.clone_from(&args.language);
    drop(current_language);

    backend
        .client
        .log_message(MessageType::INFO, format!("Current language set to: {:?}", args.language))
        .await;

    Ok(None)
}
