//! Qt Linguist translation catalogs: model, TS reader/writer, lookup and checks.

pub mod error;
pub mod locale;
pub mod lookup;
pub mod model;
pub mod parser;
pub mod stats;
pub mod validate;
pub mod writer;

pub use error::{
    CatalogError,
    LoadError,
};
pub use lookup::{
    Translator,
    TranslatorChain,
};
pub use model::{
    Catalog,
    Context,
    Extra,
    Location,
    LocationMode,
    Message,
    MessageId,
    Translation,
    TranslationBody,
    TranslationKind,
};
pub use parser::{
    ParsedCatalog,
    looks_like_ts_catalog,
    parse_catalog,
};
pub use stats::CatalogStats;
pub use validate::{
    Issue,
    IssueKind,
    ValidationOptions,
    validate_catalog,
};
pub use writer::{
    escape_text,
    write_catalog,
};
