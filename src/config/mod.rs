//! Server configuration: `.qt-linguist.json` and client settings.
mod loader;
mod manager;
pub mod matcher;
mod types;

pub use loader::CONFIG_FILE_NAME;
pub use manager::ConfigManager;
pub use matcher::{
    FileMatcher,
    MatcherError,
};
pub use types::{
    ConfigError,
    DiagnosticsConfig,
    IndexingConfig,
    LinguistSettings,
    ServerSettings,
    TranslationFilesConfig,
    ValidationError,
};
