//! Holds the active settings for the server.

use std::path::PathBuf;

use super::{
    ConfigError,
    LinguistSettings,
    loader,
};

/// Owns the validated settings and the workspace root they came from.
#[derive(Default, Debug, Clone)]
pub struct ConfigManager {
    current_settings: LinguistSettings,
    workspace_root: Option<PathBuf>,
}

impl ConfigManager {
    #[must_use]
    pub fn new() -> Self {
        Self { current_settings: LinguistSettings::default(), workspace_root: None }
    }

    /// Loads `.qt-linguist.json` from the workspace root, falling back to
    /// defaults when the file is absent.
    ///
    /// # Errors
    /// - File read error
    /// - JSON parse error
    /// - Validation error
    pub fn load_settings(&mut self, workspace_root: Option<PathBuf>) -> Result<(), ConfigError> {
        tracing::debug!("Loading settings for workspace: {:?}", workspace_root);

        let settings = if let Some(root) = &workspace_root {
            loader::load_from_workspace(root)?.map_or_else(LinguistSettings::default, |ws| {
                tracing::debug!("Loaded workspace settings: {:?}", ws);
                ws
            })
        } else {
            LinguistSettings::default()
        };

        settings.validate().map_err(ConfigError::ValidationErrors)?;

        self.current_settings = settings;
        self.workspace_root = workspace_root;
        tracing::debug!("Settings loaded successfully: {:?}", self.current_settings);

        Ok(())
    }

    /// Replaces the settings after validating them. Used for
    /// `workspace/didChangeConfiguration`.
    ///
    /// # Errors
    /// Validation error; the previous settings stay in place.
    pub fn update_settings(&mut self, new_settings: LinguistSettings) -> Result<(), ConfigError> {
        tracing::debug!("Updating settings...");

        new_settings.validate().map_err(ConfigError::ValidationErrors)?;

        self.current_settings = new_settings;
        tracing::debug!("Settings updated successfully");

        Ok(())
    }

    #[must_use]
    pub const fn get_settings(&self) -> &LinguistSettings {
        &self.current_settings
    }

    #[must_use]
    pub const fn workspace_root(&self) -> Option<&PathBuf> {
        self.workspace_root.as_ref()
    }
}
