//! Shared configuration loader for the canvas tools.
//!
//! `defaults/canvas.default.toml` is embedded into every binary so that docs
//! and runtime behavior stay in sync. Applications layer user-specific files
//! on top of those defaults via [`Loader`] before deserializing into
//! [`CanvasConfig`].

use canvas_core::session::EditorOptions;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub use config::ConfigError;

const DEFAULT_TOML: &str = include_str!("../defaults/canvas.default.toml");

/// Top-level configuration consumed by canvas applications.
#[derive(Debug, Clone, Deserialize)]
pub struct CanvasConfig {
    pub editor: EditorConfig,
    pub format: FormatConfig,
    pub inspect: InspectConfig,
}

/// Mirrors the knobs exposed by the editing session.
#[derive(Debug, Clone, Deserialize)]
pub struct EditorConfig {
    pub debounce_ms: u64,
}

impl From<EditorConfig> for EditorOptions {
    fn from(config: EditorConfig) -> Self {
        EditorOptions {
            debounce: Duration::from_millis(config.debounce_ms),
        }
    }
}

impl From<&EditorConfig> for EditorOptions {
    fn from(config: &EditorConfig) -> Self {
        EditorOptions {
            debounce: Duration::from_millis(config.debounce_ms),
        }
    }
}

/// Import/normalization behavior.
#[derive(Debug, Clone, Deserialize)]
pub struct FormatConfig {
    pub promote: bool,
}

/// Controls tree-related inspect output.
#[derive(Debug, Clone, Deserialize)]
pub struct InspectConfig {
    pub tree: InspectTreeConfig,
    pub preview: InspectPreviewConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InspectTreeConfig {
    pub show_node_ids: bool,
    pub show_formats: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InspectPreviewConfig {
    pub max_text_length: usize,
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override (useful for CLI settings).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<CanvasConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<CanvasConfig, ConfigError> {
    Loader::new().build()
}
