//! Application configuration for mirreview.
//!
//! User config lives at `~/.mirreview/mirreview.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ReviewError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "mirreview.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".mirreview";

/// Default autosave database file name inside the config directory.
const AUTOSAVE_DB_NAME: &str = "autosave.db";

// ---------------------------------------------------------------------------
// Enumerated settings
// ---------------------------------------------------------------------------

/// Whether topic header lines must end in a `\` continuation marker.
///
/// The two known document layouts disagree: newer ones sometimes drop the
/// marker, older ones always carry it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderStyle {
    /// Marker optional.
    #[default]
    Lenient,
    /// Marker required.
    Strict,
}

/// How the document converter treats tracked changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackChanges {
    Accept,
    Reject,
    #[default]
    All,
}

impl TrackChanges {
    /// Value passed to the converter's `--track-changes` flag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Reject => "reject",
            Self::All => "all",
        }
    }
}

/// Ordering of records inside each topic section of the markdown export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkdownOrder {
    #[default]
    Identifier,
    Title,
}

// ---------------------------------------------------------------------------
// Config structs (matching mirreview.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Markdown parser settings.
    #[serde(default)]
    pub parser: ParserConfig,

    /// External document converter settings.
    #[serde(default)]
    pub converter: ConverterConfig,

    /// Autosave storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Directory exports are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Record order inside markdown export topic sections.
    #[serde(default)]
    pub markdown_order: MarkdownOrder,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            markdown_order: MarkdownOrder::default(),
        }
    }
}

fn default_output_dir() -> String {
    ".".into()
}

/// `[parser]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Publisher domain used in product URLs.
    #[serde(default = "default_domain")]
    pub domain: String,

    /// Identifier prefix (`GAO` in `GAO-24-105123`).
    #[serde(default = "default_identifier_prefix")]
    pub identifier_prefix: String,

    /// Lines scanned after a title block for the identifier and URL.
    #[serde(default = "default_lookahead_window")]
    pub lookahead_window: usize,

    /// Topic header continuation-marker policy.
    #[serde(default)]
    pub header_style: HeaderStyle,

    /// Bold lines containing any of these phrases are never titles.
    #[serde(default = "default_banner_phrases")]
    pub banner_phrases: Vec<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            domain: default_domain(),
            identifier_prefix: default_identifier_prefix(),
            lookahead_window: default_lookahead_window(),
            header_style: HeaderStyle::default(),
            banner_phrases: default_banner_phrases(),
        }
    }
}

fn default_domain() -> String {
    "gao.gov".into()
}
fn default_identifier_prefix() -> String {
    "GAO".into()
}
fn default_lookahead_window() -> usize {
    5
}
fn default_banner_phrases() -> Vec<String> {
    vec!["Month in Review".into(), "LEGAL PRODUCTS".into()]
}

/// `[converter]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Converter executable.
    #[serde(default = "default_converter_command")]
    pub command: String,

    /// Tracked-changes handling.
    #[serde(default)]
    pub track_changes: TrackChanges,

    /// Hard limit on a single conversion, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            command: default_converter_command(),
            track_changes: TrackChanges::default(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_converter_command() -> String {
    "pandoc".into()
}
fn default_timeout_secs() -> u64 {
    60
}

/// `[storage]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Autosave database path; defaults to `~/.mirreview/autosave.db`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autosave_db: Option<String>,
}

// ---------------------------------------------------------------------------
// Runtime options (merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime parser options.
#[derive(Debug, Clone)]
pub struct ParserOptions {
    pub domain: String,
    pub identifier_prefix: String,
    pub lookahead_window: usize,
    pub header_style: HeaderStyle,
    pub banner_phrases: Vec<String>,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for ParserOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            domain: config.parser.domain.clone(),
            identifier_prefix: config.parser.identifier_prefix.clone(),
            lookahead_window: config.parser.lookahead_window,
            header_style: config.parser.header_style,
            banner_phrases: config.parser.banner_phrases.clone(),
        }
    }
}

/// Runtime converter options.
#[derive(Debug, Clone)]
pub struct ConverterOptions {
    pub command: String,
    pub track_changes: TrackChanges,
    pub timeout: Duration,
}

impl Default for ConverterOptions {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for ConverterOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            command: config.converter.command.clone(),
            track_changes: config.converter.track_changes,
            timeout: Duration::from_secs(config.converter.timeout_secs),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.mirreview/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| ReviewError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.mirreview/mirreview.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Resolve the autosave database path from config, falling back to the
/// config directory.
pub fn autosave_db_path(config: &AppConfig) -> Result<PathBuf> {
    match &config.storage.autosave_db {
        Some(path) => Ok(PathBuf::from(path)),
        None => Ok(config_dir()?.join(AUTOSAVE_DB_NAME)),
    }
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ReviewError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content)
        .map_err(|e| ReviewError::config(format!("failed to parse {}: {e}", path.display())))?;
    validate_config(&config)?;
    Ok(config)
}

/// Reject values the parser or converter cannot work with.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    if config.parser.lookahead_window == 0 {
        return Err(ReviewError::config(
            "parser.lookahead_window must be at least 1",
        ));
    }
    if config.parser.identifier_prefix.trim().is_empty() {
        return Err(ReviewError::config("parser.identifier_prefix is empty"));
    }
    if config.parser.domain.trim().is_empty() {
        return Err(ReviewError::config("parser.domain is empty"));
    }
    if config.converter.timeout_secs == 0 {
        return Err(ReviewError::config(
            "converter.timeout_secs must be at least 1",
        ));
    }
    Ok(())
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ReviewError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ReviewError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ReviewError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
