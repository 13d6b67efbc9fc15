//! Site configuration module.
//!
//! Handles loading, validating, and merging the optional `config.toml` that
//! lives in the source root. Stock defaults reproduce the fixed layout the
//! documentation site has always used, so a source tree without any config
//! file builds exactly as before.
//!
//! ## Config File Location
//!
//! ```text
//! doc/site/
//! ├── config.toml              # Optional, overrides stock defaults
//! ├── template.html            # Default page template
//! ├── template-core.html       # Template for `^category core` pages
//! ├── style.scss               # Stylesheet source
//! └── **/*.markdown            # Pages
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [templates]
//! default = "template.html"       # Relative to the source root
//! core = "template-core.html"     # Relative to the source root
//! core_category = "core"          # Category that selects the core template
//!
//! [stylesheet]
//! source = "style.scss"           # Relative to the source root
//! output = "style.css"            # Relative to the output root
//! compiler = "sass"               # Invoked as `<compiler> <source> <output>`
//!
//! [markdown]
//! extension = "markdown"          # Files named *.<extension> become pages
//! definition_lists = true
//! highlight = true                # Syntax-highlight fenced code blocks
//! tables = false
//! footnotes = false
//! strikethrough = false
//! smart_punctuation = false
//!
//! [watch]
//! poll_interval_ms = 300
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the config file looked up in the source root.
pub const CONFIG_FILENAME: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Page template locations and category routing.
    pub templates: TemplatesConfig,
    /// Stylesheet source, compiled output and compiler command.
    pub stylesheet: StylesheetConfig,
    /// Page discovery and markdown extensions.
    pub markdown: MarkdownConfig,
    /// Watch loop settings.
    pub watch: WatchConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.markdown.extension.is_empty() {
            return Err(ConfigError::Validation(
                "markdown.extension must not be empty".into(),
            ));
        }
        if self.markdown.extension.starts_with('.') {
            return Err(ConfigError::Validation(
                "markdown.extension must not start with a dot".into(),
            ));
        }
        if self.stylesheet.compiler.trim().is_empty() {
            return Err(ConfigError::Validation(
                "stylesheet.compiler must not be empty".into(),
            ));
        }
        if self.templates.core_category.is_empty() {
            return Err(ConfigError::Validation(
                "templates.core_category must not be empty".into(),
            ));
        }
        if self.watch.poll_interval_ms == 0 {
            return Err(ConfigError::Validation(
                "watch.poll_interval_ms must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

/// Page template locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemplatesConfig {
    /// Template used for every page outside the core category.
    pub default: PathBuf,
    /// Template used for pages whose category equals `core_category`.
    pub core: PathBuf,
    /// Category value that routes a page to the core template.
    pub core_category: String,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            default: PathBuf::from("template.html"),
            core: PathBuf::from("template-core.html"),
            core_category: "core".to_string(),
        }
    }
}

/// Stylesheet compilation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StylesheetConfig {
    /// Stylesheet source, relative to the source root.
    pub source: PathBuf,
    /// Compiled stylesheet, relative to the output root.
    pub output: PathBuf,
    /// Compiler executable, resolved through `PATH`.
    pub compiler: String,
}

impl Default for StylesheetConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from("style.scss"),
            output: PathBuf::from("style.css"),
            compiler: "sass".to_string(),
        }
    }
}

/// Page discovery and markdown extension settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarkdownConfig {
    /// File extension (without the dot) that marks a page source.
    pub extension: String,
    pub definition_lists: bool,
    /// Wrap fenced code blocks with a language in syntax-highlighting spans.
    pub highlight: bool,
    pub tables: bool,
    pub footnotes: bool,
    pub strikethrough: bool,
    /// Curly quotes, en/em dashes and ellipses.
    pub smart_punctuation: bool,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            extension: "markdown".to_string(),
            definition_lists: true,
            highlight: true,
            tables: false,
            footnotes: false,
            strikethrough: false,
            smart_punctuation: false,
        }
    }
}

/// Watch loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchConfig {
    /// Sleep between two polls of the source tree, in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 300,
        }
    }
}

// =============================================================================
// Resolved paths
// =============================================================================

/// Every filesystem location a run touches, resolved against the two roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitePaths {
    pub source_root: PathBuf,
    pub output_root: PathBuf,
    pub default_template: PathBuf,
    pub core_template: PathBuf,
    pub stylesheet_source: PathBuf,
    pub stylesheet_output: PathBuf,
}

impl SitePaths {
    pub fn resolve(config: &SiteConfig, source_root: &Path, output_root: &Path) -> Self {
        Self {
            source_root: source_root.to_path_buf(),
            output_root: output_root.to_path_buf(),
            default_template: source_root.join(&config.templates.default),
            core_template: source_root.join(&config.templates.core),
            stylesheet_source: source_root.join(&config.stylesheet.source),
            stylesheet_output: output_root.join(&config.stylesheet.output),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// Base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the directory has no config file.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the source root, falling back to stock
/// defaults when the file does not exist.
pub fn load_config(source_root: &Path) -> Result<SiteConfig, ConfigError> {
    resolve_config(load_raw_config(source_root)?)
}

/// Returns a fully-commented stock `config.toml`.
///
/// Printed by `docgen --gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# docgen configuration
# ====================
# Place this file at the root of the documentation source tree.
# All settings are optional; values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Page templates
# ---------------------------------------------------------------------------
[templates]
# Both paths are relative to the source root. Templates may use the
# placeholders {title}, {html}, {mod} and {category}; write {{ and }} for
# literal braces.
default = "template.html"
core = "template-core.html"

# Pages declaring `^category <core_category>` use the core template.
core_category = "core"

# ---------------------------------------------------------------------------
# Stylesheet
# ---------------------------------------------------------------------------
[stylesheet]
# Source is relative to the source root, output to the output root.
source = "style.scss"
output = "style.css"

# Invoked as `<compiler> <source> <output>` whenever the source is newer
# than the compiled output. Must be on PATH.
compiler = "sass"

# ---------------------------------------------------------------------------
# Markdown
# ---------------------------------------------------------------------------
[markdown]
# Files named *.<extension> anywhere under the source root become pages.
extension = "markdown"

definition_lists = true

# Fenced code blocks that name a language (```python) are tokenized and
# wrapped in <span class="..."> elements inside <div class="codehilite">.
# Colors come from the site stylesheet.
highlight = true

tables = false
footnotes = false
strikethrough = false
smart_punctuation = false

# ---------------------------------------------------------------------------
# Watch mode (--watch)
# ---------------------------------------------------------------------------
[watch]
# Milliseconds to sleep between two polls of the source tree.
poll_interval_ms = 300
"##
}
