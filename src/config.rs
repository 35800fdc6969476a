//! Engine configuration.
//!
//! Handles loading and validating the TOML file that tells the cache engine
//! where images live and which defaults to use for requests that don't
//! specify everything.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! # cache_root = "data"        # Root that sources resolve against
//! web_root_fallback = "webroot" # Used when cache_root is not set
//!
//! [defaults]
//! size = [75, 75]              # Thumbnail width, height (0 = derive)
//! quality = 85                 # Encoding quality (0-100)
//! ```
//!
//! Returned thumbnail paths are relative to whichever root is in effect, so
//! a web server rooted at the same directory can serve them directly.
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{Quality, Size};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Cache engine configuration.
///
/// Built once and handed to [`ThumbnailCache`](crate::cache::ThumbnailCache);
/// nothing in the crate reads ambient global paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Root directory that source paths resolve against.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_root: Option<PathBuf>,
    /// Root used when `cache_root` is absent.
    pub web_root_fallback: PathBuf,
    /// Values used for requests built with
    /// [`ThumbnailCache::request`](crate::cache::ThumbnailCache::request).
    pub defaults: DefaultsConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_root: None,
            web_root_fallback: PathBuf::from("webroot"),
            defaults: DefaultsConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Config rooted at `root`, all other values default.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            cache_root: Some(root.into()),
            ..Self::default()
        }
    }

    /// The root in effect.
    pub fn root(&self) -> &Path {
        self.cache_root.as_deref().unwrap_or(&self.web_root_fallback)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.defaults.quality > 100 {
            return Err(ConfigError::Validation(
                "defaults.quality must be 0-100".into(),
            ));
        }
        if self.root().as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "cache_root or web_root_fallback must be a non-empty path".into(),
            ));
        }
        Ok(())
    }
}

/// Request defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DefaultsConfig {
    /// Thumbnail size as `[width, height]`. Zero derives that edge.
    pub size: [u32; 2],
    /// Encoding quality, 0-100.
    pub quality: u32,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            size: [75, 75],
            quality: 85,
        }
    }
}

impl DefaultsConfig {
    pub fn size(&self) -> Size {
        Size::new(self.size[0], self.size[1])
    }

    pub fn quality(&self) -> Quality {
        Quality::new(f64::from(self.quality))
    }
}

/// Load config from a TOML file.
///
/// A missing file yields the defaults. Unknown keys are rejected and the
/// result is validated.
pub fn load_config(path: &Path) -> Result<EngineConfig, ConfigError> {
    if !path.exists() {
        return Ok(EngineConfig::default());
    }
    let content = fs::read_to_string(path)?;
    EngineConfig::from_toml_str(&content)
}

/// Returns a fully-commented stock config file with all keys and explanations.
pub fn stock_config_toml() -> &'static str {
    r##"# Image Version Configuration
# ===========================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# Root directory that source image paths are resolved against. Thumbnails
# are written next to their sources and returned relative to this root.
# cache_root = "data"

# Root used when cache_root is not set.
web_root_fallback = "webroot"

# ---------------------------------------------------------------------------
# Request defaults
# ---------------------------------------------------------------------------
[defaults]
# Thumbnail size as [width, height]. A zero edge is derived from the
# source aspect ratio.
size = [75, 75]

# Encoding quality (0 = smallest, 100 = best). JPEG uses it directly, PNG
# maps it to a compression level, GIF ignores it.
quality = 85
"##
}
