//! Settings injected into request builders and wire adapters.
//!
//! Loaded from `panelio.toml`; every field has a default so an absent file or
//! a partial file is fine.

pub mod error;

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

pub use error::{Error, Result};

pub const CONFIG_FILE_NAME: &str = "panelio.toml";

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelioConfig {
    pub request: RequestConfig,
    pub messages: Messages,
}

/// Defaults applied while building calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestConfig {
    /// Page size used when paging is requested without one.
    pub default_page_size: i64,
    /// Operator used by `add_filter` when none is given. WHM treats the empty
    /// string as "compare".
    pub default_filter_operator: String,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            default_filter_operator: String::new(),
        }
    }
}

/// Generic texts used when the server gives nothing better. Kept here so a
/// caller can supply translated strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Messages {
    pub unknown_error: String,
    pub unparsable_response: String,
    pub unspecified_failure: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            unknown_error: "An unknown error occurred.".into(),
            unparsable_response: "The API response could not be parsed.".into(),
            unspecified_failure: "No specific error was returned with the failed API call.".into(),
        }
    }
}

impl PanelioConfig {
    pub fn from_toml_str(data: &str) -> Result<Self> {
        Ok(toml::from_str(data)?)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reads the file at `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path)?;
        Self::from_toml_str(&data)
    }

    /// Loads from the platform config directory.
    pub fn discover() -> Result<Self> {
        let path = default_config_path()
            .ok_or_else(|| Error::message("could not determine the config directory"))?;
        Self::load(&path)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }
}

/// `<config dir>/panelio/panelio.toml`, when a home directory is known.
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "panelio").map(|d| d.config_dir().join(CONFIG_FILE_NAME))
}
