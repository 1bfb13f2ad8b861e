//! Store configuration, loadable from TOML.
//!
//! ```toml
//! max_write_depth = 8
//! default_title = "Catalog"
//!
//! [rules.sort]
//! required = true
//! enum = ["asc", "desc"]
//!
//! [rules.page]
//! pattern = "^[0-9]+$"
//! ```

use std::{
  fs,
  io::Error as IOError,
  path::Path,
};

use serde::Deserialize;
use thiserror::Error;
use toml::de::Error as TomlError;

use crate::validator::ValidationRules;

pub const DEFAULT_MAX_WRITE_DEPTH: usize = 16;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
  /// Maximum nesting of write cycles triggered from callbacks.
  pub max_write_depth: usize,
  /// Title for history entries when the document has none.
  pub default_title:   String,
  /// Rules checked by [`ParamStore::validate`](crate::ParamStore::validate).
  pub rules:           ValidationRules,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      max_write_depth: DEFAULT_MAX_WRITE_DEPTH,
      default_title:   String::new(),
      rules:           ValidationRules::new(),
    }
  }
}

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config: {0}")]
  Io(#[from] IOError),
  #[error("invalid config: {0}")]
  Parse(#[from] TomlError),
}

impl Config {
  pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
    Ok(toml::from_str(source)?)
  }

  pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let config = Self::from_toml(&fs::read_to_string(path)?)?;
    tracing::debug!(path = %path.display(), rules = config.rules.len(), "loaded config");
    Ok(config)
  }
}
