//!
//! Configuration for tagsplice: the `.tagsplice.toml` file format, loading and discovery.

use crate::host::Dialect;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Name of the configuration file looked for during discovery
pub const CONFIG_FILE_NAME: &str = ".tagsplice.toml";

/// Directories climbed before discovery gives up
const MAX_DEPTH: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Host dialect for every file; inferred from the file extension when unset
    pub dialect: Option<Dialect>,

    /// Treat a template standing alone at the top level as the default template
    pub implicit_default_template: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dialect: None,
            implicit_default_template: true,
        }
    }
}

/// Errors that can occur when loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to read config file at {path}: {source}")]
    IoError { source: io::Error, path: String },

    /// Failed to parse the configuration content
    #[error("Failed to parse config: {0}")]
    ParseError(String),
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::IoError {
            source,
            path: path.display().to_string(),
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            ConfigError::ParseError(msg) => ConfigError::ParseError(format!("{}: {msg}", path.display())),
            other => other,
        })
    }

    /// Look for a config file in `start` and its ancestors.
    ///
    /// The search stops at the first directory containing `.git`, so a project never picks up
    /// configuration from outside its repository.
    pub fn discover(start: &Path) -> Result<Option<(PathBuf, Self)>, ConfigError> {
        let mut current = Some(start);
        let mut depth = 0;

        while let Some(dir) = current {
            if depth >= MAX_DEPTH {
                log::debug!("[tagsplice-config] Maximum traversal depth reached");
                break;
            }

            let candidate = dir.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                log::debug!("[tagsplice-config] Found config file: {}", candidate.display());
                let config = Self::load(&candidate)?;
                return Ok(Some((candidate, config)));
            }

            if dir.join(".git").exists() {
                log::debug!("[tagsplice-config] Stopping at .git directory in {}", dir.display());
                break;
            }

            current = dir.parent();
            depth += 1;
        }

        Ok(None)
    }

    /// Dialect for `path`, honouring the configured override
    pub fn dialect_for(&self, path: &Path) -> Dialect {
        self.dialect.unwrap_or_else(|| Dialect::from_path(path))
    }
}
