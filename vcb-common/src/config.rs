//! Configuration file discovery and loading
//!
//! Config file resolution priority:
//! 1. Explicit path (command-line argument)
//! 2. Environment variable `VCB_CONFIG`
//! 3. User config directory (`~/.config/vcb/<module>.toml` on Linux)
//! 4. System config directory (`/etc/vcb/<module>.toml`, Linux only)
//!
//! A config file that cannot be found through 3 or 4 is not an error; callers
//! fall back to compiled defaults. A file named explicitly (1 or 2) must exist.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "VCB_CONFIG";

/// Locates the TOML config file for one tool
#[derive(Debug, Clone)]
pub struct ConfigLocator {
    module_name: String,
}

impl ConfigLocator {
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
        }
    }

    /// Find the config file to load, or `None` if no file is configured or present
    pub fn locate(&self, explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        // Priority 1: Command-line argument
        if let Some(path) = explicit {
            return Self::require_file(path.to_path_buf(), "command line");
        }

        // Priority 2: Environment variable
        if let Ok(value) = std::env::var(CONFIG_ENV_VAR) {
            if !value.trim().is_empty() {
                return Self::require_file(PathBuf::from(value), CONFIG_ENV_VAR);
            }
        }

        // Priority 3 and 4: Platform locations
        for candidate in self.default_candidates() {
            if candidate.is_file() {
                return Ok(Some(candidate));
            }
        }

        Ok(None)
    }

    /// Platform config file locations, in lookup order
    pub fn default_candidates(&self) -> Vec<PathBuf> {
        let file_name = format!("{}.toml", self.module_name);
        let mut candidates = Vec::new();

        if let Some(dir) = dirs::config_dir() {
            candidates.push(dir.join("vcb").join(&file_name));
        }

        if cfg!(target_os = "linux") {
            candidates.push(PathBuf::from("/etc/vcb").join(&file_name));
        }

        candidates
    }

    fn require_file(path: PathBuf, source: &str) -> Result<Option<PathBuf>> {
        if path.is_file() {
            Ok(Some(path))
        } else {
            Err(Error::NotFound(format!(
                "config file {} (from {})",
                path.display(),
                source
            )))
        }
    }
}

/// Load a TOML config file, or compiled defaults when `path` is `None`
///
/// Runs before logging is configured, so it reports through its result only;
/// callers log the outcome once a subscriber is installed.
pub fn load_toml_config<T>(path: Option<&Path>) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let Some(path) = path else {
        return Ok(T::default());
    };

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    Ok(config)
}

/// Logging configuration (`[logging]` table)
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error)
    pub level: String,

    /// Log file path (optional, logs to stderr only if not specified)
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}
