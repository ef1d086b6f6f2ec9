use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::constants::CONFIG_FILENAME;

#[derive(Debug, Deserialize, Default, Clone)]
/// Top-level configuration struct.
pub struct Config {
    #[serde(default)]
    /// The main configuration section for castfix.
    pub castfix: CastfixConfig,
    /// The path to the configuration file this was loaded from.
    /// Set during `load_from_path`, `None` if using defaults or programmatic config.
    #[serde(skip)]
    pub config_file_path: Option<std::path::PathBuf>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(deny_unknown_fields)]
/// Configuration options for castfix.
pub struct CastfixConfig {
    /// File extensions to rewrite (without the dot).
    pub extensions: Option<Vec<String>>,
    /// List of folders to exclude.
    pub exclude_folders: Option<Vec<String>>,
    /// List of folders to include even if excluded by default.
    pub include_folders: Option<Vec<String>>,
    /// Re-parse rewritten files and reject results with new syntax errors.
    pub verify: Option<bool>,
    /// Leave casts inside arguments of function-like macros untouched.
    pub skip_macro_arguments: Option<bool>,
}

impl Config {
    /// Loads configuration from the default location (.castfix.toml in current dir or above).
    #[must_use]
    pub fn load() -> Self {
        Self::load_from_path(Path::new("."))
    }

    /// Loads configuration starting from a specific path and traversing up.
    ///
    /// Unreadable or malformed files are ignored and the search continues in
    /// the parent directory; use [`Config::try_load_file`] to surface errors.
    #[must_use]
    pub fn load_from_path(path: &Path) -> Self {
        let mut current = path.to_path_buf();
        if current.is_file() {
            current.pop();
        }

        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                if let Ok(config) = Self::try_load_file(&candidate) {
                    return config;
                }
            }

            if !current.pop() {
                break;
            }
        }

        Config::default()
    }

    /// Loads one configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid configuration.
    pub fn try_load_file(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut config = toml::from_str::<Config>(&content)
            .map_err(|e| anyhow::anyhow!("Invalid config {}: {}", path.display(), e))?;
        config.config_file_path = Some(path.to_path_buf());
        Ok(config)
    }
}
