//! Configuration file loader.

use std::path::{Path, PathBuf};

use super::Config;

/// File name looked up in the current directory.
pub const LOCAL_CONFIG_FILE: &str = "journal-translator.toml";

/// Configuration loader that searches multiple locations.
#[derive(Debug)]
pub struct ConfigLoader {
    /// Search paths in order of priority.
    search_paths: Vec<PathBuf>,
}

impl ConfigLoader {
    /// Create a new config loader with default search paths.
    #[must_use]
    pub fn new() -> Self {
        let mut search_paths = Vec::new();

        // 1. Current directory: journal-translator.toml
        search_paths.push(PathBuf::from(LOCAL_CONFIG_FILE));

        // 2. User config directory: ~/.config/journal-translator/config.toml
        if let Some(config_dir) = dirs::config_dir() {
            search_paths.push(config_dir.join("journal-translator").join("config.toml"));
        }

        Self { search_paths }
    }

    /// Create a config loader with a specific config file path.
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            search_paths: vec![path],
        }
    }

    /// Load configuration from the first available file, or return defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed.
    pub fn load(&self) -> Result<Config, ConfigError> {
        if let Some(path) = self.find_config_file() {
            tracing::debug!(path = %path.display(), "Loading config file");
            return Self::load_from_path(&path);
        }

        tracing::debug!("No config file found, using defaults");
        Ok(Config::default())
    }

    /// Load the first available file, or write defaults to the preferred
    /// location and return them.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be parsed or the default
    /// file cannot be written.
    pub fn load_or_create(&self) -> Result<(Config, PathBuf), ConfigError> {
        if let Some(path) = self.find_config_file() {
            tracing::debug!(path = %path.display(), "Loading config file");
            return Ok((Self::load_from_path(&path)?, path));
        }

        let path = self.default_path().ok_or(ConfigError::NoSearchPath)?;
        let config = Config::default();
        save(&config, &path)?;
        tracing::info!(path = %path.display(), "Default configuration created");
        Ok((config, path))
    }

    /// Load configuration from a specific path.
    fn load_from_path(path: &Path) -> Result<Config, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the search paths for debugging.
    #[must_use]
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Find the first config file that exists.
    #[must_use]
    pub fn find_config_file(&self) -> Option<PathBuf> {
        self.search_paths.iter().find(|p| p.exists()).cloned()
    }

    /// Where a new config file is written: the last (user-level) search path.
    #[must_use]
    pub fn default_path(&self) -> Option<PathBuf> {
        self.search_paths.last().cloned()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Write `config` to `path` as TOML, creating parent directories.
///
/// # Errors
///
/// Returns an error if serialization or any filesystem write fails.
pub fn save(config: &Config, path: &Path) -> Result<(), ConfigError> {
    let content = toml::to_string_pretty(config)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;
    }
    std::fs::write(path, content).map_err(|e| ConfigError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Errors that can occur during configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to write config file {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Invalid translation API URL {url}: {reason}")]
    InvalidApiUrl { url: String, reason: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("No location available for a config file")]
    NoSearchPath,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_loader_default_paths() {
        let loader = ConfigLoader::new();
        assert!(!loader.search_paths().is_empty());
        assert!(loader.search_paths()[0].ends_with(LOCAL_CONFIG_FILE));
    }

    #[test]
    fn test_config_loader_returns_defaults_when_no_file() {
        let loader = ConfigLoader::with_path(PathBuf::from("/nonexistent/path.toml"));
        let config = loader.load().unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_or_create_writes_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");
        let loader = ConfigLoader::with_path(path.clone());

        let (config, used) = loader.load_or_create().unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(used, path);
        assert!(path.exists());

        // Second call reads the file back.
        let (again, _) = loader.load_or_create().unwrap();
        assert_eq!(again, config);
    }

    #[test]
    fn test_save_then_load_preserves_changes() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        let mut config = Config::default();
        config.translate.user_language = "fr".to_string();
        config.journal.poll_interval_ms = 500;

        save(&config, &path).unwrap();
        let loaded = ConfigLoader::with_path(path).load().unwrap();
        assert_eq!(loaded.translate.user_language, "fr");
        assert_eq!(loaded.journal.poll_interval_ms, 500);
    }

    #[test]
    fn test_parse_error_reports_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.toml");
        std::fs::write(&path, "[journal\nenabled = ").unwrap();

        let err = ConfigLoader::with_path(path.clone()).load().unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains("broken.toml"));
    }
}
