// Configuration: built-in defaults, then an optional JSON file in the
// user's config directory, then `AUDIOLIB_*` environment variables.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Backend root, without trailing slash.
    pub base_url: String,
    /// Pre-filled value of the upload category prompt.
    pub category: String,
    pub download_dir: PathBuf,
    pub log_level: String,
    pub timeout_secs: u64,
}

/// On-disk shape. Every key is optional so a partial file only overrides
/// what it names.
#[derive(Deserialize, Debug, Default)]
struct FileConfig {
    base_url: Option<String>,
    category: Option<String>,
    download_dir: Option<PathBuf>,
    log_level: Option<String>,
    timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: DEFAULT_BASE_URL.into(),
            category: "general".into(),
            download_dir: dirs::download_dir().unwrap_or_else(|| PathBuf::from(".")),
            log_level: "warn".into(),
            timeout_secs: 30,
        }
    }
}

impl Config {
    /// `~/.config/audiolib/config.json` on Linux, the platform equivalent
    /// elsewhere.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("audiolib").join("config.json"))
    }

    /// Full resolution used by the binary.
    pub fn load() -> Result<Self> {
        let mut config = match Self::default_path() {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Defaults overridden by the file at `path`. A missing file is not an
    /// error.
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut config = Self::default();
        if !path.exists() {
            return Ok(config);
        }
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let file: FileConfig = serde_json::from_str(&data)
            .with_context(|| format!("Parsing config file {}", path.display()))?;

        if let Some(v) = file.base_url {
            config.base_url = v;
        }
        if let Some(v) = file.category {
            config.category = v;
        }
        if let Some(v) = file.download_dir {
            config.download_dir = v;
        }
        if let Some(v) = file.log_level {
            config.log_level = v;
        }
        if let Some(v) = file.timeout_secs {
            config.timeout_secs = v;
        }
        config.normalize();
        Ok(config)
    }

    /// Apply environment overrides. `lookup` is `std::env::var` in
    /// production and a map in tests.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("AUDIOLIB_URL") {
            self.base_url = v;
        }
        if let Some(v) = lookup("AUDIOLIB_CATEGORY") {
            self.category = v;
        }
        if let Some(v) = lookup("AUDIOLIB_DOWNLOAD_DIR") {
            self.download_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("AUDIOLIB_LOG") {
            self.log_level = v;
        }
        self.normalize();
    }

    fn normalize(&mut self) {
        let trimmed = self.base_url.trim().trim_end_matches('/');
        self.base_url = trimmed.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::from_file(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_file_overrides() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"base_url": "http://music.local:8080/", "category": "jazz"}"#)
            .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.base_url, "http://music.local:8080");
        assert_eq!(config.category, "jazz");
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(Config::from_file(&path).is_err());
    }

    #[test]
    fn test_env_wins_over_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"base_url": "http://from-file", "log_level": "info"}"#).unwrap();

        let env: HashMap<&str, &str> = [
            ("AUDIOLIB_URL", "http://from-env//"),
            ("AUDIOLIB_DOWNLOAD_DIR", "/tmp/audio"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::from_file(&path).unwrap();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.base_url, "http://from-env");
        assert_eq!(config.download_dir, PathBuf::from("/tmp/audio"));
        assert_eq!(config.log_level, "info");
    }
}
