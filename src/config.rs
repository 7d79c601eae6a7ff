//! Configuration file parser for ~/.config/newswire/config.toml.
//!
//! The config file is optional — a missing file yields `Config::default()`,
//! which carries the built-in source registry. Unknown keys are silently
//! ignored by serde, though we log a warning when the file contains
//! potential typos.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use url::Url;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    /// A source in the `[sources]` table has an unusable feed URL.
    #[error("Invalid feed URL for source '{source_id}': {reason}")]
    InvalidSource { source_id: String, reason: String },
}

// ============================================================================
// Configuration Struct
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Missing keys fall back to `Default::default()`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the SQLite database file.
    pub database_path: String,

    /// Minutes before cached items for a source go stale and a request
    /// triggers a refetch.
    pub ttl_minutes: u64,

    /// Maximum number of items returned per source request.
    pub item_limit: i64,

    /// Seconds before an outbound feed fetch is abandoned.
    pub fetch_timeout_secs: u64,

    /// Source registry: identifier -> feed URL.
    pub sources: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        let mut sources = HashMap::new();
        sources.insert(
            "delfi".to_string(),
            "https://www.delfi.lv/rss/index.xml".to_string(),
        );
        Self {
            database_path: "newswire.db".to_string(),
            ttl_minutes: 10,
            item_limit: 50,
            fetch_timeout_secs: 30,
            sources,
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → silently accepted (serde default behavior), logged as warning
    /// - Unparseable or non-http(s) source URL → `Err(ConfigError::InvalidSource)`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // Check file size before reading to avoid slurping a corrupted or
        // runaway config file into memory.
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Race: file deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        // Parse the TOML content first as a raw table to detect unknown keys
        if let Ok(raw) = content.parse::<toml::Table>() {
            let known_keys = [
                "database_path",
                "ttl_minutes",
                "item_limit",
                "fetch_timeout_secs",
                "sources",
            ];
            for key in raw.keys() {
                if !known_keys.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        config.validate_sources()?;
        tracing::info!(
            path = %path.display(),
            sources = config.sources.len(),
            ttl_minutes = config.ttl_minutes,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Every configured source must carry a parseable http(s) URL with a
    /// host; anything else would only fail later, at fetch time, with a
    /// murkier error.
    fn validate_sources(&self) -> Result<(), ConfigError> {
        for (source, raw_url) in &self.sources {
            let url = Url::parse(raw_url).map_err(|e| ConfigError::InvalidSource {
                source_id: source.clone(),
                reason: e.to_string(),
            })?;
            match url.scheme() {
                "http" | "https" => {}
                scheme => {
                    return Err(ConfigError::InvalidSource {
                        source_id: source.clone(),
                        reason: format!("unsupported scheme '{}'", scheme),
                    })
                }
            }
            if url.host_str().is_none() {
                return Err(ConfigError::InvalidSource {
                    source_id: source.clone(),
                    reason: "missing host".to_string(),
                });
            }
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.database_path, "newswire.db");
        assert_eq!(config.ttl_minutes, 10);
        assert_eq!(config.item_limit, 50);
        assert_eq!(config.fetch_timeout_secs, 30);
        assert_eq!(
            config.sources.get("delfi").map(String::as_str),
            Some("https://www.delfi.lv/rss/index.xml")
        );
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/newswire_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config.ttl_minutes, 10);
    }

    #[test]
    fn test_empty_file_returns_default() {
        let dir = std::env::temp_dir().join("newswire_config_test_empty");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.ttl_minutes, 10);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let dir = std::env::temp_dir().join("newswire_config_test_partial");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "ttl_minutes = 30\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.ttl_minutes, 30);
        assert_eq!(config.item_limit, 50); // default
        assert!(config.sources.contains_key("delfi")); // default registry

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_full_config() {
        let dir = std::env::temp_dir().join("newswire_config_test_full");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");

        let content = r#"
database_path = "/var/lib/newswire/news.db"
ttl_minutes = 5
item_limit = 20
fetch_timeout_secs = 10

[sources]
delfi = "https://www.delfi.lv/rss/index.xml"
tvnet = "https://www.tvnet.lv/rss"
"#;
        std::fs::write(&path, content).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.database_path, "/var/lib/newswire/news.db");
        assert_eq!(config.ttl_minutes, 5);
        assert_eq!(config.item_limit, 20);
        assert_eq!(config.fetch_timeout_secs, 10);
        assert_eq!(config.sources.len(), 2);
        assert_eq!(
            config.sources.get("tvnet").map(String::as_str),
            Some("https://www.tvnet.lv/rss")
        );

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_sources_table_replaces_default_registry() {
        let dir = std::env::temp_dir().join("newswire_config_test_replace");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "[sources]\ncustom = \"https://example.com/rss\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.sources.len(), 1);
        assert!(!config.sources.contains_key("delfi"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let dir = std::env::temp_dir().join("newswire_config_test_invalid");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "this is not [valid toml").unwrap();

        let result = Config::load(&path);
        assert!(matches!(result, Err(ConfigError::Parse(_))));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let dir = std::env::temp_dir().join("newswire_config_test_unknown");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "ttl_minutes = 10\ntotally_fake_key = 42\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.ttl_minutes, 10);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_bad_source_url_rejected() {
        let dir = std::env::temp_dir().join("newswire_config_test_badurl");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "[sources]\nbroken = \"not a url\"\n").unwrap();

        let result = Config::load(&path);
        assert!(matches!(result, Err(ConfigError::InvalidSource { .. })));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_non_http_source_url_rejected() {
        let dir = std::env::temp_dir().join("newswire_config_test_scheme");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "[sources]\nlocal = \"file:///etc/passwd\"\n").unwrap();

        let result = Config::load(&path);
        assert!(matches!(result, Err(ConfigError::InvalidSource { .. })));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_too_large_file_rejected() {
        let dir = std::env::temp_dir().join("newswire_config_test_too_large");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "a".repeat(1_048_577)).unwrap();

        let result = Config::load(&path);
        assert!(matches!(result, Err(ConfigError::TooLarge(_))));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_wrong_type_returns_error() {
        let dir = std::env::temp_dir().join("newswire_config_test_wrongtype");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        // ttl_minutes should be an integer, not a string
        std::fs::write(&path, "ttl_minutes = \"soon\"\n").unwrap();

        let result = Config::load(&path);
        assert!(result.is_err());

        std::fs::remove_dir_all(&dir).ok();
    }
}
