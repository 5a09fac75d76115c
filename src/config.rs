//! Configuration file parser for `kirikou.toml`.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Unknown keys are ignored by serde, though we log a warning when the file
//! contains potential typos. A few keys can be overridden from the
//! environment; the environment takes precedence over the file.
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid value for {key}: {value}")]
    InvalidEnv { key: &'static str, value: String },
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database file, or `:memory:`.
    pub database_path: String,

    /// Upper bound on one feed fetch, in seconds.
    pub request_timeout_secs: u64,

    /// Seconds between scheduled "scrape all" jobs in `serve` mode.
    pub fetch_interval_secs: u64,

    /// Sources processed at once within one run. 1 = strictly sequential.
    pub scrape_concurrency: usize,

    /// Jobs the in-process queue runs at once.
    pub worker_count: usize,

    /// User-Agent header sent with feed requests.
    pub user_agent: String,

    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: "kirikou.db".to_string(),
            request_timeout_secs: 10,
            fetch_interval_secs: 3600,
            scrape_concurrency: 1,
            worker_count: 2,
            user_agent: "Mozilla/5.0 (compatible; KirikouBot/1.0)".to_string(),
            log_level: "info".to_string(),
        }
    }
}

const KNOWN_KEYS: [&str; 7] = [
    "database_path",
    "request_timeout_secs",
    "fetch_interval_secs",
    "scrape_concurrency",
    "worker_count",
    "user_agent",
    "log_level",
];

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    pub const ENV_DATABASE_PATH: &'static str = "KIRIKOU_DATABASE_PATH";
    pub const ENV_REQUEST_TIMEOUT: &'static str = "KIRIKOU_REQUEST_TIMEOUT";
    pub const ENV_FETCH_INTERVAL: &'static str = "KIRIKOU_FETCH_INTERVAL";

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn fetch_interval(&self) -> Duration {
        Duration::from_secs(self.fetch_interval_secs.max(1))
    }

    /// Load from `path`, then apply environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
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
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(
            path = %path.display(),
            database = %config.database_path,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Apply overrides from a key lookup (the process environment in production).
    fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(Self::ENV_DATABASE_PATH).filter(|p| !p.trim().is_empty()) {
            self.database_path = path;
        }
        if let Some(value) = lookup(Self::ENV_REQUEST_TIMEOUT) {
            self.request_timeout_secs = parse_secs(Self::ENV_REQUEST_TIMEOUT, value)?;
        }
        if let Some(value) = lookup(Self::ENV_FETCH_INTERVAL) {
            self.fetch_interval_secs = parse_secs(Self::ENV_FETCH_INTERVAL, value)?;
        }
        Ok(())
    }
}

fn parse_secs(key: &'static str, value: String) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(ConfigError::InvalidEnv { key, value }),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn write_config(name: &str, content: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("kirikou_config_test_{}", name));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("kirikou.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.database_path, "kirikou.db");
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.fetch_interval(), Duration::from_secs(3600));
        assert_eq!(config.scrape_concurrency, 1);
        assert_eq!(config.worker_count, 2);
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/kirikou_test_nonexistent_config.toml");
        assert_eq!(Config::load(path).unwrap(), Config::default());
    }

    #[test]
    fn test_whitespace_only_file_returns_default() {
        let path = write_config("whitespace", "   \n  \n  ");
        assert_eq!(Config::load(&path).unwrap(), Config::default());
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let path = write_config("partial", "request_timeout_secs = 3\n");

        let config = Config::load(&path).unwrap();
        assert_eq!(config.request_timeout_secs, 3);
        assert_eq!(config.fetch_interval_secs, 3600);
        assert_eq!(config.database_path, "kirikou.db");

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_full_config() {
        let content = r#"
database_path = "/var/lib/kirikou/news.db"
request_timeout_secs = 20
fetch_interval_secs = 900
scrape_concurrency = 4
worker_count = 3
user_agent = "TestBot/2.0"
log_level = "debug"
"#;
        let path = write_config("full", content);

        let config = Config::load(&path).unwrap();
        assert_eq!(config.database_path, "/var/lib/kirikou/news.db");
        assert_eq!(config.request_timeout_secs, 20);
        assert_eq!(config.fetch_interval_secs, 900);
        assert_eq!(config.scrape_concurrency, 4);
        assert_eq!(config.worker_count, 3);
        assert_eq!(config.user_agent, "TestBot/2.0");
        assert_eq!(config.log_level, "debug");

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let path = write_config("invalid", "this is not [valid toml");

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let path = write_config("unknown", "worker_count = 5\nbroker_url = \"redis://\"\n");

        let config = Config::load(&path).unwrap();
        assert_eq!(config.worker_count, 5);

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_wrong_type_returns_error() {
        let path = write_config("wrongtype", "request_timeout_secs = \"ten\"\n");
        assert!(Config::load(&path).is_err());
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_too_large_file_rejected() {
        let path = write_config("too_large", &"a".repeat(1_048_577));

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_env_overrides_take_precedence() {
        let env: HashMap<&str, &str> = HashMap::from([
            (Config::ENV_DATABASE_PATH, "/tmp/override.db"),
            (Config::ENV_REQUEST_TIMEOUT, "30"),
            (Config::ENV_FETCH_INTERVAL, " 60 "),
        ]);

        let mut config = Config::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.database_path, "/tmp/override.db");
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.fetch_interval_secs, 60);
    }

    #[test]
    fn test_invalid_env_override_rejected() {
        let env = HashMap::from([(Config::ENV_REQUEST_TIMEOUT, "0")]);

        let mut config = Config::default();
        let err = config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap_err();

        assert!(matches!(
            err,
            ConfigError::InvalidEnv {
                key: Config::ENV_REQUEST_TIMEOUT,
                ..
            }
        ));
    }
}
