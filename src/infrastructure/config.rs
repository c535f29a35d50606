//! Configuration management

use crate::error::{DiaryError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Directory holding diary metadata and storage
pub const DIARY_DIR: &str = ".aidiary";

/// Environment variable that overrides the configured API key
pub const ENV_API_KEY: &str = "AIDIARY_API_KEY";

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/engines/davinci/completions";
const DEFAULT_MAX_TOKENS: u32 = 4;
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub endpoint: String,
    pub max_tokens: u32,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    pub write_timeout_secs: u64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub api_key: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            connect_timeout_secs: DEFAULT_TIMEOUT_SECS,
            read_timeout_secs: DEFAULT_TIMEOUT_SECS,
            write_timeout_secs: DEFAULT_TIMEOUT_SECS,
            api_key: String::new(),
        }
    }
}

/// Transport timeouts for the transformation client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub connect: Duration,
    pub read: Duration,
    pub write: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        let secs = Duration::from_secs(DEFAULT_TIMEOUT_SECS);
        Timeouts {
            connect: secs,
            read: secs,
            write: secs,
        }
    }
}

/// Everything the transformation client needs, resolved at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformConfig {
    pub credential: String,
    pub endpoint: String,
    pub max_tokens: u32,
    pub timeouts: Timeouts,
}

impl Config {
    /// Load config from .aidiary/config.toml in the given directory
    pub fn load_from_dir(path: &Path) -> Result<Self> {
        let config_path = path.join(DIARY_DIR).join("config.toml");

        let contents = fs::read_to_string(&config_path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DiaryError::NotDiaryDirectory(path.to_path_buf())
            } else {
                DiaryError::Io(e)
            }
        })?;

        toml::from_str(&contents)
            .map_err(|e| DiaryError::Config(format!("Failed to parse config.toml: {}", e)))
    }

    /// Save config to .aidiary/config.toml in the given directory
    pub fn save_to_dir(&self, path: &Path) -> Result<()> {
        let diary_dir = path.join(DIARY_DIR);
        let config_path = diary_dir.join("config.toml");

        if !diary_dir.exists() {
            fs::create_dir(&diary_dir)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| DiaryError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(&config_path, contents)?;

        Ok(())
    }

    /// Build the client configuration, taking the key from the environment when set
    pub fn transform_config(&self) -> TransformConfig {
        TransformConfig {
            credential: self.resolve_api_key(std::env::var(ENV_API_KEY).ok()),
            endpoint: self.endpoint.clone(),
            max_tokens: self.max_tokens,
            timeouts: Timeouts {
                connect: Duration::from_secs(self.connect_timeout_secs),
                read: Duration::from_secs(self.read_timeout_secs),
                write: Duration::from_secs(self.write_timeout_secs),
            },
        }
    }

    fn resolve_api_key(&self, from_env: Option<String>) -> String {
        from_env
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| self.api_key.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.max_tokens, 4);
        assert_eq!(config.connect_timeout_secs, 60);
        assert_eq!(config.read_timeout_secs, 60);
        assert_eq!(config.write_timeout_secs, 60);
        assert!(config.endpoint.starts_with("https://"));
    }

    #[test]
    fn test_save_and_load_config() {
        let temp = TempDir::new().unwrap();
        let config = Config {
            max_tokens: 32,
            ..Config::default()
        };

        config.save_to_dir(temp.path()).unwrap();
        assert!(temp.path().join(".aidiary/config.toml").exists());

        let loaded = Config::load_from_dir(temp.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_empty_api_key_not_written() {
        let temp = TempDir::new().unwrap();
        Config::default().save_to_dir(temp.path()).unwrap();

        let contents = fs::read_to_string(temp.path().join(".aidiary/config.toml")).unwrap();
        assert!(!contents.contains("api_key"));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str("max_tokens = 10\n").unwrap();
        assert_eq!(config.max_tokens, 10);
        assert_eq!(config.read_timeout_secs, 60);
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_load_missing_config() {
        let temp = TempDir::new().unwrap();

        let result = Config::load_from_dir(temp.path());

        match result.unwrap_err() {
            DiaryError::NotDiaryDirectory(_) => {}
            other => panic!("Expected NotDiaryDirectory error, got {:?}", other),
        }
    }

    #[test]
    fn test_env_key_overrides_config_key() {
        let config = Config {
            api_key: "from-config".to_string(),
            ..Config::default()
        };

        assert_eq!(
            config.resolve_api_key(Some(" from-env ".to_string())),
            "from-env"
        );
        assert_eq!(config.resolve_api_key(Some("  ".to_string())), "from-config");
        assert_eq!(config.resolve_api_key(None), "from-config");
    }

    #[test]
    fn test_transform_config_timeouts() {
        let config = Config {
            connect_timeout_secs: 1,
            read_timeout_secs: 2,
            write_timeout_secs: 3,
            ..Config::default()
        };

        let transform = config.transform_config();
        assert_eq!(transform.timeouts.connect, Duration::from_secs(1));
        assert_eq!(transform.timeouts.read, Duration::from_secs(2));
        assert_eq!(transform.timeouts.write, Duration::from_secs(3));
        assert_eq!(transform.max_tokens, 4);
    }
}
