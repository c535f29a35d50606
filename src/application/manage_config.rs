//! Config management use case

use crate::error::{DiaryError, Result};
use crate::infrastructure::{Config, DiaryWorkspace};
use std::str::FromStr;

/// Keys shown by `get` and `list`; `api_key` can be set but is never printed
pub const READABLE_KEYS: [&str; 5] = [
    "endpoint",
    "max_tokens",
    "connect_timeout_secs",
    "read_timeout_secs",
    "write_timeout_secs",
];

/// Service for managing diary configuration
pub struct ConfigService {
    workspace: DiaryWorkspace,
}

impl ConfigService {
    pub fn new(workspace: DiaryWorkspace) -> Self {
        ConfigService { workspace }
    }

    /// Get a single config value
    pub fn get(&self, key: &str) -> Result<String> {
        let config = self.workspace.load_config()?;
        read_key(&config, key)
    }

    /// Set a config value
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut config = self.workspace.load_config()?;

        match key {
            "endpoint" => config.endpoint = value.to_string(),
            "api_key" => config.api_key = value.to_string(),
            "max_tokens" => config.max_tokens = parse_number(key, value)?,
            "connect_timeout_secs" => config.connect_timeout_secs = parse_number(key, value)?,
            "read_timeout_secs" => config.read_timeout_secs = parse_number(key, value)?,
            "write_timeout_secs" => config.write_timeout_secs = parse_number(key, value)?,
            _ => return Err(unknown_key(key)),
        }

        self.workspace.save_config(&config)
    }

    /// All readable key/value pairs in display order
    pub fn list(&self) -> Result<Vec<(&'static str, String)>> {
        let config = self.workspace.load_config()?;

        READABLE_KEYS
            .iter()
            .map(|key| read_key(&config, key).map(|value| (*key, value)))
            .collect()
    }
}

fn read_key(config: &Config, key: &str) -> Result<String> {
    match key {
        "endpoint" => Ok(config.endpoint.clone()),
        "max_tokens" => Ok(config.max_tokens.to_string()),
        "connect_timeout_secs" => Ok(config.connect_timeout_secs.to_string()),
        "read_timeout_secs" => Ok(config.read_timeout_secs.to_string()),
        "write_timeout_secs" => Ok(config.write_timeout_secs.to_string()),
        _ => Err(unknown_key(key)),
    }
}

fn parse_number<N: FromStr>(key: &str, value: &str) -> Result<N> {
    value
        .parse()
        .map_err(|_| DiaryError::Config(format!("Invalid value for {}: '{}'", key, value)))
}

fn unknown_key(key: &str) -> DiaryError {
    DiaryError::Config(format!(
        "Unknown config key: '{}'. Valid keys are: {}",
        key,
        READABLE_KEYS.join(", ")
    ))
}
