//! Configuration file support
//!
//! Loads config from ~/.arthmitra/config.toml

use serde::Deserialize;
use std::path::PathBuf;

/// Default backend origin when nothing is configured
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Configuration for the chat client
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Backend base URL
    pub api_url: Option<String>,

    /// User id sent with chat requests
    pub user_id: Option<String>,

    /// Session id sent with chat requests
    pub session_id: Option<String>,

    /// Timeout for the non-streaming fallback call, in seconds
    pub request_timeout_secs: Option<u64>,
}

impl Config {
    /// Load config from ~/.arthmitra/config.toml
    pub fn load() -> Self {
        let path = config_path();

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Warning: Failed to parse {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("Warning: Failed to read {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Get a value with fallback to environment variable
    pub fn get_or_env(&self, field: Option<&String>, env_var: &str) -> Option<String> {
        field.cloned().or_else(|| std::env::var(env_var).ok())
    }
}

/// Get the config file path
pub fn config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_default()
        .join(".arthmitra")
        .join("config.toml")
}
