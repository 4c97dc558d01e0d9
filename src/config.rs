//! Configuration management for tracklens.
//!
//! Values come from environment variables. Before they are read, an optional
//! `.env` file in the local data directory is loaded, so the lookup order is:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Built-in defaults (everything except the client id has one)

use std::{env, path::PathBuf};

use crate::error::{Error, Result};

pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8888";
pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8888/callback";

/// Returns the directory holding the `.env` file, the session store and
/// other local state: `<data_local_dir>/tracklens`.
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("tracklens");
    path
}

/// Loads environment variables from `<data_local_dir>/tracklens/.env`.
///
/// Creates the directory when it is missing. A missing `.env` file is not an
/// error; values may come from the real environment instead.
///
/// # Example
///
/// ```
/// use tracklens::config;
///
/// #[tokio::main]
/// async fn main() {
///     if let Err(e) = config::load_env().await {
///         eprintln!("Configuration error: {}", e);
///     }
/// }
/// ```
pub async fn load_env() -> Result<()> {
    let dir = data_dir();
    async_fs::create_dir_all(&dir)
        .await
        .map_err(|e| Error::Config(format!("cannot create {}: {}", dir.display(), e)))?;

    let path = dir.join(".env");
    if path.is_file() {
        dotenv::from_path(&path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
    }
    Ok(())
}

/// Endpoints and client settings for the streaming platform.
#[derive(Debug, Clone)]
pub struct Config {
    /// Public client id registered with the platform. No secret is needed.
    pub client_id: String,
    pub redirect_uri: String,
    pub scope: String,
    pub auth_url: String,
    pub token_url: String,
    pub api_url: String,
    /// Base URL serving `/audio-features/{id}`. Usually the API itself, but
    /// may point at an analysis proxy.
    pub features_url: String,
    /// Address the local callback server binds to.
    pub server_addr: String,
    /// Substitute placeholder metadata when the track lookup is rejected.
    pub placeholder_metadata: bool,
}

impl Config {
    /// Builds a config with default endpoints for the given client id.
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            scope: String::new(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            features_url: DEFAULT_API_URL.to_string(),
            server_addr: DEFAULT_SERVER_ADDRESS.to_string(),
            placeholder_metadata: false,
        }
    }

    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when `TRACKLENS_CLIENT_ID` is missing or empty,
    /// or when `TRACKLENS_PLACEHOLDER_METADATA` is not a boolean.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Config::from_env`], reading values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let client_id = get("TRACKLENS_CLIENT_ID")
            .ok_or_else(|| Error::Config("TRACKLENS_CLIENT_ID must be set".to_string()))?;

        let mut config = Config::new(client_id);
        if let Some(v) = get("TRACKLENS_REDIRECT_URI") {
            config.redirect_uri = v;
        }
        if let Some(v) = get("TRACKLENS_SCOPE") {
            config.scope = v;
        }
        if let Some(v) = get("TRACKLENS_AUTH_URL") {
            config.auth_url = v;
        }
        if let Some(v) = get("TRACKLENS_TOKEN_URL") {
            config.token_url = v;
        }
        if let Some(v) = get("TRACKLENS_API_URL") {
            config.features_url = v.clone();
            config.api_url = v;
        }
        if let Some(v) = get("TRACKLENS_FEATURES_URL") {
            config.features_url = v;
        }
        if let Some(v) = get("TRACKLENS_SERVER_ADDRESS") {
            config.server_addr = v;
        }
        if let Some(v) = get("TRACKLENS_PLACEHOLDER_METADATA") {
            config.placeholder_metadata = parse_bool(&v).ok_or_else(|| {
                Error::Config(format!("TRACKLENS_PLACEHOLDER_METADATA: '{}' is not a boolean", v))
            })?;
        }

        Ok(config)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
