// src/config.rs
use std::env;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use secrecy::Secret;
use serde::Deserialize;
use thiserror::Error;

use crate::services::upstream::{ApiKey, DEFAULT_BASE_URL, DEFAULT_MODEL};

const DEFAULT_PORT: u16 = 10000;
const DEFAULT_BODY_LIMIT_BYTES: usize = 50 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} has an invalid value {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub api_key: Option<ApiKey>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub app_config_path: PathBuf,
    pub ads_config_path: PathBuf,
    pub ads_source_url: Option<String>,
    pub public_base_url: Option<String>,
    pub body_limit_bytes: usize,
}

#[derive(Deserialize)]
struct KeyFile {
    #[serde(rename = "apiKey")]
    api_key: Option<String>,
}

impl AppConfig {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick
    /// up a local `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = get_env("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = parse_env("PORT", DEFAULT_PORT)?;
        let bind_addr = format!("{host}:{port}")
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::Invalid { key: "HOST", value: host })?;

        let key_file = get_env("OPENAI_KEY_FILE").unwrap_or_else(|| "openai.json".to_string());

        Ok(Self {
            bind_addr,
            api_key: resolve_api_key(get_env("OPENAI_API_KEY"), Path::new(&key_file)),
            openai_base_url: get_env("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            openai_model: get_env("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            app_config_path: get_env("APP_CONFIG_PATH").unwrap_or_else(|| "config.json".to_string()).into(),
            ads_config_path: get_env("ADS_CONFIG_PATH").unwrap_or_else(|| "ads.json".to_string()).into(),
            ads_source_url: get_env("ADS_SOURCE_URL"),
            public_base_url: get_env("PUBLIC_BASE_URL"),
            body_limit_bytes: parse_env("BODY_LIMIT_BYTES", DEFAULT_BODY_LIMIT_BYTES)?,
        })
    }
}

/// Environment first, then the `apiKey` field of the key file. Blank values
/// count as missing.
pub fn resolve_api_key(from_env: Option<String>, key_file: &Path) -> Option<ApiKey> {
    let key = from_env.filter(|k| !k.trim().is_empty()).or_else(|| {
        let raw = std::fs::read_to_string(key_file).ok()?;
        match serde_json::from_str::<KeyFile>(&raw) {
            Ok(file) => file.api_key,
            Err(e) => {
                tracing::warn!(path = %key_file.display(), error = %e, "Ignoring unreadable key file");
                None
            }
        }
    })?;
    let key = key.trim().to_string();
    (!key.is_empty()).then(|| Secret::new(key))
}

fn get_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match get_env(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::io::Write;

    #[test]
    fn env_key_takes_precedence_over_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"apiKey": "from-file"}}"#).unwrap();

        let key = resolve_api_key(Some("from-env".into()), file.path()).unwrap();
        assert_eq!(key.expose_secret(), "from-env");

        let key = resolve_api_key(None, file.path()).unwrap();
        assert_eq!(key.expose_secret(), "from-file");
    }

    #[test]
    fn blank_or_missing_key_is_none() {
        assert!(resolve_api_key(Some("   ".into()), Path::new("/nonexistent/openai.json")).is_none());
        assert!(resolve_api_key(None, Path::new("/nonexistent/openai.json")).is_none());
    }
}
