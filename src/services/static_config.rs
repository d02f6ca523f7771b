// src/services/static_config.rs
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use reqwest::Client;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StaticConfigError {
    #[error("{} does not exist", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Io { path: PathBuf, source: std::io::Error },

    #[error("invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("expected a JSON object")]
    NotAnObject,

    #[error("failed to fetch ads: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("ads source returned {0}")]
    FetchStatus(u16),
}

/// Where ad-unit identifiers come from.
#[derive(Debug, Clone)]
pub enum AdsSource {
    File(PathBuf),
    Remote(String),
}

/// Ad-unit identifiers handed to the mobile client. Unknown keys pass through.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AdsConfig {
    pub admob_banner: String,
    pub admob_interstitial: String,
    pub meta_banner: String,
    pub meta_interstitial: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AdsConfig {
    fn from_object(mut object: Map<String, Value>) -> Self {
        let mut take = |key: &str| match object.remove(key) {
            Some(Value::String(s)) => s,
            _ => String::new(),
        };
        let admob_banner = take("admob_banner");
        let admob_interstitial = take("admob_interstitial");
        let meta_banner = take("meta_banner");
        let meta_interstitial = take("meta_interstitial");
        // The envelope owns these keys.
        object.remove("success");
        object.remove("timestamp");
        Self {
            admob_banner,
            admob_interstitial,
            meta_banner,
            meta_interstitial,
            extra: object,
        }
    }
}

/// Sources for the small JSON blobs served by `/config` and `/ads`.
/// Files are re-read on every request so edits apply without a restart.
#[derive(Debug, Clone)]
pub struct StaticConfig {
    pub app_config_path: PathBuf,
    pub ads: AdsSource,
    pub public_base_url: Option<String>,
    http: Client,
}

impl StaticConfig {
    pub fn new(app_config_path: impl Into<PathBuf>, ads: AdsSource, public_base_url: Option<String>, http: Client) -> Self {
        Self {
            app_config_path: app_config_path.into(),
            ads,
            public_base_url,
            http,
        }
    }

    pub async fn app_config(&self) -> Result<Map<String, Value>, StaticConfigError> {
        let mut object = read_object(&self.app_config_path).await?;
        if let Some(base_url) = &self.public_base_url {
            object
                .entry("baseURL")
                .or_insert_with(|| Value::String(base_url.clone()));
        }
        object.remove("success");
        object.remove("timestamp");
        Ok(object)
    }

    pub async fn ads(&self) -> Result<AdsConfig, StaticConfigError> {
        let object = match &self.ads {
            AdsSource::File(path) => read_object(path).await?,
            AdsSource::Remote(url) => self.fetch_object(url).await?,
        };
        Ok(AdsConfig::from_object(object))
    }

    async fn fetch_object(&self, url: &str) -> Result<Map<String, Value>, StaticConfigError> {
        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            return Err(StaticConfigError::FetchStatus(response.status().as_u16()));
        }
        match response.json::<Value>().await? {
            Value::Object(map) => Ok(map),
            _ => Err(StaticConfigError::NotAnObject),
        }
    }
}

async fn read_object(path: &Path) -> Result<Map<String, Value>, StaticConfigError> {
    let raw = tokio::fs::read_to_string(path).await.map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            StaticConfigError::NotFound(path.to_path_buf())
        } else {
            StaticConfigError::Io { path: path.to_path_buf(), source }
        }
    })?;
    match serde_json::from_str::<Value>(&raw)? {
        Value::Object(map) => Ok(map),
        _ => Err(StaticConfigError::NotAnObject),
    }
}
