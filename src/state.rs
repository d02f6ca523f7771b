// src/state.rs
use std::sync::Arc;

use reqwest::Client;

use crate::config::AppConfig;
use crate::services::static_config::{AdsSource, StaticConfig};
use crate::services::upstream::{ApiKey, ModelClient, OpenAiClient};

pub type SharedState = Arc<AppState>;

/// Immutable after startup; requests never mutate it.
pub struct AppState {
    pub model: Arc<dyn ModelClient>,
    pub api_key: Option<ApiKey>,
    pub static_config: StaticConfig,
}

impl AppState {
    pub fn new(model: Arc<dyn ModelClient>, api_key: Option<ApiKey>, static_config: StaticConfig) -> Self {
        Self {
            model,
            api_key,
            static_config,
        }
    }

    pub fn from_config(config: AppConfig) -> Self {
        let http = Client::new();
        let model = OpenAiClient::new(http.clone(), config.openai_base_url, config.openai_model);
        let ads = match config.ads_source_url {
            Some(url) => AdsSource::Remote(url),
            None => AdsSource::File(config.ads_config_path),
        };
        let static_config = StaticConfig::new(config.app_config_path, ads, config.public_base_url, http);

        Self::new(Arc::new(model), config.api_key, static_config)
    }
}
