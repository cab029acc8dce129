use std::sync::Arc;

use reelgen_providers::videogen::VideoGenConfig;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// The proxy is stateless beyond its configuration, so this is just the
/// config behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn videogen_config(&self) -> VideoGenConfig {
        VideoGenConfig {
            base_url: self.config.provider_base_url.clone(),
            api_key: self.config.provider_api_key.clone(),
        }
    }
}
