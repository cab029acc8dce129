use crate::settings::GenerationDefaults;
use serde::{Deserialize, Serialize};

pub const DEFAULT_HISTORY_CAP: usize = 50;

/// Where generation jobs are sent. The endpoint shape is fixed; the host and
/// pacing are deployment concerns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSettings {
    pub base_url: String,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_poll_deadline_secs")]
    pub poll_deadline_secs: u64,
}

fn default_poll_interval_ms() -> u64 {
    3000
}

fn default_poll_deadline_secs() -> u64 {
    180
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.runwayml.com".into(),
            poll_interval_ms: default_poll_interval_ms(),
            poll_deadline_secs: default_poll_deadline_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub defaults: GenerationDefaults,
    pub provider: ProviderSettings,

    #[serde(default = "default_history_cap")]
    pub history_cap: usize,

    // Secrets are stored outside this struct at rest.
    #[serde(default)]
    pub api_key_present: bool,
}

fn default_history_cap() -> usize {
    DEFAULT_HISTORY_CAP
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            defaults: GenerationDefaults::default(),
            provider: ProviderSettings::default(),
            history_cap: DEFAULT_HISTORY_CAP,
            api_key_present: false,
        }
    }
}
