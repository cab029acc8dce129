use std::path::PathBuf;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development; override via
/// environment variables in production.
#[derive(Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Base URL of the video generation provider.
    pub provider_base_url: String,
    /// Bearer credential for the provider. Kept out of logs.
    pub provider_api_key: String,
    /// Directory served for non-API routes (default: `public`).
    pub static_dir: PathBuf,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("provider_base_url", &self.provider_base_url)
            .field("provider_api_key", &"[REDACTED]")
            .field("static_dir", &self.static_dir)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                     |
    /// |------------------------|-----------------------------|
    /// | `HOST`                 | `0.0.0.0`                   |
    /// | `PORT`                 | `3000`                      |
    /// | `PROVIDER_BASE_URL`    | `https://api.runwayml.com`  |
    /// | `PROVIDER_API_KEY`     | (empty)                     |
    /// | `STATIC_DIR`           | `public`                    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                        |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let provider_base_url = std::env::var("PROVIDER_BASE_URL")
            .unwrap_or_else(|_| "https://api.runwayml.com".into());

        let provider_api_key = std::env::var("PROVIDER_API_KEY").unwrap_or_default();

        let static_dir = PathBuf::from(std::env::var("STATIC_DIR").unwrap_or_else(|_| "public".into()));

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        Self {
            host,
            port,
            provider_base_url,
            provider_api_key,
            static_dir,
            request_timeout_secs,
        }
    }
}
