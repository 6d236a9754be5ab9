use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TlsBackend {
    Rustls,
    NativeTls,
}

impl Default for TlsBackend {
    fn default() -> Self {
        Self::Rustls
    }
}

/// Service configuration
///
/// Everything about the service itself: listen address, the API key gating
/// the HTTP surface, storage location, outbound HTTP behavior and the lease
/// sweeper cadence. The Datadog admin credentials are NOT configured here;
/// they are written at runtime through the `/v1/config` endpoint and live in
/// storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// API key required on every request to the service
    #[serde(default)]
    pub api_key: Option<String>,

    /// Directory holding the durable storage files
    #[serde(default = "default_storage_dir")]
    pub storage_dir: String,

    /// Timeout for outbound Datadog API calls, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Interval between lease expiry sweeps, in seconds
    #[serde(default = "default_lease_sweep_interval_secs")]
    pub lease_sweep_interval_secs: u64,

    #[serde(default = "default_tls_backend")]
    pub tls_backend: TlsBackend,

    /// HTTP proxy URL for outbound calls (optional)
    /// Supported formats: http://host:port, https://host:port, socks5://host:port
    #[serde(default)]
    pub proxy_url: Option<String>,

    /// Proxy authentication username (optional)
    #[serde(default)]
    pub proxy_username: Option<String>,

    /// Proxy authentication password (optional)
    #[serde(default)]
    pub proxy_password: Option<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_storage_dir() -> String {
    "data".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_lease_sweep_interval_secs() -> u64 {
    1
}

fn default_tls_backend() -> TlsBackend {
    TlsBackend::Rustls
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            api_key: None,
            storage_dir: default_storage_dir(),
            request_timeout_secs: default_request_timeout_secs(),
            lease_sweep_interval_secs: default_lease_sweep_interval_secs(),
            tls_backend: default_tls_backend(),
            proxy_url: None,
            proxy_username: None,
            proxy_password: None,
        }
    }
}

impl Config {
    /// Get default config file path
    pub fn default_config_path() -> &'static str {
        "config.json"
    }

    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            // Config file doesn't exist, return default config
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }
}
