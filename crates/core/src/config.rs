use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `PHISHLINE__` and overridable from the CLI.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_node_id")]
    pub node_id: String,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub smtp: SmtpConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

/// Outbound SMTP behaviour. TLS policy is not configured here: it is
/// selected per sender by port number (587 STARTTLS, 465 implicit TLS,
/// anything else plain).
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    /// Per-message send timeout, covering connection setup on a cold pool.
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,
    /// Maximum concurrent in-flight deliveries per dispatch job.
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
    /// Connection pool size for one dispatch job's transport.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackingConfig {
    /// Public base URL used when a send request does not carry a host.
    #[serde(default = "default_public_host")]
    pub public_host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

// Default functions
fn default_node_id() -> String {
    "node-01".to_string()
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_http_port() -> u16 {
    8080
}
fn default_send_timeout_ms() -> u64 {
    15000
}
fn default_max_in_flight() -> usize {
    8
}
fn default_pool_size() -> u32 {
    4
}
fn default_public_host() -> String {
    "http://localhost:8080".to_string()
}
fn default_metrics_port() -> u16 {
    9091
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            send_timeout_ms: default_send_timeout_ms(),
            max_in_flight: default_max_in_flight(),
            pool_size: default_pool_size(),
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            public_host: default_public_host(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            port: default_metrics_port(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            api: ApiConfig::default(),
            smtp: SmtpConfig::default(),
            tracking: TrackingConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("PHISHLINE")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
