use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,

    /// State backend configuration
    pub state: StateConfig,

    /// Observability configuration
    pub observability: ObservabilityConfig,

    /// Query API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/default.toml".to_string());

        let config: Config = config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(&config_path).required(false))
            // Override with environment variables (SAFETY_IM__SECTION__KEY)
            .add_source(
                config::Environment::with_prefix("SAFETY_IM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.api.default_page_limit == 0 {
            return Err(config::ConfigError::Message(
                "api.default_page_limit must be at least 1".to_string(),
            ));
        }

        if self.api.max_page_limit < self.api.default_page_limit {
            return Err(config::ConfigError::Message(format!(
                "api.max_page_limit ({}) is below api.default_page_limit ({})",
                self.api.max_page_limit, self.api.default_page_limit
            )));
        }

        if self.state.backend == StateBackend::Sled && self.state.path.is_none() {
            return Err(config::ConfigError::Message(
                "state.path is required for the sled backend".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    /// State backend type
    #[serde(default)]
    pub backend: StateBackend,

    /// Path for the embedded database (sled)
    pub path: Option<PathBuf>,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            backend: StateBackend::Sled,
            path: Some(PathBuf::from("./data/incidents")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum StateBackend {
    #[default]
    Sled,
    Memory,
}

impl StateBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateBackend::Sled => "sled",
            StateBackend::Memory => "memory",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,

    /// Service name
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Enable Prometheus metrics
    #[serde(default = "default_true")]
    pub prometheus_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
            service_name: default_service_name(),
            prometheus_enabled: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Page size used when `limit` is omitted
    #[serde(default = "default_page_limit")]
    pub default_page_limit: u64,

    /// Largest accepted `limit`; larger values are rejected
    #[serde(default = "default_max_page_limit")]
    pub max_page_limit: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            default_page_limit: default_page_limit(),
            max_page_limit: default_max_page_limit(),
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_service_name() -> String {
    "safety-incident-manager".to_string()
}

fn default_page_limit() -> u64 {
    20
}

fn default_max_page_limit() -> u64 {
    1000
}

fn default_true() -> bool {
    true
}
