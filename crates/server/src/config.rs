use ldt::ParserConfig;
use routing::LabInfo;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Pre-shared secret for HMAC-signed deliveries
    #[serde(default)]
    pub webhook_secret: String,

    /// Accepted clock skew between delivery timestamp and server time
    #[serde(default = "default_timestamp_tolerance_secs")]
    pub timestamp_tolerance_secs: u64,

    /// How long a replay key stays live in the dedup cache
    #[serde(default = "default_replay_ttl_secs")]
    pub replay_ttl_secs: u64,

    /// Rate limit: requests per minute per delivery source
    #[serde(default = "default_rate_limit_per_minute")]
    pub rate_limit_per_minute: u32,

    /// Overall request timeout in seconds; a timed-out delivery gets a 5xx
    /// so the upstream gateway retries instead of hanging
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum request body size in MB
    #[serde(default = "default_max_body_size_mb")]
    pub max_body_size_mb: usize,

    /// Wire-grammar parser options
    #[serde(default)]
    pub parser: ParserConfig,

    /// Lab metadata used for exports when the caller supplies none
    #[serde(default)]
    pub lab: LabInfo,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            webhook_secret: String::new(),
            timestamp_tolerance_secs: default_timestamp_tolerance_secs(),
            replay_ttl_secs: default_replay_ttl_secs(),
            rate_limit_per_minute: default_rate_limit_per_minute(),
            timeout_secs: default_timeout_secs(),
            max_body_size_mb: default_max_body_size_mb(),
            parser: ParserConfig::default(),
            lab: LabInfo::default(),
            enable_cors: default_true(),
            log_level: default_log_level(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables and config files
    pub fn load() -> anyhow::Result<Self> {
        let builder = config::Config::builder()
            // Load from file if exists
            .add_source(config::File::with_name("server").required(false))
            // Override with environment variables
            .add_source(config::Environment::with_prefix("LDTFLOW_SERVER").separator("__"));

        let mut config: ServerConfig = builder.build()?.try_deserialize()?;

        // Demo secret if none configured (for development)
        if config.webhook_secret.is_empty() {
            tracing::warn!("No webhook secret configured, using demo secret 'demo-webhook-secret'");
            config.webhook_secret = "demo-webhook-secret".to_string();
        }

        Ok(config)
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr_str.parse()?)
    }

    /// Accepted timestamp skew as Duration
    pub fn timestamp_tolerance(&self) -> Duration {
        Duration::from_secs(self.timestamp_tolerance_secs)
    }

    /// Replay-cache TTL as Duration
    pub fn replay_ttl(&self) -> Duration {
        Duration::from_secs(self.replay_ttl_secs)
    }

    /// Get max body size in bytes
    pub fn max_body_size(&self) -> usize {
        self.max_body_size_mb * 1024 * 1024
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_timestamp_tolerance_secs() -> u64 {
    300
}

fn default_replay_ttl_secs() -> u64 {
    600
}

fn default_rate_limit_per_minute() -> u32 {
    60
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_body_size_mb() -> usize {
    10
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.timestamp_tolerance_secs, 300);
        assert_eq!(cfg.replay_ttl_secs, 600);
        assert_eq!(cfg.rate_limit_per_minute, 60);
        assert_eq!(cfg.timeout_secs, 10);
        assert!(!cfg.parser.strict_record_types);
    }

    #[test]
    fn test_socket_addr() {
        let cfg = ServerConfig::default();
        let addr = cfg.socket_addr().unwrap();
        assert_eq!(addr.port(), 8080);
    }
}
