use common::{Environment, LogLevel};
use std::env;

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub log_level: LogLevel,
    pub environment: Environment,
    pub host: String,
    pub port: u16,
    pub otel_endpoint: Option<String>,
}

impl GatewayConfig {
    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> anyhow::Result<Self> {
        let log_level = LogLevel::from_env();
        let environment = Environment::from_env();

        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port = env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8000);

        let otel_endpoint = env::var("OTEL_ENDPOINT").ok();

        Ok(Self {
            log_level,
            environment,
            host,
            port,
            otel_endpoint,
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
