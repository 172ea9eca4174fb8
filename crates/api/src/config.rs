use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Error raised when an environment variable holds an unparsable value.
#[derive(Debug, thiserror::Error)]
#[error("{var} has invalid value '{value}'")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
}

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// JSON file holding goals, preferences and alerts.
    pub state_file: PathBuf,
    /// Seconds between background evaluation passes (default: `300`).
    pub evaluation_interval_secs: u64,
    /// Per-request timeout for outbound webhooks (default: `10`).
    pub webhook_timeout_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                    |
    /// |----------------------------|----------------------------|
    /// | `HOST`                     | `0.0.0.0`                  |
    /// | `PORT`                     | `3000`                     |
    /// | `CORS_ORIGINS`             | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`     | `30`                       |
    /// | `STATE_FILE`               | `data/timeline-state.json` |
    /// | `EVALUATION_INTERVAL_SECS` | `300`                      |
    /// | `WEBHOOK_TIMEOUT_SECS`     | `10`                       |
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let state_file = std::env::var("STATE_FILE")
            .unwrap_or_else(|_| "data/timeline-state.json".into())
            .into();

        Ok(Self {
            host,
            port: env_or("PORT", 3000)?,
            cors_origins,
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 30)?,
            state_file,
            evaluation_interval_secs: env_or("EVALUATION_INTERVAL_SECS", 300)?,
            webhook_timeout_secs: env_or("WEBHOOK_TIMEOUT_SECS", 10)?,
        })
    }

    pub fn evaluation_interval(&self) -> Duration {
        Duration::from_secs(self.evaluation_interval_secs.max(1))
    }

    pub fn webhook_timeout(&self) -> Duration {
        Duration::from_secs(self.webhook_timeout_secs)
    }
}

/// Parse `var`, falling back to `default` when it is unset.
fn env_or<T: FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(var) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError { var, value }),
        Err(_) => Ok(default),
    }
}
