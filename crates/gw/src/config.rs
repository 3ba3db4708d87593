use gw_events::FeedConfig;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    pub db_path: PathBuf,
    pub host: IpAddr,
    pub port: u16,
    pub feed: FeedConfig,
    pub backend_timeout: Duration,
    pub log_format: LogFormat,
}

impl GatewayConfig {
    /// Reads `GATEWAY_*` variables, after loading `.env` if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = FeedConfig::default();
        let interval_ms: u64 = parse(&lookup, "GATEWAY_FEED_INTERVAL_MS", 2000)?;
        let log_format = match lookup("GATEWAY_LOG_FORMAT").as_deref() {
            None | Some("" | "pretty" | "text") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "GATEWAY_LOG_FORMAT",
                    value: other.to_string(),
                });
            }
        };
        Ok(Self {
            db_path: lookup("GATEWAY_DB_PATH")
                .filter(|value| !value.trim().is_empty())
                .map_or_else(|| PathBuf::from(".gateway/gateway.db"), PathBuf::from),
            host: parse(&lookup, "GATEWAY_HOST", IpAddr::from([127, 0, 0, 1]))?,
            port: parse(&lookup, "GATEWAY_PORT", 8000)?,
            feed: FeedConfig {
                window: parse(&lookup, "GATEWAY_FEED_WINDOW", defaults.window)?,
                interval: Duration::from_millis(interval_ms),
                max_failures: parse(&lookup, "GATEWAY_FEED_MAX_FAILURES", defaults.max_failures)?,
            },
            backend_timeout: Duration::from_secs(parse(
                &lookup,
                "GATEWAY_BACKEND_TIMEOUT_SECS",
                30,
            )?),
            log_format,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(value) if value.trim().is_empty() => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}
