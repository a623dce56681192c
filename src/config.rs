//! Exporter configuration.

use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::Level;

use crate::dish::Timeouts;
use crate::error::{ExporterError, Result};

/// Default gRPC endpoint of the dish on its local network.
pub const DEFAULT_DISH_ADDRESS: &str = "192.168.100.1:9200";

/// Default time between update cycles.
pub const DEFAULT_INTERVAL: &str = "30s";

/// Default address the metrics endpoint listens on.
pub const DEFAULT_LISTEN_ADDRESS: &str = "0.0.0.0:9817";

/// Default log level when none (or an unknown one) is given.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Configuration for a running exporter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// Dish gRPC endpoint as `host:port`
    pub dish: String,
    /// Time between update cycles
    #[serde(with = "humantime_duration")]
    pub interval: Duration,
    /// Address the metrics endpoint binds to
    pub listen: SocketAddr,
    /// Bound on connecting to the dish
    #[serde(with = "humantime_duration")]
    pub connect_timeout: Duration,
    /// Bound on each dish request
    #[serde(with = "humantime_duration")]
    pub request_timeout: Duration,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        let timeouts = Timeouts::default();
        Self {
            dish: DEFAULT_DISH_ADDRESS.to_string(),
            interval: Duration::from_secs(30),
            listen: SocketAddr::from(([0, 0, 0, 0], 9817)),
            connect_timeout: timeouts.connect,
            request_timeout: timeouts.request,
        }
    }
}

impl ExporterConfig {
    /// Build a configuration from the raw command line values.
    pub fn from_args(dish: &str, interval: &str, listen: &str) -> Result<Self> {
        Ok(Self::default()
            .with_dish(dish)
            .with_interval(parse_interval(interval)?)
            .with_listen(parse_listen(listen)?))
    }

    /// Set the dish endpoint.
    pub fn with_dish(mut self, dish: impl Into<String>) -> Self {
        self.dish = dish.into();
        self
    }

    /// Set the update interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the metrics listen address.
    pub fn with_listen(mut self, listen: SocketAddr) -> Self {
        self.listen = listen;
        self
    }

    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            connect: self.connect_timeout,
            request: self.request_timeout,
        }
    }
}

/// Parse an interval such as `30s`, `1m` or `1m 30s`.
pub fn parse_interval(value: &str) -> Result<Duration> {
    let interval = humantime::parse_duration(value.trim()).map_err(|e| {
        ExporterError::config_error(format!("Invalid interval {value:?}: {e}"))
    })?;
    if interval.is_zero() {
        return Err(ExporterError::config_error("Interval must be greater than zero"));
    }
    Ok(interval)
}

/// Parse the metrics listen address.
pub fn parse_listen(value: &str) -> Result<SocketAddr> {
    value
        .parse()
        .map_err(|e| ExporterError::config_error(format!("Invalid listen address {value:?}: {e}")))
}

/// Map a log level name to a [`Level`]; anything unrecognised is `INFO`.
pub fn parse_log_level(value: &str) -> Level {
    match value.trim().to_ascii_lowercase().as_str() {
        "error" => Level::ERROR,
        "warn" => Level::WARN,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::INFO,
    }
}

mod humantime_duration {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&humantime::format_duration(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}
