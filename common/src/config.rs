// Link configuration, environment-driven with sensible defaults
use crate::error::{GroundLinkError, Result};
use std::time::Duration;
use url::Url;

/// Configuration for one realtime telemetry link.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Base HTTP(S) address of the telemetry source, e.g. `http://localhost:8090`.
    pub url: String,
    /// Instance path segment appended to the websocket endpoint.
    pub instance: String,
    /// Reserved channel key routed to the event subscription verbs.
    pub event_key: String,
    /// Interval between keepalive subscription refreshes while connected.
    pub keepalive_interval: Duration,
    /// Reconnect delay ladder. Empty means the default ladder.
    pub backoff_steps: Vec<Duration>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8090".to_string(),
            instance: "simulator".to_string(),
            event_key: "events".to_string(),
            keepalive_interval: Duration::from_secs(10),
            backoff_steps: crate::backoff::default_steps(),
        }
    }
}

impl LinkConfig {
    /// Build a config from `GROUNDLINK_*` environment variables, falling back
    /// to defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let keepalive_interval = match std::env::var("GROUNDLINK_KEEPALIVE_SECS") {
            Ok(raw) => {
                let secs: u64 = raw.parse().map_err(|_| {
                    GroundLinkError::ConfigError(format!(
                        "GROUNDLINK_KEEPALIVE_SECS is not a number: {raw}"
                    ))
                })?;
                Duration::from_secs(secs)
            }
            Err(_) => defaults.keepalive_interval,
        };

        Ok(Self {
            url: std::env::var("GROUNDLINK_URL").unwrap_or(defaults.url),
            instance: std::env::var("GROUNDLINK_INSTANCE").unwrap_or(defaults.instance),
            event_key: std::env::var("GROUNDLINK_EVENT_KEY").unwrap_or(defaults.event_key),
            keepalive_interval,
            backoff_steps: defaults.backoff_steps,
        })
    }

    /// Derive the websocket endpoint from the base URL and instance name.
    pub fn websocket_endpoint(&self) -> Result<Url> {
        let base = Url::parse(&self.url)?;
        let scheme = match base.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => {
                return Err(GroundLinkError::ConfigError(format!(
                    "unsupported URL scheme: {other}"
                )))
            }
        };
        let host = base
            .host_str()
            .ok_or_else(|| GroundLinkError::ConfigError("URL has no host".to_string()))?;

        let mut endpoint = format!("{scheme}://{host}");
        if let Some(port) = base.port() {
            endpoint.push_str(&format!(":{port}"));
        }
        endpoint.push_str(&format!("/_websocket/{}", self.instance));
        Ok(Url::parse(&endpoint)?)
    }
}
