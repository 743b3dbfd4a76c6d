// src/config.rs

//! Manages hub configuration: loading, resolving defaults, and validation.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;
use tracing::warn;

/// Timing and queueing parameters for every connection served by the hub.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HubConfig {
    /// A connection with no inbound traffic for this long is considered dead.
    #[serde(default = "default_liveness_timeout", with = "humantime_serde")]
    pub liveness_timeout: Duration,
    /// How often a liveness probe is sent. Must be shorter than `liveness_timeout`.
    #[serde(default = "default_probe_interval", with = "humantime_serde")]
    pub probe_interval: Duration,
    /// A single write that takes longer than this is fatal for its connection.
    #[serde(default = "default_write_timeout", with = "humantime_serde")]
    pub write_timeout: Duration,
    /// The number of envelopes a connection can have queued. Enqueueing onto a
    /// full queue drops the envelope for that recipient only. 0 is treated as 1.
    #[serde(default = "default_outbound_queue_capacity")]
    pub outbound_queue_capacity: usize,
    /// If true, broadcasts are also delivered back to their sender.
    #[serde(default)]
    pub echo_broadcast: bool,
    /// The largest inbound message the WebSocket transport accepts, in bytes.
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
}

fn default_liveness_timeout() -> Duration {
    Duration::from_secs(30)
}
fn default_probe_interval() -> Duration {
    // Half the liveness timeout, so one lost probe is not yet a death.
    default_liveness_timeout() / 2
}
fn default_write_timeout() -> Duration {
    Duration::from_secs(1)
}
fn default_outbound_queue_capacity() -> usize {
    64
}
fn default_max_message_size() -> usize {
    512
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            liveness_timeout: default_liveness_timeout(),
            probe_interval: default_probe_interval(),
            write_timeout: default_write_timeout(),
            outbound_queue_capacity: default_outbound_queue_capacity(),
            echo_broadcast: false,
            max_message_size: default_max_message_size(),
        }
    }
}

/// Configuration for the Prometheus metrics exporter.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MetricsConfig {
    /// If true, an HTTP server will be started to expose Prometheus metrics.
    #[serde(default)]
    pub enabled: bool,
    /// The port for the Prometheus metrics server.
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

fn default_metrics_port() -> u16 {
    8878
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
        }
    }
}

/// A raw representation of the config file before validation.
#[derive(Deserialize)]
struct RawConfig {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default = "default_max_clients")]
    max_clients: usize,
    #[serde(default)]
    hub: HubConfig,
    #[serde(default)]
    metrics: MetricsConfig,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    7002
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_max_clients() -> usize {
    10000
}

/// Represents the final, validated hub configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub max_clients: usize,
    #[serde(default)]
    pub hub: HubConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            max_clients: default_max_clients(),
            hub: HubConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Config {
    /// Creates a new `Config` instance by reading and parsing a TOML file.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at '{path}'"))?;
        Self::from_toml_str(&contents).with_context(|| format!("Invalid config in '{path}'"))
    }

    /// Parses and validates a configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let raw_config: RawConfig =
            toml::from_str(contents).context("Failed to parse TOML configuration")?;

        let config = Config {
            host: raw_config.host,
            port: raw_config.port,
            log_level: raw_config.log_level,
            max_clients: raw_config.max_clients,
            hub: raw_config.hub,
            metrics: raw_config.metrics,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration to ensure logical consistency.
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(anyhow!("port cannot be 0"));
        }
        if self.host.trim().is_empty() {
            return Err(anyhow!("host cannot be empty"));
        }
        if self.max_clients == 0 {
            return Err(anyhow!("max_clients cannot be 0"));
        }

        let hub = &self.hub;
        if hub.max_message_size == 0 {
            return Err(anyhow!("hub.max_message_size cannot be 0"));
        }
        if hub.liveness_timeout.is_zero() {
            return Err(anyhow!("hub.liveness_timeout cannot be 0"));
        }
        if hub.probe_interval.is_zero() {
            return Err(anyhow!("hub.probe_interval cannot be 0"));
        }
        if hub.write_timeout.is_zero() {
            return Err(anyhow!("hub.write_timeout cannot be 0"));
        }
        if hub.probe_interval >= hub.liveness_timeout {
            return Err(anyhow!(
                "hub.probe_interval ({:?}) must be shorter than hub.liveness_timeout ({:?})",
                hub.probe_interval,
                hub.liveness_timeout
            ));
        }
        if hub.probe_interval > hub.liveness_timeout / 2 {
            warn!(
                "hub.probe_interval ({:?}) is more than half of hub.liveness_timeout ({:?}); a single delayed pong may drop a healthy connection.",
                hub.probe_interval, hub.liveness_timeout
            );
        }

        if self.metrics.enabled {
            if self.metrics.port == 0 {
                return Err(anyhow!("metrics.port cannot be 0"));
            }
            if self.metrics.port == self.port {
                return Err(anyhow!(
                    "metrics.port cannot be the same as the main server port"
                ));
            }
        }
        Ok(())
    }
}
