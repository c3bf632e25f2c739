//! Startup configuration
//!
//! Every knob is fixed for the lifetime of the process. Values come from,
//! in increasing priority: the defaults in [`crate::constants`], an optional
//! JSON file ([`NodeConfig::from_json_file`]), and command-line flags
//! applied by the binary through the builder methods.
//!
//! All durations are stored as milliseconds so the JSON stays readable:
//!
//! ```json
//! {
//!   "notify": { "url": "http://10.0.0.14:8080/notify", "cooldown_ms": 3000 },
//!   "receiver": { "port": 8080, "pulse_ms": 500 }
//! }
//! ```
//!
//! Missing sections and fields fall back to their defaults.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::network::{NOTIFY_PATH, START_PATH};
use crate::constants::*;
use crate::errors::ConfigError;

/// Detection loop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Delay between presence samples
    pub poll_interval_ms: u64,
    /// Distance at or below which a reading counts as present
    pub presence_threshold_cm: f32,
    /// Absent samples required to rearm the edge detector
    pub rearm_samples: u32,
    /// Port of the start/stop control endpoint
    pub control_port: u16,
    /// Sample from startup instead of waiting for a start request
    pub start_enabled: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            presence_threshold_cm: DEFAULT_PRESENCE_THRESHOLD_CM,
            rearm_samples: 1,
            control_port: DEFAULT_CONTROL_PORT,
            start_enabled: false,
        }
    }
}

impl DetectorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    pub fn presence_threshold_cm(mut self, cm: f32) -> Self {
        self.presence_threshold_cm = cm;
        self
    }

    pub fn rearm_samples(mut self, samples: u32) -> Self {
        self.rearm_samples = samples;
        self
    }

    pub fn control_port(mut self, port: u16) -> Self {
        self.control_port = port;
        self
    }

    pub fn start_enabled(mut self, enabled: bool) -> Self {
        self.start_enabled = enabled;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::invalid("poll_interval_ms", "must be greater than zero"));
        }
        if !self.presence_threshold_cm.is_finite() || self.presence_threshold_cm <= 0.0 {
            return Err(ConfigError::invalid(
                "presence_threshold_cm",
                format!("must be a positive distance, got {}", self.presence_threshold_cm),
            ));
        }
        if self.rearm_samples == 0 {
            return Err(ConfigError::invalid("rearm_samples", "must be at least 1"));
        }
        Ok(())
    }
}

/// Outbound delivery settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Endpoint called once per event
    pub url: String,
    /// Minimum gap between attempt starts
    pub cooldown_ms: u64,
    /// Upper bound on one call
    pub timeout_ms: u64,
}

impl DeliveryConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            cooldown_ms: DEFAULT_COOLDOWN_MS,
            timeout_ms: DEFAULT_DELIVERY_TIMEOUT_MS,
        }
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn cooldown_ms(mut self, ms: u64) -> Self {
        self.cooldown_ms = ms;
        self
    }

    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = ms;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(ConfigError::invalid(
                "url",
                format!("must start with http:// or https://, got {:?}", self.url),
            ));
        }
        if self.cooldown_ms == 0 {
            return Err(ConfigError::invalid("cooldown_ms", "must be greater than zero"));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::invalid("timeout_ms", "must be greater than zero"));
        }
        Ok(())
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self::new(format!("http://127.0.0.1:{DEFAULT_RECEIVER_PORT}{NOTIFY_PATH}"))
    }
}

/// Inbound listener settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiverConfig {
    /// Interface to bind
    pub bind_addr: String,
    /// Port to listen on
    pub port: u16,
    /// Read/write timeout per connection
    pub connection_timeout_ms: u64,
    /// Bytes read (and discarded) per request
    pub read_limit_bytes: usize,
    /// Actuator pulse per notification
    pub pulse_ms: u64,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".into(),
            port: DEFAULT_RECEIVER_PORT,
            connection_timeout_ms: DEFAULT_CONNECTION_TIMEOUT_MS,
            read_limit_bytes: DEFAULT_READ_LIMIT_BYTES,
            pulse_ms: DEFAULT_PULSE_MS,
        }
    }
}

impl ReceiverConfig {
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }

    pub fn pulse(&self) -> Duration {
        Duration::from_millis(self.pulse_ms)
    }

    /// `bind_addr:port`
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    pub fn bind_addr(mut self, addr: impl Into<String>) -> Self {
        self.bind_addr = addr.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn connection_timeout_ms(mut self, ms: u64) -> Self {
        self.connection_timeout_ms = ms;
        self
    }

    pub fn read_limit_bytes(mut self, bytes: usize) -> Self {
        self.read_limit_bytes = bytes;
        self
    }

    pub fn pulse_ms(mut self, ms: u64) -> Self {
        self.pulse_ms = ms;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connection_timeout_ms == 0 {
            return Err(ConfigError::invalid("connection_timeout_ms", "must be greater than zero"));
        }
        if self.read_limit_bytes == 0 {
            return Err(ConfigError::invalid("read_limit_bytes", "must be greater than zero"));
        }
        if self.pulse_ms == 0 {
            return Err(ConfigError::invalid("pulse_ms", "must be greater than zero"));
        }
        Ok(())
    }
}

/// Periodic return notification from the buzzer device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeartbeatConfig {
    pub enabled: bool,
    /// Delay between enqueue attempts
    pub interval_ms: u64,
    /// Where the return notifications go
    pub delivery: DeliveryConfig,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: DEFAULT_HEARTBEAT_INTERVAL_MS,
            delivery: DeliveryConfig::new(format!(
                "http://127.0.0.1:{DEFAULT_CONTROL_PORT}{START_PATH}"
            )),
        }
    }
}

impl HeartbeatConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn interval_ms(mut self, ms: u64) -> Self {
        self.interval_ms = ms;
        self
    }

    pub fn delivery(mut self, delivery: DeliveryConfig) -> Self {
        self.delivery = delivery;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.enabled {
            return Ok(());
        }
        if self.interval_ms == 0 {
            return Err(ConfigError::invalid("interval_ms", "must be greater than zero"));
        }
        self.delivery.validate()
    }
}

/// Everything one device needs, whichever role it runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub detector: DetectorConfig,
    /// Detector to buzzer notifications
    pub notify: DeliveryConfig,
    pub receiver: ReceiverConfig,
    pub heartbeat: HeartbeatConfig,
}

impl NodeConfig {
    /// Load from a JSON file; absent fields keep their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.detector.validate()?;
        self.notify.validate()?;
        self.receiver.validate()?;
        self.heartbeat.validate()
    }
}
