//! Error Types for the Notification Pipeline
//!
//! ## Design Philosophy
//!
//! buzzlink runs headless on small devices, and every long-running loop must
//! survive the failure of any single sub-operation. Errors here are therefore
//! values a loop inspects, logs and absorbs, never something that unwinds a
//! worker thread.
//!
//! ## Error Categories
//!
//! ### Sensing
//! - `SignalError`: the presence source could not produce a reading
//!   (echo timeout, classifier stream closed, unreadable file). The detection
//!   loop treats every variant as "no presence".
//!
//! ### Actuation
//! - `ActuatorError`: the buzzer pin could not be driven. The pulse routine
//!   still forces the pin inactive before reporting it.
//!
//! ### Configuration
//! - `ConfigError`: a startup constant is unusable (zero cooldown, bad URL).
//!   This is the only category allowed to stop the process, and only before
//!   any loop is started.
//!
//! Queue-full is not an error: dropping an event is flow control, and
//! `CooldownQueue::try_enqueue` reports it as `false`.
//!
//! ## Error Handling Strategy
//!
//! ```rust
//! use buzzlink_core::{SignalError, PresenceSignal, ScriptedSignal};
//!
//! let mut signal = ScriptedSignal::new([true]);
//! let present = match signal.read() {
//!     Ok(present) => present,
//!     Err(SignalError::Timeout { .. }) => false, // nothing in range
//!     Err(_) => false,                           // log and carry on
//! };
//! assert!(present);
//! ```

use thiserror::Error;

/// Result type for presence reads
pub type SignalResult<T> = Result<T, SignalError>;

/// Failures reading the presence source
#[derive(Error, Debug)]
pub enum SignalError {
    /// The sensor did not answer within its window
    #[error("Sensor timed out after {waited_us}us")]
    Timeout {
        /// How long the read waited before giving up
        waited_us: u64,
    },

    /// The reading exists but cannot be interpreted
    #[error("Unreadable sample: {0}")]
    Malformed(String),

    /// The source is gone (stream closed, scripted samples exhausted)
    #[error("Signal source unavailable: {0}")]
    Unavailable(String),

    /// Underlying I/O failure
    #[error("Signal I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures driving the actuator
#[derive(Error, Debug)]
pub enum ActuatorError {
    /// The pin rejected the requested level
    #[error("Failed to drive actuator {state}: {reason}")]
    Drive {
        /// Requested level ("on" or "off")
        state: &'static str,
        /// Driver-supplied reason
        reason: String,
    },

    /// Underlying I/O failure (sysfs write, device node)
    #[error("Actuator I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Invalid startup configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A field holds a value the pipeline cannot run with
    #[error("Invalid {field}: {reason}")]
    Invalid {
        /// Offending field name
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },

    /// The config file could not be read
    #[error("Cannot read config: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid JSON for `NodeConfig`
    #[error("Cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
