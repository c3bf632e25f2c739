//! Constants for buzzlink Core
//!
//! Every default the pipeline runs with lives here, with its unit in the
//! name. Configuration structs take their `Default` from these values and the
//! binary exposes each one as a flag, so nothing in the loops is a magic
//! number.
//!
//! ## Organization
//!
//! - **Time**: poll cadence, cooldown, pulse and heartbeat intervals
//! - **Sensors**: presence threshold and ultrasonic echo conversion
//! - **Buffers**: queue capacity and receive limits
//! - **Network**: ports, timeouts and the fixed wire responses

/// Intervals and durations for the polling, delivery and actuation loops.
pub mod time;

/// Presence threshold and ultrasonic ranging parameters.
pub mod sensors;

/// Queue capacity and per-connection read limits.
pub mod buffers;

/// Ports, timeouts and fixed response bodies.
pub mod network;

// Re-export commonly used constants for convenience
pub use time::{
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_COOLDOWN_MS, DEFAULT_PULSE_MS,
    DEFAULT_HEARTBEAT_INTERVAL_MS,
};

pub use sensors::{
    DEFAULT_PRESENCE_THRESHOLD_CM, SPEED_OF_SOUND_CM_PER_US, DEFAULT_ECHO_TIMEOUT_US,
};

pub use buffers::{DEFAULT_QUEUE_CAPACITY, DEFAULT_READ_LIMIT_BYTES};

pub use network::{
    DEFAULT_RECEIVER_PORT, DEFAULT_CONTROL_PORT, DEFAULT_DELIVERY_TIMEOUT_MS,
    DEFAULT_CONNECTION_TIMEOUT_MS, NOTIFIED_BODY,
};
