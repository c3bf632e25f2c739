//! Time-Related Constants
//!
//! Intervals for the three long-running tasks. All values are milliseconds.

// ===== POLLING =====

/// Presence polling interval (milliseconds).
///
/// 10 Hz comfortably outpaces a person walking into range, which lasts
/// several hundred milliseconds at least.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

// ===== DELIVERY =====

/// Minimum gap between the starts of two delivery attempts (milliseconds).
///
/// Applied after every attempt whatever its outcome, so a backlog that
/// built up during an outage drains at one buzz per cooldown.
pub const DEFAULT_COOLDOWN_MS: u64 = 3000;

/// Interval of the buzzer device's periodic return notification (milliseconds).
pub const DEFAULT_HEARTBEAT_INTERVAL_MS: u64 = 5000;

// ===== ACTUATION =====

/// Buzzer pulse length for a received notification (milliseconds).
///
/// Kept under a second because the receiver answers only after the pulse.
pub const DEFAULT_PULSE_MS: u64 = 500;

/// Short chirp used by the proximity beeper (milliseconds).
pub const PROXIMITY_CHIRP_MS: u64 = 50;

/// Pause per centimetre of distance between proximity chirps (milliseconds).
///
/// An object at 10 cm beeps every 500 ms, at 2 cm every 100 ms.
pub const PROXIMITY_PAUSE_MS_PER_CM: f32 = 50.0;

/// Idle pause of the proximity beeper when nothing is in range (milliseconds).
pub const PROXIMITY_IDLE_MS: u64 = 300;
