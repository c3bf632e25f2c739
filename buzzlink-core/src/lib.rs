//! Core notification pipeline for buzzlink
//!
//! Turns a noisy, continuously sampled presence signal into a bounded stream
//! of notification events, and drives a buzzer for a bounded pulse when one
//! arrives. Networking lives in `buzzlink-connectors`; this crate has the
//! parts both devices share.
//!
//! ```text
//! PresenceSignal → EdgeDetector → CooldownQueue → (delivery worker) → ...
//!                                                   ... → receiver → pulse(Actuator)
//! ```
//!
//! Key constraints:
//! - The polling loop never blocks on anything but its own sleep
//! - At most `N` events wait for delivery; extra edges are dropped
//! - The actuator is inactive after every pulse, whatever happened during it
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use buzzlink_core::{CooldownQueue, DetectionLoop, DetectionSwitch, FileSignal, SystemClock};
//!
//! let queue: Arc<CooldownQueue> = Arc::new(CooldownQueue::new());
//! let mut detection = DetectionLoop::new(
//!     FileSignal::new("/run/presence"),
//!     Arc::clone(&queue),
//!     DetectionSwitch::new(true),
//!     SystemClock::new(),
//!     Duration::from_millis(100),
//! );
//! detection.run();
//! ```

#![deny(unsafe_code)]

pub mod actuator;
pub mod config;
pub mod constants;
pub mod detect;
pub mod edge;
pub mod errors;
pub mod proximity;
pub mod queue;
pub mod signal;
pub mod time;

// Public API
pub use actuator::{pulse, Actuator, FileActuator, MemoryActuator};
pub use config::{DeliveryConfig, DetectorConfig, HeartbeatConfig, NodeConfig, ReceiverConfig};
pub use detect::{DetectionLoop, DetectionSwitch, PeriodicTrigger, PollOutcome};
pub use edge::EdgeDetector;
pub use errors::{ActuatorError, ConfigError, SignalError, SignalResult};
pub use proximity::{BeepPlan, ProximityAlarm};
pub use queue::{CooldownQueue, NotificationEvent, QueueSnapshot};
pub use signal::{
    echo_to_distance_cm, DistanceSignal, EchoPulse, EchoRanger, FileSignal, PresenceSignal,
    RangeSensor, Reading, ScriptedSignal,
};
pub use time::{Clock, MockClock, SystemClock, Timestamp};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_exists() {
        assert!(!VERSION.is_empty());
    }
}
