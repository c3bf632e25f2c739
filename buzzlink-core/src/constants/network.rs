//! Network Constants
//!
//! Ports, timeouts and the fixed wire responses.

/// Port the buzzer device listens on for notifications.
pub const DEFAULT_RECEIVER_PORT: u16 = 8080;

/// Port the detector device listens on for start/stop control.
pub const DEFAULT_CONTROL_PORT: u16 = 8000;

/// Upper bound on one outbound delivery call (milliseconds).
pub const DEFAULT_DELIVERY_TIMEOUT_MS: u64 = 2000;

/// Read/write timeout on each accepted connection (milliseconds).
pub const DEFAULT_CONNECTION_TIMEOUT_MS: u64 = 2000;

/// Body of the receiver's success response.
pub const NOTIFIED_BODY: &str = "Notified";

/// Path the detector is notified on.
pub const NOTIFY_PATH: &str = "/notify";

/// Control path that starts detection.
pub const START_PATH: &str = "/video";

/// Control path that stops detection.
pub const STOP_PATH: &str = "/stop";
