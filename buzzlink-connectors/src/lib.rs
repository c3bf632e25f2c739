//! Network Connectors for buzzlink
//!
//! ## Overview
//!
//! Both devices in a buzzlink deployment speak the same minimal protocol: a
//! plain `GET` with no body, answered by a short plaintext response. This
//! crate holds both ends of it.
//!
//! ### Outbound
//!
//! - [`Notifier`]: one delivery call per event, no retries
//! - [`http::HttpNotifier`]: `ureq`-backed implementation with a hard
//!   timeout
//! - [`worker::DeliveryWorker`]: drains a `CooldownQueue`, calls the
//!   notifier, then sleeps the cooldown whatever the outcome
//!
//! ### Inbound
//!
//! - [`server::Server`]: serial accept loop with per-connection timeouts
//! - [`receiver::NotificationReceiver`]: pulses the buzzer and answers
//!   `Notified`
//! - [`control::ControlEndpoint`]: `/video` and `/stop` toggle detection
//!
//! ### Wiring
//!
//! - [`pipeline`]: spawns the long-running threads for each device role
//!
//! ## Failure Model
//!
//! Nothing in here is allowed to take a loop down. Delivery failures are
//! counted and logged by the worker; per-connection failures are counted and
//! logged by the server. The only errors that escape are startup errors
//! (binding a port, spawning a thread).

pub mod control;
pub mod http;
pub mod pipeline;
pub mod receiver;
pub mod server;
pub mod worker;

pub use control::ControlEndpoint;
pub use http::HttpNotifier;
pub use pipeline::{spawn_buzzer, spawn_detector, BuzzerNode, DetectorNode, Heartbeat, StartupError};
pub use receiver::NotificationReceiver;
pub use server::{Handler, Request, Response, Server, ServerError, ServerStats};
pub use worker::{Attempt, DeliveryStats, DeliveryWorker};

use thiserror::Error;

/// Why a delivery attempt failed
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// No answer within the configured timeout
    #[error("Timed out")]
    Timeout,

    /// The endpoint could not be reached
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The endpoint answered with an error status
    #[error("Endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Any other transport-level failure
    #[error("Transport error: {0}")]
    Transport(String),
}

/// What came back from a successful delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub status: u16,
    /// Response body, kept for diagnostics only
    pub body: String,
}

/// One outbound notification call per event
///
/// Implementations must bound the call in time and must not retry; the
/// worker's cooldown is the only pacing.
pub trait Notifier: Send {
    fn notify(&mut self) -> Result<DeliveryReceipt, DeliveryError>;

    /// Where notifications go, for logs
    fn endpoint(&self) -> &str;
}

impl<N: Notifier + ?Sized> Notifier for Box<N> {
    fn notify(&mut self) -> Result<DeliveryReceipt, DeliveryError> {
        (**self).notify()
    }

    fn endpoint(&self) -> &str {
        (**self).endpoint()
    }
}
