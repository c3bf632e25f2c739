//! HTTP Notifier - one bounded GET per event
//!
//! ## Overview
//!
//! Delivery is a `GET` to a fixed URL with no body. The response body is
//! only read for logging. There is no retry: a failed attempt is reported to
//! the worker, which absorbs it and moves on to its cooldown.
//!
//! ## Implementation Choices
//!
//! - `ureq` keeps the client synchronous, which fits the thread-per-loop
//!   model; the worker thread simply blocks for at most the timeout.
//! - The agent-wide timeout covers connect, write and read together, so a
//!   black-holed receiver costs exactly one timeout per event.
//!
//! ## Example Usage
//!
//! ```no_run
//! use buzzlink_connectors::{HttpNotifier, Notifier};
//! use buzzlink_core::DeliveryConfig;
//!
//! let config = DeliveryConfig::new("http://10.0.0.14:8080/notify").timeout_ms(2000);
//! let mut notifier = HttpNotifier::new(&config)?;
//!
//! match notifier.notify() {
//!     Ok(receipt) => println!("buzzer answered {}", receipt.status),
//!     Err(e) => eprintln!("delivery failed: {e}"),
//! }
//! # Ok::<(), buzzlink_core::ConfigError>(())
//! ```

use std::io;
use std::time::Duration;

use buzzlink_core::{ConfigError, DeliveryConfig};

use crate::{DeliveryError, DeliveryReceipt, Notifier};

/// Longest response body kept in a receipt
const MAX_LOGGED_BODY: usize = 128;

/// HTTP notifier using the lightweight ureq client
pub struct HttpNotifier {
    url: String,
    agent: ureq::Agent,
}

impl HttpNotifier {
    /// Create a notifier for `config.url` bounded by `config.timeout`
    pub fn new(config: &DeliveryConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_timeout(config.url.clone(), config.timeout()))
    }

    fn with_timeout(url: String, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .timeout_connect(timeout)
            .user_agent(&format!("buzzlink/{}", env!("CARGO_PKG_VERSION")))
            .build();
        Self { url, agent }
    }
}

impl Notifier for HttpNotifier {
    fn notify(&mut self) -> Result<DeliveryReceipt, DeliveryError> {
        match self.agent.get(&self.url).call() {
            Ok(response) => {
                let status = response.status();
                let body = response
                    .into_string()
                    .map(|text| truncate(&text))
                    .unwrap_or_else(|e| format!("<unreadable body: {e}>"));
                Ok(DeliveryReceipt { status, body })
            }
            Err(ureq::Error::Status(status, response)) => Err(DeliveryError::Status {
                status,
                body: response.into_string().map(|text| truncate(&text)).unwrap_or_default(),
            }),
            Err(ureq::Error::Transport(transport)) => Err(classify_transport(transport)),
        }
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}

fn classify_transport(transport: ureq::Transport) -> DeliveryError {
    let timed_out = std::error::Error::source(&transport)
        .and_then(|source| source.downcast_ref::<io::Error>())
        .map(|e| matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock))
        .unwrap_or(false);
    if timed_out {
        return DeliveryError::Timeout;
    }

    match transport.kind() {
        ureq::ErrorKind::ConnectionFailed | ureq::ErrorKind::Dns => {
            DeliveryError::Connection(transport.to_string())
        }
        _ => DeliveryError::Transport(transport.to_string()),
    }
}

fn truncate(text: &str) -> String {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(MAX_LOGGED_BODY) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}
