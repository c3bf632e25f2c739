//! Notification Receiver - the buzzer side of a delivery
//!
//! Every accepted connection counts as one notification, whatever bytes (if
//! any) came with it. The handler pulses the actuator synchronously and only
//! then answers, so the caller sees roughly one pulse duration of latency.
//!
//! A failed pulse is answered with `500` instead of `Notified`. The
//! actuator has already been driven inactive by [`pulse`] at that point.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use buzzlink_core::constants::NOTIFIED_BODY;
use buzzlink_core::{pulse, Actuator, Clock};

use crate::server::{Handler, Request, Response};

/// Pulses the actuator once per request
pub struct NotificationReceiver<A, C> {
    actuator: A,
    clock: C,
    pulse: Duration,
    pulses: Arc<AtomicU64>,
}

impl<A: Actuator, C: Clock> NotificationReceiver<A, C> {
    pub fn new(actuator: A, clock: C, pulse: Duration) -> Self {
        Self {
            actuator,
            clock,
            pulse,
            pulses: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Completed pulses, readable from other threads
    pub fn pulse_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.pulses)
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }
}

impl<A: Actuator, C: Clock> Handler for NotificationReceiver<A, C> {
    fn handle(&mut self, request: &Request) -> Response {
        match request.peer {
            Some(peer) => log::info!("Notification from {} ({} bytes)", peer, request.bytes.len()),
            None => log::info!("Notification received ({} bytes)", request.bytes.len()),
        }

        match pulse(&mut self.actuator, self.pulse, &self.clock) {
            Ok(()) => {
                self.pulses.fetch_add(1, Ordering::Relaxed);
                Response::ok(NOTIFIED_BODY)
            }
            Err(e) => {
                log::error!("Buzzer pulse failed: {}", e);
                Response::new(500, "Internal Server Error", "Actuator failure")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buzzlink_core::{MemoryActuator, MockClock};

    fn request(bytes: &[u8]) -> Request {
        Request {
            peer: None,
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn any_request_pulses_once() {
        let clock = MockClock::new(0);
        let actuator = MemoryActuator::new();
        let mut receiver = NotificationReceiver::new(actuator.clone(), clock.clone(), Duration::from_millis(500));

        let response = receiver.handle(&request(b"GET /notify HTTP/1.1\r\n\r\n"));
        assert_eq!(response, Response::ok("Notified"));

        let response = receiver.handle(&request(b""));
        assert_eq!(response.body, "Notified");

        assert_eq!(actuator.activations(), 2);
        assert!(!actuator.is_active());
        assert_eq!(clock.now(), 1000);
        assert_eq!(receiver.pulse_counter().load(Ordering::Relaxed), 2);
    }

    #[test]
    fn actuator_failure_answers_500_and_stays_off() {
        let actuator = MemoryActuator::new();
        actuator.fail_activations(1);
        let mut receiver = NotificationReceiver::new(actuator.clone(), MockClock::new(0), Duration::from_millis(500));

        let response = receiver.handle(&request(b""));
        assert_eq!(response.status, 500);
        assert!(!actuator.is_active());
        assert_eq!(receiver.pulse_counter().load(Ordering::Relaxed), 0);

        // Recovers on the next request
        assert_eq!(receiver.handle(&request(b"")).status, 200);
    }
}
