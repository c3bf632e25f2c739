//! Delivery Worker - the rate limiter
//!
//! One worker drains one [`CooldownQueue`]. Each cycle:
//!
//! 1. Block until an event is queued
//! 2. Make exactly one delivery attempt, bounded by the notifier's timeout
//! 3. Sleep the full cooldown, whether the attempt succeeded or not
//!
//! Because the cooldown follows every attempt, two attempt starts are always
//! at least one cooldown apart. A burst of `N` queued events is therefore
//! spread over at least `N` cooldowns; anything beyond that was already
//! dropped by the queue.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use buzzlink_core::constants::DEFAULT_QUEUE_CAPACITY;
use buzzlink_core::{Clock, CooldownQueue, NotificationEvent, Timestamp};

use crate::{DeliveryError, DeliveryReceipt, Notifier};

/// Delivery counters, shared with whoever spawned the worker
#[derive(Debug, Default)]
pub struct DeliveryStats {
    /// Attempts started
    pub attempts: AtomicU64,
    /// Attempts answered with a success status
    pub delivered: AtomicU64,
    /// Attempts that timed out, could not connect or got an error status
    pub failed: AtomicU64,
}

/// Outcome of one worker cycle
#[derive(Debug)]
pub struct Attempt {
    pub event: NotificationEvent,
    /// Clock reading when the attempt started
    pub started_at: Timestamp,
    pub result: Result<DeliveryReceipt, DeliveryError>,
}

/// Dequeue, deliver, cool down
pub struct DeliveryWorker<T, C, const N: usize = DEFAULT_QUEUE_CAPACITY> {
    queue: Arc<CooldownQueue<N>>,
    notifier: T,
    clock: C,
    cooldown: Duration,
    stats: Arc<DeliveryStats>,
}

impl<T, C, const N: usize> DeliveryWorker<T, C, N>
where
    T: Notifier,
    C: Clock,
{
    pub fn new(queue: Arc<CooldownQueue<N>>, notifier: T, clock: C, cooldown: Duration) -> Self {
        Self {
            queue,
            notifier,
            clock,
            cooldown,
            stats: Arc::new(DeliveryStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<DeliveryStats> {
        Arc::clone(&self.stats)
    }

    pub fn notifier(&self) -> &T {
        &self.notifier
    }

    /// Run one full cycle, blocking until there is something to deliver
    pub fn deliver_next(&mut self) -> Attempt {
        let event = self.queue.dequeue_blocking();
        self.deliver(event)
    }

    /// Deliver one event and serve the cooldown that follows it
    pub fn deliver(&mut self, event: NotificationEvent) -> Attempt {
        let started_at = self.clock.now();
        self.stats.attempts.fetch_add(1, Ordering::Relaxed);

        let result = self.notifier.notify();
        match &result {
            Ok(receipt) => {
                self.stats.delivered.fetch_add(1, Ordering::Relaxed);
                log::info!(
                    "Notification #{} delivered to {} ({} {})",
                    event.seq(),
                    self.notifier.endpoint(),
                    receipt.status,
                    receipt.body
                );
            }
            Err(e) => {
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
                log::warn!(
                    "Notification #{} to {} failed: {}",
                    event.seq(),
                    self.notifier.endpoint(),
                    e
                );
            }
        }

        self.clock.sleep(self.cooldown);
        Attempt {
            event,
            started_at,
            result,
        }
    }

    /// Deliver forever
    pub fn run(&mut self) -> ! {
        log::info!(
            "Delivering to {} with {:?} cooldown",
            self.notifier.endpoint(),
            self.cooldown
        );
        loop {
            self.deliver_next();
        }
    }
}
