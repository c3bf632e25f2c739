//! Producers feeding the cooldown queue
//!
//! - [`DetectionLoop`]: polls a presence source at a fixed cadence, turns
//!   episodes into edges and offers each edge to the queue
//! - [`PeriodicTrigger`]: offers an event on a fixed interval regardless of
//!   any input (the buzzer device's return notification)
//!
//! Both only ever call `try_enqueue`, so neither can be held up by the
//! delivery side. A full queue is logged and the event forgotten.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::constants::DEFAULT_QUEUE_CAPACITY;
use crate::edge::EdgeDetector;
use crate::queue::CooldownQueue;
use crate::signal::PresenceSignal;
use crate::time::Clock;

/// Shared on/off flag for the detection loop
///
/// Clones share the flag; the control endpoint holds one, the loop another.
#[derive(Debug, Clone, Default)]
pub struct DetectionSwitch {
    enabled: Arc<AtomicBool>,
}

impl DetectionSwitch {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: Arc::new(AtomicBool::new(enabled)),
        }
    }

    /// Turn detection on; returns `false` if it was already on
    pub fn enable(&self) -> bool {
        !self.enabled.swap(true, Ordering::SeqCst)
    }

    /// Turn detection off; returns `false` if it was already off
    pub fn disable(&self) -> bool {
        self.enabled.swap(false, Ordering::SeqCst)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }
}

/// Result of one poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Detection is switched off; nothing was sampled
    Disabled,
    /// Nothing present
    Absent,
    /// Present, still inside an already-reported episode
    Present,
    /// Rising edge; `accepted` is false when the queue dropped it
    Edge { accepted: bool },
    /// The source failed; treated as absent
    ReadFailed,
}

/// Poll, detect edges, enqueue
pub struct DetectionLoop<S, C, const N: usize = DEFAULT_QUEUE_CAPACITY> {
    signal: S,
    detector: EdgeDetector,
    queue: Arc<CooldownQueue<N>>,
    switch: DetectionSwitch,
    clock: C,
    poll_interval: Duration,
    was_enabled: bool,
}

impl<S, C, const N: usize> DetectionLoop<S, C, N>
where
    S: PresenceSignal,
    C: Clock,
{
    pub fn new(
        signal: S,
        queue: Arc<CooldownQueue<N>>,
        switch: DetectionSwitch,
        clock: C,
        poll_interval: Duration,
    ) -> Self {
        Self {
            signal,
            detector: EdgeDetector::new(),
            queue,
            switch,
            clock,
            poll_interval,
            was_enabled: false,
        }
    }

    /// Replace the edge detector (e.g. one with a longer rearm run)
    pub fn with_detector(mut self, detector: EdgeDetector) -> Self {
        self.detector = detector;
        self
    }

    /// Take one sample and act on it, without sleeping
    pub fn poll_once(&mut self) -> PollOutcome {
        let enabled = self.switch.is_enabled();
        if enabled != self.was_enabled {
            log::info!("Detection {}", if enabled { "started" } else { "stopped" });
            self.was_enabled = enabled;
            self.detector.reset();
        }
        if !enabled {
            return PollOutcome::Disabled;
        }

        let (present, outcome) = match self.signal.read() {
            Ok(present) => (present, None),
            Err(e) => {
                log::debug!("Presence read failed, treating as absent: {}", e);
                (false, Some(PollOutcome::ReadFailed))
            }
        };

        if self.detector.observe(present) {
            let accepted = self.queue.try_enqueue(self.clock.now());
            if accepted {
                log::info!("Presence detected - notification queued ({} pending)", self.queue.len());
            } else {
                log::warn!("Presence detected - queue full, notification dropped");
            }
            return PollOutcome::Edge { accepted };
        }

        outcome.unwrap_or(if present {
            PollOutcome::Present
        } else {
            PollOutcome::Absent
        })
    }

    /// Poll forever at the configured cadence
    pub fn run(&mut self) -> ! {
        loop {
            self.poll_once();
            self.clock.sleep(self.poll_interval);
        }
    }

    pub fn queue(&self) -> &Arc<CooldownQueue<N>> {
        &self.queue
    }
}

/// Fixed-interval producer
pub struct PeriodicTrigger<C, const N: usize = DEFAULT_QUEUE_CAPACITY> {
    queue: Arc<CooldownQueue<N>>,
    clock: C,
    interval: Duration,
}

impl<C: Clock, const N: usize> PeriodicTrigger<C, N> {
    pub fn new(queue: Arc<CooldownQueue<N>>, clock: C, interval: Duration) -> Self {
        Self {
            queue,
            clock,
            interval,
        }
    }

    /// Offer one event now
    pub fn fire(&self) -> bool {
        let accepted = self.queue.try_enqueue(self.clock.now());
        if accepted {
            log::info!("Notification queued ({} pending)", self.queue.len());
        } else {
            log::warn!("Queue full - notification dropped");
        }
        accepted
    }

    /// Fire, then wait one interval, forever
    pub fn run(&self) -> ! {
        loop {
            self.fire();
            self.clock.sleep(self.interval);
        }
    }
}
