//! Bounded Cooldown Queue between Detection and Delivery
//!
//! ## Overview
//!
//! The detection loop must never wait on the network, and the delivery
//! worker must never flood the actuator. This queue sits between them:
//!
//! ```text
//! Detection loop                     Delivery worker
//!      ↓                                   ↓
//!  try_enqueue ────→ [ e e e . . ] ────→ dequeue_blocking
//!      ↓                                   ↓
//!  never blocks,                      sleeps until an
//!  drops when full                    event arrives
//! ```
//!
//! ## Semantics
//!
//! - Capacity `N` is fixed at compile time (default 5).
//! - `try_enqueue` on a full queue is a no-op that returns `false`. The event
//!   is dropped, not retried; a backlog older than `N` cooldowns is stale.
//! - `dequeue_blocking` suspends the consumer until an event exists and
//!   returns events oldest first.
//!
//! ## Synchronization
//!
//! Storage is a `heapless::Deque` behind a `Mutex`, with a `Condvar`
//! signalled on every accepted enqueue. The emptiness check and the wait
//! happen under the same lock, so an enqueue racing with a consumer going to
//! sleep cannot be lost.
//!
//! One producer and one consumer is the intended use. More of either is
//! still race free, but FIFO is then only per producer.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use heapless::Deque;

use crate::constants::DEFAULT_QUEUE_CAPACITY;
use crate::time::Timestamp;

/// One detection episode waiting to be delivered
///
/// Events carry no payload. The sequence number and enqueue time are
/// diagnostics for logs; two events are otherwise interchangeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationEvent {
    seq: u64,
    enqueued_at: Timestamp,
}

impl NotificationEvent {
    /// Position of this event in the queue's acceptance order
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Timestamp passed to `try_enqueue`
    pub fn enqueued_at(&self) -> Timestamp {
        self.enqueued_at
    }
}

/// Queue statistics
///
/// Track queue health without taking the queue lock
#[derive(Debug, Default)]
pub struct QueueStats {
    /// Events accepted
    pub accepted: AtomicU64,
    /// Events dropped because the queue was full
    pub dropped: AtomicU64,
    /// Events handed to the consumer
    pub dequeued: AtomicU64,
    /// Maximum queue depth seen
    pub max_depth: AtomicU32,
}

impl QueueStats {
    /// Update max depth if current is higher
    fn update_max_depth(&self, current: u32) {
        self.max_depth.fetch_max(current, Ordering::Relaxed);
    }

    /// Point-in-time copy of the counters
    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            accepted: self.accepted.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            dequeued: self.dequeued.load(Ordering::Relaxed),
            max_depth: self.max_depth.load(Ordering::Relaxed),
        }
    }
}

/// Plain copy of [`QueueStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueSnapshot {
    pub accepted: u64,
    pub dropped: u64,
    pub dequeued: u64,
    pub max_depth: u32,
}

struct Inner<const N: usize> {
    events: Deque<NotificationEvent, N>,
    next_seq: u64,
}

/// Bounded FIFO of pending notifications
///
/// ## Example Usage
///
/// ```rust
/// use buzzlink_core::queue::CooldownQueue;
///
/// let queue: CooldownQueue<2> = CooldownQueue::new();
///
/// assert!(queue.try_enqueue(0));
/// assert!(queue.try_enqueue(10));
/// assert!(!queue.try_enqueue(20)); // full, dropped
///
/// let first = queue.dequeue_blocking();
/// assert_eq!(first.enqueued_at(), 0);
/// ```
pub struct CooldownQueue<const N: usize = DEFAULT_QUEUE_CAPACITY> {
    inner: Mutex<Inner<N>>,
    available: Condvar,
    stats: QueueStats,
}

impl<const N: usize> CooldownQueue<N> {
    /// Create an empty queue
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                events: Deque::new(),
                next_seq: 0,
            }),
            available: Condvar::new(),
            stats: QueueStats::default(),
        }
    }

    /// Fixed capacity of this queue
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Offer one event; returns `false` (and drops it) when the queue is full
    ///
    /// Never blocks beyond the short critical section.
    pub fn try_enqueue(&self, now: Timestamp) -> bool {
        let mut inner = self.lock();
        let event = NotificationEvent {
            seq: inner.next_seq,
            enqueued_at: now,
        };

        if inner.events.push_back(event).is_err() {
            drop(inner);
            self.stats.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        inner.next_seq += 1;
        let depth = inner.events.len() as u32;
        drop(inner);

        self.available.notify_one();
        self.stats.accepted.fetch_add(1, Ordering::Relaxed);
        self.stats.update_max_depth(depth);
        true
    }

    /// Take the oldest event, waiting as long as necessary for one
    pub fn dequeue_blocking(&self) -> NotificationEvent {
        let mut inner = self.lock();
        loop {
            if let Some(event) = inner.events.pop_front() {
                self.stats.dequeued.fetch_add(1, Ordering::Relaxed);
                return event;
            }
            inner = self
                .available
                .wait(inner)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Take the oldest event, waiting at most `timeout`
    pub fn dequeue_timeout(&self, timeout: Duration) -> Option<NotificationEvent> {
        let deadline = Instant::now() + timeout;
        let mut inner = self.lock();
        loop {
            if let Some(event) = inner.events.pop_front() {
                self.stats.dequeued.fetch_add(1, Ordering::Relaxed);
                return Some(event);
            }
            let remaining = deadline.checked_duration_since(Instant::now())?;
            let (guard, _) = self
                .available
                .wait_timeout(inner, remaining)
                .unwrap_or_else(PoisonError::into_inner);
            inner = guard;
        }
    }

    /// Take the oldest event if one is waiting
    pub fn try_dequeue(&self) -> Option<NotificationEvent> {
        let event = self.lock().events.pop_front();
        if event.is_some() {
            self.stats.dequeued.fetch_add(1, Ordering::Relaxed);
        }
        event
    }

    /// Current number of pending events
    pub fn len(&self) -> usize {
        self.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().events.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.lock().events.is_full()
    }

    /// Get queue statistics
    pub fn stats(&self) -> &QueueStats {
        &self.stats
    }

    // The deque is never left half-updated, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, Inner<N>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<const N: usize> Default for CooldownQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}
