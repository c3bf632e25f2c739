//! Buffer Sizes
//!
//! Queue and receive limits. Small on purpose: the actuator side handles at
//! most one request per cooldown.

/// Default capacity of the cooldown queue (events).
///
/// Five pending buzzes is already 15 seconds of backlog at the default
/// cooldown; anything beyond that is stale and dropped.
pub const DEFAULT_QUEUE_CAPACITY: usize = 5;

/// Bytes the receiver reads (and discards) from each request.
pub const DEFAULT_READ_LIMIT_BYTES: usize = 512;
