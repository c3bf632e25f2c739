//! Rising-Edge Detection over a Presence Signal
//!
//! The presence source is sampled continuously and reports `true` for as
//! long as something is in front of it. The notification pipeline wants one
//! event per *episode*, not per sample:
//!
//! ```text
//! sample:  F  F  T  T  T  F  T  T  F
//! edge:    .  .  ^  .  .  .  ^  .  .     -> 2 events
//! ```
//!
//! The detector is a single sticky flag. It fires on the first present sample
//! after an absent one (or after construction) and rearms on an absent
//! sample. A signal that flickers `T F T` produces two edges; smoothing that
//! out is the cooldown queue's job, not this one's.
//!
//! For very noisy sources [`EdgeDetector::with_rearm_samples`] requires a run
//! of absent samples before rearming. The default of one sample is the plain
//! edge behaviour described above.

/// Turns a repeating presence reading into discrete rising edges
#[derive(Debug, Clone)]
pub struct EdgeDetector {
    /// Set while inside a presence episode
    triggered: bool,
    /// Consecutive absent samples seen while triggered
    absent_run: u32,
    /// Absent samples needed to rearm
    rearm_samples: u32,
}

impl EdgeDetector {
    /// Create a detector that rearms on the first absent sample
    pub fn new() -> Self {
        Self {
            triggered: false,
            absent_run: 0,
            rearm_samples: 1,
        }
    }

    /// Require `samples` consecutive absent readings before rearming
    ///
    /// Values below 1 are treated as 1.
    pub fn with_rearm_samples(mut self, samples: u32) -> Self {
        self.rearm_samples = samples.max(1);
        self
    }

    /// Feed one sample; returns `true` exactly on a rising edge
    pub fn observe(&mut self, present: bool) -> bool {
        if present {
            self.absent_run = 0;
            if !self.triggered {
                self.triggered = true;
                return true;
            }
            return false;
        }

        if self.triggered {
            self.absent_run += 1;
            if self.absent_run >= self.rearm_samples {
                self.triggered = false;
                self.absent_run = 0;
            }
        }
        false
    }

    /// Whether the detector is inside an episode (will not fire again yet)
    pub fn is_triggered(&self) -> bool {
        self.triggered
    }

    /// Forget the current episode
    pub fn reset(&mut self) {
        self.triggered = false;
        self.absent_run = 0;
    }
}

impl Default for EdgeDetector {
    fn default() -> Self {
        Self::new()
    }
}
