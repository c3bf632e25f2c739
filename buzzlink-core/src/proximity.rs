//! Local proximity beeper
//!
//! A standalone mode for a device that has both the ranger and the buzzer:
//! no network, just a parking-sensor style alarm that chirps faster as an
//! object gets closer.
//!
//! ```text
//! distance <= threshold:  chirp 50ms, pause distance*50ms
//! otherwise:              buzzer off, pause 300ms
//! ```

use std::time::Duration;

use crate::actuator::{pulse, Actuator};
use crate::constants::time::{PROXIMITY_CHIRP_MS, PROXIMITY_IDLE_MS, PROXIMITY_PAUSE_MS_PER_CM};
use crate::constants::DEFAULT_PRESENCE_THRESHOLD_CM;
use crate::signal::RangeSensor;
use crate::time::Clock;

/// What one beeper cycle does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeepPlan {
    /// Object in range: chirp, then pause proportionally to distance
    Chirp { on: Duration, pause: Duration },
    /// Nothing in range
    Idle { pause: Duration },
}

impl BeepPlan {
    /// Plan the cycle for a measured distance
    pub fn for_distance(distance_cm: f32, threshold_cm: f32) -> Self {
        if distance_cm.is_nan() || distance_cm > threshold_cm {
            return Self::idle();
        }
        let pause_ms = (distance_cm.max(0.0) * PROXIMITY_PAUSE_MS_PER_CM) as u64;
        Self::Chirp {
            on: Duration::from_millis(PROXIMITY_CHIRP_MS),
            pause: Duration::from_millis(pause_ms),
        }
    }

    pub fn idle() -> Self {
        Self::Idle {
            pause: Duration::from_millis(PROXIMITY_IDLE_MS),
        }
    }
}

/// Ranger-driven buzzer loop
pub struct ProximityAlarm<R, A, C> {
    sensor: R,
    actuator: A,
    clock: C,
    threshold_cm: f32,
}

impl<R, A, C> ProximityAlarm<R, A, C>
where
    R: RangeSensor,
    A: Actuator,
    C: Clock,
{
    pub fn new(sensor: R, actuator: A, clock: C) -> Self {
        Self {
            sensor,
            actuator,
            clock,
            threshold_cm: DEFAULT_PRESENCE_THRESHOLD_CM,
        }
    }

    pub fn with_threshold_cm(mut self, threshold_cm: f32) -> Self {
        self.threshold_cm = threshold_cm;
        self
    }

    /// Measure once and run one cycle
    ///
    /// Any failure leaves the buzzer off and falls back to an idle pause.
    pub fn step(&mut self) -> BeepPlan {
        let plan = match self.sensor.measure_cm() {
            Ok(distance) => {
                log::debug!("Distance: {:.2} cm", distance);
                BeepPlan::for_distance(distance, self.threshold_cm)
            }
            Err(e) => {
                log::warn!("Range read failed: {}", e);
                BeepPlan::idle()
            }
        };

        match plan {
            BeepPlan::Chirp { on, pause } => {
                if let Err(e) = pulse(&mut self.actuator, on, &self.clock) {
                    log::warn!("Chirp failed: {}", e);
                }
                self.clock.sleep(pause);
            }
            BeepPlan::Idle { pause } => {
                if let Err(e) = self.actuator.set_active(false) {
                    log::warn!("Failed to silence buzzer: {}", e);
                }
                self.clock.sleep(pause);
            }
        }
        plan
    }

    /// Run forever
    pub fn run(&mut self) -> ! {
        loop {
            self.step();
        }
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }
}
