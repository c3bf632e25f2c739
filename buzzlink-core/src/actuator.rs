//! Actuator Control
//!
//! The buzzer is a binary output. Everything above this module talks to it
//! through [`pulse`], which holds it active for a fixed duration and
//! guarantees it is driven inactive again on every exit path: a failed
//! activation, a panic while waiting, or a normal return.
//!
//! ## Implementations
//!
//! - [`FileActuator`]: writes `1`/`0` to a sysfs-style GPIO `value` file
//! - [`MemoryActuator`]: in-memory pin with a transition log, for tests and
//!   dry runs

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::errors::ActuatorError;
use crate::time::Clock;

/// A binary on/off output
pub trait Actuator: Send {
    /// Drive the output to `active`
    fn set_active(&mut self, active: bool) -> Result<(), ActuatorError>;
}

impl<A: Actuator + ?Sized> Actuator for Box<A> {
    fn set_active(&mut self, active: bool) -> Result<(), ActuatorError> {
        (**self).set_active(active)
    }
}

/// Forces the actuator inactive when dropped unless already released
struct ActiveGuard<'a, A: Actuator + ?Sized> {
    actuator: &'a mut A,
    released: bool,
}

impl<A: Actuator + ?Sized> ActiveGuard<'_, A> {
    fn release(&mut self) -> Result<(), ActuatorError> {
        self.released = true;
        self.actuator.set_active(false)
    }
}

impl<A: Actuator + ?Sized> Drop for ActiveGuard<'_, A> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self.actuator.set_active(false) {
            log::error!("Failed to force actuator off: {}", e);
        }
    }
}

/// Hold the actuator active for `duration`, then drive it inactive
///
/// If activation fails the actuator is still driven inactive before the
/// error is returned.
pub fn pulse<A, C>(actuator: &mut A, duration: Duration, clock: &C) -> Result<(), ActuatorError>
where
    A: Actuator + ?Sized,
    C: Clock + ?Sized,
{
    let mut guard = ActiveGuard {
        actuator,
        released: false,
    };
    guard.actuator.set_active(true)?;
    clock.sleep(duration);
    guard.release()
}

/// GPIO output through a sysfs `value` file
///
/// The pin must already be exported and configured as an output; this only
/// writes levels.
#[derive(Debug, Clone)]
pub struct FileActuator {
    path: PathBuf,
}

impl FileActuator {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Actuator for FileActuator {
    fn set_active(&mut self, active: bool) -> Result<(), ActuatorError> {
        fs::write(&self.path, if active { "1" } else { "0" })?;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct PinState {
    active: bool,
    transitions: Vec<bool>,
    fail_activations: u32,
}

/// In-memory actuator
///
/// Clones share the same pin, so a test can keep one handle while the
/// receiver owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryActuator {
    state: Arc<Mutex<PinState>>,
}

impl MemoryActuator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` activations raise the pin and then report failure
    pub fn fail_activations(&self, count: u32) {
        self.lock().fail_activations = count;
    }

    pub fn is_active(&self) -> bool {
        self.lock().active
    }

    /// Every level written, in order
    pub fn transitions(&self) -> Vec<bool> {
        self.lock().transitions.clone()
    }

    /// Number of times the pin went from inactive to active
    pub fn activations(&self) -> usize {
        let transitions = self.lock().transitions.clone();
        let mut previous = false;
        transitions
            .into_iter()
            .filter(|&level| {
                let rising = level && !previous;
                previous = level;
                rising
            })
            .count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PinState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Actuator for MemoryActuator {
    fn set_active(&mut self, active: bool) -> Result<(), ActuatorError> {
        let mut state = self.lock();
        state.active = active;
        state.transitions.push(active);
        log::debug!("Actuator {}", if active { "on" } else { "off" });

        if active && state.fail_activations > 0 {
            state.fail_activations -= 1;
            return Err(ActuatorError::Drive {
                state: "on",
                reason: "injected failure".into(),
            });
        }
        Ok(())
    }
}
