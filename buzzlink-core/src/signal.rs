//! Presence Sources
//!
//! The pipeline only needs one bit per poll: is something there? Where that
//! bit comes from is outside buzzlink's scope (a camera with a face
//! classifier, an ultrasonic ranger on GPIO), so this module defines the
//! interface plus the small adapters that reduce a raw reading to it.
//!
//! ## Sources
//!
//! - [`DistanceSignal`]: any [`RangeSensor`] compared against a threshold
//!   (`distance <= threshold` means present)
//! - [`EchoRanger`]: turns pulse-echo timings into centimetres
//! - [`FileSignal`]: reads a value another process keeps writing to a file
//! - [`ScriptedSignal`]: a fixed sequence, for tests and dry runs
//!
//! Errors are returned as-is; deciding that an unreadable sensor means
//! "nobody there" is the detection loop's call.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{DEFAULT_ECHO_TIMEOUT_US, DEFAULT_PRESENCE_THRESHOLD_CM, SPEED_OF_SOUND_CM_PER_US};
use crate::errors::{SignalError, SignalResult};

/// Something that can be polled for presence
pub trait PresenceSignal: Send {
    /// Take one reading
    fn read(&mut self) -> SignalResult<bool>;
}

impl<S: PresenceSignal + ?Sized> PresenceSignal for Box<S> {
    fn read(&mut self) -> SignalResult<bool> {
        (**self).read()
    }
}

/// A sensor that reports distance in centimetres
///
/// `f32::INFINITY` means nothing is in range.
pub trait RangeSensor: Send {
    fn measure_cm(&mut self) -> SignalResult<f32>;
}

/// Convert an echo pulse width into a distance
///
/// Sound travels to the object and back, so the one-way distance is half of
/// `echo_us * speed`. Echoes longer than `timeout_us` mean nothing answered.
pub fn echo_to_distance_cm(echo_us: u64, timeout_us: u64) -> f32 {
    if echo_us > timeout_us {
        return f32::INFINITY;
    }
    echo_us as f32 * SPEED_OF_SOUND_CM_PER_US / 2.0
}

/// Raw pulse-echo timing from an ultrasonic module
///
/// Implementations trigger the sensor and return the echo pulse width in
/// microseconds, or `SignalError::Timeout` when the echo never starts or
/// never ends within `timeout_us`.
pub trait EchoPulse: Send {
    fn echo_us(&mut self, timeout_us: u64) -> SignalResult<u64>;
}

/// [`RangeSensor`] over an [`EchoPulse`]
///
/// A timed-out echo is reported as "out of range" rather than an error:
/// with nothing in front of the sensor, no echo is the expected answer.
pub struct EchoRanger<P: EchoPulse> {
    pulse: P,
    timeout_us: u64,
}

impl<P: EchoPulse> EchoRanger<P> {
    pub fn new(pulse: P) -> Self {
        Self {
            pulse,
            timeout_us: DEFAULT_ECHO_TIMEOUT_US,
        }
    }

    pub fn with_timeout_us(mut self, timeout_us: u64) -> Self {
        self.timeout_us = timeout_us;
        self
    }
}

impl<P: EchoPulse> RangeSensor for EchoRanger<P> {
    fn measure_cm(&mut self) -> SignalResult<f32> {
        match self.pulse.echo_us(self.timeout_us) {
            Ok(echo_us) => Ok(echo_to_distance_cm(echo_us, self.timeout_us)),
            Err(SignalError::Timeout { .. }) => Ok(f32::INFINITY),
            Err(e) => Err(e),
        }
    }
}

/// Presence from a distance threshold
pub struct DistanceSignal<R: RangeSensor> {
    sensor: R,
    threshold_cm: f32,
}

impl<R: RangeSensor> DistanceSignal<R> {
    pub fn new(sensor: R) -> Self {
        Self {
            sensor,
            threshold_cm: DEFAULT_PRESENCE_THRESHOLD_CM,
        }
    }

    pub fn with_threshold_cm(mut self, threshold_cm: f32) -> Self {
        self.threshold_cm = threshold_cm;
        self
    }

    /// Last-mile access to the distance, for callers that need more than a bit
    pub fn measure_cm(&mut self) -> SignalResult<f32> {
        self.sensor.measure_cm()
    }
}

impl<R: RangeSensor> PresenceSignal for DistanceSignal<R> {
    fn read(&mut self) -> SignalResult<bool> {
        let distance = self.sensor.measure_cm()?;
        if distance.is_nan() {
            return Err(SignalError::Malformed("distance is NaN".into()));
        }
        Ok(distance <= self.threshold_cm)
    }
}

/// One value read back from a [`FileSignal`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    /// An explicit presence flag
    Presence(bool),
    /// A distance in centimetres
    Distance(f32),
}

impl Reading {
    /// Parse a trimmed file body
    ///
    /// Keywords win over numbers, so `1` and `0` are flags, not 1 cm / 0 cm.
    pub fn parse(text: &str) -> SignalResult<Self> {
        let text = text.trim();
        match text.to_ascii_lowercase().as_str() {
            "1" | "true" | "present" | "yes" => return Ok(Self::Presence(true)),
            "0" | "false" | "absent" | "no" => return Ok(Self::Presence(false)),
            "inf" | "infinity" => return Ok(Self::Distance(f32::INFINITY)),
            _ => {}
        }
        match text.parse::<f32>() {
            Ok(distance) if !distance.is_nan() && distance >= 0.0 => Ok(Self::Distance(distance)),
            _ => Err(SignalError::Malformed(format!("unrecognised reading {text:?}"))),
        }
    }

    /// Reduce to presence against `threshold_cm`
    pub fn is_present(&self, threshold_cm: f32) -> bool {
        match *self {
            Self::Presence(present) => present,
            Self::Distance(distance) => distance <= threshold_cm,
        }
    }
}

/// Presence written to a file by an external process
///
/// A classifier or sensor daemon overwrites the file with its latest result;
/// each poll re-reads it. Accepts presence keywords or a distance in cm.
#[derive(Debug, Clone)]
pub struct FileSignal {
    path: PathBuf,
    threshold_cm: f32,
}

impl FileSignal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            threshold_cm: DEFAULT_PRESENCE_THRESHOLD_CM,
        }
    }

    pub fn with_threshold_cm(mut self, threshold_cm: f32) -> Self {
        self.threshold_cm = threshold_cm;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the file without thresholding
    pub fn read_raw(&self) -> SignalResult<Reading> {
        let body = fs::read_to_string(&self.path)?;
        Reading::parse(&body)
    }
}

impl PresenceSignal for FileSignal {
    fn read(&mut self) -> SignalResult<bool> {
        Ok(self.read_raw()?.is_present(self.threshold_cm))
    }
}

impl RangeSensor for FileSignal {
    fn measure_cm(&mut self) -> SignalResult<f32> {
        match self.read_raw()? {
            Reading::Distance(distance) => Ok(distance),
            Reading::Presence(_) => Err(SignalError::Malformed(
                "expected a distance, found a presence flag".into(),
            )),
        }
    }
}

/// Fixed sequence of readings
///
/// `None` entries inject a read failure. Once exhausted the signal either
/// reports `Unavailable` or, when built with [`ScriptedSignal::cycle`],
/// starts over.
#[derive(Debug, Clone)]
pub struct ScriptedSignal {
    script: Vec<Option<bool>>,
    pending: VecDeque<Option<bool>>,
    cycle: bool,
}

impl ScriptedSignal {
    pub fn new(samples: impl IntoIterator<Item = bool>) -> Self {
        Self::with_failures(samples.into_iter().map(Some))
    }

    /// Script that may contain injected failures (`None`)
    pub fn with_failures(samples: impl IntoIterator<Item = Option<bool>>) -> Self {
        let script: Vec<_> = samples.into_iter().collect();
        Self {
            pending: script.iter().copied().collect(),
            script,
            cycle: false,
        }
    }

    /// Restart from the beginning once exhausted
    pub fn cycle(mut self) -> Self {
        self.cycle = true;
        self
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl PresenceSignal for ScriptedSignal {
    fn read(&mut self) -> SignalResult<bool> {
        if self.pending.is_empty() && self.cycle {
            self.pending.extend(self.script.iter().copied());
        }
        match self.pending.pop_front() {
            Some(Some(present)) => Ok(present),
            Some(None) => Err(SignalError::Malformed("scripted failure".into())),
            None => Err(SignalError::Unavailable("script exhausted".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    struct FixedEcho(SignalResult<u64>);

    impl EchoPulse for FixedEcho {
        fn echo_us(&mut self, timeout_us: u64) -> SignalResult<u64> {
            match &self.0 {
                Ok(us) => Ok(*us),
                Err(_) => Err(SignalError::Timeout { waited_us: timeout_us }),
            }
        }
    }

    struct FixedRange(f32);

    impl RangeSensor for FixedRange {
        fn measure_cm(&mut self) -> SignalResult<f32> {
            Ok(self.0)
        }
    }

    #[test]
    fn echo_conversion() {
        // 1000us round trip = 17cm
        let distance = echo_to_distance_cm(1000, DEFAULT_ECHO_TIMEOUT_US);
        assert!((distance - 17.0).abs() < 1e-3);

        assert_eq!(echo_to_distance_cm(200_000, DEFAULT_ECHO_TIMEOUT_US), f32::INFINITY);
    }

    #[test]
    fn echo_timeout_means_out_of_range() {
        let mut ranger = EchoRanger::new(FixedEcho(Err(SignalError::Timeout { waited_us: 0 })));
        assert_eq!(ranger.measure_cm().unwrap(), f32::INFINITY);

        let mut signal = DistanceSignal::new(ranger);
        assert!(!signal.read().unwrap());
    }

    #[test]
    fn distance_threshold_is_inclusive() {
        assert!(DistanceSignal::new(FixedRange(30.0)).read().unwrap());
        assert!(!DistanceSignal::new(FixedRange(30.5)).read().unwrap());
        assert!(DistanceSignal::new(FixedRange(50.0)).with_threshold_cm(60.0).read().unwrap());
        assert!(DistanceSignal::new(FixedRange(f32::NAN)).read().is_err());
    }

    #[test]
    fn reading_parse() {
        assert_eq!(Reading::parse("1\n").unwrap(), Reading::Presence(true));
        assert_eq!(Reading::parse(" absent ").unwrap(), Reading::Presence(false));
        assert_eq!(Reading::parse("12.5").unwrap(), Reading::Distance(12.5));
        assert_eq!(Reading::parse("inf").unwrap(), Reading::Distance(f32::INFINITY));
        assert!(Reading::parse("").is_err());
        assert!(Reading::parse("-4").is_err());
        assert!(Reading::parse("maybe").is_err());
    }

    #[test]
    fn file_signal_follows_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let mut signal = FileSignal::new(file.path());

        write!(file, "25").unwrap();
        file.flush().unwrap();
        assert!(signal.read().unwrap());
        assert_eq!(signal.measure_cm().unwrap(), 25.0);

        fs::write(file.path(), "absent").unwrap();
        assert!(!signal.read().unwrap());
        assert!(signal.measure_cm().is_err());
    }

    #[test]
    fn file_signal_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut signal = FileSignal::new(dir.path().join("presence"));
        assert!(matches!(signal.read(), Err(SignalError::Io(_))));
    }

    #[test]
    fn scripted_signal_failures_and_cycle() {
        let mut signal = ScriptedSignal::with_failures([Some(true), None]);
        assert!(signal.read().unwrap());
        assert!(matches!(signal.read(), Err(SignalError::Malformed(_))));
        assert!(matches!(signal.read(), Err(SignalError::Unavailable(_))));

        let mut cycling = ScriptedSignal::new([true, false]).cycle();
        let seen: Vec<bool> = (0..5).map(|_| cycling.read().unwrap()).collect();
        assert_eq!(seen, vec![true, false, true, false, true]);
    }
}
