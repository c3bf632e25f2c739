//! Sensor Specifications and Limits
//!
//! Parameters for reducing a distance reading to a presence bit, and for
//! converting HC-SR04 style echo pulses into centimetres.

/// Distance at or below which an object counts as present (cm).
pub const DEFAULT_PRESENCE_THRESHOLD_CM: f32 = 30.0;

/// Speed of sound at room temperature (cm per microsecond).
///
/// 340 m/s. The echo covers the distance twice, so
/// `distance_cm = echo_us * SPEED_OF_SOUND_CM_PER_US / 2`.
pub const SPEED_OF_SOUND_CM_PER_US: f32 = 0.034;

/// Longest echo the ranger waits for before reporting "nothing in range" (µs).
///
/// 100 ms is far beyond the sensor's ~4 m range (~23 ms round trip).
pub const DEFAULT_ECHO_TIMEOUT_US: u64 = 100_000;
