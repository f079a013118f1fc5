//! Joystick subsystem: sampling, direction classification and change detection
//!
//! Implements the read side of the relay as a three-stage pipeline:
//!
//! 1. [`sampler`] - Raw ADC/GPIO readings to a normalized position
//! 2. [`direction`] - Deadzone gating and compass sector lookup
//! 3. [`detector`] - Change verdict against the last published state
//!
//! # Architecture
//!
//! ```text
//! JoystickInput ──► Sampler ──► JoystickState ──► has_changed(new, reference)
//!  (hardware)       (locate)     (value type)       (pure, no side effects)
//! ```
//!
//! The sampling policy is fixed: the constants below are not part of any
//! runtime configuration.

pub mod detector;
pub mod direction;
pub mod hardware;
pub mod sampler;

pub use detector::{has_changed, ReferenceState};
pub use direction::{classify, locate, Direction, Language};
pub use hardware::{GpioStatusLed, HardwareError, Mcp3208Joystick};
pub use sampler::{JoystickInput, RawSample, Sampler};

/// Radius around the rest position treated as centered.
pub const DEADZONE: f32 = 0.2;

/// Minimum per-axis delta for two samples to count as different.
pub const CHANGE_THRESHOLD: f32 = 0.1;

/// Sampling cadence shared by the push loop and the HTML background poll.
pub const SEND_INTERVAL_MS: u64 = 100;

/// Consecutive send failures that trigger a network re-association.
pub const MAX_RETRIES: u32 = 3;

/// Raw reading of a centered axis.
pub const ADC_CENTER: f32 = 2048.0;

/// Largest raw reading of the 12-bit converter.
pub const ADC_MAX: u16 = 4095;

/// Snapshot of the joystick after sampling and classification
///
/// `x` and `y` are center-relative in `[-1.0, 1.0]`, positive y pointing
/// up, and collapsed to exactly `0.0` inside the deadzone. `changed` is not
/// a property of the sample itself; it is filled in by
/// [`JoystickState::flag_change`] against a reference state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JoystickState {
    pub x: f32,
    pub y: f32,
    pub button_pressed: bool,
    pub direction: Direction,
    pub changed: bool,
}

impl Default for JoystickState {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            button_pressed: false,
            direction: Direction::Center,
            changed: false,
        }
    }
}

impl JoystickState {
    /// Returns a copy with `changed` computed against `reference`.
    pub fn flag_change(self, reference: &JoystickState) -> Self {
        Self {
            changed: has_changed(&self, reference),
            ..self
        }
    }
}
