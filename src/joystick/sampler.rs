//! Sampler - raw hardware readings to a classified [`JoystickState`]
//!
//! The hardware seam is the [`JoystickInput`] trait. The sampler itself never
//! fails: a read error is logged and the last good reading is reused, so
//! publishers downstream always get a state to work with.

use tracing::{debug, warn};

use super::direction::locate;
use super::hardware::HardwareError;
use super::{JoystickState, ADC_CENTER};

/// One raw reading from the converter and the button pin.
///
/// The button is wired active-low with a pull-up, so a high level means
/// released.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawSample {
    pub x: u16,
    pub y: u16,
    pub button_level_high: bool,
}

impl RawSample {
    /// Stick at rest, button released.
    pub const RESTING: RawSample = RawSample {
        x: 2048,
        y: 2048,
        button_level_high: true,
    };
}

/// Source of raw joystick readings.
pub trait JoystickInput: Send {
    fn read_raw(&mut self) -> Result<RawSample, HardwareError>;
}

pub struct Sampler {
    input: Box<dyn JoystickInput>,
    last_raw: RawSample,
}

impl Sampler {
    pub fn new(input: Box<dyn JoystickInput>) -> Self {
        Self {
            input,
            last_raw: RawSample::RESTING,
        }
    }

    /// Reads the hardware and returns a classified state with `changed`
    /// left unset.
    pub fn sample(&mut self) -> JoystickState {
        let raw = match self.input.read_raw() {
            Ok(raw) => {
                self.last_raw = raw;
                raw
            }
            Err(e) => {
                warn!("Joystick read failed, reusing last reading: {}", e);
                self.last_raw
            }
        };

        let state = state_from_raw(raw);
        debug!(
            "Sampled raw=({}, {}) -> ({:.3}, {:.3}) {:?} button={}",
            raw.x, raw.y, state.x, state.y, state.direction, state.button_pressed
        );
        state
    }
}

/// Converts a raw reading into a classified state.
pub fn state_from_raw(raw: RawSample) -> JoystickState {
    let x = normalize_axis(raw.x);
    // A larger raw y is further down; written this way the rest position
    // gives +0.0 instead of -0.0.
    let y = (1.0 - f32::from(raw.y) / ADC_CENTER).clamp(-1.0, 1.0);
    let (x, y, direction) = locate(x, y);

    JoystickState {
        x,
        y,
        button_pressed: !raw.button_level_high,
        direction,
        changed: false,
    }
}

/// Maps a raw reading onto `[-1.0, 1.0]` around [`ADC_CENTER`].
pub fn normalize_axis(raw: u16) -> f32 {
    (f32::from(raw) / ADC_CENTER - 1.0).clamp(-1.0, 1.0)
}
