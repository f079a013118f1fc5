//! Change detection against the last published state
//!
//! [`has_changed`] is the relay's debounce: jitter below
//! [`CHANGE_THRESHOLD`] on both axes, with the same button level and the
//! same direction, is not worth publishing.

use tracing::debug;

use super::{JoystickState, CHANGE_THRESHOLD};

/// True when `new` differs meaningfully from `reference`.
///
/// Axis deltas are compared with a strict `>`, so a delta of exactly
/// [`CHANGE_THRESHOLD`] is not a change. The predicate is symmetric.
///
/// "Exactly" means the f32 difference itself equals the threshold. That holds
/// for ADC steps (multiples of 1/2048) but not for arbitrary decimals:
/// 0.3 - 0.2 is 0.10000001 in f32 and counts as a change.
pub fn has_changed(new: &JoystickState, reference: &JoystickState) -> bool {
    (new.x - reference.x).abs() > CHANGE_THRESHOLD
        || (new.y - reference.y).abs() > CHANGE_THRESHOLD
        || new.button_pressed != reference.button_pressed
        || new.direction != reference.direction
}

/// The last published state, owned by whichever publisher loop is running.
///
/// Starts at the zero state (centered, released), so a stick that is at rest
/// at power-up is not reported as a change.
#[derive(Clone, Debug, Default)]
pub struct ReferenceState {
    last: JoystickState,
}

impl ReferenceState {
    pub fn current(&self) -> &JoystickState {
        &self.last
    }

    /// Makes `state` the new comparison baseline.
    pub fn accept(&mut self, state: JoystickState) {
        debug!(
            "Reference updated: {:?} ({:.2}, {:.2}) button={}",
            state.direction, state.x, state.y, state.button_pressed
        );
        self.last = JoystickState {
            changed: false,
            ..state
        };
    }
}
