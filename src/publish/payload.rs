//! JSON snapshot sent by the push publisher
//!
//! The receiving server expects the positions with exactly two decimals
//! (`{"x":0.50,...}`), which a plain float field would not give, so the
//! numbers are written verbatim as raw JSON.

use serde::ser::Error as _;
use serde::{Serialize, Serializer};
use serde_json::value::RawValue;

use crate::joystick::{JoystickState, Language};

#[derive(Debug, Serialize)]
pub struct SnapshotPayload {
    #[serde(serialize_with = "two_decimals")]
    pub x: f32,
    #[serde(serialize_with = "two_decimals")]
    pub y: f32,
    pub button: bool,
    pub direction: &'static str,
}

impl SnapshotPayload {
    pub fn from_state(state: &JoystickState, language: Language) -> Self {
        Self {
            x: state.x,
            y: state.y,
            button: state.button_pressed,
            direction: state.direction.label(language),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

fn two_decimals<S: Serializer>(value: &f32, serializer: S) -> Result<S::Ok, S::Error> {
    let raw = RawValue::from_string(format!("{:.2}", value)).map_err(S::Error::custom)?;
    raw.serialize(serializer)
}
