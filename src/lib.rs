//! Joystick relay for a two-axis analog stick with push button.
//!
//! Samples the stick, turns the raw ADC readings into a normalized position
//! and compass direction, and relays that state over the network in one of
//! two deployment modes:
//!
//! - [`publish::html`] serves an auto-refreshing HTML snapshot on every
//!   inbound connection.
//! - [`publish::push`] posts a JSON snapshot to a fixed server whenever the
//!   stick state changes.
//!
//! # Pipeline
//!
//! ```text
//! JoystickInput ──► Sampler ──► Classifier ──► Detector ──► Publisher
//!  (raw ADC/GPIO)   (normalize)  (deadzone,     (vs. last     (HTML or
//!                                 direction)     published)    JSON push)
//! ```

pub mod config;
pub mod joystick;
pub mod net;
pub mod publish;
