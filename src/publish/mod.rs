//! Publishers: the two mutually exclusive ways the relay hands the joystick
//! state to the network.
//!
//! ```text
//! publish/
//! ├── html.rs     - request-driven HTML snapshot server
//! ├── push.rs     - change-gated JSON push client with retry policy
//! └── payload.rs  - JSON snapshot encoding
//! ```

pub mod html;
pub mod payload;
pub mod push;

pub use html::{render_response, HtmlServer, ServeError, SnapshotPublisher};
pub use payload::SnapshotPayload;
pub use push::{
    run_push_loop, CycleOutcome, FailureTracker, LinkStatus, NullIndicator, PushClient,
    PushSettings, SendOutcome, StatusIndicator,
};
