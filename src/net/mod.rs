//! Network plumbing for the push publisher: the outbound transport and the
//! link (re-)association step.

pub mod link;
pub mod transport;

pub use link::{associate_until_up, LinkError, NetworkLink, WifiLink, WiredLink};
pub use transport::{HttpPostTransport, Transport, TransportError};
