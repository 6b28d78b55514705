//! Native-messaging host for the Think browser extension.
//!
//! The `thinkbridge` binary is what the browser launches: it relays framed
//! messages between its stdin/stdout and the Think application's local socket.
//! The library crates are re-exported here for embedding and tests.
//!
//! # Crate Structure
//!
//! - [`transport`]: Unix domain socket stream and backend endpoint resolution
//! - [`frame`]: 4-byte little-endian length-prefixed framing
//! - [`relay`]: The relay session and browser-facing error frames

/// Re-export transport types.
pub mod transport {
    pub use thinkbridge_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use thinkbridge_frame::*;
}

/// Re-export relay types.
pub mod relay {
    pub use thinkbridge_relay::*;
}
