//! Relay engine for the Think native-messaging bridge.
//!
//! One process serves one browser-extension session: frames read from the
//! browser side are forwarded to the backend socket, and each reply is
//! forwarded back before the next request is read. Failures are reported to
//! the browser once, as a JSON-RPC style error frame, and never to the backend.

pub mod backend;
pub mod error;
pub mod response;
pub mod session;

pub use backend::Backend;
#[cfg(windows)]
pub use backend::PipeBackend;
#[cfg(unix)]
pub use backend::UdsBackend;
pub use error::{RelayError, Result};
pub use response::{format_error, ErrorCode};
pub use session::{run, run_with_config, ExitStatus, RelayConfig, SessionReport, SessionStats};
