//! Local transport for the Think native-messaging bridge.
//!
//! Two concerns live here:
//! - [`endpoint`]: where the backend lives (`~/.think/native.sock`, or
//!   [`PIPE_NAME`] on Windows),
//!   resolved through an injected [`HomeDir`] capability
//! - [`IpcStream`]: the stream the relay talks over, opened by
//!   `UnixDomainSocket` on Unix and `NamedPipe` on Windows
//!
//! This is the lowest layer of thinkbridge. Framing and relaying build on top
//! of the [`IpcStream`] type provided here.

pub mod endpoint;
pub mod error;
pub mod traits;

#[cfg(not(any(unix, windows)))]
compile_error!("thinkbridge-transport supports Unix domain sockets and Windows named pipes only");

#[cfg(windows)]
pub mod named_pipe;
#[cfg(unix)]
pub mod uds;

pub use endpoint::{AccountHome, Endpoint, FixedHome, HomeDir, APP_DIR, PIPE_NAME, SOCKET_NAME};
pub use error::{Result, TransportError};
pub use traits::IpcStream;

#[cfg(windows)]
pub use named_pipe::NamedPipe;
#[cfg(unix)]
pub use uds::UnixDomainSocket;
