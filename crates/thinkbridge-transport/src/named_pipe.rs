//! Windows named-pipe client.
//!
//! On Windows the Think app serves `\\.\pipe\think-native` instead of a Unix
//! socket. The bridge only ever connects; the pipe server belongs to the app.

use std::os::windows::ffi::OsStrExt;
use std::path::Path;

use tracing::debug;
use windows_sys::Win32::System::Pipes::WaitNamedPipeW;

use crate::error::{Result, TransportError};
use crate::traits::IpcStream;

const ERROR_FILE_NOT_FOUND: i32 = 2;
const ERROR_SEM_TIMEOUT: i32 = 121;

/// Longest the existence check waits for a free pipe instance, in milliseconds.
/// Zero would mean the server's default wait.
const PRESENCE_WAIT_MS: u32 = 1;

/// Named-pipe client transport.
pub struct NamedPipe;

impl NamedPipe {
    /// Check that a pipe server exists at `path` without taking an instance.
    ///
    /// Opening the pipe to test for it would consume the server's free
    /// instance, so this waits on the name instead. A server whose instances
    /// are all busy still counts as present.
    pub fn ensure_present(path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let wide: Vec<u16> = path
            .as_os_str()
            .encode_wide()
            .chain(std::iter::once(0))
            .collect();

        // SAFETY: `wide` is a NUL-terminated UTF-16 string that outlives the call.
        let available = unsafe { WaitNamedPipeW(wide.as_ptr(), PRESENCE_WAIT_MS) } != 0;
        if available {
            debug!(?path, "named pipe present");
            return Ok(());
        }

        let err = std::io::Error::last_os_error();
        match err.raw_os_error() {
            Some(ERROR_SEM_TIMEOUT) => {
                debug!(?path, "named pipe busy");
                Ok(())
            }
            Some(ERROR_FILE_NOT_FOUND) => {
                debug!(?path, "no named pipe server");
                Err(TransportError::NotFound {
                    path: path.to_path_buf(),
                })
            }
            _ => Err(TransportError::Io(err)),
        }
    }

    /// Open a client handle to the pipe (blocking reads and writes).
    pub fn connect(path: impl AsRef<Path>) -> Result<IpcStream> {
        let path = path.as_ref();
        let file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| TransportError::Connect {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(?path, "connected to named pipe");
        Ok(IpcStream::from(file))
    }

    /// Transport name for diagnostics.
    pub fn transport_name() -> &'static str {
        "named-pipe"
    }
}
