use std::path::{Path, PathBuf};

use thinkbridge_transport::IpcStream;

/// How the relay reaches the backend application.
///
/// Split into three steps so each failure gets its own browser-facing
/// diagnostic: resolve the address, check something is there, connect.
pub trait Backend {
    /// Resolve the backend socket address.
    fn endpoint(&self) -> thinkbridge_transport::Result<PathBuf>;

    /// Check that the endpoint exists before connecting.
    fn ensure_present(&self, endpoint: &Path) -> thinkbridge_transport::Result<()>;

    /// Open the stream connection.
    fn connect(&self, endpoint: &Path) -> thinkbridge_transport::Result<IpcStream>;
}

/// The Think application's Unix domain socket.
#[cfg(unix)]
#[derive(Debug, Clone)]
pub struct UdsBackend<H = thinkbridge_transport::AccountHome> {
    endpoint: thinkbridge_transport::Endpoint<H>,
}

#[cfg(unix)]
impl<H: thinkbridge_transport::HomeDir> UdsBackend<H> {
    /// Backend reached through `endpoint`.
    pub fn new(endpoint: thinkbridge_transport::Endpoint<H>) -> Self {
        Self { endpoint }
    }
}

#[cfg(unix)]
impl<H: thinkbridge_transport::HomeDir> Backend for UdsBackend<H> {
    fn endpoint(&self) -> thinkbridge_transport::Result<PathBuf> {
        self.endpoint.resolve()
    }

    fn ensure_present(&self, endpoint: &Path) -> thinkbridge_transport::Result<()> {
        thinkbridge_transport::UnixDomainSocket::ensure_present(endpoint)
    }

    fn connect(&self, endpoint: &Path) -> thinkbridge_transport::Result<IpcStream> {
        thinkbridge_transport::UnixDomainSocket::connect(endpoint)
    }
}

/// The Think application's named pipe.
#[cfg(windows)]
#[derive(Debug, Clone)]
pub struct PipeBackend<H = thinkbridge_transport::AccountHome> {
    endpoint: thinkbridge_transport::Endpoint<H>,
}

#[cfg(windows)]
impl<H: thinkbridge_transport::HomeDir> PipeBackend<H> {
    /// Backend reached through `endpoint`.
    pub fn new(endpoint: thinkbridge_transport::Endpoint<H>) -> Self {
        Self { endpoint }
    }
}

#[cfg(windows)]
impl<H: thinkbridge_transport::HomeDir> Backend for PipeBackend<H> {
    fn endpoint(&self) -> thinkbridge_transport::Result<PathBuf> {
        self.endpoint.resolve()
    }

    fn ensure_present(&self, endpoint: &Path) -> thinkbridge_transport::Result<()> {
        thinkbridge_transport::NamedPipe::ensure_present(endpoint)
    }

    fn connect(&self, endpoint: &Path) -> thinkbridge_transport::Result<IpcStream> {
        thinkbridge_transport::NamedPipe::connect(endpoint)
    }
}
