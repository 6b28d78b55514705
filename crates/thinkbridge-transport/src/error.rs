use std::path::PathBuf;

/// Errors that can occur in transport and endpoint operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The backend socket path could not be determined.
    #[error("backend endpoint unavailable: {reason}")]
    EndpointUnavailable { reason: String },

    /// Nothing exists at the resolved socket path.
    #[error("no socket at {path}")]
    NotFound { path: PathBuf },

    /// Failed to bind to the specified address.
    #[error("failed to bind to {path}: {source}")]
    Bind {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to connect to the specified address.
    #[error("failed to connect to {path}: {source}")]
    Connect {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to accept an incoming connection.
    #[error("failed to accept connection: {0}")]
    Accept(std::io::Error),

    /// An I/O error occurred on the transport stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The socket path is too long for the platform.
    #[error("socket path too long ({len} bytes, max {max}): {path}")]
    PathTooLong {
        path: PathBuf,
        len: usize,
        max: usize,
    },
}

pub type Result<T> = std::result::Result<T, TransportError>;
