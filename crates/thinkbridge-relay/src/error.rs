use std::path::PathBuf;

use thinkbridge_frame::FrameError;
use thinkbridge_transport::TransportError;

use crate::response::ErrorCode;

/// Everything that can end or interrupt a relay session.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The backend socket path could not be resolved.
    #[error("backend endpoint unavailable: {0}")]
    EndpointUnavailable(#[source] TransportError),

    /// Nothing exists at the resolved socket path.
    #[error("application is not running (no socket at {path})")]
    NotRunning { path: PathBuf },

    /// The socket exists but the connection failed.
    #[error("cannot connect to application: {0}")]
    Connect(#[source] TransportError),

    /// A browser request declared more than the size limit. Recoverable.
    #[error("request too large ({size} bytes, max {max})")]
    RequestTooLarge { size: usize, max: usize },

    /// The browser side failed or ended mid-frame.
    #[error("browser stream failed: {0}")]
    Browser(#[source] FrameError),

    /// Writing to or reading from the backend failed after connecting.
    #[error("backend connection lost: {0}")]
    BackendLost(#[source] FrameError),

    /// The backend declared a reply larger than the size limit.
    #[error("backend response too large ({size} bytes, max {max})")]
    ResponseTooLarge { size: usize, max: usize },
}

impl RelayError {
    /// The error frame to send to the browser, if any.
    ///
    /// Browser-side failures have none: there is nobody left to tell.
    pub fn error_response(&self) -> Option<(ErrorCode, &'static str)> {
        match self {
            Self::EndpointUnavailable(_) => Some((
                ErrorCode::EndpointUnavailable,
                "Cannot determine home directory",
            )),
            Self::NotRunning { .. } => Some((
                ErrorCode::EndpointUnavailable,
                "Think app is not running. Please open the Think app first.",
            )),
            Self::Connect(_) => Some((ErrorCode::ConnectFailed, "Cannot connect to Think app")),
            Self::RequestTooLarge { .. } => Some((ErrorCode::ResourceLimit, "Message too large")),
            Self::Browser(_) => None,
            Self::BackendLost(_) => Some((ErrorCode::BackendLost, "Backend connection lost")),
            Self::ResponseTooLarge { .. } => Some((ErrorCode::ResourceLimit, "Response too large")),
        }
    }

    /// Whether the session must end after this error.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::RequestTooLarge { .. })
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_errors_map_to_endpoint_and_connect_codes() {
        let unavailable = RelayError::EndpointUnavailable(TransportError::EndpointUnavailable {
            reason: "cannot determine home directory".to_string(),
        });
        let not_running = RelayError::NotRunning {
            path: PathBuf::from("/home/ada/.think/native.sock"),
        };
        let refused = RelayError::Connect(TransportError::Connect {
            path: PathBuf::from("/home/ada/.think/native.sock"),
            source: std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
        });

        assert_eq!(
            unavailable.error_response().map(|(code, _)| code),
            Some(ErrorCode::EndpointUnavailable)
        );
        assert_eq!(
            not_running.error_response().map(|(code, _)| code),
            Some(ErrorCode::EndpointUnavailable)
        );
        assert_eq!(
            refused.error_response().map(|(code, _)| code),
            Some(ErrorCode::ConnectFailed)
        );
    }

    #[test]
    fn browser_failures_are_silent() {
        let err = RelayError::Browser(FrameError::Truncated {
            expected: 10,
            received: 3,
        });
        assert!(err.error_response().is_none());
        assert!(err.is_fatal());
    }

    #[test]
    fn only_oversized_requests_are_recoverable() {
        assert!(!RelayError::RequestTooLarge { size: 2, max: 1 }.is_fatal());
        assert!(RelayError::ResponseTooLarge { size: 2, max: 1 }.is_fatal());
        assert!(RelayError::BackendLost(FrameError::ConnectionClosed).is_fatal());
    }
}
