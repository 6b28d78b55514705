//! Browser-facing error frames.
//!
//! Payload shape: `{"id":null,"error":{"code":<int>,"message":"<string>"}}`.
//! The id is always null because the bridge never parses the request it is
//! answering.

use serde::Serialize;
use thinkbridge_frame::Frame;

/// Error codes the bridge reports to the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// A frame exceeded the size limit (`-32000`).
    ResourceLimit,
    /// The backend socket could not be located or does not exist (`-32001`).
    EndpointUnavailable,
    /// The backend socket exists but refused the connection (`-32002`).
    ConnectFailed,
    /// An established backend connection failed (`-32003`).
    BackendLost,
}

impl ErrorCode {
    /// Numeric JSON-RPC style code.
    pub const fn code(self) -> i32 {
        match self {
            Self::ResourceLimit => -32000,
            Self::EndpointUnavailable => -32001,
            Self::ConnectFailed => -32002,
            Self::BackendLost => -32003,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse<'a> {
    id: (),
    error: ErrorBody<'a>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: i32,
    message: &'a str,
}

/// Build the error frame for `code` and `message`.
pub fn format_error(code: ErrorCode, message: &str) -> Frame {
    let response = ErrorResponse {
        id: (),
        error: ErrorBody {
            code: code.code(),
            message,
        },
    };
    let payload = serde_json::to_vec(&response).unwrap_or_else(|_| {
        format!(r#"{{"id":null,"error":{{"code":{},"message":""}}}}"#, code.code()).into_bytes()
    });
    Frame::new(payload)
}
