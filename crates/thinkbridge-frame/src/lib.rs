//! Length-prefixed framing in the browser native-messaging convention.
//!
//! Every message on either side of the bridge is:
//! - a 4-byte little-endian payload length
//! - exactly that many payload bytes, opaque to this layer
//!
//! Payloads are capped at [`MAX_PAYLOAD`] (1 MiB). Readers hand out complete
//! frames only; a stream that ends mid-frame is reported, never half-decoded.

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{
    decode_frame, encode_frame, peek_length, Frame, FrameConfig, HEADER_SIZE, MAX_PAYLOAD,
};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;
