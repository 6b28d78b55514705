use std::io::{ErrorKind, Read};

use bytes::{Buf, BytesMut};
use tracing::debug;

use crate::codec::{decode_frame, peek_length, Frame, FrameConfig, HEADER_SIZE};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Body of a rejected oversized frame still waiting to be skipped.
#[derive(Debug, Clone, Copy)]
struct PendingDiscard {
    declared: usize,
    remaining: usize,
}

/// Reads complete frames from any `Read` stream.
///
/// Handles partial reads internally; callers always get complete frames.
///
/// When a prefix declares more than the configured maximum, `read_frame`
/// returns [`FrameError::PayloadTooLarge`] straight away and the declared body
/// is skipped at the start of the next call, so the stream stays aligned on
/// frame boundaries without ever buffering the oversized body.
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
    discard: Option<PendingDiscard>,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
            discard: None,
        }
    }

    /// Read the next complete frame (blocking).
    ///
    /// - `ConnectionClosed`: EOF before a full 4-byte prefix (zero to three bytes seen)
    /// - `Truncated`: EOF after the prefix, before the full payload
    /// - `PayloadTooLarge`: declared length over the limit; the stream remains usable
    pub fn read_frame(&mut self) -> Result<Frame> {
        self.skip_discarded()?;

        loop {
            match decode_frame(&mut self.buf, self.config.max_payload_size) {
                Ok(Some(frame)) => return Ok(frame),
                Ok(None) => {}
                Err(FrameError::PayloadTooLarge { size, max }) => {
                    self.buf.advance(HEADER_SIZE);
                    self.discard = Some(PendingDiscard {
                        declared: size,
                        remaining: size,
                    });
                    return Err(FrameError::PayloadTooLarge { size, max });
                }
                Err(err) => return Err(err),
            }

            if self.fill()? == 0 {
                return Err(self.eof_error());
            }
        }
    }

    /// Whether an oversized body is still waiting to be skipped.
    pub fn has_pending_discard(&self) -> bool {
        self.discard.is_some()
    }

    fn skip_discarded(&mut self) -> Result<()> {
        while let Some(pending) = self.discard {
            if pending.remaining == 0 {
                debug!(size = pending.declared, "discarded oversized frame body");
                self.discard = None;
                break;
            }

            if self.buf.is_empty() && self.fill()? == 0 {
                return Err(FrameError::Truncated {
                    expected: pending.declared,
                    received: pending.declared - pending.remaining,
                });
            }

            let skipped = pending.remaining.min(self.buf.len());
            self.buf.advance(skipped);
            self.discard = Some(PendingDiscard {
                remaining: pending.remaining - skipped,
                ..pending
            });
        }
        Ok(())
    }

    fn fill(&mut self) -> Result<usize> {
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        loop {
            match self.inner.read(&mut chunk) {
                Ok(n) => {
                    self.buf.extend_from_slice(&chunk[..n]);
                    return Ok(n);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    fn eof_error(&self) -> FrameError {
        match peek_length(&self.buf) {
            Some(expected) => FrameError::Truncated {
                expected,
                received: self.buf.len() - HEADER_SIZE,
            },
            None => FrameError::ConnectionClosed,
        }
    }
}
