use std::io::{Read, Write};

use thinkbridge_frame::{FrameConfig, FrameError, FrameReader, FrameWriter};
use thinkbridge_transport::{IpcStream, TransportError};
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::error::{RelayError, Result};
use crate::response::format_error;

/// Process exit status of a relay session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// The browser closed its stream between frames.
    Success,
    /// Setup failed or the session hit a fatal error.
    Failure,
}

impl ExitStatus {
    /// Process exit code: 0 or 1.
    pub const fn code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
        }
    }
}

/// Relay tuning.
#[derive(Debug, Clone, Default)]
pub struct RelayConfig {
    /// Frame limits, applied identically on both sides.
    pub frame: FrameConfig,
}

/// Counters for one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Requests forwarded to the backend.
    pub requests: u64,
    /// Replies forwarded to the browser.
    pub responses: u64,
    /// Oversized requests rejected and drained.
    pub rejected: u64,
    /// Wire bytes sent to the backend, length prefixes included.
    pub bytes_to_backend: u64,
    /// Wire bytes sent to the browser, length prefixes included.
    pub bytes_to_browser: u64,
}

/// Outcome of [`run_with_config`].
#[derive(Debug)]
pub struct SessionReport {
    /// How the process should exit.
    pub status: ExitStatus,
    /// Traffic counters; all zero when setup failed.
    pub stats: SessionStats,
    /// The error that ended the session, if it did not end cleanly.
    pub error: Option<RelayError>,
}

/// Relay between the browser streams and `backend` with default limits.
pub fn run<R, W, B>(browser_in: R, browser_out: W, backend: &B) -> ExitStatus
where
    R: Read,
    W: Write,
    B: Backend + ?Sized,
{
    run_with_config(browser_in, browser_out, backend, RelayConfig::default()).status
}

/// Relay between the browser streams and `backend`.
///
/// Connects first; every setup failure is answered with exactly one error
/// frame. Then frames are relayed strictly one request, one reply, until the
/// browser closes its stream or a fatal error occurs.
pub fn run_with_config<R, W, B>(
    browser_in: R,
    browser_out: W,
    backend: &B,
    config: RelayConfig,
) -> SessionReport
where
    R: Read,
    W: Write,
    B: Backend + ?Sized,
{
    let mut browser_tx = FrameWriter::with_config(browser_out, config.frame.clone());

    let (backend_rx, backend_tx) = match open_backend(backend) {
        Ok(streams) => streams,
        Err(err) => {
            warn!(error = %err, "backend setup failed");
            notify_browser(&mut browser_tx, &err);
            return SessionReport {
                status: ExitStatus::Failure,
                stats: SessionStats::default(),
                error: Some(err),
            };
        }
    };

    let mut session = Session {
        browser_rx: FrameReader::with_config(browser_in, config.frame.clone()),
        browser_tx,
        backend_rx: FrameReader::with_config(backend_rx, config.frame.clone()),
        backend_tx: FrameWriter::with_config(backend_tx, config.frame),
        stats: SessionStats::default(),
    };

    let result = session.relay();
    session.finish(result)
}

fn open_backend<B: Backend + ?Sized>(backend: &B) -> Result<(IpcStream, IpcStream)> {
    let endpoint = backend.endpoint().map_err(RelayError::EndpointUnavailable)?;

    backend.ensure_present(&endpoint).map_err(|err| match err {
        TransportError::NotFound { path } => RelayError::NotRunning { path },
        other => RelayError::EndpointUnavailable(other),
    })?;

    let stream = backend.connect(&endpoint).map_err(RelayError::Connect)?;
    let reader = stream.try_clone().map_err(RelayError::Connect)?;
    debug!(?endpoint, "backend connected");
    Ok((reader, stream))
}

/// Write the error frame for `err`, if it has one. Failures are logged only:
/// a browser that cannot be written to has already gone away.
fn notify_browser<W: Write>(browser_tx: &mut FrameWriter<W>, err: &RelayError) {
    if let Some((code, message)) = err.error_response() {
        if let Err(write_err) = browser_tx.write_frame(&format_error(code, message)) {
            debug!(error = %write_err, "could not deliver error frame to browser");
        }
    }
}

struct Session<R, W> {
    browser_rx: FrameReader<R>,
    browser_tx: FrameWriter<W>,
    backend_rx: FrameReader<IpcStream>,
    backend_tx: FrameWriter<IpcStream>,
    stats: SessionStats,
}

/// How one pass of the relay loop ended.
enum Exchange {
    /// One request went out and its reply came back.
    Relayed,
    /// The browser closed its stream between frames.
    BrowserClosed,
}

impl<R: Read, W: Write> Session<R, W> {
    fn relay(&mut self) -> Result<()> {
        loop {
            match self.exchange() {
                Ok(Exchange::Relayed) => {}
                Ok(Exchange::BrowserClosed) => return Ok(()),
                Err(err) if !err.is_fatal() => self.reject(&err)?,
                Err(err) => return Err(err),
            }
        }
    }

    /// Forward one browser request and relay its reply back.
    fn exchange(&mut self) -> Result<Exchange> {
        let request = match self.browser_rx.read_frame() {
            Ok(frame) => frame,
            Err(FrameError::ConnectionClosed) => {
                debug!("browser closed its stream");
                return Ok(Exchange::BrowserClosed);
            }
            Err(FrameError::PayloadTooLarge { size, max }) => {
                return Err(RelayError::RequestTooLarge { size, max })
            }
            Err(err) => return Err(RelayError::Browser(err)),
        };

        self.backend_tx
            .write_frame(&request)
            .map_err(RelayError::BackendLost)?;
        self.stats.requests += 1;
        self.stats.bytes_to_backend += request.wire_size() as u64;

        let response = match self.backend_rx.read_frame() {
            Ok(frame) => frame,
            Err(FrameError::PayloadTooLarge { size, max }) => {
                return Err(RelayError::ResponseTooLarge { size, max })
            }
            Err(err) => return Err(RelayError::BackendLost(err)),
        };

        self.browser_tx
            .write_frame(&response)
            .map_err(RelayError::Browser)?;
        self.stats.responses += 1;
        self.stats.bytes_to_browser += response.wire_size() as u64;
        Ok(Exchange::Relayed)
    }

    /// Answer a recoverable error and keep going. An oversized request body
    /// is drained by the next read.
    fn reject(&mut self, rejection: &RelayError) -> Result<()> {
        warn!(error = %rejection, "rejecting request");
        self.stats.rejected += 1;

        if let Some((code, message)) = rejection.error_response() {
            self.browser_tx
                .write_frame(&format_error(code, message))
                .map_err(RelayError::Browser)?;
        }
        Ok(())
    }

    fn finish(mut self, result: Result<()>) -> SessionReport {
        let status = match &result {
            Ok(()) => ExitStatus::Success,
            Err(err) => {
                warn!(error = %err, "relay session failed");
                notify_browser(&mut self.browser_tx, err);
                ExitStatus::Failure
            }
        };

        if let Err(err) = self.backend_tx.get_ref().shutdown() {
            debug!(error = %err, "backend shutdown failed");
        }

        info!(
            requests = self.stats.requests,
            responses = self.stats.responses,
            rejected = self.stats.rejected,
            bytes_to_backend = self.stats.bytes_to_backend,
            bytes_to_browser = self.stats.bytes_to_browser,
            status = status.code(),
            "relay session finished"
        );

        SessionReport {
            status,
            stats: self.stats,
            error: result.err(),
        }
    }
}
