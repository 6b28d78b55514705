use thinkbridge_transport::Endpoint;

use crate::cmd::EchoArgs;
use crate::exit::CliResult;

/// Stand-in backend for exercising the relay without the Think app.
///
/// Serves one client at a time and answers every frame with the same bytes.
/// Ctrl-C stops the server once the current client has disconnected.
#[cfg(unix)]
pub fn run(args: EchoArgs, endpoint: &Endpoint) -> CliResult<i32> {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use thinkbridge_transport::UnixDomainSocket;
    use tracing::info;

    use crate::exit::{transport_error, SUCCESS};

    let path = endpoint
        .resolve()
        .map_err(|err| transport_error("cannot resolve socket path", err))?;
    ensure_socket_dir(&path)?;

    let listener =
        UnixDomainSocket::bind(&path).map_err(|err| transport_error("bind failed", err))?;
    info!(path = %listener.path().display(), "echo backend listening");

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone(), path.clone())?;

    let mut served = 0usize;
    while running.load(Ordering::SeqCst) {
        let stream = listener
            .accept()
            .map_err(|err| transport_error("accept failed", err))?;
        if !running.load(Ordering::SeqCst) {
            break;
        }

        let echoed = serve(stream)?;
        served += 1;
        info!(echoed, served, "client disconnected");

        if args.clients.is_some_and(|limit| served >= limit) {
            break;
        }
    }

    Ok(SUCCESS)
}

#[cfg(not(unix))]
pub fn run(_args: EchoArgs, _endpoint: &Endpoint) -> CliResult<i32> {
    Err(crate::exit::CliError::new(
        crate::exit::FAILURE,
        "echo backend requires Unix domain sockets",
    ))
}

/// Echo frames until the client hangs up. Client faults end the connection,
/// never the server.
#[cfg(unix)]
fn serve(stream: thinkbridge_transport::IpcStream) -> CliResult<u64> {
    use thinkbridge_frame::{FrameError, FrameReader, FrameWriter};
    use thinkbridge_relay::{format_error, ErrorCode};
    use tracing::{debug, warn};

    use crate::exit::transport_error;

    let write_half = stream
        .try_clone()
        .map_err(|err| transport_error("stream clone failed", err))?;
    let mut rx = FrameReader::new(stream);
    let mut tx = FrameWriter::new(write_half);
    let mut echoed = 0u64;

    loop {
        let reply = match rx.read_frame() {
            Ok(frame) => {
                debug!(size = frame.len(), "echoing frame");
                frame
            }
            Err(FrameError::PayloadTooLarge { size, max }) => {
                warn!(size, max, "dropping oversized frame");
                format_error(ErrorCode::ResourceLimit, "Message too large")
            }
            Err(FrameError::ConnectionClosed) => break,
            Err(err) => {
                warn!(error = %err, "client stream failed");
                break;
            }
        };

        if let Err(err) = tx.write_frame(&reply) {
            warn!(error = %err, "reply failed");
            break;
        }
        echoed += 1;
    }

    Ok(echoed)
}

#[cfg(unix)]
fn ensure_socket_dir(path: &std::path::Path) -> CliResult<()> {
    use std::os::unix::fs::DirBuilderExt;

    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() || parent.exists() {
        return Ok(());
    }

    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(0o700)
        .create(parent)
        .map_err(|err| crate::exit::io_error("cannot create socket directory", err))
}

/// Flag shutdown, then connect once so a blocked `accept` returns.
#[cfg(unix)]
fn install_ctrlc_handler(
    running: std::sync::Arc<std::sync::atomic::AtomicBool>,
    path: std::path::PathBuf,
) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, std::sync::atomic::Ordering::SeqCst);
        let _ = thinkbridge_transport::UnixDomainSocket::connect(&path);
    })
    .map_err(|err| {
        crate::exit::CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
