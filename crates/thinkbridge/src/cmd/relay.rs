use thinkbridge_transport::Endpoint;
use tracing::debug;

use crate::exit::CliResult;

/// Relay stdin/stdout to the backend until the browser hangs up.
///
/// Every failure is reported to the browser as an error frame by the relay
/// itself, so only the exit status comes back here.
#[cfg(unix)]
pub fn run(endpoint: &Endpoint, caller: &[String]) -> CliResult<i32> {
    if !caller.is_empty() {
        debug!(?caller, "launched with caller arguments");
    }

    let backend = thinkbridge_relay::UdsBackend::new(endpoint.clone());
    let status = thinkbridge_relay::run(
        std::io::stdin().lock(),
        std::io::stdout().lock(),
        &backend,
    );
    Ok(status.code())
}

#[cfg(windows)]
pub fn run(endpoint: &Endpoint, caller: &[String]) -> CliResult<i32> {
    if !caller.is_empty() {
        debug!(?caller, "launched with caller arguments");
    }

    let backend = thinkbridge_relay::PipeBackend::new(endpoint.clone());
    let status = thinkbridge_relay::run(
        std::io::stdin().lock(),
        std::io::stdout().lock(),
        &backend,
    );
    Ok(status.code())
}
