use std::path::Path;

use serde::Serialize;
use thinkbridge_transport::Endpoint;

use crate::cmd::ResolveArgs;
use crate::exit::{transport_error, CliResult, SUCCESS};
use crate::output::{field_table, print_json, OutputFormat};

#[derive(Debug, Serialize)]
struct ResolveOutput {
    socket_path: String,
    source: &'static str,
    exists: bool,
    is_socket: bool,
}

pub fn run(_args: ResolveArgs, endpoint: &Endpoint, format: OutputFormat) -> CliResult<i32> {
    let path = endpoint
        .resolve()
        .map_err(|err| transport_error("cannot resolve socket path", err))?;

    let output = ResolveOutput {
        socket_path: path.display().to_string(),
        source: match endpoint {
            Endpoint::Explicit(_) => "explicit",
            Endpoint::Home(_) => "home",
        },
        exists: path_exists(&path),
        is_socket: is_socket(&path),
    };

    match format {
        OutputFormat::Json => print_json(&output),
        OutputFormat::Table => {
            let table = field_table(&[
                ("socket_path", output.socket_path.clone()),
                ("source", output.source.to_string()),
                ("exists", output.exists.to_string()),
                ("is_socket", output.is_socket.to_string()),
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!(
            "socket_path={} source={} exists={} is_socket={}",
            output.socket_path, output.source, output.exists, output.is_socket
        ),
        OutputFormat::Raw => println!("{}", output.socket_path),
    }

    Ok(SUCCESS)
}

/// Existence as the relay sees it before connecting.
#[cfg(unix)]
pub(crate) fn path_exists(path: &Path) -> bool {
    thinkbridge_transport::UnixDomainSocket::ensure_present(path).is_ok()
}

#[cfg(windows)]
pub(crate) fn path_exists(path: &Path) -> bool {
    thinkbridge_transport::NamedPipe::ensure_present(path).is_ok()
}

#[cfg(unix)]
pub(crate) fn is_socket(path: &Path) -> bool {
    use std::os::unix::fs::FileTypeExt;
    std::fs::metadata(path)
        .map(|meta| meta.file_type().is_socket())
        .unwrap_or(false)
}

/// Anything answering under `\\.\pipe\` is a pipe.
#[cfg(windows)]
pub(crate) fn is_socket(path: &Path) -> bool {
    path_exists(path)
}
