use thinkbridge_frame::MAX_PAYLOAD;
use thinkbridge_transport::{APP_DIR, SOCKET_NAME};

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("thinkbridge {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: thinkbridge");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("THINKBRIDGE_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("transport: {}", transport_name());
    println!("default_socket: ~/{APP_DIR}/{SOCKET_NAME}");
    println!("max_payload: {MAX_PAYLOAD}");

    Ok(SUCCESS)
}

#[cfg(unix)]
fn transport_name() -> &'static str {
    thinkbridge_transport::UnixDomainSocket::transport_name()
}

#[cfg(windows)]
fn transport_name() -> &'static str {
    thinkbridge_transport::NamedPipe::transport_name()
}
