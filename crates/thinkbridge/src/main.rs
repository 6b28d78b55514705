mod cmd;
mod exit;
mod logging;
mod output;

use std::path::PathBuf;

use clap::Parser;
use thinkbridge_transport::Endpoint;

use crate::cmd::Command;
use crate::exit::{SUCCESS, USAGE};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

/// Launched by the browser with no subcommand, the host relays framed messages
/// between stdin/stdout and the Think app. Subcommands are for humans.
#[derive(Parser, Debug)]
#[command(
    name = "thinkbridge",
    version,
    about = "Native-messaging host for the Think browser extension"
)]
struct Cli {
    /// Output format for diagnostic subcommands.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(
        long,
        value_name = "FORMAT",
        env = "THINKBRIDGE_LOG_FORMAT",
        default_value = "text",
        global = true
    )]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(
        long,
        value_name = "LEVEL",
        env = "THINKBRIDGE_LOG_LEVEL",
        default_value = "warn",
        global = true
    )]
    log_level: LogLevel,

    /// Backend socket path. Defaults to ~/.think/native.sock
    /// (\\.\pipe\think-native on Windows).
    #[arg(long, value_name = "PATH", env = "THINKBRIDGE_SOCKET", global = true)]
    socket: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,

    /// Arguments the browser passes when launching the host (extension
    /// origin, or manifest path and extension id). Ignored.
    #[arg(value_name = "CALLER", hide = true)]
    caller: Vec<String>,
}

impl Cli {
    fn endpoint(&self) -> Endpoint {
        match &self.socket {
            Some(path) => Endpoint::Explicit(path.clone()),
            None => Endpoint::default(),
        }
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() { USAGE } else { SUCCESS };
            let _ = err.print();
            std::process::exit(code);
        }
    };
    init_logging(cli.log_format, cli.log_level);

    let endpoint = cli.endpoint();
    let result = match cli.command {
        Some(command) => {
            let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
            cmd::run(command, &endpoint, format)
        }
        None => cmd::relay::run(&endpoint, &cli.caller),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}
