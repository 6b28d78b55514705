use clap::{Args, Subcommand};
use thinkbridge_transport::Endpoint;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod doctor;
pub mod echo;
pub mod relay;
pub mod resolve;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the backend socket path and whether it exists.
    Resolve(ResolveArgs),
    /// Run local health checks against the backend socket.
    Doctor(DoctorArgs),
    /// Serve a stand-in backend that echoes every frame back.
    Echo(EchoArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, endpoint: &Endpoint, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Resolve(args) => resolve::run(args, endpoint, format),
        Command::Doctor(args) => doctor::run(args, endpoint, format),
        Command::Echo(args) => echo::run(args, endpoint),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug, Default)]
pub struct ResolveArgs {}

#[derive(Args, Debug, Default)]
pub struct DoctorArgs {}

#[derive(Args, Debug, Default)]
pub struct EchoArgs {
    /// Exit after serving N clients.
    #[arg(long, value_name = "N")]
    pub clients: Option<usize>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
