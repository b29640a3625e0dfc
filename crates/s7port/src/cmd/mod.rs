use clap::{Args, Subcommand};
use s7port_client::PlcClient;
use s7port_frame::MAX_PAYLOAD;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod commands;
pub mod doctor;
pub mod serve;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the port loop on stdin/stdout (default).
    Serve(ServeArgs),
    /// List the commands the port understands.
    Commands(CommandsArgs),
    /// Check that the Snap7 backend can be loaded.
    Doctor(DoctorArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Serve(args) => serve::run(args),
        Command::Commands(args) => commands::run(args, format),
        Command::Doctor(args) => doctor::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct BackendArgs {
    /// Path of the Snap7 shared library.
    #[arg(long, value_name = "PATH", env = "S7PORT_SNAP7_LIBRARY")]
    pub library: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub backend: BackendArgs,
    /// Largest request payload accepted, in bytes.
    #[arg(
        long,
        value_name = "BYTES",
        default_value_t = MAX_PAYLOAD as u16,
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    pub max_frame: u16,
}

impl Default for ServeArgs {
    fn default() -> Self {
        Self {
            backend: BackendArgs {
                library: std::env::var("S7PORT_SNAP7_LIBRARY").ok(),
            },
            max_frame: MAX_PAYLOAD as u16,
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct CommandsArgs {}

#[derive(Args, Debug, Default)]
pub struct DoctorArgs {
    #[command(flatten)]
    pub backend: BackendArgs,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Open the PLC client backend for this platform.
#[cfg(unix)]
pub fn open_backend(backend: &BackendArgs) -> s7port_client::Result<Box<dyn PlcClient>> {
    let client = s7port_client::Snap7Client::open(backend.library.as_deref())?;
    tracing::info!(library = client.library_path(), "snap7 backend loaded");
    Ok(Box::new(client))
}

#[cfg(not(unix))]
pub fn open_backend(_backend: &BackendArgs) -> s7port_client::Result<Box<dyn PlcClient>> {
    Err(s7port_client::ClientError::Unsupported)
}
