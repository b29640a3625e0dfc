use std::io;

use s7port_command::Port;
use s7port_frame::FrameConfig;
use tracing::info;

use crate::cmd::{open_backend, ServeArgs};
use crate::exit::{client_error, port_error, CliResult, SUCCESS};

/// Serve requests from stdin until the VM closes the port.
pub fn run(args: ServeArgs) -> CliResult<i32> {
    let mut client =
        open_backend(&args.backend).map_err(|err| client_error("backend unavailable", err))?;

    let config = FrameConfig {
        max_payload_size: usize::from(args.max_frame),
    };
    let mut port = Port::with_config(io::stdin().lock(), io::stdout().lock(), config);

    let handled = port
        .serve(&mut *client)
        .map_err(|err| port_error("port stopped", err))?;
    info!(requests = handled, "port closed");
    Ok(SUCCESS)
}
