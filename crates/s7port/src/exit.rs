use std::fmt;
use std::io;

use s7port_client::ClientError;
use s7port_command::{CommandError, PortError};
use s7port_frame::FrameError;

// Exit code constants aligned with sysexits-style semantics.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const HEALTH_CHECK_FAILED: i32 = 30;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const BACKEND_UNAVAILABLE: i32 = 69;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        // The VM went away mid-reply.
        io::ErrorKind::BrokenPipe => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::PayloadTooLarge { .. } | FrameError::UnexpectedEof { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        FrameError::ConnectionClosed => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}

pub fn command_error(context: &str, err: CommandError) -> CliError {
    CliError::new(DATA_INVALID, format!("{context}: {err}"))
}

pub fn port_error(context: &str, err: PortError) -> CliError {
    match err {
        PortError::Frame(err) => frame_error(context, err),
        PortError::Command(err) => command_error(context, err),
    }
}

pub fn client_error(context: &str, err: ClientError) -> CliError {
    match err {
        ClientError::LibraryLoad { .. }
        | ClientError::MissingSymbol(_)
        | ClientError::Unsupported => {
            CliError::new(BACKEND_UNAVAILABLE, format!("{context}: {err}"))
        }
        ClientError::CreateFailed => CliError::new(INTERNAL, format!("{context}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_violations_are_data_invalid() {
        let err = port_error(
            "port stopped",
            PortError::Command(CommandError::UnknownCommand("reboot".into())),
        );
        assert_eq!(err.code, DATA_INVALID);
        assert!(err.message.starts_with("port stopped: "));

        let err = frame_error(
            "read",
            FrameError::UnexpectedEof {
                expected: 4,
                received: 1,
            },
        );
        assert_eq!(err.code, DATA_INVALID);
    }

    #[test]
    fn missing_library_is_backend_unavailable() {
        let err = client_error(
            "backend",
            ClientError::LibraryLoad {
                path: "libsnap7.so".into(),
                message: "not found".into(),
            },
        );
        assert_eq!(err.code, BACKEND_UNAVAILABLE);
        assert_eq!(client_error("backend", ClientError::CreateFailed).code, INTERNAL);
    }

    #[test]
    fn broken_pipe_is_plain_failure() {
        let err = io_error("write", io::Error::from(io::ErrorKind::BrokenPipe));
        assert_eq!(err.code, FAILURE);
    }
}
