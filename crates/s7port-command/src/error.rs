/// Fatal errors raised while handling one request.
///
/// None of these produce a reply; the port stops and the process exits.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// The request is not the term shape the command expects.
    #[error("protocol desync: {0}")]
    ProtocolDesync(String),

    /// No handler is registered under this name.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// The PLC reported a run state outside the known set.
    #[error("unexpected CPU status {0:#04x}")]
    UnexpectedCpuStatus(i32),
}

impl From<s7port_term::DecodeError> for CommandError {
    fn from(err: s7port_term::DecodeError) -> Self {
        CommandError::ProtocolDesync(err.to_string())
    }
}

/// Errors that stop the port loop.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] s7port_frame::FrameError),

    /// Fatal request error.
    #[error(transparent)]
    Command(#[from] CommandError),
}

pub type Result<T> = std::result::Result<T, CommandError>;
