/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The payload exceeds what the length prefix (or the configured limit) can carry.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream was closed cleanly between two frames.
    #[error("connection closed")]
    ConnectionClosed,

    /// The stream was closed in the middle of a frame.
    #[error("stream closed mid-frame ({received} of {expected} bytes)")]
    UnexpectedEof { expected: usize, received: usize },
}

pub type Result<T> = std::result::Result<T, FrameError>;
