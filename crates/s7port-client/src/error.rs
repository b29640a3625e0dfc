/// Errors raised while bringing up a client backend.
///
/// Failures of PLC operations are not errors of this kind; they are reported
/// as a [`crate::Status`].
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The shared library could not be opened.
    #[error("failed to load {path}: {message}")]
    LibraryLoad { path: String, message: String },

    /// The library was opened but lacks an expected entry point.
    #[error("symbol {0} not found in snap7 library")]
    MissingSymbol(&'static str),

    /// The library returned a null client handle.
    #[error("snap7 client creation failed")]
    CreateFailed,

    /// No backend exists for this platform.
    #[error("snap7 backend is not available on this platform")]
    Unsupported,
}

pub type Result<T> = std::result::Result<T, ClientError>;
