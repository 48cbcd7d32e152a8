use thiserror::Error;

/// Errors produced by the transport layer.
///
/// A non-2xx status from an endpoint that still answered is *not* an error
/// here; callers get the status and map it themselves.  The exception is
/// [`NetError::Status`], used by the download path where there is no byte
/// payload to hand back alongside a failure status.
#[derive(Error, Debug)]
pub enum NetError {
    /// Transport-level failure: unreachable host, timeout, TLS failure, or
    /// a response body that did not parse.
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// Reading a local file for upload failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A download endpoint answered with a non-success status.
    #[error("Server answered HTTP {0}")]
    Status(u16),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, NetError>;
