/// Errors that can occur while sending or receiving frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// An I/O error occurred while reading or writing the transport.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The transport was closed (EOF on read, or a write accepted no bytes).
    #[error("transport closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
