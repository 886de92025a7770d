use std::time::Duration;

/// Errors that can occur in session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Payload is empty or exceeds the transceiver's per-message ceiling.
    #[error("invalid payload length {len} (must be 1..=32 bytes)")]
    InvalidPayload { len: usize },

    /// Header mode token is not one of transmit/stream/receive.
    #[error("invalid mode token: {0:?}")]
    InvalidMode(String),

    /// Header did not parse as `MODE:COUNT:DATA`.
    #[error("malformed header: {0:?}")]
    MalformedHeader(String),

    /// Command token is not on the allow-list.
    #[error("unsupported command: {0:?}")]
    UnsupportedCommand(String),

    /// Device id outside the legal set for the subsystem.
    #[error("invalid identity {id} for subsystem {subsystem} (legal: {legal:?})")]
    InvalidIdentity {
        id: u8,
        subsystem: String,
        legal: Vec<u8>,
    },

    /// No response within a hard deadline on a path that requires one.
    #[error("no response within {0:?}")]
    Timeout(Duration),

    /// Stream source file is blank or unreadable.
    #[error("cannot stream from {path:?}: {source}")]
    SourceUnreadable {
        path: String,
        source: std::io::Error,
    },

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] satlink_frame::FrameError),

    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] satlink_transport::TransportError),

    /// Local file I/O error (monitor output file).
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SessionError>;
