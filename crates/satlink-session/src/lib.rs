//! Device handshake and command protocol for satlink serial links.
//!
//! Builds the session layer on top of [`satlink_frame`]: the one-time
//! readiness/identity handshake performed when a microcontroller link opens,
//! the `MODE:COUNT:DATA` header carried inside each framed message, and the
//! command protocol itself — single transmits, request/acknowledge command
//! exchanges, beacon pulses, chunked file streaming, and the passive monitor
//! loop.
//!
//! All operations are synchronous and blocking-with-timeout; a [`Session`]
//! exclusively owns its link and runs one operation at a time.

pub mod error;
pub mod handshake;
pub mod header;
pub mod session;

#[cfg(test)]
pub(crate) mod testutil;

pub use error::{Result, SessionError};
pub use handshake::{handshake, Subsystem, READY_SERIAL};
pub use header::{Header, Mode, MAX_DATA_LEN};
pub use session::{
    Session, SessionConfig, DEFAULT_STOP_TOKEN, STREAM_START, STREAM_STOP,
};
