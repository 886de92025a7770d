//! Marker-delimited message framing for satlink serial links.
//!
//! This is the core value-add layer of satlink. Peripheral microcontrollers
//! speak a byte stream with no out-of-band length field; every message is
//! delimited instead:
//!
//! ```text
//! < payload >
//! ```
//!
//! The [`Deframer`] reconstructs complete payloads from arbitrarily chunked
//! input, and [`FramedLink`] binds one deframer to an owned transport.
//! No partial reads, no buffer management in user code.
//!
//! Marker bytes inside a payload are not escaped and will break framing.
//! This is an accepted limitation of the wire protocol.

pub mod codec;
pub mod error;
pub mod link;

pub use codec::{encode_frame, Deframer, Frame, FrameConfig, END_MARKER, START_MARKER};
pub use error::{FrameError, Result};
pub use link::FramedLink;
