//! Serial transport ownership for satlink.
//!
//! Opens and configures the UART connection to a peripheral microcontroller
//! (radio, reaction wheel, deployer). This is the lowest layer of satlink.
//! Everything else builds on top of the [`SerialStream`] type provided here.

pub mod error;
pub mod serial;

pub use error::{Result, TransportError};
pub use serial::{available_ports, SerialConfig, SerialStream, DEFAULT_BAUD};
