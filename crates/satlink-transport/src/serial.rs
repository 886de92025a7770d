use std::io::{Read, Write};
use std::time::Duration;

use serialport::{ClearBuffer, FlowControl, SerialPort, SerialPortInfo};
use tracing::{debug, info};

use crate::error::{Result, TransportError};

/// Default baud rate for peripheral microcontrollers.
pub const DEFAULT_BAUD: u32 = 115_200;

/// Default bound on a single blocking read.
///
/// Kept short so callers polling for frames never stall longer than one
/// poll interval; longer waits are built from repeated polls against a
/// wall-clock deadline at the session layer.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(25);

/// Configuration for opening a serial port.
///
/// Populated once and handed to [`SerialStream::open`]; the open port is not
/// reconfigured afterwards.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Port identifier, e.g. `/dev/ttyS0` or `/dev/cu.usbmodem2101`.
    pub port: String,
    /// Baud rate. Default: 115200.
    pub baud: u32,
    /// Enable hardware (RTS/CTS) flow control.
    pub flow_control: bool,
    /// Upper bound on a single blocking read.
    pub poll_timeout: Duration,
}

impl SerialConfig {
    /// Configuration for `port` with the defaults used by the flight stack.
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud: DEFAULT_BAUD,
            flow_control: true,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
        }
    }
}

/// An open serial connection — implements Read + Write.
///
/// Exclusively owned by one link; the connection is closed when the stream
/// is dropped.
pub struct SerialStream {
    inner: Box<dyn SerialPort>,
}

impl SerialStream {
    /// Open and configure the port named in `config`.
    ///
    /// Any bytes already sitting in the OS input buffer are discarded, so a
    /// fresh link never sees stale traffic from a previous session.
    pub fn open(config: &SerialConfig) -> Result<Self> {
        let flow = if config.flow_control {
            FlowControl::Hardware
        } else {
            FlowControl::None
        };

        let inner = serialport::new(&config.port, config.baud)
            .timeout(config.poll_timeout)
            .flow_control(flow)
            .open()
            .map_err(|source| TransportError::Open {
                port: config.port.clone(),
                source,
            })?;

        inner
            .clear(ClearBuffer::Input)
            .map_err(|source| TransportError::Open {
                port: config.port.clone(),
                source,
            })?;

        info!(port = %config.port, baud = config.baud, "serial port open");
        Ok(Self { inner })
    }

    /// Number of bytes currently waiting in the input buffer.
    pub fn bytes_to_read(&self) -> Result<u32> {
        self.inner
            .bytes_to_read()
            .map_err(|err| TransportError::Io(err.into()))
    }

    /// Name of the underlying port, if the platform reports one.
    pub fn port_name(&self) -> Option<String> {
        self.inner.name()
    }
}

impl Read for SerialStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for SerialStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

impl std::fmt::Debug for SerialStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialStream")
            .field("port", &self.inner.name())
            .field("baud", &self.inner.baud_rate().ok())
            .finish()
    }
}

/// Enumerate serial ports available on this host.
pub fn available_ports() -> Result<Vec<SerialPortInfo>> {
    let ports = serialport::available_ports().map_err(TransportError::Enumerate)?;
    debug!(count = ports.len(), "enumerated serial ports");
    Ok(ports)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = SerialConfig::new("/dev/ttyS0");
        assert_eq!(config.port, "/dev/ttyS0");
        assert_eq!(config.baud, DEFAULT_BAUD);
        assert!(config.flow_control);
        assert_eq!(config.poll_timeout, DEFAULT_POLL_TIMEOUT);
    }

    #[test]
    fn open_missing_port_reports_port_name() {
        let config = SerialConfig::new("/dev/satlink-test-no-such-port");
        let err = SerialStream::open(&config).unwrap_err();
        match err {
            TransportError::Open { port, .. } => {
                assert_eq!(port, "/dev/satlink-test-no-such-port");
            }
            other => panic!("expected Open error, got {other:?}"),
        }
    }

    #[test]
    fn enumeration_does_not_panic() {
        // Host may legitimately have zero serial ports.
        let _ = available_ports();
    }
}
