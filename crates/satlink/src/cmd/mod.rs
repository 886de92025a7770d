use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use satlink_session::{Session, SessionConfig, Subsystem};
use satlink_transport::{SerialConfig, SerialStream, DEFAULT_BAUD};

use crate::exit::{session_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod beacon;
pub mod monitor;
pub mod ports;
pub mod receive;
pub mod request;
pub mod stream;
pub mod transmit;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Transmit a single message.
    Transmit(TransmitArgs),
    /// Wait for a single incoming frame and print it.
    Receive(ReceiveArgs),
    /// Send an allow-listed command and wait for the acknowledgement.
    #[command(name = "command")]
    Request(RequestArgs),
    /// Send out beacon pulses.
    Beacon(BeaconArgs),
    /// Stream a file to the peer in 32-byte chunks.
    Stream(StreamArgs),
    /// Monitor incoming data until the stop token is received.
    Monitor(MonitorArgs),
    /// List serial ports on this host.
    Ports(PortsArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, conn: &ConnArgs, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Transmit(args) => transmit::run(args, conn),
        Command::Receive(args) => receive::run(args, conn, format),
        Command::Request(args) => request::run(args, conn, format),
        Command::Beacon(args) => beacon::run(args, conn),
        Command::Stream(args) => stream::run(args, conn),
        Command::Monitor(args) => monitor::run(args, conn),
        Command::Ports(args) => ports::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Connection settings shared by every subcommand that opens a link.
#[derive(Args, Debug)]
pub struct ConnArgs {
    /// Serial port the device is connected to, e.g. /dev/ttyS0.
    #[arg(long, short = 'p', global = true, env = "SATLINK_PORT")]
    pub port: Option<String>,

    /// Device identity announced during the handshake.
    #[arg(long, short = 'i', default_value_t = 0, global = true)]
    pub id: u8,

    /// Peripheral device class on the other end of the link.
    #[arg(long, value_enum, default_value = "radio", global = true)]
    pub subsystem: SubsystemArg,

    /// Baud rate.
    #[arg(long, default_value_t = DEFAULT_BAUD, global = true, env = "SATLINK_BAUD")]
    pub baud: u32,

    /// Disable hardware (RTS/CTS) flow control.
    #[arg(long, global = true)]
    pub no_flow_control: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum SubsystemArg {
    Radio,
    Reactionwheel,
}

impl SubsystemArg {
    pub fn to_subsystem(self) -> Subsystem {
        match self {
            SubsystemArg::Radio => Subsystem::radio(),
            SubsystemArg::Reactionwheel => Subsystem::reaction_wheel(),
        }
    }
}

impl ConnArgs {
    /// Open the configured port and perform the handshake.
    pub fn open_session(&self) -> CliResult<Session<SerialStream>> {
        self.open_session_with(SessionConfig::default())
    }

    /// Open with explicit session tuning.
    pub fn open_session_with(&self, config: SessionConfig) -> CliResult<Session<SerialStream>> {
        let port = self.port.as_deref().ok_or_else(|| {
            CliError::new(USAGE, "no serial port given (use --port)")
        })?;

        let mut serial = SerialConfig::new(port);
        serial.baud = self.baud;
        serial.flow_control = !self.no_flow_control;

        Session::open_serial(&serial, &self.subsystem.to_subsystem(), self.id, config)
            .map_err(|err| session_error("connect failed", err))
    }
}

#[derive(Args, Debug)]
pub struct TransmitArgs {
    /// The string of data to be transmitted (max 32 bytes).
    #[arg(long, short = 'd')]
    pub data: String,
}

#[derive(Args, Debug)]
pub struct ReceiveArgs {
    /// Maximum time to wait for a frame (e.g. 10s, 500ms).
    #[arg(long, default_value = "10s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct RequestArgs {
    /// Command token to send (must be on the allow-list).
    pub name: String,
}

#[derive(Args, Debug)]
pub struct BeaconArgs {
    /// The status of the satellite.
    #[arg(long, short = 's', default_value = "healthy")]
    pub status: String,

    /// Number of beacon pulses to send.
    #[arg(long, default_value_t = 3)]
    pub pulses: u32,
}

#[derive(Args, Debug)]
pub struct StreamArgs {
    /// The full path of the file to be streamed.
    #[arg(long, short = 'f')]
    pub file: String,
}

#[derive(Args, Debug)]
pub struct MonitorArgs {
    /// The filename to save incoming stream data to.
    #[arg(long, short = 'f', default_value = "output-logs.txt")]
    pub file: String,

    /// Token that ends the monitor loop.
    #[arg(long, default_value = "STOP")]
    pub stop_token: String,
}

#[derive(Args, Debug, Default)]
pub struct PortsArgs {}

#[derive(Args, Debug, Default)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse durations like `10s` or `500ms`. A bare number means seconds.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        _ => Err(CliError::new(
            USAGE,
            format!("unsupported duration unit: {unit}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_accepts_seconds_and_millis() {
        assert_eq!(parse_duration("10s").unwrap(), Duration::from_secs(10));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_zero_and_garbage() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("").is_err());
        assert!(parse_duration("fast").is_err());
    }

    #[test]
    fn open_session_without_port_is_usage_error() {
        let conn = ConnArgs {
            port: None,
            id: 0,
            subsystem: SubsystemArg::Radio,
            baud: DEFAULT_BAUD,
            no_flow_control: false,
        };
        let err = conn.open_session().unwrap_err();
        assert_eq!(err.code, USAGE);
    }
}
