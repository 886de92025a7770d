mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::{Command, ConnArgs};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "satlink", version, about = "Serial link to CubeSat peripherals")]
struct Cli {
    #[command(flatten)]
    conn: ConnArgs,

    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, &cli.conn, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_transmit_subcommand() {
        let cli = Cli::try_parse_from([
            "satlink",
            "--port",
            "/dev/ttyS0",
            "transmit",
            "--data",
            "hello",
        ])
        .expect("transmit args should parse");

        assert!(matches!(cli.command, Command::Transmit(_)));
        assert_eq!(cli.conn.port.as_deref(), Some("/dev/ttyS0"));
    }

    #[test]
    fn parses_monitor_with_defaults() {
        let cli = Cli::try_parse_from(["satlink", "-p", "/dev/ttyUSB0", "monitor"])
            .expect("monitor args should parse");

        match cli.command {
            Command::Monitor(args) => {
                assert_eq!(args.file, "output-logs.txt");
                assert_eq!(args.stop_token, "STOP");
            }
            other => panic!("expected monitor, got {other:?}"),
        }
    }

    #[test]
    fn parses_beacon_with_status() {
        let cli = Cli::try_parse_from([
            "satlink",
            "-p",
            "/dev/ttyS0",
            "beacon",
            "--status",
            "healthy",
            "--pulses",
            "5",
        ])
        .expect("beacon args should parse");

        match cli.command {
            Command::Beacon(args) => {
                assert_eq!(args.status, "healthy");
                assert_eq!(args.pulses, 5);
            }
            other => panic!("expected beacon, got {other:?}"),
        }
    }

    #[test]
    fn parses_command_subcommand() {
        let cli = Cli::try_parse_from(["satlink", "-p", "/dev/ttyS0", "-i", "1", "command", "smile"])
            .expect("command args should parse");

        assert!(matches!(cli.command, Command::Request(_)));
        assert_eq!(cli.conn.id, 1);
    }

    #[test]
    fn ports_needs_no_port_argument() {
        let cli = Cli::try_parse_from(["satlink", "ports"]).expect("ports should parse");
        assert!(matches!(cli.command, Command::Ports(_)));
        assert!(cli.conn.port.is_none());
    }

    #[test]
    fn rejects_unknown_subsystem() {
        let err = Cli::try_parse_from([
            "satlink",
            "-p",
            "/dev/ttyS0",
            "--subsystem",
            "thruster",
            "transmit",
            "--data",
            "x",
        ])
        .expect_err("unknown subsystem should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }
}
