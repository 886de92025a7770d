use crate::cmd::{parse_duration, ConnArgs, ReceiveArgs};
use crate::exit::{session_error, CliResult, SUCCESS, TIMEOUT};
use crate::output::{print_payload, OutputFormat};

pub fn run(args: ReceiveArgs, conn: &ConnArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let mut session = conn.open_session()?;

    match session
        .receive(timeout)
        .map_err(|err| session_error("receive failed", err))?
    {
        Some(payload) => {
            let port = conn.port.as_deref().unwrap_or("-");
            print_payload(&payload, port, format);
            Ok(SUCCESS)
        }
        None => {
            // No data within the window is a normal outcome for a bare
            // receive; report it through the exit code, not an error.
            eprintln!("no data received within {}", args.timeout);
            Ok(TIMEOUT)
        }
    }
}
