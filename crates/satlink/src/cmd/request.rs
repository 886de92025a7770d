use crate::cmd::{ConnArgs, RequestArgs};
use crate::exit::{session_error, CliResult, SUCCESS};
use crate::output::{print_payload, OutputFormat};

pub fn run(args: RequestArgs, conn: &ConnArgs, format: OutputFormat) -> CliResult<i32> {
    let mut session = conn.open_session()?;

    let ack = session
        .command(&args.name)
        .map_err(|err| session_error("command failed", err))?;

    let port = conn.port.as_deref().unwrap_or("-");
    print_payload(&ack, port, format);
    Ok(SUCCESS)
}
