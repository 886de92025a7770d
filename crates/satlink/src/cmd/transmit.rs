use tracing::info;

use crate::cmd::{ConnArgs, TransmitArgs};
use crate::exit::{session_error, CliResult, SUCCESS};

pub fn run(args: TransmitArgs, conn: &ConnArgs) -> CliResult<i32> {
    let mut session = conn.open_session()?;

    let sent = session
        .transmit(&args.data)
        .map_err(|err| session_error("transmit failed", err))?;

    info!(bytes = sent, "transmitted");
    Ok(SUCCESS)
}
