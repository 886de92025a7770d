use tracing::info;

use crate::cmd::{BeaconArgs, ConnArgs};
use crate::exit::{session_error, CliResult, SUCCESS};

pub fn run(args: BeaconArgs, conn: &ConnArgs) -> CliResult<i32> {
    let mut session = conn.open_session()?;

    session
        .beacon(&args.status, args.pulses)
        .map_err(|err| session_error("beacon failed", err))?;

    info!(pulses = args.pulses, status = %args.status, "beacon complete");
    Ok(SUCCESS)
}
