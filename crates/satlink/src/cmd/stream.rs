use tracing::info;

use crate::cmd::{ConnArgs, StreamArgs};
use crate::exit::{session_error, CliResult, SUCCESS};

pub fn run(args: StreamArgs, conn: &ConnArgs) -> CliResult<i32> {
    let mut session = conn.open_session()?;

    let chunks = session
        .stream(&args.file)
        .map_err(|err| session_error("stream failed", err))?;

    info!(file = %args.file, chunks, "stream complete");
    Ok(SUCCESS)
}
