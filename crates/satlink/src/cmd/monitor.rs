use satlink_session::SessionConfig;
use tracing::info;

use crate::cmd::{ConnArgs, MonitorArgs};
use crate::exit::{session_error, CliResult, SUCCESS};

pub fn run(args: MonitorArgs, conn: &ConnArgs) -> CliResult<i32> {
    let config = SessionConfig {
        stop_token: args.stop_token.clone(),
        ..SessionConfig::default()
    };
    let mut session = conn.open_session_with(config)?;

    let detected = session
        .monitor(&args.file)
        .map_err(|err| session_error("monitor failed", err))?;

    match detected {
        Some(command) => {
            info!(%command, "monitor ended on inbound command");
            println!("{command}");
        }
        None => info!("monitor ended on stop token"),
    }
    Ok(SUCCESS)
}
