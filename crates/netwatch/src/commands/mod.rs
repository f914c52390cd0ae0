//! Command dispatch: bridges CLI args -> monitor operations -> output formatting.

pub mod config_cmd;
pub mod cycle;
pub mod devices;
pub mod events;
pub mod links;
pub mod medium;
pub mod scan;
pub mod status;
pub mod util;
pub mod watch;

use crate::cli::{Command, GlobalOpts};
use crate::config::Session;
use crate::error::CliError;

/// Dispatch a topology-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Cycle => cycle::handle(session, global).await,
        Command::Watch(args) => watch::handle(session, args, global).await,
        Command::Devices(args) => devices::handle(session, args, global).await,
        Command::Links(args) => links::handle(session, args, global).await,
        Command::Scan(args) => scan::handle(session, args, global).await,
        Command::Probe { ip } => scan::probe(session, ip, global).await,
        Command::Ping { ips } => scan::ping(session, &ips, global).await,
        Command::Events(args) => events::handle(session, args, global).await,
        Command::Status => status::handle(session, global).await,
        // Handled before a session is opened
        Command::Medium(_) | Command::Config(_) | Command::Completions(_) => Err(
            CliError::Internal("command does not need a topology session".into()),
        ),
    }
}
