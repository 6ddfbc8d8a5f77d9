//! Command dispatch: bridges CLI args -> coordinator and entity adapters
//! -> output formatting.

pub mod apps;
pub mod config_cmd;
pub mod entities;
pub mod status;
pub mod storage;
pub mod system;
pub mod util;
pub mod watch;

use umbrelly_core::{Coordinator, CoordinatorConfig, CoreError};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a host-bound command.
///
/// `watch` keeps the periodic refresh running; everything else loads one
/// snapshot, acts on it, and shuts the coordinator down.
pub async fn dispatch(
    cmd: Command,
    config: CoordinatorConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if let Command::Watch(args) = cmd {
        return watch::handle(config, args, global).await;
    }

    Coordinator::oneshot(config, |coordinator| async move {
        Ok::<_, CoreError>(run(cmd, &coordinator, global).await)
    })
    .await?
}

async fn run(cmd: Command, coordinator: &Coordinator, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Status => status::handle(coordinator, global),
        Command::Apps(args) => apps::handle(coordinator, args, global).await,
        Command::System(args) => system::handle(coordinator, args, global).await,
        Command::Storage => storage::handle(coordinator, global),
        Command::Entities(args) => entities::handle(coordinator, &args, global),
        // Config, Completions and Watch are handled before this point
        Command::Watch(_) | Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
