//! Command dispatch: bridges CLI args -> core pipeline -> output formatting.

pub mod config_cmd;
pub mod install;
pub mod reconcile;
pub mod register;
pub mod run;
pub mod util;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a portal-bound command to the appropriate handler.
///
/// Each handler validates its local inputs before connecting.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Run(args) => run::handle(args, global).await,
        Command::Register(args) => register::handle(args, global).await,
        Command::Reconcile(args) => reconcile::handle(args, global).await,
        Command::Install(args) => install::handle(args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
