//! Command dispatch: bridges CLI args -> `Advisor` calls -> output formatting.

pub mod advice;
pub mod auth;
pub mod config_cmd;
pub mod crops;
pub mod disease;
pub mod farms;
pub mod overview;
pub mod recommendations;
pub mod util;
pub mod weather;

use agrisage_core::Advisor;

use crate::cli::{Command, GlobalOpts};
use crate::config::Resolved;
use crate::error::CliError;

/// Dispatch a server-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    advisor: &Advisor,
    resolved: &Resolved,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Login(args) => auth::login(advisor, args, resolved, global).await,
        Command::Logout => auth::logout(advisor, global),
        Command::Register(args) => auth::register(advisor, args, global).await,
        Command::Whoami => auth::whoami(advisor, global).await,
        Command::Overview(args) => overview::handle(advisor, args, global).await,
        Command::Farms(args) => farms::handle(advisor, args, global).await,
        Command::Crops(args) => crops::handle(advisor, args, global).await,
        Command::Weather(args) => weather::handle(advisor, args, global).await,
        Command::Recommendations(args) => recommendations::handle(advisor, args, global).await,
        Command::Advice(args) => advice::handle(advisor, args, global).await,
        Command::Disease(args) => disease::handle(advisor, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "local command reached server dispatch".into(),
        )),
    }
}
