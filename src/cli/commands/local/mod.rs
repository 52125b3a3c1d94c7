//! Inspection of local override files.
mod get;
mod path;
mod watch;

pub use get::GetCommand;
pub use path::PathCommand;
pub use watch::WatchCommand;

use super::LocalDeps;
use crate::cli::{CliError, CommandRegistry};

/// Registers the commands of the "local" category.
pub fn register_commands(registry: &mut CommandRegistry, deps: &LocalDeps) {
    const CATEGORY_NAME: &str = "local";

    registry.register_command(
        CATEGORY_NAME,
        Box::new(PathCommand::new(deps.overrides.clone())),
    );

    registry.register_command(
        CATEGORY_NAME,
        Box::new(GetCommand::new(deps.overrides.clone())),
    );

    registry.register_command(CATEGORY_NAME, Box::new(WatchCommand::new(deps.clone())));
}

fn key_arg(args: &[String], command: &str) -> Result<String, CliError> {
    args.first().cloned().ok_or_else(|| {
        CliError::InvalidArguments(format!(
            "Expected <key> argument for '{command}' command"
        ))
    })
}
