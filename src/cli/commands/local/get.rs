use async_trait::async_trait;

use super::key_arg;
use crate::{
    cli::{
        Command, CommandResult,
        formatting::format_item,
        types::{ArgType, CommandArg, CommandMetadata},
    },
    local::LocalOverrideStore,
};

/// Reads the override file of a key.
///
/// # Example Usage
///
/// ```bash
/// confsync local get feature_flags
/// ```
pub struct GetCommand {
    overrides: LocalOverrideStore,
}

impl GetCommand {
    /// Creates the command over `overrides`.
    pub fn new(overrides: LocalOverrideStore) -> Self {
        Self { overrides }
    }
}

#[async_trait]
impl Command for GetCommand {
    /// Prints the override item, or reports it absent when the file is
    /// missing, empty or invalid.
    ///
    /// # Errors
    ///
    /// * `CliError::Override` - If the file is unreadable or malformed
    async fn execute(&self, args: &[String]) -> CommandResult {
        let key = key_arg(args, "get")?;

        Ok(match self.overrides.read(&key).await? {
            Some(item) => format_item(&item),
            None => format!("{key}: absent"),
        })
    }

    fn metadata(&self) -> CommandMetadata {
        CommandMetadata {
            name: "get".to_string(),
            description: "Show the local override of a key".to_string(),
            category: "local".to_string(),
            args: vec![CommandArg::required("key", "Configuration key", ArgType::Key)],
            examples: vec![
                "confsync local get feature_flags".to_string(),
                "confsync local get limit_3".to_string(),
            ],
        }
    }
}
