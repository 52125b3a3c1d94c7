use async_trait::async_trait;

use super::key_arg;
use crate::{
    cli::{
        Command, CommandResult,
        types::{ArgType, CommandArg, CommandMetadata},
    },
    local::LocalOverrideStore,
};

/// Prints the override file path of a key.
pub struct PathCommand {
    overrides: LocalOverrideStore,
}

impl PathCommand {
    /// Creates the command over `overrides`.
    pub fn new(overrides: LocalOverrideStore) -> Self {
        Self { overrides }
    }
}

#[async_trait]
impl Command for PathCommand {
    async fn execute(&self, args: &[String]) -> CommandResult {
        let key = key_arg(args, "path")?;

        Ok(self.overrides.path_for(&key).display().to_string())
    }

    fn metadata(&self) -> CommandMetadata {
        CommandMetadata {
            name: "path".to_string(),
            description: "Show the override file path of a key".to_string(),
            category: "local".to_string(),
            args: vec![CommandArg::required("key", "Configuration key", ArgType::Key)],
            examples: vec!["confsync local path feature_flags".to_string()],
        }
    }
}
