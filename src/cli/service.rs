use super::{CliError, CommandRegistry, commands::LocalDeps, types::CommandMetadata};

/// Entry point used by the binary: owns the registry with every built-in command.
pub struct CliService {
    registry: CommandRegistry,
}

impl CliService {
    /// Creates a new CLI service with all built-in commands registered.
    pub fn new(local: LocalDeps) -> Self {
        let mut registry = CommandRegistry::new();
        registry.register_all_commands(&local);

        CliService { registry }
    }

    /// Runs `category command_name` with `args`.
    ///
    /// # Errors
    /// Returns `CliError::UnknownCommand` for unregistered commands, and any
    /// error the command reports.
    pub async fn execute_command(
        &self,
        category: &str,
        command_name: &str,
        args: &[String],
    ) -> Result<String, CliError> {
        self.registry.execute(category, command_name, args).await
    }

    /// Lists all available commands as `(category, command names)`.
    pub fn list_all(&self) -> Vec<(String, Vec<String>)> {
        self.registry.list_commands()
    }

    /// Metadata of every available command.
    pub fn describe_all(&self) -> Vec<CommandMetadata> {
        self.registry.describe()
    }
}
