use std::collections::BTreeMap;

use super::{
    CliError, Command,
    commands::{self, LocalDeps},
    types::CommandMetadata,
};

type Category = BTreeMap<String, Box<dyn Command>>;

/// Commands grouped by category, both kept in name order.
///
/// ```text
/// registry
/// └── local
///     ├── get
///     ├── path
///     └── watch
/// ```
#[derive(Default)]
pub struct CommandRegistry {
    categories: BTreeMap<String, Category>,
}

impl CommandRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `command` under `category`, keyed by its metadata name. An
    /// existing command of the same name is replaced.
    pub fn register_command(&mut self, category: &str, command: Box<dyn Command>) {
        let name = command.metadata().name;
        self.categories
            .entry(category.to_owned())
            .or_default()
            .insert(name, command);
    }

    /// Runs `category command` with `args`.
    ///
    /// # Errors
    ///
    /// Returns `CliError::UnknownCommand` for an unknown category or
    /// command, `CliError::InvalidArguments` when the argument count is out
    /// of range, and otherwise whatever the command returns.
    pub async fn execute(
        &self,
        category: &str,
        command_name: &str,
        args: &[String],
    ) -> Result<String, CliError> {
        let command = self.lookup(category, command_name)?;
        check_arg_count(&command.metadata(), args.len())?;
        command.execute(args).await
    }

    /// Category names with their command names.
    pub fn list_commands(&self) -> Vec<(String, Vec<String>)> {
        self.categories
            .iter()
            .map(|(category, commands)| (category.clone(), commands.keys().cloned().collect()))
            .collect()
    }

    /// Metadata of every command, ordered by category then name.
    pub fn describe(&self) -> Vec<CommandMetadata> {
        self.categories
            .values()
            .flat_map(Category::values)
            .map(|command| command.metadata())
            .collect()
    }

    /// Registers every built-in command.
    pub fn register_all_commands(&mut self, local: &LocalDeps) {
        commands::local::register_commands(self, local);
    }

    fn lookup(&self, category: &str, command_name: &str) -> Result<&dyn Command, CliError> {
        let commands = self
            .categories
            .get(category)
            .ok_or_else(|| CliError::UnknownCommand(format!("Unknown category '{category}'")))?;

        commands
            .get(command_name)
            .map(|command| &**command)
            .ok_or_else(|| {
                CliError::UnknownCommand(format!("Unknown command '{category} {command_name}'"))
            })
    }
}

fn check_arg_count(metadata: &CommandMetadata, given: usize) -> Result<(), CliError> {
    let required = metadata.args.iter().filter(|arg| arg.required).count();
    let accepted = required..=metadata.args.len();

    if accepted.contains(&given) {
        return Ok(());
    }

    let expected = if accepted.start() == accepted.end() {
        required.to_string()
    } else {
        format!("{} to {}", accepted.start(), accepted.end())
    };
    Err(CliError::InvalidArguments(format!(
        "'{}' takes {expected} argument(s), got {given}",
        metadata.name
    )))
}
