use async_trait::async_trait;
use thiserror::Error;

use crate::local::LocalError;

/// Errors reported by CLI commands.
#[derive(Error, Debug)]
pub enum CliError {
    /// No command is registered under the given category and name.
    #[error("Command not found: {0}")]
    UnknownCommand(String),

    /// Wrong argument count, or an argument value that does not parse.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// The override file exists but cannot be used.
    #[error("Override error: {0}")]
    Override(#[from] LocalError),

    /// Terminal or signal I/O failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Output of a command, printed by the caller.
pub type CommandResult = Result<String, CliError>;

/// One positional argument of a command.
#[derive(Debug, Clone)]
pub struct CommandArg {
    /// Name shown in usage text.
    pub name: String,

    /// What the argument means.
    pub description: String,

    /// Whether the command fails without it.
    pub required: bool,

    /// Kind of value expected.
    pub value_type: ArgType,
}

impl CommandArg {
    /// A mandatory argument.
    pub fn required(name: &str, description: &str, value_type: ArgType) -> Self {
        Self {
            name: name.to_owned(),
            description: description.to_owned(),
            required: true,
            value_type,
        }
    }

    /// An argument that may be left out. Optional arguments follow the
    /// required ones.
    pub fn optional(name: &str, description: &str, value_type: ArgType) -> Self {
        Self {
            required: false,
            ..Self::required(name, description, value_type)
        }
    }

    /// `<name>` when required, `[name]` otherwise.
    pub fn usage(&self) -> String {
        if self.required {
            format!("<{}>", self.name)
        } else {
            format!("[{}]", self.name)
        }
    }
}

/// Kind of value an argument takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgType {
    /// A configuration key.
    Key,

    /// A non-negative integer.
    Number,
}

/// Name, arguments and help text of a command.
#[derive(Debug, Clone)]
pub struct CommandMetadata {
    /// Name within the category.
    pub name: String,

    /// One-line summary.
    pub description: String,

    /// Positional arguments, required ones first.
    pub args: Vec<CommandArg>,

    /// Complete invocations shown in help.
    pub examples: Vec<String>,

    /// Category the command is registered under.
    pub category: String,
}

impl CommandMetadata {
    /// Argument synopsis, e.g. `<key> [interval_ms]`.
    pub fn usage(&self) -> String {
        self.args
            .iter()
            .map(CommandArg::usage)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A CLI command. Dependencies are passed to the constructor.
#[async_trait]
pub trait Command: Send + Sync {
    /// Runs the command. The argument count has already been checked
    /// against [`metadata`](Self::metadata).
    ///
    /// # Errors
    ///
    /// Returns `CliError` for unparsable argument values, unusable override
    /// files and I/O failures.
    async fn execute(&self, args: &[String]) -> CommandResult;

    /// Describes the command.
    fn metadata(&self) -> CommandMetadata;
}
