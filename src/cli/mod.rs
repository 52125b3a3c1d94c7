//! Command-line interface for inspecting configuration.
//!
//! Commands are organized by category and generate help text from their
//! metadata.

mod commands;
pub mod formatting;
mod registry;
mod service;
mod types;


pub use commands::{
    LocalDeps,
    local::{GetCommand, PathCommand, WatchCommand},
};
pub use registry::CommandRegistry;
pub use service::CliService;
pub use types::{ArgType, CliError, Command, CommandArg, CommandMetadata, CommandResult};
