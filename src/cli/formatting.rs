//! Terminal output for CLI commands.
//!
//! Help text is styled with ANSI escapes; item output is plain so it can be
//! piped.

use crate::{item::Item, local::ItemEvent};

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

/// Foreground colors used in help output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    /// Errors
    Red,
    /// Command names
    Green,
    /// Usage examples
    Yellow,
    /// Category names
    Blue,
    /// Headers
    Cyan,
}

impl Color {
    fn code(self) -> &'static str {
        match self {
            Color::Red => "\x1b[31m",
            Color::Green => "\x1b[32m",
            Color::Yellow => "\x1b[33m",
            Color::Blue => "\x1b[34m",
            Color::Cyan => "\x1b[36m",
        }
    }
}

fn paint(emphasis: &str, color: Option<Color>, text: &str) -> String {
    let color = color.map_or("", Color::code);
    format!("{emphasis}{color}{text}{RESET}")
}

/// Help section header.
pub fn format_header(text: &str) -> String {
    paint(BOLD, Some(Color::Cyan), text)
}

/// Command name in help output.
pub fn format_command(text: &str) -> String {
    paint(BOLD, Some(Color::Green), text)
}

/// Category name in help output.
pub fn format_category(text: &str) -> String {
    paint(BOLD, Some(Color::Blue), text)
}

/// Muted description text.
pub fn format_description(text: &str) -> String {
    paint(DIM, None, text)
}

/// Usage example line.
pub fn format_usage(text: &str) -> String {
    paint(DIM, Some(Color::Yellow), text)
}

/// Error message for stderr.
pub fn format_error(text: &str) -> String {
    paint(BOLD, Some(Color::Red), text)
}

/// Formats an item as `key = value (version N)`.
///
/// # Examples
///
/// ```
/// use confsync::{cli::formatting::format_item, item::Item};
///
/// let item = Item::new("limits", r#"{"max":4}"#, 2);
/// assert_eq!(format_item(&item), r#"limits = {"max":4} (version 2)"#);
/// ```
pub fn format_item(item: &Item) -> String {
    format!("{} = {} (version {})", item.key, item.value, item.version)
}

/// Formats a watcher event for `key`.
pub fn format_event(key: &str, event: &ItemEvent) -> String {
    match event {
        ItemEvent::Created(item) => format!("created {}", format_item(item)),
        ItemEvent::Updated(item) => format!("updated {}", format_item(item)),
        ItemEvent::Deleted => format!("deleted {key}"),
    }
}
