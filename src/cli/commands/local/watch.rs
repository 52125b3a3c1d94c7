use std::time::Duration;

use async_trait::async_trait;
use chrono::Local;
use tokio::sync::mpsc;

use super::key_arg;
use crate::{
    cli::{
        CliError, Command, CommandResult,
        commands::LocalDeps,
        formatting::format_event,
        types::{ArgType, CommandArg, CommandMetadata},
    },
    local::LocalChangeWatcher,
};

/// Follows the override file of a key and prints every change until Ctrl+C.
pub struct WatchCommand {
    deps: LocalDeps,
}

impl WatchCommand {
    /// Creates the command.
    pub fn new(deps: LocalDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl Command for WatchCommand {
    async fn execute(&self, args: &[String]) -> CommandResult {
        let key = key_arg(args, "watch")?;
        let interval = match args.get(1) {
            Some(raw) => raw.parse::<u64>().map(Duration::from_millis).map_err(|_| {
                CliError::InvalidArguments(format!("Invalid interval_ms '{raw}'"))
            })?,
            None => self.deps.recheck_interval,
        };

        println!(
            "Watching '{}'...",
            self.deps.overrides.path_for(&key).display()
        );
        println!("Press Ctrl+C to stop");

        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let mut watcher = LocalChangeWatcher::new(
            key.clone(),
            self.deps.overrides.clone(),
            self.deps.fs_watch.clone(),
        )
        .with_recheck_interval(interval);
        watcher.start(move |event| {
            let _ = event_tx.send(event);
        });

        loop {
            tokio::select! {
                signal = tokio::signal::ctrl_c() => {
                    signal?;
                    break;
                }
                event = event_rx.recv() => {
                    let Some(event) = event else {
                        break;
                    };
                    println!(
                        "[{}] {}",
                        Local::now().format("%H:%M:%S"),
                        format_event(&key, &event)
                    );
                }
            }
        }

        watcher.stop();
        Ok("Watch ended".to_string())
    }

    fn metadata(&self) -> CommandMetadata {
        CommandMetadata {
            name: "watch".to_string(),
            description: "Print changes to the override file of a key".to_string(),
            category: "local".to_string(),
            args: vec![
                CommandArg::required("key", "Configuration key", ArgType::Key),
                CommandArg::optional(
                    "interval_ms",
                    "Recheck interval while the file is missing",
                    ArgType::Number,
                ),
            ],
            examples: vec![
                "confsync local watch feature_flags".to_string(),
                "confsync local watch feature_flags 1000".to_string(),
            ],
        }
    }
}
