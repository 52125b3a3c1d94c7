//! confsync - inspect local configuration overrides.

use std::{env, error::Error, fs, path::Path, process, sync::Arc};

use confsync::{
    cli::{
        CliService, LocalDeps,
        formatting::{
            format_category, format_command, format_description, format_error, format_header,
            format_usage,
        },
    },
    config::Settings,
    local::{LocalOverrideStore, NotifyFsWatch},
    tracing_config,
};
use tracing::{info, instrument};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = env::args().skip(1).collect();
    let settings = Settings::load_default()?;

    let is_watch = matches!(
        (args.first().map(String::as_str), args.get(1).map(String::as_str)),
        (Some("local"), Some("watch"))
    );
    let _log_guard = if is_watch {
        Some(tracing_config::init_with_file(settings.log_level)?)
    } else {
        tracing_config::init_cli_mode()?;
        None
    };

    let override_dir = settings.override_dir()?;
    ensure_directory(&override_dir)?;

    let cli_service = CliService::new(LocalDeps {
        overrides: LocalOverrideStore::new(override_dir),
        fs_watch: Arc::new(NotifyFsWatch),
        recheck_interval: settings.watch.recheck_interval(),
    });

    match args.first().map(String::as_str) {
        None | Some("help" | "--help" | "-h") => print_help(&cli_service),
        Some(_) => run_cli_command(&cli_service, &args).await,
    }

    Ok(())
}

/// Routes `<category> <command> [args...]` to the matching command.
async fn run_cli_command(cli_service: &CliService, args: &[String]) {
    let category = args.first().map(String::as_str).unwrap_or("help");
    let command = args.get(1).map(String::as_str).unwrap_or("");
    let command_args = args.get(2..).unwrap_or(&[]);

    match cli_service
        .execute_command(category, command, command_args)
        .await
    {
        Ok(output) => {
            if !output.trim().is_empty() {
                println!("{output}");
            }
        }
        Err(e) => {
            eprintln!("{}", format_error(&e.to_string()));
            process::exit(1);
        }
    }
}

fn print_help(cli_service: &CliService) {
    println!("{}", format_header("confsync <category> <command> [args...]"));

    let mut current_category = String::new();
    for metadata in cli_service.describe_all() {
        if metadata.category != current_category {
            println!();
            println!("{}", format_category(&metadata.category));
            current_category.clone_from(&metadata.category);
        }

        println!(
            "  {} {}  {}",
            format_command(&metadata.name),
            metadata.usage(),
            format_description(&metadata.description)
        );
        for example in &metadata.examples {
            println!("      {}", format_usage(example));
        }
    }
}

#[instrument]
fn ensure_directory(dir: &Path) -> Result<(), Box<dyn Error>> {
    if !dir.exists() {
        info!("Creating override directory: {}", dir.display());
        fs::create_dir_all(dir)?;
    }
    Ok(())
}
