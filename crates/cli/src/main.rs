use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use mastermind_config::{Config, ConfigManager};
use std::path::PathBuf;

mod commands;

fn build_cli() -> Command {
    Command::new("mastermind")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Mastermind Team")
        .about("Local-first planner storage with background sync")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("DIR")
                .help("Directory holding config.toml (defaults to the platform config dir)")
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable debug logging")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(Command::new("init").about("Write a default config file and create the local store"))
        .subcommand(
            Command::new("save")
                .about("Replace a collection with the JSON array in a file")
                .arg(Arg::new("collection").required(true).value_name("COLLECTION").help("Collection name, e.g. tasks"))
                .arg(Arg::new("file").required(true).value_name("FILE").help("JSON file, or '-' for stdin")),
        )
        .subcommand(
            Command::new("load")
                .about("Print the local copy of a collection")
                .arg(Arg::new("collection").required(true).value_name("COLLECTION").help("Collection name")),
        )
        .subcommand(
            Command::new("add-task")
                .about("Append a task to the tasks collection")
                .arg(Arg::new("name").required(true).value_name("NAME").help("Task name"))
                .arg(
                    Arg::new("quadrant")
                        .short('q')
                        .long("quadrant")
                        .value_name("1-4")
                        .help("Eisenhower quadrant")
                        .value_parser(clap::value_parser!(u16).range(1..=4)),
                )
                .arg(Arg::new("due").short('d').long("due").value_name("WHEN").help("Due date (YYYY-MM-DD or RFC 3339)"))
                .arg(Arg::new("estimate").short('e').long("estimate").value_name("TIME").help("Estimated time, e.g. 30m"))
                .arg(Arg::new("tags").short('t').long("tags").value_name("TAGS").help("Comma-separated tags")),
        )
        .subcommand(Command::new("status").about("Show connectivity and pending sync entries"))
        .subcommand(Command::new("sync").about("Probe the endpoint and flush pending entries"))
        .subcommand(Command::new("watch").about("Keep probing connectivity and sync whenever the endpoint comes back"))
        .subcommand(
            Command::new("pull")
                .about("Print the server's copy of a collection")
                .arg(Arg::new("collection").required(true).value_name("COLLECTION").help("Collection name")),
        )
}

fn load_config(config_dir: Option<&String>) -> Result<(ConfigManager, Config)> {
    let manager = match config_dir {
        Some(dir) => ConfigManager::with_directory(PathBuf::from(dir)),
        None => ConfigManager::new(),
    }
    .context("Failed to locate configuration directory")?;

    let config = manager
        .load_with_env_overrides()
        .with_context(|| format!("Failed to load {}", manager.config_path().display()))?;

    Ok((manager, config))
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = build_cli().get_matches();
    let (manager, config) = load_config(matches.get_one::<String>("config"))?;

    let filter = if matches.get_flag("verbose") {
        "debug"
    } else {
        config.app.log_level.as_filter()
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    if let Some(("init", _)) = matches.subcommand() {
        return commands::init(&manager).await;
    }

    let session = commands::Session::open(manager, config)
        .await
        .context("Failed to open local store")?;

    match matches.subcommand() {
        Some(("save", sub_matches)) => commands::save_collection(&session, sub_matches).await,
        Some(("load", sub_matches)) => commands::load_collection(&session, sub_matches).await,
        Some(("add-task", sub_matches)) => commands::add_task(&session, sub_matches).await,
        Some(("status", _)) => commands::show_status(&session).await,
        Some(("sync", _)) => commands::sync_now(&session).await,
        Some(("watch", _)) => commands::watch(&session).await,
        Some(("pull", sub_matches)) => commands::pull_collection(&session, sub_matches).await,
        _ => {
            build_cli().print_help()?;
            Ok(())
        }
    }
}
