//! Mastermind sync server
//!
//! Usage:
//!   mastermind-server --bind 0.0.0.0:8080 --database mastermind-server.db

use anyhow::{Context, Result};
use clap::Parser;
use mastermind_config::{Config, ConfigManager};
use mastermind_database::{
    connect, current_version, optimize, run_migrations, verify_integrity, DatabaseConfig, Schema,
};
use mastermind_server::{build_router, SnapshotReconciler, SqliteDocumentStore};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "mastermind-server")]
#[command(about = "Snapshot reconciliation server for the Mastermind planner")]
struct Args {
    /// Directory holding config.toml
    #[arg(short, long, value_name = "DIR")]
    config: Option<PathBuf>,

    /// Address to listen on (overrides the config file)
    #[arg(short, long, value_name = "ADDR")]
    bind: Option<String>,

    /// Document database file (overrides the config file)
    #[arg(short, long, value_name = "PATH")]
    database: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn load_config(args: &Args) -> Result<(ConfigManager, Config)> {
    let manager = match &args.config {
        Some(dir) => ConfigManager::with_directory(dir.clone()),
        None => ConfigManager::new(),
    }
    .context("Failed to locate configuration directory")?;

    let mut config = manager
        .load_with_env_overrides()
        .with_context(|| format!("Failed to load {}", manager.config_path().display()))?;

    if let Some(bind) = &args.bind {
        config.server.bind_address = bind.clone();
    }
    if let Some(database) = &args.database {
        config.server.database_path = database.clone();
    }

    Ok((manager, config))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let (manager, config) = load_config(&args)?;

    let filter = if args.verbose {
        "debug"
    } else {
        config.app.log_level.as_filter()
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    let db_path = manager.resolve_path(&config.server.database_path);
    let db_config = DatabaseConfig::new(db_path.to_string_lossy())
        .with_max_connections(config.server.max_connections);
    let pool = connect(db_config)
        .await
        .with_context(|| format!("Failed to open {}", db_path.display()))?;
    run_migrations(&pool, Schema::Server)
        .await
        .context("Failed to apply database migrations")?;
    verify_integrity(&pool)
        .await
        .context("Document database failed its integrity check")?;

    log::debug!("Document schema at version {}", current_version(Schema::Server));

    let store = Arc::new(SqliteDocumentStore::new(pool.clone()));
    let app = build_router(Arc::new(SnapshotReconciler::new(store)), &config.server);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_address))?;
    log::info!(
        "Serving {} on {}",
        db_path.display(),
        config.server.bind_address
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
            log::info!("Shutting down");
        })
        .await
        .context("HTTP server failed")?;

    if let Err(e) = optimize(&pool).await {
        log::warn!("{}", e);
    }
    pool.close().await;
    Ok(())
}
