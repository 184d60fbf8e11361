// crates/cli/src/commands.rs
use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::ArgMatches;
use console::style;
use mastermind_config::{Config, ConfigManager};
use mastermind_core::{Quadrant, Task, Validator};
use mastermind_database::DatabaseConfig;
use mastermind_network::{
    Client, ClientConfig, ConnectivityChecker, ConnectivityMonitor, HttpSnapshotTransport,
};
use mastermind_sync_engine::{DataManager, FlushReport, FlushSkip, SqliteStore};
use serde_json::Value;
use std::io::Read;
use std::sync::Arc;

/// Everything a command needs: settings, the local store and the endpoint
pub struct Session {
    config: Config,
    data: DataManager,
    transport: Arc<HttpSnapshotTransport>,
    checker: ConnectivityChecker,
}

impl Session {
    /// Opens the local store and loads its pending queue
    pub async fn open(manager: ConfigManager, config: Config) -> Result<Self> {
        let store_path = manager.resolve_path(&config.app.store_path);
        let store = SqliteStore::open(DatabaseConfig::new(store_path.to_string_lossy()))
            .await
            .with_context(|| format!("Failed to open {}", store_path.display()))?;

        let client = Client::with_config(ClientConfig::from_settings(&config.sync))
            .context("Failed to build HTTP client")?;
        let transport = Arc::new(HttpSnapshotTransport::new(client, &config.sync.endpoint));

        let probe = Client::with_config(ClientConfig::probe(config.sync.request_timeout()))
            .context("Failed to build probe client")?;
        let checker = ConnectivityChecker::new(probe, &config.sync.endpoint);

        let data = DataManager::new(Arc::new(store), transport.clone());
        // Starts offline, so this flush only loads the queue.
        data.initialize()
            .await
            .context("Failed to load sync queue")?
            .await
            .context("Initial flush task failed")?;

        Ok(Self {
            config,
            data,
            transport,
            checker,
        })
    }

    /// Probes the endpoint and, when reachable, waits for the resulting flush
    async fn sync_if_reachable(&self) -> Result<Option<FlushReport>> {
        let online = self.checker.is_online().await;
        if online {
            self.transport.endpoint_reachable();
        }

        match self.data.set_online_status(online) {
            Some(handle) => Ok(Some(handle.await.context("Flush task failed")?)),
            None => Ok(None),
        }
    }
}

/// Write a default config and create the local store
pub async fn init(manager: &ConfigManager) -> Result<()> {
    let created = manager
        .initialize()
        .context("Failed to write default configuration")?;
    let config = manager.load_with_env_overrides()?;
    let store_path = manager.resolve_path(&config.app.store_path);

    SqliteStore::open(DatabaseConfig::new(store_path.to_string_lossy()))
        .await
        .with_context(|| format!("Failed to create {}", store_path.display()))?;

    if created {
        println!("{} Wrote {}", style("✓").green().bold(), manager.config_path().display());
    } else {
        println!("Config already present at {}", manager.config_path().display());
    }
    println!("  Local store: {}", store_path.display());
    println!("  Sync endpoint: {}", config.sync.endpoint);

    Ok(())
}

/// Replace a collection with the contents of a JSON file
pub async fn save_collection(session: &Session, matches: &ArgMatches) -> Result<()> {
    let collection = required(matches, "collection")?;
    let file = required(matches, "file")?;

    let snapshot = read_snapshot(file)?;
    let count = snapshot.as_array().map(Vec::len).unwrap_or_default();

    session
        .data
        .save(collection, &snapshot)
        .await
        .with_context(|| format!("Failed to save '{}'", collection))?;
    println!(
        "{} Saved {} records to '{}'",
        style("✓").green().bold(),
        count,
        collection
    );

    report_sync(session).await
}

/// Print the local copy of a collection
pub async fn load_collection(session: &Session, matches: &ArgMatches) -> Result<()> {
    let collection = required(matches, "collection")?;

    match session.data.load_value(collection).await? {
        Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        None => println!("'{}' has never been saved on this device", collection),
    }

    Ok(())
}

/// Append a task to the tasks collection
pub async fn add_task(session: &Session, matches: &ArgMatches) -> Result<()> {
    let mut task = Task::new(required(matches, "name")?);

    if let Some(n) = matches.get_one::<u16>("quadrant") {
        let quadrant =
            Quadrant::from_number(*n).ok_or_else(|| anyhow!("Quadrant must be 1-4, got {}", n))?;
        task = task.with_quadrant(quadrant);
    }
    if let Some(due) = matches.get_one::<String>("due") {
        task = task.with_due_by(parse_due(due)?);
    }
    if let Some(tags) = matches.get_one::<String>("tags") {
        task = task.with_tags(parse_tags(tags));
    }
    task.estimated_time = matches.get_one::<String>("estimate").cloned();

    task.validate()
        .map_err(|errors| anyhow!("Invalid task: {}", errors.join("; ")))?;

    let mut tasks: Vec<Task> = session
        .data
        .load_records()
        .await
        .context("Failed to load tasks")?;
    tasks.push(task.clone());
    session
        .data
        .save_records(&tasks)
        .await
        .context("Failed to save tasks")?;

    println!("{} Task added: {}", style("✓").green().bold(), task.name);
    println!("  ID: {}", task.id);
    match task.quadrant {
        Some(q) => println!("  Quadrant: {} ({})", q.number(), q),
        None => println!("  Quadrant: unassigned"),
    }
    if let Some(due) = task.due_by {
        println!("  Due: {}", due.format("%Y-%m-%d %H:%M UTC"));
    }

    report_sync(session).await
}

/// Show connectivity and pending sync entries
pub async fn show_status(session: &Session) -> Result<()> {
    let latency = session.checker.estimate_latency().await;
    let status = session.data.status().await?;
    let pending = session.data.drainer().pending_entries().await?;

    println!("\n{}", style("Sync Status").bold().cyan());
    println!("{}", "=".repeat(60));
    println!("Endpoint: {}", session.config.sync.endpoint);
    match latency {
        Ok(rtt) => println!("Reachable: {} ({} ms)", style("yes").green(), rtt.as_millis()),
        Err(e) => println!("Reachable: {} ({})", style("no").red(), e),
    }
    println!("Pending entries: {}", style(status.pending_entries).bold());
    match status.last_sync {
        Some(at) => println!("Last sync: {}", at.format("%Y-%m-%d %H:%M:%S UTC")),
        None => println!("Last sync: never"),
    }

    if !pending.is_empty() {
        println!();
        for entry in pending {
            let records = entry.payload.as_array().map(Vec::len);
            println!(
                "  {} {:<20} {} records, queued {}",
                style("•").dim(),
                entry.collection_key,
                records.map_or_else(|| "?".to_string(), |n| n.to_string()),
                entry.enqueued_at.format("%Y-%m-%d %H:%M:%S")
            );
        }
    }

    Ok(())
}

/// Probe the endpoint and flush pending entries
pub async fn sync_now(session: &Session) -> Result<()> {
    report_sync(session).await?;

    let remaining = session.data.status().await?.pending_entries;
    if remaining > 0 {
        println!("{} entries still pending", style(remaining).yellow().bold());
    }
    Ok(())
}

/// Probe on an interval and flush whenever the endpoint comes back
pub async fn watch(session: &Session) -> Result<()> {
    let interval = session.config.sync.connectivity_interval();
    let data = session.data.clone();
    let transport = session.transport.clone();

    let monitor = ConnectivityMonitor::spawn(session.checker.clone(), interval, move |online| {
        if online {
            transport.endpoint_reachable();
            println!("{} Endpoint reachable", style("▲").green().bold());
        } else {
            println!("{} Endpoint unreachable; saves will queue", style("▼").red().bold());
        }

        if let Some(handle) = data.set_online_status(online) {
            tokio::spawn(async move {
                match handle.await {
                    Ok(report) => print_report(&report),
                    Err(e) => log::error!("Flush task failed: {}", e),
                }
            });
        }
    });

    println!(
        "Watching {} every {}s. Press Ctrl-C to stop.",
        session.checker.health_url(),
        interval.as_secs()
    );
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    monitor.stop();

    let status = session.data.status().await?;
    println!("\nStopped with {} entries pending", status.pending_entries);
    Ok(())
}

/// Print the server's copy of a collection
pub async fn pull_collection(session: &Session, matches: &ArgMatches) -> Result<()> {
    let collection = required(matches, "collection")?;

    let records = session
        .transport
        .fetch_collection(collection)
        .await
        .with_context(|| format!("Failed to fetch '{}'", collection))?;

    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}

async fn report_sync(session: &Session) -> Result<()> {
    match session.sync_if_reachable().await? {
        Some(report) => print_report(&report),
        None => println!(
            "{} Endpoint unreachable; changes stay queued",
            style("!").yellow().bold()
        ),
    }
    Ok(())
}

fn print_report(report: &FlushReport) {
    match report.skipped {
        Some(FlushSkip::Offline) => {
            println!("{} Offline; changes stay queued", style("!").yellow().bold())
        }
        Some(FlushSkip::QueueEmpty) => println!("{} Nothing to sync", style("✓").green().bold()),
        Some(FlushSkip::AlreadyRunning) => println!("A sync is already in progress"),
        Some(FlushSkip::StorageUnavailable) => {
            println!("{} Sync queue could not be read", style("✗").red().bold())
        }
        None => {
            println!(
                "{} Synced {} of {} submissions",
                style("✓").green().bold(),
                report.synced.len(),
                report.attempted
            );
            for failure in &report.failed {
                println!(
                    "  {} {}: {}",
                    style("✗").red().bold(),
                    failure.collection_key,
                    failure.reason
                );
            }
            if report.deferred > 0 {
                println!("  {} entries deferred to the next sync", report.deferred);
            }
        }
    }
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a str> {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("{} is required", name))
}

/// Reads a collection snapshot from a file, or stdin for `-`
fn read_snapshot(path: &str) -> Result<Value> {
    let text = if path == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        buf
    } else {
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?
    };

    let value: Value =
        serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path))?;
    if !value.is_array() {
        bail!("{} must contain a JSON array of records", path);
    }
    Ok(value)
}

/// Accepts RFC 3339 or a bare date, which means the end of that day in UTC
fn parse_due(input: &str) -> Result<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(input) {
        return Ok(at.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .with_context(|| format!("Unrecognized due date '{}'", input))?;
    let end_of_day = date
        .and_hms_opt(23, 59, 59)
        .ok_or_else(|| anyhow!("Invalid due date '{}'", input))?;
    Ok(end_of_day.and_utc())
}

fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
