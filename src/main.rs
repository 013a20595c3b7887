use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use statuswatch::report::{render_table, round_json, round_rows};
use statuswatch::settings::Overrides;
use statuswatch::{
    DemoSource, HttpSource, Scheduler, Settings, StatusEngine, StatusSource, Subscription,
};

#[derive(Parser, Debug)]
#[command(name = "statuswatch")]
#[command(about = "Polls game-server status endpoints and reports normalized, change-diffed status")]
#[command(version)]
struct Args {
    /// Settings file (TOML, YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON server list file
    #[arg(short, long)]
    servers: Option<PathBuf>,

    /// Polling interval in seconds
    #[arg(short, long)]
    interval: Option<u64>,

    /// Per-server fetch timeout in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Run a single round, print the table and exit
    #[arg(long, conflicts_with = "export")]
    once: bool,

    /// Run a single round, write it as JSON to this file and exit
    #[arg(short, long)]
    export: Option<PathBuf>,

    /// Use synthetic payloads instead of the network
    #[arg(long)]
    demo: bool,

    /// Log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("statuswatch={}", args.log_level).into()),
        )
        .with_target(false)
        .init();

    let overrides = Overrides {
        interval_secs: args.interval,
        timeout_secs: args.timeout,
        servers_file: args.servers.clone(),
    };
    let settings =
        Settings::load(args.config.as_deref(), &overrides).context("failed to load settings")?;
    let servers = settings.load_servers().context("failed to load server list")?;

    let source: Arc<dyn StatusSource> = if args.demo {
        Arc::new(DemoSource::new())
    } else {
        Arc::new(
            HttpSource::builder()
                .timeout(settings.timeout())
                .build()
                .context("failed to build HTTP client")?,
        )
    };

    let engine = Arc::new(
        StatusEngine::builder(source)
            .timeout(settings.timeout())
            .servers(servers)
            .build(),
    );

    info!(
        servers = engine.servers().len(),
        source = engine.source_description(),
        interval_secs = settings.interval_secs,
        timeout_secs = settings.timeout_secs,
        "statuswatch v{}",
        env!("CARGO_PKG_VERSION")
    );

    if let Some(export_path) = args.export {
        return export_to_file(&engine, &export_path).await;
    }

    if args.once {
        let update = engine.run_round().await;
        print!("{}", render_table(&round_rows(&update, &engine.servers()), &update.changes));
        return Ok(());
    }

    run_polling(engine, settings).await
}

/// Run one round and write it as pretty JSON.
async fn export_to_file(engine: &StatusEngine, export_path: &Path) -> Result<()> {
    let update = engine.run_round().await;
    let json = serde_json::to_string_pretty(&round_json(&update))?;
    std::fs::write(export_path, json)
        .with_context(|| format!("failed to write {}", export_path.display()))?;

    println!("Exported round {} to: {}", update.round, export_path.display());
    Ok(())
}

/// Poll until interrupted, printing each round.
async fn run_polling(engine: Arc<StatusEngine>, settings: Settings) -> Result<()> {
    let scheduler = Scheduler::new(engine.clone());
    let printer = tokio::spawn(print_rounds(engine.clone(), engine.subscribe()));

    scheduler.start(settings.interval());
    wait_for_shutdown(&scheduler, &settings).await?;

    info!("shutting down");
    scheduler.stop().await;
    printer.abort();
    Ok(())
}

async fn print_rounds(engine: Arc<StatusEngine>, mut rounds: Subscription) {
    while let Some(update) = rounds.recv().await {
        println!("round {}", update.round);
        let rows = round_rows(&update, &engine.servers());
        print!("{}", render_table(&rows, &update.changes));
    }
}

#[cfg(unix)]
async fn wait_for_shutdown(scheduler: &Scheduler, settings: &Settings) -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = signal(SignalKind::hangup()).context("failed to install SIGHUP handler")?;
    let mut user1 =
        signal(SignalKind::user_defined1()).context("failed to install SIGUSR1 handler")?;

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result.context("failed to listen for ctrl-c")?;
                return Ok(());
            }
            _ = hangup.recv() => reload_servers(scheduler.engine(), settings),
            _ = user1.recv() => {
                info!("manual refresh requested");
                scheduler.refresh_now();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown(_scheduler: &Scheduler, _settings: &Settings) -> Result<()> {
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")
}

#[cfg_attr(not(unix), allow(dead_code))]
fn reload_servers(engine: &StatusEngine, settings: &Settings) {
    match settings.load_servers() {
        Ok(servers) => {
            info!(servers = servers.len(), "server list reloaded");
            engine.set_servers(servers);
        }
        Err(e) => warn!(error = %e, "server list reload failed, keeping current list"),
    }
}
