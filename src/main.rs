mod cli;

use posterwall::{
    config::{self, Config},
    events::{EventBus, LibraryEvent},
    library::LibraryIndex,
    metadata::{providers::TmdbCatalog, MetadataResolver, ResolverSettings},
    scanner::{ScanOrchestrator, ScanScheduler, ScanSettings, ScanTrigger},
    server::{self, AppContext},
    share::LocalShare,
};
use posterwall_common::MediaKind;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const DEFAULT_INDEX_FILE: &str = "posterwall-index.json";

/// Where the index lives: the configured path, else next to the config file,
/// else the working directory.
fn index_path(config: &Config, config_path: Option<&Path>) -> PathBuf {
    if let Some(path) = &config.library.index_path {
        return PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).as_ref());
    }
    config_path
        .and_then(|p| p.parent())
        .map(|dir| dir.join(DEFAULT_INDEX_FILE))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_INDEX_FILE))
}

fn open_index(config: &Config, config_path: Option<&Path>) -> Result<Arc<LibraryIndex>> {
    let path = index_path(config, config_path);
    tracing::info!("Opening library index at {:?}", path);
    let index = LibraryIndex::open(&path)
        .with_context(|| format!("Failed to open library index: {:?}", path))?;
    Ok(Arc::new(index))
}

fn build_orchestrator(config: &Config, index: Arc<LibraryIndex>) -> Result<Arc<ScanOrchestrator>> {
    let catalog = TmdbCatalog::new(&config.catalog).context("Failed to create catalog client")?;
    if !catalog.is_available() {
        tracing::warn!("No catalog API key configured, every lookup will fail");
    }
    let resolver = MetadataResolver::new(
        Arc::new(catalog),
        ResolverSettings::from(&config.catalog),
    );

    Ok(Arc::new(ScanOrchestrator::new(
        Arc::new(LocalShare::new()),
        Arc::new(resolver),
        index,
        EventBus::new(),
        ScanSettings::from_config(config),
    )))
}

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config::validate_config(&config)?;

    tracing::info!("Starting posterwall");
    tracing::info!(
        "Share root {:?}, movies in {:?}, TV in {:?}",
        config.library.share_root,
        config.library.movies_subpath,
        config.library.tv_subpath
    );

    let index = open_index(&config, config_path)?;
    let orchestrator = build_orchestrator(&config, Arc::clone(&index))?;

    let mut events = orchestrator.events().subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let LibraryEvent::ScanFailed { error } = &event {
                tracing::warn!("Scan failed: {}", error);
            }
        }
    });

    let shutdown = CancellationToken::new();
    let trigger = ScanTrigger::new(Arc::clone(&orchestrator));
    let scheduler = ScanScheduler::spawn(
        trigger.clone(),
        config.library.scan_interval(),
        shutdown.clone(),
    );

    let ctx = AppContext {
        index: Arc::clone(&index),
        scans: trigger,
        config: Arc::new(config),
    };
    let server_result = server::start_server(ctx, server::shutdown_signal()).await;

    tracing::info!("Shutting down...");
    shutdown.cancel();
    if let Err(e) = scheduler.await {
        tracing::error!("Scan scheduler failed: {}", e);
    }
    if let Err(e) = index.persist() {
        tracing::error!("Failed to persist library index on shutdown: {}", e);
    }

    server_result
}

async fn scan_once(force: bool, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let index = open_index(&config, config_path)?;
    let orchestrator = build_orchestrator(&config, index)?;

    let Some(result) = orchestrator.run_cycle(force).await else {
        anyhow::bail!("A scan is already running");
    };

    println!("Cycle {}", result.cycle);
    for entry in &result.added {
        println!("  + {} ({})", entry.display_title(), entry.source_path.display());
    }
    for entry in &result.updated {
        println!("  ~ {} ({})", entry.display_title(), entry.source_path.display());
    }
    for id in &result.removed {
        println!("  - {}", id);
    }
    for err in &result.errors {
        println!("  ! {}: {}", err.path.display(), err.reason);
    }
    println!(
        "Added {}, updated {}, removed {}, errors {}",
        result.added.len(),
        result.updated.len(),
        result.removed.len(),
        result.errors.len()
    );
    Ok(())
}

fn classify_path(path: &str, json: bool) -> Result<()> {
    let (dir, filename) = match path.rsplit_once('/') {
        Some((dir, filename)) => (dir, filename),
        None => ("", path),
    };
    let guess = posterwall_parser::classify(dir, filename);

    if json {
        println!("{}", serde_json::to_string_pretty(&guess)?);
    } else {
        println!("Kind: {}", guess.kind);
        println!("Title: {}", guess.title);
        if let Some(year) = guess.year {
            println!("Year: {}", year);
        }
        if let (Some(season), Some(episode)) = (guess.season, guess.episode) {
            println!("Season {} Episode {}", season, episode);
        }
        println!("Confidence: {:.1}", guess.confidence);
        println!("ID: {}", guess.entry_id());
    }
    Ok(())
}

fn list_entries(kind: &str, config_path: Option<&Path>) -> Result<()> {
    let kind: MediaKind = kind.parse().map_err(anyhow::Error::msg)?;
    let config = config::load_config_or_default(config_path)?;
    let index = open_index(&config, config_path)?;

    let entries = index.list_by_kind(kind);
    for entry in &entries {
        let mut line = entry.display_title().to_string();
        if let Some(year) = entry.year {
            line.push_str(&format!(" ({year})"));
        }
        if let (Some(season), Some(episode)) = (entry.season, entry.episode) {
            line.push_str(&format!(" S{season:02}E{episode:02}"));
        }
        println!("{:<60} {}", line, entry.resolution_state);
    }
    println!("{} {} entries", entries.len(), kind);
    Ok(())
}

fn validate(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Share root: {:?}", config.library.share_root);
            println!(
                "  Scan interval: {} min",
                config.library.scan_interval_minutes
            );
            println!("  Resolver workers: {}", config.library.resolver_concurrency);
            println!(
                "  Catalog API key: {}",
                if config.catalog.api_key.is_empty() { "missing" } else { "set" }
            );
        }
        None => {
            println!("No config file specified, using defaults");
            let config = Config::default();
            println!("Default config:");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Share root: {:?}", config.library.share_root);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG if set, otherwise pick defaults from the verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "posterwall=trace,posterwall_parser=debug,tower_http=debug".to_string()
        } else {
            "posterwall=debug,posterwall_parser=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Scan { force } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(scan_once(force, cli.config.as_deref()))
        }
        Commands::Classify { path, json } => classify_path(&path, json),
        Commands::List { kind } => list_entries(&kind, cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate(path.as_deref())
        }
        Commands::Version => {
            println!("posterwall {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
