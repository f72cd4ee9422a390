use anyhow::{Context, Result};
use colored::Colorize;
use refweb_core::config::Config;
use refweb_core::{
    GraphCache, GraphEngine, PopulationManifest, PopulationOptions, PopulationProgressCallback,
    Populator, ReadMode, Store, load_corpus,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Expand a leading `~` in a user-supplied path
pub fn resolve_path(raw: &Path) -> PathBuf {
    let raw = raw.to_string_lossy();
    PathBuf::from(shellexpand::tilde(raw.as_ref()).as_ref())
}

/// Load the config file when one is given, otherwise the defaults
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => {
            let path = resolve_path(path);
            Config::load(&path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?
        }
        None => Config::default(),
    };
    config.validate()?;
    Ok(config)
}

/// Population options from config with command-line overrides applied
pub fn population_options(
    config: &Config,
    depth: Option<u32>,
    max_storage_bytes: Option<u64>,
    pacing_ms: Option<u64>,
    quiet: bool,
) -> PopulationOptions {
    let mut options = PopulationOptions::from(&config.population);
    if let Some(depth) = depth {
        options.depth = depth;
    }
    if let Some(bytes) = max_storage_bytes {
        options.max_storage_bytes = bytes;
    }
    if let Some(ms) = pacing_ms {
        options.pacing = Duration::from_millis(ms);
    }
    options.show_progress_bars = options.show_progress_bars && !quiet;
    options
}

pub fn open_store(config: &Config) -> Result<Arc<Store>> {
    let path = resolve_path(&config.database);
    let store = Store::open(&path, config.pool.clone())
        .with_context(|| format!("Failed to open cache database at {}", path.display()))?;
    Ok(Arc::new(store))
}

/// Load the corpus snapshot and wire it to the cache database
pub fn build_engine(config: &Config, corpus_dir: Option<&Path>) -> Result<Arc<GraphEngine>> {
    let dir = resolve_path(corpus_dir.unwrap_or(config.corpus_dir.as_path()));
    let corpus = load_corpus(&dir)
        .with_context(|| format!("Failed to load corpus snapshot from {}", dir.display()))?;
    let store = open_store(config)?;
    debug!("Engine ready over {} documents", corpus.documents().len());
    Ok(Arc::new(GraphEngine::from_config(
        Arc::new(corpus),
        store,
        config,
    )))
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

pub fn handle_init(path: &Path, force: bool, config: &Config) -> Result<PathBuf> {
    let db_path = resolve_path(path);

    if Store::exists(&db_path) {
        if force {
            println!(
                "{} Deleting existing database (force mode)",
                "→".yellow().bold()
            );
            Store::drop(&db_path)?;
        } else {
            println!("{}", "⚠ WARNING".yellow().bold());
            println!(
                "Database already exists at {}; keeping it (use --force to recreate)",
                db_path.display().to_string().bright_white()
            );
        }
    }

    println!("{} Preparing database...", "→".blue());
    let store = Store::open(&db_path, config.pool.clone())
        .with_context(|| format!("Failed to create database at {}", db_path.display()))?;
    store.close();

    println!(
        "{} Database initialized: {}",
        "✓".green().bold(),
        db_path.display().to_string().bright_white()
    );
    Ok(db_path)
}

pub fn handle_graph(
    engine: &GraphEngine,
    name: &str,
    depth: u32,
    population: bool,
) -> Result<String> {
    let mode = if population {
        ReadMode::Population
    } else {
        ReadMode::Interactive
    };
    let graph = engine.connected_graph(name, depth, mode)?;
    if graph.updated_at.is_none() {
        eprintln!("{} No document titled {:?}", "⚠".yellow().bold(), name);
    }
    Ok(serde_json::to_string_pretty(&graph)?)
}

pub fn handle_comments(engine: &GraphEngine, name: &str, depth: u32) -> Result<String> {
    let comments = engine.connected_comments(name, depth)?;
    Ok(serde_json::to_string_pretty(&comments)?)
}

pub async fn handle_populate(
    engine: Arc<GraphEngine>,
    options: PopulationOptions,
    quiet: bool,
) -> Result<PopulationManifest> {
    if !quiet {
        print_divider();
        println!("{}", "  CACHE POPULATION".bright_white().bold());
        print_divider();
        println!(
            "{} Depth {}, ceiling {} bytes",
            "→".blue(),
            options.depth.to_string().cyan(),
            options.max_storage_bytes.to_string().cyan()
        );
    }

    // Per-item messages only when there is no progress bar to carry them
    let callback: Option<PopulationProgressCallback> = if quiet || options.show_progress_bars {
        None
    } else {
        Some(Arc::new(|msg: String| println!("  {} {}", "•".blue(), msg)))
    };

    let populator = Populator::new(engine);
    let manifest = populator.populate(options, callback).await?;

    if !quiet {
        print_manifest(&manifest);
    }
    Ok(manifest)
}

pub fn print_manifest(manifest: &PopulationManifest) {
    println!();
    println!(
        "{} {} documents populated",
        "✓".green().bold(),
        manifest.succeeded.to_string().bright_white()
    );
    if !manifest.failed.is_empty() {
        println!(
            "{} {} documents failed",
            "✗".red().bold(),
            manifest.failed.len()
        );
        for failure in &manifest.failed {
            println!("  {} {}: {}", "•".red(), failure.name, failure.reason);
        }
    }
    if manifest.stopped_at_capacity {
        println!(
            "{} Storage ceiling reached, {} documents skipped",
            "⚠".yellow().bold(),
            manifest.skipped
        );
    }
    if let (Some(before), Some(after)) =
        (manifest.initial_storage_bytes, manifest.final_storage_bytes)
    {
        println!("{} Storage: {} -> {} bytes", "ℹ".blue(), before, after);
    }
}

pub fn handle_purge(store: Arc<Store>, denylist: &[String]) -> Result<usize> {
    let removed = GraphCache::new(store).purge_matching(denylist)?;
    println!(
        "{} Removed {} cache entries matching {:?}",
        "✓".green().bold(),
        removed,
        denylist
    );
    Ok(removed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStatus {
    pub entries: usize,
    pub storage_bytes: u64,
}

pub fn handle_status(store: Arc<Store>) -> Result<StoreStatus> {
    let storage_bytes = store.storage_bytes()?;
    let path = store.path().display().to_string();
    let entries = GraphCache::new(store).len()?;

    println!("{} Database: {}", "ℹ".blue(), path.bright_white());
    println!("{} Cached graphs: {}", "ℹ".blue(), entries.to_string().cyan());
    println!(
        "{} Storage: {} bytes",
        "ℹ".blue(),
        storage_bytes.to_string().cyan()
    );
    Ok(StoreStatus {
        entries,
        storage_bytes,
    })
}
