use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, info, warn};
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

use clonescout::cache::HashCache;
use clonescout::cli::Cli;
use clonescout::config::Config;
use clonescout::report;
use clonescout::scan::{ScanOptions, scan};

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();

    init_logging(cli.verbose)?;
    info!("Starting {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    debug!("Command line arguments: {cli:?}");

    let config = Config::load(cli.config.as_deref())?;

    let cache_file = cli
        .cache_file
        .clone()
        .or(config.cache_file.clone())
        .unwrap_or_else(HashCache::default_path);

    if cli.print_cache {
        return print_cache(cache_file);
    }
    if cli.clear_cache {
        let cache = HashCache::empty(cache_file.clone());
        cache.clear()?;
        info!("Cleared hash cache '{}'", cache_file.display());
        return Ok(());
    }

    if let Some(threads) = cli.threads.or(config.threads) {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to configure the hashing thread pool")?;
    }

    let cancel = Arc::new(AtomicBool::new(false));
    let cancel_flag = Arc::clone(&cancel);
    ctrlc::set_handler(move || {
        warn!("Interrupt received, stopping scan...");
        cancel_flag.store(true, Ordering::Relaxed);
    })
    .context("Failed to install the interrupt handler")?;

    let options = ScanOptions {
        follow_links: cli.follow_links || config.follow_links.unwrap_or(false),
        algorithm: cli.algorithm.or(config.algorithm).unwrap_or_default(),
    };
    let cache = (!cli.no_cache).then(|| HashCache::load(cache_file));

    let result = scan(&cli.paths, &options, cache.as_ref(), &cancel)?;

    if let Some(cache) = &cache {
        cache.save()?;
    }

    report::print_diagnostics(&result);
    let likeness_threshold = cli
        .likeness_threshold
        .or(config.likeness_threshold)
        .unwrap_or(0.0);
    report::print_results(&result, likeness_threshold);

    info!("Completed in {:.2}s", start_time.elapsed().as_secs_f64());
    Ok(())
}

fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut builder = ConfigBuilder::new();
    // Falls back to UTC when the local offset cannot be determined.
    let _ = builder.set_time_offset_to_local();

    TermLogger::init(
        level,
        builder.build(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .context("Failed to initialize logging")
}

fn print_cache(cache_file: std::path::PathBuf) -> Result<()> {
    let cache = HashCache::load(cache_file);
    if cache.is_empty() {
        println!("Empty cache.");
        return Ok(());
    }

    for (path, entry) in cache.entries() {
        println!("{path} {} {} {}", entry.mtime, entry.size, entry.digest);
    }
    println!("{} files are recorded in '{}'", cache.len(), cache.cache_file().display());
    Ok(())
}
