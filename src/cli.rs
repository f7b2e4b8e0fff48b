use std::path::PathBuf;

use clap::Parser;

use crate::digest::HashAlgorithm;

#[derive(Parser, Debug)]
#[command(name = "clonescout", version)]
#[command(about = "Find duplicated files and directory trees by content")]
pub struct Cli {
    /// Root directories to scan for clones
    #[arg(default_value = ".", value_name = "DIR")]
    pub paths: Vec<PathBuf>,

    /// Follow symbolic links instead of skipping them
    #[arg(short = 'L', long)]
    pub follow_links: bool,

    /// Content hash algorithm
    #[arg(short, long, value_enum)]
    pub algorithm: Option<HashAlgorithm>,

    /// Number of parallel hashing threads (default: number of CPU cores)
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Disable the persistent hash cache
    #[arg(long)]
    pub no_cache: bool,

    /// Path to the hash cache file
    #[arg(long, value_name = "FILE")]
    pub cache_file: Option<PathBuf>,

    /// Path to a TOML config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the hash cache content and exit
    #[arg(long, conflicts_with = "clear_cache")]
    pub print_cache: bool,

    /// Delete the hash cache and exit
    #[arg(long)]
    pub clear_cache: bool,

    /// Only report directory pairs above this likeness percentage
    #[arg(long, value_name = "PERCENT")]
    pub likeness_threshold: Option<f64>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
